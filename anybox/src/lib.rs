//! Polymorphic value envelopes with a runtime type registry.
//!
//! An [`Any`] pairs a registered type identifier with a value. The [`Encoder`] renders it as a
//! self-describing record and the [`Decoder`] rebuilds the exact original type from that record,
//! resolving the identifier through a [`Registry`].

extern crate self as anybox;

mod any;
pub mod consts;
mod decode;
mod encode;
mod error;
mod finite;
pub mod media;
mod primitive;
mod reflect;
mod registry;
mod value;
mod wire;

pub use any::Any;
pub use anybox_derive::Reflect;
pub use decode::{AnySeed, Decoder};
pub use encode::{Encoded, Encoder};
pub use error::Error;
pub use reflect::{
    Alias, EnvelopeField, FieldDescriptor, Kind, Primitive, PrimitiveRepr, Reflect, ScalarCodec,
    TypeInfo,
};
pub use registry::{Registry, TypeDescriptor};
pub use value::DynValue;
pub use wire::{Format, WireConfig};
