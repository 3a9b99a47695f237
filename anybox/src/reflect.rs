use crate::any::Any;
use crate::consts::{BOOL_ID, FLOAT_ID, INT_ID, STRING_ID};
use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::Error;
use crate::finite::to_json;
use crate::value::DynValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::any::{type_name, Any as StdAny};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};

/// Coarse shape of a registered type, drives encoder and decoder dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// One of the builtin scalars.
    Primitive,
    /// Named type stored as a single primitive.
    AliasedPrimitive,
    /// Walked field by field through its descriptors.
    Struct,
    /// No field layout, encoded as a single serde value.
    Unknown,
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Kind::Primitive => "primitive",
            Kind::AliasedPrimitive => "aliased primitive",
            Kind::Struct => "struct",
            Kind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Scalar representation shared by builtins and aliases.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Text,
    Bool,
    Int,
    Float,
}

impl Primitive {
    pub fn builtin_identifier(self) -> &'static str {
        match self {
            Primitive::Text => STRING_ID,
            Primitive::Bool => BOOL_ID,
            Primitive::Int => INT_ID,
            Primitive::Float => FLOAT_ID,
        }
    }

    /// Whether a wire value has the shape of this primitive.
    pub fn matches(self, raw: &JsonValue) -> bool {
        match self {
            Primitive::Text => raw.is_string(),
            Primitive::Bool => raw.is_boolean(),
            Primitive::Int => raw.is_i64() || raw.is_u64(),
            Primitive::Float => raw.is_number(),
        }
    }
}

/// Type that can travel inside an [`Any`] envelope.
///
/// Usually derived with `#[derive(Reflect)]`. `Default` is the zero value the decoder populates.
pub trait Reflect: DynValue + Clone + PartialEq + Default {
    fn type_info() -> TypeInfo;
}

/// Storage type of an aliased primitive.
pub trait PrimitiveRepr: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const PRIMITIVE: Primitive;

    /// Converts into the builtin type of [`Self::PRIMITIVE`].
    fn widen(&self) -> Box<dyn DynValue>;
}

/// Named single-primitive type, implemented by the derive for one-field tuple structs.
pub trait Alias: Reflect {
    type Repr: PrimitiveRepr;

    fn repr(&self) -> &Self::Repr;
    fn from_repr(repr: Self::Repr) -> Self;
}

pub(crate) type WidenFn = fn(&dyn StdAny) -> Option<Box<dyn DynValue>>;

/// Whole-value codec used for every kind except [`Kind::Struct`].
#[derive(Copy, Clone)]
pub struct ScalarCodec {
    pub(crate) encode: fn(&dyn StdAny) -> Result<JsonValue, String>,
    pub(crate) decode: fn(JsonValue) -> Result<Box<dyn DynValue>, String>,
}

impl ScalarCodec {
    fn serde<T: Serialize + DeserializeOwned + DynValue>() -> Self {
        ScalarCodec {
            encode: encode_serde::<T>,
            decode: decode_serde::<T>,
        }
    }

    fn alias<T: Alias>() -> Self {
        ScalarCodec {
            encode: encode_alias::<T>,
            decode: decode_alias::<T>,
        }
    }
}

fn encode_serde<T: Serialize + 'static>(value: &dyn StdAny) -> Result<JsonValue, String> {
    let value = value
        .downcast_ref::<T>()
        .ok_or_else(|| format!("expected a value of {}", type_name::<T>()))?;
    to_json(value)
}

fn decode_serde<T: DeserializeOwned + DynValue>(raw: JsonValue) -> Result<Box<dyn DynValue>, String> {
    let value: T = serde_json::from_value(raw).map_err(|e| e.to_string())?;
    Ok(Box::new(value))
}

fn encode_alias<T: Alias>(value: &dyn StdAny) -> Result<JsonValue, String> {
    let value = value
        .downcast_ref::<T>()
        .ok_or_else(|| format!("expected a value of {}", type_name::<T>()))?;
    to_json(value.repr())
}

fn decode_alias<T: Alias>(raw: JsonValue) -> Result<Box<dyn DynValue>, String> {
    let repr: T::Repr = serde_json::from_value(raw).map_err(|e| e.to_string())?;
    Ok(Box::new(T::from_repr(repr)))
}

fn widen_alias<T: Alias>(value: &dyn StdAny) -> Option<Box<dyn DynValue>> {
    value.downcast_ref::<T>().map(|v| v.repr().widen())
}

/// Static description of a type, produced by [`Reflect::type_info`].
pub struct TypeInfo {
    pub(crate) name: String,
    pub(crate) kind: Kind,
    pub(crate) primitive: Option<Primitive>,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) codec: Option<ScalarCodec>,
    pub(crate) widen: Option<WidenFn>,
}

impl TypeInfo {
    pub fn primitive<T: PrimitiveRepr + DynValue>(name: impl Into<String>) -> Self {
        TypeInfo {
            name: name.into(),
            kind: Kind::Primitive,
            primitive: Some(T::PRIMITIVE),
            fields: Vec::new(),
            codec: Some(ScalarCodec::serde::<T>()),
            widen: None,
        }
    }

    pub fn alias<T: Alias>(name: impl Into<String>) -> Self {
        TypeInfo {
            name: name.into(),
            kind: Kind::AliasedPrimitive,
            primitive: Some(<T::Repr as PrimitiveRepr>::PRIMITIVE),
            fields: Vec::new(),
            codec: Some(ScalarCodec::alias::<T>()),
            widen: Some(widen_alias::<T>),
        }
    }

    pub fn structure(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        TypeInfo {
            name: name.into(),
            kind: Kind::Struct,
            primitive: None,
            fields,
            codec: None,
            widen: None,
        }
    }

    /// Type without a field layout, encoded and decoded by serde as a whole.
    pub fn opaque<T: Serialize + DeserializeOwned + DynValue>(name: impl Into<String>) -> Self {
        TypeInfo {
            name: name.into(),
            kind: Kind::Unknown,
            primitive: None,
            fields: Vec::new(),
            codec: Some(ScalarCodec::serde::<T>()),
            widen: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn primitive_repr(&self) -> Option<Primitive> {
        self.primitive
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

impl Debug for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("primitive", &self.primitive)
            .field("fields", &self.fields)
            .finish()
    }
}

type GetFn =
    Box<dyn Fn(&dyn StdAny, &str, &Encoder<'_>) -> Result<JsonValue, Error> + Send + Sync>;
type SetFn = Box<
    dyn Fn(&mut dyn StdAny, JsonValue, &str, &Decoder<'_>) -> Result<(), Error> + Send + Sync,
>;

/// One struct field: wire name, declared type and type-erased accessors.
///
/// Accessors receive the wire identifier of the owning struct for error reporting.
pub struct FieldDescriptor {
    name: String,
    type_tag: String,
    envelope: bool,
    required: bool,
    get: GetFn,
    set: SetFn,
}

impl FieldDescriptor {
    /// Field encoded with its own serde implementation.
    pub fn plain<S, F>(
        name: &str,
        type_tag: &str,
        get: fn(&S) -> &F,
        get_mut: fn(&mut S) -> &mut F,
    ) -> Self
    where
        S: 'static,
        F: Serialize + DeserializeOwned + 'static,
    {
        let get_name = name.to_string();
        let set_name = name.to_string();
        FieldDescriptor {
            name: name.to_string(),
            type_tag: type_tag.to_string(),
            envelope: false,
            required: false,
            get: Box::new(move |value: &dyn StdAny, owner: &str, _encoder: &Encoder<'_>| {
                let this = downcast::<S>(value, owner)?;
                to_json(get(this))
                    .map_err(|e| Error::mismatch(owner, format!("field `{get_name}`: {e}")))
            }),
            set: Box::new(
                move |value: &mut dyn StdAny, raw: JsonValue, owner: &str, _decoder: &Decoder<'_>| {
                    let this = downcast_mut::<S>(value, owner)?;
                    *get_mut(this) = serde_json::from_value(raw)
                        .map_err(|e| Error::mismatch(owner, format!("field `{set_name}`: {e}")))?;
                    Ok(())
                },
            ),
        }
    }

    /// Field holding envelopes, encoded through the registry.
    pub fn envelope<S, F>(
        name: &str,
        type_tag: &str,
        get: fn(&S) -> &F,
        get_mut: fn(&mut S) -> &mut F,
    ) -> Self
    where
        S: 'static,
        F: EnvelopeField + 'static,
    {
        FieldDescriptor {
            name: name.to_string(),
            type_tag: type_tag.to_string(),
            envelope: true,
            required: F::REQUIRED,
            get: Box::new(move |value: &dyn StdAny, owner: &str, encoder: &Encoder<'_>| {
                let this = downcast::<S>(value, owner)?;
                get(this).encode_field(encoder)
            }),
            set: Box::new(
                move |value: &mut dyn StdAny, raw: JsonValue, owner: &str, decoder: &Decoder<'_>| {
                    let this = downcast_mut::<S>(value, owner)?;
                    *get_mut(this) = F::decode_field(raw, owner, decoder)?;
                    Ok(())
                },
            ),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared Rust type of the field, as written in the source.
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn is_envelope(&self) -> bool {
        self.envelope
    }

    /// Whether a struct payload without this field is rejected instead of decoded to the zero value.
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn get(
        &self,
        value: &dyn StdAny,
        owner: &str,
        encoder: &Encoder<'_>,
    ) -> Result<JsonValue, Error> {
        (self.get)(value, owner, encoder)
    }

    pub(crate) fn set(
        &self,
        value: &mut dyn StdAny,
        raw: JsonValue,
        owner: &str,
        decoder: &Decoder<'_>,
    ) -> Result<(), Error> {
        (self.set)(value, raw, owner, decoder)
    }
}

impl Debug for FieldDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("type_tag", &self.type_tag)
            .field("envelope", &self.envelope)
            .field("required", &self.required)
            .finish()
    }
}

fn downcast<'a, S: 'static>(value: &'a dyn StdAny, owner: &str) -> Result<&'a S, Error> {
    value
        .downcast_ref::<S>()
        .ok_or_else(|| Error::mismatch(owner, "field accessor applied to another type"))
}

fn downcast_mut<'a, S: 'static>(value: &'a mut dyn StdAny, owner: &str) -> Result<&'a mut S, Error> {
    value
        .downcast_mut::<S>()
        .ok_or_else(|| Error::mismatch(owner, "field accessor applied to another type"))
}

/// Struct field type that contains envelopes: `Any` and containers of it.
pub trait EnvelopeField: Sized {
    /// A bare envelope has no zero value that encodes, so its payload field must be present.
    const REQUIRED: bool = true;

    fn encode_field(&self, encoder: &Encoder<'_>) -> Result<JsonValue, Error>;
    /// `owner` is the wire identifier of the struct holding the field.
    fn decode_field(raw: JsonValue, owner: &str, decoder: &Decoder<'_>) -> Result<Self, Error>;
}

impl EnvelopeField for Any {
    fn encode_field(&self, encoder: &Encoder<'_>) -> Result<JsonValue, Error> {
        encoder.encode(self)
    }

    fn decode_field(raw: JsonValue, _owner: &str, decoder: &Decoder<'_>) -> Result<Self, Error> {
        decoder.decode(raw)
    }
}

impl<T: EnvelopeField> EnvelopeField for Option<T> {
    const REQUIRED: bool = false;

    fn encode_field(&self, encoder: &Encoder<'_>) -> Result<JsonValue, Error> {
        match self {
            Some(inner) => inner.encode_field(encoder),
            None => Ok(JsonValue::Null),
        }
    }

    fn decode_field(raw: JsonValue, owner: &str, decoder: &Decoder<'_>) -> Result<Self, Error> {
        match raw {
            JsonValue::Null => Ok(None),
            raw => T::decode_field(raw, owner, decoder).map(Some),
        }
    }
}

impl<T: EnvelopeField> EnvelopeField for Box<T> {
    const REQUIRED: bool = T::REQUIRED;

    fn encode_field(&self, encoder: &Encoder<'_>) -> Result<JsonValue, Error> {
        self.as_ref().encode_field(encoder)
    }

    fn decode_field(raw: JsonValue, owner: &str, decoder: &Decoder<'_>) -> Result<Self, Error> {
        T::decode_field(raw, owner, decoder).map(Box::new)
    }
}

impl<T: EnvelopeField> EnvelopeField for Vec<T> {
    const REQUIRED: bool = false;

    fn encode_field(&self, encoder: &Encoder<'_>) -> Result<JsonValue, Error> {
        let items = self
            .iter()
            .map(|item| item.encode_field(encoder))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(JsonValue::Array(items))
    }

    fn decode_field(raw: JsonValue, owner: &str, decoder: &Decoder<'_>) -> Result<Self, Error> {
        let JsonValue::Array(items) = raw else {
            return Err(Error::mismatch(owner, "expected an array of envelopes"));
        };
        items
            .into_iter()
            .map(|item| T::decode_field(item, owner, decoder))
            .collect()
    }
}

impl<T: EnvelopeField> EnvelopeField for BTreeMap<String, T> {
    const REQUIRED: bool = false;

    fn encode_field(&self, encoder: &Encoder<'_>) -> Result<JsonValue, Error> {
        let mut map = serde_json::Map::new();
        for (key, item) in self {
            map.insert(key.clone(), item.encode_field(encoder)?);
        }
        Ok(JsonValue::Object(map))
    }

    fn decode_field(raw: JsonValue, owner: &str, decoder: &Decoder<'_>) -> Result<Self, Error> {
        let JsonValue::Object(map) = raw else {
            return Err(Error::mismatch(owner, "expected an object of envelopes"));
        };
        map.into_iter()
            .map(|(key, item)| T::decode_field(item, owner, decoder).map(|item| (key, item)))
            .collect()
    }
}
