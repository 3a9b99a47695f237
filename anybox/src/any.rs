use crate::error::Error;
use crate::reflect::{Kind, Reflect};
use crate::registry::Registry;
use crate::value::DynValue;
use log::debug;
use std::any::{type_name, TypeId};
use std::fmt::{Debug, Formatter};

/// Envelope pairing a registered type identifier with a value of that type.
///
/// Content equality: identifiers match and values are deep-equal.
#[derive(Clone)]
pub struct Any {
    identifier: String,
    kind: Kind,
    value: Option<Box<dyn DynValue>>,
}

impl Any {
    /// Wraps `value`, failing with [`Error::UnregisteredType`] when its type has no registry entry.
    ///
    /// An unregistered aliased primitive is stored as the builtin of its underlying primitive.
    pub fn new<T: Reflect>(registry: &Registry, value: T) -> Result<Any, Error> {
        let descriptor = registry.resolve::<T>().ok_or_else(unregistered::<T>)?;
        if descriptor.type_id() == TypeId::of::<T>() {
            return Ok(Any::from_parts(
                descriptor.identifier().to_string(),
                descriptor.kind(),
                Some(Box::new(value)),
            ));
        }
        let widened = T::type_info()
            .widen
            .and_then(|widen| widen(&value))
            .filter(|widened| widened.as_ref().as_any().type_id() == descriptor.type_id())
            .ok_or_else(unregistered::<T>)?;
        debug!(
            "{} is not registered, wrapped as \"{}\"",
            type_name::<T>(),
            descriptor.identifier()
        );
        Ok(Any::from_parts(
            descriptor.identifier().to_string(),
            descriptor.kind(),
            Some(widened),
        ))
    }

    /// Envelope of type `T` without a value, encoded with a null payload.
    pub fn null<T: Reflect>(registry: &Registry) -> Result<Any, Error> {
        let descriptor = registry.resolve::<T>().ok_or_else(unregistered::<T>)?;
        Ok(Any::from_parts(
            descriptor.identifier().to_string(),
            descriptor.kind(),
            None,
        ))
    }

    pub(crate) fn from_parts(
        identifier: String,
        kind: Kind,
        value: Option<Box<dyn DynValue>>,
    ) -> Any {
        Any {
            identifier,
            kind,
            value,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn value(&self) -> Option<&dyn DynValue> {
        self.value.as_deref()
    }

    /// The contained value together with its kind, for callers that switch on the kind.
    pub fn contents(&self) -> (Option<&dyn DynValue>, Kind) {
        (self.value.as_deref(), self.kind)
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.as_deref()?.as_any().downcast_ref::<T>()
    }

    pub fn into_value<T: 'static>(self) -> Option<T> {
        let value = self.value?.into_any().downcast::<T>().ok()?;
        Some(*value)
    }
}

fn unregistered<T>() -> Error {
    Error::UnregisteredType {
        type_name: type_name::<T>().to_string(),
    }
}

/// Unset envelope without identifier, used as the zero value of struct fields.
impl Default for Any {
    fn default() -> Self {
        Any {
            identifier: String::new(),
            kind: Kind::Unknown,
            value: None,
        }
    }
}

impl PartialEq for Any {
    fn eq(&self, other: &Self) -> bool {
        if self.identifier != other.identifier {
            return false;
        }
        match (&self.value, &other.value) {
            (None, None) => true,
            (Some(a), Some(b)) => a.as_ref().dyn_eq(b.as_ref()),
            _ => false,
        }
    }
}

impl Debug for Any {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Any")
            .field("identifier", &self.identifier)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .finish()
    }
}
