//! Serializer pass rejecting non-finite floats, which `serde_json` silently renders as `null`.

use serde::ser::{self, Serialize};
use serde_json::Value as JsonValue;
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub(crate) struct NonFinite(String);

impl ser::Error for NonFinite {
    fn custom<T: Display>(msg: T) -> Self {
        NonFinite(msg.to_string())
    }
}

/// `serde_json::to_value` that fails on NaN and infinities anywhere in `value`.
pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<JsonValue, String> {
    value.serialize(FloatGuard).map_err(|e| e.to_string())?;
    serde_json::to_value(value).map_err(|e| e.to_string())
}

fn finite(v: f64) -> Result<(), NonFinite> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(NonFinite(format!("{v} has no JSON representation")))
    }
}

struct FloatGuard;

macro_rules! accept {
    ($($method:ident($ty:ty)),*) => {
        $(
            fn $method(self, _v: $ty) -> Result<(), NonFinite> {
                Ok(())
            }
        )*
    };
}

impl ser::Serializer for FloatGuard {
    type Ok = ();
    type Error = NonFinite;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    accept!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8])
    );

    fn serialize_f32(self, v: f32) -> Result<(), NonFinite> {
        finite(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), NonFinite> {
        finite(v)
    }

    fn serialize_none(self) -> Result<(), NonFinite> {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), NonFinite> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), NonFinite> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), NonFinite> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<(), NonFinite> {
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), NonFinite> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), NonFinite> {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self, NonFinite> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self, NonFinite> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self, NonFinite> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, NonFinite> {
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self, NonFinite> {
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self, NonFinite> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, NonFinite> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FloatGuard {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), NonFinite> {
        value.serialize(FloatGuard)
    }

    fn end(self) -> Result<(), NonFinite> {
        Ok(())
    }
}

impl ser::SerializeTuple for FloatGuard {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), NonFinite> {
        value.serialize(FloatGuard)
    }

    fn end(self) -> Result<(), NonFinite> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FloatGuard {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), NonFinite> {
        value.serialize(FloatGuard)
    }

    fn end(self) -> Result<(), NonFinite> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FloatGuard {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), NonFinite> {
        value.serialize(FloatGuard)
    }

    fn end(self) -> Result<(), NonFinite> {
        Ok(())
    }
}

impl ser::SerializeMap for FloatGuard {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), NonFinite> {
        key.serialize(FloatGuard)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), NonFinite> {
        value.serialize(FloatGuard)
    }

    fn end(self) -> Result<(), NonFinite> {
        Ok(())
    }
}

impl ser::SerializeStruct for FloatGuard {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), NonFinite> {
        value.serialize(FloatGuard)
    }

    fn end(self) -> Result<(), NonFinite> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FloatGuard {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), NonFinite> {
        value.serialize(FloatGuard)
    }

    fn end(self) -> Result<(), NonFinite> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::to_json;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn nested_non_finite_floats() {
        assert!(to_json(&f64::NAN).is_err());
        assert!(to_json(&Some(f32::INFINITY)).is_err());
        assert!(to_json(&vec![1.0, f64::NEG_INFINITY]).is_err());
        let mut map = BTreeMap::new();
        map.insert("k", (1u8, f64::NAN));
        assert!(to_json(&map).is_err());
    }

    #[test]
    fn finite_values_pass() {
        let value = (Some(1.5f64), "x", vec![1i64, 2], None::<f32>);
        assert_eq!(to_json(&value).unwrap(), json!([1.5, "x", [1, 2], null]));
    }
}
