use crate::any::Any;
use crate::error::Error;
use crate::reflect::Kind;
use crate::registry::{Registry, TypeDescriptor};
use crate::value::DynValue;
use crate::wire::{Format, WireConfig};
use log::trace;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

/// Turns envelopes into self-describing `{ type_key: identifier, value_key: payload }` records.
pub struct Encoder<'r> {
    registry: &'r Registry,
    config: WireConfig,
}

impl<'r> Encoder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Encoder::with_config(registry, WireConfig::default())
    }

    pub fn with_config(registry: &'r Registry, config: WireConfig) -> Self {
        Encoder { registry, config }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn config(&self) -> &WireConfig {
        &self.config
    }

    pub fn encode(&self, any: &Any) -> Result<JsonValue, Error> {
        if any.identifier().is_empty() {
            return Err(Error::malformed("envelope has no type identifier"));
        }
        let descriptor = self.registry.descriptor_for(any.identifier()).ok_or_else(|| {
            Error::UnregisteredType {
                type_name: any
                    .value()
                    .map_or_else(|| any.identifier().to_string(), |v| v.type_name().to_string()),
            }
        })?;
        let payload = match any.value() {
            Some(value) => self.encode_payload(&descriptor, value)?,
            None => JsonValue::Null,
        };
        trace!("encoded \"{}\" envelope", descriptor.identifier());

        // type key first, the decoder does not rely on it
        let mut record = Map::new();
        record.insert(
            self.config.type_key.clone(),
            JsonValue::String(any.identifier().to_string()),
        );
        record.insert(self.config.value_key.clone(), payload);
        Ok(JsonValue::Object(record))
    }

    fn encode_payload(
        &self,
        descriptor: &TypeDescriptor,
        value: &dyn DynValue,
    ) -> Result<JsonValue, Error> {
        let identifier = descriptor.identifier();
        let value_type = value.type_name();
        let value = value.as_any();
        if value.type_id() != descriptor.type_id() {
            return Err(Error::mismatch(
                identifier,
                format!(
                    "identifier is bound to {}, envelope holds {value_type}",
                    descriptor.type_name()
                ),
            ));
        }
        match descriptor.kind() {
            Kind::Struct => {
                let mut fields = Map::new();
                for field in descriptor.fields() {
                    fields.insert(
                        field.name().to_string(),
                        field.get(value, identifier, self)?,
                    );
                }
                Ok(JsonValue::Object(fields))
            }
            Kind::Primitive | Kind::AliasedPrimitive | Kind::Unknown => {
                let codec = descriptor
                    .codec()
                    .ok_or_else(|| Error::mismatch(identifier, "type has no scalar codec"))?;
                let raw = (codec.encode)(value).map_err(|reason| Error::mismatch(identifier, reason))?;
                if let Some(primitive) = descriptor.primitive() {
                    // serde_json turns non-finite floats into null
                    if !primitive.matches(&raw) {
                        return Err(Error::mismatch(
                            identifier,
                            format!("{value_type} value has no {primitive:?} representation"),
                        ));
                    }
                }
                Ok(raw)
            }
        }
    }

    /// Ordered array of envelope records.
    pub fn encode_seq(&self, items: &[Any]) -> Result<JsonValue, Error> {
        let items = items
            .iter()
            .map(|item| self.encode(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(JsonValue::Array(items))
    }

    pub fn to_text(&self, any: &Any, format: Format) -> Result<String, Error> {
        format.render(&self.encode(any)?)
    }

    pub fn seq_to_text(&self, items: &[Any], format: Format) -> Result<String, Error> {
        format.render(&self.encode_seq(items)?)
    }

    pub fn to_json(&self, any: &Any) -> Result<String, Error> {
        self.to_text(any, Format::Json)
    }

    pub fn seq_to_json(&self, items: &[Any]) -> Result<String, Error> {
        self.seq_to_text(items, Format::Json)
    }

    /// `Serialize` adapter, for envelopes embedded in larger serde documents.
    pub fn serializable<'a>(&'a self, any: &'a Any) -> Encoded<'a, 'r> {
        Encoded { encoder: self, any }
    }
}

pub struct Encoded<'a, 'r> {
    encoder: &'a Encoder<'r>,
    any: &'a Any,
}

impl Serialize for Encoded<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.encoder
            .encode(self.any)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use crate::encode::Encoder;
    use crate::{Any, Error, Reflect, Registry, TypeInfo, WireConfig};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Clone, Debug, Default, PartialEq, Reflect)]
    #[anybox(name = "sensor.Reading")]
    struct Reading {
        value: f64,
        maybe: Option<f64>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Samples(Vec<f32>);

    impl Reflect for Samples {
        fn type_info() -> TypeInfo {
            TypeInfo::opaque::<Self>("sensor.Samples")
        }
    }

    fn assert_rejected(registry: &Registry, any: &Any, wire_identifier: &str) {
        match registry.encoder().encode(any) {
            Err(Error::TypeMismatch { identifier, .. }) => assert_eq!(identifier, wire_identifier),
            other => panic!("expected a type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn type_key_comes_first() {
        let registry = Registry::new();
        let any = Any::new(&registry, true).unwrap();
        let text = registry.encoder().to_json(&any).unwrap();
        assert_eq!(text, r#"{"@t":"bool","@v":true}"#);
    }

    #[test]
    fn null_value_keeps_identifier() {
        let registry = Registry::new();
        let any = Any::null::<String>(&registry).unwrap();
        let raw = registry.encoder().encode(&any).unwrap();
        assert_eq!(raw, json!({"@t": "string", "@v": null}));
    }

    #[test]
    fn custom_keys() {
        let registry = Registry::new();
        let encoder = Encoder::with_config(&registry, WireConfig::new("type", "value"));
        let any = Any::new(&registry, 3i64).unwrap();
        assert_eq!(encoder.encode(&any).unwrap(), json!({"type": "int", "value": 3}));
    }

    #[test]
    fn non_finite_float_is_rejected() {
        let registry = Registry::new();
        let any = Any::new(&registry, f64::NAN).unwrap();
        let err = registry.encoder().encode(&any).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn unset_envelope_is_rejected() {
        let registry = Registry::new();
        let err = registry.encoder().encode(&Any::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedEnvelope(_)));
    }

    #[test]
    fn identifier_missing_from_registry() {
        let registry = Registry::new();
        let any = Any::new(&registry, 1i64).unwrap();
        let err = Registry::empty().encoder().encode(&any).unwrap_err();
        assert!(matches!(err, Error::UnregisteredType { .. }));
    }

    #[test]
    fn non_finite_struct_fields_are_rejected() {
        let registry = Registry::new();
        registry.register::<Reading>();
        let nan = Reading {
            value: f64::NAN,
            maybe: None,
        };
        assert_rejected(&registry, &Any::new(&registry, nan).unwrap(), "sensor.Reading");
        let inf = Reading {
            value: 1.0,
            maybe: Some(f64::INFINITY),
        };
        assert_rejected(&registry, &Any::new(&registry, inf).unwrap(), "sensor.Reading");

        let finite = Reading {
            value: 1.0,
            maybe: Some(2.5),
        };
        let raw = registry
            .encoder()
            .encode(&Any::new(&registry, finite).unwrap())
            .unwrap();
        assert_eq!(raw["@v"], json!({"value": 1.0, "maybe": 2.5}));
    }

    #[test]
    fn non_finite_opaque_payload_is_rejected() {
        let registry = Registry::new();
        registry.register::<Samples>();
        let any = Any::new(&registry, Samples(vec![0.5, f32::NEG_INFINITY])).unwrap();
        assert_rejected(&registry, &any, "sensor.Samples");
    }
}
