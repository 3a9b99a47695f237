use crate::any::Any;
use crate::error::Error;
use crate::reflect::Kind;
use crate::registry::{Registry, TypeDescriptor};
use crate::value::DynValue;
use crate::wire::{Format, WireConfig};
use log::trace;
use serde::de::DeserializeSeed;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// Rebuilds envelopes of the exact original type from encoder records.
pub struct Decoder<'r> {
    registry: &'r Registry,
    config: WireConfig,
}

impl<'r> Decoder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Decoder::with_config(registry, WireConfig::default())
    }

    pub fn with_config(registry: &'r Registry, config: WireConfig) -> Self {
        Decoder { registry, config }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn config(&self) -> &WireConfig {
        &self.config
    }

    pub fn decode(&self, raw: JsonValue) -> Result<Any, Error> {
        let mut record = match raw {
            JsonValue::Object(record) => record,
            other => {
                return Err(Error::malformed(format!(
                    "expected an envelope object, found {}",
                    describe(&other)
                )))
            }
        };
        let type_key = &self.config.type_key;
        let value_key = &self.config.value_key;
        let identifier = match record.remove(type_key) {
            Some(JsonValue::String(identifier)) => identifier,
            Some(other) => {
                return Err(Error::malformed(format!(
                    "\"{type_key}\" must be a string, found {}",
                    describe(&other)
                )))
            }
            None => return Err(Error::malformed(format!("missing \"{type_key}\" field"))),
        };
        let descriptor = self
            .registry
            .descriptor_for(&identifier)
            .ok_or_else(|| Error::UnknownIdentifier(identifier.clone()))?;
        let payload = record.remove(value_key).ok_or_else(|| {
            Error::malformed(format!(
                "missing \"{value_key}\" field in \"{identifier}\" envelope"
            ))
        })?;
        if let Some(extra) = record.keys().next() {
            return Err(Error::malformed(format!(
                "unexpected field \"{extra}\" in \"{identifier}\" envelope"
            )));
        }

        let value = match payload {
            JsonValue::Null => None,
            payload => Some(self.decode_payload(&descriptor, payload)?),
        };
        trace!("decoded \"{identifier}\" envelope");
        Ok(Any::from_parts(identifier, descriptor.kind(), value))
    }

    fn decode_payload(
        &self,
        descriptor: &TypeDescriptor,
        payload: JsonValue,
    ) -> Result<Box<dyn DynValue>, Error> {
        let identifier = descriptor.identifier();
        match descriptor.kind() {
            Kind::Struct => {
                let mut fields = match payload {
                    JsonValue::Object(fields) => fields,
                    other => {
                        return Err(Error::mismatch(
                            identifier,
                            format!("struct payload must be an object, found {}", describe(&other)),
                        ))
                    }
                };
                let mut value = descriptor.zero_value();
                // absent fields keep their zero value, unknown ones are ignored
                for field in descriptor.fields() {
                    match fields.remove(field.name()) {
                        Some(raw) => field.set(value.as_mut().as_any_mut(), raw, identifier, self)?,
                        None if field.is_required() => {
                            return Err(Error::mismatch(
                                identifier,
                                format!("missing envelope field `{}`", field.name()),
                            ))
                        }
                        None => {}
                    }
                }
                Ok(value)
            }
            Kind::Primitive | Kind::AliasedPrimitive | Kind::Unknown => {
                if let Some(primitive) = descriptor.primitive() {
                    if !primitive.matches(&payload) {
                        return Err(Error::mismatch(
                            identifier,
                            format!("expected a {primitive:?} payload, found {}", describe(&payload)),
                        ));
                    }
                }
                let codec = descriptor
                    .codec()
                    .ok_or_else(|| Error::mismatch(identifier, "type has no scalar codec"))?;
                (codec.decode)(payload).map_err(|reason| Error::mismatch(identifier, reason))
            }
        }
    }

    /// Decodes an ordered array of envelope records.
    pub fn decode_seq(&self, raw: JsonValue) -> Result<Vec<Any>, Error> {
        match raw {
            JsonValue::Array(items) => items.into_iter().map(|item| self.decode(item)).collect(),
            other => Err(Error::malformed(format!(
                "expected an array of envelopes, found {}",
                describe(&other)
            ))),
        }
    }

    pub fn from_text(&self, text: &str, format: Format) -> Result<Any, Error> {
        self.decode(format.parse(text)?)
    }

    pub fn seq_from_text(&self, text: &str, format: Format) -> Result<Vec<Any>, Error> {
        self.decode_seq(format.parse(text)?)
    }

    pub fn from_json(&self, text: &str) -> Result<Any, Error> {
        self.from_text(text, Format::Json)
    }

    pub fn seq_from_json(&self, text: &str) -> Result<Vec<Any>, Error> {
        self.seq_from_text(text, Format::Json)
    }

    pub fn from_slice(&self, bytes: &[u8]) -> Result<Any, Error> {
        self.decode(serde_json::from_slice(bytes)?)
    }

    /// `DeserializeSeed` producing envelopes, for envelopes embedded in larger serde documents.
    pub fn seed<'a>(&'a self) -> AnySeed<'a, 'r> {
        AnySeed { decoder: self }
    }
}

#[derive(Copy, Clone)]
pub struct AnySeed<'a, 'r> {
    decoder: &'a Decoder<'r>,
}

impl<'de> DeserializeSeed<'de> for AnySeed<'_, '_> {
    type Value = Any;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Any, D::Error> {
        let raw = JsonValue::deserialize(deserializer)?;
        self.decoder.decode(raw).map_err(serde::de::Error::custom)
    }
}

fn describe(raw: &JsonValue) -> &'static str {
    match raw {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
