use crate::consts::{TYPE_KEY, VALUE_KEY};
use crate::error::Error;
use ron::ser::PrettyConfig;
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Names of the two envelope fields. Encoder and decoder must agree on them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireConfig {
    pub type_key: String,
    pub value_key: String,
}

impl WireConfig {
    pub fn new(type_key: impl Into<String>, value_key: impl Into<String>) -> Self {
        WireConfig {
            type_key: type_key.into(),
            value_key: value_key.into(),
        }
    }
}

impl Default for WireConfig {
    fn default() -> Self {
        WireConfig::new(TYPE_KEY, VALUE_KEY)
    }
}

/// Text rendering of encoded envelopes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
    JsonPretty,
    Ron,
}

impl Format {
    pub fn render(self, raw: &JsonValue) -> Result<String, Error> {
        match self {
            Format::Json => Ok(serde_json::to_string(raw)?),
            Format::JsonPretty => Ok(serde_json::to_string_pretty(raw)?),
            Format::Ron => {
                ron::ser::to_string_pretty(raw, PrettyConfig::default().compact_arrays(true))
                    .map_err(|e| Error::Ron(format!("{e:?}")))
            }
        }
    }

    pub fn parse(self, text: &str) -> Result<JsonValue, Error> {
        match self {
            Format::Json | Format::JsonPretty => Ok(serde_json::from_str(text)?),
            Format::Ron => ron::de::from_str(text).map_err(|e| Error::Ron(e.to_string())),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "pretty" | "json-pretty" => Ok(Format::JsonPretty),
            "ron" => Ok(Format::Ron),
            other => Err(format!("unknown format \"{other}\", expected json, pretty or ron")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Format, WireConfig};
    use serde_json::json;

    #[test]
    fn default_keys() {
        let config = WireConfig::default();
        assert_eq!(config.type_key, "@t");
        assert_eq!(config.value_key, "@v");
    }

    #[test]
    fn format_names() {
        assert_eq!("ron".parse::<Format>(), Ok(Format::Ron));
        assert_eq!("pretty".parse::<Format>(), Ok(Format::JsonPretty));
        assert!("yaml".parse::<Format>().is_err());
    }

    #[test]
    fn ron_text_parses_back() {
        let raw = json!({"@t": "float", "@v": 1.5});
        let text = Format::Ron.render(&raw).unwrap();
        assert_eq!(Format::Ron.parse(&text).unwrap(), raw);
    }
}
