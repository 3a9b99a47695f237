use anybox::media::register_media_types;
use anybox::{Any, Format, Registry};
use anyhow::{bail, Context, Result};
use log::info;
use serde_json::Value as JsonValue;
use std::fmt::Write;
use std::io::Read;
use std::path::Path;

/// Registry with the builtins and the media records.
pub fn registry() -> Registry {
    let registry = Registry::new();
    register_media_types(&registry);
    registry
}

/// Reads a file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

/// Decoded input: one envelope or an ordered array of them.
#[derive(Debug, PartialEq)]
pub enum Document {
    Single(Any),
    Seq(Vec<Any>),
}

impl Document {
    pub fn parse(registry: &Registry, text: &str, format: Format) -> Result<Document> {
        let raw = format.parse(text)?;
        let decoder = registry.decoder();
        let document = match raw {
            JsonValue::Array(_) => Document::Seq(decoder.decode_seq(raw)?),
            raw => Document::Single(decoder.decode(raw)?),
        };
        Ok(document)
    }

    pub fn items(&self) -> &[Any] {
        match self {
            Document::Single(any) => std::slice::from_ref(any),
            Document::Seq(items) => items,
        }
    }

    pub fn encode(&self, registry: &Registry) -> Result<JsonValue> {
        let encoder = registry.encoder();
        let raw = match self {
            Document::Single(any) => encoder.encode(any)?,
            Document::Seq(items) => encoder.encode_seq(items)?,
        };
        Ok(raw)
    }
}

pub fn types(registry: &Registry) -> String {
    let mut out = String::new();
    for descriptor in registry.descriptors() {
        let _ = writeln!(
            out,
            "{:<32} {:<18} {}",
            descriptor.identifier(),
            descriptor.kind().to_string(),
            descriptor.type_name()
        );
    }
    out
}

/// Re-encodes and decodes `document` again, failing when the second decode differs.
pub fn check(registry: &Registry, document: &Document) -> Result<String> {
    let raw = document.encode(registry)?;
    let text = serde_json::to_string(&raw)?;
    let again = Document::parse(registry, &text, Format::Json)?;
    if &again != document {
        bail!("document is not stable across a decode / encode cycle");
    }
    info!("{} envelope(s) verified", document.items().len());

    let mut out = String::new();
    for (idx, any) in document.items().iter().enumerate() {
        let state = if any.is_null() { "null" } else { "ok" };
        let _ = writeln!(out, "{idx}: {} ({}) {state}", any.identifier(), any.kind());
    }
    Ok(out)
}

pub fn convert(registry: &Registry, document: &Document, to: Format) -> Result<String> {
    let raw = document.encode(registry)?;
    Ok(to.render(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::{check, registry, types, Document};
    use anybox::Format;

    #[test]
    fn single_and_seq() {
        let registry = registry();
        let single = Document::parse(&registry, r#"{"@t":"int","@v":1}"#, Format::Json).unwrap();
        assert!(matches!(single, Document::Single(_)));
        let seq = Document::parse(
            &registry,
            r#"[{"@t":"int","@v":1},{"@t":"string","@v":null}]"#,
            Format::Json,
        )
        .unwrap();
        assert_eq!(seq.items().len(), 2);
        let summary = check(&registry, &seq).unwrap();
        assert_eq!(summary, "0: int (primitive) ok\n1: string (primitive) null\n");
    }

    #[test]
    fn types_lists_media() {
        let listing = types(&registry());
        assert!(listing.contains("anybox::media::Gallery"));
        assert!(listing.lines().next().unwrap().starts_with("anybox::media::Gallery"));
    }
}
