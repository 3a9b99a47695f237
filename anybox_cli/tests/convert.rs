use anybox::Format;
use anybox_cli::{check, convert, registry, Document};

const GALLERY: &str = r#"{
    "@t": "anybox::media::Gallery",
    "@v": {
        "title": "trip",
        "items": [
            {"@t": "string", "@v": "cover"},
            {"@t": "anybox::media::Image", "@v": {"url": "a.png", "width": 640, "height": 480, "format": "png"}}
        ]
    }
}"#;

#[test]
fn json_to_ron_and_back() {
    let registry = registry();
    let document = Document::parse(&registry, GALLERY, Format::Json).unwrap();
    let ron = convert(&registry, &document, Format::Ron).unwrap();
    let back = Document::parse(&registry, &ron, Format::Ron).unwrap();
    assert_eq!(back, document);

    let compact = convert(&registry, &back, Format::Json).unwrap();
    assert!(compact.starts_with(r#"{"@t":"anybox::media::Gallery","@v":{"title":"trip""#));
}

#[test]
fn check_reports_each_envelope() {
    let registry = registry();
    let document = Document::parse(&registry, GALLERY, Format::Json).unwrap();
    let summary = check(&registry, &document).unwrap();
    assert_eq!(summary, "0: anybox::media::Gallery (struct) ok\n");
}

#[test]
fn unknown_identifier_fails() {
    let registry = registry();
    let err = Document::parse(&registry, r#"{"@t":"ghost","@v":1}"#, Format::Json).unwrap_err();
    assert!(err.to_string().contains("ghost"));
}
