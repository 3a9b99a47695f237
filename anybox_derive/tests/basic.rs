use anybox::{Alias, Any, Kind, Primitive, Reflect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Reflect)]
struct MyStruct {
    _x: u32,
    _y: String,
    _z: NonStandard,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Reflect)]
struct NonStandard {
    _z: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Reflect)]
#[anybox(name = "my.Named")]
struct Named {
    #[anybox(rename = "Title")]
    title: String,
    #[anybox(skip)]
    _cache: Vec<u8>,
    r#type: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Reflect)]
struct Envelopes {
    single: Any,
    maybe: Option<Any>,
    list: Vec<anybox::Any>,
    map: BTreeMap<String, Any>,
    #[anybox(plain)]
    tags: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Reflect)]
struct Pair(i32, f64);

#[derive(Clone, Debug, Default, PartialEq, Reflect)]
struct Marker;

#[derive(Clone, Debug, Default, PartialEq, Reflect)]
struct UserId(u32);

#[test]
fn struct_test() {
    let info = MyStruct::type_info();
    assert_eq!(info.name(), "basic::MyStruct");
    assert_eq!(info.kind(), Kind::Struct);
    let mut fields = info.fields().iter();
    let field_x = fields.next().unwrap();
    assert_eq!(field_x.name(), "_x");
    assert_eq!(field_x.type_tag(), "u32");
    let field_y = fields.next().unwrap();
    assert_eq!(field_y.name(), "_y");
    assert_eq!(field_y.type_tag(), "String");
    let field_z = fields.next().unwrap();
    assert_eq!(field_z.name(), "_z");
    assert_eq!(field_z.type_tag(), "NonStandard");
    assert!(!field_z.is_envelope());
    assert!(fields.next().is_none());

    let non_standard = NonStandard::type_info();
    assert_eq!(non_standard.name(), "basic::NonStandard");
    assert_eq!(non_standard.fields().len(), 1);
}

#[test]
fn attributes() {
    let info = Named::type_info();
    assert_eq!(info.name(), "my.Named");
    let names: Vec<_> = info.fields().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["Title", "type"]);
}

#[test]
fn envelope_fields() {
    let info = Envelopes::type_info();
    let flags: Vec<_> = info
        .fields()
        .iter()
        .map(|f| (f.name(), f.is_envelope()))
        .collect();
    assert_eq!(
        flags,
        vec![
            ("single", true),
            ("maybe", true),
            ("list", true),
            ("map", true),
            ("tags", false),
        ]
    );
    let required: Vec<_> = info
        .fields()
        .iter()
        .filter(|f| f.is_required())
        .map(|f| f.name())
        .collect();
    assert_eq!(required, vec!["single"]);
    assert_eq!(info.fields()[1].type_tag(), "Option<Any>");
    assert_eq!(info.fields()[2].type_tag(), "Vec<anybox::Any>");
    assert_eq!(info.fields()[3].type_tag(), "BTreeMap<String, Any>");
}

#[test]
fn tuple_and_unit() {
    let pair = Pair::type_info();
    assert_eq!(pair.kind(), Kind::Struct);
    let names: Vec<_> = pair.fields().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["0", "1"]);

    let marker = Marker::type_info();
    assert_eq!(marker.kind(), Kind::Struct);
    assert!(marker.fields().is_empty());
}

#[test]
fn alias_test() {
    let info = UserId::type_info();
    assert_eq!(info.name(), "basic::UserId");
    assert_eq!(info.kind(), Kind::AliasedPrimitive);
    assert_eq!(info.primitive_repr(), Some(Primitive::Int));
    assert!(info.fields().is_empty());

    let id = UserId::from_repr(7);
    assert_eq!(id.repr(), &7);
}
