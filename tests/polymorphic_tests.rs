//! Data-carrying enum variants

use na_codec::{Codec, CodecFactory, ErrorKind, JsonOps, Nbt, NbtOps};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
enum Shape {
    Circle { radius: f64 },
    Square(f64),
    Line(i32, i32),
    Empty,
}

#[test]
fn test_nested_encoding() {
    let codec = CodecFactory::default().create::<Vec<Shape>>();
    let shapes = vec![
        Shape::Circle { radius: 1.5 },
        Shape::Square(2.0),
        Shape::Line(1, 2),
        Shape::Empty,
    ];
    let encoded = codec.encode_start(&shapes, &JsonOps).unwrap();
    assert_eq!(
        encoded,
        json!([
            {"type": "Circle", "value": {"radius": 1.5}},
            {"type": "Square", "value": 2.0},
            {"type": "Line", "value": [1, 2]},
            "Empty",
        ])
    );
    assert_eq!(codec.parse(&JsonOps, &encoded).unwrap(), shapes);
}

#[test]
fn test_flattened_encoding() {
    let codec = CodecFactory::new(|b| b.flatten_polymorphism(true)).create::<Shape>();
    let circle = Shape::Circle { radius: 1.5 };
    let encoded = codec.encode_start(&circle, &JsonOps).unwrap();
    assert_eq!(encoded, json!({"type": "Circle", "radius": 1.5}));
    assert_eq!(codec.parse(&JsonOps, &encoded).unwrap(), circle);
}

#[test]
fn test_flattened_primitive_payload_is_unsupported() {
    let codec = CodecFactory::new(|b| b.flatten_polymorphism(true)).create::<Shape>();
    let err = codec.encode_start(&Shape::Square(1.0), &JsonOps).unwrap_err();
    assert_eq!(err.error().kind(), ErrorKind::UnsupportedShape);
    assert!(
        err.error()
            .to_string()
            .starts_with("Primitive and list polymorphic elements not supported in flattened encoding")
    );
}

#[test]
fn test_flattened_field_conflicting_with_discriminator() {
    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    enum Tagged {
        Named { r#type: i32 },
    }

    let codec = CodecFactory::new(|b| b.flatten_polymorphism(true)).create::<Tagged>();
    let err = codec
        .encode_start(&Tagged::Named { r#type: 1 }, &JsonOps)
        .unwrap_err();
    assert_eq!(err.error().kind(), ErrorKind::AmbiguousConfiguration);

    let err = codec.parse(&JsonOps, &json!({"type": "Named"})).unwrap_err();
    assert_eq!(err.error().kind(), ErrorKind::AmbiguousConfiguration);

    // nested encoding keeps the field apart from the discriminator
    let codec = CodecFactory::default().create::<Tagged>();
    let encoded = codec
        .encode_start(&Tagged::Named { r#type: 1 }, &JsonOps)
        .unwrap();
    assert_eq!(encoded, json!({"type": "Named", "value": {"type": 1}}));
}

#[test]
fn test_flattened_skipped_field_conflicting_with_discriminator() {
    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    enum Tagged {
        Named {
            #[serde(default, skip_serializing_if = "Option::is_none")]
            r#type: Option<i32>,
            x: i32,
        },
    }

    let codec = CodecFactory::new(|b| b.flatten_polymorphism(true)).create::<Tagged>();
    let err = codec
        .encode_start(&Tagged::Named { r#type: None, x: 1 }, &JsonOps)
        .unwrap_err();
    assert_eq!(err.error().kind(), ErrorKind::AmbiguousConfiguration);
    assert!(err.message().contains("Field 'type'"));
}

#[test]
fn test_flattened_payload_key_conflicting_with_discriminator() {
    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    enum Tagged {
        Data(BTreeMap<String, String>),
        Other {},
    }

    let codec = CodecFactory::new(|b| b.flatten_polymorphism(true)).create::<Tagged>();
    let value = Tagged::Data(BTreeMap::from([("type".to_owned(), "Other".to_owned())]));
    let err = codec.encode_start(&value, &JsonOps).unwrap_err();
    assert_eq!(err.error().kind(), ErrorKind::AmbiguousConfiguration);
    let err = codec.encode_start(&value, &NbtOps).unwrap_err();
    assert_eq!(err.error().kind(), ErrorKind::AmbiguousConfiguration);

    let value = Tagged::Data(BTreeMap::from([("kind".to_owned(), "x".to_owned())]));
    let encoded = codec.encode_start(&value, &JsonOps).unwrap();
    assert_eq!(encoded, json!({"type": "Data", "kind": "x"}));
    assert_eq!(codec.parse(&JsonOps, &encoded).unwrap(), value);
}

#[test]
fn test_custom_discriminator() {
    let codec = CodecFactory::new(|b| b.class_discriminator("kind")).create::<Shape>();
    let encoded = codec.encode_start(&Shape::Square(2.0), &JsonOps).unwrap();
    assert_eq!(encoded, json!({"kind": "Square", "value": 2.0}));

    let codec = CodecFactory::new(|b| {
        b.annotate("Shape", |a| a.class_discriminator = Some("shape".to_owned()))
    })
    .create::<Shape>();
    let encoded = codec.encode_start(&Shape::Square(2.0), &JsonOps).unwrap();
    assert_eq!(encoded, json!({"shape": "Square", "value": 2.0}));
    assert_eq!(codec.parse(&JsonOps, &encoded).unwrap(), Shape::Square(2.0));
}

#[test]
fn test_missing_discriminator() {
    let codec = CodecFactory::default().create::<Shape>();
    let err = codec.parse(&JsonOps, &json!({"value": 2.0})).unwrap_err();
    assert_eq!(err.error().kind(), ErrorKind::MalformedData);
    assert_eq!(
        err.error().to_string(),
        "Required type discriminator field 'type' is missing"
    );
}

#[test]
fn test_unknown_fields_in_nested_encoding() {
    let codec = CodecFactory::default().create::<Shape>();
    let err = codec
        .parse(&JsonOps, &json!({"type": "Square", "value": 2.0, "extra": 1}))
        .unwrap_err();
    assert_eq!(
        err.error().to_string(),
        "Unknown fields found in polymorphic state: 'extra'"
    );
}

#[test]
fn test_missing_payload() {
    let codec = CodecFactory::default().create::<Shape>();
    let err = codec.parse(&JsonOps, &json!({"type": "Square"})).unwrap_err();
    assert_eq!(err.error().to_string(), "Required field 'value' is missing");
}

#[test]
fn test_unknown_variant() {
    let codec = CodecFactory::default().create::<Shape>();
    let err = codec
        .parse(&JsonOps, &json!({"type": "Hexagon", "value": 1}))
        .unwrap_err();
    assert_eq!(err.error().kind(), ErrorKind::MalformedData);
}

#[test]
fn test_polymorphic_on_nbt() {
    let codec = CodecFactory::default().create::<Shape>();
    let circle = Shape::Circle { radius: 3.0 };
    let encoded = codec.encode_start(&circle, &NbtOps).unwrap();
    let Nbt::Compound(compound) = &encoded else {
        panic!("expected compound, got {encoded:?}");
    };
    assert_eq!(compound.get("type"), Some(&Nbt::String("Circle".into())));
    assert_eq!(codec.parse(&NbtOps, &encoded).unwrap(), circle);
}

#[test]
fn test_property_indices_use_indexed_discriminator() {
    let codec = CodecFactory::new(|b| b.use_class_property_indices(true)).create::<Shape>();
    let encoded = codec
        .encode_start(&Shape::Circle { radius: 1.0 }, &JsonOps)
        .unwrap();
    assert_eq!(encoded, json!({"-1": "Circle", "value": {"0": 1.0}}));
    assert_eq!(
        codec.parse(&JsonOps, &encoded).unwrap(),
        Shape::Circle { radius: 1.0 }
    );
}
