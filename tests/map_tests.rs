//! Regular and entry-list maps

use std::{borrow::Cow, collections::BTreeMap};

use na_codec::{
    Codec, CodecFactory, Dynamic, DynamicOps, DynamicValueOps, ElementSupport, ErrorKind,
    ExtendedDynamicOps, JsonOps, NbtOps, Number,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Debug, Clone)]
struct Pos {
    x: i32,
    y: i32,
}

#[test]
fn test_primitive_keys_become_strings() {
    let codec = CodecFactory::default().create::<BTreeMap<i32, String>>();
    let map = BTreeMap::from([(1, "a".to_owned()), (2, "b".to_owned())]);
    let encoded = codec.encode_start(&map, &JsonOps).unwrap();
    assert_eq!(encoded, json!({"1": "a", "2": "b"}));
    assert_eq!(codec.parse(&JsonOps, &encoded).unwrap(), map);

    let bools = CodecFactory::default().create::<BTreeMap<bool, i32>>();
    let encoded = bools
        .encode_start(&BTreeMap::from([(true, 1)]), &NbtOps)
        .unwrap();
    assert_eq!(
        bools.parse(&NbtOps, &encoded).unwrap(),
        BTreeMap::from([(true, 1)])
    );
}

#[test]
fn test_structured_keys_need_entry_lists() {
    let codec = CodecFactory::default().create::<BTreeMap<Pos, i32>>();
    let map = BTreeMap::from([(Pos { x: 1, y: 2 }, 3)]);
    let err = codec.encode_start(&map, &JsonOps).unwrap_err();
    assert_eq!(err.error().kind(), ErrorKind::UnsupportedShape);
    assert!(
        err.error()
            .to_string()
            .starts_with("Regular maps do not support keys of kind class")
    );
}

#[test]
fn test_structured_keys_on_any_key_format() {
    let codec = CodecFactory::default().create::<BTreeMap<Pos, i32>>();
    let map = BTreeMap::from([(Pos { x: 1, y: 2 }, 3)]);
    let encoded = codec.encode_start(&map, &DynamicValueOps).unwrap();
    let Dynamic::Map(entries) = &encoded else {
        panic!("expected map, got {encoded:?}");
    };
    assert_eq!(entries.len(), 1);
    assert!(matches!(entries[0].0, Dynamic::Map(_)));
    assert_eq!(codec.parse(&DynamicValueOps, &encoded).unwrap(), map);
}

/// The in-memory format, restricted to primitive map keys.
struct PrimitiveKeyOps;

impl DynamicOps for PrimitiveKeyOps {
    type Value = Dynamic;

    fn empty(&self) -> Dynamic {
        DynamicValueOps.empty()
    }

    fn create_numeric(&self, number: Number) -> Dynamic {
        DynamicValueOps.create_numeric(number)
    }

    fn create_boolean(&self, value: bool) -> Dynamic {
        DynamicValueOps.create_boolean(value)
    }

    fn create_string(&self, value: &str) -> Dynamic {
        DynamicValueOps.create_string(value)
    }

    fn create_list(&self, items: Vec<Dynamic>) -> na_codec::Result<Dynamic> {
        DynamicValueOps.create_list(items)
    }

    fn create_map(&self, entries: Vec<(Dynamic, Dynamic)>) -> na_codec::Result<Dynamic> {
        DynamicValueOps.create_map(entries)
    }

    fn get_number_value(&self, value: &Dynamic) -> na_codec::Result<Number> {
        DynamicValueOps.get_number_value(value)
    }

    fn get_boolean_value(&self, value: &Dynamic) -> na_codec::Result<bool> {
        DynamicValueOps.get_boolean_value(value)
    }

    fn get_string_value<'a>(&self, value: &'a Dynamic) -> na_codec::Result<Cow<'a, str>> {
        DynamicValueOps.get_string_value(value)
    }

    fn get_list(&self, value: &Dynamic) -> na_codec::Result<Vec<Dynamic>> {
        DynamicValueOps.get_list(value)
    }

    fn get_map(&self, value: &Dynamic) -> na_codec::Result<Vec<(Dynamic, Dynamic)>> {
        DynamicValueOps.get_map(value)
    }

    fn extended(&self) -> Option<&dyn ExtendedDynamicOps<Dynamic>> {
        Some(self)
    }
}

impl ExtendedDynamicOps<Dynamic> for PrimitiveKeyOps {
    fn supported_map_keys(&self) -> ElementSupport {
        ElementSupport::Primitives
    }

    fn supports_null(&self) -> bool {
        true
    }

    fn create_null(&self) -> na_codec::Result<Dynamic> {
        Ok(Dynamic::Null)
    }

    fn wrap_nullable(&self, value: Dynamic) -> na_codec::Result<Dynamic> {
        Ok(value)
    }

    fn is_not_null(&self, value: &Dynamic) -> na_codec::Result<bool> {
        Ok(*value != Dynamic::Null)
    }

    fn unwrap_nullable(&self, value: Dynamic) -> na_codec::Result<Dynamic> {
        Ok(value)
    }
}

#[test]
fn test_primitive_keys_stay_native() {
    let codec = CodecFactory::default().create::<BTreeMap<i32, bool>>();
    let map = BTreeMap::from([(1, true), (2, false)]);
    let encoded = codec.encode_start(&map, &PrimitiveKeyOps).unwrap();
    assert_eq!(
        encoded,
        Dynamic::Map(vec![
            (Dynamic::Int(1), Dynamic::Bool(true)),
            (Dynamic::Int(2), Dynamic::Bool(false)),
        ])
    );
    assert_eq!(codec.parse(&PrimitiveKeyOps, &encoded).unwrap(), map);

    // keys are not parsed from text on this format
    let text_keys = Dynamic::Map(vec![(Dynamic::from("1"), Dynamic::Bool(true))]);
    let err = codec.parse(&PrimitiveKeyOps, &text_keys).unwrap_err();
    assert_eq!(err.error().kind(), ErrorKind::MalformedData);

    let codec = CodecFactory::default().create::<BTreeMap<bool, String>>();
    let map = BTreeMap::from([(true, "yes".to_owned())]);
    let encoded = codec.encode_start(&map, &PrimitiveKeyOps).unwrap();
    assert_eq!(
        encoded,
        Dynamic::Map(vec![(Dynamic::Bool(true), Dynamic::from("yes"))])
    );
    assert_eq!(codec.parse(&PrimitiveKeyOps, &encoded).unwrap(), map);
}

#[test]
fn test_structured_keys_on_primitive_key_format() {
    let codec = CodecFactory::default().create::<BTreeMap<Pos, i32>>();
    let map = BTreeMap::from([(Pos { x: 1, y: 2 }, 3)]);
    let err = codec.encode_start(&map, &PrimitiveKeyOps).unwrap_err();
    assert_eq!(err.error().kind(), ErrorKind::UnsupportedShape);
    assert!(
        err.error()
            .to_string()
            .starts_with("Regular maps do not support keys of kind class")
    );

    let codec = CodecFactory::new(|b| b.use_entry_list_maps(true)).create::<BTreeMap<Pos, i32>>();
    let encoded = codec.encode_start(&map, &PrimitiveKeyOps).unwrap();
    assert_eq!(codec.parse(&PrimitiveKeyOps, &encoded).unwrap(), map);
}

#[test]
fn test_entry_list_layout() {
    let codec = CodecFactory::new(|b| b.use_entry_list_maps(true)).create::<BTreeMap<Pos, i32>>();
    let map = BTreeMap::from([(Pos { x: 1, y: 2 }, 3)]);
    let encoded = codec.encode_start(&map, &JsonOps).unwrap();
    assert_eq!(encoded, json!([{"key": {"x": 1, "y": 2}, "value": 3}]));
    assert_eq!(codec.parse(&JsonOps, &encoded).unwrap(), map);

    let encoded = codec.encode_start(&map, &NbtOps).unwrap();
    assert_eq!(codec.parse(&NbtOps, &encoded).unwrap(), map);
}

#[test]
fn test_entry_list_for_single_field() {
    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Holder {
        listed: BTreeMap<String, i32>,
        plain: BTreeMap<String, i32>,
    }

    let codec = CodecFactory::new(|b| {
        b.annotate("Holder", |a| {
            a.entry_list_fields.insert("listed".to_owned());
        })
    })
    .create::<Holder>();
    let holder = Holder {
        listed: BTreeMap::from([("a".to_owned(), 1)]),
        plain: BTreeMap::from([("b".to_owned(), 2)]),
    };
    let encoded = codec.encode_start(&holder, &JsonOps).unwrap();
    assert_eq!(
        encoded,
        json!({
            "listed": [{"key": "a", "value": 1}],
            "plain": {"b": 2},
        })
    );
    assert_eq!(codec.parse(&JsonOps, &encoded).unwrap(), holder);
}

#[test]
fn test_entry_list_for_inline_wrapper_field() {
    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Wrapper(BTreeMap<String, i32>);

    let codec = CodecFactory::new(|b| {
        b.annotate("Wrapper", |a| {
            a.use_inline_wrapper = Some(true);
            a.entry_list_fields.insert("value".to_owned());
        })
    })
    .create::<Wrapper>();
    let wrapper = Wrapper(BTreeMap::from([("a".to_owned(), 1)]));
    let encoded = codec.encode_start(&wrapper, &JsonOps).unwrap();
    assert_eq!(encoded, json!({"value": [{"key": "a", "value": 1}]}));
    assert_eq!(codec.parse(&JsonOps, &encoded).unwrap(), wrapper);

    let encoded = codec.encode_start(&wrapper, &NbtOps).unwrap();
    assert_eq!(codec.parse(&NbtOps, &encoded).unwrap(), wrapper);
}

#[test]
fn test_entry_list_missing_value() {
    let codec = CodecFactory::new(|b| b.use_entry_list_maps(true)).create::<BTreeMap<String, i32>>();
    let err = codec.parse(&JsonOps, &json!([{"key": "a"}])).unwrap_err();
    assert_eq!(err.error().to_string(), "Required fields were not found: 'value'");
}

#[test]
fn test_entry_list_unknown_key() {
    let codec = CodecFactory::new(|b| b.use_entry_list_maps(true)).create::<BTreeMap<String, i32>>();
    let err = codec
        .parse(&JsonOps, &json!([{"key": "a", "value": 1, "extra": 0}]))
        .unwrap_err();
    assert_eq!(
        err.error().to_string(),
        "Unknown fields found in map entry: 'extra'"
    );

    let lenient = CodecFactory::new(|b| b.use_entry_list_maps(true).ignore_unknown_keys(true))
        .create::<BTreeMap<String, i32>>();
    assert_eq!(
        lenient
            .parse(&JsonOps, &json!([{"key": "a", "value": 1, "extra": 0}]))
            .unwrap(),
        BTreeMap::from([("a".to_owned(), 1)])
    );
}

#[test]
fn test_map_value_trace() {
    let codec = CodecFactory::default().create::<BTreeMap<String, Vec<i32>>>();
    let err = codec
        .parse(&JsonOps, &json!({"a": [1], "b": [2, "x"]}))
        .unwrap_err();
    assert_eq!(err.trace(), "$[b][1]");
}
