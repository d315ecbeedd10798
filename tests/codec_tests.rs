//! Round trips of ordinary serde types through every bundled format

use std::collections::BTreeMap;

use na_codec::{
    Codec, CodecFactory, Dynamic, DynamicValueOps, JsonOps, Nbt, NbtCompound, NbtOps,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
struct Item {
    id: String,
    count: i8,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
struct Player {
    name: String,
    health: f32,
    level: u32,
    inventory: Vec<Item>,
    stats: BTreeMap<String, i32>,
    pet: Option<String>,
}

fn player(pet: Option<&str>) -> Player {
    Player {
        name: "Steve".to_owned(),
        health: 20.0,
        level: 3,
        inventory: vec![Item {
            id: "stone".to_owned(),
            count: 64,
        }],
        stats: BTreeMap::from([("jumps".to_owned(), 12)]),
        pet: pet.map(str::to_owned),
    }
}

#[test]
fn test_json_encoding() {
    let codec = CodecFactory::default().create::<Player>();
    let encoded = codec.encode_start(&player(None), &JsonOps).unwrap();
    assert_eq!(
        encoded,
        json!({
            "name": "Steve",
            "health": 20.0,
            "level": 3,
            "inventory": [{"id": "stone", "count": 64}],
            "stats": {"jumps": 12},
        })
    );
    assert_eq!(codec.parse(&JsonOps, &encoded).unwrap(), player(None));
}

#[test]
fn test_json_round_trip_with_present_option() {
    let codec = CodecFactory::default().create::<Player>();
    let encoded = codec.encode_start(&player(Some("cat")), &JsonOps).unwrap();
    assert_eq!(encoded["pet"], json!("cat"));
    assert_eq!(codec.parse(&JsonOps, &encoded).unwrap(), player(Some("cat")));
}

#[test]
fn test_nbt_encoding() {
    let codec = CodecFactory::default().create::<Player>();
    let encoded = codec.encode_start(&player(Some("cat")), &NbtOps).unwrap();
    let Nbt::Compound(compound) = &encoded else {
        panic!("expected compound, got {encoded:?}");
    };
    assert_eq!(compound.get("name"), Some(&Nbt::String("Steve".into())));
    assert_eq!(compound.get("health"), Some(&Nbt::Float(20.0)));
    assert_eq!(compound.get("level"), Some(&Nbt::Long(3)));
    // NBT has no null, so the option is wrapped
    assert_eq!(
        compound.get("pet"),
        Some(&Nbt::Compound(NbtCompound::from_iter([(
            "value",
            Nbt::String("cat".into())
        )])))
    );
    assert_eq!(codec.parse(&NbtOps, &encoded).unwrap(), player(Some("cat")));
}

#[test]
fn test_nbt_absent_option_is_omitted() {
    let codec = CodecFactory::default().create::<Player>();
    let encoded = codec.encode_start(&player(None), &NbtOps).unwrap();
    let Nbt::Compound(compound) = &encoded else {
        panic!("expected compound, got {encoded:?}");
    };
    assert!(!compound.contains_key("pet"));
    assert_eq!(codec.parse(&NbtOps, &encoded).unwrap(), player(None));
}

#[test]
fn test_dynamic_round_trip() {
    let codec = CodecFactory::default().create::<Player>();
    let encoded = codec
        .encode_start(&player(Some("cat")), &DynamicValueOps)
        .unwrap();
    assert_eq!(encoded.get_str("level"), Some(&Dynamic::Long(3)));
    assert_eq!(encoded.get_str("pet"), Some(&Dynamic::from("cat")));
    assert_eq!(
        codec.parse(&DynamicValueOps, &encoded).unwrap(),
        player(Some("cat"))
    );
}

#[test]
fn test_unsigned_widening() {
    let codec = CodecFactory::default().create::<(u8, u16, u32, u64)>();
    let encoded = codec
        .encode_start(&(200, 60000, 4_000_000_000, 5), &DynamicValueOps)
        .unwrap();
    assert_eq!(
        encoded,
        Dynamic::List(vec![
            Dynamic::Short(200),
            Dynamic::Int(60000),
            Dynamic::Long(4_000_000_000),
            Dynamic::Long(5),
        ])
    );
    assert_eq!(
        codec.parse(&DynamicValueOps, &encoded).unwrap(),
        (200, 60000, 4_000_000_000, 5)
    );
}

#[test]
fn test_integral_float_decodes_as_integer() {
    let codec = CodecFactory::default().create::<i32>();
    assert_eq!(codec.parse(&JsonOps, &json!(4.0)).unwrap(), 4);
    assert!(codec.parse(&JsonOps, &json!(4.5)).is_err());
}

#[test]
fn test_integer_out_of_range() {
    let codec = CodecFactory::default().create::<i8>();
    let err = codec.parse(&JsonOps, &json!(300)).unwrap_err();
    assert_eq!(err.message(), "Decoding exception at $: Value 300 is out of range for i8");
}

#[test]
fn test_unit_and_unit_struct() {
    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Marker;

    let codec = CodecFactory::default().create::<Marker>();
    let encoded = codec.encode_start(&Marker, &JsonOps).unwrap();
    assert_eq!(encoded, json!({}));
    assert_eq!(codec.parse(&JsonOps, &encoded).unwrap(), Marker);

    let err = codec.parse(&JsonOps, &json!({"x": 1})).unwrap_err();
    assert_eq!(err.error().to_string(), "Unknown fields found in object: 'x'");
}

#[test]
fn test_encode_merges_into_prefix() {
    let codec = CodecFactory::default().create::<Item>();
    let item = Item {
        id: "dirt".to_owned(),
        count: 1,
    };
    let merged = codec
        .encode(&item, &JsonOps, &json!({"slot": 4}))
        .unwrap();
    assert_eq!(merged, json!({"slot": 4, "id": "dirt", "count": 1}));

    let list_codec = CodecFactory::default().create::<Vec<i32>>();
    let merged = list_codec.encode(&vec![2, 3], &JsonOps, &json!([1])).unwrap();
    assert_eq!(merged, json!([1, 2, 3]));

    let err = CodecFactory::default()
        .create::<i32>()
        .encode(&1, &JsonOps, &json!([1]))
        .unwrap_err();
    assert!(err.message().starts_with("Encoding exception at $: "));
}

#[test]
fn test_decode_returns_empty_remainder() {
    let codec = CodecFactory::default().create::<String>();
    let (value, rest) = codec.decode(&JsonOps, &json!("a")).unwrap();
    assert_eq!(value, "a");
    assert_eq!(rest, json!(null));
}

#[test]
fn test_char() {
    let codec = CodecFactory::default().create::<char>();
    assert_eq!(codec.encode_start(&'x', &JsonOps).unwrap(), json!("x"));
    assert_eq!(codec.parse(&JsonOps, &json!("y")).unwrap(), 'y');
    assert!(codec.parse(&JsonOps, &json!("yz")).is_err());
}
