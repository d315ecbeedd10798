use na_codec::{
    Codec, CodecFactory, Nbt, NbtOps, from_slice_be, from_slice_le, to_vec_be, to_vec_le,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TestCompound {
    byte_val: i8,
    short_val: i16,
    int_val: i32,
    long_val: i64,
    float_val: f32,
    double_val: f64,
    string_val: String,
    #[serde(default)]
    list_ints: Vec<i32>,
    #[serde(default)]
    list_strings: Vec<String>,
    nested: Option<Box<TestCompound>>,
    #[serde(default)]
    map_vals: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TestEnum {
    Unit,
    Newtype(i32),
    Tuple(i32, String),
    Struct { x: i32, y: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WithEnum {
    mode: Option<TestEnum>,
    #[serde(default)]
    value: i32,
}

fn check_codec<T>(factory: &CodecFactory, tree: &Nbt)
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let codec = factory.create::<T>();
    if let Ok(value) = codec.parse(&NbtOps, tree) {
        if let Ok(encoded) = codec.encode_start(&value, &NbtOps) {
            let _ = codec.parse(&NbtOps, &encoded);
            let _ = to_vec_be(&encoded);
        }
    }
}

pub fn test_binary(data: &[u8]) -> Vec<Nbt> {
    let mut trees = Vec::new();
    if let Ok(tree) = from_slice_be(data) {
        let _ = to_vec_be(&tree);
        let _ = to_vec_le(&tree);
        trees.push(tree);
    }
    if let Ok(tree) = from_slice_le(data) {
        let _ = to_vec_le(&tree);
        let _ = to_vec_be(&tree);
        trees.push(tree);
    }
    trees
}

pub fn test_codec(tree: &Nbt) {
    let factories = [
        CodecFactory::default(),
        CodecFactory::new(|b| b.flatten_polymorphism(true).ignore_unknown_keys(true)),
        CodecFactory::new(|b| b.use_entry_list_maps(true).allow_string_values(true)),
    ];
    for factory in &factories {
        check_codec::<TestCompound>(factory, tree);
        check_codec::<WithEnum>(factory, tree);
        check_codec::<BTreeMap<String, i32>>(factory, tree);
        check_codec::<Vec<i32>>(factory, tree);
    }
}

pub fn test(data: &[u8]) {
    for tree in test_binary(data) {
        test_codec(&tree);
    }
}
