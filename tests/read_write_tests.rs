//! Binary NBT reading and writing

use na_codec::{
    Codec, CodecFactory, Error, Nbt, NbtCompound, NbtOps, from_reader_be, from_slice_be,
    from_slice_le, to_vec_be, to_vec_le, to_writer_le,
};
use serde::{Deserialize, Serialize};

fn sample() -> Nbt {
    Nbt::Compound(NbtCompound::from_iter([
        ("byte", Nbt::Byte(-1)),
        ("short", Nbt::Short(300)),
        ("int", Nbt::Int(70000)),
        ("long", Nbt::Long(1 << 40)),
        ("float", Nbt::Float(1.5)),
        ("double", Nbt::Double(-2.25)),
        ("string", Nbt::String("héllo \u{0}".into())),
        ("bytes", Nbt::ByteArray(vec![1, -2, 3])),
        ("ints", Nbt::IntArray(vec![1, 2])),
        ("longs", Nbt::LongArray(vec![-5])),
        (
            "list",
            Nbt::List(vec![Nbt::String("a".into()), Nbt::String("b".into())]),
        ),
        ("empty", Nbt::List(vec![])),
        (
            "nested",
            Nbt::Compound(NbtCompound::from_iter([("x", Nbt::Int(1))])),
        ),
    ]))
}

#[test]
fn test_round_trip_be() {
    let bytes = to_vec_be(&sample()).unwrap();
    assert_eq!(bytes[0], 10);
    assert_eq!(&bytes[1..3], &[0, 0]);
    assert_eq!(from_slice_be(&bytes).unwrap(), sample());
}

#[test]
fn test_round_trip_le() {
    let mut bytes = Vec::new();
    to_writer_le(&mut bytes, &sample()).unwrap();
    assert_eq!(bytes, to_vec_le(&sample()).unwrap());
    assert_eq!(from_slice_le(&bytes).unwrap(), sample());
}

#[test]
fn test_byte_order_matters() {
    let bytes = to_vec_be(&Nbt::Int(1)).unwrap();
    assert_eq!(bytes, vec![3, 0, 0, 0, 0, 0, 1]);
    assert_eq!(from_slice_le(&bytes).unwrap(), Nbt::Int(1 << 24));
}

#[test]
fn test_end_root() {
    assert_eq!(to_vec_be(&Nbt::End).unwrap(), vec![0]);
    assert_eq!(from_slice_be(&[0]).unwrap(), Nbt::End);
}

#[test]
fn test_from_reader() {
    let bytes = to_vec_be(&sample()).unwrap();
    assert_eq!(from_reader_be(bytes.as_slice()).unwrap(), sample());
}

#[test]
fn test_truncated_input() {
    let bytes = to_vec_be(&sample()).unwrap();
    for len in [0, 1, 2, bytes.len() / 2, bytes.len() - 1] {
        assert!(
            matches!(from_slice_be(&bytes[..len]), Err(Error::EndOfFile)),
            "length {len}"
        );
    }
}

#[test]
fn test_invalid_tag_type() {
    assert!(matches!(from_slice_be(&[0xff]), Err(Error::InvalidTagType(0xff))));
}

#[test]
fn test_trailing_data() {
    assert!(matches!(from_slice_be(&[0, 0, 0]), Err(Error::TrailingData(2))));
}

#[test]
fn test_negative_length() {
    // byte array with length -1
    let bytes = [7, 0, 0, 0xff, 0xff, 0xff, 0xff];
    assert!(from_slice_be(&bytes).is_err());
}

#[test]
fn test_invalid_mutf8_string() {
    // string root holding a lone 0xff byte
    let bytes = [8, 0, 0, 0, 1, 0xff];
    assert!(matches!(from_slice_be(&bytes), Err(Error::MalformedData(_))));

    // the encoded form of NUL is accepted
    let bytes = [8, 0, 0, 0, 2, 0xc0, 0x80];
    assert_eq!(from_slice_be(&bytes).unwrap(), Nbt::String("\0".into()));
}

#[test]
fn test_mixed_list_is_unsupported() {
    let list = Nbt::List(vec![Nbt::Int(1), Nbt::String("a".into())]);
    assert!(matches!(to_vec_be(&list), Err(Error::UnsupportedShape(_))));
}

#[test]
fn test_codec_through_binary() {
    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    enum Kind {
        Block { hardness: f32 },
        Fluid,
    }

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Entry {
        id: String,
        kinds: Vec<Kind>,
        mixed: (i32, String),
        light: Option<u8>,
    }

    let codec = CodecFactory::default().create::<Entry>();
    let entry = Entry {
        id: "water".to_owned(),
        kinds: vec![Kind::Fluid, Kind::Block { hardness: 1.0 }],
        mixed: (1, "a".to_owned()),
        light: Some(15),
    };
    let tree = codec.encode_start(&entry, &NbtOps).unwrap();
    let bytes = to_vec_be(&tree).unwrap();
    let read = from_slice_be(&bytes).unwrap();
    assert_eq!(read, tree);
    assert_eq!(codec.parse(&NbtOps, &read).unwrap(), entry);
}
