//! Property-based tests over randomly generated values

use std::io::Cursor;

use num_bigint::BigInt;
use proptest::prelude::*;

use otns::parse::cleanup::LeftoverState;
use otns::parse::{ByteParser, TryIntoParser};
use otns::{decode, decode_reader, encode, Decode, Encode, EncodeLength, ErrorKind, Parser, Value};

const PROPTEST_CASES: u32 = 512;

fn arb_int() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<i128>().prop_map(Value::from),
        (any::<u128>(), any::<u128>(), any::<bool>()).prop_map(|(hi, lo, neg)| {
            let n = (BigInt::from(hi) << 128u32) + BigInt::from(lo);
            Value::Int(if neg { -n } else { n })
        }),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        arb_int(),
        prop::collection::vec(any::<u8>(), 0..24).prop_map(Value::Bytes),
    ];
    leaf.prop_recursive(6, 96, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::List),
            prop::collection::vec((inner.clone(), inner), 0..8).prop_map(Value::Map),
        ]
    })
}

fn parser(wire: Vec<u8>) -> ByteParser {
    TryIntoParser::<ByteParser>::try_into_parser(wire).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: PROPTEST_CASES,
        ..ProptestConfig::default()
    })]

    #[test]
    fn round_trip(v in arb_value()) {
        let wire = encode(&v);
        prop_assert_eq!(decode(wire).unwrap(), v);
    }

    #[test]
    fn decoding_consumes_exactly_the_encoding(v in arb_value()) {
        let wire = encode(&v);
        let len = wire.len();
        let mut p = parser(wire);
        prop_assert_eq!(Value::parse(&mut p).unwrap(), v);
        prop_assert_eq!(p.offset(), len);
        prop_assert_eq!(p.cleanup().unwrap(), LeftoverState::Empty);
    }

    #[test]
    fn trailing_bytes_are_left_behind(v in arb_value(), tail in prop::collection::vec(any::<u8>(), 1..8)) {
        let mut wire = encode(&v);
        wire.extend_from_slice(&tail);
        let mut p = parser(wire);
        prop_assert_eq!(Value::parse(&mut p).unwrap(), v);
        prop_assert_eq!(p.cleanup().unwrap(), LeftoverState::Trailing(tail));
    }

    #[test]
    fn predicted_length_is_exact(v in arb_value()) {
        let wire = encode(&v);
        prop_assert_eq!(v.enc_len(), wire.len());
        prop_assert_eq!(v.write_to(&mut std::io::sink()), wire.len());
        prop_assert_eq!(v.to_bytes(), wire);
    }

    #[test]
    fn streaming_matches_in_memory(v in arb_value()) {
        let wire = encode(&v);
        prop_assert_eq!(decode_reader(Cursor::new(wire)).unwrap(), v);
    }

    #[test]
    fn proper_prefixes_never_decode(v in arb_value(), cut in any::<prop::sample::Index>()) {
        let wire = encode(&v);
        let prefix = wire[..cut.index(wire.len())].to_vec();
        prop_assert!(decode(prefix).is_err());
    }

    #[test]
    fn prefixes_fail_alike_in_memory_and_streamed(v in arb_value(), cut in any::<prop::sample::Index>()) {
        let wire = encode(&v);
        let prefix = &wire[..cut.index(wire.len())];
        let in_memory = decode(prefix).unwrap_err().kind();
        let streamed = decode_reader(prefix).unwrap_err().kind();
        prop_assert_eq!(in_memory, streamed);
    }

    #[test]
    fn length_field_is_minimal_decimal(payload in prop::collection::vec(any::<u8>(), 0..2048)) {
        let wire = encode(&Value::Bytes(payload.clone()));
        let header = payload.len().to_string();
        prop_assert!(wire.starts_with(header.as_bytes()));
        prop_assert_eq!(wire[header.len()], b',');
        prop_assert_eq!(&wire[header.len() + 1..], &payload[..]);
    }
}

#[test]
fn nine_digit_lengths_are_read() {
    let err = decode("999999999,").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);

    let err = decode("1000000000,").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedLength);

    let err = decode("0000000000,").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedLength);

    assert_eq!(decode("000000003,abc").unwrap(), Value::from("abc"));
}
