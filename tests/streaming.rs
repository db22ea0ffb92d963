//! Decoding from readers that deliver input piecemeal

use std::io::{self, Cursor, Read};

use otns::parse::ReadParser;
use otns::{decode, decode_reader, encode, DecodeConfig, ErrorKind, Value, ValueIter};

/// Reader handing out at most one byte per call, interleaved with
/// interruptions.
struct Trickle<R> {
    inner: R,
    interrupt: bool,
}

impl<R> Trickle<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            interrupt: false,
        }
    }
}

impl<R: Read> Read for Trickle<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.interrupt = !self.interrupt;
        if self.interrupt {
            return Err(io::ErrorKind::Interrupted.into());
        }
        let n = buf.len().min(1);
        self.inner.read(&mut buf[..n])
    }
}

fn sample() -> Value {
    Value::Map(vec![
        ("id".into(), 7.into()),
        (
            "tags".into(),
            Value::List(vec!["a".into(), "bc".into(), Value::Null]),
        ),
        ("ok".into(), true.into()),
    ])
}

#[test]
fn one_byte_at_a_time() {
    let wire = encode(&sample());
    let v = decode_reader(Trickle::new(Cursor::new(wire))).unwrap();
    assert_eq!(v, sample());
}

#[test]
fn pipelined_values() {
    let mut wire = Vec::new();
    let values = vec![sample(), Value::from(-12), Value::from("tail"), Value::Null];
    for v in &values {
        wire.extend(encode(v));
    }

    let decoded = ValueIter::new(ReadParser::new(Trickle::new(Cursor::new(wire))))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(decoded, values);
}

#[test]
fn iteration_stops_at_first_error() {
    let mut iter = ValueIter::new(ReadParser::new(Cursor::new(b"1#52#1x0~".to_vec())));
    assert_eq!(iter.next().unwrap().unwrap(), Value::from(5));
    assert_eq!(
        iter.next().unwrap().unwrap_err().kind(),
        ErrorKind::MalformedInteger
    );
    assert!(iter.next().is_none());
}

#[test]
fn iteration_ends_on_truncated_value() {
    let mut iter = ValueIter::new(ReadParser::new(Cursor::new(b"0~5,ab".to_vec())));
    assert_eq!(iter.next().unwrap().unwrap(), Value::Null);
    assert_eq!(
        iter.next().unwrap().unwrap_err().kind(),
        ErrorKind::UnexpectedEof
    );
    assert!(iter.next().is_none());
}

#[test]
fn huge_declared_length_on_short_stream() {
    let err = decode_reader(Cursor::new(b"999999999,abc".to_vec())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);

    let err = decode_reader(Cursor::new(b"999999999[1#1".to_vec())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContainerLengthMismatch);
}

#[test]
fn truncation_is_reported_alike_for_buffers_and_streams() {
    for input in [&b"50[1#1"[..], b"6[1#1", b"9{1,a", b"8[4[1#1", b"5,ab", b"12"] {
        let in_memory = decode(input).unwrap_err().kind();
        let streamed = decode_reader(Trickle::new(input)).unwrap_err().kind();
        assert_eq!(in_memory, streamed, "{}", input.escape_ascii());
    }
    assert_eq!(
        decode_reader(Cursor::new(b"9{1,a".to_vec())).unwrap_err().kind(),
        ErrorKind::ContainerLengthMismatch
    );
}

#[test]
fn reader_is_left_after_value() {
    let mut src = Cursor::new(b"4,abcd3#100rest".to_vec());
    assert_eq!(decode_reader(&mut src).unwrap(), Value::from("abcd"));
    assert_eq!(src.position(), 6);
    assert_eq!(decode_reader(&mut src).unwrap(), Value::from(100));

    let mut rest = String::new();
    src.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "rest");
}

#[test]
fn depth_limit_applies_to_streams() {
    let config = DecodeConfig::default().with_max_depth(1);
    let nested = ReadParser::new(Cursor::new(b"4[2[0[".to_vec()));
    let err = ValueIter::with_config(nested, config)
        .next()
        .unwrap()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthLimitExceeded);

    let flat = ReadParser::new(Cursor::new(b"4[0~0~".to_vec()));
    let v = ValueIter::with_config(flat, config).next().unwrap().unwrap();
    assert_eq!(v, Value::List(vec![Value::Null, Value::Null]));
}
