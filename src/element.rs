//! Wire grammar of a single element, and the codec for [`Value`]
//!
//! ```text
//! element = length tag payload
//! length  = 1*9DIGIT
//! tag     = "#" / "," / "~" / "!" / "[" / "{"
//! ```
//!
//! The length field counts the bytes of the payload only. A list payload is
//! the concatenation of its items' encodings, and a map payload alternates
//! key and value encodings.

use std::fmt::{Display, Formatter};

use num_bigint::BigInt;
use tracing::{debug, trace};

use crate::config::{DecodeConfig, MAX_DECLARED_LENGTH, MAX_LENGTH_DIGITS};
use crate::conv::len::{framed_width, Estimable};
use crate::conv::target::Target;
use crate::conv::{Decode, Encode};
use crate::parse::error::{
    FrameError, ParseError, ParseResult, SourceError, TokenError, WindowError,
};
use crate::parse::Parser;
use crate::value::Value;

/// Type tag of an element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Integer = b'#',
    Bytes = b',',
    Null = b'~',
    Boolean = b'!',
    List = b'[',
    Map = b'{',
}

impl Tag {
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'#' => Some(Tag::Integer),
            b',' => Some(Tag::Bytes),
            b'~' => Some(Tag::Null),
            b'!' => Some(Tag::Boolean),
            b'[' => Some(Tag::List),
            b'{' => Some(Tag::Map),
            _ => None,
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tag::Integer => "integer",
            Tag::Bytes => "bytes",
            Tag::Null => "null",
            Tag::Boolean => "boolean",
            Tag::List => "list",
            Tag::Map => "map",
        };
        f.write_str(name)
    }
}

/// Length field and tag of an element, with the offset it starts at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub offset: usize,
    pub length: usize,
    pub tag: Tag,
}

/// Reads the length field and tag byte of the next element.
///
/// Digits are consumed one at a time until the first non-digit, which is
/// taken as the tag. Leading zeros in the length are accepted.
///
/// # Errors
///
/// `ExpectedDigit` if the first byte is not a digit, `LengthTooLong` as soon
/// as a tenth digit is read, and `UnknownTag` if the byte after the digits is
/// not a tag.
pub fn read_header<P: Parser>(p: &mut P) -> ParseResult<Header> {
    let offset = p.offset();
    let first = p.consume_byte()?;
    if !first.is_ascii_digit() {
        return Err(TokenError::ExpectedDigit {
            offset,
            byte: first,
        }
        .into());
    }

    let mut digits = [0u8; MAX_LENGTH_DIGITS + 1];
    digits[0] = first;
    let mut n_digits = 1;
    let mut length = usize::from(first - b'0');

    loop {
        let byte = p.consume_byte()?;
        if byte.is_ascii_digit() {
            digits[n_digits] = byte;
            n_digits += 1;
            if n_digits > MAX_LENGTH_DIGITS {
                return Err(TokenError::LengthTooLong {
                    offset,
                    digits: digits[..n_digits].to_vec(),
                }
                .into());
            }
            length = length * 10 + usize::from(byte - b'0');
        } else {
            let tag = Tag::from_byte(byte).ok_or(TokenError::UnknownTag {
                offset: offset + n_digits,
                byte,
            })?;
            trace!(offset, length, %tag, "element header");
            return Ok(Header {
                offset,
                length,
                tag,
            });
        }
    }
}

/// Writes a length field and tag byte, returning the number of bytes written.
///
/// Lengths above [`MAX_DECLARED_LENGTH`] do not fit in the length field, and
/// are rejected by debug builds.
pub fn write_header<U: Target>(buf: &mut U, length: usize, tag: Tag) -> usize {
    debug_assert!(
        length <= MAX_DECLARED_LENGTH,
        "{tag} payload of {length} bytes exceeds the length field"
    );
    buf.push_decimal(length) + buf.push_one(tag.byte())
}

/// Checks that an integer payload is canonical decimal text: an optional
/// `-` followed by digits, with no leading zero except for `0` itself and no
/// negative zero.
fn is_canonical_integer(payload: &[u8]) -> bool {
    let digits = match payload {
        [b'-', rest @ ..] => rest,
        _ => payload,
    };
    match digits {
        [] => false,
        [b'0'] => digits.len() == payload.len(),
        [b'0', ..] => false,
        _ => digits.iter().all(u8::is_ascii_digit),
    }
}

fn parse_integer(offset: usize, payload: &[u8]) -> ParseResult<BigInt> {
    let malformed = || TokenError::MalformedInteger {
        offset,
        payload: payload.to_vec(),
    };
    if !is_canonical_integer(payload) {
        return Err(malformed().into());
    }
    BigInt::parse_bytes(payload, 10).ok_or_else(|| malformed().into())
}

fn parse_boolean(offset: usize, payload: &[u8]) -> ParseResult<bool> {
    match payload {
        b"true" => Ok(true),
        b"false" => Ok(false),
        _ => Err(TokenError::MalformedBoolean {
            offset,
            payload: payload.to_vec(),
        }
        .into()),
    }
}

/// Recursive-descent decoder for one element and its descendants
struct ElementDecoder<'a> {
    config: &'a DecodeConfig,
    depth: usize,
}

impl<'a> ElementDecoder<'a> {
    fn new(config: &'a DecodeConfig) -> Self {
        Self { config, depth: 0 }
    }

    fn descend(&self) -> Self {
        Self {
            config: self.config,
            depth: self.depth + 1,
        }
    }

    fn decode<P: Parser>(&self, p: &mut P) -> ParseResult<Value> {
        let header = read_header(p)?;
        let Header {
            offset,
            length,
            tag,
        } = header;
        match tag {
            Tag::Integer => {
                let payload = p.consume(length)?;
                Ok(Value::Int(parse_integer(offset, payload)?))
            }
            Tag::Bytes => Ok(Value::Bytes(p.take_dynamic(length)?)),
            Tag::Null if length == 0 => Ok(Value::Null),
            Tag::Null => Err(TokenError::MalformedNull { offset, length }.into()),
            Tag::Boolean => {
                let payload = p.consume(length)?;
                Ok(Value::Bool(parse_boolean(offset, payload)?))
            }
            Tag::List | Tag::Map => self.decode_container(p, header),
        }
    }

    fn decode_container<P: Parser>(&self, p: &mut P, header: Header) -> ParseResult<Value> {
        let Header {
            offset,
            length,
            tag,
        } = header;

        if self.depth >= self.config.max_depth {
            debug!(offset, limit = self.config.max_depth, "container nesting too deep");
            return Err(FrameError::DepthLimitExceeded {
                offset,
                limit: self.config.max_depth,
            }
            .into());
        }

        match p.set_fit(length) {
            Ok(()) => {}
            Err(ParseError::Window(WindowError::OpenWouldExceedBuffer { bytes_left, .. })) => {
                debug!(offset, length, bytes_left, "container runs past end of input");
                return Err(FrameError::ContainerTruncated {
                    offset,
                    declared: length,
                    available: bytes_left,
                }
                .into());
            }
            Err(e) => return Err(e),
        }

        debug!(offset, length, %tag, depth = self.depth, "container open");
        let body_start = p.offset();
        let child = self.descend();

        let value = if tag == Tag::List {
            let mut items = Vec::new();
            while !p.test_target()? {
                items.push(child.decode_within(p, header, body_start)?);
            }
            Value::List(items)
        } else {
            let mut pairs = Vec::new();
            while !p.test_target()? {
                let key = child.decode_within(p, header, body_start)?;
                if p.test_target()? {
                    debug!(offset, length, "map body ends after a key");
                    return Err(FrameError::OddMapBody {
                        offset,
                        declared: length,
                    }
                    .into());
                }
                let val = child.decode_within(p, header, body_start)?;
                pairs.push((key, val));
            }
            Value::Map(pairs)
        };

        p.enforce_target()?;
        debug!(offset, %tag, "container close");
        Ok(value)
    }

    /// Decodes one child of the container described by `parent`, reporting a
    /// read past the end of the container's body, or an end of input before
    /// it, as a framing error.
    fn decode_within<P: Parser>(
        &self,
        p: &mut P,
        parent: Header,
        body_start: usize,
    ) -> ParseResult<Value> {
        match self.decode(p) {
            Err(ParseError::Window(err)) => {
                debug!(offset = parent.offset, length = parent.length, %err, "nested element longer than container");
                Err(FrameError::ContainerOverrun {
                    offset: parent.offset,
                    declared: parent.length,
                    consumed: p.offset() - body_start,
                }
                .into())
            }
            Err(ParseError::Source(SourceError::UnexpectedEof { offset, .. })) => {
                debug!(
                    offset = parent.offset,
                    length = parent.length,
                    eof = offset,
                    "input ends inside container"
                );
                Err(FrameError::ContainerTruncated {
                    offset: parent.offset,
                    declared: parent.length,
                    available: p.offset() - body_start,
                }
                .into())
            }
            other => other,
        }
    }
}

impl Value {
    /// Decodes a single value from `p` under the limits in `config`.
    ///
    /// On success `p` is positioned directly after the value.
    pub fn parse_with<P: Parser>(p: &mut P, config: &DecodeConfig) -> ParseResult<Value> {
        ElementDecoder::new(config).decode(p)
    }

    /// Tag this value is encoded with
    #[must_use]
    pub fn tag(&self) -> Tag {
        match self {
            Value::Null => Tag::Null,
            Value::Bool(_) => Tag::Boolean,
            Value::Int(_) => Tag::Integer,
            Value::Bytes(_) => Tag::Bytes,
            Value::List(_) => Tag::List,
            Value::Map(_) => Tag::Map,
        }
    }

    /// Length of the payload this value is encoded with, excluding its own
    /// length field and tag.
    fn payload_len(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Bool(true) => 4,
            Value::Bool(false) => 5,
            Value::Int(n) => n.to_str_radix(10).len(),
            Value::Bytes(bytes) => bytes.len(),
            Value::List(items) => items.iter().map(Estimable::estimate).sum(),
            Value::Map(pairs) => pairs.iter().map(|(k, v)| k.estimate() + v.estimate()).sum(),
        }
    }
}

impl Decode for Value {
    /// Decodes with [`DecodeConfig::default`].
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        Value::parse_with(p, &DecodeConfig::default())
    }
}

impl Estimable for Value {
    const KNOWN: Option<usize> = None;

    fn unknown(&self) -> usize {
        framed_width(self.payload_len())
    }
}

impl Value {
    /// Records the payload length of every container in `self`, in the order
    /// the encoder visits them, and returns the encoded length of `self`.
    fn measure(&self, lengths: &mut Vec<usize>) -> usize {
        let payload = match self {
            Value::List(items) => Self::measure_body(items.iter(), lengths),
            Value::Map(pairs) => {
                Self::measure_body(pairs.iter().flat_map(|(k, v)| [k, v]), lengths)
            }
            scalar => scalar.payload_len(),
        };
        framed_width(payload)
    }

    fn measure_body<'a>(
        children: impl Iterator<Item = &'a Value>,
        lengths: &mut Vec<usize>,
    ) -> usize {
        let slot = lengths.len();
        lengths.push(0);
        let body = children.map(|child| child.measure(lengths)).sum();
        lengths[slot] = body;
        body
    }

    /// Writes `self` using container lengths produced by [`Value::measure`].
    fn write_measured<U: Target>(
        &self,
        buf: &mut U,
        lengths: &mut std::slice::Iter<'_, usize>,
    ) -> usize {
        match self {
            Value::Null => buf.push_many(*b"0~"),
            Value::Bool(true) => buf.push_many(*b"4!true"),
            Value::Bool(false) => buf.push_many(*b"5!false"),
            Value::Int(n) => {
                let text = n.to_str_radix(10);
                write_header(buf, text.len(), Tag::Integer) + buf.push_all(text.as_bytes())
            }
            Value::Bytes(bytes) => write_header(buf, bytes.len(), Tag::Bytes) + buf.push_all(bytes),
            Value::List(items) => Self::write_body(buf, Tag::List, items.iter(), lengths),
            Value::Map(pairs) => {
                Self::write_body(buf, Tag::Map, pairs.iter().flat_map(|(k, v)| [k, v]), lengths)
            }
        }
    }

    fn write_body<'a, U: Target>(
        buf: &mut U,
        tag: Tag,
        children: impl Iterator<Item = &'a Value>,
        lengths: &mut std::slice::Iter<'_, usize>,
    ) -> usize {
        let body = lengths.next().copied().unwrap_or_default();
        let head = write_header(buf, body, tag);
        buf.anticipate(body);
        let written: usize = children.map(|child| child.write_measured(buf, lengths)).sum();
        debug_assert_eq!(written, body);
        head + written
    }
}

impl Encode for Value {
    /// Measures every container once, then writes the value front to back.
    fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        let mut lengths = Vec::new();
        self.measure(&mut lengths);
        self.write_measured(buf, &mut lengths.iter())
    }
}

/// Iterator over values stored back-to-back in one source
///
/// Stops cleanly when the source is exhausted between two values. The first
/// error ends the iteration, as the position of the parser after a failure
/// is unspecified.
#[derive(Debug)]
pub struct ValueIter<P> {
    parser: P,
    config: DecodeConfig,
    done: bool,
}

impl<P: Parser> ValueIter<P> {
    pub fn new(parser: P) -> Self {
        Self::with_config(parser, DecodeConfig::default())
    }

    pub fn with_config(parser: P, config: DecodeConfig) -> Self {
        Self {
            parser,
            config,
            done: false,
        }
    }

    /// Returns the underlying parser, positioned after the last value read.
    pub fn into_parser(self) -> P {
        self.parser
    }
}

impl<P: Parser> Iterator for ValueIter<P> {
    type Item = ParseResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let ret = match self.parser.is_exhausted() {
            Ok(true) => None,
            Ok(false) => Some(Value::parse_with(&mut self.parser, &self.config)),
            Err(e) => Some(Err(e)),
        };
        self.done = !matches!(ret, Some(Ok(_)));
        ret
    }
}

impl<P: Parser> std::iter::FusedIterator for ValueIter<P> {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::conv::EncodeLength;
    use crate::parse::{ByteParser, ErrorKind, TryIntoParser};

    fn parser(bytes: &[u8]) -> ByteParser {
        bytes.try_into_parser().unwrap()
    }

    fn decode(bytes: &[u8]) -> ParseResult<Value> {
        Value::parse(&mut parser(bytes))
    }

    fn kind(bytes: &[u8]) -> ErrorKind {
        decode(bytes).unwrap_err().kind()
    }

    #[test]
    fn header_fields() {
        let mut p = parser(b"000012,");
        assert_eq!(
            read_header(&mut p).unwrap(),
            Header {
                offset: 0,
                length: 12,
                tag: Tag::Bytes
            }
        );
        assert_eq!(p.offset(), 7);
    }

    #[test]
    fn length_digit_boundary() {
        let err = read_header(&mut parser(b"9999999999,")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedLength);
        let header = read_header(&mut parser(b"999999999,")).unwrap();
        assert_eq!(header.length, 999_999_999);
    }

    #[test]
    fn unknown_tag_reports_its_position() {
        assert!(matches!(
            decode(b"3?123"),
            Err(ParseError::Token(TokenError::UnknownTag {
                offset: 1,
                byte: b'?'
            }))
        ));
        assert_eq!(kind(b"#123"), ErrorKind::MalformedLength);
        assert_eq!(kind(b""), ErrorKind::UnexpectedEof);
        assert_eq!(kind(b"12"), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn canonical_integers() {
        for ok in [&b"0"[..], b"7", b"-7", b"100", b"-123456789012345678901234567890"] {
            assert!(is_canonical_integer(ok), "{:?}", ok);
        }
        for bad in [&b""[..], b"-", b"-0", b"00", b"01", b"+1", b"1.0", b"1e3", b" 1", b"--1"] {
            assert!(!is_canonical_integer(bad), "{:?}", bad);
        }
        assert_eq!(kind(b"2#-0"), ErrorKind::MalformedInteger);
        assert_eq!(kind(b"0#"), ErrorKind::MalformedInteger);
        assert_eq!(decode(b"2#-5").unwrap(), Value::from(-5));
    }

    #[test]
    fn scalar_payload_errors() {
        assert_eq!(kind(b"1~x"), ErrorKind::MalformedNull);
        assert_eq!(kind(b"3!yes"), ErrorKind::MalformedBoolean);
        assert_eq!(kind(b"4!True"), ErrorKind::MalformedBoolean);
        assert_eq!(kind(b"5,abc"), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn container_framing() {
        assert_eq!(kind(b"4{5,12345"), ErrorKind::ContainerLengthMismatch);
        assert_eq!(kind(b"3[2#12"), ErrorKind::ContainerLengthMismatch);
        assert_eq!(kind(b"50[1#1"), ErrorKind::ContainerLengthMismatch);
        assert_eq!(kind(b"8[4[1#12#2"), ErrorKind::ContainerLengthMismatch);
        assert_eq!(kind(b"4{1#1"), ErrorKind::ContainerLengthMismatch);
        assert_eq!(kind(b"3{1#1"), ErrorKind::OddMapBody);
        assert!(matches!(
            decode(b"4{5,12345"),
            Err(ParseError::Frame(FrameError::ContainerOverrun {
                offset: 0,
                declared: 4,
                ..
            }))
        ));
    }

    #[test]
    fn depth_limit() {
        let nested = b"4[2[0[";
        let cfg = DecodeConfig::default().with_max_depth(2);
        assert_eq!(
            Value::parse_with(&mut parser(nested), &cfg).unwrap_err().kind(),
            ErrorKind::DepthLimitExceeded
        );
        let cfg = cfg.with_max_depth(3);
        let v = Value::parse_with(&mut parser(nested), &cfg).unwrap();
        assert_eq!(v, Value::List(vec![Value::List(vec![Value::List(vec![])])]));
        let scalar_only = DecodeConfig::new().with_max_depth(0);
        assert!(Value::parse_with(&mut parser(b"0["), &scalar_only).is_err());
        assert!(Value::parse_with(&mut parser(b"0~"), &scalar_only).is_ok());
    }

    #[test]
    fn encoded_length_is_exact() {
        let v = Value::Map(vec![
            (Value::from("k"), Value::from_iter([1, -20, 300])),
            (Value::List(vec![]), Value::from(BigInt::from(10).pow(30))),
            (Value::Null, Value::Bool(false)),
        ]);
        let bytes = v.to_bytes();
        assert_eq!(v.enc_len(), bytes.len());
        assert_eq!(v.to_bytes_full(), bytes);
        assert_eq!(decode(&bytes).unwrap(), v);
    }

    #[test]
    fn containers_are_measured_once_in_write_order() {
        let v = Value::Map(vec![
            (Value::from("a"), Value::List(vec![Value::Null, Value::List(vec![])])),
            (Value::List(vec![1.into()]), Value::Null),
        ]);
        let mut lengths = Vec::new();
        assert_eq!(v.measure(&mut lengths), v.to_bytes().len());
        assert_eq!(lengths, vec![16, 4, 0, 3]);
        assert_eq!(v.to_bytes(), b"16{1,a4[0~0[3[1#10~");
    }

    #[test]
    fn deep_nesting_encodes() {
        let mut v = Value::from(1);
        let mut expected = b"1#1".to_vec();
        for _ in 0..512 {
            v = Value::List(vec![v]);
            let mut framed = format!("{}[", expected.len()).into_bytes();
            framed.extend_from_slice(&expected);
            expected = framed;
        }
        assert_eq!(v.to_bytes(), expected);
        assert_eq!(v.enc_len(), expected.len());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "exceeds the length field")]
    fn oversized_length_field_is_caught() {
        let mut buf = Vec::new();
        write_header(&mut buf, MAX_DECLARED_LENGTH + 1, Tag::Bytes);
    }

    #[test]
    fn streams_report_truncated_containers() {
        use std::io::Cursor;

        use crate::parse::ReadParser;

        for input in [&b"50[1#1"[..], b"6[1#1", b"9{1,a", b"8[4[1#1"] {
            let err = Value::parse(&mut ReadParser::new(Cursor::new(input))).unwrap_err();
            assert!(
                matches!(err, ParseError::Frame(FrameError::ContainerTruncated { .. })),
                "{:?}",
                err
            );
            assert_eq!(err.kind(), kind(input));
        }
    }

    #[test]
    fn pipelined_values() {
        let mut values = ValueIter::new(parser(b"1#10~0[2#-1"));
        assert_eq!(values.next().unwrap().unwrap(), Value::from(1));
        assert_eq!(values.next().unwrap().unwrap(), Value::Null);
        assert_eq!(values.next().unwrap().unwrap(), Value::List(vec![]));
        assert_eq!(values.next().unwrap().unwrap(), Value::from(-1));
        assert!(values.next().is_none());
        assert!(values.next().is_none());

        let mut values = ValueIter::new(parser(b"0~x"));
        assert!(values.next().unwrap().is_ok());
        assert_eq!(values.next().unwrap().unwrap_err().kind(), ErrorKind::MalformedLength);
        assert!(values.next().is_none());
    }
}
