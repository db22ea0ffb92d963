//! Codec for ordered tnetstrings
//!
//! # Overview
//!
//! An ordered tnetstring is a self-describing, length-prefixed binary
//! serialization of a small value universe: null, booleans, arbitrary
//! precision integers, byte strings, lists and maps. Every element is written
//! as
//!
//! ```text
//! <length><tag><payload>
//! ```
//!
//! where `length` is the decimal byte count of `payload` (one to nine
//! digits) and `tag` is one of `#` (integer), `,` (bytes), `~` (null), `!`
//! (boolean), `[` (list) or `{` (map). Because the length comes first, any
//! element can be skipped or bounds-checked without parsing its contents.
//!
//! Maps are *ordered*: their pairs keep the order they were written in,
//! duplicate keys are kept, and keys may be any value, lists and maps
//! included.
//!
//! # Usage
//!
//! ```
//! use otns::Value;
//!
//! let v = otns::decode("30{5,hello20[11#123456789014,this").unwrap();
//! assert_eq!(v.get("hello").and_then(Value::as_list).map(<[_]>::len), Some(2));
//!
//! let nested = Value::Map(vec![(
//!     "hello".into(),
//!     Value::Map(vec![("world".into(), 42.into())]),
//! )]);
//! assert_eq!(otns::encode(&nested), b"21{5,hello11{5,world2#42");
//! ```
//!
//! # Layout
//!
//! The two halves of the codec are built on a pair of traits:
//!   * [`Decode`] reads a value from any [`Parser`](parse::Parser), a
//!     forward-only byte source that enforces container bounds through
//!     *context windows*. [`ByteParser`](parse::ByteParser) works over an
//!     in-memory buffer and [`ReadParser`](parse::ReadParser) over any
//!     [`std::io::Read`].
//!   * [`Encode`] writes a value to any [`Target`](conv::target::Target),
//!     with [`Estimable`](conv::len::Estimable) supplying exact lengths so
//!     that container headers can be written before their children.
//!
//! The wire grammar lives in [`element`], decoding limits in [`config`], and
//! the `serde` boundary (feature `serde_impls`, on by default) in [`ser`].
//!
//! # Feature flags
//!
//!   * `serde_impls`: `Serialize`/`Deserialize` for [`Value`], plus
//!     [`to_value`] and [`to_bytes`].
//!   * `check_complete_parse`: [`decode`] fails with
//!     [`DecodeError::NonEmpty`](conv::DecodeError::NonEmpty) when bytes
//!     remain after the value.
//!   * `smallvec_framestack`: keeps the stack of context windows inline.
//!   * `cli`: builds the `otns` command-line tool.

pub mod builder;
pub mod config;
pub mod conv;
pub mod element;
pub mod error;
mod internal;
pub mod parse;
#[cfg(feature = "serde_impls")]
pub mod ser;
pub mod value;

use std::io::{Read, Write};

pub use crate::builder::{strict::StrictBuilder, Builder};
pub use crate::config::DecodeConfig;
pub use crate::conv::{Decode, DecodeError, DecodeResult, Encode, EncodeLength};
pub use crate::element::{Tag, ValueIter};
pub use crate::error::EncodeError;
pub use crate::parse::{ErrorKind, ParseError, ParseResult, Parser};
#[cfg(feature = "serde_impls")]
pub use crate::ser::{to_bytes, to_value};
pub use crate::value::Value;

/// Decodes a single value from an in-memory source (a byte slice, array,
/// vector or string).
///
/// Bytes following the value are ignored, unless the `check_complete_parse`
/// feature is enabled.
pub fn decode<U>(input: U) -> DecodeResult<Value>
where
    U: parse::TryIntoParser,
    DecodeError: From<U::Error>,
{
    Value::try_decode::<U, parse::ByteParser>(input)
}

/// Decodes a single value from a reader, consuming no more bytes than the
/// value occupies.
pub fn decode_reader<R: Read>(reader: R) -> ParseResult<Value> {
    Value::parse(&mut parse::ReadParser::new(reader))
}

/// Encodes a value into a freshly allocated buffer of exactly the right
/// size.
#[must_use]
pub fn encode(value: &Value) -> Vec<u8> {
    encode_builder(value).into_vec()
}

/// Encodes a value into a writer.
pub fn encode_to_writer<W: Write>(value: &Value, mut writer: W) -> std::io::Result<()> {
    writer.write_all(encode_builder(value).as_ref())
}

fn encode_builder(value: &Value) -> StrictBuilder {
    let mut buf = StrictBuilder::with_capacity(value.enc_len());
    let _ = value.write_to(&mut buf);
    buf
}
