//! Byte-level parsing model
//!
//! This module provides the stream abstraction that every decoding
//! operation in this crate is written against. Decoding an element never
//! needs to look ahead or backtrack, so a source only has to hand out bytes
//! strictly front-to-back and report how far it has gotten.
//!
//! For decoding whole values rather than raw bytes, see the
//! [`Decode`](crate::conv::Decode) trait, which is built on top of the
//! definitions in this module.
//!
//! # Layout
//!
//! The top-level of this module defines the [`Parser`] trait, along with the
//! utility trait [`TryIntoParser<P>`] which allows a parser to be created
//! generically from a variety of source types. The sub-modules are:
//!   * `error` defines the hierarchy of errors that a `Parser` method, or a
//!     decoder built over one, can return.
//!   * `buffer` defines [`buffer::VecBuffer`], the owned buffer behind
//!     [`ByteParser`].
//!   * `cleanup` defines [`cleanup::LeftoverState`], which describes what is
//!     left of a parser once it is no longer needed.
//!   * `byteparser` and `readparser` contain the two implementing types,
//!     [`ByteParser`] (in-memory) and [`ReadParser`] (any [`std::io::Read`]).

pub mod error;
pub mod readparser;

pub use byteparser::ByteParser;
pub use error::{ErrorKind, ParseError, ParseResult};
pub use readparser::ReadParser;

use self::cleanup::LeftoverState;

/// # Parser
///
/// Abstraction over a stateful, forward-only byte source, with operations
/// for consuming bytes and for managing *context windows*.
///
/// ## Model
///
/// * All parsing is done in a non-backtracking fashion; a byte can only be
///   viewed by consuming it, and only after all preceding bytes have been
///   consumed. After a byte is consumed, it cannot be consumed again.
/// * A *context window*, or bounded contiguous view of the upcoming bytes,
///   may be opened. While a window is open, bytes beyond its upper bound
///   cannot be consumed until the window is closed, which is only possible
///   through [`enforce_target`] once every byte in the window has been
///   consumed.
///
/// The following properties are respected by each implementation:
///
/// * A fresh parser has `offset() == 0` and no open windows.
/// * `consume(n)` either returns exactly `n` bytes and advances the offset by
///   `n`, or fails. On failure, the offset is left unchanged when the request
///   crossed a window boundary; after a source failure it is unspecified.
/// * Immediately after a successful `set_fit(n)`, `remainder()` returns
///   `Some(n)`.
/// * `test_target()` returns `true` if and only if a window is open and all
///   of its bytes have been consumed.
///
/// [`enforce_target`]: Parser::enforce_target
pub trait Parser {
    /// Number of bytes consumed so far.
    fn offset(&self) -> usize;

    /// Number of bytes that may still be consumed in the current context,
    /// or `None` if that is not known in advance (a streaming source with no
    /// open window).
    fn remainder(&self) -> Option<usize>;

    /// Consumes and returns a single byte.
    ///
    /// Functionally equivalent to a [`consume`](Parser::consume) call of
    /// length `1`.
    fn consume_byte(&mut self) -> ParseResult<u8>;

    /// Attempts to consume and return exactly `nbytes` bytes.
    ///
    /// # Errors
    ///
    /// Fails with a [`WindowError`](error::WindowError) if the request
    /// crosses the innermost context window, or with a
    /// [`SourceError`](error::SourceError) if the source runs out or fails
    /// first.
    fn consume(&mut self, nbytes: usize) -> ParseResult<&[u8]>;

    /// Consumes and returns an owned `Vec<u8>` of length `nbytes`, under the
    /// same guarantees as [`consume`](Parser::consume).
    #[inline]
    fn take_dynamic(&mut self, nbytes: usize) -> ParseResult<Vec<u8>> {
        self.consume(nbytes).map(Vec::from)
    }

    /// Opens a context window that permits exactly `n` more bytes to be
    /// consumed before it is closed.
    fn set_fit(&mut self, n: usize) -> ParseResult<()>;

    /// Tests whether a context window is open and can be closed without
    /// consuming any more bytes.
    fn test_target(&mut self) -> ParseResult<bool>;

    /// Closes the innermost context window.
    ///
    /// Fails when no window is open, or when the window has unconsumed bytes.
    fn enforce_target(&mut self) -> ParseResult<()>;

    /// Returns `true` if the source has no bytes left at all.
    ///
    /// Unlike [`remainder`](Parser::remainder), this ignores context windows
    /// and may need to read ahead one byte from a streaming source. The byte
    /// is kept and handed out by the next consuming call.
    fn is_exhausted(&mut self) -> ParseResult<bool>;

    /// Discards the parser, returning a summary of any bytes that were never
    /// consumed and any context windows left open.
    fn cleanup(self) -> ParseResult<LeftoverState>
    where
        Self: Sized;
}

/// Conversion of a source value into a [`Parser`] of type `P`
///
/// Blanket-implemented for every type that converts into a
/// [`buffer::VecBuffer`], which covers byte slices, arrays, vectors and
/// strings.
pub trait TryIntoParser<P = ByteParser>
where
    P: Parser,
{
    type Error;

    fn try_into_parser(self) -> Result<P, Self::Error>;
}

impl<T> TryIntoParser<ByteParser> for T
where
    T: Into<buffer::VecBuffer>,
{
    type Error = std::convert::Infallible;

    fn try_into_parser(self) -> Result<ByteParser, Self::Error> {
        Ok(ByteParser::from_buffer(self.into()))
    }
}

pub mod buffer {
    //! Owned buffer type for [`ByteParser`](super::ByteParser)

    /// Newtype around `Vec<u8>` that only permits immutable access
    ///
    /// Used to signal the role of a `Vec<u8>` as the underlying buffer of a
    /// [`ByteParser`](super::ByteParser). None of the inherent methods mutate
    /// its contents.
    #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    #[repr(transparent)]
    pub struct VecBuffer(Vec<u8>);

    impl VecBuffer {
        /// Returns the number of bytes in a `VecBuffer`
        pub fn len(&self) -> usize {
            self.0.len()
        }

        /// Returns `true` if the buffer contains zero bytes
        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }

        /// Borrows `len` bytes starting at index `ix`.
        ///
        /// # Panics
        ///
        /// Will panic if `ix + len` is out-of-bounds
        pub fn get_slice(&self, ix: usize, len: usize) -> &[u8] {
            &self.0[ix..ix + len]
        }

        /// Returns the byte at index `ix`.
        ///
        /// # Panics
        ///
        /// Will panic if `ix` is out-of-bounds
        pub fn get_byte(&self, ix: usize) -> u8 {
            self.0[ix]
        }

        /// Borrows every byte from index `ix` onwards, or nothing if `ix` is
        /// past the end.
        pub fn tail(&self, ix: usize) -> &[u8] {
            self.0.get(ix..).unwrap_or_default()
        }
    }

    impl std::fmt::Debug for VecBuffer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "b\"{}\"", self.0.escape_ascii())
        }
    }

    impl From<&[u8]> for VecBuffer {
        fn from(bytes: &[u8]) -> Self {
            Self(bytes.to_owned())
        }
    }

    impl From<Vec<u8>> for VecBuffer {
        fn from(bytes: Vec<u8>) -> Self {
            Self(bytes)
        }
    }

    impl<const N: usize> From<[u8; N]> for VecBuffer {
        fn from(bytes: [u8; N]) -> Self {
            Self(bytes.to_vec())
        }
    }

    impl<const N: usize> From<&'_ [u8; N]> for VecBuffer {
        fn from(bytes: &'_ [u8; N]) -> Self {
            Self(bytes.to_vec())
        }
    }

    macro_rules! string_to_vecbuffer {
        ( $src:ty ) => {
            impl From<$src> for $crate::parse::buffer::VecBuffer {
                fn from(s: $src) -> Self {
                    Self(s.as_bytes().to_owned())
                }
            }
        };
    }

    string_to_vecbuffer!(&'_ str);
    string_to_vecbuffer!(String);
    string_to_vecbuffer!(&'_ String);
    string_to_vecbuffer!(std::borrow::Cow<'_, str>);
}

pub mod cleanup {
    //! State left behind by a parser that is no longer needed

    /// Summary of what a [`Parser`](super::Parser) had not yet processed when
    /// it was cleaned up.
    #[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
    pub enum LeftoverState {
        /// Every byte was consumed and no window was left open
        #[default]
        Empty,
        /// Bytes remained after the last element, outside of any window
        Trailing(Vec<u8>),
        /// Context windows were still open
        Windowed { open: usize, bytes: Vec<u8> },
    }

    impl LeftoverState {
        /// Classifies the leftover bytes and window count of a parser.
        pub fn new(open: usize, bytes: Vec<u8>) -> Self {
            match (open, bytes.is_empty()) {
                (0, true) => Self::Empty,
                (0, false) => Self::Trailing(bytes),
                (open, _) => Self::Windowed { open, bytes },
            }
        }

        pub fn is_empty(&self) -> bool {
            matches!(self, Self::Empty)
        }

        /// Unconsumed bytes, regardless of window state
        pub fn bytes(&self) -> &[u8] {
            match self {
                LeftoverState::Empty => &[],
                LeftoverState::Trailing(bytes) | LeftoverState::Windowed { bytes, .. } => bytes,
            }
        }
    }

    impl std::fmt::Display for LeftoverState {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                LeftoverState::Empty => write!(f, "no leftover bytes"),
                LeftoverState::Trailing(bytes) => {
                    write!(f, "{} trailing bytes \"{}\"", bytes.len(), bytes.escape_ascii())
                }
                LeftoverState::Windowed { open, bytes } => write!(
                    f,
                    "{} unclosed context windows over {} unconsumed bytes",
                    open,
                    bytes.len()
                ),
            }
        }
    }
}

pub mod byteparser {
    //! In-memory [`Parser`] over an owned buffer

    use crate::internal::{ContextOffset, IndexTracker};

    use super::buffer::VecBuffer;
    use super::cleanup::LeftoverState;
    use super::error::ParseResult;
    use super::Parser;

    /// Parser over an owned, fully-buffered byte sequence.
    ///
    /// As the total length is known, a context window that would reach past
    /// the end of the buffer is rejected when it is opened.
    #[derive(Debug)]
    pub struct ByteParser {
        buffer: VecBuffer,
        offset: ContextOffset,
    }

    impl ByteParser {
        /// Creates a `ByteParser` at offset 0 with no context windows.
        pub fn from_buffer(buffer: VecBuffer) -> Self {
            let offset = ContextOffset::with_limit(buffer.len());
            Self { buffer, offset }
        }

        /// Total number of bytes in the underlying buffer
        #[must_use]
        pub fn len(&self) -> usize {
            self.buffer.len()
        }

        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.buffer.is_empty()
        }
    }

    impl Parser for ByteParser {
        #[inline]
        fn offset(&self) -> usize {
            self.offset.index()
        }

        #[inline]
        fn remainder(&self) -> Option<usize> {
            Some(self.offset.rem())
        }

        fn consume_byte(&mut self) -> ParseResult<u8> {
            match self.offset.advance(1) {
                (ix, true) => Ok(self.buffer.get_byte(ix)),
                (_, false) => Err(self.offset.overrun(1)),
            }
        }

        fn consume(&mut self, nbytes: usize) -> ParseResult<&[u8]> {
            match self.offset.advance(nbytes) {
                (ix, true) => Ok(self.buffer.get_slice(ix, nbytes)),
                (_, false) => Err(self.offset.overrun(nbytes)),
            }
        }

        #[inline]
        fn set_fit(&mut self, n: usize) -> ParseResult<()> {
            self.offset.set_fit(n)
        }

        #[inline]
        fn test_target(&mut self) -> ParseResult<bool> {
            self.offset.test_target()
        }

        #[inline]
        fn enforce_target(&mut self) -> ParseResult<()> {
            self.offset.enforce_target()
        }

        fn is_exhausted(&mut self) -> ParseResult<bool> {
            Ok(self.offset.index() >= self.buffer.len())
        }

        fn cleanup(self) -> ParseResult<LeftoverState> {
            let rest = self.buffer.tail(self.offset.index()).to_vec();
            Ok(LeftoverState::new(self.offset.open_windows(), rest))
        }
    }
}

#[cfg(test)]
mod test {
    use super::buffer::VecBuffer;
    use super::cleanup::LeftoverState;
    use super::error::{ErrorKind, ParseError, WindowError};
    use super::{ByteParser, Parser, TryIntoParser};

    fn parser(src: impl Into<VecBuffer>) -> ByteParser {
        src.try_into_parser().unwrap()
    }

    #[test]
    fn consume_respects_windows() {
        let mut p = parser(b"abcdef");
        assert_eq!(p.consume_byte().unwrap(), b'a');
        p.set_fit(3).unwrap();
        assert_eq!(p.remainder(), Some(3));
        assert_eq!(p.consume(2).unwrap(), b"bc");
        assert!(matches!(
            p.consume(2),
            Err(ParseError::Window(WindowError::ConsumeWouldExceedLimit {
                offset: 3,
                requested: 2,
                limit: 4
            }))
        ));
        assert_eq!(p.offset(), 3);
        assert!(!p.test_target().unwrap());
        assert_eq!(p.consume_byte().unwrap(), b'd');
        assert!(p.test_target().unwrap());
        p.enforce_target().unwrap();
        assert_eq!(p.remainder(), Some(2));
    }

    #[test]
    fn running_off_the_end_is_eof() {
        let mut p = parser(b"ab");
        assert_eq!(p.consume(3).unwrap_err().kind(), ErrorKind::UnexpectedEof);
        assert_eq!(p.consume(2).unwrap(), b"ab");
        assert!(p.is_exhausted().unwrap());
        assert_eq!(p.consume_byte().unwrap_err().kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn window_past_end_of_buffer() {
        let mut p = parser(b"abc");
        assert!(matches!(
            p.set_fit(4),
            Err(ParseError::Window(WindowError::OpenWouldExceedBuffer {
                bytes_left: 3,
                request: 4
            }))
        ));
    }

    #[test]
    fn cleanup_reports_leftovers() {
        let mut p = parser("xyz");
        p.consume_byte().unwrap();
        assert_eq!(p.cleanup().unwrap(), LeftoverState::Trailing(b"yz".to_vec()));

        let mut p = parser(b"xyz");
        p.set_fit(2).unwrap();
        assert_eq!(
            p.cleanup().unwrap(),
            LeftoverState::Windowed {
                open: 1,
                bytes: b"xyz".to_vec()
            }
        );

        let mut p = parser(String::from("x"));
        p.consume(1).unwrap();
        assert!(p.cleanup().unwrap().is_empty());
    }
}
