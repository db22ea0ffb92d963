//! Error types used to report failure while decoding
//!
//! This module defines the primary type [`ParseError`], the alias
//! [`ParseResult<T>`], and the classes of error grouped under it:
//!
//!   * [`TokenError`]: the bytes of a single element are lexically invalid
//!     (length field, tag byte, scalar payload).
//!   * [`FrameError`]: container framing is violated, or nesting is too deep.
//!   * [`WindowError`]: a parser context window was overrun or misused.
//!   * [`SourceError`]: the byte source itself ended early or failed.
//!
//! Every error records the byte offset it relates to. [`ParseError::kind`]
//! flattens the hierarchy into an [`ErrorKind`] for callers that only need to
//! tell failures apart.

use std::error::Error;
use std::fmt::{Display, Formatter, Result};

/// Renders a single byte the way it would appear in an escaped byte-string
/// literal.
struct ByteLit(u8);

impl Display for ByteLit {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", std::ascii::escape_default(self.0))
    }
}

/// Renders a byte run as an escaped literal.
struct BytesLit<'a>(&'a [u8]);

impl Display for BytesLit<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

/// Enumeration over all errors that may be encountered when decoding from a
/// [`Parser`](crate::parse::Parser).
#[derive(Debug)]
pub enum ParseError {
    /// Lexically invalid element
    Token(TokenError),
    /// Container framing or nesting violated
    Frame(FrameError),
    /// Context window overrun or misuse
    Window(WindowError),
    /// Byte source ended early or failed
    Source(SourceError),
}

/// Flat classification of a decoding failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedLength,
    UnknownTag,
    MalformedInteger,
    MalformedNull,
    MalformedBoolean,
    ContainerLengthMismatch,
    OddMapBody,
    DepthLimitExceeded,
    UnexpectedEof,
    Io,
    TrailingBytes,
}

impl ParseError {
    /// Returns the [`ErrorKind`] this error belongs to.
    ///
    /// Raw window errors are reported as `ContainerLengthMismatch`, as context
    /// windows only ever delimit container bodies.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Token(err) => err.kind(),
            ParseError::Frame(err) => err.kind(),
            ParseError::Window(_) => ErrorKind::ContainerLengthMismatch,
            ParseError::Source(SourceError::UnexpectedEof { .. }) => ErrorKind::UnexpectedEof,
            ParseError::Source(SourceError::Io { .. }) => ErrorKind::Io,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ParseError::Token(err) => Display::fmt(err, f),
            ParseError::Frame(err) => Display::fmt(err, f),
            ParseError::Window(err) => Display::fmt(err, f),
            ParseError::Source(err) => Display::fmt(err, f),
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseError::Token(err) => Some(err),
            ParseError::Frame(err) => Some(err),
            ParseError::Window(err) => Some(err),
            ParseError::Source(err) => Some(err),
        }
    }
}

/// Type alias for Result with an error type of [`ParseError`]
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors arising from the bytes of a single element
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenError {
    /// The first byte of an element was not a digit
    ExpectedDigit { offset: usize, byte: u8 },
    /// The length field ran to more than nine digits
    LengthTooLong { offset: usize, digits: Vec<u8> },
    /// The byte following the length field is not a known tag
    UnknownTag { offset: usize, byte: u8 },
    /// Integer payload is not canonical decimal text
    MalformedInteger { offset: usize, payload: Vec<u8> },
    /// Null element with a nonzero declared length
    MalformedNull { offset: usize, length: usize },
    /// Boolean payload other than `true` or `false`
    MalformedBoolean { offset: usize, payload: Vec<u8> },
}

impl TokenError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenError::ExpectedDigit { .. } | TokenError::LengthTooLong { .. } => {
                ErrorKind::MalformedLength
            }
            TokenError::UnknownTag { .. } => ErrorKind::UnknownTag,
            TokenError::MalformedInteger { .. } => ErrorKind::MalformedInteger,
            TokenError::MalformedNull { .. } => ErrorKind::MalformedNull,
            TokenError::MalformedBoolean { .. } => ErrorKind::MalformedBoolean,
        }
    }

    /// Byte offset of the element (or byte) the error refers to
    #[must_use]
    pub fn offset(&self) -> usize {
        match *self {
            TokenError::ExpectedDigit { offset, .. }
            | TokenError::LengthTooLong { offset, .. }
            | TokenError::UnknownTag { offset, .. }
            | TokenError::MalformedInteger { offset, .. }
            | TokenError::MalformedNull { offset, .. }
            | TokenError::MalformedBoolean { offset, .. } => offset,
        }
    }
}

impl From<TokenError> for ParseError {
    fn from(err: TokenError) -> Self {
        Self::Token(err)
    }
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::ExpectedDigit { offset, byte } => {
                write!(f, "expected '{}' to be a digit (byte {})", ByteLit(*byte), offset)
            }
            Self::LengthTooLong { offset, digits } => {
                write!(
                    f,
                    "{} is longer than 9 digits (byte {})",
                    BytesLit(digits),
                    offset
                )
            }
            Self::UnknownTag { offset, byte } => {
                write!(f, "unknown type '{}' (byte {})", ByteLit(*byte), offset)
            }
            Self::MalformedInteger { offset, payload } => {
                write!(
                    f,
                    "invalid integer payload \"{}\" (element at byte {})",
                    BytesLit(payload),
                    offset
                )
            }
            Self::MalformedNull { offset, length } => {
                write!(
                    f,
                    "null has length of 0, {} given (element at byte {})",
                    length, offset
                )
            }
            Self::MalformedBoolean { offset, payload } => {
                write!(
                    f,
                    "invalid boolean payload \"{}\" (element at byte {})",
                    BytesLit(payload),
                    offset
                )
            }
        }
    }
}

impl Error for TokenError {}

/// Errors arising from container framing
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum FrameError {
    /// A child element ran past the end of its container's declared body
    ContainerOverrun {
        offset: usize,
        declared: usize,
        consumed: usize,
    },
    /// A container's declared body extends past the end of the input
    ContainerTruncated {
        offset: usize,
        declared: usize,
        available: usize,
    },
    /// A map body ended after a key with no value following it
    OddMapBody { offset: usize, declared: usize },
    /// Containers nested deeper than the configured limit
    DepthLimitExceeded { offset: usize, limit: usize },
}

impl FrameError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrameError::ContainerOverrun { .. } | FrameError::ContainerTruncated { .. } => {
                ErrorKind::ContainerLengthMismatch
            }
            FrameError::OddMapBody { .. } => ErrorKind::OddMapBody,
            FrameError::DepthLimitExceeded { .. } => ErrorKind::DepthLimitExceeded,
        }
    }
}

impl From<FrameError> for ParseError {
    fn from(err: FrameError) -> Self {
        Self::Frame(err)
    }
}

impl Display for FrameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            FrameError::ContainerOverrun {
                offset,
                declared,
                consumed,
            } => write!(
                f,
                "nested element longer than container ({}-byte container at byte {}, overrun after {} bytes)",
                declared, offset, consumed
            ),
            FrameError::ContainerTruncated {
                offset,
                declared,
                available,
            } => write!(
                f,
                "{}-byte container at byte {} exceeds the {} bytes available",
                declared, offset, available
            ),
            FrameError::OddMapBody { offset, declared } => write!(
                f,
                "{}-byte map at byte {} ends with a key that has no value",
                declared, offset
            ),
            FrameError::DepthLimitExceeded { offset, limit } => write!(
                f,
                "container at byte {} exceeds the nesting limit of {}",
                offset, limit
            ),
        }
    }
}

impl Error for FrameError {}

/// Errors related to context windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    /// Consuming `requested` bytes at `offset` would cross the innermost
    /// window boundary `limit`.
    ConsumeWouldExceedLimit {
        offset: usize,
        requested: usize,
        limit: usize,
    },
    /// A window would extend past the end of the input.
    OpenWouldExceedBuffer { bytes_left: usize, request: usize },
    /// A window would be wider than the innermost open window.
    OpenWouldExceedWindow { limit: usize, request: usize },
    /// Closing a window that still has unconsumed bytes.
    CloseWithResidue { residual: usize },
    /// Closing a window when none is open.
    CloseWithoutWindow,
    /// The offset has passed the innermost window boundary.
    ///
    /// Only reachable through a bug in a `Parser` implementation.
    OffsetOverflow { excess: usize },
}

impl From<WindowError> for ParseError {
    fn from(err: WindowError) -> Self {
        Self::Window(err)
    }
}

impl Display for WindowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            WindowError::ConsumeWouldExceedLimit {
                limit,
                offset,
                requested,
            } => {
                write!(
                    f,
                    "cannot consume {} bytes at byte {} (window ends at byte {})",
                    requested, offset, limit
                )
            }
            WindowError::OpenWouldExceedBuffer {
                bytes_left,
                request,
            } => {
                write!(
                    f,
                    "cannot open {}-byte context window: only {} bytes remaining",
                    request, bytes_left
                )
            }
            WindowError::OpenWouldExceedWindow { limit, request } => {
                write!(
                    f,
                    "cannot open context window ending at byte {}: enclosing window ends at byte {}",
                    request, limit
                )
            }
            WindowError::CloseWithResidue { residual } => {
                write!(
                    f,
                    "cannot close context window with {} residual bytes",
                    residual
                )
            }
            WindowError::CloseWithoutWindow => write!(f, "no context window to close"),
            WindowError::OffsetOverflow { excess } => {
                write!(
                    f,
                    "BUG: detected an offset that exceeds the current limit by {} bytes",
                    excess
                )
            }
        }
    }
}

impl Error for WindowError {}

/// Errors originating from the byte source
#[derive(Debug)]
pub enum SourceError {
    /// The source ended before `requested` bytes could be read at `offset`
    UnexpectedEof { offset: usize, requested: usize },
    /// The underlying reader failed
    Io {
        offset: usize,
        error: std::io::Error,
    },
}

impl From<SourceError> for ParseError {
    fn from(err: SourceError) -> Self {
        Self::Source(err)
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            SourceError::UnexpectedEof { offset, requested } => write!(
                f,
                "input ended at byte {} while reading {} more bytes",
                offset, requested
            ),
            SourceError::Io { offset, error } => {
                write!(f, "read failed at byte {}: {}", offset, error)
            }
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SourceError::UnexpectedEof { .. } => None,
            SourceError::Io { error, .. } => Some(error),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn messages_name_the_offending_byte() {
        let err = ParseError::from(TokenError::ExpectedDigit { offset: 0, byte: b'#' });
        assert_eq!(err.to_string(), "expected '#' to be a digit (byte 0)");
        assert_eq!(err.kind(), ErrorKind::MalformedLength);

        let err = ParseError::from(TokenError::UnknownTag { offset: 1, byte: 0xff });
        assert_eq!(err.to_string(), "unknown type '\\xff' (byte 1)");

        let err = ParseError::from(TokenError::LengthTooLong {
            offset: 0,
            digits: b"9999999999".to_vec(),
        });
        assert_eq!(err.to_string(), "9999999999 is longer than 9 digits (byte 0)");
    }

    #[test]
    fn window_errors_classify_as_framing() {
        let err = ParseError::from(WindowError::CloseWithResidue { residual: 1 });
        assert_eq!(err.kind(), ErrorKind::ContainerLengthMismatch);
    }

    #[test]
    fn parse_error_threadsafe() {
        fn dummy<T: Send + Sync + 'static>() {}
        dummy::<ParseError>()
    }
}
