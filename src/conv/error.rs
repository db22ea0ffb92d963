use crate::parse::{cleanup::LeftoverState, error::ParseError, ErrorKind};

/// Error returned when decoding a complete value from a source that first
/// has to be turned into a parser.
#[derive(Debug)]
#[non_exhaustive]
pub enum DecodeError {
    Parse(ParseError),
    /// Input remained after the value (only with `check_complete_parse`)
    NonEmpty(LeftoverState),
}

impl DecodeError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Parse(err) => err.kind(),
            DecodeError::NonEmpty(_) => ErrorKind::TrailingBytes,
        }
    }
}

impl From<std::convert::Infallible> for DecodeError {
    fn from(_void: std::convert::Infallible) -> Self {
        match _void {}
    }
}

impl From<ParseError> for DecodeError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Parse(err) => {
                write!(f, "parser encountered error: {}", err)
            }
            DecodeError::NonEmpty(state) => {
                write!(f, "input not fully consumed: {}", state)
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Parse(err) => Some(err),
            DecodeError::NonEmpty(_) => None,
        }
    }
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod test {
    fn dummy<T: Send + Sync>() {}

    #[test]
    fn decode_error_threadsafe() {
        dummy::<super::DecodeError>()
    }
}
