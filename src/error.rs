//! Errors raised when converting host values into the value model
//!
//! Encoding a [`Value`](crate::Value) cannot fail. Failure is only possible at
//! the dynamic boundary in [`crate::ser`], where arbitrary `serde`-serializable
//! data has to be mapped onto the closed set of representable values.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum EncodeError {
    /// The host value has no counterpart in the value model
    UnsupportedType { type_name: &'static str },
    /// Error raised by a `Serialize` implementation
    Custom(String),
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::UnsupportedType { type_name } => {
                write!(f, "values of type {type_name} cannot be encoded")
            }
            EncodeError::Custom(msg) => f.write_str(msg),
        }
    }
}

impl Error for EncodeError {}

#[cfg(feature = "serde_impls")]
impl serde::ser::Error for EncodeError {
    fn custom<T: Display>(msg: T) -> Self {
        EncodeError::Custom(msg.to_string())
    }
}

pub type EncodeResult<T> = std::result::Result<T, EncodeError>;
