//! Extension trait for Targets that are built up and then frozen
//!
//! A `Builder` is a [`Target`] whose contents are accumulated through
//! `push_*` operations and then *finalized* into a read-oriented `Final`
//! value. The name comes from the `Builder` type of Haskell's `bytestring`
//! package.
//!
//! The only implementing type in this crate is [`strict::StrictBuilder`], a
//! newtype around `Vec<u8>`.

use std::string::FromUtf8Error;

use crate::conv::target::Target;

/// `Target` extension trait for accumulating encoded bytes
///
/// `Final` is the type the builder is frozen into by
/// [`finalize`](Builder::finalize). It must contain the same bytes in the
/// same order, and convert into a `Vec<u8>`.
pub trait Builder
where
    Self: Target + Sized,
{
    /// Type suitable for presenting the finalized contents of a `Builder`
    type Final: Into<Vec<u8>>;

    /// Converts a `Self` value into a `Self::Final` value once it is fully
    /// built.
    fn finalize(self) -> Self::Final;

    /// Consumes the builder and returns a vector of its contents
    fn into_vec(self) -> Vec<u8> {
        self.finalize().into()
    }

    /// Attempts to convert the contents into a `String`.
    ///
    /// Ordered tnetstrings are frequently, though not necessarily, valid
    /// UTF-8.
    fn into_bin(self) -> Result<String, FromUtf8Error> {
        String::from_utf8(self.into_vec())
    }
}

pub mod strict;
