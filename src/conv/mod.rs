//! Core of the conversion API
//!
//! This module contains the high-level transcoding traits [`Encode`] and
//! [`Decode`]. They fill the role that `Serialize` and `Deserialize` fill in
//! `serde`, but are tied to the ordered tnetstring wire format and to the
//! [`Parser`] and [`Target`] abstractions of this crate.
//!
//! The sub-module [`len`] defines [`len::Estimable`], the length oracle that
//! lets a container's length field be written before its children. The
//! sub-module [`target`] defines [`target::Target`], the dual of
//! [`Parser`] on the encoding side.

use crate::parse::{ParseResult, Parser, TryIntoParser};

use self::len::Estimable;
use self::target::Target;

pub mod error;
pub mod len;
pub mod target;

pub use error::{DecodeError, DecodeResult};

/// Trait for types that can be written in ordered tnetstring form
///
/// Implementing [`Encode`] only requires [`write_to`](Encode::write_to);
/// the other methods have default implementations in terms of it.
pub trait Encode {
    /// Appends the encoded bytes of this value to a generic buffer,
    /// returning the exact number of bytes written.
    ///
    /// Infallible, and generic over any buffer that implements [`Target`].
    fn write_to<U: Target>(&self, buf: &mut U) -> usize;

    /// Appends the encoded bytes of this value to a `Vec<u8>`.
    #[inline]
    fn write_to_vec(&self, buf: &mut Vec<u8>) {
        let _ = self.write_to(buf);
    }

    /// Creates a new target and fills it with the encoded bytes of this
    /// value.
    #[must_use]
    #[inline]
    fn encode<U: Target>(&self) -> U {
        let mut buf: U = U::create();
        let _ = self.write_to::<U>(&mut buf);
        buf
    }

    /// Creates a `Vec<u8>` and fills it with the encoded bytes of this value.
    ///
    /// See [`EncodeLength::to_bytes_full`] for a variant that allocates the
    /// exact capacity up front.
    #[must_use]
    #[inline]
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to_vec(&mut buf);
        buf
    }
}

/// Extension trait for `Encode` that makes use of length oracles
pub trait EncodeLength: Encode {
    /// Computes, without allocation, the number of bytes in the encoded form
    /// of `self`.
    ///
    /// The default implementation runs [`Encode::write_to`] over the
    /// zero-allocation target [`ByteCounter`](target::ByteCounter).
    #[must_use]
    #[inline]
    fn enc_len(&self) -> usize {
        self.write_to(&mut std::io::sink())
    }

    /// Returns a `Vec<u8>` allocated with exactly [`enc_len`] bytes of
    /// capacity, holding the encoded form of `self`.
    ///
    /// [`enc_len`]: EncodeLength::enc_len
    #[must_use]
    fn to_bytes_full(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.enc_len());
        self.write_to_vec(&mut buf);
        buf
    }
}

impl<T: Encode + Estimable + ?Sized> EncodeLength for T {
    /// Uses [`Estimable::estimate`] in place of a counting pass.
    fn enc_len(&self) -> usize {
        self.estimate()
    }
}

/// Trait for types that can be read from ordered tnetstring form
pub trait Decode {
    /// Attempts to consume and interpret a value of type `Self` from a
    /// [`Parser`].
    ///
    /// On success the parser is left positioned at the first byte after the
    /// value, so several values can be read back-to-back from one source.
    ///
    /// # Errors
    ///
    /// Errors returned by [`Parser`] methods are propagated unchanged;
    /// violations of the wire format are reported as new `ParseError`s.
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self>
    where
        Self: Sized;

    /// Attempts to decode a value of type `Self` from `input`, by creating a
    /// fresh parser of type `P` over it and calling [`parse`](Decode::parse).
    ///
    /// # Errors
    ///
    /// Propagates errors from [`TryIntoParser::try_into_parser`] and from
    /// [`parse`](Decode::parse).
    ///
    /// In addition, if the feature-flag `check_complete_parse` is enabled,
    /// the parser is cleaned up after the value is read, and any leftover
    /// bytes are reported as [`DecodeError::NonEmpty`].
    fn try_decode<U, P>(input: U) -> DecodeResult<Self>
    where
        Self: Sized,
        P: Parser,
        U: TryIntoParser<P>,
        DecodeError: From<U::Error>,
    {
        let mut p: P = input.try_into_parser()?;
        let ret = Self::parse(&mut p)?;
        #[cfg(feature = "check_complete_parse")]
        {
            let res: crate::parse::cleanup::LeftoverState = p.cleanup()?;
            if !res.is_empty() {
                tracing::debug!(
                    leftover = %res,
                    bytes = res.bytes().len(),
                    "rejecting incomplete parse"
                );
                return Err(DecodeError::NonEmpty(res));
            }
        }
        Ok(ret)
    }
}
