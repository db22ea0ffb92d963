//! Builder type implemented as a newtype around `Vec<u8>`
//!
//! `StrictBuilder` is named after Haskell's `Data.ByteString.Strict`.

use crate::conv::target::Target;

/// Newtype around `Vec<u8>` to use as a [`Builder`](super::Builder)
#[derive(PartialEq, Eq, Clone, Default)]
#[repr(transparent)]
pub struct StrictBuilder(Vec<u8>);

impl StrictBuilder {
    /// Creates an empty builder with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }
}

impl std::fmt::Debug for StrictBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StrictBuilder(b\"{}\")", self.0.escape_ascii())
    }
}

impl AsRef<[u8]> for StrictBuilder {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<StrictBuilder> for Vec<u8> {
    fn from(val: StrictBuilder) -> Self {
        val.0
    }
}

impl Target for StrictBuilder {
    fn anticipate(&mut self, extra: usize) {
        self.0.anticipate(extra)
    }

    fn create() -> Self {
        Self(Vec::create())
    }

    fn push_one(&mut self, b: u8) -> usize {
        self.0.push_one(b)
    }

    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize {
        self.0.push_many(arr)
    }

    fn push_all(&mut self, buf: &[u8]) -> usize {
        self.0.push_all(buf)
    }
}

impl super::Builder for StrictBuilder {
    /// `Final := Vec<u8>` distinguishes finalized from in-progress builders
    type Final = Vec<u8>;

    fn finalize(self) -> Self::Final {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::Builder;

    #[test]
    fn accumulates_pushes() {
        let mut b = StrictBuilder::create();
        b.push_decimal(5);
        b.push_all(b",hello");
        b.push_many(*b"0~");
        assert_eq!(format!("{:?}", b), "StrictBuilder(b\"5,hello0~\")");
        assert_eq!(b.as_ref().len(), 9);
        assert_eq!(b.into_bin().unwrap(), "5,hello0~");
    }
}
