//! Oracle for the exact byte-length of the encoded form of a value
//!
//! Every element is prefixed with the decimal length of its payload, and a
//! container's payload is the concatenation of its children's encodings.
//! Writing a container header therefore requires the exact size of each
//! child up front, which is what [`Estimable`] provides without encoding
//! anything.

/// Trait providing precise length-predictions for the encoded form of a
/// value.
///
/// Used both to write the length field of a container before its children,
/// and to pre-allocate a buffer large enough for an entire encoding.
pub trait Estimable {
    /// Optional override indicating that the length is the same for every
    /// value of `Self`.
    const KNOWN: Option<usize>;

    /// Infallible fallback that measures the encoded length of a particular
    /// value.
    fn unknown(&self) -> usize;

    /// Short-circuiting length function that returns `Self::KNOWN`, or the
    /// result of `self.unknown()` if the former is `None`.
    fn estimate(&self) -> usize {
        Self::KNOWN.unwrap_or_else(|| self.unknown())
    }
}

/// Number of decimal digits needed to write `n`
#[must_use]
pub const fn decimal_width(mut n: usize) -> usize {
    let mut width = 1;
    while n >= 10 {
        n /= 10;
        width += 1;
    }
    width
}

/// Total length of an element whose payload is `payload` bytes long: the
/// length field, the tag byte and the payload itself.
#[must_use]
pub const fn framed_width(payload: usize) -> usize {
    decimal_width(payload) + 1 + payload
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(decimal_width(0), 1);
        assert_eq!(decimal_width(9), 1);
        assert_eq!(decimal_width(10), 2);
        assert_eq!(decimal_width(999_999_999), 9);
        assert_eq!(decimal_width(1_000_000_000), 10);
        assert_eq!(framed_width(0), 2);
        assert_eq!(framed_width(5), 7);
        assert_eq!(framed_width(21), 24);
    }
}
