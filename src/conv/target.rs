/// Byte-oriented buffer with infallible incremental append operations
///
/// `Target` plays the role of [`std::io::Write`] for encoding, with the
/// difference that every `push_*` method is total. The returned `usize` is
/// the number of bytes appended, which callers use for book-keeping only.
///
/// All implementors must define these methods as infallible and total.
pub trait Target {
    /// Prepares for roughly `extra` more bytes to be appended, over an unknown
    /// number of push operations.
    ///
    /// A no-op for targets without a notion of capacity.
    fn anticipate(&mut self, extra: usize);

    /// Returns a fresh, empty target.
    fn create() -> Self;

    /// Appends a single byte, returning `1`.
    fn push_one(&mut self, b: u8) -> usize;

    /// Appends the bytes of a fixed-length array, returning `N`.
    ///
    /// Indistinguishable from calling `push_one` on each element in order.
    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize;

    /// Appends the bytes of a slice, returning its length.
    ///
    /// Indistinguishable from calling `push_one` on each element in order.
    fn push_all(&mut self, buf: &[u8]) -> usize;

    /// Appends the decimal ASCII digits of `n`, returning how many there were.
    fn push_decimal(&mut self, n: usize) -> usize {
        let mut digits = [0u8; 20];
        let mut ix = digits.len();
        let mut rem = n;
        loop {
            ix -= 1;
            digits[ix] = b'0' + (rem % 10) as u8;
            rem /= 10;
            if rem == 0 {
                break;
            }
        }
        self.push_all(&digits[ix..])
    }
}

/// Alias for `std::io::Sink`, used to count the number of bytes an encoding
/// would take without writing them anywhere.
pub type ByteCounter = std::io::Sink;

impl Target for ByteCounter {
    #[inline(always)]
    fn anticipate(&mut self, _: usize) {}

    #[inline]
    fn create() -> Self {
        std::io::sink()
    }

    #[inline(always)]
    fn push_one(&mut self, _: u8) -> usize {
        1
    }

    #[inline(always)]
    fn push_many<const N: usize>(&mut self, _: [u8; N]) -> usize {
        N
    }

    #[inline(always)]
    fn push_all(&mut self, buf: &[u8]) -> usize {
        buf.len()
    }
}

impl Target for Vec<u8> {
    #[inline]
    fn anticipate(&mut self, extra: usize) {
        self.reserve(extra)
    }

    #[inline]
    #[must_use]
    fn create() -> Self {
        Self::new()
    }

    #[inline]
    fn push_one(&mut self, b: u8) -> usize {
        self.push(b);
        1
    }

    #[inline]
    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize {
        self.extend(&arr);
        N
    }

    #[inline]
    fn push_all(&mut self, buf: &[u8]) -> usize {
        self.extend_from_slice(buf);
        buf.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decimal_digits() {
        let mut buf: Vec<u8> = Vec::create();
        assert_eq!(buf.push_decimal(0), 1);
        assert_eq!(buf.push_one(b' '), 1);
        assert_eq!(buf.push_decimal(999_999_999), 9);
        assert_eq!(buf.push_many(*b" x"), 2);
        assert_eq!(buf, b"0 999999999 x");
        assert_eq!(ByteCounter::create().push_decimal(usize::MAX), usize::MAX.to_string().len());
    }
}
