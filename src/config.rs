//! Wire-format limits and runtime decoding options

/// Maximum number of digits in a length field
pub const MAX_LENGTH_DIGITS: usize = 9;

/// Largest length that fits in a length field
pub const MAX_DECLARED_LENGTH: usize = 999_999_999;

/// Container nesting depth permitted by [`DecodeConfig::default`]
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options governing a single decode call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecodeConfig {
    /// Number of containers that may be open at once; a container at a
    /// deeper level fails with `DepthLimitExceeded`. A value of `0` only
    /// admits scalar values.
    pub max_depth: usize,
}

impl DecodeConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub const fn with_max_depth(self, max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn limits_agree() {
        assert_eq!(MAX_DECLARED_LENGTH.to_string().len(), MAX_LENGTH_DIGITS);
        assert_eq!(DecodeConfig::default().max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(DecodeConfig::new().with_max_depth(3).max_depth, 3);
    }
}
