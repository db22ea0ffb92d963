//! Offset and context windows for `Parser` implementations
//!
//! A parser consumes its input strictly front-to-back, so its only state is
//! a monotonically increasing [`Index`] and a stack of *context windows*:
//! target offsets that the index may reach but not pass. Every container
//! element opens a window covering exactly its declared body, which is how a
//! child that runs past the end of its parent is caught at the read that
//! would cross the boundary, rather than after the fact.
//!
//! [`ContextOffset`] bundles both and is shared between the in-memory and
//! streaming parsers; for streaming sources the absolute limit is simply
//! unknown and set to `usize::MAX`.

use crate::internal::stack::Stack;
use crate::parse::error::{ParseError, ParseResult, SourceError, WindowError};

/// Wrapper around [`usize`] that represents a monotonically increasing index
/// into a byte source.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[repr(transparent)]
pub struct Index(usize);

impl Index {
    /// Constructs a new `Index` object initialized to `0`
    #[inline(always)]
    #[must_use]
    pub fn new() -> Self {
        Self(0usize)
    }

    /// Advances the held value by `n` unless this would cause it to exceed
    /// `lim`.
    ///
    /// Returns the original value, along with `true` if and only if the
    /// increment took place.
    #[inline]
    pub fn increment_checked(&mut self, n: usize, lim: usize) -> (usize, bool) {
        let ret = self.0;
        let is_valid = matches!(self.0.checked_add(n), Some(tgt) if tgt <= lim);
        if is_valid {
            self.0 += n;
        }
        (ret, is_valid)
    }

    #[must_use]
    #[inline(always)]
    pub fn to_usize(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Tracker of a monotonically increasing index with an invariant absolute
/// limit that the index may reach but never exceed.
pub trait IndexTracker {
    /// Creates a tracker at index `0` whose absolute limit is `abs`.
    #[must_use]
    fn with_limit(abs: usize) -> Self;

    /// Current value of the index.
    #[must_use]
    fn index(&self) -> usize;

    /// Absolute upper bound on the index, as passed to [`with_limit`].
    ///
    /// [`with_limit`]: IndexTracker::with_limit
    #[must_use]
    fn absolute_limit(&self) -> usize;

    /// Current upper bound on the index.
    ///
    /// Never greater than [`absolute_limit`](IndexTracker::absolute_limit).
    #[inline]
    #[must_use]
    fn limit(&self) -> usize {
        self.absolute_limit()
    }

    /// Number of indices remaining in `index..limit`
    fn rem(&self) -> usize {
        debug_assert!(
            self.limit() >= self.index(),
            "Unsound IndexTracker implementation: limit < index"
        );
        self.limit() - self.index()
    }

    /// Attempt to increment the index by `n`.
    ///
    /// Returns the original index and whether the increment was performed.
    /// The index either stays put or moves by exactly `n`; it never saturates.
    fn advance(&mut self, n: usize) -> (usize, bool);
}

/// Rejects a new window target that would extend past the innermost
/// existing one.
#[inline]
const fn detect_error(innermost: Option<usize>, request: usize) -> Option<WindowError> {
    match innermost {
        Some(limit) if request > limit => {
            Some(WindowError::OpenWouldExceedWindow { limit, request })
        }
        _ => None,
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "smallvec_framestack")] {
        type FrameStorage = smallvec::SmallVec<[usize; 16]>;

        #[inline]
        fn new_storage() -> FrameStorage {
            smallvec::SmallVec::new()
        }
    } else {
        type FrameStorage = Vec<usize>;

        #[inline]
        fn new_storage() -> FrameStorage {
            Vec::new()
        }
    }
}

/// Stack of target offsets representing the bounds of open context windows.
///
/// By induction the targets are sorted with the smallest on top, since a
/// window may only open inside the innermost existing one.
#[derive(Debug)]
#[repr(transparent)]
pub struct FrameStack(FrameStorage);

impl FrameStack {
    fn new() -> Self {
        Self(new_storage())
    }

    /// Pushes a new target offset, failing with `OpenWouldExceedWindow` if it
    /// lies beyond the innermost open window.
    fn push_frame(&mut self, target: usize) -> ParseResult<()> {
        Ok(self.push_validated(target, detect_error)?)
    }
}

impl Stack for FrameStack {
    type Item = usize;

    fn peek(&self) -> Option<Self::Item> {
        self.0.peek()
    }

    fn pop(&mut self) -> Option<Self::Item> {
        self.0.pop()
    }

    fn push(&mut self, item: Self::Item) {
        self.0.push(item)
    }

    fn depth(&self) -> usize {
        self.0.depth()
    }
}

/// Current offset of a parser together with its stack of context windows.
#[derive(Debug)]
pub struct ContextOffset {
    abs: usize,
    frames: FrameStack,
    cur: Index,
}

impl ContextOffset {
    /// Opens a context window of `winsize` bytes starting at the current
    /// offset.
    ///
    /// Fails with `OpenWouldExceedBuffer` if the window extends past the
    /// absolute limit, or `OpenWouldExceedWindow` if it extends past the
    /// innermost open window.
    pub fn set_fit(&mut self, winsize: usize) -> ParseResult<()> {
        let cur = self.index();
        match cur.checked_add(winsize) {
            Some(new_tgt) if new_tgt <= self.abs => self.frames.push_frame(new_tgt),
            _ => Err(ParseError::Window(WindowError::OpenWouldExceedBuffer {
                bytes_left: self.abs - cur,
                request: winsize,
            })),
        }
    }

    /// Returns `true` when a window is open and the offset sits exactly on
    /// its target, i.e. when [`enforce_target`](Self::enforce_target) would
    /// succeed.
    pub fn test_target(&self) -> ParseResult<bool> {
        let cur = self.index();

        if let Some(tgt) = self.frames.peek() {
            match tgt.cmp(&cur) {
                std::cmp::Ordering::Equal => Ok(true),
                std::cmp::Ordering::Greater => Ok(false),
                std::cmp::Ordering::Less => Err(ParseError::Window(WindowError::OffsetOverflow {
                    excess: cur - tgt,
                })),
            }
        } else {
            Ok(false)
        }
    }

    /// Closes the innermost window.
    ///
    /// # Errors
    ///
    /// `CloseWithoutWindow` if no window is open, `CloseWithResidue` if the
    /// offset has not yet reached the window's target.
    pub fn enforce_target(&mut self) -> ParseResult<()> {
        let cur = self.index();

        match self.frames.pop() {
            None => Err(ParseError::Window(WindowError::CloseWithoutWindow)),
            Some(tgt) => match tgt.cmp(&cur) {
                std::cmp::Ordering::Equal => Ok(()),
                std::cmp::Ordering::Greater => {
                    Err(ParseError::Window(WindowError::CloseWithResidue {
                        residual: tgt - cur,
                    }))
                }
                std::cmp::Ordering::Less => Err(ParseError::Window(WindowError::OffsetOverflow {
                    excess: cur - tgt,
                })),
            },
        }
    }

    /// Number of context windows currently open
    pub fn open_windows(&self) -> usize {
        self.frames.depth()
    }

    /// Builds the error for a failed attempt to consume `requested` bytes.
    ///
    /// Inside a window the failure is a framing violation; outside of one it
    /// means the input ended early.
    pub fn overrun(&self, requested: usize) -> ParseError {
        let offset = self.index();
        match self.frames.peek() {
            Some(limit) => ParseError::Window(WindowError::ConsumeWouldExceedLimit {
                offset,
                requested,
                limit,
            }),
            None => ParseError::Source(SourceError::UnexpectedEof { offset, requested }),
        }
    }
}

impl IndexTracker for ContextOffset {
    fn with_limit(abs: usize) -> Self {
        Self {
            abs,
            frames: FrameStack::new(),
            cur: Index::new(),
        }
    }

    #[inline]
    fn index(&self) -> usize {
        self.cur.to_usize()
    }

    #[inline(always)]
    fn absolute_limit(&self) -> usize {
        self.abs
    }

    /// Upper bound of the innermost window, or the absolute limit if no
    /// window is open.
    #[inline]
    fn limit(&self) -> usize {
        self.frames.peek_or(self.abs)
    }

    #[inline]
    fn advance(&mut self, n: usize) -> (usize, bool) {
        let lim = self.limit();
        self.cur.increment_checked(n, lim)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse::error::ErrorKind;

    #[test]
    fn windows_nest_and_close() {
        let mut ctx = ContextOffset::with_limit(10);
        ctx.set_fit(6).unwrap();
        ctx.set_fit(4).unwrap();
        assert_eq!(ctx.limit(), 4);
        assert_eq!(ctx.open_windows(), 2);
        assert_eq!(ctx.advance(4), (0, true));
        assert!(ctx.test_target().unwrap());
        ctx.enforce_target().unwrap();
        assert_eq!(ctx.limit(), 6);
        assert!(!ctx.test_target().unwrap());
        assert!(matches!(
            ctx.enforce_target(),
            Err(ParseError::Window(WindowError::CloseWithResidue { residual: 2 }))
        ));
    }

    #[test]
    fn window_cannot_outgrow_parent() {
        let mut ctx = ContextOffset::with_limit(100);
        ctx.set_fit(5).unwrap();
        assert!(matches!(
            ctx.set_fit(6),
            Err(ParseError::Window(WindowError::OpenWouldExceedWindow { limit: 5, request: 6 }))
        ));
        assert!(matches!(
            ContextOffset::with_limit(3).set_fit(4),
            Err(ParseError::Window(WindowError::OpenWouldExceedBuffer { bytes_left: 3, request: 4 }))
        ));
    }

    #[test]
    fn overrun_depends_on_open_window() {
        let mut ctx = ContextOffset::with_limit(8);
        assert_eq!(ctx.overrun(9).kind(), ErrorKind::UnexpectedEof);
        ctx.set_fit(2).unwrap();
        assert_eq!(ctx.advance(3), (0, false));
        assert_eq!(ctx.overrun(3).kind(), ErrorKind::ContainerLengthMismatch);
    }

    #[test]
    fn unbounded_limit_does_not_overflow() {
        let mut ctx = ContextOffset::with_limit(usize::MAX);
        assert_eq!(ctx.advance(10), (0, true));
        assert!(ctx.set_fit(usize::MAX).is_err());
        assert_eq!(ctx.advance(usize::MAX), (10, false));
    }
}
