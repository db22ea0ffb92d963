//! Parser-internal state tracking
//!
//! Offset bookkeeping and the stack of context windows shared by the
//! `Parser` implementations in [`crate::parse`].

pub(crate) mod offset;
pub(crate) mod stack;

pub(crate) use offset::{ContextOffset, IndexTracker};
