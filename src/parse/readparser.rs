//! Streaming [`Parser`] over any [`std::io::Read`] source

use std::io::{self, Read};

use crate::internal::{ContextOffset, IndexTracker};

use super::cleanup::LeftoverState;
use super::error::{ParseResult, SourceError};
use super::Parser;

/// Parser that pulls bytes from a reader on demand.
///
/// Nothing beyond the bytes of the element currently being decoded is read,
/// apart from the single byte of lookahead taken by
/// [`is_exhausted`](Parser::is_exhausted). Payloads are read into a scratch
/// buffer that grows with the bytes actually delivered, so a declared length
/// alone never causes a large allocation.
///
/// The total length of the source is unknown, so a context window is only
/// checked against its enclosing window when opened. Running out of input
/// inside one surfaces as `UnexpectedEof` when the missing bytes are read,
/// which the element decoder reports as a truncated container.
///
/// Wrapping the reader in a [`std::io::BufReader`] is recommended for
/// unbuffered sources, as the length field of every element is read one byte
/// at a time.
#[derive(Debug)]
pub struct ReadParser<R> {
    reader: R,
    offset: ContextOffset,
    peeked: Option<u8>,
    scratch: Vec<u8>,
}

impl<R: Read> ReadParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: ContextOffset::with_limit(usize::MAX),
            peeked: None,
            scratch: Vec::new(),
        }
    }

    /// Unwraps the reader.
    ///
    /// A byte of lookahead held by the parser is lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn io_error(&self, error: io::Error) -> SourceError {
        SourceError::Io {
            offset: self.offset.index(),
            error,
        }
    }

    /// Reads a single byte, returning `None` at end of input.
    fn read_one(&mut self) -> ParseResult<Option<u8>> {
        if let Some(byte) = self.peeked.take() {
            return Ok(Some(byte));
        }
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.io_error(e).into()),
            }
        }
    }
}

impl<R: Read> Parser for ReadParser<R> {
    #[inline]
    fn offset(&self) -> usize {
        self.offset.index()
    }

    fn remainder(&self) -> Option<usize> {
        (self.offset.open_windows() > 0).then(|| self.offset.rem())
    }

    fn consume_byte(&mut self) -> ParseResult<u8> {
        if self.offset.rem() < 1 {
            return Err(self.offset.overrun(1));
        }
        match self.read_one()? {
            Some(byte) => {
                self.offset.advance(1);
                Ok(byte)
            }
            None => Err(SourceError::UnexpectedEof {
                offset: self.offset.index(),
                requested: 1,
            }
            .into()),
        }
    }

    fn consume(&mut self, nbytes: usize) -> ParseResult<&[u8]> {
        if self.offset.rem() < nbytes {
            return Err(self.offset.overrun(nbytes));
        }
        self.scratch.clear();
        if nbytes > 0 {
            if let Some(byte) = self.peeked.take() {
                self.scratch.push(byte);
            }
        }
        let wanted = u64::try_from(nbytes - self.scratch.len()).unwrap_or(u64::MAX);
        let res = (&mut self.reader).take(wanted).read_to_end(&mut self.scratch);
        if let Err(e) = res {
            return Err(self.io_error(e).into());
        }
        if self.scratch.len() < nbytes {
            return Err(SourceError::UnexpectedEof {
                offset: self.offset.index(),
                requested: nbytes,
            }
            .into());
        }
        self.offset.advance(nbytes);
        Ok(&self.scratch)
    }

    #[inline]
    fn set_fit(&mut self, n: usize) -> ParseResult<()> {
        self.offset.set_fit(n)
    }

    #[inline]
    fn test_target(&mut self) -> ParseResult<bool> {
        self.offset.test_target()
    }

    #[inline]
    fn enforce_target(&mut self) -> ParseResult<()> {
        self.offset.enforce_target()
    }

    fn is_exhausted(&mut self) -> ParseResult<bool> {
        if self.peeked.is_some() {
            return Ok(false);
        }
        self.peeked = self.read_one()?;
        Ok(self.peeked.is_none())
    }

    /// Reads the source to its end to collect whatever was left unconsumed.
    fn cleanup(mut self) -> ParseResult<LeftoverState> {
        let mut rest: Vec<u8> = self.peeked.take().into_iter().collect();
        if let Err(e) = self.reader.read_to_end(&mut rest) {
            return Err(self.io_error(e).into());
        }
        Ok(LeftoverState::new(self.offset.open_windows(), rest))
    }
}
