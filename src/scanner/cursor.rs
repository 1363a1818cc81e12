use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{any, one_of, take_till, take_while};

use crate::error::{Fault, ScriptError};
use crate::scanner::span::Span;

/// A saved cursor position. Restoring one is the only form of backtracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

impl Checkpoint {
    pub fn offset(self) -> usize {
        self.0
    }
}

/// A read position inside the program text. The text itself is borrowed and
/// never copied; everything the cursor hands out is a view into it.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'src> {
    source: &'src str,
    pos: usize,
}

fn is_space(c: char) -> bool {
    // Same class as C's isspace: includes vertical tab and form feed.
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { source, pos: 0 }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    pub fn reset(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
    }

    /// Jump to an absolute byte offset, e.g. a recorded function body.
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset.min(self.source.len());
    }

    /// Run `parser` against the unread text. On success the cursor moves past
    /// whatever the parser consumed; on failure it stays put.
    fn scan<O>(&mut self, mut parser: impl Parser<&'src str, O, ContextError>) -> Option<O> {
        let mut input = self.rest();
        match parser.parse_next(&mut input) {
            Ok(out) => {
                self.pos = self.source.len() - input.len();
                Some(out)
            }
            Err(_) => None,
        }
    }

    pub fn skip_whitespace(&mut self) {
        self.scan(take_while(0.., is_space));
    }

    /// Skip whitespace, then consume `literal` if it comes next. Nothing but
    /// the whitespace is consumed on a mismatch.
    pub fn try_consume(&mut self, literal: &'static str) -> bool {
        self.skip_whitespace();
        self.scan(literal).is_some()
    }

    pub fn consume_or_fail(&mut self, literal: &'static str) -> Result<(), ScriptError> {
        if self.try_consume(literal) {
            Ok(())
        } else {
            Err(self.fail(Fault::Expected(literal)))
        }
    }

    /// An alphabetic character followed by any run of alphanumerics.
    pub fn try_consume_identifier(&mut self) -> Option<&'src str> {
        self.skip_whitespace();
        self.scan(
            (
                one_of(|c: char| c.is_ascii_alphabetic()),
                take_while(0.., |c: char| c.is_ascii_alphanumeric()),
            )
                .take(),
        )
    }

    /// A run of decimal digits, accumulated as `v = 10 * v + digit` in
    /// wrapping 64-bit arithmetic.
    pub fn try_consume_integer_literal(&mut self) -> Option<u64> {
        self.skip_whitespace();
        let digits = self.scan(take_while(1.., |c: char| c.is_ascii_digit()))?;
        Some(digits.bytes().fold(0u64, |v, d| {
            v.wrapping_mul(10).wrapping_add(u64::from(d - b'0'))
        }))
    }

    /// Skip the rest of a `#` comment, leaving the newline in place.
    pub fn skip_line(&mut self) {
        self.scan(take_till(0.., '\n'));
    }

    /// With the opening `{` already consumed, advance just past its matching
    /// `}`. Braces are counted textually, so braces inside comments count too.
    pub fn skip_balanced_block(&mut self) -> Result<(), ScriptError> {
        let mut depth = 1usize;
        loop {
            if self.try_consume("{") {
                depth += 1;
            } else if self.try_consume("}") {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            } else if self.scan(any::<_, ContextError>).is_none() {
                return Err(self.fail(Fault::UnterminatedBlock));
            }
        }
    }

    /// Skip trailing whitespace and fail if anything else is left.
    pub fn end_or_fail(&mut self) -> Result<(), ScriptError> {
        self.skip_whitespace();
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.fail(Fault::TrailingInput))
        }
    }

    /// Build the abort error for the current position.
    pub fn fail(&self, fault: Fault) -> ScriptError {
        let len = self.rest().chars().next().map_or(0, char::len_utf8);
        ScriptError::abort(fault, Span::new(self.pos, len))
    }
}
