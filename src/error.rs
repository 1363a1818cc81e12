use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::scanner::span::{Keyword, Span};

/// Why a program was aborted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("expected '{0}'")]
    Expected(&'static str),

    #[error("expected an identifier")]
    ExpectedIdentifier,

    #[error("expected an expression")]
    ExpectedExpression,

    #[error("expected a statement")]
    ExpectedStatement,

    #[error("expected '=' or '(' after '{0}'")]
    ExpectedAssignOrCall(String),

    #[error("undefined function '{0}'")]
    UndefinedFunction(String),

    #[error("'{name}' expects {expected} argument(s) but got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("'else' without a preceding 'if'")]
    DanglingElse,

    #[error("functions cannot be defined inside a function")]
    NestedFunction,

    #[error("'{0}' is a reserved word")]
    ReservedWord(Keyword),

    #[error("unterminated block")]
    UnterminatedBlock,

    #[error("unexpected input after the last statement")]
    TrailingInput,
}

// ============= Script errors (with miette diagnostics) =============

#[derive(Error, Debug, Diagnostic)]
pub enum ScriptError {
    #[error("failed at offset {offset}: {fault}")]
    #[diagnostic(code(funscript::abort))]
    Abort {
        fault: Fault,
        offset: usize,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("failed to write program output")]
    #[diagnostic(code(funscript::output))]
    Output(#[from] std::io::Error),
}

impl ScriptError {
    pub fn abort(fault: Fault, span: Span) -> Self {
        Self::Abort {
            fault,
            offset: span.offset,
            span: span.into(),
            src: miette::NamedSource::new("input", String::new()),
        }
    }

    /// Attach source code for fancy miette diagnostics
    pub fn with_source_code(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        match self {
            Self::Abort {
                fault,
                offset,
                span,
                ..
            } => Self::Abort {
                fault,
                offset,
                span,
                src: miette::NamedSource::new(name.into(), source.into()),
            },
            other => other,
        }
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Abort { fault, .. } => Some(fault),
            Self::Output(_) => None,
        }
    }

    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Abort { offset, .. } => Some(*offset),
            Self::Output(_) => None,
        }
    }

    /// The classic fail-fast report: the byte offset on one line, then
    /// everything in `source` that was never consumed.
    pub fn display_with_remaining(&self, source: &str) -> String {
        match self {
            Self::Abort { offset, .. } => {
                format!("failed at offset {offset}\n{}", remaining(source, *offset))
            }
            Self::Output(e) => format!("failed to write program output: {e}"),
        }
    }
}

fn remaining(source: &str, offset: usize) -> &str {
    let mut start = offset.min(source.len());
    while !source.is_char_boundary(start) {
        start -= 1;
    }
    &source[start..]
}

// ============= Tests =============
