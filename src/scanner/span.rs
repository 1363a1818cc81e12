use std::fmt;

/// A byte range into the program text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// The text this span covers within `source`.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        let start = self.offset.min(source.len());
        let end = (self.offset + self.len).min(source.len());
        &source[start..end]
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::new(span.offset.into(), span.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.offset, self.offset + self.len)
    }
}

/// Words with statement-level meaning. They are ordinary identifiers to the
/// cursor and are only recognized once a whole identifier has been read.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    If,
    Else,
    While,
    Return,
    Fun,
}

impl Keyword {
    pub fn from_identifier(ident: &str) -> Option<Self> {
        ident.parse().ok()
    }
}
