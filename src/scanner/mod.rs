pub mod cursor;
pub mod span;

pub use cursor::{Checkpoint, Cursor};
pub use span::{Keyword, Span};
