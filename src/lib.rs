pub mod error;
pub mod interpreter;
pub mod scanner;

// Re-export the main entry points for convenience
pub use error::{Fault, ScriptError};
pub use interpreter::Interpreter;
