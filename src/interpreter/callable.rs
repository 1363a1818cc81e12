use std::fmt;
use std::rc::Rc;

use crate::interpreter::table::SymbolTable;

/// Parameter name of the built-in `print`. It can never collide with a
/// name written in a program.
pub const PRINT_PARAM: &str = ".";

/// Something that can appear in call position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callable<'src> {
    Native(NativeFunction),
    User(UserFunction<'src>),
}

impl<'src> Callable<'src> {
    pub fn name(&self) -> &'src str {
        match self {
            Self::Native(n) => n.name(),
            Self::User(u) => u.name,
        }
    }

    pub fn params(&self) -> &[&'src str] {
        match self {
            Self::Native(n) => n.params(),
            Self::User(u) => &u.params,
        }
    }

    pub fn arity(&self) -> usize {
        self.params().len()
    }
}

impl fmt::Display for Callable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fun {}({})", self.name(), self.params().join(", "))?;
        if let Self::User(u) = self {
            write!(f, " @{}", u.body_offset)?;
        }
        Ok(())
    }
}

/// A function defined with `fun`. The body is not parsed until the function
/// is called; only the offset where it starts is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFunction<'src> {
    pub name: &'src str,
    pub params: Vec<&'src str>,
    /// Offset just past the closing `)` of the parameter list; the body's
    /// `{` is the next token.
    pub body_offset: usize,
}

/// Built-in functions, registered before the program starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFunction {
    Print,
}

impl NativeFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Print => "print",
        }
    }

    pub fn params(&self) -> &'static [&'static str] {
        match self {
            Self::Print => &[PRINT_PARAM],
        }
    }
}

/// Function name to definition. Redefinition replaces the previous entry.
#[derive(Debug, Clone)]
pub struct FunctionRegistry<'src> {
    table: SymbolTable<'src, Rc<Callable<'src>>>,
}

impl Default for FunctionRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'src> FunctionRegistry<'src> {
    /// A registry holding only the built-ins.
    pub fn new() -> Self {
        let mut registry = Self {
            table: SymbolTable::new(),
        };
        registry.define(Callable::Native(NativeFunction::Print));
        registry
    }

    pub fn define(&mut self, callable: Callable<'src>) {
        self.table.insert(callable.name(), Rc::new(callable));
    }

    pub fn get(&self, name: &str) -> Option<Rc<Callable<'src>>> {
        self.table.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// User-defined functions, in no particular order.
    pub fn user_functions(&self) -> impl Iterator<Item = &UserFunction<'src>> + '_ {
        self.table.iter().filter_map(|(_, callable)| match callable.as_ref() {
            Callable::User(u) => Some(u),
            Callable::Native(_) => None,
        })
    }
}
