use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::interpreter::callable::FunctionRegistry;
use crate::interpreter::table::SymbolTable;

/// Global variables and user-defined functions at a point in time, sorted by
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot<'src> {
    pub globals: BTreeMap<&'src str, u64>,
    pub functions: Vec<FunctionSummary<'src>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSummary<'src> {
    pub name: &'src str,
    pub params: Vec<&'src str>,
    pub body_offset: usize,
}

impl<'src> StateSnapshot<'src> {
    pub fn new(globals: &SymbolTable<'src, u64>, functions: &FunctionRegistry<'src>) -> Self {
        let mut functions: Vec<_> = functions
            .user_functions()
            .map(|f| FunctionSummary {
                name: f.name,
                params: f.params.clone(),
                body_offset: f.body_offset,
            })
            .collect();
        functions.sort_by(|a, b| a.name.cmp(b.name));

        Self {
            globals: globals.iter().map(|(name, value)| (name, *value)).collect(),
            functions,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("state snapshot should be serializable")
    }
}

impl fmt::Display for FunctionSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fun {}({}) @{}",
            self.name,
            self.params.join(", "),
            self.body_offset
        )
    }
}

impl fmt::Display for StateSnapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.globals {
            writeln!(f, "{name} = {value}")?;
        }
        for function in &self.functions {
            writeln!(f, "{function}")?;
        }
        Ok(())
    }
}
