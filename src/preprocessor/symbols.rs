//! Symbol table for preprocessor defines

use std::collections::HashMap;

use crate::error::{PreprocessorError, Result};

/// Value of a defined preprocessor symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolValue {
    /// Defined with no body (`#define NAME`)
    Empty,
    /// Defined with a body expression
    Body(String),
}

impl SymbolValue {
    /// `Empty` for blank text, `Body` otherwise
    pub fn from_body(body: &str) -> Self {
        let body = body.trim();
        if body.is_empty() {
            SymbolValue::Empty
        } else {
            SymbolValue::Body(body.to_string())
        }
    }

    /// Body text, empty for `Empty`
    pub fn body(&self) -> &str {
        match self {
            SymbolValue::Empty => "",
            SymbolValue::Body(body) => body,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SymbolValue::Empty)
    }
}

/// Flat symbol table mapping macro names to values
///
/// A name maps to at most one value; redefinition replaces the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: HashMap<String, SymbolValue>,
}

impl SymbolTable {
    /// Create a new empty symbol table
    pub fn new() -> Self {
        Self {
            symbols: HashMap::new(),
        }
    }

    /// Define a symbol, replacing any previous definition
    pub fn define(&mut self, name: &str, value: SymbolValue) {
        self.symbols.insert(name.to_string(), value);
    }

    /// Undefine a symbol; absent names are ignored
    pub fn undefine(&mut self, name: &str) -> Option<SymbolValue> {
        self.symbols.remove(name)
    }

    /// Get the value of a symbol
    pub fn get(&self, name: &str) -> Result<&SymbolValue> {
        self.symbols
            .get(name)
            .ok_or_else(|| PreprocessorError::UndefinedSymbol(name.to_string()))
    }

    /// Check if a symbol is defined
    pub fn is_defined(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Union with `other`; entries from `other` win on conflict
    pub fn merge(&mut self, other: SymbolTable) {
        self.symbols.extend(other.symbols);
    }

    /// All defined symbol names, sorted
    pub fn defined_symbols(&self) -> Vec<String> {
        let mut names: Vec<String> = self.symbols.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymbolValue)> {
        self.symbols.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
