//! Preprocessor for C/C++ sources
//!
//! Handles the directives needed to decide which conditional branches are
//! live and what a macro evaluates to: `#define`, `#undef`, `#if`, `#ifdef`,
//! `#ifndef`, `#elif`, `#else`, `#endif`, `#include`, `#pragma` and `#error`.
//! Function-like macros, token pasting and stringizing are not supported.

pub mod conditional;
pub mod directive;
pub mod evaluator;
pub mod expr;
pub mod interpreter;
pub mod lines;
pub mod loader;
pub mod symbols;

pub use conditional::ConditionalStack;
pub use directive::Directive;
pub use evaluator::{evaluate, Evaluator, MAX_EVALUATION_DEPTH};
pub use expr::{eval_expression, strip_literal_suffixes, Expr, ExprParser, Value};
pub use interpreter::Interpreter;
pub use lines::{LineJoiner, LogicalLine};
pub use loader::{FsLoader, MemoryLoader, UnitLoader};
pub use symbols::{SymbolTable, SymbolValue};

/// Default limit on `#include` nesting
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 200;

/// Configuration for preprocessor evaluation
#[derive(Debug, Clone)]
pub struct PreprocessorConfig {
    /// Predefined symbols, visible to the top-level unit only
    pub symbols: SymbolTable,
    /// Treat unbalanced conditionals as errors instead of warnings
    pub strict: bool,
    /// Deepest allowed `#include` nesting
    pub max_include_depth: usize,
}

impl PreprocessorConfig {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            strict: false,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Predefine a symbol; an empty body defines it with no value
    pub fn define(&mut self, name: &str, body: &str) -> &mut Self {
        self.symbols.define(name, SymbolValue::from_body(body));
        self
    }

    /// Undefine a symbol
    pub fn undefine(&mut self, name: &str) -> &mut Self {
        self.symbols.undefine(name);
        self
    }

    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    pub fn max_include_depth(&mut self, depth: usize) -> &mut Self {
        self.max_include_depth = depth;
        self
    }
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self::new()
    }
}
