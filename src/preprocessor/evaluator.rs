//! Macro evaluation
//!
//! A macro body is resolved in three passes: every identifier naming a macro
//! is replaced by that macro's computed value, integer-literal suffixes are
//! stripped, and the remaining text is evaluated as an expression.
//!
//! The names currently being expanded form the visit set. A name met again
//! while it is on the visit set is replaced by `0`, the value C gives to an
//! identifier left over after macro expansion. A circular macro therefore
//! always yields a number: `#define CIRCULAR CIRCULAR*2` evaluates to `0`.

use std::collections::HashMap;

use super::directive::split_word;
use super::expr::{eval_expression, is_ident_char, strip_literal_suffixes, Value};
use super::symbols::{SymbolTable, SymbolValue};
use crate::error::{PreprocessorError, Result};

/// Deepest chain of macros expanded inside one another
pub const MAX_EVALUATION_DEPTH: usize = 256;

/// Evaluates macros against a symbol table
pub struct Evaluator<'a> {
    symbols: &'a SymbolTable,
    visiting: Vec<String>,
}

impl<'a> Evaluator<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            visiting: Vec::new(),
        }
    }

    /// Compute the value of the macro `name`
    ///
    /// A macro defined with no body is an empty expression and fails with
    /// `InvalidExpression`.
    pub fn evaluate(&mut self, name: &str) -> Result<Value> {
        let symbols = self.symbols;
        let body = symbols.get(name)?.body();

        if self.visiting.len() >= MAX_EVALUATION_DEPTH {
            return Err(PreprocessorError::invalid_expression(format!(
                "macro expansion nested too deeply ({} levels) at {}",
                MAX_EVALUATION_DEPTH, name
            )));
        }

        self.visiting.push(name.to_string());
        let result = self.evaluate_expression(body);
        self.visiting.pop();

        result
    }

    /// Evaluate free expression text, resolving macro names and `defined`
    pub fn evaluate_expression(&mut self, text: &str) -> Result<Value> {
        let substituted = self.substitute(text)?;
        let stripped = strip_literal_suffixes(&substituted);
        log::trace!("evaluating '{}' as '{}'", text, stripped);
        eval_expression(&stripped)
    }

    /// Replace each identifier in `text` with the text of its value
    ///
    /// Each distinct name is evaluated once per call and reused for every
    /// later occurrence.
    fn substitute<'t>(&mut self, text: &'t str) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut resolved: HashMap<&'t str, String> = HashMap::new();
        let mut rest = text;

        while let Some(ch) = rest.chars().next() {
            if ch == '"' || ch == '\'' {
                let (literal, tail) = split_quoted(rest, ch);
                out.push_str(literal);
                rest = tail;
                continue;
            }

            if !is_ident_char(ch) {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
                continue;
            }

            let (word, tail) = split_word(rest);
            rest = tail;

            if ch.is_ascii_digit() {
                out.push_str(word);
            } else if word == "defined" {
                let (name, tail) = defined_operand(rest)?;
                rest = tail;
                out.push(if self.symbols.is_defined(name) { '1' } else { '0' });
            } else if self.visiting.iter().any(|visiting| visiting == word) {
                out.push('0');
            } else if let Some(value) = resolved.get(word) {
                out.push_str(value);
            } else if let SymbolValue::Empty = self.symbols.get(word)? {
                // Expands to nothing, as in C
            } else {
                let value = self.evaluate(word)?.to_expression_text();
                out.push_str(&value);
                resolved.insert(word, value);
            }
        }

        Ok(out)
    }
}

/// Split a string or character literal, quotes included, off the front of `text`
fn split_quoted(text: &str, quote: char) -> (&str, &str) {
    let mut escaped = false;
    for (index, ch) in text.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            return text.split_at(index + ch.len_utf8());
        }
    }
    (text, "")
}

/// Split the operand of `defined NAME` or `defined(NAME)` off `rest`
fn defined_operand(rest: &str) -> Result<(&str, &str)> {
    let missing = || PreprocessorError::invalid_expression("expected macro name after 'defined'");

    let rest = rest.trim_start();
    let (parenthesized, rest) = match rest.strip_prefix('(') {
        Some(inner) => (true, inner.trim_start()),
        None => (false, rest),
    };

    let (name, mut rest) = split_word(rest);
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(missing());
    }

    if parenthesized {
        rest = rest
            .trim_start()
            .strip_prefix(')')
            .ok_or_else(|| PreprocessorError::invalid_expression("expected ')' after defined("))?;
    }

    Ok((name, rest))
}

/// Compute the value of the macro `name` in `symbols`
pub fn evaluate(symbols: &SymbolTable, name: &str) -> Result<Value> {
    Evaluator::new(symbols).evaluate(name)
}
