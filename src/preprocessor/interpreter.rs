//! Directive interpreter
//!
//! Feeds logical lines through directive recognition and the conditional
//! stack, applying `#define`/`#undef`/`#include` to the symbol table while the
//! current position is active. While inactive only `#if`/`#ifdef`/`#ifndef`,
//! `#elif`/`#else` and `#endif` are looked at, and only to track nesting.

use super::conditional::ConditionalStack;
use super::directive::Directive;
use super::evaluator::Evaluator;
use super::expr::Value;
use super::lines::LineJoiner;
use super::loader::UnitLoader;
use super::symbols::{SymbolTable, SymbolValue};
use super::PreprocessorConfig;
use crate::error::{PreprocessorError, Result};

const DEFAULT_ERROR_MESSAGE: &str = "#error directive hit";

/// Interprets the directives of one translation unit
pub struct Interpreter<'l> {
    symbols: SymbolTable,
    conditionals: ConditionalStack,
    loader: &'l dyn UnitLoader,
    strict: bool,
    max_include_depth: usize,
    include_depth: usize,
    pragmas: Vec<String>,
}

impl<'l> Interpreter<'l> {
    pub fn new(loader: &'l dyn UnitLoader) -> Self {
        Self::with_config(loader, PreprocessorConfig::default())
    }

    pub fn with_config(loader: &'l dyn UnitLoader, config: PreprocessorConfig) -> Self {
        Self {
            symbols: config.symbols,
            conditionals: ConditionalStack::new(),
            loader,
            strict: config.strict,
            max_include_depth: config.max_include_depth,
            include_depth: 0,
            pragmas: Vec::new(),
        }
    }

    /// Fresh interpreter for an included unit
    fn child(&self) -> Interpreter<'l> {
        Interpreter {
            symbols: SymbolTable::new(),
            conditionals: ConditionalStack::new(),
            loader: self.loader,
            strict: self.strict,
            max_include_depth: self.max_include_depth,
            include_depth: self.include_depth + 1,
            pragmas: Vec::new(),
        }
    }

    /// Load `path` through the loader and process it
    pub fn process_unit(&mut self, path: &str) -> Result<()> {
        let lines = self.loader.load(path)?;
        self.process_lines(lines)
    }

    /// Process raw physical lines as one unit
    pub fn process_lines<I, S>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for logical in LineJoiner::new(lines) {
            if let Some(directive) = Directive::from_logical(&logical) {
                self.process_directive(&directive)?;
            }
        }
        self.finish()
    }

    /// Process text split on newlines as one unit
    pub fn process_source(&mut self, source: &str) -> Result<()> {
        self.process_lines(source.lines())
    }

    /// Apply a single directive
    pub fn process_directive(&mut self, directive: &Directive) -> Result<()> {
        log::trace!(
            "line {}: #{} {}",
            directive.line,
            directive.command,
            directive.args
        );

        match directive.command.as_str() {
            "ifdef" | "ifndef" => {
                let taken = if self.conditionals.is_active() {
                    if directive.symbol.is_empty() {
                        warn_missing_name(directive);
                    }
                    self.symbols.is_defined(&directive.symbol) == (directive.command == "ifdef")
                } else {
                    false
                };
                self.open_block(directive, taken);
            }
            "if" => {
                let taken = self.conditionals.is_active() && self.condition(directive)?;
                self.open_block(directive, taken);
            }
            "elif" => {
                let taken = self.conditionals.elif_pending() && self.condition(directive)?;
                if !self.conditionals.elif(taken) {
                    self.unbalanced_else(directive)?;
                }
            }
            "else" => {
                if !self.conditionals.else_branch() {
                    self.unbalanced_else(directive)?;
                }
            }
            "endif" => {
                if self.conditionals.endif() {
                    log::debug!(
                        "line {}: #endif, inactive depth {}",
                        directive.line,
                        self.conditionals.inactive_depth()
                    );
                } else if self.strict {
                    return Err(PreprocessorError::UnbalancedEndif {
                        line: directive.line,
                    });
                } else {
                    log::warn!("line {}: #endif without #if ignored", directive.line);
                }
            }
            _ if !self.conditionals.is_active() => {}
            "define" | "undef" if directive.symbol.is_empty() => warn_missing_name(directive),
            "define" => {
                let name = directive.symbol.as_str();
                if self.symbols.is_defined(name) {
                    log::debug!("line {}: redefining {}", directive.line, name);
                }
                log::debug!("line {}: define {} = '{}'", directive.line, name, directive.body);
                self.symbols
                    .define(name, SymbolValue::from_body(&directive.body));
            }
            "undef" => {
                let name = directive.symbol.as_str();
                if self.symbols.undefine(name).is_some() {
                    log::debug!("line {}: undef {}", directive.line, name);
                }
            }
            "pragma" => {
                if !directive.args.is_empty() {
                    log::info!(target: "pragma", "{}", directive.args);
                    self.pragmas.push(directive.args.clone());
                }
            }
            "error" => {
                let message = match unquote(&directive.args) {
                    "" => DEFAULT_ERROR_MESSAGE,
                    message => message,
                };
                return Err(PreprocessorError::directive(message));
            }
            "warning" => log::warn!("line {}: #warning {}", directive.line, directive.args),
            "include" => self.include(directive)?,
            other => log::trace!("line {}: ignoring #{}", directive.line, other),
        }

        Ok(())
    }

    fn open_block(&mut self, directive: &Directive, taken: bool) {
        self.conditionals.push(taken, directive.line);
        log::debug!(
            "line {}: #{} {} -> {}, inactive depth {}",
            directive.line,
            directive.command,
            directive.args,
            if taken { "taken" } else { "skipped" },
            self.conditionals.inactive_depth()
        );
    }

    fn condition(&self, directive: &Directive) -> Result<bool> {
        Ok(self.evaluate_expression(&directive.args)?.as_bool())
    }

    fn unbalanced_else(&self, directive: &Directive) -> Result<()> {
        if self.strict {
            return Err(PreprocessorError::UnbalancedElse {
                line: directive.line,
                directive: format!("#{}", directive.command),
            });
        }
        log::warn!(
            "line {}: #{} without matching #if ignored",
            directive.line,
            directive.command
        );
        Ok(())
    }

    /// Run the included unit in a child interpreter and merge its table
    fn include(&mut self, directive: &Directive) -> Result<()> {
        let path = include_path(&directive.args)?;

        if self.include_depth >= self.max_include_depth {
            return Err(PreprocessorError::directive(format!(
                "#include nested too deeply ({} levels) at \"{}\"",
                self.max_include_depth, path
            )));
        }

        log::debug!("line {}: including \"{}\"", directive.line, path);
        let mut child = self.child();
        child.process_unit(path)?;

        let Interpreter {
            symbols, pragmas, ..
        } = child;
        log::debug!("merging {} symbol(s) from \"{}\"", symbols.len(), path);
        self.pragmas.extend(pragmas);
        self.symbols.merge(symbols);
        Ok(())
    }

    /// Check for unclosed blocks at the end of a unit
    fn finish(&mut self) -> Result<()> {
        let open = self.conditionals.open_blocks();
        if open > 0 {
            if self.strict {
                return Err(PreprocessorError::UnclosedBlock { count: open });
            }
            log::warn!(
                "{} unclosed conditional block(s) at end of file, innermost opened at line {}",
                open,
                self.conditionals.innermost_line().unwrap_or_default()
            );
        }
        self.conditionals = ConditionalStack::new();
        Ok(())
    }

    /// Compute the value of the macro `name` against the current table
    pub fn evaluate(&self, name: &str) -> Result<Value> {
        Evaluator::new(&self.symbols).evaluate(name)
    }

    /// Evaluate expression text against the current table
    pub fn evaluate_expression(&self, text: &str) -> Result<Value> {
        Evaluator::new(&self.symbols).evaluate_expression(text)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn into_symbols(self) -> SymbolTable {
        self.symbols
    }

    /// Text of every active `#pragma`, included units' first at their include point
    pub fn pragmas(&self) -> &[String] {
        &self.pragmas
    }

    pub fn is_active(&self) -> bool {
        self.conditionals.is_active()
    }

    pub fn inactive_depth(&self) -> usize {
        self.conditionals.inactive_depth()
    }
}

/// Nameless `#define`/`#undef` are no-ops; a nameless `#ifdef` is never taken
fn warn_missing_name(directive: &Directive) {
    log::warn!(
        "line {}: no macro name given in #{} directive",
        directive.line,
        directive.command
    );
}

/// Drop one pair of surrounding double quotes
fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(text)
}

/// Path inside `"..."` or `<...>`
fn include_path(text: &str) -> Result<&str> {
    if text.is_empty() {
        return Err(PreprocessorError::directive("#include without filename"));
    }

    let malformed = || {
        PreprocessorError::directive(format!(
            "#include expects \"FILENAME\" or <FILENAME>, found {}",
            text
        ))
    };

    let close = match text.chars().next() {
        Some('"') => '"',
        Some('<') => '>',
        _ => return Err(malformed()),
    };

    let inner = &text[1..];
    let end = inner.find(close).ok_or_else(malformed)?;
    match &inner[..end] {
        "" => Err(PreprocessorError::directive("#include without filename")),
        path => Ok(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessor::loader::MemoryLoader;

    const CONDITIONAL: &str = r#"
#define COND1
#ifdef COND1
#define COND2 0O1
#if COND2
#define COND3 0x0U
#if COND3
#define COND4 "Should not get here!"
#error
#endif // COND3
#endif // COND2
#endif // COND1
#undef COND1
#ifdef COND1
#define COND4 "Not here either!"
#error
#endif
"#;

    fn run(source: &str) -> Result<SymbolTable> {
        let loader = MemoryLoader::new();
        let mut interpreter = Interpreter::new(&loader);
        interpreter.process_source(source)?;
        Ok(interpreter.into_symbols())
    }

    #[test]
    fn test_symbol_finding() {
        let symbols = run("#define TEST\ndefine TEST2\n#define MACRO 1+2\\\n        +4+5\\\n        *3\n").unwrap();
        assert!(symbols.is_defined("TEST"));
        assert!(!symbols.is_defined("TEST2"));
        assert_eq!(symbols.get("MACRO").unwrap().body(), "1+2+4+5*3");
        assert_eq!(symbols.len(), 2);
    }

    #[test]
    fn test_conditional() {
        let symbols = run(CONDITIONAL).unwrap();
        assert!(!symbols.is_defined("COND1"));
        assert!(symbols.is_defined("COND2"));
        assert!(symbols.is_defined("COND3"));
        assert!(!symbols.is_defined("COND4"));
    }

    #[test]
    fn test_ifndef_and_else() {
        let source = "\
#ifndef GUARD
#define GUARD
#define FIRST 1
#else
#define SECOND 1
#endif
#ifndef GUARD
#define THIRD 1
#else
#define FOURTH 1
#endif
";
        let symbols = run(source).unwrap();
        assert_eq!(symbols.defined_symbols(), ["FIRST", "FOURTH", "GUARD"]);
    }

    #[test]
    fn test_elif_chain() {
        let source = "\
#define LEVEL 2
#if LEVEL == 1
#define PICK 10
#elif LEVEL == 2
#define PICK 20
#elif LEVEL >= 2
#define PICK 30
#else
#define PICK 40
#endif
";
        let loader = MemoryLoader::new();
        let mut interpreter = Interpreter::new(&loader);
        interpreter.process_source(source).unwrap();
        assert_eq!(interpreter.evaluate("PICK").unwrap(), 20);
    }

    #[test]
    fn test_inactive_region_is_not_evaluated() {
        let source = "\
#ifdef MISSING
#if UNDEFINED_NAME + 1
#elif 1 / 0
#endif
#include
#error never
#pragma never
#endif
";
        let loader = MemoryLoader::new();
        let mut interpreter = Interpreter::new(&loader);
        interpreter.process_source(source).unwrap();
        assert!(interpreter.pragmas().is_empty());
        assert!(interpreter.symbols().is_empty());
    }

    #[test]
    fn test_if_on_undefined_symbol_fails() {
        assert!(matches!(
            run("#if UNDEFINED\n#endif\n"),
            Err(PreprocessorError::UndefinedSymbol(name)) if name == "UNDEFINED"
        ));
    }

    #[test]
    fn test_error_directive() {
        match run("#error \"boom\"") {
            Err(PreprocessorError::Directive { message }) => assert_eq!(message, "boom"),
            other => panic!("expected directive error, got {:?}", other.map(|_| ())),
        }
        match run("#error") {
            Err(PreprocessorError::Directive { message }) => {
                assert_eq!(message, DEFAULT_ERROR_MESSAGE)
            }
            other => panic!("expected directive error, got {:?}", other.map(|_| ())),
        }
        match run("#error unsupported platform") {
            Err(PreprocessorError::Directive { message }) => {
                assert_eq!(message, "unsupported platform")
            }
            other => panic!("expected directive error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_pragma_side_channel() {
        let loader = MemoryLoader::new();
        let mut interpreter = Interpreter::new(&loader);
        interpreter
            .process_source("#pragma once\n#pragma\n#pragma pack(push, 1)\n")
            .unwrap();
        assert_eq!(interpreter.pragmas(), ["once", "pack(push, 1)"]);
        assert!(interpreter.symbols().is_empty());
    }

    #[test]
    fn test_include_merges_child_table() {
        let loader = MemoryLoader::new()
            .with_unit("other_file", "#define X 5\n#define SHARED 1\n#pragma from child\n");
        let mut interpreter = Interpreter::new(&loader);
        interpreter
            .process_source("#define SHARED 0\n#include \"other_file\"\n#define Y X+1\n")
            .unwrap();
        assert_eq!(interpreter.evaluate("X").unwrap(), 5);
        assert_eq!(interpreter.evaluate("Y").unwrap(), 6);
        assert_eq!(interpreter.evaluate("SHARED").unwrap(), 1);
        assert_eq!(interpreter.pragmas(), ["from child"]);
    }

    #[test]
    fn test_included_unit_starts_empty() {
        let loader = MemoryLoader::new().with_unit("child.h", "#ifdef PARENT\n#define SAW_PARENT\n#endif\n");
        let mut interpreter = Interpreter::new(&loader);
        interpreter
            .process_source("#define PARENT\n#include <child.h>\n")
            .unwrap();
        assert!(!interpreter.symbols().is_defined("SAW_PARENT"));
    }

    #[test]
    fn test_failed_include_does_not_merge() {
        let loader = MemoryLoader::new().with_unit("bad.h", "#define PARTIAL 1\n#error \"bad header\"\n");
        let mut interpreter = Interpreter::new(&loader);
        let err = interpreter.process_source("#include \"bad.h\"\n").unwrap_err();
        assert!(matches!(err, PreprocessorError::Directive { ref message } if message == "bad header"));
        assert!(!interpreter.symbols().is_defined("PARTIAL"));
    }

    #[test]
    fn test_include_errors() {
        for source in ["#include", "#include \"\"", "#include other_file", "#include \"unterminated"] {
            assert!(
                matches!(run(source), Err(PreprocessorError::Directive { .. })),
                "expected directive error for {:?}",
                source
            );
        }
        assert!(matches!(
            run("#include \"missing.h\""),
            Err(PreprocessorError::Io { .. })
        ));
    }

    #[test]
    fn test_circular_include_is_cut_off() {
        let loader = MemoryLoader::new()
            .with_unit("a.h", "#include \"b.h\"\n")
            .with_unit("b.h", "#include \"a.h\"\n");
        let mut config = PreprocessorConfig::new();
        config.max_include_depth(8);
        let mut interpreter = Interpreter::with_config(&loader, config);
        let err = interpreter.process_unit("a.h").unwrap_err();
        assert!(err.to_string().contains("nested too deeply"));
    }

    #[test]
    fn test_lenient_and_strict_balance() {
        assert!(run("#endif\n#else\n#ifdef X\n").is_ok());

        let loader = MemoryLoader::new();
        for (source, expected) in [
            ("#endif\n", "UnbalancedEndif"),
            ("#else\n", "UnbalancedElse"),
            ("#if 1\n#else\n#else\n#endif\n", "UnbalancedElse"),
            ("#ifdef X\n", "UnclosedBlock"),
        ] {
            let mut config = PreprocessorConfig::new();
            config.strict(true);
            let mut interpreter = Interpreter::with_config(&loader, config);
            let err = interpreter.process_source(source).unwrap_err();
            assert!(format!("{:?}", err).starts_with(expected), "{:?}", err);
        }
    }

    #[test]
    fn test_predefined_symbols() {
        let loader = MemoryLoader::new();
        let mut config = PreprocessorConfig::new();
        config.define("DEBUG", "1").define("OFF", "");
        let mut interpreter = Interpreter::with_config(&loader, config);
        interpreter
            .process_source("#if DEBUG\n#define LOG_LEVEL 3\n#endif\n")
            .unwrap();
        assert_eq!(interpreter.evaluate("LOG_LEVEL").unwrap(), 3);
        assert!(interpreter.symbols().is_defined("OFF"));
    }

    #[test]
    fn test_nameless_directives_are_ignored() {
        let symbols = run("#define KEEP 1\n#define\n#undef\n#define   // no name\n").unwrap();
        assert_eq!(symbols.defined_symbols(), ["KEEP"]);

        let loader = MemoryLoader::new();
        let mut config = PreprocessorConfig::new();
        config.strict(true);
        let mut interpreter = Interpreter::with_config(&loader, config);
        interpreter
            .process_source("#ifdef\n#define SKIPPED\n#endif\n#ifndef\n#define TAKEN\n#endif\n")
            .unwrap();
        assert!(!interpreter.symbols().is_defined("SKIPPED"));
        assert!(interpreter.symbols().is_defined("TAKEN"));
        assert_eq!(interpreter.inactive_depth(), 0);
    }

    #[test]
    fn test_circular_macro() {
        let loader = MemoryLoader::new();
        let mut interpreter = Interpreter::new(&loader);
        interpreter
            .process_source("#define CIRCULAR CIRCULAR*2\n#if CIRCULAR\n#define NEVER\n#endif\n")
            .unwrap();
        assert_eq!(interpreter.evaluate("CIRCULAR").unwrap(), 0);
        assert!(!interpreter.symbols().is_defined("NEVER"));
    }
}
