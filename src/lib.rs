//! Evaluate C/C++ preprocessor directives and macro values without compiling
//!
//! ```
//! use c_macro_eval::{Interpreter, MemoryLoader};
//!
//! let loader = MemoryLoader::new();
//! let mut interpreter = Interpreter::new(&loader);
//! interpreter
//!     .process_source("#define BASE 0x10UL\n#define NEXT BASE + 1\n")
//!     .unwrap();
//! assert_eq!(interpreter.evaluate("NEXT").unwrap(), 17);
//! ```

pub mod error;
pub mod preprocessor;

// Re-export main types
pub use error::{PreprocessorError, Result};
pub use preprocessor::{
    Directive, FsLoader, Interpreter, LineJoiner, LogicalLine, MemoryLoader, PreprocessorConfig,
    SymbolTable, SymbolValue, UnitLoader, Value,
};
