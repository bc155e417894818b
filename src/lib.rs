//! An interpreter for Monkey, a small dynamically-typed, expression-oriented scripting
//! language, built two ways: compiled to bytecode and run on a stack machine ([vm]), or
//! walked directly as a tree ([eval]). Both share the same lexer, parser, object model, and
//! built-in functions.
//!
//! See [Writing a Compiler in Go](https://compilerbook.com/) and
//! [Writing an Interpreter in Go](https://interpreterbook.com/).

pub mod ast;
pub mod builtins;
pub mod code;
pub mod compiler;
pub mod debug;
pub mod environment;
pub mod error;
pub mod eval;
pub mod frame;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod repl;
pub mod symbol_table;
pub mod token;
pub mod vm;

mod with_try_from_u8;

/// The type returned by lexing, parsing, compiling, and running Monkey code. This is the
/// standard [std::result::Result], but the error is always [error::InterpretationError].
///
/// ```
/// fn compile() -> monkey::Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, error::InterpretationError>;

/// Re-exports the items most callers reach for.
pub mod prelude {
    pub use crate::compiler::Compiler;
    pub use crate::error::InterpretationError;
    pub use crate::lexer::Lexer;
    pub use crate::object::{Object, ObjectRef};
    pub use crate::parser::Parser;
    pub use crate::vm::VM;
}
