//! Crate root: wires together the compilation pipeline.
//!
//! The stages are small and can be used on their own:
//! - `tokenizer` performs lexical analysis and produces a lazy token stream.
//! - `parser` owns all syntactic knowledge and hands out one statement tree
//!   at a time.
//! - `semantic` type-checks, folds constants and emits three-address code,
//!   using the `symbol` table and `temp` name generator as shared state.
//! - `program` runs whole programs and collects output and diagnostics.
//! - `error` centralises reporting utilities shared by the other modules.

pub mod error;
pub mod parser;
pub mod program;
pub mod semantic;
pub mod symbol;
pub mod temp;
pub mod tokenizer;
pub mod ty;

pub use error::{CompileError, CompileResult, ErrorKind};
pub use program::{Calculator, Event, Options, Report};
pub use semantic::{Environment, ExprResult};
pub use ty::{Type, Value};

/// Compile a source string with a fresh [`Calculator`]: one line of
/// three-address code per statement, recovered diagnostics in between, and
/// the error that stopped the run, if any.
pub fn generate_code(source: &str) -> Report {
  Calculator::new().parse(source)
}
