//! Shared error utilities used across the compilation pipeline.
//!
//! Lexical and syntax errors are anchored to a byte offset and render the
//! offending source line with a caret under the culprit.
//! Semantic errors are raised while walking the syntax tree and carry the
//! names involved instead.

use std::fmt;

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// Category of a [`CompileError`], for callers that only care which rule was
/// broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Lexical,
  Syntax,
  UndeclaredVariable,
  DuplicateDeclaration,
  TypeMismatch,
  DivisionByZero,
}

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  #[snafu(display("{message} at {pos}"))]
  Lexical { message: String, pos: SourcePos },

  #[snafu(display("Syntax error at {found} ({pos})"))]
  Syntax { found: String, pos: SourcePos },

  #[snafu(display("Variable '{name}' not found"))]
  UndeclaredVariable { name: String },

  #[snafu(display("Variable '{name}' already declared"))]
  DuplicateDeclaration { name: String },

  #[snafu(display("Type mismatch in {context}"))]
  TypeMismatch { context: String },

  #[snafu(display("Division by zero"))]
  DivisionByZero,
}

impl CompileError {
  /// Lexical error for a character no rule accepts.
  pub fn illegal_char(source: &str, loc: usize, ch: char) -> Self {
    Self::lexical(source, loc, format!("Illegal character '{ch}'"))
  }

  /// Lexical error anchored at a specific byte offset in the source.
  pub fn lexical(source: &str, loc: usize, message: impl Into<String>) -> Self {
    LexicalSnafu {
      message,
      pos: SourcePos::locate(source, loc),
    }
    .build()
  }

  /// Syntax error at `loc`; `found` is the already-described offending token.
  pub fn syntax(source: &str, loc: usize, found: impl Into<String>) -> Self {
    SyntaxSnafu {
      found,
      pos: SourcePos::locate(source, loc),
    }
    .build()
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Lexical { .. } => ErrorKind::Lexical,
      Self::Syntax { .. } => ErrorKind::Syntax,
      Self::UndeclaredVariable { .. } => ErrorKind::UndeclaredVariable,
      Self::DuplicateDeclaration { .. } => ErrorKind::DuplicateDeclaration,
      Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
      Self::DivisionByZero => ErrorKind::DivisionByZero,
    }
  }

  /// Only lexical errors are recovered locally; everything else ends the run
  /// unless the caller opted into syntax resynchronisation.
  pub fn is_recoverable(&self) -> bool {
    matches!(self, Self::Lexical { .. })
  }

  /// The caret snippet for located errors.
  pub fn snippet(&self) -> Option<String> {
    match self {
      Self::Lexical { pos, .. } | Self::Syntax { pos, .. } => Some(pos.snippet()),
      _ => None,
    }
  }
}

/// A resolved position in the source: 1-based line and column plus the text
/// of the line it falls on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePos {
  pub offset: usize,
  pub line: usize,
  pub column: usize,
  line_text: String,
}

impl SourcePos {
  pub fn locate(source: &str, offset: usize) -> Self {
    let mut safe_loc = offset.min(source.len());
    while !source.is_char_boundary(safe_loc) {
      safe_loc -= 1;
    }
    let line_start = source[..safe_loc].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[safe_loc..]
      .find('\n')
      .map_or(source.len(), |i| safe_loc + i);
    Self {
      offset: safe_loc,
      line: source[..line_start].matches('\n').count() + 1,
      column: source[line_start..safe_loc].chars().count() + 1,
      line_text: source[line_start..line_end].to_string(),
    }
  }

  /// The offending line followed by a caret under the column.
  pub fn snippet(&self) -> String {
    let marker = format!("{}^", " ".repeat(self.column - 1));
    format!("{}\n{marker}", self.line_text)
  }
}

impl fmt::Display for SourcePos {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "line {}, column {}", self.line, self.column)
  }
}
