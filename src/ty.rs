use std::fmt;

/// The two scalar types of the language. There is no implicit conversion
/// between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
  Numb,
  Bool,
}

impl Type {
  /// Value a freshly declared variable holds before its first assignment.
  pub fn default_value(self) -> Value {
    match self {
      Type::Numb => Value::Numb(0.0),
      Type::Bool => Value::Bool(false),
    }
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Type::Numb => f.write_str("NUMB"),
      Type::Bool => f.write_str("BOOL"),
    }
  }
}

/// A statically evaluated value. Numbers are always 64-bit floats, even for
/// variables declared `inteiro`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
  Numb(f64),
  Bool(bool),
}

impl Value {
  pub fn ty(&self) -> Type {
    match self {
      Value::Numb(_) => Type::Numb,
      Value::Bool(_) => Type::Bool,
    }
  }
}

/// Prints the operand text used in generated code: integral floats keep
/// their `.0` so `3` prints as `3.0`.
impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Numb(n) => write!(f, "{n:?}"),
      Value::Bool(b) => write!(f, "{b}"),
    }
  }
}
