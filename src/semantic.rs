//! Semantic pass: type-check, evaluate and emit three-address code in one
//! walk over each statement's tree.
//!
//! Every node synthesizes an [`ExprResult`]. Constants are folded eagerly, so
//! a division whose divisor evaluates to zero is rejected here rather than
//! left for run time. Code fragments are joined with `";\n"` exactly as the
//! children produced them, empty fragments included.

use log::debug;
use snafu::ensure;

use crate::error::{CompileResult, DivisionByZeroSnafu, TypeMismatchSnafu};
use crate::parser::{AstNode, BinaryOp, Stmt, UnaryOp};
use crate::symbol::SymbolTable;
use crate::temp::TempNames;
use crate::ty::{Type, Value};

/// What a reduction hands to its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprResult {
  /// Statically evaluated value; `None` only for declarations.
  pub value: Option<Value>,
  pub ty: Type,
  /// Code already emitted for this subtree.
  pub code: String,
  /// Operand naming the result: a temporary, a literal or a variable.
  pub place: String,
}

impl ExprResult {
  fn constant(value: Value, place: String) -> Self {
    Self {
      value: Some(value),
      ty: value.ty(),
      code: String::new(),
      place,
    }
  }
}

/// Mutable state shared by every statement of a run: the symbol table and
/// the temporary counter. Neither is ever reset.
#[derive(Debug, Clone, Default)]
pub struct Environment {
  symbols: SymbolTable,
  temps: TempNames,
}

impl Environment {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn symbols(&self) -> &SymbolTable {
    &self.symbols
  }

  pub fn temps(&self) -> &TempNames {
    &self.temps
  }

  /// Execute one statement against the environment. On error nothing is
  /// written to the symbol table.
  pub fn exec(&mut self, stmt: &Stmt) -> CompileResult<ExprResult> {
    let result = match stmt {
      Stmt::Expr(expr) => self.eval(expr)?,
      Stmt::Declare { ty, name } => {
        self.symbols.declare(name, *ty)?;
        ExprResult {
          value: None,
          ty: *ty,
          code: String::new(),
          place: name.clone(),
        }
      }
      Stmt::Assign { name, expr } => {
        let rhs = self.eval(expr)?;
        let declared = self.symbols.get_type(name)?;
        ensure!(
          declared == rhs.ty,
          TypeMismatchSnafu {
            context: format!("assignment to '{name}': declared {declared}, found {}", rhs.ty),
          }
        );
        if let Some(value) = rhs.value {
          self.symbols.set_value(name, value);
        }
        ExprResult {
          value: rhs.value,
          ty: rhs.ty,
          code: format!("{};\n{name}={}", rhs.code, rhs.place),
          place: name.clone(),
        }
      }
    };
    debug!("emitted {:?}", result.code);
    Ok(result)
  }

  pub fn eval(&mut self, node: &AstNode) -> CompileResult<ExprResult> {
    match node {
      AstNode::Literal { value } => Ok(ExprResult::constant(*value, value.to_string())),
      AstNode::Var { name } => {
        let value = self.symbols.get_value(name)?;
        let ty = self.symbols.get_type(name)?;
        Ok(ExprResult {
          value: Some(value),
          ty,
          code: String::new(),
          place: name.clone(),
        })
      }
      AstNode::Unary { op, operand } => {
        let operand = self.eval(operand)?;
        self.unary(*op, operand)
      }
      AstNode::Binary { op, lhs, rhs } => {
        let lhs = self.eval(lhs)?;
        let rhs = self.eval(rhs)?;
        self.binary(*op, lhs, rhs)
      }
    }
  }

  fn unary(&mut self, op: UnaryOp, operand: ExprResult) -> CompileResult<ExprResult> {
    let value = match (op, operand.value) {
      (UnaryOp::Not, Some(Value::Bool(b))) => Value::Bool(!b),
      (UnaryOp::Neg, Some(Value::Numb(n))) => Value::Numb(-n),
      _ => {
        return TypeMismatchSnafu {
          context: format!("operation '{} {}'", op.symbol(), operand.ty),
        }
        .fail();
      }
    };

    let temp = self.temps.fresh();
    Ok(ExprResult {
      value: Some(value),
      ty: value.ty(),
      code: format!("{};\n{temp}={} {}", operand.code, op.symbol(), operand.place),
      place: temp,
    })
  }

  fn binary(&mut self, op: BinaryOp, lhs: ExprResult, rhs: ExprResult) -> CompileResult<ExprResult> {
    let value = match (lhs.value, rhs.value) {
      (Some(Value::Numb(a)), Some(Value::Numb(b))) => fold_numeric(op, a, b)?,
      (Some(Value::Bool(a)), Some(Value::Bool(b))) => fold_boolean(op, a, b),
      _ => None,
    };
    let Some(value) = value else {
      return TypeMismatchSnafu {
        context: format!("operation '{} {} {}'", lhs.ty, op.symbol(), rhs.ty),
      }
      .fail();
    };

    let temp = self.temps.fresh();
    let code = format!(
      "{};\n{};\n{temp}={}",
      lhs.code,
      rhs.code,
      operation_text(op, &lhs.place, &rhs.place)
    );
    Ok(ExprResult {
      value: Some(value),
      ty: value.ty(),
      code,
      place: temp,
    })
  }
}

/// `None` when the operator is not defined on numbers.
fn fold_numeric(op: BinaryOp, a: f64, b: f64) -> CompileResult<Option<Value>> {
  let value = match op {
    BinaryOp::Add => Value::Numb(a + b),
    BinaryOp::Sub => Value::Numb(a - b),
    BinaryOp::Mul => Value::Numb(a * b),
    BinaryOp::Div => {
      ensure!(b != 0.0, DivisionByZeroSnafu);
      Value::Numb(a / b)
    }
    BinaryOp::Lt => Value::Bool(a < b),
    BinaryOp::Gt => Value::Bool(a > b),
    BinaryOp::Eq => Value::Bool(a == b),
    BinaryOp::And | BinaryOp::Or => return Ok(None),
  };
  Ok(Some(value))
}

/// `None` when the operator is not defined on booleans.
fn fold_boolean(op: BinaryOp, a: bool, b: bool) -> Option<Value> {
  match op {
    BinaryOp::And => Some(Value::Bool(a && b)),
    BinaryOp::Or => Some(Value::Bool(a || b)),
    BinaryOp::Eq => Some(Value::Bool(a == b)),
    _ => None,
  }
}

/// Word operators get spaces so `a and b` does not print as `aandb`.
fn operation_text(op: BinaryOp, lhs: &str, rhs: &str) -> String {
  match op {
    BinaryOp::And | BinaryOp::Or => format!("{lhs} {} {rhs}", op.symbol()),
    _ => format!("{lhs}{}{rhs}", op.symbol()),
  }
}
