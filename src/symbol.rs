//! Symbol table: variable name to declared type and current value.
//!
//! There is a single flat scope. Entries are never removed, so the table only
//! grows over the lifetime of its environment.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::debug;
use snafu::OptionExt;

use crate::error::{CompileResult, DuplicateDeclarationSnafu, UndeclaredVariableSnafu};
use crate::ty::{Type, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
  pub name: String,
  /// `None` only for entries created by [`SymbolTable::set_value`] without a
  /// prior declaration.
  pub ty: Option<Type>,
  pub value: Value,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable(HashMap<String, Variable>);

impl SymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register `name` with its type's default value. Each name may be
  /// declared once.
  pub fn declare(&mut self, name: &str, ty: Type) -> CompileResult<()> {
    match self.0.entry(name.to_string()) {
      Entry::Occupied(_) => DuplicateDeclarationSnafu { name }.fail(),
      Entry::Vacant(slot) => {
        debug!("declare {name}: {ty}");
        slot.insert(Variable {
          name: name.to_string(),
          ty: Some(ty),
          value: ty.default_value(),
        });
        Ok(())
      }
    }
  }

  pub fn get(&self, name: &str) -> Option<&Variable> {
    self.0.get(name)
  }

  /// Declared type of `name`. A name that was never declared has no type,
  /// even if a value was stored under it.
  pub fn get_type(&self, name: &str) -> CompileResult<Type> {
    self
      .get(name)
      .and_then(|variable| variable.ty)
      .context(UndeclaredVariableSnafu { name })
  }

  pub fn get_value(&self, name: &str) -> CompileResult<Value> {
    self
      .get(name)
      .map(|variable| variable.value)
      .context(UndeclaredVariableSnafu { name })
  }

  pub fn set_value(&mut self, name: &str, value: Value) {
    match self.0.get_mut(name) {
      Some(variable) => variable.value = value,
      None => {
        self.0.insert(
          name.to_string(),
          Variable {
            name: name.to_string(),
            ty: None,
            value,
          },
        );
      }
    }
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Variable> {
    self.0.values()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;

  #[test]
  fn declare_then_lookup() {
    let mut table = SymbolTable::new();
    table.declare("x", Type::Numb).unwrap();
    table.declare("flag", Type::Bool).unwrap();

    assert_eq!(table.get_type("x").unwrap(), Type::Numb);
    assert_eq!(table.get_value("x").unwrap(), Value::Numb(0.0));
    assert_eq!(table.get_type("flag").unwrap(), Type::Bool);
    assert_eq!(table.get_value("flag").unwrap(), Value::Bool(false));
    assert_eq!(table.len(), 2);
  }

  #[test]
  fn redeclaration_fails_and_keeps_original() {
    let mut table = SymbolTable::new();
    table.declare("x", Type::Numb).unwrap();
    table.set_value("x", Value::Numb(5.0));

    let err = table.declare("x", Type::Bool).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateDeclaration);
    assert_eq!(err.to_string(), "Variable 'x' already declared");
    assert_eq!(table.get_type("x").unwrap(), Type::Numb);
    assert_eq!(table.get_value("x").unwrap(), Value::Numb(5.0));
  }

  #[test]
  fn missing_names_are_undeclared() {
    let table = SymbolTable::new();
    assert_eq!(
      table.get_type("y").unwrap_err().kind(),
      ErrorKind::UndeclaredVariable
    );
    assert_eq!(
      table.get_value("y").unwrap_err().kind(),
      ErrorKind::UndeclaredVariable
    );
  }

  #[test]
  fn set_value_on_unknown_name_inserts_untyped() {
    let mut table = SymbolTable::new();
    table.set_value("z", Value::Bool(true));

    assert!(table.contains("z"));
    assert_eq!(table.get_value("z").unwrap(), Value::Bool(true));
    assert_eq!(
      table.get_type("z").unwrap_err().kind(),
      ErrorKind::UndeclaredVariable
    );
  }

  #[test]
  fn iter_visits_every_entry() {
    let mut table = SymbolTable::new();
    table.declare("b", Type::Bool).unwrap();
    table.declare("a", Type::Numb).unwrap();
    table.set_value("c", Value::Numb(1.0));

    let mut names: Vec<_> = table.iter().map(|variable| variable.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["a", "b", "c"]);
    assert_eq!(table.iter().filter(|variable| variable.ty.is_none()).count(), 1);
  }
}
