//! Program driver core: runs the statements of a source text in order and
//! records what each one produced.

use log::{debug, info};

use crate::error::CompileError;
use crate::parser::Parser;
use crate::semantic::Environment;
use crate::symbol::Variable;
use crate::ty::{Type, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
  /// Report a syntax error and carry on after the next `;` instead of
  /// stopping the run.
  pub recover_syntax_errors: bool,
}

/// One line of output for the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
  /// Three-address code of one completed statement.
  Generated(String),
  /// A recovered error; the run went on after it.
  Diagnostic(CompileError),
}

/// Everything one call to [`Calculator::parse`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
  pub events: Vec<Event>,
  /// The error that stopped the run early, if any.
  pub error: Option<CompileError>,
}

impl Report {
  pub fn is_ok(&self) -> bool {
    self.error.is_none()
  }

  /// Generated code lines, in statement order.
  pub fn generated(&self) -> Vec<&str> {
    self
      .events
      .iter()
      .filter_map(|event| match event {
        Event::Generated(code) => Some(code.as_str()),
        Event::Diagnostic(_) => None,
      })
      .collect()
  }

  pub fn diagnostics(&self) -> impl Iterator<Item = &CompileError> {
    self.events.iter().filter_map(|event| match event {
      Event::Diagnostic(err) => Some(err),
      Event::Generated(_) => None,
    })
  }
}

/// Owns the environment that every parsed program runs against. Parsing a
/// second text with the same calculator keeps the variables and temporary
/// counter of the first.
#[derive(Debug, Clone, Default)]
pub struct Calculator {
  env: Environment,
  options: Options,
}

impl Calculator {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_options(options: Options) -> Self {
    Self {
      env: Environment::new(),
      options,
    }
  }

  pub fn environment(&self) -> &Environment {
    &self.env
  }

  pub fn variable(&self, name: &str) -> Option<&Variable> {
    self.env.symbols().get(name)
  }

  pub fn value(&self, name: &str) -> Option<Value> {
    self.variable(name).map(|variable| variable.value)
  }

  pub fn type_of(&self, name: &str) -> Option<Type> {
    self.variable(name).and_then(|variable| variable.ty)
  }

  /// Parse and execute `source` statement by statement. Each statement is
  /// fully executed before the next one is parsed, so a failure leaves the
  /// effects of earlier statements in place.
  pub fn parse(&mut self, source: &str) -> Report {
    let mut parser = Parser::new(source).with_recovery(self.options.recover_syntax_errors);
    let mut events = Vec::new();
    let mut error = None;

    loop {
      let next = parser.next_stmt();
      events.extend(parser.take_diagnostics().into_iter().map(Event::Diagnostic));
      let Some(stmt) = next else {
        break;
      };

      match stmt.and_then(|stmt| self.env.exec(&stmt)) {
        Ok(result) => events.push(Event::Generated(result.code)),
        Err(err) => {
          debug!("run stopped: {err}");
          error = Some(err);
          break;
        }
      }
    }

    info!(
      "{} statement(s) generated, {} declared variable(s), {} temporaries",
      events
        .iter()
        .filter(|event| matches!(event, Event::Generated(_)))
        .count(),
      self
        .env
        .symbols()
        .iter()
        .filter(|variable| variable.ty.is_some())
        .count(),
      self.env.temps().issued()
    );
    Report { events, error }
  }
}
