//! Recursive-descent parser producing one syntax tree per statement.
//!
//! The grammar has just two binary levels: `expr` chains `+ - < > == and or`
//! left to right over terms, and `term` chains `* /` over factors. Prefix
//! `not` and `-` apply to a single factor. Statements are handed out one at a
//! time so the caller can execute each before the next is parsed; tokens are
//! pulled from the lexer only as far as the current statement needs.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::tokenizer::{Token, TokenKind, TokenValue, Tokenizer, describe_token, tokenize};
use crate::ty::{Type, Value};

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Lt,
  Gt,
  Eq,
  And,
  Or,
}

impl BinaryOp {
  /// Spelling used in generated code.
  pub fn symbol(self) -> &'static str {
    match self {
      BinaryOp::Add => "+",
      BinaryOp::Sub => "-",
      BinaryOp::Mul => "*",
      BinaryOp::Div => "/",
      BinaryOp::Lt => "<",
      BinaryOp::Gt => ">",
      BinaryOp::Eq => "==",
      BinaryOp::And => "and",
      BinaryOp::Or => "or",
    }
  }

  fn from_expr_token(kind: TokenKind) -> Option<Self> {
    let op = match kind {
      TokenKind::Plus => BinaryOp::Add,
      TokenKind::Minus => BinaryOp::Sub,
      TokenKind::LessThan => BinaryOp::Lt,
      TokenKind::GreaterThan => BinaryOp::Gt,
      TokenKind::EqualEqual => BinaryOp::Eq,
      TokenKind::And => BinaryOp::And,
      TokenKind::Or => BinaryOp::Or,
      _ => return None,
    };
    Some(op)
  }

  fn from_term_token(kind: TokenKind) -> Option<Self> {
    match kind {
      TokenKind::Star => Some(BinaryOp::Mul),
      TokenKind::Slash => Some(BinaryOp::Div),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Not,
  Neg,
}

impl UnaryOp {
  pub fn symbol(self) -> &'static str {
    match self {
      UnaryOp::Not => "not",
      UnaryOp::Neg => "minus",
    }
  }
}

/// Expression tree produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
  Literal {
    value: Value,
  },
  Var {
    name: String,
  },
  Unary {
    op: UnaryOp,
    operand: Box<AstNode>,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
}

impl AstNode {
  pub fn literal(value: Value) -> Self {
    Self::Literal { value }
  }

  pub fn var(name: impl Into<String>) -> Self {
    Self::Var { name: name.into() }
  }

  pub fn unary(op: UnaryOp, operand: AstNode) -> Self {
    Self::Unary {
      op,
      operand: Box::new(operand),
    }
  }

  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }
}

/// One `;`-terminated statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
  Expr(AstNode),
  Assign { name: String, expr: AstNode },
  Declare { ty: Type, name: String },
}

/// Every statement of a source text plus the lexical errors skipped while
/// reading it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parsed {
  pub stmts: Vec<Stmt>,
  pub diagnostics: Vec<CompileError>,
}

/// Parse every statement up front without executing any. Illegal characters
/// are skipped and collected, the first syntax error is returned. Running a
/// program goes through [`crate::Calculator`], which executes each statement
/// before parsing the next.
pub fn parse(source: &str) -> CompileResult<Parsed> {
  let mut parser = Parser::new(source);
  let mut parsed = Parsed::default();
  for stmt in parser.by_ref() {
    parsed.stmts.push(stmt?);
  }
  parsed.diagnostics = parser.take_diagnostics();
  Ok(parsed)
}

/// Statement-at-a-time parser over a lazy token stream.
///
/// Lexical errors met while pulling tokens are skipped over and collected;
/// drain them with [`Parser::take_diagnostics`]. A syntax error ends the
/// stream unless recovery is enabled, in which case it is collected too and
/// parsing resumes after the next `;`.
pub struct Parser<'a> {
  tokens: Tokenizer<'a>,
  source: &'a str,
  lookahead: VecDeque<Token>,
  diagnostics: Vec<CompileError>,
  recover: bool,
  finished: bool,
}

impl<'a> Parser<'a> {
  pub fn new(source: &'a str) -> Self {
    Self {
      tokens: tokenize(source),
      source,
      lookahead: VecDeque::new(),
      diagnostics: Vec::new(),
      recover: false,
      finished: false,
    }
  }

  /// Resynchronise at the next `;` after a syntax error instead of stopping.
  pub fn with_recovery(mut self, recover: bool) -> Self {
    self.recover = recover;
    self
  }

  /// Errors recovered since the last call, in source order.
  pub fn take_diagnostics(&mut self) -> Vec<CompileError> {
    std::mem::take(&mut self.diagnostics)
  }

  /// Parse the next statement, or `None` once input (or the parse) is over.
  pub fn next_stmt(&mut self) -> Option<CompileResult<Stmt>> {
    loop {
      if self.finished || self.peek_kind(0) == TokenKind::Eof {
        self.finished = true;
        return None;
      }

      match self.parse_stmt() {
        Ok(stmt) => {
          debug!("parsed {stmt:?}");
          return Some(Ok(stmt));
        }
        Err(err) if self.recover && err.kind() == ErrorKind::Syntax => {
          warn!("{err}; skipping to next ';'");
          self.diagnostics.push(err);
          self.synchronize();
        }
        Err(err) => {
          self.finished = true;
          return Some(Err(err));
        }
      }
    }
  }

  fn parse_stmt(&mut self) -> CompileResult<Stmt> {
    let stmt = match self.peek_kind(0) {
      TokenKind::Inteiro | TokenKind::Boolean => self.parse_declaration()?,
      TokenKind::Ident if self.peek_kind(1) == TokenKind::Assign => {
        let name = self.get_ident()?;
        self.skip(TokenKind::Assign)?;
        let expr = self.parse_expr()?;
        Stmt::Assign { name, expr }
      }
      _ => Stmt::Expr(self.parse_expr()?),
    };
    self.skip(TokenKind::Semicolon)?;
    Ok(stmt)
  }

  fn parse_declaration(&mut self) -> CompileResult<Stmt> {
    let token = self.advance();
    let Some(TokenValue::Type(ty)) = token.as_ref().and_then(|token| token.value) else {
      return Err(self.error_at(token.as_ref()));
    };
    let name = self.get_ident()?;
    Ok(Stmt::Declare { ty, name })
  }

  fn parse_expr(&mut self) -> CompileResult<AstNode> {
    let mut node = self.parse_term()?;

    while let Some(op) = BinaryOp::from_expr_token(self.peek_kind(0)) {
      self.advance();
      let rhs = self.parse_term()?;
      node = AstNode::binary(op, node, rhs);
    }

    Ok(node)
  }

  fn parse_term(&mut self) -> CompileResult<AstNode> {
    let mut node = if self.equal(TokenKind::Not) {
      AstNode::unary(UnaryOp::Not, self.parse_factor()?)
    } else if self.equal(TokenKind::Minus) {
      AstNode::unary(UnaryOp::Neg, self.parse_factor()?)
    } else {
      self.parse_factor()?
    };

    while let Some(op) = BinaryOp::from_term_token(self.peek_kind(0)) {
      self.advance();
      let rhs = self.parse_factor()?;
      node = AstNode::binary(op, node, rhs);
    }

    Ok(node)
  }

  fn parse_factor(&mut self) -> CompileResult<AstNode> {
    if self.equal(TokenKind::LParen) {
      let node = self.parse_expr()?;
      self.skip(TokenKind::RParen)?;
      return Ok(node);
    }

    match self.peek_kind(0) {
      TokenKind::Float | TokenKind::True | TokenKind::False => {
        let token = self.advance();
        match token.as_ref().and_then(|token| token.value) {
          Some(TokenValue::Number(n)) => Ok(AstNode::literal(Value::Numb(n))),
          Some(TokenValue::Bool(b)) => Ok(AstNode::literal(Value::Bool(b))),
          _ => Err(self.error_at(token.as_ref())),
        }
      }
      TokenKind::Ident => Ok(AstNode::var(self.get_ident()?)),
      _ => Err(self.error_at_current()),
    }
  }

  /// Make sure at least `n + 1` tokens are buffered, collecting any lexical
  /// errors met on the way.
  fn fill(&mut self, n: usize) {
    while self.lookahead.len() <= n {
      match self.tokens.next() {
        Some(Ok(token)) => self.lookahead.push_back(token),
        Some(Err(err)) => self.diagnostics.push(err),
        None => break,
      }
    }
  }

  fn peek(&mut self, n: usize) -> Option<&Token> {
    self.fill(n);
    self.lookahead.get(n)
  }

  fn peek_kind(&mut self, n: usize) -> TokenKind {
    self.peek(n).map_or(TokenKind::Eof, |token| token.kind)
  }

  fn advance(&mut self) -> Option<Token> {
    self.fill(0);
    self.lookahead.pop_front()
  }

  /// Consume the current token if it has the given kind.
  fn equal(&mut self, kind: TokenKind) -> bool {
    if self.peek_kind(0) == kind && kind != TokenKind::Eof {
      self.advance();
      return true;
    }
    false
  }

  fn skip(&mut self, kind: TokenKind) -> CompileResult<()> {
    if self.equal(kind) {
      Ok(())
    } else {
      Err(self.error_at_current())
    }
  }

  fn get_ident(&mut self) -> CompileResult<String> {
    if self.peek_kind(0) == TokenKind::Ident
      && let Some(token) = self.advance()
    {
      return Ok(token.text(self.source).to_string());
    }
    Err(self.error_at_current())
  }

  fn error_at_current(&mut self) -> CompileError {
    self.fill(0);
    let token = self.lookahead.front().cloned();
    self.error_at(token.as_ref())
  }

  fn error_at(&self, token: Option<&Token>) -> CompileError {
    let loc = token.map_or(self.source.len(), |token| token.loc);
    CompileError::syntax(self.source, loc, describe_token(token, self.source))
  }

  /// Drop tokens up to and including the next `;`.
  fn synchronize(&mut self) {
    loop {
      match self.peek_kind(0) {
        TokenKind::Eof => return,
        TokenKind::Semicolon => {
          self.advance();
          return;
        }
        _ => {
          self.advance();
        }
      }
    }
  }
}

impl Iterator for Parser<'_> {
  type Item = CompileResult<Stmt>;

  fn next(&mut self) -> Option<Self::Item> {
    self.next_stmt()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn num(n: f64) -> AstNode {
    AstNode::literal(Value::Numb(n))
  }

  fn boolean(b: bool) -> AstNode {
    AstNode::literal(Value::Bool(b))
  }

  fn single(source: &str) -> Stmt {
    let mut stmts = parse(source).unwrap().stmts;
    assert_eq!(stmts.len(), 1, "expected one statement in {source:?}");
    stmts.remove(0)
  }

  #[test]
  fn parses_declarations() {
    assert_eq!(
      parse("inteiro x; boolean b;").unwrap().stmts,
      vec![
        Stmt::Declare {
          ty: Type::Numb,
          name: "x".into()
        },
        Stmt::Declare {
          ty: Type::Bool,
          name: "b".into()
        },
      ]
    );
  }

  #[test]
  fn parses_assignment() {
    assert_eq!(
      single("x = 3 + 4;"),
      Stmt::Assign {
        name: "x".into(),
        expr: AstNode::binary(BinaryOp::Add, num(3.0), num(4.0)),
      }
    );
  }

  #[test]
  fn bare_identifier_is_an_expression() {
    assert_eq!(single("x;"), Stmt::Expr(AstNode::var("x")));
  }

  #[test]
  fn multiplication_binds_tighter() {
    assert_eq!(
      single("1 + 2 * 3;"),
      Stmt::Expr(AstNode::binary(
        BinaryOp::Add,
        num(1.0),
        AstNode::binary(BinaryOp::Mul, num(2.0), num(3.0)),
      ))
    );
  }

  #[test]
  fn expression_level_operators_chain_left_to_right() {
    assert_eq!(
      single("true or false and false;"),
      Stmt::Expr(AstNode::binary(
        BinaryOp::And,
        AstNode::binary(BinaryOp::Or, boolean(true), boolean(false)),
        boolean(false),
      ))
    );
    assert_eq!(
      single("1 - 2 < 3;"),
      Stmt::Expr(AstNode::binary(
        BinaryOp::Lt,
        AstNode::binary(BinaryOp::Sub, num(1.0), num(2.0)),
        num(3.0),
      ))
    );
  }

  #[test]
  fn prefix_operators_take_one_factor() {
    assert_eq!(
      single("-2 * 3;"),
      Stmt::Expr(AstNode::binary(
        BinaryOp::Mul,
        AstNode::unary(UnaryOp::Neg, num(2.0)),
        num(3.0),
      ))
    );
    assert_eq!(
      single("not (1 < 2);"),
      Stmt::Expr(AstNode::unary(
        UnaryOp::Not,
        AstNode::binary(BinaryOp::Lt, num(1.0), num(2.0)),
      ))
    );
    assert_eq!(
      single("1 - -2;"),
      Stmt::Expr(AstNode::binary(
        BinaryOp::Sub,
        num(1.0),
        AstNode::unary(UnaryOp::Neg, num(2.0)),
      ))
    );
  }

  #[test]
  fn prefix_operator_cannot_follow_star() {
    let err = parse("2 * -3;").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.to_string(), "Syntax error at '-' (line 1, column 5)");
  }

  #[test]
  fn missing_terminator_reports_eof() {
    let err = parse("x = 1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(err.to_string().starts_with("Syntax error at EOF"));
  }

  #[test]
  fn empty_statement_is_a_syntax_error() {
    let err = parse(";").unwrap_err();
    assert!(err.to_string().starts_with("Syntax error at ';'"));
  }

  #[test]
  fn empty_program_has_no_statements() {
    assert!(parse("").unwrap().stmts.is_empty());
    assert!(parse("  \n\t").unwrap().stmts.is_empty());
  }

  #[test]
  fn illegal_characters_are_collected_to_the_end() {
    let parsed = parse("1 $ + 1; @").unwrap();
    assert_eq!(
      parsed.stmts,
      vec![Stmt::Expr(AstNode::binary(BinaryOp::Add, num(1.0), num(1.0)))]
    );
    let kinds: Vec<_> = parsed.diagnostics.iter().map(CompileError::kind).collect();
    assert_eq!(kinds, [ErrorKind::Lexical, ErrorKind::Lexical]);
  }

  #[test]
  fn declaration_needs_a_name() {
    let err = parse("inteiro 3;").unwrap_err();
    assert!(err.to_string().starts_with("Syntax error at '3'"));
  }

  #[test]
  fn statements_are_produced_lazily() {
    let mut parser = Parser::new("x; y = ; z;");
    assert_eq!(parser.next(), Some(Ok(Stmt::Expr(AstNode::var("x")))));
    assert!(matches!(parser.next(), Some(Err(err)) if err.kind() == ErrorKind::Syntax));
    assert_eq!(parser.next(), None);
  }

  #[test]
  fn recovery_resumes_after_semicolon() {
    let mut parser = Parser::new("x; y = ; z;").with_recovery(true);
    let stmts: Vec<_> = parser.by_ref().collect::<CompileResult<_>>().unwrap();
    assert_eq!(
      stmts,
      vec![Stmt::Expr(AstNode::var("x")), Stmt::Expr(AstNode::var("z"))]
    );
    let diagnostics = parser.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind(), ErrorKind::Syntax);
  }

  #[test]
  fn lexical_errors_are_collected_not_fatal() {
    let mut parser = Parser::new("x $ + 1;");
    let stmt = parser.next().unwrap().unwrap();
    assert_eq!(
      stmt,
      Stmt::Expr(AstNode::binary(BinaryOp::Add, AstNode::var("x"), num(1.0)))
    );
    let diagnostics = parser.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind(), ErrorKind::Lexical);
  }
}
