//! Lexical analysis: turns the raw input string into a lazy stream of tokens.
//!
//! The tokenizer knows nothing about grammar. It classifies keywords,
//! operators and numeric literals, and decodes the literal values the parser
//! needs. Two-character operators are matched before single-character ones so
//! `==` never lexes as two assignments. Unknown characters are reported and
//! skipped; lexing carries on after them.

use log::{trace, warn};

use crate::error::{CompileError, CompileResult};
use crate::ty::Type;

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Float,
  Ident,
  Inteiro,
  Boolean,
  True,
  False,
  LessThan,
  GreaterThan,
  EqualEqual,
  And,
  Or,
  Not,
  Plus,
  Minus,
  Star,
  Slash,
  LParen,
  RParen,
  Assign,
  Semicolon,
  Eof,
}

/// Decoded payload carried by literal and type-keyword tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenValue {
  Number(f64),
  Bool(bool),
  Type(Type),
}

/// Thin wrapper for lexical information needed by later stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
  pub kind: TokenKind,
  pub value: Option<TokenValue>,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  pub fn new(kind: TokenKind, loc: usize, len: usize, value: Option<TokenValue>) -> Self {
    Self {
      kind,
      value,
      loc,
      len,
    }
  }

  /// Return the slice from the source that produced this token.
  pub fn text<'a>(&self, source: &'a str) -> &'a str {
    &source[self.loc..self.loc + self.len]
  }
}

const KEYWORDS: [(&str, TokenKind); 7] = [
  ("inteiro", TokenKind::Inteiro),
  ("boolean", TokenKind::Boolean),
  ("true", TokenKind::True),
  ("false", TokenKind::False),
  ("and", TokenKind::And),
  ("or", TokenKind::Or),
  ("not", TokenKind::Not),
];

fn keyword_value(kind: TokenKind) -> Option<TokenValue> {
  match kind {
    TokenKind::Inteiro => Some(TokenValue::Type(Type::Numb)),
    TokenKind::Boolean => Some(TokenValue::Type(Type::Bool)),
    TokenKind::True => Some(TokenValue::Bool(true)),
    TokenKind::False => Some(TokenValue::Bool(false)),
    _ => None,
  }
}

fn punctuator(c: u8) -> Option<TokenKind> {
  let kind = match c {
    b'+' => TokenKind::Plus,
    b'-' => TokenKind::Minus,
    b'*' => TokenKind::Star,
    b'/' => TokenKind::Slash,
    b'(' => TokenKind::LParen,
    b')' => TokenKind::RParen,
    b'=' => TokenKind::Assign,
    b';' => TokenKind::Semicolon,
    b'<' => TokenKind::LessThan,
    b'>' => TokenKind::GreaterThan,
    _ => return None,
  };
  Some(kind)
}

/// Lazy token stream over a source string.
///
/// Yields `Ok(token)` for every recognised token, `Err` for each illegal
/// character (which has already been skipped), and a single `Eof` token
/// before ending. Restart by calling [`tokenize`] again.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
  source: &'a str,
  pos: usize,
  done: bool,
}

/// Start lexing `source`.
pub fn tokenize(source: &str) -> Tokenizer<'_> {
  Tokenizer {
    source,
    pos: 0,
    done: false,
  }
}

impl Tokenizer<'_> {
  fn skip_whitespace(&mut self) {
    let bytes = self.source.as_bytes();
    while self.pos < bytes.len() && matches!(bytes[self.pos], b' ' | b'\t' | b'\n' | b'\r') {
      self.pos += 1;
    }
  }

  /// Length of the numeric literal at `start`: `digits`, `digits.digits` or
  /// `.digits`. A trailing `.` without digits is not part of the number.
  fn number_len(&self, start: usize) -> usize {
    let bytes = self.source.as_bytes();
    let digits_from = |mut i: usize| {
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      i
    };

    let int_end = digits_from(start);
    if int_end < bytes.len() && bytes[int_end] == b'.' {
      let frac_end = digits_from(int_end + 1);
      if frac_end > int_end + 1 {
        return frac_end - start;
      }
    }
    int_end - start
  }

  fn lex_number(&self, start: usize, len: usize) -> CompileResult<Token> {
    let text = &self.source[start..start + len];
    let value = text.parse::<f64>().map_err(|err| {
      CompileError::lexical(self.source, start, format!("invalid number '{text}': {err}"))
    })?;
    Ok(Token::new(
      TokenKind::Float,
      start,
      len,
      Some(TokenValue::Number(value)),
    ))
  }

  fn lex_word(&self, start: usize) -> Token {
    let bytes = self.source.as_bytes();
    let mut end = start + 1;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
      end += 1;
    }
    let word = &self.source[start..end];
    let kind = KEYWORDS
      .into_iter()
      .find(|(keyword, _)| *keyword == word)
      .map_or(TokenKind::Ident, |(_, kind)| kind);
    Token::new(kind, start, end - start, keyword_value(kind))
  }

  fn lex(&mut self) -> CompileResult<Token> {
    let bytes = self.source.as_bytes();
    let start = self.pos;
    let c = bytes[start];

    if c.is_ascii_digit() || c == b'.' {
      let len = self.number_len(start);
      if len > 0 {
        self.pos += len;
        return self.lex_number(start, len);
      }
    }

    if c.is_ascii_alphabetic() || c == b'_' {
      let token = self.lex_word(start);
      self.pos += token.len;
      return Ok(token);
    }

    if self.source[start..].starts_with("==") {
      self.pos += 2;
      return Ok(Token::new(TokenKind::EqualEqual, start, 2, None));
    }

    if let Some(kind) = punctuator(c) {
      self.pos += 1;
      return Ok(Token::new(kind, start, 1, None));
    }

    let invalid_char = self.source[start..].chars().next().unwrap_or('\0');
    self.pos += invalid_char.len_utf8();
    let err = CompileError::illegal_char(self.source, start, invalid_char);
    warn!("{err}");
    Err(err)
  }
}

impl Iterator for Tokenizer<'_> {
  type Item = CompileResult<Token>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }

    self.skip_whitespace();
    if self.pos >= self.source.len() {
      self.done = true;
      return Some(Ok(Token::new(TokenKind::Eof, self.source.len(), 0, None)));
    }

    let token = self.lex();
    if let Ok(token) = &token {
      trace!("token {:?} '{}'", token.kind, token.text(self.source));
    }
    Some(token)
  }
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => format!("'{}'", t.text(source)),
    },
    None => "EOF".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;

  fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
      .filter_map(Result::ok)
      .map(|token| token.kind)
      .collect()
  }

  #[test]
  fn lexes_declaration_and_assignment() {
    use TokenKind::*;
    assert_eq!(
      kinds("inteiro x;\nx = 3 + 4;"),
      vec![Inteiro, Ident, Semicolon, Ident, Assign, Float, Plus, Float, Semicolon, Eof]
    );
  }

  #[test]
  fn prefers_equal_equal_over_assign() {
    use TokenKind::*;
    assert_eq!(kinds("a==b=c"), vec![Ident, EqualEqual, Ident, Assign, Ident, Eof]);
  }

  #[test]
  fn keywords_carry_decoded_values() {
    let tokens: Vec<_> = tokenize("boolean inteiro true false")
      .filter_map(Result::ok)
      .collect();
    assert_eq!(tokens[0].value, Some(TokenValue::Type(Type::Bool)));
    assert_eq!(tokens[1].value, Some(TokenValue::Type(Type::Numb)));
    assert_eq!(tokens[2].value, Some(TokenValue::Bool(true)));
    assert_eq!(tokens[3].value, Some(TokenValue::Bool(false)));
  }

  #[test]
  fn keywords_are_whole_words() {
    use TokenKind::*;
    assert_eq!(kinds("android notx or_else"), vec![Ident, Ident, Ident, Eof]);
    assert_eq!(kinds("a and not b or c"), vec![Ident, And, Not, Ident, Or, Ident, Eof]);
  }

  #[test]
  fn numbers_decode_to_floats() {
    let values: Vec<_> = tokenize("42 3.25 .5")
      .filter_map(Result::ok)
      .filter_map(|token| token.value)
      .collect();
    assert_eq!(
      values,
      vec![
        TokenValue::Number(42.0),
        TokenValue::Number(3.25),
        TokenValue::Number(0.5)
      ]
    );
  }

  #[test]
  fn trailing_dot_is_not_part_of_number() {
    let items: Vec<_> = tokenize("3.").collect();
    assert_eq!(items.len(), 3);
    assert!(matches!(&items[0], Ok(token) if token.kind == TokenKind::Float && token.len == 1));
    assert!(matches!(&items[1], Err(err) if err.kind() == ErrorKind::Lexical));
  }

  #[test]
  fn illegal_characters_are_skipped() {
    let items: Vec<_> = tokenize("x $ ;").collect();
    let errors: Vec<_> = items.iter().filter_map(|item| item.as_ref().err()).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
      errors[0].to_string(),
      "Illegal character '$' at line 1, column 3"
    );
    use TokenKind::*;
    assert_eq!(kinds("x $ ;"), vec![Ident, Semicolon, Eof]);
  }

  #[test]
  fn multibyte_illegal_character_is_skipped_whole() {
    use TokenKind::*;
    assert_eq!(kinds("a ç b"), vec![Ident, Ident, Eof]);
  }

  #[test]
  fn stream_is_restartable_by_retokenizing() {
    let source = "x + 1";
    assert_eq!(kinds(source), kinds(source));
    let mut tokens = tokenize(source);
    assert_eq!(tokens.by_ref().count(), 4);
    assert!(tokens.next().is_none());
  }

  #[test]
  fn describes_tokens_for_diagnostics() {
    let source = "x;";
    let tokens: Vec<_> = tokenize(source).filter_map(Result::ok).collect();
    assert_eq!(describe_token(Some(&tokens[0]), source), "'x'");
    assert_eq!(describe_token(tokens.last(), source), "EOF");
    assert_eq!(describe_token(None, source), "EOF");
  }
}
