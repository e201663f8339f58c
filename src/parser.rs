//! ## SML PARSER
//! **Grounded on `secs_data.py`'s `SECSData._read_item`/`_read_items`/`_read_length`.**
//!
//! ----------------------------------------------------------------------------
//!
//! Recursive-descent over the token stream C1 produces, building the [Item]
//! tree of C2. Every per-variant override the source dispatches through its
//! subclass registry becomes one match arm here; shared helpers (count
//! verification, numeric literal parsing, the printable-literal byte reader)
//! are free functions per the closed-tagged-union redesign.
//!
//! [Item]: crate::item::Item

use crate::error::{ErrorKind, ParseError};
use crate::item::Item;
use crate::lexer::Token;
use crate::limits::Limits;

/// Positioned, rewindable view over a token stream. Shared by the item
/// grammar here and by the outer `SxFy [W] <item> .` shell in
/// [crate::envelope].
pub(crate) struct TokenCursor {
  tokens: Vec<Token>,
  pos: usize,
}

impl TokenCursor {
  pub(crate) fn new(tokens: Vec<Token>) -> Self {
    TokenCursor { tokens, pos: 0 }
  }

  pub(crate) fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  pub(crate) fn peek_is(&self, value: &str) -> bool {
    self.peek().is_some_and(|t| t.value == value)
  }

  pub(crate) fn advance(&mut self) -> Option<Token> {
    let token = self.tokens.get(self.pos).cloned();
    if token.is_some() {
      self.pos += 1;
    }
    token
  }

  /// The last token consumed, used to locate an error when the stream runs
  /// out before the grammar is satisfied.
  fn last(&self) -> Option<Token> {
    self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)).cloned()
  }

  fn eof_error(&self, expected: &str) -> ParseError {
    let token = self.last().or_else(|| self.tokens.first().cloned()).unwrap_or_else(Token::synthetic_eof);
    ParseError::new(ErrorKind::SyntaxError, token, format!("expected {expected}, found end of input"))
  }

  pub(crate) fn expect(&mut self, value: &str) -> Result<Token, ParseError> {
    match self.advance() {
      Some(token) if token.value == value => Ok(token),
      Some(token) => Err(ParseError::new(ErrorKind::SyntaxError, token.clone(), format!("expected '{value}'"))),
      None => Err(self.eof_error(&format!("'{value}'"))),
    }
  }

  fn advance_or_err(&mut self, expected: &str) -> Result<Token, ParseError> {
    self.advance().ok_or_else(|| self.eof_error(expected))
  }
}

/// Parses one `<TAG [N] body>` item, recursing into children for `L`.
///
/// `depth` is the nesting level of this call; exceeding `limits.max_depth`
/// raises `TruncatedPayload` rather than recursing further, mirroring the
/// decoder's own guard in C4.
pub(crate) fn parse_item(cursor: &mut TokenCursor, limits: &Limits, depth: u32) -> Result<Item, ParseError> {
  cursor.expect("<")?;
  let tag_token = cursor.advance_or_err("a TAG")?;
  let tag = tag_token.value.to_ascii_uppercase();
  log::debug!("parse_item enter: tag={tag} depth={depth}");

  let count = if cursor.peek_is("[") {
    cursor.advance();
    let count_token = cursor.advance_or_err("a count")?;
    let n = parse_int_literal(&count_token)?;
    if n < 0 {
      return Err(ParseError::new(ErrorKind::ValueOutOfRange, count_token, "count cannot be negative"));
    }
    cursor.expect("]")?;
    Some((n as usize, count_token))
  } else {
    None
  };

  let item = match tag.as_str() {
    "L" => {
      if depth + 1 > limits.max_depth {
        return Err(ParseError::new(
          ErrorKind::TruncatedPayload,
          tag_token.clone(),
          format!("exceeded max nesting depth {}", limits.max_depth),
        ));
      }
      let mut children = Vec::new();
      while !cursor.peek_is(">") {
        if cursor.peek().is_none() {
          return Err(cursor.eof_error("'>'"));
        }
        children.push(parse_item(cursor, limits, depth + 1)?);
      }
      verify_count(&count, children.len())?;
      Item::list(children).map_err(|kind| ParseError::new(kind, tag_token.clone(), "list exceeds maximum length"))?
    }
    "B" => {
      let values = read_bounded_ints(cursor, 0, u8::MAX as i64)?;
      verify_count(&count, values.len())?;
      Item::Binary(values.into_iter().map(|v| v as u8).collect())
    }
    "BOOLEAN" => {
      let values = read_bounded_ints(cursor, 0, 1)?;
      verify_count(&count, values.len())?;
      Item::Boolean(values.into_iter().map(|v| v != 0).collect())
    }
    "A" => {
      let bytes = read_byte_literal_values(cursor, false)?;
      verify_count(&count, bytes.len())?;
      Item::Ascii(bytes)
    }
    "J" => {
      let bytes = read_byte_literal_values(cursor, true)?;
      verify_count(&count, bytes.len())?;
      Item::Jis8(bytes)
    }
    "I1" => {
      let values = read_bounded_ints(cursor, i8::MIN as i64, i8::MAX as i64)?;
      verify_count(&count, values.len())?;
      Item::I1(values.into_iter().map(|v| v as i8).collect())
    }
    "I2" => {
      let values = read_bounded_ints(cursor, i16::MIN as i64, i16::MAX as i64)?;
      verify_count(&count, values.len())?;
      Item::I2(values.into_iter().map(|v| v as i16).collect())
    }
    "I4" => {
      let values = read_bounded_ints(cursor, i32::MIN as i64, i32::MAX as i64)?;
      verify_count(&count, values.len())?;
      Item::I4(values.into_iter().map(|v| v as i32).collect())
    }
    "I8" => {
      let values = read_bounded_ints(cursor, i64::MIN, i64::MAX)?;
      verify_count(&count, values.len())?;
      Item::I8(values)
    }
    "U1" => {
      let values = read_bounded_ints(cursor, 0, u8::MAX as i64)?;
      verify_count(&count, values.len())?;
      Item::U1(values.into_iter().map(|v| v as u8).collect())
    }
    "U2" => {
      let values = read_bounded_ints(cursor, 0, u16::MAX as i64)?;
      verify_count(&count, values.len())?;
      Item::U2(values.into_iter().map(|v| v as u16).collect())
    }
    "U4" => {
      let values = read_bounded_ints(cursor, 0, u32::MAX as i64)?;
      verify_count(&count, values.len())?;
      Item::U4(values.into_iter().map(|v| v as u32).collect())
    }
    "U8" => {
      let values = read_u64_values(cursor)?;
      verify_count(&count, values.len())?;
      Item::U8(values)
    }
    "F4" => {
      let values = read_bounded_floats(cursor, f32::MAX as f64)?;
      verify_count(&count, values.len())?;
      Item::F4(values.into_iter().map(|v| v as f32).collect())
    }
    "F8" => {
      let values = read_bounded_floats(cursor, f64::MAX)?;
      verify_count(&count, values.len())?;
      Item::F8(values)
    }
    _ => {
      return Err(ParseError::new(ErrorKind::UnknownType, tag_token.clone(), format!("unknown SML tag '{}'", tag_token.value)));
    }
  };

  cursor.expect(">")?;
  log::debug!("parse_item exit: tag={tag} depth={depth} len={}", item.len());
  Ok(item)
}

fn verify_count(count: &Option<(usize, Token)>, actual: usize) -> Result<(), ParseError> {
  if let Some((n, token)) = count {
    if *n > 0 && *n != actual {
      return Err(ParseError::new(
        ErrorKind::CountMismatch,
        token.clone(),
        format!("declared count {n} does not match {actual} parsed elements"),
      ));
    }
  }
  Ok(())
}

/// Parses a numeric literal with an optional `0x`/`0o`/`0b` base prefix and
/// optional leading `-`, mirroring Python's `int(text, 0)`.
fn parse_int_literal(token: &Token) -> Result<i64, ParseError> {
  let raw = token.value.as_str();
  let (negative, rest) = match raw.strip_prefix('-') {
    Some(stripped) => (true, stripped),
    None => (false, raw),
  };
  let (radix, digits) = if let Some(d) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
    (16, d)
  } else if let Some(d) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
    (8, d)
  } else if let Some(d) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
    (2, d)
  } else {
    (10, rest)
  };
  let magnitude = i64::from_str_radix(digits, radix)
    .map_err(|_| ParseError::new(ErrorKind::SyntaxError, token.clone(), format!("invalid numeric literal '{}'", token.value)))?;
  Ok(if negative { -magnitude } else { magnitude })
}

/// Parses a numeric literal in `U8`'s full 0..=2^64-1 wire range. `U8` is the
/// one variant whose declared bounds exceed what `i64` can hold, so it
/// cannot route through [parse_int_literal]'s shared `i64` path; a literal
/// like `18446744073709551615` (`u64::MAX`) would overflow that path and
/// raise a spurious syntax error instead of parsing.
fn parse_uint_literal(token: &Token) -> Result<u64, ParseError> {
  let raw = token.value.as_str();
  if raw.starts_with('-') {
    return Err(ParseError::new(ErrorKind::ValueOutOfRange, token.clone(), "value cannot be negative"));
  }
  let (radix, digits) = if let Some(d) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
    (16, d)
  } else if let Some(d) = raw.strip_prefix("0o").or_else(|| raw.strip_prefix("0O")) {
    (8, d)
  } else if let Some(d) = raw.strip_prefix("0b").or_else(|| raw.strip_prefix("0B")) {
    (2, d)
  } else {
    (10, raw)
  };
  u64::from_str_radix(digits, radix)
    .map_err(|_| ParseError::new(ErrorKind::SyntaxError, token.clone(), format!("invalid numeric literal '{}'", token.value)))
}

fn read_u64_values(cursor: &mut TokenCursor) -> Result<Vec<u64>, ParseError> {
  let mut values = Vec::new();
  while !cursor.peek_is(">") {
    let token = cursor.advance_or_err("a numeric literal or '>'")?;
    values.push(parse_uint_literal(&token)?);
  }
  Ok(values)
}

fn read_bounded_ints(cursor: &mut TokenCursor, min: i64, max: i64) -> Result<Vec<i64>, ParseError> {
  let mut values = Vec::new();
  while !cursor.peek_is(">") {
    let token = cursor.advance_or_err("a numeric literal or '>'")?;
    let value = parse_int_literal(&token)?;
    if value < min || value > max {
      return Err(ParseError::new(
        ErrorKind::ValueOutOfRange,
        token.clone(),
        format!("value {value} outside [{min}, {max}]"),
      ));
    }
    values.push(value);
  }
  Ok(values)
}

fn read_bounded_floats(cursor: &mut TokenCursor, max_abs: f64) -> Result<Vec<f64>, ParseError> {
  let mut values = Vec::new();
  while !cursor.peek_is(">") {
    let token = cursor.advance_or_err("a float literal or '>'")?;
    let value: f64 = token
      .value
      .parse()
      .map_err(|_| ParseError::new(ErrorKind::SyntaxError, token.clone(), format!("invalid float literal '{}'", token.value)))?;
    if value.is_finite() && value.abs() > max_abs {
      return Err(ParseError::new(ErrorKind::ValueOutOfRange, token.clone(), format!("value {value} exceeds variant range")));
    }
    values.push(value);
  }
  Ok(values)
}

/// Reads the body of an `A`/`J` item: a quoted token contributes its inner
/// text as bytes (rejecting non-ASCII when `ascii_only` is set, per `J`'s
/// Open Question resolution), anything else parses as an integer byte.
fn read_byte_literal_values(cursor: &mut TokenCursor, ascii_only: bool) -> Result<Vec<u8>, ParseError> {
  let mut bytes = Vec::new();
  while !cursor.peek_is(">") {
    let token = cursor.advance_or_err("a string literal, numeric literal, or '>'")?;
    let first = token.value.chars().next();
    if matches!(first, Some('\'') | Some('"')) {
      let inner_end = token.value.len().saturating_sub(first.map(char::len_utf8).unwrap_or(1));
      let inner = &token.value[first.map(char::len_utf8).unwrap_or(1)..inner_end];
      for ch in inner.chars() {
        if ascii_only && !ch.is_ascii() {
          return Err(ParseError::new(ErrorKind::ValueOutOfRange, token.clone(), format!("non-ASCII character '{ch}'")));
        }
        if (ch as u32) > 0xFF {
          return Err(ParseError::new(ErrorKind::ValueOutOfRange, token.clone(), format!("character '{ch}' outside Latin-1 range")));
        }
        bytes.push(ch as u32 as u8);
      }
    } else {
      let value = parse_int_literal(&token)?;
      if !(0..=255).contains(&value) {
        return Err(ParseError::new(ErrorKind::ValueOutOfRange, token.clone(), format!("value {value} outside [0, 255]")));
      }
      bytes.push(value as u8);
    }
  }
  Ok(bytes)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lexer::tokenize;

  fn parse(src: &str) -> Result<Item, ParseError> {
    let mut cursor = TokenCursor::new(tokenize(src));
    parse_item(&mut cursor, &Limits::default(), 0)
  }

  #[test]
  fn parses_empty_list() {
    assert_eq!(parse("< L >").unwrap(), Item::List(vec![]));
  }

  #[test]
  fn parses_nested_list_with_ascii() {
    let item = parse("< L [2] < A \"ok\" > < U1 42 > >").unwrap();
    assert_eq!(item, Item::List(vec![Item::Ascii(b"ok".to_vec()), Item::U1(vec![42])]));
  }

  #[test]
  fn rejects_out_of_range_value_at_its_own_token() {
    let err = parse("< U1 300 >").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValueOutOfRange);
    assert_eq!(err.token.value, "300");
  }

  #[test]
  fn rejects_count_mismatch_at_the_count_token() {
    let err = parse("< U1 [3] 1 2 >").unwrap_err();
    assert_eq!(err.kind, ErrorKind::CountMismatch);
    assert_eq!(err.token.value, "3");
  }

  #[test]
  fn rejects_unknown_tag() {
    let err = parse("< ZZZ 1 >").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownType);
  }

  #[test]
  fn hex_and_octal_and_binary_prefixes_parse() {
    let item = parse("< U1 0x2A 0o52 0b101010 >").unwrap();
    assert_eq!(item, Item::U1(vec![42, 42, 42]));
  }

  #[test]
  fn u8_parses_full_64_bit_range() {
    let item = parse("< U8 18446744073709551615 0 >").unwrap();
    assert_eq!(item, Item::U8(vec![u64::MAX, 0]));
  }

  #[test]
  fn u8_rejects_negative_values() {
    let err = parse("< U8 -1 >").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValueOutOfRange);
  }
}
