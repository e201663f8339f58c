//! ## ERROR TYPES
//!
//! Structured, located error values: no pre-formatted multi-line
//! strings are raised from deep inside the lexer, parser, or codec — each
//! carries a [ErrorKind], the context needed to locate the fault (a [Token]
//! for parse errors, a byte offset for codec errors), and a plain message.
//! Rendering to text happens only at the outer boundary, via `Display`.

use std::fmt;

use crate::lexer::Token;

/// The seven ways a message can fail to round-trip cleanly between SML,
/// the [Item] tree, and HSMS bytes.
///
/// [Item]: crate::item::Item
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  /// Unexpected token where the grammar demanded a specific one.
  SyntaxError,
  /// A TAG or format code does not name a known [Item] variant.
  ///
  /// [Item]: crate::item::Item
  UnknownType,
  /// A numeric literal fell outside its variant's declared bounds.
  ValueOutOfRange,
  /// An explicit `[N]` count disagreed with the number of elements parsed.
  CountMismatch,
  /// A declared length ran past the end of the buffer, or a fixed-width
  /// payload length was not a multiple of its element size.
  TruncatedPayload,
  /// A payload exceeds the 3-byte length field's 0xFFFFFF ceiling.
  SizeOverflow,
  /// A host value offered to a variant constructor had a disallowed shape.
  InvalidType,
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      ErrorKind::SyntaxError => "syntax error",
      ErrorKind::UnknownType => "unknown type",
      ErrorKind::ValueOutOfRange => "value out of range",
      ErrorKind::CountMismatch => "count mismatch",
      ErrorKind::TruncatedPayload => "truncated payload",
      ErrorKind::SizeOverflow => "size overflow",
      ErrorKind::InvalidType => "invalid type",
    };
    write!(f, "{text}")
  }
}

/// An error raised by the lexer-fed recursive-descent parser (C3), or by a
/// bounds check performed during SML-driven construction (C2).
///
/// Renders as a three-line diagnostic: the offending source line,
/// a caret under the fault column, and a message.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseError {
  pub kind: ErrorKind,
  pub token: Token,
  pub message: String,
}

impl ParseError {
  pub fn new(kind: ErrorKind, token: Token, message: impl Into<String>) -> Self {
    ParseError { kind, token, message: message.into() }
  }
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let line = self.token.source_line();
    let caret = " ".repeat(self.token.col.saturating_sub(1) as usize);
    writeln!(f, "{line}")?;
    writeln!(f, "{caret}^")?;
    write!(f, "{}: {}", self.kind, self.message)
  }
}

impl std::error::Error for ParseError {}

/// An error raised while encoding an [Item] tree to HSMS bytes or decoding
/// HSMS bytes back into one (C4).
///
/// [Item]: crate::item::Item
#[derive(Clone, Debug, PartialEq)]
pub struct CodecError {
  pub kind: ErrorKind,
  pub offset: usize,
  pub message: String,
}

impl CodecError {
  pub fn new(kind: ErrorKind, offset: usize, message: impl Into<String>) -> Self {
    CodecError { kind, offset, message: message.into() }
  }
}

impl fmt::Display for CodecError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} at byte offset {}", self.message, self.offset)
  }
}

impl std::error::Error for CodecError {}

/// Unifies [ParseError] and [CodecError] for call sites that move across
/// the SML/wire boundary (the envelope's combined helpers) and need one
/// return type.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
  Parse(ParseError),
  Codec(CodecError),
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::Parse(e) => write!(f, "{e}"),
      Error::Codec(e) => write!(f, "{e}"),
    }
  }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
  fn from(e: ParseError) -> Self {
    Error::Parse(e)
  }
}

impl From<CodecError> for Error {
  fn from(e: CodecError) -> Self {
    Error::Codec(e)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codec_error_renders_message_and_offset_only() {
    let err = CodecError::new(ErrorKind::TruncatedPayload, 7, "need 3 more bytes, only 1 remains");
    assert_eq!(err.to_string(), "need 3 more bytes, only 1 remains at byte offset 7");
  }
}
