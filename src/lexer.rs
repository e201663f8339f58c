//! ## SML LEXER
//! **Grounded on `sml_parser.py`'s `SMLParser`/`_get_char` position tracking.**
//!
//! ----------------------------------------------------------------------------
//!
//! Turns source text into a fully materialized, position-indexed token
//! stream in one pass — the grammar is small enough that two-token lookahead
//! beats incremental streaming. Lexing itself cannot fail; malformed input
//! surfaces later as a parse error against a token that doesn't fit the
//! grammar in context.

use std::rc::Rc;

/// A single lexed token: an operator (`<`, `>`, `[`, `]`), a quoted literal
/// (opening/closing delimiter retained in `value`), or a word accumulated
/// from everything else.
///
/// Holds a cheap-to-clone back-reference to the source's line table so a
/// [crate::error::ParseError] built from this token can render the
/// offending source line without re-threading a lifetime through the parser
/// and every error it raises.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
  pub value: String,
  pub line: u32,
  pub col: u32,
  lines: Rc<Vec<String>>,
}

impl Token {
  /// The full source line this token starts on, for diagnostic rendering.
  pub fn source_line(&self) -> &str {
    self.lines.get((self.line.saturating_sub(1)) as usize).map(String::as_str).unwrap_or("")
  }

  /// A placeholder token for an end-of-input diagnostic when the grammar
  /// expected more tokens than the stream produced. Carries no source
  /// line of its own; used only when the cursor has consumed nothing yet.
  pub(crate) fn synthetic_eof() -> Token {
    Token { value: String::new(), line: 1, col: 1, lines: Rc::new(vec![String::new()]) }
  }

  /// True if this token's value is `tag`, compared case-insensitively —
  /// SML TAGs and the `W`/`w` reply-expected flag are both
  /// case-insensitive.
  pub fn is_word(&self, tag: &str) -> bool {
    self.value.eq_ignore_ascii_case(tag)
  }
}

/// Lexes `source` into a flat, positioned token stream.
///
/// Whitespace (space, tab, CR, LF) separates tokens without becoming one.
/// `<`, `>`, `[`, `]` are always single-character tokens. A literal begins
/// at `'` or `"` and runs to the next occurrence of that same quote
/// character; both delimiters are kept in the token's value so downstream
/// readers can tell a quoted string from a bare word. Everything else
/// accumulates into a word token until whitespace, an operator, or a quote
/// interrupts it.
///
/// Line numbers start at 1. Column starts at 1 and advances per character;
/// LF advances the line and resets the column so the next character lands
/// at column 1; CR resets the column the same way without advancing the
/// line. A token is tagged with the position of its first character.
pub fn tokenize(source: &str) -> Vec<Token> {
  let lines: Rc<Vec<String>> = Rc::new(source.split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect());
  let chars: Vec<char> = source.chars().collect();

  let mut tokens = Vec::new();
  let mut word: Option<(String, u32, u32)> = None;
  let mut line: u32 = 1;
  let mut col: u32 = 1;
  let mut i = 0;

  macro_rules! flush_word {
    () => {
      if let Some((value, wline, wcol)) = word.take() {
        log::trace!("lexed word token {value:?} at {wline}:{wcol}");
        tokens.push(Token { value, line: wline, col: wcol, lines: lines.clone() });
      }
    };
  }

  while i < chars.len() {
    let c = chars[i];
    match c {
      ' ' | '\t' => {
        flush_word!();
        col += 1;
        i += 1;
      }
      '\n' => {
        flush_word!();
        line += 1;
        col = 1;
        i += 1;
      }
      '\r' => {
        flush_word!();
        col = 1;
        i += 1;
      }
      '<' | '>' | '[' | ']' => {
        flush_word!();
        log::trace!("lexed operator token {c:?} at {line}:{col}");
        tokens.push(Token { value: c.to_string(), line, col, lines: lines.clone() });
        col += 1;
        i += 1;
      }
      '\'' | '"' => {
        flush_word!();
        let (start_line, start_col) = (line, col);
        let mut value = String::new();
        value.push(c);
        col += 1;
        i += 1;
        while i < chars.len() && chars[i] != c {
          let ch = chars[i];
          value.push(ch);
          match ch {
            '\n' => {
              line += 1;
              col = 1;
            }
            '\r' => col = 1,
            _ => col += 1,
          }
          i += 1;
        }
        if i < chars.len() {
          value.push(chars[i]);
          col += 1;
          i += 1;
        }
        log::trace!("lexed literal token {value:?} at {start_line}:{start_col}");
        tokens.push(Token { value, line: start_line, col: start_col, lines: lines.clone() });
      }
      _ => {
        if word.is_none() {
          word = Some((String::new(), line, col));
        }
        if let Some((value, _, _)) = &mut word {
          value.push(c);
        }
        col += 1;
        i += 1;
      }
    }
  }
  flush_word!();
  tokens
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokenizes_operators_and_words() {
    let tokens = tokenize("S1F1 W < L > .");
    let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
    assert_eq!(values, vec!["S1F1", "W", "<", "L", ">", "."]);
  }

  #[test]
  fn retains_quote_delimiters_in_literal_value() {
    let tokens = tokenize("< A \"ok\" >");
    let literal = &tokens[2];
    assert_eq!(literal.value, "\"ok\"");
  }

  #[test]
  fn tracks_line_and_column_of_first_character() {
    let tokens = tokenize("S1F1\n< U1 300 > .");
    let three_hundred = tokens.iter().find(|t| t.value == "300").unwrap();
    assert_eq!(three_hundred.line, 2);
    assert_eq!(three_hundred.col, 6);
  }

  #[test]
  fn carriage_return_resets_column_without_advancing_line() {
    let tokens = tokenize("S1F1\r< L >");
    let lt = tokens.iter().find(|t| t.value == "<").unwrap();
    assert_eq!(lt.line, 1);
    assert_eq!(lt.col, 1);
  }
}
