//! ## STREAM/FUNCTION ENVELOPE
//! **Grounded on `secs_data.py`'s `SECSFunction` (`from_sml`, `from_hsms_packet`, `__repr__`).**
//!
//! ----------------------------------------------------------------------------
//!
//! Wraps a root [Item] with the outer `SxxFyy [W] <item> .` shell and bridges
//! to the HSMS header on ingress/egress. The envelope never builds or parses
//! the 10-byte HSMS header itself — that remains the caller's external
//! collaborator, reached here only through the [HsmsPacket] trait, which
//! replaces the source's duck-typed `packet.header.stream` / `packet.data`
//! access with a compile-time-checked seam.

use crate::codec::{decode_exact, encode};
use crate::error::{CodecError, Error, ErrorKind, ParseError};
use crate::item::Item;
use crate::lexer::tokenize;
use crate::limits::Limits;
use crate::parser::{parse_item, TokenCursor};

/// A parsed or about-to-be-emitted SECS-II message: stream number, function
/// number, the reply-expected (`W`) bit, and an optional root item (absent
/// means an empty body).
#[derive(Clone, Debug, PartialEq)]
pub struct StreamFunction {
  pub stream: u8,
  pub function: u8,
  pub w_bit: bool,
  pub root: Option<Item>,
}

impl StreamFunction {
  pub fn new(stream: u8, function: u8, w_bit: bool, root: Option<Item>) -> Self {
    StreamFunction { stream, function, w_bit, root }
  }

  /// Parses `S<digits>F<digits> [W] ( '.' | item '.' )` into a
  /// [StreamFunction], using [Limits::default] for recursion depth.
  pub fn from_sml(text: &str) -> Result<StreamFunction, Error> {
    Self::from_sml_with_limits(text, &Limits::default())
  }

  /// As [StreamFunction::from_sml], with caller-supplied recursion limits.
  pub fn from_sml_with_limits(text: &str, limits: &Limits) -> Result<StreamFunction, Error> {
    let tokens = tokenize(text);
    let mut cursor = TokenCursor::new(tokens);

    let header_token = cursor.advance().ok_or_else(|| {
      Error::Parse(ParseError::new(ErrorKind::SyntaxError, crate::lexer::Token::synthetic_eof(), "expected a stream/function header"))
    })?;
    let (stream, function) = parse_stream_function(&header_token)?;

    let w_bit = if cursor.peek().is_some_and(|t| t.is_word("w")) {
      cursor.advance();
      true
    } else {
      false
    };

    let root = if cursor.peek_is(".") {
      cursor.advance();
      None
    } else {
      let item = parse_item(&mut cursor, limits, 0)?;
      cursor.expect(".")?;
      Some(item)
    };

    Ok(StreamFunction { stream, function, w_bit, root })
  }

  /// Builds a [StreamFunction] from an HSMS packet: the header's stream,
  /// function, and reply-expected bit, plus the decoded root item (`None`
  /// if the packet carries no data).
  pub fn from_hsms_packet<P: HsmsPacket>(packet: &P, limits: &Limits) -> Result<StreamFunction, CodecError> {
    let root = if packet.data().is_empty() { None } else { Some(decode_exact(packet.data(), limits)?) };
    Ok(StreamFunction { stream: packet.stream(), function: packet.function(), w_bit: packet.require_response(), root })
  }

  /// Renders the canonical textual form: `SxFy [W]\n    <item>\n.`.
  pub fn to_sml(&self) -> String {
    let mut text = format!("S{}F{}", self.stream, self.function);
    if self.w_bit {
      text.push_str(" W");
    }
    match &self.root {
      None => text.push_str("\n."),
      Some(item) => {
        text.push('\n');
        text.push_str(&item.to_sml(4));
        text.push_str("\n.");
      }
    }
    text
  }

  /// Encodes the root item's HSMS bytes (empty if there is no root item).
  pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
    match &self.root {
      None => Ok(Vec::new()),
      Some(item) => encode(item),
    }
  }
}

/// The interaction point this envelope needs from the external HSMS layer:
/// the header fields that name a message, and its raw item payload. This
/// crate supplies no production implementer — the 10-byte header it would
/// come from is an external collaborator — only a `#[cfg(test)]` fixture
/// exercising [StreamFunction::from_hsms_packet].
pub trait HsmsPacket {
  fn stream(&self) -> u8;
  fn function(&self) -> u8;
  fn require_response(&self) -> bool;
  fn data(&self) -> &[u8];
}

fn parse_stream_function(token: &crate::lexer::Token) -> Result<(u8, u8), ParseError> {
  let value = token.value.as_str();
  let mut chars = value.char_indices();
  let first = chars.next();
  if !matches!(first, Some((_, 's' | 'S'))) {
    return Err(ParseError::new(ErrorKind::SyntaxError, token.clone(), "expected a stream/function header like 'S1F1'"));
  }
  let rest = &value[1..];
  let f_index = rest
    .find(|c: char| c == 'f' || c == 'F')
    .ok_or_else(|| ParseError::new(ErrorKind::SyntaxError, token.clone(), "stream/function header is missing 'F'"))?;
  let stream_text = &rest[..f_index];
  let function_text = &rest[f_index + 1..];

  let stream: u32 = stream_text
    .parse()
    .map_err(|_| ParseError::new(ErrorKind::SyntaxError, token.clone(), "stream number is not a valid integer"))?;
  let function: u32 = function_text
    .parse()
    .map_err(|_| ParseError::new(ErrorKind::SyntaxError, token.clone(), "function number is not a valid integer"))?;

  if stream > 127 {
    return Err(ParseError::new(ErrorKind::ValueOutOfRange, token.clone(), "stream number exceeds 127"));
  }
  if function > 255 {
    return Err(ParseError::new(ErrorKind::ValueOutOfRange, token.clone(), "function number exceeds 255"));
  }
  Ok((stream as u8, function as u8))
}

#[cfg(test)]
mod tests {
  use super::*;

  struct FixturePacket {
    stream: u8,
    function: u8,
    require_response: bool,
    data: Vec<u8>,
  }

  impl HsmsPacket for FixturePacket {
    fn stream(&self) -> u8 {
      self.stream
    }
    fn function(&self) -> u8 {
      self.function
    }
    fn require_response(&self) -> bool {
      self.require_response
    }
    fn data(&self) -> &[u8] {
      &self.data
    }
  }

  #[test]
  fn parses_empty_body_with_w_bit() {
    let sf = StreamFunction::from_sml("S1F1 W < L > .").unwrap();
    assert_eq!(sf.stream, 1);
    assert_eq!(sf.function, 1);
    assert!(sf.w_bit);
    assert_eq!(sf.root, Some(Item::List(vec![])));
  }

  #[test]
  fn parses_terminator_only_body() {
    let sf = StreamFunction::from_sml("S1F1 .").unwrap();
    assert_eq!(sf.root, None);
  }

  #[test]
  fn to_sml_round_trips_through_from_sml() {
    let sf = StreamFunction::new(1, 2, false, Some(Item::U1(vec![42])));
    let rendered = sf.to_sml();
    let reparsed = StreamFunction::from_sml(&rendered).unwrap();
    assert_eq!(reparsed, sf);
  }

  #[test]
  fn from_hsms_packet_decodes_root_item() {
    let packet = FixturePacket { stream: 1, function: 1, require_response: true, data: encode(&Item::U1(vec![1, 2])).unwrap() };
    let sf = StreamFunction::from_hsms_packet(&packet, &Limits::default()).unwrap();
    assert_eq!(sf.stream, 1);
    assert_eq!(sf.function, 1);
    assert!(sf.w_bit);
    assert_eq!(sf.root, Some(Item::U1(vec![1, 2])));
  }

  #[test]
  fn from_hsms_packet_with_empty_data_has_no_root() {
    let packet = FixturePacket { stream: 2, function: 13, require_response: false, data: vec![] };
    let sf = StreamFunction::from_hsms_packet(&packet, &Limits::default()).unwrap();
    assert_eq!(sf.root, None);
  }
}
