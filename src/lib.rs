//! # SEMI EQUIPMENT COMMUNICATIONS STANDARD 2 (SECS-II) DATA & MESSAGING CORE
//! **Based on:**
//! - **[SEMI E5]-0712** (data item types and SML)
//! - **[SEMI E37]** (the HSMS item wire encoding this codec targets)
//!
//! ---------------------------------------------------------------------------
//!
//! This crate is the bidirectional mapping at the center of a SECS-II/HSMS
//! equipment-communication simulator: SML text, an in-memory typed [Item]
//! tree, and HSMS wire bytes, plus the stream/function envelope that wraps
//! a root item for transmission. It is deliberately narrow — the command
//! server, the scripting host, the dynamic loader for an external SECS/GEM
//! library, and the HSMS connection state machine (including its 10-byte
//! message header) all live outside this crate. [envelope::HsmsPacket] is
//! the one seam this crate exposes toward that header.
//!
//! ---------------------------------------------------------------------------
//!
//! ## MODULES
//!
//! - [format] — the 6-bit item format code.
//! - [item] — the [Item] data tree: construction, bounds, canonical SML
//!   rendering.
//! - [lexer] — tokenizes SML source into positioned tokens.
//! - [parser] — recursive-descent parse of tokens into an [Item].
//! - [codec] — encode/decode between [Item] and HSMS item bytes.
//! - [envelope] — the `SxFy [W] <item> .` shell and the HSMS ingress seam.
//! - [error] — located, structured error values for all of the above.
//! - [limits] — the recursion-depth guard shared by the parser and decoder.
//!
//! ---------------------------------------------------------------------------
//!
//! ## REFERENCED STANDARDS
//!
//! - SEMI E5  - SEMI Equipment Communications Standard 2 (SECS-II) Message Content
//! - SEMI E37 - High-Speed SECS Message Services (HSMS) Generic Services
//!
//! [SEMI E5]:  https://store-us.semi.org/products/e00500-semi-e5-specification-for-semi-equipment-communications-standard-2-message-content-secs-ii
//! [SEMI E37]: https://store-us.semi.org/products/e03700-semi-e37-high-speed-secs-message-services-hsms-generic-services

pub mod codec;
pub mod envelope;
pub mod error;
pub mod format;
pub mod item;
pub mod lexer;
pub mod limits;
pub mod parser;

pub use codec::{decode, decode_exact, encode};
pub use envelope::{HsmsPacket, StreamFunction};
pub use error::{CodecError, Error, ErrorKind, ParseError};
pub use format::FormatCode;
pub use item::Item;
pub use lexer::Token;
pub use limits::Limits;

#[cfg(test)]
mod tests {
  use super::*;

  /// The cross round-trip law: for well-formed SML `m`,
  /// `decode(encode(parse(m).root)) == parse(m).root`.
  #[test]
  fn cross_round_trip_sml_to_wire_and_back() {
    let sf = StreamFunction::from_sml("S1F2 < L [2] < A \"ok\" > < U1 42 > > .").unwrap();
    let root = sf.root.clone().unwrap();
    let bytes = encode(&root).unwrap();
    let decoded = decode_exact(&bytes, &Limits::default()).unwrap();
    assert_eq!(decoded, root);
  }

  /// The binary round-trip law, exercised across every scalar variant.
  #[test]
  fn binary_round_trip_every_variant() {
    let items = vec![
      Item::Binary(vec![0, 128, 255]),
      Item::Boolean(vec![true, false, true]),
      Item::Ascii(b"hello".to_vec()),
      Item::Jis8(b"world".to_vec()),
      Item::I1(vec![i8::MIN, 0, i8::MAX]),
      Item::I2(vec![i16::MIN, 0, i16::MAX]),
      Item::I4(vec![i32::MIN, 0, i32::MAX]),
      Item::I8(vec![i64::MIN, 0, i64::MAX]),
      Item::U1(vec![0, 255]),
      Item::U2(vec![0, u16::MAX]),
      Item::U4(vec![0, u32::MAX]),
      Item::U8(vec![0, u64::MAX]),
      Item::F4(vec![0.0, -1.5, 1.5]),
      Item::F8(vec![0.0, -1.5, 1.5]),
    ];
    for item in items {
      let bytes = encode(&item).unwrap();
      assert_eq!(decode_exact(&bytes, &Limits::default()).unwrap(), item);
    }
  }

  #[test]
  fn header_size_minimality() {
    // length 0xFF fits one length byte; 0x100 needs two.
    let small = Item::Binary(vec![0u8; 0xFF]);
    let bytes = encode(&small).unwrap();
    assert_eq!(bytes[0] & 0b11, 1);

    let large = Item::Binary(vec![0u8; 0x100]);
    let bytes = encode(&large).unwrap();
    assert_eq!(bytes[0] & 0b11, 2);
  }
}
