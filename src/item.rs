// Copyright © 2024 Nathaniel Hardesty
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the “Software”), to
// deal in the Software without restriction, including without limitation the
// rights to use, copy, modify, merge, publish, distribute, sublicense, and/or
// sell copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS
// IN THE SOFTWARE.

//! ## DATA TREE
//! **Based on SEMI E5§9.2**
//!
//! ----------------------------------------------------------------------------
//!
//! [Item] is a closed tagged union of the fourteen SECS-II data types plus
//! `L`, replacing the source's abstract base class with per-variant
//! subclasses registered at import time via `__init_subclass__`. Every
//! variant's numeric bounds are the variant's chosen Rust primitive width —
//! `I1` is `Vec<i8>`, `U2` is `Vec<u16>`, and so on — so the type system
//! enforces the bounds table directly; there is no shared, overridable
//! default bound to get wrong.

use crate::error::{CodecError, ErrorKind};
use crate::format::FormatCode;

/// A single SECS-II data element: either an ordered list of child items, or
/// a typed array of scalars.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
  /// `L` — ordered sequence of child items. `len` must fit the 24-bit
  /// header length field.
  List(Vec<Item>),
  /// `B` — raw byte sequence.
  Binary(Vec<u8>),
  /// `BOOLEAN` — sequence of truth values, one wire byte each.
  Boolean(Vec<bool>),
  /// `A` — Latin-1 byte sequence.
  Ascii(Vec<u8>),
  /// `J` — byte sequence, 7-bit-ASCII-displayable when printable.
  Jis8(Vec<u8>),
  /// `I8` — 64-bit signed integers, big-endian on the wire.
  I8(Vec<i64>),
  /// `I1` — 8-bit signed integers.
  I1(Vec<i8>),
  /// `I2` — 16-bit signed integers, big-endian on the wire.
  I2(Vec<i16>),
  /// `I4` — 32-bit signed integers, big-endian on the wire.
  I4(Vec<i32>),
  /// `F8` — IEEE-754 binary64, big-endian on the wire.
  F8(Vec<f64>),
  /// `F4` — IEEE-754 binary32, big-endian on the wire.
  F4(Vec<f32>),
  /// `U8` — 64-bit unsigned integers, big-endian on the wire.
  U8(Vec<u64>),
  /// `U1` — 8-bit unsigned integers.
  U1(Vec<u8>),
  /// `U2` — 16-bit unsigned integers, big-endian on the wire.
  U2(Vec<u16>),
  /// `U4` — 32-bit unsigned integers, big-endian on the wire.
  U4(Vec<u32>),
}

/// Largest payload length the 3-byte header length field can carry.
pub const MAX_PAYLOAD_LEN: usize = 0xFF_FFFF;

impl Item {
  /// Constructs a `L` item, rejecting a child count that cannot fit the
  /// 24-bit header length field.
  pub fn list(children: Vec<Item>) -> Result<Item, ErrorKind> {
    if children.len() > MAX_PAYLOAD_LEN {
      return Err(ErrorKind::SizeOverflow);
    }
    Ok(Item::List(children))
  }

  /// Constructs a `B` item from a single host integer, per the Open
  /// Question resolution: a scalar int is a **one-byte** payload equal to
  /// that int, not a zero-filled buffer of that length.
  pub fn binary_scalar(value: i64) -> Result<Item, ErrorKind> {
    bounds_check(value, 0, u8::MAX as i64)?;
    Ok(Item::Binary(vec![value as u8]))
  }

  /// Constructs a `B` item from host integers, each bounds-checked against
  /// 0..=255.
  pub fn binary_from_values(values: &[i64]) -> Result<Item, ErrorKind> {
    let mut bytes = Vec::with_capacity(values.len());
    for &v in values {
      bounds_check(v, 0, u8::MAX as i64)?;
      bytes.push(v as u8);
    }
    Ok(Item::Binary(bytes))
  }

  /// Constructs a `BOOLEAN` item from host integers, bounds-checked against
  /// 0..=1; nonzero values fold to `true` only via [Item::boolean_fold],
  /// used by the parser — this constructor is strict.
  pub fn boolean_from_values(values: &[i64]) -> Result<Item, ErrorKind> {
    let mut out = Vec::with_capacity(values.len());
    for &v in values {
      bounds_check(v, 0, 1)?;
      out.push(v != 0);
    }
    Ok(Item::Boolean(out))
  }

  /// Constructs a `BOOLEAN` item folding any nonzero value to `true`, as
  /// the SML grammar for `B`/`BOOLEAN` value tokens specifies.
  pub fn boolean_fold(values: &[i64]) -> Item {
    Item::Boolean(values.iter().map(|&v| v != 0).collect())
  }

  /// Constructs a `J` item from a Rust string, rejecting any codepoint
  /// outside 7-bit ASCII per the Open Question resolution for `J`.
  pub fn jis8_from_str(s: &str) -> Result<Item, ErrorKind> {
    if !s.is_ascii() {
      return Err(ErrorKind::InvalidType);
    }
    Ok(Item::Jis8(s.as_bytes().to_vec()))
  }

  fn checked_vec<T, F>(values: &[i64], min: i64, max: i64, narrow: F) -> Result<Vec<T>, ErrorKind>
  where
    F: Fn(i64) -> T,
  {
    let mut out = Vec::with_capacity(values.len());
    for &v in values {
      bounds_check(v, min, max)?;
      out.push(narrow(v));
    }
    Ok(out)
  }

  /// Constructs an `I1` item from host integers, bounds-checked against
  /// the variant's declared range.
  pub fn i1_from_values(values: &[i64]) -> Result<Item, ErrorKind> {
    Self::checked_vec(values, i8::MIN as i64, i8::MAX as i64, |v| v as i8).map(Item::I1)
  }

  /// Constructs an `I2` item from host integers, bounds-checked against
  /// the variant's declared range.
  pub fn i2_from_values(values: &[i64]) -> Result<Item, ErrorKind> {
    Self::checked_vec(values, i16::MIN as i64, i16::MAX as i64, |v| v as i16).map(Item::I2)
  }

  /// Constructs an `I4` item from host integers, bounds-checked against
  /// the variant's declared range.
  pub fn i4_from_values(values: &[i64]) -> Result<Item, ErrorKind> {
    Self::checked_vec(values, i32::MIN as i64, i32::MAX as i64, |v| v as i32).map(Item::I4)
  }

  /// Constructs an `I8` item from host integers; `i64` already matches
  /// the wire width, so no narrowing is required.
  pub fn i8_from_values(values: &[i64]) -> Item {
    Item::I8(values.to_vec())
  }

  /// Constructs a `U1` item from host integers, bounds-checked against
  /// the variant's declared range.
  pub fn u1_from_values(values: &[i64]) -> Result<Item, ErrorKind> {
    Self::checked_vec(values, 0, u8::MAX as i64, |v| v as u8).map(Item::U1)
  }

  /// Constructs a `U2` item from host integers, bounds-checked against
  /// the variant's declared range.
  pub fn u2_from_values(values: &[i64]) -> Result<Item, ErrorKind> {
    Self::checked_vec(values, 0, u16::MAX as i64, |v| v as u16).map(Item::U2)
  }

  /// Constructs a `U4` item from host integers, bounds-checked against
  /// the variant's declared range.
  pub fn u4_from_values(values: &[i64]) -> Result<Item, ErrorKind> {
    Self::checked_vec(values, 0, u32::MAX as i64, |v| v as u32).map(Item::U4)
  }

  /// Constructs a `U8` item from host `u64` values. Unlike every other
  /// numeric constructor here, this one does not take `&[i64]`: `U8`'s
  /// declared range is 0..=2^64-1, and an `i64` host value cannot itself
  /// reach the top half of that range, so `u64` is the only host type wide
  /// enough to construct the whole variant.
  pub fn u8_from_values(values: &[u64]) -> Item {
    Item::U8(values.to_vec())
  }

  /// The SML tag naming this variant. Matching is case-insensitive on the
  /// parser side; this always returns the canonical upper-case spelling.
  pub fn sml_tag(&self) -> &'static str {
    match self {
      Item::List(_) => "L",
      Item::Binary(_) => "B",
      Item::Boolean(_) => "BOOLEAN",
      Item::Ascii(_) => "A",
      Item::Jis8(_) => "J",
      Item::I8(_) => "I8",
      Item::I1(_) => "I1",
      Item::I2(_) => "I2",
      Item::I4(_) => "I4",
      Item::F8(_) => "F8",
      Item::F4(_) => "F4",
      Item::U8(_) => "U8",
      Item::U1(_) => "U1",
      Item::U2(_) => "U2",
      Item::U4(_) => "U4",
    }
  }

  /// The 6-bit HSMS format code identifying this variant on the wire.
  pub fn format_code(&self) -> FormatCode {
    match self {
      Item::List(_) => FormatCode::List,
      Item::Binary(_) => FormatCode::Binary,
      Item::Boolean(_) => FormatCode::Boolean,
      Item::Ascii(_) => FormatCode::Ascii,
      Item::Jis8(_) => FormatCode::Jis8,
      Item::I8(_) => FormatCode::I8,
      Item::I1(_) => FormatCode::I1,
      Item::I2(_) => FormatCode::I2,
      Item::I4(_) => FormatCode::I4,
      Item::F8(_) => FormatCode::F8,
      Item::F4(_) => FormatCode::F4,
      Item::U8(_) => FormatCode::U8,
      Item::U1(_) => FormatCode::U1,
      Item::U2(_) => FormatCode::U2,
      Item::U4(_) => FormatCode::U4,
    }
  }

  /// The number of elements this item's payload carries (children for
  /// `L`, scalars otherwise).
  pub fn len(&self) -> usize {
    match self {
      Item::List(v) => v.len(),
      Item::Binary(v) => v.len(),
      Item::Boolean(v) => v.len(),
      Item::Ascii(v) => v.len(),
      Item::Jis8(v) => v.len(),
      Item::I8(v) => v.len(),
      Item::I1(v) => v.len(),
      Item::I2(v) => v.len(),
      Item::I4(v) => v.len(),
      Item::F8(v) => v.len(),
      Item::F4(v) => v.len(),
      Item::U8(v) => v.len(),
      Item::U1(v) => v.len(),
      Item::U2(v) => v.len(),
      Item::U4(v) => v.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Renders this item as canonical SML, indented `indent` spaces. Matches
  /// the canonical emission rules: empty payloads as `< TAG >`, numeric
  /// leaves as space-separated decimals (hex for `B`/`BOOLEAN`), `A`/`J` as
  /// printable-run-grouped quoted/hex mixes, and `L` as a multi-line block
  /// with children indented four further spaces.
  pub fn to_sml(&self, indent: usize) -> String {
    let pad = " ".repeat(indent);
    match self {
      Item::List(children) => render_list(&pad, children, indent),
      Item::Binary(bytes) => render_scalars(&pad, "B", bytes.iter().map(|b| format!("0x{b:X}"))),
      Item::Boolean(bools) => {
        render_scalars(&pad, "BOOLEAN", bools.iter().map(|b| if *b { "0x1".to_string() } else { "0x0".to_string() }))
      }
      Item::Ascii(bytes) => render_bytes(&pad, "A", bytes),
      Item::Jis8(bytes) => render_bytes(&pad, "J", bytes),
      Item::I8(v) => render_scalars(&pad, "I8", v.iter().map(|n| n.to_string())),
      Item::I1(v) => render_scalars(&pad, "I1", v.iter().map(|n| n.to_string())),
      Item::I2(v) => render_scalars(&pad, "I2", v.iter().map(|n| n.to_string())),
      Item::I4(v) => render_scalars(&pad, "I4", v.iter().map(|n| n.to_string())),
      Item::F8(v) => render_scalars(&pad, "F8", v.iter().map(|n| n.to_string())),
      Item::F4(v) => render_scalars(&pad, "F4", v.iter().map(|n| n.to_string())),
      Item::U8(v) => render_scalars(&pad, "U8", v.iter().map(|n| n.to_string())),
      Item::U1(v) => render_scalars(&pad, "U1", v.iter().map(|n| n.to_string())),
      Item::U2(v) => render_scalars(&pad, "U2", v.iter().map(|n| n.to_string())),
      Item::U4(v) => render_scalars(&pad, "U4", v.iter().map(|n| n.to_string())),
    }
  }
}

fn bounds_check(value: i64, min: i64, max: i64) -> Result<(), ErrorKind> {
  if value < min || value > max {
    Err(ErrorKind::ValueOutOfRange)
  } else {
    Ok(())
  }
}

fn render_list(pad: &str, children: &[Item], indent: usize) -> String {
  if children.is_empty() {
    return format!("{pad}< L >");
  }
  let mut out = format!("{pad}< L [{}]\n", children.len());
  for (i, child) in children.iter().enumerate() {
    out.push_str(&child.to_sml(indent + 4));
    if i + 1 < children.len() {
      out.push('\n');
    }
  }
  out.push('\n');
  out.push_str(pad);
  out.push('>');
  out
}

fn render_scalars(pad: &str, tag: &str, values: impl Iterator<Item = String>) -> String {
  let body: Vec<String> = values.collect();
  if body.is_empty() {
    format!("{pad}< {tag} >")
  } else {
    format!("{pad}< {tag} {} >", body.join(" "))
  }
}

/// The printable-run emission rule shared by `A` and `J`: consecutive
/// printable bytes (ASCII 0x20..=0x7E) group into a double-quoted run;
/// everything else becomes an individual `0xNN` token.
fn render_bytes(pad: &str, tag: &str, bytes: &[u8]) -> String {
  if bytes.is_empty() {
    return format!("{pad}< {tag} >");
  }
  let mut tokens: Vec<String> = Vec::new();
  let mut run = String::new();
  for &b in bytes {
    if is_printable(b) {
      run.push(b as char);
    } else {
      if !run.is_empty() {
        tokens.push(format!("\"{run}\""));
        run.clear();
      }
      tokens.push(format!("0x{b:02X}"));
    }
  }
  if !run.is_empty() {
    tokens.push(format!("\"{run}\""));
  }
  format!("{pad}< {tag} {} >", tokens.join(" "))
}

/// Any ASCII printable character except `\r` and `\n`: the visible
/// 0x20..=0x7E range plus tab, vertical-tab, and form-feed, matching
/// Python's `string.printable` with its two newline characters stripped.
fn is_printable(b: u8) -> bool {
  matches!(b, 0x09 | 0x0B | 0x0C) || (0x20..=0x7E).contains(&b)
}

/// Checks a decoded payload length against [MAX_PAYLOAD_LEN] before
/// allocation, per the decoder's pre-validation requirement.
pub fn check_payload_len(len: usize, offset: usize) -> Result<(), CodecError> {
  if len > MAX_PAYLOAD_LEN {
    return Err(CodecError::new(ErrorKind::SizeOverflow, offset, "payload length exceeds 0xFFFFFF"));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn binary_scalar_is_one_byte() {
    let item = Item::binary_scalar(200).unwrap();
    assert_eq!(item, Item::Binary(vec![200]));
  }

  #[test]
  fn binary_scalar_rejects_out_of_range() {
    assert_eq!(Item::binary_scalar(256), Err(ErrorKind::ValueOutOfRange));
    assert_eq!(Item::binary_scalar(-1), Err(ErrorKind::ValueOutOfRange));
  }

  #[test]
  fn u1_from_values_rejects_over_255() {
    assert_eq!(Item::u1_from_values(&[300]), Err(ErrorKind::ValueOutOfRange));
  }

  #[test]
  fn empty_list_renders_single_line() {
    let item = Item::List(vec![]);
    assert_eq!(item.to_sml(0), "< L >");
  }

  #[test]
  fn nested_list_renders_indented_block() {
    let item = Item::List(vec![Item::Ascii(b"ok".to_vec()), Item::U1(vec![42])]);
    let expected = "< L [2]\n    < A \"ok\" >\n    < U1 42 >\n>";
    assert_eq!(item.to_sml(0), expected);
  }

  #[test]
  fn ascii_groups_printable_runs_around_non_printables() {
    let item = Item::Ascii(vec![b'o', b'k', 0xFF, b'm', b'o', b'r', b'e']);
    assert_eq!(item.to_sml(0), "< A \"ok\" 0xFF \"more\" >");
  }

  #[test]
  fn boolean_renders_as_hex() {
    let item = Item::Boolean(vec![true, false]);
    assert_eq!(item.to_sml(0), "< BOOLEAN 0x1 0x0 >");
  }

  #[test]
  fn tab_vtab_and_formfeed_fold_into_printable_runs() {
    let item = Item::Ascii(vec![b'a', 0x09, b'b', 0x0B, b'c', 0x0C, b'd']);
    assert_eq!(item.to_sml(0), "< A \"a\tb\u{0B}c\u{0C}d\" >");
  }

  #[test]
  fn carriage_return_and_newline_are_not_printable() {
    let item = Item::Ascii(vec![b'a', b'\r', b'\n', b'b']);
    assert_eq!(item.to_sml(0), "< A \"a\" 0x0D 0x0A \"b\" >");
  }

  #[test]
  fn boolean_from_values_folds_nonzero_and_rejects_out_of_range() {
    assert_eq!(Item::boolean_from_values(&[0, 1]).unwrap(), Item::Boolean(vec![false, true]));
    assert_eq!(Item::boolean_from_values(&[2]), Err(ErrorKind::ValueOutOfRange));
  }

  #[test]
  fn boolean_fold_treats_any_nonzero_as_true() {
    assert_eq!(Item::boolean_fold(&[0, 5, -1]), Item::Boolean(vec![false, true, true]));
  }

  #[test]
  fn binary_from_values_bounds_checks_each_byte() {
    assert_eq!(Item::binary_from_values(&[0, 255]).unwrap(), Item::Binary(vec![0, 255]));
    assert_eq!(Item::binary_from_values(&[256]), Err(ErrorKind::ValueOutOfRange));
  }

  #[test]
  fn signed_width_constructors_bounds_check_their_range() {
    assert_eq!(Item::i2_from_values(&[-32768, 32767]).unwrap(), Item::I2(vec![-32768, 32767]));
    assert_eq!(Item::i2_from_values(&[32768]), Err(ErrorKind::ValueOutOfRange));
    assert_eq!(Item::i4_from_values(&[-2147483648, 2147483647]).unwrap(), Item::I4(vec![-2147483648, 2147483647]));
    assert_eq!(Item::i4_from_values(&[2147483648]), Err(ErrorKind::ValueOutOfRange));
    assert_eq!(Item::i8_from_values(&[i64::MIN, i64::MAX]), Item::I8(vec![i64::MIN, i64::MAX]));
  }

  #[test]
  fn unsigned_width_constructors_bounds_check_their_range() {
    assert_eq!(Item::u2_from_values(&[0, 65535]).unwrap(), Item::U2(vec![0, 65535]));
    assert_eq!(Item::u2_from_values(&[65536]), Err(ErrorKind::ValueOutOfRange));
    assert_eq!(Item::u4_from_values(&[0, u32::MAX as i64]).unwrap(), Item::U4(vec![0, u32::MAX]));
    assert_eq!(Item::u4_from_values(&[-1]), Err(ErrorKind::ValueOutOfRange));
    assert_eq!(Item::u8_from_values(&[0, u64::MAX]), Item::U8(vec![0, u64::MAX]));
  }

  #[test]
  fn jis8_from_str_accepts_ascii_and_rejects_non_ascii() {
    assert_eq!(Item::jis8_from_str("ok").unwrap(), Item::Jis8(b"ok".to_vec()));
    assert_eq!(Item::jis8_from_str("\u{00e9}"), Err(ErrorKind::InvalidType));
  }
}
