//! ## BINARY CODEC
//! **Grounded on `semi_e5::Item`'s `From<Item> for Vec<u8>` / `TryFrom<Vec<u8>> for Item`.**
//!
//! ----------------------------------------------------------------------------
//!
//! Encodes an [Item] tree to HSMS item bytes and decodes HSMS item bytes
//! back into one. [Cursor] is an immutable buffer plus an advancing offset
//! rather than a mutable iterator: it never reads past a declared length,
//! and an error at any depth leaves the caller's input untouched (the
//! cursor borrowed from it is simply dropped).
//!
//! [Item]: crate::item::Item

use crate::error::{CodecError, ErrorKind};
use crate::format::FormatCode;
use crate::item::{check_payload_len, Item, MAX_PAYLOAD_LEN};
use crate::limits::Limits;

/// A read-only cursor over an HSMS byte buffer. Advancing past the end of
/// `buf` is a [ErrorKind::TruncatedPayload], never a panic.
struct Cursor<'a> {
  buf: &'a [u8],
  pos: usize,
}

impl<'a> Cursor<'a> {
  fn new(buf: &'a [u8]) -> Self {
    Cursor { buf, pos: 0 }
  }

  fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
    let end = self.pos + n;
    if end > self.buf.len() {
      return Err(CodecError::new(
        ErrorKind::TruncatedPayload,
        self.pos,
        format!("need {n} more bytes, only {} remain", self.buf.len() - self.pos),
      ));
    }
    let slice = &self.buf[self.pos..end];
    self.pos = end;
    Ok(slice)
  }

  fn remaining(&self) -> usize {
    self.buf.len() - self.pos
  }
}

/// Encodes `item` to HSMS item bytes: one format byte, 1–3 big-endian length
/// bytes (the smallest width that fits the payload), then the payload.
pub fn encode(item: &Item) -> Result<Vec<u8>, CodecError> {
  let mut out = Vec::new();
  encode_into(item, &mut out)?;
  Ok(out)
}

fn encode_into(item: &Item, out: &mut Vec<u8>) -> Result<(), CodecError> {
  match item {
    Item::List(children) => {
      write_header(out, item.format_code(), children.len())?;
      for child in children {
        encode_into(child, out)?;
      }
      Ok(())
    }
    Item::Binary(bytes) | Item::Ascii(bytes) | Item::Jis8(bytes) => {
      write_header(out, item.format_code(), bytes.len())?;
      out.extend_from_slice(bytes);
      Ok(())
    }
    Item::Boolean(bools) => {
      write_header(out, item.format_code(), bools.len())?;
      out.extend(bools.iter().map(|&b| b as u8));
      Ok(())
    }
    Item::I1(v) => encode_fixed(out, item.format_code(), v, |n| vec![*n as u8]),
    Item::U1(v) => {
      write_header(out, item.format_code(), v.len())?;
      out.extend_from_slice(v);
      Ok(())
    }
    Item::I2(v) => encode_fixed(out, item.format_code(), v, |n| n.to_be_bytes().to_vec()),
    Item::U2(v) => encode_fixed(out, item.format_code(), v, |n| n.to_be_bytes().to_vec()),
    Item::I4(v) => encode_fixed(out, item.format_code(), v, |n| n.to_be_bytes().to_vec()),
    Item::U4(v) => encode_fixed(out, item.format_code(), v, |n| n.to_be_bytes().to_vec()),
    Item::I8(v) => encode_fixed(out, item.format_code(), v, |n| n.to_be_bytes().to_vec()),
    Item::U8(v) => encode_fixed(out, item.format_code(), v, |n| n.to_be_bytes().to_vec()),
    Item::F4(v) => encode_fixed(out, item.format_code(), v, |n| n.to_be_bytes().to_vec()),
    Item::F8(v) => encode_fixed(out, item.format_code(), v, |n| n.to_be_bytes().to_vec()),
  }
}

fn encode_fixed<T>(out: &mut Vec<u8>, code: FormatCode, values: &[T], to_bytes: impl Fn(&T) -> Vec<u8>) -> Result<(), CodecError> {
  let encoded: Vec<u8> = values.iter().flat_map(|v| to_bytes(v)).collect();
  write_header(out, code, encoded.len())?;
  out.extend_from_slice(&encoded);
  Ok(())
}

/// Writes the format byte and the smallest length-byte-count (1, 2, or 3)
/// that can hold `len`.
fn write_header(out: &mut Vec<u8>, code: FormatCode, len: usize) -> Result<(), CodecError> {
  if len > MAX_PAYLOAD_LEN {
    return Err(CodecError::new(ErrorKind::SizeOverflow, out.len(), format!("payload length {len} exceeds 0xFFFFFF")));
  }
  let top: u8 = code.into();
  if len <= 0xFF {
    out.push((top << 2) | 1);
    out.push(len as u8);
  } else if len <= 0xFFFF {
    out.push((top << 2) | 2);
    out.extend_from_slice(&(len as u16).to_be_bytes());
  } else {
    out.push((top << 2) | 3);
    out.extend_from_slice(&(len as u32).to_be_bytes()[1..]);
  }
  log::debug!("encoded item header: code={top:#o} len={len}");
  Ok(())
}

/// Decodes a single HSMS item from `bytes`. Trailing bytes past the item's
/// own length are left unconsumed; callers that expect an exact-length
/// buffer should check the returned cursor position themselves via
/// [decode_exact].
pub fn decode(bytes: &[u8], limits: &Limits) -> Result<Item, CodecError> {
  let mut cursor = Cursor::new(bytes);
  decode_item(&mut cursor, limits, 0)
}

/// Decodes a single HSMS item from `bytes`, requiring the item to consume
/// the entire buffer.
pub fn decode_exact(bytes: &[u8], limits: &Limits) -> Result<Item, CodecError> {
  let mut cursor = Cursor::new(bytes);
  let item = decode_item(&mut cursor, limits, 0)?;
  if cursor.remaining() > 0 {
    log::warn!("decode_exact: {} trailing bytes after item", cursor.remaining());
    return Err(CodecError::new(
      ErrorKind::TruncatedPayload,
      cursor.pos,
      format!("{} trailing bytes after the decoded item", cursor.remaining()),
    ));
  }
  Ok(item)
}

fn decode_item(cursor: &mut Cursor, limits: &Limits, depth: u32) -> Result<Item, CodecError> {
  let header_offset = cursor.pos;
  let format_byte = cursor.take(1)?[0];
  let code_bits = format_byte >> 2;
  let length_byte_count = format_byte & 0b11;
  if length_byte_count == 0 {
    return Err(CodecError::new(ErrorKind::TruncatedPayload, header_offset, "format byte declares zero length bytes"));
  }
  let length_bytes = cursor.take(length_byte_count as usize)?;
  let mut widened = [0u8; 4];
  widened[4 - length_bytes.len()..].copy_from_slice(length_bytes);
  let length = u32::from_be_bytes(widened) as usize;
  check_payload_len(length, header_offset)?;

  let code = FormatCode::try_from(code_bits)
    .map_err(|_| CodecError::new(ErrorKind::UnknownType, header_offset, format!("unrecognized format code {code_bits:#o}")))?;
  log::debug!("decoding item: code={code_bits:#o} len={length} offset={header_offset}");

  match code {
    FormatCode::List => {
      if depth + 1 > limits.max_depth {
        return Err(CodecError::new(
          ErrorKind::TruncatedPayload,
          header_offset,
          format!("exceeded max nesting depth {}", limits.max_depth),
        ));
      }
      // `length` is the wire-declared child count, not yet validated against
      // the buffer; each child needs at least 2 bytes (a format byte plus
      // one length byte), so capacity is capped by what the remaining
      // buffer could possibly hold rather than trusting the declared count.
      let capacity = length.min(cursor.remaining() / 2);
      let mut children = Vec::with_capacity(capacity);
      for _ in 0..length {
        children.push(decode_item(cursor, limits, depth + 1)?);
      }
      Ok(Item::List(children))
    }
    FormatCode::Binary => Ok(Item::Binary(cursor.take(length)?.to_vec())),
    FormatCode::Ascii => Ok(Item::Ascii(cursor.take(length)?.to_vec())),
    FormatCode::Jis8 => Ok(Item::Jis8(cursor.take(length)?.to_vec())),
    FormatCode::Boolean => Ok(Item::Boolean(cursor.take(length)?.iter().map(|&b| b > 0).collect())),
    FormatCode::I1 => Ok(Item::I1(cursor.take(length)?.iter().map(|&b| b as i8).collect())),
    FormatCode::U1 => Ok(Item::U1(cursor.take(length)?.to_vec())),
    FormatCode::I2 => decode_fixed(cursor, length, header_offset, |b| i16::from_be_bytes([b[0], b[1]])).map(Item::I2),
    FormatCode::U2 => decode_fixed(cursor, length, header_offset, |b| u16::from_be_bytes([b[0], b[1]])).map(Item::U2),
    FormatCode::I4 => decode_fixed(cursor, length, header_offset, |b| i32::from_be_bytes(b.try_into().unwrap())).map(Item::I4),
    FormatCode::U4 => decode_fixed(cursor, length, header_offset, |b| u32::from_be_bytes(b.try_into().unwrap())).map(Item::U4),
    FormatCode::I8 => decode_fixed(cursor, length, header_offset, |b| i64::from_be_bytes(b.try_into().unwrap())).map(Item::I8),
    FormatCode::U8 => decode_fixed(cursor, length, header_offset, |b| u64::from_be_bytes(b.try_into().unwrap())).map(Item::U8),
    FormatCode::F4 => decode_fixed(cursor, length, header_offset, |b| f32::from_be_bytes(b.try_into().unwrap())).map(Item::F4),
    FormatCode::F8 => decode_fixed(cursor, length, header_offset, |b| f64::from_be_bytes(b.try_into().unwrap())).map(Item::F8),
  }
}

/// Decodes a fixed-width numeric payload. `length` must be a multiple of
/// `std::mem::size_of::<T>()`'s on-wire width, which the caller encodes as
/// the chunk size implied by `from_be`'s argument; the width itself is
/// inferred from the slice passed to `from_be`.
fn decode_fixed<T>(cursor: &mut Cursor, length: usize, offset: usize, from_be: impl Fn(&[u8]) -> T) -> Result<Vec<T>, CodecError> {
  let width = std::mem::size_of::<T>();
  if length % width != 0 {
    return Err(CodecError::new(
      ErrorKind::TruncatedPayload,
      offset,
      format!("payload length {length} is not a multiple of element width {width}"),
    ));
  }
  let bytes = cursor.take(length)?;
  Ok(bytes.chunks_exact(width).map(from_be).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_list_encodes_to_two_bytes() {
    let bytes = encode(&Item::List(vec![])).unwrap();
    assert_eq!(bytes, vec![0b000000_01, 0x00]);
  }

  #[test]
  fn single_u2_list_matches_scenario_bytes() {
    let item = Item::U2(vec![0, 1, 2, 3]);
    let bytes = encode(&item).unwrap();
    assert_eq!(bytes, vec![0xA9, 0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02, 0x00, 0x03]);
  }

  #[test]
  fn nested_list_with_ascii_and_u1_round_trips() {
    let item = Item::List(vec![Item::Ascii(b"ok".to_vec()), Item::U1(vec![42])]);
    let bytes = encode(&item).unwrap();
    assert_eq!(bytes, vec![0x01, 0x02, 0x41, 0x02, 0x6F, 0x6B, 0xA5, 0x01, 0x2A]);
    assert_eq!(decode_exact(&bytes, &Limits::default()).unwrap(), item);
  }

  #[test]
  fn binary_decode_reports_truncation() {
    let bytes = [0xA5, 0x04, 0x01, 0x02, 0x03];
    let err = decode_exact(&bytes, &Limits::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TruncatedPayload);
  }

  #[test]
  fn unknown_format_code_is_rejected() {
    let bytes = [0b111111_01, 0x00];
    let err = decode_exact(&bytes, &Limits::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownType);
  }

  #[test]
  fn round_trips_every_variant() {
    let item = Item::List(vec![
      Item::Binary(vec![1, 2, 3]),
      Item::Boolean(vec![true, false]),
      Item::I1(vec![-1, 1]),
      Item::I2(vec![-100, 100]),
      Item::I4(vec![-100000, 100000]),
      Item::I8(vec![-1, 1]),
      Item::U1(vec![1, 2]),
      Item::U2(vec![1, 2]),
      Item::U4(vec![1, 2]),
      Item::U8(vec![1, 2]),
      Item::F4(vec![1.5, -2.5]),
      Item::F8(vec![1.5, -2.5]),
    ]);
    let bytes = encode(&item).unwrap();
    assert_eq!(decode_exact(&bytes, &Limits::default()).unwrap(), item);
  }

  #[test]
  fn depth_limit_rejects_deeply_nested_lists() {
    let mut item = Item::List(vec![]);
    for _ in 0..10 {
      item = Item::List(vec![item]);
    }
    let bytes = encode(&item).unwrap();
    let limits = Limits { max_depth: 5 };
    let err = decode_exact(&bytes, &limits).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TruncatedPayload);
  }

  #[test]
  fn oversized_declared_list_length_fails_without_huge_allocation() {
    // Format byte claims an `L` of 0xFFFFFF children (three length bytes,
    // all 0xFF) backed by only two more bytes. The declared count must
    // never drive the child `Vec`'s capacity directly, or this allocates
    // ~16M `Item` slots before discovering the buffer is short.
    let bytes = [0b000000_11, 0xFF, 0xFF, 0xFF, 0x00, 0x00];
    let err = decode_exact(&bytes, &Limits::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TruncatedPayload);
  }
}
