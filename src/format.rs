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

//! ## ITEM FORMAT CODE
//! **Based on SEMI E5§9.2.2**
//!
//! ----------------------------------------------------------------------------
//!
//! The 6-bit format code occupying the top bits of an [Item]'s wire header
//! byte. A closed enum rather than the source's open subclass registry: every
//! variant the codec can produce or consume is enumerated here, and
//! [TryFromPrimitive] gives the decoder a single fallible conversion point for
//! an unrecognized code instead of a runtime lookup table.
//!
//! [Item]: crate::item::Item
//! [TryFromPrimitive]: num_enum::TryFromPrimitive

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// ### FORMAT CODE
/// **Based on SEMI E5§9.2.2**
///
/// The six most significant bits of an item's header byte. Stored here
/// shifted down to the low six bits; callers reconstruct the header byte via
/// `(code as u8) << 2 | length_byte_count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum FormatCode {
  /// **Format Code 0o00**
  List = 0b000000,
  /// **Format Code 0o10**
  Binary = 0b001000,
  /// **Format Code 0o11**
  Boolean = 0b001001,
  /// **Format Code 0o20**
  Ascii = 0b010000,
  /// **Format Code 0o21**
  Jis8 = 0b010001,
  /// **Format Code 0o30**
  I8 = 0b011000,
  /// **Format Code 0o31**
  I1 = 0b011001,
  /// **Format Code 0o32**
  I2 = 0b011010,
  /// **Format Code 0o34**
  I4 = 0b011100,
  /// **Format Code 0o40**
  F8 = 0b100000,
  /// **Format Code 0o44**
  F4 = 0b100100,
  /// **Format Code 0o50**
  U8 = 0b101000,
  /// **Format Code 0o51**
  U1 = 0b101001,
  /// **Format Code 0o52**
  U2 = 0b101010,
  /// **Format Code 0o54**
  U4 = 0b101100,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_through_u8() {
    for code in [
      FormatCode::List, FormatCode::Binary, FormatCode::Boolean,
      FormatCode::Ascii, FormatCode::Jis8, FormatCode::I8, FormatCode::I1,
      FormatCode::I2, FormatCode::I4, FormatCode::F8, FormatCode::F4,
      FormatCode::U8, FormatCode::U1, FormatCode::U2, FormatCode::U4,
    ] {
      let byte: u8 = code.into();
      assert_eq!(FormatCode::try_from(byte), Ok(code));
    }
  }

  #[test]
  fn rejects_unused_code() {
    assert!(FormatCode::try_from(0b111111).is_err());
  }
}
