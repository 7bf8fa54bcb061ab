// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Decoding of escape sequences.

use super::reader::Field;
use super::{Error, ErrorKind, Result};

/// An octet of field text after escape processing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Octet {
    Literal(u8),
    Escaped(u8),
}

impl Octet {
    pub fn value(self) -> u8 {
        match self {
            Self::Literal(octet) | Self::Escaped(octet) => octet,
        }
    }
}

/// Iterates over the octets of a field's text, decoding escape
/// sequences (see [RFC 1035 § 5.1] and [RFC 4343 § 2.1]). Each item
/// also carries the index of the octet (or of the start of its escape
/// sequence) in the field's text, for error reporting.
///
/// [RFC 1035 § 5.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-5.1
/// [RFC 4343 § 2.1]: https://datatracker.ietf.org/doc/html/rfc4343#section-2.1
pub(super) struct Unescape<'a> {
    field: &'a Field<'a>,
    index: usize,
}

impl<'a> Unescape<'a> {
    pub fn new(field: &'a Field<'a>) -> Self {
        Self { field, index: 0 }
    }

    fn error(&self, index: usize, kind: ErrorKind) -> Error {
        Error::new(self.field.position_at(index), kind)
    }

    fn decimal_escape(&self, start: usize) -> Result<u8> {
        let digits = self
            .field
            .text
            .get(start + 1..start + 4)
            .filter(|digits| digits.iter().all(u8::is_ascii_digit))
            .ok_or_else(|| self.error(start, ErrorKind::EscapeNeedsThreeDigits))?;
        let value = digits
            .iter()
            .fold(0usize, |value, digit| 10 * value + (digit - b'0') as usize);
        value
            .try_into()
            .map_err(|_| self.error(start, ErrorKind::EscapeValueOutOfRange))
    }
}

impl Iterator for Unescape<'_> {
    type Item = Result<(usize, Octet)>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.index;
        let first = *self.field.text.get(start)?;
        if first != b'\\' {
            self.index += 1;
            return Some(Ok((start, Octet::Literal(first))));
        }

        let result = match self.field.text.get(start + 1) {
            None => Err(self.error(start, ErrorKind::EofInEscape)),
            Some(digit) if digit.is_ascii_digit() => self.decimal_escape(start).map(|value| {
                self.index += 4;
                (start, Octet::Escaped(value))
            }),
            Some(&other) => {
                self.index += 2;
                Ok((start, Octet::Escaped(other)))
            }
        };
        if result.is_err() {
            self.index = self.field.text.len();
        }
        Some(result)
    }
}

/// Decodes all escape sequences in a field.
pub(super) fn unescape(field: &Field) -> Result<Vec<u8>> {
    Unescape::new(field)
        .map(|item| item.map(|(_, octet)| octet.value()))
        .collect()
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::super::reader::Position;
    use super::*;

    fn field(text: &[u8]) -> Field {
        Field {
            position: Position { line: 1, column: 1 },
            text,
            quoted: false,
        }
    }

    #[test]
    fn decimal_and_character_escapes_are_decoded() {
        assert_eq!(unescape(&field(b"a\\065\\.\\\\z")), Ok(b"aA.\\z".to_vec()));
    }

    #[test]
    fn escaped_octets_are_distinguished() {
        let field = field(b".\\.");
        let octets: Vec<_> = Unescape::new(&field).map(Result::unwrap).collect();
        assert_eq!(octets, [(0, Octet::Literal(b'.')), (1, Octet::Escaped(b'.'))]);
    }

    #[test]
    fn short_decimal_escapes_are_rejected() {
        let err = unescape(&field(b"ab\\12")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::EscapeNeedsThreeDigits);
        assert_eq!(err.column(), 3);
    }

    #[test]
    fn out_of_range_escapes_are_rejected() {
        let err = unescape(&field(b"\\256")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::EscapeValueOutOfRange);
    }
}
