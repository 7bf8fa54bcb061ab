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

//! Parsing of `<character-string>`s.

use super::escape::unescape;
use super::reader::Field;
use super::{Error, ErrorKind, Result};

/// The maximum length of a `<character-string>`, which is bounded by
/// its one-octet length prefix.
const MAX_CHARACTER_STRING_LEN: usize = 255;

/// Parses a `<character-string>` ([RFC 1035 § 5.1]) from `field`, which
/// may be quoted or unquoted, and appends its wire form (length octet
/// followed by data) to `rdata`.
///
/// [RFC 1035 § 5.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-5.1
pub(super) fn push_character_string(field: &Field, rdata: &mut Vec<u8>) -> Result<()> {
    let octets = unescape(field)?;
    if octets.len() > MAX_CHARACTER_STRING_LEN {
        return Err(Error::new(
            field.position,
            ErrorKind::CharacterStringTooLong,
        ));
    }
    rdata.push(octets.len() as u8);
    rdata.extend_from_slice(&octets);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::reader::Position;
    use super::*;

    fn field(text: &[u8], quoted: bool) -> Field {
        Field {
            position: Position { line: 1, column: 1 },
            text,
            quoted,
        }
    }

    #[test]
    fn strings_are_length_prefixed() {
        let mut rdata = Vec::new();
        push_character_string(&field(b"hello world", true), &mut rdata).unwrap();
        push_character_string(&field(b"x\\034y", false), &mut rdata).unwrap();
        push_character_string(&field(b"", true), &mut rdata).unwrap();
        assert_eq!(rdata, b"\x0bhello world\x03x\"y\x00");
    }

    #[test]
    fn long_strings_are_rejected() {
        let text = [b'a'; 256];
        let err = push_character_string(&field(&text, false), &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::CharacterStringTooLong);
    }
}
