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

//! Small helpers shared across the crate.

/// Matches mnemonics (RR types, classes, directives) without regard to
/// ASCII case.
pub struct Caseless<'a>(pub &'a str);

impl PartialEq for Caseless<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(other.0)
    }
}

impl Eq for Caseless<'_> {}

/// Parses the RFC 3597 numeric form of a mnemonic (e.g. `TYPE65280`
/// or `CLASS1`). Returns [`None`] if `text` does not start with
/// `prefix`, and an error if the suffix is not a valid `u16`.
pub fn parse_generic_mnemonic(text: &str, prefix: &str) -> Option<Result<u16, ()>> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(text[prefix.len()..].parse().map_err(|_| ()))
    } else {
        None
    }
}

/// Returns the value of an ASCII hex digit, if it is one.
pub fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// Writes `octets` as lower-case hex.
pub fn write_hex(f: &mut std::fmt::Formatter, octets: &[u8]) -> std::fmt::Result {
    for octet in octets {
        write!(f, "{octet:02x}")?;
    }
    Ok(())
}
