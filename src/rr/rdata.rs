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

//! Implementation of the [`Rdata`] structure and its component layout.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::Type;
use crate::name::Name;
use crate::util::write_hex;

/// The maximum length of RDATA, which is bounded by the 16-bit
/// RDLENGTH field.
pub const MAX_RDATA_LEN: usize = u16::MAX as usize;

////////////////////////////////////////////////////////////////////////
// RDATA                                                              //
////////////////////////////////////////////////////////////////////////

/// The uncompressed wire form of a record's RDATA.
///
/// Embedded domain names are always stored uncompressed; they are
/// compressed, where [RFC 3597 § 4] allows, only when a response is
/// written. The RR type is not stored here, so methods that need to
/// know where names are embedded take it as a parameter.
///
/// [RFC 3597 § 4]: https://datatracker.ietf.org/doc/html/rfc3597#section-4
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Rdata(Box<[u8]>);

impl Rdata {
    /// Returns the RDATA octets.
    pub fn octets(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds A RDATA.
    pub fn from_ipv4(address: Ipv4Addr) -> Self {
        Self(address.octets().into())
    }

    /// Builds AAAA RDATA.
    pub fn from_ipv6(address: Ipv6Addr) -> Self {
        Self(address.octets().into())
    }

    /// Builds RDATA consisting of a single domain name (NS, CNAME,
    /// PTR).
    pub fn from_name(name: &Name) -> Self {
        Self(name.wire_repr().into())
    }

    /// Splits the RDATA into [`Component`]s according to the layout of
    /// `rr_type`. RDATA that does not match the layout (which cannot
    /// happen for RDATA built by the zone file parser) is reported as a
    /// single opaque component.
    pub fn components(&self, rr_type: Type) -> Vec<Component> {
        let mut components = Vec::new();
        let mut remaining = self.octets();
        for field in layout(rr_type) {
            let len = match field {
                Field::Fixed(len) if *len <= remaining.len() => *len,
                Field::CompressibleName | Field::UncompressibleName => {
                    match Name::validate_uncompressed(remaining) {
                        Ok(len) => len,
                        Err(_) => return vec![Component::Other(self.octets())],
                    }
                }
                Field::Fixed(_) => return vec![Component::Other(self.octets())],
            };
            let (octets, rest) = remaining.split_at(len);
            components.push(match field {
                Field::CompressibleName => Component::CompressibleName(octets),
                Field::UncompressibleName => Component::UncompressibleName(octets),
                Field::Fixed(_) => Component::Other(octets),
            });
            remaining = rest;
        }
        if !remaining.is_empty() {
            components.push(Component::Other(remaining));
        }
        components
    }

    /// Compares two RDATAs of type `rr_type`, treating embedded domain
    /// names case-insensitively and everything else bitwise. This is
    /// the equality used to drop duplicate records.
    pub fn equivalent(&self, other: &Self, rr_type: Type) -> bool {
        let ours = self.components(rr_type);
        let theirs = other.components(rr_type);
        ours.len() == theirs.len()
            && ours.iter().zip(theirs.iter()).all(|pair| match pair {
                (Component::Other(a), Component::Other(b)) => a == b,
                (a, b) => a.octets().eq_ignore_ascii_case(b.octets()),
            })
    }

    /// Returns an object that displays this RDATA in zone file syntax.
    pub fn display(&self, rr_type: Type) -> DisplayRdata {
        DisplayRdata {
            rdata: self,
            rr_type,
        }
    }
}

impl TryFrom<Vec<u8>> for Rdata {
    type Error = RdataTooLongError;

    fn try_from(octets: Vec<u8>) -> Result<Self, Self::Error> {
        if octets.len() > MAX_RDATA_LEN {
            Err(RdataTooLongError)
        } else {
            Ok(Self(octets.into_boxed_slice()))
        }
    }
}

impl TryFrom<&[u8]> for Rdata {
    type Error = RdataTooLongError;

    fn try_from(octets: &[u8]) -> Result<Self, Self::Error> {
        if octets.len() > MAX_RDATA_LEN {
            Err(RdataTooLongError)
        } else {
            Ok(Self(octets.into()))
        }
    }
}

impl fmt::Debug for Rdata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\\# {} ", self.len())?;
        write_hex(f, self.octets())
    }
}

/// An error signaling that RDATA would exceed 65,535 octets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RdataTooLongError;

impl fmt::Display for RdataTooLongError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("RDATA is longer than 65,535 octets")
    }
}

impl std::error::Error for RdataTooLongError {}

////////////////////////////////////////////////////////////////////////
// COMPONENTS                                                         //
////////////////////////////////////////////////////////////////////////

/// A piece of RDATA classified for name compression.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Component<'a> {
    /// An uncompressed name that may be compressed in responses.
    CompressibleName(&'a [u8]),

    /// An uncompressed name that must be written as-is.
    UncompressibleName(&'a [u8]),

    /// Other data.
    Other(&'a [u8]),
}

impl<'a> Component<'a> {
    pub fn octets(&self) -> &'a [u8] {
        match *self {
            Self::CompressibleName(octets)
            | Self::UncompressibleName(octets)
            | Self::Other(octets) => octets,
        }
    }
}

enum Field {
    CompressibleName,
    UncompressibleName,
    Fixed(usize),
}

/// Returns the leading fields of RDATA of type `rr_type`. Anything
/// after these fields is opaque. Only the [RFC 1035] types may have
/// their names compressed ([RFC 3597 § 4]); SRV names may not
/// ([RFC 2782]).
///
/// [RFC 1035]: https://datatracker.ietf.org/doc/html/rfc1035
/// [RFC 2782]: https://datatracker.ietf.org/doc/html/rfc2782
/// [RFC 3597 § 4]: https://datatracker.ietf.org/doc/html/rfc3597#section-4
fn layout(rr_type: Type) -> &'static [Field] {
    match rr_type {
        Type::NS | Type::CNAME | Type::PTR => &[Field::CompressibleName],
        Type::MX => &[Field::Fixed(2), Field::CompressibleName],
        Type::SOA => &[
            Field::CompressibleName,
            Field::CompressibleName,
            Field::Fixed(20),
        ],
        Type::SRV => &[Field::Fixed(6), Field::UncompressibleName],
        _ => &[],
    }
}

////////////////////////////////////////////////////////////////////////
// TEXTUAL FORMAT                                                     //
////////////////////////////////////////////////////////////////////////

/// Displays [`Rdata`] in zone file syntax; see [`Rdata::display`].
pub struct DisplayRdata<'a> {
    rdata: &'a Rdata,
    rr_type: Type,
}

impl fmt::Display for DisplayRdata<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let octets = self.rdata.octets();
        match (self.rr_type, octets.len()) {
            (Type::A, 4) => {
                let address: [u8; 4] = octets.try_into().or(Err(fmt::Error))?;
                return write!(f, "{}", Ipv4Addr::from(address));
            }
            (Type::AAAA, 16) => {
                let address: [u8; 16] = octets.try_into().or(Err(fmt::Error))?;
                return write!(f, "{}", Ipv6Addr::from(address));
            }
            (Type::TXT, _) => {
                if let Some(strings) = split_character_strings(octets) {
                    return write_character_strings(f, &strings);
                }
            }
            _ => (),
        }

        let components = self.rdata.components(self.rr_type);
        let structured = !layout(self.rr_type).is_empty()
            && components.iter().any(|c| !matches!(c, Component::Other(_)));
        if !structured {
            return write!(f, "{:?}", self.rdata);
        }

        let mut first = true;
        for component in components {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            match component {
                Component::CompressibleName(wire) | Component::UncompressibleName(wire) => {
                    match Name::try_from_uncompressed(wire) {
                        Ok((name, _)) => write!(f, "{name}")?,
                        Err(_) => return Err(fmt::Error),
                    }
                }
                Component::Other(data) => write_fixed_fields(f, self.rr_type, data)?,
            }
        }
        Ok(())
    }
}

/// Writes the fixed-width integer fields of MX, SOA, and SRV RDATA.
fn write_fixed_fields(f: &mut fmt::Formatter, rr_type: Type, data: &[u8]) -> fmt::Result {
    let width = if rr_type == Type::SOA { 4 } else { 2 };
    let mut first = true;
    for chunk in data.chunks(width) {
        if !first {
            f.write_str(" ")?;
        }
        first = false;
        match *chunk {
            [a, b] => write!(f, "{}", u16::from_be_bytes([a, b]))?,
            [a, b, c, d] => write!(f, "{}", u32::from_be_bytes([a, b, c, d]))?,
            _ => write_hex(f, chunk)?,
        }
    }
    Ok(())
}

fn split_character_strings(mut octets: &[u8]) -> Option<Vec<&[u8]>> {
    let mut strings = Vec::new();
    while let Some((&len, rest)) = octets.split_first() {
        let string = rest.get(..len as usize)?;
        strings.push(string);
        octets = &rest[len as usize..];
    }
    Some(strings)
}

fn write_character_strings(f: &mut fmt::Formatter, strings: &[&[u8]]) -> fmt::Result {
    for (i, string) in strings.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        f.write_str("\"")?;
        for &octet in string.iter() {
            match octet {
                b'"' | b'\\' => write!(f, "\\{}", octet as char)?,
                b' ' => f.write_str(" ")?,
                _ if octet.is_ascii_graphic() => write!(f, "{}", octet as char)?,
                _ => write!(f, "\\{octet:03}")?,
            }
        }
        f.write_str("\"")?;
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn mx_rdata(preference: u16, exchange: &str) -> Rdata {
        let mut octets = preference.to_be_bytes().to_vec();
        octets.extend_from_slice(exchange.parse::<Name>().unwrap().wire_repr());
        Rdata::try_from(octets).unwrap()
    }

    #[test]
    fn mx_splits_into_preference_and_exchange() {
        let rdata = mx_rdata(10, "mail.example.");
        let components = rdata.components(Type::MX);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0], Component::Other(&[0, 10]));
        assert!(matches!(components[1], Component::CompressibleName(_)));
    }

    #[test]
    fn srv_target_is_not_compressible() {
        let mut octets = vec![0, 1, 0, 2, 0, 80];
        octets.extend_from_slice(b"\x03www\x00");
        let rdata = Rdata::try_from(octets).unwrap();
        let components = rdata.components(Type::SRV);
        assert!(matches!(components[1], Component::UncompressibleName(b"\x03www\x00")));
    }

    #[test]
    fn malformed_rdata_is_opaque() {
        let rdata = Rdata::try_from(&b"\x05ab"[..]).unwrap();
        assert_eq!(rdata.components(Type::NS), vec![Component::Other(b"\x05ab")]);
    }

    #[test]
    fn equivalence_ignores_case_in_names_only() {
        assert!(mx_rdata(10, "MAIL.example.").equivalent(&mx_rdata(10, "mail.EXAMPLE."), Type::MX));
        assert!(!mx_rdata(10, "mail.example.").equivalent(&mx_rdata(20, "mail.example."), Type::MX));
        let upper = Rdata::try_from(&b"\x01A"[..]).unwrap();
        let lower = Rdata::try_from(&b"\x01a"[..]).unwrap();
        assert!(!upper.equivalent(&lower, Type::TXT));
    }

    #[test]
    fn rdata_displays_in_zone_file_syntax() {
        let a = Rdata::from_ipv4(Ipv4Addr::new(192, 0, 2, 1));
        assert_eq!(a.display(Type::A).to_string(), "192.0.2.1");
        assert_eq!(mx_rdata(10, "mail.example.").display(Type::MX).to_string(), "10 mail.example.");
        let txt = Rdata::try_from(&b"\x05hello\x02a\""[..]).unwrap();
        assert_eq!(txt.display(Type::TXT).to_string(), "\"hello\" \"a\\\"\"");
        let unknown = Rdata::try_from(&b"\xab\xcd"[..]).unwrap();
        assert_eq!(unknown.display(Type::from(65280)).to_string(), "\\# 2 abcd");
    }

    #[test]
    fn oversized_rdata_is_rejected() {
        assert_eq!(Rdata::try_from(vec![0; MAX_RDATA_LEN + 1]), Err(RdataTooLongError));
    }
}
