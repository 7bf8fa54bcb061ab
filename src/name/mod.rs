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

//! Implementation of data structures related to domain names.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use arrayvec::ArrayVec;

mod builder;
mod error;
mod wire;
pub use builder::NameBuilder;
pub use error::Error;

/// The maximum number of labels in a domain name, including the null
/// label.
const MAX_N_LABELS: usize = 128;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label (not including its length octet).
const MAX_LABEL_LEN: usize = 63;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// An absolute domain name.
///
/// A `Name` owns the uncompressed on-the-wire representation of the
/// name ([RFC 1035 § 3.1]) together with the offset of each label in
/// it, so that label access and suffix extraction need no scanning.
///
/// Comparison and hashing are ASCII-case-insensitive, as [RFC 4343]
/// requires; the original case is kept for output.
///
/// `Name`s are constructed
///
/// * from text through the [`FromStr`] implementation or a
///   [`NameBuilder`];
/// * from uncompressed wire data with [`Name::try_from_uncompressed`];
///   and
/// * from messages with [`Name::try_from_compressed`], which follows
///   compression pointers.
///
/// [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1
/// [RFC 4343]: https://datatracker.ietf.org/doc/html/rfc4343
#[derive(Clone)]
pub struct Name {
    wire: Box<[u8]>,
    label_offsets: ArrayVec<u8, MAX_N_LABELS>,
}

impl Name {
    /// Builds a `Name` from wire data already known to be a valid,
    /// uncompressed name occupying all of `wire`.
    fn from_valid_wire(wire: &[u8]) -> Self {
        let mut label_offsets = ArrayVec::new();
        let mut offset = 0;
        while offset < wire.len() {
            label_offsets.push(offset as u8);
            offset += wire[offset] as usize + 1;
        }
        Self {
            wire: wire.into(),
            label_offsets,
        }
    }

    /// Returns the name of the DNS root.
    pub fn root() -> Self {
        Self::from_valid_wire(&[0])
    }

    /// Returns whether this is the root name.
    pub fn is_root(&self) -> bool {
        self.wire.len() == 1
    }

    /// Returns whether the first label of this name is `*`.
    pub fn is_wildcard(&self) -> bool {
        self.label_count() > 1 && self.label(0) == b"*"
    }

    /// Returns the number of labels in the name, including the
    /// terminating null label.
    pub fn label_count(&self) -> usize {
        self.label_offsets.len()
    }

    /// Returns the octets of label `n` (without its length octet).
    ///
    /// # Panics
    ///
    /// Panics if `n` is not less than [`Name::label_count`].
    pub fn label(&self, n: usize) -> &[u8] {
        let offset = self.label_offsets[n] as usize;
        let len = self.wire[offset] as usize;
        &self.wire[offset + 1..offset + 1 + len]
    }

    /// Iterates over the labels of the name, from the leftmost label to
    /// the null label.
    pub fn labels(&self) -> impl DoubleEndedIterator<Item = &[u8]> + ExactSizeIterator + '_ {
        (0..self.label_count()).map(|n| self.label(n))
    }

    /// Returns whether this name equals `other` or is below it.
    pub fn eq_or_subdomain_of(&self, other: &Name) -> bool {
        self.label_count() >= other.label_count()
            && self
                .wire_repr_from(self.label_count() - other.label_count())
                .eq_ignore_ascii_case(&other.wire)
    }

    /// Returns the name obtained by removing the first `skip` labels,
    /// or [`None`] if that would remove the null label.
    pub fn superdomain(&self, skip: usize) -> Option<Name> {
        if skip < self.label_count() {
            Some(Self::from_valid_wire(self.wire_repr_from(skip)))
        } else {
            None
        }
    }

    /// Returns the name formed by prepending `label` to this name.
    pub fn prepend_label(&self, label: &[u8]) -> Result<Name, Error> {
        if label.is_empty() {
            return Err(Error::NullNonTerminal);
        } else if label.len() > MAX_LABEL_LEN {
            return Err(Error::LabelTooLong);
        } else if self.wire.len() + label.len() + 1 > MAX_WIRE_LEN {
            return Err(Error::NameTooLong);
        }
        let mut wire = Vec::with_capacity(self.wire.len() + label.len() + 1);
        wire.push(label.len() as u8);
        wire.extend_from_slice(label);
        wire.extend_from_slice(&self.wire);
        Ok(Self::from_valid_wire(&wire))
    }

    /// Returns the uncompressed on-the-wire representation.
    pub fn wire_repr(&self) -> &[u8] {
        &self.wire
    }

    /// Returns the on-the-wire representation starting at label `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is not less than [`Name::label_count`].
    pub fn wire_repr_from(&self, n: usize) -> &[u8] {
        &self.wire[self.label_offsets[n] as usize..]
    }

    /// Parses a possibly compressed name at index `start` of a DNS
    /// message, following pointers. On success, returns the name and
    /// the number of octets it occupies at `start`.
    pub fn try_from_compressed(message: &[u8], start: usize) -> Result<(Self, usize), Error> {
        wire::parse_compressed_name(message, start)
    }

    /// Parses an uncompressed name at the beginning of `octets`,
    /// returning it and its length.
    pub fn try_from_uncompressed(octets: &[u8]) -> Result<(Self, usize), Error> {
        let len = wire::validate_uncompressed_name(octets)?;
        Ok((Self::from_valid_wire(&octets[..len]), len))
    }

    /// Checks that `octets` begins with a valid uncompressed name and
    /// returns its length.
    pub fn validate_uncompressed(octets: &[u8]) -> Result<usize, Error> {
        wire::validate_uncompressed_name(octets)
    }
}

////////////////////////////////////////////////////////////////////////
// NAME TRAIT IMPLEMENTATIONS                                         //
////////////////////////////////////////////////////////////////////////

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        // Length octets are at most 63, so they are never affected by
        // ASCII case folding.
        self.wire.eq_ignore_ascii_case(&other.wire)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for octet in self.wire.iter() {
            state.write_u8(octet.to_ascii_lowercase());
        }
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Names are ordered canonically ([RFC 4034 § 6.1]): as sequences of
/// lowercased labels read from right to left.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        let lowercase = |label: &[u8]| label.to_ascii_lowercase();
        self.labels()
            .rev()
            .zip(other.labels().rev())
            .map(|(a, b)| lowercase(a).cmp(&lowercase(b)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| self.label_count().cmp(&other.label_count()))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in self.labels().take(self.label_count() - 1) {
            for &octet in label {
                match octet {
                    b'.' => f.write_str("\\.")?,
                    b'\\' => f.write_str("\\\\")?,
                    _ if octet.is_ascii_graphic() => write!(f, "{}", octet as char)?,
                    _ => write!(f, "\\{octet:03}")?,
                }
            }
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// Parses an absolute name in the textual format of [RFC 1035 § 5.1].
/// The escapes `\X` and `\DDD` are supported; relative names are
/// rejected.
///
/// [RFC 1035 § 5.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-5.1
impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::StrEmpty);
        } else if s == "." {
            return Ok(Self::root());
        } else if !s.is_ascii() {
            return Err(Error::StrNotAscii);
        }

        let mut builder = NameBuilder::new();
        let mut remaining = s.as_bytes();
        while let Some((&octet, rest)) = remaining.split_first() {
            remaining = rest;
            match octet {
                b'\\' => {
                    let (value, consumed) = parse_escape(remaining)?;
                    builder.try_push(value)?;
                    remaining = &remaining[consumed..];
                }
                b'.' => builder.next_label()?,
                _ => builder.try_push(octet)?,
            }
        }
        builder.finish()
    }
}

/// Parses the escape sequence that follows a backslash, returning the
/// octet it stands for and the number of octets consumed.
fn parse_escape(octets: &[u8]) -> Result<(u8, usize), Error> {
    match octets {
        [a, b, c, ..] if a.is_ascii_digit() && b.is_ascii_digit() && c.is_ascii_digit() => {
            let value = (a - b'0') as u16 * 100 + (b - b'0') as u16 * 10 + (c - b'0') as u16;
            u8::try_from(value).map(|v| (v, 3)).or(Err(Error::InvalidEscape))
        }
        [a, ..] if a.is_ascii_digit() => Err(Error::InvalidEscape),
        [a, ..] => Ok((*a, 1)),
        [] => Err(Error::InvalidEscape),
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
