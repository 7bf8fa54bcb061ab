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

//! Implementation of the [`Error`] type for name-related errors.

use std::fmt;

/// Problems encountered while constructing a [`Name`](super::Name)
/// from text or from the wire.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// Data followed the name where none was expected.
    ExtraData,

    /// A `\` escape in text was malformed.
    InvalidEscape,

    /// A compression pointer did not point to an earlier position.
    InvalidPointer,

    /// A label type other than a normal label or a pointer was used.
    InvalidLabelType,

    /// A label was longer than 63 octets.
    LabelTooLong,

    /// The name is longer than 255 octets on the wire.
    NameTooLong,

    /// A relative name was given where an absolute one is required.
    NotFullyQualified,

    /// A null label appeared before the end of the name.
    NullNonTerminal,

    /// The text was empty.
    StrEmpty,

    /// The text contained non-ASCII characters.
    StrNotAscii,

    /// The message ended in the middle of the name.
    UnexpectedEom,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Self::ExtraData => "extra data after name",
            Self::InvalidEscape => "invalid escape sequence",
            Self::InvalidPointer => "compression pointer does not point backward",
            Self::InvalidLabelType => "unsupported label type",
            Self::LabelTooLong => "label is longer than 63 octets",
            Self::NameTooLong => "name is longer than 255 octets on the wire",
            Self::NotFullyQualified => "name is not fully qualified",
            Self::NullNonTerminal => "empty label in non-terminal position",
            Self::StrEmpty => "name is empty",
            Self::StrNotAscii => "name is not ASCII",
            Self::UnexpectedEom => "unexpected end of message",
        })
    }
}

impl std::error::Error for Error {}
