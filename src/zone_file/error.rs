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

//! Error types for zone file parsing.

use std::fmt;
use std::net::AddrParseError;
use std::num::ParseIntError;

use super::reader::Position;
use crate::name;

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// A zone file syntax error, with the position at which it was found.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    position: Position,
    kind: ErrorKind,
}

impl Error {
    pub(super) fn new(position: Position, kind: ErrorKind) -> Self {
        Self { position, kind }
    }

    /// Returns the line number (starting at 1) of the error.
    pub fn line(&self) -> usize {
        self.position.line
    }

    /// Returns the column number (starting at 1) of the error.
    pub fn column(&self) -> usize {
        self.position.column
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} at line {} column {}",
            self.kind, self.position.line, self.position.column,
        )
    }
}

impl std::error::Error for Error {}

/// The type returned by fallible zone file parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// SYNTAX ERROR KINDS                                                 //
////////////////////////////////////////////////////////////////////////

/// Kinds of zone file syntax errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    AtWhenOriginNotSet,
    CharacterStringTooLong,
    EmptyOwnerWithNoPrevious,
    EofBeforeCloseParen,
    EofInEscape,
    EscapeNeedsThreeDigits,
    EscapeValueOutOfRange,
    ExpectedBackslashHash,
    ExpectedCharacterString,
    ExpectedEol,
    ExpectedHexRdata,
    ExpectedIpv4,
    ExpectedIpv6,
    ExpectedName,
    ExpectedRdataLen,
    ExpectedScope,
    ExpectedTtl,
    ExpectedType,
    ExpectedU16,
    ExpectedU32,
    IncludeNotSupported,
    InvalidClass(&'static str),
    InvalidHexDigit,
    InvalidInt(ParseIntError),
    InvalidIpv4(AddrParseError),
    InvalidIpv6(AddrParseError),
    InvalidName(name::Error),
    InvalidRdataForType,
    InvalidRdataLen,
    InvalidScope,
    InvalidTtl(ParseIntError),
    InvalidType(&'static str),
    NestedParens,
    OptNotAllowed,
    PqdnWhenOriginNotSet,
    QuotedFieldNotAllowed,
    RdataLenMismatch,
    TxtTooLong,
    UnknownDirective,
    UnmatchedCloseParen,
    UnterminatedQuotedString,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::AtWhenOriginNotSet => f.write_str("cannot use @ when no origin is set"),
            Self::CharacterStringTooLong => f.write_str("<character-string> is too long"),
            Self::EmptyOwnerWithNoPrevious => {
                f.write_str("the owner cannot be empty when no previous owner is available")
            }
            Self::EofBeforeCloseParen => {
                f.write_str("reached end of file before close parenthesis")
            }
            Self::EofInEscape => f.write_str("reached end of file in escape sequence"),
            Self::EscapeNeedsThreeDigits => {
                f.write_str("invalid escape sequence: expected three decimal digits")
            }
            Self::EscapeValueOutOfRange => {
                f.write_str("invalid escape sequence: escaped octet value is out of range")
            }
            Self::ExpectedBackslashHash => {
                f.write_str("expected \\# for an RR type without a known format")
            }
            Self::ExpectedCharacterString => f.write_str("expected a <character-string>"),
            Self::ExpectedEol => f.write_str("expected the end of the line"),
            Self::ExpectedHexRdata => f.write_str("expected hexadecimal RDATA"),
            Self::ExpectedIpv4 => f.write_str("expected an IPv4 address or \\#"),
            Self::ExpectedIpv6 => f.write_str("expected an IPv6 address or \\#"),
            Self::ExpectedName => f.write_str("expected a domain name"),
            Self::ExpectedRdataLen => f.write_str("expected RDATA length"),
            Self::ExpectedScope => {
                f.write_str("expected a network prefix, a region code, or \"default\"")
            }
            Self::ExpectedTtl => f.write_str("expected a TTL"),
            Self::ExpectedType => f.write_str("expected an RR type"),
            Self::ExpectedU16 => f.write_str("expected an unsigned 16-bit integer"),
            Self::ExpectedU32 => f.write_str("expected an unsigned 32-bit integer"),
            Self::IncludeNotSupported => f.write_str("$INCLUDE is not supported"),
            Self::InvalidClass(class_err) => f.write_str(class_err),
            Self::InvalidHexDigit => f.write_str("invalid hexadecimal digit"),
            Self::InvalidInt(ref int_err) => write!(f, "invalid integer: {int_err}"),
            Self::InvalidIpv4(ref addr_err) => write!(f, "invalid IPv4 address: {addr_err}"),
            Self::InvalidIpv6(ref addr_err) => write!(f, "invalid IPv6 address: {addr_err}"),
            Self::InvalidName(name_err) => write!(f, "invalid name: {name_err}"),
            Self::InvalidRdataForType => f.write_str("invalid RDATA for the RR type"),
            Self::InvalidRdataLen => f.write_str("invalid RDATA length"),
            Self::InvalidScope => {
                f.write_str("invalid scope: expected a network prefix, a region code, or \"default\"")
            }
            Self::InvalidTtl(ref int_err) => write!(f, "invalid TTL: {int_err}"),
            Self::InvalidType(type_err) => f.write_str(type_err),
            Self::NestedParens => f.write_str("nested parentheses"),
            Self::OptNotAllowed => f.write_str("OPT records are not allowed in zone files"),
            Self::PqdnWhenOriginNotSet => {
                f.write_str("cannot use a partially qualified domain name when no origin is set")
            }
            Self::QuotedFieldNotAllowed => f.write_str("a quoted string is not allowed here"),
            Self::RdataLenMismatch => {
                f.write_str("the hexadecimal RDATA does not match the stated length")
            }
            Self::TxtTooLong => f.write_str("TXT record is too long"),
            Self::UnknownDirective => f.write_str("unknown directive"),
            Self::UnmatchedCloseParen => f.write_str("unmatched close parenthesis"),
            Self::UnterminatedQuotedString => {
                f.write_str("quoted string is not closed on the same line")
            }
        }
    }
}
