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

//! Parsing of the [RFC 1035 § 5] zone file format, extended with geo
//! scopes.
//!
//! This module provides the [`Parser`] structure, which accepts the
//! text of a zone file and can be iterated over to read the records it
//! contains. The supported syntax is the common subset of the format:
//! the `$ORIGIN` and `$TTL` directives, comments, parentheses, quoted
//! strings, escape sequences, the `@` shorthand, blank owners, and the
//! TTL and class fields in either order. RDATA can be given in the
//! usual form for A, AAAA, NS, CNAME, SOA, PTR, MX, TXT, and SRV
//! records, or in the generic form of [RFC 3597 § 5] (`\# <len> <hex>`)
//! for any type. `$INCLUDE` is rejected.
//!
//! # Geo scopes
//!
//! The `$SCOPE` directive tags every following record with a
//! [`GeoScope`] until the next `$SCOPE`. Its argument is a network
//! prefix (`$SCOPE 10.0.0.0/8`), a two-letter region code (`$SCOPE CN`),
//! or `default`. Records before the first `$SCOPE` belong to the
//! parser's initial scope, which is the default scope unless
//! [`Parser::with_scope`] sets another. Each `$SCOPE` directive starts
//! a new *block*, and every [`ParsedRr`] carries the number of its
//! block, so that the zone loader can tell whether two records with the
//! same scope were declared together.
//!
//! ```
//! use geozone::geo::GeoScope;
//! use geozone::rr::Type;
//! use geozone::zone_file::Parser;
//!
//! const ZONE_FILE: &[u8] = br#"
//! $ORIGIN example.com.
//! $TTL 300
//! @        IN SOA ns1 hostmaster (
//!     1       ; SERIAL
//!     3600    ; REFRESH
//!     900     ; RETRY
//!     604800  ; EXPIRE
//!     300     ; MINIMUM
//! )
//!          IN NS  ns1
//! ns1      IN A   192.0.2.53
//! $SCOPE 10.0.0.0/8
//! www      IN A   10.0.0.1
//! $SCOPE default
//! www      IN A   93.184.216.34
//! "#;
//!
//! let records: Vec<_> = Parser::new(ZONE_FILE).collect::<Result<_, _>>().unwrap();
//! assert_eq!(records.len(), 5);
//! assert_eq!(records[0].record.rr_type, Type::SOA);
//! assert_eq!(records[3].scope, "10.0.0.0/8".parse().unwrap());
//! assert_eq!(records[4].scope, GeoScope::Default);
//! ```
//!
//! # A note about the implementation
//!
//! It is difficult to write a clean lexer for DNS zone files. It is a
//! line-based format, but parentheses can extend a record across
//! several lines, and leading whitespace is significant. Escaping does
//! not apply uniformly either: [RFC 3597 § 5] introduces the token
//! `\#`, which is not equivalent to `#`, and an escaped `.` in a domain
//! name does not separate labels.
//!
//! Since zone files are read into memory whole, this module takes the
//! following approach. An internal `Reader` splits the text into
//! logical lines of fields, handling comments, parentheses, and quotes.
//! A backslash keeps the next octet from ending a field, but escape
//! sequences are left undecoded. The [`Parser`] then interprets each
//! field according to its place in the record, decoding escapes as
//! appropriate for that place.
//!
//! [RFC 1035 § 5]: https://datatracker.ietf.org/doc/html/rfc1035#section-5
//! [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5

use crate::geo::GeoScope;
use crate::name::Name;
use crate::rr::{Class, ResourceRecord, Ttl};

mod character_string;
mod directive;
pub mod error;
mod escape;
mod name;
mod reader;
mod record;

use error::ErrorKind;
pub use error::{Error, Result};
use reader::{LogicalLine, Reader};

////////////////////////////////////////////////////////////////////////
// STRUCTURES                                                         //
////////////////////////////////////////////////////////////////////////

/// A parser for zone files. See the
/// [module-level documentation](`self`) for details and example usage.
pub struct Parser<'a> {
    error: bool,
    reader: Reader<'a>,
    context: Context,
    leading_origin: Option<Name>,
    seen_record: bool,
}

/// Tracks the parse context of a [`Parser`].
///
/// An `@` symbol stands for the current origin (set with `$ORIGIN`),
/// and partially qualified domain names are interpreted relative to the
/// origin. Default TTLs can be set with `$TTL`. Omitted TTLs, classes,
/// and owners otherwise default to those of the previous record. The
/// current geo scope and block are set by `$SCOPE`.
#[derive(Clone)]
struct Context {
    origin: Option<Name>,
    previous_owner: Option<Name>,
    previous_ttl: Option<Ttl>,
    previous_class: Option<Class>,
    default_ttl: Option<Ttl>,
    scope: GeoScope,
    block: usize,
}

/// A record parsed from a zone file, as returned by [`Parser::next`].
#[derive(Clone, Debug)]
pub struct ParsedRr {
    /// The line on which the record starts.
    pub line: usize,
    pub record: ResourceRecord,
    pub scope: GeoScope,

    /// The number of `$SCOPE` directives seen before the record.
    pub block: usize,
}

////////////////////////////////////////////////////////////////////////
// PARSER CONSTRUCTION AND ITERATION                                  //
////////////////////////////////////////////////////////////////////////

impl<'a> Parser<'a> {
    /// Creates a new [`Parser`] to read the zone file `text`, with no
    /// initial origin.
    pub fn new(text: &'a [u8]) -> Self {
        Self {
            error: false,
            reader: Reader::new(text),
            context: Context {
                origin: None,
                previous_owner: None,
                previous_ttl: None,
                previous_class: None,
                default_ttl: None,
                scope: GeoScope::Default,
                block: 0,
            },
            leading_origin: None,
            seen_record: false,
        }
    }

    /// Sets the scope of the records before any `$SCOPE` directive.
    pub fn with_scope(mut self, scope: GeoScope) -> Self {
        self.context.scope = scope;
        self
    }

    /// Sets the origin in effect before any `$ORIGIN` directive.
    pub fn with_origin(mut self, origin: Name) -> Self {
        self.context.origin = Some(origin);
        self
    }

    /// Returns the origin set by `$ORIGIN` directives appearing before
    /// the first record, if any. This is only meaningful once the first
    /// record has been returned.
    pub fn leading_origin(&self) -> Option<&Name> {
        self.leading_origin.as_ref()
    }

    /// An internal helper to parse lines until a record is found.
    fn parse_until_record(&mut self) -> Result<Option<ParsedRr>> {
        while let Some(line) = self.reader.read_line()? {
            if let Some(rr) = self.parse_line(&line)? {
                return Ok(Some(rr));
            }
        }
        Ok(None)
    }

    /// An internal helper to parse a single logical line.
    fn parse_line(&mut self, line: &LogicalLine) -> Result<Option<ParsedRr>> {
        match line.fields.first() {
            None => Ok(None),
            Some(first) if !line.leading_blank && !first.quoted && first.text.starts_with(b"$") => {
                self.parse_directive(line).map(|()| None)
            }
            Some(_) => {
                let rr = self.parse_record(line)?;
                self.seen_record = true;
                Ok(Some(rr))
            }
        }
    }
}

impl Iterator for Parser<'_> {
    type Item = Result<ParsedRr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error {
            // Internal state is not guaranteed to be consistent after an
            // error, so iteration stops.
            return None;
        }

        match self.parse_until_record() {
            Ok(Some(rr)) => Some(Ok(rr)),
            Ok(None) => None,
            Err(e) => {
                self.error = true;
                Some(Err(e))
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    /// Helpers used throughout the [`zone_file`](`super`) module's
    /// tests.
    pub(super) fn parse_one(text: &[u8]) -> Result<ParsedRr> {
        Parser::new(text).next().expect("no record was parsed")
    }

    pub(super) fn parse_all(text: &[u8]) -> Result<Vec<ParsedRr>> {
        Parser::new(text).collect()
    }

    #[test]
    fn blank_owner_repeats_previous_owner() {
        let rrs = parse_all(b"$ORIGIN example.\nwww A 192.0.2.1\n    AAAA ::1\n").unwrap();
        assert_eq!(rrs[1].record.owner, "www.example.".parse().unwrap());
        assert_eq!(rrs[1].line, 3);
    }

    #[test]
    fn blank_owner_needs_previous_owner() {
        let err = parse_one(b"  A 192.0.2.1\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::EmptyOwnerWithNoPrevious);
    }

    #[test]
    fn initial_origin_is_used() {
        let origin: Name = "example.com.".parse().unwrap();
        let rr = Parser::new(b"www A 192.0.2.1\n")
            .with_origin(origin)
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(rr.record.owner, "www.example.com.".parse().unwrap());
    }

    #[test]
    fn iteration_stops_after_an_error() {
        let mut parser = Parser::new(b"example. A bogus\nexample. A 192.0.2.1\n");
        assert!(parser.next().unwrap().is_err());
        assert!(parser.next().is_none());
    }

    #[test]
    fn previous_ttl_is_reused_without_ttl_directive() {
        let rrs = parse_all(b"a. 60 A 192.0.2.1\nb. A 192.0.2.2\n").unwrap();
        assert_eq!(rrs[1].record.ttl, Ttl::from(60));
    }
}
