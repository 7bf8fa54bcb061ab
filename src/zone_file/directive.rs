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

//! Parsing of directives (`$ORIGIN`, `$TTL`, `$SCOPE`, and the
//! unsupported `$INCLUDE`).

use std::str;

use super::name::parse_name;
use super::reader::{Fields, LogicalLine};
use super::{Error, ErrorKind, Parser, Result};
use crate::geo::GeoScope;
use crate::rr::Ttl;

impl Parser<'_> {
    /// Parses a directive. The first field of `line` must start with
    /// `$`.
    pub(super) fn parse_directive(&mut self, line: &LogicalLine) -> Result<()> {
        let mut fields = line.cursor();
        let directive = fields.next_or(ErrorKind::UnknownDirective)?;
        match directive.text {
            name if name.eq_ignore_ascii_case(b"$ORIGIN") => {
                self.parse_origin_directive(&mut fields)?;
            }
            name if name.eq_ignore_ascii_case(b"$TTL") => {
                self.parse_ttl_directive(&mut fields)?;
            }
            name if name.eq_ignore_ascii_case(b"$SCOPE") => {
                self.parse_scope_directive(&mut fields)?;
            }
            name if name.eq_ignore_ascii_case(b"$INCLUDE") => {
                return Err(Error::new(
                    directive.position,
                    ErrorKind::IncludeNotSupported,
                ));
            }
            _ => {
                return Err(Error::new(
                    directive.position,
                    ErrorKind::UnknownDirective,
                ))
            }
        }
        fields.expect_eol()
    }

    /// Parses an `$ORIGIN` directive. A relative name is made absolute
    /// with the previous origin.
    fn parse_origin_directive(&mut self, fields: &mut Fields) -> Result<()> {
        let field = fields.next_or(ErrorKind::ExpectedName)?;
        let origin = parse_name(field, self.context.origin.as_ref())?;
        if !self.seen_record {
            self.leading_origin = Some(origin.clone());
        }
        self.context.origin = Some(origin);
        Ok(())
    }

    /// Parses a `$TTL` directive ([RFC 2308 § 4]).
    ///
    /// [RFC 2308 § 4]: https://datatracker.ietf.org/doc/html/rfc2308#section-4
    fn parse_ttl_directive(&mut self, fields: &mut Fields) -> Result<()> {
        let field = fields.next_or(ErrorKind::ExpectedTtl)?;
        let ttl = str::from_utf8(field.text)
            .unwrap_or_default()
            .parse::<u32>()
            .map_err(|err| Error::new(field.position, ErrorKind::InvalidTtl(err)))?;
        self.context.default_ttl = Some(Ttl::from(ttl));
        Ok(())
    }

    /// Parses a `$SCOPE` directive, which starts a new block of records
    /// tagged with the given [`GeoScope`].
    fn parse_scope_directive(&mut self, fields: &mut Fields) -> Result<()> {
        let field = fields.next_or(ErrorKind::ExpectedScope)?;
        let scope = str::from_utf8(field.text)
            .ok()
            .filter(|_| !field.quoted)
            .and_then(|text| text.parse::<GeoScope>().ok())
            .ok_or_else(|| Error::new(field.position, ErrorKind::InvalidScope))?;
        self.context.scope = scope;
        self.context.block += 1;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::super::tests::{parse_all, parse_one};
    use super::*;
    use crate::name::Name;

    #[test]
    fn origin_directive_sets_origin() {
        let rr = parse_one(b"$ORIGIN example.\n$ORIGIN sub\nwww A 192.0.2.1\n").unwrap();
        assert_eq!(rr.record.owner, "www.sub.example.".parse().unwrap());
    }

    #[test]
    fn ttl_directive_sets_default_ttl() {
        let rr = parse_one(b"$TTL 86400\nexample. A 192.0.2.1\n").unwrap();
        assert_eq!(rr.record.ttl, Ttl::from(86400));
        let err = parse_one(b"$TTL forever\n").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidTtl(_)));
    }

    #[test]
    fn scope_directive_starts_blocks() {
        let rrs = parse_all(
            b"$ORIGIN example.\n\
              www A 192.0.2.1\n\
              $SCOPE 10.0.0.0/8\n\
              www A 10.0.0.1\n\
              $scope DEFAULT\n\
              www A 93.184.216.34\n",
        )
        .unwrap();
        let scopes: Vec<_> = rrs.iter().map(|rr| (rr.scope, rr.block)).collect();
        assert_eq!(
            scopes,
            [
                (GeoScope::Default, 0),
                ("10.0.0.0/8".parse().unwrap(), 1),
                (GeoScope::Default, 2),
            ]
        );
    }

    #[test]
    fn region_scopes_and_initial_scopes() {
        let text = b"www A 192.0.2.1\n$SCOPE cn\nwww A 192.0.2.2\n";
        let initial: GeoScope = "JP".parse().unwrap();
        let rrs: Vec<_> = Parser::new(text)
            .with_origin("example.".parse().unwrap())
            .with_scope(initial)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rrs[0].scope, initial);
        assert_eq!(rrs[1].scope, "CN".parse().unwrap());
        assert_eq!(rrs[1].block, 1);
    }

    #[test]
    fn invalid_scopes_are_rejected() {
        let err = parse_one(b"$SCOPE 10.0.0.0/40\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidScope);
        let err = parse_one(b"$SCOPE\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExpectedScope);
        let err = parse_one(b"$SCOPE default extra\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExpectedEol);
    }

    #[test]
    fn include_is_rejected() {
        let err = parse_one(b"$INCLUDE other.zone\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::IncludeNotSupported);
    }

    #[test]
    fn unknown_directives_are_rejected() {
        let err = parse_one(b"$GENERATE 1-10 host$ A 192.0.2.$\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnknownDirective);
    }

    #[test]
    fn leading_origin_is_reported() {
        let mut parser = super::super::Parser::new(b"$ORIGIN a.\nx A 192.0.2.1\n$ORIGIN b.\n");
        assert_eq!(parser.leading_origin(), None);
        parser.next().unwrap().unwrap();
        let expected: Name = "a.".parse().unwrap();
        assert_eq!(parser.leading_origin(), Some(&expected));
        assert!(parser.next().is_none());
        assert_eq!(parser.leading_origin(), Some(&expected));
    }
}
