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

//! Parsing of resource records.

use std::net::AddrParseError;
use std::str::{self, FromStr};

use super::character_string::push_character_string;
use super::name::parse_name;
use super::reader::{Field, Fields, LogicalLine};
use super::{Error, ErrorKind, ParsedRr, Parser, Result};
use crate::name::Name;
use crate::rr::{Class, Rdata, ResourceRecord, Ttl, Type};
use crate::util::hex_value;

impl Parser<'_> {
    ////////////////////////////////////////////////////////////////////
    // PARSING OF RESOURCE RECORDS                                    //
    ////////////////////////////////////////////////////////////////////

    /// Parses a resource record from a logical line with at least one
    /// field.
    pub(super) fn parse_record(&mut self, line: &LogicalLine) -> Result<ParsedRr> {
        let mut fields = line.cursor();

        // In zone files, leading whitespace is significant. If it
        // exists, then the owner for the record on this line is the
        // same as the owner for the previous record.
        let owner = if line.leading_blank {
            self.context
                .previous_owner
                .clone()
                .ok_or_else(|| Error::new(line.position, ErrorKind::EmptyOwnerWithNoPrevious))?
        } else {
            let field = fields.next_or(ErrorKind::ExpectedName)?;
            parse_name(field, self.context.origin.as_ref())?
        };

        let (ttl, class) = self.parse_ttl_and_class(&mut fields)?;
        let rr_type = parse_type(fields.next_or(ErrorKind::ExpectedType)?)?;
        let rdata = self.parse_rdata(rr_type, &mut fields)?;
        fields.expect_eol()?;

        self.context.previous_owner = Some(owner.clone());
        self.context.previous_ttl = Some(ttl);
        self.context.previous_class = Some(class);

        Ok(ParsedRr {
            line: line.position.line,
            record: ResourceRecord {
                owner,
                rr_type,
                class,
                ttl,
                rdata,
            },
            scope: self.context.scope,
            block: self.context.block,
        })
    }

    /// Parses the optional TTL and CLASS fields of a record, which may
    /// appear in either order. As noted in [RFC 1035 § 5.1], TTLs,
    /// classes, and types are disjoint, so the parse is unique: a TTL
    /// starts with a digit, and anything that is not a class must be
    /// the type.
    ///
    /// An omitted TTL defaults to the one set by the most recent `$TTL`
    /// directive ([RFC 2308 § 4]), then to the previous record's TTL,
    /// and finally to [`Ttl::DEFAULT`]. An omitted class defaults to
    /// the previous record's class, or IN.
    ///
    /// [RFC 1035 § 5.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-5.1
    /// [RFC 2308 § 4]: https://datatracker.ietf.org/doc/html/rfc2308#section-4
    fn parse_ttl_and_class(&self, fields: &mut Fields) -> Result<(Ttl, Class)> {
        let mut ttl = None;
        let mut class = None;
        while let Some(field) = fields.peek() {
            if ttl.is_none() && field.text.first().map_or(false, u8::is_ascii_digit) {
                ttl = Some(parse_ttl(field)?);
            } else if let (None, Some(parsed)) = (class, parse_class(field)) {
                class = Some(parsed?);
            } else {
                break;
            }
            fields.skip();
        }

        let ttl = ttl
            .or(self.context.default_ttl)
            .or(self.context.previous_ttl)
            .unwrap_or(Ttl::DEFAULT);
        let class = class.or(self.context.previous_class).unwrap_or(Class::IN);
        Ok((ttl, class))
    }

    ////////////////////////////////////////////////////////////////////
    // RDATA PARSING                                                  //
    ////////////////////////////////////////////////////////////////////

    // RFC 3597 § 5 allows the RDATA of *any* type to be given in the
    // generic format \# <length> <hex>. When that format is used for a
    // type we know, the octets are checked against the type's layout so
    // that the server never holds RDATA it cannot interpret. Types we
    // do not know can only be given in the generic format.

    /// Parses RDATA for a record of type `rr_type`.
    fn parse_rdata(&self, rr_type: Type, fields: &mut Fields) -> Result<Rdata> {
        if let Some(field) = fields.peek() {
            if !field.quoted && field.text == b"\\#" {
                fields.skip();
                let position = field.position;
                let rdata = parse_generic_rdata(fields)?;
                return if valid_for_type(rr_type, rdata.octets()) {
                    Ok(rdata)
                } else {
                    Err(Error::new(position, ErrorKind::InvalidRdataForType))
                };
            }
        }

        let origin = self.context.origin.as_ref();
        let mut octets = Vec::new();
        match rr_type {
            Type::A => {
                let address =
                    parse_address(fields, ErrorKind::ExpectedIpv4, ErrorKind::InvalidIpv4)?;
                return Ok(Rdata::from_ipv4(address));
            }
            Type::AAAA => {
                let address =
                    parse_address(fields, ErrorKind::ExpectedIpv6, ErrorKind::InvalidIpv6)?;
                return Ok(Rdata::from_ipv6(address));
            }
            Type::NS | Type::CNAME | Type::PTR => {
                push_name(fields, origin, &mut octets)?;
            }
            Type::MX => {
                push_u16(fields, &mut octets)?;
                push_name(fields, origin, &mut octets)?;
            }
            Type::SOA => {
                push_name(fields, origin, &mut octets)?;
                push_name(fields, origin, &mut octets)?;
                for _ in 0..5 {
                    push_u32(fields, &mut octets)?;
                }
            }
            Type::TXT => {
                let start = fields.next_or(ErrorKind::ExpectedCharacterString)?;
                push_character_string(start, &mut octets)?;
                for field in fields.remaining() {
                    push_character_string(field, &mut octets)?;
                }
                fields.skip_rest();
                return Rdata::try_from(octets)
                    .map_err(|_| Error::new(start.position, ErrorKind::TxtTooLong));
            }
            Type::SRV => {
                for _ in 0..3 {
                    push_u16(fields, &mut octets)?;
                }
                push_name(fields, origin, &mut octets)?;
            }
            _ => {
                return Err(Error::new(
                    fields.position(),
                    ErrorKind::ExpectedBackslashHash,
                ))
            }
        }

        // Only TXT RDATA can exceed the length limit, and it returns
        // early above.
        Rdata::try_from(octets)
            .map_err(|_| Error::new(fields.position(), ErrorKind::InvalidRdataForType))
    }
}

////////////////////////////////////////////////////////////////////////
// FIELD HELPERS                                                      //
////////////////////////////////////////////////////////////////////////

fn field_str<'a>(field: &Field<'a>) -> Option<&'a str> {
    if field.quoted {
        None
    } else {
        str::from_utf8(field.text).ok()
    }
}

fn parse_ttl(field: &Field) -> Result<Ttl> {
    let text = field_str(field).unwrap_or_default();
    text.parse::<u32>()
        .map(Ttl::from)
        .map_err(|err| Error::new(field.position, ErrorKind::InvalidTtl(err)))
}

/// Tries to parse `field` as a class. Returns `None` if the field does
/// not look like a class at all, so that the caller can go on to parse
/// it as a type.
fn parse_class(field: &Field) -> Option<Result<Class>> {
    let text = field_str(field)?;
    match Class::from_str(text) {
        Ok(class) => Some(Ok(class)),
        Err(err) if text.get(..5).map_or(false, |prefix| prefix.eq_ignore_ascii_case("CLASS")) => {
            Some(Err(Error::new(field.position, ErrorKind::InvalidClass(err))))
        }
        Err(_) => None,
    }
}

/// Parses an RR type. OPT records are not allowed in zone files.
fn parse_type(field: &Field) -> Result<Type> {
    let text = field_str(field)
        .ok_or_else(|| Error::new(field.position, ErrorKind::ExpectedType))?;
    let rr_type = Type::from_str(text)
        .map_err(|err| Error::new(field.position, ErrorKind::InvalidType(err)))?;
    if rr_type == Type::OPT {
        Err(Error::new(field.position, ErrorKind::OptNotAllowed))
    } else {
        Ok(rr_type)
    }
}

/// Parses an IPv4 or IPv6 address.
fn parse_address<A>(
    fields: &mut Fields,
    missing: ErrorKind,
    invalid: fn(AddrParseError) -> ErrorKind,
) -> Result<A>
where
    A: FromStr<Err = AddrParseError>,
{
    let field = fields.next_or(missing.clone())?;
    field_str(field)
        .ok_or_else(|| Error::new(field.position, missing))?
        .parse()
        .map_err(|err| Error::new(field.position, invalid(err)))
}

fn push_name(fields: &mut Fields, origin: Option<&Name>, octets: &mut Vec<u8>) -> Result<()> {
    let name = parse_name(fields.next_or(ErrorKind::ExpectedName)?, origin)?;
    octets.extend_from_slice(name.wire_repr());
    Ok(())
}

fn push_u16(fields: &mut Fields, octets: &mut Vec<u8>) -> Result<()> {
    let field = fields.next_or(ErrorKind::ExpectedU16)?;
    let value = field_str(field)
        .ok_or_else(|| Error::new(field.position, ErrorKind::ExpectedU16))?
        .parse::<u16>()
        .map_err(|err| Error::new(field.position, ErrorKind::InvalidInt(err)))?;
    octets.extend_from_slice(&value.to_be_bytes());
    Ok(())
}

fn push_u32(fields: &mut Fields, octets: &mut Vec<u8>) -> Result<()> {
    let field = fields.next_or(ErrorKind::ExpectedU32)?;
    let value = field_str(field)
        .ok_or_else(|| Error::new(field.position, ErrorKind::ExpectedU32))?
        .parse::<u32>()
        .map_err(|err| Error::new(field.position, ErrorKind::InvalidInt(err)))?;
    octets.extend_from_slice(&value.to_be_bytes());
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// GENERIC RDATA                                                      //
////////////////////////////////////////////////////////////////////////

/// Parses the `<length> <hex>...` part of the [RFC 3597 § 5] generic
/// RDATA format, after the `\#` token. The hexadecimal data may be
/// split across any number of fields.
///
/// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
fn parse_generic_rdata(fields: &mut Fields) -> Result<Rdata> {
    let len_field = fields.next_or(ErrorKind::ExpectedRdataLen)?;
    let len: u16 = field_str(len_field)
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| Error::new(len_field.position, ErrorKind::InvalidRdataLen))?;

    let mut octets = Vec::with_capacity(len as usize);
    let mut high_nibble = None;
    for field in fields.remaining() {
        if field.quoted {
            return Err(Error::new(field.position, ErrorKind::ExpectedHexRdata));
        }
        for (index, &digit) in field.text.iter().enumerate() {
            let value = hex_value(digit)
                .ok_or_else(|| Error::new(field.position_at(index), ErrorKind::InvalidHexDigit))?;
            match high_nibble.take() {
                Some(high) => octets.push(high << 4 | value),
                None => high_nibble = Some(value),
            }
        }
    }
    fields.skip_rest();

    if high_nibble.is_some() || octets.len() != len as usize {
        return Err(Error::new(len_field.position, ErrorKind::RdataLenMismatch));
    }
    Rdata::try_from(octets).map_err(|_| Error::new(len_field.position, ErrorKind::InvalidRdataLen))
}

/// Checks generically-entered RDATA against the layout of `rr_type`.
/// Types we do not know anything about accept any RDATA.
fn valid_for_type(rr_type: Type, octets: &[u8]) -> bool {
    fn skip_name(octets: &[u8]) -> Option<&[u8]> {
        Name::validate_uncompressed(octets)
            .ok()
            .map(|len| &octets[len..])
    }

    fn skip_fixed(octets: &[u8], len: usize) -> Option<&[u8]> {
        octets.get(len..)
    }

    let rest = match rr_type {
        Type::A => skip_fixed(octets, 4),
        Type::AAAA => skip_fixed(octets, 16),
        Type::NS | Type::CNAME | Type::PTR => skip_name(octets),
        Type::MX => skip_fixed(octets, 2).and_then(skip_name),
        Type::SOA => skip_name(octets)
            .and_then(skip_name)
            .and_then(|rest| skip_fixed(rest, 20)),
        Type::SRV => skip_fixed(octets, 6).and_then(skip_name),
        Type::TXT => {
            if octets.is_empty() {
                return false;
            }
            let mut rest = octets;
            while let Some((&len, tail)) = rest.split_first() {
                match tail.get(len as usize..) {
                    Some(tail) => rest = tail,
                    None => return false,
                }
            }
            Some(rest)
        }
        _ => return true,
    };
    rest.map_or(false, <[u8]>::is_empty)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::super::tests::parse_one;
    use super::*;

    #[test]
    fn address_records_parse() {
        let rr = parse_one(b"www.example. 300 IN A 192.0.2.1\n").unwrap();
        assert_eq!(rr.record.rr_type, Type::A);
        assert_eq!(rr.record.ttl, Ttl::from(300));
        assert_eq!(rr.record.rdata.octets(), [192, 0, 2, 1]);

        let rr = parse_one(b"www.example. IN 60 AAAA 2001:db8::1\n").unwrap();
        assert_eq!(rr.record.ttl, Ttl::from(60));
        assert_eq!(rr.record.rdata, Rdata::from_ipv6("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn invalid_addresses_are_rejected() {
        let err = parse_one(b"www.example. A 192.0.2\n").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidIpv4(_)));
        assert_eq!(err.column(), 16);

        let err = parse_one(b"www.example. AAAA\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExpectedIpv6);
    }

    #[test]
    fn name_records_parse_relative_to_origin() {
        let rr = parse_one(b"$ORIGIN example.\nmail IN MX 10 mx1\n").unwrap();
        assert_eq!(rr.record.owner, "mail.example.".parse().unwrap());
        assert_eq!(rr.record.rdata.octets(), b"\x00\x0a\x03mx1\x07example\x00");
    }

    #[test]
    fn soa_records_parse() {
        let rr = parse_one(
            b"example. IN SOA ns1.example. admin.example. (\n 1 ; serial\n 3600 900 604800 300 )\n",
        )
        .unwrap();
        let octets = rr.record.rdata.octets();
        assert_eq!(octets.len(), 13 + 15 + 20);
        assert_eq!(&octets[octets.len() - 4..], 300u32.to_be_bytes());
    }

    #[test]
    fn srv_records_parse() {
        let rr = parse_one(b"_sip._udp.example. SRV 0 5 5060 sip.example.\n").unwrap();
        assert_eq!(&rr.record.rdata.octets()[..6], b"\x00\x00\x00\x05\x13\xc4");
    }

    #[test]
    fn txt_records_parse() {
        let rr = parse_one(b"example. TXT \"v=spf1 -all\" second\n").unwrap();
        assert_eq!(rr.record.rdata.octets(), b"\x0bv=spf1 -all\x06second");
    }

    #[test]
    fn generic_rdata_parses() {
        let rr = parse_one(b"example. TYPE65280 \\# 4 0a00 0001\n").unwrap();
        assert_eq!(rr.record.rr_type, Type::from(65280));
        assert_eq!(rr.record.rdata.octets(), [10, 0, 0, 1]);

        let rr = parse_one(b"example. A \\# 4 C0000201\n").unwrap();
        assert_eq!(rr.record.rdata.octets(), [192, 0, 2, 1]);

        let rr = parse_one(b"example. TYPE1234 \\# 0\n").unwrap();
        assert!(rr.record.rdata.is_empty());
    }

    #[test]
    fn generic_rdata_is_checked() {
        let err = parse_one(b"example. A \\# 3 C00002\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidRdataForType);
        let err = parse_one(b"example. TYPE9 \\# 3 C000\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::RdataLenMismatch);
        let err = parse_one(b"example. TYPE9 \\# 1 zz\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidHexDigit);
        let err = parse_one(b"example. CNAME \\# 2 0100\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidRdataForType);
    }

    #[test]
    fn unknown_types_need_generic_rdata() {
        let err = parse_one(b"example. TYPE9 data\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExpectedBackslashHash);
    }

    #[test]
    fn opt_records_are_rejected() {
        let err = parse_one(b"example. OPT \\# 0\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::OptNotAllowed);
    }

    #[test]
    fn trailing_fields_are_rejected() {
        let err = parse_one(b"example. A 192.0.2.1 extra\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExpectedEol);
        assert_eq!(err.column(), 22);
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let rr = parse_one(b"example. A 192.0.2.1\n").unwrap();
        assert_eq!(rr.record.ttl, Ttl::DEFAULT);
        assert_eq!(rr.record.class, Class::IN);

        let rr = parse_one(b"$TTL 120\nexample. CH TXT x\n").unwrap();
        assert_eq!(rr.record.ttl, Ttl::from(120));
        assert_eq!(rr.record.class, Class::CH);
    }

    #[test]
    fn invalid_ttls_are_rejected() {
        let err = parse_one(b"example. 99999999999 A 192.0.2.1\n").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidTtl(_)));
    }
}
