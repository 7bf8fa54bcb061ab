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

//! Parsing of domain names.

use super::escape::{Octet, Unescape};
use super::reader::Field;
use super::{Error, ErrorKind, Result};
use crate::name::{Name, NameBuilder};

/// Parses a domain name from `field`. The `@` shorthand stands for
/// `origin`, and partially qualified names are made absolute by
/// appending `origin`; both fail if no origin is set.
pub(super) fn parse_name(field: &Field, origin: Option<&Name>) -> Result<Name> {
    if field.quoted {
        return Err(Error::new(field.position, ErrorKind::QuotedFieldNotAllowed));
    }
    if field.text == b"@" {
        return origin
            .cloned()
            .ok_or_else(|| Error::new(field.position, ErrorKind::AtWhenOriginNotSet));
    } else if field.text == b"." {
        return Ok(Name::root());
    }

    let mut builder = NameBuilder::new();
    for item in Unescape::new(field) {
        let (index, octet) = item?;
        let result = match octet {
            Octet::Literal(b'.') => builder.next_label(),
            octet => builder.try_push(octet.value()),
        };
        result.map_err(|err| Error::new(field.position_at(index), ErrorKind::InvalidName(err)))?;
    }

    if builder.is_fully_qualified() {
        builder
            .finish()
            .map_err(|err| Error::new(field.position, ErrorKind::InvalidName(err)))
    } else if let Some(origin) = origin {
        builder
            .finish_with_suffix(origin)
            .map_err(|err| Error::new(field.position, ErrorKind::InvalidName(err)))
    } else {
        Err(Error::new(field.position, ErrorKind::PqdnWhenOriginNotSet))
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
