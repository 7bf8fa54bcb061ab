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

//! Implementation of types relating to DNS questions.

use std::fmt;
use std::str::FromStr;

use crate::name::Name;
use crate::rr::{Class, Type};
use crate::util::Caseless;

////////////////////////////////////////////////////////////////////////
// QUESTIONS                                                          //
////////////////////////////////////////////////////////////////////////

/// The question of a DNS query ([RFC 1035 § 4.1.2]). The QNAME keeps
/// the case it was received in, so that it is echoed back unchanged.
///
/// [RFC 1035 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    pub qname: Name,
    pub qtype: Qtype,
    pub qclass: Qclass,
}

////////////////////////////////////////////////////////////////////////
// QTYPES                                                             //
////////////////////////////////////////////////////////////////////////

/// The QTYPE of a [question](Question): any data [`Type`], or one of
/// the query-only values such as [`Qtype::ANY`].
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
pub struct Qtype(u16);

impl Qtype {
    // RFC 1995
    pub const IXFR: Self = Self(251);

    // RFC 1035
    pub const AXFR: Self = Self(252);
    pub const MAILB: Self = Self(253);
    pub const MAILA: Self = Self(254);
    pub const ANY: Self = Self(255);

    /// Returns whether this QTYPE asks for a zone transfer or for one
    /// of the obsolete mailbox groups, none of which are served.
    pub fn is_unsupported_meta(self) -> bool {
        matches!(self, Self::IXFR | Self::AXFR | Self::MAILB | Self::MAILA)
    }
}

impl From<u16> for Qtype {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Qtype> for u16 {
    fn from(qtype: Qtype) -> Self {
        qtype.0
    }
}

impl From<Type> for Qtype {
    fn from(rr_type: Type) -> Self {
        Self(rr_type.into())
    }
}

impl From<Qtype> for Type {
    fn from(qtype: Qtype) -> Self {
        Self::from(qtype.0)
    }
}

impl fmt::Display for Qtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::IXFR => f.write_str("IXFR"),
            Self::AXFR => f.write_str("AXFR"),
            Self::MAILB => f.write_str("MAILB"),
            Self::MAILA => f.write_str("MAILA"),
            Self::ANY => f.write_str("ANY"),
            _ => fmt::Display::fmt(&Type::from(*self), f),
        }
    }
}

impl fmt::Debug for Qtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Qtype {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match Caseless(text) {
            Caseless("IXFR") => Ok(Self::IXFR),
            Caseless("AXFR") => Ok(Self::AXFR),
            Caseless("MAILB") => Ok(Self::MAILB),
            Caseless("MAILA") => Ok(Self::MAILA),
            Caseless("ANY") | Caseless("*") => Ok(Self::ANY),
            _ => Type::from_str(text).map(Into::into),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// QCLASSES                                                           //
////////////////////////////////////////////////////////////////////////

/// The QCLASS of a [question](Question): any [`Class`], or
/// [`Qclass::ANY`] or [`Qclass::NONE`].
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
pub struct Qclass(u16);

impl Qclass {
    // RFC 2136
    pub const NONE: Self = Self(254);

    // RFC 1035
    pub const ANY: Self = Self(255);
}

impl From<u16> for Qclass {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Qclass> for u16 {
    fn from(qclass: Qclass) -> Self {
        qclass.0
    }
}

impl From<Class> for Qclass {
    fn from(class: Class) -> Self {
        Self(class.into())
    }
}

impl From<Qclass> for Class {
    fn from(qclass: Qclass) -> Self {
        Self::from(qclass.0)
    }
}

impl fmt::Display for Qclass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NONE => f.write_str("NONE"),
            Self::ANY => f.write_str("ANY"),
            _ => fmt::Display::fmt(&Class::from(*self), f),
        }
    }
}

impl fmt::Debug for Qclass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
