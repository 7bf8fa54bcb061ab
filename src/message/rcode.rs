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

//! Implementation of the [`Rcode`] and [`ExtendedRcode`] types.

use std::fmt;

////////////////////////////////////////////////////////////////////////
// RCODES                                                             //
////////////////////////////////////////////////////////////////////////

/// The four-bit RCODE of the DNS message header
/// ([RFC 1035 § 4.1.1]).
///
/// [RFC 1035 § 4.1.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Rcode(u8);

impl Rcode {
    pub const NOERROR: Self = Self(0);
    pub const FORMERR: Self = Self(1);
    pub const SERVFAIL: Self = Self(2);
    pub const NXDOMAIN: Self = Self(3);
    pub const NOTIMP: Self = Self(4);
    pub const REFUSED: Self = Self(5);
}

/// Only the low four bits are kept.
impl From<u8> for Rcode {
    fn from(raw: u8) -> Self {
        Self(raw & 0x0f)
    }
}

impl From<Rcode> for u8 {
    fn from(rcode: Rcode) -> Self {
        rcode.0
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&ExtendedRcode::from(*self), f)
    }
}

impl fmt::Debug for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

////////////////////////////////////////////////////////////////////////
// EXTENDED RCODES                                                    //
////////////////////////////////////////////////////////////////////////

/// A 12-bit RCODE as extended by EDNS ([RFC 6891 § 6.1.3]). The low
/// four bits go in the message header and the high eight bits in the
/// OPT record.
///
/// [RFC 6891 § 6.1.3]: https://datatracker.ietf.org/doc/html/rfc6891#section-6.1.3
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct ExtendedRcode(u16);

impl ExtendedRcode {
    pub const NOERROR: Self = Self(0);
    pub const FORMERR: Self = Self(1);
    pub const SERVFAIL: Self = Self(2);
    pub const NXDOMAIN: Self = Self(3);
    pub const NOTIMP: Self = Self(4);
    pub const REFUSED: Self = Self(5);
    pub const BADVERS: Self = Self(16);

    /// The largest value an OPT record can carry.
    pub const MAX: u16 = 0x0fff;

    /// Returns the header part of the RCODE.
    pub fn header_bits(self) -> Rcode {
        Rcode::from((self.0 & 0x0f) as u8)
    }

    /// Returns the part of the RCODE carried in the OPT record.
    pub fn upper_bits(self) -> u8 {
        (self.0 >> 4) as u8
    }

    /// Returns whether this RCODE can be sent without EDNS.
    pub fn fits_in_header(self) -> bool {
        self.0 < 16
    }
}

impl From<Rcode> for ExtendedRcode {
    fn from(rcode: Rcode) -> Self {
        Self(u8::from(rcode) as u16)
    }
}

impl From<u16> for ExtendedRcode {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<ExtendedRcode> for u16 {
    fn from(rcode: ExtendedRcode) -> Self {
        rcode.0
    }
}

impl fmt::Display for ExtendedRcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NOERROR => f.write_str("NOERROR"),
            Self::FORMERR => f.write_str("FORMERR"),
            Self::SERVFAIL => f.write_str("SERVFAIL"),
            Self::NXDOMAIN => f.write_str("NXDOMAIN"),
            Self::NOTIMP => f.write_str("NOTIMP"),
            Self::REFUSED => f.write_str("REFUSED"),
            Self::BADVERS => f.write_str("BADVERS"),
            Self(value) => write!(f, "RCODE{value}"),
        }
    }
}

impl fmt::Debug for ExtendedRcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badvers_splits_between_header_and_opt() {
        assert_eq!(ExtendedRcode::BADVERS.header_bits(), Rcode::NOERROR);
        assert_eq!(ExtendedRcode::BADVERS.upper_bits(), 1);
        assert!(!ExtendedRcode::BADVERS.fits_in_header());
        assert!(ExtendedRcode::from(Rcode::REFUSED).fits_in_header());
    }

    #[test]
    fn rcodes_display_mnemonics() {
        assert_eq!(Rcode::NXDOMAIN.to_string(), "NXDOMAIN");
        assert_eq!(ExtendedRcode::BADVERS.to_string(), "BADVERS");
        assert_eq!(Rcode::from(9).to_string(), "RCODE9");
    }
}
