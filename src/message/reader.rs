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

//! Implementation of the [`Reader`] type to read on-the-wire DNS
//! messages.

use std::fmt;

use super::constants::*;
use super::{Opcode, Question, Rcode};
use crate::name::{self, Name};
use crate::rr::{Class, Type};

////////////////////////////////////////////////////////////////////////
// READER                                                             //
////////////////////////////////////////////////////////////////////////

/// A read-only view of a DNS message.
///
/// A `Reader` is constructed with its [`TryFrom`] implementation,
/// which fails unless the buffer holds at least a full 12-octet header.
/// Header fields can be read at any time. Questions and records are
/// read in message order with [`Reader::read_question`] and
/// [`Reader::read_rr`], which advance a cursor that starts right after
/// the header.
#[derive(Clone, Eq, PartialEq)]
pub struct Reader<'a> {
    octets: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    fn u16_at(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.octets[offset], self.octets[offset + 1]])
    }

    fn flags(&self) -> u16 {
        self.u16_at(FLAGS_OFFSET)
    }

    /// Returns the 16-bit ID of the message.
    pub fn id(&self) -> u16 {
        self.u16_at(ID_OFFSET)
    }

    /// Returns whether the QR (query response) bit is set.
    pub fn qr(&self) -> bool {
        self.flags() & QR_FLAG != 0
    }

    pub fn opcode(&self) -> Opcode {
        Opcode::from(((self.flags() & OPCODE_MASK) >> OPCODE_SHIFT) as u8)
    }

    pub fn aa(&self) -> bool {
        self.flags() & AA_FLAG != 0
    }

    pub fn tc(&self) -> bool {
        self.flags() & TC_FLAG != 0
    }

    pub fn rd(&self) -> bool {
        self.flags() & RD_FLAG != 0
    }

    pub fn ra(&self) -> bool {
        self.flags() & RA_FLAG != 0
    }

    /// Returns the RCODE in the header (without any EDNS extension).
    pub fn rcode(&self) -> Rcode {
        Rcode::from((self.flags() & RCODE_MASK) as u8)
    }

    pub fn qdcount(&self) -> u16 {
        self.u16_at(QDCOUNT_OFFSET)
    }

    pub fn ancount(&self) -> u16 {
        self.u16_at(ANCOUNT_OFFSET)
    }

    pub fn nscount(&self) -> u16 {
        self.u16_at(NSCOUNT_OFFSET)
    }

    pub fn arcount(&self) -> u16 {
        self.u16_at(ARCOUNT_OFFSET)
    }

    /// Reads a [`Question`] at the cursor. The cursor is left unchanged
    /// on failure.
    pub fn read_question(&mut self) -> Result<Question> {
        let (qname, qname_len) =
            Name::try_from_compressed(self.octets, self.cursor).map_err(Error::InvalidName)?;
        let fields = self.cursor + qname_len;
        let qtype = read_u16(self.octets, fields)?.into();
        let qclass = read_u16(self.octets, fields + 2)?.into();
        self.cursor = fields + 4;
        Ok(Question {
            qname,
            qtype,
            qclass,
        })
    }

    /// Reads a resource record at the cursor. The RDATA is returned as
    /// it appears in the message, without decompressing embedded names.
    /// The cursor is left unchanged on failure.
    pub fn read_rr(&mut self) -> Result<ReadRr<'a>> {
        let (owner, owner_len) =
            Name::try_from_compressed(self.octets, self.cursor).map_err(Error::InvalidName)?;
        let fields = self.cursor + owner_len;
        let rr_type = read_u16(self.octets, fields)?.into();
        let class = read_u16(self.octets, fields + 2)?.into();
        let ttl = read_u32(self.octets, fields + 4)?;
        let rdlength = read_u16(self.octets, fields + 8)? as usize;
        let rdata_start = fields + 10;
        let rdata = self
            .octets
            .get(rdata_start..rdata_start + rdlength)
            .ok_or(Error::RdataOverflow)?;
        self.cursor = rdata_start + rdlength;
        Ok(ReadRr {
            owner,
            rr_type,
            class,
            ttl,
            rdata,
        })
    }

    /// Returns whether the cursor has reached the end of the message.
    pub fn at_eom(&self) -> bool {
        self.cursor >= self.octets.len()
    }
}

impl<'a> TryFrom<&'a [u8]> for Reader<'a> {
    type Error = Error;

    fn try_from(octets: &'a [u8]) -> Result<Self> {
        if octets.len() >= HEADER_SIZE {
            Ok(Self {
                octets,
                cursor: HEADER_SIZE,
            })
        } else {
            Err(Error::HeaderTooShort)
        }
    }
}

impl fmt::Debug for Reader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Reader")
            .field("id", &self.id())
            .field("qr", &self.qr())
            .field("opcode", &self.opcode())
            .field("rcode", &self.rcode())
            .field("qdcount", &self.qdcount())
            .field("ancount", &self.ancount())
            .field("nscount", &self.nscount())
            .field("arcount", &self.arcount())
            .field("cursor", &self.cursor)
            .finish()
    }
}

fn read_u16(octets: &[u8], offset: usize) -> Result<u16> {
    match octets.get(offset..offset + 2) {
        Some(&[a, b]) => Ok(u16::from_be_bytes([a, b])),
        _ => Err(Error::UnexpectedEomInField),
    }
}

fn read_u32(octets: &[u8], offset: usize) -> Result<u32> {
    match octets.get(offset..offset + 4) {
        Some(&[a, b, c, d]) => Ok(u32::from_be_bytes([a, b, c, d])),
        _ => Err(Error::UnexpectedEomInField),
    }
}

////////////////////////////////////////////////////////////////////////
// READ RR STRUCTURE                                                  //
////////////////////////////////////////////////////////////////////////

/// A record as returned by [`Reader::read_rr`]. The TTL is the raw
/// 32-bit field, since OPT records reuse it for EDNS flags.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReadRr<'a> {
    pub owner: Name,
    pub rr_type: Type,
    pub class: Class,
    pub ttl: u32,
    pub rdata: &'a [u8],
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a [`Question`] or resource record could not
/// be read.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    HeaderTooShort,
    UnexpectedEomInField,
    InvalidName(name::Error),
    RdataOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::HeaderTooShort => f.write_str("header too short"),
            Self::UnexpectedEomInField => f.write_str("unexpected end of message in field"),
            Self::InvalidName(err) => write!(f, "invalid name: {err}"),
            Self::RdataOverflow => f.write_str("RDLENGTH runs past the end of the message"),
        }
    }
}

impl std::error::Error for Error {}

/// The type returned by fallible [`Reader`] methods.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
