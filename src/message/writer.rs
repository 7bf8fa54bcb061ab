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

//! Implementation of the [`Writer`] type to serialize DNS messages.

use std::fmt;

use arrayvec::ArrayVec;

use super::constants::*;
use super::{ExtendedRcode, Opcode, Question, Rcode};
use crate::name::Name;
use crate::rr::rdata::Component;
use crate::rr::{Class, Rdata, Ttl, Type};

////////////////////////////////////////////////////////////////////////
// WRITER                                                             //
////////////////////////////////////////////////////////////////////////

/// A "frame" around a buffer that serializes a DNS message into it.
///
/// A `Writer` is constructed with [`Writer::new`], which takes a size
/// limit for the message (the UDP payload limit, for instance). The
/// header is initially zeroed and can be changed at any time.
///
/// The question and records are appended in message order through
/// [`Writer::add_question`], [`Writer::add_answer_rr`], and
/// [`Writer::add_authority_rr`]; calling them out of order fails with
/// [`Error::OutOfOrder`]. Each addition is atomic: if the item does
/// not fit within the limit, [`Error::Truncation`] is returned and the
/// message is left exactly as it was, so callers can stop at the first
/// record that does not fit.
///
/// Names are compressed ([RFC 1035 § 4.1.4]) against the names written
/// earlier in the message wherever [RFC 3597 § 4] permits it.
///
/// For EDNS responses, [`Writer::set_edns`] reserves room for the OPT
/// record, which [`Writer::finish`] appends.
///
/// [RFC 1035 § 4.1.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4
/// [RFC 3597 § 4]: https://datatracker.ietf.org/doc/html/rfc3597#section-4
pub struct Writer<'a> {
    octets: &'a mut [u8],
    cursor: usize,
    available: usize,
    rr_start: usize,
    section: Section,
    qdcount: u16,
    ancount: u16,
    nscount: u16,
    arcount: u16,
    prior_names: ArrayVec<PriorName, MAX_PRIOR_NAMES>,
    edns: Option<Edns>,
}

/// The section of the message a [`Writer`] is currently serializing.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
enum Section {
    Question,
    Answer,
    Authority,
}

/// Where a name was written (as the offset of its first uncompressed
/// label) and how many labels it has.
#[derive(Clone, Copy, Debug)]
struct PriorName {
    pointer: u16,
    label_count: u8,
}

/// EDNS information held until the OPT record is written.
#[derive(Clone, Copy, Debug)]
struct Edns {
    udp_payload_size: u16,
    extended_rcode_upper_bits: u8,
}

/// The number of prior names remembered for compression.
const MAX_PRIOR_NAMES: usize = 64;

/// The size of an OPT record with the root owner and no options.
const OPT_RECORD_SIZE: usize = 11;

impl<'a> Writer<'a> {
    /// Creates a `Writer` over `octets`, limiting the message to
    /// `limit` octets (or the buffer length, if that is smaller). Fails
    /// if that leaves no room for a header.
    pub fn new(octets: &'a mut [u8], limit: usize) -> Result<Self> {
        let limit = limit.min(octets.len());
        if limit < HEADER_SIZE {
            return Err(Error::Truncation);
        }
        octets[..HEADER_SIZE].fill(0);
        Ok(Self {
            octets,
            cursor: HEADER_SIZE,
            available: limit,
            rr_start: HEADER_SIZE,
            section: Section::Question,
            qdcount: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
            prior_names: ArrayVec::new(),
            edns: None,
        })
    }

    fn flags(&self) -> u16 {
        u16::from_be_bytes([self.octets[FLAGS_OFFSET], self.octets[FLAGS_OFFSET + 1]])
    }

    fn set_flags(&mut self, flags: u16) {
        self.write_u16(FLAGS_OFFSET, flags);
    }

    fn set_flag(&mut self, mask: u16, value: bool) {
        let flags = self.flags();
        self.set_flags(if value { flags | mask } else { flags & !mask });
    }

    pub fn id(&self) -> u16 {
        u16::from_be_bytes([self.octets[ID_OFFSET], self.octets[ID_OFFSET + 1]])
    }

    pub fn set_id(&mut self, id: u16) {
        self.write_u16(ID_OFFSET, id);
    }

    pub fn set_qr(&mut self, qr: bool) {
        self.set_flag(QR_FLAG, qr);
    }

    pub fn opcode(&self) -> Opcode {
        Opcode::from(((self.flags() & OPCODE_MASK) >> OPCODE_SHIFT) as u8)
    }

    pub fn set_opcode(&mut self, opcode: Opcode) {
        let raw = (u8::from(opcode) as u16) << OPCODE_SHIFT;
        self.set_flags((self.flags() & !OPCODE_MASK) | raw);
    }

    pub fn aa(&self) -> bool {
        self.flags() & AA_FLAG != 0
    }

    pub fn set_aa(&mut self, aa: bool) {
        self.set_flag(AA_FLAG, aa);
    }

    pub fn tc(&self) -> bool {
        self.flags() & TC_FLAG != 0
    }

    pub fn set_tc(&mut self, tc: bool) {
        self.set_flag(TC_FLAG, tc);
    }

    pub fn set_rd(&mut self, rd: bool) {
        self.set_flag(RD_FLAG, rd);
    }

    /// Returns the RCODE in the header. With EDNS, use
    /// [`Writer::extended_rcode`] to see the full value.
    pub fn rcode(&self) -> Rcode {
        Rcode::from((self.flags() & RCODE_MASK) as u8)
    }

    /// Sets the header RCODE, clearing any EDNS extension bits.
    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.set_flags((self.flags() & !RCODE_MASK) | u8::from(rcode) as u16);
        if let Some(ref mut edns) = self.edns {
            edns.extended_rcode_upper_bits = 0;
        }
    }

    pub fn extended_rcode(&self) -> ExtendedRcode {
        let lower = u8::from(self.rcode()) as u16;
        let upper = self.edns.map_or(0, |edns| edns.extended_rcode_upper_bits) as u16;
        ExtendedRcode::from(upper << 4 | lower)
    }

    /// Sets the extended RCODE. Values that do not fit the header need
    /// EDNS; values beyond 4,095 cannot be expressed at all.
    pub fn set_extended_rcode(&mut self, rcode: ExtendedRcode) -> Result<()> {
        if u16::from(rcode) > ExtendedRcode::MAX {
            return Err(Error::ExtendedRcodeOverflow);
        } else if self.edns.is_none() && !rcode.fits_in_header() {
            return Err(Error::NotEdns);
        }
        self.set_rcode(rcode.header_bits());
        if let Some(ref mut edns) = self.edns {
            edns.extended_rcode_upper_bits = rcode.upper_bits();
        }
        Ok(())
    }

    pub fn qdcount(&self) -> u16 {
        self.qdcount
    }

    pub fn ancount(&self) -> u16 {
        self.ancount
    }

    pub fn nscount(&self) -> u16 {
        self.nscount
    }

    pub fn arcount(&self) -> u16 {
        self.arcount
    }

    /// Adds a question. This must come before any records.
    pub fn add_question(&mut self, question: &Question) -> Result<()> {
        if self.section != Section::Question {
            return Err(Error::OutOfOrder);
        }
        let qdcount = self.qdcount.checked_add(1).ok_or(Error::CountOverflow)?;
        self.with_rollback(|this| {
            this.write_name(&question.qname, true)?;
            this.try_push_u16(question.qtype.into())?;
            this.try_push_u16(question.qclass.into())
        })?;
        self.qdcount = qdcount;
        self.rr_start = self.cursor;
        Ok(())
    }

    /// Adds a record to the answer section.
    pub fn add_answer_rr(
        &mut self,
        owner: &Name,
        rr_type: Type,
        class: Class,
        ttl: Ttl,
        rdata: &Rdata,
    ) -> Result<()> {
        if self.section > Section::Answer {
            return Err(Error::OutOfOrder);
        }
        let ancount = self.ancount.checked_add(1).ok_or(Error::CountOverflow)?;
        self.with_rollback(|this| {
            this.section = Section::Answer;
            this.add_rr(owner, rr_type, class, ttl.into(), rdata)
        })?;
        self.ancount = ancount;
        Ok(())
    }

    /// Adds a record to the authority section.
    pub fn add_authority_rr(
        &mut self,
        owner: &Name,
        rr_type: Type,
        class: Class,
        ttl: Ttl,
        rdata: &Rdata,
    ) -> Result<()> {
        let nscount = self.nscount.checked_add(1).ok_or(Error::CountOverflow)?;
        self.with_rollback(|this| {
            this.section = Section::Authority;
            this.add_rr(owner, rr_type, class, ttl.into(), rdata)
        })?;
        self.nscount = nscount;
        Ok(())
    }

    /// Removes all records, keeping the header and question.
    pub fn clear_rrs(&mut self) {
        self.ancount = 0;
        self.nscount = 0;
        self.arcount = if self.edns.is_some() { 1 } else { 0 };
        self.cursor = self.rr_start;
        self.section = Section::Question;
        let question_names = self
            .prior_names
            .iter()
            .take_while(|prior| (prior.pointer as usize) < self.rr_start)
            .count();
        self.prior_names.truncate(question_names);
    }

    /// Makes this an EDNS message, reserving space for the OPT record.
    pub fn set_edns(&mut self, udp_payload_size: u16) -> Result<()> {
        if self.edns.is_some() {
            Err(Error::AlreadyEdns)
        } else if self.cursor + OPT_RECORD_SIZE > self.available {
            Err(Error::Truncation)
        } else {
            self.arcount = self.arcount.checked_add(1).ok_or(Error::CountOverflow)?;
            self.available -= OPT_RECORD_SIZE;
            self.edns = Some(Edns {
                udp_payload_size,
                extended_rcode_upper_bits: 0,
            });
            Ok(())
        }
    }

    /// Raises the message size limit to `limit` octets (capped by the
    /// buffer length). The limit is never lowered.
    pub fn increase_limit(&mut self, limit: usize) {
        let reserved = if self.edns.is_some() { OPT_RECORD_SIZE } else { 0 };
        let available = limit.min(self.octets.len()).saturating_sub(reserved);
        self.available = self.available.max(available);
    }

    /// Finishes the message, returning its length.
    pub fn finish(mut self) -> usize {
        self.write_u16(QDCOUNT_OFFSET, self.qdcount);
        self.write_u16(ANCOUNT_OFFSET, self.ancount);
        self.write_u16(NSCOUNT_OFFSET, self.nscount);
        self.write_u16(ARCOUNT_OFFSET, self.arcount);

        // The OPT record goes into the space reserved by set_edns, so
        // it always fits.
        if let Some(edns) = self.edns {
            let mut opt = [0; OPT_RECORD_SIZE];
            opt[1..3].copy_from_slice(&u16::from(Type::OPT).to_be_bytes());
            opt[3..5].copy_from_slice(&edns.udp_payload_size.to_be_bytes());
            opt[5] = edns.extended_rcode_upper_bits;
            self.write(self.cursor, &opt);
            self.cursor += OPT_RECORD_SIZE;
        }
        self.cursor
    }

    /// Runs `f`, restoring the cursor, section, and compression state
    /// if it fails.
    fn with_rollback<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let saved_cursor = self.cursor;
        let saved_section = self.section;
        let saved_prior_names = self.prior_names.len();
        let result = f(self);
        if result.is_err() {
            self.cursor = saved_cursor;
            self.section = saved_section;
            self.prior_names.truncate(saved_prior_names);
        }
        result
    }

    /// Writes a record at the cursor. Not atomic; see
    /// [`Writer::with_rollback`].
    fn add_rr(
        &mut self,
        owner: &Name,
        rr_type: Type,
        class: Class,
        ttl: u32,
        rdata: &Rdata,
    ) -> Result<()> {
        self.write_name(owner, true)?;
        self.try_push_u16(rr_type.into())?;
        self.try_push_u16(class.into())?;
        self.try_push_u32(ttl)?;

        // RDLENGTH depends on compression, so it is filled in last.
        let rdlength_start = self.cursor;
        self.try_push_u16(0)?;
        for component in rdata.components(rr_type) {
            match component {
                Component::CompressibleName(wire) => self.write_wire_name(wire, true)?,
                Component::UncompressibleName(wire) => self.write_wire_name(wire, false)?,
                Component::Other(octets) => self.try_push(octets)?,
            }
        }
        let rdlength = self.cursor - rdlength_start - 2;
        self.write_u16(rdlength_start, rdlength as u16);
        Ok(())
    }

    /// Writes a name embedded in RDATA, which is stored uncompressed.
    fn write_wire_name(&mut self, wire: &[u8], compress: bool) -> Result<()> {
        match Name::try_from_uncompressed(wire) {
            Ok((name, _)) => self.write_name(&name, compress),
            Err(_) => Err(Error::InvalidRdata),
        }
    }

    /// Writes `name` at the cursor, replacing its longest suffix that
    /// was already written with a pointer when `compress` is set.
    fn write_name(&mut self, name: &Name, compress: bool) -> Result<()> {
        let start = self.cursor;
        let n_labels = name.label_count();
        let found = if compress {
            (0..n_labels - 1).find_map(|first| self.find_prior_suffix(name, first).map(|p| (first, p)))
        } else {
            None
        };

        let literal_len = match found {
            Some((first, pointer)) => {
                let literal_len = name.wire_repr().len() - name.wire_repr_from(first).len();
                self.try_push(&name.wire_repr()[..literal_len])?;
                self.try_push_u16(0xc000 | pointer)?;
                literal_len
            }
            None => {
                self.try_push(name.wire_repr())?;
                name.wire_repr().len() - 1
            }
        };

        if literal_len > 0 && start <= MAX_POINTER {
            // When the table is full, later names go uncompressed
            // against each other, which is still correct.
            let _ = self.prior_names.try_push(PriorName {
                pointer: start as u16,
                label_count: n_labels as u8,
            });
        }
        Ok(())
    }

    /// Looks for an earlier name whose suffix equals the labels of
    /// `name` starting at label `first`, returning a pointer to it.
    fn find_prior_suffix(&self, name: &Name, first: usize) -> Option<u16> {
        let wanted = name.label_count() - first;
        self.prior_names.iter().find_map(|prior| {
            let prior_count = prior.label_count as usize;
            if prior_count < wanted {
                return None;
            }
            let target = self.skip_labels(prior.pointer as usize, prior_count - wanted);
            if target > MAX_POINTER {
                return None;
            }
            let mut position = target;
            let matches = name.labels().skip(first).all(|label| {
                position = self.resolve_pointers(position);
                let len = self.octets[position] as usize;
                let prior_label = &self.octets[position + 1..position + 1 + len];
                position += 1 + len;
                prior_label.eq_ignore_ascii_case(label)
            });
            matches.then_some(target as u16)
        })
    }

    /// Follows pointers starting at `position` until reaching a normal
    /// label. Only names this writer has written are walked, and all of
    /// their pointers point backward.
    fn resolve_pointers(&self, mut position: usize) -> usize {
        while self.octets[position] & 0xc0 == 0xc0 {
            position = ((self.octets[position] as usize & 0x3f) << 8) | self.octets[position + 1] as usize;
        }
        position
    }

    /// Skips `n` labels of the name at `position`, following pointers.
    fn skip_labels(&self, mut position: usize, n: usize) -> usize {
        for _ in 0..n {
            position = self.resolve_pointers(position);
            position += 1 + self.octets[position] as usize;
        }
        self.resolve_pointers(position)
    }

    /// Writes `data` at the cursor, failing if it would pass the limit.
    fn try_push(&mut self, data: &[u8]) -> Result<()> {
        if self.available - self.cursor >= data.len() {
            self.write(self.cursor, data);
            self.cursor += data.len();
            Ok(())
        } else {
            Err(Error::Truncation)
        }
    }

    fn try_push_u16(&mut self, data: u16) -> Result<()> {
        self.try_push(&data.to_be_bytes())
    }

    fn try_push_u32(&mut self, data: u32) -> Result<()> {
        self.try_push(&data.to_be_bytes())
    }

    fn write(&mut self, position: usize, data: &[u8]) {
        self.octets[position..position + data.len()].copy_from_slice(data);
    }

    fn write_u16(&mut self, position: usize, data: u16) {
        self.write(position, &data.to_be_bytes());
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a [`Writer`] operation could not be
/// performed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// Adding the question or record would overflow its 16-bit count.
    CountOverflow,

    /// There is not enough room left within the limit.
    Truncation,

    /// A question or record was added after a later section was begun.
    OutOfOrder,

    /// A name embedded in RDATA could not be parsed.
    InvalidRdata,

    /// An extended RCODE needs EDNS, which is not in use.
    NotEdns,

    /// EDNS is already in use.
    AlreadyEdns,

    /// An extended RCODE over 4,095 was requested.
    ExtendedRcodeOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::CountOverflow => f.write_str("record count would overflow"),
            Self::Truncation => f.write_str("message would be truncated"),
            Self::OutOfOrder => f.write_str("question or record serialized out of order"),
            Self::InvalidRdata => f.write_str("invalid RDATA"),
            Self::NotEdns => f.write_str("not an EDNS message"),
            Self::AlreadyEdns => f.write_str("already an EDNS message"),
            Self::ExtendedRcodeOverflow => f.write_str("extended RCODE would overflow"),
        }
    }
}

impl std::error::Error for Error {}

/// The type returned by fallible [`Writer`] methods.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::super::{Qclass, Qtype, Reader};
    use super::*;

    fn question(qname: &str, qtype: Type) -> Question {
        Question {
            qname: qname.parse().unwrap(),
            qtype: Qtype::from(qtype),
            qclass: Qclass::from(Class::IN),
        }
    }

    fn localhost() -> Rdata {
        Rdata::from_ipv4(Ipv4Addr::LOCALHOST)
    }

    #[test]
    fn writer_writes_a_simple_answer() {
        let mut buf = [0; 512];
        let mut writer = Writer::new(&mut buf, 512).unwrap();
        writer.set_id(0x0703);
        writer.set_opcode(Opcode::QUERY);
        writer.set_qr(true);
        writer.set_aa(true);
        writer.set_rcode(Rcode::NOERROR);
        let question = question("www.example.", Type::A);
        writer.add_question(&question).unwrap();
        writer
            .add_answer_rr(&question.qname, Type::A, Class::IN, Ttl::from(3600), &localhost())
            .unwrap();
        let len = writer.finish();
        assert_eq!(
            &buf[..len],
            b"\x07\x03\x84\x00\x00\x01\x00\x01\x00\x00\x00\x00\
              \x03www\x07example\x00\x00\x01\x00\x01\
              \xc0\x0c\x00\x01\x00\x01\x00\x00\x0e\x10\x00\x04\
              \x7f\x00\x00\x01"
        );
    }

    #[test]
    fn writer_appends_opt_with_extended_rcode() {
        let mut buf = [0; 512];
        let mut writer = Writer::new(&mut buf, 512).unwrap();
        writer.set_qr(true);
        writer.add_question(&question("example.", Type::A)).unwrap();
        writer.set_edns(1232).unwrap();
        writer.set_extended_rcode(ExtendedRcode::BADVERS).unwrap();
        assert_eq!(writer.rcode(), Rcode::NOERROR);
        assert_eq!(writer.extended_rcode(), ExtendedRcode::BADVERS);
        let len = writer.finish();
        assert_eq!(&buf[10..12], b"\x00\x01");
        assert_eq!(
            &buf[len - OPT_RECORD_SIZE..len],
            b"\x00\x00\x29\x04\xd0\x01\x00\x00\x00\x00\x00"
        );
    }

    #[test]
    fn extended_rcodes_need_edns() {
        let mut buf = [0; 512];
        let mut writer = Writer::new(&mut buf, 512).unwrap();
        assert_eq!(writer.set_extended_rcode(ExtendedRcode::BADVERS), Err(Error::NotEdns));
        assert_eq!(writer.set_extended_rcode(ExtendedRcode::REFUSED), Ok(()));
        assert_eq!(writer.rcode(), Rcode::REFUSED);
    }

    #[test]
    fn records_that_do_not_fit_leave_the_message_unchanged() {
        let mut buf = [0; 512];
        let question = question("www.example.", Type::A);
        // Header (12) + question (17) + one compressed A record (16).
        let mut writer = Writer::new(&mut buf, 12 + 17 + 16 + 10).unwrap();
        writer.add_question(&question).unwrap();
        for (last, expected) in [(1, Ok(())), (2, Err(Error::Truncation))] {
            let rdata = Rdata::from_ipv4(Ipv4Addr::new(192, 0, 2, last));
            assert_eq!(
                writer.add_answer_rr(&question.qname, Type::A, Class::IN, Ttl::from(60), &rdata),
                expected
            );
        }
        assert_eq!(writer.ancount(), 1);
        let len = writer.finish();
        assert_eq!(len, 12 + 17 + 16);
    }

    #[test]
    fn rdata_names_are_compressed_against_earlier_names() {
        let mut buf = [0; 512];
        let mut writer = Writer::new(&mut buf, 512).unwrap();
        let question = question("www.example.", Type::CNAME);
        writer.add_question(&question).unwrap();
        let target: Name = "web.EXAMPLE.".parse().unwrap();
        writer
            .add_answer_rr(
                &question.qname,
                Type::CNAME,
                Class::IN,
                Ttl::from(60),
                &Rdata::from_name(&target),
            )
            .unwrap();
        let len = writer.finish();

        // The RDATA is "web" followed by a pointer to "example".
        assert_eq!(&buf[len - 8..len], b"\x00\x06\x03web\xc0\x10");
        let (decoded, _) = Name::try_from_compressed(&buf[..len], len - 6).unwrap();
        assert_eq!(decoded, target);
    }

    #[test]
    fn srv_targets_are_not_compressed() {
        let mut buf = [0; 512];
        let mut writer = Writer::new(&mut buf, 512).unwrap();
        let question = question("_sip._udp.example.", Type::SRV);
        writer.add_question(&question).unwrap();
        let mut octets = vec![0, 1, 0, 1, 0x13, 0xc4];
        octets.extend_from_slice(b"\x03sip\x07example\x00");
        let rdata = Rdata::try_from(octets).unwrap();
        writer
            .add_answer_rr(&question.qname, Type::SRV, Class::IN, Ttl::from(60), &rdata)
            .unwrap();
        let len = writer.finish();
        assert_eq!(&buf[len - 13..len], b"\x03sip\x07example\x00");
    }

    #[test]
    fn sections_must_be_written_in_order() {
        let mut buf = [0; 512];
        let mut writer = Writer::new(&mut buf, 512).unwrap();
        let question = question("example.", Type::A);
        writer.add_question(&question).unwrap();
        writer
            .add_authority_rr(&question.qname, Type::A, Class::IN, Ttl::from(60), &localhost())
            .unwrap();
        assert_eq!(
            writer.add_answer_rr(&question.qname, Type::A, Class::IN, Ttl::from(60), &localhost()),
            Err(Error::OutOfOrder)
        );
        assert_eq!(writer.add_question(&question), Err(Error::OutOfOrder));
    }

    #[test]
    fn cleared_messages_keep_the_question() {
        let mut buf = [0; 512];
        let mut writer = Writer::new(&mut buf, 512).unwrap();
        let question = question("example.", Type::A);
        writer.add_question(&question).unwrap();
        writer
            .add_answer_rr(&question.qname, Type::A, Class::IN, Ttl::from(60), &localhost())
            .unwrap();
        writer.clear_rrs();
        assert_eq!(writer.ancount(), 0);
        let len = writer.finish();
        let mut reader = Reader::try_from(&buf[..len]).unwrap();
        assert_eq!(reader.ancount(), 0);
        assert_eq!(reader.read_question(), Ok(question));
        assert!(reader.at_eom());
    }

    #[test]
    fn limits_only_increase() {
        let mut buf = [0; 1024];
        let mut writer = Writer::new(&mut buf, 64).unwrap();
        writer.set_edns(1232).unwrap();
        writer.increase_limit(32);
        let big = Rdata::try_from(vec![0; 100]).unwrap();
        let owner: Name = "example.".parse().unwrap();
        assert_eq!(
            writer.add_answer_rr(&owner, Type::TXT, Class::IN, Ttl::from(60), &big),
            Err(Error::Truncation)
        );
        writer.increase_limit(4096);
        assert_eq!(
            writer.add_answer_rr(&owner, Type::TXT, Class::IN, Ttl::from(60), &big),
            Ok(())
        );
        let len = writer.finish();
        assert!(len <= 1024);
    }

    #[test]
    fn short_limits_are_rejected() {
        let mut buf = [0; 512];
        assert!(Writer::new(&mut buf, 11).is_err());
        let mut small = [0; 8];
        assert!(Writer::new(&mut small, 512).is_err());
    }
}
