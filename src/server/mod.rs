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

//! The processing logic of a geo-selective authoritative DNS server.
//!
//! The [`Server`] structure is the heart of this module; see its
//! documentation for details.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, PoisonError, RwLock};

use crate::geo::{canonical_client, Client, GeoScope, RegionTable};
use crate::message::reader::ReadRr;
use crate::message::{
    writer, ExtendedRcode, Opcode, Question, Rcode, Reader, Writer, MAX_TCP_MESSAGE_SIZE,
    MIN_UDP_PAYLOAD_SIZE,
};
use crate::rr::Type;
use crate::zone::ZoneStore;

mod logging;
mod query;

pub use logging::{LogOptions, ParseLogOptionsError};

////////////////////////////////////////////////////////////////////////
// SERVER PUBLIC API AND CORE MESSAGE-HANDLING LOGIC                  //
////////////////////////////////////////////////////////////////////////

/// A geo-selective authoritative DNS server, abstracted from any
/// underlying network I/O provider.
///
/// The [`Server`] structure implements the message-processing logic of
/// an authoritative DNS server. It receives, parses, and responds to
/// DNS messages through the [`Server::handle_message`] method. An
/// underlying network I/O provider is responsible for receiving these
/// messages from the network and then sending the responses that the
/// [`Server`] produces.
///
/// Responses are produced from a [`ZoneStore`]. For each record type
/// at a name, the store may hold several candidate answers tagged with
/// geo scopes, and the candidate applying to the query's source address
/// is chosen with [`geo::select`](crate::geo::select). Region scopes
/// match through the server's [`RegionTable`]. Both can be replaced at
/// any time, with [`Server::set_zones`] and [`Server::set_regions`].
pub struct Server {
    zones: RwLock<Arc<ZoneStore>>,
    regions: RwLock<Arc<RegionTable>>,
    edns_udp_payload_size: u16,
    glob: bool,
    log_options: LogOptions,
}

impl Server {
    /// Creates a new `Server` that will serve the provided zones.
    ///
    /// The default EDNS UDP payload size used is 1,232 octets. This is
    /// the safe default recommended for DNS Flag Day 2020, since 1,232
    /// (DNS message) + 8 (UDP header) + 40 (IPv6 header) = 1,280, the
    /// minimum MTU for IPv6. It should therefore avoid IP packet
    /// fragmentation on almost all present-day networks.
    ///
    /// Wildcard owners are disabled by default, every log hook is
    /// enabled, and the region table is empty, so that region scopes
    /// match no client.
    pub fn new(zones: Arc<ZoneStore>) -> Self {
        Self {
            zones: RwLock::new(zones),
            regions: RwLock::new(Arc::new(RegionTable::new())),
            edns_udp_payload_size: 1232,
            glob: false,
            log_options: LogOptions::default(),
        }
    }

    /// Returns the current zones of the server.
    pub fn zones(&self) -> Arc<ZoneStore> {
        self.zones
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sets the zones of the `Server`. Some in-flight message handling
    /// may continue to use the old zones (depending on how far it has
    /// gotten), but handling started after this call completes will see
    /// the new ones.
    pub fn set_zones(&self, zones: Arc<ZoneStore>) {
        *self.zones.write().unwrap_or_else(PoisonError::into_inner) = zones;
    }

    /// Returns the current region table of the server.
    pub fn regions(&self) -> Arc<RegionTable> {
        self.regions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sets the region table used to place clients in regions. Like
    /// [`Server::set_zones`], this affects handling started after the
    /// call completes.
    pub fn set_regions(&self, regions: Arc<RegionTable>) {
        *self.regions.write().unwrap_or_else(PoisonError::into_inner) = regions;
    }

    /// Returns the maximum UDP payload size that this `Server` will use
    /// with EDNS messages.
    pub fn edns_udp_payload_size(&self) -> u16 {
        self.edns_udp_payload_size
    }

    /// Sets the maximum UDP payload size that this `Server` will use
    /// with EDNS messages. This must be at least 512 octets (the
    /// maximum UDP payload size in unextended DNS).
    pub fn set_edns_udp_payload_size(&mut self, size: u16) -> Result<(), InvalidPayloadSizeError> {
        if size as usize >= MIN_UDP_PAYLOAD_SIZE {
            self.edns_udp_payload_size = size;
            Ok(())
        } else {
            Err(InvalidPayloadSizeError)
        }
    }

    /// Enables or disables wildcard owners ([RFC 4592]). When disabled,
    /// an owner such as `*.example.com.` only matches a QNAME of
    /// exactly that text.
    ///
    /// [RFC 4592]: https://datatracker.ietf.org/doc/html/rfc4592
    pub fn set_glob(&mut self, glob: bool) {
        self.glob = glob;
    }

    pub fn log_options(&self) -> LogOptions {
        self.log_options
    }

    pub fn set_log_options(&mut self, log_options: LogOptions) {
        self.log_options = log_options;
    }

    /// Handles a received DNS message. This is the API through which
    /// I/O providers submit messages.
    ///
    /// `received_buf` contains the message received, and `received_info`
    /// provides additional information about it (see [`ReceivedInfo`]).
    /// `response_buf` is a buffer into which a response message may be
    /// serialized. The caller must take care that these buffers are
    /// large enough. For UDP transport, the caller must be able to send
    /// and receive messages as large as the maximum configured size
    /// (use [`Server::edns_udp_payload_size`] to determine what this
    /// is). For TCP transport, the caller must be able to send and
    /// receive messages as large as 65,535 octets. In particular, if
    /// `response_buf` is not large enough to meet these requirements,
    /// then this method will panic.
    ///
    /// A [`Response`] is returned, signifying whether a response is to
    /// be sent and, if so, how long the response message written into
    /// `response_buf` is.
    pub fn handle_message(
        &self,
        received_buf: &[u8],
        received_info: ReceivedInfo,
        response_buf: &mut [u8],
    ) -> Response {
        // Enforce our requirements on the size of response_buf.
        let min_response_buf_size = match received_info.transport {
            Transport::Tcp => MAX_TCP_MESSAGE_SIZE,
            Transport::Udp => self.edns_udp_payload_size as usize,
        };
        if response_buf.len() < min_response_buf_size {
            panic!("the response buffer is not large enough");
        }

        // Construct a Reader, while ignoring messages that do not
        // contain a full DNS header.
        let received = match Reader::try_from(received_buf) {
            Ok(r) => r,
            Err(_) => return Response::None,
        };

        // Ignore messages that are responses.
        if received.qr() {
            return Response::None;
        }

        // Start the response by copying information from the received
        // message and setting the QR bit. Without EDNS, UDP responses
        // are limited to 512 octets; the limit is raised below if the
        // query has an OPT record.
        let response_size_limit = match received_info.transport {
            Transport::Tcp => MAX_TCP_MESSAGE_SIZE,
            Transport::Udp => MIN_UDP_PAYLOAD_SIZE,
        };
        let mut response = match Writer::new(response_buf, response_size_limit) {
            Ok(w) => w,
            Err(_) => return Response::None,
        };
        response.set_id(received.id());
        response.set_qr(true);
        response.set_opcode(received.opcode());
        if received.opcode() == Opcode::QUERY {
            // RD is only defined for opcode QUERY, so it is not copied
            // otherwise.
            response.set_rd(received.rd());
        }

        let zones = self.zones();
        let client = Client::new(received_info.source.ip(), &self.regions());
        let mut context = Context::new(zones.as_ref(), received, received_info, client, response);
        self.handle_message_with_context(&mut context);
        self.log_outcome(&context);
        Response::Single(context.response.finish())
    }

    /// Handles a received DNS message once a [`Context`] has been
    /// constructed. This is a continuation of
    /// [`Server::handle_message`] that performs generic processing
    /// (reading the question and looking for OPT records) before
    /// calling into opcode-specific processing.
    fn handle_message_with_context(&self, context: &mut Context) {
        if context.received.qdcount() != 1 {
            context.response.set_rcode(Rcode::FORMERR);
            return;
        }
        match context.received.read_question() {
            Ok(question) => {
                if context.response.add_question(&question).is_err() {
                    context.response.set_rcode(Rcode::SERVFAIL);
                    return;
                }
                self.log_request(context, &question);
                context.question = Some(question);
            }
            Err(_) => {
                context.response.set_rcode(Rcode::FORMERR);
                return;
            }
        }

        // Scan all the answer and authority RRs. RFC 6891 § 6.1.1 says
        // that the EDNS OPT record goes in the additional section, so
        // if we see it in these two sections, return FORMERR.
        let an_plus_ns_count =
            context.received.ancount() as usize + context.received.nscount() as usize;
        for _ in 0..an_plus_ns_count {
            match context.received.read_rr() {
                Ok(rr) if rr.rr_type != Type::OPT => (),
                _ => {
                    context.response.set_rcode(Rcode::FORMERR);
                    return;
                }
            }
        }

        // Scan the additional section. If we see an OPT, now's the time
        // to process it.
        let mut seen_opt = false;
        for _ in 0..context.received.arcount() {
            let rr = match context.received.read_rr() {
                Ok(rr) => rr,
                Err(_) => {
                    context.response.set_rcode(Rcode::FORMERR);
                    return;
                }
            };
            if rr.rr_type != Type::OPT {
                continue;
            }

            // Per RFC 6891 § 6.1.1, we must return FORMERR if more than
            // one OPT is received.
            if seen_opt {
                context.response.set_rcode(Rcode::FORMERR);
                return;
            }
            seen_opt = true;

            // Once we find an OPT record, we produce an EDNS response,
            // even if the OPT record is invalid (see RFC 6891 § 7).
            if context
                .response
                .set_edns(self.edns_udp_payload_size)
                .is_err()
            {
                context.response.set_rcode(Rcode::SERVFAIL);
                return;
            }

            // For UDP transport, increase the message size limit if
            // possible. Writer::increase_limit never *decreases* the
            // limit, so we comply with RFC 6891 § 6.2.5's requirement
            // to treat payload sizes less than 512 octets as equal to
            // 512 octets.
            if context.received_info.transport == Transport::Udp {
                let their_limit = u16::from(rr.class);
                let negotiated_limit = their_limit.min(self.edns_udp_payload_size);
                context.response.increase_limit(negotiated_limit as usize);
            }

            if let Some(rcode) = validate_opt(&rr) {
                if context.response.set_extended_rcode(rcode).is_err() {
                    context.response.set_rcode(Rcode::SERVFAIL);
                }
                return;
            }
        }

        // At this point, we ought to be at the end of the message.
        if !context.received.at_eom() {
            context.response.set_rcode(Rcode::FORMERR);
            return;
        }

        match context.received.opcode() {
            Opcode::QUERY => self.handle_query(context),
            _ => context.response.set_rcode(Rcode::NOTIMP),
        }
    }
}

/// Provides network-related information about a received DNS message to
/// [`Server::handle_message`].
#[derive(Clone, Copy, Debug)]
pub struct ReceivedInfo {
    source: SocketAddr,
    client: IpAddr,
    transport: Transport,
}

impl ReceivedInfo {
    /// Creates a new [`ReceivedInfo`].
    ///
    /// Geo selection requires that IPv4-mapped IPv6 addresses of the
    /// kind that dual-stack sockets produce (e.g. `::ffff:127.0.0.1`)
    /// be interpreted as IPv4 addresses. This function performs that
    /// canonicalization; calling I/O code need not concern itself with
    /// this task.
    pub fn new(source: SocketAddr, transport: Transport) -> Self {
        Self {
            source,
            client: canonical_client(source.ip()),
            transport,
        }
    }

    /// Returns the source socket address, as received.
    pub fn source(&self) -> SocketAddr {
        self.source
    }

    /// Returns the canonicalized client address used for geo selection.
    pub fn client(&self) -> IpAddr {
        self.client
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }
}

/// Indicates the transport through which a DNS message was received.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Transport {
    Tcp,
    Udp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Udp => f.write_str("udp"),
        }
    }
}

/// Indicates to the caller of [`Server::handle_message`] what kind of
/// response needs to be sent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Response {
    /// A single response is to be sent. The response has been written
    /// into the provided buffer. The length of the response is
    /// included.
    Single(usize),

    /// No response is to be sent.
    None,
}

////////////////////////////////////////////////////////////////////////
// MESSAGE-HANDLING CONTEXT                                           //
////////////////////////////////////////////////////////////////////////

/// Contains data involved in DNS message-handling. This includes the
/// received message and the response under construction, as well as
/// other data set or consumed at different stages of the process.
struct Context<'z, 'b> {
    // Snapshot of the zones at the beginning of processing:
    zones: &'z ZoneStore,

    // Information on the received message:
    received: Reader<'b>,
    received_info: ReceivedInfo,
    client: Client,
    question: Option<Question>,

    // Data recorded during processing:
    scope: Option<GeoScope>,

    // The response:
    response: Writer<'b>,
}

impl<'z, 'b> Context<'z, 'b> {
    fn new(
        zones: &'z ZoneStore,
        received: Reader<'b>,
        received_info: ReceivedInfo,
        client: Client,
        response: Writer<'b>,
    ) -> Self {
        Self {
            zones,
            received,
            received_info,
            client,
            question: None,
            scope: None,
            response,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// EDNS OPT RECORD HANDLING                                           //
////////////////////////////////////////////////////////////////////////

/// Validates an EDNS OPT record. If it's not valid, then the proper
/// error RCODE for the response is returned.
fn validate_opt(opt_rr: &ReadRr) -> Option<ExtendedRcode> {
    // Since we don't support any EDNS options, we ignore any sent to us
    // (per RFC 6891 § 6.1.2). What remains is to check the owner name
    // and the EDNS version.
    if !opt_rr.owner.is_root() {
        Some(ExtendedRcode::FORMERR)
    } else {
        let edns_version = (opt_rr.ttl >> 16) as u8;
        if edns_version != 0 {
            Some(ExtendedRcode::BADVERS)
        } else {
            None
        }
    }
}

////////////////////////////////////////////////////////////////////////
// PUBLIC ERRORS                                                      //
////////////////////////////////////////////////////////////////////////

/// An error returned when an invalid EDNS UDP payload size is passed
/// to [`Server::set_edns_udp_payload_size`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct InvalidPayloadSizeError;

impl fmt::Display for InvalidPayloadSizeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid EDNS UDP payload size (the minimum is 512 octets)")
    }
}

impl std::error::Error for InvalidPayloadSizeError {}

////////////////////////////////////////////////////////////////////////
// PROCESSING ERRORS                                                  //
////////////////////////////////////////////////////////////////////////

/// An error internal to the [`server`](crate::server) module used to
/// signal problems encountered while processing a DNS message.
#[derive(Debug, Eq, PartialEq)]
enum ProcessingError {
    ServFail,
    Truncation,
}

impl From<writer::Error> for ProcessingError {
    fn from(writer_error: writer::Error) -> Self {
        match writer_error {
            writer::Error::Truncation => Self::Truncation,
            _ => Self::ServFail,
        }
    }
}

/// A result type used internally by [`server`](crate::server) functions
/// that process DNS messages.
type ProcessingResult<T> = Result<T, ProcessingError>;

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::message::{Qclass, Qtype};
    use crate::name::Name;
    use crate::rr::Class;
    use crate::zone::Zone;
    use crate::zone_file::Parser;

    const EXAMPLE_ZONE: &str = "\
$TTL 3600
@         IN SOA ns1 hostmaster 1 3600 900 604800 300
@         IN NS  ns1
ns1       IN A   192.0.2.53
alias     IN CNAME www
alias2    IN CNAME alias
external  IN CNAME www.example.net.
a.b.c     IN TXT \"deep\"
*.wild    IN A   192.0.2.7
$SCOPE 10.0.0.0/8
www       IN A   10.0.0.1
internal  IN A   10.0.0.2
$SCOPE default
www       IN A   93.184.216.34
www       IN TXT \"hello\"
$SCOPE 10.0.0.0/8
internal2 IN A   10.0.0.3
$SCOPE default
internal2 IN TXT \"public\"
";

    ////////////////////////////////////////////////////////////////////
    // HELPERS                                                        //
    ////////////////////////////////////////////////////////////////////

    fn zones(text: &str) -> Arc<ZoneStore> {
        let origin: Name = "example.com.".parse().unwrap();
        let mut zone = Zone::new(origin.clone(), Class::IN);
        for parsed in Parser::new(text.as_bytes()).with_origin(origin) {
            let parsed = parsed.unwrap();
            zone.add(&parsed.record, parsed.scope, parsed.block).unwrap();
        }
        let mut store = ZoneStore::new();
        store.insert(zone).unwrap();
        Arc::new(store)
    }

    fn server() -> Server {
        Server::new(zones(EXAMPLE_ZONE))
    }

    /// Builds a query. `edns` gives the UDP payload size of an OPT
    /// record to include.
    fn build_query(
        opcode: Opcode,
        qname: &str,
        qtype: Qtype,
        qclass: Qclass,
        edns: Option<u16>,
    ) -> Vec<u8> {
        let mut buf = vec![0; 512];
        let mut writer = Writer::new(&mut buf, 512).unwrap();
        writer.set_id(0xbeef);
        writer.set_opcode(opcode);
        writer.set_rd(true);
        let question = Question {
            qname: qname.parse().unwrap(),
            qtype,
            qclass,
        };
        writer.add_question(&question).unwrap();
        if let Some(size) = edns {
            writer.set_edns(size).unwrap();
        }
        let len = writer.finish();
        buf.truncate(len);
        buf
    }

    fn query(qname: &str, rr_type: Type) -> Vec<u8> {
        build_query(Opcode::QUERY, qname, rr_type.into(), Class::IN.into(), None)
    }

    fn handle(server: &Server, message: &[u8], client: &str, transport: Transport) -> Option<Vec<u8>> {
        let source = SocketAddr::new(client.parse().unwrap(), 49152);
        let mut buf = vec![0; MAX_TCP_MESSAGE_SIZE];
        match server.handle_message(message, ReceivedInfo::new(source, transport), &mut buf) {
            Response::Single(len) => {
                buf.truncate(len);
                Some(buf)
            }
            Response::None => None,
        }
    }

    fn udp(server: &Server, message: &[u8], client: &str) -> Parsed {
        Parsed::new(&handle(server, message, client, Transport::Udp).expect("no response"))
    }

    fn tcp(server: &Server, message: &[u8], client: &str) -> Parsed {
        Parsed::new(&handle(server, message, client, Transport::Tcp).expect("no response"))
    }

    #[derive(Debug)]
    struct Record {
        owner: Name,
        rr_type: Type,
        class: u16,
        ttl: u32,
        rdata: Vec<u8>,
    }

    /// A response, read back with [`Reader`].
    #[derive(Debug)]
    struct Parsed {
        len: usize,
        id: u16,
        aa: bool,
        tc: bool,
        rd: bool,
        rcode: Rcode,
        question: Option<Question>,
        answers: Vec<Record>,
        authority: Vec<Record>,
        additional: Vec<Record>,
    }

    impl Parsed {
        fn new(message: &[u8]) -> Self {
            let mut reader = Reader::try_from(message).unwrap();
            assert!(reader.qr());
            let question = if reader.qdcount() == 1 {
                Some(reader.read_question().unwrap())
            } else {
                None
            };
            let (ancount, nscount, arcount) = (reader.ancount(), reader.nscount(), reader.arcount());
            let mut read_section = |count: u16| -> Vec<Record> {
                (0..count)
                    .map(|_| {
                        let rr = reader.read_rr().unwrap();
                        Record {
                            owner: rr.owner,
                            rr_type: rr.rr_type,
                            class: rr.class.into(),
                            ttl: rr.ttl,
                            rdata: rr.rdata.to_vec(),
                        }
                    })
                    .collect()
            };
            let answers = read_section(ancount);
            let authority = read_section(nscount);
            let additional = read_section(arcount);
            assert!(reader.at_eom());
            Self {
                len: message.len(),
                id: reader.id(),
                aa: reader.aa(),
                tc: reader.tc(),
                rd: reader.rd(),
                rcode: reader.rcode(),
                question,
                answers,
                authority,
                additional,
            }
        }

        fn answer_addresses(&self) -> Vec<Ipv4Addr> {
            self.answers
                .iter()
                .filter(|rr| rr.rr_type == Type::A)
                .map(|rr| Ipv4Addr::new(rr.rdata[0], rr.rdata[1], rr.rdata[2], rr.rdata[3]))
                .collect()
        }

        fn answer_types(&self) -> Vec<Type> {
            self.answers.iter().map(|rr| rr.rr_type).collect()
        }

        fn opt(&self) -> Option<&Record> {
            self.additional.iter().find(|rr| rr.rr_type == Type::OPT)
        }
    }

    ////////////////////////////////////////////////////////////////////
    // GENERIC MESSAGE HANDLING TESTS                                 //
    ////////////////////////////////////////////////////////////////////

    #[test]
    fn set_edns_udp_payload_size_enforces_min() {
        let mut server = server();
        assert!(server.set_edns_udp_payload_size(256).is_err());
        assert!(server.set_edns_udp_payload_size(4096).is_ok());
        assert_eq!(server.edns_udp_payload_size(), 4096);
    }

    #[test]
    #[should_panic(expected = "the response buffer is not large enough")]
    fn handle_message_rejects_short_buffers_for_tcp() {
        let server = server();
        let received_info = ReceivedInfo::new((Ipv4Addr::LOCALHOST, 53).into(), Transport::Tcp);
        let mut not_quite_large_enough = vec![0; u16::MAX as usize - 1];
        server.handle_message(&[], received_info, &mut not_quite_large_enough);
    }

    #[test]
    #[should_panic(expected = "the response buffer is not large enough")]
    fn handle_message_rejects_short_buffers_for_udp() {
        let server = server();
        let received_info = ReceivedInfo::new((Ipv4Addr::LOCALHOST, 53).into(), Transport::Udp);
        let mut not_quite_large_enough = vec![0; server.edns_udp_payload_size() as usize - 1];
        server.handle_message(&[], received_info, &mut not_quite_large_enough);
    }

    #[test]
    fn received_info_constructor_canonicalizes_ipv4_mapped_ipv6_addrs() {
        let ipv4_mapped_ipv6 = "[::ffff:127.0.0.1]:53".parse().unwrap();
        let received_info = ReceivedInfo::new(ipv4_mapped_ipv6, Transport::Udp);
        assert_eq!(received_info.client(), IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        assert_eq!(received_info.source(), ipv4_mapped_ipv6);
    }

    #[test]
    fn short_messages_and_responses_are_ignored() {
        let server = server();
        assert_eq!(handle(&server, &[0; 11], "192.0.2.1", Transport::Udp), None);
        let mut message = query("www.example.com.", Type::A);
        message[2] |= 0x80;
        assert_eq!(handle(&server, &message, "192.0.2.1", Transport::Udp), None);
    }

    #[test]
    fn id_and_question_are_echoed() {
        let server = server();
        for (qname, rr_type) in [
            ("WwW.ExAmPlE.CoM.", Type::A),
            ("nothere.example.com.", Type::AAAA),
            ("www.example.org.", Type::MX),
        ] {
            let message = query(qname, rr_type);
            let response = udp(&server, &message, "203.0.113.9");
            assert_eq!(response.id, 0xbeef);
            assert!(response.rd);
            let question = response.question.unwrap();
            assert_eq!(question.qname.to_string(), qname);
            assert_eq!(question.qtype, Qtype::from(rr_type));
            assert_eq!(question.qclass, Qclass::from(Class::IN));
        }
    }

    #[test]
    fn missing_questions_are_formerr() {
        let server = server();
        let mut message = query("www.example.com.", Type::A);
        message.truncate(12);
        message[4..6].copy_from_slice(&[0, 0]);
        let response = udp(&server, &message, "192.0.2.1");
        assert_eq!(response.rcode, Rcode::FORMERR);
        assert!(response.question.is_none());
        assert!(!response.aa);
    }

    #[test]
    fn trailing_garbage_is_formerr() {
        let server = server();
        let mut message = query("www.example.com.", Type::A);
        message.push(0);
        let response = udp(&server, &message, "192.0.2.1");
        assert_eq!(response.rcode, Rcode::FORMERR);
        assert!(response.answers.is_empty());
    }

    #[test]
    fn unsupported_opcodes_are_notimp() {
        let server = server();
        let message = build_query(
            Opcode::NOTIFY,
            "example.com.",
            Type::SOA.into(),
            Class::IN.into(),
            None,
        );
        let response = udp(&server, &message, "192.0.2.1");
        assert_eq!(response.rcode, Rcode::NOTIMP);
        // RD is only copied for QUERY.
        assert!(!response.rd);
    }

    #[test]
    fn unsupported_qtypes_and_qclasses_are_rejected() {
        let server = server();
        let cases = [
            (Qtype::AXFR, Qclass::from(Class::IN), Rcode::NOTIMP),
            (Qtype::IXFR, Qclass::from(Class::IN), Rcode::NOTIMP),
            (Qtype::MAILB, Qclass::from(Class::IN), Rcode::NOTIMP),
            (Qtype::from(Type::A), Qclass::ANY, Rcode::NOTIMP),
            (Qtype::from(Type::A), Qclass::from(Class::CH), Rcode::NOTIMP),
            (Qtype::from(Type::A), Qclass::NONE, Rcode::NOTIMP),
        ];
        for (qtype, qclass, rcode) in cases {
            let message = build_query(Opcode::QUERY, "www.example.com.", qtype, qclass, None);
            let response = udp(&server, &message, "192.0.2.1");
            assert_eq!(response.rcode, rcode, "{qtype} {qclass}");
            assert!(!response.aa);
        }
    }

    ////////////////////////////////////////////////////////////////////
    // EDNS TESTS                                                     //
    ////////////////////////////////////////////////////////////////////

    #[test]
    fn edns_queries_get_edns_responses() {
        let server = server();
        let message = build_query(
            Opcode::QUERY,
            "www.example.com.",
            Type::A.into(),
            Class::IN.into(),
            Some(4096),
        );
        let response = udp(&server, &message, "192.0.2.1");
        assert_eq!(response.rcode, Rcode::NOERROR);
        let opt = response.opt().unwrap();
        assert!(opt.owner.is_root());
        assert_eq!(opt.class, 1232);
        assert_eq!(opt.ttl, 0);

        let plain = udp(&server, &query("www.example.com.", Type::A), "192.0.2.1");
        assert!(plain.opt().is_none());
    }

    #[test]
    fn unknown_edns_versions_are_badvers() {
        let server = server();
        let mut message = build_query(
            Opcode::QUERY,
            "www.example.com.",
            Type::A.into(),
            Class::IN.into(),
            Some(1232),
        );
        // The version is the second octet of the OPT TTL field.
        let version_offset = message.len() - 5;
        message[version_offset] = 1;
        let response = udp(&server, &message, "192.0.2.1");
        let opt = response.opt().unwrap();
        assert_eq!(response.rcode, Rcode::NOERROR);
        assert_eq!(opt.ttl >> 24, 1);
        assert!(response.answers.is_empty());
    }

    #[test]
    fn multiple_opt_records_are_formerr() {
        let server = server();
        let mut message = build_query(
            Opcode::QUERY,
            "www.example.com.",
            Type::A.into(),
            Class::IN.into(),
            Some(1232),
        );
        message.extend_from_slice(&[0, 0, 41, 0x04, 0xd0, 0, 0, 0, 0, 0, 0]);
        message[10..12].copy_from_slice(&2u16.to_be_bytes());
        let response = udp(&server, &message, "192.0.2.1");
        assert_eq!(response.rcode, Rcode::FORMERR);
    }

    #[test]
    fn compressed_names_in_the_additional_section_are_read() {
        // An A record owned by a pointer to the QNAME, which is shorter
        // than the pointer's offset.
        let mut message = query("www.example.com.", Type::A);
        message[10..12].copy_from_slice(&1u16.to_be_bytes());
        message.extend_from_slice(&[0xc0, 0x0c, 0, 1, 0, 1, 0, 0, 0, 0, 0, 4, 192, 0, 2, 1]);
        let response = udp(&server(), &message, "192.0.2.1");
        assert_eq!(response.rcode, Rcode::NOERROR);
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(93, 184, 216, 34)]);
    }

    #[test]
    fn opt_in_the_answer_section_is_formerr() {
        let server = server();
        let mut message = query("www.example.com.", Type::A);
        message.extend_from_slice(&[0, 0, 41, 0x04, 0xd0, 0, 0, 0, 0, 0, 0]);
        message[6..8].copy_from_slice(&1u16.to_be_bytes());
        let response = udp(&server, &message, "192.0.2.1");
        assert_eq!(response.rcode, Rcode::FORMERR);
    }

    ////////////////////////////////////////////////////////////////////
    // ANSWERING TESTS                                                //
    ////////////////////////////////////////////////////////////////////

    #[test]
    fn answers_depend_on_the_client_network() {
        let server = server();
        let message = query("www.example.com.", Type::A);
        let inside = udp(&server, &message, "10.0.0.5");
        assert!(inside.aa);
        assert_eq!(inside.rcode, Rcode::NOERROR);
        assert_eq!(inside.answer_addresses(), [Ipv4Addr::new(10, 0, 0, 1)]);
        let outside = udp(&server, &message, "203.0.113.9");
        assert_eq!(outside.answer_addresses(), [Ipv4Addr::new(93, 184, 216, 34)]);
        let mapped = udp(&server, &message, "::ffff:10.20.30.40");
        assert_eq!(mapped.answer_addresses(), [Ipv4Addr::new(10, 0, 0, 1)]);
    }

    #[test]
    fn names_outside_all_zones_are_refused() {
        let server = server();
        let response = udp(&server, &query("www.example.org.", Type::A), "10.0.0.5");
        assert_eq!(response.rcode, Rcode::REFUSED);
        assert!(!response.aa);
        assert!(response.answers.is_empty());
        assert!(response.authority.is_empty());
    }

    #[test]
    fn missing_types_are_nodata_with_soa() {
        let server = server();
        let response = udp(&server, &query("www.example.com.", Type::MX), "10.0.0.5");
        assert_eq!(response.rcode, Rcode::NOERROR);
        assert!(response.aa);
        assert!(response.answers.is_empty());
        assert_eq!(response.authority.len(), 1);
        let soa = &response.authority[0];
        assert_eq!(soa.rr_type, Type::SOA);
        assert_eq!(soa.owner, "example.com.".parse().unwrap());
        // min(SOA TTL, MINIMUM)
        assert_eq!(soa.ttl, 300);
    }

    #[test]
    fn missing_names_are_nxdomain_with_soa() {
        let server = server();
        let response = udp(&server, &query("nothere.example.com.", Type::A), "10.0.0.5");
        assert_eq!(response.rcode, Rcode::NXDOMAIN);
        assert!(response.aa);
        assert_eq!(response.authority.len(), 1);
        assert_eq!(response.authority[0].rr_type, Type::SOA);
    }

    #[test]
    fn empty_non_terminals_are_nodata() {
        let server = server();
        let response = udp(&server, &query("b.c.example.com.", Type::A), "10.0.0.5");
        assert_eq!(response.rcode, Rcode::NOERROR);
        assert!(response.answers.is_empty());
    }

    #[test]
    fn unanswerable_names_look_nonexistent() {
        let server = server();
        let message = query("internal.example.com.", Type::A);
        let inside = udp(&server, &message, "10.9.8.7");
        assert_eq!(inside.answer_addresses(), [Ipv4Addr::new(10, 0, 0, 2)]);
        let outside = udp(&server, &message, "198.51.100.1");
        assert_eq!(outside.rcode, Rcode::NXDOMAIN);
        assert!(outside.answers.is_empty());
    }

    #[test]
    fn partially_visible_names_are_nodata() {
        let server = server();
        let response = udp(&server, &query("internal2.example.com.", Type::A), "198.51.100.1");
        assert_eq!(response.rcode, Rcode::NOERROR);
        assert!(response.answers.is_empty());
        assert_eq!(response.authority.len(), 1);
    }

    #[test]
    fn cnames_are_followed_one_hop() {
        let server = server();
        let response = udp(&server, &query("alias.example.com.", Type::A), "10.0.0.5");
        assert_eq!(response.rcode, Rcode::NOERROR);
        assert_eq!(response.answer_types(), [Type::CNAME, Type::A]);
        assert_eq!(response.answers[1].owner, "www.example.com.".parse().unwrap());
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(10, 0, 0, 1)]);

        let two_hops = udp(&server, &query("alias2.example.com.", Type::A), "10.0.0.5");
        assert_eq!(two_hops.rcode, Rcode::NOERROR);
        assert_eq!(two_hops.answer_types(), [Type::CNAME, Type::CNAME]);
    }

    const SCOPED_CNAME_ZONE: &str = "\
$SCOPE 10.0.0.0/8
www IN CNAME cdn
$SCOPE default
www IN A     93.184.216.34
www IN TXT   \"public\"
cdn IN A     192.0.2.80
$SCOPE 10.1.0.0/16
www IN A     10.1.0.1
";

    #[test]
    fn scoped_cnames_beat_less_specific_data() {
        let server = Server::new(zones(SCOPED_CNAME_ZONE));
        let message = query("www.example.com.", Type::A);
        let response = udp(&server, &message, "10.0.0.5");
        assert_eq!(response.answer_types(), [Type::CNAME, Type::A]);
        assert_eq!(response.answers[1].owner, "cdn.example.com.".parse().unwrap());
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(192, 0, 2, 80)]);

        let response = udp(&server, &query("www.example.com.", Type::TXT), "10.0.0.5");
        assert_eq!(response.answer_types(), [Type::CNAME]);

        // A more specific network brings the address back, and outside
        // the CNAME's network the default data answers.
        let response = udp(&server, &message, "10.1.2.3");
        assert_eq!(response.answer_types(), [Type::A]);
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(10, 1, 0, 1)]);
        let response = udp(&server, &message, "192.0.2.1");
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(93, 184, 216, 34)]);
    }

    #[test]
    fn any_queries_apply_cname_precedence() {
        let server = Server::new(zones(SCOPED_CNAME_ZONE));
        let message = build_query(
            Opcode::QUERY,
            "www.example.com.",
            Qtype::ANY,
            Class::IN.into(),
            None,
        );
        let response = udp(&server, &message, "10.0.0.5");
        assert_eq!(response.answer_types(), [Type::CNAME]);
        let response = udp(&server, &message, "10.1.2.3");
        assert_eq!(response.answer_types(), [Type::A]);
        let response = udp(&server, &message, "192.0.2.1");
        assert_eq!(response.answer_types(), [Type::A, Type::TXT]);
    }

    #[test]
    fn cname_targets_use_the_same_precedence() {
        let text = "\
alias IN CNAME www
$SCOPE 10.0.0.0/8
www   IN CNAME cdn
$SCOPE default
www   IN A     93.184.216.34
cdn   IN A     192.0.2.80
";
        let server = Server::new(zones(text));
        let message = query("alias.example.com.", Type::A);
        let response = udp(&server, &message, "10.0.0.5");
        assert_eq!(response.answer_types(), [Type::CNAME, Type::CNAME]);
        assert_eq!(response.answers[1].owner, "www.example.com.".parse().unwrap());
        let response = udp(&server, &message, "192.0.2.1");
        assert_eq!(response.answer_types(), [Type::CNAME, Type::A]);
    }

    #[test]
    fn region_scopes_follow_the_region_table() {
        let text = "\
$SCOPE default
www IN A 93.184.216.34
$SCOPE CN
www IN A 192.0.2.86
$SCOPE 1.2.0.0/16
www IN A 192.0.2.12
";
        let server = Server::new(zones(text));
        let message = query("www.example.com.", Type::A);
        let response = udp(&server, &message, "1.1.1.1");
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(93, 184, 216, 34)]);

        let mut regions = RegionTable::new();
        regions.insert("1.0.0.0/8".parse().unwrap(), "CN".parse().unwrap());
        server.set_regions(Arc::new(regions));
        let response = udp(&server, &message, "1.1.1.1");
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(192, 0, 2, 86)]);
        let response = udp(&server, &message, "::ffff:1.1.1.1");
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(192, 0, 2, 86)]);
        let response = udp(&server, &message, "1.2.3.4");
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(192, 0, 2, 12)]);
        let response = udp(&server, &message, "8.8.8.8");
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(93, 184, 216, 34)]);
    }

    #[test]
    fn cnames_out_of_zone_are_not_followed() {
        let server = server();
        let response = udp(&server, &query("external.example.com.", Type::A), "10.0.0.5");
        assert_eq!(response.rcode, Rcode::NOERROR);
        assert_eq!(response.answer_types(), [Type::CNAME]);
    }

    #[test]
    fn cname_queries_return_the_cname_itself() {
        let server = server();
        let response = udp(&server, &query("alias.example.com.", Type::CNAME), "10.0.0.5");
        assert_eq!(response.answer_types(), [Type::CNAME]);
    }

    #[test]
    fn any_queries_return_every_visible_type() {
        let server = server();
        let message = build_query(
            Opcode::QUERY,
            "example.com.",
            Qtype::ANY,
            Class::IN.into(),
            None,
        );
        let response = udp(&server, &message, "192.0.2.1");
        assert_eq!(response.answer_types(), [Type::NS, Type::SOA]);

        let message = build_query(
            Opcode::QUERY,
            "www.example.com.",
            Qtype::ANY,
            Class::IN.into(),
            None,
        );
        let response = udp(&server, &message, "10.0.0.5");
        assert_eq!(response.answer_types(), [Type::A, Type::TXT]);
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(10, 0, 0, 1)]);
    }

    #[test]
    fn wildcards_require_glob() {
        let mut server = server();
        let message = query("host.wild.example.com.", Type::A);
        let response = udp(&server, &message, "192.0.2.1");
        assert_eq!(response.rcode, Rcode::NXDOMAIN);

        server.set_glob(true);
        let response = udp(&server, &message, "192.0.2.1");
        assert_eq!(response.rcode, Rcode::NOERROR);
        assert_eq!(response.answers[0].owner, "host.wild.example.com.".parse().unwrap());
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(192, 0, 2, 7)]);
    }

    #[test]
    fn reloaded_zones_are_used() {
        let server = server();
        let message = query("www.example.com.", Type::A);
        server.set_zones(zones("www A 198.51.100.80\n"));
        let response = udp(&server, &message, "10.0.0.5");
        assert_eq!(response.answer_addresses(), [Ipv4Addr::new(198, 51, 100, 80)]);
    }

    ////////////////////////////////////////////////////////////////////
    // TRUNCATION TESTS                                               //
    ////////////////////////////////////////////////////////////////////

    fn big_zone(n_records: usize, rdata: impl Fn(usize) -> String) -> Server {
        let mut text = String::new();
        for i in 0..n_records {
            text.push_str(&format!("big {}\n", rdata(i)));
        }
        Server::new(zones(&text))
    }

    #[test]
    fn udp_answers_are_truncated_but_tcp_answers_are_not() {
        let server = big_zone(40, |i| format!("A 192.0.2.{}", i + 1));
        let message = query("big.example.com.", Type::A);

        let over_udp = udp(&server, &message, "192.0.2.1");
        assert!(over_udp.tc);
        assert!(over_udp.len <= 512);
        assert!(!over_udp.answers.is_empty() && over_udp.answers.len() < 40);

        let over_tcp = tcp(&server, &message, "192.0.2.1");
        assert!(!over_tcp.tc);
        assert_eq!(over_tcp.answers.len(), 40);
        assert_eq!(over_tcp.rcode, Rcode::NOERROR);
    }

    #[test]
    fn edns_raises_the_udp_limit() {
        let server = big_zone(40, |i| format!("A 192.0.2.{}", i + 1));
        let message = build_query(
            Opcode::QUERY,
            "big.example.com.",
            Type::A.into(),
            Class::IN.into(),
            Some(4096),
        );
        let response = udp(&server, &message, "192.0.2.1");
        assert!(!response.tc);
        assert_eq!(response.answers.len(), 40);

        // Payload sizes below 512 are treated as 512.
        let message = build_query(
            Opcode::QUERY,
            "big.example.com.",
            Type::A.into(),
            Class::IN.into(),
            Some(100),
        );
        let response = udp(&server, &message, "192.0.2.1");
        assert!(response.tc);
        assert!(response.len <= 512 && response.len > 400);
    }

    #[test]
    fn tcp_overflow_is_servfail() {
        let server = big_zone(300, |i| format!("TXT \"{:03}{}\"", i, "x".repeat(240)));
        let message = query("big.example.com.", Type::TXT);
        let response = tcp(&server, &message, "192.0.2.1");
        assert_eq!(response.rcode, Rcode::SERVFAIL);
        assert!(!response.aa);
        assert!(response.answers.is_empty());
        assert!(response.question.is_some());
    }
}
