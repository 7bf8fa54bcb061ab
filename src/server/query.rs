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

//! Handling of DNS QUERY messages.

use super::{Context, ProcessingError, ProcessingResult, Server, Transport};
use crate::geo::{select, Client, Selection};
use crate::message::{writer, Qclass, Qtype, Question, Rcode, Writer};
use crate::name::Name;
use crate::rr::{Class, Rdata, Rrset, Ttl, Type};
use crate::zone::{Node, Zone};

impl Server {
    /// Handles a DNS message with opcode QUERY.
    pub(super) fn handle_query(&self, context: &mut Context) {
        let question = match context.question {
            Some(ref q) => q.clone(),
            None => {
                context.response.set_rcode(Rcode::FORMERR);
                return;
            }
        };

        // Zone transfers and the obsolete mailbox QTYPEs are not
        // supported.
        if question.qtype.is_unsupported_meta() {
            context.response.set_rcode(Rcode::NOTIMP);
            return;
        }

        // Only IN data is served. QCLASS * (ANY) and the other classes
        // are not implemented.
        if question.qclass == Qclass::ANY || Class::from(question.qclass) != Class::IN {
            context.response.set_rcode(Rcode::NOTIMP);
            return;
        }

        // Find which zone (if any) is the longest match for the QNAME.
        let zones = context.zones;
        let zone = match zones.lookup(&question.qname) {
            Some(zone) => zone,
            None => {
                context.response.set_rcode(Rcode::REFUSED);
                return;
            }
        };

        let result = if question.qtype == Qtype::ANY {
            self.answer_any(zone, &question, context)
        } else {
            self.answer(zone, &question, context)
        };

        match result {
            Ok(()) => (),
            Err(ProcessingError::ServFail) => {
                context.response.set_aa(false);
                context.response.set_rcode(Rcode::SERVFAIL);
                context.response.clear_rrs();
            }
            Err(ProcessingError::Truncation) => {
                if context.received_info.transport == Transport::Tcp {
                    // We can't ask the client to retry over TCP, since
                    // we are already over TCP.
                    context.response.clear_rrs();
                    context.response.set_aa(false);
                    context.response.set_rcode(Rcode::SERVFAIL);
                } else {
                    // Whatever fit stays in the message.
                    context.response.set_tc(true);
                }
            }
        }
    }

    /// Answers a query for a specific RR type once the appropriate zone
    /// to search has been determined.
    fn answer(
        &self,
        zone: &Zone,
        question: &Question,
        context: &mut Context,
    ) -> ProcessingResult<()> {
        let client = context.client;
        let qname = &question.qname;
        let rr_type = Type::from(question.qtype);
        context.response.set_aa(true);

        let node = match self.find_node(zone, qname) {
            Some(node) => node,
            None => {
                context.response.set_rcode(Rcode::NXDOMAIN);
                return add_negative_caching_soa(zone, &client, &mut context.response);
            }
        };

        match select_answer(node, rr_type, &client) {
            Some(Answer::Direct(selection)) => {
                context.scope = Some(*selection.scope);
                return add_answer_rrset(&mut context.response, qname, selection.rrset)
                    .map_err(Into::into);
            }
            Some(Answer::Alias(selection)) => {
                context.scope = Some(*selection.scope);
                add_answer_rrset(&mut context.response, qname, selection.rrset)?;
                return self.follow_cname(zone, selection.rrset, rr_type, &client, context);
            }
            None => (),
        }

        // Nothing was selected. The name still exists for this client if
        // some other answer set at it has something to offer (or it is
        // an empty non-terminal); otherwise, as far as this client can
        // tell, it does not exist.
        if !is_visible(node, &client) {
            context.response.set_rcode(Rcode::NXDOMAIN);
        }
        add_negative_caching_soa(zone, &client, &mut context.response)
    }

    /// Answers a query with QTYPE * (ANY) once the appropriate zone to
    /// search has been determined. Every answer set at the name that
    /// selects something for the client is included, in type order.
    ///
    /// A CNAME selected for the client hides the other types whose
    /// selections are no more specific than it, exactly as it would
    /// for queries of those types. If nothing more specific remains,
    /// the CNAME alone is the answer.
    fn answer_any(
        &self,
        zone: &Zone,
        question: &Question,
        context: &mut Context,
    ) -> ProcessingResult<()> {
        let client = context.client;
        let qname = &question.qname;
        context.response.set_aa(true);

        let node = match self.find_node(zone, qname) {
            Some(node) => node,
            None => {
                context.response.set_rcode(Rcode::NXDOMAIN);
                return add_negative_caching_soa(zone, &client, &mut context.response);
            }
        };

        let alias = select_at(node, Type::CNAME, &client);
        let floor = alias.map(|alias| alias.scope.specificity());
        let mut selections: Vec<Selection> = node
            .answer_sets()
            .iter()
            .filter(|answer_set| answer_set.rr_type() != Type::CNAME)
            .filter_map(|answer_set| select(answer_set, &client))
            .filter(|selection| {
                floor.map_or(true, |floor| selection.scope.specificity() > floor)
            })
            .collect();
        if selections.is_empty() {
            selections.extend(alias);
        }

        for selection in &selections {
            context.scope.get_or_insert(*selection.scope);
            add_answer_rrset(&mut context.response, qname, selection.rrset)?;
        }
        if selections.is_empty() {
            if !node.is_empty() {
                context.response.set_rcode(Rcode::NXDOMAIN);
            }
            add_negative_caching_soa(zone, &client, &mut context.response)?;
        }
        Ok(())
    }

    /// Follows a CNAME by exactly one hop.
    ///
    /// The target is looked up in the same zone (not in other zones we
    /// may serve, since resolvers are unlikely to trust such data), for
    /// the same client. Whatever the target would answer for the
    /// requested type is added after the CNAME: its records of that
    /// type, or its own CNAME, which is left for the resolver to chase.
    /// The RCODE stays NOERROR whatever the lookup finds.
    fn follow_cname(
        &self,
        zone: &Zone,
        cname_rrset: &Rrset,
        rr_type: Type,
        client: &Client,
        context: &mut Context,
    ) -> ProcessingResult<()> {
        let rdata = cname_rrset
            .rdatas()
            .first()
            .ok_or(ProcessingError::ServFail)?;
        let target = read_name_from_rdata(rdata, 0)?;
        if !target.eq_or_subdomain_of(zone.origin()) {
            return Ok(());
        }
        match self
            .find_node(zone, &target)
            .and_then(|node| select_answer(node, rr_type, client))
        {
            Some(Answer::Direct(selection) | Answer::Alias(selection)) => {
                add_answer_rrset(&mut context.response, &target, selection.rrset)
                    .map_err(Into::into)
            }
            None => Ok(()),
        }
    }

    /// Finds the node answering for `name`: the node of that name, or,
    /// when wildcards are enabled and no such node exists, the wildcard
    /// node synthesizing answers for it.
    fn find_node<'z>(&self, zone: &'z Zone, name: &Name) -> Option<&'z Node> {
        zone.node(name).or_else(|| {
            if self.glob {
                zone.wildcard_source(name)
            } else {
                None
            }
        })
    }
}

////////////////////////////////////////////////////////////////////////
// HELPERS                                                            //
////////////////////////////////////////////////////////////////////////

/// What a node answers for a query of some type.
enum Answer<'a> {
    /// Records of the queried type.
    Direct(Selection<'a>),

    /// A CNAME standing in for the queried type.
    Alias(Selection<'a>),
}

/// Picks what `node` answers for a query of `rr_type` from `client`.
///
/// A CNAME and other data may coexist at a name as long as their scopes
/// differ, so the CNAME selected for the client competes with the
/// selection for `rr_type`: the more specific scope wins, and the CNAME
/// wins when there is no selection for `rr_type` at all.
fn select_answer<'a>(node: &'a Node, rr_type: Type, client: &Client) -> Option<Answer<'a>> {
    let direct = select_at(node, rr_type, client);
    if rr_type != Type::CNAME {
        if let Some(alias) = select_at(node, Type::CNAME, client) {
            let beats_direct = direct.map_or(true, |direct| {
                alias.scope.specificity() > direct.scope.specificity()
            });
            if beats_direct {
                return Some(Answer::Alias(alias));
            }
        }
    }
    direct.map(Answer::Direct)
}

/// Selects the candidate of the `rr_type` answer set at `node` for
/// `client`, if there is such an answer set and it selects anything.
fn select_at<'a>(node: &'a Node, rr_type: Type, client: &Client) -> Option<Selection<'a>> {
    node.answer_set(rr_type)
        .and_then(|answer_set| select(answer_set, client))
}

/// Returns whether any data at `node` is visible to `client`. Empty
/// non-terminals are always visible, since they exist for everyone.
fn is_visible(node: &Node, client: &Client) -> bool {
    node.is_empty()
        || node
            .answer_sets()
            .iter()
            .any(|answer_set| select(answer_set, client).is_some())
}

/// Adds the records of `rrset` to the answer section one by one, with
/// `owner` as their owner. On truncation, the records that fit remain.
fn add_answer_rrset(response: &mut Writer, owner: &Name, rrset: &Rrset) -> writer::Result<()> {
    for rdata in rrset.rdatas() {
        response.add_answer_rr(owner, rrset.rr_type, rrset.class, rrset.ttl, rdata)?;
    }
    Ok(())
}

/// Adds the SOA record of `zone` selected for `client` to the authority
/// section of `response` for negative caching ([RFC 2308 § 3]). If the
/// zone has no SOA record for this client, nothing is added.
///
/// [RFC 2308 § 3]: https://datatracker.ietf.org/doc/html/rfc2308#section-3
fn add_negative_caching_soa(
    zone: &Zone,
    client: &Client,
    response: &mut Writer,
) -> ProcessingResult<()> {
    let selection = match zone.soa().and_then(|soa| select(soa, client)) {
        Some(selection) => selection,
        None => return Ok(()),
    };
    let soa_rdata = selection
        .rrset
        .rdatas()
        .first()
        .ok_or(ProcessingError::ServFail)?;

    // Per RFC 2308 § 3, the TTL is the minimum of the SOA record's own
    // TTL and its MINIMUM field.
    let minimum = read_soa_minimum(soa_rdata)?;
    let ttl = Ttl::from(u32::from(selection.rrset.ttl).min(minimum));
    response
        .add_authority_rr(zone.origin(), Type::SOA, zone.class(), ttl, soa_rdata)
        .map_err(Into::into)
}

/// Reads the MINIMUM field from the provided SOA RDATA.
fn read_soa_minimum(rdata: &Rdata) -> ProcessingResult<u32> {
    let mname_len =
        Name::validate_uncompressed(rdata.octets()).or(Err(ProcessingError::ServFail))?;
    let rname_len = Name::validate_uncompressed(&rdata.octets()[mname_len..])
        .or(Err(ProcessingError::ServFail))?;
    let octets = rdata
        .octets()
        .get(mname_len + rname_len + 16..)
        .ok_or(ProcessingError::ServFail)?;
    let array: [u8; 4] = octets.try_into().or(Err(ProcessingError::ServFail))?;
    Ok(u32::from_be_bytes(array))
}

/// Reads a serialized domain name from `rdata`, starting at `start`.
fn read_name_from_rdata(rdata: &Rdata, start: usize) -> ProcessingResult<Name> {
    rdata
        .octets()
        .get(start..)
        .map(Name::try_from_uncompressed)
        .and_then(Result::ok)
        .map(|(name, _)| name)
        .ok_or(ProcessingError::ServFail)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
