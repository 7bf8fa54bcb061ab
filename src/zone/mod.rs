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

//! Implementation of DNS zone data structures, for keeping geo-scoped
//! zones loaded in memory.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::geo::{GeoScope, Region};
use crate::name::Name;
use crate::rr::{Class, ResourceRecord, Type};

mod answer_set;
mod error;
mod load;
mod store;
pub use answer_set::{AnswerSet, Candidate};
pub use error::Error;
pub use load::{load_dir, load_file, LoadError, LoadErrorKind};
pub use store::ZoneStore;

/// A DNS zone loaded into memory.
///
/// A `Zone` maps each owner name to a [`Node`], which holds one
/// [`AnswerSet`] per record type. Nodes also exist for the empty
/// non-terminals between the apex and every owner, so that
/// [`Zone::node`] tells whether a name exists in the zone as described
/// in [RFC 1034 § 4.3.2].
///
/// `Zone`s are constructed with [`Zone::new`], which provides an empty
/// structure, and subsequent calls to [`Zone::add`], which adds
/// resource records to the zone.
///
/// [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Zone {
    origin: Name,
    class: Class,
    nodes: HashMap<Name, Node>,
}

/// A name that exists in a [`Zone`], with its answer sets ordered by
/// type. An empty non-terminal has none.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Node {
    answer_sets: Vec<AnswerSet>,
}

impl Zone {
    /// Creates a new `Zone` with the specified origin and class. The
    /// zone is initially empty.
    pub fn new(origin: Name, class: Class) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(origin.clone(), Node::default());
        Self {
            origin,
            class,
            nodes,
        }
    }

    pub fn origin(&self) -> &Name {
        &self.origin
    }

    pub fn class(&self) -> Class {
        self.class
    }

    /// Adds a record declared with `scope` in `$SCOPE` block `block`.
    ///
    /// Besides the class, TTL, and scope checks performed by the
    /// [`AnswerSet`], this enforces that a CNAME does not share an
    /// owner and scope with any other data ([RFC 1034 § 3.6.2]).
    ///
    /// [RFC 1034 § 3.6.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-3.6.2
    pub fn add(
        &mut self,
        record: &ResourceRecord,
        scope: GeoScope,
        block: usize,
    ) -> Result<(), Error> {
        if !record.owner.eq_or_subdomain_of(&self.origin) {
            return Err(Error::NotInZone);
        } else if record.class != self.class {
            return Err(Error::ClassMismatch);
        }

        if let Some(node) = self.nodes.get(&record.owner) {
            let conflict = node.answer_sets.iter().any(|answer_set| {
                (answer_set.rr_type() == Type::CNAME) != (record.rr_type == Type::CNAME)
                    && answer_set.get(&scope).is_some()
            });
            if conflict {
                return Err(Error::CnameConflict);
            }
        }

        self.add_ancestors(&record.owner);
        let node = self.nodes.entry(record.owner.clone()).or_default();
        node.answer_set_mut(record.rr_type).add_record(
            scope,
            block,
            record.class,
            record.ttl,
            record.rdata.clone(),
        )
    }

    /// Creates empty nodes for the names strictly between the origin and
    /// `owner`.
    fn add_ancestors(&mut self, owner: &Name) {
        let depth = owner.label_count() - self.origin.label_count();
        for skip in 1..depth {
            if let Some(ancestor) = owner.superdomain(skip) {
                self.nodes.entry(ancestor).or_default();
            }
        }
    }

    /// Returns the node for `name`, if `name` exists in the zone.
    pub fn node(&self, name: &Name) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn answer_set(&self, name: &Name, rr_type: Type) -> Option<&AnswerSet> {
        self.node(name).and_then(|node| node.answer_set(rr_type))
    }

    /// Returns the SOA answer set at the apex.
    pub fn soa(&self) -> Option<&AnswerSet> {
        self.answer_set(&self.origin, Type::SOA)
    }

    /// Finds the wildcard node that synthesizes answers for `qname`, a
    /// name in the zone that does not itself exist. Per
    /// [RFC 4592 § 3.3.1], this is the `*` child of the closest
    /// existing ancestor of `qname`, if that child exists.
    ///
    /// [RFC 4592 § 3.3.1]: https://datatracker.ietf.org/doc/html/rfc4592#section-3.3.1
    pub fn wildcard_source(&self, qname: &Name) -> Option<&Node> {
        if !qname.eq_or_subdomain_of(&self.origin) || self.nodes.contains_key(qname) {
            return None;
        }
        let depth = qname.label_count() - self.origin.label_count();
        for skip in 1..=depth {
            let ancestor = qname.superdomain(skip)?;
            if self.nodes.contains_key(&ancestor) {
                let wildcard = ancestor.prepend_label(b"*").ok()?;
                return self.nodes.get(&wildcard);
            }
        }
        None
    }

    /// Returns every record in the zone with its scope, in canonical
    /// owner order, then type order, then candidate order.
    pub fn records(&self) -> Vec<(GeoScope, ResourceRecord)> {
        let mut owners: Vec<&Name> = self.nodes.keys().collect();
        owners.sort();
        let mut records = Vec::new();
        for owner in owners {
            for answer_set in &self.nodes[owner].answer_sets {
                for candidate in answer_set.candidates() {
                    let rrset = &candidate.rrset;
                    for rdata in rrset.rdatas() {
                        records.push((
                            candidate.scope,
                            ResourceRecord {
                                owner: owner.clone(),
                                rr_type: rrset.rr_type,
                                class: rrset.class,
                                ttl: rrset.ttl,
                                rdata: rdata.clone(),
                            },
                        ));
                    }
                }
            }
        }
        records
    }

    /// Returns the number of records in the zone.
    pub fn record_count(&self) -> usize {
        self.nodes
            .values()
            .flat_map(|node| node.answer_sets.iter())
            .map(AnswerSet::record_count)
            .sum()
    }

    /// Returns the number of distinct network scopes used in the zone.
    pub fn network_scope_count(&self) -> usize {
        self.nodes
            .values()
            .flat_map(|node| node.answer_sets.iter())
            .flat_map(|answer_set| answer_set.candidates().iter())
            .map(|candidate| &candidate.scope)
            .filter(|scope| matches!(scope, GeoScope::Network(_)))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Returns the regions named by the zone's region scopes.
    pub fn regions(&self) -> BTreeSet<Region> {
        self.nodes
            .values()
            .flat_map(|node| node.answer_sets.iter())
            .flat_map(|answer_set| answer_set.candidates().iter())
            .filter_map(|candidate| match candidate.scope {
                GeoScope::Region(region) => Some(region),
                _ => None,
            })
            .collect()
    }
}

impl Node {
    /// Returns the node's answer sets in type order.
    pub fn answer_sets(&self) -> &[AnswerSet] {
        &self.answer_sets
    }

    pub fn answer_set(&self, rr_type: Type) -> Option<&AnswerSet> {
        self.answer_sets
            .binary_search_by_key(&rr_type, AnswerSet::rr_type)
            .ok()
            .map(|index| &self.answer_sets[index])
    }

    /// Returns whether the node is an empty non-terminal.
    pub fn is_empty(&self) -> bool {
        self.answer_sets.is_empty()
    }

    fn answer_set_mut(&mut self, rr_type: Type) -> &mut AnswerSet {
        let index = match self
            .answer_sets
            .binary_search_by_key(&rr_type, AnswerSet::rr_type)
        {
            Ok(index) => index,
            Err(index) => {
                self.answer_sets.insert(index, AnswerSet::new(rr_type));
                index
            }
        };
        &mut self.answer_sets[index]
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::rr::{Rdata, Ttl};

    fn zone() -> Zone {
        Zone::new("example.".parse().unwrap(), Class::IN)
    }

    fn record(owner: &str, rr_type: Type, rdata: Rdata) -> ResourceRecord {
        ResourceRecord {
            owner: owner.parse().unwrap(),
            rr_type,
            class: Class::IN,
            ttl: Ttl::from(300),
            rdata,
        }
    }

    fn a(owner: &str) -> ResourceRecord {
        record(owner, Type::A, Rdata::from_ipv4(Ipv4Addr::new(192, 0, 2, 1)))
    }

    fn cname(owner: &str, target: &str) -> ResourceRecord {
        record(owner, Type::CNAME, Rdata::from_name(&target.parse().unwrap()))
    }

    #[test]
    fn out_of_zone_records_are_rejected() {
        assert_eq!(
            zone().add(&a("www.example.net."), GeoScope::Default, 0),
            Err(Error::NotInZone)
        );
    }

    #[test]
    fn class_must_match() {
        let mut rr = a("www.example.");
        rr.class = Class::CH;
        assert_eq!(zone().add(&rr, GeoScope::Default, 0), Err(Error::ClassMismatch));
    }

    #[test]
    fn empty_non_terminals_exist() {
        let mut zone = zone();
        zone.add(&a("a.b.c.example."), GeoScope::Default, 0).unwrap();
        for name in ["example.", "c.example.", "b.c.example."] {
            let node = zone.node(&name.parse().unwrap()).unwrap();
            assert!(node.is_empty(), "{name}");
        }
        assert!(zone.node(&"d.example.".parse().unwrap()).is_none());
    }

    #[test]
    fn cname_conflicts_are_per_scope() {
        let scope: GeoScope = "10.0.0.0/8".parse().unwrap();
        let mut zone = zone();
        zone.add(&a("www.example."), GeoScope::Default, 0).unwrap();
        zone.add(&cname("www.example.", "cdn.example."), scope, 1)
            .unwrap();
        assert_eq!(
            zone.add(&cname("www.example.", "other.example."), GeoScope::Default, 0),
            Err(Error::CnameConflict)
        );
        assert_eq!(
            zone.add(&a("www.example."), scope, 1),
            Err(Error::CnameConflict)
        );
    }

    #[test]
    fn answer_sets_are_kept_in_type_order() {
        let mut zone = zone();
        let aaaa = record(
            "example.",
            Type::AAAA,
            Rdata::from_ipv6("2001:db8::1".parse().unwrap()),
        );
        zone.add(&aaaa, GeoScope::Default, 0).unwrap();
        zone.add(&a("example."), GeoScope::Default, 0).unwrap();
        let node = zone.node(zone.origin()).unwrap();
        let types: Vec<Type> = node.answer_sets().iter().map(AnswerSet::rr_type).collect();
        assert_eq!(types, [Type::A, Type::AAAA]);
        assert!(node.answer_set(Type::MX).is_none());
        assert_eq!(zone.record_count(), 2);
    }

    #[test]
    fn wildcards_come_from_the_closest_encloser() {
        let mut zone = zone();
        zone.add(&a("*.example."), GeoScope::Default, 0).unwrap();
        zone.add(&a("host.sub.example."), GeoScope::Default, 0).unwrap();
        let lookup = |name: &str| zone.wildcard_source(&name.parse().unwrap()).is_some();
        assert!(lookup("anything.example."));
        assert!(lookup("a.b.example."));
        // The closest encloser of x.sub.example. is sub.example., which
        // has no wildcard child.
        assert!(!lookup("x.sub.example."));
        assert!(!lookup("sub.example."));
        assert!(!lookup("example.net."));
    }

    #[test]
    fn records_are_listed_in_canonical_order() {
        let mut zone = zone();
        zone.add(&a("b.example."), GeoScope::Default, 0).unwrap();
        zone.add(&a("a.example."), "10.0.0.0/8".parse().unwrap(), 1)
            .unwrap();
        zone.add(&a("a.example."), GeoScope::Default, 2).unwrap();
        let listing: Vec<String> = zone
            .records()
            .iter()
            .map(|(scope, rr)| format!("{} {}", scope, rr))
            .collect();
        assert_eq!(
            listing,
            [
                "10.0.0.0/8 a.example. 300 IN A 192.0.2.1",
                "default a.example. 300 IN A 192.0.2.1",
                "default b.example. 300 IN A 192.0.2.1",
            ]
        );
        assert_eq!(zone.network_scope_count(), 1);
    }

    #[test]
    fn scope_counts_tell_networks_from_regions() {
        let mut zone = zone();
        zone.add(&a("a.example."), "10.0.0.0/8".parse().unwrap(), 0)
            .unwrap();
        zone.add(&a("a.example."), "CN".parse().unwrap(), 1).unwrap();
        zone.add(&a("b.example."), "cn".parse().unwrap(), 2).unwrap();
        zone.add(&a("b.example."), "US".parse().unwrap(), 2).unwrap();
        assert_eq!(zone.network_scope_count(), 1);
        let regions: Vec<String> = zone.regions().iter().map(ToString::to_string).collect();
        assert_eq!(regions, ["CN", "US"]);
    }
}
