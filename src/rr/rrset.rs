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

//! Implementation of the [`Rrset`] and [`ResourceRecord`] structures.

use std::fmt;

use super::{Class, Rdata, Ttl, Type};
use crate::name::Name;

////////////////////////////////////////////////////////////////////////
// RESOURCE RECORDS                                                   //
////////////////////////////////////////////////////////////////////////

/// A single resource record, as produced by the zone file parser.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceRecord {
    pub owner: Name,
    pub rr_type: Type,
    pub class: Class,
    pub ttl: Ttl,
    pub rdata: Rdata,
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.owner,
            self.ttl,
            self.class,
            self.rr_type,
            self.rdata.display(self.rr_type),
        )
    }
}

////////////////////////////////////////////////////////////////////////
// RRSETS                                                             //
////////////////////////////////////////////////////////////////////////

/// Records sharing an owner, type, and class.
///
/// [RFC 2181 § 5.2] requires all records in an RRset to have the same
/// TTL, so the TTL is stored once. The owner is kept by whatever holds
/// the `Rrset`. RDATAs keep the order in which they were added.
///
/// [RFC 2181 § 5.2]: https://datatracker.ietf.org/doc/html/rfc2181#section-5.2
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rrset {
    pub rr_type: Type,
    pub class: Class,
    pub ttl: Ttl,
    rdatas: Vec<Rdata>,
}

impl Rrset {
    pub fn new(rr_type: Type, class: Class, ttl: Ttl) -> Self {
        Self {
            rr_type,
            class,
            ttl,
            rdatas: Vec::new(),
        }
    }

    /// Adds `rdata` unless an equivalent RDATA is already present (see
    /// [`Rdata::equivalent`]). Returns whether it was added.
    pub fn push_rdata(&mut self, rdata: Rdata) -> bool {
        if self
            .rdatas
            .iter()
            .any(|existing| existing.equivalent(&rdata, self.rr_type))
        {
            false
        } else {
            self.rdatas.push(rdata);
            true
        }
    }

    pub fn rdatas(&self) -> &[Rdata] {
        &self.rdatas
    }

    pub fn len(&self) -> usize {
        self.rdatas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rdatas.is_empty()
    }
}
