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

//! Implementation of the [`AnswerSet`] structure.

use super::Error;
use crate::geo::GeoScope;
use crate::rr::{Class, Rdata, Rrset, Ttl, Type};

/// The candidate answers for a single owner and type, one [`Rrset`] per
/// [`GeoScope`].
///
/// Candidates are kept ordered by specificity: longer prefixes come
/// first, candidates with equal prefix lengths stay in the order they
/// were added, and the default candidate (if any) comes last. Each
/// scope appears at most once.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AnswerSet {
    rr_type: Type,
    candidates: Vec<Candidate>,
}

/// One candidate of an [`AnswerSet`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Candidate {
    pub scope: GeoScope,
    pub rrset: Rrset,

    /// The `$SCOPE` block the candidate's records came from, when it
    /// was loaded from a zone file.
    block: Option<usize>,
}

impl AnswerSet {
    pub fn new(rr_type: Type) -> Self {
        Self {
            rr_type,
            candidates: Vec::new(),
        }
    }

    pub fn rr_type(&self) -> Type {
        self.rr_type
    }

    /// Returns the candidates in order of decreasing specificity.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Returns the candidate for `scope`, if there is one.
    pub fn get(&self, scope: &GeoScope) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.scope == *scope)
    }

    /// Returns the total number of records across all candidates.
    pub fn record_count(&self) -> usize {
        self.candidates.iter().map(|c| c.rrset.len()).sum()
    }

    /// Adds a complete candidate. Fails with [`Error::DuplicateScope`]
    /// if a candidate for `scope` already exists.
    pub fn insert(&mut self, scope: GeoScope, rrset: Rrset) -> Result<(), Error> {
        if self.get(&scope).is_some() {
            return Err(Error::DuplicateScope(scope));
        }
        self.insert_candidate(Candidate {
            scope,
            rrset,
            block: None,
        });
        Ok(())
    }

    /// Adds a single record read from `$SCOPE` block `block` of a zone
    /// file.
    ///
    /// Records for one scope must all come from the same block and
    /// share a TTL. Duplicate RDATA is silently dropped. A CNAME
    /// candidate may hold only one record.
    pub(super) fn add_record(
        &mut self,
        scope: GeoScope,
        block: usize,
        class: Class,
        ttl: Ttl,
        rdata: Rdata,
    ) -> Result<(), Error> {
        let rr_type = self.rr_type;
        if let Some(candidate) = self.candidates.iter_mut().find(|c| c.scope == scope) {
            if candidate.block != Some(block) {
                return Err(Error::DuplicateScope(scope));
            } else if candidate.rrset.ttl != ttl {
                return Err(Error::TtlMismatch);
            }
            let was_empty = candidate.rrset.is_empty();
            if candidate.rrset.push_rdata(rdata) && rr_type == Type::CNAME && !was_empty {
                return Err(Error::MultipleCnames);
            }
        } else {
            let mut rrset = Rrset::new(rr_type, class, ttl);
            rrset.push_rdata(rdata);
            self.insert_candidate(Candidate {
                scope,
                rrset,
                block: Some(block),
            });
        }
        Ok(())
    }

    fn insert_candidate(&mut self, candidate: Candidate) {
        let specificity = candidate.scope.specificity();
        let index = self
            .candidates
            .iter()
            .position(|c| c.scope.specificity() < specificity)
            .unwrap_or(self.candidates.len());
        self.candidates.insert(index, candidate);
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
