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

//! Implementation of the [`Error`] type for zone-related errors.

use std::fmt;

use crate::geo::GeoScope;

/// Errors that arise when adding records to a [`Zone`](super::Zone) or
/// an [`AnswerSet`](super::AnswerSet).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    NotInZone,
    ClassMismatch,
    TtlMismatch,
    DuplicateScope(GeoScope),
    CnameConflict,
    MultipleCnames,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NotInZone => f.write_str("the record's owner is not within the zone"),
            Self::ClassMismatch => {
                f.write_str("the record's class does not match the zone's class")
            }
            Self::TtlMismatch => f.write_str(
                "the record's TTL does not match the TTL of existing records in the same RRset",
            ),
            Self::DuplicateScope(scope) => write!(
                f,
                "records for this owner and type in scope {} were already declared \
                 in another $SCOPE block",
                scope,
            ),
            Self::CnameConflict => f.write_str(
                "a CNAME record cannot coexist with other records at the same owner and scope",
            ),
            Self::MultipleCnames => {
                f.write_str("an owner cannot have more than one CNAME record per scope")
            }
        }
    }
}

impl std::error::Error for Error {}
