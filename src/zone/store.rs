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

//! Implementation of the [`ZoneStore`] structure.

use std::collections::HashMap;

use super::Zone;
use crate::name::Name;

/// The set of zones served, indexed by origin.
///
/// A `ZoneStore` is built once (usually by [`load_dir`](super::load_dir))
/// and is not modified afterward; reloading builds a new store.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ZoneStore {
    zones: HashMap<Name, Zone>,
}

impl ZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `zone` to the store. If a zone with the same origin is
    /// already present, the store is unchanged and `zone` is given back.
    pub fn insert(&mut self, zone: Zone) -> Result<(), Zone> {
        if self.zones.contains_key(zone.origin()) {
            Err(zone)
        } else {
            self.zones.insert(zone.origin().clone(), zone);
            Ok(())
        }
    }

    /// Returns the zone whose origin is exactly `origin`.
    pub fn get(&self, origin: &Name) -> Option<&Zone> {
        self.zones.get(origin)
    }

    /// Finds the zone responsible for `name`: the one whose origin is
    /// the longest suffix of `name`.
    pub fn lookup(&self, name: &Name) -> Option<&Zone> {
        (0..name.label_count())
            .filter_map(|skip| name.superdomain(skip))
            .find_map(|superdomain| self.zones.get(&superdomain))
    }

    /// Returns the zones in canonical order of their origins.
    pub fn zones(&self) -> Vec<&Zone> {
        let mut zones: Vec<&Zone> = self.zones.values().collect();
        zones.sort_by(|a, b| a.origin().cmp(b.origin()));
        zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
