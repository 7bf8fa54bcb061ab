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

//! Implements zone and region table loading and their log output.

use std::path::Path;

use anyhow::{Context, Result};
use log::Level::Debug;
use log::{debug, info, log_enabled, warn};

use geozone::geo::RegionTable;
use geozone::zone::{self, Zone, ZoneStore};

/// Loads the region table from the GeoIP directory `geoip`. Without a
/// directory, the table is empty and region scopes match no client.
pub fn load_regions(geoip: Option<&Path>) -> Result<RegionTable> {
    let geoip = match geoip {
        Some(dir) => dir,
        None => return Ok(RegionTable::new()),
    };
    info!("Loading the region table from {}.", geoip.display());
    let regions = RegionTable::load_dir(geoip)
        .with_context(|| format!("failed to load the region table from {}", geoip.display()))?;
    info!(
        "Loaded {} prefixes in {} regions.",
        regions.len(),
        regions.regions().len(),
    );
    Ok(regions)
}

/// Loads every zone file in `zonedir`, logging what was loaded. Zones
/// naming regions that `regions` does not know are reported, since
/// their region scopes can never be selected.
pub fn load(zonedir: &Path, regions: &RegionTable) -> Result<ZoneStore> {
    info!("Loading zones from {}.", zonedir.display());
    let store = zone::load_dir(zonedir)
        .with_context(|| format!("failed to load zones from {}", zonedir.display()))?;
    match store.len() {
        0 => info!("No zones were found."),
        1 => info!("Loaded 1 zone."),
        n => info!("Loaded {} zones.", n),
    }
    let known = regions.regions();
    for zone in store.zones() {
        log_zone(zone);
        for region in zone.regions().difference(&known) {
            warn!(
                "Zone {} has records for region {}, which has no prefixes in the region table.",
                zone.origin(),
                region,
            );
        }
    }
    Ok(store)
}

/// Logs a loaded zone's counts, and at the debug level its records.
fn log_zone(zone: &Zone) {
    info!(
        "Zone {}: {} records, {} network scopes, {} region scopes{}.",
        zone.origin(),
        zone.record_count(),
        zone.network_scope_count(),
        zone.regions().len(),
        if zone.soa().is_some() { "" } else { ", no SOA" },
    );
    if log_enabled!(Debug) {
        for (scope, record) in zone.records() {
            debug!("[{}] {}", scope, record);
        }
    }
}
