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

//! Region codes and the table that places addresses in regions.
//!
//! A [`RegionTable`] is loaded from a GeoIP directory holding one JSON
//! file per region, named after its code (`cn.json`, `us.json`):
//!
//! ```json
//! {"code": "cn", "name": "China", "ipv4_ranges": ["1.0.1.0/24"], "ipv6_ranges": ["240e::/16"]}
//! ```
//!
//! An address belongs to the region of the longest listed prefix
//! containing it.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ipnet::IpNet;
use log::{debug, warn};
use serde::Deserialize;

use super::normalize_network;

////////////////////////////////////////////////////////////////////////
// REGION CODES                                                       //
////////////////////////////////////////////////////////////////////////

/// A two-letter region (country) code, such as `CN`. Codes are
/// caseless and are stored in upper case.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Region([u8; 2]);

impl Region {
    pub fn as_str(&self) -> &str {
        // Both octets are checked to be ASCII letters on construction.
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.as_bytes() {
            &[a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
                Ok(Self([a.to_ascii_uppercase(), b.to_ascii_uppercase()]))
            }
            _ => Err(ParseRegionError),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error signaling an invalid textual [`Region`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParseRegionError;

impl fmt::Display for ParseRegionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("expected a two-letter region code")
    }
}

impl std::error::Error for ParseRegionError {}

////////////////////////////////////////////////////////////////////////
// REGION TABLE                                                       //
////////////////////////////////////////////////////////////////////////

/// Maps network prefixes to regions.
///
/// Prefixes are grouped by address family and length, longest first,
/// so a lookup costs one hash lookup per distinct prefix length.
#[derive(Clone, Debug, Default)]
pub struct RegionTable {
    v4: Vec<(u8, HashMap<IpNet, Region>)>,
    v6: Vec<(u8, HashMap<IpNet, Region>)>,
}

/// One region file of a GeoIP directory.
#[derive(Debug, Deserialize)]
struct RegionFile {
    code: String,
    #[serde(default)]
    ipv4_ranges: Vec<String>,
    #[serde(default)]
    ipv6_ranges: Vec<String>,
}

impl RegionTable {
    /// Creates an empty table, which places no address in any region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `network` in `region`. If the same network was already
    /// placed, the first placement stands.
    pub fn insert(&mut self, network: IpNet, region: Region) {
        let network = normalize_network(network);
        let len = network.prefix_len();
        let groups = match network {
            IpNet::V4(_) => &mut self.v4,
            IpNet::V6(_) => &mut self.v6,
        };
        let index = match groups.binary_search_by(|(group_len, _)| len.cmp(group_len)) {
            Ok(index) => index,
            Err(index) => {
                groups.insert(index, (len, HashMap::new()));
                index
            }
        };
        groups[index].1.entry(network).or_insert(region);
    }

    /// Returns the region of the longest prefix containing `addr`. The
    /// address should already be in canonical form (see
    /// [`canonical_client`](super::canonical_client)).
    pub fn lookup(&self, addr: IpAddr) -> Option<Region> {
        let groups = match addr {
            IpAddr::V4(_) => &self.v4,
            IpAddr::V6(_) => &self.v6,
        };
        groups.iter().find_map(|(len, networks)| {
            let network = IpNet::new(addr, *len).ok()?.trunc();
            networks.get(&network).copied()
        })
    }

    /// Returns the number of prefixes in the table.
    pub fn len(&self) -> usize {
        self.v4
            .iter()
            .chain(self.v6.iter())
            .map(|(_, networks)| networks.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the regions that have at least one prefix, in order.
    pub fn regions(&self) -> BTreeSet<Region> {
        self.v4
            .iter()
            .chain(self.v6.iter())
            .flat_map(|(_, networks)| networks.values().copied())
            .collect()
    }

    /// Loads every `.json` file in `directory` as a region file. Files
    /// are read in order of name. Prefixes that fail to parse are
    /// skipped with a warning; any other failure fails the whole load.
    pub fn load_dir(directory: &Path) -> Result<Self, RegionLoadError> {
        let read_error =
            |err: io::Error| RegionLoadError::new(directory, RegionLoadErrorKind::ReadDirectory(err));
        let mut paths = Vec::new();
        for entry in fs::read_dir(directory).map_err(read_error)? {
            let path = entry.map_err(read_error)?.path();
            if path.extension().map_or(false, |ext| ext == "json") && path.is_file() {
                paths.push(path);
            } else {
                debug!("Skipping {}, which is not a region file", path.display());
            }
        }
        paths.sort();

        let mut table = Self::new();
        for path in paths {
            table.load_file(&path)?;
        }
        Ok(table)
    }

    fn load_file(&mut self, path: &Path) -> Result<(), RegionLoadError> {
        let error = |kind| RegionLoadError::new(path, kind);
        let text = fs::read(path).map_err(|err| error(RegionLoadErrorKind::ReadFile(err)))?;
        let file: RegionFile =
            serde_json::from_slice(&text).map_err(|err| error(RegionLoadErrorKind::Parse(err)))?;
        let region = file
            .code
            .parse::<Region>()
            .map_err(|_| error(RegionLoadErrorKind::InvalidCode(file.code.clone())))?;
        for range in file.ipv4_ranges.iter().chain(file.ipv6_ranges.iter()) {
            match range.parse::<IpNet>() {
                Ok(network) => self.insert(network, region),
                Err(err) => warn!(
                    "Skipping invalid prefix {:?} for region {} in {}: {}",
                    range,
                    region,
                    path.display(),
                    err,
                ),
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error that causes a region table load to fail, naming the file
/// or directory it concerns.
#[derive(Debug)]
pub struct RegionLoadError {
    path: PathBuf,
    kind: RegionLoadErrorKind,
}

/// The kinds of [`RegionLoadError`].
#[derive(Debug)]
#[non_exhaustive]
pub enum RegionLoadErrorKind {
    ReadDirectory(io::Error),
    ReadFile(io::Error),
    Parse(serde_json::Error),
    InvalidCode(String),
}

impl RegionLoadError {
    fn new(path: &Path, kind: RegionLoadErrorKind) -> Self {
        Self {
            path: path.to_owned(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &RegionLoadErrorKind {
        &self.kind
    }
}

impl fmt::Display for RegionLoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.kind)
    }
}

impl fmt::Display for RegionLoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ReadDirectory(err) => write!(f, "failed to read the GeoIP directory: {}", err),
            Self::ReadFile(err) => write!(f, "failed to read the region file: {}", err),
            Self::Parse(err) => write!(f, "invalid region file: {}", err),
            Self::InvalidCode(code) => write!(f, "invalid region code {:?}", code),
        }
    }
}

impl std::error::Error for RegionLoadError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
