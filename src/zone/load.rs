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

//! Loading of zones from a directory of zone files.
//!
//! Each file holds records for one zone, named by its origin. A file
//! name may end in a scope suffix, `-` followed by a two-letter region
//! code in upper case or by `DEFAULT` (as in `example.com-CN` and
//! `example.com-DEFAULT.zone`). Records in such a file that come before
//! any `$SCOPE` directive belong to that scope rather than to the
//! default scope, and the files for one origin are merged into a
//! single zone.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::{Error, Zone, ZoneStore};
use crate::geo::{GeoScope, Region};
use crate::name::Name;
use crate::rr::Class;
use crate::zone_file::{self, Parser};

/// The suffix stripped from zone file names to form origins.
const ZONE_FILE_SUFFIX: &str = ".zone";

/// The scope suffix of zone files whose records are default-scoped.
const DEFAULT_SCOPE_SUFFIX: &str = "DEFAULT";

////////////////////////////////////////////////////////////////////////
// LOADING                                                            //
////////////////////////////////////////////////////////////////////////

/// Loads every regular, non-hidden file in `directory` as a zone file.
/// Files are read in order of name. Any failure fails the whole load.
pub fn load_dir(directory: &Path) -> Result<ZoneStore, LoadError> {
    let mut loader = Loader::default();
    for path in zone_files(directory)? {
        loader.load(&path)?;
    }
    Ok(loader.finish())
}

/// Loads a single zone file.
///
/// The origin is taken from the file name, with any `.zone` suffix and
/// scope suffix removed, unless an `$ORIGIN` directive precedes the
/// first record, in which case that name is the zone's apex.
pub fn load_file(path: &Path) -> Result<Zone, LoadError> {
    let mut loader = Loader::default();
    let origin = loader.load(path)?;
    loader
        .zones
        .remove(&origin)
        .ok_or_else(|| LoadError::new(path, LoadErrorKind::InvalidFileName))
}

/// Lists the zone files of `directory`, sorted by name.
fn zone_files(directory: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let read_error = |err: io::Error| LoadError::new(directory, LoadErrorKind::ReadDirectory(err));
    let mut paths = Vec::new();
    for entry in fs::read_dir(directory).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        // This follows symbolic links.
        let metadata = fs::metadata(&path).map_err(read_error)?;
        if metadata.is_file() {
            paths.push(path);
        } else {
            debug!("Skipping {}, which is not a regular file", path.display());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Accumulates zones from zone files.
#[derive(Default)]
struct Loader {
    zones: HashMap<Name, Zone>,

    /// The (origin, file scope) pairs already loaded.
    loaded: HashSet<(Name, GeoScope)>,

    /// The first `$SCOPE` block number not yet used by a loaded file.
    /// Block numbers are kept distinct across the files of a zone.
    next_block: usize,
}

impl Loader {
    /// Loads the zone file at `path`, returning the zone's origin.
    fn load(&mut self, path: &Path) -> Result<Name, LoadError> {
        let file_name = ZoneFileName::parse(path)?;
        let text =
            fs::read(path).map_err(|err| LoadError::new(path, LoadErrorKind::ReadFile(err)))?;
        debug!(
            "Loading {} (default origin {}, scope {})",
            path.display(),
            file_name.origin,
            file_name.scope,
        );

        let mut parser = Parser::new(&text)
            .with_origin(file_name.origin.clone())
            .with_scope(file_name.scope);
        let records = parser
            .by_ref()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| LoadError::new(path, LoadErrorKind::Syntax(err)))?;
        let origin = parser.leading_origin().cloned().unwrap_or(file_name.origin);

        if !self.loaded.insert((origin.clone(), file_name.scope)) {
            return Err(LoadError::new(path, LoadErrorKind::DuplicateZone(origin)));
        }
        let zone = self
            .zones
            .entry(origin.clone())
            .or_insert_with(|| Zone::new(origin.clone(), Class::IN));

        let block_base = self.next_block;
        for parsed in &records {
            self.next_block = self.next_block.max(block_base + parsed.block + 1);
            zone.add(&parsed.record, parsed.scope, block_base + parsed.block)
                .map_err(|err| {
                    LoadError::new(
                        path,
                        LoadErrorKind::InvalidRecord {
                            line: parsed.line,
                            error: err,
                        },
                    )
                })?;
        }
        Ok(origin)
    }

    /// Collects the loaded zones into a store.
    fn finish(self) -> ZoneStore {
        let mut store = ZoneStore::new();
        for zone in self.zones.into_values() {
            if zone.soa().is_none() {
                warn!(
                    "Zone {} has no SOA record; negative answers will omit it",
                    zone.origin(),
                );
            }
            // Origins are unique keys of the map, so this cannot fail.
            let _ = store.insert(zone);
        }
        store
    }
}

/// What the name of a zone file says about its contents.
struct ZoneFileName {
    origin: Name,
    scope: GeoScope,
}

impl ZoneFileName {
    fn parse(path: &Path) -> Result<Self, LoadError> {
        let invalid = || LoadError::new(path, LoadErrorKind::InvalidFileName);
        let file_name = path.file_name().and_then(|name| name.to_str()).ok_or_else(invalid)?;
        let stem = file_name.strip_suffix(ZONE_FILE_SUFFIX).unwrap_or(file_name);
        let (stem, scope) = split_scope_suffix(stem);
        let origin = if stem.ends_with('.') {
            stem.parse::<Name>()
        } else {
            format!("{}.", stem).parse::<Name>()
        };
        Ok(Self {
            origin: origin.map_err(|_| invalid())?,
            scope,
        })
    }
}

/// Splits a scope suffix off a zone file name, if it has one.
fn split_scope_suffix(stem: &str) -> (&str, GeoScope) {
    if let Some((base, suffix)) = stem.rsplit_once('-') {
        if !base.is_empty() {
            if suffix == DEFAULT_SCOPE_SUFFIX {
                return (base, GeoScope::Default);
            } else if suffix.bytes().all(|b| b.is_ascii_uppercase()) {
                if let Ok(region) = suffix.parse::<Region>() {
                    return (base, GeoScope::Region(region));
                }
            }
        }
    }
    (stem, GeoScope::Default)
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error that causes a zone load to fail, naming the file or
/// directory it concerns.
#[derive(Debug)]
pub struct LoadError {
    path: PathBuf,
    kind: LoadErrorKind,
}

/// The kinds of [`LoadError`].
#[derive(Debug)]
#[non_exhaustive]
pub enum LoadErrorKind {
    ReadDirectory(io::Error),
    ReadFile(io::Error),
    InvalidFileName,
    Syntax(zone_file::Error),
    InvalidRecord { line: usize, error: Error },
    DuplicateZone(Name),
}

impl LoadError {
    fn new(path: &Path, kind: LoadErrorKind) -> Self {
        Self {
            path: path.to_owned(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &LoadErrorKind {
        &self.kind
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.kind)
    }
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ReadDirectory(err) => write!(f, "failed to read the zone directory: {}", err),
            Self::ReadFile(err) => write!(f, "failed to read the zone file: {}", err),
            Self::InvalidFileName => {
                f.write_str("the file name does not form a valid domain name")
            }
            Self::Syntax(err) => fmt::Display::fmt(err, f),
            Self::InvalidRecord { line, error } => write!(f, "{} at line {}", error, line),
            Self::DuplicateZone(origin) => write!(
                f,
                "zone {} is already defined for this scope by another file",
                origin
            ),
        }
    }
}

impl std::error::Error for LoadError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
