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

//! Geo scopes and the selection of answers by client address.
//!
//! Every candidate answer for an owner and type is tagged with a
//! [`GeoScope`]: a network (an IPv4 or IPv6 prefix), a region (a
//! two-letter country code resolved through a [`RegionTable`]), or the
//! catch-all default scope. Given the [`Client`] of a query, [`select`]
//! picks the candidate whose network contains the client address with
//! the longest prefix, just as a router picks a route. When no network
//! matches, a candidate for the client's region is used, then the
//! default candidate, and when there is no default either, nothing is
//! selected.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::{IpNet, Ipv4Net};

use crate::rr::Rrset;
use crate::zone::AnswerSet;

mod region;
pub use region::{Region, RegionLoadError, RegionLoadErrorKind, RegionTable};

////////////////////////////////////////////////////////////////////////
// GEO SCOPES                                                         //
////////////////////////////////////////////////////////////////////////

/// The scope a candidate answer applies to.
///
/// Networks are always held in normalized form: host bits are cleared
/// (`10.1.2.3/8` is stored as `10.0.0.0/8`), and IPv4-mapped IPv6
/// prefixes of length 96 or more are stored as the equivalent IPv4
/// prefix, matching how client addresses are canonicalized by
/// [`canonical_client`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GeoScope {
    Network(IpNet),
    Region(Region),
    Default,
}

/// How specific a [`GeoScope`] is. Every network outranks every region,
/// longer prefixes outrank shorter ones, and the default scope ranks
/// below everything else.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Specificity {
    Default,
    Region,
    Network(u8),
}

impl GeoScope {
    /// Creates a network scope, normalizing `network`.
    pub fn network(network: IpNet) -> Self {
        Self::Network(normalize_network(network))
    }

    pub fn specificity(&self) -> Specificity {
        match self {
            Self::Network(network) => Specificity::Network(network.prefix_len()),
            Self::Region(_) => Specificity::Region,
            Self::Default => Specificity::Default,
        }
    }

    /// Returns whether `client` falls within this scope. The default
    /// scope contains every client, and a region scope contains the
    /// clients whose address the region table placed in that region.
    pub fn contains(&self, client: &Client) -> bool {
        match self {
            Self::Network(network) => network.contains(&client.addr),
            Self::Region(region) => client.region == Some(*region),
            Self::Default => true,
        }
    }
}

/// Clears the host bits of `network`, and turns IPv4-mapped IPv6
/// prefixes of length 96 or more into the equivalent IPv4 prefix.
fn normalize_network(network: IpNet) -> IpNet {
    let network = match network {
        IpNet::V6(v6) if v6.prefix_len() >= 96 => match v6.network().to_ipv4_mapped() {
            Some(v4) => Ipv4Net::new(v4, v6.prefix_len() - 96)
                .map(IpNet::V4)
                .unwrap_or(network),
            None => network,
        },
        _ => network,
    };
    network.trunc()
}

impl FromStr for GeoScope {
    type Err = ParseScopeError;

    /// Parses `default` (in any case), a CIDR prefix such as
    /// `10.0.0.0/8`, a bare address, which is taken as a host prefix,
    /// or a two-letter region code such as `CN`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.eq_ignore_ascii_case("default") {
            Ok(Self::Default)
        } else if let Ok(network) = text.parse::<IpNet>() {
            Ok(Self::network(network))
        } else if let Ok(address) = text.parse::<IpAddr>() {
            Ok(Self::network(IpNet::from(address)))
        } else if let Ok(region) = text.parse::<Region>() {
            Ok(Self::Region(region))
        } else {
            Err(ParseScopeError)
        }
    }
}

impl fmt::Display for GeoScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Network(network) => fmt::Display::fmt(network, f),
            Self::Region(region) => fmt::Display::fmt(region, f),
            Self::Default => f.write_str("default"),
        }
    }
}

/// An error signaling an invalid textual [`GeoScope`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParseScopeError;

impl fmt::Display for ParseScopeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("expected a network prefix, an address, a region code, or \"default\"")
    }
}

impl std::error::Error for ParseScopeError {}

/// Converts an IPv4-mapped IPv6 address (as seen on dual-stack sockets)
/// into the IPv4 address it carries. Other addresses are unchanged.
pub fn canonical_client(client: IpAddr) -> IpAddr {
    match client {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(client, IpAddr::V4),
        IpAddr::V4(_) => client,
    }
}

/// The querying client, as geo selection sees it: its canonical
/// address and the region that address belongs to, if any.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Client {
    addr: IpAddr,
    region: Option<Region>,
}

impl Client {
    /// Creates a `Client` for `addr`, canonicalizing the address and
    /// looking up its region in `regions`.
    pub fn new(addr: IpAddr, regions: &RegionTable) -> Self {
        let addr = canonical_client(addr);
        Self {
            addr,
            region: regions.lookup(addr),
        }
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }
}

/// A client with no known region.
impl From<IpAddr> for Client {
    fn from(addr: IpAddr) -> Self {
        Self {
            addr: canonical_client(addr),
            region: None,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// SELECTION                                                          //
////////////////////////////////////////////////////////////////////////

/// The candidate chosen by [`select`].
#[derive(Clone, Copy, Debug)]
pub struct Selection<'a> {
    pub scope: &'a GeoScope,
    pub rrset: &'a Rrset,
}

/// Selects the candidate of `answer_set` that applies to `client`.
///
/// Among the network scopes containing `client`, the one with the
/// longest prefix wins; when two have the same prefix length, the one
/// declared first wins. If no network contains `client`, the candidate
/// for the client's region is returned, and failing that, the default
/// candidate. If there is no default candidate either, the answer set
/// has nothing for this client and `None` is returned.
pub fn select<'a>(answer_set: &'a AnswerSet, client: &Client) -> Option<Selection<'a>> {
    let mut best: Option<Selection> = None;
    for candidate in answer_set.candidates() {
        if !candidate.scope.contains(client) {
            continue;
        }
        let better = match best {
            Some(ref current) => candidate.scope.specificity() > current.scope.specificity(),
            None => true,
        };
        if better {
            best = Some(Selection {
                scope: &candidate.scope,
                rrset: &candidate.rrset,
            });
        }
    }
    best
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
