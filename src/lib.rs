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

//! An authoritative DNS server that selects answers according to the
//! network of the querying client.
//!
//! Zones are loaded from a directory of zone files ([`zone::load_dir`]),
//! in which `$SCOPE` directives tag records with the client network or
//! region they are meant for. The [`server::Server`] answers DNS
//! messages against the loaded [`zone::ZoneStore`], picking for each
//! client the most specific scope that contains it ([`geo::select`]),
//! with regions resolved through a [`geo::RegionTable`]. The
//! [`io::TokioIoProvider`] connects it to UDP and TCP sockets.

pub mod geo;
pub mod io;
pub mod message;
pub mod name;
pub mod rr;
pub mod server;
mod util;
pub mod zone;
pub mod zone_file;
