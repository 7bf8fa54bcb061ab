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

//! Implements command-line argument parsing.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use geozone::server::LogOptions;

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// The geozone authoritative DNS server
#[derive(Debug, Parser)]
#[clap(author, version)]
#[clap(group(ArgGroup::new("source").required(true).args(["config", "zonedir"])))]
pub struct Args {
    /// Set the configuration file to use
    #[clap(
        long,
        conflicts_with_all = [
            "address", "port", "tcp", "log_prefix", "zonedir", "geoip", "udplen", "glob", "log",
        ],
        value_name = "FILE"
    )]
    pub config: Option<PathBuf>,

    /// Set the IP address to bind
    #[clap(long, required_unless_present = "config", value_name = "IP")]
    pub address: Option<IpAddr>,

    /// Set the port to bind [default: 53]
    #[clap(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Serve TCP in addition to UDP
    #[clap(long)]
    pub tcp: bool,

    /// Prefix query log lines with the transport, client, and message ID
    #[clap(long)]
    pub log_prefix: bool,

    /// Set the directory of zone files to serve
    #[clap(long, value_name = "DIR")]
    pub zonedir: Option<PathBuf>,

    /// Set the GeoIP directory of per-region JSON files for region scopes
    #[clap(long, value_name = "DIR")]
    pub geoip: Option<PathBuf>,

    /// Set the EDNS UDP payload size advertised to clients [default: 1232]
    #[clap(long, value_name = "OCTETS")]
    pub udplen: Option<u16>,

    /// Let wildcard owners (*.example.com.) answer for names below them
    #[clap(long)]
    pub glob: bool,

    /// Set the query log hooks (request, reply, truncated, error)
    #[clap(long, value_name = "HOOKS", allow_hyphen_values = true)]
    pub log: Option<LogOptions>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_are_parsed() {
        let args = Args::try_parse_from([
            "geozoned",
            "--address",
            "127.0.0.1",
            "--port",
            "5353",
            "--tcp",
            "--zonedir",
            "zones",
            "--geoip",
            "/usr/share/geoip",
            "--log",
            "-request",
        ])
        .unwrap();
        assert_eq!(args.address, Some("127.0.0.1".parse().unwrap()));
        assert_eq!(args.port, Some(5353));
        assert!(args.tcp && !args.glob && !args.log_prefix);
        assert_eq!(args.geoip, Some(PathBuf::from("/usr/share/geoip")));
        let log = args.log.unwrap();
        assert!(!log.request && log.reply);
    }

    #[test]
    fn config_conflicts_with_flags() {
        assert!(Args::try_parse_from(["geozoned", "--config", "a.toml", "--tcp"]).is_err());
        assert!(Args::try_parse_from(["geozoned", "--config", "a.toml"]).is_ok());
    }

    #[test]
    fn address_and_zonedir_are_required_without_config() {
        assert!(Args::try_parse_from(["geozoned", "--zonedir", "zones"]).is_err());
        assert!(Args::try_parse_from(["geozoned", "--address", "::1"]).is_err());
    }
}
