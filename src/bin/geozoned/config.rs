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

//! Implements the server configuration, which comes either from a TOML
//! file or from the command line.

use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use paste::paste;
use serde::{de, Deserialize};

use geozone::io::{DEFAULT_SHUTDOWN_GRACE, DEFAULT_TCP_IDLE_TIMEOUT};
use geozone::server::LogOptions;

use crate::args::Args;

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the server configuration from the file given by `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let dir = match path.as_ref().parent() {
        Some(p) => p,
        None => return Err(anyhow!("the configuration file path has no parent")),
    };
    let raw_config = fs::read(path.as_ref()).context("failed to read the configuration file")?;
    let config = parse(&raw_config, dir)?;
    log_config_summary(&config);
    Ok(config)
}

/// Parses a configuration file. A relative `zonedir` or `geoip` is
/// interpreted relative to `dir`, the directory of the configuration
/// file.
fn parse(raw_config: &[u8], dir: &Path) -> Result<Config> {
    let mut config: Config =
        toml::from_slice(raw_config).context("failed to parse the configuration file")?;
    if config.zonedir.is_relative() {
        config.zonedir = dir.join(&config.zonedir);
    }
    if let Some(ref mut geoip) = config.geoip {
        if geoip.is_relative() {
            *geoip = dir.join(&*geoip);
        }
    }
    Ok(config)
}

/// Loads the server configuration from the parsed command line
/// arguments given by `args`.
pub fn load_from_args(args: Args) -> Result<Config> {
    let config = Config {
        address: args
            .address
            .ok_or_else(|| anyhow!("no address to bind was given"))?,
        port: args.port.unwrap_or(DEFAULT_PORT),
        tcp: args.tcp,
        zonedir: args
            .zonedir
            .ok_or_else(|| anyhow!("no zone directory was given"))?,
        geoip: args.geoip,
        log_prefix: args.log_prefix,
        log: ConfigLogOptions(args.log.unwrap_or_default()),
        udplen: args.udplen,
        glob: args.glob,
        tcp_idle_timeout: default_tcp_idle_timeout(),
        shutdown_grace: default_shutdown_grace(),
    };
    log_config_summary(&config);
    Ok(config)
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }

    let transports = if config.tcp { "UDP and TCP" } else { "UDP" };
    debug!(
        "Configuration loaded:\n\
         Bind address:     {}\n\
         Transports:       {}\n\
         Zone directory:   {}\n\
         GeoIP directory:  {}\n\
         Wildcards:        {}\n\
         UDP payload size: {}\n\
         TCP idle timeout: {} s\n\
         Shutdown grace:   {} s\n\
         Query log:        {:?}",
        config.bind_addr(),
        transports,
        config.zonedir.display(),
        config
            .geoip
            .as_ref()
            .map_or_else(|| "none".to_owned(), |dir| dir.display().to_string()),
        if config.glob { "enabled" } else { "disabled" },
        config
            .udplen
            .map_or_else(|| "default".to_owned(), |size| size.to_string()),
        config.tcp_idle_timeout,
        config.shutdown_grace,
        config.log_options(),
    );
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE STRUCTURE                                       //
////////////////////////////////////////////////////////////////////////

/// The complete configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub tcp: bool,
    pub zonedir: PathBuf,
    pub geoip: Option<PathBuf>,
    #[serde(default)]
    pub log_prefix: bool,
    #[serde(default = "default_log")]
    pub log: ConfigLogOptions,
    pub udplen: Option<u16>,
    #[serde(default)]
    pub glob: bool,
    #[serde(default = "default_tcp_idle_timeout")]
    pub tcp_idle_timeout: u64,
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: u64,
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// Returns the addresses on which to listen for TCP connections
    /// (none, unless TCP is enabled) and UDP datagrams, respectively.
    pub fn listen_addrs(&self) -> (Vec<SocketAddr>, Vec<SocketAddr>) {
        let bind_addr = self.bind_addr();
        let tcp_addrs = if self.tcp { vec![bind_addr] } else { Vec::new() };
        (tcp_addrs, vec![bind_addr])
    }

    /// Combines the hook list with the prefix flag.
    pub fn log_options(&self) -> LogOptions {
        self.log.0.with_prefix(self.log_prefix)
    }

    pub fn tcp_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.tcp_idle_timeout)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace)
    }
}

const DEFAULT_PORT: u16 = 53;

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log() -> ConfigLogOptions {
    ConfigLogOptions(LogOptions::default())
}

fn default_tcp_idle_timeout() -> u64 {
    DEFAULT_TCP_IDLE_TIMEOUT.as_secs()
}

fn default_shutdown_grace() -> u64 {
    DEFAULT_SHUTDOWN_GRACE.as_secs()
}

////////////////////////////////////////////////////////////////////////
// WRAPPERS OVER GEOZONE TYPES FOR SERDE                              //
////////////////////////////////////////////////////////////////////////

/// Generates a deserializable `ConfigX` structure wrapping an `X` type
/// from [`geozone`], using its [`FromStr`](std::str::FromStr)
/// implementation.
macro_rules! make_serde_wrapper {
    ($wrapper:ident, $over:ty, $description:literal) => {
        /// A macro-generated deserializable wrapper over a [`geozone`]
        /// type.
        #[derive(Clone, Debug)]
        pub struct $wrapper(pub $over);

        impl<'de> Deserialize<'de> for $wrapper {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_str(paste! { [<$wrapper Visitor>] })
            }
        }

        paste! {
            /// A macro-generated [`Visitor`](de::Visitor).
            #[derive(Debug)]
            struct [<$wrapper Visitor>];
        }

        impl<'de> de::Visitor<'de> for paste! { [<$wrapper Visitor>] } {
            type Value = $wrapper;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($description)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map($wrapper)
                    .map_err(|e| E::custom(format!("invalid {}: {}", $description, e)))
            }
        }
    };
}

make_serde_wrapper!(ConfigLogOptions, LogOptions, "list of log hooks");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_filled_in() {
        let config = parse(b"address = \"::1\"\nzonedir = \"/srv/zones\"\n", Path::new("/etc")).unwrap();
        assert_eq!(config.bind_addr(), "[::1]:53".parse().unwrap());
        assert_eq!(config.zonedir, PathBuf::from("/srv/zones"));
        assert_eq!(config.geoip, None);
        assert!(config.listen_addrs().0.is_empty());
        assert_eq!(config.log_options(), LogOptions::default());
        assert_eq!(config.tcp_idle_timeout(), DEFAULT_TCP_IDLE_TIMEOUT);
        assert_eq!(config.shutdown_grace(), DEFAULT_SHUTDOWN_GRACE);
    }

    #[test]
    fn relative_directories_follow_the_config_file() {
        let config = parse(
            b"address = \"::1\"\nzonedir = \"zones\"\ngeoip = \"geoip\"\n",
            Path::new("/etc/geozone"),
        )
        .unwrap();
        assert_eq!(config.zonedir, PathBuf::from("/etc/geozone/zones"));
        assert_eq!(config.geoip, Some(PathBuf::from("/etc/geozone/geoip")));
    }

    #[test]
    fn all_keys_are_read() {
        let raw = b"\
address = \"192.0.2.1\"
port = 5353
tcp = true
zonedir = \"/srv/zones\"
geoip = \"/usr/share/geoip\"
log_prefix = true
log = \"reply,error\"
udplen = 4096
glob = true
tcp_idle_timeout = 30
shutdown_grace = 1
";
        let config = parse(raw, Path::new("/")).unwrap();
        let bind_addr: SocketAddr = "192.0.2.1:5353".parse().unwrap();
        assert_eq!(config.listen_addrs(), (vec![bind_addr], vec![bind_addr]));
        let log = config.log_options();
        assert!(log.prefix && log.reply && log.error && !log.request);
        assert_eq!(config.udplen, Some(4096));
        assert!(config.glob);
        assert_eq!(config.geoip, Some(PathBuf::from("/usr/share/geoip")));
        assert_eq!(config.tcp_idle_timeout(), Duration::from_secs(30));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(1));
    }

    #[test]
    fn unknown_keys_and_hooks_are_rejected() {
        let base = "address = \"::1\"\nzonedir = \"z\"\n";
        assert!(parse(format!("{}port = 53\nbind = 1\n", base).as_bytes(), Path::new("/")).is_err());
        assert!(parse(format!("{}log = \"reply,data\"\n", base).as_bytes(), Path::new("/")).is_err());
    }
}
