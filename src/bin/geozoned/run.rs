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

//! Implements running the server.

use std::fmt::Write;
use std::path::Path;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use env_logger::Env;
use log::{error, info, warn};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use geozone::io::TokioIoProvider;
use geozone::server::Server;

use crate::args::Args;
use crate::config;
use crate::zones;

/// Runs the server.
pub fn run(args: Args) {
    env_logger::init_from_env(Env::new().default_filter_or("info"));

    if let Err(e) = try_running(args) {
        let mut message = describe_error("Failed to run:", &e);
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
    info!("Exiting with success.");
}

fn try_running(args: Args) -> Result<()> {
    info!(
        "geozone daemon v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );

    // Get the configuration, either from the file system or from the
    // command line arguments, as appropriate.
    let config = if let Some(ref config_path) = args.config {
        info!("Loading the configuration from {}.", config_path.display());
        config::load_from_path(config_path).context("failed to load the configuration")?
    } else {
        info!("Loading the configuration from the command line.");
        config::load_from_args(args).context("failed to load the configuration")?
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the Tokio runtime")?;

    // Bind before loading zones: zone loading may be expensive, so it's
    // better to fail fast.
    let (tcp_addrs, udp_addrs) = config.listen_addrs();
    let mut io_provider = runtime
        .block_on(TokioIoProvider::bind(tcp_addrs, udp_addrs))
        .with_context(|| format!("failed to bind sockets on {}", config.bind_addr()))?;
    io_provider.set_tcp_idle_timeout(config.tcp_idle_timeout());

    let regions = zones::load_regions(config.geoip.as_deref())?;
    let mut server = Server::new(Arc::new(zones::load(&config.zonedir, &regions)?));
    server.set_regions(Arc::new(regions));
    if let Some(size) = config.udplen {
        server
            .set_edns_udp_payload_size(size)
            .context("failed to set the EDNS UDP payload size")?;
    }
    server.set_glob(config.glob);
    server.set_log_options(config.log_options());

    // Set up signal handling.
    let mut signals = set_up_signal_handling().context("failed to set up signal handling")?;

    // Start the I/O provider.
    info!("Set-up is complete; starting the server.");
    for (transport, addr) in io_provider.local_addrs().context("failed to read socket addresses")? {
        info!("Listening for {} on {}.", transport, addr);
    }
    let server = Arc::new(server);
    let shutdown_controller = {
        let _guard = runtime.enter();
        io_provider.start(&server)
    };

    // Process incoming signals.
    for signal in signals.forever() {
        match signal {
            s @ (SIGINT | SIGTERM) => {
                let name = match s {
                    SIGINT => "SIGINT",
                    SIGTERM => "SIGTERM",
                    _ => unreachable!(),
                };
                info!("Received {}; shutting down.", name);
                break;
            }
            SIGHUP => {
                info!("Received SIGHUP; reloading zones.");
                if let Err(e) = reload(&config.zonedir, config.geoip.as_deref(), &server) {
                    error!(
                        "{}",
                        describe_error("Failed to reload; the old zones stay active:", &e)
                    );
                }
            }
            _ => unreachable!(),
        }
    }

    // Shut down the server.
    let grace = config.shutdown_grace();
    if runtime.block_on(shutdown_controller.shut_down(grace)) {
        info!("Shutdown complete.");
    } else {
        warn!(
            "In-flight work did not finish within {} s; exiting anyway.",
            grace.as_secs()
        );
    }
    runtime.shutdown_background();
    Ok(())
}

fn set_up_signal_handling() -> Result<Signals> {
    let all_signals = &[SIGHUP, SIGINT, SIGTERM];
    let term_signals = &[SIGINT, SIGTERM];
    let already_terminating = Arc::new(AtomicBool::new(false));

    // This sets up signal handlers to exit immediately if a second
    // termination signal arrives before the process finishes shutting
    // down gracefully.
    for sig in term_signals {
        signal_hook::flag::register_conditional_shutdown(*sig, 1, already_terminating.clone())?;
        signal_hook::flag::register(*sig, already_terminating.clone())?;
    }

    Signals::new(all_signals).map_err(Into::into)
}

/// Loads the region table and the zone directory again and, if both
/// succeed, swaps them into the server.
fn reload(zonedir: &Path, geoip: Option<&Path>, server: &Server) -> Result<()> {
    let regions = zones::load_regions(geoip)?;
    let store = zones::load(zonedir, &regions)?;
    server.set_regions(Arc::new(regions));
    server.set_zones(Arc::new(store));
    info!("Reload complete.");
    Ok(())
}

/// Formats an error with its chain of causes, one numbered line each.
fn describe_error(headline: &str, e: &anyhow::Error) -> String {
    let mut message = String::from(headline);
    for (i, cause) in e.chain().enumerate() {
        write!(message, "\n[{}] {}", i + 1, cause).unwrap();
    }
    message
}
