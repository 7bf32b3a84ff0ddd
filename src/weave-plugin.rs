//! Entrypoint for the `weave-plugin` binary.
//!
//! This binary serves the Docker network and IPAM plugin protocol on one or two Unix sockets,
//! handing every address decision to the weave IP allocator.

use std::sync::Arc;

use args::weave_plugin::Args;
use clap::Parser;
use common::logging::enable_logger;
use weave_plugin::{
    allocator::{HostResolver, HttpAllocator},
    ipam::IpamDriver,
    netdriver::{NetworkDriver, PassiveNetworkDriver},
    server::PluginServer,
};

mod args;
mod common;

#[tokio::main]
pub async fn main() {
    // Parse CLI args
    let args = Args::parse();

    // Load the config from whichever source was chosen
    let config = match args.data() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Unable to load configuration: {error}");
            std::process::exit(1);
        }
    };

    // Initialize logging
    if let Err(error) = enable_logger(config.log_level, args.verbose) {
        eprintln!("Unable to set up logging: {error}");
        std::process::exit(1);
    }
    log::info!(
        "Weave plugin {} Command line options: {:?}",
        env!("CARGO_PKG_VERSION"),
        std::env::args().skip(1).collect::<Vec<_>>()
    );

    // Every IPAM endpoint shares one driver, which finds the allocator afresh on each call
    let allocator = Arc::new(HttpAllocator::new(HostResolver::new(
        config.allocator.clone(),
    )));
    let ipam = IpamDriver::new(allocator);

    let no_multicast_route = config.no_multicast_route;
    let server = PluginServer::new(
        config.endpoints(),
        ipam,
        Box::new(move |scope| -> Arc<dyn NetworkDriver> {
            Arc::new(PassiveNetworkDriver::new(scope, no_multicast_route))
        }),
    );

    // Serve until told to stop
    if let Err(error) = server.run().await {
        log::error!("{}", error);
        std::process::exit(1);
    }
    log::info!("Shut down cleanly");
}
