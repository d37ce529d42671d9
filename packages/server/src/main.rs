#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Binary entry point for the popbuilder server.

use popbuilder_server::{ServerConfig, run_server};

#[actix_web::main]
async fn main() {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    if let Err(e) = run_server(config).await {
        log::error!("popbuilder server failed: {e}");
        std::process::exit(1);
    }
}
