#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Safety map API server.
//!
//! Reads its config from `$SAFETY_MAP_CONFIG` if set; `BIND_ADDR` and
//! `PORT` override the bind address.

use safety_map_server::{ServerConfig, run_server};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::load(None)?;
    run_server(config).await
}
