// Path: crates/conduit-node/src/bin/conduit-node.rs
#![forbid(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use conduit_node::cli::NodeOpts;
use conduit_node::config::ConduitConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    conduit_telemetry::init::init_tracing();

    let opts = NodeOpts::parse();
    let raw = std::fs::read_to_string(&opts.config)
        .with_context(|| format!("reading config file {}", opts.config.display()))?;
    let config = ConduitConfig::from_toml_str(&raw)?;

    conduit_node::run(config).await
}
