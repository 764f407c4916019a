// Path: crates/conduit-node/src/cli.rs
use std::path::PathBuf;

use clap::Parser;

/// Command-line options for the `conduit-node` binary.
#[derive(Parser, Debug)]
#[command(name = "conduit-node", about = "Runs the Conduit Registry, ContextTool, and EventBus services")]
pub struct NodeOpts {
    /// Path to the deployment's TOML configuration file.
    #[arg(long, env = "CONDUIT_CONFIG")]
    pub config: PathBuf,
}
