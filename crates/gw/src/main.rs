//! gw CLI - Gemini gateway for DokuWiki content trees.
//!
//! Serves one configured host: `gw <host>` expects
//! `<hosts-dir>/<host>/{cert.pem,key.rsa,config.json,data}` and refuses
//! to start until all four exist.

mod error;
mod output;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gw_config::{Config, HostPaths};

use error::CliError;
use output::Output;

/// gw - Gemini gateway for DokuWiki content trees.
#[derive(Parser)]
#[command(name = "gw", version, about)]
struct Cli {
    /// Configured host name to serve (a directory under the hosts dir).
    host: String,

    /// Directory holding per-host configuration.
    #[arg(long, default_value = "host")]
    hosts_dir: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // Initialize tracing with appropriate log level
    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run(&cli, &output) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

/// Validate the host, load its configuration, and run the server.
fn run(cli: &Cli, output: &Output) -> Result<(), CliError> {
    let paths = HostPaths::locate(&cli.hosts_dir, &cli.host);
    paths.validate(&cli.host)?;

    let config = Config::load(&paths.config_file())?;

    output.info(&format!(
        "Server {:?} starting on {}:{}",
        cli.host, config.server.host, config.server.port
    ));
    output.info(&format!("Content: {}", paths.data_dir().display()));
    output.info(&format!("Search index: {}", config.search.database));

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    rt.block_on(gw_server::run_server(config, &paths))
        .map_err(|e| CliError::Server(e.to_string()))
}
