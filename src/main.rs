//! bootstrap-dispatch - command-line entry point
//!
//! Exposes the planning half of the dispatcher and the observer cleanup for
//! inspection. Nothing here contacts a remote host.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use bootstrap_dispatch::cli::{Cli, Commands};
use bootstrap_dispatch::engine::plan;
use bootstrap_dispatch::{
    BootstrapConfig, FixedTempDir, InvocationObserver, LocalConnection, OptionTree, ResultRecord,
};

/// Placeholder shown for the temp dir when none was supplied
const REMOTE_TMP_PLACEHOLDER: &str = "$REMOTE_TMP";

/// Initialize the logger with appropriate settings
fn init_logger() {
    // RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .init();
}

fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match cli.command {
        Commands::Validate { config } => {
            info!("Validating settings file: {:?}", config);
            let loaded = BootstrapConfig::load_from_file(&config)?;
            if let Err(e) = loaded.validate() {
                error!("Settings validation failed: {}", e);
                eprintln!("✗ Settings validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Settings file is valid: {:?}", config);
        }
        Commands::Plan { args, complex, tmp } => {
            let config = load_config(cli.config.as_deref())?;
            let complex = complex.as_deref().map(load_tree).transpose()?;
            let connection = LocalConnection {
                host: "localhost".to_string(),
            };
            let allocator = FixedTempDir(REMOTE_TMP_PLACEHOLDER.to_string());

            let dispatch_plan = plan(&config, &allocator, &connection, tmp, &args, complex.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&dispatch_plan)?);
        }
        Commands::Clean { input } => {
            let raw = match input {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read result from {:?}", path))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read result from stdin")?;
                    buf
                }
            };
            let mut result: ResultRecord =
                serde_json::from_str(&raw).context("Failed to parse result JSON")?;
            InvocationObserver::new().clean(&mut result);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<BootstrapConfig> {
    let config = match path {
        Some(path) => BootstrapConfig::load_from_file(path)?,
        None => BootstrapConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn load_tree(path: &Path) -> Result<OptionTree> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read structured arguments from {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Structured arguments in {:?} must be a JSON object", path))
}
