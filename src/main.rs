use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;

use equinix_provider::config::ProviderConfig;
use equinix_provider::metal::MetalClient;
use equinix_provider::{init_logging, serve_on_with_options, serve_with_options, sweep, EquinixProvider, ServeOptions};

#[derive(Parser)]
#[command(name = "equinix-provider")]
#[command(about = "Equinix Metal provider plugin", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the plugin server and print the handshake line (default)
    Serve {
        /// Listen on this address instead of an ephemeral localhost port
        #[arg(long)]
        addr: Option<SocketAddr>,

        /// Seconds in-flight requests may run after a shutdown signal
        #[arg(long, default_value_t = 30)]
        shutdown_timeout: u64,
    },
    /// Delete projects and devices left behind by acceptance tests
    Sweep,
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Serve {
        addr: None,
        shutdown_timeout: 30,
    }) {
        Commands::Serve {
            addr,
            shutdown_timeout,
        } => run_serve(addr, shutdown_timeout).await,
        Commands::Sweep => run_sweep().await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_serve(addr: Option<SocketAddr>, shutdown_timeout: u64) -> Result<(), Box<dyn std::error::Error>> {
    let options = ServeOptions::new().with_shutdown_timeout(Duration::from_secs(shutdown_timeout));
    let provider = EquinixProvider::new();
    match addr {
        Some(addr) => serve_on_with_options(provider, addr, options).await,
        None => serve_with_options(provider, options).await,
    }
}

async fn run_sweep() -> Result<(), Box<dyn std::error::Error>> {
    // Everything comes from the environment, METAL_AUTH_TOKEN included.
    let config = ProviderConfig::resolve(&json!({}))?;
    let client = MetalClient::new(&config)?;
    let report = sweep::sweep(&client).await?;

    println!(
        "swept {} device(s) and {} project(s), {} failure(s)",
        report.devices_deleted, report.projects_deleted, report.failures
    );
    if report.failures > 0 {
        return Err(format!("{} object(s) could not be deleted", report.failures).into());
    }
    Ok(())
}
