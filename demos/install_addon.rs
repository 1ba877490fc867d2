//! Temporary add-on installation.
//!
//! Demonstrates:
//! - Waiting for the Firefox debugger server with retries
//! - Installing an unpacked extension as a temporary add-on
//! - Reloading the installed add-on
//! - Watching unsolicited events
//!
//! Start Firefox first:
//!   firefox --start-debugger-server 6000
//!
//! Usage:
//!   cargo run --example install_addon -- /path/to/extension
//!   cargo run --example install_addon -- /path/to/extension --port 6001
//!   cargo run --example install_addon -- /path/to/extension --reload
//!   cargo run --example install_addon -- /path/to/extension --debug

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use firefox_rdp::options::DEFAULT_PORT;
use firefox_rdp::{ConnectOptions, RdpEvent, connect_retrying};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Args
// ============================================================================

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "install_addon", about = "Install a temporary add-on into Firefox")]
struct Args {
    /// Extension directory or packaged file.
    path: PathBuf,

    /// Debugger server port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Reload the add-on after installing it.
    #[arg(long)]
    reload: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "firefox_rdp=debug"
    } else {
        "firefox_rdp=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    println!("=== Install Temporary Add-on ===\n");

    let options = ConnectOptions::for_port(args.port)
        .with_max_retries(250)
        .with_retry_interval(Duration::from_millis(120));

    println!("[1] Connecting to {}...", options.addr());
    let firefox = connect_retrying(&options)
        .await
        .with_context(|| format!("no debugger server on {}", options.addr()))?;
    println!("    ✓ Connected\n");

    firefox.client().set_event_handler(Box::new(|event| match event {
        RdpEvent::Unsolicited(message) => {
            println!("    [event] {} from {:?}", message.message_type(), message.from);
        }
        RdpEvent::Error(e) => eprintln!("    [event] error: {e}"),
        _ => {}
    }));

    println!("[2] Installing {}...", args.path.display());
    let addon = firefox.install_temporary_addon(&args.path).await?;
    println!("    ✓ Installed {} ({})\n", addon.id, addon.actor);

    if args.reload {
        println!("[3] Reloading {}...", addon.id);
        firefox.reload_addon(&addon.id).await?;
        println!("    ✓ Reloaded\n");
    }

    firefox.disconnect();
    println!("=== Done ===");
    Ok(())
}
