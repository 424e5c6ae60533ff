//! app-inspector CLI - Android UI inspection from the command line
//!
//! Usage:
//!     app-inspector [OPTIONS]
//!
//! Without a one-shot flag the REST server is started.
//!
//! Environment Variables:
//!     APP_INSPECTOR_HOST: Address the REST server binds to (default: 127.0.0.1)
//!     APP_INSPECTOR_PORT: Port the REST server listens on (default: 20242)
//!     APP_INSPECTOR_DEVICE_ID: ADB serial for one-shot commands
//!     RUST_LOG: Log filter (default: info)

mod server;

use anyhow::{anyhow, Result};
use app_inspector::{get_registry, list_devices, DeviceDriver, ADB_CONFIG};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server::ServeState;

/// App Inspector - Android UI hierarchy and screenshot inspector
#[derive(Parser, Debug)]
#[command(name = "app-inspector")]
#[command(about = "App Inspector - Android UI hierarchy and screenshot inspector")]
#[command(after_help = r#"Examples:
    # Start the REST server on the default port
    app-inspector

    # Serve on all interfaces
    app-inspector --host 0.0.0.0 --port 8080

    # List connected devices
    app-inspector --list-devices

    # Run a shell command on a specific device
    app-inspector -d emulator-5554 --shell "getprop ro.product.model"

    # Dump the UI hierarchy as JSON
    app-inspector --dump-hierarchy

    # Save a screenshot
    app-inspector --screenshot screen.jpg
"#)]
struct Cli {
    // Server options
    /// Address the REST server binds to
    #[arg(long, env = "APP_INSPECTOR_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port the REST server listens on
    #[arg(long, env = "APP_INSPECTOR_PORT", default_value = "20242")]
    port: u16,

    // Device options
    /// ADB device serial (defaults to the first online device)
    #[arg(short = 'd', long, env = "APP_INSPECTOR_DEVICE_ID")]
    device_id: Option<String>,

    /// List connected devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Run a shell command on the device and exit
    #[arg(long, value_name = "COMMAND")]
    shell: Option<String>,

    /// Print the UI hierarchy as JSON and exit
    #[arg(long)]
    dump_hierarchy: bool,

    /// Save a screenshot to FILE and exit
    #[arg(long, value_name = "FILE")]
    screenshot: Option<String>,

    /// Display to capture
    #[arg(long, default_value = "0")]
    display: u32,

    // Other options
    /// Suppress verbose output
    #[arg(short = 'q', long)]
    quiet: bool,
}

impl Cli {
    fn has_device_command(&self) -> bool {
        self.shell.is_some() || self.dump_hierarchy || self.screenshot.is_some()
    }
}

fn init_logging(quiet: bool) {
    let level = if quiet { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Check that the adb tool can be found
fn check_adb() -> Result<()> {
    which::which(&ADB_CONFIG.adb_path).map_err(|_| {
        anyhow!(
            "{} is not installed or not in PATH.\n\
             Install it:\n  \
             - macOS: brew install android-platform-tools\n  \
             - Linux: sudo apt install android-tools-adb\n  \
             - Windows: Download from https://developer.android.com/studio/releases/platform-tools",
            ADB_CONFIG.adb_path
        )
    })?;
    Ok(())
}

async fn print_devices() -> Result<()> {
    let devices = list_devices().await?;
    if devices.is_empty() {
        println!("No devices connected.");
        return Ok(());
    }

    println!("Connected devices:");
    println!("{}", "-".repeat(60));
    for device in devices {
        let marker = if device.enabled { "\u{2713}" } else { "\u{2717}" };
        println!(
            "  {} {:<24} {:<12} {}",
            marker, device.serial, device.status, device.model
        );
    }
    Ok(())
}

/// Resolve the target device: the explicit serial or the first online device
async fn resolve_serial(device_id: Option<&str>) -> Result<String> {
    if let Some(serial) = device_id {
        return Ok(serial.to_string());
    }

    list_devices()
        .await?
        .into_iter()
        .find(|d| d.enabled)
        .map(|d| d.serial)
        .ok_or_else(|| anyhow!("No devices connected. Enable USB debugging and authorize this computer."))
}

async fn run_device_commands(args: &Cli, driver: Arc<DeviceDriver>) -> Result<()> {
    if let Some(command) = &args.shell {
        let response = driver.shell(command).await;
        match response.error {
            None => println!("{}", response.output),
            Some(err) => return Err(anyhow!(err)),
        }
    }

    if args.dump_hierarchy {
        let hierarchy = driver.dump_hierarchy().await?;
        info!("hierarchy has {} nodes", hierarchy.root.count());
        println!("{}", serde_json::to_string_pretty(&hierarchy.root)?);
    }

    if let Some(path) = &args.screenshot {
        let img = driver.screenshot(args.display).await?;
        img.save(path)?;
        info!("screenshot {}x{} saved to {}", img.width(), img.height(), path);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.quiet);

    check_adb()?;

    if args.list_devices {
        return print_devices().await;
    }

    if args.has_device_command() {
        let serial = resolve_serial(args.device_id.as_deref()).await?;
        let driver = get_registry().get_driver(&serial);
        return run_device_commands(&args, driver).await;
    }

    server::serve(&args.host, args.port, ServeState::new(get_registry())).await
}
