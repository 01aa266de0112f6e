//! bdswap - swap area management from the command line.
//!
//! Formats, activates, deactivates and labels swap areas after checking
//! that the required util-linux tools are installed.

use anyhow::Context;
use blockdev_swap::{ExtraArg, SwapConfig, SwapPlugin};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bdswap")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Manage swap areas on block devices and files",
    long_about = "Format, activate, deactivate, label and inspect swap areas. \
                  Requires mkswap and swaplabel from util-linux."
)]
struct Cli {
    /// JSON configuration file (defaults come from BDSWAP_* variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the required utilities are installed
    Check,

    /// Format a device as swap
    Mkswap {
        /// Device or file to format
        device: PathBuf,

        /// Label for the new swap area
        #[arg(long)]
        label: Option<String>,

        /// Extra mkswap option as OPT or OPT=VAL (repeatable)
        #[arg(long = "extra", value_parser = parse_extra)]
        extra: Vec<ExtraArg>,
    },

    /// Activate swap on a device
    Swapon {
        /// Device or file to activate
        device: PathBuf,

        /// Priority (negative for kernel default)
        #[arg(long, default_value = "-1", allow_negative_numbers = true)]
        priority: i32,
    },

    /// Deactivate swap on a device
    Swapoff {
        /// Device or file to deactivate
        device: PathBuf,
    },

    /// Report whether a device is active as swap
    Status {
        /// Device or file to query
        device: PathBuf,
    },

    /// Set the label of a swap area
    Label {
        /// Swap device or file
        device: PathBuf,

        /// New label (at most 16 bytes)
        label: String,
    },

    /// Set the UUID of a swap area
    Uuid {
        /// Swap device or file
        device: PathBuf,

        /// New UUID
        uuid: String,
    },

    /// Show the on-disk swap header
    Signature {
        /// Device or file to inspect
        device: PathBuf,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// List active swap areas
    List {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_extra(s: &str) -> Result<ExtraArg, String> {
    s.parse()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("blockdev_swap=info,bdswap=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let swap = SwapPlugin::load(config).context("swap plugin failed to load")?;

    match cli.command {
        Commands::Check => cmd_check(&swap),
        Commands::Mkswap {
            device,
            label,
            extra,
        } => {
            swap.mkswap(&device, label.as_deref(), &extra)?;
            println!("Created swap area on {}", device.display());
            Ok(())
        }
        Commands::Swapon { device, priority } => {
            swap.swapon(&device, priority)?;
            println!("Activated swap on {}", device.display());
            Ok(())
        }
        Commands::Swapoff { device } => {
            swap.swapoff(&device)?;
            println!("Deactivated swap on {}", device.display());
            Ok(())
        }
        Commands::Status { device } => {
            let active = swap.swapstatus(&device);
            println!("{}: {}", device.display(), if active { "active" } else { "inactive" });
            Ok(())
        }
        Commands::Label { device, label } => {
            swap.set_label(&device, &label)?;
            println!("Label of {} set to {}", device.display(), label);
            Ok(())
        }
        Commands::Uuid { device, uuid } => {
            swap.set_uuid(&device, &uuid)?;
            println!("UUID of {} set to {}", device.display(), uuid);
            Ok(())
        }
        Commands::Signature { device, json } => cmd_signature(&swap, &device, json),
        Commands::List { json } => cmd_list(&swap, json),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SwapConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            Ok(SwapConfig::from_json(&text)?)
        }
        None => Ok(SwapConfig::from_env()?),
    }
}

fn cmd_check(swap: &SwapPlugin) -> anyhow::Result<()> {
    let info = swap.info();

    println!("Swap Plugin");
    println!("===========");
    println!("mkswap:      {} ({})", info.mkswap.display(), info.mkswap_version);
    println!("swaplabel:   {}", info.swaplabel.display());
    println!("Backend:     {}", info.backend);
    println!("Swap table:  {}", info.proc_swaps.display());

    Ok(())
}

fn cmd_signature(swap: &SwapPlugin, device: &PathBuf, json: bool) -> anyhow::Result<()> {
    let signature = swap.signature(device)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&signature)?);
        return Ok(());
    }

    match signature {
        None => println!("{}: no swap signature", device.display()),
        Some(sig) => {
            println!("Device:      {}", device.display());
            println!("Kind:        {:?}", sig.kind);
            println!("Page size:   {} bytes", sig.page_size);
            println!("Version:     {}", sig.version);
            println!("Last page:   {}", sig.last_page);
            println!("UUID:        {}", sig.uuid.as_deref().unwrap_or("-"));
            println!("Label:       {}", sig.label.as_deref().unwrap_or("-"));
        }
    }

    Ok(())
}

fn cmd_list(swap: &SwapPlugin, json: bool) -> anyhow::Result<()> {
    let areas = swap.active_swaps()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&areas)?);
        return Ok(());
    }

    if areas.is_empty() {
        println!("(no active swap)");
    } else {
        println!("{:<40} {:<10} {:>12} {:>12} {:>8}", "NAME", "TYPE", "SIZE", "USED", "PRIO");
        for area in areas {
            let name = if area.deleted {
                format!("{} (deleted)", area.path.display())
            } else {
                area.path.display().to_string()
            };
            println!(
                "{:<40} {:<10} {:>12} {:>12} {:>8}",
                name,
                area.kind,
                area.size_kib,
                area.used_kib,
                area.priority
            );
        }
    }

    Ok(())
}
