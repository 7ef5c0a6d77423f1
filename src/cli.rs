//! CLI argument parsing

use crate::drivers;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the driver argument
fn driver_help() -> String {
    format!(
        "Driver to use, auto-detected if omitted [available: {}]",
        drivers::driver_names_short()
    )
}

#[derive(Parser)]
#[command(name = "satlink")]
#[command(author, version, about = "Saturn transfer device tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List compiled-in device drivers
    ListDrivers,

    /// Probe for a connected transfer device
    Detect,

    /// Read device memory to a file
    Download {
        /// Driver to use
        #[arg(short, long, help = driver_help())]
        driver: Option<String>,

        /// Start address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,

        /// Number of bytes to read (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        size: u32,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write a file into device memory
    Upload {
        /// Driver to use
        #[arg(short, long, help = driver_help())]
        driver: Option<String>,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Destination address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,
    },

    /// Write a file into device memory and run it
    Exec {
        /// Driver to use
        #[arg(short, long, help = driver_help())]
        driver: Option<String>,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Entry point address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,
    },
}
