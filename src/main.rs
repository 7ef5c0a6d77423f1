//! satlink - Transfer tool for Saturn flash cartridges and datalink cables
//!
//! # Architecture
//!
//! All transports implement one `DeviceDriver` capability contract; a
//! `Session` owns the compiled-in catalog, exposes the driver registry, and
//! enforces that at most one driver is active. Commands either select a
//! driver by name or let the session probe the catalog in priority order.

mod cli;
mod commands;
mod drivers;

use clap::Parser;
use cli::{Cli, Commands};
use satlink_core::Session;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let mut session = Session::new(drivers::catalog());
    session.init();

    let result = run(cli.command, &mut session);

    session.deinit();

    result
}

fn run(command: Commands, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::ListDrivers => commands::list_drivers(session),
        Commands::Detect => commands::detect(session),
        Commands::Download {
            driver,
            address,
            size,
            output,
        } => {
            commands::resolve_driver(session, driver.as_deref())?;
            commands::download(session, address, size, &output)
        }
        Commands::Upload {
            driver,
            input,
            address,
        } => {
            commands::resolve_driver(session, driver.as_deref())?;
            commands::upload(session, &input, address)
        }
        Commands::Exec {
            driver,
            input,
            address,
        } => {
            commands::resolve_driver(session, driver.as_deref())?;
            commands::exec(session, &input, address)
        }
    }
}
