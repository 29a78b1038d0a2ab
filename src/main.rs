//! front-builder - pair html pages with their scripts, bundle and render them.

mod builder;
mod cli;
mod config;
mod core;
mod logger;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};

use builder::{Builder, Esbuild};
use cli::Cli;
use config::BuilderConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = BuilderConfig::load(&cli)?;
    let bundler = Esbuild::locate(&config.bundler, &config.root)?;
    let builder = Builder::new(config, cli.profile(), bundler);

    if cli.is_watch() {
        cli::watch::watch(builder)
    } else {
        cli::build::build_once(&builder).map(|_| ())
    }
}
