//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::Profile;

/// Pair html pages with their scripts, bundle them and render the pages
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = ".front-builder.json", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Destination directory (overrides `destination` from the config file)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build every page once
    #[command(visible_alias = "b")]
    Build {
        /// Environment: names starting with `prod` build for release,
        /// anything else (e.g. `dev`) builds for development
        #[arg(default_value = "production")]
        env: String,
    },

    /// Build for development, then rebuild on every source change
    #[command(visible_alias = "w")]
    Watch,
}

impl Cli {
    /// Profile selected by the subcommand.
    pub fn profile(&self) -> Profile {
        match &self.command {
            Commands::Build { env } => Profile::from_env_name(env),
            Commands::Watch => Profile::Development,
        }
    }

    pub const fn is_watch(&self) -> bool {
        matches!(self.command, Commands::Watch)
    }
}
