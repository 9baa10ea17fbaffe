//! Command-line interface for libpack
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `build`: Build every unit once and exit
//! - `watch`: Rebuild on change and run hooks

mod build;
mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::config::{self, CliOptions, Hooks, NormalizedOptions, ProjectConfig};

pub use build::BuildCommand;
pub use watch::WatchCommand;

/// Libpack - zero-config bundling for JavaScript and TypeScript libraries
#[derive(Parser, Debug)]
#[command(name = "libpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output; in watch mode, keep previous output instead of clearing the screen
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to libpack.toml config file
    #[arg(short, long, global = true, default_value = "libpack.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build your project once and exit
    Build(BuildCommand),

    /// Rebuild on any change
    Watch(WatchCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        let working_dir = std::env::current_dir().context("Failed to read working directory")?;

        match &self.command {
            Commands::Build(cmd) => cmd.execute(&working_dir, &self.config, self.verbose).await,
            Commands::Watch(cmd) => cmd.execute(&working_dir, &self.config, self.verbose).await,
        }
    }
}

/// Options shared by `build` and `watch`
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Entry module(s); glob patterns are expanded
    #[arg(short, long)]
    pub entry: Vec<String>,

    /// Target environment (browser, node)
    #[arg(long, default_value = "browser")]
    pub target: String,

    /// Name exposed in UMD builds
    #[arg(long)]
    pub name: Option<String>,

    /// Module format(s), comma separated (cjs, esm, umd, system)
    #[arg(long, default_value = "cjs,esm")]
    pub format: String,

    /// Don't clean the dist folder
    #[arg(long)]
    pub no_clean: bool,
}

impl BuildArgs {
    /// Load project configuration and normalize options against `working_dir`
    pub fn load(
        &self,
        working_dir: &Path,
        config_path: &str,
        verbose: bool,
        hooks: Hooks,
    ) -> Result<(ProjectConfig, NormalizedOptions)> {
        let project = ProjectConfig::load(working_dir, config_path)?;

        let cli = CliOptions {
            entries: self.entry.clone(),
            target: self.target.clone(),
            name: self.name.clone(),
            format: self.format.clone(),
            no_clean: self.no_clean,
            verbose,
            hooks,
        };
        let options = config::normalize(cli, working_dir, &project)?;

        Ok((project, options))
    }
}

/// Print the libpack banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "◆".cyan(),
        "libpack".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
