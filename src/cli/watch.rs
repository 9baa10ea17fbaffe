//! Watch command implementation

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::{debug, info};

use super::build::write_entry_shim;
use super::BuildArgs;
use crate::bundler::{build_matrix, unit_configs, Bundler, CommandBackend, TypeRelocator};
use crate::config::Hooks;
use crate::hooks::{HookProcessManager, ProcessLauncher};
use crate::utils::{self, Reporter};
use crate::watch::WatchOrchestrator;

/// Rebuild on any change
#[derive(Args, Debug)]
pub struct WatchCommand {
    #[command(flatten)]
    pub args: BuildArgs,

    /// Command to run after the first successful build
    #[arg(long)]
    pub on_first_success: Option<String>,

    /// Command to run after every successful build
    #[arg(long)]
    pub on_success: Option<String>,

    /// Command to run after a failed build
    #[arg(long)]
    pub on_failure: Option<String>,
}

impl WatchCommand {
    pub async fn execute(
        &self,
        working_dir: &Path,
        config_path: &str,
        verbose: bool,
    ) -> Result<()> {
        info!("Loading configuration from {}", config_path);

        let hooks = Hooks::from_commands(
            self.on_first_success.as_deref(),
            self.on_success.as_deref(),
            self.on_failure.as_deref(),
        );
        let (project, options) = self.args.load(working_dir, config_path, verbose, hooks)?;

        let units = build_matrix(&options);
        let configs = unit_configs(&options, &units, &project.overrides)?;
        debug!("Watching {} build unit(s)", configs.len());

        if options.clean_before_build {
            utils::clean_dist(&options.out_dir).with_context(|| {
                format!("Failed to clean {}", options.out_dir.display())
            })?;
        }

        write_entry_shim(&options, &configs);

        let backend = CommandBackend::new(project.bundler.clone(), working_dir);
        let events = backend
            .watch(configs)
            .with_context(|| format!("Failed to watch {}", project.bundler.watch_dir))?;

        eprintln!(
            "{} Watching {} for changes, press {} to stop\n",
            "→".blue(),
            project.bundler.watch_dir.cyan(),
            "Ctrl+C".yellow()
        );

        let manager = HookProcessManager::new(ProcessLauncher::new(working_dir));
        let mut orchestrator = WatchOrchestrator::new(
            &options,
            manager,
            TypeRelocator::new(&options.out_dir),
            Reporter::new(),
        );

        orchestrator.run(events).await;

        Ok(())
    }
}
