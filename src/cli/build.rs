//! Build command implementation

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use futures_util::future::try_join_all;
use tracing::{debug, error, info};

use super::BuildArgs;
use crate::bundler::{
    build_matrix, unit_configs, Bundler, CommandBackend, Environment, Relocate, TypeRelocator,
    UnitConfig,
};
use crate::config::{Format, Hooks, NormalizedOptions};
use crate::utils::{self, Reporter};

/// Build your project once and exit
#[derive(Args, Debug)]
pub struct BuildCommand {
    #[command(flatten)]
    pub args: BuildArgs,
}

impl BuildCommand {
    pub async fn execute(
        &self,
        working_dir: &Path,
        config_path: &str,
        verbose: bool,
    ) -> Result<()> {
        let start = Instant::now();

        info!("Loading configuration from {}", config_path);
        let (project, options) = self
            .args
            .load(working_dir, config_path, verbose, Hooks::default())?;

        let units = build_matrix(&options);
        let configs = unit_configs(&options, &units, &project.overrides)?;
        debug!("Expanded {} build unit(s)", configs.len());

        if options.clean_before_build {
            utils::clean_dist(&options.out_dir).with_context(|| {
                format!("Failed to clean {}", options.out_dir.display())
            })?;
        }

        write_entry_shim(&options, &configs);

        eprintln!("{} Building {} unit(s)...", "→".blue(), configs.len());

        let mut reporter = Reporter::new();
        reporter.start("Building modules");

        let backend = CommandBackend::new(project.bundler.clone(), working_dir);
        let artifacts = match try_join_all(configs.iter().map(|c| backend.build(c))).await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                reporter.fail("Failed to compile");
                return Err(e.into());
            }
        };

        if let Err(e) = TypeRelocator::new(&options.out_dir).relocate() {
            reporter.fail("Failed to move type declarations");
            return Err(e.into());
        }

        reporter.succeed(&format!(
            "Built {} bundle(s) in {}",
            artifacts.len(),
            utils::format_duration(start.elapsed())
        ));

        // Print bundle summary
        for artifact in &artifacts {
            eprintln!(
                "  {} {} {}",
                "•".dimmed(),
                artifact.output_path.display().to_string().cyan(),
                utils::format_size(artifact.size).dimmed()
            );
        }

        eprintln!();

        Ok(())
    }
}

/// Write the CommonJS entry file when building a single cjs entry.
///
/// The file points at the cjs outputs actually configured, so overrides that
/// change minification are honoured. Failures are reported but do not stop
/// the build.
pub(super) fn write_entry_shim(options: &NormalizedOptions, configs: &[UnitConfig]) {
    if !options.formats.contains(&Format::Cjs) {
        return;
    }
    if options.entries.len() > 1 {
        debug!("Skipping CommonJS entry file for multiple entries");
        return;
    }

    let (Some(production), Some(development)) = (
        cjs_file_name(configs, Environment::Production),
        cjs_file_name(configs, Environment::Development),
    ) else {
        return;
    };

    if let Err(e) = utils::write_cjs_entry_file(&options.out_dir, &production, &development) {
        error!("Failed to create entry file: {}", e);
    }
}

/// Output of the cjs unit for `environment`, relative to its output directory
fn cjs_file_name(configs: &[UnitConfig], environment: Environment) -> Option<String> {
    let config = configs
        .iter()
        .find(|c| c.format == Format::Cjs && c.environment == environment)?;
    let output = config.output_path();
    let relative = output.strip_prefix(&config.out_dir).ok()?;
    Some(relative.to_string_lossy().into_owned())
}
