//! Translation of build units into bundler-facing configuration

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::config::{Format, NormalizedOptions, Target, UnitOverride};
use crate::error::{Error, Result};
use crate::utils::{safe_package_name, safe_variable_name};

use super::{BuildUnit, Environment, UnitLabel};

/// Configuration handed to the bundler for a single unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitConfig {
    pub input: PathBuf,
    pub format: Format,
    pub environment: Environment,
    pub target: Target,

    /// Global name for UMD bundles
    pub name: String,

    pub minify: bool,
    pub sourcemap: bool,
    pub write_meta: bool,

    pub out_dir: PathBuf,

    /// Output path stem, relative to `out_dir`, shared by every output of the
    /// same entry
    pub base_name: String,
}

impl UnitConfig {
    /// Default configuration for a unit
    pub fn from_unit(unit: &BuildUnit, options: &NormalizedOptions) -> Self {
        let base_name = if options.entries.len() > 1 {
            entry_base_name(&unit.entry, &source_root(&options.entries))
        } else {
            safe_package_name(&options.package_name)
        };

        Self {
            input: unit.entry.clone(),
            format: unit.format,
            environment: unit.environment,
            target: options.target,
            name: safe_variable_name(&options.package_name),
            minify: unit.environment == Environment::Production,
            sourcemap: options.sourcemap,
            write_meta: unit.write_meta,
            out_dir: options.out_dir.clone(),
            base_name,
        }
    }

    /// Output file, e.g. `dist/widgets.cjs.production.min.js`
    pub fn output_path(&self) -> PathBuf {
        let mut parts = vec![self.base_name.as_str(), self.format.as_str()];
        if let Some(env) = self.environment.name() {
            parts.push(env);
        }
        if self.minify {
            parts.push("min");
        }
        parts.push("js");

        self.out_dir.join(parts.join("."))
    }

    /// Human readable description used in logs and errors
    pub fn label(&self) -> String {
        UnitLabel::new(&self.input, self.format, self.environment).to_string()
    }
}

/// Deepest directory containing every entry
fn source_root(entries: &[PathBuf]) -> PathBuf {
    let mut root = entries
        .first()
        .and_then(|entry| entry.parent())
        .map(Path::to_path_buf)
        .unwrap_or_default();

    for entry in entries {
        while !entry.starts_with(&root) {
            if !root.pop() {
                break;
            }
        }
    }
    root
}

/// Entry path below `root` without its extension, e.g. `forms/index`
fn entry_base_name(entry: &Path, root: &Path) -> String {
    let relative = entry.strip_prefix(root).unwrap_or(entry).with_extension("");
    let parts: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        "index".to_string()
    } else {
        parts.join("/")
    }
}

/// Transform applied to every unit configuration after matrix expansion
pub trait ConfigOverride: Send + Sync {
    fn apply(&self, config: UnitConfig, unit: &BuildUnit) -> UnitConfig;
}

/// Leaves every configuration unchanged
pub struct Passthrough;

impl ConfigOverride for Passthrough {
    fn apply(&self, config: UnitConfig, _unit: &BuildUnit) -> UnitConfig {
        config
    }
}

/// Overrides from libpack.toml, applied in file order
impl ConfigOverride for Vec<UnitOverride> {
    fn apply(&self, config: UnitConfig, unit: &BuildUnit) -> UnitConfig {
        self.iter()
            .filter(|rule| rule.matches(unit))
            .fold(config, |config, rule| rule.apply(config))
    }
}

/// Map every unit to its configuration, one-to-one and in order.
///
/// Fails when two units would write the same output file.
pub fn unit_configs(
    options: &NormalizedOptions,
    units: &[BuildUnit],
    overrides: &dyn ConfigOverride,
) -> Result<Vec<UnitConfig>> {
    let configs: Vec<UnitConfig> = units
        .iter()
        .map(|unit| overrides.apply(UnitConfig::from_unit(unit, options), unit))
        .collect();

    let mut outputs: HashMap<PathBuf, &UnitConfig> = HashMap::new();
    for config in &configs {
        if let Some(previous) = outputs.insert(config.output_path(), config) {
            return Err(Error::OutputCollision {
                output: config.output_path(),
                first: previous.label(),
                second: config.label(),
            });
        }
    }

    Ok(configs)
}
