//! Configuration schema definitions

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Format;
use crate::bundler::{BuildUnit, Environment, UnitConfig};

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory, relative to the project root
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Emit source maps alongside every bundle
    #[serde(default = "default_true")]
    pub sourcemap: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            sourcemap: true,
        }
    }
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_true() -> bool {
    true
}

/// External bundler invocation
///
/// Every argument may contain the placeholders `{input}`, `{output}`,
/// `{format}`, `{env}`, `{name}` and `{target}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundlerConfig {
    /// Bundler executable
    #[serde(default = "default_bundler_command")]
    pub command: String,

    /// Arguments passed for every unit
    #[serde(default = "default_bundler_args")]
    pub args: Vec<String>,

    /// Arguments appended when the unit targets a specific environment
    #[serde(default = "default_env_args")]
    pub env_args: Vec<String>,

    /// Arguments appended for minified units
    #[serde(default = "default_minify_args")]
    pub minify_args: Vec<String>,

    /// Arguments appended when source maps are enabled
    #[serde(default = "default_sourcemap_args")]
    pub sourcemap_args: Vec<String>,

    /// Directory watched for changes in watch mode
    #[serde(default = "default_watch_dir")]
    pub watch_dir: String,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            command: default_bundler_command(),
            args: default_bundler_args(),
            env_args: default_env_args(),
            minify_args: default_minify_args(),
            sourcemap_args: default_sourcemap_args(),
            watch_dir: default_watch_dir(),
        }
    }
}

fn default_bundler_command() -> String {
    "rollup".to_string()
}

fn default_bundler_args() -> Vec<String> {
    ["-i", "{input}", "-o", "{output}", "-f", "{format}", "-n", "{name}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_env_args() -> Vec<String> {
    vec!["--environment".to_string(), "NODE_ENV:{env}".to_string()]
}

fn default_minify_args() -> Vec<String> {
    vec!["--plugin".to_string(), "terser".to_string()]
}

fn default_sourcemap_args() -> Vec<String> {
    vec!["--sourcemap".to_string()]
}

fn default_watch_dir() -> String {
    "src".to_string()
}

/// Per-unit override, applied after the build matrix is expanded
///
/// Selectors left empty match every unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcemap: Option<bool>,

    /// Global name exposed by UMD bundles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UnitOverride {
    /// Whether this override selects the given unit
    pub fn matches(&self, unit: &BuildUnit) -> bool {
        self.format.map_or(true, |f| f == unit.format)
            && self.environment.map_or(true, |e| e == unit.environment)
    }

    /// Apply the configured fields to a unit configuration
    pub fn apply(&self, mut config: UnitConfig) -> UnitConfig {
        if let Some(minify) = self.minify {
            config.minify = minify;
        }
        if let Some(sourcemap) = self.sourcemap {
            config.sourcemap = sourcemap;
        }
        if let Some(name) = &self.name {
            config.name = name.clone();
        }
        config
    }
}

/// The subset of package.json libpack reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub name: Option<String>,

    /// Conventional source entry
    #[serde(default)]
    pub source: Option<String>,
}

impl PackageJson {
    /// Read package.json from a project directory.
    ///
    /// A missing or malformed manifest is treated as empty.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join("package.json");
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No readable package.json at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            debug!("Ignoring malformed package.json: {}", e);
            Self::default()
        })
    }
}
