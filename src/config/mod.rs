//! Configuration handling for libpack
//!
//! Combines command-line options, package.json and the optional
//! libpack.toml into the immutable [`NormalizedOptions`] for one invocation.

mod schema;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::hooks::HookCommand;
use crate::resolver;

pub use schema::*;

/// Output module format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Cjs,
    #[serde(alias = "es")]
    Esm,
    Umd,
    System,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Cjs => "cjs",
            Format::Esm => "esm",
            Format::Umd => "umd",
            Format::System => "system",
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cjs" => Ok(Format::Cjs),
            "esm" | "es" => Ok(Format::Esm),
            "umd" => Ok(Format::Umd),
            "system" => Ok(Format::System),
            other => Err(Error::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a comma-separated format list, keeping the first occurrence of each
pub fn parse_formats(list: &str) -> Result<Vec<Format>> {
    let mut formats = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let format: Format = part.parse()?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }

    if formats.is_empty() {
        return Err(Error::InvalidFormat(list.to_string()));
    }
    Ok(formats)
}

/// Runtime the library is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Browser,
    Node,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Browser => "browser",
            Target::Node => "node",
        }
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "browser" => Ok(Target::Browser),
            "node" => Ok(Target::Node),
            other => Err(Error::InvalidTarget(other.to_string())),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hook commands run by watch mode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hooks {
    pub first_success: Option<HookCommand>,
    pub success: Option<HookCommand>,
    pub failure: Option<HookCommand>,
}

impl Hooks {
    /// Build hooks from raw command strings; blank strings mean unset
    pub fn from_commands(
        first_success: Option<&str>,
        success: Option<&str>,
        failure: Option<&str>,
    ) -> Self {
        Self {
            first_success: first_success.and_then(HookCommand::parse),
            success: success.and_then(HookCommand::parse),
            failure: failure.and_then(HookCommand::parse),
        }
    }
}

/// Project configuration read from libpack.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub bundler: BundlerConfig,

    #[serde(default)]
    pub overrides: Vec<UnitOverride>,
}

impl ProjectConfig {
    /// Load configuration relative to the working directory.
    ///
    /// The file is optional; defaults apply when it does not exist.
    pub fn load(working_dir: &Path, path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = working_dir.join(path);
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Options as supplied on the command line, before normalization
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub entries: Vec<String>,
    pub target: String,
    pub name: Option<String>,
    pub format: String,
    pub no_clean: bool,
    pub verbose: bool,
    pub hooks: Hooks,
}

/// Fully resolved options for a single invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedOptions {
    /// Project root all relative paths resolve against
    pub working_dir: PathBuf,

    /// Resolved entry files, non-empty and free of duplicates
    pub entries: Vec<PathBuf>,

    /// Requested formats in the order supplied
    pub formats: Vec<Format>,

    pub package_name: String,
    pub target: Target,
    pub clean_before_build: bool,
    pub hooks: Hooks,

    /// Keep previous output on screen between watch cycles
    pub verbose: bool,

    pub out_dir: PathBuf,
    pub sourcemap: bool,
}

/// Normalize command-line options against a project directory
pub fn normalize(
    cli: CliOptions,
    working_dir: &Path,
    project: &ProjectConfig,
) -> Result<NormalizedOptions> {
    let package = PackageJson::load(working_dir);

    let formats = parse_formats(&cli.format)?;
    let target: Target = cli.target.parse()?;
    let entries = resolver::resolve(working_dir, &cli.entries, package.source.as_deref())?;

    let package_name = match cli.name.filter(|n| !n.is_empty()).or(package.name) {
        Some(name) if name == "." => dir_name(working_dir),
        Some(name) => name,
        None => dir_name(working_dir),
    };

    Ok(NormalizedOptions {
        working_dir: working_dir.to_path_buf(),
        entries,
        formats,
        package_name,
        target,
        clean_before_build: !cli.no_clean,
        hooks: cli.hooks,
        verbose: cli.verbose,
        out_dir: working_dir.join(&project.output.dir),
        sourcemap: project.output.sourcemap,
    })
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
