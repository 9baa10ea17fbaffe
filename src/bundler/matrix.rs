//! Build matrix expansion

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{Format, NormalizedOptions};

/// Value of `NODE_ENV` a unit is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    /// Environment-agnostic output (ES modules)
    None,
}

impl Environment {
    /// Name of the environment, if the unit has one
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Environment::Development => Some("development"),
            Environment::Production => Some("production"),
            Environment::None => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("none"))
    }
}

impl Format {
    /// Environments a format is split into
    pub fn environments(&self) -> &'static [Environment] {
        match self {
            Format::Esm => &[Environment::None],
            _ => &[Environment::Development, Environment::Production],
        }
    }
}

/// One unit of work for the bundler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildUnit {
    pub entry: PathBuf,
    pub format: Format,
    pub environment: Environment,

    /// Set on the first unit of each entry so per-entry side effects run once
    pub write_meta: bool,
}

impl fmt::Display for BuildUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&UnitLabel::new(&self.entry, self.format, self.environment), f)
    }
}

/// Formats a unit as `src/index.ts (cjs, production)` or `src/index.ts (esm)`
pub struct UnitLabel<'a> {
    entry: &'a Path,
    format: Format,
    environment: Environment,
}

impl<'a> UnitLabel<'a> {
    pub fn new(entry: &'a Path, format: Format, environment: Environment) -> Self {
        Self {
            entry,
            format,
            environment,
        }
    }
}

impl fmt::Display for UnitLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.environment.name() {
            Some(env) => write!(f, "{} ({}, {})", self.entry.display(), self.format, env),
            None => write!(f, "{} ({})", self.entry.display(), self.format),
        }
    }
}

/// Expand options into the ordered list of build units.
///
/// Entries are the outer loop, `(format, environment)` pairs the inner one.
pub fn build_matrix(options: &NormalizedOptions) -> Vec<BuildUnit> {
    let mut units = Vec::new();

    for entry in &options.entries {
        let pairs = options.formats.iter().flat_map(|format| {
            format
                .environments()
                .iter()
                .map(move |environment| (*format, *environment))
        });

        for (index, (format, environment)) in pairs.enumerate() {
            units.push(BuildUnit {
                entry: entry.clone(),
                format,
                environment,
                write_meta: index == 0,
            });
        }
    }

    units
}
