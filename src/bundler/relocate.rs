//! Post-build metadata relocation
//!
//! Type declarations emitted with a project-wide `rootDir` land in
//! `<out_dir>/src`; they are moved up into `<out_dir>` after each build.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Step run once after every successful build cycle
pub trait Relocate: Send + Sync {
    fn relocate(&self) -> Result<()>;
}

/// Moves declarations from `<out_dir>/src` into `<out_dir>`
#[derive(Debug, Clone)]
pub struct TypeRelocator {
    out_dir: PathBuf,
}

impl TypeRelocator {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl Relocate for TypeRelocator {
    fn relocate(&self) -> Result<()> {
        let nested = self.out_dir.join("src");
        if !nested.is_dir() {
            return Ok(());
        }

        warn!(
            "Type declarations were emitted under {}; set \"rootDir\" to \"./src\" in tsconfig.json",
            nested.display()
        );

        let fail = |source: io::Error| Error::MetadataRelocation {
            path: nested.clone(),
            source,
        };

        copy_dir(&nested, &self.out_dir).map_err(fail)?;
        fs::remove_dir_all(&nested).map_err(fail)?;

        debug!("Relocated declarations into {}", self.out_dir.display());
        Ok(())
    }
}

/// Recursively copy `from` into `to`, overwriting existing files
fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
