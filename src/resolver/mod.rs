//! Entry point resolution
//!
//! Turns entry specifications (explicit globs, the package.json `source`
//! field or the conventional `src/index`) into absolute file paths.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Extensions tried for `src/index`, in priority order
const INDEX_EXTENSIONS: [&str; 3] = ["ts", "tsx", "jsx"];

/// Extension assumed when none of the candidate files exist
const FALLBACK_EXTENSION: &str = "js";

/// Resolve entry points relative to `working_dir`.
///
/// Explicit entries win over the conventional source hint, which wins over
/// looking for `src/index`. Explicit entries and the hint are expanded as globs,
/// the `src/index` file is taken as a literal path. The result is deduplicated and
/// keeps the order in which matches were found.
pub fn resolve(
    working_dir: &Path,
    explicit: &[String],
    conventional_hint: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let candidates = if !explicit.is_empty() {
        expand_all(working_dir, explicit)?
    } else if let Some(hint) = conventional_hint.filter(|h| !h.is_empty()) {
        expand(working_dir, hint)?
    } else if working_dir.join("src").is_dir() {
        // A literal file, never a pattern
        let index = find_index(working_dir);
        if index.is_file() {
            vec![index]
        } else {
            Vec::new()
        }
    } else {
        Vec::new()
    };

    let mut seen = HashSet::new();
    let entries: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect();

    if entries.is_empty() {
        return Err(Error::NoEntryFound(working_dir.to_path_buf()));
    }

    debug!("Resolved {} entry point(s)", entries.len());
    Ok(entries)
}

fn expand_all(working_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut matches = Vec::new();
    for pattern in patterns {
        matches.extend(expand(working_dir, pattern)?);
    }
    Ok(matches)
}

/// Pick the `src/index` file to build.
///
/// The `.js` fallback is returned without checking that it exists.
pub fn find_index(working_dir: &Path) -> PathBuf {
    let base = working_dir.join("src").join("index");

    for ext in INDEX_EXTENSIONS {
        let candidate = base.with_extension(ext);
        if candidate.is_file() {
            return candidate;
        }
    }

    base.with_extension(FALLBACK_EXTENSION)
}

/// Expand a single pattern into the files it matches
fn expand(working_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    let pattern_path = Path::new(pattern);

    if !is_glob(pattern) {
        let path = working_dir.join(pattern_path);
        return Ok(if path.is_file() { vec![path] } else { Vec::new() });
    }

    let (full_pattern, base) = if pattern_path.is_absolute() {
        (pattern.to_string(), literal_prefix(pattern_path))
    } else {
        let root = globset::escape(&working_dir.to_string_lossy());
        (
            format!("{}/{}", root.trim_end_matches('/'), pattern),
            working_dir.join(literal_prefix(pattern_path)),
        )
    };

    let matcher = GlobBuilder::new(&full_pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    let mut matches = Vec::new();
    for entry in WalkDir::new(&base).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable path while globbing: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && matcher.is_match(entry.path()) {
            matches.push(entry.into_path());
        }
    }

    debug!("Pattern '{}' matched {} file(s)", pattern, matches.len());
    Ok(matches)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Leading components of a pattern that contain no glob syntax
fn literal_prefix(pattern: &Path) -> PathBuf {
    let mut base = PathBuf::new();
    for component in pattern.components() {
        if is_glob(&component.as_os_str().to_string_lossy()) {
            break;
        }
        base.push(component);
    }
    base
}
