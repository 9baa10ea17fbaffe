//! Error types for libpack

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving, building or watching a library
#[derive(Debug, Error)]
pub enum Error {
    #[error("No entry points found in {}", .0.display())]
    NoEntryFound(PathBuf),

    #[error("Failed to compile {unit}: {message}")]
    Compile { unit: String, message: String },

    #[error("{first} and {second} would both write {}", .output.display())]
    OutputCollision {
        output: PathBuf,
        first: String,
        second: String,
    },

    #[error("Failed to launch hook command '{command}': {source}")]
    HookSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to relocate build metadata from {}: {source}", .path.display())]
    MetadataRelocation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown module format '{0}' (expected cjs, esm, es, umd or system)")]
    InvalidFormat(String),

    #[error("Unknown target '{0}' (expected browser or node)")]
    InvalidTarget(String),

    #[error("Invalid entry pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
