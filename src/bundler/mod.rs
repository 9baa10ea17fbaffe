//! Build matrix and bundler adapter
//!
//! Expands options into build units, translates them into bundler
//! configuration and defines the contract libpack expects from a bundler.

mod command;
mod matrix;
mod relocate;
mod unit;

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

pub use command::CommandBackend;
pub use matrix::{build_matrix, BuildUnit, Environment, UnitLabel};
pub use relocate::{Relocate, TypeRelocator};
pub use unit::{unit_configs, ConfigOverride, Passthrough, UnitConfig};

/// A file written by a one-shot build
#[derive(Debug)]
pub struct Artifact {
    pub output_path: PathBuf,

    /// Size in bytes, zero when the bundler wrote nothing at the expected path
    pub size: u64,
}

/// Lifecycle events emitted by a watching bundler
///
/// Every cycle opens with `Start` and closes with exactly one `Error` or `End`.
#[derive(Debug)]
pub enum BundlerEvent {
    Start,
    Error(Error),
    End,
}

/// Backend that turns unit configurations into bundles
#[async_trait]
pub trait Bundler: Send + Sync {
    /// Build a single unit once
    async fn build(&self, config: &UnitConfig) -> Result<Artifact>;

    /// Start watching; the subscription lives as long as the receiver
    fn watch(&self, configs: Vec<UnitConfig>) -> Result<mpsc::Receiver<BundlerEvent>>;
}
