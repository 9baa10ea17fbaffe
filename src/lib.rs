//! Libpack library
//!
//! Build matrix expansion, entry resolution and watch-mode orchestration
//! for packaging JavaScript and TypeScript libraries.

pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;
pub mod hooks;
pub mod resolver;
pub mod utils;
pub mod watch;

pub use bundler::{build_matrix, BuildUnit, Bundler};
pub use cli::Cli;
pub use config::NormalizedOptions;
pub use error::{Error, Result};
pub use watch::WatchOrchestrator;
