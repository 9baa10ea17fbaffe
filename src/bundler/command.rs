//! Bundler backend that shells out to an external bundler

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::config::BundlerConfig;
use crate::error::{Error, Result};

use super::{Artifact, Bundler, BundlerEvent, UnitConfig};

/// Runs the configured bundler command once per unit
#[derive(Debug, Clone)]
pub struct CommandBackend {
    config: BundlerConfig,
    working_dir: PathBuf,
}

impl CommandBackend {
    pub fn new(config: BundlerConfig, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            working_dir: working_dir.into(),
        }
    }

    /// Arguments for a unit with every placeholder substituted
    pub fn arguments(&self, unit: &UnitConfig) -> Vec<String> {
        let mut templates: Vec<&String> = self.config.args.iter().collect();
        if unit.environment.name().is_some() {
            templates.extend(&self.config.env_args);
        }
        if unit.minify {
            templates.extend(&self.config.minify_args);
        }
        if unit.sourcemap {
            templates.extend(&self.config.sourcemap_args);
        }

        templates.into_iter().map(|t| expand(t, unit)).collect()
    }

    /// Build every unit concurrently, reporting the outcome as one cycle
    async fn run_cycle(&self, configs: &[UnitConfig], tx: &mpsc::Sender<BundlerEvent>) -> bool {
        if tx.send(BundlerEvent::Start).await.is_err() {
            return false;
        }

        let event = match try_join_all(configs.iter().map(|c| self.build(c))).await {
            Ok(_) => BundlerEvent::End,
            Err(e) => BundlerEvent::Error(e),
        };

        tx.send(event).await.is_ok()
    }
}

fn expand(template: &str, unit: &UnitConfig) -> String {
    template
        .replace("{input}", &unit.input.to_string_lossy())
        .replace("{output}", &unit.output_path().to_string_lossy())
        .replace("{format}", unit.format.as_str())
        .replace("{env}", unit.environment.name().unwrap_or(""))
        .replace("{name}", &unit.name)
        .replace("{target}", unit.target.as_str())
}

#[async_trait]
impl Bundler for CommandBackend {
    async fn build(&self, unit: &UnitConfig) -> Result<Artifact> {
        let args = self.arguments(unit);
        debug!("Running {} {}", self.config.command, args.join(" "));

        let output = Command::new(&self.config.command)
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::Compile {
                unit: unit.label(),
                message: format!("failed to run `{}`: {}", self.config.command, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => format!("`{}` exited with {}", self.config.command, output.status),
                diagnostic => diagnostic.to_string(),
            };
            return Err(Error::Compile {
                unit: unit.label(),
                message,
            });
        }

        let output_path = unit.output_path();
        let size = tokio::fs::metadata(&output_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(Artifact { output_path, size })
    }

    fn watch(&self, configs: Vec<UnitConfig>) -> Result<mpsc::Receiver<BundlerEvent>> {
        let watch_dir = self.working_dir.join(&self.config.watch_dir);

        let (fs_tx, fs_rx) = std::sync::mpsc::channel();
        let mut debouncer = new_debouncer(Duration::from_millis(100), fs_tx)?;
        debouncer
            .watcher()
            .watch(&watch_dir, RecursiveMode::Recursive)?;

        let (change_tx, mut change_rx) = mpsc::unbounded_channel::<()>();

        // The debouncer is moved into the thread to keep it alive
        std::thread::spawn(move || {
            let _debouncer = debouncer;

            loop {
                match fs_rx.recv() {
                    Ok(Ok(events)) => {
                        if !events.is_empty() && change_tx.send(()).is_err() {
                            break;
                        }
                    }
                    Ok(Err(e)) => {
                        error!("Watch error: {:?}", e);
                    }
                    Err(_) => break,
                }
            }
        });

        let (tx, rx) = mpsc::channel(16);
        let backend = self.clone();

        tokio::spawn(async move {
            loop {
                if !backend.run_cycle(&configs, &tx).await {
                    break;
                }
                if change_rx.recv().await.is_none() {
                    break;
                }
                // Changes that arrived during the build are covered by the next cycle
                while change_rx.try_recv().is_ok() {}
            }
            debug!("Watch loop stopped");
        });

        Ok(rx)
    }
}
