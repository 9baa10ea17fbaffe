//! Hook process management
//!
//! Watch mode runs user commands after builds. Each hook slot owns at most
//! one live process; starting a hook first terminates the previous process in
//! the same slot so repeated rebuilds never pile processes up.

mod process;

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, error, warn};

pub use process::{HookProcess, Launcher, ProcessLauncher};

/// Named hook slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookSlot {
    FirstSuccess,
    Success,
    Failure,
}

impl HookSlot {
    pub const ALL: [HookSlot; 3] = [HookSlot::FirstSuccess, HookSlot::Success, HookSlot::Failure];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookSlot::FirstSuccess => "first-success",
            HookSlot::Success => "success",
            HookSlot::Failure => "failure",
        }
    }
}

impl fmt::Display for HookSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hook command split on whitespace into program and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCommand {
    program: String,
    args: Vec<String>,
}

impl HookCommand {
    /// Tokenize a command string; blank strings yield `None`.
    ///
    /// No quoting or escaping is recognised.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut tokens = raw.split_whitespace().map(str::to_string);
        let program = tokens.next()?;
        Some(Self {
            program,
            args: tokens.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for HookCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Owns the process handle of every hook slot
pub struct HookProcessManager<L = ProcessLauncher> {
    launcher: L,
    slots: HashMap<HookSlot, Box<dyn HookProcess>>,
}

impl<L: Launcher> HookProcessManager<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            slots: HashMap::new(),
        }
    }

    /// Run `command` in `slot`, replacing whatever ran there before.
    ///
    /// An unset command leaves the slot untouched. Launch failures are logged
    /// and never propagated. Returns whether a process was started.
    pub async fn run(&mut self, slot: HookSlot, command: Option<&HookCommand>) -> bool {
        let Some(command) = command else {
            return false;
        };

        self.terminate(slot).await;

        match self.launcher.launch(command) {
            Ok(handle) => {
                debug!("Hook slot '{}' running '{}'", slot, command);
                self.slots.insert(slot, handle);
                true
            }
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    /// Terminate the process in `slot`, if any, and free the slot
    pub async fn terminate(&mut self, slot: HookSlot) {
        let Some(mut handle) = self.slots.remove(&slot) else {
            return;
        };

        if !handle.is_live() {
            return;
        }

        if let Err(e) = handle.terminate().await {
            warn!("Failed to stop '{}' hook: {}", slot, e);
        }
    }

    /// Terminate every live slot
    pub async fn terminate_all(&mut self) {
        for slot in HookSlot::ALL {
            self.terminate(slot).await;
        }
    }

    /// Whether `slot` currently holds a running process
    pub fn is_running(&mut self, slot: HookSlot) -> bool {
        self.slots.get_mut(&slot).is_some_and(|h| h.is_live())
    }
}
