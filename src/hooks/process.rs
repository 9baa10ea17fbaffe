//! Hook process launching and termination

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::{Error, Result};

use super::HookCommand;

/// An owned handle to a running hook process
#[async_trait]
pub trait HookProcess: Send {
    /// Ask the process to stop.
    ///
    /// Returns once the request has been delivered, not when the process has
    /// exited. Terminating a process that already exited is a no-op.
    async fn terminate(&mut self) -> std::io::Result<()>;

    /// Whether the process is still running
    fn is_live(&mut self) -> bool;
}

/// Starts hook processes
pub trait Launcher: Send + Sync {
    fn launch(&self, command: &HookCommand) -> Result<Box<dyn HookProcess>>;
}

/// Launches hooks as child processes sharing the terminal
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    working_dir: PathBuf,
}

impl ProcessLauncher {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self, command: &HookCommand) -> Result<Box<dyn HookProcess>> {
        let child = Command::new(command.program())
            .args(command.args())
            .current_dir(&self.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| Error::HookSpawn {
                command: command.to_string(),
                source,
            })?;

        debug!("Started hook '{}' (pid {:?})", command, child.id());
        Ok(Box::new(ChildProcess { child }))
    }
}

/// A hook running as a child process
struct ChildProcess {
    child: Child,
}

#[async_trait]
impl HookProcess for ChildProcess {
    async fn terminate(&mut self) -> std::io::Result<()> {
        if !self.is_live() {
            return Ok(());
        }

        #[cfg(unix)]
        {
            use nix::errno::Errno;
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let Some(pid) = self.child.id() else {
                return Ok(());
            };

            match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                Ok(()) | Err(Errno::ESRCH) => Ok(()),
                Err(e) => Err(e.into()),
            }
        }

        #[cfg(not(unix))]
        {
            self.child.start_kill()
        }
    }

    fn is_live(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}
