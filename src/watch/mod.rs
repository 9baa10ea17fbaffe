//! Watch-mode orchestration
//!
//! Consumes the bundler's event stream one event at a time, tracks the
//! state of the current build cycle and fires the configured hooks.

use std::future::Future;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::bundler::{BundlerEvent, Relocate};
use crate::config::{Hooks, NormalizedOptions};
use crate::hooks::{HookProcessManager, HookSlot, Launcher};
use crate::utils::Reporter;

/// Phase of the current build cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Compiling,
    Succeeded,
    Failed,
}

/// State of one watch session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchCycleState {
    pub phase: Phase,

    /// Set after the first successful cycle, never reset
    pub has_seen_first_success: bool,
}

impl Default for WatchCycleState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            has_seen_first_success: false,
        }
    }
}

/// Drives a watch session from bundler events
pub struct WatchOrchestrator<L: Launcher, R: Relocate> {
    hooks: Hooks,
    verbose: bool,
    state: WatchCycleState,
    manager: HookProcessManager<L>,
    relocator: R,
    reporter: Reporter,
}

impl<L: Launcher, R: Relocate> WatchOrchestrator<L, R> {
    pub fn new(
        options: &NormalizedOptions,
        manager: HookProcessManager<L>,
        relocator: R,
        reporter: Reporter,
    ) -> Self {
        Self {
            hooks: options.hooks.clone(),
            verbose: options.verbose,
            state: WatchCycleState::default(),
            manager,
            relocator,
            reporter,
        }
    }

    pub fn state(&self) -> WatchCycleState {
        self.state
    }

    /// Apply a single bundler event
    pub async fn handle_event(&mut self, event: BundlerEvent) {
        match (self.state.phase, event) {
            (Phase::Compiling, BundlerEvent::Start) => {
                debug!("Ignoring start event while already compiling");
            }
            (_, BundlerEvent::Start) => self.on_start().await,
            (Phase::Compiling, BundlerEvent::Error(err)) => {
                self.state.phase = Phase::Failed;
                self.reporter.fail("Failed to compile");
                error!("{}", err);
                self.manager.run(HookSlot::Failure, self.hooks.failure.as_ref()).await;
                self.reporter.note("Watching for changes");
            }
            (Phase::Compiling, BundlerEvent::End) => self.on_end().await,
            (phase, event) => {
                debug!("Ignoring {:?} while {:?}", event, phase);
            }
        }
    }

    async fn on_start(&mut self) {
        // Hooks from the previous cycle must not pile up
        self.manager.terminate(HookSlot::Success).await;
        self.manager.terminate(HookSlot::Failure).await;

        if !self.verbose {
            self.reporter.clear_screen();
        }
        self.state.phase = Phase::Compiling;
        self.reporter.start("Compiling modules...");
    }

    async fn on_end(&mut self) {
        self.state.phase = Phase::Succeeded;
        self.reporter.succeed("Compiled successfully");
        self.reporter.note("Watching for changes");

        // Watch mode keeps running when relocation fails; one-shot builds do not
        if let Err(e) = self.relocator.relocate() {
            debug!("Ignoring relocation failure in watch mode: {}", e);
        }

        match &self.hooks.first_success {
            Some(command) if !self.state.has_seen_first_success => {
                self.state.has_seen_first_success = true;
                self.manager.run(HookSlot::FirstSuccess, Some(command)).await;
            }
            _ => {
                self.manager.run(HookSlot::Success, self.hooks.success.as_ref()).await;
            }
        }
    }

    /// Consume events until the stream closes or `shutdown` resolves,
    /// then stop every hook process
    pub async fn run_until<F>(&mut self, mut events: mpsc::Receiver<BundlerEvent>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        debug!("Bundler event stream closed");
                        break;
                    }
                },
                _ = &mut shutdown => {
                    info!("Stopping watch mode");
                    break;
                }
            }
        }

        self.manager.terminate_all().await;
    }

    /// Run until the stream closes or Ctrl+C is pressed
    pub async fn run(&mut self, events: mpsc::Receiver<BundlerEvent>) {
        self.run_until(events, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::config::{Format, Target};
    use crate::error::{Error, Result};
    use crate::hooks::testing::RecordingLauncher;
    use pretty_assertions::assert_eq;

    #[derive(Default, Clone)]
    struct CountingRelocator {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Relocate for CountingRelocator {
        fn relocate(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::MetadataRelocation {
                    path: PathBuf::from("/project/dist/src"),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            Ok(())
        }
    }

    fn options(hooks: Hooks) -> NormalizedOptions {
        NormalizedOptions {
            working_dir: PathBuf::from("/project"),
            entries: vec![PathBuf::from("/project/src/index.ts")],
            formats: vec![Format::Cjs],
            package_name: "widgets".to_string(),
            target: Target::Browser,
            clean_before_build: true,
            hooks,
            verbose: true,
            out_dir: PathBuf::from("/project/dist"),
            sourcemap: true,
        }
    }

    fn orchestrator(
        hooks: Hooks,
        relocator: CountingRelocator,
    ) -> (WatchOrchestrator<RecordingLauncher, CountingRelocator>, RecordingLauncher) {
        let launcher = RecordingLauncher::default();
        let manager = HookProcessManager::new(launcher.clone());
        let orchestrator =
            WatchOrchestrator::new(&options(hooks), manager, relocator, Reporter::hidden());
        (orchestrator, launcher)
    }

    fn compile_error() -> BundlerEvent {
        BundlerEvent::Error(Error::Compile {
            unit: "/project/src/index.ts (cjs, development)".to_string(),
            message: "Unexpected token".to_string(),
        })
    }

    #[tokio::test]
    async fn test_first_success_fires_once() {
        let hooks = Hooks::from_commands(Some("echo first"), Some("echo again"), None);
        let (mut watch, launcher) = orchestrator(hooks, CountingRelocator::default());

        for event in [
            BundlerEvent::Start,
            BundlerEvent::End,
            BundlerEvent::Start,
            BundlerEvent::End,
        ] {
            watch.handle_event(event).await;
        }

        assert_eq!(launcher.spawned("echo first"), 1);
        assert_eq!(launcher.spawned("echo again"), 1);
        assert_eq!(
            launcher.entries(),
            vec!["spawn echo first #1", "spawn echo again #2"]
        );

        for event in [BundlerEvent::Start, BundlerEvent::End] {
            watch.handle_event(event).await;
        }
        assert_eq!(launcher.spawned("echo first"), 1);
        assert_eq!(launcher.spawned("echo again"), 2);
        assert!(watch.state().has_seen_first_success);
    }

    #[tokio::test]
    async fn test_success_hook_runs_on_first_cycle_without_first_success_hook() {
        let hooks = Hooks::from_commands(None, Some("echo ok"), None);
        let (mut watch, launcher) = orchestrator(hooks, CountingRelocator::default());

        watch.handle_event(BundlerEvent::Start).await;
        watch.handle_event(BundlerEvent::End).await;

        assert_eq!(launcher.spawned("echo ok"), 1);
        assert_eq!(watch.state().phase, Phase::Succeeded);
    }

    #[tokio::test]
    async fn test_failure_hook_fires_on_error() {
        let hooks = Hooks::from_commands(Some("echo first"), Some("echo ok"), Some("echo broken"));
        let (mut watch, launcher) = orchestrator(hooks, CountingRelocator::default());

        watch.handle_event(BundlerEvent::Start).await;
        watch.handle_event(compile_error()).await;

        assert_eq!(launcher.entries(), vec!["spawn echo broken #1"]);
        assert_eq!(watch.state().phase, Phase::Failed);
        assert!(!watch.state().has_seen_first_success);
    }

    #[tokio::test]
    async fn test_start_terminates_success_and_failure_but_not_first_success() {
        let hooks = Hooks::from_commands(Some("serve"), Some("echo ok"), Some("echo broken"));
        let (mut watch, launcher) = orchestrator(hooks, CountingRelocator::default());

        // first-success (#1), failure (#2), success (#3)
        for event in [
            BundlerEvent::Start,
            BundlerEvent::End,
            BundlerEvent::Start,
            compile_error(),
            BundlerEvent::Start,
            BundlerEvent::End,
            BundlerEvent::Start,
        ] {
            watch.handle_event(event).await;
        }

        assert_eq!(
            launcher.entries(),
            vec![
                "spawn serve #1",
                "spawn echo broken #2",
                "terminate #2",
                "spawn echo ok #3",
                "terminate #3",
            ]
        );
        assert_eq!(watch.state().phase, Phase::Compiling);
    }

    #[tokio::test]
    async fn test_events_outside_compiling_are_ignored() {
        let hooks = Hooks::from_commands(Some("echo first"), Some("echo ok"), Some("echo broken"));
        let relocator = CountingRelocator::default();
        let (mut watch, launcher) = orchestrator(hooks, relocator.clone());

        watch.handle_event(BundlerEvent::End).await;
        watch.handle_event(compile_error()).await;

        assert!(launcher.entries().is_empty());
        assert_eq!(relocator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(watch.state(), WatchCycleState::default());
    }

    #[tokio::test]
    async fn test_relocation_failure_is_swallowed_in_watch_mode() {
        // Documented behavior: unlike one-shot builds, watch mode keeps going
        let relocator = CountingRelocator {
            fail: true,
            ..Default::default()
        };
        let hooks = Hooks::from_commands(None, Some("echo ok"), None);
        let (mut watch, launcher) = orchestrator(hooks, relocator.clone());

        watch.handle_event(BundlerEvent::Start).await;
        watch.handle_event(BundlerEvent::End).await;

        assert_eq!(relocator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(watch.state().phase, Phase::Succeeded);
        assert_eq!(launcher.spawned("echo ok"), 1);
    }

    #[tokio::test]
    async fn test_run_until_stream_closes_terminates_hooks() {
        let hooks = Hooks::from_commands(Some("serve"), None, None);
        let (mut watch, launcher) = orchestrator(hooks, CountingRelocator::default());

        let (tx, rx) = mpsc::channel(8);
        tx.send(BundlerEvent::Start).await.unwrap();
        tx.send(BundlerEvent::End).await.unwrap();
        drop(tx);

        watch.run_until(rx, std::future::pending()).await;

        assert_eq!(launcher.entries(), vec!["spawn serve #1", "terminate #1"]);
        assert_eq!(watch.state().phase, Phase::Succeeded);
    }

    #[tokio::test]
    async fn test_run_until_shutdown_signal() {
        let hooks = Hooks::from_commands(None, Some("echo ok"), None);
        let (mut watch, launcher) = orchestrator(hooks, CountingRelocator::default());

        let (tx, rx) = mpsc::channel(8);
        tx.send(BundlerEvent::Start).await.unwrap();
        tx.send(BundlerEvent::End).await.unwrap();

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            watch
                .run_until(rx, async {
                    let _ = stop_rx.await;
                })
                .await;
            watch
        });

        // Let the queued events drain before stopping
        while launcher.spawned("echo ok") == 0 {
            tokio::task::yield_now().await;
        }
        stop_tx.send(()).unwrap();
        let watch = handle.await.unwrap();

        assert_eq!(launcher.entries(), vec!["spawn echo ok #1", "terminate #1"]);
        assert_eq!(watch.state().phase, Phase::Succeeded);
        drop(tx);
    }
}
