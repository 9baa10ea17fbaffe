//! Terminal progress reporting

use std::time::Duration;

use colored::Colorize;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner and status lines shown while building
pub struct Reporter {
    spinner: Option<ProgressBar>,
    hidden: bool,
}

impl Reporter {
    /// Reporter drawing to stderr
    pub fn new() -> Self {
        Self {
            spinner: None,
            hidden: false,
        }
    }

    /// Reporter that draws nothing
    pub fn hidden() -> Self {
        Self {
            spinner: None,
            hidden: true,
        }
    }

    /// Start a spinner with the given message, replacing any current one
    pub fn start(&mut self, message: impl Into<String>) {
        if let Some(previous) = self.spinner.take() {
            previous.finish_and_clear();
        }

        let spinner = if self.hidden {
            ProgressBar::hidden()
        } else {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(80));
            spinner
        };

        spinner.set_message(message.into());
        self.spinner = Some(spinner);
    }

    /// Stop the spinner and print a success line
    pub fn succeed(&mut self, message: &str) {
        self.finish();
        if !self.hidden {
            eprintln!("{} {}", "✓".green().bold(), message.green().bold());
        }
    }

    /// Stop the spinner and print a failure line
    pub fn fail(&mut self, message: &str) {
        self.finish();
        if !self.hidden {
            eprintln!("{} {}", "✖".red().bold(), message.red().bold());
        }
    }

    /// Print a dimmed informational line
    pub fn note(&self, message: &str) {
        if !self.hidden {
            eprintln!("\n  {}\n", message.dimmed());
        }
    }

    /// Clear the terminal between watch cycles
    pub fn clear_screen(&self) {
        if !self.hidden {
            let _ = Term::stdout().clear_screen();
        }
    }

    fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}
