//! Terminal loading indicator shown while a provider request is in flight.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        Self { mode, is_tty }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, is_tty)
    }

    fn use_spinner(&self) -> bool {
        self.is_tty && self.mode != UiMode::Plain
    }

    /// Start a loading indicator; it stops when the guard is finished or dropped.
    pub fn loading(&self, what: &str) -> LoadingGuard {
        if self.use_spinner() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{what}…"));
            LoadingGuard::new(what.to_string(), Some(spinner))
        } else {
            eprintln!("==> {}", what);
            LoadingGuard::new(what.to_string(), None)
        }
    }
}

pub struct LoadingGuard {
    what: String,
    start: Instant,
    spinner: Option<ProgressBar>,
    outcome: Option<String>,
}

impl LoadingGuard {
    fn new(what: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            what,
            start: Instant::now(),
            spinner,
            outcome: None,
        }
    }

    /// Finish with a failure marker instead of the default check mark.
    pub fn fail(mut self, reason: &str) {
        self.outcome = Some(format!("✘ {} ({})", self.what, reason));
    }

    /// Finish for work whose result will be discarded.
    pub fn cancel(mut self) {
        self.mark_cancelled();
    }

    fn mark_cancelled(&mut self) {
        self.outcome = Some(format!("- {} (cancelled)", self.what));
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let message = self.outcome.take().unwrap_or_else(|| {
            format!("✔ {} ({})", self.what, format_duration(self.start.elapsed()))
        });
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
