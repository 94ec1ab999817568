//! Debounced search input: keystrokes replace a pending timer, and only a
//! timer that survives the whole quiet period commits its text.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::trace;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

pub struct SearchDebouncer {
    quiet: Duration,
    draft: String,
    timer: Option<JoinHandle<()>>,
    commits: mpsc::UnboundedSender<String>,
}

impl SearchDebouncer {
    /// Returns the debouncer and the receiving end of its commits. Must be
    /// used inside a tokio runtime since every keystroke spawns a timer task.
    pub fn new(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (commits, rx) = mpsc::unbounded_channel();
        (
            Self {
                quiet,
                draft: String::new(),
                timer: None,
                commits,
            },
            rx,
        )
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Raw text as typed, not yet committed.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_pending(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    pub fn input(&mut self, raw: impl Into<String>) {
        self.draft = raw.into();
        self.cancel_timer();

        let value = self.draft.trim().to_string();
        let quiet = self.quiet;
        let commits = self.commits.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            trace!(text = %value, "search: quiet period elapsed");
            let _ = commits.send(value);
        }));
    }

    /// Explicit confirm: drops the pending timer and returns the trimmed
    /// draft for immediate use.
    pub fn commit_now(&mut self) -> String {
        self.cancel_timer();
        self.draft.trim().to_string()
    }

    pub fn clear(&mut self) {
        self.cancel_timer();
        self.draft.clear();
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
