use std::error::Error;

use indicatif::ProgressBar;

use crate::terminal::{emoji, styles};

/// Where the orchestrator reports on attempts as they settle.
pub trait DeployProgress {
    /// Called exactly once per attempt, whether it succeeded or not.
    fn advance(&self);

    /// Called for every failed attempt, before `advance`. `name` is `None`
    /// when the attempt failed before it got one.
    fn report_failure(&self, name: Option<&str>, cause: &(dyn Error + 'static));
}

impl DeployProgress for ProgressBar {
    fn advance(&self) {
        self.inc(1);
    }

    fn report_failure(&self, name: Option<&str>, cause: &(dyn Error + 'static)) {
        // println keeps the message above the bar instead of tearing it.
        self.println(format!(
            "{} {} Failed to create worker {}: {}",
            emoji::WARN,
            styles::warning("Error:"),
            styles::bold(name.unwrap_or("<unnamed>")),
            cause
        ));
    }
}
