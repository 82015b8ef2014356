//! Progress indicators for berks-deploy

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A steady spinner for a single long-running step
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg} {elapsed:.dim}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Clear the spinner so the caller can print a final status line
pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}
