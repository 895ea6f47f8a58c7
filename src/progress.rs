//! Progress indicators for caixa CLI.

use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "  {prefix:.cyan} [{bar:30.cyan/dim}] {pos}/{len} {msg}";

/// Progress bar for a known number of steps
pub fn bar(len: u64, prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb
}

/// A bar that draws nothing, for quiet mode
pub fn hidden() -> ProgressBar {
    ProgressBar::hidden()
}

/// Replace the bar with a failure line
pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.set_style(message_style());
    pb.finish_with_message(format!("  ✗ {msg}"));
}

fn message_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_bar())
}
