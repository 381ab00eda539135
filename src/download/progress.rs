//! Progress reporting for file transfers.
//!
//! The downloader reports cumulative bytes written after every chunk through
//! a [`TransferTracker`]. Rendering is pluggable: [`ProgressBars`] draws one
//! indicatif bar per in-flight file, [`NoProgress`] discards everything.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Creates a tracker for each transfer that starts.
pub trait TransferProgress: Send + Sync {
    /// Called once a transfer is about to stream its body.
    fn begin(&self, label: &str, total: Option<u64>) -> Box<dyn TransferTracker>;
}

/// Receives progress updates for one transfer.
pub trait TransferTracker: Send + Sync {
    /// Cumulative bytes written so far.
    fn set_position(&self, bytes: u64);

    /// The transfer ended (successfully or not).
    fn finish(&self);
}

/// Progress sink that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn begin(&self, _label: &str, _total: Option<u64>) -> Box<dyn TransferTracker> {
        Box::new(NoProgress)
    }
}

impl TransferTracker for NoProgress {
    fn set_position(&self, _bytes: u64) {}

    fn finish(&self) {}
}

const BAR_TEMPLATE: &str =
    "{msg:30!} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner} {msg:30!} {bytes} ({bytes_per_sec})";

/// Terminal progress bars, one per active transfer.
#[derive(Debug, Clone)]
pub struct ProgressBars {
    multi: MultiProgress,
}

impl Default for ProgressBars {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressBars {
    /// Draws to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }

    /// Draws nowhere (quiet mode, non-interactive output).
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        }
    }
}

impl TransferProgress for ProgressBars {
    fn begin(&self, label: &str, total: Option<u64>) -> Box<dyn TransferTracker> {
        // Unknown or zero length renders as a byte counter instead of a bar.
        let bar = match total.filter(|&t| t > 0) {
            Some(total) => ProgressBar::new(total).with_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .map(|style| style.progress_chars("=> "))
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            ),
            None => ProgressBar::new_spinner().with_style(
                ProgressStyle::with_template(SPINNER_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            ),
        };
        let bar = self.multi.add(bar);
        bar.set_message(label.to_string());
        Box::new(BarTracker { bar })
    }
}

struct BarTracker {
    bar: ProgressBar,
}

impl TransferTracker for BarTracker {
    fn set_position(&self, bytes: u64) {
        self.bar.set_position(bytes);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_progress_accepts_updates() {
        let tracker = NoProgress.begin("file.bin", Some(10));
        tracker.set_position(5);
        tracker.finish();
    }

    #[test]
    fn test_hidden_bars_track_known_and_unknown_lengths() {
        let bars = ProgressBars::hidden();
        let sized = bars.begin("sized.bin", Some(100));
        sized.set_position(50);
        sized.finish();

        let unknown_len = bars.begin("unknown.bin", None);
        unknown_len.set_position(7);
        unknown_len.finish();
    }
}
