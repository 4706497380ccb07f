use indicatif::{
    MultiProgress, ProgressBar, ProgressBarIter, ProgressDrawTarget, ProgressIterator,
    ProgressStyle,
};
use serde::{Deserialize, Serialize};

const OVERALL_TEMPLATE: &str =
    "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({percent}%) {msg}";

// Colors for worker bars, cycled by worker slot
const WORKER_COLORS: [&str; 4] = ["green", "magenta", "yellow", "blue"];

/// Which progress bars a dispatch shows
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressMode {
    /// No progress display
    #[default]
    Off,
    /// One bar counting results as they are collected in order
    Overall,
    /// The overall bar plus one bar per worker counting items it finished
    PerWorker,
}

impl ProgressMode {
    pub fn is_enabled(self) -> bool {
        self != ProgressMode::Off
    }
}

/// Live progress display for one dispatch call.
///
/// The overall bar only advances when the consumer pulls the next ordered
/// result, so it never runs ahead of what the caller has received. Per-worker
/// bars are owned here and handed to each worker's context by slot.
pub struct ProgressView {
    multi: MultiProgress,
    overall: ProgressBar,
    worker_bars: Vec<ProgressBar>,
}

impl ProgressView {
    /// Create a view drawing to stderr, or `None` when progress is off
    pub fn new(mode: ProgressMode, total: usize, workers: usize) -> Option<Self> {
        Self::with_draw_target(mode, total, workers, ProgressDrawTarget::stderr())
    }

    pub fn with_draw_target(
        mode: ProgressMode,
        total: usize,
        workers: usize,
        target: ProgressDrawTarget,
    ) -> Option<Self> {
        if !mode.is_enabled() {
            return None;
        }

        let multi = MultiProgress::with_draw_target(target);
        let mut worker_bars = Vec::new();

        if mode == ProgressMode::PerWorker {
            for worker_id in 0..workers {
                let color = WORKER_COLORS[worker_id % WORKER_COLORS.len()];
                let template = format!(
                    "[worker {:>2}] {{spinner:.{color}}} {{pos:>7}} done {{msg}}",
                    worker_id + 1
                );
                let bar = multi.add(ProgressBar::no_length());
                bar.set_style(style(&template));
                worker_bars.push(bar);
            }
        }

        let overall = multi.add(ProgressBar::new(total as u64));
        overall.set_style(style(OVERALL_TEMPLATE).progress_chars("█▉▊▋▌▍▎▏  "));

        Some(Self {
            multi,
            overall,
            worker_bars,
        })
    }

    /// Handle to the bar for `worker_id`, if per-worker bars are shown
    pub fn worker_bar(&self, worker_id: usize) -> Option<ProgressBar> {
        self.worker_bars.get(worker_id).cloned()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_bars.len()
    }

    /// Wrap the ordered result stream so each pulled result advances the overall bar
    pub fn track<I: Iterator>(&self, results: I) -> ProgressBarIter<I> {
        results.progress_with(self.overall.clone())
    }

    /// Number of results collected so far
    pub fn completed(&self) -> u64 {
        self.overall.position()
    }

    pub fn total(&self) -> Option<u64> {
        self.overall.length()
    }

    /// Finish every bar and clear the display
    pub fn finish(&self) {
        for bar in &self.worker_bars {
            bar.finish_and_clear();
        }
        self.overall.finish();
        let _ = self.multi.clear();
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}
