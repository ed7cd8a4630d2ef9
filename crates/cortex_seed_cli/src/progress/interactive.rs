use std::collections::HashMap;
use std::sync::Mutex;

use console::style;
use cortex_seed::ResourceKind;
use cortex_seed::seed::SeedProgress;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Interactive progress reporter using indicatif.
///
/// One bar per resource kind, created when its phase starts and finished
/// with the phase's counts. Failures and warnings are printed above the bars.
pub struct InteractiveReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<ResourceKind, ProgressBar>>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self::with_multi(MultiProgress::new())
    }

    /// A reporter that draws nothing, for tests.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_multi(MultiProgress::with_draw_target(
            indicatif::ProgressDrawTarget::hidden(),
        ))
    }

    fn with_multi(multi: MultiProgress) -> Self {
        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
        }
    }

    pub fn handle(&self, event: SeedProgress) {
        if let Some(line) = Self::notice(&event) {
            self.println(line);
        }

        let Ok(mut bars) = self.bars.lock() else {
            return;
        };

        match event {
            SeedProgress::PhaseStarted {
                kind,
                total,
                existing,
            } => {
                let bar = self.multi.add(ProgressBar::new(total as u64));
                bar.set_style(Self::bar_style());
                bar.set_prefix(format!("{:8}", kind));
                bar.set_message(format!("{existing} on server"));
                bars.insert(kind, bar);
            }

            SeedProgress::ItemCreated { kind, key, .. } => {
                if let Some(bar) = bars.get(&kind) {
                    bar.inc(1);
                    bar.set_message(format!("created {key}"));
                }
            }

            SeedProgress::ItemSkipped {
                kind, key, reason, ..
            } => {
                if let Some(bar) = bars.get(&kind) {
                    bar.inc(1);
                    bar.set_message(format!("skipped {key} ({reason})"));
                }
            }

            SeedProgress::ItemFailed { kind, .. } => {
                if let Some(bar) = bars.get(&kind) {
                    bar.inc(1);
                }
            }

            SeedProgress::PhaseCompleted {
                kind,
                created,
                skipped,
                failed,
            } => {
                if let Some(bar) = bars.get(&kind) {
                    let summary = format!("{created} created, {skipped} skipped, {failed} failed");
                    if failed > 0 {
                        bar.abandon_with_message(summary);
                    } else {
                        bar.finish_with_message(summary);
                    }
                }
            }

            _ => {}
        }
    }

    /// Line printed above the bars for events worth reading after the run.
    fn notice(event: &SeedProgress) -> Option<String> {
        let warn = style("!").yellow().bold();
        match event {
            SeedProgress::ItemFailed { kind, key, error } => {
                Some(format!("{} {kind} {key}: {error}", style("✗").red().bold()))
            }
            SeedProgress::AssetMissing { kind, key } => {
                Some(format!("{warn} no image found for {kind} {key}"))
            }
            SeedProgress::AssetUnavailable { kind, key, error } => {
                Some(format!("{warn} image for {kind} {key} could not be prepared: {error}"))
            }
            SeedProgress::AssetUploadFailed { kind, key, error } => {
                Some(format!("{warn} image for {kind} {key}: {error}"))
            }
            SeedProgress::Warning { message } => Some(format!("{warn} {message}")),
            _ => None,
        }
    }

    /// Finish all progress bars.
    pub fn finish(&self) {
        let Ok(bars) = self.bars.lock() else {
            return;
        };
        for bar in bars.values() {
            if !bar.is_finished() {
                bar.finish();
            }
        }
    }

    fn println(&self, line: String) {
        self.multi.println(line).ok();
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .map(|template| template.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
