// src/progress.rs
// =============================================================================
// Coarse progress events: one "started" and one "finished" per section.
//
// Two real reporters:
// - SpinnerProgress: an indicatif spinner, used when stdout is a terminal
// - LogProgress: tracing events, used in CI and pipes
//
// NoProgress swallows events (tests, --stdout mode).
// =============================================================================

use std::sync::Mutex;
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

use crate::export::SectionOutcome;
use crate::fetch::ResourceKind;

pub trait ProgressSink: Send + Sync {
    fn section_started(&self, kind: ResourceKind);
    fn section_finished(&self, kind: ResourceKind, outcome: &SectionOutcome);
}

/// Pick the spinner on a TTY, structured logs otherwise.
pub fn reporter(quiet: bool) -> Box<dyn ProgressSink> {
    if quiet {
        Box::new(NoProgress)
    } else if Term::stdout().is_term() {
        Box::new(SpinnerProgress::new())
    } else {
        Box::new(LogProgress)
    }
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn section_started(&self, _kind: ResourceKind) {}
    fn section_finished(&self, _kind: ResourceKind, _outcome: &SectionOutcome) {}
}

pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn section_started(&self, kind: ResourceKind) {
        tracing::info!(section = %kind, "Fetching section");
    }

    fn section_finished(&self, kind: ResourceKind, outcome: &SectionOutcome) {
        match outcome {
            SectionOutcome::Records(records) => {
                tracing::info!(section = %kind, records = records.len(), "Section complete");
            }
            SectionOutcome::Failed(note) => {
                tracing::warn!(section = %kind, %note, "Section failed");
            }
        }
    }
}

pub struct SpinnerProgress {
    current: Mutex<Option<ProgressBar>>,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl ProgressSink for SpinnerProgress {
    fn section_started(&self, kind: ResourceKind) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::style());
        bar.set_message(format!("Fetching {}", kind));
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut current) = self.current.lock() {
            *current = Some(bar);
        }
    }

    fn section_finished(&self, kind: ResourceKind, outcome: &SectionOutcome) {
        let message = match outcome {
            SectionOutcome::Records(records) => format!("✅ {}: {} record(s)", kind, records.len()),
            SectionOutcome::Failed(_) => format!("⚠️  {}: failed (noted in export)", kind),
        };

        let bar = self.current.lock().ok().and_then(|mut current| current.take());
        match bar {
            Some(bar) => bar.finish_with_message(message),
            None => println!("{}", message),
        }
    }
}
