//! Terminal progress bars fed by the core's progress channel.

use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mod_downloader_core::{ModStatus, ProgressEvent, ProgressKind};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

const BAR_TEMPLATE: &str =
    "{spinner} {prefix:.bold} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}";
const SPINNER_TEMPLATE: &str = "{spinner} {prefix:.bold} {msg}";

/// Spawns the renderer; it exits once every progress sender is dropped.
pub(crate) fn spawn_progress_ui(mut events: UnboundedReceiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut view = ProgressView::new(MultiProgress::new());
        while let Some(event) = events.recv().await {
            view.apply(event);
        }
        view.finish();
    })
}

/// One bar per mod, created on its first event.
struct ProgressView {
    multi: MultiProgress,
    bars: HashMap<String, ProgressBar>,
}

impl ProgressView {
    fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            bars: HashMap::new(),
        }
    }

    fn bar(&mut self, mod_name: &str) -> &ProgressBar {
        let multi = &self.multi;
        self.bars.entry(mod_name.to_string()).or_insert_with(|| {
            let bar = multi.add(ProgressBar::new_spinner());
            bar.set_style(spinner_style());
            bar.set_prefix(mod_name.to_string());
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        })
    }

    fn apply(&mut self, event: ProgressEvent) {
        let bar = self.bar(&event.mod_name);
        match event.kind {
            ProgressKind::Status(ModStatus::Succeeded) => bar.finish_with_message("done"),
            ProgressKind::Status(ModStatus::Failed) => bar.abandon_with_message("failed"),
            ProgressKind::Status(status) => bar.set_message(status.to_string()),
            ProgressKind::Started { total, offset } => {
                if let Some(total) = total {
                    bar.set_style(bar_style());
                    bar.set_length(total);
                }
                bar.set_position(offset);
                let message = if offset > 0 { "resuming" } else { "downloading" };
                bar.set_message(message);
            }
            ProgressKind::Bytes(delta) => bar.inc(delta),
            ProgressKind::Retrying {
                attempt,
                max_attempts,
            } => bar.set_message(format!("retrying ({attempt}/{max_attempts})")),
        }
    }

    fn finish(self) {
        for bar in self.bars.values().filter(|bar| !bar.is_finished()) {
            bar.abandon();
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
