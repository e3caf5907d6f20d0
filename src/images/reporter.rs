// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Observable compositor events.

A [`FeedbackCompositor`](crate::images::FeedbackCompositor) reports through whatever
[`Reporter`] it was built with.  Closures work directly:

```
use gaze_trail::images::reporter::{Report, Reporter};

let reporter = |report: &Report| println!("{report:?}");
reporter.report(&Report::AspectRatioChanged { aspect_ratio: 2.0 });
```
*/

use crate::images::compositor::FrameError;
use crate::images::settings::ShapeMode;
use crate::imp::resources::lock;
use std::sync::{Arc, Mutex};

/// Something the host may want to know about.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// The surface aspect ratio seen by a render differs from the previous render's.
    AspectRatioChanged { aspect_ratio: f32 },
    /// A frame was abandoned; the previous content stays on screen.
    FrameDegraded(FrameError),
    /// The shape strip was reloaded for a new mode.
    ShapeReloaded(ShapeMode),
}

pub trait Reporter: Send + Sync {
    fn report(&self, report: &Report);
}

impl<F: Fn(&Report) + Send + Sync> Reporter for F {
    fn report(&self, report: &Report) {
        self(report)
    }
}

/// Writes every report to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, report: &Report) {
        match report {
            Report::AspectRatioChanged { aspect_ratio } => {
                logwise::info_sync!("aspect ratio is now {ratio}", ratio = logwise::privacy::LogIt(aspect_ratio));
            }
            Report::FrameDegraded(e) => {
                logwise::warn_sync!("frame degraded: {err}", err = logwise::privacy::LogIt(e));
            }
            Report::ShapeReloaded(mode) => {
                logwise::info_sync!("shape reloaded: {mode}", mode = logwise::privacy::LogIt(mode));
            }
        }
    }
}

/// Keeps every report.  Clones share the same history.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        lock(&self.reports).clone()
    }

    pub fn take(&self) -> Vec<Report> {
        std::mem::take(&mut *lock(&self.reports))
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, report: &Report) {
        lock(&self.reports).push(report.clone());
    }
}
