#![forbid(unsafe_code)]

//! Test doubles for the render primitive.
//!
//! [`RecordingPainter`] logs every call instead of touching a terminal and
//! panics if a render call is entered while another is still in flight.
//! Clones share the same log, so a test can keep one handle while the
//! sequencer owns another.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::RenderError;
use crate::painter::Painter;

/// One recorded painter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaintCall {
    Clear,
    PageBreak(u16),
    Render {
        path: PathBuf,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    },
    Annotate {
        x: u16,
        y: u16,
        text: String,
    },
}

impl PaintCall {
    /// File name of a render call.
    pub fn rendered_name(&self) -> Option<&str> {
        match self {
            Self::Render { path, .. } => path.file_name().and_then(|name| name.to_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    calls: Mutex<Vec<PaintCall>>,
    in_flight: AtomicBool,
}

/// A painter that records calls and detects overlapping renders.
#[derive(Debug, Clone, Default)]
pub struct RecordingPainter {
    shared: Arc<Shared>,
    render_delay: Option<Duration>,
    fail_on: Option<String>,
}

impl RecordingPainter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold each render call open for `delay`, widening any overlap window.
    #[must_use]
    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = Some(delay);
        self
    }

    /// Fail (after recording) any render whose file name equals `name`.
    #[must_use]
    pub fn failing_on(mut self, name: impl Into<String>) -> Self {
        self.fail_on = Some(name.into());
        self
    }

    pub fn calls(&self) -> Vec<PaintCall> {
        self.lock().clone()
    }

    /// File names of every render call, in order.
    pub fn rendered(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(PaintCall::rendered_name)
            .map(str::to_owned)
            .collect()
    }

    /// Render coordinates, in order.
    pub fn positions(&self) -> Vec<(u16, u16)> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                PaintCall::Render { x, y, .. } => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PaintCall>> {
        self.shared
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: PaintCall) {
        self.lock().push(call);
    }
}

impl Painter for RecordingPainter {
    fn clear(&mut self) -> Result<(), RenderError> {
        self.record(PaintCall::Clear);
        Ok(())
    }

    fn page_break(&mut self, lines: u16) -> Result<(), RenderError> {
        self.record(PaintCall::PageBreak(lines));
        Ok(())
    }

    fn render(
        &mut self,
        path: &Path,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<(), RenderError> {
        if self.shared.in_flight.swap(true, Ordering::SeqCst) {
            panic!("render re-entered while {} was in flight", path.display());
        }
        self.record(PaintCall::Render {
            path: path.to_path_buf(),
            x,
            y,
            width,
            height,
        });
        if let Some(delay) = self.render_delay {
            std::thread::sleep(delay);
        }
        self.shared.in_flight.store(false, Ordering::SeqCst);

        let name = path.file_name().and_then(|name| name.to_str());
        if self.fail_on.is_some() && name == self.fail_on.as_deref() {
            return Err(RenderError::Io(std::io::Error::other(format!(
                "injected failure for {}",
                path.display()
            ))));
        }
        Ok(())
    }

    fn annotate(&mut self, x: u16, y: u16, text: &str) -> Result<(), RenderError> {
        self.record(PaintCall::Annotate {
            x,
            y,
            text: text.to_string(),
        });
        Ok(())
    }
}
