use anyhow::{anyhow, bail, Context, Result};
use image::RgbaImage;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use xcap::Window;

pub mod replay;

pub use replay::ReplaySource;

/// Normalized screen region (0.0-1.0 coordinates relative to the table window)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Roi {
    pub const FULL: Roi = Roi {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Non-empty and fully inside the unit square.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= 1.0 + 1e-9
            && self.y + self.height <= 1.0 + 1e-9
    }
}

/// Crop a region from a captured frame using normalized coordinates
pub fn crop_region(frame: &RgbaImage, region: &Roi) -> RgbaImage {
    let (w, h) = (frame.width(), frame.height());
    let x = (region.x * w as f64) as u32;
    let y = (region.y * h as f64) as u32;
    let rw = (region.width * w as f64) as u32;
    let rh = (region.height * h as f64) as u32;

    // Clamp to image bounds
    let x = x.min(w.saturating_sub(1));
    let y = y.min(h.saturating_sub(1));
    let rw = rw.min(w - x);
    let rh = rh.min(h - y);

    image::imageops::crop_imm(frame, x, y, rw, rh).to_image()
}

/// Something that can enumerate tables and grab a frame of one of them.
///
/// Calls are synchronous and may be slow; the monitor runs them on a blocking
/// thread under a time budget.
pub trait FrameSource: Send + Sync + 'static {
    /// Identifiers of the tables currently visible.
    fn tables(&self) -> Result<Vec<String>>;

    /// Capture the current frame of one table.
    fn capture(&self, table: &str) -> Result<RgbaImage>;
}

/// Captures frames on blocking threads under a time budget.
///
/// A capture that overruns is reported as an error and left to finish on its
/// own thread. Until it does, further captures of that table are refused, so
/// a hung window holds at most one blocking thread.
pub struct BoundedCapture {
    source: Arc<dyn FrameSource>,
    budget: Duration,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl BoundedCapture {
    pub fn new(source: Arc<dyn FrameSource>, budget: Duration) -> Self {
        Self {
            source,
            budget,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn source(&self) -> &Arc<dyn FrameSource> {
        &self.source
    }

    /// Whether an earlier capture of `table` is still running.
    pub fn is_busy(&self, table: &str) -> bool {
        self.in_flight.lock().contains(table)
    }

    pub async fn capture(&self, table: &str) -> Result<RgbaImage> {
        if !self.in_flight.lock().insert(table.to_string()) {
            bail!("previous capture of {:?} is still running", table);
        }

        let source = self.source.clone();
        let in_flight = self.in_flight.clone();
        let table_owned = table.to_string();
        let task = tokio::task::spawn_blocking(move || {
            let result = source.capture(&table_owned);
            in_flight.lock().remove(&table_owned);
            result
        });

        match tokio::time::timeout(self.budget, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                self.in_flight.lock().remove(table);
                Err(anyhow!("capture task panicked: {}", e))
            }
            Err(_) => Err(anyhow!("capture of {:?} exceeded {:?}", table, self.budget)),
        }
    }
}

/// Live capture of poker client windows via `xcap`.
///
/// A window is a table when its lowercase title contains one of the
/// configured patterns; the window title is used as the table id.
pub struct WindowSource {
    patterns: Vec<String>,
}

impl WindowSource {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    fn matches(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.patterns.iter().any(|p| title.contains(p.as_str()))
    }

    fn find_window(&self, table: &str) -> Result<Window> {
        let windows = Window::all().context("Failed to enumerate windows")?;
        windows
            .into_iter()
            .find(|w| w.title().map(|t| t == table).unwrap_or(false))
            .with_context(|| format!("Table window {:?} not found", table))
    }
}

impl FrameSource for WindowSource {
    fn tables(&self) -> Result<Vec<String>> {
        let windows = Window::all().context("Failed to enumerate windows")?;
        let mut tables = Vec::new();
        for window in windows {
            let title = match window.title() {
                Ok(t) => t,
                Err(_) => continue,
            };
            if window.is_minimized().unwrap_or(false) {
                continue;
            }
            if self.matches(&title) && !tables.contains(&title) {
                debug!("Found table window: {}", title);
                tables.push(title);
            }
        }
        Ok(tables)
    }

    fn capture(&self, table: &str) -> Result<RgbaImage> {
        let window = self.find_window(table)?;
        let img = window
            .capture_image()
            .context("Failed to capture window image")?;
        if img.width() == 0 || img.height() == 0 {
            warn!("Empty capture for {}", table);
        }
        Ok(img)
    }
}
