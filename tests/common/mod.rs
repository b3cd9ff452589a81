#![allow(dead_code)]

use anyhow::{anyhow, Result};
use holdem_capture::FrameSource;
use holdem_scout::MonitorConfig;
use holdem_state::ObservedState;
use holdem_vision::{Extraction, StateExtractor};
use image::{Rgba, RgbaImage};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Solid frame whose shade identifies it to `ScriptedExtractor`.
pub fn shade(value: u8) -> RgbaImage {
    RgbaImage::from_pixel(64, 48, Rgba([value, value, value, 255]))
}

/// Tables with fixed frames; a listed table without a frame fails to capture.
#[derive(Default)]
pub struct StaticSource {
    tables: RwLock<Vec<String>>,
    frames: RwLock<HashMap<String, RgbaImage>>,
    delay: Option<Duration>,
    captures: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn show(&self, table: &str, frame: RgbaImage) {
        let mut tables = self.tables.write();
        if !tables.iter().any(|t| t == table) {
            tables.push(table.to_string());
        }
        self.frames.write().insert(table.to_string(), frame);
    }

    /// Number of capture calls that reached the source.
    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    pub fn list_only(&self, table: &str) {
        self.tables.write().push(table.to_string());
    }

    pub fn close(&self, table: &str) {
        self.tables.write().retain(|t| t != table);
        self.frames.write().remove(table);
    }
}

impl FrameSource for StaticSource {
    fn tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.read().clone())
    }

    fn capture(&self, table: &str) -> Result<RgbaImage> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.frames
            .read()
            .get(table)
            .cloned()
            .ok_or_else(|| anyhow!("window {} vanished", table))
    }
}

/// Maps a frame's shade to a scripted observation. Unscripted shades panic.
#[derive(Default)]
pub struct ScriptedExtractor {
    script: RwLock<HashMap<u8, ObservedState>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, value: u8, observed: ObservedState) {
        self.script.write().insert(value, observed);
    }
}

impl StateExtractor for ScriptedExtractor {
    fn extract(&self, frame: &RgbaImage) -> Extraction {
        let key = frame.get_pixel(0, 0).0[0];
        let observed = match self.script.read().get(&key) {
            Some(observed) => observed.clone(),
            None => panic!("no observation scripted for shade {}", key),
        };
        Extraction {
            observed,
            ..Extraction::default()
        }
    }
}

/// `base` with the rectangle `[x0, x1) x [y0, y1)` painted black.
pub fn with_patch(mut base: RgbaImage, x0: u32, x1: u32, y0: u32, y1: u32) -> RgbaImage {
    for y in y0..y1 {
        for x in x0..x1 {
            base.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
    }
    base
}

pub fn permissive() -> MonitorConfig {
    MonitorConfig {
        mode: holdem_advisor::Mode::Permissive,
        ..MonitorConfig::default()
    }
}
