use crate::FrameSource;
use anyhow::{Context, Result};
use image::RgbaImage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Replays saved screenshots as if they were live tables.
///
/// Layout: `<root>/<table id>/*.png`. Each capture advances that table to its
/// next frame in lexical order; the final frame repeats forever.
pub struct ReplaySource {
    root: PathBuf,
    cursors: Mutex<HashMap<String, usize>>,
}

impl ReplaySource {
    pub fn new(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            anyhow::bail!("Replay directory not found: {}", root.display());
        }
        info!("Replaying screenshots from {}", root.display());
        Ok(Self {
            root: root.to_path_buf(),
            cursors: Mutex::new(HashMap::new()),
        })
    }

    fn frames(&self, table: &str) -> Result<Vec<PathBuf>> {
        let dir = self.root.join(table);
        let mut frames: Vec<PathBuf> = std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to list {}", dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("png"))
                    .unwrap_or(false)
            })
            .collect();
        frames.sort();
        Ok(frames)
    }
}

impl FrameSource for ReplaySource {
    fn tables(&self) -> Result<Vec<String>> {
        let mut tables: Vec<String> = std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to list {}", self.root.display()))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        tables.sort();
        Ok(tables)
    }

    fn capture(&self, table: &str) -> Result<RgbaImage> {
        let frames = self.frames(table)?;
        if frames.is_empty() {
            anyhow::bail!("No frames recorded for table {:?}", table);
        }

        let index = {
            let mut cursors = self.cursors.lock();
            let cursor = cursors.entry(table.to_string()).or_insert(0);
            let index = (*cursor).min(frames.len() - 1);
            *cursor = index + 1;
            index
        };

        let path = &frames[index];
        debug!("Replay {} frame {}: {}", table, index, path.display());
        let img = image::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?
            .to_rgba8();
        Ok(img)
    }
}
