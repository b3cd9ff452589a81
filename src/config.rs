use anyhow::{bail, Context, Result};
use holdem_advisor::Mode;
use holdem_capture::Roi;
use holdem_vision::{DetectorConfig, GrouperConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// One pixel-difference detector: where to look and how much change fires it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeDetectorConfig {
    pub roi: Roi,
    /// Mean absolute difference in [0, 1] at or above which the detector fires.
    pub threshold: f64,
}

/// Where rendered advice goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Plain lines on stdout.
    #[default]
    Console,
    /// `info!` events on the log.
    Log,
}

/// Everything the monitor needs, loaded from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Directory holding `glyphs.json` and the glyph images.
    pub templates_dir: PathBuf,
    pub detector: DetectorConfig,
    pub grouper: GrouperConfig,
    pub ui_change: ChangeDetectorConfig,
    pub post_action: ChangeDetectorConfig,
    pub poll_interval_seconds: f64,
    pub capture_timeout_ms: u64,
    pub emission_confidence_floor: f64,
    pub mode: Mode,
    /// Whether a policy denial counts as handling the state: the fingerprint
    /// is recorded and the pending trigger cleared.
    pub deny_advances_state: bool,
    pub output: OutputKind,
    /// Case-insensitive substrings of window titles that identify tables.
    pub window_titles: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("data/glyphs"),
            detector: DetectorConfig::default(),
            grouper: GrouperConfig::default(),
            ui_change: ChangeDetectorConfig {
                roi: Roi::FULL,
                threshold: 0.05,
            },
            post_action: ChangeDetectorConfig {
                roi: Roi {
                    x: 0.5,
                    y: 0.8,
                    width: 0.5,
                    height: 0.2,
                },
                threshold: 0.08,
            },
            poll_interval_seconds: 1.0,
            capture_timeout_ms: 2000,
            emission_confidence_floor: 0.8,
            mode: Mode::Ethical,
            deny_advances_state: false,
            output: OutputKind::Console,
            window_titles: vec!["hold'em".to_string(), "holdem".to_string()],
        }
    }
}

impl MonitorConfig {
    /// Read a config file. A missing file is not an error: defaults are used.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| -> Result<()> {
            if !(0.0..=1.0).contains(&v) {
                bail!("{} must be within [0, 1], got {}", name, v);
            }
            Ok(())
        };
        unit("detector.match_threshold", self.detector.match_threshold)?;
        unit("ui_change.threshold", self.ui_change.threshold)?;
        unit("post_action.threshold", self.post_action.threshold)?;
        unit("emission_confidence_floor", self.emission_confidence_floor)?;

        if self.detector.glyph_box_size == 0 {
            bail!("detector.glyph_box_size must be positive");
        }
        if self.detector.max_frame_dimension < self.detector.glyph_box_size {
            bail!(
                "detector.max_frame_dimension ({}) is smaller than the glyph box ({})",
                self.detector.max_frame_dimension,
                self.detector.glyph_box_size
            );
        }
        if self.detector.top_k_per_glyph == 0 {
            bail!("detector.top_k_per_glyph must be positive");
        }
        if self.grouper.band_height == 0 {
            bail!("grouper.band_height must be positive");
        }
        if !self.ui_change.roi.is_valid() {
            bail!("ui_change.roi is empty or outside the frame: {:?}", self.ui_change.roi);
        }
        if !self.post_action.roi.is_valid() {
            bail!("post_action.roi is empty or outside the frame: {:?}", self.post_action.roi);
        }
        if !(self.poll_interval_seconds.is_finite() && self.poll_interval_seconds > 0.0) {
            bail!("poll_interval_seconds must be positive, got {}", self.poll_interval_seconds);
        }
        if self.capture_timeout_ms == 0 {
            bail!("capture_timeout_ms must be positive");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_seconds)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}
