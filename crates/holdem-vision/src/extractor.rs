use crate::detector::{CardToken, DetectorConfig, TokenDetector};
use crate::grouper::{GrouperConfig, RoleGrouper};
use crate::templates::TemplateSource;
use anyhow::Result;
use holdem_state::{ObservedState, Warning};
use image::RgbaImage;

/// Everything read from one frame.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub observed: ObservedState,
    pub tokens: Vec<CardToken>,
    pub warnings: Vec<Warning>,
}

/// Turns a raw frame into an observed partial state.
pub trait StateExtractor: Send + Sync {
    fn extract(&self, frame: &RgbaImage) -> Extraction;
}

/// Detection followed by role grouping.
pub struct FrameExtractor {
    detector: TokenDetector,
    grouper: RoleGrouper,
}

impl FrameExtractor {
    pub fn new(detector: TokenDetector, grouper: RoleGrouper) -> Self {
        Self { detector, grouper }
    }

    pub fn from_source(
        source: &dyn TemplateSource,
        detector: DetectorConfig,
        grouper: GrouperConfig,
    ) -> Result<Self> {
        let templates = source.load_templates()?;
        Ok(Self::new(
            TokenDetector::new(templates, detector),
            RoleGrouper::new(grouper),
        ))
    }

    pub fn template_count(&self) -> usize {
        self.detector.template_count()
    }
}

impl StateExtractor for FrameExtractor {
    fn extract(&self, frame: &RgbaImage) -> Extraction {
        let detection = self.detector.detect(frame);
        let grouping = self.grouper.group(&detection.tokens);

        let mut warnings = detection.warnings;
        warnings.extend(grouping.warnings);
        Extraction {
            observed: grouping.observed,
            tokens: detection.tokens,
            warnings,
        }
    }
}
