//! Card glyph recognition: token detection, row grouping and the combined
//! frame extractor.

pub mod correlate;
pub mod detector;
pub mod extractor;
pub mod grouper;
pub mod peaks;
pub mod preprocess;
#[cfg(any(test, feature = "test-support"))]
pub mod synthetic;
pub mod templates;

pub use detector::{score_to_confidence, CardToken, Detection, DetectorConfig, TokenDetector};
pub use extractor::{Extraction, FrameExtractor, StateExtractor};
pub use grouper::{Band, GrouperConfig, Grouping, RoleGrouper, PHASE_CONFIDENCE};
pub use templates::{DirectoryTemplates, GlyphTemplate, GlyphTemplates, TemplateSource};
