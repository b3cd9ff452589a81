use anyhow::{Context, Result};
use holdem_data::{Glyph, GlyphCatalog};
use image::GrayImage;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Grayscale reference image for one glyph.
#[derive(Debug, Clone)]
pub struct GlyphTemplate {
    pub glyph: Glyph,
    pub image: GrayImage,
}

/// The configured template set.
#[derive(Debug, Clone, Default)]
pub struct GlyphTemplates {
    templates: Vec<GlyphTemplate>,
}

/// Anything that can hand the detector its templates.
pub trait TemplateSource {
    fn load_templates(&self) -> Result<GlyphTemplates>;
}

impl GlyphTemplates {
    pub fn new(templates: Vec<GlyphTemplate>) -> Self {
        Self { templates }
    }

    /// Load every template listed in `templates_dir/glyphs.json`.
    /// Unreadable images are skipped with a warning.
    pub fn load(templates_dir: &Path) -> Result<Self> {
        let catalog = GlyphCatalog::load(templates_dir)?;
        let mut templates = Vec::new();

        for glyph in Glyph::alphabet() {
            let Some(path) = catalog.templates.get(&glyph) else {
                continue;
            };
            match load_template(path) {
                Ok(image) => templates.push(GlyphTemplate { glyph, image }),
                Err(e) => warn!("Failed to load template for {}: {:#}", glyph, e),
            }
        }

        info!(
            "Loaded {} glyph templates from {}",
            templates.len(),
            templates_dir.display()
        );
        Ok(Self { templates })
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlyphTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateSource for GlyphTemplates {
    fn load_templates(&self) -> Result<GlyphTemplates> {
        Ok(self.clone())
    }
}

/// Templates read from a directory on demand.
#[derive(Debug, Clone)]
pub struct DirectoryTemplates {
    pub dir: PathBuf,
}

impl TemplateSource for DirectoryTemplates {
    fn load_templates(&self) -> Result<GlyphTemplates> {
        GlyphTemplates::load(&self.dir)
    }
}

fn load_template(path: &Path) -> Result<GrayImage> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(img.to_luma8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdem_data::MANIFEST_FILE;
    use holdem_state::{Rank, Suit};

    #[test]
    fn test_load_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let img = GrayImage::from_fn(8, 8, |x, y| image::Luma([((x + y) * 16) as u8]));
        img.save(dir.path().join("rank_A.png")).unwrap();
        img.save(dir.path().join("suit_h.png")).unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"version": "1", "glyphs": [
                {"symbol": "A", "kind": "rank", "file": "rank_A.png"},
                {"symbol": "h", "kind": "suit", "file": "suit_h.png"},
                {"symbol": "K", "kind": "rank", "file": "missing.png"}
            ]}"#,
        )
        .unwrap();

        let source = DirectoryTemplates {
            dir: dir.path().to_path_buf(),
        };
        let templates = source.load_templates().unwrap();
        assert_eq!(templates.len(), 2);
        let glyphs: Vec<Glyph> = templates.iter().map(|t| t.glyph).collect();
        assert!(glyphs.contains(&Glyph::Rank(Rank::Ace)));
        assert!(glyphs.contains(&Glyph::Suit(Suit::Hearts)));
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let templates = GlyphTemplates::load(Path::new("/nonexistent")).unwrap();
        assert!(templates.is_empty());
    }
}
