use anyhow::{bail, Context, Result};
use holdem_state::{Rank, Suit};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the manifest file inside a templates directory.
pub const MANIFEST_FILE: &str = "glyphs.json";

/// One symbol of the fixed glyph alphabet: 13 ranks plus 4 suits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Glyph {
    Rank(Rank),
    Suit(Suit),
}

impl Glyph {
    /// The full alphabet, ranks first.
    pub fn alphabet() -> Vec<Glyph> {
        Rank::ALL
            .iter()
            .map(|r| Glyph::Rank(*r))
            .chain(Suit::ALL.iter().map(|s| Glyph::Suit(*s)))
            .collect()
    }

    pub fn is_rank(self) -> bool {
        matches!(self, Glyph::Rank(_))
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Glyph::Rank(r) => write!(f, "rank {}", r),
            Glyph::Suit(s) => write!(f, "suit {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphKind {
    Rank,
    Suit,
}

/// Manifest entry pointing at a template image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlyphEntry {
    pub symbol: String,
    pub kind: GlyphKind,
    pub file: String,
}

impl GlyphEntry {
    pub fn glyph(&self) -> Result<Glyph> {
        let mut chars = self.symbol.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            bail!("glyph symbol must be one character, got {:?}", self.symbol);
        };
        match self.kind {
            GlyphKind::Rank => Rank::from_symbol(c)
                .map(Glyph::Rank)
                .with_context(|| format!("unknown rank symbol {:?}", self.symbol)),
            GlyphKind::Suit => Suit::from_symbol(c)
                .map(Glyph::Suit)
                .with_context(|| format!("unknown suit symbol {:?}", self.symbol)),
        }
    }
}

/// Raw glyphs.json file format
#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[allow(dead_code)]
    version: String,
    glyphs: Vec<GlyphEntry>,
}

/// Resolved template paths keyed by glyph
#[derive(Debug, Clone, Default)]
pub struct GlyphCatalog {
    pub templates: HashMap<Glyph, PathBuf>,
}

impl GlyphCatalog {
    /// Load the manifest from a templates directory.
    ///
    /// A missing manifest is not an error: the catalog comes back empty and
    /// the detector reports "no templates" at detection time.
    pub fn load(templates_dir: &Path) -> Result<Self> {
        let mut catalog = Self::default();

        let manifest_path = templates_dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            tracing::warn!(
                "No {} found at {}. Glyph detection disabled.",
                MANIFEST_FILE,
                manifest_path.display()
            );
            return Ok(catalog);
        }

        let content = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
        let file: ManifestFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

        for entry in file.glyphs {
            match entry.glyph() {
                Ok(glyph) => {
                    catalog.templates.insert(glyph, templates_dir.join(&entry.file));
                }
                Err(e) => tracing::warn!("Skipping manifest entry: {:#}", e),
            }
        }

        let missing = catalog.missing_glyphs();
        if !missing.is_empty() {
            tracing::warn!(
                "Glyph catalog incomplete: {} of 17 glyphs missing",
                missing.len()
            );
        }
        tracing::info!("Loaded {} glyph template paths", catalog.templates.len());

        Ok(catalog)
    }

    pub fn missing_glyphs(&self) -> Vec<Glyph> {
        Glyph::alphabet()
            .into_iter()
            .filter(|g| !self.templates.contains_key(g))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
