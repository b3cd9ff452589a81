//! Glyph token detector: correlate every rank and suit template against the
//! frame, pick peaks, and pair each rank with the suit printed beside it.

use crate::correlate::FrameSpectrum;
use crate::peaks::{extract_peaks, suppress, Peak};
use crate::preprocess::{prepare_frame, prepare_template};
use crate::templates::GlyphTemplates;
use holdem_data::Glyph;
use holdem_state::{Card, Rank, Suit, Warning};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lower edge of the confidence band for accepted matches.
pub const CONFIDENCE_FLOOR: f64 = 0.9;
/// Upper edge of the confidence band for accepted matches.
pub const CONFIDENCE_CEIL: f64 = 1.0;

/// Detector tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum NCC score for a glyph hit.
    pub match_threshold: f64,
    /// Nominal glyph box edge in original-frame pixels.
    pub glyph_box_size: u32,
    /// Frames whose larger side exceeds this are shrunk before matching.
    pub max_frame_dimension: u32,
    /// Peaks kept per glyph template.
    pub top_k_per_glyph: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.8,
            glyph_box_size: 12,
            max_frame_dimension: 1600,
            top_k_per_glyph: 16,
        }
    }
}

/// A recognized rank+suit pair on the frame, in original-frame pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardToken {
    pub card: Card,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Raw match score, `min(rank score, suit score)`.
    pub score: f64,
    pub confidence: f64,
}

/// Output of one detection pass.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    pub tokens: Vec<CardToken>,
    pub warnings: Vec<Warning>,
}

/// Map a raw score onto the confidence band: below threshold is 0, the
/// range `[threshold, 1]` maps linearly onto `[0.9, 1.0]`.
pub fn score_to_confidence(score: f64, threshold: f64) -> f64 {
    if score < threshold {
        return 0.0;
    }
    if threshold >= 1.0 {
        return CONFIDENCE_CEIL;
    }
    let t = (score.min(1.0) - threshold) / (1.0 - threshold);
    CONFIDENCE_FLOOR + t * (CONFIDENCE_CEIL - CONFIDENCE_FLOOR)
}

/// A peak tagged with the template that produced it.
#[derive(Debug, Clone, Copy)]
struct Hit {
    peak: Peak,
    width: usize,
    height: usize,
}

/// Template-matching card detector.
pub struct TokenDetector {
    templates: GlyphTemplates,
    config: DetectorConfig,
}

impl TokenDetector {
    pub fn new(templates: GlyphTemplates, config: DetectorConfig) -> Self {
        Self { templates, config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Detect card tokens. Never fails: unusable input yields no tokens and a
    /// warning explaining why.
    pub fn detect(&self, frame: &RgbaImage) -> Detection {
        let mut detection = Detection::default();
        let cfg = &self.config;

        if self.templates.is_empty() {
            detection.warnings.push(Warning::NoTemplates);
            return detection;
        }

        let (w, h) = frame.dimensions();
        let min = cfg.glyph_box_size.max(1);
        if w < min || h < min {
            detection.warnings.push(Warning::FrameTooSmall {
                width: w,
                height: h,
                min,
            });
            return detection;
        }

        let prepared = prepare_frame(frame, cfg.max_frame_dimension);
        let glyph_box = (cfg.glyph_box_size as f64 * prepared.scale).max(1.0);
        let mut spectrum = FrameSpectrum::new(&prepared.plane);

        let mut rank_hits: Vec<(Rank, Hit)> = Vec::new();
        let mut suit_hits: Vec<(Suit, Hit)> = Vec::new();

        for template in self.templates.iter() {
            let plane = prepare_template(&template.image, prepared.scale);
            let surface = spectrum.ncc(&plane);
            if surface.is_empty() {
                debug!("Template for {} does not fit the frame", template.glyph);
                continue;
            }
            let peaks = extract_peaks(
                &surface,
                cfg.match_threshold,
                glyph_box / 2.0,
                cfg.top_k_per_glyph,
            );
            for peak in peaks {
                let hit = Hit {
                    peak,
                    width: plane.width,
                    height: plane.height,
                };
                match template.glyph {
                    Glyph::Rank(r) => rank_hits.push((r, hit)),
                    Glyph::Suit(s) => suit_hits.push((s, hit)),
                }
            }
        }

        debug!(
            "Glyph hits: {} rank, {} suit",
            rank_hits.len(),
            suit_hits.len()
        );

        let mut unmatched = 0usize;
        let mut assembled: Vec<(Card, Hit, Hit, f64)> = Vec::new();
        for (rank, rh) in &rank_hits {
            match best_suit(rh, &suit_hits, glyph_box) {
                Some((suit, sh, score)) => assembled.push((Card::new(*rank, suit), *rh, sh, score)),
                None => unmatched += 1,
            }
        }
        if unmatched > 0 {
            detection.warnings.push(Warning::UnmatchedRanks { count: unmatched });
        }

        let kept = suppress(assembled, glyph_box, usize::MAX, |(_, rh, _, score)| {
            (rh.peak.x as f64, rh.peak.y as f64, *score)
        });

        let mut tokens: Vec<CardToken> = kept
            .into_iter()
            .map(|(card, rh, sh, score)| {
                let left = rh.peak.x as f64;
                let top = rh.peak.y.min(sh.peak.y) as f64;
                let right = (sh.peak.x + sh.width) as f64;
                let bottom = (rh.peak.y + rh.height).max(sh.peak.y + sh.height) as f64;
                let x = prepared.to_original(left);
                let y = prepared.to_original(top);
                CardToken {
                    card,
                    x,
                    y,
                    width: prepared.to_original(right).saturating_sub(x),
                    height: prepared.to_original(bottom).saturating_sub(y),
                    score,
                    confidence: score_to_confidence(score, cfg.match_threshold),
                }
            })
            .collect();
        tokens.sort_by_key(|t| (t.y, t.x));

        if tokens.is_empty() {
            detection.warnings.push(Warning::NoDetections);
        }
        debug!("Detected {} card token(s)", tokens.len());
        detection.tokens = tokens;
        detection
    }
}

/// The suit hit right of `rank` on the same row whose pairing score,
/// `min(rank, suit)`, is highest.
fn best_suit(rank: &Hit, suits: &[(Suit, Hit)], glyph_box: f64) -> Option<(Suit, Hit, f64)> {
    let rx = rank.peak.x as f64;
    let ry = rank.peak.y as f64;
    let rank_right = rx + rank.width as f64;

    suits
        .iter()
        .filter(|(_, s)| {
            let sx = s.peak.x as f64;
            let sy = s.peak.y as f64;
            sx > rx + rank.width as f64 / 2.0
                && sx - rank_right <= glyph_box
                && (sy - ry).abs() <= glyph_box / 2.0
        })
        .map(|(suit, s)| (*suit, *s, rank.peak.score.min(s.peak.score)))
        .max_by(|a, b| a.2.total_cmp(&b.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{blank_frame, draw_card, draw_glyph, draw_row, glyph_templates};
    use holdem_state::parse_cards;

    const SIZE: u32 = 12;

    fn detector() -> TokenDetector {
        TokenDetector::new(glyph_templates(SIZE), DetectorConfig::default())
    }

    #[test]
    fn test_confidence_mapping() {
        assert_eq!(score_to_confidence(0.79, 0.8), 0.0);
        assert!((score_to_confidence(0.8, 0.8) - 0.9).abs() < 1e-12);
        assert!((score_to_confidence(1.0, 0.8) - 1.0).abs() < 1e-12);
        let a = score_to_confidence(0.85, 0.8);
        let b = score_to_confidence(0.86, 0.8);
        assert!(a < b, "mapping must be strictly increasing");
        assert_eq!(score_to_confidence(1.0, 1.0), 1.0);
    }

    #[test]
    fn test_recovers_hero_and_board() {
        let mut frame = blank_frame(240, 160);
        let board = parse_cards("Ad 7c 2s").unwrap();
        let hero = parse_cards("Ah Ks").unwrap();
        draw_row(&mut frame, &board, 40, 30, 44, SIZE);
        draw_row(&mut frame, &hero, 60, 110, 44, SIZE);

        let detection = detector().detect(&frame);
        let mut found: Vec<Card> = detection.tokens.iter().map(|t| t.card).collect();
        found.sort();
        let mut expected: Vec<Card> = board.iter().chain(hero.iter()).copied().collect();
        expected.sort();
        assert_eq!(found, expected);

        for (i, a) in detection.tokens.iter().enumerate() {
            assert!(a.confidence >= 0.9 && a.confidence <= 1.0);
            for b in detection.tokens.iter().skip(i + 1) {
                let dx = a.x as f64 - b.x as f64;
                let dy = a.y as f64 - b.y as f64;
                assert!((dx * dx + dy * dy).sqrt() >= SIZE as f64);
            }
        }

        let ace_d = detection
            .tokens
            .iter()
            .find(|t| t.card.to_string() == "Ad")
            .unwrap();
        assert_eq!((ace_d.x, ace_d.y), (40, 30));
        assert_eq!(ace_d.width, 2 * SIZE + crate::synthetic::SUIT_GAP);
    }

    #[test]
    fn test_rank_without_suit_is_dropped() {
        let mut frame = blank_frame(120, 60);
        draw_glyph(&mut frame, Glyph::Rank(Rank::Queen), 20, 20, SIZE);
        draw_card(&mut frame, "9h".parse().unwrap(), 70, 20, SIZE);

        let detection = detector().detect(&frame);
        assert_eq!(detection.tokens.len(), 1);
        assert_eq!(detection.tokens[0].card.to_string(), "9h");
        assert!(detection
            .warnings
            .contains(&Warning::UnmatchedRanks { count: 1 }));
    }

    #[test]
    fn test_no_templates() {
        let d = TokenDetector::new(GlyphTemplates::default(), DetectorConfig::default());
        let detection = d.detect(&blank_frame(100, 100));
        assert!(detection.tokens.is_empty());
        assert_eq!(detection.warnings, vec![Warning::NoTemplates]);
    }

    #[test]
    fn test_tiny_frame() {
        let detection = detector().detect(&blank_frame(5, 40));
        assert!(detection.tokens.is_empty());
        assert!(matches!(
            detection.warnings[0],
            Warning::FrameTooSmall { width: 5, .. }
        ));
    }

    #[test]
    fn test_blank_frame_reports_nothing_detected() {
        let detection = detector().detect(&blank_frame(100, 80));
        assert!(detection.tokens.is_empty());
        assert_eq!(detection.warnings, vec![Warning::NoDetections]);
    }

    #[test]
    fn test_downscaled_frame_reports_original_coordinates() {
        let mut frame = blank_frame(400, 200);
        draw_card(&mut frame, "Kc".parse().unwrap(), 100, 80, 24);
        let config = DetectorConfig {
            match_threshold: 0.7,
            glyph_box_size: 24,
            max_frame_dimension: 200,
            ..DetectorConfig::default()
        };
        // Templates are drawn at 24px and shrunk alongside the frame; the
        // resampled borders differ slightly, hence the looser threshold.
        let d = TokenDetector::new(glyph_templates(24), config);
        let detection = d.detect(&frame);
        assert_eq!(detection.tokens.len(), 1);
        let t = &detection.tokens[0];
        assert_eq!(t.card.to_string(), "Kc");
        assert!((t.x as i64 - 100).abs() <= 2);
        assert!((t.y as i64 - 80).abs() <= 2);
    }
}
