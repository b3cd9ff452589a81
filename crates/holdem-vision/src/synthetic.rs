//! Synthetic glyph rendering for tests and calibration runs.
//!
//! Each glyph is a deterministic pseudo-random ink pattern, so distinct
//! glyphs correlate poorly with one another and exactly with themselves.

use crate::templates::{GlyphTemplate, GlyphTemplates};
use holdem_data::Glyph;
use holdem_state::Card;
use image::{GrayImage, Luma, Rgba, RgbaImage};

pub const INK: u8 = 20;
pub const PAPER: u8 = 235;

/// Horizontal gap between a rank glyph and its suit glyph.
pub const SUIT_GAP: u32 = 2;

fn glyph_seed(glyph: Glyph) -> u64 {
    let index = Glyph::alphabet()
        .iter()
        .position(|g| *g == glyph)
        .unwrap_or(0) as u64;
    0x9E37_79B9_7F4A_7C15u64.wrapping_mul(index + 1)
}

/// Square ink pattern for `glyph`, `size` pixels on a side.
pub fn glyph_pattern(glyph: Glyph, size: u32) -> GrayImage {
    let mut state = glyph_seed(glyph);
    GrayImage::from_fn(size, size, |_, _| {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        if (state >> 33) & 1 == 1 {
            Luma([INK])
        } else {
            Luma([PAPER])
        }
    })
}

/// Templates for the full alphabet at one size.
pub fn glyph_templates(size: u32) -> GlyphTemplates {
    GlyphTemplates::new(
        Glyph::alphabet()
            .into_iter()
            .map(|glyph| GlyphTemplate {
                glyph,
                image: glyph_pattern(glyph, size),
            })
            .collect(),
    )
}

/// A blank table of the given size.
pub fn blank_frame(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([PAPER, PAPER, PAPER, 255]))
}

pub fn draw_glyph(frame: &mut RgbaImage, glyph: Glyph, x: u32, y: u32, size: u32) {
    let pattern = glyph_pattern(glyph, size);
    for (px, py, p) in pattern.enumerate_pixels() {
        let (fx, fy) = (x + px, y + py);
        if fx < frame.width() && fy < frame.height() {
            frame.put_pixel(fx, fy, Rgba([p[0], p[0], p[0], 255]));
        }
    }
}

/// Draw a card corner: rank glyph with its suit immediately to the right.
pub fn draw_card(frame: &mut RgbaImage, card: Card, x: u32, y: u32, size: u32) {
    draw_glyph(frame, Glyph::Rank(card.rank), x, y, size);
    draw_glyph(frame, Glyph::Suit(card.suit), x + size + SUIT_GAP, y, size);
}

/// Draw a row of cards starting at (`x`, `y`), `pitch` pixels apart.
pub fn draw_row(frame: &mut RgbaImage, cards: &[Card], x: u32, y: u32, pitch: u32, size: u32) {
    for (i, card) in cards.iter().enumerate() {
        draw_card(frame, *card, x + i as u32 * pitch, y, size);
    }
}
