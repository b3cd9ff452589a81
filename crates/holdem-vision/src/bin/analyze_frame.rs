//! CLI tool to run a saved table screenshot through token detection and row grouping.
//! Usage: cargo run -p holdem-vision --features cli --bin analyze_frame -- <screenshot.png> <templates_dir> [output_dir]

use anyhow::{Context, Result};
use holdem_capture::{crop_region, Roi};
use holdem_state::format_cards;
use holdem_vision::{Band, DetectorConfig, GlyphTemplates, GrouperConfig, RoleGrouper, TokenDetector};
use std::path::PathBuf;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <screenshot.png> <templates_dir> [output_dir]", args[0]);
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let templates_dir = PathBuf::from(&args[2]);
    let output_dir = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./debug_output"));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    println!("Loading image: {}", input_path.display());
    let img = image::open(&input_path)
        .with_context(|| format!("opening {}", input_path.display()))?
        .to_rgba8();
    println!("Image size: {}x{}", img.width(), img.height());

    let templates = GlyphTemplates::load(&templates_dir)?;
    println!("Templates: {}", templates.len());

    println!("\n=== Tokens ===");
    let detector = TokenDetector::new(templates, DetectorConfig::default());
    let detection = detector.detect(&img);
    for t in &detection.tokens {
        println!(
            "  {} at ({}, {}) {}x{} score={:.3} confidence={:.3}",
            t.card, t.x, t.y, t.width, t.height, t.score, t.confidence
        );
    }

    println!("\n=== Rows ===");
    let grouper = RoleGrouper::new(GrouperConfig::default());
    for (i, band) in grouper.bands(&detection.tokens).iter().enumerate() {
        println!("  Row {} y={}: {}", i, band.y, format_cards(&band.cards()));
        let roi = band_roi(band, img.width(), img.height());
        let crop = crop_region(&img, &roi);
        let path = output_dir.join(format!("row_{}.png", i));
        if let Err(e) = crop.save(&path) {
            eprintln!("Failed to save {}: {}", path.display(), e);
        }
    }

    let grouping = grouper.group(&detection.tokens);
    println!("\n=== Roles ===");
    match &grouping.hero {
        Some(h) => println!("Hero: {}", format_cards(&h.cards())),
        None => println!("Hero: NOT FOUND"),
    }
    match &grouping.board {
        Some(b) => println!("Board: {}", format_cards(&b.cards())),
        None => println!("Board: NOT FOUND"),
    }
    match &grouping.observed.phase {
        Some(p) => println!("Phase: {} ({:.2})", p.value, p.confidence),
        None => println!("Phase: unknown"),
    }

    println!("\n=== Warnings ===");
    for w in detection.warnings.iter().chain(&grouping.warnings) {
        println!("  {}", w);
    }

    println!("\nRow crops saved to: {}", output_dir.display());
    Ok(())
}

/// Normalized bounding box of a row, padded by one glyph height.
fn band_roi(band: &Band, width: u32, height: u32) -> Roi {
    let pad = band.tokens.iter().map(|t| t.height).max().unwrap_or(0);
    let x0 = band.tokens.iter().map(|t| t.x).min().unwrap_or(0).saturating_sub(pad);
    let y0 = band.y.saturating_sub(pad);
    let x1 = band.tokens.iter().map(|t| t.x + t.width).max().unwrap_or(0) + pad;
    let y1 = band.tokens.iter().map(|t| t.y + t.height).max().unwrap_or(0) + pad;
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    Roi {
        x: x0 as f64 / w,
        y: y0 as f64 / h,
        width: (x1 - x0) as f64 / w,
        height: (y1 - y0) as f64 / h,
    }
}
