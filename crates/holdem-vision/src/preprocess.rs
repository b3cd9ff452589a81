use image::{GrayImage, RgbaImage};
use tracing::debug;

/// Single-channel intensity plane in row-major order, values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub data: Vec<f64>,
    pub width: usize,
    pub height: usize,
}

impl Plane {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            data: vec![0.0; width * height],
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A frame ready for matching, plus the factor it was shrunk by.
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    pub plane: Plane,
    /// Processing-resolution pixels per original pixel (1.0 = not resized).
    pub scale: f64,
}

impl PreparedFrame {
    /// Map a processing-resolution coordinate back onto the original frame.
    pub fn to_original(&self, v: f64) -> u32 {
        (v / self.scale).round().max(0.0) as u32
    }
}

/// Grayscale, shrink if the larger side exceeds `max_dimension`, then
/// stretch contrast and invert so glyph ink becomes the bright signal.
pub fn prepare_frame(frame: &RgbaImage, max_dimension: u32) -> PreparedFrame {
    let gray = image::imageops::grayscale(frame);
    let (w, h) = gray.dimensions();
    let larger = w.max(h);

    let (gray, scale) = if max_dimension > 0 && larger > max_dimension {
        let scale = max_dimension as f64 / larger as f64;
        let nw = ((w as f64 * scale).round() as u32).max(1);
        let nh = ((h as f64 * scale).round() as u32).max(1);
        debug!("Downscaling frame {}x{} -> {}x{}", w, h, nw, nh);
        (
            image::imageops::resize(&gray, nw, nh, image::imageops::FilterType::Triangle),
            scale,
        )
    } else {
        (gray, 1.0)
    };

    PreparedFrame {
        plane: normalize_inverted(&gray),
        scale,
    }
}

/// Apply the same treatment to a glyph template, resized by the frame's scale.
pub fn prepare_template(template: &GrayImage, scale: f64) -> Plane {
    if (scale - 1.0).abs() < f64::EPSILON {
        return normalize_inverted(template);
    }
    let (w, h) = template.dimensions();
    let nw = ((w as f64 * scale).round() as u32).max(3);
    let nh = ((h as f64 * scale).round() as u32).max(3);
    let resized = image::imageops::resize(template, nw, nh, image::imageops::FilterType::Triangle);
    normalize_inverted(&resized)
}

/// Min-max contrast stretch into [0, 1], inverted. A flat image maps to zeros.
fn normalize_inverted(gray: &GrayImage) -> Plane {
    let (w, h) = gray.dimensions();
    let (mut lo, mut hi) = (u8::MAX, u8::MIN);
    for p in gray.pixels() {
        lo = lo.min(p[0]);
        hi = hi.max(p[0]);
    }

    let mut plane = Plane::zeros(w as usize, h as usize);
    if hi <= lo {
        return plane;
    }
    let range = (hi - lo) as f64;
    for (dst, p) in plane.data.iter_mut().zip(gray.pixels()) {
        *dst = 1.0 - (p[0] - lo) as f64 / range;
    }
    plane
}
