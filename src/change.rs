use crate::config::ChangeDetectorConfig;
use holdem_capture::{crop_region, Roi};
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbaImage};
use tracing::debug;

const SNAPSHOT_WIDTH: u32 = 48;
const SNAPSHOT_HEIGHT: u32 = 27;

/// Fires when a region of the frame differs enough from the last snapshot
/// that fired.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    name: &'static str,
    roi: Roi,
    threshold: f64,
    reference: Option<GrayImage>,
}

impl ChangeDetector {
    pub fn new(name: &'static str, config: &ChangeDetectorConfig) -> Self {
        Self {
            name,
            roi: config.roi,
            threshold: config.threshold,
            reference: None,
        }
    }

    /// Compare `frame` against the reference. The first frame only sets the
    /// reference and never fires.
    pub fn observe(&mut self, frame: &RgbaImage) -> bool {
        if frame.width() == 0 || frame.height() == 0 {
            return false;
        }
        let snapshot = self.snapshot(frame);
        let Some(reference) = &self.reference else {
            self.reference = Some(snapshot);
            return false;
        };

        let diff = mean_abs_diff(reference, &snapshot);
        let fired = diff >= self.threshold;
        debug!(
            "{} change {:.4} (threshold {:.4}){}",
            self.name,
            diff,
            self.threshold,
            if fired { " fired" } else { "" }
        );
        if fired {
            self.reference = Some(snapshot);
        }
        fired
    }

    fn snapshot(&self, frame: &RgbaImage) -> GrayImage {
        let region = crop_region(frame, &self.roi);
        let gray = imageops::grayscale(&region);
        imageops::resize(&gray, SNAPSHOT_WIDTH, SNAPSHOT_HEIGHT, FilterType::Triangle)
    }
}

/// Mean absolute pixel difference scaled to [0, 1].
fn mean_abs_diff(a: &GrayImage, b: &GrayImage) -> f64 {
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| x.abs_diff(y) as u64)
        .sum();
    let n = a.as_raw().len().max(1) as f64;
    total as f64 / (n * 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn frame(fill: u8) -> RgbaImage {
        RgbaImage::from_pixel(200, 100, Rgba([fill, fill, fill, 255]))
    }

    fn paint(frame: &mut RgbaImage, x0: u32, x1: u32, value: u8) {
        for y in 0..frame.height() {
            for x in x0..x1 {
                frame.put_pixel(x, y, Rgba([value, value, value, 255]));
            }
        }
    }

    fn detector(roi: Roi) -> ChangeDetector {
        ChangeDetector::new("test", &ChangeDetectorConfig { roi, threshold: 0.1 })
    }

    #[test]
    fn test_first_frame_sets_reference() {
        let mut d = detector(Roi::FULL);
        assert!(!d.observe(&frame(200)));
        assert!(!d.observe(&frame(200)));
    }

    #[test]
    fn test_fires_on_large_change_then_rebases() {
        let mut d = detector(Roi::FULL);
        d.observe(&frame(200));
        assert!(d.observe(&frame(20)));
        // Reference moved to the dark frame.
        assert!(!d.observe(&frame(20)));
        assert!(d.observe(&frame(200)));
    }

    #[test]
    fn test_small_change_does_not_fire() {
        let mut d = detector(Roi::FULL);
        d.observe(&frame(200));
        assert!(!d.observe(&frame(195)));
    }

    #[test]
    fn test_change_outside_roi_ignored() {
        let left = Roi {
            x: 0.0,
            y: 0.0,
            width: 0.5,
            height: 1.0,
        };
        let mut d = detector(left);
        let base = frame(200);
        d.observe(&base);

        let mut right_changed = base.clone();
        paint(&mut right_changed, 120, 200, 0);
        assert!(!d.observe(&right_changed));

        let mut left_changed = base;
        paint(&mut left_changed, 0, 100, 0);
        assert!(d.observe(&left_changed));
    }

    #[test]
    fn test_mean_abs_diff_scale() {
        let a = GrayImage::from_pixel(4, 4, image::Luma([0]));
        let b = GrayImage::from_pixel(4, 4, image::Luma([255]));
        assert_eq!(mean_abs_diff(&a, &b), 1.0);
        assert_eq!(mean_abs_diff(&a, &a), 0.0);
    }
}
