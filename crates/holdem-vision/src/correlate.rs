//! Zero-mean normalized cross-correlation over a whole frame.
//!
//! The numerator is a cross-correlation computed in the frequency domain; the
//! per-window mean and variance of the frame come from summed-area tables.
//! One frame spectrum is shared by every glyph template.

use crate::preprocess::Plane;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftDirection, FftPlanner};

/// Windows whose variance falls below this are treated as featureless.
const MIN_VARIANCE: f64 = 1e-9;

/// Summed-area table with a zero row and column in front.
struct IntegralTable {
    data: Vec<f64>,
    stride: usize,
}

impl IntegralTable {
    fn new(plane: &Plane, f: impl Fn(f64) -> f64) -> Self {
        let stride = plane.width + 1;
        let mut data = vec![0.0; stride * (plane.height + 1)];
        for y in 0..plane.height {
            let mut row_sum = 0.0;
            for x in 0..plane.width {
                row_sum += f(plane.get(x, y));
                data[(y + 1) * stride + x + 1] = data[y * stride + x + 1] + row_sum;
            }
        }
        Self { data, stride }
    }

    /// Sum over the `w`x`h` window whose top-left corner is (`x`, `y`).
    #[inline]
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        let s = self.stride;
        self.data[(y + h) * s + x + w] - self.data[y * s + x + w] - self.data[(y + h) * s + x]
            + self.data[y * s + x]
    }
}

/// Precomputed frequency-domain view of one prepared frame.
pub struct FrameSpectrum {
    spectrum: Vec<Complex<f64>>,
    width: usize,
    height: usize,
    sum: IntegralTable,
    sum_sq: IntegralTable,
    planner: FftPlanner<f64>,
}

impl FrameSpectrum {
    pub fn new(frame: &Plane) -> Self {
        let mut planner = FftPlanner::new();
        let mut spectrum: Vec<Complex<f64>> =
            frame.data.iter().map(|v| Complex::new(*v, 0.0)).collect();
        fft2(
            &mut spectrum,
            frame.width,
            frame.height,
            &mut planner,
            FftDirection::Forward,
        );

        Self {
            spectrum,
            width: frame.width,
            height: frame.height,
            sum: IntegralTable::new(frame, |v| v),
            sum_sq: IntegralTable::new(frame, |v| v * v),
            planner,
        }
    }

    /// NCC surface for `template`: one score in [-1, 1] per placement of the
    /// template's top-left corner that keeps it fully inside the frame.
    /// Returns an empty plane when the template does not fit.
    pub fn ncc(&mut self, template: &Plane) -> Plane {
        let (fw, fh) = (self.width, self.height);
        let (tw, th) = (template.width, template.height);
        if template.is_empty() || tw > fw || th > fh {
            return Plane::zeros(0, 0);
        }

        let n = (tw * th) as f64;
        let t_mean = template.data.iter().sum::<f64>() / n;
        let t_norm = template
            .data
            .iter()
            .map(|v| (v - t_mean).powi(2))
            .sum::<f64>()
            .sqrt();

        let out_w = fw - tw + 1;
        let out_h = fh - th + 1;
        let mut surface = Plane::zeros(out_w, out_h);
        if t_norm < MIN_VARIANCE {
            return surface;
        }

        // Zero-mean template padded to frame size. With a zero-mean kernel the
        // numerator needs no frame-mean correction.
        let mut kernel = vec![Complex::new(0.0, 0.0); fw * fh];
        for y in 0..th {
            for x in 0..tw {
                kernel[y * fw + x] = Complex::new(template.get(x, y) - t_mean, 0.0);
            }
        }
        fft2(&mut kernel, fw, fh, &mut self.planner, FftDirection::Forward);

        for (k, f) in kernel.iter_mut().zip(self.spectrum.iter()) {
            *k = f * k.conj();
        }
        fft2(&mut kernel, fw, fh, &mut self.planner, FftDirection::Inverse);
        let norm = 1.0 / (fw * fh) as f64;

        for y in 0..out_h {
            for x in 0..out_w {
                let s1 = self.sum.window(x, y, tw, th);
                let s2 = self.sum_sq.window(x, y, tw, th);
                let variance = s2 - s1 * s1 / n;
                if variance < MIN_VARIANCE {
                    continue;
                }
                let numerator = kernel[y * fw + x].re * norm;
                let score = numerator / (variance.sqrt() * t_norm);
                surface.data[y * out_w + x] = score.clamp(-1.0, 1.0);
            }
        }

        surface
    }
}

/// In-place 2-D FFT: rows first, then columns. Unnormalized in both directions.
fn fft2(
    data: &mut [Complex<f64>],
    width: usize,
    height: usize,
    planner: &mut FftPlanner<f64>,
    direction: FftDirection,
) {
    let row_fft = planner.plan_fft(width, direction);
    for row in data.chunks_exact_mut(width) {
        row_fft.process(row);
    }

    let col_fft = planner.plan_fft(height, direction);
    let mut column = vec![Complex::new(0.0, 0.0); height];
    for x in 0..width {
        for (y, c) in column.iter_mut().enumerate() {
            *c = data[y * width + x];
        }
        col_fft.process(&mut column);
        for (y, c) in column.iter().enumerate() {
            data[y * width + x] = *c;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane_from_fn(w: usize, h: usize, f: impl Fn(usize, usize) -> f64) -> Plane {
        let mut p = Plane::zeros(w, h);
        for y in 0..h {
            for x in 0..w {
                p.data[y * w + x] = f(x, y);
            }
        }
        p
    }

    /// Direct per-pixel NCC, used as the reference.
    fn brute_force(frame: &Plane, tmpl: &Plane, x0: usize, y0: usize) -> f64 {
        let n = (tmpl.width * tmpl.height) as f64;
        let t_mean = tmpl.data.iter().sum::<f64>() / n;
        let mut f_sum = 0.0;
        for y in 0..tmpl.height {
            for x in 0..tmpl.width {
                f_sum += frame.get(x0 + x, y0 + y);
            }
        }
        let f_mean = f_sum / n;
        let (mut cross, mut fv, mut tv) = (0.0, 0.0, 0.0);
        for y in 0..tmpl.height {
            for x in 0..tmpl.width {
                let a = frame.get(x0 + x, y0 + y) - f_mean;
                let b = tmpl.get(x, y) - t_mean;
                cross += a * b;
                fv += a * a;
                tv += b * b;
            }
        }
        cross / (fv.sqrt() * tv.sqrt())
    }

    #[test]
    fn test_matches_brute_force() {
        let frame = plane_from_fn(23, 17, |x, y| (((x * 7 + y * 13) % 11) as f64) / 10.0);
        let tmpl = plane_from_fn(5, 4, |x, y| (((x * 3 + y * 5) % 7) as f64) / 6.0);
        let mut spectrum = FrameSpectrum::new(&frame);
        let surface = spectrum.ncc(&tmpl);
        assert_eq!((surface.width, surface.height), (19, 14));

        for &(x, y) in &[(0, 0), (3, 2), (18, 13), (10, 7)] {
            let expected = brute_force(&frame, &tmpl, x, y);
            let got = surface.get(x, y);
            assert!(
                (expected - got).abs() < 1e-6,
                "({}, {}): expected {}, got {}",
                x,
                y,
                expected,
                got
            );
        }
    }

    #[test]
    fn test_exact_placement_scores_one() {
        let tmpl = plane_from_fn(6, 6, |x, y| if (x * 5 + y * 3) % 4 == 0 { 1.0 } else { 0.0 });
        let mut frame = Plane::zeros(30, 20);
        for y in 0..6 {
            for x in 0..6 {
                frame.data[(y + 8) * 30 + x + 11] = tmpl.get(x, y);
            }
        }
        let surface = FrameSpectrum::new(&frame).ncc(&tmpl);
        assert!((surface.get(11, 8) - 1.0).abs() < 1e-9);

        // Flat background windows have no variance and score zero.
        assert_eq!(surface.get(0, 0), 0.0);
    }

    #[test]
    fn test_template_larger_than_frame() {
        let frame = Plane::zeros(4, 4);
        let tmpl = plane_from_fn(5, 5, |x, _| x as f64);
        assert!(FrameSpectrum::new(&frame).ncc(&tmpl).is_empty());
    }
}
