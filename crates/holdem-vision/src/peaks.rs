//! Peak picking and non-maximum suppression

use crate::preprocess::Plane;

/// A local maximum on a correlation surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub x: usize,
    pub y: usize,
    pub score: f64,
}

/// All 8-neighbourhood local maxima scoring at or above `threshold`.
/// Plateaus yield several peaks; suppression collapses them afterwards.
pub fn local_maxima(surface: &Plane, threshold: f64) -> Vec<Peak> {
    let (w, h) = (surface.width, surface.height);
    let mut peaks = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let v = surface.get(x, y);
            if v < threshold {
                continue;
            }
            let mut is_max = true;
            'scan: for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    if (nx, ny) != (x, y) && surface.get(nx, ny) > v {
                        is_max = false;
                        break 'scan;
                    }
                }
            }
            if is_max {
                peaks.push(Peak { x, y, score: v });
            }
        }
    }

    peaks
}

/// Greedy NMS: keep the strongest item, drop everything closer than
/// `min_separation` to something already kept, stop after `limit` items.
///
/// `locate` returns `(x, y, score)` for an item.
pub fn suppress<T, F>(mut items: Vec<T>, min_separation: f64, limit: usize, locate: F) -> Vec<T>
where
    F: Fn(&T) -> (f64, f64, f64),
{
    items.sort_by(|a, b| locate(b).2.total_cmp(&locate(a).2));

    let min_sq = min_separation * min_separation;
    let mut kept: Vec<T> = Vec::new();
    for item in items {
        if kept.len() >= limit {
            break;
        }
        let (x, y, _) = locate(&item);
        let clear = kept.iter().all(|k| {
            let (kx, ky, _) = locate(k);
            let (dx, dy) = (kx - x, ky - y);
            dx * dx + dy * dy >= min_sq
        });
        if clear {
            kept.push(item);
        }
    }
    kept
}

/// Peak picking for one glyph: maxima above threshold, then NMS.
pub fn extract_peaks(surface: &Plane, threshold: f64, min_separation: f64, limit: usize) -> Vec<Peak> {
    let candidates = local_maxima(surface, threshold);
    suppress(candidates, min_separation, limit, |p| {
        (p.x as f64, p.y as f64, p.score)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(w: usize, h: usize, points: &[(usize, usize, f64)]) -> Plane {
        let mut p = Plane::zeros(w, h);
        for &(x, y, v) in points {
            p.data[y * w + x] = v;
        }
        p
    }

    #[test]
    fn test_local_maxima_threshold() {
        let s = surface(10, 10, &[(2, 2, 0.9), (7, 7, 0.5)]);
        let peaks = local_maxima(&s, 0.8);
        assert_eq!(peaks, vec![Peak { x: 2, y: 2, score: 0.9 }]);
    }

    #[test]
    fn test_nms_collapses_neighbours() {
        let s = surface(20, 10, &[(5, 5, 0.95), (6, 5, 0.94), (15, 5, 0.9)]);
        // (6,5) borders a stronger value, so it is never a maximum.
        let peaks = extract_peaks(&s, 0.8, 3.0, 10);
        assert_eq!(peaks.len(), 2);
        assert_eq!((peaks[0].x, peaks[0].y), (5, 5));
        assert_eq!((peaks[1].x, peaks[1].y), (15, 5));
    }

    #[test]
    fn test_plateau_yields_single_peak_after_nms() {
        let s = surface(10, 10, &[(4, 4, 0.9), (5, 4, 0.9)]);
        assert_eq!(local_maxima(&s, 0.8).len(), 2);
        assert_eq!(extract_peaks(&s, 0.8, 2.0, 10).len(), 1);
    }

    #[test]
    fn test_limit_keeps_strongest() {
        let s = surface(30, 5, &[(2, 2, 0.85), (12, 2, 0.99), (22, 2, 0.9)]);
        let peaks = extract_peaks(&s, 0.8, 2.0, 2);
        let xs: Vec<usize> = peaks.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![12, 22]);
    }
}
