//! Rule-of-thirds composition score.
//!
//! Sobel gradient energy is weighted by how close each pixel lies to one of
//! the four thirds gridlines, then normalized by the total edge energy.

use ndarray::Array2;

use crate::shared::constants::NEUTRAL_SCORE;
use crate::shared::pixel_buffer::PixelBuffer;

/// Normalized distance from a gridline at which a pixel stops contributing.
const GRIDLINE_FALLOFF: f64 = 0.1;

const THIRDS: [f64; 2] = [1.0 / 3.0, 2.0 / 3.0];

/// Returns a score in `[0, 1]`; flat images with no edges score neutral.
pub fn score(buffer: &PixelBuffer) -> f64 {
    let w = buffer.width() as usize;
    let h = buffer.height() as usize;
    if w < 3 || h < 3 {
        return NEUTRAL_SCORE;
    }

    let Ok(luma) = Array2::from_shape_vec((h, w), buffer.luminance()) else {
        return NEUTRAL_SCORE;
    };

    let mut total_energy = 0.0;
    let mut weighted_energy = 0.0;

    for y in 1..h - 1 {
        let ny = (y as f64 + 0.5) / h as f64;
        for x in 1..w - 1 {
            let magnitude = sobel_magnitude(&luma, y, x);
            if magnitude == 0.0 {
                continue;
            }
            let nx = (x as f64 + 0.5) / w as f64;
            total_energy += magnitude;
            weighted_energy += magnitude * gridline_weight(nx, ny);
        }
    }

    if total_energy < f64::EPSILON {
        return NEUTRAL_SCORE;
    }
    (weighted_energy / total_energy).clamp(0.0, 1.0)
}

fn sobel_magnitude(luma: &Array2<f64>, y: usize, x: usize) -> f64 {
    let p = |dy: isize, dx: isize| {
        luma[[(y as isize + dy) as usize, (x as isize + dx) as usize]]
    };
    let gx = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
    let gy = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
    (gx * gx + gy * gy).sqrt()
}

fn gridline_weight(nx: f64, ny: f64) -> f64 {
    let distance = THIRDS
        .iter()
        .flat_map(|t| [(nx - t).abs(), (ny - t).abs()])
        .fold(f64::INFINITY, f64::min);
    (1.0 - distance / GRIDLINE_FALLOFF).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Black image with a white band starting at column `edge_x`.
    fn vertical_edge(width: u32, height: u32, edge_x: u32) -> PixelBuffer {
        let mut data = Vec::new();
        for _y in 0..height {
            for x in 0..width {
                let v = if x >= edge_x { 255 } else { 0 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        PixelBuffer::new(data, width, height)
    }

    #[test]
    fn test_flat_image_is_neutral() {
        assert_relative_eq!(score(&PixelBuffer::solid(90, 90, 90, 30, 30)), NEUTRAL_SCORE);
    }

    #[test]
    fn test_tiny_image_is_neutral() {
        assert_relative_eq!(score(&PixelBuffer::solid(0, 0, 0, 2, 2)), NEUTRAL_SCORE);
    }

    #[test]
    fn test_edge_on_thirds_line_beats_centered_edge() {
        let on_third = score(&vertical_edge(90, 90, 30));
        let centered = score(&vertical_edge(90, 90, 45));
        assert!(on_third > centered, "{on_third} <= {centered}");
        assert!(on_third > 0.8);
    }

    #[test]
    fn test_score_in_unit_range() {
        for edge in [5, 20, 30, 45, 60, 85] {
            let s = score(&vertical_edge(90, 60, edge));
            assert!((0.0..=1.0).contains(&s), "edge {edge}: {s}");
        }
    }

    #[test]
    fn test_gridline_weight_peaks_on_line() {
        assert_relative_eq!(gridline_weight(1.0 / 3.0, 0.5), 1.0);
        assert_relative_eq!(gridline_weight(0.5, 0.5), 0.0);
    }
}
