use ndarray::{s, Array2};

use crate::shared::pixel_buffer::PixelBuffer;

const WINDOW: usize = 8;
const STRIDE: usize = 16;

/// Mean local luminance standard deviation over a coarse grid of windows.
///
/// Non-negative and unbounded above; busy scenes typically land in the tens.
pub fn measure(buffer: &PixelBuffer) -> f64 {
    let w = buffer.width() as usize;
    let h = buffer.height() as usize;
    if w == 0 || h == 0 {
        return 0.0;
    }
    let Ok(luma) = Array2::from_shape_vec((h, w), buffer.luminance()) else {
        return 0.0;
    };

    let win_h = WINDOW.min(h);
    let win_w = WINDOW.min(w);

    let mut total = 0.0;
    let mut windows = 0usize;
    for y in (0..=h - win_h).step_by(STRIDE) {
        for x in (0..=w - win_w).step_by(STRIDE) {
            let window = luma.slice(s![y..y + win_h, x..x + win_w]);
            total += window.std(0.0);
            windows += 1;
        }
    }

    if windows == 0 {
        return 0.0;
    }
    total / windows as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn checkerboard(size: u32) -> PixelBuffer {
        let mut data = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        PixelBuffer::new(data, size, size)
    }

    #[test]
    fn test_flat_image_has_zero_complexity() {
        assert_relative_eq!(measure(&PixelBuffer::solid(40, 80, 120, 64, 64)), 0.0);
    }

    #[test]
    fn test_checkerboard_is_maximally_busy() {
        // Half the pixels at 0 and half at 255: std = 127.5.
        assert_relative_eq!(measure(&checkerboard(64)), 127.5, epsilon = 1e-6);
    }

    #[test]
    fn test_image_smaller_than_window_uses_whole_image() {
        assert_relative_eq!(measure(&checkerboard(4)), 127.5, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_buffer() {
        assert_relative_eq!(measure(&PixelBuffer::new(Vec::new(), 0, 0)), 0.0);
    }
}
