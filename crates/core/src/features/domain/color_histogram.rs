//! Joint RGB color histogram.
//!
//! Each channel is quantized to `HISTOGRAM_LEVELS` levels and the three
//! levels index one bin, so two photos of the same scene under the same light
//! land in the same bins even when individual pixels shift.

use crate::shared::constants::{HISTOGRAM_BINS, HISTOGRAM_LEVELS};
use crate::shared::pixel_buffer::PixelBuffer;

pub fn compute(buffer: &PixelBuffer) -> Vec<f64> {
    let mut hist = vec![0.0f64; HISTOGRAM_BINS];
    let mut count = 0usize;

    for px in buffer.data().chunks_exact(PixelBuffer::CHANNELS) {
        let r = quantize(px[0]);
        let g = quantize(px[1]);
        let b = quantize(px[2]);
        hist[(r * HISTOGRAM_LEVELS + g) * HISTOGRAM_LEVELS + b] += 1.0;
        count += 1;
    }

    if count > 0 {
        let total = count as f64;
        for v in &mut hist {
            *v /= total;
        }
    }

    hist
}

pub fn empty() -> Vec<f64> {
    vec![0.0; HISTOGRAM_BINS]
}

fn quantize(value: u8) -> usize {
    (value as usize * HISTOGRAM_LEVELS) / 256
}
