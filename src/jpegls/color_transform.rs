//! The three reversible HP color transforms (ISO/IEC 14495-1 Annex A informative /
//! `colortransform.h` in the reference codebase), plus the BGR/RGB output swap.
//!
//! All three transforms are defined on three-component pixels and are exact inverses
//! of one another; they are applied to the whole interleaved pixel buffer before a
//! scan is encoded, and undone after a scan is decoded, so the scan codec itself never
//! observes anything but already-transformed (or already-restored) sample values.

use crate::jpegls::ColorTransformation;

/// Reduces a transform intermediate into the sample range `[0, max_val]`, mirroring
/// the reference transform's `static_cast<sample_type>` of each component: since
/// `max_val + 1` is always a power of two, masking reproduces the same wraparound a
/// narrowing integer cast would apply. Every component a later step divides (`>>`)
/// must be reduced this way first, or the division sees bits that would never have
/// survived being stored as an actual sample.
fn reduce(value: i32, max_val: i32) -> i32 {
    value & max_val
}

/// Applies the forward transform to a `Sample`-interleaved three-component buffer
/// in place. `samples` holds `width*height*3` values in `R,G,B,R,G,B,...` order.
/// `max_val` is the frame's `MAXVAL` (`(1<<bitsPerSample)-1`).
pub fn forward(transformation: ColorTransformation, samples: &mut [i32], max_val: i32) {
    match transformation {
        ColorTransformation::None => {}
        ColorTransformation::Hp1 => {
            for px in samples.chunks_exact_mut(3) {
                let (r, g, b) = (px[0], px[1], px[2]);
                px[0] = reduce(r - g, max_val);
                px[1] = g;
                px[2] = reduce(b - g, max_val);
            }
        }
        ColorTransformation::Hp2 => {
            for px in samples.chunks_exact_mut(3) {
                let (r, g, b) = (px[0], px[1], px[2]);
                px[0] = reduce(r - g, max_val);
                px[1] = g;
                px[2] = reduce(b - ((r + g) >> 1), max_val);
            }
        }
        ColorTransformation::Hp3 => {
            for px in samples.chunks_exact_mut(3) {
                let (r, g, b) = (px[0], px[1], px[2]);
                let r_prime = reduce(r - g, max_val);
                let b_prime = reduce(b - g, max_val);
                px[0] = r_prime;
                px[1] = reduce(g + ((r_prime + b_prime) >> 2), max_val);
                px[2] = b_prime;
            }
        }
    }
}

/// Inverse of [`forward`]: restores original `R,G,B` order and values from the
/// transformed buffer produced by the encoder.
pub fn inverse(transformation: ColorTransformation, samples: &mut [i32], max_val: i32) {
    match transformation {
        ColorTransformation::None => {}
        ColorTransformation::Hp1 => {
            for px in samples.chunks_exact_mut(3) {
                let (r_prime, g, b_prime) = (px[0], px[1], px[2]);
                px[0] = reduce(r_prime + g, max_val);
                px[1] = g;
                px[2] = reduce(b_prime + g, max_val);
            }
        }
        ColorTransformation::Hp2 => {
            for px in samples.chunks_exact_mut(3) {
                let (r_prime, g, b_prime) = (px[0], px[1], px[2]);
                let r = reduce(r_prime + g, max_val);
                px[0] = r;
                px[1] = g;
                px[2] = reduce(b_prime + ((r + g) >> 1), max_val);
            }
        }
        ColorTransformation::Hp3 => {
            for px in samples.chunks_exact_mut(3) {
                let (r_prime, g_prime, b_prime) = (px[0], px[1], px[2]);
                let g = reduce(g_prime - ((r_prime + b_prime) >> 2), max_val);
                px[0] = reduce(r_prime + g, max_val);
                px[1] = g;
                px[2] = reduce(b_prime + g, max_val);
            }
        }
    }
}

/// Swaps components 0 and 2 (R<->B) of a `Sample`-interleaved three-component buffer.
/// A presentation-only concern: it never touches what gets encoded, only the raw
/// pixels handed to/received from the caller.
pub fn swap_bgr(samples: &mut [i32]) {
    for px in samples.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
}

/// `true` for the bit depths the standard's HP transforms are defined for (A `near`
/// quantizer away from 8/16 bits still shares the same sample range, so only the
/// storage width matters here).
pub fn is_transform_supported_bit_depth(bits_per_sample: i32) -> bool {
    bits_per_sample == 8 || bits_per_sample == 16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hp1_round_trips() {
        let mut samples = vec![10, 200, 5, 255, 0, 255];
        let original = samples.clone();
        forward(ColorTransformation::Hp1, &mut samples, 255);
        inverse(ColorTransformation::Hp1, &mut samples, 255);
        assert_eq!(samples, original);
    }

    #[test]
    fn hp2_round_trips() {
        let mut samples = vec![10, 200, 5, 255, 0, 255, 128, 128, 128];
        let original = samples.clone();
        forward(ColorTransformation::Hp2, &mut samples, 255);
        inverse(ColorTransformation::Hp2, &mut samples, 255);
        assert_eq!(samples, original);
    }

    #[test]
    fn hp3_round_trips() {
        let mut samples = vec![10, 200, 5, 255, 0, 255, 1, 254, 17];
        let original = samples.clone();
        forward(ColorTransformation::Hp3, &mut samples, 255);
        inverse(ColorTransformation::Hp3, &mut samples, 255);
        assert_eq!(samples, original);
    }

    #[test]
    fn hp2_round_trips_with_wrapping_component() {
        // R < G forces the R' = R-G subtraction below zero, which must wrap into
        // range before the inverse reuses it in the B reconstruction shift.
        let mut samples = vec![0, 200, 0];
        let original = samples.clone();
        forward(ColorTransformation::Hp2, &mut samples, 255);
        inverse(ColorTransformation::Hp2, &mut samples, 255);
        assert_eq!(samples, original);
    }

    #[test]
    fn hp3_round_trips_with_wrapping_component() {
        let mut samples = vec![0, 200, 0, 255, 1, 254];
        let original = samples.clone();
        forward(ColorTransformation::Hp3, &mut samples, 255);
        inverse(ColorTransformation::Hp3, &mut samples, 255);
        assert_eq!(samples, original);
    }

    #[test]
    fn bgr_swap_is_its_own_inverse() {
        let mut samples = vec![1, 2, 3, 4, 5, 6];
        swap_bgr(&mut samples);
        assert_eq!(samples, vec![3, 2, 1, 6, 5, 4]);
        swap_bgr(&mut samples);
        assert_eq!(samples, vec![1, 2, 3, 4, 5, 6]);
    }
}
