use std::fmt::Debug;

/// A pixel sample storage type: `u8` for 2..8 bit images, `u16` for 9..16 bit images.
/// `MAXVAL` (ISO/IEC 14495-1's `(1<<bitsPerSample)-1`) is a runtime value, not a
/// per-type constant, since e.g. a 4-bit or 12-bit scan is still stored as `u8`/`u16`
/// but has a MAXVAL far below the storage type's own range.
pub trait JpeglsSample: Copy + Clone + Debug + Default + PartialEq + PartialOrd {
    const BITS: u32;

    fn to_i32(self) -> i32;
    fn from_i32(val: i32) -> Self;

    fn is_near(lhs: i32, rhs: i32, near: i32) -> bool {
        (lhs - rhs).abs() <= near
    }

    fn correct_prediction(predicted: i32, max_val: i32) -> i32 {
        predicted.clamp(0, max_val)
    }

    /// Reconstructs a sample from a prediction and a (possibly near-lossless quantized)
    /// error value, per ISO/IEC 14495-1 A.6.1: dequantize by `2*near+1`, wrap the result
    /// back into `[-near, MAXVAL+near]`, then clamp to `[0, MAXVAL]`.
    fn compute_reconstructed_sample(
        predicted: i32,
        error_value: i32,
        near: i32,
        range: i32,
        max_val: i32,
    ) -> i32 {
        let delta = error_value * (2 * near + 1);
        let mut rx = predicted + delta;
        let span = range * (2 * near + 1);
        if rx < -near {
            rx += span;
        } else if rx > max_val + near {
            rx -= span;
        }
        Self::correct_prediction(rx, max_val)
    }
}

impl JpeglsSample for u8 {
    const BITS: u32 = 8;
    fn to_i32(self) -> i32 {
        self as i32
    }
    fn from_i32(val: i32) -> Self {
        val as u8
    }
}

impl JpeglsSample for u16 {
    const BITS: u32 = 16;
    fn to_i32(self) -> i32 {
        self as i32
    }
    fn from_i32(val: i32) -> Self {
        val as u16
    }
}

/// `-1` if `i` is negative, `0` otherwise (ISO/IEC 14495-1 A.4, `BitWiseSign`).
pub fn bit_wise_sign(i: i32) -> i32 {
    i >> 31
}

pub fn apply_sign(val: i32, sign: i32) -> i32 {
    if sign < 0 {
        -val
    } else {
        val
    }
}

/// Maps a signed context index `qs` back to its canonical `0..365` storage slot (A.4).
pub fn apply_sign_for_index(val: i32, sign: i32) -> usize {
    if sign < 0 {
        (-val) as usize
    } else {
        val as usize
    }
}
