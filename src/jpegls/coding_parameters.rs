use crate::constants::DEFAULT_RESET_THRESHOLD;
use crate::jpegls::{ColorTransformation, InterleaveMode};
use std::cmp::{max, min};

/// Per-scan coding state derived from the frame header and preset parameters
/// (ISO/IEC 14495-1 Annex A/C). `quantized_bits_per_sample` and `limit` are derived
/// from `RANGE`, not directly from the sample bit depth, since `RANGE` shrinks as
/// `near_lossless` grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingParameters {
    pub near_lossless: i32,
    pub restart_interval: u32,
    pub interleave_mode: InterleaveMode,
    pub transformation: ColorTransformation,
    pub range: i32,
    pub limit: i32,
    pub quantized_bits_per_sample: i32,
}

impl Default for CodingParameters {
    /// A placeholder used while a stream's frame/scan headers are still being parsed;
    /// callers overwrite it with [`CodingParameters::new`] once bit depth, near-lossless
    /// value, and interleave mode are all known.
    fn default() -> Self {
        Self::new(8, 0, InterleaveMode::None, ColorTransformation::None, 0)
    }
}

impl CodingParameters {
    pub fn new(
        bits_per_sample: i32,
        near_lossless: i32,
        interleave_mode: InterleaveMode,
        transformation: ColorTransformation,
        restart_interval: u32,
    ) -> Self {
        let maximum_sample_value = (1 << bits_per_sample) - 1;
        let range = (maximum_sample_value + 2 * near_lossless) / (2 * near_lossless + 1) + 1;
        let quantized_bits_per_sample = ceil_log2(range);
        let limit = compute_limit_parameter(bits_per_sample);
        Self {
            near_lossless,
            restart_interval,
            interleave_mode,
            transformation,
            range,
            limit,
            quantized_bits_per_sample,
        }
    }
}

fn ceil_log2(value: i32) -> i32 {
    let mut bits = 0;
    let mut v: i64 = 1;
    while v < value as i64 {
        v <<= 1;
        bits += 1;
    }
    bits
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JpeglsPcParameters {
    pub maximum_sample_value: i32,
    pub threshold1: i32,
    pub threshold2: i32,
    pub threshold3: i32,
    pub reset_value: i32,
}

/// Clamping function, ISO/IEC 14495-1 Figure C.3.
const fn clamp(i: i32, j: i32, maximum_sample_value: i32) -> i32 {
    if i > maximum_sample_value || i < j {
        j
    } else {
        i
    }
}

pub fn compute_maximum_near_lossless(maximum_sample_value: i32) -> i32 {
    debug_assert!(maximum_sample_value >= 1);
    min(255, maximum_sample_value / 2)
}

/// Default coding threshold values, ISO/IEC 14495-1 C.2.4.1.1.1.
pub fn compute_default(maximum_sample_value: i32, near_lossless: i32) -> JpeglsPcParameters {
    debug_assert!(maximum_sample_value <= u16::MAX as i32);
    debug_assert!(
        near_lossless >= 0 && near_lossless <= compute_maximum_near_lossless(maximum_sample_value)
    );

    // Default threshold values for MAXVAL = 255, NEAR = 0 (table C.3).
    const DEFAULT_THRESHOLD1: i32 = 3;
    const DEFAULT_THRESHOLD2: i32 = 7;
    const DEFAULT_THRESHOLD3: i32 = 21;

    if maximum_sample_value >= 128 {
        let factor = (min(maximum_sample_value, 4095) + 128) / 256;
        let threshold1 = clamp(
            factor * (DEFAULT_THRESHOLD1 - 2) + 2 + 3 * near_lossless,
            near_lossless + 1,
            maximum_sample_value,
        );
        let threshold2 = clamp(
            factor * (DEFAULT_THRESHOLD2 - 3) + 3 + 5 * near_lossless,
            threshold1,
            maximum_sample_value,
        );

        JpeglsPcParameters {
            maximum_sample_value,
            threshold1,
            threshold2,
            threshold3: clamp(
                factor * (DEFAULT_THRESHOLD3 - 4) + 4 + 7 * near_lossless,
                threshold2,
                maximum_sample_value,
            ),
            reset_value: DEFAULT_RESET_THRESHOLD,
        }
    } else {
        let factor = 256 / (maximum_sample_value + 1);
        let threshold1 = clamp(
            max(2, DEFAULT_THRESHOLD1 / factor + 3 * near_lossless),
            near_lossless + 1,
            maximum_sample_value,
        );
        let threshold2 = clamp(
            max(3, DEFAULT_THRESHOLD2 / factor + 5 * near_lossless),
            threshold1,
            maximum_sample_value,
        );

        JpeglsPcParameters {
            maximum_sample_value,
            threshold1,
            threshold2,
            threshold3: clamp(
                max(4, DEFAULT_THRESHOLD3 / factor + 7 * near_lossless),
                threshold2,
                maximum_sample_value,
            ),
            reset_value: DEFAULT_RESET_THRESHOLD,
        }
    }
}

pub fn is_default(preset_coding_parameters: &JpeglsPcParameters, defaults: &JpeglsPcParameters) -> bool {
    if preset_coding_parameters.maximum_sample_value == 0
        && preset_coding_parameters.threshold1 == 0
        && preset_coding_parameters.threshold2 == 0
        && preset_coding_parameters.threshold3 == 0
        && preset_coding_parameters.reset_value == 0
    {
        return true;
    }

    preset_coding_parameters.maximum_sample_value == defaults.maximum_sample_value
        && preset_coding_parameters.threshold1 == defaults.threshold1
        && preset_coding_parameters.threshold2 == defaults.threshold2
        && preset_coding_parameters.threshold3 == defaults.threshold3
        && preset_coding_parameters.reset_value == defaults.reset_value
}

pub fn is_valid(
    pc_parameters: &JpeglsPcParameters,
    maximum_component_value: i32,
    near_lossless: i32,
) -> Result<JpeglsPcParameters, ()> {
    debug_assert!(maximum_component_value >= 3 && maximum_component_value <= u16::MAX as i32);

    if pc_parameters.maximum_sample_value != 0
        && (pc_parameters.maximum_sample_value < 1
            || pc_parameters.maximum_sample_value > maximum_component_value)
    {
        return Err(());
    }

    let maximum_sample_value = if pc_parameters.maximum_sample_value != 0 {
        pc_parameters.maximum_sample_value
    } else {
        maximum_component_value
    };

    if pc_parameters.threshold1 != 0
        && (pc_parameters.threshold1 < near_lossless + 1
            || pc_parameters.threshold1 > maximum_sample_value)
    {
        return Err(());
    }

    let defaults = compute_default(maximum_sample_value, near_lossless);

    let threshold1 = if pc_parameters.threshold1 != 0 {
        pc_parameters.threshold1
    } else {
        defaults.threshold1
    };

    if pc_parameters.threshold2 != 0
        && (pc_parameters.threshold2 < threshold1 || pc_parameters.threshold2 > maximum_sample_value)
    {
        return Err(());
    }

    let threshold2 = if pc_parameters.threshold2 != 0 {
        pc_parameters.threshold2
    } else {
        defaults.threshold2
    };

    if pc_parameters.threshold3 != 0
        && (pc_parameters.threshold3 < threshold2 || pc_parameters.threshold3 > maximum_sample_value)
    {
        return Err(());
    }

    if pc_parameters.reset_value != 0
        && (pc_parameters.reset_value < 3 || pc_parameters.reset_value > max(255, maximum_sample_value))
    {
        return Err(());
    }

    Ok(JpeglsPcParameters {
        maximum_sample_value,
        threshold1,
        threshold2,
        threshold3: if pc_parameters.threshold3 != 0 {
            pc_parameters.threshold3
        } else {
            defaults.threshold3
        },
        reset_value: if pc_parameters.reset_value != 0 {
            pc_parameters.reset_value
        } else {
            defaults.reset_value
        },
    })
}

pub fn compute_limit_parameter(bits_per_sample: i32) -> i32 {
    2 * (bits_per_sample + max(8, bits_per_sample))
}
