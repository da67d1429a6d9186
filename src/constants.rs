//! Constants defined by ISO/IEC 14495-1 (JPEG-LS) and by the SPIFF wrapper format.

pub const DEFAULT_RESET_THRESHOLD: i32 = 64; // Default RESET value, ISO/IEC 14495-1 table C.2

pub const MINIMUM_COMPONENT_COUNT: i32 = 1;
pub const MAXIMUM_COMPONENT_COUNT: i32 = 255;
pub const MINIMUM_BITS_PER_SAMPLE: i32 = 2;
pub const MAXIMUM_BITS_PER_SAMPLE: i32 = 16;
pub const MINIMUM_APPLICATION_DATA_ID: i32 = 0;
pub const MAXIMUM_APPLICATION_DATA_ID: i32 = 15;

pub const MAX_K_VALUE: i32 = 16; // Implementation limit (theoretical limit is 32)

// ISO/IEC 14495-1, section 4.8.1 defines the SPIFF version numbers to be used for the SPIFF
// header in combination with JPEG-LS.
pub const SPIFF_MAJOR_REVISION_NUMBER: u8 = 2;
pub const SPIFF_MINOR_REVISION_NUMBER: u8 = 0;

pub const SPIFF_END_OF_DIRECTORY_ENTRY_TYPE: u8 = 1;

/// Size of a SPIFF header segment, serialized, including the 6-byte "SPIFF\0" identifier.
pub const SPIFF_HEADER_SIZE_IN_BYTES: usize = 34;

/// Special stride value meaning "compute the tightest stride from width/bits/components".
pub const AUTO_CALCULATE_STRIDE: usize = 0;

pub const SEGMENT_LENGTH_SIZE: usize = 2;
pub const SEGMENT_MAX_DATA_SIZE: usize = u16::MAX as usize - SEGMENT_LENGTH_SIZE;

/// Run-length exponent table (ISO/IEC 14495-1, A.18), indexed by RUNindex (0..31).
pub const J: [i32; 32] = [
    0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 9, 10, 11, 12, 13,
    14, 15,
];
