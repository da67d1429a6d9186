/*!
# jpegls-rs

A pure Rust implementation of JPEG-LS (ISO/IEC 14495-1 / ITU-T T.87), the
LOCO-I-based lossless and near-lossless image codec. Supports grayscale and
multi-component images from 2 to 16 bits per sample, all three interleave
modes (none, line, sample), the HP1/HP2/HP3 reversible color transforms, and
SPIFF header framing.

## Modules
- `jpegls`: the codec itself — [`jpegls::JpeglsEncoder`], [`jpegls::JpeglsDecoder`],
  and the scan-level prediction/context-modeling/entropy-coding machinery.
- `jpeg_stream_reader` / `jpeg_stream_writer`: JPEG marker and segment framing.
- `jpeg_marker_code`: the marker code table used by both.
- `error`: the crate's error type and its stable FFI error codes.
*/

pub mod constants;
pub mod error;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod jpeg_marker_code;
pub mod jpeg_stream_reader;
pub mod jpeg_stream_writer;
pub mod jpegls;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use error::JpeglsError;

/// Basic information about a JPEG image frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    /// Width of the frame in pixels.
    pub width: u32,
    /// Height of the frame in pixels.
    pub height: u32,
    /// Bits per sample (2-16).
    pub bits_per_sample: i32,
    /// Number of components (e.g., 1 for grayscale, 3 for RGB).
    pub component_count: i32,
}

#[cfg(test)]
mod tests {
    use super::FrameInfo;

    #[test]
    fn frame_info_defaults_to_zeroed() {
        let frame_info = FrameInfo::default();
        assert_eq!(frame_info.width, 0);
        assert_eq!(frame_info.height, 0);
    }
}
