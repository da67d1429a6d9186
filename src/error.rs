use thiserror::Error;

/// Stable, FFI-safe classification of a failure (ISO/IEC 14495-1 Annex / `charls::ApiResult`
/// compatible integer values). Every [`JpeglsError`] variant maps onto exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum StableErrorCode {
    Ok = 0,
    InvalidJlsParameters = 1,
    ParameterValueNotSupported = 2,
    UncompressedBufferTooSmall = 3,
    CompressedBufferTooSmall = 4,
    InvalidCompressedData = 5,
    TooMuchCompressedData = 6,
    ImageTypeNotSupported = 7,
    UnsupportedBitDepthForTransform = 8,
    UnsupportedColorTransform = 9,
    UnsupportedEncoding = 10,
    UnknownJpegMarker = 11,
    MissingJpegMarkerStart = 12,
    UnspecifiedFailure = 13,
    UnexpectedFailure = 14,
}

/// Errors produced by the JPEG-LS codec, frame layer, and CLI.
///
/// Each failure aborts the current scan; the core never retries. A richer variant
/// set than the stable wire codes is kept here for diagnostics, but [`JpeglsError::stable_code`]
/// always gives callers (in particular the C ABI) the one discriminated value they can rely on.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpeglsError {
    #[error("destination buffer is too small to hold the compressed output")]
    DestinationTooSmall,
    #[error("destination buffer is too small to hold the decoded pixels")]
    UncompressedDestinationTooSmall,
    #[error("need more compressed data to complete the scan")]
    NeedMoreData,
    #[error("compressed data is structurally invalid")]
    InvalidCompressedData,
    #[error("trailing data found after the end-of-image marker")]
    TooMuchCompressedData,
    #[error("image type (bit depth / component count) is not supported")]
    ImageTypeNotSupported,
    #[error("color transform is not supported for this bit depth")]
    UnsupportedBitDepthForTransform,
    #[error("color transform is not supported for this component count")]
    UnsupportedColorTransform,
    #[error("encoding found in the stream is not JPEG-LS")]
    UnsupportedEncoding,
    #[error("unknown JPEG marker code")]
    UnknownJpegMarkerFound,
    #[error("expected a JPEG marker start byte (0xFF) but did not find one")]
    JpegMarkerStartByteNotFound,
    #[error("start of image marker not found")]
    StartOfImageMarkerNotFound,
    #[error("invalid SPIFF header")]
    InvalidSpiffHeader,
    #[error("invalid JPEG-LS preset coding parameter type")]
    InvalidJpeglsPresetParameterType,
    #[error("invalid parameter: width")]
    InvalidParameterWidth,
    #[error("invalid parameter: height")]
    InvalidParameterHeight,
    #[error("invalid parameter: bits per sample")]
    InvalidParameterBitsPerSample,
    #[error("invalid parameter: component count")]
    InvalidParameterComponentCount,
    #[error("invalid parameter: interleave mode")]
    InvalidParameterInterleaveMode,
    #[error("invalid parameter: near-lossless value")]
    InvalidParameterNearLossless,
    #[error("invalid parameter: JPEG-LS preset coding parameters")]
    InvalidParameterPresetCodingParameters,
    #[error("invalid parameter: color transformation")]
    InvalidParameterColorTransformation,
    #[error("invalid parameter: stride")]
    InvalidParameterStride,
    #[error("operation is not valid in the codec's current state")]
    InvalidOperation,
    #[error("unexpected internal failure")]
    UnexpectedFailure,
}

impl JpeglsError {
    pub fn stable_code(&self) -> StableErrorCode {
        use JpeglsError::*;
        match self {
            DestinationTooSmall => StableErrorCode::CompressedBufferTooSmall,
            UncompressedDestinationTooSmall => StableErrorCode::UncompressedBufferTooSmall,
            NeedMoreData | InvalidCompressedData => StableErrorCode::InvalidCompressedData,
            TooMuchCompressedData => StableErrorCode::TooMuchCompressedData,
            ImageTypeNotSupported => StableErrorCode::ImageTypeNotSupported,
            UnsupportedBitDepthForTransform => StableErrorCode::UnsupportedBitDepthForTransform,
            UnsupportedColorTransform => StableErrorCode::UnsupportedColorTransform,
            UnsupportedEncoding => StableErrorCode::UnsupportedEncoding,
            UnknownJpegMarkerFound => StableErrorCode::UnknownJpegMarker,
            JpegMarkerStartByteNotFound | StartOfImageMarkerNotFound => {
                StableErrorCode::MissingJpegMarkerStart
            }
            InvalidSpiffHeader | InvalidJpeglsPresetParameterType => {
                StableErrorCode::InvalidJlsParameters
            }
            InvalidParameterWidth
            | InvalidParameterHeight
            | InvalidParameterBitsPerSample
            | InvalidParameterComponentCount
            | InvalidParameterInterleaveMode
            | InvalidParameterNearLossless
            | InvalidParameterPresetCodingParameters
            | InvalidParameterColorTransformation
            | InvalidParameterStride => StableErrorCode::InvalidJlsParameters,
            InvalidOperation => StableErrorCode::UnspecifiedFailure,
            UnexpectedFailure => StableErrorCode::UnexpectedFailure,
        }
    }
}

pub type JpeglsResult<T> = Result<T, JpeglsError>;
