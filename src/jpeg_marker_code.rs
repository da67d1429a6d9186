use crate::error::JpeglsError;

/// JPEG marker codes used by a JPEG-LS codestream (ISO/IEC 14495-1 / ITU-T T.87).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum JpegMarkerCode {
    /// SOI: Marks the start of an image.
    StartOfImage = 0xD8,
    /// EOI: Marks the end of an image.
    EndOfImage = 0xD9,
    /// SOS: Marks the start of scan.
    StartOfScan = 0xDA,
    /// DNL: Defines the number of lines in a scan.
    DefineNumberOfLines = 0xDC,
    /// DRI: Defines the restart interval used in succeeding scans.
    DefineRestartInterval = 0xDD,

    /// APP0: Application data 0: used for the JFIF header.
    ApplicationData0 = 0xE0,
    ApplicationData1 = 0xE1,
    ApplicationData2 = 0xE2,
    ApplicationData3 = 0xE3,
    ApplicationData4 = 0xE4,
    ApplicationData5 = 0xE5,
    ApplicationData6 = 0xE6,
    ApplicationData7 = 0xE7,
    /// APP8: used for the SPIFF header or HP color-transformation info.
    ApplicationData8 = 0xE8,
    ApplicationData9 = 0xE9,
    ApplicationData10 = 0xEA,
    ApplicationData11 = 0xEB,
    ApplicationData12 = 0xEC,
    ApplicationData13 = 0xED,
    ApplicationData14 = 0xEE,
    ApplicationData15 = 0xEF,

    /// COM: Comment block.
    Comment = 0xFE,

    // The following markers are defined in ISO/IEC 14495-1 | ITU-T T.87.
    /// SOF_55: Marks the start of a JPEG-LS encoded frame.
    StartOfFrameJpegls = 0xF7,
    /// LSE: Marks the start of a JPEG-LS preset coding parameters segment.
    JpeglsPresetParameters = 0xF8,
}

impl std::convert::TryFrom<u8> for JpegMarkerCode {
    type Error = JpeglsError;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0xD8 => Ok(Self::StartOfImage),
            0xD9 => Ok(Self::EndOfImage),
            0xDA => Ok(Self::StartOfScan),
            0xDC => Ok(Self::DefineNumberOfLines),
            0xDD => Ok(Self::DefineRestartInterval),
            0xE0 => Ok(Self::ApplicationData0),
            0xE1 => Ok(Self::ApplicationData1),
            0xE2 => Ok(Self::ApplicationData2),
            0xE3 => Ok(Self::ApplicationData3),
            0xE4 => Ok(Self::ApplicationData4),
            0xE5 => Ok(Self::ApplicationData5),
            0xE6 => Ok(Self::ApplicationData6),
            0xE7 => Ok(Self::ApplicationData7),
            0xE8 => Ok(Self::ApplicationData8),
            0xE9 => Ok(Self::ApplicationData9),
            0xEA => Ok(Self::ApplicationData10),
            0xEB => Ok(Self::ApplicationData11),
            0xEC => Ok(Self::ApplicationData12),
            0xED => Ok(Self::ApplicationData13),
            0xEE => Ok(Self::ApplicationData14),
            0xEF => Ok(Self::ApplicationData15),
            0xFE => Ok(Self::Comment),
            0xF7 => Ok(Self::StartOfFrameJpegls),
            0xF8 => Ok(Self::JpeglsPresetParameters),
            _ => Err(JpeglsError::UnknownJpegMarkerFound),
        }
    }
}

pub const JPEG_MARKER_START_BYTE: u8 = 0xFF;
pub const JPEG_RESTART_MARKER_BASE: u8 = 0xD0;
pub const JPEG_RESTART_MARKER_RANGE: u8 = 8;

/// True for RST0..RST7, the optional restart markers the standard allows inside a scan.
pub fn is_restart_marker(marker_byte: u8) -> bool {
    marker_byte >= JPEG_RESTART_MARKER_BASE
        && marker_byte < JPEG_RESTART_MARKER_BASE + JPEG_RESTART_MARKER_RANGE
}

/// True for any SOFn marker that is not the JPEG-LS frame marker (SOF55):
/// evidence the stream is JPEG 1/2000/etc, which this crate does not decode.
pub fn is_foreign_start_of_frame(marker_byte: u8) -> bool {
    (0xC0..=0xCF).contains(&marker_byte) && marker_byte != 0xC8
}
