//! JPEG-LS codestream reader.
//!
//! This module provides the `JpegStreamReader`, which handles the sequential
//! reading of JPEG markers and segments (SOF55, LSE, SOS, DRI, APPn/COM, etc.).

use crate::FrameInfo;
use crate::error::JpeglsError;
use crate::jpeg_marker_code::{JPEG_MARKER_START_BYTE, JpegMarkerCode, is_foreign_start_of_frame};
use crate::jpegls::coding_parameters::{CodingParameters, JpeglsPcParameters};
use crate::jpegls::{ColorTransformation, InterleaveMode, SpiffHeader};
use std::convert::{TryFrom, TryInto};

/// The 4-byte tag this crate writes into a COM segment to carry the HP color
/// transformation, since the JPEG-LS standard itself has no dedicated field for it.
const COLOR_TRANSFORM_COMMENT_TAG: [u8; 4] = *b"HPCT";

/// Metadata for an individual image component as it appears in SOF55.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegLsComponent {
    /// Component ID (typically 1, 2, 3, ... in order of appearance).
    pub id: u8,
    /// Horizontal sampling factor (always 1 for JPEG-LS).
    pub h_samp_factor: u8,
    /// Vertical sampling factor (always 1 for JPEG-LS).
    pub v_samp_factor: u8,
}

/// Internal state of the stream reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegStreamReaderState {
    BeforeStartOfImage,
    HeaderSection,
    ScanSection,
    EndOfImage,
}

/// A reader for JPEG-LS codestreams that manages marker parsing and segment state.
pub struct JpegStreamReader<'a> {
    source: &'a [u8],
    position: usize,
    state: JpegStreamReaderState,
    frame_info: FrameInfo,
    parameters: CodingParameters,
    preset_coding_parameters: JpeglsPcParameters,
    spiff_header: Option<SpiffHeader>,
    pub components: Vec<JpegLsComponent>,
    pub restart_interval: u16,
}

impl<'a> JpegStreamReader<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            position: 0,
            state: JpegStreamReaderState::BeforeStartOfImage,
            frame_info: FrameInfo::default(),
            parameters: CodingParameters::default(),
            preset_coding_parameters: JpeglsPcParameters::default(),
            spiff_header: None,
            components: Vec::new(),
            restart_interval: 0,
        }
    }

    pub fn frame_info(&self) -> FrameInfo {
        self.frame_info
    }

    pub fn parameters(&self) -> CodingParameters {
        self.parameters
    }

    pub fn preset_coding_parameters(&self) -> JpeglsPcParameters {
        self.preset_coding_parameters
    }

    pub fn spiff_header(&self) -> Option<SpiffHeader> {
        self.spiff_header
    }

    pub fn remaining_data(&self) -> &[u8] {
        &self.source[self.position..]
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Reads SOI and all header-section markers up to (but not including) SOS.
    pub fn read_header(
        &mut self,
        spiff_header: &mut Option<SpiffHeader>,
    ) -> Result<(), JpeglsError> {
        self.read_start_of_image()?;

        loop {
            let marker = self.read_marker()?;
            match marker {
                JpegMarkerCode::StartOfFrameJpegls => {
                    self.read_start_of_frame_segment()?;
                }
                JpegMarkerCode::JpeglsPresetParameters => {
                    self.read_jpegls_preset_parameters_segment()?;
                }
                JpegMarkerCode::StartOfScan => {
                    self.position -= 2;
                    self.state = JpegStreamReaderState::HeaderSection;
                    break;
                }
                JpegMarkerCode::ApplicationData8 => {
                    let spiff = self.read_spiff_header_segment()?;
                    if spiff.is_some() {
                        *spiff_header = spiff;
                        self.spiff_header = spiff;
                    }
                }
                JpegMarkerCode::Comment => {
                    self.read_comment_segment()?;
                }
                JpegMarkerCode::DefineRestartInterval => {
                    self.read_dri_segment()?;
                }
                _ => {
                    self.skip_segment()?;
                }
            }
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, JpeglsError> {
        if self.position >= self.source.len() {
            return Err(JpeglsError::NeedMoreData);
        }
        let b = self.source[self.position];
        self.position += 1;
        Ok(b)
    }

    pub fn read_u16(&mut self) -> Result<u16, JpeglsError> {
        let b1 = self.read_u8()? as u16;
        let b2 = self.read_u8()? as u16;
        Ok((b1 << 8) | b2)
    }

    pub fn read_u32(&mut self) -> Result<u32, JpeglsError> {
        let b1 = self.read_u8()? as u32;
        let b2 = self.read_u8()? as u32;
        let b3 = self.read_u8()? as u32;
        let b4 = self.read_u8()? as u32;
        Ok((b1 << 24) | (b2 << 16) | (b3 << 8) | b4)
    }

    pub fn peek_marker(&self) -> Result<JpegMarkerCode, JpeglsError> {
        if self.position + 1 >= self.source.len() {
            return Err(JpeglsError::NeedMoreData);
        }
        if self.source[self.position] != JPEG_MARKER_START_BYTE {
            return Err(JpeglsError::JpegMarkerStartByteNotFound);
        }
        JpegMarkerCode::try_from(self.source[self.position + 1])
    }

    pub fn read_marker(&mut self) -> Result<JpegMarkerCode, JpeglsError> {
        if self.read_u8()? != JPEG_MARKER_START_BYTE {
            return Err(JpeglsError::JpegMarkerStartByteNotFound);
        }
        let marker_byte = self.read_u8()?;
        if is_foreign_start_of_frame(marker_byte) {
            return Err(JpeglsError::UnsupportedEncoding);
        }
        JpegMarkerCode::try_from(marker_byte)
    }

    fn read_start_of_image(&mut self) -> Result<(), JpeglsError> {
        if self.read_marker()? != JpegMarkerCode::StartOfImage {
            return Err(JpeglsError::StartOfImageMarkerNotFound);
        }
        self.state = JpegStreamReaderState::HeaderSection;
        Ok(())
    }

    fn read_start_of_frame_segment(&mut self) -> Result<(), JpeglsError> {
        let _length = self.read_u16()?;
        self.frame_info.bits_per_sample = self.read_u8()? as i32;
        self.frame_info.height = self.read_u16()? as u32;
        self.frame_info.width = self.read_u16()? as u32;
        self.frame_info.component_count = self.read_u8()? as i32;

        self.components.clear();
        for _ in 0..self.frame_info.component_count {
            let id = self.read_u8()?;
            let sampling = self.read_u8()?;
            let _tq = self.read_u8()?;
            self.components.push(JpegLsComponent {
                id,
                h_samp_factor: sampling >> 4,
                v_samp_factor: sampling & 0x0F,
            });
        }
        Ok(())
    }

    fn read_jpegls_preset_parameters_segment(&mut self) -> Result<(), JpeglsError> {
        let length = self.read_u16()?;
        let param_type = self.read_u8()?;
        if param_type == 1 {
            self.preset_coding_parameters.maximum_sample_value = self.read_u16()? as i32;
            self.preset_coding_parameters.threshold1 = self.read_u16()? as i32;
            self.preset_coding_parameters.threshold2 = self.read_u16()? as i32;
            self.preset_coding_parameters.threshold3 = self.read_u16()? as i32;
            self.preset_coding_parameters.reset_value = self.read_u16()? as i32;
        } else {
            self.position += (length as usize).saturating_sub(3);
        }
        Ok(())
    }

    /// Reads the proprietary COM segment this crate uses to carry the HP color
    /// transformation across the wire; any other comment is skipped untouched.
    fn read_comment_segment(&mut self) -> Result<(), JpeglsError> {
        let length = self.read_u16()? as usize;
        if length < 2 + 4 + 1 {
            self.position += length.saturating_sub(2);
            return Ok(());
        }
        let mut tag = [0u8; 4];
        for slot in &mut tag {
            *slot = self.read_u8()?;
        }
        if tag == COLOR_TRANSFORM_COMMENT_TAG {
            let transform_byte = self.read_u8()?;
            self.parameters.transformation = ColorTransformation::try_from(transform_byte)?;
            self.position += length - (2 + 4 + 1);
        } else {
            self.position += length - (2 + 4);
        }
        Ok(())
    }

    pub fn read_start_of_scan_segment_jpegls(&mut self) -> Result<(), JpeglsError> {
        if self.read_marker()? != JpegMarkerCode::StartOfScan {
            return Err(JpeglsError::JpegMarkerStartByteNotFound);
        }
        let length = self.read_u16()?;
        let mut consumed = 2i32; // Length field itself (2 bytes)

        let components_in_scan = self.read_u8()? as i32;
        consumed += 1;
        for _ in 0..components_in_scan {
            let _id = self.read_u8()?;
            let _mapping = self.read_u8()?;
            consumed += 2;
        }
        let near_lossless = self.read_u8()? as i32;
        let interleave_mode = InterleaveMode::try_from(self.read_u8()?)?;
        let _point_transform = self.read_u8()?;
        consumed += 3;

        if (length as i32) > consumed {
            let skip = (length as i32) - consumed;
            self.advance(skip as usize);
        }

        self.parameters = CodingParameters::new(
            self.frame_info.bits_per_sample,
            near_lossless,
            interleave_mode,
            self.parameters.transformation,
            self.restart_interval as u32,
        );

        self.state = JpegStreamReaderState::ScanSection;
        Ok(())
    }

    fn read_spiff_header_segment(&mut self) -> Result<Option<SpiffHeader>, JpeglsError> {
        let length = self.read_u16()? as usize;
        if length < 32 {
            self.position += length - 2;
            return Ok(None);
        }

        let mut identifier = [0u8; 6];
        for slot in &mut identifier {
            *slot = self.read_u8()?;
        }

        if identifier != [b'S', b'P', b'I', b'F', b'F', 0] {
            self.position += length - 8;
            return Ok(None);
        }

        let _version_major = self.read_u8()?;
        let _version_minor = self.read_u8()?;
        let profile_id = self.read_u8()?;
        let component_count = self.read_u8()?;
        let height = self.read_u32()?;
        let width = self.read_u32()?;
        let color_space = self.read_u8()?;
        let bits_per_sample = self.read_u8()?;
        let compression_type = self.read_u8()?;
        let resolution_units = self.read_u8()?;
        let vertical_resolution = self.read_u32()?;
        let horizontal_resolution = self.read_u32()?;

        Ok(Some(SpiffHeader {
            profile_id: profile_id.try_into()?,
            component_count: component_count as i32,
            height,
            width,
            color_space: color_space.try_into()?,
            bits_per_sample: bits_per_sample as i32,
            compression_type: compression_type.try_into()?,
            resolution_units: resolution_units.try_into()?,
            vertical_resolution,
            horizontal_resolution,
        }))
    }

    pub fn skip_segment(&mut self) -> Result<(), JpeglsError> {
        let length = self.read_u16()?;
        if length < 2 {
            return Err(JpeglsError::InvalidCompressedData);
        }
        self.position += (length as usize) - 2;
        Ok(())
    }

    pub fn advance(&mut self, count: usize) {
        self.position += count;
    }

    pub fn read_dri_segment(&mut self) -> Result<(), JpeglsError> {
        let length = self.read_u16()?;
        if length != 4 {
            return Err(JpeglsError::InvalidCompressedData);
        }
        self.restart_interval = self.read_u16()?;
        Ok(())
    }
}
