use crate::FrameInfo;
use crate::error::JpeglsError;
use crate::jpeg_stream_writer::JpegStreamWriter;
use crate::jpegls::coding_parameters::{compute_default, is_valid};
use crate::jpegls::color_transform;
use crate::jpegls::scan_encoder::ScanEncoder;
use crate::jpegls::traits::JpeglsSample;
use crate::jpegls::{CodingParameters, ColorTransformation, InterleaveMode, JpeglsPcParameters};

/// Drives the frame-level JPEG-LS encode: writes SOI/SOF55/LSE/SOS/EOI around one or
/// more scans, and hands the LineProcessor's work (stride extraction, color transform,
/// interleave-mode dispatch) off to [`ScanEncoder`] per scan.
pub struct JpeglsEncoder<'a> {
    writer: JpegStreamWriter<'a>,
    frame_info: Option<FrameInfo>,
    near_lossless: i32,
    interleave_mode: InterleaveMode,
    pc_parameters: Option<JpeglsPcParameters>,
    color_transformation: ColorTransformation,
    /// Row length in bytes of the *source* buffer passed to [`Self::encode`]; `0` means
    /// "tightly packed" (`width * component_count * bytesPerSample`).
    stride: usize,
}

impl<'a> JpeglsEncoder<'a> {
    pub fn new(destination: &'a mut [u8]) -> Self {
        Self {
            writer: JpegStreamWriter::new(destination),
            frame_info: None,
            near_lossless: 0,
            interleave_mode: InterleaveMode::None,
            pc_parameters: None,
            color_transformation: ColorTransformation::None,
            stride: 0,
        }
    }

    pub fn set_frame_info(&mut self, frame_info: FrameInfo) -> Result<(), JpeglsError> {
        if frame_info.width == 0 {
            return Err(JpeglsError::InvalidParameterWidth);
        }
        if frame_info.height == 0 {
            return Err(JpeglsError::InvalidParameterHeight);
        }
        if !(crate::constants::MINIMUM_BITS_PER_SAMPLE..=crate::constants::MAXIMUM_BITS_PER_SAMPLE)
            .contains(&frame_info.bits_per_sample)
        {
            return Err(JpeglsError::InvalidParameterBitsPerSample);
        }
        if !(crate::constants::MINIMUM_COMPONENT_COUNT..=crate::constants::MAXIMUM_COMPONENT_COUNT)
            .contains(&frame_info.component_count)
        {
            return Err(JpeglsError::InvalidParameterComponentCount);
        }
        self.frame_info = Some(frame_info);
        Ok(())
    }

    pub fn set_near_lossless(&mut self, near_lossless: i32) -> Result<(), JpeglsError> {
        if near_lossless < 0 {
            return Err(JpeglsError::InvalidParameterNearLossless);
        }
        self.near_lossless = near_lossless;
        Ok(())
    }

    pub fn set_interleave_mode(
        &mut self,
        interleave_mode: InterleaveMode,
    ) -> Result<(), JpeglsError> {
        self.interleave_mode = interleave_mode;
        Ok(())
    }

    pub fn set_preset_coding_parameters(
        &mut self,
        pc_parameters: JpeglsPcParameters,
    ) -> Result<(), JpeglsError> {
        self.pc_parameters = Some(pc_parameters);
        Ok(())
    }

    pub fn set_color_transformation(
        &mut self,
        transformation: ColorTransformation,
    ) -> Result<(), JpeglsError> {
        self.color_transformation = transformation;
        Ok(())
    }

    /// Sets the row length, in bytes, of the buffer passed to [`Self::encode`]. `0`
    /// (the default) means tightly packed rows; any larger value lets the caller hand
    /// in a buffer with per-row padding without that padding reaching the codec.
    pub fn set_stride(&mut self, stride: usize) -> Result<(), JpeglsError> {
        self.stride = stride;
        Ok(())
    }

    pub fn encode(&mut self, source: &[u8]) -> Result<usize, JpeglsError> {
        let frame_info = *self
            .frame_info
            .as_ref()
            .ok_or(JpeglsError::InvalidParameterComponentCount)?;

        let max_sample_value = (1i32 << frame_info.bits_per_sample) - 1;
        let max_near = crate::jpegls::coding_parameters::compute_maximum_near_lossless(max_sample_value);
        if self.near_lossless > max_near {
            return Err(JpeglsError::InvalidParameterNearLossless);
        }

        let pc = match self.pc_parameters {
            Some(p) => is_valid(&p, max_sample_value, self.near_lossless)
                .map_err(|_| JpeglsError::InvalidParameterPresetCodingParameters)?,
            None => compute_default(max_sample_value, self.near_lossless),
        };

        if self.color_transformation != ColorTransformation::None {
            if frame_info.component_count != 3 {
                return Err(JpeglsError::UnsupportedColorTransform);
            }
            if !color_transform::is_transform_supported_bit_depth(frame_info.bits_per_sample) {
                return Err(JpeglsError::UnsupportedBitDepthForTransform);
            }
        }

        let interleave_mode = if frame_info.component_count == 1 {
            InterleaveMode::None
        } else {
            self.interleave_mode
        };

        let coding_parameters = CodingParameters::new(
            frame_info.bits_per_sample,
            self.near_lossless,
            interleave_mode,
            self.color_transformation,
            0,
        );

        self.writer.write_start_of_image()?;
        self.writer.write_start_of_frame_jpegls(&frame_info)?;
        self.writer.write_jpegls_preset_parameters_segment(&pc)?;
        if self.color_transformation != ColorTransformation::None {
            self.writer
                .write_color_transform_comment(self.color_transformation)?;
        }

        if frame_info.bits_per_sample <= 8 {
            self.encode_typed::<u8>(source, &frame_info, pc, coding_parameters, interleave_mode)?;
        } else {
            self.encode_typed::<u16>(source, &frame_info, pc, coding_parameters, interleave_mode)?;
        }

        self.writer.write_end_of_image()?;
        Ok(self.writer.len())
    }

    fn encode_typed<T: JpeglsSample>(
        &mut self,
        source: &[u8],
        frame_info: &FrameInfo,
        pc: JpeglsPcParameters,
        coding_parameters: CodingParameters,
        interleave_mode: InterleaveMode,
    ) -> Result<(), JpeglsError> {
        let width = frame_info.width as usize;
        let height = frame_info.height as usize;
        let components = frame_info.component_count as usize;
        let bytes_per_sample = if T::BITS <= 8 { 1 } else { 2 };
        let row_sample_count = width * components;
        let stride = if self.stride == 0 {
            row_sample_count * bytes_per_sample
        } else {
            self.stride
        };

        if stride < row_sample_count * bytes_per_sample {
            return Err(JpeglsError::InvalidParameterStride);
        }
        if source.len() < stride * height.saturating_sub(1) + row_sample_count * bytes_per_sample {
            return Err(JpeglsError::UncompressedDestinationTooSmall);
        }

        let mut interleaved: Vec<T> = Vec::with_capacity(width * height * components);
        for row in 0..height {
            let row_start = row * stride;
            let row_bytes = &source[row_start..row_start + row_sample_count * bytes_per_sample];
            if bytes_per_sample == 1 {
                interleaved.extend(row_bytes.iter().map(|&b| T::from_i32(b as i32)));
            } else {
                interleaved.extend(
                    row_bytes
                        .chunks_exact(2)
                        .map(|c| T::from_i32(u16::from_ne_bytes([c[0], c[1]]) as i32)),
                );
            }
        }

        if self.color_transformation != ColorTransformation::None {
            let max_val = (1i32 << frame_info.bits_per_sample) - 1;
            let mut signed: Vec<i32> = interleaved.iter().map(|s| s.to_i32()).collect();
            color_transform::forward(self.color_transformation, &mut signed, max_val);
            for (dst, src) in interleaved.iter_mut().zip(signed.into_iter()) {
                *dst = T::from_i32(src);
            }
        }

        match interleave_mode {
            InterleaveMode::None if components > 1 => {
                for c in 0..components {
                    self.writer.write_start_of_scan_segment_planar(
                        c as u8 + 1,
                        coding_parameters.near_lossless,
                        InterleaveMode::None,
                    )?;

                    let plane: Vec<T> = (0..width * height)
                        .map(|i| interleaved[i * components + c])
                        .collect();

                    let mut scan_frame_info = *frame_info;
                    scan_frame_info.component_count = 1;
                    let mut scan_coding_parameters = coding_parameters;
                    scan_coding_parameters.interleave_mode = InterleaveMode::None;

                    let dest_slice = self.writer.remaining_slice();
                    let mut scan_encoder =
                        ScanEncoder::new(scan_frame_info, pc, scan_coding_parameters, dest_slice);
                    let bytes_written = scan_encoder.encode_scan(&plane)?;
                    drop(scan_encoder);
                    self.writer.advance(bytes_written);
                }
            }
            InterleaveMode::Line => {
                self.writer.write_start_of_scan_segment(
                    frame_info.component_count,
                    coding_parameters.near_lossless,
                    interleave_mode,
                )?;

                let planes: Vec<Vec<T>> = (0..components)
                    .map(|c| {
                        (0..width * height)
                            .map(|i| interleaved[i * components + c])
                            .collect()
                    })
                    .collect();

                let dest_slice = self.writer.remaining_slice();
                let mut scan_encoder = ScanEncoder::new(*frame_info, pc, coding_parameters, dest_slice);
                let bytes_written = scan_encoder.encode_scan_line_interleaved(&planes)?;
                drop(scan_encoder);
                self.writer.advance(bytes_written);
            }
            _ => {
                // `Sample` interleave, or `None` with a single component.
                self.writer.write_start_of_scan_segment(
                    frame_info.component_count,
                    coding_parameters.near_lossless,
                    interleave_mode,
                )?;

                let dest_slice = self.writer.remaining_slice();
                let mut scan_encoder = ScanEncoder::new(*frame_info, pc, coding_parameters, dest_slice);
                let bytes_written = scan_encoder.encode_scan(&interleaved)?;
                drop(scan_encoder);
                self.writer.advance(bytes_written);
            }
        }

        Ok(())
    }
}
