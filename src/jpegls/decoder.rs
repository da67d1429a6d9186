use crate::FrameInfo;
use crate::error::JpeglsError;
use crate::jpeg_stream_reader::JpegStreamReader;
use crate::jpegls::color_transform;
use crate::jpegls::scan_decoder::ScanDecoder;
use crate::jpegls::traits::JpeglsSample;
use crate::jpegls::validate_spiff_header::validate_spiff_header;
use crate::jpegls::{ColorTransformation, InterleaveMode, SpiffHeader};

/// Mirrors [`super::encoder::JpeglsEncoder`]: reads SOI/SOF55/LSE/SOS/EOI, dispatches
/// one or more scans to [`ScanDecoder`], then undoes whatever the LineProcessor-level
/// transforms (color transform, BGR swap, stride) the encoder applied.
pub struct JpeglsDecoder<'a> {
    reader: JpegStreamReader<'a>,
    spiff_header: Option<SpiffHeader>,
    output_bgr: bool,
    /// Row length in bytes of the *destination* buffer passed to [`Self::decode`]; `0`
    /// means tightly packed.
    stride: usize,
}

impl<'a> JpeglsDecoder<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            reader: JpegStreamReader::new(source),
            spiff_header: None,
            output_bgr: false,
            stride: 0,
        }
    }

    pub fn set_output_bgr(&mut self, output_bgr: bool) -> Result<(), JpeglsError> {
        self.output_bgr = output_bgr;
        Ok(())
    }

    /// Sets the row length, in bytes, of the buffer passed to [`Self::decode`]. `0`
    /// (the default) means tightly packed rows.
    pub fn set_stride(&mut self, stride: usize) -> Result<(), JpeglsError> {
        self.stride = stride;
        Ok(())
    }

    pub fn read_header(&mut self) -> Result<(), JpeglsError> {
        self.reader.read_header(&mut self.spiff_header)?;
        if let Some(spiff) = &self.spiff_header {
            let frame_info = self.frame_info();
            validate_spiff_header(spiff, &frame_info)?;
        }
        Ok(())
    }

    pub fn read_spiff_header(&mut self) -> Result<bool, JpeglsError> {
        Ok(self.spiff_header.is_some())
    }

    pub fn spiff_header(&self) -> Option<SpiffHeader> {
        self.spiff_header
    }

    pub fn frame_info(&self) -> FrameInfo {
        self.reader.frame_info()
    }

    pub fn near_lossless(&self) -> i32 {
        self.reader.parameters().near_lossless
    }

    pub fn color_transformation(&self) -> ColorTransformation {
        self.reader.parameters().transformation
    }

    pub fn decode(&mut self, destination: &mut [u8]) -> Result<(), JpeglsError> {
        let frame_info = self.frame_info();

        if frame_info.bits_per_sample <= 8 {
            self.decode_typed::<u8>(destination, &frame_info)
        } else {
            self.decode_typed::<u16>(destination, &frame_info)
        }
    }

    fn decode_typed<T: JpeglsSample>(
        &mut self,
        destination: &mut [u8],
        frame_info: &FrameInfo,
    ) -> Result<(), JpeglsError> {
        let width = frame_info.width as usize;
        let height = frame_info.height as usize;
        let components = frame_info.component_count as usize;

        self.reader.read_start_of_scan_segment_jpegls()?;
        let coding_parameters = self.reader.parameters();
        let pc_parameters = self.reader.preset_coding_parameters();
        let interleave_mode = coding_parameters.interleave_mode;

        let mut interleaved: Vec<T> = vec![T::default(); width * height * components];

        if interleave_mode == InterleaveMode::None && components > 1 {
            for c in 0..components {
                if c > 0 {
                    self.reader.read_start_of_scan_segment_jpegls()?;
                }
                let scan_coding_parameters = self.reader.parameters();
                let mut scan_frame_info = *frame_info;
                scan_frame_info.component_count = 1;

                let mut plane = vec![T::default(); width * height];
                let mut scan_decoder = ScanDecoder::new(
                    scan_frame_info,
                    pc_parameters,
                    scan_coding_parameters,
                    self.reader.remaining_data(),
                )?;
                scan_decoder.decode_scan(&mut plane)?;
                let consumed = scan_decoder.bytes_consumed();
                self.reader.advance(consumed);

                for i in 0..width * height {
                    interleaved[i * components + c] = plane[i];
                }
            }
        } else if interleave_mode == InterleaveMode::Line && components > 1 {
            let mut scan_decoder = ScanDecoder::new(
                *frame_info,
                pc_parameters,
                coding_parameters,
                self.reader.remaining_data(),
            )?;
            let planes: Vec<Vec<T>> = scan_decoder.decode_scan_line_interleaved(components)?;
            let consumed = scan_decoder.bytes_consumed();
            self.reader.advance(consumed);

            for (c, plane) in planes.into_iter().enumerate() {
                for i in 0..width * height {
                    interleaved[i * components + c] = plane[i];
                }
            }
        } else {
            let mut scan_decoder = ScanDecoder::new(
                *frame_info,
                pc_parameters,
                coding_parameters,
                self.reader.remaining_data(),
            )?;
            scan_decoder.decode_scan(&mut interleaved)?;
            let consumed = scan_decoder.bytes_consumed();
            self.reader.advance(consumed);
        }

        if coding_parameters.transformation != ColorTransformation::None {
            let max_val = (1i32 << frame_info.bits_per_sample) - 1;
            let mut signed: Vec<i32> = interleaved.iter().map(|s| s.to_i32()).collect();
            color_transform::inverse(coding_parameters.transformation, &mut signed, max_val);
            for (dst, src) in interleaved.iter_mut().zip(signed.into_iter()) {
                *dst = T::from_i32(src);
            }
        }

        if self.output_bgr && components == 3 {
            let mut signed: Vec<i32> = interleaved.iter().map(|s| s.to_i32()).collect();
            color_transform::swap_bgr(&mut signed);
            for (dst, src) in interleaved.iter_mut().zip(signed.into_iter()) {
                *dst = T::from_i32(src);
            }
        }

        let bytes_per_sample = if T::BITS <= 8 { 1 } else { 2 };
        let row_sample_count = width * components;
        let stride = if self.stride == 0 {
            row_sample_count * bytes_per_sample
        } else {
            self.stride
        };

        if stride < row_sample_count * bytes_per_sample
            || destination.len() < stride * height.saturating_sub(1) + row_sample_count * bytes_per_sample
        {
            return Err(JpeglsError::UncompressedDestinationTooSmall);
        }

        for row in 0..height {
            let row_start = row * stride;
            let row_pixels = &interleaved[row * row_sample_count..(row + 1) * row_sample_count];
            let row_bytes = &mut destination[row_start..row_start + row_sample_count * bytes_per_sample];
            if bytes_per_sample == 1 {
                for (dst, src) in row_bytes.iter_mut().zip(row_pixels.iter()) {
                    *dst = src.to_i32() as u8;
                }
            } else {
                for (dst, src) in row_bytes.chunks_exact_mut(2).zip(row_pixels.iter()) {
                    let bytes = (src.to_i32() as u16).to_ne_bytes();
                    dst[0] = bytes[0];
                    dst[1] = bytes[1];
                }
            }
        }

        Ok(())
    }
}
