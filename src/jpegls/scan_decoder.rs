use crate::FrameInfo;
use crate::error::JpeglsError;
use crate::jpeg_marker_code::JPEG_MARKER_START_BYTE;
use crate::jpegls::regular_mode_context::RegularModeContext;
use crate::jpegls::run_mode_context::RunModeContext;
use crate::jpegls::traits::JpeglsSample;
use crate::jpegls::{CodingParameters, InterleaveMode, JpeglsPcParameters};

/// Mirrors [`super::scan_encoder::ScanEncoder`]: decodes one scan (single component,
/// `Sample`-interleaved, or, via [`Self::decode_scan_line_interleaved`], `Line`-interleaved).
pub struct ScanDecoder<'a> {
    frame_info: FrameInfo,
    coding_parameters: CodingParameters,
    source: &'a [u8],
    position: usize,
    valid_bits: i32,
    read_cache: usize,

    regular_mode_contexts: Vec<Vec<RegularModeContext>>,
    run_mode_contexts: Vec<Vec<RunModeContext>>,
    run_index: Vec<usize>,

    t1: i32,
    t2: i32,
    t3: i32,
    reset_threshold: i32,
}

const CACHE_BITS: i32 = (std::mem::size_of::<usize>() * 8) as i32;

impl<'a> ScanDecoder<'a> {
    pub fn new(
        frame_info: FrameInfo,
        pc_parameters: JpeglsPcParameters,
        coding_parameters: CodingParameters,
        source: &'a [u8],
    ) -> Result<Self, JpeglsError> {
        let num_components = match coding_parameters.interleave_mode {
            InterleaveMode::None => 1,
            InterleaveMode::Line | InterleaveMode::Sample => frame_info.component_count as usize,
        };

        let range = coding_parameters.range;
        let mut regular_mode_contexts = Vec::with_capacity(num_components);
        let mut run_mode_contexts = Vec::with_capacity(num_components);
        let mut run_index = Vec::with_capacity(num_components);
        for _ in 0..num_components {
            regular_mode_contexts.push(vec![RegularModeContext::new(range); 365]);
            run_mode_contexts.push(vec![
                RunModeContext::new(0, range),
                RunModeContext::new(1, range),
            ]);
            run_index.push(0);
        }

        let mut decoder = Self {
            frame_info,
            coding_parameters,
            source,
            position: 0,
            valid_bits: 0,
            read_cache: 0,
            regular_mode_contexts,
            run_mode_contexts,
            run_index,
            t1: pc_parameters.threshold1,
            t2: pc_parameters.threshold2,
            t3: pc_parameters.threshold3,
            reset_threshold: pc_parameters.reset_value,
        };

        decoder.fill_read_cache()?;
        Ok(decoder)
    }

    pub fn decode_scan<T: JpeglsSample>(&mut self, destination: &mut [T]) -> Result<usize, JpeglsError> {
        self.decode_lines(destination)?;
        Ok(self.position)
    }

    /// Bytes of the source consumed so far, i.e. the offset of the next JPEG marker
    /// relative to the start of the slice this decoder was constructed with.
    pub fn bytes_consumed(&self) -> usize {
        self.position
    }

    /// Decodes a `Line`-interleaved scan into one plane per component.
    pub fn decode_scan_line_interleaved<T: JpeglsSample>(
        &mut self,
        components: usize,
    ) -> Result<Vec<Vec<T>>, JpeglsError> {
        let width = self.frame_info.width as usize;
        let height = self.frame_info.height as usize;
        let buffer_width = width + 1;

        let mut prev_rows: Vec<Vec<T>> = vec![vec![T::default(); buffer_width]; components];
        let mut curr_rows: Vec<Vec<T>> = vec![vec![T::default(); buffer_width]; components];
        let mut planes: Vec<Vec<T>> = vec![vec![T::default(); width * height]; components];

        for line in 0..height {
            for c in 0..components {
                curr_rows[c][0] = prev_rows[c][1];
                self.decode_sample_line(&prev_rows[c], &mut curr_rows[c], width, 1, c)?;
                planes[c][line * width..(line + 1) * width].copy_from_slice(&curr_rows[c][1..]);
            }
            std::mem::swap(&mut prev_rows, &mut curr_rows);
        }
        Ok(planes)
    }

    fn decode_lines<T: JpeglsSample>(&mut self, destination: &mut [T]) -> Result<(), JpeglsError> {
        let width = self.frame_info.width as usize;
        let height = self.frame_info.height as usize;
        let components = match self.coding_parameters.interleave_mode {
            InterleaveMode::None => 1,
            InterleaveMode::Line | InterleaveMode::Sample => {
                self.frame_info.component_count as usize
            }
        };

        let pixel_stride = width * components;
        let buffer_width = (width + 1) * components;
        let mut line_buffer: Vec<T> = vec![T::default(); buffer_width * 2];

        for line in 0..height {
            let (prev_line_slice, curr_line_slice) = line_buffer.split_at_mut(buffer_width);
            let (prev, curr) = if (line & 1) == 1 {
                (curr_line_slice, prev_line_slice)
            } else {
                (prev_line_slice, curr_line_slice)
            };

            for c in 0..components {
                curr[c] = prev[components + c];
            }

            self.decode_sample_line(prev, curr, width, components, 0)?;

            let dest_start = line * pixel_stride;
            destination[dest_start..dest_start + pixel_stride]
                .copy_from_slice(&curr[components..buffer_width]);
        }
        Ok(())
    }

    fn decode_sample_line<T: JpeglsSample>(
        &mut self,
        prev_line: &[T],
        curr_line: &mut [T],
        width: usize,
        components: usize,
        component_offset: usize,
    ) -> Result<(), JpeglsError> {
        let mut pixel_idx = 0;
        let mut current_buf_idx = components;

        let mut rb = vec![0i32; components];
        let mut rd = vec![0i32; components];
        for c in 0..components {
            rb[c] = prev_line[c].to_i32();
            rd[c] = prev_line[components + c].to_i32();
        }

        while pixel_idx < width {
            let mut all_qs_zero = true;
            let mut component_qs = vec![0; components];
            let mut component_pred = vec![0; components];

            let is_last_pixel = pixel_idx == width - 1;

            for c in 0..components {
                let idx = current_buf_idx + c;
                let ra = curr_line[idx - components].to_i32();
                let rc = rb[c];
                rb[c] = rd[c];

                if is_last_pixel {
                    rd[c] = rb[c];
                } else {
                    rd[c] = prev_line[idx + components].to_i32();
                }

                let d1 = rd[c] - rb[c];
                let d2 = rb[c] - rc;
                let d3 = rc - ra;

                let q1 = self.quantize_gradient(d1);
                let q2 = self.quantize_gradient(d2);
                let q3 = self.quantize_gradient(d3);

                let qs = self.compute_context_id(q1, q2, q3);
                component_qs[c] = qs;
                if qs != 0 {
                    all_qs_zero = false;
                }

                component_pred[c] = self.compute_predicted_value(ra, rb[c], rc);
            }

            if !all_qs_zero {
                for c in 0..components {
                    let idx = current_buf_idx + c;
                    let value = self.decode_regular::<T>(
                        component_qs[c],
                        component_pred[c],
                        component_offset + c,
                    )?;
                    curr_line[idx] = T::from_i32(value);
                }
                pixel_idx += 1;
                current_buf_idx += components;
            } else {
                let start_pixel_idx = pixel_idx;
                let decoded_len = self.decode_run_mode_interleaved(
                    start_pixel_idx,
                    prev_line,
                    curr_line,
                    width,
                    components,
                    component_offset,
                )?;

                pixel_idx += decoded_len;
                current_buf_idx += decoded_len * components;

                if pixel_idx < width {
                    let is_last = pixel_idx == width - 1;
                    for c in 0..components {
                        let comp_offset = components + c;
                        rb[c] = prev_line[(pixel_idx - 1) * components + comp_offset].to_i32();
                        if is_last {
                            rd[c] = rb[c];
                        } else {
                            rd[c] = prev_line[pixel_idx * components + comp_offset].to_i32();
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn decode_regular<T: JpeglsSample>(
        &mut self,
        qs: i32,
        predicted: i32,
        component_index: usize,
    ) -> Result<i32, JpeglsError> {
        let sign = Self::bit_wise_sign(qs);
        let ctx_index = Self::apply_sign_for_index(qs, sign);

        let near_lossless = self.coding_parameters.near_lossless;
        let range = self.coding_parameters.range;
        let limit = self.coding_parameters.limit;
        let qbpp = self.coding_parameters.quantized_bits_per_sample;

        let k = self.regular_mode_contexts[component_index][ctx_index].compute_golomb_coding_parameter(31)?;

        let map_val = self.decode_mapped_error_value(k, limit, qbpp)?;
        let mut error_value = self.unmap_error_value(map_val);

        {
            let context = &mut self.regular_mode_contexts[component_index][ctx_index];
            if k == 0 {
                error_value ^= context.get_error_correction(near_lossless);
            }
            let reset_threshold = self.reset_threshold;
            context.update_variables_and_bias(error_value, near_lossless, reset_threshold)?;
        }

        error_value = Self::apply_sign(error_value, sign);
        Ok(T::compute_reconstructed_sample(
            predicted,
            error_value,
            near_lossless,
            range,
            self.max_val(),
        ))
    }

    /// Decodes a Golomb-Rice code with the escape-to-raw-binary extension
    /// (ISO/IEC 14495-1 A.5.2 / `decoderstrategy.h::DecodeValue`): the unary prefix is
    /// capped at `limit - qbpp` zero-bits; if it reaches that cap the value was instead
    /// written as a raw `qbpp`-bit field (plus 1), matching [`super::scan_encoder::ScanEncoder::encode_mapped_value`].
    fn decode_mapped_error_value(&mut self, k: i32, limit: i32, qbpp: i32) -> Result<i32, JpeglsError> {
        let cap = limit - qbpp;
        let mut count = 0;
        while count < cap {
            if self.peek_bits(1)? == 1 {
                break;
            }
            self.skip_bits(1)?;
            count += 1;
        }
        self.skip_bits(1)?; // consume the terminating one bit

        if count >= cap - 1 {
            let qbpp_clamped = qbpp.min(31);
            let escape_bits = self.read_bits(qbpp_clamped)?;
            Ok(escape_bits + 1)
        } else if k > 0 {
            let remainder = self.read_bits(k)?;
            Ok((count << k) | remainder)
        } else {
            Ok(count)
        }
    }

    fn max_val(&self) -> i32 {
        (1 << self.frame_info.bits_per_sample) - 1
    }

    fn unmap_error_value(&self, mapped_value: i32) -> i32 {
        if (mapped_value & 1) == 0 {
            mapped_value >> 1
        } else {
            -((mapped_value + 1) >> 1)
        }
    }

    /// Refills the bit cache, undoing true JPEG-LS bit stuffing: an `0xFF` byte not
    /// followed by a byte whose top bit is set is data, and the next byte only
    /// contributes its low 7 bits. An `0xFF` followed by a high-bit-set byte is a
    /// genuine marker and is left unconsumed for the frame layer to find.
    fn fill_read_cache(&mut self) -> Result<(), JpeglsError> {
        while self.valid_bits <= CACHE_BITS - 16 {
            if self.position >= self.source.len() {
                break;
            }
            let byte = self.source[self.position];

            if byte == JPEG_MARKER_START_BYTE {
                if self.position + 1 >= self.source.len() {
                    break;
                }
                let next = self.source[self.position + 1];
                if next & 0x80 != 0 {
                    break;
                }
                self.read_cache = (self.read_cache << 8) | byte as usize;
                self.read_cache = (self.read_cache << 7) | (next as usize & 0x7F);
                self.valid_bits += 15;
                self.position += 2;
            } else {
                self.read_cache = (self.read_cache << 8) | byte as usize;
                self.valid_bits += 8;
                self.position += 1;
            }
        }
        Ok(())
    }

    fn read_bits(&mut self, count: i32) -> Result<i32, JpeglsError> {
        let val = self.peek_bits(count)?;
        self.skip_bits(count)?;
        Ok(val)
    }

    fn peek_bits(&mut self, count: i32) -> Result<i32, JpeglsError> {
        if self.valid_bits < count {
            self.fill_read_cache()?;
        }
        if self.valid_bits < count {
            return Err(JpeglsError::NeedMoreData);
        }
        Ok(((self.read_cache >> (self.valid_bits - count)) & ((1 << count) - 1)) as i32)
    }

    fn skip_bits(&mut self, count: i32) -> Result<(), JpeglsError> {
        if self.valid_bits < count {
            self.fill_read_cache()?;
        }
        self.valid_bits -= count;
        Ok(())
    }

    fn quantize_gradient(&self, di: i32) -> i32 {
        if di <= -self.t3 {
            return -4;
        }
        if di <= -self.t2 {
            return -3;
        }
        if di <= -self.t1 {
            return -2;
        }
        if di < -self.coding_parameters.near_lossless {
            return -1;
        }
        if di <= self.coding_parameters.near_lossless {
            return 0;
        }
        if di < self.t1 {
            return 1;
        }
        if di < self.t2 {
            return 2;
        }
        if di < self.t3 {
            return 3;
        }
        4
    }

    fn compute_context_id(&self, q1: i32, q2: i32, q3: i32) -> i32 {
        (q1 * 9 + q2) * 9 + q3
    }

    fn compute_predicted_value(&self, ra: i32, rb: i32, rc: i32) -> i32 {
        let sign = Self::bit_wise_sign(rb - ra);
        let predicted = if (sign ^ (rc - ra)) < 0 {
            rb
        } else if (sign ^ (rb - rc)) < 0 {
            ra
        } else {
            ra + rb - rc
        };

        let max_val = (1 << self.frame_info.bits_per_sample) - 1;
        predicted.clamp(0, max_val)
    }

    fn bit_wise_sign(val: i32) -> i32 {
        crate::jpegls::traits::bit_wise_sign(val)
    }

    fn apply_sign(val: i32, sign: i32) -> i32 {
        crate::jpegls::traits::apply_sign(val, sign)
    }

    fn apply_sign_for_index(val: i32, sign: i32) -> usize {
        crate::jpegls::traits::apply_sign_for_index(val, sign)
    }

    fn decode_run_mode_interleaved<T: JpeglsSample>(
        &mut self,
        start_pixel_idx: usize,
        prev_line: &[T],
        curr_line: &mut [T],
        width: usize,
        components: usize,
        component_offset: usize,
    ) -> Result<usize, JpeglsError> {
        let base_offset = components;
        let mut ra = vec![T::default(); components];
        for c in 0..components {
            let ra_idx = if start_pixel_idx > 0 {
                base_offset + (start_pixel_idx - 1) * components + c
            } else {
                c
            };
            ra[c] = curr_line[ra_idx];
        }

        let count_type_remain = width - start_pixel_idx;
        let mut run_length = 0;

        loop {
            let run_index_val = crate::constants::J[self.run_index[component_offset]];
            let bit = self.read_bits(1)?;
            if bit == 1 {
                let length = (1usize << run_index_val).min(count_type_remain - run_length);
                for i in 0..length {
                    for c in 0..components {
                        curr_line[base_offset + (start_pixel_idx + run_length + i) * components + c] =
                            ra[c];
                    }
                }
                run_length += length;
                self.increment_run_index(component_offset);
                if run_length >= count_type_remain {
                    return Ok(run_length);
                }
            } else {
                let remainder = self.read_bits(run_index_val)?.min((count_type_remain - run_length) as i32) as usize;
                for i in 0..remainder {
                    for c in 0..components {
                        curr_line[base_offset + (start_pixel_idx + run_length + i) * components + c] =
                            ra[c];
                    }
                }
                run_length += remainder;
                break;
            }
        }

        if run_length >= count_type_remain {
            return Ok(run_length);
        }

        let interruption_pixel_idx = start_pixel_idx + run_length;
        let up_val = prev_line[base_offset + interruption_pixel_idx * components].to_i32();
        let x = self.decode_run_interruption_pixel::<T>(ra[0].to_i32(), up_val, component_offset)?;
        curr_line[base_offset + interruption_pixel_idx * components] = T::from_i32(x);

        self.decrement_run_index(component_offset);

        for next_c in 1..components {
            let idx = base_offset + interruption_pixel_idx * components + next_c;

            let r_a = curr_line[idx - components].to_i32();
            let r_up = prev_line[idx].to_i32();
            let r_up_left = prev_line[idx - components].to_i32();
            let r_up_right = if interruption_pixel_idx == width - 1 {
                r_up
            } else {
                prev_line[idx + components].to_i32()
            };

            let d1 = r_up_right - r_up;
            let d2 = r_up - r_up_left;
            let d3 = r_up_left - r_a;

            let q1 = self.quantize_gradient(d1);
            let q2 = self.quantize_gradient(d2);
            let q3 = self.quantize_gradient(d3);
            let qs = self.compute_context_id(q1, q2, q3);
            let predicted = self.compute_predicted_value(r_a, r_up, r_up_left);

            let value = self.decode_regular::<T>(qs, predicted, component_offset + next_c)?;
            curr_line[idx] = T::from_i32(value);
        }

        Ok(run_length + 1)
    }

    fn decode_run_interruption_pixel<T: JpeglsSample>(
        &mut self,
        ra: i32,
        rb: i32,
        comp: usize,
    ) -> Result<i32, JpeglsError> {
        let near_lossless = self.coding_parameters.near_lossless;
        let range = self.coding_parameters.range;
        let (context_index, sign) = if (ra - rb).abs() <= near_lossless {
            (1, 1)
        } else {
            (0, Self::bit_wise_sign(rb - ra))
        };

        let k = self.run_mode_contexts[comp][context_index].compute_golomb_coding_parameter();
        let limit = self.coding_parameters.limit - crate::constants::J[self.run_index[comp]] - 1;
        let qbpp = self.coding_parameters.quantized_bits_per_sample;
        let mapped_error = self.decode_mapped_error_value(k, limit, qbpp)?;

        let error_value = self.run_mode_contexts[comp][context_index].decode_error_value(mapped_error, k);
        let reset_threshold = self.reset_threshold;
        self.run_mode_contexts[comp][context_index].update_variables(
            error_value,
            mapped_error,
            reset_threshold,
        );

        let max_val = self.max_val();
        Ok(if context_index == 1 {
            T::compute_reconstructed_sample(ra, error_value, near_lossless, range, max_val)
        } else {
            T::compute_reconstructed_sample(rb, error_value * sign, near_lossless, range, max_val)
        })
    }

    fn increment_run_index(&mut self, comp: usize) {
        if self.run_index[comp] < 31 {
            self.run_index[comp] += 1;
        }
    }

    fn decrement_run_index(&mut self, comp: usize) {
        if self.run_index[comp] > 0 {
            self.run_index[comp] -= 1;
        }
    }
}
