//! C Foreign Function Interface.
//!
//! Exposes encode/decode through opaque handles and the stable [`StableErrorCode`]
//! values so the codec can be called from C/C++ hosts.

use crate::error::StableErrorCode;
use crate::jpegls::{ColorTransformation, InterleaveMode, JpeglsDecoder, JpeglsEncoder};
use crate::FrameInfo;
use std::os::raw::{c_int, c_uchar};
use std::panic::catch_unwind;
use std::ptr;

/// Opaque decoder handle.
#[repr(C)]
pub struct JpeglsDecoderHandle {
    _private: [u8; 0],
}

/// Image information, mirrored across the FFI boundary as plain fields.
#[repr(C)]
pub struct JpeglsImageInfo {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: i32,
    pub component_count: i32,
}

struct DecoderState {
    data: Vec<u8>,
    frame_info: Option<FrameInfo>,
}

/// Creates a decoder over a copy of `data`.
///
/// # Safety
/// `data` must be a valid pointer to `len` readable bytes.
#[unsafe(no_mangle)]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub unsafe extern "C" fn jpegls_decoder_create(
    data: *const c_uchar,
    len: usize,
) -> *mut JpeglsDecoderHandle {
    if data.is_null() || len == 0 {
        return ptr::null_mut();
    }

    let slice = unsafe { std::slice::from_raw_parts(data, len) };
    let state = Box::new(DecoderState {
        data: slice.to_vec(),
        frame_info: None,
    });

    Box::into_raw(state) as *mut JpeglsDecoderHandle
}

/// Frees a handle created by [`jpegls_decoder_create`].
///
/// # Safety
/// `decoder` must be a valid handle from [`jpegls_decoder_create`], or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jpegls_decoder_destroy(decoder: *mut JpeglsDecoderHandle) {
    if !decoder.is_null() {
        let _ = unsafe { Box::from_raw(decoder as *mut DecoderState) };
    }
}

/// Reads SOI through SOS and fills `info` with the frame dimensions.
///
/// # Safety
/// `decoder` and `info` must both be valid, non-null pointers.
#[unsafe(no_mangle)]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub unsafe extern "C" fn jpegls_decoder_read_header(
    decoder: *mut JpeglsDecoderHandle,
    info: *mut JpeglsImageInfo,
) -> c_int {
    if decoder.is_null() || info.is_null() {
        return StableErrorCode::InvalidJlsParameters as c_int;
    }

    let state = unsafe { &mut *(decoder as *mut DecoderState) };
    let result = catch_unwind(|| {
        let mut reader = JpeglsDecoder::new(&state.data);
        reader.read_header()?;
        Ok::<FrameInfo, crate::error::JpeglsError>(reader.frame_info())
    });

    match result {
        Ok(Ok(frame_info)) => {
            state.frame_info = Some(frame_info);
            unsafe {
                (*info).width = frame_info.width;
                (*info).height = frame_info.height;
                (*info).bits_per_sample = frame_info.bits_per_sample;
                (*info).component_count = frame_info.component_count;
            }
            StableErrorCode::Ok as c_int
        }
        Ok(Err(e)) => e.stable_code() as c_int,
        Err(_) => StableErrorCode::UnexpectedFailure as c_int,
    }
}

/// Decodes the scan(s) into `destination`.
///
/// # Safety
/// `decoder` must be a valid handle that has already had [`jpegls_decoder_read_header`]
/// called on it. `destination` must point to at least `destination_len` writable bytes.
#[unsafe(no_mangle)]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub unsafe extern "C" fn jpegls_decoder_decode(
    decoder: *mut JpeglsDecoderHandle,
    destination: *mut c_uchar,
    destination_len: usize,
) -> c_int {
    if decoder.is_null() || destination.is_null() {
        return StableErrorCode::InvalidJlsParameters as c_int;
    }

    let state = unsafe { &mut *(decoder as *mut DecoderState) };
    let Some(_frame_info) = state.frame_info else {
        return StableErrorCode::InvalidJlsParameters as c_int;
    };

    let destination_slice = unsafe { std::slice::from_raw_parts_mut(destination, destination_len) };

    let result = catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut reader = JpeglsDecoder::new(&state.data);
        reader.read_header()?;
        reader.decode(destination_slice)
    }));

    match result {
        Ok(Ok(())) => StableErrorCode::Ok as c_int,
        Ok(Err(e)) => e.stable_code() as c_int,
        Err(_) => StableErrorCode::UnexpectedFailure as c_int,
    }
}

/// Encodes raw 8-bit-per-sample pixels to JPEG-LS in a single call.
///
/// # Safety
/// `pixels` must point to `width * height * component_count` readable bytes;
/// `output` must point to `output_len` writable bytes; `bytes_written` must be a
/// valid, non-null pointer.
#[unsafe(no_mangle)]
#[allow(clippy::not_unsafe_ptr_arg_deref, clippy::too_many_arguments)]
pub unsafe extern "C" fn jpegls_encode(
    pixels: *const c_uchar,
    width: u32,
    height: u32,
    component_count: i32,
    near_lossless: i32,
    interleave_mode: i32,
    output: *mut c_uchar,
    output_len: usize,
    bytes_written: *mut usize,
) -> c_int {
    if pixels.is_null() || output.is_null() || bytes_written.is_null() {
        return StableErrorCode::InvalidJlsParameters as c_int;
    }

    let Ok(interleave_mode) = InterleaveMode::try_from(interleave_mode as u8) else {
        return StableErrorCode::InvalidJlsParameters as c_int;
    };

    let pixel_count = (width as usize) * (height as usize) * (component_count.max(0) as usize);
    let pixels_slice = unsafe { std::slice::from_raw_parts(pixels, pixel_count) };
    let output_slice = unsafe { std::slice::from_raw_parts_mut(output, output_len) };

    let frame_info = FrameInfo {
        width,
        height,
        bits_per_sample: 8,
        component_count,
    };

    let result = catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut encoder = JpeglsEncoder::new(output_slice);
        encoder.set_frame_info(frame_info)?;
        encoder.set_interleave_mode(interleave_mode)?;
        encoder.set_near_lossless(near_lossless)?;
        encoder.set_color_transformation(ColorTransformation::None)?;
        encoder.encode(pixels_slice)
    }));

    match result {
        Ok(Ok(len)) => {
            unsafe { *bytes_written = len };
            StableErrorCode::Ok as c_int
        }
        Ok(Err(e)) => e.stable_code() as c_int,
        Err(_) => StableErrorCode::UnexpectedFailure as c_int,
    }
}
