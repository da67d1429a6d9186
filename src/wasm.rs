//! WebAssembly bindings for jpegls-rs.
//!
//! Exposes encode/decode through wasm-bindgen for use in browsers and Node.js.

use crate::jpegls::{JpeglsDecoder, JpeglsEncoder};
use crate::FrameInfo;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Warn);
}

/// Image information returned from the WASM API.
#[wasm_bindgen]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub components: u32,
    pub bits_per_sample: u32,
}

/// Reads header fields of a JPEG-LS stream without decoding its scans.
#[wasm_bindgen]
pub fn get_image_info(data: &[u8]) -> Result<ImageInfo, JsValue> {
    let mut decoder = JpeglsDecoder::new(data);
    decoder
        .read_header()
        .map_err(|e| JsValue::from_str(&format!("{:?}", e)))?;
    let info = decoder.frame_info();
    Ok(ImageInfo {
        width: info.width,
        height: info.height,
        components: info.component_count as u32,
        bits_per_sample: info.bits_per_sample as u32,
    })
}

/// Decodes a JPEG-LS image to raw pixels, tightly packed and sample-interleaved.
#[wasm_bindgen]
pub fn decode_jpegls(data: &[u8]) -> Result<Vec<u8>, JsValue> {
    let mut decoder = JpeglsDecoder::new(data);
    decoder
        .read_header()
        .map_err(|e| JsValue::from_str(&format!("{:?}", e)))?;

    let info = decoder.frame_info();
    let bytes_per_sample = if info.bits_per_sample <= 8 { 1 } else { 2 };
    let pixel_count = (info.width * info.height * info.component_count as u32) as usize;
    let mut pixels = vec![0u8; pixel_count * bytes_per_sample];

    decoder
        .decode(&mut pixels)
        .map_err(|e| JsValue::from_str(&format!("{:?}", e)))?;

    Ok(pixels)
}

/// Encodes raw 8-bit-per-sample pixels to a lossless JPEG-LS stream.
#[wasm_bindgen]
pub fn encode_jpegls(
    pixels: &[u8],
    width: u32,
    height: u32,
    components: u32,
) -> Result<Vec<u8>, JsValue> {
    let frame_info = FrameInfo {
        width,
        height,
        bits_per_sample: 8,
        component_count: components as i32,
    };

    let mut dest = vec![0u8; pixels.len() * 2 + 1024];
    let mut encoder = JpeglsEncoder::new(&mut dest);
    encoder
        .set_frame_info(frame_info)
        .map_err(|e| JsValue::from_str(&format!("{:?}", e)))?;
    let len = encoder
        .encode(pixels)
        .map_err(|e| JsValue::from_str(&format!("{:?}", e)))?;
    dest.truncate(len);
    Ok(dest)
}
