//! Crate-level round-trip and scenario tests for the JPEG-LS codec.
//!
//! Every input is constructed in-line; nothing here depends on external fixture
//! files, mirroring how the rest of the suite is organised.

use jpegls_rs::jpegls::{ColorTransformation, InterleaveMode, JpeglsDecoder, JpeglsEncoder};
use jpegls_rs::FrameInfo;

fn encode_gray8(width: u32, height: u32, pixels: &[u8], near_lossless: i32) -> Vec<u8> {
    let mut dest = vec![0u8; pixels.len() * 2 + 1024];
    let mut encoder = JpeglsEncoder::new(&mut dest);
    encoder
        .set_frame_info(FrameInfo {
            width,
            height,
            bits_per_sample: 8,
            component_count: 1,
        })
        .unwrap();
    encoder.set_near_lossless(near_lossless).unwrap();
    let len = encoder.encode(pixels).unwrap();
    dest.truncate(len);
    dest
}

fn decode_gray8(encoded: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut decoder = JpeglsDecoder::new(encoded);
    decoder.read_header().unwrap();
    let frame_info = decoder.frame_info();
    assert_eq!(frame_info.width, width);
    assert_eq!(frame_info.height, height);
    let mut out = vec![0u8; (width * height) as usize];
    decoder.decode(&mut out).unwrap();
    out
}

#[test]
fn lossless_round_trip_gradient() {
    let width = 16;
    let height = 16;
    let pixels: Vec<u8> = (0..width * height).map(|i| (i % 256) as u8).collect();
    let encoded = encode_gray8(width, height, &pixels, 0);
    let decoded = decode_gray8(&encoded, width, height);
    assert_eq!(decoded, pixels);
}

#[test]
fn lossless_round_trip_noise() {
    let width = 32;
    let height = 32;
    let mut state = 0x1234_5678u32;
    let pixels: Vec<u8> = (0..width * height)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xFF) as u8
        })
        .collect();
    let encoded = encode_gray8(width, height, &pixels, 0);
    let decoded = decode_gray8(&encoded, width, height);
    assert_eq!(decoded, pixels);
}

#[test]
fn near_lossless_stays_within_bound() {
    let width = 24;
    let height = 24;
    let near = 3;
    let pixels: Vec<u8> = (0..width * height).map(|i| ((i * 7) % 256) as u8).collect();
    let encoded = encode_gray8(width, height, &pixels, near);
    let decoded = decode_gray8(&encoded, width, height);
    for (original, reconstructed) in pixels.iter().zip(decoded.iter()) {
        let diff = (*original as i32 - *reconstructed as i32).abs();
        assert!(diff <= near, "sample error {} exceeds near bound {}", diff, near);
    }
}

/// Scenario 1: a single 8-bit pixel round-trips exactly.
#[test]
fn scenario_single_pixel() {
    let encoded = encode_gray8(1, 1, &[0x80], 0);
    let decoded = decode_gray8(&encoded, 1, 1);
    assert_eq!(decoded, vec![0x80]);
}

/// Scenario 2: an all-zero image decodes as a single run.
#[test]
fn scenario_all_zero_run() {
    let pixels = vec![0u8; 16];
    let encoded = encode_gray8(4, 4, &pixels, 0);
    let decoded = decode_gray8(&encoded, 4, 4);
    assert_eq!(decoded, pixels);
}

/// Scenario 3: a repeating row gradient stays in regular mode throughout.
#[test]
fn scenario_row_gradient() {
    let pixels: Vec<u8> = (0..16).map(|i| (i % 4) as u8).collect();
    let encoded = encode_gray8(4, 4, &pixels, 0);
    let decoded = decode_gray8(&encoded, 4, 4);
    assert_eq!(decoded, pixels);
}

/// Scenario 4: 16-bit extremes round-trip exactly.
#[test]
fn scenario_16_bit_extremes() {
    let pixels: [u16; 4] = [0, 65535, 65535, 0];
    let mut source_bytes = Vec::with_capacity(8);
    for p in pixels {
        source_bytes.extend_from_slice(&p.to_ne_bytes());
    }

    let mut dest = vec![0u8; 256];
    let mut encoder = JpeglsEncoder::new(&mut dest);
    encoder
        .set_frame_info(FrameInfo {
            width: 2,
            height: 2,
            bits_per_sample: 16,
            component_count: 1,
        })
        .unwrap();
    let len = encoder.encode(&source_bytes).unwrap();
    dest.truncate(len);

    let mut decoder = JpeglsDecoder::new(&dest);
    decoder.read_header().unwrap();
    let mut out = vec![0u8; 8];
    decoder.decode(&mut out).unwrap();

    let decoded: Vec<u16> = out
        .chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .collect();
    assert_eq!(decoded, pixels);
}

/// A sub-8-bit depth (here 4 bits, MAXVAL=15) exercises MAXVAL-dependent clamping
/// (predictor correction, reconstruction wraparound) at a value far below the `u8`
/// storage type's own range; getting this wrong reconstructs samples above 15.
#[test]
fn four_bit_depth_round_trips() {
    let width = 5;
    let height = 5;
    let pixels: Vec<u8> = (0..width * height).map(|i| (i % 16) as u8).collect();

    let mut dest = vec![0u8; pixels.len() * 2 + 1024];
    let mut encoder = JpeglsEncoder::new(&mut dest);
    encoder
        .set_frame_info(FrameInfo {
            width,
            height,
            bits_per_sample: 4,
            component_count: 1,
        })
        .unwrap();
    let len = encoder.encode(&pixels).unwrap();
    dest.truncate(len);

    let mut decoder = JpeglsDecoder::new(&dest);
    decoder.read_header().unwrap();
    let frame_info = decoder.frame_info();
    assert_eq!(frame_info.bits_per_sample, 4);
    let mut out = vec![0u8; pixels.len()];
    decoder.decode(&mut out).unwrap();
    assert_eq!(out, pixels);
    assert!(out.iter().all(|&v| v <= 15));
}

/// Scenario 5: HP1 + Line interleave round-trips, and requesting BGR output
/// swaps components 0 and 2 relative to the original RGB input.
#[test]
fn scenario_hp1_line_interleave_bgr_output() {
    let width = 8;
    let height = 8;
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for i in 0..width * height {
        rgb.push((i % 256) as u8);
        rgb.push(((i * 3) % 256) as u8);
        rgb.push(((i * 5) % 256) as u8);
    }

    let mut dest = vec![0u8; rgb.len() * 2 + 1024];
    let mut encoder = JpeglsEncoder::new(&mut dest);
    encoder
        .set_frame_info(FrameInfo {
            width,
            height,
            bits_per_sample: 8,
            component_count: 3,
        })
        .unwrap();
    encoder.set_interleave_mode(InterleaveMode::Line).unwrap();
    encoder.set_color_transformation(ColorTransformation::Hp1).unwrap();
    let len = encoder.encode(&rgb).unwrap();
    dest.truncate(len);

    let mut decoder = JpeglsDecoder::new(&dest);
    decoder.read_header().unwrap();
    let mut rgb_out = vec![0u8; rgb.len()];
    decoder.decode(&mut rgb_out).unwrap();
    assert_eq!(rgb_out, rgb);

    let mut decoder_bgr = JpeglsDecoder::new(&dest);
    decoder_bgr.read_header().unwrap();
    decoder_bgr.set_output_bgr(true).unwrap();
    let mut bgr_out = vec![0u8; rgb.len()];
    decoder_bgr.decode(&mut bgr_out).unwrap();

    for px in 0..(width * height) as usize {
        assert_eq!(bgr_out[px * 3], rgb[px * 3 + 2]);
        assert_eq!(bgr_out[px * 3 + 1], rgb[px * 3 + 1]);
        assert_eq!(bgr_out[px * 3 + 2], rgb[px * 3]);
    }
}

/// HP2 and HP3 divide a component sum by 2 or 4; whenever a pixel makes one of the
/// intermediate subtractions wrap below zero (R < G, or B < G), the reconstruction
/// must see that wrap reduced into MAXVAL range before the division, or decode
/// reconstructs the wrong sample. This drives the full encode/decode path (not just
/// the transform in isolation) with pixels chosen to force that wrap.
#[test]
fn scenario_hp2_hp3_wrapping_components_round_trip() {
    let width = 4;
    let height = 1;
    // R=0,G=200,B=0 is the HP2 counter-example: R-G and the (R+G)>>1 term both wrap.
    let rgb: Vec<u8> = vec![
        0, 200, 0, //
        255, 0, 255, //
        128, 128, 128, //
        10, 250, 3,
    ];

    for transform in [ColorTransformation::Hp2, ColorTransformation::Hp3] {
        let mut dest = vec![0u8; rgb.len() * 2 + 1024];
        let mut encoder = JpeglsEncoder::new(&mut dest);
        encoder
            .set_frame_info(FrameInfo {
                width,
                height,
                bits_per_sample: 8,
                component_count: 3,
            })
            .unwrap();
        encoder.set_color_transformation(transform).unwrap();
        let len = encoder.encode(&rgb).unwrap();
        dest.truncate(len);

        let mut decoder = JpeglsDecoder::new(&dest);
        decoder.read_header().unwrap();
        let mut rgb_out = vec![0u8; rgb.len()];
        decoder.decode(&mut rgb_out).unwrap();
        assert_eq!(rgb_out, rgb, "{:?} failed to round-trip", transform);
    }
}

/// Scenario 6: a literal 0xFF sample next to 0x00 exercises the run-interruption
/// escape path and the marker-stuffing logic; the image must still round-trip
/// exactly, which it could not if a spurious marker desynchronized the decoder.
#[test]
fn scenario_0xff_sample_round_trips() {
    let width = 16;
    let height = 16;
    let mut pixels = vec![0u8; (width * height) as usize];
    for y in 0..height as usize {
        pixels[y * width as usize] = 0xFF;
        pixels[y * width as usize + 1] = 0x00;
    }
    let encoded = encode_gray8(width, height, &pixels, 0);
    let decoded = decode_gray8(&encoded, width, height);
    assert_eq!(decoded, pixels);
}

/// Property 6: for a single-component image, all three interleave modes are
/// accepted and produce a correct round trip (the frame forces `None` to the
/// scan regardless of what the caller asked for, since there is only one plane).
#[test]
fn single_component_interleave_modes_round_trip_equivalently() {
    let width = 8;
    let height = 8;
    let pixels: Vec<u8> = (0..width * height).map(|i| (i * 11 % 256) as u8).collect();

    let mut streams = Vec::new();
    for mode in [InterleaveMode::None, InterleaveMode::Line, InterleaveMode::Sample] {
        let mut dest = vec![0u8; pixels.len() * 2 + 1024];
        let mut encoder = JpeglsEncoder::new(&mut dest);
        encoder
            .set_frame_info(FrameInfo {
                width,
                height,
                bits_per_sample: 8,
                component_count: 1,
            })
            .unwrap();
        encoder.set_interleave_mode(mode).unwrap();
        let len = encoder.encode(&pixels).unwrap();
        dest.truncate(len);
        streams.push(dest);
    }

    assert_eq!(streams[0], streams[1]);
    assert_eq!(streams[1], streams[2]);

    let decoded = decode_gray8(&streams[0], width, height);
    assert_eq!(decoded, pixels);
}

/// Property 5: padding bytes beyond each row's real data, reachable only via a
/// stride larger than the tightly packed row width, never reach the codec.
#[test]
fn stride_independence() {
    let width = 6;
    let height = 5;
    let pixels: Vec<u8> = (0..width * height).map(|i| (i * 13 % 256) as u8).collect();
    let tight = encode_gray8(width, height, &pixels, 0);

    let stride = width as usize + 4;
    let mut padded = vec![0u8; stride * height as usize];
    for row in 0..height as usize {
        padded[row * stride..row * stride + width as usize]
            .copy_from_slice(&pixels[row * width as usize..(row + 1) * width as usize]);
        for pad_byte in padded[row * stride + width as usize..(row + 1) * stride].iter_mut() {
            *pad_byte = 0xAA;
        }
    }

    let mut dest = vec![0u8; padded.len() * 2 + 1024];
    let mut encoder = JpeglsEncoder::new(&mut dest);
    encoder
        .set_frame_info(FrameInfo {
            width,
            height,
            bits_per_sample: 8,
            component_count: 1,
        })
        .unwrap();
    encoder.set_stride(stride).unwrap();
    let len = encoder.encode(&padded).unwrap();
    dest.truncate(len);

    assert_eq!(dest, tight);
}

/// Design-note scenario: `None` interleave with more than one component is one
/// independent scan per component, framed back-to-back.
#[test]
fn none_interleave_multi_component_round_trips() {
    let width = 6;
    let height = 6;
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for i in 0..width * height {
        rgb.push((i % 256) as u8);
        rgb.push(((i * 2) % 256) as u8);
        rgb.push(((i * 3) % 256) as u8);
    }

    let mut dest = vec![0u8; rgb.len() * 2 + 1024];
    let mut encoder = JpeglsEncoder::new(&mut dest);
    encoder
        .set_frame_info(FrameInfo {
            width,
            height,
            bits_per_sample: 8,
            component_count: 3,
        })
        .unwrap();
    encoder.set_interleave_mode(InterleaveMode::None).unwrap();
    let len = encoder.encode(&rgb).unwrap();
    dest.truncate(len);

    let mut decoder = JpeglsDecoder::new(&dest);
    decoder.read_header().unwrap();
    let mut out = vec![0u8; rgb.len()];
    decoder.decode(&mut out).unwrap();
    assert_eq!(out, rgb);
}
