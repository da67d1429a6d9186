//! jpegls CLI - command-line front end for the JPEG-LS codec.

use clap::{Parser, Subcommand, ValueEnum};
use jpegls_rs::jpegls::{ColorTransformation, InterleaveMode, JpeglsDecoder, JpeglsEncoder};
use jpegls_rs::FrameInfo;
use log::{debug, info};
use std::fs;
use std::path::PathBuf;

/// JPEG-LS (ISO/IEC 14495-1 / ITU-T T.87) lossless and near-lossless image codec
#[derive(Parser)]
#[command(name = "jpegls")]
#[command(author = "jpegls-rs contributors")]
#[command(version)]
#[command(about = "Encode and decode JPEG-LS images", long_about = None)]
#[command(after_help = "EXAMPLES:
    jpegls decode -i image.jls -o pixels.raw
    jpegls decode -i image.jls -o image.ppm -f ppm
    jpegls encode -i pixels.raw -o image.jls -w 512 -H 512
    jpegls encode -i pixels.raw -o image.jls -w 512 -H 512 --near-lossless 2
    jpegls info -i image.jls

Set RUST_LOG=jpegls_rs=debug for per-scan diagnostics.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a JPEG-LS image to raw pixels or a PNM file
    #[command(visible_alias = "d")]
    Decode {
        /// Path to the input .jls file
        #[arg(short, long)]
        input: PathBuf,

        /// Path for the decoded output
        #[arg(short, long)]
        output: PathBuf,

        /// Output format: raw (binary pixels) or ppm (Portable PixMap/GrayMap)
        #[arg(short, long, default_value = "raw", value_enum)]
        format: OutputFormat,

        /// Present 3-component output as BGR instead of RGB
        #[arg(long)]
        output_bgr: bool,
    },

    /// Encode raw pixels to a JPEG-LS image
    #[command(visible_alias = "e")]
    Encode {
        /// Path to raw pixel data (tightly packed, interleaved by sample)
        #[arg(short, long)]
        input: PathBuf,

        /// Path for the encoded .jls output
        #[arg(short, long)]
        output: PathBuf,

        /// Image width in pixels
        #[arg(short, long)]
        width: u32,

        /// Image height in pixels
        #[arg(short = 'H', long)]
        height: u32,

        /// Bits per sample (2-16)
        #[arg(short, long, default_value = "8")]
        bits_per_sample: i32,

        /// Number of color components (1=grayscale, 3=RGB)
        #[arg(short = 'n', long, default_value = "1")]
        components: i32,

        /// Interleave mode for multi-component images
        #[arg(long, default_value = "none", value_enum)]
        interleave: Interleave,

        /// Near-lossless error bound (0=lossless)
        #[arg(long, default_value = "0")]
        near_lossless: i32,

        /// Reversible color transform to apply before encoding a 3-component image
        #[arg(long, default_value = "none", value_enum)]
        color_transform: ColorTransform,
    },

    /// Display image metadata
    #[command(visible_alias = "i")]
    Info {
        /// Path to the .jls file to inspect
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Raw,
    Ppm,
}

#[derive(Clone, Copy, ValueEnum)]
enum Interleave {
    None,
    Line,
    Sample,
}

impl From<Interleave> for InterleaveMode {
    fn from(value: Interleave) -> Self {
        match value {
            Interleave::None => InterleaveMode::None,
            Interleave::Line => InterleaveMode::Line,
            Interleave::Sample => InterleaveMode::Sample,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorTransform {
    None,
    Hp1,
    Hp2,
    Hp3,
}

impl From<ColorTransform> for ColorTransformation {
    fn from(value: ColorTransform) -> Self {
        match value {
            ColorTransform::None => ColorTransformation::None,
            ColorTransform::Hp1 => ColorTransformation::Hp1,
            ColorTransform::Hp2 => ColorTransformation::Hp2,
            ColorTransform::Hp3 => ColorTransformation::Hp3,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode {
            input,
            output,
            format,
            output_bgr,
        } => decode_image(&input, &output, &format, output_bgr),
        Commands::Encode {
            input,
            output,
            width,
            height,
            bits_per_sample,
            components,
            interleave,
            near_lossless,
            color_transform,
        } => encode_image(
            &input,
            &output,
            width,
            height,
            bits_per_sample,
            components,
            interleave.into(),
            near_lossless,
            color_transform.into(),
        ),
        Commands::Info { input } => show_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn decode_image(
    input: &PathBuf,
    output: &PathBuf,
    format: &OutputFormat,
    output_bgr: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    info!("read {} bytes from {:?}", data.len(), input);

    let mut decoder = JpeglsDecoder::new(&data);
    decoder.read_header()?;
    decoder.set_output_bgr(output_bgr)?;

    let frame_info = decoder.frame_info();
    debug!(
        "frame_info: {}x{} {} bits, {} components",
        frame_info.width, frame_info.height, frame_info.bits_per_sample, frame_info.component_count
    );

    let bytes_per_sample = if frame_info.bits_per_sample <= 8 { 1 } else { 2 };
    let pixel_count =
        (frame_info.width * frame_info.height * frame_info.component_count as u32) as usize;
    let mut pixels = vec![0u8; pixel_count * bytes_per_sample];
    decoder.decode(&mut pixels)?;

    match format {
        OutputFormat::Raw => {
            fs::write(output, &pixels)?;
        }
        OutputFormat::Ppm => {
            write_pnm(
                output,
                &pixels,
                frame_info.width,
                frame_info.height,
                frame_info.component_count as u32,
                bytes_per_sample,
            )?;
        }
    }

    println!(
        "Decoded {}x{} image ({} components) to {:?}",
        frame_info.width, frame_info.height, frame_info.component_count, output
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn encode_image(
    input: &PathBuf,
    output: &PathBuf,
    width: u32,
    height: u32,
    bits_per_sample: i32,
    components: i32,
    interleave_mode: InterleaveMode,
    near_lossless: i32,
    color_transformation: ColorTransformation,
) -> Result<(), Box<dyn std::error::Error>> {
    let pixels = fs::read(input)?;
    info!("read {} bytes from {:?}", pixels.len(), input);

    let frame_info = FrameInfo {
        width,
        height,
        bits_per_sample,
        component_count: components,
    };

    let mut dest = vec![0u8; pixels.len() * 2 + 1024];
    let mut encoder = JpeglsEncoder::new(&mut dest);
    encoder.set_frame_info(frame_info)?;
    encoder.set_interleave_mode(interleave_mode)?;
    encoder.set_near_lossless(near_lossless)?;
    encoder.set_color_transformation(color_transformation)?;
    let len = encoder.encode(&pixels)?;
    dest.truncate(len);

    fs::write(output, &dest)?;
    println!(
        "Encoded {}x{} image to {:?} ({} bytes)",
        width, height, output, len
    );
    Ok(())
}

fn show_info(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;

    println!("File: {:?}", input);
    println!("Size: {} bytes", data.len());
    println!();

    let mut decoder = JpeglsDecoder::new(&data);
    decoder.read_header()?;
    let info = decoder.frame_info();

    println!("Format:     JPEG-LS");
    println!("Dimensions: {}x{}", info.width, info.height);
    println!("Bit depth:  {} bits", info.bits_per_sample);
    println!("Components: {}", info.component_count);
    println!("Near-lossless error bound: {}", decoder.near_lossless());
    println!("Color transformation: {:?}", decoder.color_transformation());
    if let Some(spiff) = decoder.spiff_header() {
        println!();
        println!("SPIFF header present:");
        println!("  Color space: {:?}", spiff.color_space);
        println!("  Resolution:  {}x{}", spiff.horizontal_resolution, spiff.vertical_resolution);
    }

    Ok(())
}

fn write_pnm(
    path: &PathBuf,
    pixels: &[u8],
    width: u32,
    height: u32,
    components: u32,
    bytes_per_sample: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write;
    let mut file = fs::File::create(path)?;

    if components == 1 {
        writeln!(file, "P5")?;
    } else {
        writeln!(file, "P6")?;
    }
    writeln!(file, "{} {}", width, height)?;
    writeln!(file, "{}", (1u32 << (8 * bytes_per_sample)) - 1)?;

    if bytes_per_sample == 1 {
        file.write_all(pixels)?;
    } else {
        // PNM requires 16-bit samples big-endian regardless of host byte order.
        for sample in pixels.chunks_exact(2) {
            let value = u16::from_ne_bytes([sample[0], sample[1]]);
            file.write_all(&value.to_be_bytes())?;
        }
    }

    Ok(())
}
