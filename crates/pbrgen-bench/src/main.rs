//! pbrgen-bench: CLI tool for running texture generation and collecting
//! diagnostics.
//!
//! Runs the full generation task graph on a given image, prints
//! per-task timing, and writes the five blended output channels as
//! PNG files. Useful for:
//!
//! - Measuring per-task durations to spot scheduling bottlenecks
//! - Previewing slider settings without an interactive host
//! - Comparing outputs across input images
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin pbrgen-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use pbrgen_generator::{
    Channel, GenerationSettings, Generator, RunDiagnostics,
};
use pbrgen_pipeline::{PixelBuffer, raster};

/// Texture generation diagnostics for pbrgen.
///
/// Runs the generation task graph on a given image, prints per-task
/// timing, and writes the blended output channels as PNG files.
#[derive(Parser)]
#[command(name = "pbrgen-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Directory the output channel PNGs are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Albedo noise removal strength (0.0-1.0).
    #[arg(long, default_value_t = pbrgen_generator::cache::DEFAULT_SLIDER)]
    noise_removal: f32,

    /// Albedo shadow/highlight removal strength (0.0-1.0).
    #[arg(long, default_value_t = pbrgen_generator::cache::DEFAULT_SLIDER)]
    shadow_removal: f32,

    /// Height map smoothness (0.0-1.0).
    #[arg(long, default_value_t = pbrgen_generator::cache::DEFAULT_SLIDER)]
    height_smoothness: f32,

    /// Normal map fine detail strength (0.0-1.0).
    #[arg(long, default_value_t = pbrgen_generator::cache::DEFAULT_SLIDER)]
    normal_detail: f32,

    /// Ambient occlusion spread (0.0-1.0).
    #[arg(long, default_value_t = pbrgen_generator::cache::DEFAULT_SLIDER)]
    occlusion_spread: f32,

    /// Metallic response strength (0.0-1.0).
    #[arg(long, default_value_t = pbrgen_generator::cache::DEFAULT_SLIDER)]
    metallicness: f32,

    /// Skip writing output PNGs; only print diagnostics.
    #[arg(long)]
    no_output: bool,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Full settings as a JSON string.
    ///
    /// When provided, the individual slider flags are ignored. The
    /// JSON must be a valid `GenerationSettings` serialization.
    #[arg(long)]
    settings_json: Option<String>,
}

/// Build [`GenerationSettings`] from CLI arguments.
///
/// If `--settings-json` is provided, the JSON is parsed directly and
/// the individual slider flags are ignored.
fn settings_from_cli(cli: &Cli) -> Result<GenerationSettings, String> {
    if let Some(ref json) = cli.settings_json {
        return serde_json::from_str(json)
            .map_err(|e| format!("Error parsing --settings-json: {e}"));
    }

    Ok(GenerationSettings {
        noise_removal: cli.noise_removal,
        shadow_removal: cli.shadow_removal,
        height_smoothness: cli.height_smoothness,
        normal_detail: cli.normal_detail,
        occlusion_spread: cli.occlusion_spread,
        metallicness: cli.metallicness,
    })
}

/// Human-readable per-task timing report.
fn print_report(diagnostics: &RunDiagnostics) {
    println!("Task timings (offsets from run start):");
    for task in &diagnostics.tasks {
        println!(
            "  {:<32} start {:>8.3}s  took {:>8.3}s",
            task.name,
            task.started_at.as_secs_f64(),
            task.duration.as_secs_f64(),
        );
    }
    println!(
        "Total wall clock: {:.3}s",
        diagnostics.total_duration.as_secs_f64(),
    );
}

/// Write one blended channel next to the input's file stem.
fn write_channel(
    buffer: &PixelBuffer,
    channel: Channel,
    out_dir: &Path,
    stem: &str,
) -> Result<(), String> {
    let path = out_dir.join(format!("{stem}_{}.png", channel.name()));
    let result = match buffer {
        PixelBuffer::Gray(gray) => raster::gray_to_image(gray).save(&path),
        PixelBuffer::Rgb(rgb) => raster::rgb_to_image(rgb).save(&path),
    };
    result.map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let settings = match settings_from_cli(&cli) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let raw = match raster::decode_rgb(&image_bytes) {
        Ok(buffer) => buffer,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };
    let (width, height) = raw.dimensions();

    eprintln!(
        "Image: {} ({width}x{height}, {} bytes)",
        cli.image_path.display(),
        image_bytes.len(),
    );
    eprintln!("Settings: {settings:#?}");
    eprintln!();

    let generator = Generator::new();
    let handle = match generator.begin_generation(raw.into_raw(), width, height) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error starting generation: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = handle.wait() {
        eprintln!("Generation did not complete: {e}");
        return ExitCode::FAILURE;
    }

    if let Some(diagnostics) = handle.diagnostics() {
        if cli.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            print_report(&diagnostics);
        }
    }

    if cli.no_output {
        return ExitCode::SUCCESS;
    }

    let stem = cli
        .image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pbrgen");

    for channel in Channel::ALL {
        let buffer = match generator.get_channel(channel, &settings) {
            Ok(buffer) => buffer,
            Err(e) => {
                eprintln!("Error blending {}: {e}", channel.name());
                return ExitCode::FAILURE;
            }
        };
        if let Err(msg) = write_channel(&buffer, channel, &cli.out_dir, stem) {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
