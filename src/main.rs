use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wavetint::config::{validate_canvas, Config};
use wavetint::pipeline::{self, Operation, OutputFormat, PipelineOptions};
use wavetint::{ColorMapping, Output, Rgb, Rgba};

#[derive(Parser)]
#[command(name = "wavetint")]
#[command(about = "Extract, recolor and re-render pre-rendered waveform images", long_about = None)]
struct Cli {
    /// Settings file to use instead of ~/.wavetint/settings.yaml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Common {
    /// Source waveform image
    input: PathBuf,
    /// Output shape: json, png or html
    #[arg(short, long)]
    format: Option<OutputFormat>,
    /// Write the result here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Columns to scan (defaults to canvas.width)
    #[arg(long)]
    width: Option<u32>,
    /// Rows to scan, the upper half of the waveform (defaults to canvas.height)
    #[arg(long)]
    height: Option<u32>,
    /// Boundary pixel color as #rrggbbaa
    #[arg(long)]
    sentinel: Option<Rgba>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read one amplitude per column (JSON by default)
    Extract {
        #[command(flatten)]
        common: Common,
    },
    /// Recolor palette entries by nearest match (PNG by default)
    Remap {
        #[command(flatten)]
        common: Common,
        /// Color mapping, applied in the order given; replaces configured mappings
        #[arg(long = "map", value_name = "SRC:DST")]
        mappings: Vec<ColorMapping>,
        /// Color whose nearest palette entry becomes transparent
        #[arg(long)]
        transparent: Option<Rgb>,
    },
    /// Extract amplitudes and draw a fresh mirrored waveform (PNG by default)
    Render {
        #[command(flatten)]
        common: Common,
        #[arg(long)]
        background: Option<Rgb>,
        #[arg(long)]
        foreground: Option<Rgb>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_create()?,
    };
    let mut options = config.pipeline_options()?;

    let (common, operation, default_format) = match cli.command {
        Commands::Extract { common } => (common, Operation::Extract, OutputFormat::Json),
        Commands::Remap {
            common,
            mappings,
            transparent,
        } => {
            let mappings = if mappings.is_empty() {
                config.mappings()?
            } else {
                mappings
            };
            let transparent = match transparent {
                Some(color) => Some(color),
                None => config.transparent()?,
            };
            (
                common,
                Operation::Remap {
                    mappings,
                    transparent,
                },
                OutputFormat::Png,
            )
        }
        Commands::Render {
            common,
            background,
            foreground,
        } => {
            if let Some(color) = background {
                options.background = color;
            }
            if let Some(color) = foreground {
                options.foreground = color;
            }
            (common, Operation::Render, OutputFormat::Png)
        }
    };

    apply_overrides(&mut options, &common)?;
    let format = common.format.unwrap_or(default_format);

    let bytes = fs::read(&common.input)
        .with_context(|| format!("Failed to read {}", common.input.display()))?;
    let output = pipeline::run(&bytes, &operation, format, &options)
        .with_context(|| format!("Failed to process {}", common.input.display()))?;

    write_output(&output, common.out.as_deref())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wavetint=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn apply_overrides(options: &mut PipelineOptions, common: &Common) -> Result<()> {
    if let Some(width) = common.width {
        options.width = width;
    }
    if let Some(height) = common.height {
        options.height = height;
    }
    if let Some(sentinel) = common.sentinel {
        options.sentinel = sentinel;
    }
    options.source = Some(common.input.display().to_string());

    // CLI dimensions get the same bounds as the settings file
    validate_canvas(options.width, options.height)
        .context("Invalid --width/--height")?;

    Ok(())
}

fn write_output(output: &Output, out: Option<&Path>) -> Result<()> {
    // Raw image bytes never go to stdout unless asked; fall back to the suggested name
    let target = match (out, output) {
        (Some(path), _) => Some(path.to_path_buf()),
        (None, Output::Raster(raster)) => Some(PathBuf::from(&raster.filename)),
        (None, _) => None,
    };

    match target {
        Some(path) => {
            fs::write(&path, output.as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("✓ Wrote {} ({}, {} bytes)", path.display(), output.content_type(), output.as_bytes().len());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(output.as_bytes())
                .context("Failed to write to stdout")?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common(width: Option<u32>, height: Option<u32>) -> Common {
        Common {
            input: PathBuf::from("waveforms/source.png"),
            format: None,
            out: None,
            width,
            height,
            sentinel: None,
        }
    }

    #[test]
    fn test_overrides_apply_and_label_source() {
        let mut options = PipelineOptions::default();
        apply_overrides(&mut options, &common(Some(900), Some(70))).unwrap();
        assert_eq!(options.width, 900);
        assert_eq!(options.height, 70);
        assert_eq!(options.source.as_deref(), Some("waveforms/source.png"));
    }

    #[test]
    fn test_overrides_reject_out_of_bounds_dimensions() {
        let mut options = PipelineOptions::default();
        assert!(apply_overrides(&mut options, &common(Some(0), None)).is_err());

        let mut options = PipelineOptions::default();
        assert!(apply_overrides(&mut options, &common(None, Some(u32::MAX))).is_err());
    }
}
