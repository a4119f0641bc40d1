/// One-shot transform: decode, run a single operation, serialize
///
/// The raster is owned by the run and dropped when it returns, on success or
/// error. Nothing is cached between runs.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::color::{ColorMapping, Rgb, Rgba};
use crate::constants::{canvas, extract::SENTINEL, output::DEFAULT_FILENAME};
use crate::error::{Result, WaveformError};
use crate::extract::{extract, Amplitudes};
use crate::output::{embeddable_fragment, numeric_payload, raster_bytes, FragmentOptions, Output};
use crate::raster::Raster;
use crate::remap::remap;
use crate::render::render;

/// What to do with the decoded source raster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Read the amplitude of every column
    Extract,
    /// Recolor palette entries in place
    Remap {
        mappings: Vec<ColorMapping>,
        transparent: Option<Rgb>,
    },
    /// Extract, then draw a fresh mirrored waveform from the amplitudes
    Render,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Png,
    Html,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "png" => Ok(OutputFormat::Png),
            "html" => Ok(OutputFormat::Html),
            other => Err(format!("unknown output format '{}' (json, png, html)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Json => "json",
            OutputFormat::Png => "png",
            OutputFormat::Html => "html",
        };
        f.write_str(name)
    }
}

/// Everything a run needs besides the operation and the source bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Columns to scan
    pub width: u32,
    /// Rows to scan; rendered canvases are twice this tall
    pub height: u32,
    pub sentinel: Rgba,
    pub background: Rgb,
    pub foreground: Rgb,
    pub filename: String,
    pub fragment: FragmentOptions,
    /// Label carried into the JSON payload
    pub source: Option<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            width: canvas::DEFAULT_WIDTH,
            height: canvas::DEFAULT_HEIGHT,
            sentinel: SENTINEL,
            background: Rgb::new(255, 255, 255),
            foreground: Rgb::new(0x33, 0x33, 0x33),
            filename: DEFAULT_FILENAME.to_string(),
            fragment: FragmentOptions {
                background: None,
                alt_text: "waveform".to_string(),
            },
            source: None,
        }
    }
}

/// Intermediate result of an operation, before serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Product {
    Samples(Amplitudes),
    Image(Raster),
    /// Freshly drawn raster together with the amplitudes it was drawn from
    Rendered {
        raster: Raster,
        amplitudes: Amplitudes,
    },
}

/// Decode `bytes` and run the pipeline on the result
pub fn run(
    bytes: &[u8],
    operation: &Operation,
    format: OutputFormat,
    options: &PipelineOptions,
) -> Result<Output> {
    let raster = Raster::decode(bytes)?;
    run_on_raster(raster, operation, format, options)
}

/// Run the pipeline on an already decoded raster, consuming it
pub fn run_on_raster(
    raster: Raster,
    operation: &Operation,
    format: OutputFormat,
    options: &PipelineOptions,
) -> Result<Output> {
    info!(
        "Running {:?} on {}x{} raster, output {}",
        operation,
        raster.width(),
        raster.height(),
        format
    );
    let product = apply(raster, operation, options)?;
    serialize(product, format, options)
}

/// Run the operation without serializing
pub fn apply(mut raster: Raster, operation: &Operation, options: &PipelineOptions) -> Result<Product> {
    match operation {
        Operation::Extract => {
            let amplitudes = extract(&raster, options.width, options.height, options.sentinel)?;
            Ok(Product::Samples(amplitudes))
        }
        Operation::Remap {
            mappings,
            transparent,
        } => {
            remap(&mut raster, mappings, *transparent)?;
            Ok(Product::Image(raster))
        }
        Operation::Render => {
            let amplitudes = extract(&raster, options.width, options.height, options.sentinel)?;
            let raster = draw(&amplitudes, options)?;
            Ok(Product::Rendered { raster, amplitudes })
        }
    }
}

/// Turn a product into the requested shape. Samples asked for as an image
/// are drawn first. A drawn raster asked for as JSON reports the samples it
/// was drawn from; any other image is read back by the extractor.
pub fn serialize(product: Product, format: OutputFormat, options: &PipelineOptions) -> Result<Output> {
    let source = options.source.as_deref();
    match (product, format) {
        (Product::Samples(amplitudes), OutputFormat::Json) => {
            Ok(Output::Numeric(numeric_payload(&amplitudes, source)?))
        }
        (Product::Samples(amplitudes), format) => {
            let raster = draw(&amplitudes, options)?;
            serialize(Product::Rendered { raster, amplitudes }, format, options)
        }
        (Product::Rendered { amplitudes, .. }, OutputFormat::Json) => {
            Ok(Output::Numeric(numeric_payload(&amplitudes, source)?))
        }
        (Product::Rendered { raster, .. }, format) => {
            serialize(Product::Image(raster), format, options)
        }
        (Product::Image(raster), OutputFormat::Json) => {
            let amplitudes = extract(&raster, options.width, options.height, options.sentinel)?;
            Ok(Output::Numeric(numeric_payload(&amplitudes, source)?))
        }
        (Product::Image(raster), OutputFormat::Png) => {
            Ok(Output::Raster(raster_bytes(&raster, &options.filename)?))
        }
        (Product::Image(raster), OutputFormat::Html) => {
            Ok(Output::Fragment(embeddable_fragment(&raster, &options.fragment)?))
        }
    }
}

fn draw(amplitudes: &Amplitudes, options: &PipelineOptions) -> Result<Raster> {
    if amplitudes.height > options.height {
        return Err(WaveformError::OutOfRange(format!(
            "samples measured against height {} do not fit height {}",
            amplitudes.height, options.height
        )));
    }
    render(
        &amplitudes.samples,
        amplitudes.width,
        options.height,
        options.background,
        options.foreground,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(width: u32, height: u32) -> PipelineOptions {
        PipelineOptions {
            width,
            height,
            ..PipelineOptions::default()
        }
    }

    fn source_raster() -> Raster {
        // 3 columns, upper half 4 rows tall, peaks at rows 1, none, 3
        let mut raster = Raster::filled(3, 8, Rgba::new(200, 200, 200, 255));
        let marker = raster.allocate(SENTINEL);
        raster.set_index(0, 1, marker).unwrap();
        raster.set_index(2, 3, marker).unwrap();
        raster
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert!("gif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_extract_to_json() {
        let output = run_on_raster(source_raster(), &Operation::Extract, OutputFormat::Json, &options(3, 4)).unwrap();
        match output {
            Output::Numeric(json) => assert_eq!(json, r#"{"width":3,"height":4,"samples":[3,0,1]}"#),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_render_product_is_mirrored_canvas() {
        let product = apply(source_raster(), &Operation::Render, &options(3, 4)).unwrap();
        match product {
            Product::Rendered { raster, amplitudes } => {
                assert_eq!(raster.width(), 3);
                assert_eq!(raster.height(), 8);
                assert_eq!(raster.transparent(), Some(0));
                assert_eq!(amplitudes.samples, vec![3, 0, 1]);
            }
            other => panic!("unexpected product {:?}", other),
        }
    }

    #[test]
    fn test_remap_to_png() {
        let operation = Operation::Remap {
            mappings: vec![ColorMapping::new(Rgb::new(0, 0, 0), Rgb::new(255, 0, 0))],
            transparent: Some(Rgb::new(200, 200, 200)),
        };
        let output = run_on_raster(source_raster(), &operation, OutputFormat::Png, &options(3, 4)).unwrap();
        let Output::Raster(bytes) = output else {
            panic!("expected raster output");
        };
        let decoded = Raster::decode(&bytes.bytes).unwrap();
        assert_eq!(decoded.pixel(0, 1), Some(Rgba::new(255, 0, 0, SENTINEL.a)));
        assert_eq!(decoded.pixel(1, 1), Some(Rgba::new(200, 200, 200, 0)));
    }

    #[test]
    fn test_render_to_json_reports_drawn_samples() {
        let opts = options(3, 4);
        let extracted = run_on_raster(source_raster(), &Operation::Extract, OutputFormat::Json, &opts).unwrap();
        let rendered = run_on_raster(source_raster(), &Operation::Render, OutputFormat::Json, &opts).unwrap();
        assert_eq!(rendered, extracted);
        assert_eq!(
            rendered.as_bytes(),
            br#"{"width":3,"height":4,"samples":[3,0,1]}"#
        );
    }

    #[test]
    fn test_samples_as_html_are_drawn_first() {
        let output = run_on_raster(source_raster(), &Operation::Extract, OutputFormat::Html, &options(3, 4)).unwrap();
        assert!(matches!(output, Output::Fragment(ref html) if html.contains("data:image/png;base64,")));
    }

    #[test]
    fn test_scan_area_too_large_aborts() {
        let result = run_on_raster(source_raster(), &Operation::Extract, OutputFormat::Json, &options(4, 4));
        assert!(matches!(result, Err(WaveformError::InvalidRaster(_))));
    }
}
