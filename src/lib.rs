// Library exports for the CLI and tests
pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod raster;
pub mod remap;
pub mod render;

pub use color::{ColorMapping, Rgb, Rgba};
pub use error::WaveformError;
pub use extract::{extract, Amplitudes};
pub use output::Output;
pub use pipeline::{Operation, OutputFormat, PipelineOptions};
pub use raster::Raster;
pub use remap::remap;
pub use render::render;
