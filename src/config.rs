use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::color::{ColorMapping, HexMapping, Rgb, Rgba};
use crate::constants::{canvas, extract::SENTINEL, output::DEFAULT_FILENAME};
use crate::output::FragmentOptions;
use crate::pipeline::PipelineOptions;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub remap: RemapConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CanvasConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    canvas::DEFAULT_WIDTH
}

fn default_height() -> u32 {
    canvas::DEFAULT_HEIGHT // upper half only; the full image is mirrored
}

impl Default for CanvasConfig {
    fn default() -> Self {
        CanvasConfig {
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractConfig {
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
}

fn default_sentinel() -> String {
    SENTINEL.to_string()
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            sentinel: default_sentinel(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RenderConfig {
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_foreground")]
    pub foreground: String,
}

fn default_background() -> String {
    "#ffffff".to_string()
}

fn default_foreground() -> String {
    "#333333".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            background: default_background(),
            foreground: default_foreground(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RemapConfig {
    #[serde(default)]
    pub mappings: Vec<HexMapping>,
    #[serde(default)]
    pub transparent: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_filename")]
    pub filename: String,
    #[serde(default)]
    pub fragment_background: Option<String>,
    #[serde(default = "default_alt_text")]
    pub alt_text: String,
}

fn default_filename() -> String {
    DEFAULT_FILENAME.to_string()
}

fn default_alt_text() -> String {
    "waveform".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            filename: default_filename(),
            fragment_background: None,
            alt_text: default_alt_text(),
        }
    }
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".wavetint"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.yaml"))
    }

    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Create default config
            let config = Config::default();
            config.save_to(&config_path)?;
            eprintln!("Created default config at: {}", config_path.display());
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .context("Failed to parse config file")?;

        // Validate configuration after loading
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        validate_canvas(self.canvas.width, self.canvas.height)?;

        // Validate colors parse
        self.sentinel()?;
        self.background()?;
        self.foreground()?;
        self.mappings()?;
        self.transparent()?;
        self.fragment_background()?;

        if self.output.filename.is_empty() {
            bail!("output filename cannot be empty");
        }

        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .context("Failed to create config directory")?;
        }

        let yaml = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs::write(path, yaml)
            .context("Failed to write config file")?;

        Ok(())
    }

    pub fn sentinel(&self) -> Result<Rgba> {
        self.extract.sentinel.parse::<Rgba>().context("extract.sentinel")
    }

    pub fn background(&self) -> Result<Rgb> {
        self.render.background.parse::<Rgb>().context("render.background")
    }

    pub fn foreground(&self) -> Result<Rgb> {
        self.render.foreground.parse::<Rgb>().context("render.foreground")
    }

    pub fn mappings(&self) -> Result<Vec<ColorMapping>> {
        self.remap
            .mappings
            .iter()
            .map(|m| ColorMapping::try_from(m).context("remap.mappings"))
            .collect()
    }

    pub fn transparent(&self) -> Result<Option<Rgb>> {
        parse_optional(self.remap.transparent.as_deref()).context("remap.transparent")
    }

    pub fn fragment_background(&self) -> Result<Option<Rgb>> {
        parse_optional(self.output.fragment_background.as_deref()).context("output.fragment_background")
    }

    /// Pipeline options as configured, before any per-run overrides
    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        Ok(PipelineOptions {
            width: self.canvas.width,
            height: self.canvas.height,
            sentinel: self.sentinel()?,
            background: self.background()?,
            foreground: self.foreground()?,
            filename: self.output.filename.clone(),
            fragment: FragmentOptions {
                background: self.fragment_background()?,
                alt_text: self.output.alt_text.clone(),
            },
            source: None,
        })
    }
}

/// Canvas bounds shared by the settings file and per-run CLI overrides
pub fn validate_canvas(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        bail!("canvas width and height must be greater than 0");
    }
    if width > canvas::MAX_DIMENSION || height > canvas::MAX_DIMENSION {
        bail!("canvas width and height must be <= {}", canvas::MAX_DIMENSION);
    }
    Ok(())
}

fn parse_optional(hex: Option<&str>) -> Result<Option<Rgb>> {
    Ok(hex.map(str::parse::<Rgb>).transpose()?)
}
