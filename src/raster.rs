//! Palette-indexed raster plus the PNG codec glue that loads and stores it
//!
//! Every pixel holds an index into the raster's own palette, so recoloring an
//! entry recolors all pixels sharing it at once. A single palette index may be
//! designated transparent; that flag lives on the raster, not on the entry,
//! so it survives the entry being recolored.

use std::collections::HashMap;

use image::RgbaImage;
use tracing::debug;

use crate::color::{Rgb, Rgba};
use crate::constants::palette::MAX_ENTRIES;
use crate::error::{Result, WaveformError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    palette: Vec<Rgba>,
    /// Row-major palette indices, `width * height` long
    indices: Vec<u32>,
    transparent: Option<u32>,
}

impl Raster {
    /// Create a raster whose every pixel uses a single palette entry
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Raster {
            width,
            height,
            palette: vec![color],
            indices: vec![0; width as usize * height as usize],
            transparent: None,
        }
    }

    /// Build a raster from explicit parts. Fails if the index grid does not
    /// match the dimensions or references a missing palette entry.
    pub fn from_parts(width: u32, height: u32, palette: Vec<Rgba>, indices: Vec<u32>) -> Result<Self> {
        if indices.len() != width as usize * height as usize {
            return Err(WaveformError::InvalidRaster(format!(
                "{} indices for a {}x{} raster",
                indices.len(),
                width,
                height
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= palette.len()) {
            return Err(WaveformError::InvalidRaster(format!(
                "index {} outside a palette of {} entries",
                bad,
                palette.len()
            )));
        }
        Ok(Raster {
            width,
            height,
            palette,
            indices,
            transparent: None,
        })
    }

    /// Palettize a truecolor image: one entry per distinct RGBA value, in
    /// first-seen scan order.
    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        let mut lookup: HashMap<[u8; 4], u32> = HashMap::new();
        let mut palette = Vec::new();
        let mut indices = Vec::with_capacity(img.width() as usize * img.height() as usize);

        for pixel in img.pixels() {
            let index = *lookup.entry(pixel.0).or_insert_with(|| {
                let [r, g, b, a] = pixel.0;
                palette.push(Rgba::new(r, g, b, a));
                (palette.len() - 1) as u32
            });
            indices.push(index);
        }

        Raster {
            width: img.width(),
            height: img.height(),
            palette,
            indices,
            transparent: None,
        }
    }

    /// Decode an image file's bytes.
    ///
    /// Indexed PNGs keep their palette order (nearest-color ties depend on it);
    /// anything else goes through the `image` crate and is palettized.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(WaveformError::InvalidRaster("no image data".to_string()));
        }

        if let Some(raster) = decode_indexed_png(bytes)? {
            debug!(
                "Decoded indexed PNG {}x{} with {} palette entries",
                raster.width,
                raster.height,
                raster.palette.len()
            );
            return Ok(raster);
        }

        let img = image::load_from_memory(bytes)
            .map_err(|e| WaveformError::InvalidRaster(e.to_string()))?
            .to_rgba8();
        let raster = Raster::from_rgba_image(&img);
        debug!(
            "Decoded truecolor image {}x{} into {} palette entries",
            raster.width,
            raster.height,
            raster.palette.len()
        );
        Ok(raster)
    }

    /// Encode as an 8-bit indexed PNG with a tRNS chunk when any entry is
    /// not opaque. The transparent index is written with alpha 0.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        if self.palette.len() > MAX_ENTRIES {
            return Err(WaveformError::UnsupportedColorDepth(format!(
                "{} colors do not fit an indexed PNG (max {})",
                self.palette.len(),
                MAX_ENTRIES
            )));
        }

        let rgb: Vec<u8> = self.palette.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
        let alpha: Vec<u8> = (0..self.palette.len())
            .map(|i| self.alpha_at_index(i as u32))
            .collect();
        let data: Vec<u8> = self.indices.iter().map(|&i| i as u8).collect();

        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Indexed);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_palette(rgb);
            if alpha.iter().any(|&a| a < 255) {
                encoder.set_trns(alpha);
            }
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&data)?;
            writer.finish()?;
        }

        debug!("Encoded {}x{} raster into {} PNG bytes", self.width, self.height, out.len());
        Ok(out)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn palette(&self) -> &[Rgba] {
        &self.palette
    }

    /// Append a palette entry and return its index
    pub fn allocate(&mut self, color: Rgba) -> u32 {
        self.palette.push(color);
        (self.palette.len() - 1) as u32
    }

    /// Replace the RGB of a palette entry, keeping its alpha
    pub fn set_entry_rgb(&mut self, index: u32, rgb: Rgb) -> Result<()> {
        let entry = self.palette.get_mut(index as usize).ok_or_else(|| {
            WaveformError::OutOfRange(format!("palette index {}", index))
        })?;
        *entry = rgb.with_alpha(entry.a);
        Ok(())
    }

    pub fn transparent(&self) -> Option<u32> {
        self.transparent
    }

    /// Designate the sole transparent palette index, replacing any previous one
    pub fn set_transparent(&mut self, index: Option<u32>) -> Result<()> {
        if let Some(i) = index {
            if i as usize >= self.palette.len() {
                return Err(WaveformError::OutOfRange(format!("palette index {}", i)));
            }
        }
        self.transparent = index;
        Ok(())
    }

    /// True if the raster would show anything through when composited
    pub fn has_transparency(&self) -> bool {
        self.transparent.is_some() || self.palette.iter().any(|c| c.a < 255)
    }

    pub fn index_at(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.indices.get(self.offset(x, y)).copied()
    }

    pub fn set_index(&mut self, x: u32, y: u32, index: u32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(WaveformError::OutOfRange(format!(
                "pixel ({}, {}) outside {}x{}",
                x, y, self.width, self.height
            )));
        }
        if index as usize >= self.palette.len() {
            return Err(WaveformError::OutOfRange(format!("palette index {}", index)));
        }
        let offset = self.offset(x, y);
        self.indices[offset] = index;
        Ok(())
    }

    /// Stored color of the pixel's palette entry
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.index_at(x, y)
            .and_then(|i| self.palette.get(i as usize).copied())
    }

    fn alpha_at_index(&self, index: u32) -> u8 {
        if self.transparent == Some(index) {
            0
        } else {
            self.palette[index as usize].a
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Returns `Ok(None)` when the bytes are not an indexed PNG at all.
fn decode_indexed_png(bytes: &[u8]) -> Result<Option<Raster>> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::IDENTITY);

    let mut reader = match decoder.read_info() {
        Ok(reader) => reader,
        Err(_) => return Ok(None),
    };
    if reader.info().color_type != png::ColorType::Indexed {
        return Ok(None);
    }

    let palette_bytes = reader
        .info()
        .palette
        .as_ref()
        .map(|p| p.to_vec())
        .ok_or_else(|| WaveformError::InvalidRaster("indexed PNG without PLTE".to_string()))?;
    let trns = reader
        .info()
        .trns
        .as_ref()
        .map(|t| t.to_vec())
        .unwrap_or_default();

    let palette: Vec<Rgba> = palette_bytes
        .chunks_exact(3)
        .enumerate()
        .map(|(i, c)| Rgba::new(c[0], c[1], c[2], trns.get(i).copied().unwrap_or(255)))
        .collect();

    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .map_err(|e| WaveformError::InvalidRaster(e.to_string()))?;

    let depth = frame.bit_depth as usize;
    if !matches!(depth, 1 | 2 | 4 | 8) {
        return Err(WaveformError::InvalidRaster(format!(
            "indexed PNG with bit depth {}",
            depth
        )));
    }

    let per_byte = 8 / depth;
    let mask = ((1u16 << depth) - 1) as u8;
    let mut indices = Vec::with_capacity(frame.width as usize * frame.height as usize);

    for row in buf.chunks(frame.line_size).take(frame.height as usize) {
        for x in 0..frame.width as usize {
            let byte = row[x / per_byte];
            let shift = 8 - depth * (x % per_byte + 1);
            indices.push(((byte >> shift) & mask) as u32);
        }
    }

    Raster::from_parts(frame.width, frame.height, palette, indices).map(Some)
}
