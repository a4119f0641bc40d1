/// Palette recoloring by nearest-color match
///
/// Mappings are applied one after another against the live palette, so a
/// later mapping sees the colors written by earlier ones.

use tracing::{debug, info};

use crate::color::{ColorMapping, Rgb};
use crate::error::{Result, WaveformError};
use crate::raster::Raster;

/// Index of the palette entry closest to `target`; ties go to the lowest index
pub fn closest_index(raster: &Raster, target: Rgb) -> Result<u32> {
    raster
        .palette()
        .iter()
        .enumerate()
        .min_by_key(|(i, color)| (color.rgb().distance_squared(&target), *i))
        .map(|(i, _)| i as u32)
        .ok_or_else(|| WaveformError::ColorNotFound(target.to_string()))
}

/// Recolor `raster` in place.
///
/// Returns the palette index each mapping rewrote, in mapping order. When
/// `transparent` is given, the entry nearest to it (after all mappings) becomes
/// the raster's only transparent index.
pub fn remap(
    raster: &mut Raster,
    mappings: &[ColorMapping],
    transparent: Option<Rgb>,
) -> Result<Vec<u32>> {
    let mut applied = Vec::with_capacity(mappings.len());

    for mapping in mappings {
        let index = closest_index(raster, mapping.source)?;
        debug!(
            "Mapping {} -> {} via palette index {}",
            mapping.source, mapping.destination, index
        );
        raster.set_entry_rgb(index, mapping.destination)?;
        applied.push(index);
    }

    if let Some(color) = transparent {
        let index = closest_index(raster, color)?;
        debug!("Palette index {} ({}) marked transparent", index, color);
        raster.set_transparent(Some(index))?;
    }

    info!(
        "Remapped {} colors across {} palette entries",
        applied.len(),
        raster.palette().len()
    );
    Ok(applied)
}
