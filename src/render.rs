/// Mirrored waveform rendering
use tracing::debug;

use crate::color::Rgb;
use crate::constants::canvas::MAX_DIMENSION;
use crate::error::{Result, WaveformError};
use crate::raster::Raster;

/// Draw `amplitudes` onto a fresh `width x 2*height` raster.
///
/// Each column gets a one-pixel foreground line from row `height - v` to row
/// `height + v` (clipped to the last row), so a zero amplitude leaves a single
/// dot on the midline. Palette index 0 is the background and is marked
/// transparent; index 1 is the foreground. A zero width yields an empty
/// canvas; either side above `MAX_DIMENSION` is `OutOfRange`.
pub fn render(
    amplitudes: &[u32],
    width: u32,
    height: u32,
    background: Rgb,
    foreground: Rgb,
) -> Result<Raster> {
    if height == 0 {
        return Err(WaveformError::OutOfRange(
            "canvas height must be at least 1 to hold the midline".to_string(),
        ));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(WaveformError::OutOfRange(format!(
            "canvas {}x{} exceeds {} pixels per side",
            width, height, MAX_DIMENSION
        )));
    }
    if amplitudes.len() < width as usize {
        return Err(WaveformError::OutOfRange(format!(
            "{} amplitudes for {} columns",
            amplitudes.len(),
            width
        )));
    }

    let canvas_height = height.checked_mul(2).ok_or_else(|| {
        WaveformError::OutOfRange(format!("mirrored height of {} overflows", height))
    })?;
    let mut raster = Raster::filled(width, canvas_height, background.with_alpha(255));
    let ink = raster.allocate(foreground.with_alpha(255));
    raster.set_transparent(Some(0))?;

    for (x, &v) in amplitudes.iter().take(width as usize).enumerate() {
        if v > height {
            return Err(WaveformError::OutOfRange(format!(
                "amplitude {} at column {} exceeds height {}",
                v, x, height
            )));
        }
        let top = height - v;
        let bottom = (height + v).min(canvas_height - 1);
        for y in top..=bottom {
            raster.set_index(x as u32, y, ink)?;
        }
    }

    debug!("Rendered {} columns onto a {}x{} canvas", width, width, canvas_height);
    Ok(raster)
}
