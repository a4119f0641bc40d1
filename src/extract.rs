/// Amplitude extraction from a pre-rendered waveform raster
///
/// The source format draws the waveform envelope with a sentinel pixel; the
/// topmost sentinel in a column marks that column's peak.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::Rgba;
use crate::error::{Result, WaveformError};
use crate::raster::Raster;

/// One amplitude per column, each in `[0, height]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amplitudes {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<u32>,
}

impl Amplitudes {
    /// Wrap a sample vector, checking every value against `height`
    pub fn new(height: u32, samples: Vec<u32>) -> Result<Self> {
        if let Some((x, v)) = samples.iter().enumerate().find(|(_, v)| **v > height) {
            return Err(WaveformError::OutOfRange(format!(
                "amplitude {} at column {} exceeds height {}",
                v, x, height
            )));
        }
        Ok(Amplitudes {
            width: samples.len() as u32,
            height,
            samples,
        })
    }
}

/// Scan the top `height` rows of the first `width` columns for `sentinel`.
///
/// A column's amplitude is `height - y` for the first row `y` whose pixel
/// equals the sentinel exactly. Columns without one read as 0.
pub fn extract(raster: &Raster, width: u32, height: u32, sentinel: Rgba) -> Result<Amplitudes> {
    if width > raster.width() || height > raster.height() {
        return Err(WaveformError::InvalidRaster(format!(
            "scan area {}x{} exceeds raster {}x{}",
            width,
            height,
            raster.width(),
            raster.height()
        )));
    }

    let mut samples = Vec::with_capacity(width as usize);
    let mut flat_columns = 0usize;

    for x in 0..width {
        let peak_row = (0..height)
            .find(|&y| raster.pixel(x, y) == Some(sentinel))
            .unwrap_or(height);
        if peak_row == height {
            flat_columns += 1;
        }
        samples.push(height - peak_row);
    }

    if flat_columns > 0 {
        debug!(
            "{} of {} columns had no {} boundary pixel",
            flat_columns, width, sentinel
        );
    }

    Ok(Amplitudes {
        width,
        height,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::extract::SENTINEL;

    const GRAY: Rgba = Rgba::new(128, 128, 128, 255);

    fn column_raster(height: u32, sentinel_rows: &[&[u32]]) -> Raster {
        let mut raster = Raster::filled(sentinel_rows.len() as u32, height, GRAY);
        let marker = raster.allocate(SENTINEL);
        for (x, rows) in sentinel_rows.iter().enumerate() {
            for &y in rows.iter() {
                raster.set_index(x as u32, y, marker).unwrap();
            }
        }
        raster
    }

    #[test]
    fn test_first_match_and_missing_column() {
        let raster = column_raster(3, &[&[1], &[]]);
        let amps = extract(&raster, 2, 3, SENTINEL).unwrap();
        assert_eq!(amps.samples, vec![2, 0]);
        assert_eq!(amps.width, 2);
        assert_eq!(amps.height, 3);
    }

    #[test]
    fn test_topmost_sentinel_wins() {
        let raster = column_raster(5, &[&[3, 1, 4], &[0]]);
        let amps = extract(&raster, 2, 5, SENTINEL).unwrap();
        assert_eq!(amps.samples, vec![4, 5]);
    }

    #[test]
    fn test_sentinel_match_is_exact() {
        let mut raster = Raster::filled(1, 2, GRAY);
        let near = raster.allocate(Rgba::new(0, 0, 0, 1));
        raster.set_index(0, 0, near).unwrap();
        let amps = extract(&raster, 1, 2, SENTINEL).unwrap();
        assert_eq!(amps.samples, vec![0]);
    }

    #[test]
    fn test_scan_only_covers_requested_area() {
        // Sentinel below the scanned height is ignored
        let raster = column_raster(6, &[&[4]]);
        let amps = extract(&raster, 1, 3, SENTINEL).unwrap();
        assert_eq!(amps.samples, vec![0]);
    }

    #[test]
    fn test_amplitudes_stay_in_range() {
        let raster = column_raster(4, &[&[0], &[1], &[2], &[3], &[]]);
        let amps = extract(&raster, 5, 4, SENTINEL).unwrap();
        assert!(amps.samples.iter().all(|&v| v <= 4));
        assert_eq!(amps.samples, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_scan_area_larger_than_raster_fails() {
        let raster = column_raster(3, &[&[1]]);
        assert!(matches!(
            extract(&raster, 2, 3, SENTINEL),
            Err(WaveformError::InvalidRaster(_))
        ));
        assert!(matches!(
            extract(&raster, 1, 4, SENTINEL),
            Err(WaveformError::InvalidRaster(_))
        ));
    }

    #[test]
    fn test_amplitudes_new_checks_height() {
        assert!(Amplitudes::new(3, vec![0, 3]).is_ok());
        assert!(matches!(
            Amplitudes::new(3, vec![4]),
            Err(WaveformError::OutOfRange(_))
        ));
    }
}
