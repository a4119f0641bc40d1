/// Application-wide constants for waveform scanning, rendering and output

pub mod canvas {
    /// Width of the source waveform images (one column per amplitude sample)
    pub const DEFAULT_WIDTH: u32 = 1800;

    /// Height of the upper half of the waveform; the full image is a 2x mirror
    pub const DEFAULT_HEIGHT: u32 = 140;

    /// Upper bound accepted for either dimension from configuration or CLI
    pub const MAX_DIMENSION: u32 = 16384;
}

pub mod extract {
    use crate::color::Rgba;

    /// Pixel marking the drawn/undrawn boundary in the source waveform format.
    /// The first row matching it in a column is taken as the peak.
    ///
    /// Source waveforms cut the envelope out of an opaque mask, so the body is
    /// fully transparent black. That is alpha 127 on GD's 7-bit scale, alpha 0
    /// on the PNG scale used here.
    pub const SENTINEL: Rgba = Rgba::new(0, 0, 0, 0);
}

pub mod palette {
    /// Largest palette an 8-bit indexed PNG can carry
    pub const MAX_ENTRIES: usize = 256;
}

pub mod output {
    pub const PNG_MIME: &str = "image/png";

    pub const DEFAULT_FILENAME: &str = "waveform.png";

    /// Thumbnail block width in the HTML fragment, as a percentage
    pub const THUMBNAIL_WIDTH_PERCENT: u32 = 30;

    /// Full-size block width in the HTML fragment, as a percentage
    pub const FULL_WIDTH_PERCENT: u32 = 100;
}
