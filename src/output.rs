//! Result shapes: JSON amplitude payload, PNG bytes, or an HTML fragment
//!
//! Exactly one shape is produced per run. Which one is the caller's choice.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use tracing::debug;

use crate::color::Rgb;
use crate::constants::output::{FULL_WIDTH_PERCENT, PNG_MIME, THUMBNAIL_WIDTH_PERCENT};
use crate::error::Result;
use crate::extract::Amplitudes;
use crate::raster::Raster;

/// JSON body for the numeric output
#[derive(Debug, Serialize)]
pub struct NumericPayload<'a> {
    pub width: u32,
    pub height: u32,
    pub samples: &'a [u32],
    /// Where the samples were read from, usually a file path or URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
}

/// Encoded image plus the metadata a caller needs to hand it on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBytes {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// How the HTML fragment is decorated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentOptions {
    /// Solid color shown behind transparent pixels
    pub background: Option<Rgb>,
    pub alt_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Numeric(String),
    Raster(RasterBytes),
    Fragment(String),
}

impl Output {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Output::Numeric(json) => json.as_bytes(),
            Output::Raster(raster) => &raster.bytes,
            Output::Fragment(html) => html.as_bytes(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Output::Numeric(_) => "application/json",
            Output::Raster(raster) => raster.mime,
            Output::Fragment(_) => "text/html",
        }
    }
}

/// Serialize amplitudes as `{"width":..,"height":..,"samples":[..]}`.
///
/// serde_json never escapes `/`, so paths and URLs in `source` stay literal.
pub fn numeric_payload(amplitudes: &Amplitudes, source: Option<&str>) -> Result<String> {
    let payload = NumericPayload {
        width: amplitudes.width,
        height: amplitudes.height,
        samples: &amplitudes.samples,
        source,
    };
    Ok(serde_json::to_string(&payload)?)
}

pub fn raster_bytes(raster: &Raster, filename: &str) -> Result<RasterBytes> {
    Ok(RasterBytes {
        filename: filename.to_string(),
        mime: PNG_MIME,
        bytes: raster.encode_png()?,
    })
}

/// Inline the raster as a data URI, shown once as a thumbnail and once at
/// full width. The background color is only applied when the raster has
/// something transparent to show it through.
pub fn embeddable_fragment(raster: &Raster, options: &FragmentOptions) -> Result<String> {
    let png = raster.encode_png()?;
    let data_uri = format!("data:{};base64,{}", PNG_MIME, STANDARD.encode(&png));

    let backdrop = match options.background {
        Some(color) if raster.has_transparency() => format!(" background-color: {};", color),
        _ => String::new(),
    };
    let alt = escape_attribute(&options.alt_text);

    let block = |percent: u32| {
        format!(
            "<div style=\"width: {}%;{}\">\n  <img src=\"{}\" alt=\"{}\" style=\"display: block; width: 100%; height: auto;\" />\n</div>\n",
            percent, backdrop, data_uri, alt
        )
    };

    let html = format!("{}{}", block(THUMBNAIL_WIDTH_PERCENT), block(FULL_WIDTH_PERCENT));
    debug!("Built HTML fragment ({} bytes, {} byte image)", html.len(), png.len());
    Ok(html)
}

fn escape_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::error::WaveformError;

    fn options(background: Option<Rgb>) -> FragmentOptions {
        FragmentOptions {
            background,
            alt_text: "waveform".to_string(),
        }
    }

    #[test]
    fn test_numeric_payload_shape() {
        let amps = Amplitudes::new(3, vec![1, 2, 1]).unwrap();
        let json = numeric_payload(&amps, None).unwrap();
        assert_eq!(json, r#"{"width":3,"height":3,"samples":[1,2,1]}"#);
    }

    #[test]
    fn test_numeric_payload_keeps_slashes() {
        let amps = Amplitudes::new(3, vec![1, 2, 1]).unwrap();
        let json = numeric_payload(&amps, Some("https://w1.sndcdn.com/fxguEjG4ax6B_m.png")).unwrap();
        assert!(json.contains("https://w1.sndcdn.com/fxguEjG4ax6B_m.png"));
        assert!(!json.contains("\\/"));
    }

    #[test]
    fn test_raster_bytes_metadata() {
        let raster = Raster::filled(2, 2, Rgba::new(1, 2, 3, 255));
        let out = raster_bytes(&raster, "tinted.png").unwrap();
        assert_eq!(out.filename, "tinted.png");
        assert_eq!(out.mime, "image/png");
        assert_eq!(&out.bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_fragment_has_two_blocks_with_same_image() {
        let mut raster = Raster::filled(2, 2, Rgba::new(1, 2, 3, 255));
        raster.set_transparent(Some(0)).unwrap();
        let html = embeddable_fragment(&raster, &options(Some(Rgb::new(0x33, 0x66, 0x99)))).unwrap();

        assert!(html.contains("width: 30%;"));
        assert!(html.contains("width: 100%;"));
        assert_eq!(html.matches("data:image/png;base64,").count(), 2);
        assert_eq!(html.matches("background-color: #336699;").count(), 2);

        let srcs: Vec<&str> = html
            .split("src=\"")
            .skip(1)
            .map(|s| s.split('"').next().unwrap_or_default())
            .collect();
        assert_eq!(srcs.len(), 2);
        assert_eq!(srcs[0], srcs[1]);
    }

    #[test]
    fn test_fragment_skips_background_for_opaque_raster() {
        let raster = Raster::filled(1, 1, Rgba::new(1, 2, 3, 255));
        let html = embeddable_fragment(&raster, &options(Some(Rgb::new(0, 0, 0)))).unwrap();
        assert!(!html.contains("background-color"));
    }

    #[test]
    fn test_fragment_escapes_alt_text() {
        let raster = Raster::filled(1, 1, Rgba::new(1, 2, 3, 255));
        let opts = FragmentOptions {
            background: None,
            alt_text: "a \"b\" <c>".to_string(),
        };
        let html = embeddable_fragment(&raster, &opts).unwrap();
        assert!(html.contains("alt=\"a &quot;b&quot; &lt;c&gt;\""));
    }

    #[test]
    fn test_unsupported_depth_propagates() {
        let mut raster = Raster::filled(1, 1, Rgba::new(0, 0, 0, 255));
        for i in 0..300u32 {
            raster.allocate(Rgba::new((i % 256) as u8, (i / 256) as u8, 0, 255));
        }
        assert!(matches!(
            raster_bytes(&raster, "x.png"),
            Err(WaveformError::UnsupportedColorDepth(_))
        ));
        assert!(matches!(
            embeddable_fragment(&raster, &options(None)),
            Err(WaveformError::UnsupportedColorDepth(_))
        ));
    }
}
