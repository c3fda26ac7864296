//! Image normalization: decode, convert to RGB, resize, optionally
//! quantize, encode.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Decode | `image::load_from_memory` (format sniffed from bytes) |
//! | Colour mode | `DynamicImage::to_rgb8` |
//! | Resize | `image::imageops::resize` with `Lanczos3` |
//! | Crop (palette) | `image::imageops::crop_imm` |
//! | Encode | `JpegEncoder` (quality) or `PngEncoder` |
//!
//! Everything here is synchronous and CPU bound; callers run it on the
//! blocking pool.

use crate::error::IngestError;
use crate::ingest::IngestOptions;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Seven-colour display palette. Order matters: ties go to the earlier entry.
pub const PALETTE: [[u8; 3]; 7] = [
    [0, 0, 0],       // black
    [255, 255, 255], // white
    [255, 0, 0],     // red
    [0, 255, 0],     // green
    [0, 0, 255],     // blue
    [255, 255, 0],   // yellow
    [255, 128, 0],   // orange
];

/// How an ingested image is shaped before encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizePolicy {
    /// Proportional downscale into `max_dimension`, full colour
    #[default]
    Standard,
    /// Exact display size, mapped onto [`PALETTE`]
    Palette,
}

impl FromStr for NormalizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(NormalizePolicy::Standard),
            "palette" => Ok(NormalizePolicy::Palette),
            other => Err(format!("Unknown normalization mode: {}", other)),
        }
    }
}

/// Encoded file format written to the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    /// Whether decoded pixels match the encoded ones exactly
    pub fn is_lossless(self) -> bool {
        matches!(self, OutputFormat::Png)
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Dimensions after fitting `source` into a `max × max` box.
///
/// Never upscales; the aspect ratio is kept and neither side drops below 1.
pub fn fit_within(source: (u32, u32), max: u32) -> (u32, u32) {
    let (w, h) = source;
    let longest = w.max(h);
    if longest <= max {
        return source;
    }

    let scale = max as f64 / longest as f64;
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max);
    (scaled(w), scaled(h))
}

/// Centered region of `source` with the aspect ratio of `target`, as
/// `(x, y, width, height)`.
///
/// The region is at most the source size and never smaller than 1×1, so
/// scaling it to `target` touches no more pixels than the source has.
pub fn cover_crop(source: (u32, u32), target: (u32, u32)) -> (u32, u32, u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    // Compare src_w / src_h against tgt_w / tgt_h without rounding
    if src_w as u64 * tgt_h as u64 > tgt_w as u64 * src_h as u64 {
        let w = ((src_h as f64 * tgt_w as f64 / tgt_h as f64).round() as u32).clamp(1, src_w);
        ((src_w - w) / 2, 0, w, src_h)
    } else {
        let h = ((src_w as f64 * tgt_h as f64 / tgt_w as f64).round() as u32).clamp(1, src_h);
        (0, (src_h - h) / 2, src_w, h)
    }
}

/// Nearest palette colour by squared RGB distance; first match wins ties
pub(crate) fn nearest_palette_color(pixel: [u8; 3]) -> [u8; 3] {
    let distance = |color: &[u8; 3]| -> u32 {
        pixel
            .iter()
            .zip(color)
            .map(|(&a, &b)| {
                let d = a as i32 - b as i32;
                (d * d) as u32
            })
            .sum()
    };

    let mut best = PALETTE[0];
    let mut best_distance = distance(&best);
    for color in &PALETTE[1..] {
        let d = distance(color);
        if d < best_distance {
            best = *color;
            best_distance = d;
        }
    }
    best
}

/// Decode `bytes`, apply `policy` and encode with the configured format
pub(crate) fn normalize(
    bytes: &[u8],
    policy: NormalizePolicy,
    options: &IngestOptions,
) -> Result<Vec<u8>, IngestError> {
    if policy == NormalizePolicy::Palette && !options.format.is_lossless() {
        return Err(IngestError::LossyPalette(options.format));
    }

    let decoded = image::load_from_memory(bytes).map_err(IngestError::Decode)?;
    let rgb = decoded.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(IngestError::Transform("image has no pixels".to_string()));
    }

    let shaped = match policy {
        NormalizePolicy::Standard => downscale(rgb, options.max_dimension)?,
        NormalizePolicy::Palette => {
            let mut img = cover_and_crop(&rgb, options.display_width, options.display_height)?;
            for pixel in img.pixels_mut() {
                *pixel = Rgb(nearest_palette_color(pixel.0));
            }
            img
        }
    };

    encode(&shaped, options.format, options.quality)
}

fn downscale(img: RgbImage, max: u32) -> Result<RgbImage, IngestError> {
    if max == 0 {
        return Err(IngestError::Transform(
            "maximum dimension must be positive".to_string(),
        ));
    }

    let (w, h) = fit_within(img.dimensions(), max);
    if (w, h) == img.dimensions() {
        return Ok(img);
    }
    Ok(imageops::resize(&img, w, h, FilterType::Lanczos3))
}

fn cover_and_crop(img: &RgbImage, width: u32, height: u32) -> Result<RgbImage, IngestError> {
    if width == 0 || height == 0 {
        return Err(IngestError::Transform(
            "display dimensions must be positive".to_string(),
        ));
    }

    let (x, y, w, h) = cover_crop(img.dimensions(), (width, height));
    let cropped = imageops::crop_imm(img, x, y, w, h).to_image();
    if cropped.dimensions() == (width, height) {
        return Ok(cropped);
    }
    Ok(imageops::resize(&cropped, width, height, FilterType::Lanczos3))
}

fn encode(img: &RgbImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>, IngestError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut buf, quality)
            .encode_image(img)
            .map_err(IngestError::Encode)?,
        OutputFormat::Png => PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
            .map_err(IngestError::Encode)?,
    }
    Ok(buf)
}
