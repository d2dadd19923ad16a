//! Image enhancement for handwriting OCR.
//!
//! Each step is a small reusable function; `HandwritingEnhancer` composes them:
//!
//! 1. Validate bytes (size bounds)
//! 2. Decode image
//! 3. `orientation.correct()` — fix EXIF rotation from phone cameras
//! 4. Normalize contrast (percentile histogram stretch)
//! 5. Sharpen (unsharp mask)
//! 6. Convert to grayscale
//! 7. Encode PNG
//!
//! Handwriting photos are usually low-contrast pencil or ink on tinted paper, so unlike
//! printed scans every input is enhanced.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, GrayImage, ImageOutputFormat, Luma, Rgb, RgbImage};
use tracing::debug;

use super::types::{EnhancedImage, ImageEnhancer};
use super::ExtractionError;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Maximum input image size (in bytes) before rejecting.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Minimum valid image size in bytes (smallest valid PNG is ~67 bytes).
const MIN_IMAGE_BYTES: usize = 67;

/// Fraction of darkest / brightest pixels ignored when stretching contrast.
const CONTRAST_CLIP_FRACTION: f32 = 0.01;

/// Gaussian sigma for the unsharp mask. ~1px suits pen strokes at phone resolution.
const SHARPEN_SIGMA: f32 = 1.0;

/// Minimum per-pixel difference before sharpening kicks in (0 = sharpen everything).
const SHARPEN_THRESHOLD: i32 = 0;

// ═══════════════════════════════════════════════════════════
// Service traits
// ═══════════════════════════════════════════════════════════

/// Fixes image orientation from EXIF metadata.
///
/// Phone photos embed rotation in EXIF tag 0x0112; without correction a portrait
/// prescription reaches OCR sideways.
pub trait OrientationCorrector: Send + Sync {
    /// `raw_bytes`: original file bytes (needed for EXIF reading).
    /// Returns the corrected image. No-op if no EXIF or orientation=1.
    fn correct(&self, raw_bytes: &[u8], image: DynamicImage) -> DynamicImage;
}

// ═══════════════════════════════════════════════════════════
// HandwritingEnhancer
// ═══════════════════════════════════════════════════════════

/// Production enhancer: orientation → contrast stretch → sharpen → grayscale → PNG.
pub struct HandwritingEnhancer {
    orientation: Box<dyn OrientationCorrector>,
}

impl HandwritingEnhancer {
    pub fn new(orientation: Box<dyn OrientationCorrector>) -> Self {
        Self { orientation }
    }
}

impl Default for HandwritingEnhancer {
    fn default() -> Self {
        Self::new(Box::new(ExifOrientationCorrector))
    }
}

impl ImageEnhancer for HandwritingEnhancer {
    fn enhance(&self, image_bytes: &[u8]) -> Result<EnhancedImage, ExtractionError> {
        validate_image_bytes(image_bytes)?;

        let img = image::load_from_memory(image_bytes).map_err(|e| {
            ExtractionError::ImageProcessing(format!("Failed to decode image: {e}"))
        })?;
        let img = self.orientation.correct(image_bytes, img);
        let (width, height) = img.dimensions();
        let rgb = img.to_rgb8();

        let stretched = stretch_contrast(&rgb, CONTRAST_CLIP_FRACTION);
        let sharpened = image::imageops::unsharpen(&stretched, SHARPEN_SIGMA, SHARPEN_THRESHOLD);
        let gray = rgb_to_gray(&sharpened);
        let png_bytes = encode_gray_png(&gray)?;

        debug!(
            size = format!("{width}x{height}"),
            contrast_before = compute_contrast_score(&rgb_to_gray(&rgb)),
            contrast_after = compute_contrast_score(&gray),
            png_size = png_bytes.len(),
            "Image enhanced for OCR"
        );

        Ok(EnhancedImage {
            png_bytes,
            width,
            height,
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Orientation
// ═══════════════════════════════════════════════════════════

/// EXIF-based orientation correction for phone photos.
///
/// EXIF orientation values:
/// 1 = Normal, 2 = Mirrored, 3 = 180deg, 4 = Flipped V,
/// 5 = Mirrored + 90deg CW, 6 = 90deg CW, 7 = Mirrored + 270deg CW, 8 = 270deg CW
pub struct ExifOrientationCorrector;

impl OrientationCorrector for ExifOrientationCorrector {
    fn correct(&self, raw_bytes: &[u8], image: DynamicImage) -> DynamicImage {
        let orientation = read_exif_orientation(raw_bytes);
        apply_orientation(image, orientation)
    }
}

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply EXIF orientation transform to a `DynamicImage`.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// No-op orientation corrector — returns image unchanged.
pub struct NoOpOrientationCorrector;

impl OrientationCorrector for NoOpOrientationCorrector {
    fn correct(&self, _raw_bytes: &[u8], image: DynamicImage) -> DynamicImage {
        image
    }
}

// ═══════════════════════════════════════════════════════════
// Pixel operations
// ═══════════════════════════════════════════════════════════

/// ITU-R BT.601 luminance in integer math (exact for gray input).
fn luma(p: &Rgb<u8>) -> u8 {
    let [r, g, b] = p.0;
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000).min(255) as u8
}

/// Convert RGB image to grayscale.
pub fn rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    let mut gray = GrayImage::new(rgb.width(), rgb.height());
    for (x, y, p) in rgb.enumerate_pixels() {
        gray.put_pixel(x, y, Luma([luma(p)]));
    }
    gray
}

/// Stretch contrast so the `clip` darkest/brightest luminance tails map to 0 and 255.
///
/// Uniform images (no luminance spread) are returned unchanged.
pub fn stretch_contrast(rgb: &RgbImage, clip: f32) -> RgbImage {
    let total = (rgb.width() as u64) * (rgb.height() as u64);
    if total == 0 {
        return rgb.clone();
    }

    let mut histogram = [0u64; 256];
    for p in rgb.pixels() {
        histogram[luma(p) as usize] += 1;
    }

    let low_cut = (total as f64 * clip as f64) as u64;
    let high_cut = total - low_cut;

    let mut cumulative = 0u64;
    let mut low = 0u8;
    for (value, count) in histogram.iter().enumerate() {
        cumulative += count;
        if cumulative > low_cut {
            low = value as u8;
            break;
        }
    }

    cumulative = 0;
    let mut high = 255u8;
    for (value, count) in histogram.iter().enumerate() {
        cumulative += count;
        if cumulative >= high_cut {
            high = value as u8;
            break;
        }
    }

    if high <= low {
        return rgb.clone();
    }

    let range = (high - low) as f32;
    let mut out = rgb.clone();
    for p in out.pixels_mut() {
        for channel in p.0.iter_mut() {
            let shifted = (*channel as f32 - low as f32) * 255.0 / range;
            *channel = shifted.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// RMS contrast (0-255). Low contrast < 25, typical document > 50.
pub fn compute_contrast_score(img: &GrayImage) -> f32 {
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0u64;

    for pixel in img.pixels() {
        let val = pixel.0[0] as f64;
        sum += val;
        sum_sq += val * val;
        count += 1;
    }

    if count == 0 {
        return 0.0;
    }

    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64) - (mean * mean);
    variance.max(0.0).sqrt() as f32
}

/// Reject byte buffers that cannot be (or should not be) decoded.
pub fn validate_image_bytes(bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(ExtractionError::ImageProcessing(
            "Image data too small to be valid".into(),
        ));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ExtractionError::ImageProcessing(format!(
            "Image data exceeds {}MB limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

pub fn encode_gray_png(img: &GrayImage) -> Result<Vec<u8>, ExtractionError> {
    let dynamic = DynamicImage::ImageLuma8(img.clone());
    let mut cursor = Cursor::new(Vec::new());
    dynamic
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

// ═══════════════════════════════════════════════════════════
// Test double
// ═══════════════════════════════════════════════════════════

/// Enhancer that hands the input through untouched (or fails on demand).
pub struct PassthroughEnhancer {
    fail: bool,
}

impl PassthroughEnhancer {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for PassthroughEnhancer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageEnhancer for PassthroughEnhancer {
    fn enhance(&self, image_bytes: &[u8]) -> Result<EnhancedImage, ExtractionError> {
        if self.fail {
            return Err(ExtractionError::ImageProcessing(
                "Mock enhancement failure".into(),
            ));
        }
        Ok(EnhancedImage {
            png_bytes: image_bytes.to_vec(),
            width: 0,
            height: 0,
        })
    }
}
