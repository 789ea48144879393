use image::{DynamicImage, GrayImage};
use std::io::Cursor;
use thiserror::Error;

/// Screenshots larger than this on either side are scaled down before OCR.
const MAX_SIDE: u32 = 2800;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Decode an uploaded screenshot (JPEG / PNG / GIF / WEBP), convert it to
/// dark-on-light high-contrast grayscale and return PNG bytes for the local
/// OCR engine.
pub fn prepare_for_ocr(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_as_png(normalize(img))
}

fn normalize(img: DynamicImage) -> DynamicImage {
    let img = if img.width() > MAX_SIDE || img.height() > MAX_SIDE {
        img.resize(MAX_SIDE, MAX_SIDE, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    let mut gray: GrayImage = img.to_luma8();
    let levels = Histogram::of(&gray).levels();
    for p in gray.pixels_mut() {
        p[0] = levels[usize::from(p[0])];
    }
    DynamicImage::ImageLuma8(gray)
}

/// Count of pixels at each luma value.
struct Histogram([u64; 256]);

impl Histogram {
    fn of(img: &GrayImage) -> Self {
        let mut counts = [0u64; 256];
        for p in img.pixels() {
            counts[usize::from(p[0])] += 1;
        }
        Histogram(counts)
    }

    /// Dark-mode bill lists are mostly dark background with light text.
    fn is_dark_mode(&self) -> bool {
        let (sum, total) = self
            .0
            .iter()
            .enumerate()
            .fold((0u64, 0u64), |(sum, total), (luma, &n)| (sum + luma as u64 * n, total + n));
        total > 0 && sum < 128 * total
    }

    fn bounds(&self) -> Option<(u8, u8)> {
        let darkest = self.0.iter().position(|&n| n > 0)?;
        let brightest = self.0.iter().rposition(|&n| n > 0)?;
        Some((darkest as u8, brightest as u8))
    }

    /// Lookup table that stretches the used range to 0..=255 and, for dark
    /// mode, flips it so text ends up dark on a light background.
    fn levels(&self) -> [u8; 256] {
        let invert = self.is_dark_mode();
        let bounds = self.bounds().filter(|(lo, hi)| lo < hi);
        let mut table = [0u8; 256];
        for (luma, out) in table.iter_mut().enumerate() {
            let stretched = match bounds {
                Some((lo, hi)) => {
                    let clamped = (luma as u32).clamp(u32::from(lo), u32::from(hi));
                    ((clamped - u32::from(lo)) * 255 / u32::from(hi - lo)) as u8
                }
                // Flat images have nothing to stretch.
                None => luma as u8,
            };
            *out = if invert { 255 - stretched } else { stretched };
        }
        table
    }
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
