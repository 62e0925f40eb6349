//! CPU-side bitmaps
//!
//! Pixels are premultiplied `0xAARRGGBB`, row-major, no padding. Loading goes
//! through the `image` crate and converts to that layout once.

use std::path::Path;

use crate::foundation::color::{premultiply_rgba8, Color};
use crate::render::AssetError;

/// A rectangular grid of premultiplied ARGB pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Bitmap {
    /// Create a transparent bitmap
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; pixel_count(width, height)],
        }
    }

    /// Create a bitmap filled with one color
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color.to_premultiplied_argb(); pixel_count(width, height)],
        }
    }

    /// Wrap existing premultiplied pixels
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, AssetError> {
        let expected = pixel_count(width, height);
        if pixels.len() != expected {
            return Err(AssetError::InvalidData(format!(
                "{}x{} bitmap needs {} pixels, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// Build from straight-alpha RGBA8 bytes
    pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Result<Self, AssetError> {
        let expected = pixel_count(width, height) * 4;
        if data.len() != expected {
            return Err(AssetError::InvalidData(format!(
                "{}x{} RGBA image needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        let pixels = data
            .chunks_exact(4)
            .map(|px| premultiply_rgba8([px[0], px[1], px[2], px[3]]))
            .collect();
        Ok(Self { width, height, pixels })
    }

    /// Load an image file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();

        log::debug!("Loading bitmap from: {:?}", path_ref);

        let img = image::open(path_ref)
            .map_err(|e| AssetError::LoadFailed(format!("{}: {}", path_ref.display(), e)))?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::info!("Loaded bitmap {}x{} from {:?}", width, height, path_ref);

        Self::from_rgba8(width, height, rgba_img.as_raw())
    }

    /// Decode an image held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to decode bitmap from bytes: {}", e)))?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::debug!("Decoded bitmap {}x{} from memory", width, height);

        Self::from_rgba8(width, height, rgba_img.as_raw())
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the bitmap has no pixels
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Raw pixel rows
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Mutable raw pixel rows
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Read one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Read one pixel as a color
    pub fn color_at(&self, x: u32, y: u32) -> Option<Color> {
        self.pixel(x, y).map(Color::from_premultiplied_argb)
    }

    /// Overwrite one pixel; out-of-range writes are ignored
    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: u32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = pixel;
        }
    }

    /// Fill every pixel with `color`
    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color.to_premultiplied_argb());
    }

    /// Change dimensions, discarding the old contents
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(pixel_count(width, height), 0);
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}
