//! RGBA colors and pixel packing
//!
//! Bitmaps store premultiplied `0xAARRGGBB` pixels. `Color` is the
//! straight-alpha, floating point form used by drawing calls.

/// Straight-alpha RGBA color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
    /// Alpha component
    pub a: f32,
}

impl Color {
    /// The dark grey perceived in total darkness
    pub const EIGENGRAU: Self = Self::rgba(0.086_274_51, 0.086_274_51, 0.113_725_49, 1.0);

    /// Opaque white
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    /// Opaque black
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    /// Fully transparent black
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// Create a color from float components
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from float components
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Create a color from 8-bit straight-alpha components
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    /// Pack into a premultiplied `0xAARRGGBB` pixel
    pub fn to_premultiplied_argb(self) -> u32 {
        let a = self.a.clamp(0.0, 1.0);
        let channel = |c: f32| u32::from(to_byte(c.clamp(0.0, 1.0) * a));
        (u32::from(to_byte(a)) << 24) | (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Unpack a premultiplied `0xAARRGGBB` pixel
    pub fn from_premultiplied_argb(pixel: u32) -> Self {
        let [a, r, g, b] = pixel.to_be_bytes();
        if a == 0 {
            return Self::TRANSPARENT;
        }
        let alpha = f32::from(a) / 255.0;
        let channel = |c: u8| (f32::from(c) / 255.0 / alpha).min(1.0);
        Self::rgba(channel(r), channel(g), channel(b), alpha)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

fn to_byte(value: f32) -> u8 {
    (value * 255.0).round() as u8
}

/// Premultiply 8-bit straight RGBA into an `0xAARRGGBB` pixel
pub fn premultiply_rgba8(rgba: [u8; 4]) -> u32 {
    let [r, g, b, a] = rgba;
    let scale = |c: u8| (u32::from(c) * u32::from(a) + 127) / 255;
    (u32::from(a) << 24) | (scale(r) << 16) | (scale(g) << 8) | scale(b)
}

/// Composite a premultiplied source pixel over a premultiplied destination
///
/// `dst = src + dst * (1 - src_alpha)`
pub fn blend_over(src: u32, dst: u32) -> u32 {
    let src_alpha = src >> 24;
    if src_alpha == 0xFF {
        return src;
    }
    if src_alpha == 0 {
        return dst;
    }

    let inverse = 255 - src_alpha;
    let mix = |shift: u32| {
        let s = (src >> shift) & 0xFF;
        let d = (dst >> shift) & 0xFF;
        (s + (d * inverse + 127) / 255).min(255) << shift
    };
    mix(24) | mix(16) | mix(8) | mix(0)
}

/// Multiply a premultiplied pixel by a tint color
pub fn tint_pixel(pixel: u32, tint: Color) -> u32 {
    if tint == Color::WHITE {
        return pixel;
    }
    let factor = |shift: u32, t: f32| {
        let c = ((pixel >> shift) & 0xFF) as f32;
        u32::from(to_byte((c / 255.0) * t.clamp(0.0, 1.0))) << shift
    };
    factor(24, tint.a) | factor(16, tint.r * tint.a) | factor(8, tint.g * tint.a) | factor(0, tint.b * tint.a)
}
