//! Software drawing onto a bitmap target
//!
//! A [`Canvas`] borrows the bitmap it draws into and carries the current
//! transform. Bitmap drawing maps every covered target pixel back into the
//! source through the inverse transform and samples the nearest texel, so
//! scaling and any other affine transform go through the same path.

use crate::foundation::color::{blend_over, tint_pixel, Color};
use crate::foundation::math::Transform2D;
use crate::render::bitmap::Bitmap;
use crate::render::font::{Align, BuiltinFont};

/// Source rectangle in bitmap pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Region {
    /// Create a region
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// The whole of `bitmap`
    pub fn of(bitmap: &Bitmap) -> Self {
        Self::new(0.0, 0.0, bitmap.width() as f32, bitmap.height() as f32)
    }

    fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Drawing target plus the current transform
pub struct Canvas<'a> {
    target: &'a mut Bitmap,
    transform: Transform2D,
}

impl<'a> Canvas<'a> {
    /// Draw into `target` with the identity transform
    pub fn new(target: &'a mut Bitmap) -> Self {
        Self {
            target,
            transform: Transform2D::identity(),
        }
    }

    /// Target width in pixels
    pub fn width(&self) -> u32 {
        self.target.width()
    }

    /// Target height in pixels
    pub fn height(&self) -> u32 {
        self.target.height()
    }

    /// Read-only view of the target
    pub fn target(&self) -> &Bitmap {
        &*self.target
    }

    /// Current transform
    pub fn transform(&self) -> Transform2D {
        self.transform
    }

    /// Replace the current transform
    pub fn use_transform(&mut self, transform: Transform2D) {
        self.transform = transform;
    }

    /// Fill the whole target, ignoring the transform
    pub fn clear_to_color(&mut self, color: Color) {
        self.target.fill(color);
    }

    /// Draw `bitmap` with its top-left corner at `(x, y)`
    pub fn draw_bitmap(&mut self, bitmap: &Bitmap, x: f32, y: f32) {
        self.draw_tinted_region(bitmap, Region::of(bitmap), Color::WHITE, x, y);
    }

    /// Draw part of `bitmap` at `(x, y)`, multiplied by `tint`
    pub fn draw_tinted_region(&mut self, bitmap: &Bitmap, region: Region, tint: Color, x: f32, y: f32) {
        self.blit(bitmap, region, Transform2D::translation(x, y), tint);
    }

    /// Draw the `src` region of `bitmap` stretched over the `dst` region
    pub fn draw_scaled_bitmap(&mut self, bitmap: &Bitmap, src: Region, dst: Region) {
        if src.is_empty() || dst.is_empty() {
            return;
        }
        let placement = Transform2D::scaling(dst.width / src.width, dst.height / src.height)
            .translate(dst.x, dst.y);
        self.blit(bitmap, src, placement, Color::WHITE);
    }

    /// Draw a line of text with the given font
    pub fn draw_text(&mut self, font: &BuiltinFont, color: Color, x: f32, y: f32, align: Align, text: &str) {
        font.draw(self, color, x, y, align, text);
    }

    /// Core blit: `placement` maps region-local coordinates into canvas
    /// coordinates, before the canvas transform
    fn blit(&mut self, bitmap: &Bitmap, region: Region, placement: Transform2D, tint: Color) {
        if region.is_empty() || bitmap.is_empty() || self.target.is_empty() {
            return;
        }

        let full = placement.then(&self.transform);
        let Some(inverse) = full.inverse() else {
            return;
        };

        let Some((x0, y0, x1, y1)) = self.covered_pixels(&full, region) else {
            return;
        };

        let src_w = i64::from(bitmap.width());
        let src_h = i64::from(bitmap.height());

        for ty in y0..y1 {
            for tx in x0..x1 {
                let (u, v) = inverse.transform_point(tx as f32 + 0.5, ty as f32 + 0.5);
                if u < 0.0 || v < 0.0 || u >= region.width || v >= region.height {
                    continue;
                }

                let sx = (region.x + u).floor() as i64;
                let sy = (region.y + v).floor() as i64;
                if sx < 0 || sy < 0 || sx >= src_w || sy >= src_h {
                    continue;
                }

                let Some(texel) = bitmap.pixel(sx as u32, sy as u32) else {
                    continue;
                };
                let src = tint_pixel(texel, tint);
                if let Some(dst) = self.target.pixel(tx, ty) {
                    self.target.put_pixel(tx, ty, blend_over(src, dst));
                }
            }
        }
    }

    /// Target pixel bounds touched by the transformed region, clipped
    fn covered_pixels(&self, full: &Transform2D, region: Region) -> Option<(u32, u32, u32, u32)> {
        let corners = [
            full.transform_point(0.0, 0.0),
            full.transform_point(region.width, 0.0),
            full.transform_point(0.0, region.height),
            full.transform_point(region.width, region.height),
        ];

        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for (x, y) in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let clamp_x = |v: f32| v.clamp(0.0, self.target.width() as f32) as u32;
        let clamp_y = |v: f32| v.clamp(0.0, self.target.height() as f32) as u32;

        let (x0, x1) = (clamp_x(min_x.floor()), clamp_x(max_x.ceil()));
        let (y0, y1) = (clamp_y(min_y.floor()), clamp_y(max_y.ceil()));

        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}
