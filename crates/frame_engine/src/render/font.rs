//! Built-in 8x8 bitmap font
//!
//! Covers printable ASCII. Glyphs are rasterized once into a white atlas
//! bitmap and drawn as tinted regions, so text honours the canvas transform
//! like any other bitmap.

use crate::foundation::color::Color;
use crate::render::bitmap::Bitmap;
use crate::render::canvas::{Canvas, Region};

/// Glyph cell size in pixels
pub const GLYPH_SIZE: u32 = 8;

const FIRST_GLYPH: u8 = b' ';
const LAST_GLYPH: u8 = b'~';
const FALLBACK_GLYPH: u8 = b'?';

/// Horizontal text alignment relative to the anchor x
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    /// Text starts at x
    #[default]
    Left,
    /// Text is centred on x
    Centre,
    /// Text ends at x
    Right,
}

/// Monospace ASCII font with an embedded glyph table
#[derive(Debug, Clone)]
pub struct BuiltinFont {
    atlas: Bitmap,
}

impl Default for BuiltinFont {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinFont {
    /// Rasterize the glyph table into an atlas
    pub fn new() -> Self {
        let mut atlas = Bitmap::new(GLYPH_SIZE * GLYPHS.len() as u32, GLYPH_SIZE);
        let ink = Color::WHITE.to_premultiplied_argb();

        for (index, rows) in GLYPHS.iter().enumerate() {
            let origin = index as u32 * GLYPH_SIZE;
            for (y, bits) in rows.iter().enumerate() {
                for x in 0..GLYPH_SIZE {
                    // Bit 0 is the leftmost pixel
                    if bits & (1 << x) != 0 {
                        atlas.put_pixel(origin + x, y as u32, ink);
                    }
                }
            }
        }

        log::debug!("Built-in font atlas {}x{}", atlas.width(), atlas.height());
        Self { atlas }
    }

    /// Height of one line of text
    pub fn line_height(&self) -> u32 {
        GLYPH_SIZE
    }

    /// Width of `text` in pixels
    pub fn text_width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * GLYPH_SIZE
    }

    /// The rasterized glyph atlas
    pub fn atlas(&self) -> &Bitmap {
        &self.atlas
    }

    /// Draw one line of text anchored at `(x, y)`
    pub fn draw(&self, canvas: &mut Canvas<'_>, color: Color, x: f32, y: f32, align: Align, text: &str) {
        let width = self.text_width(text) as f32;
        let start_x = match align {
            Align::Left => x,
            Align::Centre => x - (width / 2.0).floor(),
            Align::Right => x - width,
        };

        for (i, ch) in text.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let region = self.glyph_region(ch);
            let pen_x = start_x + (i as u32 * GLYPH_SIZE) as f32;
            canvas.draw_tinted_region(&self.atlas, region, color, pen_x, y);
        }
    }

    fn glyph_region(&self, ch: char) -> Region {
        let code = u8::try_from(ch)
            .ok()
            .filter(|c| (FIRST_GLYPH..=LAST_GLYPH).contains(c))
            .unwrap_or(FALLBACK_GLYPH);
        let index = u32::from(code - FIRST_GLYPH);
        Region::new((index * GLYPH_SIZE) as f32, 0.0, GLYPH_SIZE as f32, GLYPH_SIZE as f32)
    }
}

/// Rows of each glyph from `' '` to `'~'`, top row first
const GLYPHS: [[u8; 8]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x18, 0x3C, 0x3C, 0x18, 0x18, 0x00, 0x18, 0x00], // !
    [0x36, 0x36, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // "
    [0x36, 0x36, 0x7F, 0x36, 0x7F, 0x36, 0x36, 0x00], // #
    [0x0C, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x0C, 0x00], // $
    [0x00, 0x63, 0x33, 0x18, 0x0C, 0x66, 0x63, 0x00], // %
    [0x1C, 0x36, 0x1C, 0x6E, 0x3B, 0x33, 0x6E, 0x00], // &
    [0x06, 0x06, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00], // '
    [0x18, 0x0C, 0x06, 0x06, 0x06, 0x0C, 0x18, 0x00], // (
    [0x06, 0x0C, 0x18, 0x18, 0x18, 0x0C, 0x06, 0x00], // )
    [0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00], // *
    [0x00, 0x0C, 0x0C, 0x3F, 0x0C, 0x0C, 0x00, 0x00], // +
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ,
    [0x00, 0x00, 0x00, 0x3F, 0x00, 0x00, 0x00, 0x00], // -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x00], // .
    [0x60, 0x30, 0x18, 0x0C, 0x06, 0x03, 0x01, 0x00], // /
    [0x3E, 0x63, 0x73, 0x7B, 0x6F, 0x67, 0x3E, 0x00], // 0
    [0x0C, 0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x3F, 0x00], // 1
    [0x1E, 0x33, 0x30, 0x1C, 0x06, 0x33, 0x3F, 0x00], // 2
    [0x1E, 0x33, 0x30, 0x1C, 0x30, 0x33, 0x1E, 0x00], // 3
    [0x38, 0x3C, 0x36, 0x33, 0x7F, 0x30, 0x78, 0x00], // 4
    [0x3F, 0x03, 0x1F, 0x30, 0x30, 0x33, 0x1E, 0x00], // 5
    [0x1C, 0x06, 0x03, 0x1F, 0x33, 0x33, 0x1E, 0x00], // 6
    [0x3F, 0x33, 0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x00], // 7
    [0x1E, 0x33, 0x33, 0x1E, 0x33, 0x33, 0x1E, 0x00], // 8
    [0x1E, 0x33, 0x33, 0x3E, 0x30, 0x18, 0x0E, 0x00], // 9
    [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x00], // :
    [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ;
    [0x18, 0x0C, 0x06, 0x03, 0x06, 0x0C, 0x18, 0x00], // <
    [0x00, 0x00, 0x3F, 0x00, 0x00, 0x3F, 0x00, 0x00], // =
    [0x06, 0x0C, 0x18, 0x30, 0x18, 0x0C, 0x06, 0x00], // >
    [0x1E, 0x33, 0x30, 0x18, 0x0C, 0x00, 0x0C, 0x00], // ?
    [0x3E, 0x63, 0x7B, 0x7B, 0x7B, 0x03, 0x1E, 0x00], // @
    [0x0C, 0x1E, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x00], // A
    [0x3F, 0x66, 0x66, 0x3E, 0x66, 0x66, 0x3F, 0x00], // B
    [0x3C, 0x66, 0x03, 0x03, 0x03, 0x66, 0x3C, 0x00], // C
    [0x1F, 0x36, 0x66, 0x66, 0x66, 0x36, 0x1F, 0x00], // D
    [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x46, 0x7F, 0x00], // E
    [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x06, 0x0F, 0x00], // F
    [0x3C, 0x66, 0x03, 0x03, 0x73, 0x66, 0x7C, 0x00], // G
    [0x33, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x33, 0x00], // H
    [0x1E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // I
    [0x78, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E, 0x00], // J
    [0x67, 0x66, 0x36, 0x1E, 0x36, 0x66, 0x67, 0x00], // K
    [0x0F, 0x06, 0x06, 0x06, 0x46, 0x66, 0x7F, 0x00], // L
    [0x63, 0x77, 0x7F, 0x7F, 0x6B, 0x63, 0x63, 0x00], // M
    [0x63, 0x67, 0x6F, 0x7B, 0x73, 0x63, 0x63, 0x00], // N
    [0x1C, 0x36, 0x63, 0x63, 0x63, 0x36, 0x1C, 0x00], // O
    [0x3F, 0x66, 0x66, 0x3E, 0x06, 0x06, 0x0F, 0x00], // P
    [0x1E, 0x33, 0x33, 0x33, 0x3B, 0x1E, 0x38, 0x00], // Q
    [0x3F, 0x66, 0x66, 0x3E, 0x36, 0x66, 0x67, 0x00], // R
    [0x1E, 0x33, 0x07, 0x0E, 0x38, 0x33, 0x1E, 0x00], // S
    [0x3F, 0x2D, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // T
    [0x33, 0x33, 0x33, 0x33, 0x33, 0x33, 0x3F, 0x00], // U
    [0x33, 0x33, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // V
    [0x63, 0x63, 0x63, 0x6B, 0x7F, 0x77, 0x63, 0x00], // W
    [0x63, 0x63, 0x36, 0x1C, 0x1C, 0x36, 0x63, 0x00], // X
    [0x33, 0x33, 0x33, 0x1E, 0x0C, 0x0C, 0x1E, 0x00], // Y
    [0x7F, 0x63, 0x31, 0x18, 0x4C, 0x66, 0x7F, 0x00], // Z
    [0x1E, 0x06, 0x06, 0x06, 0x06, 0x06, 0x1E, 0x00], // [
    [0x03, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x40, 0x00], // backslash
    [0x1E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x1E, 0x00], // ]
    [0x08, 0x1C, 0x36, 0x63, 0x00, 0x00, 0x00, 0x00], // ^
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF], // _
    [0x0C, 0x0C, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00], // `
    [0x00, 0x00, 0x1E, 0x30, 0x3E, 0x33, 0x6E, 0x00], // a
    [0x07, 0x06, 0x06, 0x3E, 0x66, 0x66, 0x3B, 0x00], // b
    [0x00, 0x00, 0x1E, 0x33, 0x03, 0x33, 0x1E, 0x00], // c
    [0x38, 0x30, 0x30, 0x3E, 0x33, 0x33, 0x6E, 0x00], // d
    [0x00, 0x00, 0x1E, 0x33, 0x3F, 0x03, 0x1E, 0x00], // e
    [0x1C, 0x36, 0x06, 0x0F, 0x06, 0x06, 0x0F, 0x00], // f
    [0x00, 0x00, 0x6E, 0x33, 0x33, 0x3E, 0x30, 0x1F], // g
    [0x07, 0x06, 0x36, 0x6E, 0x66, 0x66, 0x67, 0x00], // h
    [0x0C, 0x00, 0x0E, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // i
    [0x30, 0x00, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E], // j
    [0x07, 0x06, 0x66, 0x36, 0x1E, 0x36, 0x67, 0x00], // k
    [0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // l
    [0x00, 0x00, 0x33, 0x7F, 0x7F, 0x6B, 0x63, 0x00], // m
    [0x00, 0x00, 0x1F, 0x33, 0x33, 0x33, 0x33, 0x00], // n
    [0x00, 0x00, 0x1E, 0x33, 0x33, 0x33, 0x1E, 0x00], // o
    [0x00, 0x00, 0x3B, 0x66, 0x66, 0x3E, 0x06, 0x0F], // p
    [0x00, 0x00, 0x6E, 0x33, 0x33, 0x3E, 0x30, 0x78], // q
    [0x00, 0x00, 0x3B, 0x6E, 0x66, 0x06, 0x0F, 0x00], // r
    [0x00, 0x00, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x00], // s
    [0x08, 0x0C, 0x3E, 0x0C, 0x0C, 0x2C, 0x18, 0x00], // t
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x33, 0x6E, 0x00], // u
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // v
    [0x00, 0x00, 0x63, 0x6B, 0x7F, 0x7F, 0x36, 0x00], // w
    [0x00, 0x00, 0x63, 0x36, 0x1C, 0x36, 0x63, 0x00], // x
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x3E, 0x30, 0x1F], // y
    [0x00, 0x00, 0x3F, 0x19, 0x0C, 0x26, 0x3F, 0x00], // z
    [0x38, 0x0C, 0x0C, 0x07, 0x0C, 0x0C, 0x38, 0x00], // {
    [0x18, 0x18, 0x18, 0x00, 0x18, 0x18, 0x18, 0x00], // |
    [0x07, 0x0C, 0x0C, 0x38, 0x0C, 0x0C, 0x07, 0x00], // }
    [0x6E, 0x3B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ~
];

#[cfg(test)]
mod tests {
    use super::*;

    fn ink_count(bitmap: &Bitmap) -> usize {
        bitmap.pixels().iter().filter(|&&p| p != 0).count()
    }

    #[test]
    fn test_atlas_layout() {
        let font = BuiltinFont::new();
        assert_eq!(font.atlas().size(), (95 * 8, 8));
        assert_eq!(font.line_height(), 8);

        // Space is blank, 'A' is not
        let space_ink = (0..8).flat_map(|y| (0..8).map(move |x| (x, y)))
            .filter(|&(x, y)| font.atlas().pixel(x, y) != Some(0))
            .count();
        assert_eq!(space_ink, 0);
        assert!(ink_count(font.atlas()) > 0);
    }

    #[test]
    fn test_text_width() {
        let font = BuiltinFont::new();
        assert_eq!(font.text_width(""), 0);
        assert_eq!(font.text_width("FPS 60"), 48);
    }

    #[test]
    fn test_draw_text_tints_glyphs() {
        let font = BuiltinFont::new();
        let mut target = Bitmap::new(32, 8);
        font.draw(&mut Canvas::new(&mut target), Color::rgb(1.0, 0.0, 0.0), 0.0, 0.0, Align::Left, "Hi");

        assert!(ink_count(&target) > 0);
        assert!(target.pixels().iter().all(|&p| p == 0 || p == 0xFFFF_0000));
        // Nothing past the second glyph
        assert!((16..32).all(|x| (0..8).all(|y| target.pixel(x, y) == Some(0))));
    }

    #[test]
    fn test_alignment() {
        let font = BuiltinFont::new();

        let mut right = Bitmap::new(32, 8);
        font.draw(&mut Canvas::new(&mut right), Color::WHITE, 32.0, 0.0, Align::Right, "||");
        assert!((0..16).all(|x| (0..8).all(|y| right.pixel(x, y) == Some(0))));
        assert!(ink_count(&right) > 0);

        let mut centre = Bitmap::new(32, 8);
        font.draw(&mut Canvas::new(&mut centre), Color::WHITE, 16.0, 0.0, Align::Centre, "||");
        assert!((0..8).all(|x| (0..8).all(|y| centre.pixel(x, y) == Some(0))));
        assert!((24..32).all(|x| (0..8).all(|y| centre.pixel(x, y) == Some(0))));
        assert!(ink_count(&centre) > 0);
    }

    #[test]
    fn test_unknown_characters_fall_back() {
        let font = BuiltinFont::new();
        let mut fallback = Bitmap::new(8, 8);
        let mut question = Bitmap::new(8, 8);
        font.draw(&mut Canvas::new(&mut fallback), Color::WHITE, 0.0, 0.0, Align::Left, "é");
        font.draw(&mut Canvas::new(&mut question), Color::WHITE, 0.0, 0.0, Align::Left, "?");
        assert_eq!(fallback, question);
    }
}
