//! In-memory packed-bit frame buffer.
//!
//! Pixels are stored the way the controller's display memory is laid out:
//! each byte covers one column of an 8-row band, with bit 0 at the top.
//!
//! ```text
//!            x = 0      x = 1            x = 127
//! band 0   [b0..b7]   [b0..b7]   ...   [b0..b7]     y = 0..7
//! band 1   [b0..b7]   [b0..b7]   ...   [b0..b7]     y = 8..15
//!   ...
//! band 7   [b0..b7]   [b0..b7]   ...   [b0..b7]     y = 56..63
//! ```

use core::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Dimensions, OriginDimensions, Size},
    pixelcolor::BinaryColor,
    primitives::{PointsIter, Rectangle},
    Pixel,
};

use crate::commands::{HEIGHT, HEIGHT_BYTES, WIDTH};

/// How a pixel write changes the stored bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelOp {
    /// Light the pixel.
    Set,
    /// Darken the pixel.
    Clear,
    /// Flip the pixel.
    Invert,
}

impl From<BinaryColor> for PixelOp {
    fn from(color: BinaryColor) -> Self {
        match color {
            BinaryColor::On => PixelOp::Set,
            BinaryColor::Off => PixelOp::Clear,
        }
    }
}

/// One row band: `WIDTH` bytes, each holding 8 vertically stacked pixels.
pub type Row = [u8; WIDTH];

/// 128×64 monochrome frame buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    rows: [Row; HEIGHT_BYTES],
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    /// A buffer with every pixel clear.
    pub const fn new() -> Self {
        Self {
            rows: [[0; WIDTH]; HEIGHT_BYTES],
        }
    }

    /// Byte position and bit mask for `(x, y)`, or `None` if off-screen.
    fn locate(x: i32, y: i32) -> Option<(usize, usize, u8)> {
        if x < 0 || y < 0 || x >= WIDTH as i32 || y >= HEIGHT as i32 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        Some((y / 8, x, 1 << (y % 8)))
    }

    /// Apply `op` to the pixel at `(x, y)`.
    ///
    /// Coordinates outside the display are silently ignored, which lets
    /// drawing code run shapes off the edge without pre-clipping.
    pub fn set_pixel(&mut self, x: i32, y: i32, op: PixelOp) {
        let Some((band, col, mask)) = Self::locate(x, y) else {
            return;
        };
        let byte = &mut self.rows[band][col];
        match op {
            PixelOp::Set => *byte |= mask,
            PixelOp::Clear => *byte &= !mask,
            PixelOp::Invert => *byte ^= mask,
        }
    }

    /// Read back a pixel. `None` outside the display.
    pub fn pixel(&self, x: i32, y: i32) -> Option<bool> {
        Self::locate(x, y).map(|(band, col, mask)| self.rows[band][col] & mask != 0)
    }

    /// Clear every pixel.
    pub fn clear(&mut self) {
        self.rows = [[0; WIDTH]; HEIGHT_BYTES];
    }

    /// Row bands from top to bottom, ready for transfer.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &Row> + '_ {
        self.rows.iter()
    }

    /// The whole buffer, band-major.
    pub fn as_bytes(&self) -> &[u8] {
        self.rows.as_flattened()
    }
}

impl core::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let lit = self.as_bytes().iter().map(|b| b.count_ones()).sum::<u32>();
        f.debug_struct("Framebuffer")
            .field("width", &WIDTH)
            .field("height", &HEIGHT)
            .field("lit_pixels", &lit)
            .finish()
    }
}

// ── Pixel surface ────────────────────────────────────────────────────────

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color.into());
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let op = PixelOp::from(color);
        for point in area.points() {
            self.set_pixel(point.x, point.y, op);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = match color {
            BinaryColor::On => 0xFF,
            BinaryColor::Off => 0x00,
        };
        self.rows = [[fill; WIDTH]; HEIGHT_BYTES];
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
