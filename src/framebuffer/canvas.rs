//! In-memory draw target for rendering tests.

use std::convert::Infallible;
use std::ops::Range;

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::{Rgb888, RgbColor},
    Pixel,
};

use super::render::FrameSink;
use super::ui::colors::BACKGROUND;

pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
    pub presents: usize,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![BACKGROUND; (width * height) as usize],
            presents: 0,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb888 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Distinct colors found in the given rows, ordered by (r, g, b).
    pub fn colors_in_rows(&self, rows: Range<u32>) -> Vec<Rgb888> {
        let mut colors: Vec<Rgb888> = Vec::new();
        for y in rows.start..rows.end.min(self.height) {
            for x in 0..self.width {
                let color = self.pixel(x, y);
                if !colors.contains(&color) {
                    colors.push(color);
                }
            }
        }
        colors.sort_by_key(|c| (c.r(), c.g(), c.b()));
        colors
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 && (point.x as u32) < self.width && (point.y as u32) < self.height {
                self.pixels[(point.y as u32 * self.width + point.x as u32) as usize] = color;
            }
        }
        Ok(())
    }
}

impl FrameSink for Canvas {
    fn present(&mut self) {
        self.presents += 1;
    }
}
