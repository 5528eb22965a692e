//! Entry List Rendering
//!
//! Draws the browser listing: one line per entry, top to bottom, with the
//! full path as text. The selected entry is larger and highlighted, other
//! rows are colored by type. Text uses the built-in mono fonts, scaled by an
//! integer factor to reach the height of each zoom tier.

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    mono_font::{ascii::*, MonoFont, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::Rectangle,
    text::{Baseline, Text},
    Pixel,
};

use crate::browser::{BrowserState, ZoomLevel};
use crate::listing::Entry;

/// Media center palette
pub mod colors {
    use embedded_graphics::pixelcolor::Rgb888;

    pub const BACKGROUND: Rgb888 = Rgb888::new(0, 0, 0);
    pub const FILE: Rgb888 = Rgb888::new(0, 255, 0);
    pub const DIRECTORY: Rgb888 = Rgb888::new(255, 0, 0);
    pub const SELECTED: Rgb888 = Rgb888::new(255, 64, 255);
}

use colors::*;

/// A mono font drawn at an integer multiple of its native size
#[derive(Clone, Copy)]
pub struct FontTier {
    pub font: &'static MonoFont<'static>,
    pub scale: u32,
}

impl FontTier {
    const fn new(font: &'static MonoFont<'static>, scale: u32) -> Self {
        Self { font, scale }
    }

    /// Height of one line of text on screen.
    pub fn pixel_height(&self) -> u32 {
        self.font.character_size.height * self.scale
    }
}

/// Regular and selected text sizes of one zoom level
#[derive(Clone, Copy)]
pub struct ZoomTiers {
    pub regular: FontTier,
    pub selected: FontTier,
}

impl ZoomTiers {
    pub fn for_zoom(zoom: ZoomLevel) -> Self {
        match zoom {
            // 20 / 26, no mono font scales to 25
            ZoomLevel::Small => Self {
                regular: FontTier::new(&FONT_10X20, 1),
                selected: FontTier::new(&FONT_6X13, 2),
            },
            // 35 / 45
            ZoomLevel::Medium => Self {
                regular: FontTier::new(&FONT_5X7, 5),
                selected: FontTier::new(&FONT_9X15, 3),
            },
            // 50 / 75
            ZoomLevel::Large => Self {
                regular: FontTier::new(&FONT_6X10, 5),
                selected: FontTier::new(&FONT_9X15, 5),
            },
        }
    }
}

/// Draw target adapter that paints every pixel as a `scale` x `scale`
/// block, offset by `origin` on the wrapped target.
pub struct ScaledTarget<'a, D> {
    target: &'a mut D,
    origin: Point,
    scale: u32,
}

impl<'a, D> ScaledTarget<'a, D>
where
    D: DrawTarget<Color = Rgb888>,
{
    pub fn new(target: &'a mut D, origin: Point, scale: u32) -> Self {
        Self {
            target,
            origin,
            scale: scale.max(1),
        }
    }
}

impl<D> OriginDimensions for ScaledTarget<'_, D>
where
    D: DrawTarget<Color = Rgb888>,
{
    fn size(&self) -> Size {
        let size = self.target.bounding_box().size;
        Size::new(size.width.div_ceil(self.scale), size.height.div_ceil(self.scale))
    }
}

impl<D> DrawTarget for ScaledTarget<'_, D>
where
    D: DrawTarget<Color = Rgb888>,
{
    type Color = Rgb888;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let block = Size::new_equal(self.scale);
        for Pixel(point, color) in pixels {
            let top_left = self.origin + point * self.scale as i32;
            self.target.fill_solid(&Rectangle::new(top_left, block), color)?;
        }
        Ok(())
    }
}

/// Entry list renderer
#[derive(Debug, Default)]
pub struct EntryListRenderer;

impl EntryListRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Clear the display and draw the current listing
    pub fn render<D>(&self, display: &mut D, browser: &BrowserState) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        display.clear(BACKGROUND)?;

        let tiers = ZoomTiers::for_zoom(browser.zoom);
        let bottom = display.bounding_box().bottom_right().map_or(0, |p| p.y + 1);
        let mut cursor = 0;

        for (index, entry) in browser.entries.iter().enumerate() {
            if cursor >= bottom {
                break;
            }
            let (tier, color) = entry_style(&tiers, entry, index == browser.selection);
            self.draw_line(display, &entry.label(), cursor, tier, color)?;
            cursor += tier.pixel_height() as i32;
        }

        Ok(())
    }

    fn draw_line<D>(&self, display: &mut D, text: &str, y: i32, tier: FontTier, color: Rgb888) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let mut scaled = ScaledTarget::new(display, Point::new(0, y), tier.scale);
        let style = MonoTextStyle::new(tier.font, color);
        Text::with_baseline(text, Point::zero(), style, Baseline::Top).draw(&mut scaled)?;
        Ok(())
    }
}

/// Size and color of one row. The selection highlight overrides the type
/// color.
fn entry_style(tiers: &ZoomTiers, entry: &Entry, selected: bool) -> (FontTier, Rgb888) {
    if selected {
        (tiers.selected, SELECTED)
    } else if entry.is_dir {
        (tiers.regular, DIRECTORY)
    } else {
        (tiers.regular, FILE)
    }
}
