//! Raster implementation of [`Surface`], backed by an in-memory RGBA image.

use crate::assets::Sprite;
use crate::draw::{Color, Surface};
use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut};
use imageproc::rect::Rect;
use std::path::Path;

pub struct RasterSurface {
    image: RgbaImage,
    background: Rgba<u8>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let background = Rgba([255, 255, 255, 255]);
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), background),
            background,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.image
            .save(path)
            .with_context(|| format!("Failed to write frame '{}'", path.display()))
    }

    /// Pixel bounds of the disc's bounding box, clamped to the image.
    fn disc_bounds(&self, x: f32, y: f32, r: f32) -> (u32, u32, u32, u32) {
        let max_x = self.image.width() as f32 - 1.0;
        let max_y = self.image.height() as f32 - 1.0;
        let x0 = (x - r).floor().clamp(0.0, max_x) as u32;
        let y0 = (y - r).floor().clamp(0.0, max_y) as u32;
        let x1 = (x + r).ceil().clamp(0.0, max_x) as u32;
        let y1 = (y + r).ceil().clamp(0.0, max_y) as u32;
        (x0, y0, x1, y1)
    }

    /// Calls `f` for every pixel whose center lies inside the disc.
    fn for_each_in_disc<F>(&mut self, x: f32, y: f32, r: f32, mut f: F)
    where
        F: FnMut(u32, u32, &mut Rgba<u8>),
    {
        if r <= 0.0 {
            return;
        }
        let (x0, y0, x1, y1) = self.disc_bounds(x, y, r);
        let r_sq = r * r;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - x;
                let dy = py as f32 + 0.5 - y;
                if dx * dx + dy * dy <= r_sq {
                    f(px, py, self.image.get_pixel_mut(px, py));
                }
            }
        }
    }
}

fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let alpha = src[3] as f32 / 255.0;
    for c in 0..3 {
        dst[c] = (src[c] as f32 * alpha + dst[c] as f32 * (1.0 - alpha)).round() as u8;
    }
    dst[3] = 255;
}

impl Surface for RasterSurface {
    fn clear_region(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if width < 1.0 || height < 1.0 {
            return;
        }
        let rect = Rect::at(x.floor() as i32, y.floor() as i32).of_size(width as u32, height as u32);
        draw_filled_rect_mut(&mut self.image, rect, self.background);
    }

    fn draw_clipped_circular_sprite(&mut self, sprite: &Sprite, x: f32, y: f32, r: f32) {
        let source = sprite.image();
        if source.width() == 0 || source.height() == 0 {
            return;
        }
        let diameter = 2.0 * r;
        let (left, top) = (x - r, y - r);
        // Nearest-neighbor scale of the sprite onto the disc's bounding box
        self.for_each_in_disc(x, y, r, |px, py, pixel| {
            let u = ((px as f32 + 0.5 - left) / diameter * source.width() as f32) as u32;
            let v = ((py as f32 + 0.5 - top) / diameter * source.height() as f32) as u32;
            let texel = *source.get_pixel(u.min(source.width() - 1), v.min(source.height() - 1));
            blend(pixel, texel);
        });
    }

    fn tint_circle(&mut self, x: f32, y: f32, r: f32, color: Color) {
        self.for_each_in_disc(x, y, r, |_, _, pixel| blend(pixel, Rgba(color)));
    }

    fn stroke_circle(&mut self, x: f32, y: f32, r: f32, color: Color, width: f32) {
        let center = (x.round() as i32, y.round() as i32);
        let rings = width.round().max(1.0) as i32;
        for i in 0..rings {
            let radius = r.round() as i32 - i;
            if radius > 0 {
                draw_hollow_circle_mut(&mut self.image, center, radius, Rgba(color));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{DrawBehavior, PersonSprite, RING_INFECTED};
    use contagion_common::HealthState;

    #[test]
    fn test_sprite_clipped_to_disc() {
        let mut surface = RasterSurface::new(40, 40);
        let sprite = Sprite::new(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255])));
        surface.draw_clipped_circular_sprite(&sprite, 20.0, 20.0, 10.0);
        assert_eq!(*surface.image().get_pixel(20, 20), Rgba([0, 0, 255, 255]));
        // Bounding box corner lies outside the circle
        assert_eq!(*surface.image().get_pixel(11, 11), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_infected_person_is_ringed_red() {
        let mut surface = RasterSurface::new(40, 40);
        PersonSprite.draw(&mut surface, 20.0, 20.0, 10.0, None, HealthState::Infected);
        assert_eq!(*surface.image().get_pixel(30, 20), Rgba(RING_INFECTED));
        // Tint over white keeps full red, lowers green and blue
        let center = surface.image().get_pixel(20, 20);
        assert_eq!(center[0], 255);
        assert!(center[1] < 255);
    }

    #[test]
    fn test_clear_region_restores_background() {
        let mut surface = RasterSurface::new(20, 20);
        surface.tint_circle(10.0, 10.0, 5.0, [0, 0, 0, 255]);
        surface.clear_region(0.0, 0.0, 20.0, 20.0);
        assert_eq!(*surface.image().get_pixel(10, 10), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_disc_partly_outside_image() {
        let mut surface = RasterSurface::new(10, 10);
        surface.tint_circle(0.0, 0.0, 6.0, [0, 0, 0, 255]);
        assert_eq!(*surface.image().get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }
}
