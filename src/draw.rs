//! Drawing contract between entities and the presentation layer.

use crate::assets::Sprite;
use contagion_common::HealthState;

/// RGBA color, 8 bits per channel.
pub type Color = [u8; 4];

pub const RING_HEALTHY: Color = [0xA9, 0xA9, 0xA9, 255];
pub const RING_INFECTED: Color = [0xB3, 0x17, 0x1C, 255];
/// Red wash over an infected sprite, 30% opacity.
pub const INFECTED_TINT: Color = [255, 0, 0, 77];
pub const RING_WIDTH: f32 = 2.0;

/// Operations a drawing target offers.
pub trait Surface {
    fn clear_region(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Draws `sprite` scaled to the circle's bounding box, clipped to the circle.
    fn draw_clipped_circular_sprite(&mut self, sprite: &Sprite, x: f32, y: f32, r: f32);

    /// Blends `color` over the disc.
    fn tint_circle(&mut self, x: f32, y: f32, r: f32, color: Color);

    fn stroke_circle(&mut self, x: f32, y: f32, r: f32, color: Color, width: f32);
}

/// Strategy drawing one entity. Injected per entity at creation.
pub trait DrawBehavior: Send + Sync + std::fmt::Debug {
    fn draw(
        &self,
        surface: &mut dyn Surface,
        x: f32,
        y: f32,
        r: f32,
        sprite: Option<&Sprite>,
        state: HealthState,
    );
}

/// Ringed sprite for people. Tinted and ringed red once infected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonSprite;

impl DrawBehavior for PersonSprite {
    fn draw(
        &self,
        surface: &mut dyn Surface,
        x: f32,
        y: f32,
        r: f32,
        sprite: Option<&Sprite>,
        state: HealthState,
    ) {
        if let Some(sprite) = sprite {
            surface.draw_clipped_circular_sprite(sprite, x, y, r);
        }
        if state == HealthState::Infected {
            surface.tint_circle(x, y, r, INFECTED_TINT);
        }
        let ring = if state == HealthState::Susceptible { RING_HEALTHY } else { RING_INFECTED };
        surface.stroke_circle(x, y, r, ring, RING_WIDTH);
    }
}

/// Untinted sprite with a red ring, for source entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceSprite;

impl DrawBehavior for SourceSprite {
    fn draw(
        &self,
        surface: &mut dyn Surface,
        x: f32,
        y: f32,
        r: f32,
        sprite: Option<&Sprite>,
        _state: HealthState,
    ) {
        if let Some(sprite) = sprite {
            surface.draw_clipped_circular_sprite(sprite, x, y, r);
        }
        surface.stroke_circle(x, y, r, RING_INFECTED, RING_WIDTH);
    }
}

/// Surface that discards everything. Used for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn clear_region(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) {}
    fn draw_clipped_circular_sprite(&mut self, _sprite: &Sprite, _x: f32, _y: f32, _r: f32) {}
    fn tint_circle(&mut self, _x: f32, _y: f32, _r: f32, _color: Color) {}
    fn stroke_circle(&mut self, _x: f32, _y: f32, _r: f32, _color: Color, _width: f32) {}
}
