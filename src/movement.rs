//! Persistent-direction random walk with reflective arena boundaries.

use crate::error::{SimError, SimResult};
use contagion_common::{SimParams, Vec2};
use rand::rngs::StdRng;
use rand::Rng;
use std::ops::RangeInclusive;

/// The eight compass headings. Screen coordinates: "top" is negative y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Top,
    TopLeft,
    Left,
    BottomLeft,
    Bottom,
    BottomRight,
    Right,
    TopRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Top,
        Direction::TopLeft,
        Direction::Left,
        Direction::BottomLeft,
        Direction::Bottom,
        Direction::BottomRight,
        Direction::Right,
        Direction::TopRight,
    ];

    /// Sign of travel on each axis, each in {-1, 0, 1}.
    pub fn axes(self) -> (i8, i8) {
        match self {
            Direction::Top => (0, -1),
            Direction::TopLeft => (-1, -1),
            Direction::Left => (-1, 0),
            Direction::BottomLeft => (-1, 1),
            Direction::Bottom => (0, 1),
            Direction::BottomRight => (1, 1),
            Direction::Right => (1, 0),
            Direction::TopRight => (1, -1),
        }
    }

    /// Inverse of [`Direction::axes`]. `None` for the null heading.
    pub fn from_axes(x: i8, y: i8) -> Option<Direction> {
        match (x.signum(), y.signum()) {
            (0, -1) => Some(Direction::Top),
            (-1, -1) => Some(Direction::TopLeft),
            (-1, 0) => Some(Direction::Left),
            (-1, 1) => Some(Direction::BottomLeft),
            (0, 1) => Some(Direction::Bottom),
            (1, 1) => Some(Direction::BottomRight),
            (1, 0) => Some(Direction::Right),
            (1, -1) => Some(Direction::TopRight),
            _ => None,
        }
    }
}

/// Strategy producing an entity's per-tick displacement.
///
/// Implementations only decide; the caller owns the position and applies the step.
pub trait MovementPolicy: Send + std::fmt::Debug {
    fn compute_step(&mut self, position: Vec2, radius: f32, bounds: Vec2, rng: &mut StdRng) -> Vec2;

    /// Current heading, if the policy has one.
    fn heading(&self) -> Option<Direction> {
        None
    }
}

/// Outcome of moving along one axis.
struct AxisStep {
    sign: i8,
    reflected: bool,
}

/// Keeps travelling with `sign` on one axis, reversing when within `margin` of the edge ahead.
fn axis_step(sign: i8, coord: f32, radius: f32, extent: f32, margin: f32) -> AxisStep {
    let blocked = match sign {
        s if s < 0 => coord <= radius + margin,
        s if s > 0 => coord >= extent - radius - margin,
        _ => false,
    };
    if blocked {
        AxisStep { sign: -sign, reflected: true }
    } else {
        AxisStep { sign, reflected: false }
    }
}

/// Walks in one heading for a random number of ticks, then picks a new heading.
/// Bouncing off a wall mirrors the heading on the reflected axes.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    direction: Direction,
    speed: f32,
    remaining: u32,
    directions: Vec<Direction>,
    cooldown: RangeInclusive<u32>,
}

/// Ticks before the first redraw of a fresh walk.
const INITIAL_REMAINING: u32 = 2;

impl RandomWalk {
    /// Walk over all eight headings with the cooldown range from `params`.
    pub fn from_params(params: &SimParams, rng: &mut StdRng) -> SimResult<Self> {
        Self::with_directions(
            params.speed,
            Direction::ALL.to_vec(),
            params.cooldown_min..=params.cooldown_max,
            rng,
        )
    }

    /// Walk restricted to `directions`, drawing the initial heading from them.
    pub fn with_directions(
        speed: f32,
        directions: Vec<Direction>,
        cooldown: RangeInclusive<u32>,
        rng: &mut StdRng,
    ) -> SimResult<Self> {
        if directions.is_empty() {
            return Err(SimError::InvalidConfig("movement direction set is empty".into()));
        }
        if !(speed > 0.0) {
            return Err(SimError::InvalidConfig(format!("movement speed must be positive, got {}", speed)));
        }
        if cooldown.is_empty() {
            return Err(SimError::InvalidConfig(format!(
                "direction cooldown range {}..={} is empty",
                cooldown.start(),
                cooldown.end()
            )));
        }
        let direction = directions[rng.random_range(0..directions.len())];
        Ok(Self {
            direction,
            speed,
            remaining: INITIAL_REMAINING,
            directions,
            cooldown,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Ticks left before a new heading is drawn.
    pub fn remaining_steps(&self) -> u32 {
        self.remaining
    }

    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    fn draw_cooldown(&self, rng: &mut StdRng) -> u32 {
        rng.random_range(self.cooldown.clone())
    }
}

impl MovementPolicy for RandomWalk {
    fn compute_step(&mut self, position: Vec2, radius: f32, bounds: Vec2, rng: &mut StdRng) -> Vec2 {
        if self.remaining == 0 {
            self.remaining = self.draw_cooldown(rng);
            self.direction = self.directions[rng.random_range(0..self.directions.len())];
        } else {
            self.remaining -= 1;
        }

        // Edge slack is twice the step, not the exact radius
        let margin = self.speed * 2.0;
        let (sx, sy) = self.direction.axes();
        let x = axis_step(sx, position.x, radius, bounds.x, margin);
        let y = axis_step(sy, position.y, radius, bounds.y, margin);

        if x.reflected || y.reflected {
            if let Some(direction) = Direction::from_axes(x.sign, y.sign) {
                self.direction = direction;
            }
            self.remaining = self.draw_cooldown(rng);
        }

        let mut step = Vec2::new(x.sign as f32 * self.speed, y.sign as f32 * self.speed);
        if step.is_zero() {
            step = Vec2::new(self.speed, self.speed);
        }
        step
    }

    fn heading(&self) -> Option<Direction> {
        Some(self.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const BOUNDS: Vec2 = Vec2 { x: 800.0, y: 600.0 };
    const CENTER: Vec2 = Vec2 { x: 400.0, y: 300.0 };

    fn walk(direction: Direction, rng: &mut StdRng) -> RandomWalk {
        RandomWalk::with_directions(5.0, vec![direction], 6..=9, rng).unwrap()
    }

    #[test]
    fn test_axes_round_trip() {
        for direction in Direction::ALL {
            let (x, y) = direction.axes();
            assert_eq!(Direction::from_axes(x, y), Some(direction));
        }
        assert_eq!(Direction::from_axes(0, 0), None);
    }

    #[test]
    fn test_free_step_follows_heading() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut policy = walk(Direction::TopLeft, &mut rng);
        let step = policy.compute_step(CENTER, 10.0, BOUNDS, &mut rng);
        assert_eq!(step, Vec2::new(-5.0, -5.0));
        assert_eq!(policy.direction(), Direction::TopLeft);
        assert_eq!(policy.remaining_steps(), INITIAL_REMAINING - 1);
    }

    #[test]
    fn test_reflect_single_axis_keeps_other() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut policy = walk(Direction::TopLeft, &mut rng);
        // Near the left wall only: 10 + 5*2 = 20
        let step = policy.compute_step(Vec2::new(20.0, 300.0), 10.0, BOUNDS, &mut rng);
        assert_eq!(step, Vec2::new(5.0, -5.0));
        assert_eq!(policy.direction(), Direction::TopRight);
        assert!((6..=9).contains(&policy.remaining_steps()));
    }

    #[test]
    fn test_reflect_corner_flips_both_axes() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut policy = walk(Direction::BottomRight, &mut rng);
        let step = policy.compute_step(Vec2::new(780.0, 580.0), 10.0, BOUNDS, &mut rng);
        assert_eq!(step, Vec2::new(-5.0, -5.0));
        assert_eq!(policy.direction(), Direction::TopLeft);
    }

    #[test]
    fn test_reflect_straight_heading() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut policy = walk(Direction::Top, &mut rng);
        let step = policy.compute_step(Vec2::new(400.0, 12.0), 10.0, BOUNDS, &mut rng);
        assert_eq!(step, Vec2::new(0.0, 5.0));
        assert_eq!(policy.direction(), Direction::Bottom);
    }

    #[test]
    fn test_heading_persists_for_drawn_cooldown() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut policy = RandomWalk::from_params(
            &SimParams {
                world_width: BOUNDS.x,
                world_height: BOUNDS.y,
                radius: 10.0,
                speed: 1.0,
                tick_interval_ms: 0.0,
                outbreak_threshold: 23,
                transmission_probability: 0.8,
                cooldown_min: 6,
                cooldown_max: 9,
                seed: 5,
            },
            &mut rng,
        )
        .unwrap();

        // Burn the initial countdown until a fresh cooldown is drawn
        let mut position = CENTER;
        for _ in 0..=INITIAL_REMAINING {
            position += policy.compute_step(position, 10.0, BOUNDS, &mut rng);
        }
        let drawn = policy.remaining_steps();
        assert!((6..=9).contains(&drawn));

        let heading = policy.direction();
        for left in (0..drawn).rev() {
            position += policy.compute_step(position, 10.0, BOUNDS, &mut rng);
            assert_eq!(policy.direction(), heading);
            assert_eq!(policy.remaining_steps(), left);
        }
    }

    #[test]
    fn test_same_seed_same_steps() {
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut policy = RandomWalk::with_directions(5.0, Direction::ALL.to_vec(), 6..=9, &mut rng).unwrap();
            let mut position = CENTER;
            let mut steps = Vec::new();
            for _ in 0..200 {
                let step = policy.compute_step(position, 10.0, BOUNDS, &mut rng);
                position += step;
                steps.push(step);
            }
            steps
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_step_never_zero_and_stays_in_arena() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut policy = RandomWalk::with_directions(5.0, Direction::ALL.to_vec(), 6..=9, &mut rng).unwrap();
        let radius = 10.0;
        let mut position = CENTER;
        for _ in 0..5_000 {
            let step = policy.compute_step(position, radius, BOUNDS, &mut rng);
            assert!(!step.is_zero());
            position += step;
            // One step past the edge margin at most
            assert!(position.x >= radius - 5.0 && position.x <= BOUNDS.x - radius + 5.0);
            assert!(position.y >= radius - 5.0 && position.y <= BOUNDS.y - radius + 5.0);
        }
    }

    #[test]
    fn test_rejects_empty_direction_set() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = RandomWalk::with_directions(5.0, Vec::new(), 6..=9, &mut rng);
        assert!(matches!(result, Err(SimError::InvalidConfig(_))));
    }
}
