//! Participants of the simulation and their contagion operations.

use crate::assets::{AssetLoader, Sprite};
use crate::draw::{DrawBehavior, PersonSprite, SourceSprite, Surface};
use crate::error::{SimError, SimResult};
use crate::events::{EventBus, SimEvent};
use crate::movement::{Direction, MovementPolicy, RandomWalk};
use contagion_common::{EntitySnapshot, HealthState, SimParams, Vec2};
use log::{debug, trace};
use rand::distr::Bernoulli;
use rand::rngs::StdRng;
use rand::Rng;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// Mobile, susceptible until infected.
    Person,
    /// Stationary one-shot transmitter.
    Source,
}

/// Roster line describing one entity to create.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpec {
    pub name: String,
    pub asset: PathBuf,
    pub kind: EntityKind,
    /// Infected as soon as the entity joins the population.
    pub initially_infected: bool,
}

impl EntitySpec {
    pub fn person<S: Into<String>, P: Into<PathBuf>>(name: S, asset: P) -> Self {
        Self {
            name: name.into(),
            asset: asset.into(),
            kind: EntityKind::Person,
            initially_infected: false,
        }
    }

    pub fn source<S: Into<String>, P: Into<PathBuf>>(name: S, asset: P) -> Self {
        Self {
            name: name.into(),
            asset: asset.into(),
            kind: EntityKind::Source,
            initially_infected: false,
        }
    }

    pub fn infected(mut self) -> Self {
        self.initially_infected = true;
        self
    }
}

/// Counters shared by every entity of one population. Reset together on restore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    /// Ids handed out so far; the last assigned id.
    pub entities: u32,
    pub infected: u32,
    /// Whether the completion signal was already raised.
    pub complete: bool,
}

impl Counters {
    pub fn next_id(&mut self) -> u32 {
        self.entities += 1;
        self.entities
    }

    pub fn reset(&mut self) {
        *self = Counters::default();
    }
}

/// Mutable state a contagion or movement operation works against.
pub struct TickContext<'a> {
    pub rng: &'a mut StdRng,
    pub counters: &'a mut Counters,
    pub events: &'a mut EventBus,
    pub transmission: Bernoulli,
    pub outbreak_threshold: u32,
    /// Name whose infection raises no notification.
    pub observer: Option<&'a str>,
}

/// Draws a coordinate in `[radius, extent - radius]`.
/// Draws under `2 * radius` are pulled up to it first, so the low edge is favored.
fn random_coordinate(extent: f32, radius: f32, rng: &mut StdRng) -> f32 {
    let raw = (rng.random::<f32>() * extent).max(radius * 2.0);
    (raw - radius).floor()
}

#[derive(Debug)]
pub struct Entity {
    id: u32,
    name: String,
    kind: EntityKind,
    health: HealthState,
    position: Vec2,
    radius: f32,
    bounds: Vec2,
    movement: Option<Box<dyn MovementPolicy>>,
    draw: Box<dyn DrawBehavior>,
    asset_path: PathBuf,
    sprite: Option<Sprite>,
    initially_infected: bool,
}

impl Entity {
    /// Builds an entity from explicit parts. The sprite is loaded separately with
    /// [`Entity::load_assets`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        name: String,
        kind: EntityKind,
        position: Vec2,
        radius: f32,
        bounds: Vec2,
        movement: Option<Box<dyn MovementPolicy>>,
        draw: Box<dyn DrawBehavior>,
        asset_path: PathBuf,
    ) -> SimResult<Self> {
        if !(radius > 0.0) {
            return Err(SimError::InvalidConfig(format!("radius of '{}' must be positive, got {}", name, radius)));
        }
        let health = match kind {
            EntityKind::Person => HealthState::Susceptible,
            EntityKind::Source => HealthState::Source,
        };
        Ok(Self {
            id,
            name,
            kind,
            health,
            position,
            radius,
            bounds,
            movement,
            draw,
            asset_path,
            sprite: None,
            initially_infected: false,
        })
    }

    /// Creates the entity `spec` describes: next id, random position, and the
    /// movement and draw strategies of its kind.
    pub fn create(spec: &EntitySpec, params: &SimParams, counters: &mut Counters, rng: &mut StdRng) -> SimResult<Self> {
        let radius = params.radius;
        let bounds = Vec2::new(params.world_width, params.world_height);
        let position = Vec2::new(
            random_coordinate(bounds.x, radius, rng),
            random_coordinate(bounds.y, radius, rng),
        );
        let (movement, draw): (Option<Box<dyn MovementPolicy>>, Box<dyn DrawBehavior>) = match spec.kind {
            EntityKind::Person => (Some(Box::new(RandomWalk::from_params(params, rng)?)), Box::new(PersonSprite)),
            EntityKind::Source => (None, Box::new(SourceSprite)),
        };
        let mut entity = Self::new(
            counters.next_id(),
            spec.name.clone(),
            spec.kind,
            position,
            radius,
            bounds,
            movement,
            draw,
            spec.asset.clone(),
        )?;
        entity.initially_infected = spec.initially_infected && spec.kind == EntityKind::Person;
        Ok(entity)
    }

    /// Second construction phase: resolves the sprite through `loader`.
    pub fn load_assets(&mut self, loader: &dyn AssetLoader) -> SimResult<()> {
        let sprite = loader.load(&self.asset_path).map_err(|reason| SimError::AssetLoad {
            name: self.name.clone(),
            path: self.asset_path.clone(),
            reason,
        })?;
        self.sprite = Some(sprite);
        Ok(())
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn health(&self) -> HealthState {
        self.health
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub fn heading(&self) -> Option<Direction> {
        self.movement.as_ref().and_then(|m| m.heading())
    }

    pub fn is_mobile(&self) -> bool {
        self.movement.is_some()
    }

    pub fn sprite(&self) -> Option<&Sprite> {
        self.sprite.as_ref()
    }

    pub(crate) fn initially_infected(&self) -> bool {
        self.initially_infected
    }

    /// Non-positive radii are ignored.
    pub fn set_radius(&mut self, radius: f32) {
        if radius > 0.0 {
            self.radius = radius;
        }
    }

    pub fn set_bounds(&mut self, bounds: Vec2) {
        self.bounds = bounds;
    }

    #[cfg(test)]
    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Captures what this entity needs to act as an infector.
    pub fn transmitter(&self) -> Transmitter {
        Transmitter {
            id: self.id,
            position: self.position,
            radius: self.radius,
            one_shot: self.kind == EntityKind::Source,
        }
    }

    /// Turns a susceptible entity infected, counting it and notifying listeners.
    /// Returns `false` if the entity was not susceptible.
    pub fn infect(&mut self, ctx: &mut TickContext<'_>) -> bool {
        if self.health != HealthState::Susceptible {
            return false;
        }
        self.health = HealthState::Infected;
        ctx.counters.infected += 1;
        debug!("Entity {} ({}) infected, {} infected in total", self.id, self.name, ctx.counters.infected);
        if ctx.observer != Some(self.name.as_str()) {
            ctx.events.emit(SimEvent::EntityInfected { name: self.name.clone() });
        }
        true
    }

    /// Moves one step along the movement policy. Stationary entities do nothing.
    ///
    /// Raises the completion signal once the infected count reaches the outbreak
    /// threshold, except on the final tick.
    pub fn advance(&mut self, is_final_tick: bool, ctx: &mut TickContext<'_>) {
        let Some(movement) = self.movement.as_mut() else {
            return;
        };
        if ctx.counters.infected >= ctx.outbreak_threshold && !is_final_tick && !ctx.counters.complete {
            ctx.counters.complete = true;
            ctx.events.emit(SimEvent::SimulationComplete);
        }
        let step = movement.compute_step(self.position, self.radius, self.bounds, ctx.rng);
        self.position += step;
        trace!("Entity {} moved to ({:.1}, {:.1})", self.id, self.position.x, self.position.y);
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        self.draw.draw(
            surface,
            self.position.x,
            self.position.y,
            self.radius,
            self.sprite.as_ref(),
            self.health,
        );
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            name: self.name.clone(),
            health: self.health,
            x: self.position.x,
            y: self.position.y,
            radius: self.radius,
        }
    }
}

/// Position and size of an infector, detached from the entity so the
/// candidates it tests can be borrowed mutably.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transmitter {
    pub id: u32,
    pub position: Vec2,
    pub radius: f32,
    /// Sources stop after their first transmission and ask to be removed.
    pub one_shot: bool,
}

impl Transmitter {
    /// Tests every susceptible candidate for overlap and runs one transmission
    /// trial per overlapping pair. Returns the number of transmissions.
    pub fn test_collisions_and_infect(&self, candidates: &mut [Entity], ctx: &mut TickContext<'_>) -> u32 {
        let mut transmissions = 0;
        for candidate in candidates.iter_mut() {
            if candidate.health != HealthState::Susceptible {
                continue;
            }
            let distance = self.position.distance(candidate.position);
            if distance >= self.radius + candidate.radius {
                continue;
            }
            if !ctx.rng.sample(ctx.transmission) {
                continue;
            }
            if candidate.infect(ctx) {
                transmissions += 1;
                if self.one_shot {
                    ctx.events.emit(SimEvent::RemoveTransientEntity { id: self.id });
                    break;
                }
            }
        }
        transmissions
    }
}
