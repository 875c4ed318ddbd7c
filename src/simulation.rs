use crate::assets::AssetLoader;
use crate::draw::Surface;
use crate::entity::{Counters, Entity, EntityKind, EntitySpec, TickContext};
use crate::error::{SimError, SimResult};
use crate::events::{EventBus, SimEvent};
use contagion_common::{HealthState, SimParams, Snapshot, Vec2};
use log::{debug, error, info, warn};
use rand::distr::Bernoulli;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Outcome of a batch creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreationReport {
    pub created: usize,
    pub failed: usize,
}

/// Holds the entities of one session and executes simulation ticks.
pub struct Population {
    params: SimParams,
    /// People: susceptible or infected, moving every tick.
    mobile: Vec<Entity>,
    /// Stationary one-shot transmitters.
    sources: Vec<Entity>,
    counters: Counters,
    events: EventBus,
    rng: StdRng,
    transmission: Bernoulli,
    observer: Option<String>,
    tick_count: u64,
}

impl Population {
    pub fn new(params: SimParams, observer: Option<String>) -> SimResult<Self> {
        let transmission = Bernoulli::new(params.transmission_probability).map_err(|e| {
            SimError::InvalidConfig(format!(
                "transmission probability {}: {}",
                params.transmission_probability, e
            ))
        })?;
        if !(params.radius > 0.0) {
            return Err(SimError::InvalidConfig(format!("radius must be positive, got {}", params.radius)));
        }
        if !(params.speed > 0.0) {
            return Err(SimError::InvalidConfig(format!("movement speed must be positive, got {}", params.speed)));
        }
        if params.cooldown_min > params.cooldown_max {
            return Err(SimError::InvalidConfig(format!(
                "direction cooldown range {}..={} is empty",
                params.cooldown_min, params.cooldown_max
            )));
        }
        let rng = StdRng::seed_from_u64(params.seed);
        Ok(Self {
            params,
            mobile: Vec::new(),
            sources: Vec::new(),
            counters: Counters::default(),
            events: EventBus::new(),
            rng,
            transmission,
            observer,
            tick_count: 0,
        })
    }

    /// Registers a listener for infection, removal and completion signals.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&SimEvent) + 'static,
    {
        self.events.subscribe(listener);
    }

    /// Creates every entity in `specs` and adds the ones whose sprite loads.
    ///
    /// Ids and positions are assigned in roster order. Sprites are loaded in
    /// parallel; an entity whose sprite fails is logged and left out.
    pub fn create_population(&mut self, specs: &[EntitySpec], loader: &dyn AssetLoader) -> SimResult<CreationReport> {
        let mut pending = Vec::with_capacity(specs.len());
        for spec in specs {
            pending.push(Entity::create(spec, &self.params, &mut self.counters, &mut self.rng)?);
        }

        let results: Vec<SimResult<()>> = pending
            .par_iter_mut()
            .map(|entity| entity.load_assets(loader))
            .collect();

        let mut report = CreationReport::default();
        for (mut entity, result) in pending.into_iter().zip(results) {
            if let Err(e) = result {
                error!("Error creating entity {}: {}", entity.id(), e);
                report.failed += 1;
                continue;
            }
            if entity.initially_infected() {
                let mut ctx = Self::context(
                    &mut self.rng,
                    &mut self.counters,
                    &mut self.events,
                    self.transmission,
                    self.params.outbreak_threshold,
                    self.observer.as_deref(),
                );
                entity.infect(&mut ctx);
            }
            match entity.kind() {
                EntityKind::Person => self.mobile.push(entity),
                EntityKind::Source => self.sources.push(entity),
            }
            report.created += 1;
        }
        self.dispatch_events();

        info!(
            "Population created: {} entities ({} mobile, {} sources), {} failed, {} infected.",
            report.created,
            self.mobile.len(),
            self.sources.len(),
            report.failed,
            self.counters.infected
        );
        Ok(report)
    }

    fn context<'a>(
        rng: &'a mut StdRng,
        counters: &'a mut Counters,
        events: &'a mut EventBus,
        transmission: Bernoulli,
        outbreak_threshold: u32,
        observer: Option<&'a str>,
    ) -> TickContext<'a> {
        TickContext {
            rng,
            counters,
            events,
            transmission,
            outbreak_threshold,
            observer,
        }
    }

    /// Executes one tick: infection, then movement, then rendering.
    ///
    /// Infection resolves against positions from before this tick's movement.
    pub fn tick(&mut self, is_final_tick: bool, surface: &mut dyn Surface) {
        self.resolve_infections();
        self.dispatch_events();
        self.advance_all(is_final_tick);
        self.dispatch_events();
        self.render(surface);
        self.tick_count += 1;
        debug!(
            "Tick {} done{}: {} infected of {} entities.",
            self.tick_count,
            if is_final_tick { " (final)" } else { "" },
            self.counters.infected,
            self.counters.entities
        );
    }

    fn resolve_infections(&mut self) {
        let mut ctx = Self::context(
            &mut self.rng,
            &mut self.counters,
            &mut self.events,
            self.transmission,
            self.params.outbreak_threshold,
            self.observer.as_deref(),
        );

        // Health is read as the walk reaches each entity, so one infected
        // earlier in this pass transmits when its turn comes.
        for i in 0..self.mobile.len() {
            if self.mobile[i].health() != HealthState::Infected {
                continue;
            }
            let infector = self.mobile[i].transmitter();
            infector.test_collisions_and_infect(&mut self.mobile, &mut ctx);
        }

        for source in &self.sources {
            source.transmitter().test_collisions_and_infect(&mut self.mobile, &mut ctx);
        }
    }

    fn advance_all(&mut self, is_final_tick: bool) {
        let mut ctx = Self::context(
            &mut self.rng,
            &mut self.counters,
            &mut self.events,
            self.transmission,
            self.params.outbreak_threshold,
            self.observer.as_deref(),
        );
        for entity in self.mobile.iter_mut() {
            entity.advance(is_final_tick, &mut ctx);
        }
    }

    /// Hands queued events to listeners and applies the ones addressed to the population.
    fn dispatch_events(&mut self) {
        for event in self.events.drain() {
            match event {
                SimEvent::RemoveTransientEntity { id } => {
                    let before = self.sources.len();
                    self.sources.retain(|s| s.id() != id);
                    if self.sources.len() < before {
                        info!("Source entity {} spent its transmission and was removed.", id);
                    }
                }
                SimEvent::SimulationComplete => {
                    info!("Outbreak threshold of {} infected reached.", self.params.outbreak_threshold);
                }
                SimEvent::EntityInfected { .. } => {}
            }
        }
    }

    /// Clears the arena and draws every entity.
    pub fn render(&self, surface: &mut dyn Surface) {
        surface.clear_region(0.0, 0.0, self.params.world_width, self.params.world_height);
        for entity in self.mobile.iter().chain(self.sources.iter()) {
            entity.render(surface);
        }
    }

    /// Discards all entities and resets the id and infected counters.
    /// Listeners stay registered; the caller creates the next population.
    pub fn restore(&mut self) {
        self.mobile.clear();
        self.sources.clear();
        self.counters.reset();
        self.events.clear_pending();
        self.tick_count = 0;
        info!("Population restored.");
    }

    /// Applies a new radius to every current entity and to those created later.
    pub fn set_entity_radius(&mut self, radius: f32, surface: &mut dyn Surface) {
        if !(radius > 0.0) {
            warn!("Ignoring non-positive entity radius {}.", radius);
            return;
        }
        self.params.radius = radius;
        for entity in self.mobile.iter_mut().chain(self.sources.iter_mut()) {
            entity.set_radius(radius);
        }
        self.render(surface);
    }

    /// Reassigns the arena every entity moves in.
    pub fn set_canvas_bounds(&mut self, width: f32, height: f32) {
        self.params.world_width = width;
        self.params.world_height = height;
        let bounds = Vec2::new(width, height);
        for entity in self.mobile.iter_mut().chain(self.sources.iter_mut()) {
            entity.set_bounds(bounds);
        }
    }

    /// Ids handed out since the last restore.
    pub fn entity_count(&self) -> u32 {
        self.counters.entities
    }

    pub fn infected_count(&self) -> u32 {
        self.counters.infected
    }

    /// Whether the outbreak-complete signal has been raised.
    pub fn is_complete(&self) -> bool {
        self.counters.complete
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn mobile(&self) -> &[Entity] {
        &self.mobile
    }

    pub fn sources(&self) -> &[Entity] {
        &self.sources
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.mobile.is_empty() && self.sources.is_empty()
    }

    /// Read-only view of the current state for presentation.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick_count,
            total_entity_count: self.counters.entities,
            infected_count: self.counters.infected,
            complete: self.counters.complete,
            entities: self
                .mobile
                .iter()
                .chain(self.sources.iter())
                .map(Entity::snapshot)
                .collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn mobile_mut(&mut self) -> &mut [Entity] {
        &mut self.mobile
    }
}
