//! Scheduling host: runs ticks on a fixed interval and exposes the run controls.

use crate::assets::AssetLoader;
use crate::draw::Surface;
use crate::entity::EntitySpec;
use crate::simulation::{CreationReport, Population};
use anyhow::Result;
use contagion_common::{map_percentage, SimulationConfig};
use log::{debug, info, warn};
use std::time::Duration;

/// Control percentage the size and speed controls return to on restore.
pub const DEFAULT_PERCENT: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No population created yet; start is refused until setup completes.
    Unprepared,
    /// Population created, no tick scheduled yet.
    Idle,
    Running,
    Paused,
    /// Final tick done; nothing more is scheduled until a restore.
    Finished,
}

/// Builds the creation roster: people first, then sources.
pub fn roster_from_config(config: &SimulationConfig) -> Vec<EntitySpec> {
    let patient_zero = config.population.patient_zero.as_deref();
    let people = config.population.people.iter().map(|entry| {
        let spec = EntitySpec::person(entry.name.clone(), entry.asset.clone());
        if patient_zero == Some(entry.name.as_str()) {
            spec.infected()
        } else {
            spec
        }
    });
    let sources = config
        .population
        .sources
        .iter()
        .map(|entry| EntitySpec::source(entry.name.clone(), entry.asset.clone()));
    people.chain(sources).collect()
}

pub struct Driver<S: Surface> {
    population: Population,
    roster: Vec<EntitySpec>,
    loader: Box<dyn AssetLoader>,
    surface: S,
    phase: Phase,
    radius_range: (f32, f32),
    interval_range: (f32, f32),
    size_percent: f32,
    speed_percent: f32,
    max_ticks: u64,
}

impl<S: Surface> Driver<S> {
    pub fn new(config: &SimulationConfig, loader: Box<dyn AssetLoader>, surface: S) -> Result<Self> {
        let params = config.get_sim_params();
        let population = Population::new(params, config.observer().map(str::to_owned))?;
        Ok(Self {
            population,
            roster: roster_from_config(config),
            loader,
            surface,
            phase: Phase::Unprepared,
            radius_range: (config.entity.radius_min, config.entity.radius_max),
            interval_range: (config.timing.interval_slow_ms, config.timing.interval_fast_ms),
            size_percent: config.entity.size_percent,
            speed_percent: config.timing.speed_percent,
            max_ticks: config.timing.max_ticks,
        })
    }

    /// Creates the population and draws it once. Ticks may be scheduled afterwards.
    pub fn setup(&mut self) -> Result<CreationReport> {
        let report = self.population.create_population(&self.roster, self.loader.as_ref())?;
        if report.created == 0 {
            warn!("No entity could be created; the arena is empty.");
        }
        self.population.render(&mut self.surface);
        self.phase = Phase::Idle;
        Ok(report)
    }

    /// Starts scheduling ticks. Ignored while paused or finished.
    pub fn start(&mut self) {
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Running;
                info!("Simulation started, one tick every {:?}.", self.interval());
            }
            Phase::Running => {}
            Phase::Unprepared | Phase::Paused | Phase::Finished => debug!("Start ignored in phase {:?}.", self.phase),
        }
    }

    pub fn pause(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::Paused;
            info!("Simulation paused after {} ticks.", self.population.tick_count());
        }
    }

    pub fn resume(&mut self) {
        if self.phase == Phase::Paused {
            self.phase = Phase::Running;
            info!("Simulation resumed.");
        }
    }

    /// Stops scheduling, resets the controls and counters, and creates a fresh population.
    pub fn restore(&mut self) -> Result<CreationReport> {
        self.phase = Phase::Unprepared;
        self.size_percent = DEFAULT_PERCENT;
        self.speed_percent = DEFAULT_PERCENT;
        self.population.restore();
        let radius = self.radius();
        self.population.set_entity_radius(radius, &mut self.surface);
        self.setup()
    }

    /// Changes the tick interval. A running simulation is paused first.
    pub fn set_speed_percent(&mut self, percent: f32) {
        self.speed_percent = percent.clamp(1.0, 100.0);
        self.pause();
        debug!("Tick interval set to {:?}.", self.interval());
    }

    /// Resizes every entity. A running simulation is paused first.
    pub fn set_size_percent(&mut self, percent: f32) {
        if self.population.is_empty() {
            return;
        }
        self.size_percent = percent.clamp(1.0, 100.0);
        self.pause();
        let radius = self.radius();
        self.population.set_entity_radius(radius, &mut self.surface);
    }

    pub fn radius(&self) -> f32 {
        map_percentage(self.radius_range.0, self.radius_range.1, self.size_percent)
    }

    pub fn interval(&self) -> Duration {
        let ms = map_percentage(self.interval_range.0, self.interval_range.1, self.speed_percent);
        Duration::from_secs_f32(ms.max(0.0) / 1000.0)
    }

    /// Runs one scheduled tick if the simulation is running.
    ///
    /// Once the outbreak is complete, scheduling stops and exactly one final tick runs.
    /// Returns whether anything ran.
    pub fn pump(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.population.tick(false, &mut self.surface);
        if self.population.is_complete() {
            self.phase = Phase::Finished;
            self.population.tick(true, &mut self.surface);
            info!(
                "Simulation complete after {} ticks: {} of {} infected.",
                self.population.tick_count(),
                self.population.infected_count(),
                self.population.entity_count()
            );
        }
        true
    }

    /// Starts the simulation and ticks on the configured interval until it
    /// finishes, is paused, or hits the tick cap.
    pub fn run_blocking(&mut self) {
        self.start();
        while self.phase == Phase::Running {
            if self.population.tick_count() >= self.max_ticks {
                warn!("Tick cap of {} reached before the outbreak completed.", self.max_ticks);
                self.pause();
                break;
            }
            self.pump();
            if self.phase == Phase::Running {
                std::thread::sleep(self.interval());
            }
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::PlaceholderAssetLoader;
    use crate::draw::NullSurface;

    fn config(people: usize, threshold: u32) -> SimulationConfig {
        let mut text = String::from(
            "seed = 3\n[arena]\nwidth = 120.0\nheight = 120.0\n[population]\npatient_zero = \"P0\"\n",
        );
        for i in 0..people {
            text.push_str(&format!("[[population.people]]\nname = \"P{}\"\nasset = \"p{}.png\"\n", i, i));
        }
        text.push_str(&format!(
            "[contagion]\noutbreak_threshold = {}\ntransmission_probability = 1.0\n[timing]\ninterval_slow_ms = 0.0\ninterval_fast_ms = 0.0\nmax_ticks = 50000\n",
            threshold
        ));
        SimulationConfig::from_toml_str(&text).unwrap()
    }

    fn driver(people: usize, threshold: u32) -> Driver<NullSurface> {
        let mut driver = Driver::new(&config(people, threshold), Box::new(PlaceholderAssetLoader::default()), NullSurface).unwrap();
        driver.setup().unwrap();
        driver
    }

    #[test]
    fn test_roster_marks_patient_zero() {
        let roster = roster_from_config(&config(3, 3));
        assert_eq!(roster.len(), 3);
        assert!(roster[0].initially_infected);
        assert!(!roster[1].initially_infected);
    }

    #[test]
    fn test_start_refused_before_setup() {
        let mut d = Driver::new(&config(4, 100), Box::new(PlaceholderAssetLoader::default()), NullSurface).unwrap();
        d.start();
        assert_eq!(d.phase(), Phase::Unprepared);
        assert!(!d.pump());
        assert_eq!(d.population().tick_count(), 0);

        d.setup().unwrap();
        assert_eq!(d.phase(), Phase::Idle);
        d.start();
        assert!(d.pump());
    }

    #[test]
    fn test_pause_resume_cycle() {
        let mut d = driver(4, 100);
        assert!(!d.pump());
        d.start();
        assert!(d.pump());
        d.pause();
        assert!(!d.pump());
        d.start();
        assert_eq!(d.phase(), Phase::Paused);
        d.resume();
        assert!(d.pump());
    }

    #[test]
    fn test_speed_change_pauses_running() {
        let mut d = driver(4, 100);
        d.start();
        let before = d.interval();
        d.set_speed_percent(100.0);
        assert_eq!(d.phase(), Phase::Paused);
        assert!(d.interval() <= before);
    }

    #[test]
    fn test_size_change_resizes_entities() {
        let mut d = driver(4, 100);
        d.set_size_percent(100.0);
        assert!(d.population().mobile().iter().all(|e| e.radius() == 35.0));
    }

    #[test]
    fn test_outbreak_ends_with_one_final_tick() {
        // Small crowded arena, certain transmission: everyone is reached eventually
        let mut d = driver(4, 4);
        d.run_blocking();
        assert_eq!(d.phase(), Phase::Finished);
        assert_eq!(d.population().infected_count(), 4);
        let ticks = d.population().tick_count();
        assert!(!d.pump());
        assert_eq!(d.population().tick_count(), ticks);
    }

    #[test]
    fn test_restore_resets_controls_and_population() {
        let mut d = driver(4, 100);
        d.set_size_percent(100.0);
        d.start();
        d.pump();
        let report = d.restore().unwrap();
        assert_eq!(report.created, 4);
        assert_eq!(d.phase(), Phase::Idle);
        assert_eq!(d.radius(), map_percentage(5.0, 35.0, DEFAULT_PERCENT));
        assert_eq!(d.population().mobile()[0].id(), 1);
        assert_eq!(d.population().infected_count(), 1);
        assert_eq!(d.population().tick_count(), 0);
    }
}
