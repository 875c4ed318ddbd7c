use crate::sim_params::SimParams;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Dimensions of the arena entities move in
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
}

/// One named participant and the sprite it is drawn with.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub name: String,
    pub asset: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PopulationConfig {
    /// Name of the roster entry infected when the population is created.
    #[serde(default)]
    pub patient_zero: Option<String>,
    /// Name whose infection raises no notification. Falls back to `patient_zero`.
    #[serde(default)]
    pub observer: Option<String>,
    #[serde(default)]
    pub people: Vec<RosterEntry>,
    #[serde(default)]
    pub sources: Vec<RosterEntry>,
}

// Size and speed of entities
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EntityParamsConfig {
    #[serde(default = "default_radius_min")]
    pub radius_min: f32,
    #[serde(default = "default_radius_max")]
    pub radius_max: f32,
    #[serde(default = "default_percent")]
    pub size_percent: f32,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

// Tick cadence. Slow and fast are the interval ends of the speed control.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_interval_slow_ms")]
    pub interval_slow_ms: f32,
    #[serde(default = "default_interval_fast_ms")]
    pub interval_fast_ms: f32,
    #[serde(default = "default_percent")]
    pub speed_percent: f32,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ContagionConfig {
    #[serde(default = "default_outbreak_threshold")]
    pub outbreak_threshold: u32,
    #[serde(default = "default_transmission_probability")]
    pub transmission_probability: f64,
    #[serde(default = "default_cooldown_min")]
    pub cooldown_min: u32,
    #[serde(default = "default_cooldown_max")]
    pub cooldown_max: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct AssetsConfig {
    /// Directory sprite paths are resolved against. Placeholder sprites are generated when unset.
    #[serde(default)]
    pub directory: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct OutputConfig {
    /// PNG path the terminal view is written to after the final tick.
    #[serde(default)]
    pub final_frame: Option<String>,
    #[serde(default)]
    pub print_summary: bool,
}

/// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    #[serde(default)]
    pub seed: u64,
    pub arena: ArenaConfig,
    pub population: PopulationConfig,
    #[serde(default)]
    pub entity: EntityParamsConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub contagion: ContagionConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for EntityParamsConfig {
    fn default() -> Self {
        EntityParamsConfig {
            radius_min: default_radius_min(),
            radius_max: default_radius_max(),
            size_percent: default_percent(),
            speed: default_speed(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            interval_slow_ms: default_interval_slow_ms(),
            interval_fast_ms: default_interval_fast_ms(),
            speed_percent: default_percent(),
            max_ticks: default_max_ticks(),
        }
    }
}

impl Default for ContagionConfig {
    fn default() -> Self {
        ContagionConfig {
            outbreak_threshold: default_outbreak_threshold(),
            transmission_probability: default_transmission_probability(),
            cooldown_min: default_cooldown_min(),
            cooldown_max: default_cooldown_max(),
        }
    }
}

/// Maps a control percentage (1..=100) linearly onto `[min, max]`.
/// `max` may be smaller than `min`, e.g. for an interval that shrinks as speed grows.
pub fn map_percentage(min: f32, max: f32, percentage: f32) -> f32 {
    min + ((percentage - 1.0) / (100.0 - 1.0)) * (max - min)
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.arena.width <= 0.0 || self.arena.height <= 0.0 {
            anyhow::bail!("arena width and height must be positive.");
        }
        let entity = &self.entity;
        if entity.radius_min <= 0.0 || entity.radius_max <= 0.0 {
            anyhow::bail!("radius_min and radius_max must be positive.");
        }
        if entity.speed <= 0.0 {
            anyhow::bail!("speed must be positive.");
        }
        let span = 2.0 * entity.radius_max;
        if self.arena.width < span || self.arena.height < span {
            anyhow::bail!(
                "arena {}x{} cannot hold an entity of radius_max {}.",
                self.arena.width,
                self.arena.height,
                entity.radius_max
            );
        }
        for (label, pct) in [("size_percent", entity.size_percent), ("speed_percent", self.timing.speed_percent)] {
            if !(1.0..=100.0).contains(&pct) {
                anyhow::bail!("{} must lie in 1..=100, got {}.", label, pct);
            }
        }
        if self.timing.interval_slow_ms < 0.0 || self.timing.interval_fast_ms < 0.0 {
            anyhow::bail!("tick intervals cannot be negative.");
        }
        let contagion = &self.contagion;
        if !(0.0..=1.0).contains(&contagion.transmission_probability) {
            anyhow::bail!("transmission_probability must lie in [0, 1].");
        }
        if contagion.cooldown_min > contagion.cooldown_max {
            anyhow::bail!(
                "cooldown_min ({}) exceeds cooldown_max ({}).",
                contagion.cooldown_min,
                contagion.cooldown_max
            );
        }
        if self.population.people.is_empty() && self.population.sources.is_empty() {
            anyhow::bail!("population roster is empty.");
        }
        if let Some(name) = &self.population.patient_zero {
            if !self.population.people.iter().any(|p| &p.name == name) {
                anyhow::bail!("patient_zero '{}' is not in the people roster.", name);
            }
        }
        Ok(())
    }

    /// The name exempt from infection notifications.
    pub fn observer(&self) -> Option<&str> {
        self.population
            .observer
            .as_deref()
            .or(self.population.patient_zero.as_deref())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let entity = &self.entity;
        let timing = &self.timing;

        SimParams {
            world_width: self.arena.width,
            world_height: self.arena.height,
            radius: map_percentage(entity.radius_min, entity.radius_max, entity.size_percent),
            speed: entity.speed,
            tick_interval_ms: map_percentage(timing.interval_slow_ms, timing.interval_fast_ms, timing.speed_percent),
            outbreak_threshold: self.contagion.outbreak_threshold,
            transmission_probability: self.contagion.transmission_probability,
            cooldown_min: self.contagion.cooldown_min,
            cooldown_max: self.contagion.cooldown_max,
            seed: self.seed,
        }
    }
}

fn default_radius_min() -> f32 {
    5.0
}

fn default_radius_max() -> f32 {
    35.0
}

fn default_percent() -> f32 {
    50.0
}

fn default_speed() -> f32 {
    5.0
}

fn default_interval_slow_ms() -> f32 {
    100.0
}

fn default_interval_fast_ms() -> f32 {
    20.0
}

fn default_max_ticks() -> u64 {
    100_000
}

fn default_outbreak_threshold() -> u32 {
    23
}

fn default_transmission_probability() -> f64 {
    0.8
}

fn default_cooldown_min() -> u32 {
    6
}

fn default_cooldown_max() -> u32 {
    9
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        seed = 7

        [arena]
        width = 800.0
        height = 600.0

        [population]
        patient_zero = "Ismael"

        [[population.people]]
        name = "Ismael"
        asset = "ISMAEL.png"

        [[population.people]]
        name = "Marie"
        asset = "EVEILLE.png"
    "#;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = SimulationConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.contagion.outbreak_threshold, 23);
        assert_eq!(config.contagion.transmission_probability, 0.8);
        assert_eq!((config.contagion.cooldown_min, config.contagion.cooldown_max), (6, 9));
        assert_eq!(config.observer(), Some("Ismael"));
        assert!(config.output.final_frame.is_none());
    }

    #[test]
    fn test_map_percentage_endpoints() {
        assert_eq!(map_percentage(5.0, 35.0, 1.0), 5.0);
        assert_eq!(map_percentage(5.0, 35.0, 100.0), 35.0);
        // Interval shrinks as the percentage grows
        assert_eq!(map_percentage(100.0, 20.0, 100.0), 20.0);
        assert!((map_percentage(5.0, 35.0, 50.0) - 19.848_484).abs() < 1e-4);
    }

    #[test]
    fn test_sim_params_derived_from_percentages() {
        let config = SimulationConfig::from_toml_str(MINIMAL).unwrap();
        let params = config.get_sim_params();
        assert_eq!(params.world_width, 800.0);
        assert_eq!(params.radius, map_percentage(5.0, 35.0, 50.0));
        assert_eq!(params.tick_interval_ms, map_percentage(100.0, 20.0, 50.0));
        assert_eq!(params.seed, 7);
    }

    #[test]
    fn test_rejects_unknown_patient_zero() {
        let text = MINIMAL.replace("patient_zero = \"Ismael\"", "patient_zero = \"Nobody\"");
        assert!(SimulationConfig::from_toml_str(&text).is_err());
    }

    #[test]
    fn test_rejects_inverted_cooldown() {
        let text = format!("{}\n[contagion]\ncooldown_min = 9\ncooldown_max = 6\n", MINIMAL);
        assert!(SimulationConfig::from_toml_str(&text).is_err());
    }

    #[test]
    fn test_rejects_arena_smaller_than_largest_entity() {
        let text = MINIMAL.replace("height = 600.0", "height = 60.0");
        assert!(SimulationConfig::from_toml_str(&text).is_err());
    }
}
