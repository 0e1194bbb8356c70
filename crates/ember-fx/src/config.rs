//! Effect configuration (parsed from TOML) and validation

use ember_core::{EmberError, Result, Vec2};

/// Every runtime tunable of the fire effect. All fields except the pool
/// capacities are hot-swappable through `FireEffect::apply_tuning`.
#[derive(Debug, Clone)]
pub struct FxConfig {
    /// Flying-particle pool capacity (fixed at construction)
    pub flight_capacity: usize,
    /// Landed/evolving pool capacity (fixed at construction)
    pub landed_capacity: usize,
    /// Global sprite ceiling, main subject included
    pub sprite_budget: usize,

    /// Downward acceleration in px/s^2 (y-down screen space)
    pub gravity: f32,
    /// Added to the velocity heading when orienting the token, degrees
    pub rotation_offset_deg: f32,
    /// Configured maximum particle age in seconds (drives the growth ramp)
    pub max_age: f32,
    /// Scale at launch
    pub scale_initial: f32,
    /// Scale after the growth ramp
    pub scale_peak: f32,

    /// Seconds between spawn attempts
    pub spawn_interval: f32,
    /// Spawn-region center relative to the main subject's position
    pub spawn_offset: Vec2,
    /// Spawn-region half extents in px
    pub spawn_extents: Vec2,
    /// Vertical strips the spawn region is divided into
    pub spawn_lanes: usize,
    /// Launch angle range in degrees (y-down: negative is upward)
    pub angle_min_deg: f32,
    pub angle_max_deg: f32,
    /// Minimum difference from the previous launch angle
    pub angle_min_delta: f32,
    /// Launch speed range in px/s
    pub speed_min: f32,
    pub speed_max: f32,
    /// Minimum difference from the previous launch speed
    pub speed_min_delta: f32,

    /// Floor line offset below the subject's bottom edge, px
    pub floor_offset: f32,
    /// Decay hold before shrinking starts, seconds
    pub pause_secs: f32,
    /// Shrink duration, seconds
    pub shrink_secs: f32,
    /// Shrink origin height above the visual's bottom edge, unscaled px
    pub pivot_offset: f32,

    /// Clicks needed to advance one evolution level
    pub clicks_per_level: u32,
    /// Recovery bounce duration, seconds
    pub recovery_secs: f32,
    /// Appearance per evolution level (4 entries, last is the collectible)
    pub level_frame_sets: Vec<String>,
    /// Position nudge applied when a particle turns collectible
    pub collectible_offset: Vec2,

    /// Frame set used for in-flight particles
    pub particle_frame_set: String,
    /// Natural (unscaled) pixel size of a particle frame
    pub particle_size: Vec2,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            flight_capacity: 6,
            landed_capacity: 8,
            sprite_budget: 10,
            gravity: 1400.0,
            rotation_offset_deg: 90.0,
            max_age: 3.0,
            scale_initial: 0.12,
            scale_peak: 0.3,
            spawn_interval: 0.45,
            spawn_offset: Vec2::new(0.0, -120.0),
            spawn_extents: Vec2::new(90.0, 30.0),
            spawn_lanes: 3,
            angle_min_deg: -175.0,
            angle_max_deg: -5.0,
            angle_min_delta: 30.0,
            speed_min: 260.0,
            speed_max: 420.0,
            speed_min_delta: 40.0,
            floor_offset: 12.0,
            pause_secs: 0.5,
            shrink_secs: 3.0,
            pivot_offset: 20.0,
            clicks_per_level: 3,
            recovery_secs: 0.25,
            level_frame_sets: vec![
                "ember_dim".to_string(),
                "ember_glow".to_string(),
                "ember_crack".to_string(),
                "egg".to_string(),
            ],
            collectible_offset: Vec2::new(0.0, -10.0),
            particle_frame_set: "spark".to_string(),
            particle_size: Vec2::new(96.0, 96.0),
        }
    }
}

impl FxConfig {
    /// Parse a config from a TOML table, falling back to defaults for any
    /// missing key
    pub fn from_toml(table: &toml::value::Table) -> Self {
        let mut config = Self::default();

        if let Some(v) = table.get("flight_capacity") {
            config.flight_capacity = toml_usize(v, config.flight_capacity);
        }
        if let Some(v) = table.get("landed_capacity") {
            config.landed_capacity = toml_usize(v, config.landed_capacity);
        }
        if let Some(v) = table.get("sprite_budget") {
            config.sprite_budget = toml_usize(v, config.sprite_budget);
        }
        if let Some(v) = table.get("gravity") {
            config.gravity = toml_f32(v, config.gravity);
        }
        if let Some(v) = table.get("rotation_offset_deg") {
            config.rotation_offset_deg = toml_f32(v, config.rotation_offset_deg);
        }
        if let Some(v) = table.get("max_age") {
            config.max_age = toml_f32(v, config.max_age);
        }
        if let Some(v) = table.get("scale_initial") {
            config.scale_initial = toml_f32(v, config.scale_initial);
        }
        if let Some(v) = table.get("scale_peak") {
            config.scale_peak = toml_f32(v, config.scale_peak);
        }
        if let Some(v) = table.get("spawn_interval") {
            config.spawn_interval = toml_f32(v, config.spawn_interval);
        }
        if let Some(v) = table.get("spawn_offset") {
            config.spawn_offset = toml_vec2(v, config.spawn_offset);
        }
        if let Some(v) = table.get("spawn_extents") {
            config.spawn_extents = toml_vec2(v, config.spawn_extents);
        }
        if let Some(v) = table.get("spawn_lanes") {
            config.spawn_lanes = toml_usize(v, config.spawn_lanes);
        }
        if let Some(v) = table.get("angle_min_deg") {
            config.angle_min_deg = toml_f32(v, config.angle_min_deg);
        }
        if let Some(v) = table.get("angle_max_deg") {
            config.angle_max_deg = toml_f32(v, config.angle_max_deg);
        }
        if let Some(v) = table.get("angle_min_delta") {
            config.angle_min_delta = toml_f32(v, config.angle_min_delta);
        }
        if let Some(v) = table.get("speed_min") {
            config.speed_min = toml_f32(v, config.speed_min);
        }
        if let Some(v) = table.get("speed_max") {
            config.speed_max = toml_f32(v, config.speed_max);
        }
        if let Some(v) = table.get("speed_min_delta") {
            config.speed_min_delta = toml_f32(v, config.speed_min_delta);
        }
        if let Some(v) = table.get("floor_offset") {
            config.floor_offset = toml_f32(v, config.floor_offset);
        }
        if let Some(v) = table.get("pause_secs") {
            config.pause_secs = toml_f32(v, config.pause_secs);
        }
        if let Some(v) = table.get("shrink_secs") {
            config.shrink_secs = toml_f32(v, config.shrink_secs);
        }
        if let Some(v) = table.get("pivot_offset") {
            config.pivot_offset = toml_f32(v, config.pivot_offset);
        }
        if let Some(v) = table.get("clicks_per_level") {
            config.clicks_per_level = v.as_integer().unwrap_or(3).max(1) as u32;
        }
        if let Some(v) = table.get("recovery_secs") {
            config.recovery_secs = toml_f32(v, config.recovery_secs);
        }
        if let Some(v) = table.get("level_frame_sets") {
            if let Some(arr) = v.as_array() {
                let names: Vec<String> = arr
                    .iter()
                    .filter_map(|e| e.as_str().map(String::from))
                    .collect();
                if !names.is_empty() {
                    config.level_frame_sets = names;
                }
            }
        }
        if let Some(v) = table.get("collectible_offset") {
            config.collectible_offset = toml_vec2(v, config.collectible_offset);
        }
        if let Some(v) = table.get("particle_frame_set") {
            if let Some(s) = v.as_str() {
                config.particle_frame_set = s.to_string();
            }
        }
        if let Some(v) = table.get("particle_size") {
            config.particle_size = toml_vec2(v, config.particle_size);
        }

        config
    }

    /// Check the invariants the simulation relies on
    pub fn validate(&self) -> Result<()> {
        if self.flight_capacity == 0 {
            return Err(EmberError::ConfigError(
                "flight_capacity must be at least 1".into(),
            ));
        }
        if self.landed_capacity == 0 {
            return Err(EmberError::ConfigError(
                "landed_capacity must be at least 1".into(),
            ));
        }
        if self.sprite_budget == 0 {
            return Err(EmberError::ConfigError(
                "sprite_budget must admit at least the main subject".into(),
            ));
        }
        if self.spawn_lanes == 0 {
            return Err(EmberError::ConfigError(
                "spawn_lanes must be at least 1".into(),
            ));
        }
        if self.angle_min_deg > self.angle_max_deg {
            return Err(EmberError::ConfigError(format!(
                "angle range is inverted: [{}, {}]",
                self.angle_min_deg, self.angle_max_deg
            )));
        }
        if self.speed_min > self.speed_max {
            return Err(EmberError::ConfigError(format!(
                "speed range is inverted: [{}, {}]",
                self.speed_min, self.speed_max
            )));
        }
        for (name, value) in [
            ("max_age", self.max_age),
            ("spawn_interval", self.spawn_interval),
            ("pause_secs", self.pause_secs),
            ("shrink_secs", self.shrink_secs),
            ("recovery_secs", self.recovery_secs),
        ] {
            if value < 0.0 {
                return Err(EmberError::ValueOutOfRange {
                    field: name.to_string(),
                    min: 0.0,
                    max: f64::INFINITY,
                    value: value as f64,
                });
            }
        }
        if self.level_frame_sets.len() != 4 {
            return Err(EmberError::ConfigError(format!(
                "level_frame_sets needs exactly 4 entries, got {}",
                self.level_frame_sets.len()
            )));
        }
        Ok(())
    }
}

// ── TOML helpers (handle integer/float coercion) ──

fn toml_f32(v: &toml::Value, default: f32) -> f32 {
    v.as_float()
        .map(|f| f as f32)
        .or_else(|| v.as_integer().map(|i| i as f32))
        .unwrap_or(default)
}

fn toml_usize(v: &toml::Value, default: usize) -> usize {
    v.as_integer()
        .and_then(|i| usize::try_from(i).ok())
        .unwrap_or(default)
}

fn toml_vec2(v: &toml::Value, default: Vec2) -> Vec2 {
    if let Some(arr) = v.as_array() {
        if arr.len() >= 2 {
            return Vec2::new(
                toml_f32(&arr[0], default.x),
                toml_f32(&arr[1], default.y),
            );
        }
    }
    default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = FxConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.speed_max >= config.speed_min);
        assert!(config.sprite_budget > 0);
    }

    #[test]
    fn parse_from_toml() {
        let toml_str = r#"
flight_capacity = 12
sprite_budget = 20
gravity = 900
angle_min_deg = -160.0
angle_max_deg = -20.0
spawn_offset = [10, -80.0]
level_frame_sets = ["a", "b", "c", "d"]
"#;
        let table: toml::value::Table = toml::from_str(toml_str).unwrap();
        let config = FxConfig::from_toml(&table);
        assert_eq!(config.flight_capacity, 12);
        assert_eq!(config.sprite_budget, 20);
        assert!((config.gravity - 900.0).abs() < 0.01);
        assert!((config.angle_min_deg - (-160.0)).abs() < 0.01);
        assert!((config.spawn_offset.x - 10.0).abs() < 0.01);
        assert!((config.spawn_offset.y - (-80.0)).abs() < 0.01);
        assert_eq!(config.level_frame_sets[3], "d");
        // Untouched keys keep their defaults
        assert_eq!(config.landed_capacity, FxConfig::default().landed_capacity);
    }

    #[test]
    fn toml_integer_float_coercion() {
        // `spawn_extents = [90, 30.5]` mixes integers and floats
        let table: toml::value::Table = toml::from_str("spawn_extents = [90, 30.5]").unwrap();
        let config = FxConfig::from_toml(&table);
        assert!((config.spawn_extents.x - 90.0).abs() < 0.01);
        assert!((config.spawn_extents.y - 30.5).abs() < 0.01);
    }

    #[test]
    fn validate_rejects_bad_ranges() {
        let mut config = FxConfig::default();
        config.angle_min_deg = -5.0;
        config.angle_max_deg = -175.0;
        assert!(config.validate().is_err());

        let mut config = FxConfig::default();
        config.flight_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = FxConfig::default();
        config.shrink_secs = -1.0;
        assert!(config.validate().is_err());

        let mut config = FxConfig::default();
        config.level_frame_sets.pop();
        assert!(config.validate().is_err());
    }
}
