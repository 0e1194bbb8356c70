//! Ember FX - Bounded particle simulation and lifecycle engine
//!
//! Drives the fire-effect demos with:
//! - Fixed-capacity flight pool — no allocation during steady-state play
//! - Floor collision hand-off into a timed-decay or click-driven-evolution
//!   landed pool
//! - A global sprite budget validated before any object is created
//! - Anti-repetition sampling of spawn parameters
//!
//! Pool exhaustion and budget refusal are expected backpressure: every such
//! path declines silently and reports failure to the caller.

pub mod budget;
pub mod config;
pub mod evolve;
pub mod flight;
pub mod floor;
pub mod landed;
pub mod rand;
pub mod spawn;

use ember_core::{EmberError, Result, Vec2};
use ember_runtime::{DemoEvent, DemoSystem, SceneServices};
use ember_stage::{Stage, VisualId};
use ember_tween::Tweener;

pub use budget::SpriteBudget;
pub use config::FxConfig;
pub use evolve::{EvolvePhase, EvolvingPool};
pub use flight::{apply_scale_growth, FlightPool};
pub use floor::{check_floor, FloorProvider, Landing};
pub use landed::LandedPool;
pub use rand::FxRng;
pub use spawn::{SpawnTimer, VariedSampler};

/// Which landing path this effect instance runs. The two are mutually
/// exclusive per demo variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FxVariant {
    /// Landed particles pause, shrink, and recycle
    Decay,
    /// Landed particles additionally evolve under clicks
    Evolving,
}

enum LandingTarget {
    Decay(LandedPool),
    Evolving(EvolvingPool),
}

impl LandingTarget {
    fn active_count(&self) -> usize {
        match self {
            LandingTarget::Decay(pool) => pool.active_count(),
            LandingTarget::Evolving(pool) => pool.active_count(),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            LandingTarget::Decay(pool) => pool.capacity(),
            LandingTarget::Evolving(pool) => pool.capacity(),
        }
    }

    fn spawn(
        &mut self,
        stage: &mut Stage,
        tweener: &mut Tweener,
        x: f32,
        y: f32,
        scale: f32,
    ) -> Result<bool> {
        match self {
            LandingTarget::Decay(pool) => pool.spawn(stage, tweener, x, y, scale),
            LandingTarget::Evolving(pool) => pool.spawn(stage, tweener, x, y, scale),
        }
    }

    fn apply_updates(
        &mut self,
        stage: &mut Stage,
        updates: &[ember_tween::TweenUpdate],
        events: &mut ember_runtime::EventBus,
    ) -> Result<()> {
        match self {
            LandingTarget::Decay(pool) => pool.apply_updates(stage, updates, events),
            LandingTarget::Evolving(pool) => pool.apply_updates(stage, updates, events),
        }
    }

    fn reset(&mut self, stage: &mut Stage, tweener: &mut Tweener) -> Result<()> {
        match self {
            LandingTarget::Decay(pool) => pool.reset(stage, tweener),
            LandingTarget::Evolving(pool) => pool.reset(stage, tweener),
        }
    }

    fn dispose(&mut self) {
        match self {
            LandingTarget::Decay(pool) => pool.dispose(),
            LandingTarget::Evolving(pool) => pool.dispose(),
        }
    }
}

/// Per-run spawn and landing counters, for the on-screen diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct FxStats {
    pub spawned: u64,
    pub denied_budget: u64,
    pub denied_pool: u64,
    pub landings: u64,
    pub landings_dropped: u64,
}

/// The fire effect: owns both pools, the floor provider, the budget, and
/// the spawn scheduler, and advances them in a fixed per-tick order —
/// decay progress, then flight physics, then collision hand-off, then new
/// spawns. The budget is recomputed fresh at each admission point, so a
/// landing can never bypass it within a tick.
pub struct FireEffect {
    config: FxConfig,
    subject: VisualId,
    floor: FloorProvider,
    flight: FlightPool,
    target: LandingTarget,
    budget: SpriteBudget,
    timer: SpawnTimer,
    angle_sampler: VariedSampler,
    speed_sampler: VariedSampler,
    rng: FxRng,
    next_lane: usize,
    stats: FxStats,
}

impl FireEffect {
    /// Build the effect with its full configuration assembled up front.
    /// Pools and their visuals are created here; nothing allocates later.
    pub fn new(
        stage: &mut Stage,
        subject: VisualId,
        variant: FxVariant,
        config: FxConfig,
        seed: u32,
    ) -> Result<Self> {
        config.validate()?;
        if !stage.contains(subject) {
            return Err(EmberError::VisualNotFound(subject.to_string()));
        }

        let flight = FlightPool::new(
            stage,
            config.flight_capacity,
            &config.particle_frame_set,
            config.particle_size,
        );
        let target = match variant {
            FxVariant::Decay => LandingTarget::Decay(LandedPool::new(stage, &config)),
            FxVariant::Evolving => LandingTarget::Evolving(EvolvingPool::new(stage, &config)),
        };

        Ok(Self {
            floor: FloorProvider::new(subject, config.floor_offset),
            flight,
            target,
            budget: SpriteBudget::new(config.sprite_budget),
            timer: SpawnTimer::new(config.spawn_interval),
            angle_sampler: VariedSampler::new(
                config.angle_min_deg,
                config.angle_max_deg,
                config.angle_min_delta,
            ),
            speed_sampler: VariedSampler::new(
                config.speed_min,
                config.speed_max,
                config.speed_min_delta,
            ),
            rng: FxRng::new(seed),
            next_lane: 0,
            stats: FxStats::default(),
            subject,
            config,
        })
    }

    /// One spawn attempt, in validate-before-create order: budget first,
    /// parameters second, pool acquisition third, initialization last.
    /// Scheduler-invoked, but callable externally as a test hook.
    pub fn try_spawn(&mut self, stage: &mut Stage) -> Result<bool> {
        if !self
            .budget
            .admits(self.flight.active_count(), self.target.active_count())
        {
            self.stats.denied_budget += 1;
            return Ok(false);
        }

        // Parameter draws advance the samplers even if acquisition fails
        let angle_deg = self.angle_sampler.sample(&mut self.rng);
        let speed = self.speed_sampler.sample(&mut self.rng);

        let Some(slot) = self.flight.acquire() else {
            self.stats.denied_pool += 1;
            return Ok(false);
        };

        let Some(subject_pos) = stage.get(self.subject).map(|v| v.position) else {
            // Subject vanished between budget check and init — undo the claim
            self.flight.release(slot, stage)?;
            return Ok(false);
        };
        let center = subject_pos + self.config.spawn_offset;
        let lanes = self.config.spawn_lanes;
        let lane = self.next_lane;
        self.next_lane = (self.next_lane + 1) % lanes;
        let strip = (self.config.spawn_extents.x * 2.0) / lanes as f32;
        let strip_lo = center.x - self.config.spawn_extents.x + strip * lane as f32;
        let x = self.rng.range(strip_lo, strip_lo + strip);
        let y = self.rng.range(
            center.y - self.config.spawn_extents.y,
            center.y + self.config.spawn_extents.y,
        );

        let angle = angle_deg.to_radians();
        let visual = self.flight.slot(slot).visual;
        {
            let particle = self.flight.slot_mut(slot);
            particle.velocity = Vec2::new(angle.cos() * speed, angle.sin() * speed);
            particle.age = 0.0;
            particle.max_age = self.config.max_age;
            particle.lane = Some(lane);
        }
        stage.set_position(visual, Vec2::new(x, y))?;
        stage.set_scale(visual, self.config.scale_initial)?;
        stage.set_rotation(visual, angle + self.config.rotation_offset_deg.to_radians())?;
        stage.set_visible(visual, true)?;

        self.stats.spawned += 1;
        Ok(true)
    }

    /// Forward a pointer press to the evolving pool. Always `false` for the
    /// decay variant.
    pub fn click_at(&mut self, services: &mut SceneServices<'_>, point: Vec2) -> Result<bool> {
        match &mut self.target {
            LandingTarget::Evolving(pool) => {
                pool.click_at(services.stage, services.tweener, services.events, point)
            }
            LandingTarget::Decay(_) => Ok(false),
        }
    }

    /// Hand a collected egg's slot back to the pool (evolving variant)
    pub fn release_by_visual(
        &mut self,
        services: &mut SceneServices<'_>,
        visual: VisualId,
    ) -> Result<bool> {
        match &mut self.target {
            LandingTarget::Evolving(pool) => {
                pool.release_by_visual(services.stage, services.tweener, visual)
            }
            LandingTarget::Decay(_) => Ok(false),
        }
    }

    /// Automation probe: a point that would hit a clickable particle
    pub fn clickable_point(&self, stage: &Stage) -> Option<Vec2> {
        match &self.target {
            LandingTarget::Evolving(pool) => pool.clickable_point(stage),
            LandingTarget::Decay(_) => None,
        }
    }

    /// Hot-swap every runtime tunable. Pool capacities are fixed at
    /// construction; a config that changes them is rejected whole.
    pub fn apply_tuning(&mut self, config: FxConfig) -> Result<()> {
        config.validate()?;
        if config.flight_capacity != self.flight.capacity()
            || config.landed_capacity != self.target.capacity()
        {
            return Err(EmberError::ConfigError(
                "pool capacities cannot change at runtime".into(),
            ));
        }

        self.budget.max = config.sprite_budget;
        self.floor.offset = config.floor_offset;
        self.timer.set_interval(config.spawn_interval);
        self.angle_sampler
            .set_range(config.angle_min_deg, config.angle_max_deg);
        self.angle_sampler.set_min_delta(config.angle_min_delta);
        self.speed_sampler.set_range(config.speed_min, config.speed_max);
        self.speed_sampler.set_min_delta(config.speed_min_delta);
        match &mut self.target {
            LandingTarget::Decay(pool) => {
                pool.set_timings(config.pause_secs, config.shrink_secs, config.pivot_offset);
            }
            LandingTarget::Evolving(pool) => pool.apply_tuning(&config),
        }
        self.config = config;
        Ok(())
    }

    pub fn variant(&self) -> FxVariant {
        match self.target {
            LandingTarget::Decay(_) => FxVariant::Decay,
            LandingTarget::Evolving(_) => FxVariant::Evolving,
        }
    }

    pub fn active_flying(&self) -> usize {
        self.flight.active_count()
    }

    pub fn active_landed(&self) -> usize {
        self.target.active_count()
    }

    /// Current live sprite count, main subject included
    pub fn sprite_count(&self) -> usize {
        SpriteBudget::live_count(self.active_flying(), self.active_landed())
    }

    pub fn flight_capacity(&self) -> usize {
        self.flight.capacity()
    }

    pub fn landed_capacity(&self) -> usize {
        self.target.capacity()
    }

    pub fn stats(&self) -> FxStats {
        self.stats
    }

    /// Cancel all timelines and return every slot to its pool
    pub fn reset(&mut self, stage: &mut Stage, tweener: &mut Tweener) -> Result<()> {
        for slot in self.flight.active_slots() {
            self.flight.release(slot, stage)?;
        }
        self.target.reset(stage, tweener)
    }
}

impl DemoSystem for FireEffect {
    fn initialize(&mut self, _services: &mut SceneServices<'_>) -> Result<()> {
        println!(
            "[fx] Fire effect up: {} flight + {} landed slots, budget {}",
            self.flight.capacity(),
            self.target.capacity(),
            self.budget.max
        );
        Ok(())
    }

    fn update(&mut self, services: &mut SceneServices<'_>, dt: f32) -> Result<()> {
        // 1. Decay/recovery progress from the tween scheduler
        let updates = services.tweener.advance(dt);
        self.target
            .apply_updates(services.stage, &updates, services.events)?;

        // 2. Flight physics and the growth ramp
        self.flight.update(
            services.stage,
            dt,
            self.config.gravity,
            self.config.rotation_offset_deg.to_radians(),
        )?;
        apply_scale_growth(
            &self.flight,
            services.stage,
            self.config.scale_initial,
            self.config.scale_peak,
        )?;

        // 3. Collision scan and budget-checked hand-off
        if let Some(floor_y) = self.floor.floor_y(services.stage) {
            for slot in self.flight.active_slots() {
                let visual = self.flight.slot(slot).visual;
                let Some(landing) = check_floor(services.stage, visual, floor_y) else {
                    continue;
                };
                self.flight.release(slot, services.stage)?;
                self.stats.landings += 1;
                services.events.push(DemoEvent::ParticleLanded {
                    x: landing.x,
                    y: landing.y,
                    scale: landing.scale,
                    rotation: landing.rotation,
                });

                if self
                    .budget
                    .admits(self.flight.active_count(), self.target.active_count())
                {
                    if !self.target.spawn(
                        services.stage,
                        services.tweener,
                        landing.x,
                        landing.y,
                        landing.scale,
                    )? {
                        self.stats.landings_dropped += 1;
                    }
                } else {
                    self.stats.landings_dropped += 1;
                }
            }
        }

        // 4. New spawns, budget recomputed fresh per attempt
        let fires = self.timer.fire_count(dt);
        for _ in 0..fires {
            self.try_spawn(services.stage)?;
        }
        Ok(())
    }

    fn shutdown(&mut self, services: &mut SceneServices<'_>) -> Result<()> {
        self.reset(services.stage, services.tweener)?;
        self.target.dispose();
        Ok(())
    }

    fn name(&self) -> &str {
        "fire-effect"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_runtime::EventBus;
    use ember_stage::VisualSpec;

    struct Harness {
        stage: Stage,
        tweener: Tweener,
        events: EventBus,
        fx: FireEffect,
    }

    impl Harness {
        fn new(variant: FxVariant, config: FxConfig) -> Self {
            let mut stage = Stage::new();
            let subject = stage.create(
                VisualSpec::new("bonfire", Vec2::new(200.0, 300.0)).at(Vec2::new(400.0, 500.0)),
            );
            let fx = FireEffect::new(&mut stage, subject, variant, config, 1234).unwrap();
            Self {
                stage,
                tweener: Tweener::new(),
                events: EventBus::new(),
                fx,
            }
        }

        fn tick(&mut self, dt: f32) {
            let mut services = SceneServices {
                stage: &mut self.stage,
                tweener: &mut self.tweener,
                events: &mut self.events,
            };
            self.fx.update(&mut services, dt).unwrap();
        }
    }

    fn landing_config() -> FxConfig {
        // Spawn just above the floor with strong gravity so flights are short
        FxConfig {
            flight_capacity: 6,
            landed_capacity: 8,
            sprite_budget: 10,
            gravity: 2000.0,
            spawn_interval: 0.1,
            spawn_offset: Vec2::new(0.0, -60.0),
            spawn_extents: Vec2::new(60.0, 10.0),
            speed_min: 80.0,
            speed_max: 140.0,
            max_age: 3.0,
            ..FxConfig::default()
        }
    }

    #[test]
    fn rapid_spawns_stop_at_pool_capacity() {
        // Flight pool of 6 under a budget of 10: the pool, not the budget,
        // is the binding constraint
        let mut h = Harness::new(FxVariant::Decay, landing_config());

        for expected in 1..=6 {
            assert!(h.fx.try_spawn(&mut h.stage).unwrap());
            assert_eq!(h.fx.active_flying(), expected);
        }
        assert!(!h.fx.try_spawn(&mut h.stage).unwrap());
        assert_eq!(h.fx.active_flying(), 6);
        assert_eq!(h.fx.stats().denied_pool, 1);
        assert_eq!(h.fx.stats().spawned, 6);
    }

    #[test]
    fn budget_caps_spawning_below_pool_capacity() {
        let config = FxConfig {
            sprite_budget: 4,
            flight_capacity: 8,
            ..landing_config()
        };
        let mut h = Harness::new(FxVariant::Decay, config);

        for _ in 0..8 {
            h.fx.try_spawn(&mut h.stage).unwrap();
        }
        // 1 subject + 3 flying saturates the budget of 4
        assert_eq!(h.fx.active_flying(), 3);
        assert_eq!(h.fx.sprite_count(), 4);
        assert_eq!(h.fx.stats().denied_budget, 5);
    }

    #[test]
    fn budget_invariant_holds_through_a_long_run() {
        let config = FxConfig {
            sprite_budget: 6,
            flight_capacity: 12,
            landed_capacity: 12,
            ..landing_config()
        };
        let mut h = Harness::new(FxVariant::Decay, config);

        for _ in 0..900 {
            h.tick(1.0 / 60.0);
            assert!(
                h.fx.sprite_count() <= 6,
                "budget exceeded: {}",
                h.fx.sprite_count()
            );
            // Pool conservation while we're at it
            assert_eq!(h.fx.flight_capacity(), 12);
            assert_eq!(h.fx.landed_capacity(), 12);
        }
        let stats = h.fx.stats();
        assert!(stats.spawned > 0);
        assert!(stats.landings > 0);
    }

    #[test]
    fn landing_hands_off_to_the_decay_pool() {
        let mut h = Harness::new(FxVariant::Decay, landing_config());

        let mut landed_events = 0;
        for _ in 0..600 {
            h.tick(1.0 / 60.0);
            for event in h.events.drain() {
                if let DemoEvent::ParticleLanded { y, .. } = event {
                    // Landings report the floor line, not the overshoot
                    let floor_y = 500.0 + 150.0 + h.fx.config.floor_offset;
                    assert!((y - floor_y).abs() < 1e-3);
                    landed_events += 1;
                }
            }
        }
        assert!(landed_events > 0);
        assert_eq!(h.fx.stats().landings, landed_events);
    }

    #[test]
    fn landings_drop_when_landed_pool_is_full() {
        let config = FxConfig {
            landed_capacity: 1,
            sprite_budget: 30,
            // Long pause so landed slots stay busy
            pause_secs: 30.0,
            ..landing_config()
        };
        let mut h = Harness::new(FxVariant::Decay, config);

        for _ in 0..900 {
            h.tick(1.0 / 60.0);
        }
        let stats = h.fx.stats();
        assert!(stats.landings > 1);
        assert!(stats.landings_dropped > 0);
        assert_eq!(h.fx.active_landed(), 1);
    }

    #[test]
    fn evolving_variant_lands_and_takes_clicks() {
        let mut h = Harness::new(FxVariant::Evolving, landing_config());

        // Run until something is clickable
        let mut point = None;
        for _ in 0..1200 {
            h.tick(1.0 / 60.0);
            point = h.fx.clickable_point(&h.stage);
            if point.is_some() {
                break;
            }
        }
        let point = point.expect("nothing landed in 20 simulated seconds");

        let mut services = SceneServices {
            stage: &mut h.stage,
            tweener: &mut h.tweener,
            events: &mut h.events,
        };
        assert!(h.fx.click_at(&mut services, point).unwrap());
    }

    #[test]
    fn decay_variant_ignores_clicks() {
        let mut h = Harness::new(FxVariant::Decay, landing_config());
        let mut services = SceneServices {
            stage: &mut h.stage,
            tweener: &mut h.tweener,
            events: &mut h.events,
        };
        assert!(!h.fx.click_at(&mut services, Vec2::new(400.0, 600.0)).unwrap());
        assert!(h.fx.clickable_point(&h.stage).is_none());
    }

    #[test]
    fn tuning_applies_hot_but_capacities_are_fixed() {
        let mut h = Harness::new(FxVariant::Decay, landing_config());

        let mut tuned = landing_config();
        tuned.gravity = 500.0;
        tuned.sprite_budget = 3;
        h.fx.apply_tuning(tuned).unwrap();
        assert_eq!(h.fx.budget.max, 3);

        let mut bad = landing_config();
        bad.flight_capacity += 1;
        assert!(h.fx.apply_tuning(bad).is_err());
    }

    #[test]
    fn reset_returns_everything_to_the_pools() {
        let mut h = Harness::new(FxVariant::Decay, landing_config());
        for _ in 0..300 {
            h.tick(1.0 / 60.0);
        }
        assert!(h.fx.sprite_count() > 1);

        let Harness {
            stage, tweener, fx, ..
        } = &mut h;
        fx.reset(stage, tweener).unwrap();
        assert_eq!(fx.active_flying(), 0);
        assert_eq!(fx.active_landed(), 0);
        assert_eq!(fx.sprite_count(), 1);
        assert_eq!(tweener.active_count(), 0);
    }

    #[test]
    fn rejects_a_dead_subject() {
        let mut stage = Stage::new();
        let subject = stage.create(VisualSpec::new("bonfire", Vec2::ONE));
        stage.destroy(subject).unwrap();
        assert!(
            FireEffect::new(&mut stage, subject, FxVariant::Decay, FxConfig::default(), 1)
                .is_err()
        );
    }
}
