//! Headless simulation run

use anyhow::{bail, Context, Result};
use ember_core::Vec2;
use ember_fx::{FireEffect, FxConfig, FxVariant};
use ember_runtime::{DemoClock, DemoEvent, DemoSystem, EventBus, SceneServices};
use ember_stage::{Stage, VisualSpec};
use ember_tween::Tweener;

pub struct RunArgs {
    pub config: Option<String>,
    pub ticks: u64,
    pub seed: u32,
    pub variant: String,
    pub click_every: Option<u64>,
    pub format: String,
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let variant = parse_variant(&args.variant)?;

    let mut stage = Stage::new();
    let subject = stage.create(
        VisualSpec::new("bonfire", Vec2::new(200.0, 300.0)).at(Vec2::new(400.0, 500.0)),
    );
    let mut tweener = Tweener::new();
    let mut events = EventBus::new();
    let mut clock = DemoClock::new();
    let mut fx = FireEffect::new(&mut stage, subject, variant, config, args.seed)?;

    {
        let mut services = SceneServices {
            stage: &mut stage,
            tweener: &mut tweener,
            events: &mut events,
        };
        fx.initialize(&mut services)?;
    }

    let mut landings = 0u64;
    let mut expired = 0u64;
    let mut eggs = 0u64;
    let mut clicks = 0u64;

    for tick in 0..args.ticks {
        clock.advance(clock.fixed_timestep);
        while clock.should_fixed_update() {
            clock.consume_fixed_step();
            let dt = clock.fixed_timestep as f32;
            let mut services = SceneServices {
                stage: &mut stage,
                tweener: &mut tweener,
                events: &mut events,
            };
            fx.update(&mut services, dt)?;
        }

        if let Some(every) = args.click_every {
            if every > 0 && tick % every == 0 {
                if let Some(point) = fx.clickable_point(&stage) {
                    let mut services = SceneServices {
                        stage: &mut stage,
                        tweener: &mut tweener,
                        events: &mut events,
                    };
                    if fx.click_at(&mut services, point)? {
                        clicks += 1;
                    }
                }
            }
        }

        for event in events.drain() {
            match event {
                DemoEvent::ParticleLanded { .. } => landings += 1,
                DemoEvent::LandedExpired { .. } => expired += 1,
                DemoEvent::EggCreated { visual, .. } => {
                    eggs += 1;
                    // Stand in for the fly-to-counter animation: collect the
                    // egg right away so the slot frees up
                    let mut services = SceneServices {
                        stage: &mut stage,
                        tweener: &mut tweener,
                        events: &mut events,
                    };
                    fx.release_by_visual(&mut services, visual)?;
                }
            }
        }
    }

    let stats = fx.stats();
    let final_flying = fx.active_flying();
    let final_landed = fx.active_landed();
    let final_sprites = fx.sprite_count();

    {
        let mut services = SceneServices {
            stage: &mut stage,
            tweener: &mut tweener,
            events: &mut events,
        };
        fx.shutdown(&mut services)?;
    }

    match args.format.as_str() {
        "json" => {
            let summary = serde_json::json!({
                "ticks": args.ticks,
                "variant": args.variant,
                "seed": args.seed,
                "spawned": stats.spawned,
                "denied_budget": stats.denied_budget,
                "denied_pool": stats.denied_pool,
                "landings": stats.landings,
                "landings_dropped": stats.landings_dropped,
                "expired": expired,
                "clicks": clicks,
                "eggs": eggs,
                "final": {
                    "flying": final_flying,
                    "landed": final_landed,
                    "sprites": final_sprites,
                },
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            println!("Ran {} tick(s) ({} variant, seed {})", args.ticks, args.variant, args.seed);
            println!("  spawned:           {}", stats.spawned);
            println!("  denied (budget):   {}", stats.denied_budget);
            println!("  denied (pool):     {}", stats.denied_pool);
            println!("  landings:          {} ({} dropped)", stats.landings, stats.landings_dropped);
            println!("  decayed away:      {expired}");
            if variant == FxVariant::Evolving {
                println!("  clicks delivered:  {clicks}");
                println!("  eggs collected:    {eggs}");
            }
            println!(
                "  final sprites:     {final_sprites} ({final_flying} flying, {final_landed} landed)"
            );
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> Result<FxConfig> {
    let Some(path) = path else {
        return Ok(FxConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {path}"))?;
    let table: toml::value::Table =
        toml::from_str(&text).with_context(|| format!("parsing {path}"))?;
    let config = FxConfig::from_toml(&table);
    config.validate()?;
    Ok(config)
}

fn parse_variant(name: &str) -> Result<FxVariant> {
    match name {
        "decay" => Ok(FxVariant::Decay),
        "egg" | "evolving" => Ok(FxVariant::Evolving),
        other => bail!("unknown variant '{other}'; valid values: decay, egg"),
    }
}
