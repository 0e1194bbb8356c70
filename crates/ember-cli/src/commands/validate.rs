//! Config validation command

use anyhow::{Context, Result};
use ember_fx::FxConfig;

pub fn run(path: &str) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {path}"))?;
    let table: toml::value::Table =
        toml::from_str(&text).with_context(|| format!("parsing {path}"))?;

    let config = FxConfig::from_toml(&table);
    config.validate()?;

    println!("{path} is valid");
    println!(
        "  pools: {} flight / {} landed, budget {}",
        config.flight_capacity, config.landed_capacity, config.sprite_budget
    );
    println!(
        "  spawn: every {:.2}s, angles [{}, {}] deg (min delta {})",
        config.spawn_interval, config.angle_min_deg, config.angle_max_deg, config.angle_min_delta
    );
    println!(
        "  decay: {:.2}s pause + {:.2}s shrink, pivot {}px",
        config.pause_secs, config.shrink_secs, config.pivot_offset
    );
    Ok(())
}
