//! Headless gunnery duel
//!
//! Two ships trade main-battery fire at a fixed range until one sinks or
//! time runs out. Prints a JSON or text summary.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use broadside::core::error::Result;
use broadside::core::types::ShipId;
use broadside::{CombatConfig, DamageEvent, Fleet, ProfileCatalog};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Headless gunnery duel between two ship classes
#[derive(Parser, Debug)]
#[command(name = "duel")]
#[command(about = "Run a two-ship gunnery duel and report the outcome")]
struct Args {
    /// Class key of the first ship
    #[arg(long, default_value = "destroyer")]
    blue: String,

    /// Class key of the second ship
    #[arg(long, default_value = "battleship")]
    red: String,

    /// Directory of ship profile TOML files (defaults to the bundled set)
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Combat config TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Engagement range in meters
    #[arg(long, default_value_t = 8000.0)]
    range_m: f64,

    /// Speed both ships hold, in knots
    #[arg(long, default_value_t = 20.0)]
    speed: f64,

    /// Give up after this many simulated seconds
    #[arg(long, default_value_t = 1800)]
    max_secs: u64,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

#[derive(Serialize)]
struct SideReport {
    class: String,
    name: String,
    sunk: bool,
    hull_percent: f64,
    shots_fired: u32,
    hits_scored: u32,
    damage_dealt: u64,
    speed_cap_kts: f64,
    fire_percent: f64,
    turrets_lost: usize,
}

#[derive(Serialize)]
struct DuelReport {
    outcome: String,
    seconds: u64,
    seed: u64,
    blue: SideReport,
    red: SideReport,
}

#[derive(Default)]
struct Gunnery {
    shots: u32,
    hits: u32,
    damage: u64,
    /// Seconds until each turret may fire again
    reloads: BTreeMap<String, f64>,
}

impl Gunnery {
    /// Count a turret's reload down by `dt`; true once it may fire
    fn reload_ready(&mut self, turret: &str, dt: Duration) -> bool {
        let remaining = self.reloads.entry(turret.to_string()).or_insert(0.0);
        *remaining = (*remaining - dt.as_secs_f64()).max(0.0);
        *remaining <= 0.0
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("broadside=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        tracing::error!("Duel aborted: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let seed = args.seed.unwrap_or_else(rand::random);
    let catalog = match &args.profiles {
        Some(dir) => ProfileCatalog::load_dir(dir)?,
        None => ProfileCatalog::builtin()?,
    };
    let config = match &args.config {
        Some(path) => CombatConfig::load(path)?,
        None => CombatConfig::default(),
    };

    let mut fleet = Fleet::new(catalog, config, seed);
    let blue = fleet.spawn(&args.blue)?;
    let red = fleet.spawn(&args.red)?;
    for id in [blue, red] {
        fleet.get_mut(id)?.helm_mut().set_speed_from_slider(args.speed);
    }

    let mut gunnery: BTreeMap<ShipId, Gunnery> = BTreeMap::new();
    let dt = Duration::from_secs(1);
    let mut seconds = 0;

    while seconds < args.max_secs {
        for (shooter, target) in [(blue, red), (red, blue)] {
            volley(&mut fleet, &mut gunnery, shooter, target, args.range_m, dt)?;
        }

        for (id, event) in fleet.advance(dt) {
            if event == DamageEvent::Sunk {
                tracing::info!("{} went down at t+{}s", fleet.get(id)?.state().name(), seconds);
            }
        }
        seconds += 1;

        if fleet.get(blue)?.is_sunk() || fleet.get(red)?.is_sunk() {
            break;
        }
    }

    let blue_sunk = fleet.get(blue)?.is_sunk();
    let red_sunk = fleet.get(red)?.is_sunk();
    let outcome = match (blue_sunk, red_sunk) {
        (false, true) => "blue_victory",
        (true, false) => "red_victory",
        (true, true) => "mutual_destruction",
        (false, false) => "draw",
    };

    let report = DuelReport {
        outcome: outcome.to_string(),
        seconds,
        seed,
        blue: side_report(&fleet, &gunnery, blue, &args.blue)?,
        red: side_report(&fleet, &gunnery, red, &args.red)?,
    };

    if args.format == "text" {
        println!("Outcome: {} after {}s (seed {})", report.outcome, report.seconds, seed);
        for side in [&report.blue, &report.red] {
            println!(
                "  {:<10} {:<10} sunk={:<5} hull={:>5.1}% hits={}/{} dmg={} cap={:.1}kt",
                side.class,
                side.name,
                side.sunk,
                side.hull_percent,
                side.hits_scored,
                side.shots_fired,
                side.damage_dealt,
                side.speed_cap_kts
            );
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn volley(
    fleet: &mut Fleet,
    gunnery: &mut BTreeMap<ShipId, Gunnery>,
    shooter: ShipId,
    target: ShipId,
    range_m: f64,
    dt: Duration,
) -> Result<()> {
    let (turrets, reload_secs, reload_multipliers) = {
        let model = fleet.get(shooter)?;
        let battery = &model.profile().weapons.main_battery;
        let multipliers: BTreeMap<String, f64> = model
            .effects()
            .turrets
            .iter()
            .map(|(name, fx)| (name.clone(), fx.reload_multiplier))
            .collect();
        (battery.turrets.clone(), battery.reload_secs, multipliers)
    };

    let record = gunnery.entry(shooter).or_default();
    for turret in turrets {
        if !record.reload_ready(&turret, dt) {
            continue;
        }

        let Some(outcome) = fleet.fire(shooter, target, &turret, range_m)? else {
            continue;
        };
        let multiplier = reload_multipliers.get(&turret).copied().unwrap_or(1.0);
        record.reloads.insert(turret, reload_secs * multiplier);
        record.shots += 1;
        if outcome.hit {
            record.hits += 1;
            record.damage += u64::from(outcome.damage);
        }
    }
    Ok(())
}

fn side_report(
    fleet: &Fleet,
    gunnery: &BTreeMap<ShipId, Gunnery>,
    id: ShipId,
    class: &str,
) -> Result<SideReport> {
    let model = fleet.get(id)?;
    let record = gunnery.get(&id);
    Ok(SideReport {
        class: class.to_string(),
        name: model.state().name().to_string(),
        sunk: model.is_sunk(),
        hull_percent: model.hull().ratio() * 100.0,
        shots_fired: record.map(|r| r.shots).unwrap_or(0),
        hits_scored: record.map(|r| r.hits).unwrap_or(0),
        damage_dealt: record.map(|r| r.damage).unwrap_or(0),
        speed_cap_kts: model.effects().speed_cap_kts,
        fire_percent: model.effects().fire_percent,
        turrets_lost: model.fire_locks().len(),
    })
}
