//! Battle Station - skirmish runner
//!
//! Brings the platform online, fires the main weapon and throws random
//! damage volleys at it until the volleys run out or the station is lost.

use std::time::Duration;

use battle_station::{Damage, DamageType, Platform, PlatformConfig, PlatformStatus, ShotHandle};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Skirmish runner - pits the platform against random fire
#[derive(Parser, Debug)]
#[command(name = "battle-station")]
#[command(about = "Run a skirmish against the battle station and report its state")]
struct Args {
    /// Platform config file (TOML), stock values when omitted
    #[arg(long)]
    config: Option<String>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of incoming damage volleys
    #[arg(long, default_value_t = 20)]
    volleys: u32,

    /// Pause between volleys in milliseconds
    #[arg(long, default_value_t = 250)]
    volley_interval_ms: u64,

    /// Largest damage level of a single volley
    #[arg(long, default_value_t = 400)]
    max_damage: i64,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

/// Final report of a skirmish
#[derive(Serialize)]
struct SkirmishReport {
    seed: u64,
    volleys_taken: u32,
    shot: String,
    outcome: String,
    status: PlatformStatus,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("battle_station=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PlatformConfig::load(path)?,
        None => PlatformConfig::default(),
    };
    let seed = args
        .seed
        .or(config.routing.seed)
        .unwrap_or_else(rand::random);
    config.routing.seed = Some(seed);

    tracing::info!("Starting skirmish with seed {}", seed);
    let platform = Platform::assemble(&config);
    platform.start().await?;

    let shot = match platform.fire().await {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("Main weapon unavailable: {}", e);
            None
        }
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let (volleys_taken, mut outcome) = run_volleys(&platform, &args, &mut rng).await?;

    if let Err(e) = platform.stop().await {
        tracing::error!("Shutdown failed: {}", e);
        if e.is_fatal() {
            outcome = e.to_string();
        }
    }
    let shot = describe_shot(shot);

    let report = SkirmishReport {
        seed,
        volleys_taken,
        shot,
        outcome,
        status: platform.status(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Fire random volleys at the platform, stopping early if it is destroyed
async fn run_volleys(
    platform: &Platform,
    args: &Args,
    rng: &mut StdRng,
) -> Result<(u32, String), Box<dyn std::error::Error>> {
    let interval = Duration::from_millis(args.volley_interval_ms);
    let max_damage = args.max_damage.max(0);

    for volley in 0..args.volleys {
        tokio::time::sleep(interval).await;

        let kind = DamageType::ALL[rng.gen_range(0..DamageType::ALL.len())];
        let damage = Damage::new(rng.gen_range(0..=max_damage), kind)?;

        match platform.take_damage(damage).await {
            Ok(report) => {
                tracing::info!(
                    "Volley {}: {} hit {:?}, health {} shield {}",
                    volley + 1,
                    damage,
                    report.target,
                    platform.health_level(),
                    platform.shield_level()
                );
            }
            Err(e) if e.is_fatal() => {
                tracing::error!("Volley {} destroyed the station: {}", volley + 1, e);
                return Ok((volley + 1, e.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok((args.volleys, "survived".to_string()))
}

fn describe_shot(shot: Option<ShotHandle>) -> String {
    let Some(handle) = shot else {
        return "not fired".to_string();
    };
    match handle.try_outcome() {
        Some(Ok(outcome)) => format!("{:?}", outcome),
        Some(Err(e)) => format!("failed: {}", e),
        None => "still charging".to_string(),
    }
}

fn print_report(report: &SkirmishReport) {
    let status = &report.status;
    println!();
    println!("=== SKIRMISH REPORT (seed {}) ===", report.seed);
    println!("Volleys taken: {}", report.volleys_taken);
    println!("Outcome:       {}", report.outcome);
    println!("Main weapon:   {}", report.shot);
    println!(
        "Hull:          {}/{} ({:.0}%)",
        status.hull_health,
        status.max_hull_health,
        status.hull_ratio() * 100.0
    );
    println!("Total health:  {}", status.health_level);
    println!("Shield:        {}", status.shield_level);
    for component in &status.components {
        println!(
            "  {:<18} health {:>4}  {}",
            component.name,
            component.health_level,
            if component.is_active { "online" } else { "offline" }
        );
    }
}
