use log::{error, info};
use pantilt_common::sim::{SharedTrace, SimActuator, SimDelay, SimSignal};
use pantilt_common::{Actuator, Axis, Puppet, RngSource, Scheduler};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

// Modules
mod config;
mod trace;

use config::HostConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PANTILT_CONFIG").ok())
        .map(PathBuf::from);
    let host = match path {
        Some(ref path) => {
            info!("config: {}", path.display());
            HostConfig::load(path)?
        }
        None => HostConfig::default(),
    };

    let motion = host.motion_config();
    motion.validate()?;
    let seed = host.seed.unwrap_or_else(seed_from_clock);
    info!(
        "horizontal {}..={}, vertical {}..={}, seed {}",
        motion.horizontal.min, motion.horizontal.max, motion.vertical.min, motion.vertical.max, seed
    );

    // both servos come up centered in their range
    let trace = SharedTrace::default();
    let actuator = SimActuator::new(
        trace.clone(),
        motion.horizontal.center(),
        motion.vertical.center(),
    );
    let delay = if host.realtime {
        SimDelay::realtime(trace.clone())
    } else {
        SimDelay::new(trace.clone())
    };
    let puppet = Puppet::new(
        actuator,
        delay,
        RngSource(StdRng::seed_from_u64(seed)),
        SimSignal::new(trace.clone()),
        motion,
    )?;
    let mut scheduler = Scheduler::new(puppet);

    scheduler.startup()?;
    let mut tally: BTreeMap<&'static str, u32> = BTreeMap::new();
    for _ in 0..host.iterations {
        let behavior = scheduler.tick()?;
        *tally.entry(behavior.to_str()).or_default() += 1;
    }

    let elapsed = trace.borrow().now();
    info!(
        "{} behaviors in {:.1} s simulated",
        scheduler.ticks(),
        elapsed.as_secs_f64()
    );
    for (name, count) in &tally {
        info!("  {:<18} {}", name, count);
    }
    let actuator = scheduler.puppet().actuator();
    info!(
        "resting at horizontal {}, vertical {}",
        actuator.angle(Axis::Horizontal),
        actuator.angle(Axis::Vertical)
    );

    if let Some(path) = host.trace_csv {
        let csv = trace::export_to_csv(trace.borrow().events())?;
        std::fs::write(&path, csv)?;
        info!("trace written to {}", path.display());
    }
    Ok(())
}

/// Microseconds since the epoch.
fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
