//! Yardstation — Main Entry Point
//!
//! Hexagonal architecture around a fixed-cadence polling loop:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                  │
//! │                                                          │
//! │   GpioAdapter        FileStore        LogEventSink       │
//! │   (GpioPort+Delay)   (StorePort)      (EventSink)        │
//! │                                                          │
//! │  ───────────── Port Trait Boundary ─────────────────     │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │          StationService (pure logic)           │      │
//! │  │  debounce fusion · flash hysteresis · signal   │      │
//! │  └────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The loop is deliberately a fixed-period poll, not event-driven: the
//! light stack tolerates and expects bounded latency, and a predictable
//! actuation cadence is worth more here than push-based immediacy.

#![deny(unused_must_use)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};

use yardstation::adapters::file_store::FileStore;
use yardstation::adapters::gpio::GpioAdapter;
use yardstation::adapters::log_sink::LogEventSink;
use yardstation::app::service::StationService;
use yardstation::config::StationConfig;

fn main() -> Result<()> {
    // ── 1. Logger ─────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("yardstation v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration (fatal on any defect) ────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "station.json".to_string());
    let mut config = StationConfig::load(Path::new(&config_path))
        .with_context(|| format!("loading config from {}", config_path))?;

    if config.station_name.is_empty() {
        if let Some(name) = station_name_from_host() {
            info!("station name derived from host: '{}'", name);
            config.station_name = name;
        }
    }
    config.validate().context("invalid station configuration")?;
    info!(
        "station '{}': sensors [{}, {}], lamps [{}, {}, {}], store {}",
        config.station_name,
        config.pins.sensor_a,
        config.pins.sensor_b,
        config.pins.lamp_red,
        config.pins.lamp_green,
        config.pins.lamp_blue,
        config.store_path,
    );

    // ── 3. Adapters ───────────────────────────────────────────
    let mut hw = GpioAdapter::new(&config.pins).context("configuring GPIO")?;
    let mut store = FileStore::new(&config.store_path);
    let mut sink = LogEventSink::new();

    // ── 4. Shutdown flag (honored between ticks, never mid-write) ──
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("installing shutdown handler")?;
    }

    // ── 5. Service + control loop ─────────────────────────────
    let mut service = StationService::new(&config);
    service.start(&mut sink);

    let period = Duration::from_millis(u64::from(config.tick_interval_ms));
    let mut next_tick = Instant::now() + period;
    info!("entering control loop ({} ms tick)", config.tick_interval_ms);

    loop {
        if shutdown.load(Ordering::SeqCst) {
            info!("shutdown requested — stopping between ticks");
            break;
        }

        service.tick(&mut hw, &mut store, &mut sink);

        // Fixed cadence: sleep to the next tick boundary. A slow store or
        // a debounce confirm can overrun one period; resynchronise rather
        // than bursting to catch up.
        match next_tick.checked_duration_since(Instant::now()) {
            Some(remaining) => std::thread::sleep(remaining),
            None => {
                warn!("tick overran its period — resynchronising");
                next_tick = Instant::now();
            }
        }
        next_tick += period;
    }

    service.lights_out(&mut hw);
    info!("stopped after {} ticks", service.tick_count());
    Ok(())
}

/// Derive the station name from the host name, text before the first `-`
/// (yard convention: hosts are named `<station>-<site>`).
fn station_name_from_host() -> Option<String> {
    let raw = fs::read_to_string("/proc/sys/kernel/hostname").ok()?;
    let prefix = raw.trim().split('-').next()?.trim();
    if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    }
}
