//! Station service — the control-loop core.
//!
//! [`StationService`] owns the cached station record, the presence pair,
//! the flash hysteresis timer, and the signal stack. One call to
//! [`tick`](StationService::tick) runs the full cycle:
//!
//! ```text
//!  StorePort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                │       StationService         │
//!   GpioPort ◀──▶│  fetch · sense · publish ·   │
//!                │  hysteresis · light          │
//!                └──────────────────────────────┘
//! ```
//!
//! Every per-tick failure is absorbed here: collaborator errors degrade
//! the tick (cached values, dropped write, frozen lamp state) and are
//! logged, but nothing escapes to disturb the schedule. Only construction
//! can fail, and construction failures are fatal by design.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};
use serde_json::Value;

use crate::config::StationConfig;
use crate::control::hysteresis::FlashHysteresis;
use crate::record::{FIELD_IN_PLACE, StationRecord};
use crate::sensors::PresencePair;
use crate::sensors::presence::DebouncedSensor;
use crate::signal::{LampColor, SignalStack};

use super::events::{AppEvent, StationTelemetry};
use super::ports::{EventSink, GpioPort, StoreError, StorePort};

// ───────────────────────────────────────────────────────────────
// StationService
// ───────────────────────────────────────────────────────────────

/// Orchestrates one station's sensing, signalling, and store traffic.
pub struct StationService {
    /// Store key and log identity, fixed at construction. The cached
    /// record's own `name` field is never trusted for addressing.
    station_name: String,
    /// Cached copy of the shared document; refreshed each tick when the
    /// store answers, retained when it does not.
    record: StationRecord,
    sensors: PresencePair,
    signal: SignalStack,
    flash: FlashHysteresis,
    /// Whether the flash window was open at the last hysteresis update.
    flash_enabled: bool,
    /// Debounced fusion result of the previous tick.
    cart_present: bool,
    tick_count: u64,
    /// Ticks between telemetry emissions.
    telemetry_ticks: u64,
    /// True while the store is failing; gates the degraded/recovered logs
    /// to episode edges instead of once per tick.
    store_degraded: bool,
}

impl StationService {
    /// Construct the service from configuration.
    ///
    /// The config must already be validated — pin bindings are taken as
    /// given here.
    pub fn new(config: &StationConfig) -> Self {
        let sensors = PresencePair::new(
            DebouncedSensor::new(config.pins.sensor_a, config.debounce_confirm_ms),
            DebouncedSensor::new(config.pins.sensor_b, config.debounce_confirm_ms),
        );
        let signal = SignalStack::new(
            config.pins.lamp_red,
            config.pins.lamp_green,
            config.pins.lamp_blue,
        );
        let telemetry_ticks =
            (u64::from(config.telemetry_interval_secs) * 1000 / u64::from(config.tick_interval_ms))
                .max(1);

        Self {
            station_name: config.station_name.clone(),
            record: StationRecord::named(&config.station_name),
            sensors,
            signal,
            flash: FlashHysteresis::new(config.flash_timer_ticks),
            flash_enabled: false,
            cart_present: false,
            tick_count: 0,
            telemetry_ticks,
            store_degraded: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce startup. The first tick performs the first store fetch —
    /// nothing is decided before it.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started {
            station: self.station_name.clone(),
        });
        info!("station '{}' controller started", self.station_name);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle: fetch → sense → publish → hysteresis
    /// → light.
    ///
    /// The `hw` parameter satisfies **both** [`GpioPort`] and [`DelayNs`]
    /// — the debounce confirmation wait belongs to the same hardware
    /// adapter as the reads, and bundling them avoids a double mutable
    /// borrow while keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl GpioPort + DelayNs),
        store: &mut impl StorePort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Refresh the cached record (in_progress, enabled, foreign
        //    fields) from the shared store.
        self.refresh_record(store, sink);

        // 2. Debounced two-sensor fusion.
        let reading = self.sensors.read(hw);
        if reading.in_place != self.cart_present {
            info!(
                "station '{}': cart {}",
                self.station_name,
                if reading.in_place { "arrived" } else { "departed" }
            );
            sink.emit(&AppEvent::PresenceChanged {
                in_place: reading.in_place,
            });
        }
        self.cart_present = reading.in_place;
        // The cache must carry this tick's fused result, never a stale one.
        self.record.in_place = reading.in_place;

        // 3. Publish the presence flag as a field-scoped update. A failed
        //    write is dropped, not queued — the next tick writes again.
        if let Err(e) =
            store.update_field(&self.station_name, FIELD_IN_PLACE, Value::Bool(reading.in_place))
        {
            warn!(
                "station '{}': in_place update dropped for this tick: {}",
                self.station_name, e
            );
        }

        // 4. Flash hysteresis. Armed while a cart is present; counted down
        //    while the station is idle; frozen while an operation runs
        //    without a cart (blue wins regardless, and the countdown
        //    resumes afterwards).
        if reading.in_place {
            self.flash.arm();
        } else if !self.record.in_progress {
            self.flash_enabled = self.flash.tick();
        }

        // 5. Compute and apply the lamp color. A disabled station goes
        //    dark without advancing the blink phase.
        let prev_applied = self.signal.last_applied();
        let color = if self.record.enabled {
            self.signal
                .next_color(reading.in_place, self.record.in_progress, self.flash_enabled)
        } else {
            LampColor::Off
        };
        match self.signal.apply(hw, color) {
            Ok(()) => {
                if prev_applied != Some(color) && !flash_pair(prev_applied, color) {
                    sink.emit(&AppEvent::SignalChanged { color });
                }
            }
            Err(e) => {
                warn!(
                    "station '{}': light stack write failed ({}), keeping previous state",
                    self.station_name, e
                );
            }
        }

        debug!(
            "tick {}: in_place={} in_progress={} flash_remaining={} color={:?}",
            self.tick_count,
            reading.in_place,
            self.record.in_progress,
            self.flash.remaining(),
            self.signal.last_applied(),
        );

        if self.tick_count % self.telemetry_ticks == 0 {
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    /// Drive the stack dark. Called on clean shutdown, between ticks.
    pub fn lights_out(&mut self, hw: &mut impl GpioPort) {
        if let Err(e) = self.signal.apply(hw, LampColor::Off) {
            warn!("light stack not extinguished on shutdown: {}", e);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current tick state.
    pub fn build_telemetry(&self) -> StationTelemetry {
        StationTelemetry {
            in_place: self.cart_present,
            in_progress: self.record.in_progress,
            enabled: self.record.enabled,
            flash_remaining: self.flash.remaining(),
            color: self.signal.last_applied().unwrap_or(LampColor::Off),
            tick_count: self.tick_count,
        }
    }

    /// Debounced fusion result of the latest tick.
    pub fn cart_present(&self) -> bool {
        self.cart_present
    }

    /// Cached `in_progress` flag (last successful fetch).
    pub fn in_progress(&self) -> bool {
        self.record.in_progress
    }

    /// Ticks left on the flash hysteresis timer.
    pub fn flash_remaining(&self) -> u32 {
        self.flash.remaining()
    }

    /// Color most recently applied to the physical stack.
    pub fn last_color(&self) -> Option<LampColor> {
        self.signal.last_applied()
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Whether the store is currently in a degraded episode.
    pub fn store_degraded(&self) -> bool {
        self.store_degraded
    }

    // ── Internal ──────────────────────────────────────────────

    fn refresh_record(&mut self, store: &mut impl StorePort, sink: &mut impl EventSink) {
        match store.fetch_record(&self.station_name) {
            Ok(rec) => {
                if self.store_degraded {
                    info!("station '{}': store recovered", self.station_name);
                    sink.emit(&AppEvent::StoreRecovered);
                    self.store_degraded = false;
                }
                self.record = rec;
            }
            Err(e) => {
                if !self.store_degraded {
                    match e {
                        StoreError::NotFound => warn!(
                            "station '{}': no record yet — will be created on first write",
                            self.station_name
                        ),
                        StoreError::Unavailable => warn!(
                            "station '{}': store fetch failed, using cached values",
                            self.station_name
                        ),
                    }
                    sink.emit(&AppEvent::StoreDegraded);
                    self.store_degraded = true;
                }
            }
        }
    }
}

/// Red/Off transitions inside a flash episode are blink phase, not a
/// signal change.
fn flash_pair(prev: Option<LampColor>, next: LampColor) -> bool {
    matches!(prev, Some(LampColor::Red | LampColor::Off))
        && matches!(next, LampColor::Red | LampColor::Off)
}
