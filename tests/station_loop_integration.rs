//! Integration tests: StationService → ports → lamp state.
//!
//! Drives full control ticks through mock adapters and asserts on the
//! rendered lamp state, the store traffic, and the emitted events.

use std::collections::HashMap;

use embedded_hal::delay::DelayNs;
use serde_json::{Value, json};

use yardstation::app::events::AppEvent;
use yardstation::app::ports::{EventSink, GpioPort, IoError, Level, StoreError, StorePort};
use yardstation::app::service::StationService;
use yardstation::config::StationConfig;
use yardstation::record::FIELD_IN_PLACE;
use yardstation::signal::LampColor;

// ── Mock hardware ─────────────────────────────────────────────

/// GPIO mock: settable sensor levels, recorded lamp lines, optional
/// failure injection per side.
struct MockHw {
    inputs: HashMap<u8, bool>,
    lamps: HashMap<u8, bool>,
    fail_reads: bool,
    fail_writes: bool,
    delays_ms: Vec<u32>,
}

impl MockHw {
    fn new(config: &StationConfig) -> Self {
        Self {
            inputs: HashMap::from([(config.pins.sensor_a, false), (config.pins.sensor_b, false)]),
            lamps: HashMap::from([
                (config.pins.lamp_red, false),
                (config.pins.lamp_green, false),
                (config.pins.lamp_blue, false),
            ]),
            fail_reads: false,
            fail_writes: false,
            delays_ms: Vec::new(),
        }
    }

    fn set_sensors(&mut self, config: &StationConfig, a: bool, b: bool) {
        self.inputs.insert(config.pins.sensor_a, a);
        self.inputs.insert(config.pins.sensor_b, b);
    }

    /// Decode the lamp lines back into a color.
    fn lit_color(&self, config: &StationConfig) -> LampColor {
        let r = self.lamps[&config.pins.lamp_red];
        let g = self.lamps[&config.pins.lamp_green];
        let b = self.lamps[&config.pins.lamp_blue];
        match (r, g, b) {
            (true, false, false) => LampColor::Red,
            (false, true, false) => LampColor::Green,
            (false, false, true) => LampColor::Blue,
            (false, false, false) => LampColor::Off,
            _ => panic!("two lamps lit at once: r={r} g={g} b={b}"),
        }
    }
}

impl GpioPort for MockHw {
    fn read_input(&mut self, pin: u8) -> Result<Level, IoError> {
        if self.fail_reads {
            return Err(IoError::ReadFailed(pin));
        }
        match self.inputs.get(&pin) {
            Some(true) => Ok(Level::Active),
            Some(false) => Ok(Level::Inactive),
            None => Err(IoError::UnknownPin(pin)),
        }
    }

    fn write_output(&mut self, pin: u8, high: bool) -> Result<(), IoError> {
        if self.fail_writes {
            return Err(IoError::WriteFailed(pin));
        }
        match self.lamps.get_mut(&pin) {
            Some(level) => {
                *level = high;
                Ok(())
            }
            None => Err(IoError::UnknownPin(pin)),
        }
    }
}

impl DelayNs for MockHw {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ms.push(ns / 1_000_000);
    }
}

// ── Mock store ────────────────────────────────────────────────

struct MockStore {
    docs: HashMap<String, Value>,
    fail_fetch: bool,
    fail_update: bool,
    updates: Vec<(String, String, Value)>,
}

impl MockStore {
    fn new() -> Self {
        Self {
            docs: HashMap::new(),
            fail_fetch: false,
            fail_update: false,
            updates: Vec::new(),
        }
    }

    fn seed(&mut self, name: &str, doc: Value) {
        self.docs.insert(name.to_string(), doc);
    }
}

impl StorePort for MockStore {
    fn fetch_record(&mut self, station_name: &str) -> Result<yardstation::record::StationRecord, StoreError> {
        if self.fail_fetch {
            return Err(StoreError::Unavailable);
        }
        let doc = self.docs.get(station_name).ok_or(StoreError::NotFound)?;
        serde_json::from_value(doc.clone()).map_err(|_| StoreError::Unavailable)
    }

    fn update_field(
        &mut self,
        station_name: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        if self.fail_update {
            return Err(StoreError::Unavailable);
        }
        self.updates
            .push((station_name.to_string(), field.to_string(), value.clone()));
        match self.docs.get_mut(station_name) {
            Some(Value::Object(doc)) => {
                doc.insert(field.to_string(), value);
            }
            Some(_) => return Err(StoreError::Unavailable),
            None => {
                let mut doc = serde_json::Map::new();
                doc.insert("name".to_string(), Value::String(station_name.to_string()));
                doc.insert(field.to_string(), value);
                self.docs
                    .insert(station_name.to_string(), Value::Object(doc));
            }
        }
        Ok(())
    }
}

// ── Event capture ─────────────────────────────────────────────

struct SinkVec {
    events: Vec<AppEvent>,
}

impl SinkVec {
    fn new() -> Self {
        Self { events: Vec::new() }
    }

    fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for SinkVec {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

fn config() -> StationConfig {
    StationConfig {
        station_name: "dock3".to_string(),
        flash_timer_ticks: 10,
        ..Default::default()
    }
}

fn harness() -> (StationConfig, StationService, MockHw, MockStore, SinkVec) {
    let config = config();
    let service = StationService::new(&config);
    let hw = MockHw::new(&config);
    let mut store = MockStore::new();
    store.seed(
        "dock3",
        json!({"_id": 3, "name": "dock3", "in_progress": false, "in_place": false, "enabled": true}),
    );
    let sink = SinkVec::new();
    (config, service, hw, store, sink)
}

// ── Presence and color scenarios ──────────────────────────────

#[test]
fn cart_present_renders_blue() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();
    hw.set_sensors(&config, true, true);

    svc.tick(&mut hw, &mut store, &mut sink);

    assert!(svc.cart_present());
    // cart_present=true, in_progress=false, flash=false → Blue per table.
    assert_eq!(hw.lit_color(&config), LampColor::Blue);
    // The confirm delay ran once per sensor.
    assert_eq!(hw.delays_ms.len(), 2);
}

#[test]
fn operation_in_progress_renders_blue_without_cart() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();
    store.seed("dock3", json!({"name": "dock3", "in_progress": true}));

    // First tick always fetches before acting.
    svc.tick(&mut hw, &mut store, &mut sink);

    assert!(!svc.cart_present());
    assert!(svc.in_progress());
    assert_eq!(hw.lit_color(&config), LampColor::Blue);
}

#[test]
fn idle_station_renders_green() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();

    svc.tick(&mut hw, &mut store, &mut sink);

    assert_eq!(svc.flash_remaining(), 0);
    assert_eq!(hw.lit_color(&config), LampColor::Green);
}

#[test]
fn one_sensor_is_not_a_cart() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();
    hw.set_sensors(&config, true, false);

    svc.tick(&mut hw, &mut store, &mut sink);

    assert!(!svc.cart_present());
    assert_eq!(hw.lit_color(&config), LampColor::Green);
}

#[test]
fn failed_sensor_reads_as_absent() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();
    hw.set_sensors(&config, true, true);
    hw.fail_reads = true;

    svc.tick(&mut hw, &mut store, &mut sink);

    assert!(!svc.cart_present());
    assert_eq!(hw.lit_color(&config), LampColor::Green);
}

// ── Hysteresis scenarios ──────────────────────────────────────

#[test]
fn departure_arms_flash_then_green_after_expiry() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();

    // Cart present: timer armed to full duration.
    hw.set_sensors(&config, true, true);
    svc.tick(&mut hw, &mut store, &mut sink);
    assert_eq!(svc.flash_remaining(), 10);
    assert_eq!(hw.lit_color(&config), LampColor::Blue);

    // Departure: flash window opens, counts down one per tick.
    hw.set_sensors(&config, false, false);
    let mut flash_colors = Vec::new();
    for expected_remaining in (0..10).rev() {
        svc.tick(&mut hw, &mut store, &mut sink);
        assert_eq!(svc.flash_remaining(), expected_remaining);
        flash_colors.push(hw.lit_color(&config));
    }

    // Alternation held for the whole window: Red, Off, Red, Off, ...
    for (i, color) in flash_colors.iter().enumerate() {
        let expected = if i % 2 == 0 { LampColor::Red } else { LampColor::Off };
        assert_eq!(*color, expected, "flash tick {i}");
    }

    // Window expired: green, and it stays green.
    svc.tick(&mut hw, &mut store, &mut sink);
    assert_eq!(hw.lit_color(&config), LampColor::Green);
    svc.tick(&mut hw, &mut store, &mut sink);
    assert_eq!(hw.lit_color(&config), LampColor::Green);
}

#[test]
fn flash_window_decrements_while_alternating() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();

    // Arm, then burn the timer down to 3 remaining.
    hw.set_sensors(&config, true, true);
    svc.tick(&mut hw, &mut store, &mut sink);
    hw.set_sensors(&config, false, false);
    for _ in 0..7 {
        svc.tick(&mut hw, &mut store, &mut sink);
    }
    assert_eq!(svc.flash_remaining(), 3);

    // Next two ticks alternate and decrement by exactly one.
    svc.tick(&mut hw, &mut store, &mut sink);
    let first = hw.lit_color(&config);
    assert_eq!(svc.flash_remaining(), 2);
    svc.tick(&mut hw, &mut store, &mut sink);
    let second = hw.lit_color(&config);
    assert_eq!(svc.flash_remaining(), 1);
    assert!(matches!(
        (first, second),
        (LampColor::Red, LampColor::Off) | (LampColor::Off, LampColor::Red)
    ));
}

#[test]
fn in_progress_freezes_flash_timer() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();

    hw.set_sensors(&config, true, true);
    svc.tick(&mut hw, &mut store, &mut sink);
    hw.set_sensors(&config, false, false);
    svc.tick(&mut hw, &mut store, &mut sink);
    assert_eq!(svc.flash_remaining(), 9);

    // Operation starts: blue wins, countdown pauses.
    store.seed("dock3", json!({"name": "dock3", "in_progress": true}));
    for _ in 0..5 {
        svc.tick(&mut hw, &mut store, &mut sink);
        assert_eq!(hw.lit_color(&config), LampColor::Blue);
    }
    assert_eq!(svc.flash_remaining(), 9);

    // Operation ends: countdown resumes where it stopped.
    store.seed("dock3", json!({"name": "dock3", "in_progress": false}));
    svc.tick(&mut hw, &mut store, &mut sink);
    assert_eq!(svc.flash_remaining(), 8);
}

// ── Store traffic ─────────────────────────────────────────────

#[test]
fn in_place_update_reflects_same_tick_fusion() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();

    hw.set_sensors(&config, true, true);
    svc.tick(&mut hw, &mut store, &mut sink);
    hw.set_sensors(&config, false, false);
    svc.tick(&mut hw, &mut store, &mut sink);

    let flags: Vec<&Value> = store
        .updates
        .iter()
        .map(|(station, field, value)| {
            assert_eq!(station, "dock3");
            assert_eq!(field, FIELD_IN_PLACE);
            value
        })
        .collect();
    assert_eq!(flags, vec![&json!(true), &json!(false)]);
}

#[test]
fn field_update_leaves_foreign_fields_untouched() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();
    let doc = json!({
        "_id": 3,
        "name": "dock3",
        "in_progress": false,
        "in_place": false,
        "enabled": true,
        "assigned": 7,
        "distance": 118,
        "median_time": 500,
        "path": [1, 4, 9],
    });
    store.seed("dock3", doc.clone());

    hw.set_sensors(&config, true, true);
    svc.tick(&mut hw, &mut store, &mut sink);

    let mut expected = doc;
    expected["in_place"] = json!(true);
    assert_eq!(store.docs["dock3"], expected);
}

#[test]
fn missing_record_is_created_on_first_write() {
    let (_config, mut svc, mut hw, mut store, mut sink) = harness();
    store.docs.clear();

    svc.tick(&mut hw, &mut store, &mut sink);

    // Defaults were used for the decision, and the upsert created the doc.
    assert!(!svc.in_progress());
    assert_eq!(store.docs["dock3"]["in_place"], json!(false));
}

// ── Degraded operation ────────────────────────────────────────

#[test]
fn store_outage_freezes_applied_color() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();

    hw.set_sensors(&config, true, true);
    svc.tick(&mut hw, &mut store, &mut sink);
    assert_eq!(hw.lit_color(&config), LampColor::Blue);

    store.fail_fetch = true;
    store.fail_update = true;
    for _ in 0..5 {
        svc.tick(&mut hw, &mut store, &mut sink);
        assert_eq!(
            hw.lit_color(&config),
            LampColor::Blue,
            "color must freeze at the last successful tick's value"
        );
    }
}

#[test]
fn store_outage_keeps_cached_in_progress() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();
    store.seed("dock3", json!({"name": "dock3", "in_progress": true}));

    svc.tick(&mut hw, &mut store, &mut sink);
    assert!(svc.in_progress());

    store.fail_fetch = true;
    svc.tick(&mut hw, &mut store, &mut sink);
    assert!(svc.in_progress(), "cached in_progress must survive the outage");
    assert_eq!(hw.lit_color(&config), LampColor::Blue);
}

#[test]
fn degraded_and_recovered_emitted_once_per_episode() {
    let (_config, mut svc, mut hw, mut store, mut sink) = harness();

    svc.tick(&mut hw, &mut store, &mut sink);
    store.fail_fetch = true;
    for _ in 0..4 {
        svc.tick(&mut hw, &mut store, &mut sink);
    }
    store.fail_fetch = false;
    for _ in 0..3 {
        svc.tick(&mut hw, &mut store, &mut sink);
    }

    assert_eq!(sink.count(|e| matches!(e, AppEvent::StoreDegraded)), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::StoreRecovered)), 1);
    assert!(!svc.store_degraded());
}

#[test]
fn lamp_write_failure_does_not_stop_the_loop() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();

    svc.tick(&mut hw, &mut store, &mut sink);
    assert_eq!(hw.lit_color(&config), LampColor::Green);

    hw.fail_writes = true;
    hw.set_sensors(&config, true, true);
    svc.tick(&mut hw, &mut store, &mut sink);

    // Physical lamps unchanged, cached color unchanged, loop alive.
    assert_eq!(hw.lit_color(&config), LampColor::Green);
    assert_eq!(svc.last_color(), Some(LampColor::Green));

    hw.fail_writes = false;
    svc.tick(&mut hw, &mut store, &mut sink);
    assert_eq!(hw.lit_color(&config), LampColor::Blue);
}

// ── Supplemental behavior ─────────────────────────────────────

#[test]
fn disabled_station_goes_dark_but_keeps_publishing() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();
    store.seed("dock3", json!({"name": "dock3", "enabled": false}));
    hw.set_sensors(&config, true, true);

    svc.tick(&mut hw, &mut store, &mut sink);

    assert_eq!(hw.lit_color(&config), LampColor::Off);
    // Presence is still sensed and published for the yard.
    assert_eq!(store.docs["dock3"]["in_place"], json!(true));
}

#[test]
fn presence_events_fire_on_edges_only() {
    let (config, mut svc, mut hw, mut store, mut sink) = harness();

    hw.set_sensors(&config, true, true);
    for _ in 0..3 {
        svc.tick(&mut hw, &mut store, &mut sink);
    }
    hw.set_sensors(&config, false, false);
    for _ in 0..3 {
        svc.tick(&mut hw, &mut store, &mut sink);
    }

    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::PresenceChanged { .. })),
        2
    );
}

#[test]
fn telemetry_emitted_on_interval() {
    let mut config = config();
    config.telemetry_interval_secs = 3;
    config.tick_interval_ms = 1000;
    let mut svc = StationService::new(&config);
    let mut hw = MockHw::new(&config);
    let mut store = MockStore::new();
    let mut sink = SinkVec::new();

    for _ in 0..9 {
        svc.tick(&mut hw, &mut store, &mut sink);
    }

    assert_eq!(sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 3);
}
