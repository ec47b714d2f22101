//! Default GPIO pin assignments for the station controller board.
//!
//! Single source of truth — `StationConfig::default()` references this
//! module rather than hard-coding pin numbers. Per-station overrides come
//! from the config file; change a default here and it propagates everywhere.
//!
//! All numbers are BCM GPIO numbers, not physical header positions.

// ---------------------------------------------------------------------------
// Presence sensors (inductive proximity switches, active HIGH)
// ---------------------------------------------------------------------------

/// Digital input: presence sensor at the leading rack foot.
/// Wired with a pull-down; HIGH = rack foot detected.
pub const SENSOR_A_GPIO: u8 = 23;
/// Digital input: presence sensor at the trailing rack foot.
pub const SENSOR_B_GPIO: u8 = 24;

// ---------------------------------------------------------------------------
// Light stack (24 V tower lamp through a relay board, active HIGH)
// ---------------------------------------------------------------------------

/// Digital output: red lamp relay.
pub const LAMP_RED_GPIO: u8 = 17;
/// Digital output: green lamp relay.
pub const LAMP_GREEN_GPIO: u8 = 27;
/// Digital output: blue lamp relay.
pub const LAMP_BLUE_GPIO: u8 = 22;
