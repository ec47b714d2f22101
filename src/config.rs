//! Station configuration.
//!
//! All tunable parameters for one station controller. Values come from a
//! JSON config file loaded once at startup; the resulting struct is
//! immutable and handed to constructors — nothing reads configuration
//! globally from inside the tick logic.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pins;

/// GPIO assignments for one station (BCM numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinConfig {
    /// Presence sensor at the leading rack foot.
    pub sensor_a: u8,
    /// Presence sensor at the trailing rack foot.
    pub sensor_b: u8,
    /// Red lamp line of the light stack.
    pub lamp_red: u8,
    /// Green lamp line of the light stack.
    pub lamp_green: u8,
    /// Blue lamp line of the light stack.
    pub lamp_blue: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            sensor_a: pins::SENSOR_A_GPIO,
            sensor_b: pins::SENSOR_B_GPIO,
            lamp_red: pins::LAMP_RED_GPIO,
            lamp_green: pins::LAMP_GREEN_GPIO,
            lamp_blue: pins::LAMP_BLUE_GPIO,
        }
    }
}

impl PinConfig {
    fn as_array(self) -> [u8; 5] {
        [
            self.sensor_a,
            self.sensor_b,
            self.lamp_red,
            self.lamp_green,
            self.lamp_blue,
        ]
    }
}

/// Core station configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Station name used as the record key in the shared store.
    /// Empty = derive from the host name at startup.
    pub station_name: String,

    /// GPIO pin assignments.
    pub pins: PinConfig,

    // --- Timing ---
    /// Control loop tick period (milliseconds).
    pub tick_interval_ms: u32,
    /// Debounce confirmation delay between the two sensor reads (milliseconds).
    pub debounce_confirm_ms: u32,
    /// Flash persistence after a cart departs (ticks).
    pub flash_timer_ticks: u32,
    /// Telemetry report interval (seconds).
    pub telemetry_interval_secs: u32,

    // --- Storage ---
    /// Path of the shared station-document store.
    pub store_path: String,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            station_name: String::new(),
            pins: PinConfig::default(),

            // Timing
            tick_interval_ms: 1000,    // 1 Hz
            debounce_confirm_ms: 1000, // one tick worth of settling
            flash_timer_ticks: 10,
            telemetry_interval_secs: 60,

            // Storage
            store_path: "stations.json".to_string(),
        }
    }
}

impl StationConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file is not an error — the defaults apply and the caller
    /// logs the fallback. A present-but-invalid file is fatal: running a
    /// station on half-parsed pin bindings is worse than not starting.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(_) => return Err(ConfigError::Unreadable),
        };
        serde_json::from_str(&raw).map_err(|_| ConfigError::Malformed)
    }

    /// Validate the configuration before the loop starts.
    ///
    /// Fatal by contract: the controller must refuse to start rather than
    /// run with undefined pin bindings or a zero-period schedule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pins = self.pins.as_array();
        for (i, a) in pins.iter().enumerate() {
            if pins[i + 1..].contains(a) {
                return Err(ConfigError::DuplicatePin(*a));
            }
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroPeriod("tick_interval_ms"));
        }
        if self.debounce_confirm_ms == 0 {
            return Err(ConfigError::ZeroPeriod("debounce_confirm_ms"));
        }
        if self.flash_timer_ticks == 0 {
            return Err(ConfigError::ZeroPeriod("flash_timer_ticks"));
        }
        if self.station_name.is_empty() {
            return Err(ConfigError::MissingStationName);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Configuration failures. All of these are fatal at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file exists but could not be read.
    Unreadable,
    /// Config file is not valid JSON for [`StationConfig`].
    Malformed,
    /// The same GPIO is assigned to two roles.
    DuplicatePin(u8),
    /// A period or duration is zero.
    ZeroPeriod(&'static str),
    /// No station name configured and none derivable from the host.
    MissingStationName,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable => write!(f, "config file unreadable"),
            Self::Malformed => write!(f, "config file malformed"),
            Self::DuplicatePin(p) => write!(f, "GPIO {} assigned twice", p),
            Self::ZeroPeriod(field) => write!(f, "{} must be non-zero", field),
            Self::MissingStationName => write!(f, "station name missing"),
        }
    }
}

impl std::error::Error for ConfigError {}
