//! GPIO adapter — bridges physical pins to the [`GpioPort`] trait.
//!
//! The only module in the system that touches actual hardware.
//!
//! ## Dual-target design
//!
//! With the `hardware` feature: owns rppal input/output pin handles
//! (sensors configured with pull-downs, lamp lines driven low at init).
//! Without it: an in-memory simulation backend with test hooks, so the
//! whole crate builds and tests on any host.
//!
//! The adapter also implements [`DelayNs`] — the debounce confirmation
//! wait is a property of the same hardware the reads come from.

use std::collections::HashMap;

use embedded_hal::delay::DelayNs;
use log::info;

use crate::app::ports::{GpioPort, IoError, Level};
use crate::config::PinConfig;

// ── Init error ────────────────────────────────────────────────

/// Errors during one-shot pin configuration. Fatal at startup: the
/// controller refuses to run with undefined pin bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioInitError {
    /// The GPIO controller itself could not be opened.
    ControllerUnavailable,
    /// A configured pin could not be claimed.
    PinUnavailable(u8),
}

impl core::fmt::Display for GpioInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ControllerUnavailable => write!(f, "GPIO controller unavailable"),
            Self::PinUnavailable(p) => write!(f, "GPIO {} unavailable", p),
        }
    }
}

impl std::error::Error for GpioInitError {}

// ── Adapter ───────────────────────────────────────────────────

/// Concrete [`GpioPort`] over the station's five configured pins.
pub struct GpioAdapter {
    #[cfg(feature = "hardware")]
    inputs: HashMap<u8, rppal::gpio::InputPin>,
    #[cfg(feature = "hardware")]
    outputs: HashMap<u8, rppal::gpio::OutputPin>,

    #[cfg(not(feature = "hardware"))]
    sim_inputs: HashMap<u8, bool>,
    #[cfg(not(feature = "hardware"))]
    sim_outputs: HashMap<u8, bool>,
}

impl GpioAdapter {
    /// Claim and configure every pin named in `pins`.
    #[cfg(feature = "hardware")]
    pub fn new(pins: &PinConfig) -> Result<Self, GpioInitError> {
        let gpio = rppal::gpio::Gpio::new().map_err(|_| GpioInitError::ControllerUnavailable)?;

        let mut inputs = HashMap::new();
        for pin in [pins.sensor_a, pins.sensor_b] {
            let handle = gpio
                .get(pin)
                .map_err(|_| GpioInitError::PinUnavailable(pin))?
                .into_input_pulldown();
            inputs.insert(pin, handle);
        }

        let mut outputs = HashMap::new();
        for pin in [pins.lamp_red, pins.lamp_green, pins.lamp_blue] {
            let handle = gpio
                .get(pin)
                .map_err(|_| GpioInitError::PinUnavailable(pin))?
                .into_output_low();
            outputs.insert(pin, handle);
        }

        info!(
            "GPIO configured: sensors [{}, {}], lamps [{}, {}, {}]",
            pins.sensor_a, pins.sensor_b, pins.lamp_red, pins.lamp_green, pins.lamp_blue
        );
        Ok(Self { inputs, outputs })
    }

    /// Simulation backend: all inputs start inactive, outputs low.
    #[cfg(not(feature = "hardware"))]
    pub fn new(pins: &PinConfig) -> Result<Self, GpioInitError> {
        info!("GPIO adapter: simulation backend");
        Ok(Self {
            sim_inputs: HashMap::from([(pins.sensor_a, false), (pins.sensor_b, false)]),
            sim_outputs: HashMap::from([
                (pins.lamp_red, false),
                (pins.lamp_green, false),
                (pins.lamp_blue, false),
            ]),
        })
    }

    /// Test hook: set a simulated input level.
    #[cfg(not(feature = "hardware"))]
    pub fn sim_set_input(&mut self, pin: u8, active: bool) {
        self.sim_inputs.insert(pin, active);
    }

    /// Test hook: observe a simulated output level.
    #[cfg(not(feature = "hardware"))]
    pub fn sim_output(&self, pin: u8) -> Option<bool> {
        self.sim_outputs.get(&pin).copied()
    }
}

// ── GpioPort implementation ───────────────────────────────────

#[cfg(feature = "hardware")]
impl GpioPort for GpioAdapter {
    fn read_input(&mut self, pin: u8) -> Result<Level, IoError> {
        match self.inputs.get(&pin) {
            Some(handle) => Ok(if handle.is_high() {
                Level::Active
            } else {
                Level::Inactive
            }),
            None => Err(IoError::UnknownPin(pin)),
        }
    }

    fn write_output(&mut self, pin: u8, high: bool) -> Result<(), IoError> {
        match self.outputs.get_mut(&pin) {
            Some(handle) => {
                if high {
                    handle.set_high();
                } else {
                    handle.set_low();
                }
                Ok(())
            }
            None => Err(IoError::UnknownPin(pin)),
        }
    }
}

#[cfg(not(feature = "hardware"))]
impl GpioPort for GpioAdapter {
    fn read_input(&mut self, pin: u8) -> Result<Level, IoError> {
        match self.sim_inputs.get(&pin) {
            Some(true) => Ok(Level::Active),
            Some(false) => Ok(Level::Inactive),
            None => Err(IoError::UnknownPin(pin)),
        }
    }

    fn write_output(&mut self, pin: u8, high: bool) -> Result<(), IoError> {
        match self.sim_outputs.get_mut(&pin) {
            Some(level) => {
                *level = high;
                Ok(())
            }
            None => Err(IoError::UnknownPin(pin)),
        }
    }
}

// ── DelayNs implementation ────────────────────────────────────

#[cfg(feature = "hardware")]
impl DelayNs for GpioAdapter {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}

/// Simulation delays complete immediately — tests drive virtual time.
#[cfg(not(feature = "hardware"))]
impl DelayNs for GpioAdapter {
    fn delay_ns(&mut self, _ns: u32) {}
}
