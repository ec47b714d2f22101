//! Debounced presence sensor.
//!
//! Wraps one digital input and applies a confirm-on-read debounce: an
//! inactive raw read returns [`Presence::Absent`] immediately, an active
//! raw read is only trusted after a second read separated by the
//! confirmation interval. The asymmetry is the point — a glitch must
//! never claim a cart is present, while removal is reported without delay.

use embedded_hal::delay::DelayNs;
use log::warn;

use crate::app::ports::{GpioPort, Level};

/// Debounced reading of one presence input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Active on both the immediate and the confirmation read.
    Present,
    /// Inactive on either read.
    Absent,
    /// The input could not be read — degraded, treated as absent upstream.
    Unknown,
}

/// One binary presence input with confirm-on-read debounce.
#[derive(Debug, Clone, Copy)]
pub struct DebouncedSensor {
    pin: u8,
    confirm_delay_ms: u32,
}

impl DebouncedSensor {
    pub fn new(pin: u8, confirm_delay_ms: u32) -> Self {
        Self {
            pin,
            confirm_delay_ms,
        }
    }

    /// GPIO pin this sensor is attached to.
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Read the input, confirming an active level with a second delayed
    /// read. Blocks for at most one confirmation interval.
    pub fn read(&self, gpio: &mut (impl GpioPort + DelayNs)) -> Presence {
        match gpio.read_input(self.pin) {
            Err(e) => {
                warn!("sensor GPIO {}: {} — reading as unknown", self.pin, e);
                Presence::Unknown
            }
            Ok(Level::Inactive) => Presence::Absent,
            Ok(Level::Active) => {
                gpio.delay_ms(self.confirm_delay_ms);
                match gpio.read_input(self.pin) {
                    Ok(Level::Active) => Presence::Present,
                    Ok(Level::Inactive) => Presence::Absent,
                    Err(e) => {
                        warn!("sensor GPIO {}: {} on confirm — reading as unknown", self.pin, e);
                        Presence::Unknown
                    }
                }
            }
        }
    }
}
