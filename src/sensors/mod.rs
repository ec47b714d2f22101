//! Sensor subsystem — the debounced presence inputs and their fusion.
//!
//! A rack sits on two feet; a single tripped sensor means a half-parked
//! cart, a passing vehicle, or a person. Only both sensors independently
//! confirming presence counts as "in place".

pub mod presence;

use embedded_hal::delay::DelayNs;
use log::warn;

use crate::app::ports::GpioPort;
use presence::{DebouncedSensor, Presence};

/// Fused result of one presence poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceReading {
    /// Both sensors confirmed a cart.
    pub in_place: bool,
    /// At least one sensor answered [`Presence::Unknown`] this poll.
    pub degraded: bool,
}

/// The two presence sensors of one station.
#[derive(Debug, Clone, Copy)]
pub struct PresencePair {
    a: DebouncedSensor,
    b: DebouncedSensor,
}

impl PresencePair {
    pub fn new(a: DebouncedSensor, b: DebouncedSensor) -> Self {
        Self { a, b }
    }

    /// Poll both sensors and fuse.
    ///
    /// `Unknown` fuses as absent — the safe default — but is flagged so
    /// the caller can surface the degraded condition. Both sensors are
    /// always read; the worst-case latency is two confirmation intervals.
    pub fn read(&self, gpio: &mut (impl GpioPort + DelayNs)) -> PresenceReading {
        let a = self.a.read(gpio);
        let b = self.b.read(gpio);

        let degraded = a == Presence::Unknown || b == Presence::Unknown;
        if degraded {
            warn!(
                "presence fusion degraded (GPIO {}={:?}, GPIO {}={:?})",
                self.a.pin(),
                a,
                self.b.pin(),
                b
            );
        }

        PresenceReading {
            in_place: a == Presence::Present && b == Presence::Present,
            degraded,
        }
    }
}
