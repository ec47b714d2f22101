//! Tri-color light stack.
//!
//! [`SignalStack`] owns the lamp output state: it computes the color for a
//! given (cart-present, operation-in-progress, flash-enabled) triple and
//! carries the blink phase of the flashing-red alert.
//!
//! ## Decision table (first match wins)
//!
//! | cart_present | in_progress | flash_enabled | result          |
//! |--------------|-------------|---------------|-----------------|
//! | true         | any         | any           | Blue            |
//! | false        | true        | any           | Blue            |
//! | false        | false       | true          | Red/Off blink   |
//! | false        | false       | false         | Green           |
//!
//! Blue reads as "occupied or being serviced" no matter which condition
//! caused it. The blink is a single boolean toggle, not a counter —
//! alternation stays correct over unbounded uptime.

use crate::app::ports::{GpioPort, IoError};

/// Rendered lamp color. `Red` and `Off` alternate within a flash episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LampColor {
    Blue,
    Green,
    Red,
    Off,
}

impl LampColor {
    /// Line levels as (red, green, blue).
    fn lines(self) -> (bool, bool, bool) {
        match self {
            Self::Blue => (false, false, true),
            Self::Green => (false, true, false),
            Self::Red => (true, false, false),
            Self::Off => (false, false, false),
        }
    }
}

/// Owns the three lamp lines and the flash blink phase.
#[derive(Debug)]
pub struct SignalStack {
    red_pin: u8,
    green_pin: u8,
    blue_pin: u8,
    blink_phase: bool,
    applied: Option<LampColor>,
}

impl SignalStack {
    pub fn new(red_pin: u8, green_pin: u8, blue_pin: u8) -> Self {
        Self {
            red_pin,
            green_pin,
            blue_pin,
            blink_phase: false,
            applied: None,
        }
    }

    /// Compute the next color from the decision table.
    ///
    /// Pure in its Blue/Green branches; only the flash branch touches
    /// state (the blink toggle), so a flash-enabled call alternates
    /// Red/Off on consecutive invocations.
    pub fn next_color(
        &mut self,
        cart_present: bool,
        in_progress: bool,
        flash_enabled: bool,
    ) -> LampColor {
        if cart_present || in_progress {
            return LampColor::Blue;
        }
        if flash_enabled {
            self.blink_phase = !self.blink_phase;
            return if self.blink_phase {
                LampColor::Red
            } else {
                LampColor::Off
            };
        }
        LampColor::Green
    }

    /// Drive the three output lines to render `color`.
    ///
    /// Lines being cleared are written before lines being set, so an
    /// observer may see the stack briefly dark but never two colors lit.
    /// On failure the cached applied color is left unchanged — the caller
    /// logs and the next tick re-applies.
    pub fn apply(&mut self, gpio: &mut impl GpioPort, color: LampColor) -> Result<(), IoError> {
        let (r, g, b) = color.lines();
        let lines = [
            (self.red_pin, r),
            (self.green_pin, g),
            (self.blue_pin, b),
        ];
        for (pin, high) in lines.iter().filter(|(_, high)| !high) {
            gpio.write_output(*pin, *high)?;
        }
        for (pin, high) in lines.iter().filter(|(_, high)| *high) {
            gpio.write_output(*pin, *high)?;
        }
        self.applied = Some(color);
        Ok(())
    }

    /// The color most recently applied successfully, if any.
    pub fn last_applied(&self) -> Option<LampColor> {
        self.applied
    }
}
