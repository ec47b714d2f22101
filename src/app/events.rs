//! Outbound application events.
//!
//! The [`StationService`](super::service::StationService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on
//! the other side decide what to do with them — log to the console, feed
//! a yard dashboard, or record them in a test.

use crate::signal::LampColor;

/// Structured events emitted by the station control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller has started (carries the station name).
    Started { station: String },

    /// The debounced presence result changed.
    PresenceChanged { in_place: bool },

    /// A different lamp color was applied to the stack.
    /// Not emitted for the Red/Off alternation within a flash episode.
    SignalChanged { color: LampColor },

    /// The station store stopped answering; cached values are in use.
    StoreDegraded,

    /// The station store answered again after a degraded episode.
    StoreRecovered,

    /// Periodic telemetry snapshot.
    Telemetry(StationTelemetry),
}

/// A point-in-time snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationTelemetry {
    pub in_place: bool,
    pub in_progress: bool,
    pub enabled: bool,
    pub flash_remaining: u32,
    pub color: LampColor,
    pub tick_count: u64,
}
