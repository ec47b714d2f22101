//! Port traits — the hexagonal boundary between the control loop and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ StationService (domain)
//! ```
//!
//! Driven adapters (GPIO, the shared station store, event sinks) implement
//! these traits. The [`StationService`](super::service::StationService)
//! consumes them via generics, so the control loop never touches hardware
//! or storage directly.
//!
//! All port errors are typed and recoverable by contract: a failed read or
//! write degrades one tick, it never crosses the tick boundary as a panic.

use serde_json::Value;

use crate::record::StationRecord;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: hardware ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Logical level of a digital input after polarity normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// The sensed condition is asserted (sensor sees a target).
    Active,
    /// The sensed condition is not asserted.
    Inactive,
}

/// Digital I/O port: the domain reads sensors and drives lamp lines
/// through this.
pub trait GpioPort {
    /// Read one digital input (BCM pin number).
    fn read_input(&mut self, pin: u8) -> Result<Level, IoError>;

    /// Drive one digital output (BCM pin number). `true` = asserted.
    fn write_output(&mut self, pin: u8, high: bool) -> Result<(), IoError>;
}

/// Errors from [`GpioPort`] operations. Always transient: the caller logs
/// and carries on with the previous state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// The input line could not be read.
    ReadFailed(u8),
    /// The output line could not be driven.
    WriteFailed(u8),
    /// The pin was never configured by the adapter.
    UnknownPin(u8),
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ReadFailed(p) => write!(f, "GPIO {} read failed", p),
            Self::WriteFailed(p) => write!(f, "GPIO {} write failed", p),
            Self::UnknownPin(p) => write!(f, "GPIO {} not configured", p),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Station store port (driven adapter: domain ↔ shared document store)
// ───────────────────────────────────────────────────────────────

/// The yard-wide station store, one document per station, keyed by name.
///
/// Implementations must bound every call — a hung store call would stall
/// the tick schedule, and the contract here is "fail within the tick":
/// return [`StoreError::Unavailable`] on timeout and let the next tick
/// retry naturally.
pub trait StorePort {
    /// Fetch the full document for `station_name`.
    fn fetch_record(&mut self, station_name: &str) -> Result<StationRecord, StoreError>;

    /// Set a single field of the document, leaving all others untouched.
    /// Creates the document (name + field) if it does not exist yet.
    fn update_field(
        &mut self,
        station_name: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError>;
}

/// Errors from [`StorePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// No document exists for the requested station.
    NotFound,
    /// The store could not be reached, read, or written in time.
    Unavailable,
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "station record not found"),
            Self::Unavailable => write!(f, "store unavailable"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, yard
/// telemetry bus, test capture).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
