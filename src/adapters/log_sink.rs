//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the process logger. A future yard-bus adapter would implement the
//! same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { station } => {
                info!("START | station={}", station);
            }
            AppEvent::PresenceChanged { in_place } => {
                info!(
                    "PRESENCE | {}",
                    if *in_place { "in place" } else { "clear" }
                );
            }
            AppEvent::SignalChanged { color } => {
                info!("SIGNAL | {:?}", color);
            }
            AppEvent::StoreDegraded => {
                info!("STORE | degraded — running on cached status");
            }
            AppEvent::StoreRecovered => {
                info!("STORE | recovered");
            }
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | tick={} | in_place={} in_progress={} enabled={} | \
                     flash_remaining={} | color={:?}",
                    t.tick_count,
                    t.in_place,
                    t.in_progress,
                    t.enabled,
                    t.flash_remaining,
                    t.color,
                );
            }
        }
    }
}
