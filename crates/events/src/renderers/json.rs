//! JSON renderer for depsync events.
//!
//! Renders events as JSON lines for machine consumption.
//! This module is allowed to use println! as it's the output layer.

#![allow(clippy::print_stdout)]

use crate::bus::EventReceiver;
use crate::event::{EventCategory, SyncEvent, SystemEvent};

/// JSON renderer that outputs events as JSON lines.
#[derive(Debug, Default)]
pub struct JsonRenderer {
    pretty: bool,
}

impl JsonRenderer {
    /// Create a new JSON renderer with compact output.
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Create a new JSON renderer with pretty-printed output.
    #[must_use]
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Run the renderer until the shutdown event or the bus closes.
    pub async fn run(self, mut receiver: EventReceiver) {
        while let Some(event) = receiver.recv().await {
            if matches!(event.category, EventCategory::System(SystemEvent::Shutdown)) {
                break;
            }
            self.render(&event);
        }
    }

    /// Serialize a single event.
    #[must_use]
    pub fn format_event(&self, event: &SyncEvent) -> Option<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(event)
        } else {
            serde_json::to_string(event)
        };
        json.ok()
    }

    /// Render a single event as one JSON line.
    pub fn render(&self, event: &SyncEvent) {
        if let Some(json) = self.format_event(event) {
            println!("{json}");
        }
    }
}
