//! Custom tracing Layer for capturing depsync events.
//!
//! This layer intercepts tracing events whose target starts with `depsync`
//! and that carry an `event_type` field, converts them to [`SyncEvent`]
//! instances and sends them to the [`crate::EventBus`].

use crate::event::{
    EventCategory, EventSource, ExtraFileEvent, InstallEvent, LogEvent, PackageEvent, SyncEvent,
    SystemEvent,
};
use crate::metadata::correlation_id;
use tokio::sync::mpsc;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// A tracing Layer that captures depsync-specific events.
pub struct SyncEventLayer {
    sender: mpsc::UnboundedSender<SyncEvent>,
}

impl SyncEventLayer {
    /// Create a new layer that sends events to the given channel.
    #[must_use]
    pub fn new(sender: mpsc::UnboundedSender<SyncEvent>) -> Self {
        Self { sender }
    }
}

impl<S> Layer<S> for SyncEventLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let target = event.metadata().target();
        if !target.starts_with("depsync") {
            return;
        }

        let mut visitor = SyncEventVisitor::new(target);
        event.record(&mut visitor);

        if let Some(sync_event) = visitor.build() {
            let _ = self.sender.send(sync_event);
        }
    }
}

/// Visitor for extracting typed fields from tracing events.
#[derive(Default)]
struct SyncEventVisitor {
    target: String,
    event_type: Option<String>,
    title: Option<String>,
    message: Option<String>,
    path: Option<String>,
    name: Option<String>,
    package: Option<String>,
    dependency: Option<String>,
    from: Option<String>,
    to: Option<String>,
    changed: Option<usize>,
    exit_code: Option<i32>,
}

impl SyncEventVisitor {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            ..Self::default()
        }
    }

    fn build(self) -> Option<SyncEvent> {
        let event_type = self.event_type.as_deref()?;
        let source = EventSource::new(&self.target);

        let category = match event_type {
            "sync.section" => EventCategory::Log(LogEvent::Section { title: self.title? }),
            "sync.info" => EventCategory::Log(LogEvent::Info {
                message: self.message?,
            }),
            "sync.error" => EventCategory::Log(LogEvent::Error {
                message: self.message?,
                path: self.path,
            }),
            "sync.package_processed" => EventCategory::Package(PackageEvent::Processed {
                name: self.name?,
                path: self.path?,
                changed: self.changed.unwrap_or(0),
            }),
            "sync.dependency_changed" => {
                EventCategory::Package(PackageEvent::DependencyChanged {
                    package: self.package?,
                    dependency: self.dependency?,
                    from: self.from?,
                    to: self.to?,
                })
            }
            "sync.install_started" => {
                EventCategory::Install(InstallEvent::Started { path: self.path? })
            }
            "sync.install_completed" => EventCategory::Install(InstallEvent::Completed {
                path: self.path?,
                exit_code: self.exit_code?,
            }),
            "sync.extra_file_updated" => EventCategory::ExtraFile(ExtraFileEvent::Updated {
                path: self.path?,
                package: self.package?,
                from: self.from?,
                to: self.to?,
            }),
            "system.shutdown" => EventCategory::System(SystemEvent::Shutdown),
            _ => return None,
        };

        Some(SyncEvent::new(correlation_id(), source, category))
    }
}

impl Visit for SyncEventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        let slot = match field.name() {
            "event_type" => &mut self.event_type,
            "title" => &mut self.title,
            "message" => &mut self.message,
            "path" => &mut self.path,
            "name" => &mut self.name,
            "package" => &mut self.package,
            "dependency" => &mut self.dependency,
            "from" => &mut self.from,
            "to" => &mut self.to,
            _ => return,
        };
        *slot = Some(value.to_string());
    }

    // Out-of-range integers leave the field unset.
    fn record_i64(&mut self, field: &Field, value: i64) {
        match field.name() {
            "exit_code" => self.exit_code = i32::try_from(value).ok(),
            "changed" => self.changed = usize::try_from(value).ok(),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "exit_code" => self.exit_code = i32::try_from(value).ok(),
            "changed" => self.changed = usize::try_from(value).ok(),
            _ => {}
        }
    }

    // `%value` fields arrive here, formatted through Display.
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}
