//! CLI renderer for depsync events.
//!
//! Renders events to stderr for terminal display.
//! This module is allowed to use eprintln! as it's the output layer.

#![allow(clippy::print_stderr)]

use crate::bus::EventReceiver;
use crate::event::{
    EventCategory, ExtraFileEvent, InstallEvent, LogEvent, PackageEvent, SyncEvent, SystemEvent,
};
use std::io::{self, IsTerminal};

const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// CLI renderer configuration.
#[derive(Debug, Clone)]
pub struct CliRendererConfig {
    /// Whether to use ANSI colors.
    pub colors: bool,
    /// Whether to show per-package summaries and install completions.
    pub verbose: bool,
}

impl Default for CliRendererConfig {
    fn default() -> Self {
        Self {
            colors: io::stderr().is_terminal(),
            verbose: false,
        }
    }
}

/// CLI renderer that outputs events to stderr.
#[derive(Debug, Default)]
pub struct CliRenderer {
    config: CliRendererConfig,
}

impl CliRenderer {
    /// Create a new CLI renderer with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new CLI renderer with the given configuration.
    #[must_use]
    pub const fn with_config(config: CliRendererConfig) -> Self {
        Self { config }
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

    /// Render a single event.
    pub fn render(&self, event: &SyncEvent) {
        if let Some(line) = self.format_event(event) {
            eprintln!("{line}");
        }
    }

    /// Format an event as a terminal line, or `None` when it is hidden.
    #[must_use]
    pub fn format_event(&self, event: &SyncEvent) -> Option<String> {
        match &event.category {
            EventCategory::Log(log) => Some(self.format_log(log)),
            EventCategory::Package(package) => self.format_package(package),
            EventCategory::Install(install) => self.format_install(install),
            EventCategory::ExtraFile(ExtraFileEvent::Updated {
                path,
                package,
                from,
                to,
            }) => Some(format!("  {path}: {package} {from} -> {to}")),
            EventCategory::System(SystemEvent::Shutdown) => None,
        }
    }

    fn format_log(&self, event: &LogEvent) -> String {
        match event {
            LogEvent::Section { title } => {
                if self.config.colors {
                    format!("{BOLD}== {title} =={RESET}")
                } else {
                    format!("== {title} ==")
                }
            }
            LogEvent::Info { message } => message.clone(),
            LogEvent::Error { message, path } => {
                let text = match path {
                    Some(path) => format!("error: {message} ({path})"),
                    None => format!("error: {message}"),
                };
                if self.config.colors {
                    format!("{RED}{text}{RESET}")
                } else {
                    text
                }
            }
        }
    }

    fn format_package(&self, event: &PackageEvent) -> Option<String> {
        match event {
            PackageEvent::Processed { name, path, changed } => {
                if *changed > 0 || self.config.verbose {
                    Some(format!("{name} ({path}): {changed} change(s)"))
                } else {
                    None
                }
            }
            PackageEvent::DependencyChanged {
                dependency,
                from,
                to,
                ..
            } => Some(format!("  {dependency}: {from} -> {to}")),
        }
    }

    fn format_install(&self, event: &InstallEvent) -> Option<String> {
        match event {
            InstallEvent::Started { path } => Some(format!("> install in {path}")),
            InstallEvent::Completed { path, exit_code } => {
                if *exit_code != 0 {
                    Some(format!("> install in {path} failed with exit code {exit_code}"))
                } else if self.config.verbose {
                    Some(format!("> install in {path} done"))
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventSource;
    use uuid::Uuid;

    fn event(category: EventCategory) -> SyncEvent {
        SyncEvent::new(Uuid::new_v4(), EventSource::new("depsync::test"), category)
    }

    fn plain(verbose: bool) -> CliRenderer {
        CliRenderer::with_config(CliRendererConfig {
            colors: false,
            verbose,
        })
    }

    #[test]
    fn test_section_and_error_formatting() {
        let renderer = plain(false);
        let section = event(EventCategory::Log(LogEvent::Section {
            title: "Installing".to_string(),
        }));
        assert_eq!(renderer.format_event(&section).unwrap(), "== Installing ==");

        let error = event(EventCategory::Log(LogEvent::Error {
            message: "no manifest".to_string(),
            path: Some("/ws/a".to_string()),
        }));
        assert_eq!(
            renderer.format_event(&error).unwrap(),
            "error: no manifest (/ws/a)"
        );
    }

    #[test]
    fn test_colored_section_wraps_ansi() {
        let renderer = CliRenderer::with_config(CliRendererConfig {
            colors: true,
            verbose: false,
        });
        let section = event(EventCategory::Log(LogEvent::Section {
            title: "Sync".to_string(),
        }));
        let line = renderer.format_event(&section).unwrap();
        assert!(line.starts_with(BOLD));
        assert!(line.ends_with(RESET));
    }

    #[test]
    fn test_unchanged_package_hidden_unless_verbose() {
        let processed = event(EventCategory::Package(PackageEvent::Processed {
            name: "app".to_string(),
            path: "/ws/app".to_string(),
            changed: 0,
        }));
        assert!(plain(false).format_event(&processed).is_none());
        assert_eq!(
            plain(true).format_event(&processed).unwrap(),
            "app (/ws/app): 0 change(s)"
        );
    }

    #[test]
    fn test_failed_install_always_shown() {
        let failed = event(EventCategory::Install(InstallEvent::Completed {
            path: "/ws/app".to_string(),
            exit_code: 3,
        }));
        let ok = event(EventCategory::Install(InstallEvent::Completed {
            path: "/ws/app".to_string(),
            exit_code: 0,
        }));
        assert!(plain(false).format_event(&failed).unwrap().contains("exit code 3"));
        assert!(plain(false).format_event(&ok).is_none());
    }

    #[test]
    fn test_shutdown_renders_nothing() {
        let shutdown = event(EventCategory::System(SystemEvent::Shutdown));
        assert!(plain(true).format_event(&shutdown).is_none());
    }
}
