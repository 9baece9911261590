//! Observability subsystem
//!
//! - Structured logging (JSON lines)
//! - Typed events with a default severity
//! - Registry counters
//!
//! Observability is read-only: nothing here changes declaration or
//! materialization results.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log an event at its default severity if it reaches `threshold`
pub fn log_event(event: Event, threshold: Severity, fields: &[(&str, &str)]) {
    let severity = event.severity();
    if severity >= threshold {
        Logger::log(severity, event.as_str(), fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_below_threshold_is_silent() {
        // Verifies no panic on either path
        log_event(Event::ColumnDeclared, Severity::Fatal, &[("column", "name")]);
        log_event(Event::RegistrySealed, Severity::Trace, &[]);
    }
}
