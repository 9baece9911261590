//! Observable registry and materializer events

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Declaration
    /// Storage record created for a type
    EntityRegistered,
    /// Column created on a record
    ColumnDeclared,
    /// Join resolved against both types
    JoinResolved,
    /// Annotation rejected
    DeclarationRejected,
    /// Registry sealed against further declarations
    RegistrySealed,

    // Materialization
    /// Entity materialized
    MaterializeComplete,
    /// Materialization failed
    MaterializeRejected,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::EntityRegistered => "ENTITY_REGISTERED",
            Event::ColumnDeclared => "COLUMN_DECLARED",
            Event::JoinResolved => "JOIN_RESOLVED",
            Event::DeclarationRejected => "DECLARATION_REJECTED",
            Event::RegistrySealed => "REGISTRY_SEALED",
            Event::MaterializeComplete => "MATERIALIZE_COMPLETE",
            Event::MaterializeRejected => "MATERIALIZE_REJECTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::EntityRegistered
            | Event::ColumnDeclared
            | Event::JoinResolved
            | Event::MaterializeComplete => Severity::Trace,
            Event::RegistrySealed => Severity::Info,
            Event::DeclarationRejected | Event::MaterializeRejected => Severity::Warn,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::EntityRegistered.as_str(), "ENTITY_REGISTERED");
        assert_eq!(Event::MaterializeRejected.to_string(), "MATERIALIZE_REJECTED");
    }

    #[test]
    fn test_rejections_warn() {
        assert_eq!(Event::DeclarationRejected.severity(), Severity::Warn);
        assert_eq!(Event::MaterializeRejected.severity(), Severity::Warn);
        assert_eq!(Event::ColumnDeclared.severity(), Severity::Trace);
        assert_eq!(Event::RegistrySealed.severity(), Severity::Info);
    }
}
