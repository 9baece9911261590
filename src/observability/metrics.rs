//! Registry counters
//!
//! - Counters only, monotonic
//! - Relaxed atomics, so materializers can count through a shared borrow

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters owned by one schema registry
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    entities_registered: AtomicU64,
    columns_declared: AtomicU64,
    joins_resolved: AtomicU64,
    declarations_rejected: AtomicU64,
    entities_materialized: AtomicU64,
    materializations_rejected: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Declaration metrics

    pub fn increment_entities_registered(&self) {
        self.entities_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_columns_declared(&self, count: u64) {
        self.columns_declared.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_joins_resolved(&self) {
        self.joins_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_declarations_rejected(&self) {
        self.declarations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Materialization metrics

    /// Counts top-level entities only; nested entities are part of their parent
    pub fn increment_entities_materialized(&self) {
        self.entities_materialized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_materializations_rejected(&self) {
        self.materializations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            entities_registered: self.entities_registered.load(Ordering::Relaxed),
            columns_declared: self.columns_declared.load(Ordering::Relaxed),
            joins_resolved: self.joins_resolved.load(Ordering::Relaxed),
            declarations_rejected: self.declarations_rejected.load(Ordering::Relaxed),
            entities_materialized: self.entities_materialized.load(Ordering::Relaxed),
            materializations_rejected: self.materializations_rejected.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub entities_registered: u64,
    pub columns_declared: u64,
    pub joins_resolved: u64,
    pub declarations_rejected: u64,
    pub entities_materialized: u64,
    pub materializations_rejected: u64,
}
