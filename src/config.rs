//! Registry configuration

use crate::observability::Severity;

/// View name that selects every column regardless of declared views
pub const WILDCARD_VIEW: &str = "*";

/// Configuration for a schema registry and the materializers reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// View name matching every column
    pub wildcard_view: String,
    /// Separator between segments of a field path (`address.city`)
    pub path_separator: char,
    /// Events below this severity are not logged
    pub log_level: Severity,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            wildcard_view: WILDCARD_VIEW.to_string(),
            path_separator: '.',
            log_level: Severity::Warn,
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config logging every declaration and materialization event.
    pub fn verbose() -> Self {
        Self {
            log_level: Severity::Trace,
            ..Self::default()
        }
    }

    pub fn with_wildcard_view(mut self, view: impl Into<String>) -> Self {
        self.wildcard_view = view.into();
        self
    }

    pub fn with_path_separator(mut self, separator: char) -> Self {
        self.path_separator = separator;
        self
    }

    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = level;
        self
    }

    /// Splits a field path into its first segment and the remainder
    pub fn split_path<'a>(&self, path: &'a str) -> (&'a str, Option<&'a str>) {
        match path.split_once(self.path_separator) {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        }
    }
}
