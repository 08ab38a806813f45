//! Engine configuration.

/// Configuration for the ShelfDB engine.
///
/// The base path is an explicit value threaded into every service at
/// construction, not a process-wide global - this keeps tests isolated and
/// concurrent engines over one store independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Storage namespace prefix; every key starts with it.
    pub base_path: String,

    /// Page size used for internal listing scans.
    pub list_page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_path: "data".to_string(),
            list_page_size: 1000,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the storage namespace prefix.
    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Sets the page size used for internal listing scans.
    ///
    /// A zero size would make every scan return an empty page, so it is
    /// clamped to 1.
    #[must_use]
    pub const fn list_page_size(mut self, size: usize) -> Self {
        self.list_page_size = if size == 0 { 1 } else { size };
        self
    }
}
