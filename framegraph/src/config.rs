//! Frame graph configuration.

#[cfg(feature = "dump")]
use std::path::PathBuf;

/// Configuration for a [`FrameGraph`](crate::FrameGraph).
#[derive(Debug, Clone)]
pub struct FrameGraphConfig {
    /// Name used in log messages and diagnostic reports.
    pub label: String,
    /// Reject passes that reference unregistered or stale handles before compiling.
    pub validate_declarations: bool,
    /// Write a Graphviz report to this path after every successful compile.
    #[cfg(feature = "dump")]
    pub dump_path: Option<PathBuf>,
}

impl Default for FrameGraphConfig {
    fn default() -> Self {
        Self {
            label: "FrameGraph".to_string(),
            validate_declarations: cfg!(debug_assertions),
            #[cfg(feature = "dump")]
            dump_path: None,
        }
    }
}

impl FrameGraphConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label used in logs and reports.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Enable or disable declaration validation.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_declarations = enabled;
        self
    }

    /// Dump the compiled graph to `path` after every compile.
    #[cfg(feature = "dump")]
    pub fn with_dump_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dump_path = Some(path.into());
        self
    }
}
