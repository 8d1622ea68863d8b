//! Execution context shared by all components of a run.

use std::path::Path;

use crate::OutputDir;

/// Default Docker network name for a run.
pub const DEFAULT_NETWORK: &str = "playground-network";

/// Per-run state visible to every component.
///
/// Built once before any service is registered and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ExContext {
    output: OutputDir,
    network: String,
    reverse_proxy: bool,
}

impl ExContext {
    /// Creates a context writing into `output` on the default network.
    pub fn new(output: OutputDir) -> Self {
        Self { output, network: DEFAULT_NETWORK.to_string(), reverse_proxy: false }
    }

    /// Sets the Docker network name.
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Marks the run as fronted by a reverse proxy.
    pub const fn with_reverse_proxy(mut self, enabled: bool) -> Self {
        self.reverse_proxy = enabled;
        self
    }

    /// Returns the output directory.
    pub const fn output(&self) -> &OutputDir {
        &self.output
    }

    /// Returns the output directory path.
    pub fn output_dir(&self) -> &Path {
        self.output.path()
    }

    /// Returns the Docker network name.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Whether a reverse proxy fronts the run.
    pub const fn reverse_proxy(&self) -> bool {
        self.reverse_proxy
    }
}
