use std::sync::Arc;

use crate::config::Config;
use crate::error::RuntimeError;
use crate::source::ClusterSource;

use super::runtime::Runtime;

/// Builder for constructing a [`Runtime`].
pub struct RuntimeBuilder {
    cfg: Config,
    source: Option<Arc<dyn ClusterSource>>,
}

impl RuntimeBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self { cfg, source: None }
    }

    /// Sets the cluster API the reconcilers and listing endpoints read from.
    pub fn with_source(mut self, source: Arc<dyn ClusterSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Builds the runtime.
    ///
    /// Fails with [`RuntimeError::MissingSource`] when no source was set.
    pub fn build(self) -> Result<Runtime, RuntimeError> {
        let source = self.source.ok_or(RuntimeError::MissingSource)?;
        Ok(Runtime::new_internal(self.cfg, source))
    }
}
