use std::sync::Arc;
use pixpress_core::{
    BatchProcessor, CapabilityResolver, Config, FormatConverter, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    resolver: Arc<CapabilityResolver>,
    converter: Arc<FormatConverter>,
    batch: BatchProcessor<FormatConverter>,
}

impl AppState {
    pub fn new(
        config: Config,
        resolver: Arc<CapabilityResolver>,
        converter: Arc<FormatConverter>,
    ) -> Self {
        let batch = BatchProcessor::new(config.batch.clone(), Arc::clone(&converter));
        Self {
            config,
            resolver,
            converter,
            batch,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn resolver(&self) -> &CapabilityResolver {
        self.resolver.as_ref()
    }

    pub fn converter(&self) -> &FormatConverter {
        self.converter.as_ref()
    }

    pub fn batch(&self) -> &BatchProcessor<FormatConverter> {
        &self.batch
    }
}
