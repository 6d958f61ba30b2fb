pub mod batch;
pub mod capability;
pub mod config;
pub mod converter;
pub mod executor;
pub mod metrics;
pub mod testing;

pub use batch::{
    process_image, BatchConfig, BatchProcessor, BatchReport, BatchStats, ImageJob, ImageReport,
    OperationRequest, StatsSnapshot,
};
pub use capability::{
    BinaryLocator, CacheStore, CapabilityError, CapabilityMap, CapabilityRecord,
    CapabilityResolver, EncoderSpec, MemoryCache, PlatformKey, ResolverConfig, SystemInfo,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    ServerConfig,
};
pub use converter::{
    AvifEncoder, AvifEstimate, ConversionOptions, ConversionResult, Converter, ConverterConfig,
    ConverterError, FormatConverter, ImageDimensions, ImageEditor, ImageInfo, ImageKind, Operation,
    RasterEditor, WebpPreset,
};
pub use executor::{ExecutionRequest, ExecutionResult, Executor, ExecutorConfig, ProcessExecutor};
