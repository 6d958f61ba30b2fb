use super::{types::Config, ConfigError};

/// Longest capability cache lifetime accepted (one year).
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Capability cache TTL is at most a year
/// - Executor timeouts are consistent
/// - Converter default qualities are within 1-100
/// - AVIF tuning thresholds are ordered and the candidate list is non-empty
/// - Batch parallelism is at least 1 and backups have a directory
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    // Resolver validation
    if config.resolver.cache_ttl_secs > MAX_CACHE_TTL_SECS {
        return Err(invalid(format!(
            "resolver.cache_ttl_secs cannot exceed {}, got {}",
            MAX_CACHE_TTL_SECS, config.resolver.cache_ttl_secs
        )));
    }

    // Executor validation
    let executor = &config.executor;
    if executor.max_timeout_secs == 0 {
        return Err(invalid("executor.max_timeout_secs cannot be 0"));
    }
    if executor.default_timeout_secs > executor.max_timeout_secs {
        return Err(invalid(format!(
            "executor.default_timeout_secs ({}) exceeds executor.max_timeout_secs ({})",
            executor.default_timeout_secs, executor.max_timeout_secs
        )));
    }

    // Converter validation
    let converter = &config.converter;
    for (key, quality) in [
        ("webp_quality", converter.webp_quality),
        ("avif_quality", converter.avif_quality),
        ("jpeg_quality", converter.jpeg_quality),
    ] {
        if !(1..=100).contains(&quality) {
            return Err(invalid(format!(
                "converter.{} must be between 1 and 100, got {}",
                key, quality
            )));
        }
    }

    if converter.avif_encoders.is_empty() {
        return Err(invalid("converter.avif_encoders cannot be empty"));
    }

    let tuning = &converter.avif_tuning;
    if !(tuning.small_pixels < tuning.medium_pixels && tuning.medium_pixels < tuning.large_pixels)
    {
        return Err(invalid(format!(
            "converter.avif_tuning thresholds must satisfy small < medium < large, got {} / {} / {}",
            tuning.small_pixels, tuning.medium_pixels, tuning.large_pixels
        )));
    }

    // Batch validation
    if config.batch.max_parallel == 0 {
        return Err(invalid("batch.max_parallel cannot be 0"));
    }
    if config.batch.backup_original && config.batch.backup_dir.as_os_str().is_empty() {
        return Err(invalid("batch.backup_dir cannot be empty when backup_original is set"));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}
