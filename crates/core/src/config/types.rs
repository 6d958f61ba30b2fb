use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::batch::BatchConfig;
use crate::capability::ResolverConfig;
use crate::converter::{AvifEncoder, ConverterConfig};
use crate::executor::ExecutorConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8080
}

/// Config as shown by the API: the effective values, with the encoder
/// lookup root spelled out and the AVIF order as names.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub resolver: SanitizedResolverConfig,
    pub executor: ExecutorConfig,
    pub converter: SanitizedConverterConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedResolverConfig {
    pub bin_root: PathBuf,
    pub bin_root_exists: bool,
    pub cache_ttl_secs: u64,
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConverterConfig {
    pub webp_quality: u8,
    pub webp_method: u8,
    pub webp_preset: String,
    pub avif_quality: u8,
    pub avif_speed: u8,
    pub avif_effort: u8,
    pub jpeg_quality: u8,
    pub png_level: u8,
    pub gif_level: u8,
    pub progressive_jpeg: bool,
    pub strip_metadata: bool,
    pub max_width: u32,
    pub max_height: u32,
    pub avif_auto_tune: bool,
    pub avif_encoders: Vec<String>,
    pub encoder_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let converter = &config.converter;
        Self {
            server: config.server.clone(),
            resolver: SanitizedResolverConfig {
                bin_root: config.resolver.bin_root.clone(),
                bin_root_exists: config.resolver.bin_root.is_dir(),
                cache_ttl_secs: config.resolver.cache_ttl_secs,
                probe_timeout_secs: config.resolver.probe_timeout_secs,
            },
            executor: config.executor.clone(),
            converter: SanitizedConverterConfig {
                webp_quality: converter.webp_quality,
                webp_method: converter.webp_method,
                webp_preset: converter.webp_preset.to_string(),
                avif_quality: converter.avif_quality,
                avif_speed: converter.avif_speed,
                avif_effort: converter.avif_effort,
                jpeg_quality: converter.jpeg_quality,
                png_level: converter.png_level,
                gif_level: converter.gif_level,
                progressive_jpeg: converter.progressive_jpeg,
                strip_metadata: converter.strip_metadata,
                max_width: converter.max_width,
                max_height: converter.max_height,
                avif_auto_tune: converter.avif_auto_tune,
                avif_encoders: converter
                    .avif_encoders
                    .iter()
                    .map(AvifEncoder::to_string)
                    .collect(),
                encoder_timeout_secs: converter.encoder_timeout_secs,
            },
            batch: config.batch.clone(),
        }
    }
}
