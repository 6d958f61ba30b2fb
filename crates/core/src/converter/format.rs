//! Converter that shells out to external encoders.

use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::config::ConverterConfig;
use super::editor::ImageEditor;
use super::encoders::{
    cwebp_args, gifsicle_args, jpegoptim_args, optipng_args, AvifEncoder, GIF_OPTIMIZER,
    JPEG_OPTIMIZER, PNG_OPTIMIZER, WEBP_ENCODER,
};
use super::error::ConverterError;
use super::files::{
    compression_ratio, estimate_avif_size, generate_optimized_filename, is_same_file,
    validate_avif_file,
};
use super::settings::{
    AvifSettings, GifSettings, JpegSettings, PngSettings, ResizeSettings, WebpSettings,
};
use super::traits::Converter;
use super::types::{
    AvifEstimate, ConversionOptions, ConversionResult, ImageInfo, ImageKind, Operation,
};
use crate::capability::CapabilityResolver;
use crate::executor::{ExecutionRequest, ExecutionResult, Executor};
use crate::metrics;

/// What a handler produced before sizes are measured.
struct Produced {
    output: PathBuf,
    encoder: Option<String>,
    skipped: bool,
}

impl Produced {
    fn encoded(output: PathBuf, encoder: &str) -> Self {
        Self {
            output,
            encoder: Some(encoder.to_string()),
            skipped: false,
        }
    }
}

/// Converts and optimizes images with whatever encoders the resolver finds.
pub struct FormatConverter {
    config: ConverterConfig,
    resolver: Arc<CapabilityResolver>,
    executor: Arc<dyn Executor>,
    editor: Arc<dyn ImageEditor>,
}

impl FormatConverter {
    /// Creates a new converter.
    pub fn new(
        config: ConverterConfig,
        resolver: Arc<CapabilityResolver>,
        executor: Arc<dyn Executor>,
        editor: Arc<dyn ImageEditor>,
    ) -> Self {
        Self {
            config,
            resolver,
            executor,
            editor,
        }
    }

    /// Returns the converter configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Returns the capability resolver.
    pub fn resolver(&self) -> &Arc<CapabilityResolver> {
        &self.resolver
    }

    /// Expected AVIF size for `input` with the settings `convert` would use.
    pub async fn estimate_avif_size(
        &self,
        input: &Path,
        options: &ConversionOptions,
    ) -> Result<AvifEstimate, ConverterError> {
        let info = self.inspect(input).await?;
        let settings = AvifSettings::resolve(options, &self.config, Some(info.dimensions));
        Ok(AvifEstimate {
            original_size: info.size_bytes,
            estimated_size: estimate_avif_size(info.size_bytes, info.kind, settings.quality),
            quality: settings.quality,
        })
    }

    /// Runs one operation, returning the typed error on failure.
    pub async fn try_convert(
        &self,
        input: &Path,
        operation: Operation,
        options: &ConversionOptions,
    ) -> Result<ConversionResult, ConverterError> {
        let info = self.inspect(input).await?;

        let produced = match operation {
            Operation::Webp => self.to_webp(&info, options).await?,
            Operation::Avif => self.to_avif(&info, options).await?,
            Operation::Optimize => match info.kind {
                ImageKind::Jpeg => self.optimize_jpeg(&info, options).await?,
                ImageKind::Png => self.optimize_png(&info, options).await?,
                ImageKind::Gif => self.optimize_gif(&info, options).await?,
            },
            Operation::Resize => self.resize(&info, options).await?,
        };

        let file_size = tokio::fs::metadata(&produced.output)
            .await
            .map_err(|e| ConverterError::io(&produced.output, e))?
            .len();

        Ok(ConversionResult {
            operation,
            success: true,
            input_path: info.path.clone(),
            output_path: Some(produced.output),
            original_size: info.size_bytes,
            file_size,
            compression_ratio: compression_ratio(info.size_bytes, file_size),
            encoder: produced.encoder,
            skipped: produced.skipped,
            error_kind: None,
            errors: Vec::new(),
        })
    }

    // =========================================================================
    // Operations
    // =========================================================================

    async fn to_webp(
        &self,
        info: &ImageInfo,
        options: &ConversionOptions,
    ) -> Result<Produced, ConverterError> {
        let settings = WebpSettings::resolve(options, &self.config);
        let output = self.converted_output_path(info, options, "webp").await?;
        let program = self.require_binary(WEBP_ENCODER).await?;
        prepare_output_dir(&output).await?;

        let args = cwebp_args(&info.path, &output, &settings);
        let result = self
            .run(&program, args, self.timeout_secs(options, self.config.encoder_timeout_secs))
            .await;
        check_output(WEBP_ENCODER, &result, &output, false)?;

        Ok(Produced::encoded(output, WEBP_ENCODER))
    }

    async fn to_avif(
        &self,
        info: &ImageInfo,
        options: &ConversionOptions,
    ) -> Result<Produced, ConverterError> {
        let settings = AvifSettings::resolve(options, &self.config, Some(info.dimensions));
        let output = self.converted_output_path(info, options, "avif").await?;
        debug!(
            file = %info.path.display(),
            quality = settings.quality,
            speed = settings.speed,
            effort = settings.effort,
            "Resolved AVIF settings"
        );

        let mut attempts = Vec::new();
        let mut output_dir_ready = false;

        // Strictly sequential: candidates share the output path.
        for candidate in &self.config.avif_encoders {
            let Some((binary, program)) = self.first_available(candidate.binaries()).await else {
                debug!(candidate = %candidate, "AVIF candidate not available");
                continue;
            };
            if !output_dir_ready {
                prepare_output_dir(&output).await?;
                output_dir_ready = true;
            }

            let args = candidate.args(&info.path, &output, &settings);
            let timeout = self.timeout_secs(options, self.config.avif_timeout_secs(*candidate));
            let result = self.run(&program, args, timeout).await;

            match check_output(binary, &result, &output, true) {
                Ok(()) => return Ok(Produced::encoded(output, binary)),
                Err(e) => {
                    warn!(candidate = %candidate, error = %e, "AVIF candidate failed");
                    attempts.push(e.to_string());
                    remove_partial_output(&output).await;
                }
            }
        }

        Err(ConverterError::NoCandidateSucceeded { attempts })
    }

    async fn optimize_jpeg(
        &self,
        info: &ImageInfo,
        options: &ConversionOptions,
    ) -> Result<Produced, ConverterError> {
        let settings = JpegSettings::resolve(options, &self.config);
        self.optimize_with(info, options, JPEG_OPTIMIZER, |file| {
            jpegoptim_args(file, &settings)
        })
        .await
    }

    async fn optimize_png(
        &self,
        info: &ImageInfo,
        options: &ConversionOptions,
    ) -> Result<Produced, ConverterError> {
        let settings = PngSettings::resolve(options, &self.config);
        self.optimize_with(info, options, PNG_OPTIMIZER, |file| {
            optipng_args(file, &settings)
        })
        .await
    }

    async fn optimize_gif(
        &self,
        info: &ImageInfo,
        options: &ConversionOptions,
    ) -> Result<Produced, ConverterError> {
        let settings = GifSettings::resolve(options, &self.config);
        self.optimize_with(info, options, GIF_OPTIMIZER, |file| {
            gifsicle_args(file, &settings)
        })
        .await
    }

    /// Optimizers rewrite their file in place. An explicit output path gets a
    /// copy of the source which is then optimized.
    async fn optimize_with<F>(
        &self,
        info: &ImageInfo,
        options: &ConversionOptions,
        binary: &str,
        build_args: F,
    ) -> Result<Produced, ConverterError>
    where
        F: FnOnce(&Path) -> Vec<OsString>,
    {
        let program = self.require_binary(binary).await?;
        let target = self.in_place_target(info, options).await;
        let copied = target != info.path;
        if copied {
            copy_file(&info.path, &target).await?;
        }

        let result = self
            .run(
                &program,
                build_args(&target),
                self.timeout_secs(options, self.config.encoder_timeout_secs),
            )
            .await;
        if let Err(e) = check_output(binary, &result, &target, false) {
            if copied {
                remove_partial_output(&target).await;
            }
            return Err(e);
        }

        Ok(Produced::encoded(target, binary))
    }

    async fn resize(
        &self,
        info: &ImageInfo,
        options: &ConversionOptions,
    ) -> Result<Produced, ConverterError> {
        let settings = ResizeSettings::resolve(options, &self.config);
        if settings.is_unbounded() {
            return Err(ConverterError::invalid_options(
                "resize needs max_width or max_height",
            ));
        }
        let target = self.in_place_target(info, options).await;

        if !settings.needs_resize(info.dimensions) {
            if target != info.path {
                copy_file(&info.path, &target).await?;
            }
            return Ok(Produced {
                output: target,
                encoder: None,
                skipped: true,
            });
        }

        let dimensions = settings.target_dimensions(info.dimensions);
        prepare_output_dir(&target).await?;
        let editor = Arc::clone(&self.editor);
        let (input, output) = (info.path.clone(), target.clone());
        tokio::task::spawn_blocking(move || editor.resize(&input, &output, dimensions))
            .await
            .map_err(|e| ConverterError::resize_failed(format!("resize task failed: {}", e)))??;

        debug!(
            file = %info.path.display(),
            from_width = info.dimensions.width,
            from_height = info.dimensions.height,
            to_width = dimensions.width,
            to_height = dimensions.height,
            "Resized image"
        );

        Ok(Produced {
            output: target,
            encoder: None,
            skipped: false,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Output of a format change. Any spelling of the source path is refused.
    async fn converted_output_path(
        &self,
        info: &ImageInfo,
        options: &ConversionOptions,
        extension: &str,
    ) -> Result<PathBuf, ConverterError> {
        match &options.output_path {
            Some(path) if is_same_file(&info.path, path).await => Err(
                ConverterError::invalid_options("output path must differ from the input"),
            ),
            Some(path) => Ok(path.clone()),
            None => Ok(generate_optimized_filename(&info.path, extension, None)),
        }
    }

    /// File an in-place operation writes to. An output path that resolves to
    /// the source collapses to the source itself.
    async fn in_place_target(&self, info: &ImageInfo, options: &ConversionOptions) -> PathBuf {
        match &options.output_path {
            Some(path) if !is_same_file(&info.path, path).await => path.clone(),
            _ => info.path.clone(),
        }
    }

    fn timeout_secs(&self, options: &ConversionOptions, default: u64) -> u64 {
        options.timeout_secs.unwrap_or(default)
    }

    async fn require_binary(&self, name: &str) -> Result<PathBuf, ConverterError> {
        match self.resolver.available_path(name).await {
            Ok(Some(path)) => Ok(path),
            Ok(None) | Err(_) => Err(ConverterError::encoder_unavailable(name)),
        }
    }

    async fn first_available(
        &self,
        binaries: &'static [&'static str],
    ) -> Option<(&'static str, PathBuf)> {
        for &binary in binaries {
            if let Ok(Some(path)) = self.resolver.available_path(binary).await {
                return Some((binary, path));
            }
        }
        None
    }

    async fn run(&self, program: &Path, args: Vec<OsString>, timeout_secs: u64) -> ExecutionResult {
        self.executor
            .execute(ExecutionRequest::new(program, args).with_timeout_secs(timeout_secs))
            .await
    }

    fn failure_result(
        &self,
        input: &Path,
        operation: Operation,
        options: &ConversionOptions,
        error: &ConverterError,
        original_size: u64,
    ) -> ConversionResult {
        ConversionResult {
            operation,
            success: false,
            input_path: input.to_path_buf(),
            output_path: options.output_path.clone(),
            original_size,
            file_size: 0,
            compression_ratio: 0.0,
            encoder: None,
            skipped: false,
            error_kind: Some(error.kind().to_string()),
            errors: error.messages(),
        }
    }
}

#[async_trait]
impl Converter for FormatConverter {
    fn name(&self) -> &str {
        "external-encoders"
    }

    async fn inspect(&self, path: &Path) -> Result<ImageInfo, ConverterError> {
        let meta = tokio::fs::metadata(path).await.map_err(|e| {
            let reason = if e.kind() == ErrorKind::NotFound {
                "file does not exist".to_string()
            } else {
                format!("cannot stat file: {}", e)
            };
            ConverterError::invalid_input(path, reason)
        })?;
        if !meta.is_file() {
            return Err(ConverterError::invalid_input(path, "not a regular file"));
        }

        let kind = ImageKind::from_path(path)
            .ok_or_else(|| ConverterError::invalid_input(path, "unsupported image type"))?;

        tokio::fs::File::open(path)
            .await
            .map_err(|e| ConverterError::invalid_input(path, format!("file is not readable: {}", e)))?;

        let dimensions = self.editor.dimensions(path)?;
        if dimensions.width == 0 || dimensions.height == 0 {
            return Err(ConverterError::invalid_input(path, "invalid image dimensions"));
        }

        Ok(ImageInfo {
            path: path.to_path_buf(),
            kind,
            size_bytes: meta.len(),
            dimensions,
        })
    }

    async fn convert(
        &self,
        path: &Path,
        operation: Operation,
        options: &ConversionOptions,
    ) -> ConversionResult {
        let started = Instant::now();

        let result = match self.try_convert(path, operation, options).await {
            Ok(result) => result,
            Err(e) => {
                let original_size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
                self.failure_result(path, operation, options, &e, original_size)
            }
        };

        let elapsed = started.elapsed();
        if result.success {
            info!(
                operation = %operation,
                file = %path.display(),
                success = true,
                original_size = result.original_size,
                new_size = result.file_size,
                ratio = result.compression_ratio,
                encoder = result.encoder.as_deref().unwrap_or("none"),
                duration_ms = elapsed.as_millis() as u64,
                "Image conversion"
            );
        } else {
            warn!(
                operation = %operation,
                file = %path.display(),
                success = false,
                errors = ?result.errors,
                "Image conversion failed"
            );
        }
        metrics::record_conversion(operation.as_str(), result.success, result.bytes_saved(), elapsed);

        result
    }
}

/// Maps an executor result to an error unless the encoder succeeded and left
/// a usable output file behind.
fn check_output(
    encoder: &str,
    result: &ExecutionResult,
    output: &Path,
    expect_avif: bool,
) -> Result<(), ConverterError> {
    if !result.success {
        let detail = if result.stderr.is_empty() {
            result.stdout.clone()
        } else {
            result.stderr.clone()
        };
        return Err(ConverterError::subprocess_failed(
            encoder,
            result.exit_code,
            detail,
        ));
    }
    if !output.is_file() {
        return Err(ConverterError::subprocess_failed(
            encoder,
            result.exit_code,
            format!("no output written to {}", output.display()),
        ));
    }
    if expect_avif && !validate_avif_file(output) {
        return Err(ConverterError::subprocess_failed(
            encoder,
            result.exit_code,
            format!("{} is not a valid AVIF file", output.display()),
        ));
    }
    Ok(())
}

async fn prepare_output_dir(output: &Path) -> Result<(), ConverterError> {
    match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ConverterError::io(dir, e)),
        _ => Ok(()),
    }
}

async fn copy_file(from: &Path, to: &Path) -> Result<(), ConverterError> {
    prepare_output_dir(to).await?;
    tokio::fs::copy(from, to)
        .await
        .map(|_| ())
        .map_err(|e| ConverterError::io(to, e))
}

async fn remove_partial_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
    }
}
