//! Image metadata and resizing.
//!
//! Pixels are never touched by the encoders' wrapper code; reading dimensions
//! and resizing go through an [`ImageEditor`].

use image::imageops::FilterType;
use image::ImageFormat;
use std::path::Path;

use super::error::ConverterError;
use super::types::ImageDimensions;

/// Reads dimensions and resizes raster files.
pub trait ImageEditor: Send + Sync {
    /// Width and height of the image at `path`.
    fn dimensions(&self, path: &Path) -> Result<ImageDimensions, ConverterError>;

    /// Resizes `input` to exactly `target` and writes it to `output` in the
    /// input's format. `input` and `output` may be the same file.
    fn resize(
        &self,
        input: &Path,
        output: &Path,
        target: ImageDimensions,
    ) -> Result<(), ConverterError>;
}

/// [`ImageEditor`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterEditor;

impl ImageEditor for RasterEditor {
    fn dimensions(&self, path: &Path) -> Result<ImageDimensions, ConverterError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            ConverterError::invalid_input(path, format!("cannot read image dimensions: {}", e))
        })?;
        Ok(ImageDimensions::new(width, height))
    }

    fn resize(
        &self,
        input: &Path,
        output: &Path,
        target: ImageDimensions,
    ) -> Result<(), ConverterError> {
        let format = ImageFormat::from_path(input)
            .map_err(|e| ConverterError::resize_failed(format!("unknown format: {}", e)))?;
        let source = image::open(input).map_err(|e| {
            ConverterError::resize_failed(format!("cannot decode {}: {}", input.display(), e))
        })?;

        source
            .resize_exact(target.width, target.height, FilterType::Lanczos3)
            .save_with_format(output, format)
            .map_err(|e| {
                ConverterError::resize_failed(format!("cannot write {}: {}", output.display(), e))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_dimensions_of_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::new(40, 20).save(&path).unwrap();

        let dims = RasterEditor.dimensions(&path).unwrap();
        assert_eq!(dims, ImageDimensions::new(40, 20));
    }

    #[test]
    fn test_dimensions_of_garbage_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"not an image").unwrap();

        let err = RasterEditor.dimensions(&path).unwrap_err();
        assert!(matches!(err, ConverterError::InvalidInput { .. }));
    }

    #[test]
    fn test_resize_in_place_keeps_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        RgbImage::new(400, 200).save(&path).unwrap();

        RasterEditor
            .resize(&path, &path, ImageDimensions::new(100, 50))
            .unwrap();

        assert_eq!(
            RasterEditor.dimensions(&path).unwrap(),
            ImageDimensions::new(100, 50)
        );
        assert_eq!(
            image::ImageFormat::from_path(&path).unwrap(),
            image::ImageFormat::Png
        );
    }
}
