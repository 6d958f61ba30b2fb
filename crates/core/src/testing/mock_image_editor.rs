//! Mock image editor for testing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::converter::{ConverterError, ImageDimensions, ImageEditor};

/// A recorded resize call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedResize {
    pub input: PathBuf,
    pub output: PathBuf,
    pub target: ImageDimensions,
}

#[derive(Debug)]
struct State {
    default_dimensions: ImageDimensions,
    dimensions: HashMap<PathBuf, ImageDimensions>,
    resizes: Vec<RecordedResize>,
    resize_error: Option<String>,
}

/// Mock implementation of the ImageEditor trait.
///
/// Reports fixed dimensions without decoding anything. A successful resize
/// writes an output half the size of the input so savings are observable.
///
/// The trait is synchronous, so state sits behind a std mutex.
#[derive(Debug)]
pub struct MockImageEditor {
    state: Mutex<State>,
}

impl Default for MockImageEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockImageEditor {
    /// Create a mock reporting 3000x2000 for every file.
    pub fn new() -> Self {
        Self::with_dimensions(3000, 2000)
    }

    /// Create a mock reporting the given dimensions for every file.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            state: Mutex::new(State {
                default_dimensions: ImageDimensions::new(width, height),
                dimensions: HashMap::new(),
                resizes: Vec::new(),
                resize_error: None,
            }),
        }
    }

    /// Report `dimensions` for one specific path.
    pub fn set_dimensions(&self, path: impl AsRef<Path>, dimensions: ImageDimensions) {
        self.lock()
            .dimensions
            .insert(path.as_ref().to_path_buf(), dimensions);
    }

    /// Make every subsequent resize fail with `reason`.
    pub fn fail_resizes(&self, reason: &str) {
        self.lock().resize_error = Some(reason.to_string());
    }

    /// Resize calls received, in order.
    pub fn resizes(&self) -> Vec<RecordedResize> {
        self.lock().resizes.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ImageEditor for MockImageEditor {
    fn dimensions(&self, path: &Path) -> Result<ImageDimensions, ConverterError> {
        let state = self.lock();
        Ok(state
            .dimensions
            .get(path)
            .copied()
            .unwrap_or(state.default_dimensions))
    }

    fn resize(
        &self,
        input: &Path,
        output: &Path,
        target: ImageDimensions,
    ) -> Result<(), ConverterError> {
        let mut state = self.lock();
        state.resizes.push(RecordedResize {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            target,
        });
        if let Some(reason) = &state.resize_error {
            return Err(ConverterError::resize_failed(reason.clone()));
        }

        let original = std::fs::metadata(input)
            .map_err(|e| ConverterError::io(input, e))?
            .len();
        std::fs::write(output, vec![0u8; (original / 2) as usize])
            .map_err(|e| ConverterError::io(output, e))?;
        state
            .dimensions
            .insert(output.to_path_buf(), target);
        Ok(())
    }
}
