//! File naming and size helpers.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::types::ImageKind;

/// Qualities with a measured AVIF size ratio, in lookup order.
const AVIF_RATIO_QUALITIES: [u8; 5] = [90, 80, 70, 60, 50];

/// `<dir>/<stem>[-suffix].<extension>` next to `input`.
pub fn generate_optimized_filename(input: &Path, extension: &str, suffix: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match suffix.filter(|s| !s.is_empty()) {
        Some(suffix) => format!("{}-{}.{}", stem, suffix, extension),
        None => format!("{}.{}", stem, extension),
    };
    match input.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Percentage saved, rounded to two decimals. Zero when `original` is zero.
pub fn compression_ratio(original: u64, new: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let savings = original as f64 - new as f64;
    (savings / original as f64 * 100.0 * 100.0).round() / 100.0
}

/// Rough AVIF output size for a source of `original_size` bytes.
///
/// Uses the ratio measured at the nearest tabulated quality; ties keep the
/// higher quality. GIF sources use the JPEG ratios.
pub fn estimate_avif_size(original_size: u64, kind: ImageKind, quality: u8) -> u64 {
    let ratios: [f64; 5] = match kind {
        ImageKind::Png => [0.4, 0.3, 0.25, 0.2, 0.15],
        ImageKind::Jpeg | ImageKind::Gif => [0.7, 0.5, 0.4, 0.3, 0.25],
    };

    let mut closest = 1; // 80
    let mut min_diff = quality.abs_diff(AVIF_RATIO_QUALITIES[closest]);
    for (i, q) in AVIF_RATIO_QUALITIES.iter().enumerate() {
        let diff = quality.abs_diff(*q);
        if diff < min_diff {
            min_diff = diff;
            closest = i;
        }
    }

    (original_size as f64 * ratios[closest]).round() as u64
}

/// Human-readable size with up to two decimals, e.g. `1.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", size);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Whether `candidate` names the same file as `source`, whatever the
/// spelling (`..` segments, symlinks, hard links). Distinct paths never match
/// when either file is missing.
pub async fn is_same_file(source: &Path, candidate: &Path) -> bool {
    if source == candidate {
        return true;
    }
    let (Ok(a), Ok(b)) = (
        tokio::fs::metadata(source).await,
        tokio::fs::metadata(candidate).await,
    ) else {
        return false;
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        a.dev() == b.dev() && a.ino() == b.ino()
    }

    #[cfg(not(unix))]
    {
        let _ = (a, b);
        match (
            tokio::fs::canonicalize(source).await,
            tokio::fs::canonicalize(candidate).await,
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// Checks the ISO-BMFF brand of an AVIF file (`avif` or `avis` within the
/// first 12 bytes).
pub fn validate_avif_file(path: &Path) -> bool {
    let mut header = [0u8; 12];
    let read = match File::open(path).and_then(|mut file| file.read(&mut header)) {
        Ok(read) => read,
        Err(_) => return false,
    };
    let header = &header[..read];
    header.windows(4).any(|w| w == b"avif" || w == b"avis")
}
