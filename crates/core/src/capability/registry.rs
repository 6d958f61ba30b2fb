//! The static registry of known encoder binaries.

use std::collections::HashSet;

use super::error::CapabilityError;
use super::types::EncoderSpec;

pub const CWEBP: &str = "cwebp";
pub const DWEBP: &str = "dwebp";
pub const CAVIF: &str = "cavif";
pub const AVIFENC: &str = "avifenc";
pub const MAGICK: &str = "magick";
pub const CONVERT: &str = "convert";
pub const JPEGOPTIM: &str = "jpegoptim";
pub const OPTIPNG: &str = "optipng";
pub const GIFSICLE: &str = "gifsicle";

static REGISTRY: [EncoderSpec; 9] = [
    EncoderSpec {
        name: CWEBP,
        description: "WebP encoder",
        required: true,
        version_flag: "-version",
        test_command: "-h",
    },
    EncoderSpec {
        name: DWEBP,
        description: "WebP decoder",
        required: false,
        version_flag: "-version",
        test_command: "-h",
    },
    EncoderSpec {
        name: CAVIF,
        description: "AVIF encoder",
        required: false,
        version_flag: "--version",
        test_command: "--help",
    },
    EncoderSpec {
        name: AVIFENC,
        description: "Reference AVIF encoder (libavif)",
        required: false,
        version_flag: "--version",
        test_command: "--help",
    },
    EncoderSpec {
        name: MAGICK,
        description: "ImageMagick",
        required: false,
        version_flag: "-version",
        test_command: "-version",
    },
    EncoderSpec {
        name: CONVERT,
        description: "ImageMagick (legacy convert)",
        required: false,
        version_flag: "-version",
        test_command: "-version",
    },
    EncoderSpec {
        name: JPEGOPTIM,
        description: "JPEG optimizer",
        required: false,
        version_flag: "--version",
        test_command: "--help",
    },
    EncoderSpec {
        name: OPTIPNG,
        description: "PNG optimizer",
        required: false,
        version_flag: "-v",
        test_command: "-h",
    },
    EncoderSpec {
        name: GIFSICLE,
        description: "GIF optimizer",
        required: false,
        version_flag: "--version",
        test_command: "--help",
    },
];

/// The built-in registry, in probe order.
pub fn default_registry() -> Vec<EncoderSpec> {
    REGISTRY.to_vec()
}

/// Looks up a built-in registry entry by name.
pub fn find_encoder(name: &str) -> Option<&'static EncoderSpec> {
    REGISTRY.iter().find(|spec| spec.name == name)
}

/// Rejects registries with empty fields or duplicate names.
pub(crate) fn validate_registry(registry: &[EncoderSpec]) -> Result<(), CapabilityError> {
    let mut seen = HashSet::new();
    for spec in registry {
        if spec.name.trim().is_empty() {
            return Err(CapabilityError::malformed_registry("empty encoder name"));
        }
        if spec.test_command.is_empty() || spec.version_flag.is_empty() {
            return Err(CapabilityError::malformed_registry(format!(
                "{} has no test command or version flag",
                spec.name
            )));
        }
        if !seen.insert(spec.name) {
            return Err(CapabilityError::malformed_registry(format!(
                "duplicate encoder {}",
                spec.name
            )));
        }
    }
    Ok(())
}
