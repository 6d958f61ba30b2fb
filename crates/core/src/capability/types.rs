//! Types for encoder capability resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Windows,
    Linux,
    Darwin,
    Unknown,
}

impl Os {
    /// Maps a raw OS name by substring.
    pub fn from_raw(raw: &str) -> Self {
        let raw = raw.to_ascii_lowercase();
        if raw.contains("win") && !raw.contains("darwin") {
            Os::Windows
        } else if raw.contains("linux") {
            Os::Linux
        } else if raw.contains("darwin") || raw.contains("mac") {
            Os::Darwin
        } else {
            Os::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "windows",
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Unknown => "unknown",
        }
    }

    /// Executable suffix for this OS.
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Os::Windows => ".exe",
            _ => "",
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X64,
    Arm64,
    I386,
    Unknown,
}

impl Arch {
    /// Maps a raw machine string by substring.
    pub fn from_raw(raw: &str) -> Self {
        let raw = raw.to_ascii_lowercase();
        if raw.contains("x86_64") || raw.contains("amd64") {
            Arch::X64
        } else if raw.contains("arm64") || raw.contains("aarch64") {
            Arch::Arm64
        } else if raw.contains("i386") || raw.contains("i686") || raw == "x86" {
            Arch::I386
        } else {
            Arch::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
            Arch::I386 => "i386",
            Arch::Unknown => "unknown",
        }
    }
}

/// Normalized `(os, arch)` pair of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformKey {
    pub os: Os,
    pub arch: Arch,
}

impl PlatformKey {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detects the platform this process runs on.
    pub fn detect() -> Self {
        Self::from_raw(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Builds a key from raw OS and machine strings.
    pub fn from_raw(os: &str, arch: &str) -> Self {
        Self {
            os: Os::from_raw(os),
            arch: Arch::from_raw(arch),
        }
    }

    /// File name of a binary on this platform (`cwebp` or `cwebp.exe`).
    pub fn binary_file_name(&self, name: &str) -> String {
        format!("{}{}", name, self.os.exe_suffix())
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch.as_str())
    }
}

/// Static registry entry for one encoder binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncoderSpec {
    /// Binary name without extension.
    pub name: &'static str,
    /// Human readable description.
    pub description: &'static str,
    /// Whether absence should be surfaced as a warning.
    pub required: bool,
    /// Argument that prints the version.
    pub version_flag: &'static str,
    /// Argument proving the binary runs.
    pub test_command: &'static str,
}

/// Probe result for one encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRecord {
    pub available: bool,
    /// Resolved path. Kept on probe failure for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Parsed version, `"unknown"` when nothing matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Reason the encoder is unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CapabilityRecord {
    /// Record for a working binary.
    pub fn available(path: PathBuf, version: impl Into<String>) -> Self {
        Self {
            available: true,
            path: Some(path),
            version: Some(version.into()),
            error: None,
        }
    }

    /// Record for a binary that was not located.
    pub fn not_found() -> Self {
        Self {
            available: false,
            path: None,
            version: None,
            error: Some("not found".to_string()),
        }
    }

    /// Record for a located binary whose self-test failed.
    pub fn failed(path: PathBuf, error: impl Into<String>) -> Self {
        Self {
            available: false,
            path: Some(path),
            version: None,
            error: Some(error.into()),
        }
    }
}

/// Capability records keyed by encoder name.
pub type CapabilityMap = BTreeMap<String, CapabilityRecord>;

/// Host summary reported alongside the capability map.
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    /// Platform key, e.g. `linux-x64`.
    pub platform: String,
    pub os: Os,
    pub arch: Arch,
    pub bin_root: PathBuf,
    pub encoders: CapabilityMap,
    /// Names of required encoders that are unavailable.
    pub missing_required: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_from_raw() {
        assert_eq!(Os::from_raw("Linux"), Os::Linux);
        assert_eq!(Os::from_raw("linux"), Os::Linux);
        assert_eq!(Os::from_raw("Darwin"), Os::Darwin);
        assert_eq!(Os::from_raw("macos"), Os::Darwin);
        assert_eq!(Os::from_raw("WINNT"), Os::Windows);
        assert_eq!(Os::from_raw("windows"), Os::Windows);
        assert_eq!(Os::from_raw("FreeBSD"), Os::Unknown);
    }

    #[test]
    fn test_arch_from_raw() {
        assert_eq!(Arch::from_raw("x86_64"), Arch::X64);
        assert_eq!(Arch::from_raw("AMD64"), Arch::X64);
        assert_eq!(Arch::from_raw("arm64"), Arch::Arm64);
        assert_eq!(Arch::from_raw("aarch64"), Arch::Arm64);
        assert_eq!(Arch::from_raw("i386"), Arch::I386);
        assert_eq!(Arch::from_raw("i686"), Arch::I386);
        assert_eq!(Arch::from_raw("x86"), Arch::I386);
        assert_eq!(Arch::from_raw("riscv64"), Arch::Unknown);
    }

    #[test]
    fn test_platform_display() {
        let key = PlatformKey::from_raw("linux", "x86_64");
        assert_eq!(key.to_string(), "linux-x64");
        let key = PlatformKey::from_raw("sunos", "sparc");
        assert_eq!(key.to_string(), "unknown-unknown");
    }

    #[test]
    fn test_binary_file_name() {
        let windows = PlatformKey::new(Os::Windows, Arch::X64);
        assert_eq!(windows.binary_file_name("cwebp"), "cwebp.exe");
        let linux = PlatformKey::new(Os::Linux, Arch::Arm64);
        assert_eq!(linux.binary_file_name("cwebp"), "cwebp");
    }

    #[test]
    fn test_detect_is_stable() {
        assert_eq!(PlatformKey::detect(), PlatformKey::detect());
    }

    #[test]
    fn test_record_serialization_skips_empty_fields() {
        let json = serde_json::to_value(CapabilityRecord::not_found()).unwrap();
        assert_eq!(json["available"], false);
        assert_eq!(json["error"], "not found");
        assert!(json.get("path").is_none());
        assert!(json.get("version").is_none());
    }
}
