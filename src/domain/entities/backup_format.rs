//! Backup format entity
//!
//! The container type fingerprinted from an uploaded backup tree.

use serde::Serialize;
use std::fmt;

/// Known handheld backup container layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BackupFormat {
    /// BB10 encrypted TAR, QNX magic
    #[serde(rename = "BB10_TAR_QNX")]
    Bb10TarQnx,
    /// BB10 encrypted TAR, PER magic
    #[serde(rename = "BB10_TAR_PER")]
    Bb10TarPer,
    /// BB10 .bbb archive (PkgInfo + Manifest.xml + Archive/)
    #[serde(rename = "BB10_BBB")]
    Bb10Bbb,
    /// BlackBerry Backup v2 as produced on Windows
    #[serde(rename = "BBBv2_Windows")]
    BbbV2Windows,
    /// Legacy Inter@ctive Pager Backup
    #[serde(rename = "IPD")]
    Ipd,
    /// BlackBerry Backup v1 as produced on macOS
    #[serde(rename = "BBBv1_Mac")]
    BbbV1Mac,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl BackupFormat {
    pub fn label(&self) -> &'static str {
        match self {
            BackupFormat::Bb10TarQnx => "BB10_TAR_QNX",
            BackupFormat::Bb10TarPer => "BB10_TAR_PER",
            BackupFormat::Bb10Bbb => "BB10_BBB",
            BackupFormat::BbbV2Windows => "BBBv2_Windows",
            BackupFormat::Ipd => "IPD",
            BackupFormat::BbbV1Mac => "BBBv1_Mac",
            BackupFormat::Unknown => "Unknown",
        }
    }

    /// Whether the container comes from the QNX-based BB10 generation
    pub fn is_bb10(&self) -> bool {
        matches!(
            self,
            BackupFormat::Bb10TarQnx | BackupFormat::Bb10TarPer | BackupFormat::Bb10Bbb
        )
    }
}

impl fmt::Display for BackupFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification of one backup tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupFormatResult {
    pub format: BackupFormat,
    /// 0-100
    pub confidence: u8,
    /// Human-readable reason for the verdict
    pub rationale: String,
    pub manifest_found: bool,
    pub pkginfo_found: bool,
    /// Archive member paths seen while classifying
    pub archive_members: Vec<String>,
}
