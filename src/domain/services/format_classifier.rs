//! Backup format classifier
//!
//! Fingerprints a backup tree from leading magic bytes and the shape of the
//! directory. Evidence is gathered file by file, then a fixed rule list is
//! applied; the first rule that matches decides the format.

use crate::domain::entities::{BackupFormat, BackupFormatResult, FileEntry};

/// BB10 encrypted TAR magics
pub const QNX_MAGIC: [u8; 4] = [0x51, 0x4E, 0x58, 0x00];
pub const PER_MAGIC: [u8; 4] = [0x50, 0x45, 0x52, 0x00];
/// Bytes of each file the classifier needs
pub const MAGIC_LEN: usize = 4;
/// Archive member names kept
pub const MAX_ARCHIVE_MEMBERS: usize = 1000;

/// Facts about a backup tree that the rules look at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeEvidence {
    pub qnx_file: Option<String>,
    pub per_file: Option<String>,
    pub manifest_found: bool,
    pub pkginfo_found: bool,
    pub archive_dir_found: bool,
    pub tar_count: usize,
    pub dat_count: usize,
    pub rem_count: usize,
    pub ipd_count: usize,
    pub archive_members: Vec<String>,
}

impl TreeEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one file and the first bytes read from it, if any
    pub fn observe(&mut self, entry: &FileEntry, magic: Option<&[u8]>) {
        if let Some(magic) = magic {
            if magic.starts_with(&QNX_MAGIC) && self.qnx_file.is_none() {
                self.qnx_file = Some(entry.relative_path.clone());
            } else if magic.starts_with(&PER_MAGIC) && self.per_file.is_none() {
                self.per_file = Some(entry.relative_path.clone());
            }
        }

        let name = entry.file_name();
        if name.eq_ignore_ascii_case("manifest.xml") {
            self.manifest_found = true;
        }
        if name.eq_ignore_ascii_case("pkginfo") {
            self.pkginfo_found = true;
        }

        let under_archive = in_archive_dir(&entry.relative_path);
        if under_archive {
            self.archive_dir_found = true;
        }

        match entry.extension.as_str() {
            "tar" => self.tar_count += 1,
            "dat" => self.dat_count += 1,
            "rem" => self.rem_count += 1,
            "ipd" => self.ipd_count += 1,
            _ => {}
        }

        if under_archive || entry.has_extension("tar") {
            self.push_member(entry.relative_path.clone());
        }
    }

    /// Adds member names listed from inside an archive file
    pub fn add_archive_members<I>(&mut self, archive: &str, members: I)
    where
        I: IntoIterator<Item = String>,
    {
        for member in members {
            if in_archive_dir(&member) {
                self.archive_dir_found = true;
            }
            let base = member.rsplit('/').next().unwrap_or(&member);
            if base.eq_ignore_ascii_case("manifest.xml") {
                self.manifest_found = true;
            }
            if base.eq_ignore_ascii_case("pkginfo") {
                self.pkginfo_found = true;
            }
            self.push_member(format!("{}!{}", archive, member));
        }
    }

    fn push_member(&mut self, name: String) {
        if self.archive_members.len() < MAX_ARCHIVE_MEMBERS {
            self.archive_members.push(name);
        }
    }
}

fn in_archive_dir(relative_path: &str) -> bool {
    let mut segments: Vec<&str> = relative_path.split(['/', '\\']).collect();
    segments.pop();
    segments.iter().any(|s| s.eq_ignore_ascii_case("archive"))
}

/// Applies the rule list to gathered evidence
pub fn classify(evidence: &TreeEvidence) -> BackupFormatResult {
    let (format, confidence, rationale) = decide(evidence);
    BackupFormatResult {
        format,
        confidence,
        rationale,
        manifest_found: evidence.manifest_found,
        pkginfo_found: evidence.pkginfo_found,
        archive_members: evidence.archive_members.clone(),
    }
}

fn decide(e: &TreeEvidence) -> (BackupFormat, u8, String) {
    if let Some(file) = &e.qnx_file {
        return (
            BackupFormat::Bb10TarQnx,
            95,
            format!("{} starts with the QNX encrypted TAR magic", file),
        );
    }
    if let Some(file) = &e.per_file {
        return (
            BackupFormat::Bb10TarPer,
            95,
            format!("{} starts with the PER encrypted TAR magic", file),
        );
    }
    if e.pkginfo_found && e.manifest_found && (e.archive_dir_found || e.tar_count > 0) {
        return (
            BackupFormat::Bb10Bbb,
            90,
            format!(
                "PkgInfo and Manifest.xml present (Archive/ directory: {}, .tar files: {})",
                e.archive_dir_found, e.tar_count
            ),
        );
    }
    if e.manifest_found && e.dat_count > 3 && !e.pkginfo_found {
        return (
            BackupFormat::BbbV2Windows,
            85,
            format!("Manifest.xml with {} .dat files and no PkgInfo", e.dat_count),
        );
    }
    if e.ipd_count > 0 {
        return (
            BackupFormat::Ipd,
            90,
            format!("{} .ipd file(s) present", e.ipd_count),
        );
    }
    if e.rem_count > 0 && e.dat_count > 0 {
        return (
            BackupFormat::BbbV1Mac,
            70,
            format!(
                "{} .rem and {} .dat files present",
                e.rem_count, e.dat_count
            ),
        );
    }
    (
        BackupFormat::Unknown,
        30,
        format!(
            "No known layout matched ({} .rem, {} .dat, {} .tar files)",
            e.rem_count, e.dat_count, e.tar_count
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn entry(rel: &str) -> FileEntry {
        FileEntry::new(Path::new("/root"), PathBuf::from("/root").join(rel), 10)
    }

    fn evidence(files: &[&str]) -> TreeEvidence {
        let mut e = TreeEvidence::new();
        for f in files {
            e.observe(&entry(f), None);
        }
        e
    }

    #[test]
    fn qnx_magic_wins_over_everything() {
        let mut e = evidence(&["PkgInfo", "Manifest.xml", "Archive/a.tar", "x.ipd"]);
        e.observe(&entry("blob.bin"), Some(&[0x51, 0x4E, 0x58, 0x00, 0x01]));
        let result = classify(&e);
        assert_eq!(result.format, BackupFormat::Bb10TarQnx);
        assert_eq!(result.confidence, 95);
        assert!(result.manifest_found);
    }

    #[test]
    fn per_magic() {
        let mut e = TreeEvidence::new();
        e.observe(&entry("b"), Some(&PER_MAGIC));
        assert_eq!(classify(&e).format, BackupFormat::Bb10TarPer);
    }

    #[test]
    fn bbb_layout() {
        let result = classify(&evidence(&["PkgInfo", "Manifest.xml", "Archive/appdata.tar"]));
        assert_eq!(result.format, BackupFormat::Bb10Bbb);
        assert_eq!(result.confidence, 90);
        assert_eq!(result.archive_members, vec!["Archive/appdata.tar".to_string()]);
    }

    #[test]
    fn windows_v2_needs_more_than_three_dat() {
        let three = evidence(&["Manifest.xml", "1.dat", "2.dat", "3.dat"]);
        assert_ne!(classify(&three).format, BackupFormat::BbbV2Windows);
        let four = evidence(&["Manifest.xml", "1.dat", "2.dat", "3.dat", "4.dat"]);
        assert_eq!(classify(&four).format, BackupFormat::BbbV2Windows);
    }

    #[test]
    fn ipd_and_mac_and_unknown() {
        assert_eq!(classify(&evidence(&["old.IPD"])).format, BackupFormat::Ipd);
        assert_eq!(
            classify(&evidence(&["a.rem", "b.dat"])).format,
            BackupFormat::BbbV1Mac
        );
        let unknown = classify(&evidence(&["a.rem", "notes.txt"]));
        assert_eq!(unknown.format, BackupFormat::Unknown);
        assert_eq!(unknown.confidence, 30);
        assert!(unknown.rationale.contains("1 .rem"));
    }

    #[test]
    fn members_from_bbb_archive_count_as_layout() {
        let mut e = evidence(&["backup.bbb"]);
        e.add_archive_members(
            "backup.bbb",
            vec![
                "PkgInfo".to_string(),
                "Manifest.xml".to_string(),
                "Archive/settings.tar".to_string(),
            ],
        );
        let result = classify(&e);
        assert_eq!(result.format, BackupFormat::Bb10Bbb);
        assert!(result.archive_members.contains(&"backup.bbb!Archive/settings.tar".to_string()));
    }
}
