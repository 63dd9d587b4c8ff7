//! Image sequence detection for media references.
//!
//! A media reference may name a single frame (`shot.0042.exr`), an existing
//! sequence mask (`shot.####.exr`, `shot.%04d.exr`), or a directory holding
//! one or more sequences. This module turns any of those into sequence
//! masks: the frame number replaced by one `#` per digit.
//!
//! # Frame Numbers
//!
//! A frame number is the last run of digits that sits between a `.` or `_`
//! and the file extension:
//!
//! - `TCM1L001_20140330.0830710.ari` -> `TCM1L001_20140330.#######.ari`
//! - `B002_C001_01101G_004.R3D` -> `B002_C001_01101G_###.R3D`
//! - `A001C008_R402.ari` -> no frame (digits glued to a letter)
//!
//! Runs wider than [`MAX_HASH_PADDING`] are written as `%0Nd` instead.
//!
//! # Directories
//!
//! When the reference points at a directory, every file in it is matched and
//! grouped by prefix, suffix and frame width. Masks come out in the order
//! their first file appears in the listing; a group needs only one file.
//!
//! # Example
//!
//! ```rust
//! use cdl_core::sequence::{group_sequences, FramePattern};
//!
//! let pattern = FramePattern::from_filename("shot.0042.exr").unwrap();
//! assert_eq!(pattern.prefix(), "shot.");
//! assert_eq!(pattern.suffix(), ".exr");
//! assert_eq!(pattern.padding(), 4);
//! assert_eq!(pattern.mask(), "shot.####.exr");
//!
//! let masks = group_sequences(["a.0001.exr", "a.0002.exr", "notes.txt", "b_01.dpx"]);
//! assert_eq!(masks, ["a.####.exr", "b_##.dpx"]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::{CdlError, CdlResult};

/// Widest frame run still written as `#` characters.
pub const MAX_HASH_PADDING: usize = 64;

fn frame_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<prefix>.*[._])(?P<frame>[0-9]+)(?P<suffix>\.[^.]*)$")
            .expect("frame pattern is a valid regex")
    })
}

fn mask_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[._](#+|%0?[0-9]*d)\.[^.]*$").expect("mask pattern is a valid regex")
    })
}

/// Returns true if `filename` is already a sequence mask: a `#` run or
/// `%0Nd` in the frame position, after `.` or `_` and before the extension.
///
/// ```rust
/// use cdl_core::sequence::is_mask;
///
/// assert!(is_mask("winter.#####.ned"));
/// assert!(is_mask("TCM1L001_20140330.%05d.ari"));
/// assert!(!is_mask("winter.00001.ned"));
/// assert!(!is_mask("100%done.0001.exr"));
/// ```
pub fn is_mask(filename: &str) -> bool {
    mask_re().is_match(filename)
}

/// The shape shared by all frames of one sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramePattern {
    prefix: String,
    suffix: String,
    padding: usize,
}

impl FramePattern {
    /// Creates a pattern from its components.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>, padding: usize) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            padding: padding.max(1),
        }
    }

    /// Extracts the pattern of a numbered filename, or `None` if the name has
    /// no frame number.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let caps = frame_re().captures(filename)?;
        Some(Self::new(&caps["prefix"], &caps["suffix"], caps["frame"].len()))
    }

    /// Text before the frame number.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Text after the frame number, starting with the extension dot.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Number of digits in the frame number.
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Hash-style mask, e.g. `shot.####.exr`.
    pub fn hash_pattern(&self) -> String {
        format!("{}{}{}", self.prefix, "#".repeat(self.padding), self.suffix)
    }

    /// Printf-style mask, e.g. `shot.%04d.exr`.
    pub fn printf_pattern(&self) -> String {
        format!("{}%0{}d{}", self.prefix, self.padding, self.suffix)
    }

    /// Display mask: hashes, or printf style past [`MAX_HASH_PADDING`].
    pub fn mask(&self) -> String {
        if self.padding > MAX_HASH_PADDING {
            self.printf_pattern()
        } else {
            self.hash_pattern()
        }
    }

    /// Path of a given frame, zero-padded to the pattern width.
    pub fn frame_name(&self, frame: u64) -> String {
        format!("{}{:0width$}{}", self.prefix, frame, self.suffix, width = self.padding)
    }
}

impl fmt::Display for FramePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mask())
    }
}

/// Masks for a single filename, without looking at siblings.
///
/// A name that is already a mask is returned unchanged; a numbered name
/// yields its mask; anything else yields nothing.
pub fn single_file_sequences(filename: &str) -> Vec<String> {
    if is_mask(filename) {
        return vec![filename.to_string()];
    }
    FramePattern::from_filename(filename)
        .map(|p| vec![p.mask()])
        .unwrap_or_default()
}

/// Groups a directory listing into sequence masks.
///
/// Names without a frame number are skipped. Groups are keyed by prefix,
/// suffix and frame width and emitted in the order their first member
/// appears in `names`. [`DiskSource`] sorts its listings by name, so for
/// directories on disk this is alphabetical order of the first member.
pub fn group_sequences<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut order: Vec<FramePattern> = Vec::new();
    let mut counts: HashMap<FramePattern, usize> = HashMap::new();

    for name in names {
        let Some(pattern) = FramePattern::from_filename(name.as_ref()) else {
            continue;
        };
        let count = counts.entry(pattern.clone()).or_insert(0);
        if *count == 0 {
            order.push(pattern);
        }
        *count += 1;
    }

    for pattern in &order {
        debug!(mask = %pattern, frames = counts[pattern], "found sequence");
    }
    order.iter().map(FramePattern::mask).collect()
}

/// Result of sequence detection for one reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceScan {
    /// True if at least one sequence was found.
    pub is_seq: bool,
    /// All masks found, in detection order.
    pub sequences: Vec<String>,
}

impl SequenceScan {
    /// Builds a scan from its masks.
    pub fn from_sequences(sequences: Vec<String>) -> Self {
        Self {
            is_seq: !sequences.is_empty(),
            sequences,
        }
    }

    /// The primary (first) mask.
    pub fn seq(&self) -> Option<&str> {
        self.sequences.first().map(String::as_str)
    }
}

/// Filesystem access used by sequence detection.
pub trait DirSource {
    /// Returns true if `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Lists the file names in `path`.
    fn list(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// [`DirSource`] backed by the real filesystem.
///
/// Listings hold every entry that is not a directory, symlinks resolved, and
/// are sorted by name so results do not depend on the platform's
/// enumeration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSource;

impl DirSource for DiskSource {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            // Dangling links have no metadata and are listed like files.
            let is_dir = std::fs::metadata(entry.path()).is_ok_and(|m| m.is_dir());
            if !is_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Decides between single-file and directory detection and runs it.
pub struct SequenceDetector {
    source: Box<dyn DirSource>,
    scan_directories: bool,
}

impl fmt::Debug for SequenceDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceDetector")
            .field("scan_directories", &self.scan_directories)
            .finish_non_exhaustive()
    }
}

impl Default for SequenceDetector {
    fn default() -> Self {
        Self::new(DiskSource)
    }
}

impl SequenceDetector {
    /// Creates a detector over `source` with directory scanning enabled.
    pub fn new(source: impl DirSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            scan_directories: true,
        }
    }

    /// Enables or disables directory listing. When disabled every reference
    /// is treated as a single file.
    pub fn with_scan_directories(mut self, scan: bool) -> Self {
        self.scan_directories = scan;
        self
    }

    /// Returns true if directories are listed.
    pub fn scan_directories(&self) -> bool {
        self.scan_directories
    }

    /// Lists `dir` and groups its files into masks.
    ///
    /// A directory that cannot be found is [`CdlError::MissingDirectory`].
    pub fn scan_dir(&self, dir: &Path) -> CdlResult<Vec<String>> {
        let names = self.source.list(dir).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CdlError::MissingDirectory {
                path: dir.to_path_buf(),
            },
            _ => CdlError::Io(e),
        })?;
        debug!(dir = %dir.display(), entries = names.len(), "scanning directory for sequences");
        Ok(group_sequences(names))
    }

    /// Detects sequences for a reference whose full path is `path` and whose
    /// last component is `filename`.
    pub fn detect(&self, path: &Path, filename: &str) -> CdlResult<SequenceScan> {
        let sequences = if self.scan_directories && self.source.is_dir(path) {
            self.scan_dir(path)?
        } else {
            single_file_sequences(filename)
        };
        Ok(SequenceScan::from_sequences(sequences))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory [`DirSource`]. `None` listing means the directory vanished.
    pub(crate) struct FakeSource {
        pub is_dir: bool,
        pub listing: Option<Vec<&'static str>>,
    }

    impl DirSource for FakeSource {
        fn is_dir(&self, _path: &Path) -> bool {
            self.is_dir
        }

        fn list(&self, _path: &Path) -> io::Result<Vec<String>> {
            match &self.listing {
                Some(names) => Ok(names.iter().map(|s| s.to_string()).collect()),
                None => Err(io::Error::new(io::ErrorKind::NotFound, "gone")),
            }
        }
    }

    pub(crate) const ARRI_LISTING: &[&str] = &[
        ".aliases",
        "pepperjack_corn.jpg",
        "TCM1L001_20140330.0830710.ari",
        "TCM1L001_20140330.0830711.ari",
        "TCM1L001_20140330.0830712.ari",
        "TCM1L001_20140330.0830713.ari",
        "TCM1L001_20140330.0830714.ari",
        "TCM1L014_20140330.0863186.ari",
        "TCM1L014_20140330.0863516.ari",
        "TCM1L014_20140330.0863916.ari",
        "TCM1L014_20140330.0864516.ari",
        "TCM1L014_20140330.0899516.ari",
        "TCM1L014_20140330.1863516.ari",
        "TCM1L014_20140330.2863516.ari",
        "TCM1L028_20140330.0926197.ari",
        "The best file of my life..ari",
    ];

    pub(crate) const ODD_LISTING: &[&str] = &[
        "B002_C001_01101G_001.R3D",
        "B002_C001_01101G_002.R3D",
        "B002_C001_01101G_003.R3D",
        "B002_C001_01101G_004.R3D",
        "TakeThis SequenceandShoveitupyour.8.exr",
        "A001C008_R402.ari",
        "A001C008_R902.ari",
        "BB50A-05_A039.14278002315672351753261757362236126723618.ari",
    ];

    #[test]
    fn test_frame_pattern_from_filename() {
        let p = FramePattern::from_filename("shot_001.0042.exr").unwrap();
        assert_eq!(p.prefix(), "shot_001.");
        assert_eq!(p.suffix(), ".exr");
        assert_eq!(p.padding(), 4);
        assert_eq!(p.frame_name(7), "shot_001.0007.exr");
    }

    #[test]
    fn test_patterns() {
        let p = FramePattern::new("shot.", ".exr", 4);
        assert_eq!(p.printf_pattern(), "shot.%04d.exr");
        assert_eq!(p.hash_pattern(), "shot.####.exr");
        assert_eq!(p.to_string(), "shot.####.exr");
    }

    #[test]
    fn test_wide_run_uses_printf() {
        let p = FramePattern::new("x.", ".exr", MAX_HASH_PADDING + 1);
        assert_eq!(p.mask(), format!("x.%0{}d.exr", MAX_HASH_PADDING + 1));
    }

    #[test]
    fn test_non_frames() {
        for name in [
            "A001C008_R402.ari",
            "TCM1L00120140.ari",
            "TCM1L001_20140330.08307k10.ari",
            "pepperjack_corn.jpg",
            ".aliases",
            "The best file of my life..ari",
        ] {
            assert!(FramePattern::from_filename(name).is_none(), "{name}");
        }
    }

    #[test]
    fn test_single_file() {
        assert_eq!(
            single_file_sequences("TCM1L001_20140330.0830710.ari"),
            ["TCM1L001_20140330.#######.ari"]
        );
        assert_eq!(
            single_file_sequences("B002_C001_01101G_004.R3D"),
            ["B002_C001_01101G_###.R3D"]
        );
        assert!(single_file_sequences("TCM1L00120140.ari").is_empty());
    }

    #[test]
    fn test_mask_chars_outside_frame_position() {
        assert_eq!(single_file_sequences("100%done.0001.exr"), ["100%done.####.exr"]);
        assert_eq!(single_file_sequences("take#2.0010.dpx"), ["take#2.####.dpx"]);
        assert!(single_file_sequences("notes#1.txt").is_empty());
    }

    #[test]
    fn test_single_file_masks_pass_through() {
        for name in [
            "B002 C001-01101G_%327864d.R3D",
            "TCM1L001_20140330.%05d.ari",
            "winter.#####.ned",
            "17438.hds356_######.exr",
        ] {
            assert_eq!(single_file_sequences(name), [name]);
        }
    }

    #[test]
    fn test_group_arri_listing() {
        assert_eq!(
            group_sequences(ARRI_LISTING),
            [
                "TCM1L001_20140330.#######.ari",
                "TCM1L014_20140330.#######.ari",
                "TCM1L028_20140330.#######.ari",
            ]
        );
    }

    #[test]
    fn test_group_odd_listing() {
        assert_eq!(
            group_sequences(ODD_LISTING),
            [
                "B002_C001_01101G_###.R3D",
                "TakeThis SequenceandShoveitupyour.#.exr",
                "BB50A-05_A039.#########################################.ari",
            ]
        );
    }

    #[test]
    fn test_group_no_sequences() {
        let listing = [
            ".aliases",
            "pepperjack_corn.jpg",
            "TCM1L001_20140330.08307k10.ari",
            "The best file of my life..ari",
        ];
        assert!(group_sequences(listing).is_empty());
    }

    #[test]
    fn test_group_follows_first_appearance() {
        let masks = group_sequences(["z.001.exr", "a.001.exr", "z.002.exr"]);
        assert_eq!(masks, ["z.###.exr", "a.###.exr"]);
    }

    #[test]
    fn test_group_splits_on_width() {
        let masks = group_sequences(["s.01.exr", "s.001.exr", "s.02.exr"]);
        assert_eq!(masks, ["s.##.exr", "s.###.exr"]);
    }

    #[test]
    fn test_detect_directory() {
        let det = SequenceDetector::new(FakeSource {
            is_dir: true,
            listing: Some(ARRI_LISTING.to_vec()),
        });
        let scan = det.detect(Path::new("hello"), "hello").unwrap();
        assert!(scan.is_seq);
        assert_eq!(scan.seq(), Some("TCM1L001_20140330.#######.ari"));
        assert_eq!(scan.sequences.len(), 3);
    }

    #[test]
    fn test_detect_missing_directory() {
        let det = SequenceDetector::new(FakeSource { is_dir: true, listing: None });
        let err = det.detect(Path::new("hello"), "hello").unwrap_err();
        assert!(matches!(err, CdlError::MissingDirectory { .. }));
        assert!(err.is_value_error());
    }

    #[test]
    fn test_detect_without_directory_scan() {
        let det = SequenceDetector::new(FakeSource {
            is_dir: true,
            listing: Some(ARRI_LISTING.to_vec()),
        })
        .with_scan_directories(false);
        let scan = det.detect(Path::new("x/a.0001.exr"), "a.0001.exr").unwrap();
        assert_eq!(scan.sequences, ["a.####.exr"]);
    }

    #[test]
    fn test_disk_source_scan() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["plate.1001.dpx", "plate.1002.dpx", "readme.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.0001.d")).unwrap();

        let det = SequenceDetector::default();
        let scan = det.detect(dir.path(), "unused").unwrap();
        assert_eq!(scan.sequences, ["plate.####.dpx"]);

        let err = det.scan_dir(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, CdlError::MissingDirectory { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_disk_source_follows_symlinks() {
        let frames = tempfile::tempdir().unwrap();
        let links = tempfile::tempdir().unwrap();
        for frame in 1..=3 {
            let name = format!("plate.{frame:04}.exr");
            std::fs::write(frames.path().join(&name), b"").unwrap();
            std::os::unix::fs::symlink(frames.path().join(&name), links.path().join(&name)).unwrap();
        }
        std::os::unix::fs::symlink(frames.path(), links.path().join("linked_dir.0001.d")).unwrap();

        let scan = SequenceDetector::default().detect(links.path(), "").unwrap();
        assert!(scan.is_seq);
        assert_eq!(scan.sequences, ["plate.####.exr"]);
    }
}
