//! Media references and their URI-indexed registry.
//!
//! A [`MediaRef`] is the `<MediaRef ref="...">` of a color decision: a URI of
//! the form `[protocol://]directory/filename`. The three components are kept
//! alongside the full reference and any of them can be replaced; every
//! change recomposes the reference, re-keys the entity in its
//! [`MediaRefRegistry`] and drops the cached sequence information.
//!
//! Several references may share one URI, so the registry is
//! [`Occupancy::Shared`](crate::Occupancy::Shared).
//!
//! # Sequences
//!
//! Whether the reference names an image sequence is computed on first
//! access and cached until the next structural change. See
//! [`crate::sequence`] for the detection rules.
//!
//! ```rust
//! use cdl_core::{MediaRefRegistry, ValuePolicy};
//!
//! let mut refs = MediaRefRegistry::shared();
//! let h = refs.create("ftp://heeba/jeeba/race/car.0001.jpg", None).unwrap();
//!
//! let mr = refs.get_mut(h).unwrap();
//! assert_eq!(mr.protocol(), "ftp");
//! assert_eq!(mr.directory(), "heeba/jeeba/race");
//! assert_eq!(mr.seq(ValuePolicy::Lenient).unwrap(), Some("car.####.jpg"));
//! ```

use std::path::PathBuf;

use tracing::warn;

use crate::sequence::{SequenceDetector, SequenceScan};
use crate::{CdlError, CdlResult, DecisionId, Handle, Registered, UniqueRegistry, ValuePolicy};

/// Registry of media references, many per URI.
pub type MediaRefRegistry = UniqueRegistry<MediaRef>;

const PROTOCOL_SEP: &str = "://";

/// The three parts of a media reference.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UriParts {
    protocol: String,
    directory: String,
    filename: String,
}

impl UriParts {
    fn parse(uri: &str) -> CdlResult<Self> {
        let (protocol, path) = match uri.split_once(PROTOCOL_SEP) {
            Some((protocol, path)) => (protocol, path),
            None => ("", uri),
        };
        let (directory, filename) = split_path(path);
        if filename.is_empty() {
            return Err(CdlError::malformed_uri(uri, "no filename component"));
        }
        Ok(Self {
            protocol: protocol.to_string(),
            directory: directory.to_string(),
            filename: filename.to_string(),
        })
    }

    fn path(&self) -> String {
        join_path(&self.directory, &self.filename)
    }

    fn compose(&self) -> String {
        if self.protocol.is_empty() {
            self.path()
        } else {
            format!("{}{}{}", self.protocol, PROTOCOL_SEP, self.path())
        }
    }
}

/// Splits on the last `/`. The head loses trailing slashes unless it is
/// the root itself.
fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => {
            let head = &path[..=i];
            let trimmed = head.trim_end_matches('/');
            let head = if trimmed.is_empty() { head } else { trimmed };
            (head, &path[i + 1..])
        }
        None => ("", path),
    }
}

fn join_path(directory: &str, filename: &str) -> String {
    if directory.is_empty() || filename.starts_with('/') {
        filename.to_string()
    } else if directory.ends_with('/') {
        format!("{directory}{filename}")
    } else {
        format!("{directory}/{filename}")
    }
}

/// A reference to the clip or files a decision applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRef {
    handle: Handle<MediaRef>,
    parent: Option<DecisionId>,
    uri: String,
    parts: UriParts,
    scan: Option<SequenceScan>,
}

impl Registered for MediaRef {
    fn registry_key(&self) -> &str {
        &self.uri
    }
}

impl MediaRef {
    /// Handle under which this reference is registered.
    pub fn handle(&self) -> Handle<MediaRef> {
        self.handle
    }

    /// The owning decision, fixed at construction.
    pub fn parent(&self) -> Option<DecisionId> {
        self.parent
    }

    /// Full reference string.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Protocol without the `://`, empty if none.
    pub fn protocol(&self) -> &str {
        &self.parts.protocol
    }

    /// Directory part, possibly empty.
    pub fn directory(&self) -> &str {
        &self.parts.directory
    }

    /// Last path component.
    pub fn filename(&self) -> &str {
        &self.parts.filename
    }

    /// Directory joined with filename, without the protocol.
    pub fn path(&self) -> PathBuf {
        PathBuf::from(self.parts.path())
    }

    /// Returns true if [`path`](Self::path) exists on disk.
    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Returns true if [`path`](Self::path) is absolute.
    pub fn is_abs(&self) -> bool {
        self.path().is_absolute()
    }

    /// Returns true if [`path`](Self::path) is a directory on disk.
    pub fn is_dir(&self) -> bool {
        self.path().is_dir()
    }

    /// Cached sequence flag, `None` until computed.
    pub fn cached_is_seq(&self) -> Option<bool> {
        self.scan.as_ref().map(|s| s.is_seq)
    }

    /// Cached sequence masks, `None` until computed.
    pub fn cached_sequences(&self) -> Option<&[String]> {
        self.scan.as_ref().map(|s| s.sequences.as_slice())
    }

    /// Returns true if the reference names a sequence, detecting on disk.
    pub fn is_seq(&mut self, policy: ValuePolicy) -> CdlResult<bool> {
        self.is_seq_with(&SequenceDetector::default(), policy)
    }

    /// Primary sequence mask, detecting on disk.
    pub fn seq(&mut self, policy: ValuePolicy) -> CdlResult<Option<&str>> {
        self.seq_with(&SequenceDetector::default(), policy)
    }

    /// All sequence masks, detecting on disk.
    pub fn sequences(&mut self, policy: ValuePolicy) -> CdlResult<&[String]> {
        self.sequences_with(&SequenceDetector::default(), policy)
    }

    /// Like [`is_seq`](Self::is_seq) with an explicit detector.
    pub fn is_seq_with(&mut self, detector: &SequenceDetector, policy: ValuePolicy) -> CdlResult<bool> {
        Ok(self.scan(detector, policy)?.is_seq)
    }

    /// Like [`seq`](Self::seq) with an explicit detector.
    pub fn seq_with(
        &mut self,
        detector: &SequenceDetector,
        policy: ValuePolicy,
    ) -> CdlResult<Option<&str>> {
        Ok(self.scan(detector, policy)?.seq())
    }

    /// Like [`sequences`](Self::sequences) with an explicit detector.
    pub fn sequences_with(
        &mut self,
        detector: &SequenceDetector,
        policy: ValuePolicy,
    ) -> CdlResult<&[String]> {
        Ok(&self.scan(detector, policy)?.sequences)
    }

    /// Computes detection once per cache generation.
    ///
    /// A missing directory fails under the strict policy. Under the lenient
    /// one it is logged and cached as "no sequences".
    fn scan(&mut self, detector: &SequenceDetector, policy: ValuePolicy) -> CdlResult<&SequenceScan> {
        let scan = match self.scan.take() {
            Some(scan) => scan,
            None => match detector.detect(&self.path(), &self.parts.filename) {
                Ok(scan) => scan,
                Err(err @ CdlError::MissingDirectory { .. }) if !policy.is_strict() => {
                    warn!(uri = %self.uri, error = %err, "sequence detection skipped");
                    SequenceScan::default()
                }
                Err(err) => return Err(err),
            },
        };
        Ok(&*self.scan.insert(scan))
    }
}

impl UniqueRegistry<MediaRef> {
    /// Parses `uri` and registers a new reference owned by `parent`.
    pub fn create(&mut self, uri: &str, parent: Option<DecisionId>) -> CdlResult<Handle<MediaRef>> {
        let parts = UriParts::parse(uri)?;
        self.insert_with(|handle| {
            Ok(MediaRef {
                handle,
                parent,
                uri: parts.compose(),
                parts,
                scan: None,
            })
        })
    }

    /// Replaces the whole reference.
    pub fn set_ref(&mut self, handle: Handle<MediaRef>, uri: &str) -> CdlResult<()> {
        let parts = UriParts::parse(uri)?;
        self.apply_parts(handle, parts)
    }

    /// Replaces the protocol. A trailing `://` is dropped.
    pub fn set_protocol(&mut self, handle: Handle<MediaRef>, protocol: &str) -> CdlResult<()> {
        let protocol = protocol.strip_suffix(PROTOCOL_SEP).unwrap_or(protocol);
        let mut parts = self.try_get(handle)?.parts.clone();
        parts.protocol = protocol.to_string();
        self.apply_parts(handle, parts)
    }

    /// Replaces the directory.
    pub fn set_directory(&mut self, handle: Handle<MediaRef>, directory: &str) -> CdlResult<()> {
        let mut parts = self.try_get(handle)?.parts.clone();
        parts.directory = directory.to_string();
        self.apply_parts(handle, parts)
    }

    /// Replaces the filename. It must be a single non-empty path component.
    pub fn set_filename(&mut self, handle: Handle<MediaRef>, filename: &str) -> CdlResult<()> {
        let mut parts = self.try_get(handle)?.parts.clone();
        if filename.is_empty() || filename.contains('/') {
            let uri = join_path(&parts.directory, filename);
            return Err(CdlError::malformed_uri(uri, "filename must be one path component"));
        }
        parts.filename = filename.to_string();
        self.apply_parts(handle, parts)
    }

    /// References registered under `uri`, in insertion order.
    pub fn find(&self, uri: &str) -> &[Handle<MediaRef>] {
        self.members(uri)
    }

    fn apply_parts(&mut self, handle: Handle<MediaRef>, parts: UriParts) -> CdlResult<()> {
        let uri = parts.compose();
        self.rekey(handle, &uri, |mr| {
            mr.uri = uri.clone();
            mr.parts = parts;
            mr.scan = None;
        })
    }
}
