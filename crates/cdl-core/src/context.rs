//! The owning scope of one conversion run.
//!
//! A [`Context`] holds the error policy, the correction registry (one
//! correction per id), the media-reference registry (many references per
//! URI) and the sequence detector. Two contexts never see each other's
//! entities, so independent runs in one process do not interfere.
//!
//! # Example
//!
//! ```rust
//! use cdl_core::{Context, ValuePolicy};
//!
//! let mut ctx = Context::new(ValuePolicy::Strict);
//! let policy = ctx.policy();
//! let sh010 = ctx.new_correction("sh010", None).unwrap();
//! ctx.correction_mut(sh010).unwrap().set_slope("1.1 1.0 0.9", policy).unwrap();
//!
//! // Ids are unique within the context.
//! assert!(ctx.new_correction("sh010", None).unwrap_err().is_identity_error());
//!
//! let mut decision = ctx.new_decision(sh010).unwrap();
//! let mr = ctx.attach_media_ref(&mut decision, "plates/sh010.1001.exr").unwrap();
//! assert_eq!(ctx.media_ref(mr).unwrap().parent(), Some(decision.id()));
//! ```

use std::path::Path;

use tracing::debug;

use crate::sequence::SequenceDetector;
use crate::{
    CdlError, CdlResult, ColorCorrection, ColorDecision, Config, CorrectionRegistry, DecisionId,
    Handle, MediaRef, MediaRefRegistry, ValuePolicy,
};

/// Registries, policy and detector for one conversion run.
#[derive(Debug)]
pub struct Context {
    policy: ValuePolicy,
    corrections: CorrectionRegistry,
    media_refs: MediaRefRegistry,
    detector: SequenceDetector,
    next_decision: u64,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(ValuePolicy::default())
    }
}

impl Context {
    /// Creates an empty context.
    pub fn new(policy: ValuePolicy) -> Self {
        Self {
            policy,
            corrections: CorrectionRegistry::exclusive(),
            media_refs: MediaRefRegistry::shared(),
            detector: SequenceDetector::default(),
            next_decision: 1,
        }
    }

    /// Creates an empty context from loaded settings.
    pub fn from_config(config: &Config) -> Self {
        let mut ctx = Self::new(config.policy());
        ctx.detector = SequenceDetector::default().with_scan_directories(config.scan_directories);
        ctx
    }

    /// Current error policy.
    pub fn policy(&self) -> ValuePolicy {
        self.policy
    }

    /// Changes the error policy for subsequent operations.
    pub fn set_policy(&mut self, policy: ValuePolicy) {
        self.policy = policy;
    }

    /// Returns true under [`ValuePolicy::Strict`].
    pub fn strict_errors(&self) -> bool {
        self.policy.is_strict()
    }

    /// Sets the policy from a strict/lenient flag.
    pub fn set_strict_errors(&mut self, strict: bool) {
        self.policy = ValuePolicy::from_strict(strict);
    }

    /// Detector used by the sequence accessors.
    pub fn detector(&self) -> &SequenceDetector {
        &self.detector
    }

    /// Replaces the detector, e.g. with one over a different [`DirSource`](crate::sequence::DirSource).
    pub fn set_detector(&mut self, detector: SequenceDetector) {
        self.detector = detector;
    }

    // ------------------------------------------------------------------
    // Corrections
    // ------------------------------------------------------------------

    /// Creates and registers a correction. See [`CorrectionRegistry::create`].
    pub fn new_correction(
        &mut self,
        id: &str,
        file_in: Option<&Path>,
    ) -> CdlResult<Handle<ColorCorrection>> {
        self.corrections.create(id, file_in, self.policy)
    }

    /// Renames a correction. See [`CorrectionRegistry::set_id`].
    pub fn set_correction_id(&mut self, handle: Handle<ColorCorrection>, id: &str) -> CdlResult<()> {
        self.corrections.set_id(handle, id, self.policy)
    }

    /// Assigns a correction field by name. See [`CorrectionRegistry::set_field`].
    pub fn set_correction_field(
        &mut self,
        handle: Handle<ColorCorrection>,
        field: &str,
        value: &str,
    ) -> CdlResult<()> {
        self.corrections.set_field(handle, field, value, self.policy)
    }

    /// Looks up a correction.
    pub fn correction(&self, handle: Handle<ColorCorrection>) -> Option<&ColorCorrection> {
        self.corrections.get(handle)
    }

    /// Mutable access to a correction's values and descriptions.
    pub fn correction_mut(&mut self, handle: Handle<ColorCorrection>) -> Option<&mut ColorCorrection> {
        self.corrections.get_mut(handle)
    }

    /// Looks up a correction by id.
    pub fn find_correction(&self, id: &str) -> Option<Handle<ColorCorrection>> {
        self.corrections.find(id)
    }

    /// Unregisters a correction, freeing its id.
    pub fn remove_correction(&mut self, handle: Handle<ColorCorrection>) -> Option<ColorCorrection> {
        self.corrections.remove(handle)
    }

    /// All corrections.
    pub fn corrections(&self) -> &CorrectionRegistry {
        &self.corrections
    }

    // ------------------------------------------------------------------
    // Media references
    // ------------------------------------------------------------------

    /// Creates and registers a media reference.
    pub fn new_media_ref(
        &mut self,
        uri: &str,
        parent: Option<DecisionId>,
    ) -> CdlResult<Handle<MediaRef>> {
        self.media_refs.create(uri, parent)
    }

    /// Looks up a media reference.
    pub fn media_ref(&self, handle: Handle<MediaRef>) -> Option<&MediaRef> {
        self.media_refs.get(handle)
    }

    /// Mutable access to a media reference.
    pub fn media_ref_mut(&mut self, handle: Handle<MediaRef>) -> Option<&mut MediaRef> {
        self.media_refs.get_mut(handle)
    }

    /// All media references.
    pub fn media_refs(&self) -> &MediaRefRegistry {
        &self.media_refs
    }

    /// Registry access for URI component changes.
    pub fn media_refs_mut(&mut self) -> &mut MediaRefRegistry {
        &mut self.media_refs
    }

    /// See [`MediaRef::is_seq`].
    pub fn is_seq(&mut self, handle: Handle<MediaRef>) -> CdlResult<bool> {
        let mr = self.media_refs.get_mut(handle).ok_or(CdlError::StaleHandle)?;
        mr.is_seq_with(&self.detector, self.policy)
    }

    /// See [`MediaRef::seq`].
    pub fn seq(&mut self, handle: Handle<MediaRef>) -> CdlResult<Option<&str>> {
        let mr = self.media_refs.get_mut(handle).ok_or(CdlError::StaleHandle)?;
        mr.seq_with(&self.detector, self.policy)
    }

    /// See [`MediaRef::sequences`].
    pub fn sequences(&mut self, handle: Handle<MediaRef>) -> CdlResult<&[String]> {
        let mr = self.media_refs.get_mut(handle).ok_or(CdlError::StaleHandle)?;
        mr.sequences_with(&self.detector, self.policy)
    }

    // ------------------------------------------------------------------
    // Decisions
    // ------------------------------------------------------------------

    /// Creates a decision for a registered correction.
    pub fn new_decision(&mut self, correction: Handle<ColorCorrection>) -> CdlResult<ColorDecision> {
        self.corrections.try_get(correction)?;
        let id = DecisionId::new(self.next_decision);
        self.next_decision += 1;
        Ok(ColorDecision::new(id, correction))
    }

    /// Creates a media reference owned by `decision` and attaches it.
    ///
    /// A previously attached reference is removed from the registry.
    pub fn attach_media_ref(
        &mut self,
        decision: &mut ColorDecision,
        uri: &str,
    ) -> CdlResult<Handle<MediaRef>> {
        let handle = self.media_refs.create(uri, Some(decision.id()))?;
        if let Some(old) = decision.replace_media_ref(handle) {
            self.media_refs.remove(old);
        }
        Ok(handle)
    }

    /// Drops every correction and media reference. Outstanding handles
    /// become stale.
    pub fn reset(&mut self) {
        debug!(
            corrections = self.corrections.len(),
            media_refs = self.media_refs.len(),
            "resetting context"
        );
        self.corrections.clear();
        self.media_refs.clear();
    }
}
