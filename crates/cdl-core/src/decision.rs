//! Decision records pairing a correction with the media it applies to.

use std::fmt;

use crate::{ColorCorrection, ColorSpaceDesc, Descriptions, Handle, MediaRef};

/// Identity of a [`ColorDecision`], allocated by its
/// [`Context`](crate::Context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecisionId(u64);

impl DecisionId {
    /// Wraps a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decision#{}", self.0)
    }
}

/// One `<ColorDecision>`: a correction and an optional media reference.
///
/// Decisions are built by [`Context::new_decision`](crate::Context::new_decision);
/// the media reference is attached through
/// [`Context::attach_media_ref`](crate::Context::attach_media_ref) so it
/// records this decision as its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorDecision {
    id: DecisionId,
    correction: Handle<ColorCorrection>,
    media_ref: Option<Handle<MediaRef>>,
    desc: Descriptions,
    color_space: ColorSpaceDesc,
}

impl ColorDecision {
    pub(crate) fn new(id: DecisionId, correction: Handle<ColorCorrection>) -> Self {
        Self {
            id,
            correction,
            media_ref: None,
            desc: Descriptions::new(),
            color_space: ColorSpaceDesc::new(),
        }
    }

    /// Decision identity.
    pub fn id(&self) -> DecisionId {
        self.id
    }

    /// The decision's correction.
    pub fn correction(&self) -> Handle<ColorCorrection> {
        self.correction
    }

    /// The attached media reference, if any.
    pub fn media_ref(&self) -> Option<Handle<MediaRef>> {
        self.media_ref
    }

    pub(crate) fn replace_media_ref(&mut self, media_ref: Handle<MediaRef>) -> Option<Handle<MediaRef>> {
        self.media_ref.replace(media_ref)
    }

    /// Decision-level descriptions.
    pub fn desc(&self) -> &Descriptions {
        &self.desc
    }

    /// Mutable decision-level descriptions.
    pub fn desc_mut(&mut self) -> &mut Descriptions {
        &mut self.desc
    }

    /// Input/viewing descriptions.
    pub fn color_space(&self) -> &ColorSpaceDesc {
        &self.color_space
    }

    /// Mutable input/viewing descriptions.
    pub fn color_space_mut(&mut self) -> &mut ColorSpaceDesc {
        &mut self.color_space
    }
}
