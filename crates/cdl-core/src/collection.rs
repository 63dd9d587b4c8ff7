//! Collections of corrections and decisions (`.ccc` and `.cdl` documents).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::correction::absolute;
use crate::{CdlResult, ColorCorrection, ColorDecision, ColorSpaceDesc, Descriptions, Handle};

/// Which document a collection becomes when written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// `<ColorCorrectionCollection>`: bare corrections.
    Ccc,
    /// `<ColorDecisionList>`: decisions wrapping corrections.
    Cdl,
}

impl CollectionKind {
    /// File extension for this kind.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Ccc => "ccc",
            Self::Cdl => "cdl",
        }
    }
}

/// A group of corrections and decisions plus collection-level metadata.
///
/// Corrections are referenced by handle; the entities live in the
/// [`Context`](crate::Context) registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorCollection {
    kind: CollectionKind,
    file_in: Option<PathBuf>,
    file_out: Option<PathBuf>,
    desc: Descriptions,
    color_space: ColorSpaceDesc,
    corrections: Vec<Handle<ColorCorrection>>,
    decisions: Vec<ColorDecision>,
}

impl ColorCollection {
    /// Creates an empty collection. `file_in` is stored absolute.
    pub fn new(kind: CollectionKind, file_in: Option<&Path>) -> CdlResult<Self> {
        Ok(Self {
            kind,
            file_in: file_in.map(absolute).transpose()?,
            file_out: None,
            desc: Descriptions::new(),
            color_space: ColorSpaceDesc::new(),
            corrections: Vec::new(),
            decisions: Vec::new(),
        })
    }

    /// Document kind.
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Switches between `.ccc` and `.cdl` output.
    pub fn set_kind(&mut self, kind: CollectionKind) {
        self.kind = kind;
    }

    /// Absolute path of the source document.
    pub fn file_in(&self) -> Option<&Path> {
        self.file_in.as_deref()
    }

    /// Destination computed by the last [`determine_dest`](Self::determine_dest).
    pub fn file_out(&self) -> Option<&Path> {
        self.file_out.as_deref()
    }

    /// Collection-level descriptions.
    pub fn desc(&self) -> &Descriptions {
        &self.desc
    }

    /// Mutable collection-level descriptions.
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

    /// Bare corrections, in document order.
    pub fn corrections(&self) -> &[Handle<ColorCorrection>] {
        &self.corrections
    }

    /// Decisions, in document order.
    pub fn decisions(&self) -> &[ColorDecision] {
        &self.decisions
    }

    /// Mutable decisions.
    pub fn decisions_mut(&mut self) -> &mut [ColorDecision] {
        &mut self.decisions
    }

    /// Appends a bare correction. A handle already present is ignored.
    pub fn push_correction(&mut self, correction: Handle<ColorCorrection>) {
        if !self.corrections.contains(&correction) {
            self.corrections.push(correction);
        }
    }

    /// Appends a decision.
    pub fn push_decision(&mut self, decision: ColorDecision) {
        self.decisions.push(decision);
    }

    /// Every correction reachable from the collection, bare ones first,
    /// without duplicates.
    pub fn all_corrections(&self) -> Vec<Handle<ColorCorrection>> {
        let mut all = self.corrections.clone();
        for decision in &self.decisions {
            if !all.contains(&decision.correction()) {
                all.push(decision.correction());
            }
        }
        all
    }

    /// Returns true if the collection holds nothing.
    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty() && self.decisions.is_empty()
    }

    /// Computes `file_out` as `<dir of file_in>/<name>.<format>`.
    pub fn determine_dest(&mut self, name: &str, format: &str) -> &Path {
        let file = format!("{name}.{format}");
        let dest = match self.file_in.as_deref().and_then(Path::parent) {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        };
        self.file_out.insert(dest).as_path()
    }
}
