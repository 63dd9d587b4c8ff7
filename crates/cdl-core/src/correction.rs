//! Color corrections and their id-indexed registry.
//!
//! A [`ColorCorrection`] carries an id that is unique within its
//! [`CorrectionRegistry`]. The id is chosen at construction and can be
//! changed later through [`CorrectionRegistry::set_id`]; both paths reject an
//! id held by a different correction regardless of the error policy.
//!
//! An empty id is resolved by the policy: the strict policy rejects it, the
//! lenient one assigns the next free zero-padded number (`"001"`, `"002"`,
//! ...).
//!
//! `file_in` is fixed at construction and `file_out` is only computed by
//! [`ColorCorrection::determine_dest`]; neither has a setter:
//!
//! ```compile_fail
//! use cdl_core::Context;
//!
//! let mut ctx = Context::default();
//! let h = ctx.new_correction("sh010", None).unwrap();
//! ctx.correction_mut(h).unwrap().file_in = None;
//! ```

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::value::{NumericInput, Triplet};
use crate::{
    CdlError, CdlResult, ColorSpaceDesc, Descriptions, Handle, Registered, SatNode, SopNode,
    UniqueRegistry, ValuePolicy,
};

/// Registry of corrections, one per id.
pub type CorrectionRegistry = UniqueRegistry<ColorCorrection>;

/// A named set of slope/offset/power/saturation values with metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorCorrection {
    handle: Handle<ColorCorrection>,
    id: String,
    file_in: Option<PathBuf>,
    file_out: Option<PathBuf>,
    desc: Descriptions,
    color_space: ColorSpaceDesc,
    sop: SopNode,
    sat: SatNode,
}

impl Registered for ColorCorrection {
    fn registry_key(&self) -> &str {
        &self.id
    }
}

impl ColorCorrection {
    /// Handle under which this correction is registered.
    pub fn handle(&self) -> Handle<ColorCorrection> {
        self.handle
    }

    /// Unique id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute path of the file this correction was read from.
    pub fn file_in(&self) -> Option<&Path> {
        self.file_in.as_deref()
    }

    /// Destination computed by the last [`determine_dest`](Self::determine_dest).
    pub fn file_out(&self) -> Option<&Path> {
        self.file_out.as_deref()
    }

    /// Correction-level descriptions.
    pub fn desc(&self) -> &Descriptions {
        &self.desc
    }

    /// Mutable correction-level descriptions.
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

    /// Shortcut for `color_space().input_desc()`.
    pub fn input_desc(&self) -> Option<&str> {
        self.color_space.input_desc()
    }

    /// Shortcut for `color_space().viewing_desc()`.
    pub fn viewing_desc(&self) -> Option<&str> {
        self.color_space.viewing_desc()
    }

    /// The owned SOP node.
    pub fn sop(&self) -> &SopNode {
        &self.sop
    }

    /// Mutable access to the owned SOP node.
    pub fn sop_mut(&mut self) -> &mut SopNode {
        &mut self.sop
    }

    /// The owned saturation node.
    pub fn sat_node(&self) -> &SatNode {
        &self.sat
    }

    /// Mutable access to the owned saturation node.
    pub fn sat_node_mut(&mut self) -> &mut SatNode {
        &mut self.sat
    }

    /// Slope per channel.
    pub fn slope(&self) -> Triplet {
        self.sop.slope()
    }

    /// Offset per channel.
    pub fn offset(&self) -> Triplet {
        self.sop.offset()
    }

    /// Power per channel.
    pub fn power(&self) -> Triplet {
        self.sop.power()
    }

    /// Saturation.
    pub fn sat(&self) -> f64 {
        self.sat.sat()
    }

    /// See [`SopNode::set_slope`].
    pub fn set_slope(&mut self, input: impl Into<NumericInput>, policy: ValuePolicy) -> CdlResult<()> {
        self.sop.set_slope(input, policy)
    }

    /// See [`SopNode::set_offset`].
    pub fn set_offset(&mut self, input: impl Into<NumericInput>, policy: ValuePolicy) -> CdlResult<()> {
        self.sop.set_offset(input, policy)
    }

    /// See [`SopNode::set_power`].
    pub fn set_power(&mut self, input: impl Into<NumericInput>, policy: ValuePolicy) -> CdlResult<()> {
        self.sop.set_power(input, policy)
    }

    /// See [`SatNode::set_sat`].
    pub fn set_sat(&mut self, input: impl Into<NumericInput>, policy: ValuePolicy) -> CdlResult<()> {
        self.sat.set_sat(input, policy)
    }

    /// Computes `file_out` as `<dir of file_in>/<id>.<format>`.
    ///
    /// Without a `file_in` the destination is relative. `file_in` is never
    /// touched, so repeated calls with the same tag give the same result.
    ///
    /// ```rust
    /// use cdl_core::Context;
    /// use std::path::Path;
    ///
    /// let mut ctx = Context::default();
    /// let h = ctx.new_correction("uniqueId", Some(Path::new("/grades/in.cc"))).unwrap();
    /// let cc = ctx.correction_mut(h).unwrap();
    /// assert_eq!(cc.determine_dest("cdl"), Path::new("/grades/uniqueId.cdl"));
    /// ```
    pub fn determine_dest(&mut self, format: &str) -> &Path {
        let name = format!("{}.{}", self.id, format);
        let dest = match self.file_in.as_deref().and_then(Path::parent) {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };
        self.file_out.insert(dest).as_path()
    }
}

/// Makes `path` absolute against the current directory without touching
/// the filesystem.
pub(crate) fn absolute(path: &Path) -> CdlResult<PathBuf> {
    Ok(std::path::absolute(path)?)
}

impl UniqueRegistry<ColorCorrection> {
    /// Creates and registers a correction.
    ///
    /// `id` may be empty, in which case `policy` decides between
    /// [`CdlError::EmptyIdRejected`] and a synthesized id. A non-empty id
    /// already in use fails with [`CdlError::DuplicateId`].
    pub fn create(
        &mut self,
        id: &str,
        file_in: Option<&Path>,
        policy: ValuePolicy,
    ) -> CdlResult<Handle<ColorCorrection>> {
        let id = self.resolve_id(id, policy)?;
        let file_in = file_in.map(absolute).transpose()?;

        self.insert_with(|handle| {
            Ok(ColorCorrection {
                handle,
                id,
                file_in,
                file_out: None,
                desc: Descriptions::new(),
                color_space: ColorSpaceDesc::new(),
                sop: SopNode::new(handle),
                sat: SatNode::new(handle),
            })
        })
    }

    /// Changes a correction's id and re-indexes it.
    ///
    /// The old id is released; an id held by another correction is an
    /// identity error under either policy and nothing changes.
    pub fn set_id(
        &mut self,
        handle: Handle<ColorCorrection>,
        id: &str,
        policy: ValuePolicy,
    ) -> CdlResult<()> {
        self.try_get(handle)?;
        let id = self.resolve_id(id, policy)?;
        self.rekey(handle, &id, |cc| cc.id = id.clone())
    }

    /// Looks up a correction by id.
    pub fn find(&self, id: &str) -> Option<Handle<ColorCorrection>> {
        self.members(id).first().copied()
    }

    /// Assigns a field by name from text, as tabular formats deliver it.
    ///
    /// Known fields: `id`, `slope`, `offset`, `power`, `sat`, `desc`
    /// (appends), `input_desc`, `viewing_desc`. `file_in` and `file_out`
    /// are read-only.
    pub fn set_field(
        &mut self,
        handle: Handle<ColorCorrection>,
        field: &str,
        value: &str,
        policy: ValuePolicy,
    ) -> CdlResult<()> {
        if field == "id" {
            return self.set_id(handle, value, policy);
        }
        let cc = self.get_mut(handle).ok_or(CdlError::StaleHandle)?;
        match field {
            "slope" => cc.set_slope(value, policy),
            "offset" => cc.set_offset(value, policy),
            "power" => cc.set_power(value, policy),
            "sat" => cc.set_sat(value, policy),
            "desc" => {
                cc.desc.push(value);
                Ok(())
            }
            "input_desc" => {
                cc.color_space.set_input_desc(Some(value));
                Ok(())
            }
            "viewing_desc" => {
                cc.color_space.set_viewing_desc(Some(value));
                Ok(())
            }
            "file_in" | "file_out" => Err(CdlError::read_only(field)),
            _ => Err(CdlError::UnknownField {
                field: field.to_string(),
            }),
        }
    }

    fn resolve_id(&self, id: &str, policy: ValuePolicy) -> CdlResult<String> {
        if !id.is_empty() {
            return Ok(id.to_string());
        }
        match policy {
            ValuePolicy::Strict => Err(CdlError::EmptyIdRejected),
            ValuePolicy::Lenient => {
                let id = self.next_free_id();
                warn!(id = %id, "empty correction id, assigning a generated one");
                Ok(id)
            }
        }
    }

    /// Next zero-padded number above every all-digit id in use.
    ///
    /// When that number would overflow, counting restarts just above the
    /// number of live ids and skips whatever is taken.
    fn next_free_id(&self) -> String {
        let highest = self
            .keys()
            .filter(|k| !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()))
            .filter_map(|k| k.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let mut next = highest
            .checked_add(1)
            .unwrap_or_else(|| u64::try_from(self.len()).unwrap_or(u64::MAX).saturating_add(1));
        loop {
            let candidate = format!("{next:03}");
            if !self.contains_key(&candidate) {
                return candidate;
            }
            next = next.saturating_add(1);
        }
    }
}
