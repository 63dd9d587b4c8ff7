//! Transform nodes owned by a [`ColorCorrection`].
//!
//! A correction creates exactly one [`SopNode`] and one [`SatNode`] when it
//! is constructed. Nodes record their owner's handle and never change owner;
//! there is no public constructor, so a node cannot be created detached or
//! moved to another correction.
//!
//! All setters go through [`crate::value`], so values are always stored as
//! validated `f64`s and SOP triplets are always exactly three components.

use crate::value::{validate_scalar, validate_triplet, Domain, NumericInput, Triplet};
use crate::{CdlResult, ColorCorrection, Descriptions, Handle, ValuePolicy};

/// Saturation node. Default `1.0`, domain `[0, +inf)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SatNode {
    parent: Handle<ColorCorrection>,
    desc: Descriptions,
    sat: f64,
}

impl SatNode {
    pub(crate) fn new(parent: Handle<ColorCorrection>) -> Self {
        Self {
            parent,
            desc: Descriptions::new(),
            sat: 1.0,
        }
    }

    /// Handle of the owning correction.
    pub fn parent(&self) -> Handle<ColorCorrection> {
        self.parent
    }

    /// Node-level descriptions.
    pub fn desc(&self) -> &Descriptions {
        &self.desc
    }

    /// Mutable node-level descriptions.
    pub fn desc_mut(&mut self) -> &mut Descriptions {
        &mut self.desc
    }

    /// Current saturation.
    pub fn sat(&self) -> f64 {
        self.sat
    }

    /// Sets saturation from a number or numeric string.
    pub fn set_sat(&mut self, input: impl Into<NumericInput>, policy: ValuePolicy) -> CdlResult<()> {
        self.sat = validate_scalar("sat", &input.into(), Domain::NonNegative, policy)?;
        Ok(())
    }
}

/// Slope/offset/power node.
///
/// Defaults: slope `(1, 1, 1)`, offset `(0, 0, 0)`, power `(1, 1, 1)`.
/// Slope and power are non-negative per component; offset is unrestricted.
#[derive(Debug, Clone, PartialEq)]
pub struct SopNode {
    parent: Handle<ColorCorrection>,
    desc: Descriptions,
    slope: Triplet,
    offset: Triplet,
    power: Triplet,
}

impl SopNode {
    pub(crate) fn new(parent: Handle<ColorCorrection>) -> Self {
        Self {
            parent,
            desc: Descriptions::new(),
            slope: [1.0; 3],
            offset: [0.0; 3],
            power: [1.0; 3],
        }
    }

    /// Handle of the owning correction.
    pub fn parent(&self) -> Handle<ColorCorrection> {
        self.parent
    }

    /// Node-level descriptions.
    pub fn desc(&self) -> &Descriptions {
        &self.desc
    }

    /// Mutable node-level descriptions.
    pub fn desc_mut(&mut self) -> &mut Descriptions {
        &mut self.desc
    }

    /// Slope per channel.
    pub fn slope(&self) -> Triplet {
        self.slope
    }

    /// Offset per channel.
    pub fn offset(&self) -> Triplet {
        self.offset
    }

    /// Power per channel.
    pub fn power(&self) -> Triplet {
        self.power
    }

    /// Sets slope. Negative components follow `policy`.
    pub fn set_slope(&mut self, input: impl Into<NumericInput>, policy: ValuePolicy) -> CdlResult<()> {
        self.slope = validate_triplet("slope", &input.into(), Domain::NonNegative, policy)?;
        Ok(())
    }

    /// Sets offset. Any value except NaN is accepted, infinities included.
    pub fn set_offset(&mut self, input: impl Into<NumericInput>, policy: ValuePolicy) -> CdlResult<()> {
        self.offset = validate_triplet("offset", &input.into(), Domain::Unbounded, policy)?;
        Ok(())
    }

    /// Sets power. Negative components follow `policy`.
    pub fn set_power(&mut self, input: impl Into<NumericInput>, policy: ValuePolicy) -> CdlResult<()> {
        self.power = validate_triplet("power", &input.into(), Domain::NonNegative, policy)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Component;
    use crate::{CdlError, ErrorKind, UniqueRegistry};

    use ValuePolicy::{Lenient, Strict};

    fn parent() -> Handle<ColorCorrection> {
        let mut reg = UniqueRegistry::<ColorCorrection>::exclusive();
        reg.create("parent", None, Lenient).unwrap()
    }

    fn sat_node() -> SatNode {
        SatNode::new(parent())
    }

    fn sop_node() -> SopNode {
        SopNode::new(parent())
    }

    #[test]
    fn test_sat_defaults() {
        let node = sat_node();
        assert_eq!(node.sat(), 1.0);
        assert!(node.desc().is_empty());
    }

    #[test]
    fn test_parent_recorded() {
        let p = parent();
        assert_eq!(SatNode::new(p).parent(), p);
        assert_eq!(SopNode::new(p).parent(), p);
    }

    #[test]
    fn test_sat_from_string_and_int() {
        let mut node = sat_node();
        node.set_sat("3.5", Strict).unwrap();
        assert_eq!(node.sat(), 3.5);
        node.set_sat(3, Strict).unwrap();
        assert_eq!(node.sat(), 3.0);
    }

    #[test]
    fn test_sat_bad_string() {
        let mut node = sat_node();
        let err = node.set_sat("banana", Lenient).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(node.sat(), 1.0);
    }

    #[test]
    fn test_sat_negative() {
        let mut node = sat_node();
        for input in [NumericInput::from("-3.5"), (-376.23).into(), (-3).into()] {
            node.set_sat(2.0, Strict).unwrap();
            let err = node.set_sat(input.clone(), Strict).unwrap_err();
            assert!(matches!(err, CdlError::OutOfDomain { field: "sat", .. }));
            assert_eq!(node.sat(), 2.0);

            node.set_sat(input, Lenient).unwrap();
            assert_eq!(node.sat(), 0.0);
        }
    }

    #[test]
    fn test_sat_list_fails() {
        let mut node = sat_node();
        let err = node.set_sat([1.0, 2.0, 3.0], Lenient).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn test_sop_defaults() {
        let node = sop_node();
        assert_eq!(node.slope(), [1.0, 1.0, 1.0]);
        assert_eq!(node.offset(), [0.0, 0.0, 0.0]);
        assert_eq!(node.power(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_slope_set_and_get() {
        let mut node = sop_node();
        let slope = (1.3782, 278.32, 0.738378233782);
        node.set_slope(slope, Strict).unwrap();
        assert_eq!(node.slope(), [1.3782, 278.32, 0.738378233782]);
    }

    #[test]
    fn test_slope_scalar_forms() {
        let mut node = sop_node();
        node.set_slope("1.5", Strict).unwrap();
        assert_eq!(node.slope(), [1.5; 3]);
        node.set_slope(2, Strict).unwrap();
        assert_eq!(node.slope(), [2.0; 3]);
        node.set_slope(0.25, Strict).unwrap();
        assert_eq!(node.slope(), [0.25; 3]);
    }

    #[test]
    fn test_slope_negative() {
        let mut node = sop_node();
        let input = [-1.3782, 278.32, 0.738378233782];

        let err = node.set_slope(input, Strict).unwrap_err();
        assert!(err.is_value_error());
        assert_eq!(node.slope(), [1.0; 3]);

        node.set_slope(input, Lenient).unwrap();
        assert_eq!(node.slope(), [0.0, 278.32, 0.738378233782]);
    }

    #[test]
    fn test_negative_scalar_broadcast() {
        let mut node = sop_node();
        assert!(node.set_power("-3", Strict).is_err());
        node.set_power(-3, Lenient).unwrap();
        assert_eq!(node.power(), [0.0; 3]);
    }

    #[test]
    fn test_power_negative() {
        let mut node = sop_node();
        let input = vec![-1.3782, 278.32, 0.738378233782];

        assert!(node.set_power(input.clone(), Strict).unwrap_err().is_value_error());
        assert_eq!(node.power(), [1.0; 3]);

        node.set_power(input, Lenient).unwrap();
        assert_eq!(node.power(), [0.0, 278.32, 0.738378233782]);
    }

    #[test]
    fn test_offset_accepts_negative() {
        let mut node = sop_node();
        let offset = [-1.3782, 278.32, 0.738378233782];
        node.set_offset(offset, Strict).unwrap();
        assert_eq!(node.offset(), offset);
        node.set_offset("-5", Strict).unwrap();
        assert_eq!(node.offset(), [-5.0; 3]);
    }

    #[test]
    fn test_triplet_bad_inputs() {
        let mut node = sop_node();

        let strings = vec![Component::from(1.3782), Component::from(278.32), Component::from("banana")];
        assert!(node.set_slope(strings.clone(), Lenient).unwrap_err().is_type_error());
        assert!(node.set_offset(strings.clone(), Lenient).unwrap_err().is_type_error());
        assert!(node.set_power(strings, Lenient).unwrap_err().is_type_error());

        let short = vec![Component::from("banana")];
        assert!(node.set_slope(short.clone(), Lenient).unwrap_err().is_value_error());
        assert!(node.set_offset(short.clone(), Lenient).unwrap_err().is_value_error());
        assert!(node.set_power(short, Lenient).unwrap_err().is_value_error());

        assert!(node.set_slope("ban", Lenient).unwrap_err().is_type_error());
        assert_eq!(node.slope(), [1.0; 3]);
    }
}
