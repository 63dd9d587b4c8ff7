//! # cdl-core
//!
//! In-memory object model for ASC Color Decision List metadata.
//!
//! This crate holds the data that `.cc`, `.ccc` and `.cdl` documents carry,
//! validated on every mutation:
//!
//! - [`ColorCorrection`] - slope/offset/power/saturation plus descriptions,
//!   unique by id
//! - [`MediaRef`] - a parsed media URI with lazy image sequence detection
//! - [`ColorDecision`], [`ColorCollection`] - aggregates over the above
//! - [`UniqueRegistry`] - key-indexed storage behind corrections and media
//!   references
//! - [`Context`] - the policy and registries of one conversion run
//!
//! ## Error Policy
//!
//! Out-of-domain values (a negative slope, an empty id, a vanished
//! directory) are governed by [`ValuePolicy`]: strict fails, lenient clamps
//! or substitutes and logs a warning through `tracing`. Type errors and id
//! collisions are reported under both.
//!
//! ```rust
//! use cdl_core::{Context, ValuePolicy};
//!
//! let mut ctx = Context::new(ValuePolicy::Lenient);
//! let h = ctx.new_correction("", None).unwrap();
//! assert_eq!(ctx.correction(h).unwrap().id(), "001");
//!
//! let cc = ctx.correction_mut(h).unwrap();
//! cc.set_power([1.2, -0.5, 1.0], ValuePolicy::Lenient).unwrap();
//! assert_eq!(cc.power(), [1.2, 0.0, 1.0]);
//! assert!(cc.set_power([1.2, -0.5, 1.0], ValuePolicy::Strict).is_err());
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//! cdl-core (this crate)
//!    ^
//!    |
//!    +-- cdl-io (ASC XML readers and writers)
//!    +-- cdl-cli (the `cdl` binary)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod collection;
mod config;
mod context;
mod correction;
mod decision;
mod desc;
mod error;
mod media_ref;
mod node;
mod policy;
mod registry;
pub mod sequence;
pub mod value;

pub use collection::{CollectionKind, ColorCollection};
pub use config::Config;
pub use context::Context;
pub use correction::{ColorCorrection, CorrectionRegistry};
pub use decision::{ColorDecision, DecisionId};
pub use desc::{ColorSpaceDesc, Descriptions};
pub use error::{CdlError, CdlResult, ErrorKind};
pub use media_ref::{MediaRef, MediaRefRegistry};
pub use node::{SatNode, SopNode};
pub use policy::ValuePolicy;
pub use registry::{Handle, Occupancy, Registered, UniqueRegistry};
pub use sequence::{SequenceDetector, SequenceScan};
pub use value::{Component, NumericInput, Triplet};

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use cdl_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CdlError, CdlResult, CollectionKind, ColorCollection, ColorCorrection, ColorDecision,
        Config, Context, Handle, MediaRef, NumericInput, ValuePolicy,
    };
}
