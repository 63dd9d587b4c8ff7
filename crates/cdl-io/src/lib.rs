//! # cdl-io
//!
//! ASC CDL XML readers and writers for the [`cdl_core`] object model.
//!
//! | Format | Root element                  | Read          | Write         |
//! |--------|-------------------------------|---------------|---------------|
//! | `.cc`  | `<ColorCorrection>`           | [`read_cc`]   | [`write_cc`]  |
//! | `.ccc` | `<ColorCorrectionCollection>` | [`read_ccc`]  | [`write_ccc`] |
//! | `.cdl` | `<ColorDecisionList>`         | [`read_cdl`]  | [`write_cdl`] |
//!
//! Readers build entities through the validating setters of `cdl_core`, so
//! the context's [`ValuePolicy`](cdl_core::ValuePolicy) decides whether a
//! bad value aborts the read or gets clamped. With
//! [`Context::strict_errors`](cdl_core::Context::strict_errors) unset, a
//! correction that still fails is skipped with a warning.
//!
//! ```rust
//! use cdl_core::Context;
//! use std::io::Cursor;
//!
//! let xml = r#"<ColorCorrection id="sh010">
//!   <SOPNode><Slope>1.1 1.0 0.9</Slope></SOPNode>
//! </ColorCorrection>"#;
//!
//! let mut ctx = Context::default();
//! let h = cdl_io::parse_cc(&mut ctx, Cursor::new(xml), None).unwrap();
//! assert_eq!(ctx.correction(h).unwrap().slope(), [1.1, 1.0, 0.9]);
//!
//! let mut out = Vec::new();
//! cdl_io::write_cc_to(&mut out, &ctx, h).unwrap();
//! assert!(String::from_utf8(out).unwrap().contains("<Slope>1.1 1 0.9</Slope>"));
//! ```

#![warn(missing_docs)]

mod error;
mod format;
mod read;
mod write;

pub use error::{IoError, IoResult};
pub use format::Format;
pub use read::{parse_cc, parse_ccc, parse_cdl, read_any, read_cc, read_ccc, read_cdl};
pub use write::{write_cc, write_cc_to, write_ccc, write_ccc_to, write_cdl, write_cdl_to};
