//! Cutline Project Model
//!
//! Defines the core data contracts for non-destructive editing:
//! - **Source:** The immutable description of the loaded clip
//! - **Operations:** Discrete edit intents (trim, crop, overlays, merges, ...)
//! - **Log:** The ordered, replayable record of committed operations
//! - **Geometry:** Conversions between preview, normalized, and source space
//!
//! Positions inside operations are normalized to `[0.0, 1.0]` relative to
//! the source frame so the log survives preview resizes and resolution changes.

pub mod geometry;
pub mod log;
pub mod operation;
pub mod source;
pub mod time;

pub use geometry::*;
pub use log::*;
pub use operation::*;
pub use source::*;
