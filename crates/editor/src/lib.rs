//! Cutline Editor
//!
//! The single mutation boundary between interaction and the operation log.
//! Gestures adjust working state (trim handles, the crop rectangle); only
//! explicit commit commands write to the log. Cancelling a tool discards its
//! working state and never touches committed operations.

pub mod session;
pub mod state;

pub use session::*;
pub use state::*;
