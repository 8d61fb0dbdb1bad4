//! Cutline Export Engine
//!
//! Turns a committed operation log into calls against an external media
//! processing service.
//!
//! # Pipeline Architecture
//!
//! ```text
//! OperationLog ──┐
//!                ├── plan_export ──▶ ExportPlan
//! VideoSource ───┘                     │
//!                                      │  1. processVideo(config)    trim/cut/crop/rotate/flip/speed/audio
//!                                      │  2. addTextOverlay × N      one per text overlay
//!                                      │  3. merge × M               one per merge
//!                                      │  4. finalize
//!                                      ▼
//!                               ExportExecutor ──▶ ProcessingService
//!                                      │
//!                                      ▼
//!                              output MediaRef
//! ```
//!
//! Each step consumes the media reference produced by the previous one.

pub mod compress;
pub mod dry_run;
pub mod executor;
pub mod plan;
pub mod service;
pub mod thumbnails;

pub use compress::*;
pub use dry_run::*;
pub use executor::*;
pub use plan::*;
pub use service::*;
pub use thumbnails::*;
