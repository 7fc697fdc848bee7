//! # Assembler
//!
//! Groups raw files into complete capture sets, one assembler per device.
//!
//! Responsibilities:
//! - Bucket files by policy key (stamp / date / file)
//! - Fire groups the moment the policy predicate holds
//! - Track consumed and abandoned files
//! - Rebuild state from a directory listing
//!
//! ## Usage
//!
//! ```ignore
//! use assembler::{CaptureSetAssembler, Observation};
//!
//! let mut assembler = CaptureSetAssembler::new(device.id.clone(), device.grouping.clone());
//! if let Observation::Fired(key) = assembler.observe(file) {
//!     for group in assembler.ready_groups() { /* process */ }
//! }
//! ```

mod assembler;
mod error;
mod policy;
mod scan;

pub use assembler::{CaptureSetAssembler, Observation};
pub use error::{AssemblerError, Result};
pub use policy::{accepts_late_members, is_satisfied, key_for, IgnoreReason};
pub use scan::scan_directory;
