// SPDX-License-Identifier: PMPL-1.0-or-later

//! vapt-report: security assessment report compilation.
//!
//! Turns the records captured during a vulnerability assessment into a
//! deterministic, renderer-agnostic document model.
//!
//! PIPELINE:
//! 1. **Knowledge**: indexes the catalog of reusable issue write-ups.
//! 2. **Resolve**: binds each raw finding to a catalog entry, or marks it
//!    unlisted.
//! 3. **Merge**: folds findings of the same issue into one, across hosts.
//! 4. **Order**: severity descending with stable tie-breaks.
//! 5. **Evidence**: routes screenshots to the merged findings.
//! 6. **Assemble**: header, address-ordered inventory, summary table and
//!    findings, ready for a renderer.

pub mod assemble;
pub mod compile;
pub mod config;
pub mod error;
pub mod evidence;
pub mod inventory;
pub mod knowledge;
pub mod merge;
pub mod order;
pub mod report;
pub mod resolve;
pub mod session;
pub mod types;

pub use compile::{compile, Compilation};
pub use config::CompileConfig;
pub use error::{CompileError, CompileResult, Warning};
