// SPDX-License-Identifier: PMPL-1.0-or-later

//! Report output: console summary, serialized export and cycle diffs

pub mod diff;
pub mod formatter;
pub mod output;

use crate::compile::Compilation;
use anyhow::Result;
use std::path::Path;

pub use diff::{format_diff, load_report, ReportDiff};
pub use formatter::ReportFormatter;
pub use output::ReportOutputFormat;

/// Save a compilation to file
pub fn save_report<P: AsRef<Path>>(
    compilation: &Compilation,
    format: ReportOutputFormat,
    path: P,
) -> Result<()> {
    let formatter = ReportFormatter::new();
    formatter.save(compilation, format, path)
}

/// Print a compilation to console
pub fn print_report(compilation: &Compilation) {
    let formatter = ReportFormatter::new();
    formatter.print(compilation);
}
