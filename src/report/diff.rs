// SPDX-License-Identifier: PMPL-1.0-or-later

//! Diff utilities for compiled reports, e.g. a retest against the
//! previous assessment cycle.

use crate::assemble::DocumentModel;
use crate::compile::Compilation;
use crate::knowledge::normalize_key;
use crate::merge::MergedFinding;
use crate::types::{FindingStatus, Severity};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum SavedReport {
    Compilation(Compilation),
    Document(DocumentModel),
}

/// Load a saved compilation, or a bare document model.
pub fn load_report(path: &Path) -> Result<DocumentModel> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading report {}", path.display()))?;
    let saved: SavedReport = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("parsing yaml report {}", path.display()))?,
        _ => serde_json::from_str(&content)
            .with_context(|| format!("parsing json report {}", path.display()))?,
    };
    Ok(match saved {
        SavedReport::Compilation(compilation) => compilation.document,
        SavedReport::Document(document) => document,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindingChange<T> {
    pub title: String,
    pub before: T,
    pub after: T,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportDiff {
    /// Titles present only in the compared report.
    pub new: Vec<String>,
    /// Titles present only in the base report.
    pub resolved: Vec<String>,
    pub severity_changes: Vec<FindingChange<Severity>>,
    pub status_changes: Vec<FindingChange<FindingStatus>>,
}

/// Findings are matched by catalog key, or by normalized title when unlisted.
fn identity(finding: &MergedFinding) -> String {
    match &finding.key {
        Some(key) => key.clone(),
        None => format!("unlisted:{}", normalize_key(&finding.title)),
    }
}

impl ReportDiff {
    pub fn between(base: &DocumentModel, compare: &DocumentModel) -> Self {
        let base_map: HashMap<String, &MergedFinding> =
            base.findings.iter().map(|f| (identity(f), f)).collect();
        let compare_map: HashMap<String, &MergedFinding> =
            compare.findings.iter().map(|f| (identity(f), f)).collect();

        let mut diff = ReportDiff::default();
        for finding in &compare.findings {
            match base_map.get(&identity(finding)) {
                None => diff.new.push(finding.title.clone()),
                Some(before) => {
                    if before.severity != finding.severity {
                        diff.severity_changes.push(FindingChange {
                            title: finding.title.clone(),
                            before: before.severity,
                            after: finding.severity,
                        });
                    }
                    if before.status != finding.status {
                        diff.status_changes.push(FindingChange {
                            title: finding.title.clone(),
                            before: before.status,
                            after: finding.status,
                        });
                    }
                }
            }
        }
        diff.resolved = base
            .findings
            .iter()
            .filter(|f| !compare_map.contains_key(&identity(f)))
            .map(|f| f.title.clone())
            .collect();
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.new.is_empty()
            && self.resolved.is_empty()
            && self.severity_changes.is_empty()
            && self.status_changes.is_empty()
    }
}

pub fn format_diff(
    base: &DocumentModel,
    compare: &DocumentModel,
    base_label: &str,
    compare_label: &str,
) -> String {
    let mut lines = Vec::new();
    lines.push("=== VAPT REPORT DIFF ===".to_string());
    lines.push(format!("Base: {}", base_label));
    lines.push(format!("Compare: {}", compare_label));
    lines.push(String::new());

    let host_delta = compare.inventory.len() as i64 - base.inventory.len() as i64;
    lines.push(format!(
        "Hosts in scope: {} -> {} ({})",
        base.inventory.len(),
        compare.inventory.len(),
        fmt_delta_i64(host_delta)
    ));

    let finding_delta = compare.summary.total as i64 - base.summary.total as i64;
    lines.push(format!(
        "Findings: {} -> {} ({})",
        base.summary.total,
        compare.summary.total,
        fmt_delta_i64(finding_delta)
    ));

    let open_delta = compare.summary.open as i64 - base.summary.open as i64;
    lines.push(format!(
        "Open findings: {} -> {} ({})",
        base.summary.open,
        compare.summary.open,
        fmt_delta_i64(open_delta)
    ));

    for severity in Severity::descending() {
        let base_count = base.summary.count(severity);
        let cmp_count = compare.summary.count(severity);
        if base_count > 0 || cmp_count > 0 {
            lines.push(format!(
                "  {}: {} -> {} ({})",
                severity.label(),
                base_count,
                cmp_count,
                fmt_delta_i64(cmp_count as i64 - base_count as i64)
            ));
        }
    }

    let diff = ReportDiff::between(base, compare);
    lines.push(String::new());
    lines.push(format!("New findings: {}", fmt_list(&diff.new)));
    lines.push(format!("No longer reported: {}", fmt_list(&diff.resolved)));

    if !diff.severity_changes.is_empty() {
        lines.push("Severity changes:".to_string());
        for change in &diff.severity_changes {
            lines.push(format!(
                "  {}: {} -> {}",
                change.title,
                change.before.label(),
                change.after.label()
            ));
        }
    }
    if !diff.status_changes.is_empty() {
        lines.push("Status changes:".to_string());
        for change in &diff.status_changes {
            lines.push(format!(
                "  {}: {} -> {}",
                change.title, change.before, change.after
            ));
        }
    }

    lines.join("\n")
}

fn fmt_delta_i64(delta: i64) -> String {
    if delta > 0 {
        format!("+{}", delta)
    } else {
        delta.to_string()
    }
}

fn fmt_list(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
