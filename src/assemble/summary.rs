// SPDX-License-Identifier: PMPL-1.0-or-later

//! Findings master table: one row per finding, grouped by classification,
//! plus per-severity counts.

use crate::merge::MergedFinding;
use crate::types::{Classification, FindingStatus, Severity};
use serde::{Deserialize, Serialize};

const UNCLASSIFIED: &str = "Unclassified";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingsSummary {
    pub total: usize,
    pub open: usize,
    pub severity_counts: Vec<SeverityCount>,
    pub groups: Vec<SummaryGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCount {
    pub severity: Severity,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryGroup {
    pub heading: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    pub rows: Vec<SummaryRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub number: usize,
    pub title: String,
    pub severity: Severity,
    pub status: FindingStatus,
    pub responsible: String,
}

impl FindingsSummary {
    /// Summarize findings that are already in report order.
    pub fn from_findings(findings: &[MergedFinding]) -> Self {
        let severity_counts = Severity::descending()
            .into_iter()
            .map(|severity| SeverityCount {
                severity,
                count: findings.iter().filter(|f| f.severity == severity).count(),
            })
            .collect();

        let mut groups = Vec::new();
        for classification in Classification::all().into_iter().map(Some).chain([None]) {
            let rows: Vec<SummaryRow> = findings
                .iter()
                .filter(|f| f.classification == classification)
                .map(|f| SummaryRow {
                    number: f.number,
                    title: f.title.clone(),
                    severity: f.severity,
                    status: f.status,
                    responsible: f.responsible_parties.join(", "),
                })
                .collect();
            if rows.is_empty() {
                continue;
            }
            groups.push(SummaryGroup {
                heading: classification
                    .map(|c| c.heading())
                    .unwrap_or(UNCLASSIFIED)
                    .to_string(),
                classification,
                rows,
            });
        }

        Self {
            total: findings.len(),
            open: findings
                .iter()
                .filter(|f| f.status == FindingStatus::Open)
                .count(),
            severity_counts,
            groups,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.severity_counts
            .iter()
            .find(|c| c.severity == severity)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}
