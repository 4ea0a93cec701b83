// SPDX-License-Identifier: PMPL-1.0-or-later

//! Canonical presentation order for merged findings.

use crate::merge::MergedFinding;
use std::cmp::Ordering;

/// Severity descending, title ascending ignoring case, lowest affected
/// address, then catalog key. Submission order settles whatever is left,
/// so two runs over the same input always agree.
pub fn compare_findings(a: &MergedFinding, b: &MergedFinding) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| a.first_host().cmp(&b.first_host()))
        .then_with(|| a.key.cmp(&b.key))
        .then_with(|| a.first_position.cmp(&b.first_position))
}

/// Sort findings into report order and number them from 1.
pub fn order_findings(findings: &mut [MergedFinding]) {
    findings.sort_by(compare_findings);
    for (idx, finding) in findings.iter_mut().enumerate() {
        finding.number = idx + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FindingStatus, Severity};
    use std::collections::BTreeSet;
    use std::net::IpAddr;

    fn finding(title: &str, severity: Severity, host: &str, position: usize) -> MergedFinding {
        let hosts: BTreeSet<IpAddr> = [host.parse::<IpAddr>().unwrap()].into_iter().collect();
        MergedFinding {
            number: 0,
            key: None,
            title: title.to_string(),
            severity,
            status: FindingStatus::Open,
            description: String::new(),
            remediation: String::new(),
            references: vec![],
            hosts,
            source_ids: vec![format!("F-{}", position)],
            classification: None,
            responsible_parties: vec![],
            evidence: vec![],
            first_position: position,
        }
    }

    fn titles(findings: &[MergedFinding]) -> Vec<&str> {
        findings.iter().map(|f| f.title.as_str()).collect()
    }

    #[test]
    fn test_higher_severity_first() {
        let mut findings = vec![
            finding("Low thing", Severity::Low, "10.0.0.1", 0),
            finding("Critical thing", Severity::Critical, "10.0.0.1", 1),
            finding("Info thing", Severity::Informational, "10.0.0.1", 2),
            finding("High thing", Severity::High, "10.0.0.1", 3),
        ];
        order_findings(&mut findings);
        assert_eq!(
            titles(&findings),
            vec!["Critical thing", "High thing", "Low thing", "Info thing"]
        );
        let numbers: Vec<_> = findings.iter().map(|f| f.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_title_tie_break_ignores_case() {
        let mut findings = vec![
            finding("banner disclosure", Severity::Medium, "10.0.0.1", 0),
            finding("Autocomplete enabled", Severity::Medium, "10.0.0.1", 1),
            finding("Clickjacking", Severity::Medium, "10.0.0.1", 2),
        ];
        order_findings(&mut findings);
        assert_eq!(
            titles(&findings),
            vec!["Autocomplete enabled", "banner disclosure", "Clickjacking"]
        );
    }

    #[test]
    fn test_address_tie_break_is_numeric() {
        let mut findings = vec![
            finding("Same", Severity::Low, "10.0.0.10", 0),
            finding("Same", Severity::Low, "10.0.0.9", 1),
        ];
        order_findings(&mut findings);
        let first: Vec<String> = findings
            .iter()
            .map(|f| f.first_host().unwrap().to_string())
            .collect();
        assert_eq!(first, vec!["10.0.0.9", "10.0.0.10"]);
    }

    #[test]
    fn test_full_tie_keeps_submission_order() {
        let mut findings = vec![
            finding("Same", Severity::Low, "10.0.0.1", 4),
            finding("Same", Severity::Low, "10.0.0.1", 2),
        ];
        order_findings(&mut findings);
        let positions: Vec<_> = findings.iter().map(|f| f.first_position).collect();
        assert_eq!(positions, vec![2, 4]);
    }
}
