// SPDX-License-Identifier: PMPL-1.0-or-later

//! End-to-end compilation tests over in-memory sessions

use std::net::IpAddr;
use vapt_report::evidence::EvidenceLimits;
use vapt_report::knowledge::KnowledgeBaseIndex;
use vapt_report::merge::StatusPolicy;
use vapt_report::resolve::TitleMatching;
use vapt_report::types::*;
use vapt_report::{compile, CompileConfig, CompileError, Warning};

fn ip(s: &str) -> IpAddr {
    s.parse().expect("test address should parse")
}

fn entry(key: &str, title: &str, severity: Severity) -> KnowledgeBaseEntry {
    KnowledgeBaseEntry {
        key: key.to_string(),
        title: title.to_string(),
        description: format!("{} affects {{{{hosts}}}}.", title),
        severity,
        remediation: format!("Fix {} in {{{{application}}}}.", title),
        references: vec![],
    }
}

fn index() -> KnowledgeBaseIndex {
    KnowledgeBaseIndex::build(vec![
        entry("tls-old", "Outdated TLS", Severity::High),
        entry("xss-reflected", "Reflected Cross-Site Scripting", Severity::Medium),
        entry("banner", "Server Banner Disclosure", Severity::Low),
        entry("sqli", "SQL Injection", Severity::Critical),
    ])
    .expect("catalog should index")
}

fn bundle() -> SessionBundle {
    SessionBundle {
        application: Application::new("Customer Portal"),
        inventory: vec![
            IpAddressRecord::new(ip("10.0.0.6")).with_hostname("web02"),
            IpAddressRecord::new(ip("10.0.0.5")).with_hostname("web01"),
            IpAddressRecord::new(ip("10.0.0.10")),
        ],
        findings: vec![
            RawFinding::new("F-1", "Outdated TLS", vec![ip("10.0.0.5")]).with_kb_key("tls-old"),
            RawFinding::new("F-2", "Outdated TLS", vec![ip("10.0.0.6")]).with_kb_key("tls-old"),
        ],
        evidence: vec![],
        artwork: ReportArtwork::default(),
    }
}

#[test]
fn test_same_issue_on_two_hosts_merges() {
    let compilation =
        compile(&bundle(), &index(), &CompileConfig::default()).expect("compile should succeed");
    let findings = &compilation.document.findings;
    assert_eq!(findings.len(), 1);
    let tls = &findings[0];
    assert_eq!(tls.severity, Severity::High);
    assert_eq!(tls.key.as_deref(), Some("tls-old"));
    let hosts: Vec<String> = tls.hosts.iter().map(|h| h.to_string()).collect();
    assert_eq!(hosts, vec!["10.0.0.5", "10.0.0.6"]);
    assert_eq!(tls.source_ids, vec!["F-1", "F-2"]);
    assert_eq!(tls.description, "Outdated TLS affects 10.0.0.5, 10.0.0.6.");
    assert_eq!(tls.remediation, "Fix Outdated TLS in Customer Portal.");
    assert!(compilation.warnings.is_empty());
}

#[test]
fn test_merged_severity_is_highest_override() {
    let mut bundle = bundle();
    bundle.findings[1].severity = Some(Severity::Critical);
    let compilation =
        compile(&bundle, &index(), &CompileConfig::default()).expect("compile should succeed");
    assert_eq!(compilation.document.findings[0].severity, Severity::Critical);
}

#[test]
fn test_empty_inventory_is_validation_error() {
    let mut bundle = bundle();
    bundle.inventory.clear();
    let err = compile(&bundle, &index(), &CompileConfig::default()).unwrap_err();
    assert!(matches!(err, CompileError::Validation { ref field, .. } if field == "inventory"));
}

#[test]
fn test_orphan_evidence_is_warning_not_failure() {
    let mut bundle = bundle();
    bundle
        .evidence
        .push(EvidenceImage::new("F-99", "stray screenshot", vec![1, 2, 3]));
    bundle
        .evidence
        .push(EvidenceImage::new("F-2", "tls scan", vec![4, 5, 6]));
    let compilation =
        compile(&bundle, &index(), &CompileConfig::default()).expect("compile should succeed");

    assert_eq!(
        compilation.warnings,
        vec![Warning::OrphanEvidence {
            caption: "stray screenshot".to_string(),
            link: "F-99".to_string(),
        }]
    );
    let captions: Vec<&str> = compilation.document.findings[0]
        .evidence
        .iter()
        .map(|e| e.caption.as_str())
        .collect();
    assert_eq!(captions, vec!["tls scan"]);
    assert_eq!(compilation.document.evidence_count(), 1);
}

#[test]
fn test_padded_finding_id_keeps_its_evidence() {
    let mut bundle = bundle();
    bundle.findings = vec![
        RawFinding::new("F-1 ", "Outdated TLS", vec![ip("10.0.0.5")]).with_kb_key("tls-old"),
    ];
    bundle
        .evidence
        .push(EvidenceImage::new("F-1 ", "tls scan", vec![4, 5, 6]));
    let compilation =
        compile(&bundle, &index(), &CompileConfig::default()).expect("compile should succeed");

    assert!(compilation.warnings.is_empty());
    let finding = &compilation.document.findings[0];
    assert_eq!(finding.source_ids, vec!["F-1"]);
    assert_eq!(finding.evidence.len(), 1);
    assert_eq!(finding.evidence[0].caption, "tls scan");
}

#[test]
fn test_unknown_key_hint_falls_back_to_unlisted() {
    let mut bundle = bundle();
    bundle.findings.push(
        RawFinding::new("F-3", "Outdated TLS", vec![ip("10.0.0.10")])
            .with_kb_key("tls-ancient")
            .with_description("Server still speaks SSLv3."),
    );
    let compilation =
        compile(&bundle, &index(), &CompileConfig::default()).expect("compile should succeed");

    let findings = &compilation.document.findings;
    assert_eq!(findings.len(), 2);
    let unlisted = findings
        .iter()
        .find(|f| f.key.is_none())
        .expect("an unlisted finding should be present");
    assert_eq!(unlisted.title, "Outdated TLS");
    assert_eq!(unlisted.severity, Severity::Informational);
    assert_eq!(unlisted.description, "Server still speaks SSLv3.");
    assert_eq!(
        compilation.warnings,
        vec![Warning::UnmatchedKeyHint {
            finding: "F-3".to_string(),
            key: "tls-ancient".to_string(),
        }]
    );
}

#[test]
fn test_findings_ordered_by_severity_then_title() {
    let mut bundle = bundle();
    bundle.findings = vec![
        RawFinding::new("F-1", "Server Banner Disclosure", vec![ip("10.0.0.5")]),
        RawFinding::new("F-2", "reflected cross-site scripting", vec![ip("10.0.0.5")]),
        RawFinding::new("F-3", "SQL Injection", vec![ip("10.0.0.6")]),
        RawFinding::new("F-4", "Autocomplete Enabled", vec![ip("10.0.0.6")])
            .with_severity(Severity::Medium),
        RawFinding::new("F-5", "Outdated TLS", vec![ip("10.0.0.10")]),
    ];
    let compilation =
        compile(&bundle, &index(), &CompileConfig::default()).expect("compile should succeed");

    let order: Vec<(usize, &str)> = compilation
        .document
        .findings
        .iter()
        .map(|f| (f.number, f.title.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            (1, "SQL Injection"),
            (2, "Outdated TLS"),
            (3, "Autocomplete Enabled"),
            (4, "Reflected Cross-Site Scripting"),
            (5, "Server Banner Disclosure"),
        ]
    );
}

#[test]
fn test_status_conflict_escalates_by_default() {
    let mut bundle = bundle();
    bundle.findings[0].status = FindingStatus::Remediated;
    let compilation =
        compile(&bundle, &index(), &CompileConfig::default()).expect("compile should succeed");
    assert_eq!(compilation.document.findings[0].status, FindingStatus::Open);
    assert!(matches!(
        compilation.warnings[0],
        Warning::StatusEscalated {
            chosen: FindingStatus::Open,
            ..
        }
    ));
}

#[test]
fn test_status_conflict_fails_under_strict_policy() {
    let mut bundle = bundle();
    bundle.findings[1].status = FindingStatus::AcceptedRisk;
    let config = CompileConfig::default().with_status_policy(StatusPolicy::Strict);
    let err = compile(&bundle, &index(), &config).unwrap_err();
    match err {
        CompileError::Conflict { key, statuses } => {
            assert_eq!(key, "tls-old");
            assert_eq!(
                statuses,
                vec![FindingStatus::Open, FindingStatus::AcceptedRisk]
            );
        }
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[test]
fn test_evidence_limit_applies_after_merge() {
    let mut bundle = bundle();
    for (link, caption) in [("F-1", "a"), ("F-2", "b"), ("F-1", "c")] {
        bundle
            .evidence
            .push(EvidenceImage::new(link, caption, vec![0xFF; 8]));
    }
    let config = CompileConfig::default().with_evidence_limits(EvidenceLimits {
        max_per_finding: Some(2),
        max_image_bytes: None,
    });
    let compilation = compile(&bundle, &index(), &config).expect("compile should succeed");

    let finding = &compilation.document.findings[0];
    let captions: Vec<&str> = finding.evidence.iter().map(|e| e.caption.as_str()).collect();
    assert_eq!(captions, vec!["a", "b"]);
    assert!(matches!(
        compilation.warnings[0],
        Warning::EvidenceTruncated {
            kept: 2,
            dropped: 1,
            ..
        }
    ));
    match &compilation.warnings[0] {
        Warning::EvidenceTruncated { finding, .. } => assert_eq!(finding, "F-1"),
        other => panic!("expected truncation, got {:?}", other),
    }
}

#[test]
fn test_exact_matching_leaves_case_variants_unlisted() {
    let mut bundle = bundle();
    bundle.findings = vec![RawFinding::new("F-1", "outdated tls", vec![ip("10.0.0.5")])];

    let normalized =
        compile(&bundle, &index(), &CompileConfig::default()).expect("compile should succeed");
    assert_eq!(normalized.document.findings[0].key.as_deref(), Some("tls-old"));

    let config = CompileConfig::default().with_title_matching(TitleMatching::Exact);
    let exact = compile(&bundle, &index(), &config).expect("compile should succeed");
    assert_eq!(exact.document.findings[0].key, None);
    assert_eq!(
        exact.document.findings[0].description,
        "[No description provided]"
    );
}

#[test]
fn test_inventory_sorted_in_document() {
    let compilation =
        compile(&bundle(), &index(), &CompileConfig::default()).expect("compile should succeed");
    let order: Vec<String> = compilation
        .document
        .inventory
        .iter()
        .map(|r| r.address.to_string())
        .collect();
    assert_eq!(order, vec!["10.0.0.5", "10.0.0.6", "10.0.0.10"]);
}

#[test]
fn test_host_outside_inventory_rejected() {
    let mut bundle = bundle();
    bundle.findings[0].hosts.push(ip("172.16.0.1"));
    let err = compile(&bundle, &index(), &CompileConfig::default()).unwrap_err();
    assert!(err.to_string().contains("172.16.0.1"));
}

#[test]
fn test_header_artwork_carried_into_document() {
    let mut bundle = bundle();
    bundle.artwork.system_architecture = Some(vec![7; 16]);
    let compilation =
        compile(&bundle, &index(), &CompileConfig::default()).expect("compile should succeed");
    let header = &compilation.document.header;

    assert_eq!(header.logo, None);
    let diagram = header
        .system_architecture
        .as_ref()
        .expect("diagram should be attached");
    assert_eq!(diagram.bytes, 16);
    assert_eq!(diagram.sha256.len(), 64);
    assert_eq!(compilation.document.evidence_count(), 0);
}
