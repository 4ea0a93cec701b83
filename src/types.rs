// SPDX-License-Identifier: PMPL-1.0-or-later

//! Core type definitions for vapt-report
//!
//! Records captured during an assessment (application, IP inventory,
//! findings, evidence) and the catalog entries they are resolved against.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Fixed severity tiers, ordered lowest to highest so that `Ord` and
/// `max()` pick the most severe tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "info", alias = "Informational", alias = "INFORMATIONAL")]
    Informational,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Critical", alias = "CRITICAL")]
    Critical,
}

impl Severity {
    /// Presentation order: most severe first.
    pub fn descending() -> [Severity; 5] {
        [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
            Severity::Informational,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Informational => "Informational",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Informational => write!(f, "INFO"),
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Lifecycle of a finding at the time of reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FindingStatus {
    #[default]
    #[serde(alias = "Open")]
    Open,
    #[serde(alias = "closed", alias = "Closed", alias = "Remediated")]
    Remediated,
    #[serde(alias = "accepted", alias = "accepted_risk", alias = "Accepted Risk")]
    AcceptedRisk,
}

impl FindingStatus {
    /// How far the underlying risk has been dealt with. Lower is less resolved.
    pub fn resolution_rank(&self) -> u8 {
        match self {
            FindingStatus::Open => 0,
            FindingStatus::AcceptedRisk => 1,
            FindingStatus::Remediated => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FindingStatus::Open => "Open",
            FindingStatus::Remediated => "Remediated",
            FindingStatus::AcceptedRisk => "Accepted Risk",
        }
    }
}

impl std::fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Assessment area a finding belongs to, used to group the summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    #[serde(alias = "mobile", alias = "Mobile Application Vulnerability")]
    MobileApplication,
    #[serde(alias = "Server Vulnerabilities")]
    Server,
    #[serde(alias = "Web Vulnerabilities")]
    Web,
}

impl Classification {
    pub fn all() -> [Classification; 3] {
        [
            Classification::MobileApplication,
            Classification::Server,
            Classification::Web,
        ]
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Classification::MobileApplication => "Mobile Application Vulnerability",
            Classification::Server => "Server Vulnerabilities",
            Classification::Web => "Web Vulnerabilities",
        }
    }
}

/// The system under assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessor: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            assessment_date: None,
            assessor: None,
            version: default_version(),
        }
    }
}

/// One row of the scanned IP inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddressRecord {
    pub address: IpAddr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl IpAddressRecord {
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            hostname: None,
            zone: None,
            notes: String::new(),
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        self.hostname = if hostname.trim().is_empty() {
            None
        } else {
            Some(hostname)
        };
        self
    }
}

/// Reusable write-up for a known class of issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseEntry {
    pub key: String,
    pub title: String,
    #[serde(alias = "implication")]
    pub description: String,
    #[serde(default = "default_entry_severity")]
    pub severity: Severity,
    #[serde(alias = "mitigation")]
    pub remediation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

fn default_entry_severity() -> Severity {
    Severity::Informational
}

/// A finding as captured by the assessor, before catalog resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFinding {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub hosts: Vec<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kb_key: Option<String>,
    #[serde(default)]
    pub status: FindingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_party: Option<String>,
}

impl RawFinding {
    pub fn new(id: impl Into<String>, title: impl Into<String>, hosts: Vec<IpAddr>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            remediation: None,
            severity: None,
            hosts,
            kb_key: None,
            status: FindingStatus::Open,
            classification: None,
            responsible_party: None,
        }
    }

    pub fn with_kb_key(mut self, key: impl Into<String>) -> Self {
        self.kb_key = Some(key.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_status(mut self, status: FindingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Screenshot or other supporting artifact. The payload is never decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceImage {
    pub caption: String,
    /// Id of the raw finding this image was captured for.
    pub finding: String,
    pub payload: Vec<u8>,
}

impl EvidenceImage {
    pub fn new(finding: impl Into<String>, caption: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            caption: caption.into(),
            finding: finding.into(),
            payload,
        }
    }
}

/// Header images: the client logo and the architecture diagrams.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportArtwork {
    pub logo: Option<Vec<u8>>,
    pub system_architecture: Option<Vec<u8>>,
    pub mobile_architecture: Option<Vec<u8>>,
}

/// Everything the data-entry layer hands over for one report.
#[derive(Debug, Clone)]
pub struct SessionBundle {
    pub application: Application,
    pub inventory: Vec<IpAddressRecord>,
    pub findings: Vec<RawFinding>,
    pub evidence: Vec<EvidenceImage>,
    pub artwork: ReportArtwork,
}
