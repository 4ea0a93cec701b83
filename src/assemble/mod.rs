// SPDX-License-Identifier: PMPL-1.0-or-later

//! Report assembly
//!
//! Composes the header, the address-ordered inventory and the ordered,
//! evidence-bound findings into the `DocumentModel` handed to a renderer.
//! Nothing here touches the filesystem or any output format.

pub mod summary;

use crate::error::{CompileError, CompileResult};
use crate::evidence::BoundEvidence;
use crate::merge::MergedFinding;
use crate::types::{Application, IpAddressRecord, ReportArtwork, SessionBundle};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::OnceLock;

pub use summary::{FindingsSummary, SeverityCount, SummaryGroup, SummaryRow};

pub const MISSING_DESCRIPTION: &str = "[No description provided]";
pub const MISSING_REMEDIATION: &str = "[No remediation provided]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub title: String,
    pub application: Application,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<BoundEvidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_architecture: Option<BoundEvidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_architecture: Option<BoundEvidence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentModel {
    pub header: ReportHeader,
    pub inventory: Vec<IpAddressRecord>,
    pub summary: FindingsSummary,
    pub findings: Vec<MergedFinding>,
}

impl DocumentModel {
    /// File name stem a renderer should use, e.g. `Customer_Portal_v1.0`.
    pub fn file_stem(&self) -> String {
        let app = &self.header.application;
        let safe: String = app
            .name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
            .collect();
        let safe = safe.trim().replace(' ', "_");
        let safe = if safe.is_empty() { "report".to_string() } else { safe };
        format!("{}_v{}", safe, app.version)
    }

    pub fn evidence_count(&self) -> usize {
        self.findings.iter().map(|f| f.evidence.len()).sum()
    }

    /// Digest the header images onto the report header. Empty payloads
    /// leave their slot unset.
    pub fn attach_artwork(&mut self, artwork: &ReportArtwork) {
        let slot = |caption: &str, payload: &Option<Vec<u8>>| {
            payload
                .as_deref()
                .filter(|bytes| !bytes.is_empty())
                .map(|bytes| BoundEvidence::digest(caption, bytes))
        };
        self.header.logo = slot("Logo", &artwork.logo);
        self.header.system_architecture =
            slot("System Architecture", &artwork.system_architecture);
        self.header.mobile_architecture =
            slot("Mobile Architecture", &artwork.mobile_architecture);
    }
}

/// Structural checks on the submitted records, run before any resolution.
pub fn validate_bundle(bundle: &SessionBundle) -> CompileResult<()> {
    check_not_empty(
        &bundle.application,
        bundle.inventory.len(),
        bundle.findings.len(),
    )?;

    let mut addresses: HashSet<IpAddr> = HashSet::new();
    for record in &bundle.inventory {
        if !addresses.insert(record.address) {
            return Err(CompileError::validation(
                "inventory",
                format!("address {} is listed more than once", record.address),
            ));
        }
    }

    let mut ids: HashSet<&str> = HashSet::new();
    for finding in &bundle.findings {
        let id = finding.id.trim();
        if id.is_empty() {
            return Err(CompileError::validation(
                "findings.id",
                format!("finding '{}' has no id", finding.title),
            ));
        }
        if !ids.insert(id) {
            return Err(CompileError::validation(
                "findings.id",
                format!("id '{}' is used by more than one finding", id),
            ));
        }
        let field = format!("findings[{}].hosts", id);
        if finding.hosts.is_empty() {
            return Err(CompileError::validation(field, "no affected hosts"));
        }
        if let Some(host) = finding.hosts.iter().find(|h| !addresses.contains(h)) {
            return Err(CompileError::validation(
                field,
                format!("host {} is not in the IP inventory", host),
            ));
        }
    }
    Ok(())
}

fn check_not_empty(
    application: &Application,
    inventory: usize,
    findings: usize,
) -> CompileResult<()> {
    if application.name.trim().is_empty() {
        return Err(CompileError::validation(
            "application.name",
            "must not be empty",
        ));
    }
    if inventory == 0 {
        return Err(CompileError::validation(
            "inventory",
            "at least one IP address is required",
        ));
    }
    if findings == 0 {
        return Err(CompileError::validation(
            "findings",
            "at least one finding is required",
        ));
    }
    Ok(())
}

/// Compose the final document from findings already merged, ordered and
/// bound to their evidence.
pub fn assemble_document(
    application: &Application,
    inventory: &[IpAddressRecord],
    mut findings: Vec<MergedFinding>,
) -> CompileResult<DocumentModel> {
    check_not_empty(application, inventory.len(), findings.len())?;

    let mut inventory = inventory.to_vec();
    // IpAddr orders IPv4 numerically, then IPv6 by its 128-bit value.
    inventory.sort_by_key(|record| record.address);

    for finding in &mut findings {
        let hosts = finding
            .hosts
            .iter()
            .map(IpAddr::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        finding.description =
            render_template(&finding.description, &application.name, &hosts, MISSING_DESCRIPTION);
        finding.remediation =
            render_template(&finding.remediation, &application.name, &hosts, MISSING_REMEDIATION);
    }

    let summary = FindingsSummary::from_findings(&findings);
    let header = ReportHeader {
        title: format!("{} Security Assessment", application.name.trim()),
        application: application.clone(),
        date_label: application
            .assessment_date
            .map(|date| date.format("%d %B %Y").to_string()),
        logo: None,
        system_architecture: None,
        mobile_architecture: None,
    };

    tracing::debug!(
        findings = findings.len(),
        hosts = inventory.len(),
        "document assembled"
    );

    Ok(DocumentModel {
        header,
        inventory,
        summary,
        findings,
    })
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*(application|hosts)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Substitute `{{application}}` and `{{hosts}}`; blank text becomes `missing`.
pub fn render_template(text: &str, application: &str, hosts: &str, missing: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return missing.to_string();
    }
    placeholder_pattern()
        .replace_all(text, |caps: &regex::Captures<'_>| match &caps[1] {
            "application" => application.trim().to_string(),
            _ => hosts.to_string(),
        })
        .into_owned()
}
