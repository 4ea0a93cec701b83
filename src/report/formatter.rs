// SPDX-License-Identifier: PMPL-1.0-or-later

//! Console summary of a compiled report

use crate::assemble::{DocumentModel, FindingsSummary};
use crate::compile::Compilation;
use crate::error::Warning;
use crate::report::output::ReportOutputFormat;
use crate::types::{FindingStatus, Severity};
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::Path;

pub struct ReportFormatter;

impl ReportFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn print(&self, compilation: &Compilation) {
        let document = &compilation.document;
        println!("\n{}", format!("=== {} ===", document.header.title.to_uppercase()).bold().cyan());
        println!();

        self.print_header(document);
        println!();

        self.print_summary(&document.summary);
        println!();

        self.print_findings(document);
        println!();

        self.print_warnings(&compilation.warnings);
        println!();
    }

    fn print_header(&self, document: &DocumentModel) {
        let header = &document.header;
        println!("{}", "ENGAGEMENT".bold().yellow());
        println!("  Application: {}", header.application.name);
        println!("  Version: {}", header.application.version);
        if let Some(date) = &header.date_label {
            println!("  Assessed: {}", date);
        }
        if let Some(assessor) = &header.application.assessor {
            println!("  Assessor: {}", assessor);
        }
        println!("  Hosts in scope: {}", document.inventory.len());
        for artwork in [
            &header.logo,
            &header.system_architecture,
            &header.mobile_architecture,
        ]
        .into_iter()
        .flatten()
        {
            println!(
                "  {}: {} bytes, sha256 {}",
                artwork.caption,
                artwork.bytes,
                artwork.sha256.dimmed()
            );
        }
        println!("  Output name: {}", document.file_stem().dimmed());
    }

    fn print_summary(&self, summary: &FindingsSummary) {
        println!("{}", "SUMMARY".bold().yellow());
        println!(
            "  Findings: {} ({} open)",
            summary.total,
            summary.open.to_string().bold()
        );
        for count in &summary.severity_counts {
            if count.count > 0 {
                println!(
                    "    {}: {}",
                    colored_severity(count.severity),
                    count.count
                );
            }
        }

        for group in &summary.groups {
            println!();
            println!("  {}", group.heading.bold());
            for row in &group.rows {
                let responsible = if row.responsible.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", row.responsible)
                };
                println!(
                    "    {}. {} - {} ({}){}",
                    row.number,
                    row.title,
                    colored_severity(row.severity),
                    colored_status(row.status),
                    responsible.dimmed()
                );
            }
        }
    }

    fn print_findings(&self, document: &DocumentModel) {
        println!("{}", "FINDINGS".bold().yellow());
        for finding in &document.findings {
            let origin = match &finding.key {
                Some(key) => key.dimmed().to_string(),
                None => "unlisted".magenta().to_string(),
            };
            println!(
                "  {}. [{}] {} ({})",
                finding.number,
                colored_severity(finding.severity),
                finding.title.bold(),
                origin
            );
            let hosts: Vec<String> = finding.hosts.iter().map(|h| h.to_string()).collect();
            println!("     Hosts: {}", hosts.join(", "));
            println!("     Status: {}", colored_status(finding.status));
            if finding.source_ids.len() > 1 {
                println!("     Merged from: {}", finding.source_ids.join(", ").dimmed());
            }
            if !finding.evidence.is_empty() {
                println!("     Evidence: {} image(s)", finding.evidence.len());
                for evidence in &finding.evidence {
                    println!(
                        "       - {} ({} bytes, {})",
                        evidence.caption,
                        evidence.bytes,
                        evidence.sha256[..12.min(evidence.sha256.len())].dimmed()
                    );
                }
            }
        }
    }

    fn print_warnings(&self, warnings: &[Warning]) {
        if warnings.is_empty() {
            println!("{}", "No warnings".green());
            return;
        }
        println!("{}", format!("WARNINGS ({})", warnings.len()).bold().red());
        for warning in warnings {
            println!("  - {}", warning.to_string().yellow());
        }
    }

    pub fn save<P: AsRef<Path>>(
        &self,
        compilation: &Compilation,
        format: ReportOutputFormat,
        path: P,
    ) -> Result<()> {
        let content = format.serialize(compilation)?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("writing report {}", path.as_ref().display()))?;
        println!("Report saved to: {}", path.as_ref().display());
        Ok(())
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn colored_severity(severity: Severity) -> ColoredString {
    let label = severity.to_string();
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.blue(),
        Severity::Informational => label.green(),
    }
}

fn colored_status(status: FindingStatus) -> ColoredString {
    match status {
        FindingStatus::Open => status.label().red(),
        FindingStatus::AcceptedRisk => status.label().yellow(),
        FindingStatus::Remediated => status.label().green(),
    }
}
