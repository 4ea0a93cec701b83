// SPDX-License-Identifier: PMPL-1.0-or-later

//! IP inventory import
//!
//! Scanner exports arrive either as CSV with an IP column somewhere in the
//! header, or as loose text with one address per line. Both are reduced to
//! `IpAddressRecord`s, keeping the first occurrence of each address.

use crate::types::IpAddressRecord;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::net::IpAddr;
use std::path::Path;
use std::sync::OnceLock;

const HOST_COLUMN_HINTS: [&str; 3] = ["host", "name", "server"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryImport {
    pub records: Vec<IpAddressRecord>,
    /// Values in the address position that did not parse as an address.
    pub rejected: Vec<String>,
    pub duplicates: usize,
}

impl InventoryImport {
    fn push(&mut self, seen: &mut HashSet<IpAddr>, raw: &str, hostname: &str) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        match raw.parse::<IpAddr>() {
            Ok(address) if seen.insert(address) => {
                self.records
                    .push(IpAddressRecord::new(address).with_hostname(hostname.trim()));
            }
            Ok(_) => self.duplicates += 1,
            Err(_) => {
                tracing::warn!(value = raw, "not an IP address, skipped");
                self.rejected.push(raw.to_string());
            }
        }
    }
}

/// Read a CSV export. The first header containing "ip" is the address
/// column; the first containing host, name or server is the hostname.
pub fn import_csv<R: Read>(reader: R) -> Result<InventoryImport> {
    let mut csv = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv.headers().context("reading CSV header")?.clone();
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let ip_col = lowered
        .iter()
        .position(|h| h.contains("ip"))
        .context("CSV header has no IP column")?;
    let host_col = lowered
        .iter()
        .enumerate()
        .position(|(idx, h)| idx != ip_col && HOST_COLUMN_HINTS.iter().any(|hint| h.contains(hint)));

    let mut import = InventoryImport::default();
    let mut seen = HashSet::new();
    for (line, row) in csv.records().enumerate() {
        let row = row.with_context(|| format!("reading CSV row {}", line + 2))?;
        let address = row.get(ip_col).unwrap_or_default();
        let hostname = host_col.and_then(|col| row.get(col)).unwrap_or_default();
        import.push(&mut seen, address, hostname);
    }
    tracing::debug!(
        records = import.records.len(),
        duplicates = import.duplicates,
        "CSV inventory imported"
    );
    Ok(import)
}

fn ipv4_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("IPv4 pattern is valid"))
}

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[\s\-|:]+|[\s\-|:]+$").expect("separator pattern is valid")
    })
}

/// Read free text, one IPv4 literal per line; the rest of the line, minus
/// separators, is taken as the hostname.
pub fn import_text(text: &str) -> InventoryImport {
    let mut import = InventoryImport::default();
    let mut seen = HashSet::new();
    for line in text.lines() {
        let Some(found) = ipv4_pattern().find(line) else {
            continue;
        };
        let rest = format!("{}{}", &line[..found.start()], &line[found.end()..]);
        let hostname = separator_pattern().replace_all(rest.trim(), "");
        import.push(&mut seen, found.as_str(), &hostname);
    }
    import
}

/// Import by file extension: `.csv` as CSV, anything else as text.
pub fn import_file(path: &Path) -> Result<InventoryImport> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => {
            let file = fs::File::open(path)
                .with_context(|| format!("opening inventory {}", path.display()))?;
            import_csv(file).with_context(|| format!("parsing CSV inventory {}", path.display()))
        }
        _ => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading inventory {}", path.display()))?;
            Ok(import_text(&text))
        }
    }
}
