// SPDX-License-Identifier: PMPL-1.0-or-later

//! Catalog file format
//!
//! Two shapes are accepted: a list of full entries, or a map keyed by
//! entry key. The keyed shape is what catalogs exported from older
//! report tooling look like (`{"<issue>": {"implication": .., "mitigation": ..}}`),
//! so `implication`/`mitigation` are read as description/remediation and
//! a missing title falls back to the key, in either shape. Exports are
//! always list-shaped so catalog order survives a round trip.

use crate::types::{KnowledgeBaseEntry, Severity};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Catalog {
    Entries(Vec<CatalogItem>),
    Keyed(BTreeMap<String, CatalogFields>),
}

/// One element of a list-shaped catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub key: String,
    #[serde(flatten)]
    pub fields: CatalogFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "implication")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, alias = "mitigation")]
    pub remediation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl CatalogFields {
    fn into_entry(self, key: String) -> KnowledgeBaseEntry {
        if self.description.trim().is_empty() || self.remediation.trim().is_empty() {
            tracing::warn!(key = %key, "catalog entry has blank description or remediation");
        }
        KnowledgeBaseEntry {
            title: self.title.unwrap_or_else(|| key.clone()),
            key,
            description: self.description,
            severity: self.severity.unwrap_or(Severity::Informational),
            remediation: self.remediation,
            references: self.references,
        }
    }
}

impl Catalog {
    /// List export of the given entries, in the order given.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = KnowledgeBaseEntry>,
    {
        let items = entries
            .into_iter()
            .map(|entry| {
                let title = (entry.title != entry.key).then_some(entry.title);
                CatalogItem {
                    key: entry.key,
                    fields: CatalogFields {
                        title,
                        description: entry.description,
                        severity: Some(entry.severity),
                        remediation: entry.remediation,
                        references: entry.references,
                    },
                }
            })
            .collect();
        Catalog::Entries(items)
    }

    pub fn into_entries(self) -> Vec<KnowledgeBaseEntry> {
        match self {
            Catalog::Entries(items) => items
                .into_iter()
                .map(|item| item.fields.into_entry(item.key))
                .collect(),
            Catalog::Keyed(map) => map
                .into_iter()
                .map(|(key, fields)| fields.into_entry(key))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Catalog::Entries(entries) => entries.len(),
            Catalog::Keyed(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Load a catalog from JSON or YAML, chosen by file extension.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading catalog {}", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("parsing yaml catalog {}", path.display())),
        _ => serde_json::from_str(&content)
            .with_context(|| format!("parsing json catalog {}", path.display())),
    }
}
