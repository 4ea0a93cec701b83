// SPDX-License-Identifier: PMPL-1.0-or-later

//! Knowledge base index
//!
//! Maps finding keys to canonical write-ups. Keys are compared after
//! normalization (trimmed, internal whitespace collapsed, lowercased) so
//! that small data-entry slips still hit the right entry. Entries keep
//! catalog order; every iteration over the index is in that order.

pub mod catalog;
pub mod search;

use crate::error::{CompileError, CompileResult};
use crate::types::KnowledgeBaseEntry;
use std::collections::HashMap;

pub use catalog::{load_catalog, Catalog, CatalogItem};
pub use search::SearchHit;

/// Normalize a key or title for comparison.
pub fn normalize_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBaseIndex {
    entries: Vec<KnowledgeBaseEntry>,
    by_key: HashMap<String, usize>,
}

impl KnowledgeBaseIndex {
    /// Build an index, rejecting keys that collide after normalization.
    pub fn build<I>(entries: I) -> CompileResult<Self>
    where
        I: IntoIterator<Item = KnowledgeBaseEntry>,
    {
        let mut index = Self::default();
        for entry in entries {
            let normalized = normalize_key(&entry.key);
            if normalized.is_empty() {
                return Err(CompileError::validation(
                    "catalog key",
                    format!("entry '{}' has a blank key", entry.title),
                ));
            }
            if index.by_key.contains_key(&normalized) {
                return Err(CompileError::DuplicateKey { key: entry.key });
            }
            index.by_key.insert(normalized, index.entries.len());
            index.entries.push(entry);
        }
        tracing::debug!(entries = index.entries.len(), "knowledge base index built");
        Ok(index)
    }

    pub fn from_catalog(catalog: Catalog) -> CompileResult<Self> {
        Self::build(catalog.into_entries())
    }

    pub fn lookup(&self, key: &str) -> Option<&KnowledgeBaseEntry> {
        self.by_key
            .get(&normalize_key(key))
            .map(|&idx| &self.entries[idx])
    }

    pub fn entries(&self) -> &[KnowledgeBaseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_catalog(&self) -> Catalog {
        Catalog::from_entries(self.entries.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn entry(key: &str, title: &str) -> KnowledgeBaseEntry {
        KnowledgeBaseEntry {
            key: key.to_string(),
            title: title.to_string(),
            description: format!("{} description", title),
            severity: Severity::Medium,
            remediation: format!("fix {}", title),
            references: vec![],
        }
    }

    #[test]
    fn test_lookup_normalizes_case_and_whitespace() {
        let index = KnowledgeBaseIndex::build(vec![entry("tls-old", "Outdated TLS")]).unwrap();
        assert!(index.lookup("tls-old").is_some());
        assert!(index.lookup("  TLS-OLD ").is_some());
        assert!(index.lookup("tls-new").is_none());
    }

    #[test]
    fn test_lookup_collapses_internal_whitespace() {
        let index =
            KnowledgeBaseIndex::build(vec![entry("Weak  Cipher Suites", "Weak ciphers")]).unwrap();
        let found = index.lookup("weak cipher\tsuites").expect("entry");
        assert_eq!(found.title, "Weak ciphers");
    }

    #[test]
    fn test_duplicate_key_names_collision() {
        let err = KnowledgeBaseIndex::build(vec![
            entry("tls-old", "Outdated TLS"),
            entry("TLS-Old ", "Outdated TLS again"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicateKey {
                key: "TLS-Old ".to_string()
            }
        );
    }

    #[test]
    fn test_blank_key_rejected() {
        let err = KnowledgeBaseIndex::build(vec![entry("   ", "Nothing")]).unwrap_err();
        assert!(matches!(err, CompileError::Validation { .. }));
    }

    #[test]
    fn test_entries_keep_catalog_order() {
        let index = KnowledgeBaseIndex::build(vec![
            entry("zeta", "Zeta"),
            entry("alpha", "Alpha"),
        ])
        .unwrap();
        let keys: Vec<_> = index.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(index.len(), 2);
    }
}
