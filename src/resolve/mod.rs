// SPDX-License-Identifier: PMPL-1.0-or-later

//! Finding resolution against the knowledge base
//!
//! A key hint is authoritative: when present it is the only thing looked
//! up, and a miss leaves the finding unlisted. Findings without a hint go
//! through the configured title matcher. Resolution never fails.

pub mod matcher;

use crate::error::Warning;
use crate::knowledge::{normalize_key, KnowledgeBaseIndex};
use crate::types::{KnowledgeBaseEntry, RawFinding, Severity};

pub use matcher::{ExactTitle, NormalizedTitle, TitleMatcher, TitleMatching};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Catalog(&'a KnowledgeBaseEntry),
    Unlisted,
}

impl<'a> Resolution<'a> {
    pub fn entry(&self) -> Option<&'a KnowledgeBaseEntry> {
        match self {
            Resolution::Catalog(entry) => Some(entry),
            Resolution::Unlisted => None,
        }
    }
}

/// Identity used to merge findings: catalog key, or normalized title for
/// unlisted findings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Catalog(String),
    Unlisted(String),
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKey::Catalog(key) => write!(f, "{}", key),
            GroupKey::Unlisted(title) => write!(f, "unlisted:{}", title),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedFinding<'a> {
    pub raw: &'a RawFinding,
    pub resolution: Resolution<'a>,
    pub severity: Severity,
    /// Position in the submitted finding list.
    pub position: usize,
}

impl<'a> ResolvedFinding<'a> {
    pub fn group_key(&self) -> GroupKey {
        match self.resolution {
            Resolution::Catalog(entry) => GroupKey::Catalog(entry.key.clone()),
            Resolution::Unlisted => GroupKey::Unlisted(normalize_key(&self.raw.title)),
        }
    }

    pub fn is_unlisted(&self) -> bool {
        matches!(self.resolution, Resolution::Unlisted)
    }
}

pub struct FindingResolver<'a> {
    index: &'a KnowledgeBaseIndex,
    matcher: &'a dyn TitleMatcher,
}

impl<'a> FindingResolver<'a> {
    pub fn new(index: &'a KnowledgeBaseIndex, matcher: &'a dyn TitleMatcher) -> Self {
        Self { index, matcher }
    }

    pub fn resolve(
        &self,
        position: usize,
        raw: &'a RawFinding,
    ) -> (ResolvedFinding<'a>, Option<Warning>) {
        let mut warning = None;
        let entry = match raw.kb_key.as_deref().filter(|key| !key.trim().is_empty()) {
            Some(key) => {
                let found = self.index.lookup(key);
                if found.is_none() {
                    warning = Some(Warning::UnmatchedKeyHint {
                        finding: raw.id.clone(),
                        key: key.to_string(),
                    });
                }
                found
            }
            None => self.matcher.match_title(self.index, &raw.title),
        };

        let resolution = entry.map_or(Resolution::Unlisted, Resolution::Catalog);
        let severity = raw
            .severity
            .or_else(|| entry.map(|e| e.severity))
            .unwrap_or(Severity::Informational);

        tracing::debug!(
            finding = %raw.id,
            matched = entry.map(|e| e.key.as_str()).unwrap_or("-"),
            matcher = self.matcher.name(),
            %severity,
            "finding resolved"
        );

        (
            ResolvedFinding {
                raw,
                resolution,
                severity,
                position,
            },
            warning,
        )
    }

    pub fn resolve_all(
        &self,
        findings: &'a [RawFinding],
    ) -> (Vec<ResolvedFinding<'a>>, Vec<Warning>) {
        let mut resolved = Vec::with_capacity(findings.len());
        let mut warnings = Vec::new();
        for (position, raw) in findings.iter().enumerate() {
            let (finding, warning) = self.resolve(position, raw);
            resolved.push(finding);
            warnings.extend(warning);
        }
        (resolved, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn index() -> KnowledgeBaseIndex {
        KnowledgeBaseIndex::build(vec![KnowledgeBaseEntry {
            key: "tls-old".to_string(),
            title: "Outdated TLS".to_string(),
            description: "TLS 1.0 enabled".to_string(),
            severity: Severity::High,
            remediation: "Disable TLS 1.0".to_string(),
            references: vec![],
        }])
        .unwrap()
    }

    fn host() -> Vec<IpAddr> {
        vec!["10.0.0.5".parse().unwrap()]
    }

    #[test]
    fn test_key_hint_inherits_default_severity() {
        let index = index();
        let resolver = FindingResolver::new(&index, &NormalizedTitle);
        let raw = RawFinding::new("F-1", "Whatever", host()).with_kb_key("TLS-OLD");
        let (resolved, warning) = resolver.resolve(0, &raw);
        assert!(warning.is_none());
        assert_eq!(resolved.resolution.entry().map(|e| e.key.as_str()), Some("tls-old"));
        assert_eq!(resolved.severity, Severity::High);
        assert_eq!(resolved.group_key(), GroupKey::Catalog("tls-old".to_string()));
    }

    #[test]
    fn test_override_wins_over_default() {
        let index = index();
        let resolver = FindingResolver::new(&index, &NormalizedTitle);
        let raw = RawFinding::new("F-1", "Outdated TLS", host()).with_severity(Severity::Low);
        let (resolved, _) = resolver.resolve(0, &raw);
        assert!(!resolved.is_unlisted());
        assert_eq!(resolved.severity, Severity::Low);
    }

    #[test]
    fn test_unknown_hint_is_unlisted_with_warning() {
        let index = index();
        let resolver = FindingResolver::new(&index, &NormalizedTitle);
        // The title would match, but the hint is authoritative.
        let raw = RawFinding::new("F-7", "Outdated TLS", host()).with_kb_key("tls-ancient");
        let (resolved, warning) = resolver.resolve(3, &raw);
        assert!(resolved.is_unlisted());
        assert_eq!(resolved.severity, Severity::Informational);
        assert_eq!(resolved.position, 3);
        assert_eq!(
            warning,
            Some(Warning::UnmatchedKeyHint {
                finding: "F-7".to_string(),
                key: "tls-ancient".to_string(),
            })
        );
    }

    #[test]
    fn test_unlisted_groups_by_normalized_title() {
        let index = index();
        let resolver = FindingResolver::new(&index, &ExactTitle);
        let raw = RawFinding::new("F-2", "  Default  Credentials ", host());
        let (resolved, warning) = resolver.resolve(0, &raw);
        assert!(warning.is_none());
        assert_eq!(
            resolved.group_key(),
            GroupKey::Unlisted("default credentials".to_string())
        );
    }

    #[test]
    fn test_blank_hint_falls_back_to_title() {
        let index = index();
        let resolver = FindingResolver::new(&index, &NormalizedTitle);
        let raw = RawFinding::new("F-3", "outdated tls", host()).with_kb_key("  ");
        let (resolved, warning) = resolver.resolve(0, &raw);
        assert!(warning.is_none());
        assert!(!resolved.is_unlisted());
    }
}
