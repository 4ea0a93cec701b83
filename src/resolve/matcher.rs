// SPDX-License-Identifier: PMPL-1.0-or-later

//! Title matching strategies for findings submitted without a key hint.

use crate::knowledge::{normalize_key, KnowledgeBaseIndex};
use crate::types::KnowledgeBaseEntry;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Finds the catalog entry a finding title refers to, if any.
pub trait TitleMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    fn match_title<'a>(
        &self,
        index: &'a KnowledgeBaseIndex,
        title: &str,
    ) -> Option<&'a KnowledgeBaseEntry>;
}

/// Title must equal an entry title (or key) character for character,
/// ignoring only leading/trailing whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTitle;

impl TitleMatcher for ExactTitle {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn match_title<'a>(
        &self,
        index: &'a KnowledgeBaseIndex,
        title: &str,
    ) -> Option<&'a KnowledgeBaseEntry> {
        let title = title.trim();
        index
            .entries()
            .iter()
            .find(|entry| entry.title.trim() == title || entry.key.trim() == title)
    }
}

/// Normalized equality first, then containment in either direction.
///
/// Containment prefers the longest entry title so that "SSL Weak Ciphers
/// on port 8443" picks "SSL Weak Ciphers" over a shorter "SSL" entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedTitle;

const MIN_CONTAINED_LEN: usize = 3;

impl TitleMatcher for NormalizedTitle {
    fn name(&self) -> &'static str {
        "normalized"
    }

    fn match_title<'a>(
        &self,
        index: &'a KnowledgeBaseIndex,
        title: &str,
    ) -> Option<&'a KnowledgeBaseEntry> {
        let wanted = normalize_key(title);
        if wanted.is_empty() {
            return None;
        }

        let candidates = || {
            index.entries().iter().flat_map(|entry| {
                [
                    (entry, normalize_key(&entry.title)),
                    (entry, normalize_key(&entry.key)),
                ]
            })
        };

        if let Some((entry, _)) = candidates().find(|(_, name)| *name == wanted) {
            return Some(entry);
        }

        let mut best: Option<(&KnowledgeBaseEntry, usize)> = None;
        for (entry, name) in candidates() {
            let len = name.chars().count();
            if len < MIN_CONTAINED_LEN {
                continue;
            }
            if wanted.contains(&name) || name.contains(&wanted) {
                // Strictly longer wins; first in catalog order keeps ties.
                if best.map_or(true, |(_, best_len)| len > best_len) {
                    best = Some((entry, len));
                }
            }
        }
        best.map(|(entry, _)| entry)
    }
}

/// Config-facing selector for the title matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TitleMatching {
    Exact,
    #[default]
    Normalized,
}

impl TitleMatching {
    pub fn matcher(&self) -> Box<dyn TitleMatcher> {
        match self {
            TitleMatching::Exact => Box::new(ExactTitle),
            TitleMatching::Normalized => Box::new(NormalizedTitle),
        }
    }
}
