// SPDX-License-Identifier: PMPL-1.0-or-later

//! Similarity search over the knowledge base, used to suggest catalog
//! entries while a finding is being written up.

use super::KnowledgeBaseIndex;
use crate::types::KnowledgeBaseEntry;

const MIN_QUERY_LEN: usize = 3;
const MIN_SCORE: f64 = 0.2;
const BODY_WEIGHT: f64 = 0.8;
const KEYWORD_BONUS: f64 = 0.15;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub entry: &'a KnowledgeBaseEntry,
    pub score: f64,
}

impl KnowledgeBaseIndex {
    /// Rank entries against a free-text query, best first.
    ///
    /// The score is the best of title similarity and down-weighted
    /// description/remediation similarity, plus a bonus for each query
    /// word longer than three characters that appears in any field.
    pub fn search(&self, query: &str, top_n: usize) -> Vec<SearchHit<'_>> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }
        let keywords: Vec<&str> = query
            .split_whitespace()
            .filter(|word| word.chars().count() > 3)
            .collect();

        let mut hits: Vec<SearchHit<'_>> = self
            .entries()
            .iter()
            .filter_map(|entry| {
                let title = entry.title.to_lowercase();
                let description = entry.description.to_lowercase();
                let remediation = entry.remediation.to_lowercase();

                let mut score = similarity(&query, &title)
                    .max(similarity(&query, &description) * BODY_WEIGHT)
                    .max(similarity(&query, &remediation) * BODY_WEIGHT);

                let matched = keywords
                    .iter()
                    .filter(|kw| {
                        title.contains(*kw) || description.contains(*kw) || remediation.contains(*kw)
                    })
                    .count();
                score += matched as f64 * KEYWORD_BONUS;

                (score > MIN_SCORE).then_some(SearchHit { entry, score })
            })
            .collect();

        // Stable sort keeps catalog order between equal scores.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_n);
        hits
    }
}

/// Normalized edit similarity in `0.0..=1.0`.
fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars = a.chars().collect::<Vec<_>>();
    let b_chars = b.chars().collect::<Vec<_>>();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }
    let mut prev = (0..=b_chars.len()).collect::<Vec<_>>();
    let mut curr = vec![0usize; b_chars.len() + 1];
    for (i, ac) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, bc) in b_chars.iter().enumerate() {
            let cost = usize::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}
