// SPDX-License-Identifier: PMPL-1.0-or-later

//! Compilation settings, read from YAML or JSON

use crate::evidence::EvidenceLimits;
use crate::merge::StatusPolicy;
use crate::resolve::TitleMatching;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    pub evidence: EvidenceLimits,
    pub status_policy: StatusPolicy,
    pub title_matching: TitleMatching,
}

impl CompileConfig {
    pub fn with_evidence_limits(mut self, limits: EvidenceLimits) -> Self {
        self.evidence = limits;
        self
    }

    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    pub fn with_title_matching(mut self, matching: TitleMatching) -> Self {
        self.title_matching = matching;
        self
    }
}

pub fn load_config(path: &Path) -> Result<CompileConfig> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("parsing yaml config {}", path.display())),
        _ => serde_json::from_str(&content)
            .with_context(|| format!("parsing json config {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: CompileConfig = serde_yaml::from_str("status_policy: strict\n").unwrap();
        assert_eq!(config.status_policy, StatusPolicy::Strict);
        assert_eq!(config.title_matching, TitleMatching::Normalized);
        assert_eq!(config.evidence, EvidenceLimits::default());
    }

    #[test]
    fn test_load_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vapt.json");
        fs::write(
            &path,
            r#"{"evidence": {"max_per_finding": 3}, "title_matching": "exact"}"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.evidence.max_per_finding, Some(3));
        assert_eq!(config.evidence.max_image_bytes, None);
        assert_eq!(config.title_matching, TitleMatching::Exact);
        assert_eq!(config.status_policy, StatusPolicy::Escalate);
    }
}
