// SPDX-License-Identifier: PMPL-1.0-or-later

//! Compilation errors and the warnings collected for recoverable conditions.

use crate::types::FindingStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("duplicate knowledge base key '{key}'")]
    DuplicateKey { key: String },

    #[error("findings grouped under '{key}' disagree on status ({})", fmt_statuses(.statuses))]
    Conflict {
        key: String,
        statuses: Vec<FindingStatus>,
    },

    #[error("evidence '{caption}' links to unknown finding '{link}'")]
    OrphanEvidence { caption: String, link: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },
}

impl CompileError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CompileError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Recoverable errors are downgraded to warnings instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CompileError::OrphanEvidence { .. })
    }

    /// The warning a recoverable error is recorded as, `None` for fatal ones.
    pub fn into_warning(self) -> Option<Warning> {
        match self {
            CompileError::OrphanEvidence { caption, link } => {
                Some(Warning::OrphanEvidence { caption, link })
            }
            _ => None,
        }
    }
}

fn fmt_statuses(statuses: &[FindingStatus]) -> String {
    statuses
        .iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Something the engine adjusted silently; returned next to the document
/// so the assessor can review it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    OrphanEvidence {
        caption: String,
        link: String,
    },
    EmptyEvidence {
        caption: String,
        finding: String,
    },
    OversizedEvidence {
        caption: String,
        finding: String,
        bytes: usize,
        limit: usize,
    },
    EvidenceTruncated {
        finding: String,
        kept: usize,
        dropped: usize,
    },
    UnmatchedKeyHint {
        finding: String,
        key: String,
    },
    StatusEscalated {
        key: String,
        chosen: FindingStatus,
        statuses: Vec<FindingStatus>,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::OrphanEvidence { caption, link } => write!(
                f,
                "evidence '{}' dropped: finding '{}' does not exist",
                caption, link
            ),
            Warning::EmptyEvidence { caption, finding } => write!(
                f,
                "evidence '{}' for finding '{}' dropped: empty payload",
                caption, finding
            ),
            Warning::OversizedEvidence {
                caption,
                finding,
                bytes,
                limit,
            } => write!(
                f,
                "evidence '{}' for finding '{}' dropped: {} bytes exceeds limit of {}",
                caption, finding, bytes, limit
            ),
            Warning::EvidenceTruncated {
                finding,
                kept,
                dropped,
            } => write!(
                f,
                "finding '{}' kept {} evidence image(s), dropped {}",
                finding, kept, dropped
            ),
            Warning::UnmatchedKeyHint { finding, key } => write!(
                f,
                "finding '{}' references unknown knowledge base key '{}', reported as unlisted",
                finding, key
            ),
            Warning::StatusEscalated {
                key,
                chosen,
                statuses,
            } => write!(
                f,
                "findings under '{}' disagree on status ({}), reported as {}",
                key,
                fmt_statuses(statuses),
                chosen
            ),
        }
    }
}

pub type CompileResult<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orphan_downgrades_to_warning() {
        let err = CompileError::OrphanEvidence {
            caption: "login page".to_string(),
            link: "F-9".to_string(),
        };
        assert!(err.is_recoverable());
        assert_eq!(
            err.into_warning(),
            Some(Warning::OrphanEvidence {
                caption: "login page".to_string(),
                link: "F-9".to_string(),
            })
        );
    }

    #[test]
    fn test_fatal_errors_have_no_warning() {
        let err = CompileError::validation("inventory", "no IP addresses");
        assert!(!err.is_recoverable());
        assert!(err.clone().into_warning().is_none());
        assert_eq!(err.to_string(), "invalid inventory: no IP addresses");
    }

    #[test]
    fn test_conflict_message_lists_statuses() {
        let err = CompileError::Conflict {
            key: "tls-old".to_string(),
            statuses: vec![FindingStatus::Open, FindingStatus::Remediated],
        };
        assert_eq!(
            err.to_string(),
            "findings grouped under 'tls-old' disagree on status (Open, Remediated)"
        );
    }
}
