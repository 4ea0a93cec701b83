// SPDX-License-Identifier: PMPL-1.0-or-later

//! Deduplication of resolved findings
//!
//! Findings that resolve to the same catalog entry (or, when unlisted,
//! carry the same normalized title) collapse into one `MergedFinding`.
//! Groups are emitted in order of first appearance and every "first"
//! choice below follows submission order, so merging is reproducible.

use crate::error::{CompileError, CompileResult, Warning};
use crate::evidence::BoundEvidence;
use crate::resolve::{GroupKey, ResolvedFinding};
use crate::types::{Classification, FindingStatus, Severity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::net::IpAddr;

/// How disagreeing statuses inside one group are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
    /// Report the least resolved status (open, then accepted risk, then remediated).
    #[default]
    Escalate,
    /// Refuse to merge findings whose statuses differ.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedFinding {
    /// 1-based position in the report, assigned once findings are ordered.
    pub number: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub title: String,
    pub severity: Severity,
    pub status: FindingStatus,
    pub description: String,
    pub remediation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    pub hosts: BTreeSet<IpAddr>,
    /// Ids of the submitted findings folded into this one.
    pub source_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responsible_parties: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<BoundEvidence>,
    #[serde(skip)]
    pub(crate) first_position: usize,
}

impl MergedFinding {
    pub fn is_unlisted(&self) -> bool {
        self.key.is_none()
    }

    pub fn first_host(&self) -> Option<&IpAddr> {
        self.hosts.iter().next()
    }
}

pub fn merge_findings(
    resolved: &[ResolvedFinding<'_>],
    policy: StatusPolicy,
) -> CompileResult<(Vec<MergedFinding>, Vec<Warning>)> {
    let mut order: Vec<(GroupKey, Vec<&ResolvedFinding<'_>>)> = Vec::new();
    let mut slots: HashMap<GroupKey, usize> = HashMap::new();
    for finding in resolved {
        let key = finding.group_key();
        match slots.get(&key) {
            Some(&slot) => order[slot].1.push(finding),
            None => {
                slots.insert(key.clone(), order.len());
                order.push((key, vec![finding]));
            }
        }
    }

    let mut merged = Vec::with_capacity(order.len());
    let mut warnings = Vec::new();
    for (key, members) in order {
        let status = reconcile_status(&key, &members, policy, &mut warnings)?;
        if members.len() > 1 {
            tracing::debug!(group = %key, members = members.len(), "merging findings");
        }
        merged.push(merge_group(members, status));
    }
    Ok((merged, warnings))
}

fn reconcile_status(
    key: &GroupKey,
    members: &[&ResolvedFinding<'_>],
    policy: StatusPolicy,
    warnings: &mut Vec<Warning>,
) -> CompileResult<FindingStatus> {
    let mut statuses: Vec<FindingStatus> = Vec::new();
    for member in members {
        if !statuses.contains(&member.raw.status) {
            statuses.push(member.raw.status);
        }
    }

    if let [only] = statuses.as_slice() {
        return Ok(*only);
    }

    match policy {
        StatusPolicy::Strict => Err(CompileError::Conflict {
            key: key.to_string(),
            statuses,
        }),
        StatusPolicy::Escalate => {
            let chosen = statuses
                .iter()
                .copied()
                .min_by_key(FindingStatus::resolution_rank)
                .unwrap_or_default();
            tracing::warn!(group = %key, status = %chosen, "status conflict escalated");
            warnings.push(Warning::StatusEscalated {
                key: key.to_string(),
                chosen,
                statuses,
            });
            Ok(chosen)
        }
    }
}

fn merge_group(members: Vec<&ResolvedFinding<'_>>, status: FindingStatus) -> MergedFinding {
    let first = members[0];
    let entry = first.resolution.entry();

    let description = match entry {
        Some(e) if !e.description.trim().is_empty() => e.description.clone(),
        _ => first_non_empty(members.iter().map(|m| Some(m.raw.description.as_str()))),
    };
    let remediation = match entry {
        Some(e) if !e.remediation.trim().is_empty() => e.remediation.clone(),
        _ => first_non_empty(members.iter().map(|m| m.raw.remediation.as_deref())),
    };

    let mut responsible_parties: Vec<String> = Vec::new();
    for party in members
        .iter()
        .filter_map(|m| m.raw.responsible_party.as_deref())
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        if !responsible_parties.iter().any(|known| known == party) {
            responsible_parties.push(party.to_string());
        }
    }

    MergedFinding {
        number: 0,
        key: entry.map(|e| e.key.clone()),
        title: entry
            .map(|e| e.title.clone())
            .unwrap_or_else(|| first.raw.title.trim().to_string()),
        severity: members
            .iter()
            .map(|m| m.severity)
            .max()
            .unwrap_or(Severity::Informational),
        status,
        description,
        remediation,
        references: entry.map(|e| e.references.clone()).unwrap_or_default(),
        hosts: members
            .iter()
            .flat_map(|m| m.raw.hosts.iter().copied())
            .collect(),
        source_ids: members.iter().map(|m| m.raw.id.trim().to_string()).collect(),
        classification: members.iter().find_map(|m| m.raw.classification),
        responsible_parties,
        evidence: Vec::new(),
        first_position: first.position,
    }
}

fn first_non_empty<'t>(texts: impl Iterator<Item = Option<&'t str>>) -> String {
    texts
        .flatten()
        .map(str::trim)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}
