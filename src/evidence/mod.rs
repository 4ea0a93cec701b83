// SPDX-License-Identifier: PMPL-1.0-or-later

//! Evidence binding
//!
//! Images are linked by the id of the finding they were captured for.
//! After merging, that id may belong to a finding that absorbed others,
//! so links are resolved through every merged finding's source ids.
//! Payloads are opaque: they are routed, sized and hashed, never decoded.

use crate::error::{CompileError, CompileResult, Warning};
use crate::merge::MergedFinding;
use crate::types::EvidenceImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundEvidence {
    pub caption: String,
    pub sha256: String,
    pub bytes: usize,
    #[serde(skip)]
    pub payload: Vec<u8>,
}

impl BoundEvidence {
    pub(crate) fn digest(caption: impl Into<String>, payload: &[u8]) -> Self {
        Self {
            caption: caption.into(),
            sha256: hex::encode(Sha256::digest(payload)),
            bytes: payload.len(),
            payload: payload.to_vec(),
        }
    }

    fn from_image(image: &EvidenceImage) -> Self {
        Self::digest(image.caption.as_str(), &image.payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvidenceLimits {
    /// Images kept per finding; extra images are dropped in submission order.
    #[serde(default)]
    pub max_per_finding: Option<usize>,
    /// Largest payload accepted, in bytes.
    #[serde(default)]
    pub max_image_bytes: Option<usize>,
}

enum Outcome {
    Bound(usize, BoundEvidence),
    Orphan(CompileError),
    Dropped(Warning),
}

pub struct EvidenceBinder<'a> {
    links: HashMap<&'a str, usize>,
    findings: &'a [MergedFinding],
    limits: EvidenceLimits,
}

impl<'a> EvidenceBinder<'a> {
    pub fn new(findings: &'a [MergedFinding], limits: EvidenceLimits) -> Self {
        let links = findings
            .iter()
            .enumerate()
            .flat_map(|(idx, finding)| finding.source_ids.iter().map(move |id| (id.as_str(), idx)))
            .collect();
        Self {
            links,
            findings,
            limits,
        }
    }

    /// Index of the merged finding an image belongs to.
    pub fn resolve_link(&self, image: &EvidenceImage) -> CompileResult<usize> {
        self.links
            .get(image.finding.trim())
            .copied()
            .ok_or_else(|| CompileError::OrphanEvidence {
                caption: image.caption.clone(),
                link: image.finding.clone(),
            })
    }

    fn check(&self, image: &EvidenceImage) -> Outcome {
        let target = match self.resolve_link(image) {
            Ok(target) => target,
            Err(err) => return Outcome::Orphan(err),
        };

        if image.payload.is_empty() {
            return Outcome::Dropped(Warning::EmptyEvidence {
                caption: image.caption.clone(),
                finding: image.finding.clone(),
            });
        }
        if let Some(limit) = self.limits.max_image_bytes {
            if image.payload.len() > limit {
                return Outcome::Dropped(Warning::OversizedEvidence {
                    caption: image.caption.clone(),
                    finding: image.finding.clone(),
                    bytes: image.payload.len(),
                    limit,
                });
            }
        }
        Outcome::Bound(target, BoundEvidence::from_image(image))
    }

    /// Evidence per merged finding (same indexing as the finding slice),
    /// plus warnings for every image that was dropped.
    pub fn bind(&self, images: &[EvidenceImage]) -> (Vec<Vec<BoundEvidence>>, Vec<Warning>) {
        // Images are independent; the ordered collect restores submission order.
        let outcomes: Vec<Outcome> = images.par_iter().map(|image| self.check(image)).collect();

        let mut bound: Vec<Vec<BoundEvidence>> = vec![Vec::new(); self.findings.len()];
        let mut dropped = vec![0usize; self.findings.len()];
        let mut warnings = Vec::new();

        for outcome in outcomes {
            match outcome {
                Outcome::Bound(target, evidence) => {
                    let full = self
                        .limits
                        .max_per_finding
                        .is_some_and(|max| bound[target].len() >= max);
                    if full {
                        dropped[target] += 1;
                    } else {
                        bound[target].push(evidence);
                    }
                }
                Outcome::Orphan(err) => {
                    tracing::warn!(%err, "evidence dropped");
                    warnings.extend(err.into_warning());
                }
                Outcome::Dropped(warning) => {
                    tracing::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        for (idx, count) in dropped.into_iter().enumerate() {
            if count > 0 {
                let warning = Warning::EvidenceTruncated {
                    finding: self.findings[idx]
                        .source_ids
                        .first()
                        .cloned()
                        .unwrap_or_default(),
                    kept: bound[idx].len(),
                    dropped: count,
                };
                tracing::warn!("{}", warning);
                warnings.push(warning);
            }
        }

        (bound, warnings)
    }
}

/// Attach evidence to `findings` in place and return the warnings raised.
pub fn bind_evidence(
    findings: &mut [MergedFinding],
    images: &[EvidenceImage],
    limits: EvidenceLimits,
) -> Vec<Warning> {
    let (bound, warnings) = EvidenceBinder::new(findings, limits).bind(images);
    for (finding, evidence) in findings.iter_mut().zip(bound) {
        finding.evidence = evidence;
    }
    warnings
}
