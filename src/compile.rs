// SPDX-License-Identifier: PMPL-1.0-or-later

//! The compilation pipeline: validate, resolve, merge, order, bind, assemble.
//!
//! A pure function of its inputs. The bundle and index are only read, so
//! the same bundle compiled twice yields identical documents.

use crate::assemble::{assemble_document, validate_bundle, DocumentModel};
use crate::config::CompileConfig;
use crate::error::{CompileResult, Warning};
use crate::evidence::bind_evidence;
use crate::knowledge::KnowledgeBaseIndex;
use crate::merge::merge_findings;
use crate::order::order_findings;
use crate::resolve::FindingResolver;
use crate::types::SessionBundle;
use serde::{Deserialize, Serialize};

/// A compiled document plus everything that was adjusted on the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compilation {
    pub document: DocumentModel,
    #[serde(default)]
    pub warnings: Vec<Warning>,
}

pub fn compile(
    bundle: &SessionBundle,
    index: &KnowledgeBaseIndex,
    config: &CompileConfig,
) -> CompileResult<Compilation> {
    validate_bundle(bundle)?;

    let matcher = config.title_matching.matcher();
    let resolver = FindingResolver::new(index, matcher.as_ref());
    let (resolved, mut warnings) = resolver.resolve_all(&bundle.findings);
    tracing::debug!(
        findings = resolved.len(),
        unlisted = resolved.iter().filter(|f| f.is_unlisted()).count(),
        matcher = matcher.name(),
        "findings resolved"
    );

    let (mut merged, merge_warnings) = merge_findings(&resolved, config.status_policy)?;
    warnings.extend(merge_warnings);
    tracing::debug!(groups = merged.len(), "findings merged");

    order_findings(&mut merged);
    warnings.extend(bind_evidence(&mut merged, &bundle.evidence, config.evidence));

    let mut document = assemble_document(&bundle.application, &bundle.inventory, merged)?;
    document.attach_artwork(&bundle.artwork);
    tracing::info!(
        application = %bundle.application.name,
        findings = document.findings.len(),
        evidence = document.evidence_count(),
        warnings = warnings.len(),
        "report compiled"
    );

    Ok(Compilation { document, warnings })
}
