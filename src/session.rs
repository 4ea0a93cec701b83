// SPDX-License-Identifier: PMPL-1.0-or-later

//! Session files: the assessor's captured records on disk.
//!
//! Evidence and header artwork are listed by path, relative to the session
//! file, and read into memory when the session is loaded.

use crate::types::{
    Application, EvidenceImage, IpAddressRecord, RawFinding, ReportArtwork, SessionBundle,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub application: Application,
    #[serde(default)]
    pub inventory: Vec<IpAddressRecord>,
    #[serde(default)]
    pub findings: Vec<RawFinding>,
    #[serde(default)]
    pub evidence: Vec<EvidenceRef>,
    #[serde(default)]
    pub artwork: ArtworkRefs,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtworkRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_architecture: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_architecture: Option<PathBuf>,
}

impl ArtworkRefs {
    fn read(&self, base: &Path) -> Result<ReportArtwork> {
        let load = |path: &Option<PathBuf>| -> Result<Option<Vec<u8>>> {
            path.as_deref()
                .map(|path| {
                    let path = resolve_path(base, path);
                    fs::read(&path).with_context(|| format!("reading artwork {}", path.display()))
                })
                .transpose()
        };
        Ok(ReportArtwork {
            logo: load(&self.logo)?,
            system_architecture: load(&self.system_architecture)?,
            mobile_architecture: load(&self.mobile_architecture)?,
        })
    }
}

fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub finding: String,
    #[serde(default)]
    pub caption: String,
    pub path: PathBuf,
}

impl SessionFile {
    /// Read every referenced image, resolving relative paths against `base`.
    pub fn into_bundle(self, base: &Path) -> Result<SessionBundle> {
        let artwork = self.artwork.read(base)?;
        let evidence = self
            .evidence
            .into_iter()
            .map(|item| -> Result<EvidenceImage> {
                let path = resolve_path(base, &item.path);
                let payload = fs::read(&path)
                    .with_context(|| format!("reading evidence {}", path.display()))?;
                let caption = if item.caption.trim().is_empty() {
                    item.path.display().to_string()
                } else {
                    item.caption
                };
                Ok(EvidenceImage::new(item.finding, caption, payload))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SessionBundle {
            application: self.application,
            inventory: self.inventory,
            findings: self.findings,
            evidence,
            artwork,
        })
    }
}

pub fn load_session(path: &Path) -> Result<SessionBundle> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading session {}", path.display()))?;
    let session: SessionFile = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("parsing yaml session {}", path.display()))?,
        _ => serde_json::from_str(&content)
            .with_context(|| format!("parsing json session {}", path.display()))?,
    };
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    session.into_bundle(base)
}
