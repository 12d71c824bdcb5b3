//! Pointer bundle export.
//!
//! Packs the pointer files of a plan, with their subtitles, into a zip archive
//! laid out relative to the pointer root, so a library can be dropped onto a
//! media server without touching the remote storage.

use crate::models::plan::{OperationKind, Plan, PlanMode};
use crate::services::storage::Storage;
use crate::utils::path as spath;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const MANIFEST_NAME: &str = "manifest.json";

/// Bundle manifest, stored as `manifest.json` inside the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub version: String,
    pub created_at: String,
    pub target_root: String,
    pub pointers: usize,
    pub subtitles: usize,
    /// Archive paths, in plan order.
    pub entries: Vec<String>,
}

/// Write the pointers and subtitle copies of a pointer plan into `zip_path`.
///
/// Subtitle content is read from `source`.
pub async fn export_pointer_bundle(
    plan: &Plan,
    source: &dyn Storage,
    zip_path: &Path,
) -> Result<BundleManifest> {
    if plan.mode != PlanMode::Pointer {
        return Err(Error::InvalidPlanFile(format!(
            "only pointer plans can be exported, got a {} plan",
            plan.mode
        )));
    }

    let root = spath::normalize(&plan.target_root);
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    let mut pointers = 0;
    let mut subtitles = 0;

    for op in &plan.operations {
        let relative = spath::strip_root(&op.destination, &root)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                Error::InvalidPlanFile(format!("{} is outside {}", op.destination, root))
            })?
            .to_string();

        let content = match op.kind {
            OperationKind::CreatePointer => {
                pointers += 1;
                op.content.clone().unwrap_or_default().into_bytes()
            }
            OperationKind::Copy => {
                subtitles += 1;
                source.read(&op.source).await?
            }
            OperationKind::Move => continue,
        };
        files.push((relative, content));
    }

    if let Some(parent) = zip_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(zip_path)?;
    let mut zip = ZipWriter::new(file);
    let zip_options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in &files {
        zip.start_file(name.as_str(), zip_options)?;
        zip.write_all(content)?;
    }

    let manifest = BundleManifest {
        version: env!("CARGO_PKG_VERSION").to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        target_root: root,
        pointers,
        subtitles,
        entries: files.into_iter().map(|(name, _)| name).collect(),
    };
    zip.start_file(MANIFEST_NAME, zip_options)?;
    zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;
    zip.finish()?;

    tracing::info!(
        "Exported {} pointers and {} subtitles to {}",
        pointers,
        subtitles,
        zip_path.display()
    );
    Ok(manifest)
}

/// Read the manifest of a bundle.
pub fn read_manifest(zip_path: &Path) -> Result<BundleManifest> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut manifest_file = archive.by_name(MANIFEST_NAME)?;
    let mut content = String::new();
    manifest_file.read_to_string(&mut content)?;
    Ok(serde_json::from_str(&content)?)
}

/// Generate a bundle filename with timestamp.
pub fn auto_filename() -> String {
    format!(
        "strm_bundle_{}.zip",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    )
}
