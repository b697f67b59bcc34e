use anyhow::{anyhow, bail, Context};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config::StoreConfig;
use crate::db::{self, DB_FILE_NAME};

const MANIFEST_ENTRY: &str = "manifest.json";
const DB_ENTRY: &str = "db/rollbook.sqlite3";
const META_WORKSPACE_ENTRY: &str = "meta/workspace.json";
pub const BUNDLE_FORMAT_V1: &str = "rollbook-workspace-v1";
pub const BARE_SQLITE_FORMAT: &str = "bare-sqlite3";

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    format: String,
    version: u32,
    app_version: String,
    exported_at: String,
    #[serde(default)]
    db_sha256: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub db_sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let db_path = db::db_path(workspace_path);
    if !db_path.is_file() {
        bail!(
            "workspace database not found: {}",
            db_path.to_string_lossy()
        );
    }
    let db_bytes = std::fs::read(&db_path)
        .with_context(|| format!("failed to read database {}", db_path.to_string_lossy()))?;
    let db_sha256 = sha256_hex(&db_bytes);

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = Manifest {
        format: BUNDLE_FORMAT_V1.to_string(),
        version: 1,
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        db_sha256: Some(db_sha256.clone()),
    };
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(DB_ENTRY, opts)
        .context("failed to start database entry")?;
    zip.write_all(&db_bytes)
        .context("failed to write database entry")?;

    let workspace_meta = serde_json::json!({
        "sourceWorkspace": workspace_path.to_string_lossy(),
        "dbFile": DB_FILE_NAME,
    });
    zip.start_file(META_WORKSPACE_ENTRY, opts)
        .context("failed to start workspace metadata entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&workspace_meta)
            .context("failed to serialize workspace metadata")?
            .as_bytes(),
    )
    .context("failed to write workspace metadata entry")?;

    zip.finish().context("failed to finalize zip bundle")?;
    info!(out = %out_path.display(), sha256 = %db_sha256, "exported workspace bundle");

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 3,
        db_sha256,
    })
}

/// Restores a bundle (or a bare SQLite file) over the workspace database.
/// The new file is staged next to the target and renamed into place.
pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;

    let (db_bytes, detected) = match sniff(in_path)? {
        InputKind::Zip => (read_bundle(in_path)?, BUNDLE_FORMAT_V1),
        InputKind::Sqlite => {
            let bytes = std::fs::read(in_path).with_context(|| {
                format!("failed to read sqlite file {}", in_path.to_string_lossy())
            })?;
            (bytes, BARE_SQLITE_FORMAT)
        }
        InputKind::Unknown => bail!(
            "not a rollbook bundle or sqlite file: {}",
            in_path.to_string_lossy()
        ),
    };

    let dst = db::db_path(workspace_path);
    let staged = workspace_path.join(format!("{DB_FILE_NAME}.importing"));
    {
        let mut out = File::create(&staged).with_context(|| {
            format!("failed to create temp database {}", staged.to_string_lossy())
        })?;
        out.write_all(&db_bytes)
            .context("failed to write staged database")?;
        out.flush().context("failed to flush staged database")?;
    }
    if let Err(e) = check_staged(&staged) {
        let _ = std::fs::remove_file(&staged);
        return Err(e.context(format!(
            "{} is not a rollbook database",
            in_path.to_string_lossy()
        )));
    }
    std::fs::rename(&staged, &dst).with_context(|| {
        format!(
            "failed to move staged database to {}",
            dst.to_string_lossy()
        )
    })?;
    info!(from = %in_path.display(), bundle_format = detected, "imported workspace database");

    Ok(ImportSummary {
        bundle_format_detected: detected.to_string(),
    })
}

/// Opens the staged copy and repairs grades in it. The workspace file is
/// untouched until this passes.
fn check_staged(staged: &Path) -> anyhow::Result<()> {
    let mut conn =
        db::connect(&StoreConfig::new(staged)).context("failed to open staged database")?;
    db::check_schema(&conn).context("staged database has an incompatible schema")?;
    db::refresh_grades(&mut conn).context("failed to refresh grades in staged database")?;
    Ok(())
}

fn read_bundle(in_path: &Path) -> anyhow::Result<Vec<u8>> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: Manifest =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid")?;
    if manifest.format != BUNDLE_FORMAT_V1 {
        bail!("unsupported bundle format: {}", manifest.format);
    }

    let mut db_bytes = Vec::new();
    archive
        .by_name(DB_ENTRY)
        .with_context(|| format!("bundle missing {DB_ENTRY}"))?
        .read_to_end(&mut db_bytes)
        .context("failed to extract database entry")?;

    if let Some(expected) = manifest.db_sha256.as_deref() {
        let actual = sha256_hex(&db_bytes);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(anyhow!(
                "database checksum mismatch: manifest {expected}, payload {actual}"
            ));
        }
    }
    Ok(db_bytes)
}

enum InputKind {
    Zip,
    Sqlite,
    Unknown,
}

fn sniff(path: &Path) -> anyhow::Result<InputKind> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut head = [0u8; 16];
    let mut filled = 0;
    while filled < head.len() {
        let n = f
            .read(&mut head[filled..])
            .context("failed to read file signature")?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled >= ZIP_MAGIC.len() && head[..ZIP_MAGIC.len()] == ZIP_MAGIC {
        return Ok(InputKind::Zip);
    }
    if filled == SQLITE_MAGIC.len() && &head == SQLITE_MAGIC {
        return Ok(InputKind::Sqlite);
    }
    Ok(InputKind::Unknown)
}
