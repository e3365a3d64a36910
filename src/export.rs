use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::casing;
use crate::records::{AttendanceRecord, GradeRecord, PaymentRecord, Student, Subject};

const MANIFEST_ENTRY: &str = "manifest.json";
const STUDENTS_ENTRY: &str = "catalog/students.json";
const SUBJECTS_ENTRY: &str = "catalog/subjects.json";
const ATTENDANCE_ENTRY: &str = "records/attendance.json";
const GRADES_ENTRY: &str = "records/grades.json";
const PAYMENTS_ENTRY: &str = "records/payments.json";
pub const BUNDLE_FORMAT_V1: &str = "aula-snapshot-v1";

/// Everything a snapshot carries. Record dumps inside the bundle use the
/// external underscore_case convention; this struct is the camelCase side.
#[derive(Debug, Clone, Default)]
pub struct SnapshotData {
    pub students: Vec<Student>,
    pub subjects: Vec<Subject>,
    pub attendance: Vec<AttendanceRecord>,
    pub grades: Vec<GradeRecord>,
    pub payments: Vec<PaymentRecord>,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

fn external_json<T: serde::Serialize>(value: &T) -> anyhow::Result<Vec<u8>> {
    let camel = serde_json::to_value(value).context("failed to serialize snapshot payload")?;
    let snake = casing::keys_to_snake(&camel);
    Ok(serde_json::to_string_pretty(&snake)
        .context("failed to render snapshot payload")?
        .into_bytes())
}

pub fn export_snapshot(data: &SnapshotData, out_path: &Path) -> anyhow::Result<ExportSummary> {
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

    let entries: Vec<(&str, Vec<u8>)> = vec![
        (STUDENTS_ENTRY, external_json(&data.students)?),
        (SUBJECTS_ENTRY, external_json(&data.subjects)?),
        (ATTENDANCE_ENTRY, external_json(&data.attendance)?),
        (GRADES_ENTRY, external_json(&data.grades)?),
        (PAYMENTS_ENTRY, external_json(&data.payments)?),
    ];

    let mut checksums = serde_json::Map::new();
    for (name, bytes) in &entries {
        checksums.insert(name.to_string(), json!(sha256_hex(bytes)));
    }
    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "checksums": checksums,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for (name, bytes) in &entries {
        zip.start_file(*name, opts)
            .with_context(|| format!("failed to start entry {}", name))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write entry {}", name))?;
    }
    zip.finish().context("failed to finalize snapshot bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: entries.len() + 1,
    })
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    archive
        .by_name(name)
        .with_context(|| format!("bundle missing {}", name))?
        .read_to_end(&mut bytes)
        .with_context(|| format!("failed to read {}", name))?;
    Ok(bytes)
}

fn parse_entry<T: serde::de::DeserializeOwned>(bytes: &[u8], name: &str) -> anyhow::Result<T> {
    let external: serde_json::Value =
        serde_json::from_slice(bytes).with_context(|| format!("{} is invalid JSON", name))?;
    let camel = casing::keys_to_camel(&external);
    serde_json::from_value(camel).with_context(|| format!("{} has an unexpected shape", name))
}

pub fn import_snapshot(in_path: &Path) -> anyhow::Result<SnapshotData> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let manifest_bytes = read_entry(&mut archive, MANIFEST_ENTRY)?;
    let manifest: serde_json::Value =
        serde_json::from_slice(&manifest_bytes).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let mut load = |name: &str| -> anyhow::Result<Vec<u8>> {
        let bytes = read_entry(&mut archive, name)?;
        if let Some(expected) = manifest
            .get("checksums")
            .and_then(|c| c.get(name))
            .and_then(|v| v.as_str())
        {
            let actual = sha256_hex(&bytes);
            if actual != expected {
                return Err(anyhow!("checksum mismatch for {}", name));
            }
        }
        Ok(bytes)
    };

    let students = parse_entry(&load(STUDENTS_ENTRY)?, STUDENTS_ENTRY)?;
    let subjects = parse_entry(&load(SUBJECTS_ENTRY)?, SUBJECTS_ENTRY)?;
    let attendance = parse_entry(&load(ATTENDANCE_ENTRY)?, ATTENDANCE_ENTRY)?;
    let grades = parse_entry(&load(GRADES_ENTRY)?, GRADES_ENTRY)?;
    let payments = parse_entry(&load(PAYMENTS_ENTRY)?, PAYMENTS_ENTRY)?;

    Ok(SnapshotData {
        students,
        subjects,
        attendance,
        grades,
        payments,
    })
}
