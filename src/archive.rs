// Client ZIP packaging.
//
// A client ZIP holds the client document as `<name>_<id>_<time>.json` and
// one `<report>_<id>_<time>.ptrac` per report exported with it. On the way
// back in, entries are recognised by content (see
// `utils::json_object_type`) rather than by file name, so ZIPs
// assembled by hand work as long as the documents are intact.

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{MigrateError, Result};
use crate::model::ReportListing;
use crate::utils::{id_to_string, json_object_type, sanitize_file_name, JsonObjectType};

/// A report picked for export together with its PTRAC, if the download
/// worked. Reports without a PTRAC are left out of the ZIP.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub listing: ReportListing,
    pub ptrac: Option<Value>,
}

/// Contents recovered from a client ZIP.
#[derive(Debug, Clone)]
pub struct ClientArchive {
    pub client: Value,
    pub ptracs: Vec<Value>,
}

fn client_base_name(client: &Value, script_time: &str) -> String {
    let name = client.get("name").and_then(Value::as_str).unwrap_or("client");
    let id = client.get("client_id").map(id_to_string).unwrap_or_default();
    format!("{}_{}_{}", name, id, script_time)
}

/// Write `<dir>/<name>_<id>_<time>.zip` and return its path.
pub fn create_client_zip(
    client: &Value,
    reports: &[ExportedReport],
    dir: &Path,
    script_time: &str,
) -> Result<PathBuf> {
    let base = client_base_name(client, script_time);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file(sanitize_file_name(&format!("{}.json", base)), options)?;
    zip.write_all(&serde_json::to_vec(client)?)?;

    let mut packed = 0usize;
    for report in reports {
        let Some(ptrac) = &report.ptrac else {
            debug!(report = %report.listing.name, "no ptrac downloaded, leaving report out of zip");
            continue;
        };
        let entry = sanitize_file_name(&format!(
            "{}_{}_{}.ptrac",
            report.listing.name,
            report.listing.id(),
            script_time
        ));
        zip.start_file(entry, options)?;
        zip.write_all(&serde_json::to_vec(ptrac)?)?;
        packed += 1;
    }

    let buffer = zip.finish()?.into_inner();
    let path = dir.join(sanitize_file_name(&format!("{}.zip", base)));
    std::fs::write(&path, buffer)?;
    info!(reports = packed, "created client ZIP {}", path.display());
    Ok(path)
}

/// Read a client ZIP back. Fails if the archive cannot be read, if any
/// `.json`/`.ptrac` entry is not valid JSON, or if no client document is
/// found.
pub fn extract_client_zip(path: &Path) -> Result<ClientArchive> {
    let invalid = |reason: String| MigrateError::InvalidArchive {
        path: path.to_path_buf(),
        reason,
    };

    let file = std::fs::File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| invalid(e.to_string()))?;

    let mut client = None;
    let mut ptracs = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| invalid(e.to_string()))?;
        let name = entry.name().to_string();
        if !(name.ends_with(".json") || name.ends_with(".ptrac")) {
            continue;
        }
        let mut raw = String::new();
        entry.read_to_string(&mut raw)?;
        let doc: Value = serde_json::from_str(&raw)
            .map_err(|e| invalid(format!("entry '{}' is not valid JSON: {}", name, e)))?;

        match json_object_type(&doc) {
            Some(JsonObjectType::Client) => client = Some(doc),
            Some(JsonObjectType::Ptrac) => ptracs.push(doc),
            other => debug!(entry = %name, kind = ?other, "ignoring zip entry"),
        }
    }

    let client = client.ok_or_else(|| invalid("no client JSON found".into()))?;
    Ok(ClientArchive { client, ptracs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> Value {
        json!({
            "name": "Acme/Corp", "client_id": 12, "doc_type": "client",
            "poc": "Jane", "poc_email": "jane@acme.test", "users": []
        })
    }

    fn ptrac(name: &str) -> Value {
        json!({
            "report_info": {"name": name}, "flaws_array": [], "summary": {},
            "evidence": [], "client_info": {}, "procedures": []
        })
    }

    fn listing(id: u64, name: &str) -> ReportListing {
        ReportListing {
            id: json!(id),
            name: name.into(),
            client_id: json!(12),
            tags: vec![],
        }
    }

    fn entry_names(path: &Path) -> Vec<String> {
        let mut archive = ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn zip_contains_client_and_downloaded_ptracs_only() {
        let dir = tempfile::tempdir().unwrap();
        let reports = vec![
            ExportedReport { listing: listing(1, "Q1"), ptrac: Some(ptrac("Q1")) },
            ExportedReport { listing: listing(2, "Q2"), ptrac: None },
        ];
        let path = create_client_zip(&client(), &reports, dir.path(), "20260101_000000").unwrap();

        assert_eq!(path.file_name().unwrap(), "Acme_Corp_12_20260101_000000.zip");
        assert_eq!(
            entry_names(&path),
            vec!["Acme_Corp_12_20260101_000000.json", "Q1_1_20260101_000000.ptrac"]
        );

        let back = extract_client_zip(&path).unwrap();
        assert_eq!(back.client, client());
        assert_eq!(back.ptracs, vec![ptrac("Q1")]);
    }

    #[test]
    fn zip_without_client_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports_only.zip");
        let mut zip = ZipWriter::new(std::fs::File::create(&path).unwrap());
        zip.start_file("r.ptrac", FileOptions::default()).unwrap();
        zip.write_all(&serde_json::to_vec(&ptrac("R")).unwrap()).unwrap();
        zip.finish().unwrap();

        let err = extract_client_zip(&path).unwrap_err();
        assert!(matches!(err, MigrateError::InvalidArchive { .. }), "got {:?}", err);
    }

    #[test]
    fn unrelated_entries_are_ignored_but_bad_json_is_not() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.zip");
        let mut zip = ZipWriter::new(std::fs::File::create(&path).unwrap());
        zip.start_file("client.json", FileOptions::default()).unwrap();
        zip.write_all(&serde_json::to_vec(&client()).unwrap()).unwrap();
        zip.start_file("notes.txt", FileOptions::default()).unwrap();
        zip.write_all(b"not json at all").unwrap();
        zip.start_file("other.json", FileOptions::default()).unwrap();
        zip.write_all(b"{\"just\": \"data\"}").unwrap();
        zip.finish().unwrap();
        let back = extract_client_zip(&path).unwrap();
        assert!(back.ptracs.is_empty());

        let broken = dir.path().join("broken.zip");
        let mut zip = ZipWriter::new(std::fs::File::create(&broken).unwrap());
        zip.start_file("client.json", FileOptions::default()).unwrap();
        zip.write_all(b"{ truncated").unwrap();
        zip.finish().unwrap();
        assert!(matches!(
            extract_client_zip(&broken),
            Err(MigrateError::InvalidArchive { .. })
        ));
    }

    #[test]
    fn non_zip_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.zip");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(matches!(
            extract_client_zip(&path),
            Err(MigrateError::InvalidArchive { .. })
        ));
    }
}
