// General helpers shared by the workflows: file naming, JSON document
// sniffing and directory handling.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;

const CLIENT_KEYS: &[&str] = &["poc", "poc_email", "users", "doc_type"];
const REPORT_KEYS: &[&str] = &[
    "template",
    "fields_template",
    "reviewers",
    "operators",
    "includeEvidence",
];
const PTRAC_KEYS: &[&str] = &[
    "report_info",
    "flaws_array",
    "summary",
    "evidence",
    "client_info",
    "procedures",
];

/// Kinds of documents the platform exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonObjectType {
    Client,
    Report,
    Ptrac,
}

impl fmt::Display for JsonObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonObjectType::Client => "client",
            JsonObjectType::Report => "report",
            JsonObjectType::Ptrac => "ptrac",
        };
        f.write_str(name)
    }
}

/// Work out what a loaded JSON document is from its characteristic keys.
/// Checked in the order client, report, ptrac.
pub fn json_object_type(value: &Value) -> Option<JsonObjectType> {
    let obj = value.as_object()?;
    if has_keys(obj, CLIENT_KEYS) && obj.get("doc_type").and_then(Value::as_str) == Some("client") {
        return Some(JsonObjectType::Client);
    }
    if has_keys(obj, REPORT_KEYS) {
        return Some(JsonObjectType::Report);
    }
    if has_keys(obj, PTRAC_KEYS) {
        return Some(JsonObjectType::Ptrac);
    }
    None
}

fn has_keys(obj: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().all(|k| obj.contains_key(*k))
}

/// Render an id the way it should appear in a URL path or file name.
pub fn id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Replace characters that are not allowed in file names on common
/// filesystems. The result is never empty.
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Create a directory (and parents). An existing directory is fine.
pub fn create_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        debug!(path = %path.display(), "directory already exists");
        return Ok(());
    }
    std::fs::create_dir_all(path)?;
    debug!(path = %path.display(), "created directory");
    Ok(())
}

/// Walk up from `start` until a directory containing `.git` is found.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Timestamp fixed once per run and embedded in every exported file name,
/// so files from one run sort together.
pub fn script_time() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client_doc() -> Value {
        json!({
            "name": "Acme", "client_id": 1, "doc_type": "client",
            "poc": "Jane", "poc_email": "jane@acme.test", "users": []
        })
    }

    #[test]
    fn detects_client_documents() {
        assert_eq!(json_object_type(&client_doc()), Some(JsonObjectType::Client));
    }

    #[test]
    fn client_keys_with_other_doc_type_are_not_a_client() {
        let mut doc = client_doc();
        doc["doc_type"] = json!("report");
        assert_eq!(json_object_type(&doc), None);
    }

    #[test]
    fn detects_report_and_ptrac_documents() {
        let report = json!({
            "template": "", "fields_template": "", "reviewers": [],
            "operators": [], "includeEvidence": false
        });
        assert_eq!(json_object_type(&report), Some(JsonObjectType::Report));

        let ptrac = json!({
            "report_info": {"name": "R"}, "flaws_array": [], "summary": {},
            "evidence": [], "client_info": {}, "procedures": []
        });
        assert_eq!(json_object_type(&ptrac), Some(JsonObjectType::Ptrac));
    }

    #[test]
    fn non_objects_have_no_type() {
        assert_eq!(json_object_type(&json!([1, 2])), None);
        assert_eq!(json_object_type(&json!("client")), None);
    }

    #[test]
    fn sanitizes_reserved_characters() {
        assert_eq!(sanitize_file_name("Acme: Q1/Q2 <draft>?.zip"), "Acme_ Q1_Q2 _draft__.zip");
        assert_eq!(sanitize_file_name("tab\there"), "tab_here");
        assert_eq!(sanitize_file_name("trailing dots... "), "trailing dots");
        assert_eq!(sanitize_file_name(" .. "), "unnamed");
    }

    #[test]
    fn ids_render_without_quotes() {
        assert_eq!(id_to_string(&json!(17)), "17");
        assert_eq!(id_to_string(&json!("abc")), "abc");
        assert_eq!(id_to_string(&Value::Null), "");
    }

    #[test]
    fn project_root_is_found_from_nested_dir() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join(".git")).unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).as_deref(), Some(root.path()));
    }

    #[test]
    fn create_directory_tolerates_existing() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("exports").join("zips");
        create_directory(&dir).unwrap();
        create_directory(&dir).unwrap();
        assert!(dir.is_dir());
    }
}
