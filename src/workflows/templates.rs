// Report templates workflow: save the tenant's report templates as JSON
// files and recreate them under the tenant of the current session.

use std::path::{Path, PathBuf};

use anyhow::Result as AnyResult;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::auth::Auth;
use crate::error::{MigrateError, Result};
use crate::ui::{prompts, App};
use crate::utils::{create_directory, find_project_root, id_to_string, sanitize_file_name};

/// Fields tying a template to its source tenant.
const TEMPLATE_FIELDS_TO_STRIP: &[&str] = &["id", "tenant_id", "doc_id", "doc_type"];

const TITLE_CARD: &str = "\
Report Templates Workflow
------------------------------------------------------------------

This workflow exports the report templates of the current tenant as JSON
files, and creates report templates from such files.
";

#[derive(Debug, Default)]
pub struct TemplateSummary {
    pub files: Vec<PathBuf>,
    pub created: usize,
    pub failed: usize,
}

/// The listing comes back either as a bare array or wrapped in `data`, and
/// each entry is either the template itself or `{ id, data: template }`.
/// Returns `(id, template)` pairs.
fn unwrap_templates(listing: Value) -> Vec<(String, Value)> {
    let items = match listing {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|item| {
            let id = item
                .get("id")
                .or_else(|| item.get("doc_id"))
                .map(id_to_string)
                .unwrap_or_default();
            let nested = item.get("data").filter(|d| d.is_object()).cloned();
            (id, nested.unwrap_or(item))
        })
        .collect()
}

pub fn export_templates(auth: &mut Auth, out_dir: &Path, script_time: &str) -> Result<TemplateSummary> {
    let tenant_id = auth.tenant_id()?.to_string();
    let listing = auth.client()?.list_report_templates(&tenant_id)?;
    create_directory(out_dir)?;

    let mut summary = TemplateSummary::default();
    for (id, template) in unwrap_templates(listing) {
        let name = template
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("template");
        let path = out_dir.join(sanitize_file_name(&format!("{}_{}_{}.json", name, id, script_time)));
        match serde_json::to_vec_pretty(&template)
            .map_err(MigrateError::from)
            .and_then(|bytes| std::fs::write(&path, bytes).map_err(MigrateError::from))
        {
            Ok(()) => {
                info!("Saved report template '{}' to {}", name, path.display());
                summary.files.push(path);
            }
            Err(e) => {
                error!(error = %e, "Could not save report template '{}', skipping...", name);
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

/// Load a template file and turn it into a create payload.
pub fn load_template(path: &Path) -> Result<Value> {
    let invalid = |reason: String| MigrateError::InvalidFile {
        path: path.to_path_buf(),
        reason,
    };
    let raw = std::fs::read_to_string(path)?;
    let mut doc: Value = serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))?;
    let obj = doc
        .as_object_mut()
        .ok_or_else(|| invalid("expected a JSON object".into()))?;
    if !obj.get("name").map(Value::is_string).unwrap_or(false) {
        return Err(invalid("template has no name".into()));
    }
    for field in TEMPLATE_FIELDS_TO_STRIP {
        obj.remove(*field);
    }
    Ok(doc)
}

pub fn import_templates(auth: &mut Auth, paths: &[PathBuf]) -> Result<TemplateSummary> {
    let tenant_id = auth.tenant_id()?.to_string();
    let mut summary = TemplateSummary::default();
    for path in paths {
        let payload = match load_template(path) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Skipping invalid template file '{}'...", path.display());
                summary.failed += 1;
                continue;
            }
        };
        match auth.client()?.create_report_template(&tenant_id, &payload) {
            Ok(_) => {
                info!("Created report template '{}'", payload["name"].as_str().unwrap_or_default());
                summary.created += 1;
            }
            Err(e) => {
                error!(error = %e, "Could not create template from '{}'. Skipping...", path.display());
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

pub fn start(app: &mut App) -> AnyResult<()> {
    prompts::clear_screen()?;
    debug!("starting workflow 'report templates'");
    println!("{}", TITLE_CARD);

    let actions = ["import report templates", "export report templates", "main menu"];
    let choice = prompts::select("Would you like to import or export report templates", &actions)?;
    if choice > 1 {
        return Ok(());
    }

    let session = app.session()?;
    let dir = session.config.report_template_dir();
    if choice == 1 {
        let summary = export_templates(session.auth, &dir, session.script_time)?;
        info!(
            exported = summary.files.len(),
            failed = summary.failed,
            "Finished exporting report templates to {}",
            dir.display()
        );
        return prompts::pause();
    }

    let initial_dir = if dir.is_dir() {
        dir
    } else {
        let cwd = std::env::current_dir()?;
        find_project_root(&cwd).unwrap_or(cwd)
    };
    let paths = prompts::pick_files(session.config, "Select report template files", "json", &initial_dir)?;
    if paths.is_empty() {
        return Ok(());
    }
    let summary = import_templates(session.auth, &paths)?;
    info!(created = summary.created, failed = summary.failed, "Finished importing report templates");
    prompts::pause()
}
