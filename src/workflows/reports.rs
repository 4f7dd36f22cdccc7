// Reports workflow: export selected reports as standalone PTRAC files and
// import PTRAC files as new reports under a chosen client.

use std::path::{Path, PathBuf};

use anyhow::Result as AnyResult;
use serde_json::Value;
use tracing::{debug, error, info};

use super::clients_reports::ptrac_report_name;
use crate::auth::Auth;
use crate::error::{MigrateError, Result};
use crate::model::{ClientListing, ReportListing};
use crate::pagination::{get_all_clients, get_all_reports};
use crate::ui::{prompts, App};
use crate::utils::{create_directory, find_project_root, json_object_type, sanitize_file_name, JsonObjectType};

const TITLE_CARD: &str = "\
Reports Workflow
------------------------------------------------------------------

This workflow imports/exports reports. Reports are exported as PTRAC files,
which can be reimported under a client later.

- Export reports
  - select which reports to export
- Import reports
  - select PTRAC files of reports to import
  - select an existing client to import the reports to
";

#[derive(Debug, Default)]
pub struct ReportExportSummary {
    pub files: Vec<PathBuf>,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct ReportImportSummary {
    pub imported: usize,
    pub failed: usize,
}

/// Download one report's PTRAC and write it to
/// `<out_dir>/<name>_<id>_<time>.ptrac`.
pub fn export_report_ptrac(
    auth: &mut Auth,
    report: &ReportListing,
    out_dir: &Path,
    script_time: &str,
) -> Result<PathBuf> {
    let ptrac = auth
        .client()?
        .export_report_to_ptrac(&report.client_id(), &report.id())?;
    let file_name = sanitize_file_name(&format!("{}_{}_{}.ptrac", report.name, report.id(), script_time));
    let path = out_dir.join(file_name);
    std::fs::write(&path, serde_json::to_vec(&ptrac)?)?;
    info!("Created report PTRAC {}", path.display());
    Ok(path)
}

pub fn export_reports(
    auth: &mut Auth,
    selected: &[ReportListing],
    out_dir: &Path,
    script_time: &str,
) -> Result<ReportExportSummary> {
    create_directory(out_dir)?;
    let mut summary = ReportExportSummary::default();
    for report in selected {
        match export_report_ptrac(auth, report, out_dir, script_time) {
            Ok(path) => summary.files.push(path),
            Err(e) => {
                error!(error = %e, "Could not download ptrac for report '{}', skipping...", report.name);
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

/// Load a PTRAC file, rejecting anything that does not look like one.
pub fn load_ptrac(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&raw).map_err(|e| MigrateError::InvalidFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    match json_object_type(&doc) {
        Some(JsonObjectType::Ptrac) => Ok(doc),
        other => Err(MigrateError::InvalidFile {
            path: path.to_path_buf(),
            reason: match other {
                Some(kind) => format!("expected a PTRAC, found a {} document", kind),
                None => "not a PTRAC document".into(),
            },
        }),
    }
}

/// Import every PTRAC in `paths` as a new report under `client`.
pub fn import_reports(
    auth: &mut Auth,
    paths: &[PathBuf],
    client: &ClientListing,
) -> Result<ReportImportSummary> {
    let client_id = client.id();
    let mut summary = ReportImportSummary::default();
    for path in paths {
        let ptrac = match load_ptrac(path) {
            Ok(ptrac) => ptrac,
            Err(e) => {
                error!(error = %e, "Skipping invalid report PTRAC file '{}'...", path.display());
                summary.failed += 1;
                continue;
            }
        };
        match auth.client()?.import_ptrac_report(&client_id, &ptrac) {
            Ok(_) => {
                info!(
                    "Created report '{}' for client '{}'",
                    ptrac_report_name(&ptrac),
                    client.name
                );
                summary.imported += 1;
            }
            Err(e) => {
                error!(error = %e, "Could not create report from '{}'. Skipping...", path.display());
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

pub fn start(app: &mut App) -> AnyResult<()> {
    prompts::clear_screen()?;
    debug!("starting workflow 'reports'");
    println!("{}", TITLE_CARD);

    let actions = ["import reports", "export reports", "main menu"];
    match prompts::select("Would you like to import or export reports", &actions)? {
        0 => import(app),
        1 => export(app),
        _ => Ok(()),
    }
}

fn export(app: &mut App) -> AnyResult<()> {
    let session = app.session()?;

    let spinner = prompts::spinner("Loading reports from instance...")?;
    let reports = get_all_reports(session.auth.client()?);
    spinner.finish_and_clear();
    let reports = reports?;
    if reports.is_empty() {
        error!("Did not find any reports in the instance. Returning to main menu");
        return prompts::pause();
    }

    let labels: Vec<String> = reports.iter().map(ReportListing::label).collect();
    let picked = prompts::select_at_least_one("Select reports to export", &labels)?;
    let selected: Vec<ReportListing> = picked.into_iter().map(|i| reports[i].clone()).collect();
    println!("Selected {} report(s)\n", selected.len());

    let out_dir = session.config.report_ptrac_dir();
    let summary = export_reports(session.auth, &selected, &out_dir, session.script_time)?;
    info!(
        exported = summary.files.len(),
        failed = summary.failed,
        "Finished exporting reports to {}",
        out_dir.display()
    );
    prompts::pause()
}

fn import(app: &mut App) -> AnyResult<()> {
    let session = app.session()?;

    let ptrac_dir = session.config.report_ptrac_dir();
    let initial_dir = if ptrac_dir.is_dir() {
        ptrac_dir
    } else {
        let cwd = std::env::current_dir()?;
        find_project_root(&cwd).unwrap_or(cwd)
    };
    let paths = prompts::pick_files(session.config, "Select report PTRAC files", "ptrac", &initial_dir)?;
    println!("Selected {} PTRAC file(s)\n", paths.len());
    if paths.is_empty() {
        return Ok(());
    }

    let spinner = prompts::spinner("Loading clients from instance...")?;
    let clients = get_all_clients(session.auth.client()?);
    spinner.finish_and_clear();
    let clients = clients?;
    if clients.is_empty() {
        error!("Did not find any clients in the instance. Returning to main menu");
        return prompts::pause();
    }

    let labels: Vec<String> = clients.iter().map(ClientListing::label).collect();
    let client = &clients[prompts::select("Select the client to import reports into", &labels)?];
    println!("Selected '{}'\n", client.name);
    println!("All selected PTRACs will be imported as new reports under the selected client.");

    let spinner = prompts::spinner("Importing reports from file(s)...")?;
    let summary = import_reports(session.auth, &paths, client);
    spinner.finish_and_clear();
    let summary = summary?;
    info!(
        imported = summary.imported,
        failed = summary.failed,
        "Finished importing reports"
    );
    prompts::pause()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_ptrac_accepts_ptrac_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.ptrac");
        let doc = json!({
            "report_info": {"name": "R"}, "flaws_array": [], "summary": {},
            "evidence": [], "client_info": {}, "procedures": []
        });
        std::fs::write(&path, doc.to_string()).unwrap();
        assert_eq!(load_ptrac(&path).unwrap(), doc);
    }

    #[test]
    fn load_ptrac_rejects_other_documents() {
        let dir = tempfile::tempdir().unwrap();
        let client = dir.path().join("client.ptrac");
        std::fs::write(
            &client,
            json!({"doc_type": "client", "poc": "", "poc_email": "", "users": []}).to_string(),
        )
        .unwrap();
        let err = load_ptrac(&client).unwrap_err();
        assert!(err.to_string().contains("found a client document"), "{}", err);

        let garbage = dir.path().join("garbage.ptrac");
        std::fs::write(&garbage, "not json").unwrap();
        assert!(matches!(load_ptrac(&garbage), Err(MigrateError::InvalidFile { .. })));
    }
}
