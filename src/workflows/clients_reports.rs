// Clients and reports workflow: export clients (optionally with their
// reports) as one ZIP per client, and recreate clients from those ZIPs on
// another instance.

use std::path::{Path, PathBuf};

use anyhow::Result as AnyResult;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::archive::{self, ExportedReport};
use crate::auth::Auth;
use crate::error::{MigrateError, Result};
use crate::model::ClientListing;
use crate::pagination::{get_all_clients, get_all_reports};
use crate::ui::{prompts, App};
use crate::utils::{create_directory, find_project_root, id_to_string, json_object_type, JsonObjectType};

/// Fields of an exported client that belong to the source instance and
/// must not be sent when creating the client elsewhere.
const CLIENT_FIELDS_TO_STRIP: &[&str] = &["cuid", "tenant_id", "client_id", "logo", "doc_type", "users"];

const TITLE_CARD: &str = "\
Clients and Reports Workflow
------------------------------------------------------------------

This workflow imports/exports clients. You can choose whether reports under
a client are moved as well. Each exported client becomes one ZIP file, which
can be reimported into a different instance.

- Export clients
  - select which clients to export
  - choose whether to export reports with the client
- Import clients
  - select client ZIP files to import
  - choose whether to reuse a client that already exists
  - choose whether to import reports with the client
";

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    pub include_reports: bool,
    /// Replace the client's user list with an empty one.
    pub exclude_user_data: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Reuse a client with the same name in the target instance instead of
    /// creating a duplicate.
    pub check_existing: bool,
    pub include_reports: bool,
}

#[derive(Debug, Default)]
pub struct ExportSummary {
    pub archives: Vec<PathBuf>,
    pub failed_clients: usize,
    pub failed_reports: usize,
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub clients_created: usize,
    pub clients_reused: usize,
    pub failed_archives: usize,
    pub reports_imported: usize,
    pub failed_reports: usize,
}

/// Export `selected` clients into `out_dir`, one ZIP each.
///
/// A client whose record cannot be fetched is skipped; a report whose PTRAC
/// cannot be downloaded is left out of its client's ZIP.
pub fn export_clients(
    auth: &mut Auth,
    selected: &[ClientListing],
    options: ExportOptions,
    out_dir: &Path,
    script_time: &str,
) -> Result<ExportSummary> {
    create_directory(out_dir)?;
    let mut summary = ExportSummary::default();

    let reports = if options.include_reports {
        get_all_reports(auth.client()?)?
    } else {
        Vec::new()
    };
    debug!(reports = reports.len(), "loaded report list");

    for listing in selected {
        let client_id = listing.id();
        let mut client = match auth.client()?.get_client(&client_id) {
            Ok(doc) => doc,
            Err(e) => {
                error!(error = %e, "Could not load client '{}', skipping...", listing.name);
                summary.failed_clients += 1;
                continue;
            }
        };
        if json_object_type(&client) != Some(JsonObjectType::Client) {
            warn!(
                "Client '{}' record does not look like a client document; the ZIP may not import",
                listing.name
            );
        }
        if options.exclude_user_data {
            if let Some(obj) = client.as_object_mut() {
                obj.insert("users".into(), Value::Array(Vec::new()));
            }
        }

        let mut exported = Vec::new();
        for report in reports.iter().filter(|r| r.client_id() == client_id) {
            let ptrac = match auth.client()?.export_report_to_ptrac(&client_id, &report.id()) {
                Ok(ptrac) => Some(ptrac),
                Err(e) => {
                    error!(
                        error = %e,
                        "Could not download ptrac for report '{}' under client '{}', skipping...",
                        report.name, listing.name
                    );
                    summary.failed_reports += 1;
                    None
                }
            };
            exported.push(ExportedReport {
                listing: report.clone(),
                ptrac,
            });
        }

        match archive::create_client_zip(&client, &exported, out_dir, script_time) {
            Ok(path) => summary.archives.push(path),
            Err(e) => {
                error!(error = %e, "Could not write ZIP for client '{}', skipping...", listing.name);
                summary.failed_clients += 1;
            }
        }
    }
    Ok(summary)
}

/// Strip source-instance fields from an exported client document so it can
/// be posted to `create_client`.
pub fn client_create_payload(mut client: Value) -> Value {
    if let Some(obj) = client.as_object_mut() {
        for field in CLIENT_FIELDS_TO_STRIP {
            obj.remove(*field);
        }
    }
    client
}

/// Import one client ZIP. Returns `(client_id, created)`; `created` is false
/// when an existing client was reused. Report failures are counted into
/// `summary`; a failure to extract or create the client is returned.
fn import_client_archive(
    auth: &mut Auth,
    path: &Path,
    options: ImportOptions,
    existing: &[ClientListing],
    summary: &mut ImportSummary,
) -> Result<(String, bool)> {
    let contents = archive::extract_client_zip(path)?;
    let payload = client_create_payload(contents.client);
    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let reused = if options.check_existing {
        existing.iter().find(|c| c.name.trim() == name.trim())
    } else {
        None
    };
    let (client_id, created) = match reused {
        Some(found) => {
            info!("Client '{}' already exists with ID {}, importing into it", name, found.id());
            (found.id(), false)
        }
        None => {
            let response = auth.client()?.create_client(&payload)?;
            let id = response
                .get("client_id")
                .map(id_to_string)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| MigrateError::UnexpectedResponse {
                    name: "Create Client".into(),
                    reason: "no client_id in response".into(),
                })?;
            info!("Created client '{}' with ID {}", name, id);
            (id, true)
        }
    };

    if !options.include_reports {
        debug!(skipped = contents.ptracs.len(), "not importing reports");
        return Ok((client_id, created));
    }
    for ptrac in &contents.ptracs {
        let report_name = ptrac_report_name(ptrac);
        match auth.client()?.import_ptrac_report(&client_id, ptrac) {
            Ok(_) => {
                info!("Created report '{}' for client '{}'", report_name, name);
                summary.reports_imported += 1;
            }
            Err(e) => {
                error!(error = %e, "Could not create report '{}'. Skipping...", report_name);
                summary.failed_reports += 1;
            }
        }
    }
    Ok((client_id, created))
}

/// Import every ZIP in `paths`, skipping (and counting) the ones that
/// cannot be read or whose client cannot be created.
pub fn import_client_archives(
    auth: &mut Auth,
    paths: &[PathBuf],
    options: ImportOptions,
) -> Result<ImportSummary> {
    let existing = if options.check_existing {
        get_all_clients(auth.client()?)?
    } else {
        Vec::new()
    };

    let mut summary = ImportSummary::default();
    for path in paths {
        match import_client_archive(auth, path, options, &existing, &mut summary) {
            Ok((_, true)) => summary.clients_created += 1,
            Ok((_, false)) => summary.clients_reused += 1,
            Err(e) => {
                error!(error = %e, "Skipping client ZIP file '{}'...", path.display());
                summary.failed_archives += 1;
            }
        }
    }
    Ok(summary)
}

pub(crate) fn ptrac_report_name(ptrac: &Value) -> &str {
    ptrac
        .pointer("/report_info/name")
        .and_then(Value::as_str)
        .unwrap_or("unnamed report")
}

pub fn start(app: &mut App) -> AnyResult<()> {
    prompts::clear_screen()?;
    debug!("starting workflow 'clients and reports'");
    println!("{}", TITLE_CARD);

    let actions = ["import clients", "export clients", "main menu"];
    match prompts::select("Would you like to import or export clients", &actions)? {
        0 => import(app),
        1 => export(app),
        _ => Ok(()),
    }
}

fn export(app: &mut App) -> AnyResult<()> {
    let session = app.session()?;

    let spinner = prompts::spinner("Loading clients from instance...")?;
    let clients = get_all_clients(session.auth.client()?);
    spinner.finish_and_clear();
    let clients = clients?;
    if clients.is_empty() {
        error!("Did not find any clients in the instance. Returning to main menu");
        return prompts::pause();
    }

    let labels: Vec<String> = clients.iter().map(ClientListing::label).collect();
    let picked = prompts::select_at_least_one("Select clients to export", &labels)?;
    let selected: Vec<ClientListing> = picked.into_iter().map(|i| clients[i].clone()).collect();
    println!("Selected {} client(s)\n", selected.len());

    let flags = prompts::toggles("Export options", &["include client reports", "exclude user data"])?;
    let options = ExportOptions {
        include_reports: flags[0],
        exclude_user_data: flags[1],
    };

    let out_dir = session.config.client_zip_dir();
    let spinner = prompts::spinner("Exporting clients...")?;
    let summary = export_clients(session.auth, &selected, options, &out_dir, session.script_time);
    spinner.finish_and_clear();
    let summary = summary?;

    info!(
        archives = summary.archives.len(),
        failed_clients = summary.failed_clients,
        failed_reports = summary.failed_reports,
        "Finished exporting clients to {}",
        out_dir.display()
    );
    prompts::pause()
}

fn import(app: &mut App) -> AnyResult<()> {
    let session = app.session()?;

    let zip_dir = session.config.client_zip_dir();
    let initial_dir = if zip_dir.is_dir() {
        zip_dir
    } else {
        let cwd = std::env::current_dir()?;
        find_project_root(&cwd).unwrap_or(cwd)
    };
    let paths = prompts::pick_files(session.config, "Select client ZIP files", "zip", &initial_dir)?;
    debug!("selected {} ZIP files", paths.len());
    if paths.is_empty() {
        info!("No ZIP files selected. Returning to main menu");
        return Ok(());
    }

    let flags = prompts::toggles(
        "Import options",
        &["check if client already exists", "include reports"],
    )?;
    let options = ImportOptions {
        check_existing: flags[0],
        include_reports: flags[1],
    };

    let spinner = prompts::spinner("Importing clients from file(s)...")?;
    let summary = import_client_archives(session.auth, &paths, options);
    spinner.finish_and_clear();
    let summary = summary?;

    info!(
        created = summary.clients_created,
        reused = summary.clients_reused,
        failed = summary.failed_archives,
        reports = summary.reports_imported,
        failed_reports = summary.failed_reports,
        "Finished importing clients"
    );
    prompts::pause()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_payload_drops_instance_specific_fields() {
        let client = json!({
            "name": "Acme", "cuid": "c-1", "tenant_id": 3, "client_id": 9,
            "logo": "data:...", "doc_type": "client", "users": [{"id": 1}],
            "poc": "Jane", "poc_email": "jane@acme.test", "tags": ["x"]
        });
        assert_eq!(
            client_create_payload(client),
            json!({ "name": "Acme", "poc": "Jane", "poc_email": "jane@acme.test", "tags": ["x"] })
        );
    }

    #[test]
    fn create_payload_tolerates_missing_fields() {
        assert_eq!(client_create_payload(json!({"name": "Bare"})), json!({"name": "Bare"}));
    }

    #[test]
    fn ptrac_name_falls_back_when_missing() {
        assert_eq!(ptrac_report_name(&json!({"report_info": {"name": "Q1"}})), "Q1");
        assert_eq!(ptrac_report_name(&json!({})), "unnamed report");
    }
}
