// Report endpoints, including PTRAC export and import.

use serde_json::Value;

use super::{ApiClient, ApiResponse};
use crate::error::{MigrateError, Result};
use crate::pagination::PageRequest;
use crate::utils::{json_object_type, JsonObjectType};

/// File name sent with PTRAC uploads; the platform only looks at the body.
const PTRAC_UPLOAD_NAME: &str = "report.ptrac";

impl ApiClient {
    /// POST /api/v2/reports with a pagination window.
    pub fn list_reports_page(&self, page: &PageRequest) -> Result<ApiResponse> {
        self.post("List Reports Page", "/api/v2/reports", page)
    }

    pub fn get_report(&self, client_id: &str, report_id: &str) -> Result<Value> {
        let path = format!("/api/v1/client/{}/report/{}", client_id, report_id);
        Ok(self.get("Get Report", &path)?.json)
    }

    /// GET /api/v1/client/{client_id}/report/{report_id}/export/ptrac
    ///
    /// A success answer whose body is not a PTRAC document (a maintenance
    /// page, an empty body) is an `UnexpectedResponse`.
    pub fn export_report_to_ptrac(&self, client_id: &str, report_id: &str) -> Result<Value> {
        let name = "Export Report to Ptrac";
        let path = format!("/api/v1/client/{}/report/{}/export/ptrac", client_id, report_id);
        let ptrac = self.get(name, &path)?.json;
        if json_object_type(&ptrac) != Some(JsonObjectType::Ptrac) {
            return Err(MigrateError::UnexpectedResponse {
                name: name.into(),
                reason: format!("body for report {} is not a PTRAC document", report_id),
            });
        }
        Ok(ptrac)
    }

    /// Create a new report under `client_id` from a PTRAC document. The
    /// document goes up as the `file` field of a multipart form.
    pub fn import_ptrac_report(&self, client_id: &str, ptrac: &Value) -> Result<ApiResponse> {
        let path = format!("/api/v1/client/{}/report/import", client_id);
        let bytes = serde_json::to_vec(ptrac)?;
        self.post_multipart("Import Ptrac Report", &path, "file", PTRAC_UPLOAD_NAME, &bytes)
    }
}
