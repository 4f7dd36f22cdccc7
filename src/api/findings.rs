// Finding ("flaw") endpoints.

use serde_json::Value;

use super::ApiClient;
use crate::error::Result;

impl ApiClient {
    pub fn list_report_findings(&self, client_id: &str, report_id: &str) -> Result<Value> {
        let path = format!("/api/v1/client/{}/report/{}/flaws", client_id, report_id);
        Ok(self.get("List Report Findings", &path)?.json)
    }

    pub fn get_finding(&self, client_id: &str, report_id: &str, finding_id: &str) -> Result<Value> {
        let path = format!(
            "/api/v1/client/{}/report/{}/flaw/{}",
            client_id, report_id, finding_id
        );
        Ok(self.get("Get Finding", &path)?.json)
    }
}
