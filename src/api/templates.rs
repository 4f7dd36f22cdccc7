// Report template endpoints. Templates are scoped to a tenant.

use serde_json::Value;

use super::ApiClient;
use crate::error::Result;

impl ApiClient {
    pub fn list_report_templates(&self, tenant_id: &str) -> Result<Value> {
        let path = format!("/api/v1/tenant/{}/report-templates", tenant_id);
        Ok(self.get("List Report Templates", &path)?.json)
    }

    pub fn create_report_template(&self, tenant_id: &str, payload: &Value) -> Result<Value> {
        let path = format!("/api/v1/tenant/{}/report-template", tenant_id);
        Ok(self.post("Create Report Template", &path, payload)?.json)
    }
}
