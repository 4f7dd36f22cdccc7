// Evidence endpoints for the assets affected by a finding.

use serde_json::Value;

use super::ApiClient;
use crate::error::Result;

/// The ids that locate a finding. Evidence calls hang off one finding.
#[derive(Debug, Clone, Copy)]
pub struct FindingRef<'a> {
    pub tenant_id: &'a str,
    pub client_id: &'a str,
    pub report_id: &'a str,
    pub finding_id: &'a str,
}

impl FindingRef<'_> {
    fn bulk_evidence_path(&self) -> String {
        format!(
            "/api/v2/tenant/{}/client/{}/report/{}/finding/{}/asset/evidence",
            self.tenant_id, self.client_id, self.report_id, self.finding_id
        )
    }
}

impl ApiClient {
    /// GET the scanner output recorded for one asset of a finding.
    pub fn get_scanner_output(&self, finding: FindingRef<'_>, asset_id: &str) -> Result<Value> {
        let path = format!(
            "/api/v1/client/{}/report/{}/flaw/{}/asset/{}/scanoutput",
            finding.client_id, finding.report_id, finding.finding_id, asset_id
        );
        Ok(self.get("Get Scanner Output", &path)?.json)
    }

    /// Deprecated by the platform in favour of [`ApiClient::get_scanner_output`]
    /// but still the only way to pull evidence for several assets at once.
    pub fn bulk_get_evidence(&self, finding: FindingRef<'_>, payload: &Value) -> Result<Value> {
        Ok(self.post("Bulk Get Evidence", &finding.bulk_evidence_path(), payload)?.json)
    }

    pub fn update_evidence(
        &self,
        finding: FindingRef<'_>,
        asset_id: &str,
        evidence_id: &str,
        payload: &Value,
    ) -> Result<Value> {
        let path = format!(
            "/api/v2/client/{}/report/{}/finding/{}/asset/{}/evidence/{}",
            finding.client_id, finding.report_id, finding.finding_id, asset_id, evidence_id
        );
        Ok(self.put("Update Evidence", &path, payload)?.json)
    }

    /// Insert evidence in bulk without attaching it to an affected asset.
    /// Each item's `id` must be an existing or new UUID.
    pub fn bulk_upsert_evidence(&self, finding: FindingRef<'_>, payload: &Value) -> Result<Value> {
        Ok(self.put("Bulk Upsert Evidence", &finding.bulk_evidence_path(), payload)?.json)
    }
}
