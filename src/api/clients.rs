// Client endpoints.

use serde_json::Value;

use super::{ApiClient, ApiResponse};
use crate::error::Result;
use crate::pagination::PageRequest;

impl ApiClient {
    /// GET /api/v1/client/list. Unpaginated; returns the raw array.
    pub fn list_clients(&self) -> Result<Value> {
        Ok(self.get("List Clients", "/api/v1/client/list")?.json)
    }

    /// POST /api/v2/clients with a pagination window.
    pub fn list_clients_page(&self, page: &PageRequest) -> Result<ApiResponse> {
        self.post("List Clients Page", "/api/v2/clients", page)
    }

    /// GET /api/v1/client/{client_id}. Returns the full client document,
    /// including `doc_type`, `poc` and `users`.
    pub fn get_client(&self, client_id: &str) -> Result<Value> {
        let path = format!("/api/v1/client/{}", client_id);
        Ok(self.get("Get Client", &path)?.json)
    }

    /// POST /api/v1/client/create. The response carries the new `client_id`.
    pub fn create_client(&self, payload: &Value) -> Result<Value> {
        Ok(self.post("Create Client", "/api/v1/client/create", payload)?.json)
    }
}
