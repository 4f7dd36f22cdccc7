// Shared fixtures: a mock instance that accepts logins, and documents
// shaped like the ones the platform exports.

#![allow(dead_code)]

use std::time::Duration;

use ptrac_migrate::api::ApiClient;
use ptrac_migrate::auth::Auth;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "tok-1";
pub const TENANT: u64 = 7;

/// Mock server with the login endpoint mounted.
pub async fn instance() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "token": TOKEN,
            "tenant_id": TENANT,
            "mfa_enabled": false
        })))
        .mount(&server)
        .await;
    server
}

/// Logged-in handler. Must run off the async runtime (inside
/// `spawn_blocking`) since it drives the blocking client.
pub fn login(uri: &str, retries: u32, lifetime: Duration) -> Auth {
    let api = ApiClient::builder(uri).retries(retries).build().expect("client");
    let mut auth = Auth::new(api, "analyst@example.test", lifetime);
    auth.login("hunter2", || panic!("no MFA expected")).expect("login");
    auth
}

pub fn logged_in(uri: &str) -> Auth {
    login(uri, 0, Duration::from_secs(840))
}

pub fn client_doc(id: u64, name: &str) -> Value {
    json!({
        "client_id": id,
        "cuid": format!("cuid-{}", id),
        "tenant_id": TENANT,
        "name": name,
        "doc_type": "client",
        "poc": "Jane Doe",
        "poc_email": "jane@example.test",
        "users": [{ "email": "jane@example.test" }],
        "logo": null,
        "tags": ["retainer"]
    })
}

pub fn ptrac_doc(name: &str) -> Value {
    json!({
        "report_info": { "name": name },
        "flaws_array": [{ "title": "XSS" }],
        "summary": {},
        "evidence": [],
        "client_info": {},
        "procedures": []
    })
}

pub fn page(data: Vec<Value>, total: usize) -> Value {
    json!({ "data": data, "meta": { "pagination": { "total": total } } })
}
