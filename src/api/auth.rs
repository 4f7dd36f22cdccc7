// Authentication endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiClient;
use crate::error::Result;

#[derive(Serialize, Debug)]
pub struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Second step of an MFA login: `code` is the value handed back by the
/// first step, `token` the one-time code typed by the user.
#[derive(Serialize, Debug)]
pub struct MfaRequest<'a> {
    pub code: &'a str,
    pub token: &'a str,
}

/// Response of both login steps. Every field is optional because the first
/// step of an MFA login carries no token and the platform is not strict
/// about the tenant id's type.
#[derive(Deserialize, Debug, Default)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<Value>,
    #[serde(default)]
    pub mfa_enabled: bool,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

impl ApiClient {
    /// POST /api/v1/authenticate
    pub fn authenticate(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let req = AuthRequest { username, password };
        let res = self.post("Authenticate", "/api/v1/authenticate", &req)?;
        Ok(serde_json::from_value(res.json)?)
    }

    /// POST /api/v1/authenticate/mfa
    pub fn authenticate_mfa(&self, code: &str, token: &str) -> Result<AuthResponse> {
        let req = MfaRequest { code, token };
        let res = self.post("Authenticate MFA", "/api/v1/authenticate/mfa", &req)?;
        Ok(serde_json::from_value(res.json)?)
    }

    /// PUT /api/v1/token/refresh, using the token currently held.
    pub fn refresh_token(&self) -> Result<TokenResponse> {
        let res = self.put("Refresh Token", "/api/v1/token/refresh", &serde_json::json!({}))?;
        Ok(serde_json::from_value(res.json)?)
    }
}
