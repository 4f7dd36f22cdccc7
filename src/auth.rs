// Session handling for one instance: log in (with an optional MFA step),
// remember when that happened, and refresh the token once it has been in
// use longer than the configured session lifetime.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::{MigrateError, Result};
use crate::utils::id_to_string;

/// What the authentication menu shows about the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    NotAuthenticated,
    Expired { username: String, base_url: String },
    Active { username: String, tenant_id: String, base_url: String },
}

pub struct Auth {
    api: ApiClient,
    username: String,
    tenant_id: Option<String>,
    authenticated_at: Option<Instant>,
    session_lifetime: Duration,
}

impl Auth {
    pub fn new(api: ApiClient, username: &str, session_lifetime: Duration) -> Self {
        Auth {
            api,
            username: username.to_string(),
            tenant_id: None,
            authenticated_at: None,
            session_lifetime,
        }
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Tenant of the logged-in user. Tenant-scoped endpoints need it.
    pub fn tenant_id(&self) -> Result<&str> {
        if !self.is_authenticated() {
            return Err(MigrateError::NotAuthenticated);
        }
        self.tenant_id
            .as_deref()
            .ok_or_else(|| MigrateError::UnexpectedResponse {
                name: "Authenticate".into(),
                reason: "login response carried no tenant_id, tenant-scoped endpoints are unavailable"
                    .into(),
            })
    }

    /// Log in with the stored username. `mfa_code` is only called when the
    /// instance asks for a second factor.
    pub fn login<F>(&mut self, password: &str, mfa_code: F) -> Result<()>
    where
        F: FnOnce() -> std::io::Result<String>,
    {
        debug!(username = %self.username, base_url = %self.api.base_url(), "authenticating");
        let mut response = self.api.authenticate(&self.username, password)?;

        if response.mfa_enabled {
            let code = response
                .code
                .take()
                .ok_or_else(|| MigrateError::Auth("MFA requested but no MFA code returned".into()))?;
            let user_token = mfa_code()?;
            let tenant_id = response.tenant_id.take();
            response = self.api.authenticate_mfa(&code, user_token.trim())?;
            if response.tenant_id.is_none() {
                response.tenant_id = tenant_id;
            }
        }

        let token = response
            .token
            .ok_or_else(|| MigrateError::Auth("no session token in authentication response".into()))?;
        self.api.set_token(&token);
        self.tenant_id = response
            .tenant_id
            .as_ref()
            .map(id_to_string)
            .filter(|t| !t.is_empty());
        self.authenticated_at = Some(Instant::now());
        info!(
            username = %self.username,
            tenant = self.tenant_id.as_deref().unwrap_or("unknown"),
            "authenticated to {}",
            self.api.base_url()
        );
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated_at.is_some() && self.api.has_token()
    }

    /// True when there is no session or it has outlived the session lifetime.
    pub fn is_expired(&self) -> bool {
        match self.authenticated_at {
            Some(at) => at.elapsed() >= self.session_lifetime,
            None => true,
        }
    }

    /// Swap the current token for a fresh one.
    pub fn refresh(&mut self) -> Result<()> {
        if !self.is_authenticated() {
            return Err(MigrateError::NotAuthenticated);
        }
        let response = self.api.refresh_token().map_err(|e| {
            warn!(error = %e, "token refresh failed");
            MigrateError::SessionExpired
        })?;
        let token = response.token.ok_or(MigrateError::SessionExpired)?;
        self.api.set_token(&token);
        self.authenticated_at = Some(Instant::now());
        debug!(username = %self.username, "session token refreshed");
        Ok(())
    }

    /// The API client with a usable token, refreshing the session first if
    /// it has gone stale.
    pub fn client(&mut self) -> Result<&ApiClient> {
        if !self.is_authenticated() {
            return Err(MigrateError::NotAuthenticated);
        }
        if self.is_expired() {
            self.refresh()?;
        }
        Ok(&self.api)
    }

    pub fn status(&self) -> SessionStatus {
        if !self.is_authenticated() {
            return SessionStatus::NotAuthenticated;
        }
        if self.is_expired() {
            return SessionStatus::Expired {
                username: self.username.clone(),
                base_url: self.api.base_url().to_string(),
            };
        }
        SessionStatus::Active {
            username: self.username.clone(),
            tenant_id: self.tenant_id.clone().unwrap_or_default(),
            base_url: self.api.base_url().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> Auth {
        let api = ApiClient::builder("http://localhost:1").build().unwrap();
        Auth::new(api, "analyst", Duration::from_secs(840))
    }

    #[test]
    fn fresh_handler_is_not_authenticated() {
        let mut auth = auth();
        assert!(!auth.is_authenticated());
        assert!(auth.is_expired());
        assert_eq!(auth.status(), SessionStatus::NotAuthenticated);
        assert!(matches!(auth.client(), Err(MigrateError::NotAuthenticated)));
        assert!(matches!(auth.tenant_id(), Err(MigrateError::NotAuthenticated)));
    }

    #[test]
    fn refresh_requires_a_session() {
        let mut auth = auth();
        assert!(matches!(auth.refresh(), Err(MigrateError::NotAuthenticated)));
    }
}
