// Configuration: `config.yaml` plus a few environment overrides.
//
// Lookup order:
// 1. the file named by `PTMIGRATE_CONFIG`
// 2. `./config.yaml`
// 3. `<user config dir>/ptrac-migrate/config.yaml`
// 4. built-in defaults
//
// `PTMIGRATE_INSTANCE_URL`, `PTMIGRATE_USERNAME` and `PTMIGRATE_PASSWORD`
// win over whatever the file says.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{MigrateError, Result};

pub const CONFIG_ENV: &str = "PTMIGRATE_CONFIG";
const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub instance_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,

    /// Set to false for instances served over https without valid certs.
    pub verify_ssl: bool,
    /// Times a failed request is retried before the last error is returned.
    pub retries: u32,
    pub timeout_secs: u64,
    pub session_lifetime_secs: u64,

    pub console_log_level: String,
    pub file_log_level: String,
    pub save_logs_to_file: bool,
    pub log_dir: PathBuf,

    pub export_dir: PathBuf,
    pub file_dialog: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instance_url: None,
            username: None,
            password: None,
            verify_ssl: true,
            retries: 0,
            timeout_secs: 60,
            session_lifetime_secs: 840,
            console_log_level: "info".into(),
            file_log_level: "debug".into(),
            save_logs_to_file: false,
            log_dir: PathBuf::from("logs"),
            export_dir: PathBuf::from("exported_data"),
            file_dialog: true,
        }
    }
}

impl Config {
    /// Load configuration following the lookup order in the module docs.
    /// Returns the config and the file it came from, if any.
    pub fn load() -> Result<(Self, Option<PathBuf>)> {
        let mut candidates = Vec::new();
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(explicit);
            if !path.is_file() {
                return Err(MigrateError::Config(format!(
                    "{} points to '{}' which does not exist",
                    CONFIG_ENV,
                    path.display()
                )));
            }
            candidates.push(path);
        }
        candidates.push(PathBuf::from(CONFIG_FILE_NAME));
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("ptrac-migrate").join(CONFIG_FILE_NAME));
        }

        let found = candidates.into_iter().find(|p| p.is_file());
        let mut config = match &found {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok((config, found))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MigrateError::Config(format!("could not read '{}': {}", path.display(), e))
        })?;
        Self::from_yaml_str(&raw)
            .map_err(|e| MigrateError::Config(format!("'{}': {}", path.display(), e)))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        // An empty file deserializes to `null`, which we treat as all defaults.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PTMIGRATE_INSTANCE_URL") {
            self.instance_url = Some(url);
        }
        if let Some(user) = lookup("PTMIGRATE_USERNAME") {
            self.username = Some(user);
        }
        if let Some(pass) = lookup("PTMIGRATE_PASSWORD") {
            self.password = Some(pass);
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session_lifetime_secs)
    }

    pub fn client_zip_dir(&self) -> PathBuf {
        self.export_dir.join("client_ZIPs")
    }

    pub fn report_ptrac_dir(&self) -> PathBuf {
        self.export_dir.join("report_PTRACs")
    }

    pub fn report_template_dir(&self) -> PathBuf {
        self.export_dir.join("report_templates")
    }
}

/// Turn whatever the operator typed into a base URL the API paths can be
/// appended to: scheme added when missing, trailing slashes removed.
pub fn normalize_instance_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
