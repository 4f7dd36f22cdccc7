// Library root
// -----------
// The binary (`main.rs`) only loads configuration, sets up logging and
// hands control to `ui`. Everything else lives here so the transfer logic
// can be exercised without a terminal.
//
// Module responsibilities:
// - `api`: one blocking client per instance, one method per endpoint.
// - `auth`: login, MFA and session refresh on top of `api`.
// - `pagination`: walks the v2 list endpoints page by page.
// - `archive`: packs and unpacks client ZIPs.
// - `workflows`: the export/import flows behind each menu entry.
// - `ui`: menus, prompts and spinners.
// - `config`, `logging`, `error`, `model`, `utils`: supporting pieces.
pub mod api;
pub mod archive;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod pagination;
pub mod ui;
pub mod utils;
pub mod workflows;

pub use error::{MigrateError, Result};
