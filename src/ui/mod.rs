// UI layer: the main menu loop and the authentication flow. Workflows get
// at the session through `App::session`, which logs in on demand.

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::api::ApiClient;
use crate::auth::{Auth, SessionStatus};
use crate::config::Config;
use crate::utils::script_time;
use crate::workflows::{clients_reports, reports, templates};

pub mod prompts;

const BANNER: &[&str] = &[
    "====================================================================",
    "= API Data Backup and Migration                                    =",
    "=------------------------------------------------------------------=",
    "= Gets large amounts of data out of a reporting instance, either   =",
    "= to keep as a backup or to reimport into another instance.        =",
    "====================================================================",
];

const MENU: &[&str] = &[
    "authenticate to instance",
    "clients and reports",
    "reports",
    "report templates",
    "exit",
];

/// State that lives for the whole run: configuration, the current session
/// (if any) and the timestamp stamped on every exported file.
pub struct App {
    pub config: Config,
    pub auth: Option<Auth>,
    pub script_time: String,
}

/// Borrowed view handed to a workflow once a session is available.
pub struct Session<'a> {
    pub config: &'a Config,
    pub auth: &'a mut Auth,
    pub script_time: &'a str,
}

impl App {
    pub fn new(config: Config) -> Self {
        App {
            config,
            auth: None,
            script_time: script_time(),
        }
    }

    /// Current session, authenticating first if there is none.
    pub fn session(&mut self) -> Result<Session<'_>> {
        if self.auth.is_none() {
            info!("Must authenticate to an instance first");
            self.auth = Some(authenticate(&self.config, true)?);
        }
        let auth = self.auth.as_mut().context("no session after authentication")?;
        Ok(Session {
            config: &self.config,
            auth,
            script_time: &self.script_time,
        })
    }
}

/// Entry point of the interactive shell. Blocks until the user exits.
pub fn start(app: &mut App) -> Result<()> {
    prompts::clear_screen()?;
    for line in BANNER {
        println!("{}", line);
    }

    match authenticate(&app.config, true) {
        Ok(auth) => app.auth = Some(auth),
        Err(e) => error!(error = %e, "continuing without a session"),
    }

    main_menu(app)
}

fn main_menu(app: &mut App) -> Result<()> {
    loop {
        println!(
            "\nChoose a workflow. Each workflow exports and imports a different kind of data,\n\
             either for backup or to move it between instances.\n"
        );
        let outcome = match prompts::select("Workflows", MENU)? {
            0 => authentication_controller(app),
            1 => clients_reports::start(app),
            2 => reports::start(app),
            3 => templates::start(app),
            _ => break,
        };
        if let Err(e) = outcome {
            error!(error = %e, "workflow stopped, returning to main menu");
            prompts::pause()?;
        }
    }
    Ok(())
}

fn authentication_controller(app: &mut App) -> Result<()> {
    prompts::clear_screen()?;
    let status = app
        .auth
        .as_ref()
        .map(Auth::status)
        .unwrap_or(SessionStatus::NotAuthenticated);
    match status {
        SessionStatus::NotAuthenticated => info!("Not currently authenticated to an instance"),
        SessionStatus::Expired { username, base_url } => {
            info!("User session for '{}' on '{}' has expired", username, base_url)
        }
        SessionStatus::Active { username, tenant_id, base_url } => info!(
            "User '{}' is authenticated to tenant {} on '{}'",
            username, tenant_id, base_url
        ),
    }

    let switch = prompts::confirm(
        "Authenticate to a different instance? (no keeps the current one, even if expired)",
        app.auth.is_none(),
    )?;
    if switch {
        app.auth = Some(authenticate(&app.config, false)?);
    }
    Ok(())
}

/// Log in, prompting for whatever the config does not supply. With
/// `use_config` false every value is prompted for. Failed attempts can be
/// retried until the user gives up; retries prompt for everything in case
/// the configured values were the problem.
pub fn authenticate(config: &Config, use_config: bool) -> Result<Auth> {
    let mut use_config = use_config;
    loop {
        let preset = |value: &Option<String>| value.clone().filter(|_| use_config);
        let instance = match preset(&config.instance_url) {
            Some(url) => url,
            None => prompts::text("Instance URL")?,
        };
        let username = match preset(&config.username) {
            Some(user) => user,
            None => prompts::text("Username")?,
        };
        let password = match preset(&config.password) {
            Some(pass) => pass,
            None => prompts::password("Password")?,
        };

        let api = ApiClient::from_config(config, &instance)?;
        let mut auth = Auth::new(api, &username, config.session_lifetime());
        match auth.login(&password, || prompts::text("MFA code")) {
            Ok(()) => return Ok(auth),
            Err(e) => {
                error!(error = %e, "could not authenticate to '{}'", auth.base_url());
                if !prompts::confirm("Try again?", true)? {
                    return Err(e).context("authentication abandoned");
                }
                use_config = false;
            }
        }
    }
}
