//! Console application state and view flow.
//!
//! Two views mirror the organizer pages: `Login` offers auto-login from a
//! persisted session, and `Admin` is guarded on every entry. Navigation
//! is driven entirely by gate outcomes; the gate itself never redirects.

use std::io::{self, Write};

use anyhow::Result;
use tracing::{error, info, warn};

use evekuru_core::{
    ApiClient, ApiError, AuthGate, AuthOutcome, AutoLogin, Config, FileStore, MemoryStore,
    SessionRecord, SessionStore,
};

/// Persistent store file inside the data directory
const STORE_FILE: &str = "store.json";

/// Which "page" the organizer is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Login,
    Admin,
    Quitting,
}

/// Build the dual-scope session store: an in-memory scope for this
/// process and the shared file-backed scope under the data directory.
pub fn build_session_store(config: &Config) -> Result<SessionStore> {
    let data_dir = config.data_dir()?;
    let persistent = FileStore::open(data_dir.join(STORE_FILE));
    Ok(SessionStore::new(
        Box::new(MemoryStore::new()),
        Box::new(persistent),
    ))
}

pub struct App {
    config: Config,
    store: SessionStore,
    api: Option<ApiClient>,
    view: View,
    // Env-provided credentials are consumed on the first attempt only,
    // so a rejected login falls back to interactive prompts
    env_event_id: Option<String>,
    env_passcode: Option<String>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let store = build_session_store(&config)?;

        let api_url = std::env::var("EVEKURU_API_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .or_else(|| config.api_url.clone());
        let api = match api_url {
            Some(url) => Some(ApiClient::new(url)?),
            None => None,
        };

        let env_event_id = std::env::var("EVEKURU_EVENT_ID")
            .ok()
            .filter(|id| !id.is_empty());
        let env_passcode = std::env::var("EVEKURU_PASSCODE")
            .ok()
            .filter(|p| !p.is_empty());

        Ok(Self {
            config,
            store,
            api,
            view: View::Login,
            env_event_id,
            env_passcode,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.view {
                View::Login => self.run_login_view().await?,
                View::Admin => self.run_admin_view()?,
                View::Quitting => return Ok(()),
            }
        }
    }

    /// The login view first offers to skip itself: a valid persisted
    /// session resumes straight into the admin view.
    async fn run_login_view(&mut self) -> Result<()> {
        match AuthGate::check_auto_login(&self.store)? {
            AutoLogin::Resume(record) => {
                println!("Welcome back - resuming \"{}\"", record.event_name);
                self.view = View::Admin;
                return Ok(());
            }
            AutoLogin::Stay => {}
        }

        let api = match self.api {
            Some(ref api) => api.clone(),
            None => {
                println!("No endpoint configured. Set EVEKURU_API_URL or api_url in the config file.");
                self.view = View::Quitting;
                return Ok(());
            }
        };

        println!();
        println!("=== evekuru organizer login ===");

        let event_id = match self.env_event_id.take() {
            Some(id) => id,
            None => match self.prompt_event_id()? {
                Some(id) => id,
                None => {
                    self.view = View::Quitting;
                    return Ok(());
                }
            },
        };
        let passcode = match self.env_passcode.take() {
            Some(passcode) => passcode,
            None => Self::prompt_passcode()?,
        };

        println!("Signing in...");
        match api.login(&event_id, &passcode).await {
            Ok(record) => {
                self.store.save(&record)?;

                self.config.last_event_id = Some(event_id);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                info!(event = %record.event_name, "Login successful");
                println!("Signed in to \"{}\"", record.event_name);
                self.view = View::Admin;
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                println!("{}", friendly_login_error(&e));
                // Stay on the login view; the next pass prompts again
            }
        }
        Ok(())
    }

    /// Every entry into the admin view runs the guard; an expired or
    /// missing session bounces back to the login view.
    fn run_admin_view(&mut self) -> Result<()> {
        let record = match AuthGate::guard(&self.store)? {
            AuthOutcome::Authenticated(record) => record,
            AuthOutcome::Unauthenticated => {
                println!("Session missing or expired - please sign in again.");
                self.view = View::Login;
                return Ok(());
            }
        };

        println!();
        println!("=== {} ===", record.event_name);
        println!("Commands: info, reload, logout, help, quit");

        loop {
            print!("> ");
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 {
                // stdin closed
                self.view = View::Quitting;
                return Ok(());
            }

            match input.trim() {
                "info" => self.print_session_info(&record)?,
                "reload" => {
                    // Re-enter the view so the guard runs again
                    return Ok(());
                }
                "logout" => {
                    self.store.clear()?;
                    info!("Signed out");
                    println!("Signed out.");
                    self.view = View::Login;
                    return Ok(());
                }
                "help" => println!("Commands: info, reload, logout, help, quit"),
                "quit" | "q" => {
                    self.view = View::Quitting;
                    return Ok(());
                }
                "" => {}
                other => println!("Unknown command: {} (try help)", other),
            }
        }
    }

    fn print_session_info(&self, record: &SessionRecord) -> Result<()> {
        println!("Event:  {}", record.event_name);
        println!("Sheet:  {}", record.sheet_id);
        println!("Export: {}", record.export_id);
        if let Some(persisted) = self.store.read_persistent()? {
            let minutes = persisted.minutes_until_expiry();
            println!("Session valid for another {}h {:02}m", minutes / 60, minutes % 60);
        }
        Ok(())
    }

    /// Prompt for the event ID. The last used ID is offered as the
    /// default; `q` (or an empty line with no default) quits.
    fn prompt_event_id(&self) -> Result<Option<String>> {
        let default = self.config.last_event_id.clone();
        match default {
            Some(ref last) => print!("Event ID [{}] (q to quit): ", last),
            None => print!("Event ID (q to quit): "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if input == "q" {
            return Ok(None);
        }
        if input.is_empty() {
            return Ok(default);
        }
        Ok(Some(input.to_string()))
    }

    fn prompt_passcode() -> Result<String> {
        let passcode = rpassword::prompt_password("Passcode: ")?;
        Ok(passcode)
    }
}

/// Map an API failure onto something an organizer can act on.
fn friendly_login_error(e: &anyhow::Error) -> String {
    if let Some(api) = e.downcast_ref::<ApiError>() {
        return match api {
            ApiError::Unauthorized => "Event ID or passcode was not accepted.".to_string(),
            ApiError::Rejected(message) => format!("Sign-in refused: {}", message),
            ApiError::NetworkError(_) => {
                "Unable to reach the server. Check your internet connection.".to_string()
            }
            other => format!("Sign-in failed: {}", other),
        };
    }
    format!("Sign-in failed: {}", e)
}
