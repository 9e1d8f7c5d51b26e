//! evekuru organizer console - sign in once, stay signed in for the event day.
//!
//! The console mirrors the two organizer pages of the web app: a login
//! view (with auto-login from a persisted session) and an admin view
//! that is guarded on every entry.

mod app;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use evekuru_core::{AuthGate, AuthOutcome, Config};

use app::App;

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a daily-rolling file under the data directory so they never
/// interleave with the interactive prompts; RUST_LOG controls the level.
/// The returned guard must stay alive for the life of the process.
fn init_tracing(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if let Ok(data_dir) = config.data_dir() {
        let log_dir = data_dir.join("logs");
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let appender = tracing_appender::rolling::daily(log_dir, "evekuru.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            return Some(guard);
        }
    }

    // No usable data directory; fall back to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: could not read config ({}), using defaults", e);
            Config::default()
        }
    };

    let _guard = init_tracing(&config);
    info!("evekuru console starting");

    // Maintenance flags run against the stores and exit without the
    // interactive loop
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--status" {
        return print_status(&config);
    }
    if args.len() > 1 && args[1] == "--logout" {
        return logout(&config);
    }

    let mut app = App::new(config)?;
    let result = app.run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("evekuru console shutting down");
    Ok(())
}

/// Report whether a session would be admitted, exactly as the admin view
/// decides it (a valid persisted session is promoted and extended).
fn print_status(config: &Config) -> Result<()> {
    let store = app::build_session_store(config)?;
    match AuthGate::guard(&store)? {
        AuthOutcome::Authenticated(record) => {
            println!(
                "Signed in to \"{}\" (sheet {})",
                record.event_name, record.sheet_id
            );
            if let Some(persisted) = store.read_persistent()? {
                println!(
                    "Session valid for another {} minutes",
                    persisted.minutes_until_expiry()
                );
            }
        }
        AuthOutcome::Unauthenticated => {
            println!("Not signed in");
        }
    }
    Ok(())
}

fn logout(config: &Config) -> Result<()> {
    let store = app::build_session_store(config)?;
    store.clear()?;
    println!("Signed out");
    Ok(())
}
