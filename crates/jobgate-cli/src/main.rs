//! jobgate - terminal client for the job board.
//!
//! Signs a job seeker/admin and a company in side by side and shows which
//! routes each combination of sessions may reach.

mod app;

use std::io;
use std::path::Path;

use anyhow::{anyhow, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use jobgate_core::{Config, Decision, IdentityKind};

/// Set to write logs to a daily file in the cache directory as well
const LOG_FILE_ENV: &str = "JOBGATE_LOG_FILE";

const USAGE: &str = "\
Usage: jobgate <command>

Commands:
  status                         Show both sessions
  login <user|company> [email]   Sign in
  signup <user|company>          Create an account (does not sign in)
  logout <user|company|all>      Sign out
  check <path>                   Show the guard decision for a route
  routes                         Print the route table";

enum Command {
    Status,
    Login(IdentityKind, Option<String>),
    Signup(IdentityKind),
    Logout(Vec<IdentityKind>),
    Check(String),
    Routes,
}

fn parse_kind(arg: Option<&String>) -> Result<IdentityKind> {
    let arg = arg.ok_or_else(|| anyhow!("Missing identity kind (user or company)"))?;
    IdentityKind::parse(arg).ok_or_else(|| anyhow!("Unknown identity kind: {}", arg))
}

fn parse_command(args: &[String]) -> Result<Command> {
    let command = args.first().map(String::as_str).unwrap_or("status");
    match command {
        "status" => Ok(Command::Status),
        "login" => Ok(Command::Login(parse_kind(args.get(1))?, args.get(2).cloned())),
        "signup" => Ok(Command::Signup(parse_kind(args.get(1))?)),
        "logout" => match args.get(1).map(String::as_str) {
            None | Some("all") => Ok(Command::Logout(IdentityKind::ALL.to_vec())),
            Some(_) => Ok(Command::Logout(vec![parse_kind(args.get(1))?])),
        },
        "check" => {
            let path = args.get(1).ok_or_else(|| anyhow!("Missing route path"))?;
            Ok(Command::Check(path.clone()))
        }
        "routes" => Ok(Command::Routes),
        other => Err(anyhow!("Unknown command: {}\n\n{}", other, USAGE)),
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing(cache_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match cache_dir.filter(|_| std::env::var_os(LOG_FILE_ENV).is_some()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "jobgate.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    };

    let cache_dir = config.cache_dir().ok();
    let _log_guard = init_tracing(cache_dir.as_deref());
    info!("jobgate starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if matches!(args.first().map(String::as_str), Some("-h" | "--help" | "help")) {
        println!("{}", USAGE);
        return Ok(());
    }
    let command = parse_command(&args)?;

    let mut app = App::new(config)?;

    match command {
        Command::Check(path) => {
            // Guard runs alongside rehydration, as a page would on startup
            let (decision, _) = tokio::join!(app.navigate(&path), app.rehydrate());
            match decision {
                Decision::Render => println!("{}: render", path),
                Decision::Redirect(to) => println!("{}: redirect to {}", path, to),
                Decision::Wait => warn!(path = %path, "Sessions never settled"),
            }
        }
        Command::Routes => {
            println!("{}", serde_json::to_string_pretty(&app.config.routes)?);
        }
        Command::Status => {
            app.rehydrate().await;
            app.print_status();
        }
        Command::Login(kind, email) => {
            app.rehydrate().await;
            app.login(kind, email).await?;
        }
        Command::Signup(kind) => {
            app.rehydrate().await;
            app.signup(kind).await?;
        }
        Command::Logout(kinds) => {
            app.rehydrate().await;
            app.logout(&kinds);
        }
    }

    info!("jobgate shutting down");
    Ok(())
}
