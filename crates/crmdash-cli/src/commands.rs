use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crmdash_core::auth::StoredToken;
use crmdash_core::{
    ApiClient, AuthError, Config, Credentials, Route, RouteDecision, SessionManager, NAVIGATION,
};

const ENV_USERNAME: &str = "CRMDASH_USERNAME";
const ENV_PASSWORD: &str = "CRMDASH_PASSWORD";

pub const USAGE: &str = "\
Usage: crmdash <command>

Commands:
  login [username]   Log in and keep the session token
  logout             Forget the session token
  whoami             Show the logged-in user
  status             Show the session state
  open <path>        Check a dashboard route against the session
  nav                List the dashboard sections
  get <path>         Fetch a CRM API resource with the session token
  help               Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: Option<String> },
    Logout,
    Whoami,
    Status,
    Open { path: String },
    Nav,
    Get { path: String },
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut args = args.iter().map(String::as_str);
        let command = match args.next() {
            None | Some("help" | "-h" | "--help") => Command::Help,
            Some("login") => Command::Login {
                username: args.next().map(str::to_string),
            },
            Some("logout") => Command::Logout,
            Some("whoami") => Command::Whoami,
            Some("status") => Command::Status,
            Some("nav") => Command::Nav,
            Some("open") => Command::Open {
                path: args.next().context("open needs a path, e.g. /contacts")?.to_string(),
            },
            Some("get") => Command::Get {
                path: args.next().context("get needs an API path, e.g. contacts/")?.to_string(),
            },
            Some(other) => anyhow::bail!("Unknown command '{}'", other),
        };

        if let Some(extra) = args.next() {
            anyhow::bail!("Unexpected argument '{}'", extra);
        }
        Ok(command)
    }
}

/// Config plus the session built from it
struct App {
    config: Config,
    manager: SessionManager,
}

impl App {
    fn build() -> Result<Self> {
        let mut config = Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        });
        config.apply_env()?;
        debug!(api_url = config.api_url(), storage = ?config.storage, "Config loaded");

        let api = ApiClient::with_timeout(config.api_url(), config.timeout())
            .context("Failed to build HTTP client")?;
        let store = config.token_store()?;
        let manager = SessionManager::new(api, store);

        Ok(Self { config, manager })
    }
}

pub async fn run(command: Command) -> Result<()> {
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut app = App::build()?;

    match command {
        Command::Login { username } => login(&mut app, username).await,
        Command::Logout => {
            app.manager.logout().await;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => {
            match app.manager.restore().await {
                Some(user) => {
                    println!("{}", user.display_name());
                    println!("{}", serde_json::to_string_pretty(&user)?);
                }
                None => println!("Not logged in."),
            }
            Ok(())
        }
        Command::Status => status(&app).await,
        Command::Open { path } => {
            app.manager.restore().await;
            match app.manager.route(&path).await {
                RouteDecision::Render(route) => println!("{} ({})", route, route.path()),
                RouteDecision::Redirect { to, from } => {
                    println!("{} requires login - redirecting to {} ({})", from, to, to.path())
                }
            }
            Ok(())
        }
        Command::Nav => {
            app.manager.restore().await;
            let session = app.manager.session().await;
            for route in NAVIGATION {
                let marker = if crmdash_core::guard(&session, route).is_redirect() {
                    "locked"
                } else {
                    "open"
                };
                println!("{:<10} {:<12} {}", route.label(), route.path(), marker);
            }
            Ok(())
        }
        Command::Get { path } => {
            app.manager.restore().await;
            match app.manager.get_json(&path).await {
                Ok(value) => {
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    Ok(())
                }
                Err(AuthError::NotAuthenticated) => {
                    anyhow::bail!("Not logged in. Run `crmdash login` first.")
                }
                Err(e) => Err(e).with_context(|| format!("GET {} failed", path)),
            }
        }
        Command::Help => Ok(()),
    }
}

async fn login(app: &mut App, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| std::env::var(ENV_USERNAME).ok()) {
        Some(username) => username,
        None => prompt_username(app.config.last_username.as_deref())?,
    };
    let password = match std::env::var(ENV_PASSWORD) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ")?,
    };

    println!("Authenticating...");
    let session = app.manager.login(&Credentials::new(&username, password)).await?;

    app.config.last_username = Some(username);
    if let Err(e) = app.config.save() {
        warn!(error = %e, "Failed to save config");
    }

    let name = session
        .user()
        .map(|u| u.display_name())
        .unwrap_or_default();
    println!("Logged in as {}.", name);
    Ok(())
}

async fn status(app: &App) -> Result<()> {
    let stored = app.manager.store().load().ok().flatten();
    let user = app.manager.restore().await;
    let session = app.manager.session().await;

    println!("API:      {}", app.config.api_url());
    println!("Storage:  {}", app.manager.store().location());
    println!("Status:   {:?}", session.status());
    if let Some(ref user) = user {
        println!("User:     {}", user.display_name());
    }
    println!("Token:    {}", token_summary(user.is_some(), stored.as_ref()));
    println!("Landing:  {}", app.manager.route(Route::Dashboard.path()).await.target());
    Ok(())
}

/// One-line token state for `status`. A stored token with no user means the
/// profile fetch failed for some reason (rejected, timeout, unreachable).
fn token_summary(verified: bool, stored: Option<&StoredToken>) -> String {
    match (verified, stored) {
        (true, Some(stored)) => format!("saved {}", stored.age_display()),
        (false, Some(_)) => "could not be verified, cleared".to_string(),
        _ => "none".to_string(),
    }
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}
