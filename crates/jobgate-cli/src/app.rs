//! Application state for the terminal client.
//!
//! Holds the configuration and one session controller per identity kind,
//! and acts as the route boundary: it re-runs the guard every time either
//! session publishes a new snapshot until the guard stops saying WAIT.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use jobgate_core::{
    active_identity, ApiClient, CompanyProfile, CompanySignup, Config, Credentials, Decision,
    IdentityKind, SessionController, UserProfile, UserRole, UserSignup,
};

pub struct App {
    pub config: Config,
    pub user: SessionController<UserProfile>,
    pub company: SessionController<CompanyProfile>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let store = config.credential_store()?;
        let api = Arc::new(ApiClient::new(&config.api_base_url)?);
        debug!(url = %api.base_url(), backend = ?config.credential_backend, "Client configured");

        Ok(Self::with_sessions(
            config,
            SessionController::new(store.clone(), api.clone()),
            SessionController::new(store, api),
        ))
    }

    pub fn with_sessions(
        config: Config,
        user: SessionController<UserProfile>,
        company: SessionController<CompanyProfile>,
    ) -> Self {
        Self {
            config,
            user,
            company,
        }
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Rehydrate both sessions concurrently
    pub async fn rehydrate(&self) -> (bool, bool) {
        tokio::join!(self.user.rehydrate(), self.company.rehydrate())
    }

    /// Re-evaluate the route guard on every session change until it settles
    pub async fn navigate(&self, path: &str) -> Decision {
        let mut user_rx = self.user.subscribe();
        let mut company_rx = self.company.subscribe();

        loop {
            let user = user_rx.borrow_and_update().clone();
            let company = company_rx.borrow_and_update().clone();
            let decision = self
                .config
                .routes
                .decide(path, &user, &company, &self.config.redirects);
            if !decision.is_wait() {
                return decision;
            }

            debug!(path, "Waiting for sessions to settle");
            let changed = tokio::select! {
                r = user_rx.changed() => r,
                r = company_rx.changed() => r,
            };
            if changed.is_err() {
                return decision;
            }
        }
    }

    pub fn print_status(&self) {
        let user = self.user.snapshot();
        let company = self.company.snapshot();

        match user.profile() {
            Some(p) => println!("User:    {} <{}> ({})", p.name, p.email, p.role.display_name()),
            None => println!("User:    signed out"),
        }
        match company.profile() {
            Some(p) => {
                let industry = p.industry.as_deref().unwrap_or("no industry listed");
                println!("Company: {} <{}> ({})", p.name, p.email, industry);
            }
            None => println!("Company: signed out"),
        }
        match active_identity(&user, &company) {
            Some(kind) => println!("Acting as: {}", kind.display_name()),
            None => println!("Acting as: nobody"),
        }
    }

    // =========================================================================
    // Login / Signup / Logout
    // =========================================================================

    pub async fn login(&mut self, kind: IdentityKind, email: Option<String>) -> Result<()> {
        let email = match email {
            Some(email) => email,
            None => prompt_with_default("Email", self.config.last_email(kind))?,
        };
        if email.is_empty() {
            return Err(anyhow!("Email required"));
        }
        let password = rpassword::prompt_password("Password: ")?;
        let credentials = Credentials::new(email.clone(), password);

        println!("\nAuthenticating...");
        match kind {
            IdentityKind::User => {
                let profile = self.user.login(&credentials).await?;
                println!("Signed in as {} ({})", profile.name, profile.role.display_name());
            }
            IdentityKind::Company => {
                let profile = self.company.login(&credentials).await?;
                println!("Signed in as {}", profile.name);
            }
        }

        self.config.set_last_email(kind, email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
        Ok(())
    }

    pub async fn signup(&self, kind: IdentityKind) -> Result<()> {
        let name = prompt("Name")?;
        let email = prompt("Email")?;
        let password = rpassword::prompt_password("Password: ")?;
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(anyhow!("Name, email and password required"));
        }

        match kind {
            IdentityKind::User => {
                let role = prompt_with_default("Role (seeker/admin)", Some("seeker"))?;
                let role = UserRole::parse(&role).ok_or_else(|| anyhow!("Unknown role: {}", role))?;
                self.user
                    .signup(&UserSignup {
                        name,
                        email,
                        password,
                        role,
                    })
                    .await?;
            }
            IdentityKind::Company => {
                let industry = optional(prompt("Industry (optional)")?);
                let website = optional(prompt("Website (optional)")?);
                self.company
                    .signup(&CompanySignup {
                        name,
                        email,
                        password,
                        industry,
                        website,
                    })
                    .await?;
            }
        }

        info!(%kind, "Account created");
        println!("Account created. Sign in with `jobgate login {}`.", kind);
        Ok(())
    }

    pub fn logout(&self, kinds: &[IdentityKind]) {
        for kind in kinds {
            match kind {
                IdentityKind::User => self.user.logout(),
                IdentityKind::Company => self.company.logout(),
            }
            println!("{} signed out", kind.display_name());
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_with_default(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(default) => {
            let input = prompt(&format!("{} [{}]", label, default))?;
            Ok(if input.is_empty() { default.to_string() } else { input })
        }
        None => prompt(label),
    }
}

fn optional(input: String) -> Option<String> {
    if input.is_empty() {
        None
    } else {
        Some(input)
    }
}
