use std::env;
use std::fmt;

use log::{error, info, warn};

use crate::database::Database;
use crate::error::AdminError;
use crate::owners::Owner;

const USERNAME_VAR: &str = "DJANGO_SUPERUSER_USERNAME";
const EMAIL_VAR: &str = "DJANGO_SUPERUSER_EMAIL";
const PASSWORD_VAR: &str = "DJANGO_SUPERUSER_PASSWORD";

const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_EMAIL: &str = "admin@example.com";

#[derive(Clone, PartialEq, Eq)]
pub struct SuperuserConfig {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
}

// Keeps the password out of logs
impl fmt::Debug for SuperuserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuperuserConfig")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SuperuserConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. An empty password counts as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        SuperuserConfig {
            username: lookup(USERNAME_VAR).unwrap_or_else(|| DEFAULT_USERNAME.to_owned()),
            email: lookup(EMAIL_VAR).unwrap_or_else(|| DEFAULT_EMAIL.to_owned()),
            password: lookup(PASSWORD_VAR).filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug)]
pub enum BootstrapOutcome {
    Created(Owner),
    AlreadyExists(String),
    Skipped(String),
    Failed(AdminError),
}

impl BootstrapOutcome {
    /// The line shown to the operator.
    pub fn message(&self) -> String {
        match self {
            BootstrapOutcome::Created(owner) => {
                format!("Superuser \"{}\" created successfully!", owner.username())
            }
            BootstrapOutcome::AlreadyExists(username) => {
                format!("Superuser \"{}\" already exists.", username)
            }
            BootstrapOutcome::Skipped(reason) => reason.clone(),
            BootstrapOutcome::Failed(err) => format!("Error creating superuser: {}", err),
        }
    }
}

/// Creates the superuser described by `config` unless it already exists.
///
/// Never returns an error: a failed insert is reported as `Failed` so that a
/// deploy hook calling this does not abort.
pub fn ensure_superuser(db: &Database, config: &SuperuserConfig, bcrypt_cost: u32) -> BootstrapOutcome {
    let Some(password) = config.password.as_deref() else {
        let reason = format!("{} not set. Skipping superuser creation.", PASSWORD_VAR);
        warn!("{}", reason);
        return BootstrapOutcome::Skipped(reason);
    };

    match Owner::exists(db.conn(), &config.username) {
        Ok(true) => {
            info!("Superuser '{}' already present", config.username);
            return BootstrapOutcome::AlreadyExists(config.username.clone());
        }
        Ok(false) => {}
        Err(err) => {
            error!("Could not check for existing superuser: {}", err);
            return BootstrapOutcome::Failed(err);
        }
    }

    match Owner::create_superuser(db.conn(), &config.username, &config.email, password, bcrypt_cost) {
        Ok(owner) => {
            info!(
                "Created account {} <{}> (id={}, superuser={})",
                owner.username(),
                owner.email(),
                owner.id(),
                owner.is_superuser()
            );
            BootstrapOutcome::Created(owner)
        }
        Err(err) => {
            error!("Superuser creation failed: {}", err);
            BootstrapOutcome::Failed(err)
        }
    }
}
