// Configuration: which Scailable deployment the CLI talks to.
//
// A profile is picked once at startup (deploy-time env var, falling back to
// the value baked in at build time) and resolved to the three service base
// URLs. Nothing here changes after `Settings::load` returns.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable selecting the profile at deploy time.
pub const PROFILE_ENV: &str = "SCLBL_PROFILE";

/// Environment variable enabling debug output of the platform client.
pub const DEBUG_ENV: &str = "SCLBL_DEBUG";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown profile '{0}' (expected production, development or local)")]
    UnknownProfile(String),
}

/// Named deployment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Production,
    Development,
    Local,
}

impl Profile {
    pub fn endpoints(self) -> Endpoints {
        match self {
            Profile::Production => Endpoints {
                user_manager: "https://usermanager.sclbl.net:8008".into(),
                toolchain: "https://toolchain.sclbl.net:8010".into(),
                task_manager: "https://taskmanager.sclbl.net:8080".into(),
            },
            Profile::Development => Endpoints {
                user_manager: "https://dev.usermanager.sclbl.net:8008".into(),
                toolchain: "https://dev.toolchain.sclbl.net:8010".into(),
                task_manager: "https://dev.taskmanager.sclbl.net:8080".into(),
            },
            Profile::Local => Endpoints {
                user_manager: "http://localhost:8008".into(),
                toolchain: "http://localhost:8010".into(),
                task_manager: "http://localhost:8080".into(),
            },
        }
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "live" => Ok(Profile::Production),
            "development" | "develop" | "dev" => Ok(Profile::Development),
            "local" => Ok(Profile::Local),
            _ => Err(ConfigError::UnknownProfile(s.to_string())),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Profile::Production => "production",
            Profile::Development => "development",
            Profile::Local => "local",
        };
        f.write_str(name)
    }
}

/// Base URLs of the three platform services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Account service: sign-in, model/device/assignment records.
    pub user_manager: String,
    /// Model conversion service: uploads and updates.
    pub toolchain: String,
    /// Task execution service.
    pub task_manager: String,
}

/// Process-wide settings, built once and handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub profile: Profile,
    pub debug: bool,
}

impl Settings {
    pub fn new(profile: Profile, debug: bool) -> Self {
        Settings { profile, debug }
    }

    /// Read the profile from `SCLBL_PROFILE` (runtime first, then the value
    /// captured at build time) and the debug switch from `SCLBL_DEBUG`.
    pub fn load() -> Result<Self, ConfigError> {
        let selector = std::env::var(PROFILE_ENV)
            .ok()
            .or_else(|| option_env!("SCLBL_PROFILE").map(str::to_string));
        let debug = std::env::var(DEBUG_ENV)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);
        Self::resolve(selector.as_deref(), debug)
    }

    /// Resolve an optional profile selector. An empty selector means the
    /// default profile; anything unrecognised is an error.
    pub fn resolve(selector: Option<&str>, debug: bool) -> Result<Self, ConfigError> {
        let profile = match selector {
            Some(s) if !s.trim().is_empty() => s.parse()?,
            _ => Profile::default(),
        };
        Ok(Settings::new(profile, debug))
    }

    pub fn endpoints(&self) -> Endpoints {
        self.profile.endpoints()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
