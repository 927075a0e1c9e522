// Stored user credentials.
//
// The platform signs in with e-mail and password. They are kept in a small
// JSON file in the user's config directory so that subsequent invocations do
// not prompt again; `sclbl reset` removes the file.

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Password};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

/// Overrides the location of the credentials file.
pub const CREDENTIALS_ENV: &str = "SCLBL_CREDENTIALS";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CredentialStore { path: path.into() }
    }

    /// Location from `SCLBL_CREDENTIALS`, else `<config dir>/sclbl/credentials.json`.
    pub fn from_env() -> Self {
        if let Ok(path) = std::env::var(CREDENTIALS_ENV) {
            if !path.trim().is_empty() {
                return Self::new(path);
            }
        }
        let dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join("sclbl").join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored credentials, or `None` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<Credentials>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let creds = serde_json::from_str(&data)
            .with_context(|| format!("Malformed credentials file {}", self.path.display()))?;
        Ok(Some(creds))
    }

    pub fn save(&self, creds: &Credentials) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let data = serde_json::to_string(creds)?;
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options
            .open(&self.path)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        // `mode` only applies on creation; tighten a file left by an older run.
        #[cfg(unix)]
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict {}", self.path.display()))?;
        file.write_all(data.as_bytes())
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Delete the credentials file. Returns `false` if there was none.
    pub fn remove(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        Ok(true)
    }

    /// Load stored credentials, or ask for them on the terminal and offer to
    /// store them for the next run.
    pub fn load_or_prompt(&self) -> Result<Credentials> {
        if let Some(creds) = self.load()? {
            return Ok(creds);
        }
        let username: String = Input::new()
            .with_prompt("Please provide your username")
            .interact_text()?;
        let password: String = Password::new()
            .with_prompt("Please type your password")
            .interact()?;
        let creds = Credentials { username, password };

        let store = Confirm::new()
            .with_prompt("Would you like us to store your user credentials?")
            .default(true)
            .interact()?;
        if store {
            self.save(&creds)?;
        }
        Ok(creds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_load_remove() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("nested").join("creds.json"));
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.remove().unwrap());

        let creds = Credentials {
            username: "user@example.com".into(),
            password: "secret".into(),
        };
        store.save(&creds).unwrap();
        assert_eq!(store.load().unwrap(), Some(creds));

        assert!(store.remove().unwrap());
        assert!(!store.path().exists());
        assert!(!store.remove().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private_to_the_user() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("creds.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = CredentialStore::new(&path);
        let creds = Credentials {
            username: "user@example.com".into(),
            password: "secret".into(),
        };
        store.save(&creds).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap(), Some(creds));

        fs::remove_file(&path).unwrap();
        store.save(&Credentials {
            username: "a".into(),
            password: "b".into(),
        })
        .unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("creds.json");
        fs::write(&path, "not json").unwrap();
        let store = CredentialStore::new(&path);
        assert!(store.load().is_err());
    }
}
