//! Privileged store credential, read from the environment
//!
//! Loaded once at process start. A missing credential aborts startup instead
//! of failing each request later.

use crate::error::ConfigError;
use std::fmt;

/// Project the credential belongs to (required)
pub const PROJECT_ID_VAR: &str = "STORE_PROJECT_ID";
/// Service account private key, `\n` escapes allowed (required)
pub const PRIVATE_KEY_VAR: &str = "STORE_PRIVATE_KEY";
/// Service account email (required)
pub const CLIENT_EMAIL_VAR: &str = "STORE_CLIENT_EMAIL";
/// Database URL (optional)
pub const DATABASE_URL_VAR: &str = "STORE_DATABASE_URL";
/// App name for the admin registry (optional)
pub const APP_NAME_VAR: &str = "STORE_APP_NAME";

/// App name used when none is configured
pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";

/// Service account credential
#[derive(Clone, PartialEq, Eq)]
pub struct ServerCredential {
    /// Project id
    pub project_id: String,
    /// PEM private key with real newlines
    pub private_key: String,
    /// Service account email
    pub client_email: String,
}

impl fmt::Debug for ServerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerCredential")
            .field("project_id", &self.project_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .finish()
    }
}

/// Server-side store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Registry name of the admin app
    pub app_name: String,
    /// Privileged credential
    pub credential: ServerCredential,
    /// Database URL, when the deployment needs one
    pub database_url: Option<String>,
}

impl ServerConfig {
    /// Read from the process environment, after loading `.env` if present
    ///
    /// # Errors
    /// `ConfigError` when a required variable is missing or invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary key lookup
    ///
    /// # Errors
    /// `ConfigError` when a required variable is missing or invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_id = env_required(&lookup, PROJECT_ID_VAR)?;
        let private_key = unescape_newlines(&env_required(&lookup, PRIVATE_KEY_VAR)?);
        let client_email = env_required(&lookup, CLIENT_EMAIL_VAR)?;
        if !client_email.contains('@') {
            return Err(ConfigError::Invalid {
                key: CLIENT_EMAIL_VAR,
                reason: format!("'{client_email}' is not an email address"),
            });
        }

        Ok(Self {
            app_name: env_optional(&lookup, APP_NAME_VAR)
                .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            credential: ServerCredential {
                project_id,
                private_key,
                client_email,
            },
            database_url: env_optional(&lookup, DATABASE_URL_VAR),
        })
    }

    /// Replace the app name
    #[must_use]
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }
}

fn env_optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    env_optional(lookup, key).ok_or(ConfigError::Missing { key })
}

fn unescape_newlines(value: &str) -> String {
    value.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn complete() -> Vec<(&'static str, &'static str)> {
        vec![
            (PROJECT_ID_VAR, "folio-prod"),
            (PRIVATE_KEY_VAR, "-----BEGIN KEY-----\\nabc\\n-----END KEY-----"),
            (CLIENT_EMAIL_VAR, "admin@folio-prod.example"),
        ]
    }

    #[test]
    fn reads_required_and_defaults() {
        let config = ServerConfig::from_lookup(lookup(&complete())).unwrap();
        assert_eq!(config.credential.project_id, "folio-prod");
        assert_eq!(
            config.credential.private_key,
            "-----BEGIN KEY-----\nabc\n-----END KEY-----"
        );
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn reads_optional_values() {
        let mut vars = complete();
        vars.push((DATABASE_URL_VAR, "https://folio-prod.db.example"));
        vars.push((APP_NAME_VAR, "worker"));
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(
            config.database_url.as_deref(),
            Some("https://folio-prod.db.example")
        );
        assert_eq!(config.app_name, "worker");
    }

    #[test]
    fn missing_project_id_is_fatal() {
        let vars: Vec<_> = complete()
            .into_iter()
            .filter(|(k, _)| *k != PROJECT_ID_VAR)
            .collect();
        assert_eq!(
            ServerConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::Missing {
                key: PROJECT_ID_VAR
            }
        );
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut vars = complete();
        vars[2] = (CLIENT_EMAIL_VAR, "   ");
        assert_eq!(
            ServerConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::Missing {
                key: CLIENT_EMAIL_VAR
            }
        );
    }

    #[test]
    fn rejects_malformed_email() {
        let mut vars = complete();
        vars[2] = (CLIENT_EMAIL_VAR, "admin");
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { key: CLIENT_EMAIL_VAR, .. })
        ));
    }

    #[test]
    fn debug_hides_private_key() {
        let config = ServerConfig::from_lookup(lookup(&complete())).unwrap();
        let rendered = format!("{config:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("abc"));
    }
}
