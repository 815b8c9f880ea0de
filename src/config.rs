use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_path: PathBuf,

    // Web Server
    pub web_host: String,
    pub web_port: u16,
    pub site_url: String,

    // AI Providers
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub grok_api_key: Option<String>,
    pub grok_base_url: String,

    // Research Scraping (Jina Reader proxy)
    pub jina_api_key: Option<String>,
    pub jina_reader_url: String,

    // Google Calendar
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_calendar_id: String,
    pub google_redirect_uri: Option<String>,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_api_base: String,

    // Weekly Generation Scheduler
    pub scheduler_enabled: bool,
    pub scheduler_poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Database
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/calendar.sqlite")),

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,
            site_url: env_or_default("SITE_URL", "http://localhost:8080"),

            // AI Providers
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            anthropic_base_url: env_or_default("ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: env_or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            grok_api_key: optional_env("GROK_API_KEY"),
            grok_base_url: env_or_default("GROK_BASE_URL", "https://api.x.ai/v1"),

            // Research Scraping
            jina_api_key: optional_env("JINA_API_KEY"),
            jina_reader_url: env_or_default("JINA_READER_URL", "https://r.jina.ai"),

            // Google Calendar
            google_client_id: optional_env("GOOGLE_CLIENT_ID"),
            google_client_secret: optional_env("GOOGLE_CLIENT_SECRET"),
            google_calendar_id: env_or_default("GOOGLE_CALENDAR_ID", "primary"),
            google_redirect_uri: optional_env("GOOGLE_REDIRECT_URI"),
            google_auth_url: env_or_default(
                "GOOGLE_AUTH_URL",
                "https://accounts.google.com/o/oauth2/v2/auth",
            ),
            google_token_url: env_or_default("GOOGLE_TOKEN_URL", "https://oauth2.googleapis.com/token"),
            google_api_base: env_or_default("GOOGLE_API_BASE", "https://www.googleapis.com"),

            // Weekly Generation Scheduler
            scheduler_enabled: parse_env_bool("SCHEDULER_ENABLED", true)?,
            scheduler_poll_interval: Duration::from_secs(parse_env_u64(
                "SCHEDULER_POLL_INTERVAL_SECS",
                60,
            )?),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "SITE_URL".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.scheduler_poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "SCHEDULER_POLL_INTERVAL_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.google_client_id.is_some() != self.google_client_secret.is_some() {
            return Err(ConfigError::InvalidValue {
                name: "GOOGLE_CLIENT_ID".to_string(),
                message: "GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set together"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Whether Google Calendar sync is configured.
    #[must_use]
    pub fn google_calendar_configured(&self) -> bool {
        self.google_client_id.is_some() && self.google_client_secret.is_some()
    }

    /// The OAuth redirect URI, defaulting to the callback route on `site_url`.
    #[must_use]
    pub fn google_redirect_uri(&self) -> String {
        self.google_redirect_uri
            .clone()
            .unwrap_or_else(|| format!("{}/api/auth/google/callback", self.site_url))
    }

    /// A configuration suitable for tests: no external keys, scheduler off.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            database_path: PathBuf::from("./data/test.sqlite"),
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
            site_url: "http://localhost:8080".to_string(),
            anthropic_api_key: None,
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            grok_api_key: None,
            grok_base_url: "https://api.x.ai/v1".to_string(),
            jina_api_key: None,
            jina_reader_url: "https://r.jina.ai".to_string(),
            google_client_id: None,
            google_client_secret: None,
            google_calendar_id: "primary".to_string(),
            google_redirect_uri: None,
            google_auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            google_token_url: "https://oauth2.googleapis.com/token".to_string(),
            google_api_base: "https://www.googleapis.com".to_string(),
            scheduler_enabled: false,
            scheduler_poll_interval: Duration::from_secs(60),
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_env_bool("NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("NONEXISTENT_VAR", false).unwrap());
    }

    #[test]
    fn test_testing_config_validates() {
        let config = Config::for_testing();
        assert!(config.validate().is_ok());
        assert!(!config.google_calendar_configured());
    }

    #[test]
    fn test_redirect_uri_default() {
        let config = Config::for_testing();
        assert_eq!(
            config.google_redirect_uri(),
            "http://localhost:8080/api/auth/google/callback"
        );
    }
}
