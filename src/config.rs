//! Server configuration
//!
//! All settings come from environment variables with a `FINANCE_` prefix:
//!
//! ```bash
//! FINANCE_JWT_SECRET=your-super-secret-key-at-least-32-chars
//! FINANCE_PORT=8000
//! FINANCE_DATA_FILE=./finance.jsonl
//! FINANCE_WS_IDLE_TIMEOUT_SECS=300
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Minimum accepted length for an explicitly configured JWT secret
pub const MIN_SECRET_LEN: usize = 32;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    InvalidValue { name: &'static str, value: String },
    #[error("FINANCE_JWT_SECRET must be at least {MIN_SECRET_LEN} characters")]
    SecretTooShort,
}

/// Real-time channel tuning
#[derive(Debug, Clone)]
pub struct RealtimeSettings {
    /// Outbound queue depth per connection
    pub queue_capacity: usize,
    /// How long a broadcast waits on one full queue before evicting it
    pub send_timeout: Duration,
    /// Close connections that send nothing for this long (None = never)
    pub idle_timeout: Option<Duration>,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            send_timeout: Duration::from_millis(5000),
            idle_timeout: None,
        }
    }
}

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    /// JSON-lines data file; in-memory only when unset
    pub data_file: Option<PathBuf>,
    /// CORS origins; empty means any origin
    pub allowed_origins: Vec<String>,
    pub realtime: RealtimeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "Finance Tracker API".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            jwt_secret: generate_secret(),
            access_token_ttl_minutes: 30,
            data_file: None,
            allowed_origins: default_origins(),
            realtime: RealtimeSettings::default(),
        }
    }
}

fn default_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Random per-process secret; tokens do not survive a restart
fn generate_secret() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

impl Settings {
    /// Build settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(host) = var("FINANCE_HOST") {
            settings.host = host;
        }
        if let Some(port) = parse_var(&var, "FINANCE_PORT")? {
            settings.port = port;
        }

        match var("FINANCE_JWT_SECRET") {
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(ConfigError::SecretTooShort)
            }
            Some(secret) => settings.jwt_secret = secret,
            None => tracing::warn!(
                "FINANCE_JWT_SECRET not set, using a random secret; tokens will be invalidated on restart"
            ),
        }

        if let Some(ttl) = parse_var::<i64, _>(&var, "FINANCE_ACCESS_TOKEN_TTL_MINUTES")? {
            if ttl <= 0 {
                return Err(ConfigError::InvalidValue {
                    name: "FINANCE_ACCESS_TOKEN_TTL_MINUTES",
                    value: ttl.to_string(),
                });
            }
            settings.access_token_ttl_minutes = ttl;
        }

        settings.data_file = var("FINANCE_DATA_FILE").map(PathBuf::from);

        if let Some(origins) = var("FINANCE_ALLOWED_ORIGINS") {
            settings.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty() && o != "*")
                .collect();
        }

        if let Some(capacity) = parse_var::<usize, _>(&var, "FINANCE_WS_QUEUE_CAPACITY")? {
            if capacity == 0 {
                return Err(ConfigError::InvalidValue {
                    name: "FINANCE_WS_QUEUE_CAPACITY",
                    value: "0".to_string(),
                });
            }
            settings.realtime.queue_capacity = capacity;
        }
        if let Some(ms) = parse_var(&var, "FINANCE_WS_SEND_TIMEOUT_MS")? {
            settings.realtime.send_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64, _>(&var, "FINANCE_WS_IDLE_TIMEOUT_SECS")? {
            settings.realtime.idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(settings)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_minutes * 60
    }
}

fn parse_var<T, F>(var: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.access_token_ttl_minutes, 30);
        assert!(settings.jwt_secret.len() >= MIN_SECRET_LEN);
        assert!(settings.data_file.is_none());
        assert!(settings.realtime.idle_timeout.is_none());
        assert_eq!(settings.allowed_origins.len(), 4);
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            ("FINANCE_PORT", "9000"),
            ("FINANCE_JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("FINANCE_DATA_FILE", "/tmp/finance.jsonl"),
            ("FINANCE_ALLOWED_ORIGINS", "*"),
            ("FINANCE_WS_IDLE_TIMEOUT_SECS", "90"),
            ("FINANCE_WS_SEND_TIMEOUT_MS", "250"),
        ])
        .unwrap();

        assert_eq!(settings.bind_address(), "0.0.0.0:9000");
        assert_eq!(settings.jwt_secret, "0123456789abcdef0123456789abcdef");
        assert_eq!(settings.data_file, Some(PathBuf::from("/tmp/finance.jsonl")));
        assert!(settings.allowed_origins.is_empty());
        assert_eq!(settings.realtime.idle_timeout, Some(Duration::from_secs(90)));
        assert_eq!(settings.realtime.send_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_short_secret_rejected() {
        let result = settings_from(&[("FINANCE_JWT_SECRET", "short")]);
        assert!(matches!(result, Err(ConfigError::SecretTooShort)));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let result = settings_from(&[("FINANCE_PORT", "eighty")]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "FINANCE_PORT", .. })
        ));
    }
}
