//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup; a `.env` file is honored for local
//! development.

use std::env;
use std::str::FromStr;

/// Where achievements, users and activities are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    /// In-process store; state is lost on restart
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Firestore => "firestore",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Origins allowed by CORS, comma-separated
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub storage: StorageBackend,
    /// Days of activity history the streak rule looks at
    pub streak_lookback_days: u32,
    /// Pending "achievement earned" events before new ones are dropped
    pub notification_queue_capacity: usize,
    /// Upper bound on leaderboard size
    pub leaderboard_max: usize,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            storage: StorageBackend::Memory,
            streak_lookback_days: 30,
            notification_queue_capacity: 16,
            leaderboard_max: 100,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: "STORAGE_BACKEND",
                value,
            })?,
            Err(_) => StorageBackend::Firestore,
        };

        let streak_lookback_days: u32 = parse_var("STREAK_LOOKBACK_DAYS", 30)?;
        if streak_lookback_days == 0 {
            return Err(ConfigError::Invalid {
                var: "STREAK_LOOKBACK_DAYS",
                value: "0".to_string(),
            });
        }

        // The emulator accepts any project; real Firestore needs the right one.
        let gcp_project_id = match env::var("GCP_PROJECT_ID") {
            Ok(id) => id,
            Err(_)
                if storage == StorageBackend::Firestore
                    && env::var("FIRESTORE_EMULATOR_HOST").is_err() =>
            {
                return Err(ConfigError::Missing("GCP_PROJECT_ID"));
            }
            Err(_) => "local-dev".to_string(),
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id,
            port: parse_var("PORT", 8080)?,
            storage,
            streak_lookback_days,
            notification_queue_capacity: parse_var("NOTIFICATION_QUEUE_CAPACITY", 256)?,
            leaderboard_max: parse_var::<usize>("LEADERBOARD_MAX", 100)?.max(1),
        })
    }
}

impl Config {
    /// Each origin listed in `frontend_url`.
    pub fn allowed_origins(&self) -> impl Iterator<Item = &str> {
        self.frontend_url
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
    }
}

/// Read an optional numeric variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::Invalid { var, value }),
        },
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global, so everything touching them lives in one test.
    #[test]
    fn test_config_from_env() {
        env::set_var("STORAGE_BACKEND", "memory");
        env::set_var("STREAK_LOOKBACK_DAYS", "14");
        env::remove_var("PORT");

        let config = Config::from_env().expect("Config should load");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.streak_lookback_days, 14);
        assert_eq!(config.port, 8080);

        env::set_var("STORAGE_BACKEND", "postgres");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "STORAGE_BACKEND",
                ..
            }
        ));

        env::set_var("STORAGE_BACKEND", "Memory");
        env::set_var("STREAK_LOOKBACK_DAYS", "0");
        assert!(Config::from_env().is_err());

        env::set_var("STREAK_LOOKBACK_DAYS", "thirty");
        assert!(Config::from_env().is_err());

        env::remove_var("STORAGE_BACKEND");
        env::remove_var("STREAK_LOOKBACK_DAYS");
    }

    #[test]
    fn test_allowed_origins() {
        let mut config = Config::test_default();
        config.frontend_url = "https://app.example.com, http://localhost:5173,".to_string();
        let origins: Vec<&str> = config.allowed_origins().collect();
        assert_eq!(origins, vec!["https://app.example.com", "http://localhost:5173"]);
    }

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!(
            "firestore".parse::<StorageBackend>(),
            Ok(StorageBackend::Firestore)
        );
        assert_eq!(
            " MEMORY ".parse::<StorageBackend>(),
            Ok(StorageBackend::Memory)
        );
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }
}
