use std::env;

use crate::error::MentionWatchError;

/// Application configuration loaded from environment variables.
/// All required variables are validated eagerly so a misconfigured
/// deploy fails at startup with one aggregate error instead of
/// silently skipping the poll loop.
#[derive(Debug, Clone)]
pub struct Config {
    // Chirper account
    pub chirper_username: String,
    pub chirper_password: String,
    /// Second factor. Also part of the session cache key.
    pub chirper_otp: String,
    pub chirper_base_url: String,

    // Polling
    pub query: String,
    pub page_size: u32,
    pub poll_interval_secs: u64,
    pub session_dir: String,

    // Postgres
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub timezone: String,

    /// "develop" enables schema auto-migration at startup.
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, MentionWatchError> {
        dotenvy::dotenv().ok();

        let mut missing = Vec::new();
        let mut required = |key: &str| -> String {
            match env::var(key) {
                Ok(v) if !v.is_empty() => v,
                _ => {
                    missing.push(key.to_string());
                    String::new()
                }
            }
        };

        let config = Self {
            chirper_username: required("CHIRPER_USERNAME"),
            chirper_password: required("CHIRPER_PASSWORD"),
            chirper_otp: required("CHIRPER_OTP"),
            chirper_base_url: env::var("CHIRPER_BASE_URL")
                .unwrap_or_else(|_| "https://api.chirper.example".to_string()),
            query: required("MW_QUERY"),
            page_size: parse_or_default("MW_PAGE_SIZE", 10)?,
            poll_interval_secs: parse_or_default("MW_POLL_INTERVAL_SECS", 10)?,
            session_dir: env::var("MW_SESSION_DIR").unwrap_or_else(|_| ".sessions".to_string()),
            db_host: required("DB_HOST"),
            db_port: parse_or_default("DB_PORT", 5432)?,
            db_name: required("DB_NAME"),
            db_user: required("DB_USER"),
            db_password: required("DB_PASSWORD"),
            timezone: env::var("TZ").unwrap_or_else(|_| "UTC".to_string()),
            environment: env::var("MW_ENV").unwrap_or_else(|_| "production".to_string()),
        };

        if !missing.is_empty() {
            return Err(MentionWatchError::ConfigMissing(missing));
        }
        Ok(config)
    }

    /// Postgres connection string. Never log this directly — it
    /// carries the password.
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }

    pub fn is_develop(&self) -> bool {
        self.environment.eq_ignore_ascii_case("develop")
    }

    /// Log the loaded configuration with secrets redacted.
    pub fn log_redacted(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  CHIRPER_USERNAME: {}", self.chirper_username);
        tracing::info!("  CHIRPER_PASSWORD: {}", preview(&self.chirper_password));
        tracing::info!("  CHIRPER_OTP: {}", preview(&self.chirper_otp));
        tracing::info!("  CHIRPER_BASE_URL: {}", self.chirper_base_url);
        tracing::info!("  MW_QUERY: {}", self.query);
        tracing::info!("  MW_PAGE_SIZE: {}", self.page_size);
        tracing::info!("  MW_POLL_INTERVAL_SECS: {}", self.poll_interval_secs);
        tracing::info!("  MW_SESSION_DIR: {}", self.session_dir);
        tracing::info!(
            "  DB: {}@{}:{}/{}",
            self.db_user,
            self.db_host,
            self.db_port,
            self.db_name
        );
        tracing::info!("  MW_ENV: {}", self.environment);
    }
}

/// First few characters of a secret plus its length. Counts chars, not
/// bytes — slicing at a byte offset panics on multibyte input.
fn preview(val: &str) -> String {
    let prefix: String = val.chars().take(3).collect();
    format!("{}...({} chars)", prefix, val.chars().count())
}

fn parse_or_default<T: std::str::FromStr>(key: &str, default: T) -> Result<T, MentionWatchError> {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .map_err(|_| MentionWatchError::Config(format!("{key} must be a number, got {v:?}"))),
        Err(_) => Ok(default),
    }
}
