use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(&'static str),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// Runtime configuration for the API server
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database connection string (default: local SQLite file)
    pub database_url: String,

    /// HS256 secret used to sign session tokens
    pub jwt_secret: String,

    /// Session token lifetime in hours (default: 24)
    pub token_ttl_hours: i64,

    /// Maximum decoded size of a reference PDF in bytes (default: 25 MB)
    pub max_pdf_size: usize,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://flashcard_vault.db?mode=rwc".to_string(),
            jwt_secret: "secret".to_string(),
            token_ttl_hours: 24,
            max_pdf_size: 25 * 1024 * 1024, // 25 MB
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

/// Longest accepted session token lifetime (one year)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

impl AppConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let token_ttl_hours =
            parse_var(&lookup, "TOKEN_TTL_HOURS")?.unwrap_or(default.token_ttl_hours);
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_HOURS",
                format!("{} is outside 1..={}", token_ttl_hours, MAX_TOKEN_TTL_HOURS),
            ));
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(default.database_url),
            jwt_secret: lookup("JWT_SECRET").unwrap_or(default.jwt_secret),
            token_ttl_hours,
            max_pdf_size: parse_var(&lookup, "MAX_PDF_SIZE")?.unwrap_or(default.max_pdf_size),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or(default.allowed_origins),
        })
    }

    /// Relaxed settings for local work: SQLite in memory, long-lived tokens
    pub fn development() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            token_ttl_hours: 24 * 7,
            ..Self::default()
        }
    }

    /// Strict settings: `DATABASE_URL` and `JWT_SECRET` must be provided
    pub fn production() -> Result<Self, ConfigError> {
        Self::production_from(|key| env::var(key).ok())
    }

    pub fn production_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::from_lookup(&lookup)?;
        config.database_url =
            lookup("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?;
        config.jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::MissingVar("JWT_SECRET"))?;
        if config.jwt_secret.len() < 32 {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET",
                "must be at least 32 characters".to_string(),
            ));
        }
        Ok(config)
    }

    /// Largest request body accepted: the PDF ceiling inflated by base64 (4/3)
    /// plus 1 MB for the JSON envelope
    pub fn max_request_body(&self) -> usize {
        self.max_pdf_size / 3 * 4 + 4 + 1024 * 1024
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(None),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.max_pdf_size, 25 * 1024 * 1024);
        assert_eq!(config.token_ttl_hours, 24);
        assert!(config.database_url.starts_with("sqlite://"));
        assert!(!config.allowed_origins.contains(&"*".to_string()));
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.token_ttl_hours, 24 * 7);
    }

    #[test]
    fn test_request_body_limit_covers_base64_payload() {
        let config = AppConfig::default();
        let encoded_len = config.max_pdf_size.div_ceil(3) * 4;
        assert!(config.max_request_body() > encoded_len);
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_production_rejects_short_secret() {
        let result = AppConfig::production_from(vars(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "short"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue("JWT_SECRET", _))
        ));

        let secret = "k".repeat(32);
        let result = AppConfig::production_from(vars(&[("JWT_SECRET", secret.as_str())]));
        assert!(matches!(result, Err(ConfigError::MissingVar("DATABASE_URL"))));
    }

    #[test]
    fn test_invalid_numeric_var_is_rejected() {
        let result = AppConfig::from_lookup(vars(&[("TOKEN_TTL_HOURS", "forever")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue("TOKEN_TTL_HOURS", _))
        ));
    }

    #[test]
    fn test_token_ttl_must_be_positive_and_bounded() {
        for raw in ["0", "-5", "9223372036854775807"] {
            let result = AppConfig::from_lookup(vars(&[("TOKEN_TTL_HOURS", raw)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue("TOKEN_TTL_HOURS", _))),
                "{} was accepted",
                raw
            );
        }

        let config = AppConfig::from_lookup(vars(&[("TOKEN_TTL_HOURS", "8760")])).unwrap();
        assert_eq!(config.token_ttl_hours, MAX_TOKEN_TTL_HOURS);
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let config = AppConfig::from_lookup(vars(&[
            ("MAX_PDF_SIZE", "1024"),
            ("ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
        ]))
        .unwrap();
        assert_eq!(config.max_pdf_size, 1024);
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.token_ttl_hours, 24);
    }
}
