//! Process configuration read from the environment.

use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    fn parse(raw: &str) -> Self {
        if raw.trim() == "*" {
            return CorsOrigins::Any;
        }
        CorsOrigins::List(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub cors_origins: CorsOrigins,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("SERVER_PORT") {
            Some(v) => parse_number("SERVER_PORT", &v, "a port number")?,
            None => DEFAULT_PORT,
        };
        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(v) => parse_number::<u32>("DATABASE_MAX_CONNECTIONS", &v, "a positive integer")
                .and_then(|n| positive("DATABASE_MAX_CONNECTIONS", n, &v))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let jwt_expiry_hours = match var("JWT_EXPIRY_HOURS") {
            Some(v) => parse_number::<i64>("JWT_EXPIRY_HOURS", &v, "a positive integer")
                .and_then(|n| positive("JWT_EXPIRY_HOURS", n, &v))?,
            None => DEFAULT_JWT_EXPIRY_HOURS,
        };

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEFAULT_JWT_SECRET.to_string()
        });

        Ok(Self {
            host: var("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database_url: var("DATABASE_URL"),
            database_max_connections,
            jwt_secret,
            jwt_expiry_hours,
            cors_origins: CorsOrigins::parse(
                &var("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
            ),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn jwt_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt_expiry_hours)
    }
}

fn parse_number<T: core::str::FromStr>(
    var: &'static str,
    value: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        expected,
        value: value.to_string(),
    })
}

fn positive<T: PartialOrd + Default>(var: &'static str, n: T, raw: &str) -> Result<T, ConfigError> {
    if n > T::default() {
        Ok(n)
    } else {
        Err(ConfigError::Invalid {
            var,
            expected: "a positive integer",
            value: raw.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.database_max_connections, 10);
        assert_eq!(cfg.jwt_secret, "dev-secret");
        assert_eq!(cfg.jwt_ttl(), chrono::Duration::hours(24));
        assert_eq!(
            cfg.cors_origins,
            CorsOrigins::List(vec![
                "http://localhost:3000".into(),
                "http://localhost:5173".into()
            ])
        );
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("SERVER_HOST", "127.0.0.1"),
            ("SERVER_PORT", "9000"),
            ("DATABASE_URL", "postgres://localhost/carkeeper"),
            ("JWT_EXPIRY_HOURS", "2"),
            ("CORS_ORIGINS", "*"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9000");
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/carkeeper"));
        assert_eq!(cfg.jwt_expiry_hours, 2);
        assert_eq!(cfg.cors_origins, CorsOrigins::Any);
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let cfg = config(&[("DATABASE_URL", "  ")]).unwrap();
        assert_eq!(cfg.database_url, None);
    }

    #[test]
    fn invalid_numbers_fail() {
        assert!(matches!(
            config(&[("SERVER_PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "SERVER_PORT", .. })
        ));
        assert!(matches!(
            config(&[("DATABASE_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::Invalid { var: "DATABASE_MAX_CONNECTIONS", .. })
        ));
        assert!(matches!(
            config(&[("JWT_EXPIRY_HOURS", "-1")]),
            Err(ConfigError::Invalid { var: "JWT_EXPIRY_HOURS", .. })
        ));
    }
}
