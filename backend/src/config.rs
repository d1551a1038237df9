//! Service configuration from the environment.
//!
//! `.env` is loaded first when present. Variables:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `SUPABASE_URL` | required |
//! | `SUPABASE_SERVICE_ROLE_KEY` | required |
//! | `PORT` | 3000 |
//! | `MAX_COURSES_PER_UPLOAD` | 100 |
//! | `CATALOG_TIMEOUT_SECS` | 10 |
//! | `MAX_UPLOAD_BYTES` | 10485760 |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_COURSES: usize = 100;
pub const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub service_role_key: String,
    pub port: u16,
    pub max_courses: usize,
    pub catalog_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        Ok(Self {
            supabase_url: required("SUPABASE_URL")?,
            service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            max_courses: parse_or(&lookup, "MAX_COURSES_PER_UPLOAD", DEFAULT_MAX_COURSES)?,
            catalog_timeout: Duration::from_secs(parse_or(
                &lookup,
                "CATALOG_TIMEOUT_SECS",
                DEFAULT_CATALOG_TIMEOUT_SECS,
            )?),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const BASE: [(&str, &str); 2] = [
        ("SUPABASE_URL", "https://db.example.org"),
        ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&BASE)).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_courses, 100);
        assert_eq!(config.catalog_timeout, Duration::from_secs(10));
        assert_eq!(config.max_upload_bytes, 10_485_760);
    }

    #[test]
    fn test_overrides() {
        let mut vars = BASE.to_vec();
        vars.extend([("PORT", "8080"), ("MAX_COURSES_PER_UPLOAD", " 25 ")]);
        let config = Config::from_lookup(lookup(&vars)).unwrap().with_port(9000);
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_courses, 25);
    }

    #[test]
    fn test_missing_credentials() {
        let err = Config::from_lookup(lookup(&[("SUPABASE_URL", "https://db.example.org")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY")));
    }

    #[test]
    fn test_malformed_number() {
        let mut vars = BASE.to_vec();
        vars.push(("CATALOG_TIMEOUT_SECS", "ten"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for CATALOG_TIMEOUT_SECS: ten");
    }
}
