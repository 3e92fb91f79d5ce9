use std::net::SocketAddr;

use anyhow::Context;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

use crate::identity::DEFAULT_IDENTITY_URL;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_IDLE_MINUTES: i64 = 60;
const DEFAULT_LOG_FILTER: &str = "info,skillswap=debug";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub bind: SocketAddr,
    /// SQLite document store when set, in-memory otherwise.
    pub database_url: Option<String>,
    /// Firebase identity toolkit when set, in-memory accounts otherwise.
    pub firebase_api_key: Option<String>,
    pub firebase_identity_url: String,
    pub session_idle: time::Duration,
    pub cors_origin: Option<String>,
    pub log_filter: String,
}

impl Config {
    /// Process environment, after loading `.env` if there is one.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|name| dotenv::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let bind = var("SKILLSWAP_BIND").unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let bind = bind
            .parse::<SocketAddr>()
            .with_context(|| format!("SKILLSWAP_BIND is not a socket address: {bind}"))?;

        let idle_minutes = match var("SKILLSWAP_SESSION_IDLE_MINUTES") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .with_context(|| format!("SKILLSWAP_SESSION_IDLE_MINUTES must be a positive number, got {raw}"))?,
            None => DEFAULT_IDLE_MINUTES,
        };

        Ok(Self {
            bind,
            database_url: var("DATABASE_URL"),
            firebase_api_key: var("FIREBASE_API_KEY"),
            firebase_identity_url: var("FIREBASE_IDENTITY_URL")
                .unwrap_or_else(|| DEFAULT_IDENTITY_URL.to_owned()),
            session_idle: time::Duration::minutes(idle_minutes),
            cors_origin: var("SKILLSWAP_CORS_ORIGIN"),
            log_filter: var("SKILLSWAP_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned()),
        })
    }

    pub fn cors(&self) -> anyhow::Result<CorsLayer> {
        let Some(origin) = &self.cors_origin else {
            return Ok(CorsLayer::permissive());
        };
        let origin = HeaderValue::from_str(origin)
            .with_context(|| format!("SKILLSWAP_CORS_ORIGIN is not a valid origin: {origin}"))?;

        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_use_in_memory_backends() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind.to_string(), "0.0.0.0:8080");
        assert_eq!(config.database_url, None);
        assert_eq!(config.firebase_api_key, None);
        assert_eq!(config.firebase_identity_url, DEFAULT_IDENTITY_URL);
        assert_eq!(config.session_idle, time::Duration::minutes(60));
        assert_eq!(config.log_filter, "info,skillswap=debug");
        assert!(config.cors().is_ok());
    }

    #[test]
    fn values_are_read_and_blank_means_unset() {
        let config = config(&[
            ("SKILLSWAP_BIND", "127.0.0.1:3000"),
            ("DATABASE_URL", "sqlite://skillswap.db"),
            ("FIREBASE_API_KEY", "  "),
            ("SKILLSWAP_SESSION_IDLE_MINUTES", "15"),
            ("SKILLSWAP_CORS_ORIGIN", "http://localhost:5173"),
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 3000);
        assert_eq!(config.database_url.as_deref(), Some("sqlite://skillswap.db"));
        assert_eq!(config.firebase_api_key, None);
        assert_eq!(config.session_idle, time::Duration::minutes(15));
        assert!(config.cors().is_ok());
    }

    #[test]
    fn bad_numbers_fail_at_startup() {
        assert!(config(&[("SKILLSWAP_SESSION_IDLE_MINUTES", "soon")]).is_err());
        assert!(config(&[("SKILLSWAP_SESSION_IDLE_MINUTES", "0")]).is_err());
        assert!(config(&[("SKILLSWAP_BIND", "localhost")]).is_err());
    }
}
