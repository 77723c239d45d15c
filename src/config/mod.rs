//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! The auth token is wrapped in secrecy::SecretString to prevent log leaks.

pub mod secrets;

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::time::Duration;

/// Request timeout applied when `REQUEST_TIMEOUT_SECS` is unset.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct Config {
    /// Sent verbatim as the `Authorization` header on every outbound call.
    pub auth_token: SecretString,
    pub request_timeout: Duration,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // `Auth` is the name the old scripts read.
        let auth_token = lookup("AUTH").or_else(|| lookup("Auth")).ok_or_else(|| {
            Error::Config("required environment variable AUTH is not set".to_string())
        })?;

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::Config(format!("REQUEST_TIMEOUT_SECS is not a number: {raw}"))
                })?;
                if secs == 0 {
                    return Err(Error::Config(
                        "REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            auth_token: SecretString::from(auth_token),
            request_timeout,
            otel_endpoint: lookup("OTEL_ENDPOINT"),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}
