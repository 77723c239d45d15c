//! Secret handling utilities.
//!
//! Re-exports secrecy types and turns the auth token into a header value
//! that is marked sensitive, so reqwest redacts it in its own debug output.

pub use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};
use reqwest::header::HeaderValue;

/// Build an `Authorization` header value from the configured token.
pub fn auth_header(token: &SecretString) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(token.expose_secret())
        .map_err(|_| Error::Config("auth token is not a valid header value".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}
