//! Time-ordered base62 identifiers.
//!
//! An id is the base62 nanosecond offset from 2014-01-01T00:00:00Z followed
//! by four random base62 characters, 14 characters in total.

use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Exclusive upper bound of the random part before truncation.
const MAX_RANDOM: u64 = 9_999_999_999_999;

pub const ID_LEN: usize = 14;

const RANDOM_LEN: usize = 4;

/// Seconds since the Unix epoch at 2014-01-01T00:00:00Z.
const EPOCH_2014_SECS: i64 = 1_388_534_400;

pub fn base62_encode(mut num: u64) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push(ALPHABET[(num % 62) as usize]);
        num /= 62;
        if num == 0 {
            break;
        }
    }
    digits.reverse();
    // Every byte comes from ALPHABET.
    digits.into_iter().map(char::from).collect()
}

/// Generate a new id for the current time.
pub fn unique_id() -> Result<String> {
    unique_id_at(Utc::now())
}

/// Generate a new id for the given instant.
pub fn unique_id_at(now: DateTime<Utc>) -> Result<String> {
    let epoch = Utc
        .timestamp_opt(EPOCH_2014_SECS, 0)
        .single()
        .ok_or_else(|| Error::Other("invalid id epoch".to_string()))?;
    let nanos = (now - epoch)
        .num_nanoseconds()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| Error::Other(format!("time {now} is outside the id range")))?;

    let random = base62_encode(rand::rng().random_range(0..MAX_RANDOM));
    let suffix = &random[random.len().saturating_sub(RANDOM_LEN)..];

    let id = format!("{}{:0>width$}", base62_encode(nanos), suffix, width = RANDOM_LEN);
    if id.len() != ID_LEN {
        return Err(Error::IdLength(id));
    }
    Ok(id)
}
