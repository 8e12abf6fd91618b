//! Argument validation for TideKV commands.
//!
//! Everything here runs before the store is touched: malformed expiry tokens,
//! unknown `SET` options and wrong arity are rejected with a [`CommandError`]
//! and never reach [`Store`](crate::storage::Store).
//!
//! ## Expiry format
//!
//! `EX` takes an integer magnitude followed by one unit letter,
//! case-insensitive:
//!
//! | Unit | Meaning |
//! |------|---------|
//! | `S`  | seconds |
//! | `M`  | minutes |
//! | `H`  | hours   |
//! | `D`  | days    |
//!
//! The token becomes the absolute instant `now + magnitude × unit`. A zero or
//! negative magnitude parses fine and yields an instant that is not in the
//! future; the store then rejects it as an invalid expiry.

use crate::storage::SetOptions;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised while validating command arguments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    #[error("syntax error")]
    Syntax,

    #[error("empty key")]
    EmptyKey,

    #[error("invalid UTF-8 in argument")]
    InvalidUtf8,

    #[error("invalid expiry magnitude: {0}")]
    InvalidExpiryMagnitude(String),

    #[error("invalid expiry unit: {0}")]
    InvalidExpiryUnit(String),

    #[error("expiry out of range: {0}")]
    ExpiryOutOfRange(String),
}

/// Rejects empty keys; every stored key is a non-empty string.
pub fn non_empty_key(key: &str) -> Result<&str, CommandError> {
    if key.is_empty() {
        Err(CommandError::EmptyKey)
    } else {
        Ok(key)
    }
}

/// Seconds per expiry unit letter.
fn unit_seconds(unit: char) -> Option<i64> {
    match unit.to_ascii_uppercase() {
        'S' => Some(1),
        'M' => Some(60),
        'H' => Some(60 * 60),
        'D' => Some(60 * 60 * 24),
        _ => None,
    }
}

/// Parses an expiry token such as `10s`, `5M` or `2d` relative to `now`.
///
/// # Example
///
/// ```
/// use tidekv::commands::args::parse_expiry;
/// use std::time::{Duration, Instant};
///
/// let now = Instant::now();
/// assert_eq!(parse_expiry("90s", now).unwrap(), now + Duration::from_secs(90));
/// assert_eq!(parse_expiry("2H", now).unwrap(), now + Duration::from_secs(7200));
/// assert!(parse_expiry("10w", now).is_err());
/// ```
pub fn parse_expiry(token: &str, now: Instant) -> Result<Instant, CommandError> {
    let Some(unit) = token.chars().last() else {
        return Err(CommandError::InvalidExpiryMagnitude(token.to_string()));
    };
    let magnitude = &token[..token.len() - unit.len_utf8()];

    let magnitude: i64 = magnitude
        .parse()
        .map_err(|_| CommandError::InvalidExpiryMagnitude(token.to_string()))?;
    let per_unit =
        unit_seconds(unit).ok_or_else(|| CommandError::InvalidExpiryUnit(token.to_string()))?;

    let out_of_range = || CommandError::ExpiryOutOfRange(token.to_string());
    let seconds = magnitude.checked_mul(per_unit).ok_or_else(out_of_range)?;
    let offset = Duration::from_secs(seconds.unsigned_abs());

    if seconds >= 0 {
        now.checked_add(offset).ok_or_else(out_of_range)
    } else {
        // Already in the past; the store turns this into an invalid expiry
        Ok(now.checked_sub(offset).unwrap_or(now))
    }
}

/// Parses the options that follow `SET key value`.
///
/// - `EX <expiry>` sets the absolute expiry (see [`parse_expiry`])
/// - `NX` and `XX` both enable the reject-if-exists guard
///
/// Options may appear in any order; a repeated `EX` keeps the last one.
pub fn parse_set_options(options: &[String], now: Instant) -> Result<SetOptions, CommandError> {
    let mut parsed = SetOptions::default();
    let mut iter = options.iter();

    while let Some(option) = iter.next() {
        match option.to_ascii_uppercase().as_str() {
            "EX" => {
                let token = iter.next().ok_or(CommandError::Syntax)?;
                parsed.expires_at = Some(parse_expiry(token, now)?);
            }
            "NX" | "XX" => parsed.reject_if_exists = true,
            _ => return Err(CommandError::Syntax),
        }
    }

    Ok(parsed)
}
