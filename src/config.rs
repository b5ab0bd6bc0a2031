use std::{env, fmt::Display, ops::RangeInclusive, str::FromStr, time::Duration};

use chrono::TimeDelta;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_AVATAR_URL: &str = "https://www.gravatar.com/avatar/?d=mp";

/// One year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Range the bcrypt crate accepts.
pub const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub token_ttl: TimeDelta,
    pub bcrypt_cost: u32,
    /// Upper bound on the global feed.
    pub feed_limit: usize,
    /// Post creations allowed per caller within `post_rate_window`.
    pub post_rate_limit: u32,
    pub post_rate_window: Duration,
    pub rate_limit_enabled: bool,
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,
    pub default_avatar_url: String,
}

impl Config {
    /// Reads the process environment. `main` loads `.env` before calling this.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let post_rate_limit = parse_in(&lookup, "POST_RATE_LIMIT", 3, 1..=u32::MAX)?;
        let window_secs = parse_in(&lookup, "POST_RATE_WINDOW_SECS", 60, 1..=u64::MAX)?;

        let ttl_hours = parse_in(&lookup, "TOKEN_TTL_HOURS", 24, 1..=MAX_TOKEN_TTL_HOURS)?;
        let token_ttl = TimeDelta::try_hours(ttl_hours).ok_or(ConfigError::Invalid {
            key: "TOKEN_TTL_HOURS",
            value: ttl_hours.to_string(),
        })?;

        let timeout_secs = parse_in(&lookup, "REQUEST_TIMEOUT_SECS", 10, 1..=u64::MAX)?;

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            jwt_secret,
            token_ttl,
            bcrypt_cost: parse_in(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST, BCRYPT_COST_RANGE)?,
            feed_limit: parse_or(&lookup, "FEED_LIMIT", 100)?,
            post_rate_limit,
            post_rate_window: Duration::from_secs(window_secs),
            rate_limit_enabled: parse_or(&lookup, "RATE_LIMIT_ENABLED", true)?,
            request_timeout: Duration::from_secs(timeout_secs),
            max_concurrent_requests: parse_in(
                &lookup,
                "MAX_CONCURRENT_REQUESTS",
                1024,
                1..=usize::MAX,
            )?,
            default_avatar_url: lookup("DEFAULT_AVATAR_URL")
                .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn parse_in<F, T>(
    lookup: &F,
    key: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display + PartialOrd,
{
    let value = parse_or(lookup, key, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
    }
}
