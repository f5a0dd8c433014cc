//! Environment-driven service configuration.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use warden_auth::{DEFAULT_TOKEN_TTL_SECS, MatchingMode};
use warden_observability::LogFormat;

const DEV_SECRET: &str = "dev-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const BCRYPT_COST_RANGE: core::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            var,
            value: value.to_owned(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub matching: MatchingMode,
    pub database_url: Option<String>,
    pub log_format: LogFormat,
}

impl core::fmt::Debug for Config {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("matching", &self.matching)
            .field("database", &self.database_url.is_some())
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_SECRET.to_owned(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            bcrypt_cost: warden_auth::password::DEFAULT_COST,
            matching: MatchingMode::default(),
            database_url: None,
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// True when no `JWT_SECRET` was supplied.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_SECRET
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Unset and blank values take
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| DEV_SECRET.to_owned());

        let bind_raw = get("WARDEN_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("WARDEN_BIND_ADDR", &bind_raw, e))?;

        let token_ttl = match get("WARDEN_TOKEN_TTL_SECS") {
            None => Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(secs) if secs > 0 => Duration::seconds(secs),
                Ok(_) => {
                    return Err(ConfigError::invalid(
                        "WARDEN_TOKEN_TTL_SECS",
                        &raw,
                        "must be positive",
                    ));
                }
                Err(e) => return Err(ConfigError::invalid("WARDEN_TOKEN_TTL_SECS", &raw, e)),
            },
        };

        let bcrypt_cost = match get("WARDEN_BCRYPT_COST") {
            None => warden_auth::password::DEFAULT_COST,
            Some(raw) => {
                let cost = raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| ConfigError::invalid("WARDEN_BCRYPT_COST", &raw, e))?;
                if !BCRYPT_COST_RANGE.contains(&cost) {
                    return Err(ConfigError::invalid(
                        "WARDEN_BCRYPT_COST",
                        &raw,
                        "must be between 4 and 31",
                    ));
                }
                cost
            }
        };

        let matching = match get("WARDEN_PERMISSION_MATCHING") {
            None => MatchingMode::default(),
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid("WARDEN_PERMISSION_MATCHING", &raw, e))?,
        };

        let log_format = match get("WARDEN_LOG_FORMAT") {
            None => LogFormat::default(),
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid("WARDEN_LOG_FORMAT", &raw, e))?,
        };

        Ok(Self {
            jwt_secret,
            bind_addr,
            token_ttl,
            bcrypt_cost,
            matching,
            database_url: get("DATABASE_URL"),
            log_format,
        })
    }
}
