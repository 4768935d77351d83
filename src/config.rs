use anyhow::Context;
use serde::Deserialize;
use time::{macros::format_description, UtcOffset};

use crate::aggregation::limits::HealthLimits;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub limits: HealthLimits,
    /// Offset that defines calendar days for every daily rollup.
    pub report_offset: UtcOffset,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "glycamed".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "glycamed-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 15),
            refresh_ttl_minutes: env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 7),
        };

        let defaults = HealthLimits::default();
        let limits = HealthLimits {
            sugar: env_or("HEALTH_SUGAR_MAX_G", defaults.sugar),
            caffeine: env_or("HEALTH_CAFFEINE_MAX_MG", defaults.caffeine),
            calories: env_or("HEALTH_CALORIES_MAX_KCAL", defaults.calories),
        };

        let report_offset = match std::env::var("REPORT_UTC_OFFSET") {
            Ok(raw) => parse_offset(&raw)?,
            Err(_) => UtcOffset::UTC,
        };

        Ok(Self {
            database_url,
            jwt,
            limits,
            report_offset,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Parses offsets written as `+01:00` or `-05:30`.
pub fn parse_offset(raw: &str) -> anyhow::Result<UtcOffset> {
    let format = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(raw.trim(), &format)
        .with_context(|| format!("invalid REPORT_UTC_OFFSET {raw:?}, expected e.g. +01:00"))
}
