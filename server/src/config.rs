use anyhow::{Context, Result, anyhow};
use axum_extra::extract::cookie::Key;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{Duration, FixedOffset};

const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cookie_key: Key,
    pub cookie_secure: bool,
    pub session_ttl: Duration,
    pub utc_offset: FixedOffset,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cookie_secret =
            std::env::var("COOKIE_SECRET_BASE64").context("COOKIE_SECRET_BASE64 missing")?;
        let cookie_key = cookie_key_from_base64(&cookie_secret)?;

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .ok()
            .map(|val| parse_flag(&val))
            .unwrap_or(true);

        let session_ttl_days = match std::env::var("SESSION_TTL_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or_else(|| anyhow!("SESSION_TTL_DAYS must be a positive integer"))?,
            Err(_) => DEFAULT_SESSION_TTL_DAYS,
        };

        let utc_offset = match std::env::var("ATTENDANCE_UTC_OFFSET_MINUTES") {
            Ok(raw) => parse_offset_minutes(&raw)?,
            Err(_) => FixedOffset::east_opt(0).ok_or_else(|| anyhow!("invalid UTC offset"))?,
        };

        let cors_allowed_origins = split_origins(
            &std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        Ok(Self {
            cookie_key,
            cookie_secure,
            session_ttl: Duration::days(session_ttl_days),
            utc_offset,
            cors_allowed_origins,
        })
    }
}

pub fn cookie_key_from_base64(encoded: &str) -> Result<Key> {
    let secret_bytes = STANDARD
        .decode(encoded.trim())
        .context("invalid COOKIE_SECRET_BASE64")?;
    if secret_bytes.len() < 32 {
        return Err(anyhow!(
            "COOKIE_SECRET_BASE64 must decode to at least 32 bytes"
        ));
    }
    // The private jar needs 64 bytes of key material.
    Ok(Key::derive_from(&secret_bytes))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_offset_minutes(raw: &str) -> Result<FixedOffset> {
    let minutes = raw
        .trim()
        .parse::<i32>()
        .context("ATTENDANCE_UTC_OFFSET_MINUTES must be an integer")?;
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| anyhow!("ATTENDANCE_UTC_OFFSET_MINUTES out of range: {minutes}"))
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}
