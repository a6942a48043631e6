//! Runtime settings from the environment.
//!
//! `.env` is loaded by the binary before [`Settings::from_env`] runs; unset
//! variables fall back to defaults.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::cache::DEFAULT_CAPACITY;
use crate::error::ConfigError;

/// Offset applied to "now", in minutes east of UTC.
pub const OFFSET_VAR: &str = "XTECONV_UTC_OFFSET_MINUTES";
/// HTTP port for `serve`.
pub const PORT_VAR: &str = "XTECONV_PORT";
/// Decoded documents kept in memory by the server.
pub const CACHE_CAPACITY_VAR: &str = "XTECONV_CACHE_CAPACITY";

/// Brasília time, which has not observed daylight saving since 2019.
pub const DEFAULT_OFFSET_MINUTES: i32 = -180;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub offset: FixedOffset,
    pub port: u16,
    pub cache_capacity: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let minutes: i32 = parse_var(&lookup, OFFSET_VAR)?.unwrap_or(DEFAULT_OFFSET_MINUTES);
        let offset = offset_from_minutes(minutes).ok_or_else(|| ConfigError::InvalidValue {
            name: OFFSET_VAR,
            value: minutes.to_string(),
        })?;

        Ok(Self {
            offset,
            port: parse_var(&lookup, PORT_VAR)?.unwrap_or(DEFAULT_PORT),
            cache_capacity: parse_var(&lookup, CACHE_CAPACITY_VAR)?.unwrap_or(DEFAULT_CAPACITY),
        })
    }

    /// Current time in the configured offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            offset: offset_from_minutes(DEFAULT_OFFSET_MINUTES).unwrap_or_else(|| Utc.fix()),
            port: DEFAULT_PORT,
            cache_capacity: DEFAULT_CAPACITY,
        }
    }
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.offset.local_minus_utc(), -180 * 60);
        assert_eq!(s.port, 3000);
        assert_eq!(s.cache_capacity, 64);

        let d = Settings::default();
        assert_eq!(d.offset, s.offset);
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            (OFFSET_VAR, "60"),
            (PORT_VAR, "8080"),
            (CACHE_CAPACITY_VAR, " 0 "),
        ])
        .unwrap();
        assert_eq!(s.offset.local_minus_utc(), 3600);
        assert_eq!(s.port, 8080);
        assert_eq!(s.cache_capacity, 0);
    }

    #[test]
    fn test_blank_uses_default() {
        let s = settings(&[(PORT_VAR, "  ")]).unwrap();
        assert_eq!(s.port, 3000);
    }

    #[test]
    fn test_invalid_values() {
        let err = settings(&[(PORT_VAR, "http")]).unwrap_err();
        assert!(err.to_string().contains(PORT_VAR));

        // beyond +/- 24h
        let err = settings(&[(OFFSET_VAR, "2000")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name, .. } if name == OFFSET_VAR));
    }

    #[test]
    fn test_now_uses_offset() {
        let s = settings(&[(OFFSET_VAR, "-180")]).unwrap();
        assert_eq!(s.now().offset().local_minus_utc(), -10800);
    }
}
