//! Process configuration from environment variables.

use std::net::SocketAddr;

use thiserror::Error;

use dealroom_infra::LifecycleConfig;
use dealroom_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub log_format: LogFormat,
    pub lifecycle: LifecycleConfig,
}

impl ApiConfig {
    /// Read `DEALROOM_BIND_ADDR`, `JWT_SECRET`, `DEALROOM_INVITATION_TTL_DAYS` and
    /// `DEALROOM_LOG_FORMAT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] with an injectable lookup (tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("DEALROOM_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "DEALROOM_BIND_ADDR",
                message: e.to_string(),
            })?;

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let log_format = match lookup("DEALROOM_LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|message| ConfigError::Invalid {
                var: "DEALROOM_LOG_FORMAT",
                message,
            })?,
            None => LogFormat::default(),
        };

        let mut lifecycle = LifecycleConfig::default();
        if let Some(raw) = lookup("DEALROOM_INVITATION_TTL_DAYS") {
            let days = raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "DEALROOM_INVITATION_TTL_DAYS",
                    message: format!("expected a positive whole number of days, got '{raw}'"),
                })?;
            lifecycle = lifecycle.with_invitation_ttl_days(days);
        }

        Ok(Self {
            bind_addr,
            jwt_secret,
            log_format,
            lifecycle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.lifecycle, LifecycleConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("DEALROOM_BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("DEALROOM_LOG_FORMAT", "pretty"),
            ("DEALROOM_INVITATION_TTL_DAYS", "3"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.lifecycle.invitation_ttl, chrono::Duration::days(3));
    }

    #[test]
    fn rejects_bad_ttl() {
        let err = config(&[("DEALROOM_INVITATION_TTL_DAYS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "DEALROOM_INVITATION_TTL_DAYS", .. }));
    }
}
