use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::warn;

const DEFAULT_SECRET: &str = "dev";

/// Ten years; keeps session expiry well inside chrono's range.
const MAX_SESSION_DAYS: i64 = 3650;

/// Server settings, read from `BLOGR_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: String,
    pub database: PathBuf,
    pub host: String,
    pub port: u16,
    pub session_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret_key = var("BLOGR_SECRET_KEY").unwrap_or_else(|| {
            warn!("BLOGR_SECRET_KEY is unset; using the development secret");
            DEFAULT_SECRET.into()
        });
        let database: PathBuf = var("BLOGR_DATABASE")
            .unwrap_or_else(|| "instance/blogr.sqlite".into())
            .into();
        let host = var("BLOGR_HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port: u16 = var("BLOGR_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("BLOGR_PORT must be a port number")?;
        let session_days: i64 = var("BLOGR_SESSION_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("BLOGR_SESSION_DAYS must be a whole number of days")?;
        if !(1..=MAX_SESSION_DAYS).contains(&session_days) {
            bail!(
                "BLOGR_SESSION_DAYS must be between 1 and {}, got {}",
                MAX_SESSION_DAYS,
                session_days
            );
        }

        Ok(Self {
            secret_key,
            database,
            host,
            port,
            session_days,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    /// Create the directory holding the database file if it is missing.
    pub fn ensure_instance_dir(&self) -> Result<()> {
        if let Some(dir) = self.database.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.secret_key, "dev");
        assert_eq!(config.database, PathBuf::from("instance/blogr.sqlite"));
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:5000");
        assert_eq!(config.session_days, 30);
    }

    #[test]
    fn overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BLOGR_SECRET_KEY", "s3cret"),
            ("BLOGR_DATABASE", "/tmp/b.sqlite"),
            ("BLOGR_HOST", "0.0.0.0"),
            ("BLOGR_PORT", "8080"),
            ("BLOGR_SESSION_DAYS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.secret_key, "s3cret");
        assert_eq!(config.database, PathBuf::from("/tmp/b.sqlite"));
        assert_eq!(config.addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.session_days, 1);
    }

    #[test]
    fn non_positive_session_days_are_rejected() {
        for days in ["0", "-1"] {
            let err = Config::from_lookup(lookup(&[("BLOGR_SESSION_DAYS", days)])).unwrap_err();
            assert!(err.to_string().contains("BLOGR_SESSION_DAYS"));
        }
    }

    #[test]
    fn oversized_session_days_are_rejected() {
        for days in ["3651", "100000000", "9223372036854775807"] {
            let err = Config::from_lookup(lookup(&[("BLOGR_SESSION_DAYS", days)])).unwrap_err();
            assert!(err.to_string().contains("BLOGR_SESSION_DAYS"));
        }

        let config = Config::from_lookup(lookup(&[("BLOGR_SESSION_DAYS", "3650")])).unwrap();
        assert_eq!(config.session_days, 3650);
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(Config::from_lookup(lookup(&[("BLOGR_PORT", "http")])).is_err());
    }
}
