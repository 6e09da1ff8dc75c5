use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::fetch::{Credentials, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::product::{DEFAULT_OPEN_BASE_URL, DEFAULT_RESTRICTED_BASE_URL, is_http_url};

pub const ENV_DATA_DIR: &str = "JMA_GSM_DATA_DIR";
/// Older name of [`ENV_DATA_DIR`], still honoured.
pub const ENV_DATA_DIR_LEGACY: &str = "BALLOON_SIM_DATA_DIR";
pub const ENV_RESTRICTED_BASE_URL: &str = "JMA_HR_GSM_BASE_URL";
/// Older name of [`ENV_RESTRICTED_BASE_URL`], still honoured.
pub const ENV_RESTRICTED_BASE_URL_LEGACY: &str = "JMA_GSM_BASE_URL";
pub const ENV_OPEN_BASE_URL: &str = "JMA_OPEN_GRIB_BASE_URL";
pub const ENV_USER: &str = "JMA_WIS_USER";
pub const ENV_PASSWORD: &str = "JMA_WIS_PASSWORD";

/// Process-wide settings, resolved once and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub restricted_base_url: String,
    pub open_base_url: String,
    /// Only ever sent to the restricted product.
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            restricted_base_url: DEFAULT_RESTRICTED_BASE_URL.to_string(),
            open_base_url: DEFAULT_OPEN_BASE_URL.to_string(),
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Read the `JMA_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an injected variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let cfg = Self {
            data_dir: get(ENV_DATA_DIR)
                .or_else(|| get(ENV_DATA_DIR_LEGACY))
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            restricted_base_url: get(ENV_RESTRICTED_BASE_URL)
                .or_else(|| get(ENV_RESTRICTED_BASE_URL_LEGACY))
                .unwrap_or(defaults.restricted_base_url),
            open_base_url: get(ENV_OPEN_BASE_URL).unwrap_or(defaults.open_base_url),
            credentials: Credentials::from_parts(get(ENV_USER), get(ENV_PASSWORD)),
            ..defaults
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Both base URLs must be absolute `http(s)` URLs.
    pub fn validate(&self) -> Result<()> {
        for (name, base) in [
            ("restricted base url", &self.restricted_base_url),
            ("open base url", &self.open_base_url),
        ] {
            if !is_http_url(base) {
                return Err(Error::InvalidInput(format!(
                    "{name} must start with http:// or https://, got {base:?}"
                )));
            }
            Url::parse(base).map_err(|e| {
                Error::InvalidInput(format!("{name} {base:?} is not a valid url: {e}"))
            })?;
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidInput("timeout must be > 0".into()));
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
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.restricted_base_url, DEFAULT_RESTRICTED_BASE_URL);
        assert_eq!(cfg.open_base_url, DEFAULT_OPEN_BASE_URL);
        assert!(cfg.credentials.is_none());
        assert_eq!(cfg.timeout, Duration::from_secs(300));
    }

    #[test]
    fn env_overrides_and_legacy_fallback() {
        let cfg = Config::from_lookup(lookup(&[
            (ENV_DATA_DIR, "/srv/gsm"),
            (ENV_RESTRICTED_BASE_URL_LEGACY, "https://legacy.test/hr/"),
            (ENV_OPEN_BASE_URL, "http://mirror.test/open"),
            (ENV_USER, "alice"),
            (ENV_PASSWORD, "pw"),
        ]))
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/gsm"));
        assert_eq!(cfg.restricted_base_url, "https://legacy.test/hr/");
        assert_eq!(cfg.open_base_url, "http://mirror.test/open");
        assert_eq!(cfg.credentials, Some(Credentials::new("alice", "pw")));

        let cfg = Config::from_lookup(lookup(&[
            (ENV_RESTRICTED_BASE_URL, "https://new.test/hr"),
            (ENV_RESTRICTED_BASE_URL_LEGACY, "https://legacy.test/hr/"),
        ]))
        .unwrap();
        assert_eq!(cfg.restricted_base_url, "https://new.test/hr");
    }

    #[test]
    fn data_dir_falls_back_to_legacy_name() {
        let cfg = Config::from_lookup(lookup(&[(ENV_DATA_DIR_LEGACY, "/old/data")])).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/old/data"));

        let cfg = Config::from_lookup(lookup(&[
            (ENV_DATA_DIR, "/new/data"),
            (ENV_DATA_DIR_LEGACY, "/old/data"),
        ]))
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/new/data"));
    }

    #[test]
    fn credentials_need_user_and_password() {
        let cfg = Config::from_lookup(lookup(&[(ENV_USER, "alice"), (ENV_PASSWORD, "")])).unwrap();
        assert!(cfg.credentials.is_none());
    }

    #[test]
    fn rejects_non_http_base() {
        let err = Config::from_lookup(lookup(&[(ENV_OPEN_BASE_URL, "ftp://x/")])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn rejects_zero_timeout() {
        let cfg = Config {
            timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
