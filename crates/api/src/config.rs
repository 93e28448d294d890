//! Server configuration.
//!
//! Sources are merged in this order (later sources override earlier):
//! 1. `AppConfig::default()`
//! 2. `tokengate.toml` in the working directory, if present
//! 3. `TOKENGATE_*` environment variables, nested keys split by `__`
//!    (e.g. `TOKENGATE_COOKIE__SECURE=false`)

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tracing::warn;

use tokengate_auth::{SessionTtl, SigningSecret};
use tokengate_observability::LogSettings;

pub const DEFAULT_CONFIG_FILE: &str = "tokengate.toml";
pub const ENV_PREFIX: &str = "TOKENGATE_";

const DEV_SECRET: &str = "dev-secret";

/// `SameSite` attribute of the refresh cookie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameSitePolicy {
    #[default]
    Strict,
    Lax,
    None,
}

impl core::fmt::Display for SameSitePolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            SameSitePolicy::Strict => "Strict",
            SameSitePolicy::Lax => "Lax",
            SameSitePolicy::None => "None",
        };
        f.write_str(s)
    }
}

/// Flags applied to the `refresh_token` cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSitePolicy,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSitePolicy::Strict,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub jwt_secret: Option<String>,
    pub access_ttl_secs: i64,
    pub refresh_ttl_days: i64,
    pub cookie: CookieSettings,
    /// Root account created at start-up when both are set and the email is unused.
    pub root_email: Option<String>,
    pub root_password: Option<String>,
    pub log: LogSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            jwt_secret: None,
            access_ttl_secs: SessionTtl::DEFAULT_ACCESS_SECS,
            refresh_ttl_days: SessionTtl::DEFAULT_REFRESH_DAYS,
            cookie: CookieSettings::default(),
            root_email: None,
            root_password: None,
            log: LogSettings::default(),
        }
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .field("cookie", &self.cookie)
            .field("root_email", &self.root_email)
            .field("root_password", &self.root_password.as_ref().map(|_| "<redacted>"))
            .field("log", &self.log)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Defaults only; further providers are merged on top.
    pub fn base() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
    }

    /// Defaults, then `tokengate.toml`, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let figment = Self::base()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(figment)
    }

    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.access_ttl_secs <= 0 {
            return Err(ConfigError::Invalid("access_ttl_secs must be positive".into()));
        }
        if self.refresh_ttl_days <= 0 {
            return Err(ConfigError::Invalid("refresh_ttl_days must be positive".into()));
        }
        if self.cookie.same_site == SameSitePolicy::None && !self.cookie.secure {
            return Err(ConfigError::Invalid(
                "cookie.same_site = none requires cookie.secure = true".into(),
            ));
        }
        if self.root_email.is_some() != self.root_password.is_some() {
            return Err(ConfigError::Invalid(
                "root_email and root_password must be set together".into(),
            ));
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> SessionTtl {
        SessionTtl {
            access: chrono::Duration::seconds(self.access_ttl_secs),
            refresh: chrono::Duration::days(self.refresh_ttl_days),
        }
    }

    /// The configured secret, or an insecure development default.
    pub fn signing_secret(&self) -> SigningSecret {
        match self.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => SigningSecret::from(secret),
            None => {
                warn!("jwt_secret not set; using insecure dev default");
                SigningSecret::from(DEV_SECRET)
            }
        }
    }
}
