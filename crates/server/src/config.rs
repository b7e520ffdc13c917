use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Logo variants shown by the issuer's login pages.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, utoipa::ToSchema)]
pub struct LogoConfig {
    pub dark: String,
    pub light: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, utoipa::ToSchema)]
pub struct ThemeConfig {
    pub title: String,
    /// Primary brand colour as `#rrggbb`.
    pub primary: String,
    pub favicon: String,
    pub logo: LogoConfig,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            title: "myAuth".into(),
            primary: "#0051c3".into(),
            favicon: "https://workers.cloudflare.com//favicon.ico".into(),
            logo: LogoConfig {
                dark: "https://imagedelivery.net/wSMYJvS3Xw-n339CbDyDIA/db1e5c92-d3a6-4ea9-3e72-155844211f00/public".into(),
                light: "https://imagedelivery.net/wSMYJvS3Xw-n339CbDyDIA/fa5a3023-7da9-466b-98a7-4ce01ee6c700/public".into(),
            },
        }
    }
}

/// Text overrides for the password provider's UI.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, utoipa::ToSchema)]
pub struct PasswordCopy {
    pub input_code: String,
}

impl Default for PasswordCopy {
    fn default() -> Self {
        Self {
            input_code: "Code (check server logs)".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct IssuerConfig {
    /// Base URL of the issuer every unmatched request is forwarded to.
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub copy: PasswordCopy,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            upstream_url: default_upstream_url(),
            theme: ThemeConfig::default(),
            copy: PasswordCopy::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub secure_cookie: bool,
    /// Sessions expire after this many seconds without a request.
    #[serde(default = "default_inactivity_seconds")]
    pub inactivity_seconds: i64,
    /// How often expired session records are deleted.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secure_cookie: false,
            inactivity_seconds: default_inactivity_seconds(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Externally visible origin of this server, e.g. `https://auth.example.com`.
    pub public_url: String,
    pub client_id: String,
    /// Where the browser lands after a successful login.
    pub post_login_redirect: String,
    /// Shared HS256 secret for tokens minted by the issuer's hooks.
    pub hook_secret: String,
    #[serde(default)]
    pub issuer: IssuerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    /// `public_url` without a trailing slash.
    pub fn origin(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hook_secret.len() < 32 {
            return Err(ConfigError::Validation(
                "hook_secret must be at least 32 characters".into(),
            ));
        }
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Validation("client_id must not be empty".into()));
        }
        for (name, value) in [
            ("public_url", &self.public_url),
            ("post_login_redirect", &self.post_login_redirect),
            ("issuer.upstream_url", &self.issuer.upstream_url),
        ] {
            let parsed = Url::parse(value)
                .map_err(|e| ConfigError::Validation(format!("{name} is not a valid URL: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Validation(format!(
                    "{name} must be an http(s) URL"
                )));
            }
        }
        if !is_hex_colour(&self.issuer.theme.primary) {
            return Err(ConfigError::Validation(
                "issuer.theme.primary must look like #rrggbb".into(),
            ));
        }
        if self.session.inactivity_seconds <= 0 {
            return Err(ConfigError::Validation(
                "session.inactivity_seconds must be > 0".into(),
            ));
        }
        if self.session.cleanup_interval_seconds == 0 {
            return Err(ConfigError::Validation(
                "session.cleanup_interval_seconds must be > 0".into(),
            ));
        }
        if self.smtp.as_ref().is_some_and(|smtp| smtp.port == 0) {
            return Err(ConfigError::Validation("smtp.port must be > 0".into()));
        }
        Ok(())
    }
}

fn is_hex_colour(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_upstream_url() -> String {
    "http://127.0.0.1:3000".into()
}

fn default_inactivity_seconds() -> i64 {
    600
}

fn default_cleanup_interval_seconds() -> u64 {
    60
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// A `.env` file is read first if present. Environment variables override file
/// values using `__` as the path separator (e.g. `ISSUER__UPSTREAM_URL`).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let _ = dotenvy::dotenv();
    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml").required(false))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}
