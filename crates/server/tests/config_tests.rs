use config::Config;
use myauth::config::{AppConfig, SmtpConfig, ThemeConfig};

fn from_yaml<T: serde::de::DeserializeOwned>(yaml: &str) -> T {
    Config::builder()
        .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
        .build()
        .expect("Failed to build config")
        .try_deserialize()
        .expect("Failed to deserialize config")
}

#[test]
fn test_smtp_config_deserialization() {
    let smtp: SmtpConfig = from_yaml(
        r#"
server: "smtp.example.com"
port: 587
username: "user@example.com"
password: "secret123"
from: "noreply@example.com"
"#,
    );
    assert_eq!(smtp.server, "smtp.example.com");
    assert_eq!(smtp.port, 587);
    assert_eq!(smtp.from, "noreply@example.com");
}

#[test]
fn test_full_app_config_deserialization() {
    let app: AppConfig = from_yaml(
        r##"
database_url: "postgres://localhost/auth"
listen_addr: "127.0.0.1:9000"
public_url: "https://auth.example.com"
client_id: "web"
post_login_redirect: "https://example.com"
hook_secret: "0123456789abcdef0123456789abcdef"
issuer:
  upstream_url: "http://issuer:3000"
  theme:
    title: "Example"
    primary: "#112233"
    favicon: "https://example.com/favicon.ico"
    logo:
      dark: "https://example.com/dark.png"
      light: "https://example.com/light.png"
session:
  secure_cookie: true
  inactivity_seconds: 120
smtp:
  server: "smtp.example.com"
  port: 587
  username: "user"
  password: "pass"
  from: "auth@example.com"
"##,
    );

    app.validate().expect("valid config");
    assert_eq!(app.listen_addr.port(), 9000);
    assert_eq!(app.issuer.upstream_url, "http://issuer:3000");
    assert_eq!(app.issuer.theme.primary, "#112233");
    assert_ne!(app.issuer.theme, ThemeConfig::default());
    assert!(app.session.secure_cookie);
    assert_eq!(app.session.inactivity_seconds, 120);
    assert_eq!(app.smtp.expect("smtp section").port, 587);
}

#[test]
fn test_missing_required_field_fails() {
    let result = Config::builder()
        .add_source(config::File::from_str(
            r#"database_url: "sqlite::memory:""#,
            config::FileFormat::Yaml,
        ))
        .build()
        .expect("Failed to build config")
        .try_deserialize::<AppConfig>();
    assert!(result.is_err());
}
