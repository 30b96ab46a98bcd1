//! Web server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TAXPOINT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `TAXPOINT_BASE_URL` - Public URL of the site (used for OAuth redirects)
//! - `TAXPOINT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `ADMIN_KEY` - Shared key required for admin sign-in
//! - `ADMIN_TOKEN_SECRET` - HMAC key for admin bearer tokens (min 32 chars, high entropy)
//! - `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD` - Outbound mail relay
//! - `EMAIL_FROM` - Sender address for all mail
//! - `NOTIFY_EMAIL` - Inbox that receives subscriber and contact notifications
//! - `STORAGE_UPLOAD_URL`, `STORAGE_UPLOAD_PRESET` - File storage upload endpoint
//! - `SHEETS_SPREADSHEET_ID`, `SHEETS_ACCESS_TOKEN` - Spreadsheet for lead rows
//!
//! ## Optional
//! - `TAXPOINT_HOST` - Bind address (default: 127.0.0.1)
//! - `TAXPOINT_PORT` - Listen port (default: 3000)
//! - `SMTP_PORT` - Relay port (default: 587)
//! - `STORAGE_FOLDER` - Upload folder (default: enquiries)
//! - `SHEETS_API_BASE` - Spreadsheet API base URL (default: <https://sheets.googleapis.com>)
//! - `SHEETS_ENQUIRY_TAB` - Tab for enquiry rows (default: Enquiries)
//! - `SHEETS_SUBSCRIBER_TAB` - Tab for subscriber rows (default: Subscribers)
//! - `MENU_FILE` - Navigation menu JSON file (default: data/menu.json)
//! - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET` - Enable Google sign-in (both or neither)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT` - Error tracking
//! - `LOG_FORMAT` - `text` (default) or `json`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SIGNING_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'text' or 'json', got '{other}'")),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the site
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Admin sign-in settings
    pub admin: AdminConfig,
    /// Outbound email settings
    pub email: EmailConfig,
    /// File storage settings
    pub storage: StorageConfig,
    /// Spreadsheet settings
    pub sheets: SheetsConfig,
    /// Google sign-in, if configured
    pub google: Option<GoogleOAuthConfig>,
    /// Navigation menu file
    pub menu_file: PathBuf,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Admin authentication configuration.
#[derive(Clone)]
pub struct AdminConfig {
    /// Shared key that must accompany admin credentials
    pub admin_key: SecretString,
    /// HMAC key for signing admin tokens
    pub token_secret: SecretString,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("admin_key", &"[REDACTED]")
            .field("token_secret", &"[REDACTED]")
            .finish()
    }
}

/// SMTP configuration.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    /// Sender address
    pub from_address: String,
    /// Internal notification inbox
    pub notify_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("notify_address", &self.notify_address)
            .finish()
    }
}

/// File storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Multipart upload endpoint
    pub upload_url: String,
    /// Unsigned upload preset name
    pub upload_preset: String,
    /// Destination folder
    pub folder: String,
}

/// Spreadsheet API configuration.
#[derive(Clone)]
pub struct SheetsConfig {
    pub api_base: String,
    pub spreadsheet_id: String,
    pub access_token: SecretString,
    pub enquiry_tab: String,
    pub subscriber_tab: String,
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("api_base", &self.api_base)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("access_token", &"[REDACTED]")
            .field("enquiry_tab", &self.enquiry_tab)
            .field("subscriber_tab", &self.subscriber_tab)
            .finish()
    }
}

/// Google OAuth client credentials.
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl std::fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("TAXPOINT_DATABASE_URL")?;
        let host = parse_env("TAXPOINT_HOST", "127.0.0.1")?;
        let port = parse_env("TAXPOINT_PORT", "3000")?;
        let base_url = get_required_env("TAXPOINT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("TAXPOINT_BASE_URL".to_string(), e.to_string())
        })?;

        let session_secret = get_signing_secret("TAXPOINT_SESSION_SECRET")?;

        let admin = AdminConfig {
            admin_key: get_validated_secret("ADMIN_KEY")?,
            token_secret: get_signing_secret("ADMIN_TOKEN_SECRET")?,
        };

        let email = EmailConfig {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port: parse_env("SMTP_PORT", "587")?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: SecretString::from(get_required_env("SMTP_PASSWORD")?),
            from_address: get_required_env("EMAIL_FROM")?,
            notify_address: get_required_env("NOTIFY_EMAIL")?,
        };

        let storage = StorageConfig {
            upload_url: get_required_env("STORAGE_UPLOAD_URL")?,
            upload_preset: get_required_env("STORAGE_UPLOAD_PRESET")?,
            folder: get_env_or_default("STORAGE_FOLDER", "enquiries"),
        };

        let sheets = SheetsConfig {
            api_base: get_env_or_default("SHEETS_API_BASE", "https://sheets.googleapis.com"),
            spreadsheet_id: get_required_env("SHEETS_SPREADSHEET_ID")?,
            access_token: SecretString::from(get_required_env("SHEETS_ACCESS_TOKEN")?),
            enquiry_tab: get_env_or_default("SHEETS_ENQUIRY_TAB", "Enquiries"),
            subscriber_tab: get_env_or_default("SHEETS_SUBSCRIBER_TAB", "Subscribers"),
        };

        let google = google_config(
            get_optional_env("GOOGLE_CLIENT_ID"),
            get_optional_env("GOOGLE_CLIENT_SECRET"),
        )?;

        let log_format = parse_env("LOG_FORMAT", "text")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            admin,
            email,
            storage,
            sheets,
            google,
            menu_file: PathBuf::from(get_env_or_default("MENU_FILE", "data/menu.json")),
            log_format,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute URL for a path on this site.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

/// Google sign-in needs both halves of the credential pair.
fn google_config(
    client_id: Option<String>,
    client_secret: Option<String>,
) -> Result<Option<GoogleOAuthConfig>, ConfigError> {
    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => Ok(Some(GoogleOAuthConfig {
            client_id,
            client_secret: SecretString::from(client_secret),
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::MissingEnvVar("GOOGLE_CLIENT_SECRET".to_string())),
        (None, Some(_)) => Err(ConfigError::MissingEnvVar("GOOGLE_CLIENT_ID".to_string())),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_signing_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SIGNING_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_SIGNING_SECRET_LENGTH} characters (got {})",
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load a secret and check it is not a placeholder.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Load a secret used as a MAC key: strength plus minimum length.
fn get_signing_secret(key: &str) -> Result<SecretString, ConfigError> {
    let secret = get_validated_secret(key)?;
    validate_signing_secret(&secret, key)?;
    Ok(secret)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// A complete configuration for unit tests. Nothing here is contacted.
    pub(crate) fn test_config() -> WebConfig {
        WebConfig {
            database_url: SecretString::from("postgres://localhost/taxpoint_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000/".to_string(),
            session_secret: SecretString::from("k7Rq2Zp9Lm4Xw1Vb8Nc3Hd6Tf0Gj5Ys!"),
            admin: AdminConfig {
                admin_key: SecretString::from("Qm8#vT2pLx9!rW4z"),
                token_secret: SecretString::from("Zp9Lm4Xw1Vb8Nc3Hd6Tf0Gj5Ysk7Rq2@"),
            },
            email: EmailConfig {
                smtp_host: "smtp.test.invalid".to_string(),
                smtp_port: 587,
                smtp_username: "mailer".to_string(),
                smtp_password: SecretString::from("smtp_pw_value"),
                from_address: "Taxpoint <hello@taxpoint.test>".to_string(),
                notify_address: "team@taxpoint.test".to_string(),
            },
            storage: StorageConfig {
                upload_url: "https://storage.test.invalid/upload".to_string(),
                upload_preset: "enquiries".to_string(),
                folder: "enquiries".to_string(),
            },
            sheets: SheetsConfig {
                api_base: "https://sheets.test.invalid".to_string(),
                spreadsheet_id: "sheet123".to_string(),
                access_token: SecretString::from("sheets_token_value"),
                enquiry_tab: "Enquiries".to_string(),
                subscriber_tab: "Subscribers".to_string(),
            },
            google: None,
            menu_file: PathBuf::from("data/menu.json"),
            log_format: LogFormat::Text,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-admin-key-here", "ADMIN_KEY").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(ref var, _) if var == "ADMIN_KEY"));
        assert!(validate_secret_strength("changeme123", "ADMIN_KEY").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("abababababababababababababababab", "X");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "X").is_ok());
    }

    #[test]
    fn test_validate_signing_secret_length() {
        assert!(validate_signing_secret(&SecretString::from("short"), "X").is_err());
        assert!(validate_signing_secret(&SecretString::from("a".repeat(32)), "X").is_ok());
    }

    #[test]
    fn test_google_config_needs_both_halves() {
        assert!(google_config(None, None).unwrap().is_none());
        assert!(
            google_config(Some("id".into()), Some("secret".into()))
                .unwrap()
                .is_some()
        );
        assert!(matches!(
            google_config(Some("id".into()), None),
            Err(ConfigError::MissingEnvVar(ref v)) if v == "GOOGLE_CLIENT_SECRET"
        ));
        assert!(google_config(None, Some("secret".into())).is_err());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("TEXT".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_socket_addr_and_url_for() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert_eq!(
            config.url_for("/auth/google/callback"),
            "http://localhost:3000/auth/google/callback"
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = test_config();
        let debug_output = format!("{:?} {:?} {:?}", config.admin, config.email, config.sheets);

        assert!(debug_output.contains("smtp.test.invalid"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("smtp_pw_value"));
        assert!(!debug_output.contains("sheets_token_value"));
        assert!(!debug_output.contains("Qm8#vT2pLx9!rW4z"));
    }
}
