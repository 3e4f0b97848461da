//! Configuration types.
//!
//! Everything is read once at startup from the environment. Upstream
//! endpoints and credentials have no compiled-in defaults.

use std::path::PathBuf;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;

/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Default header carrying the classifier credential.
pub const DEFAULT_KEY_HEADER: &str = "A4A-CLIENT-APP-ID";

/// How an image reaches a classification endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStrategy {
    /// Download the image and upload its bytes as a multipart part.
    #[default]
    Multipart,
    /// Forward the image URL and let the upstream fetch it.
    Url,
}

impl FromStr for UploadStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multipart" | "bytes" => Ok(Self::Multipart),
            "url" => Ok(Self::Url),
            other => Err(format!("unknown upload strategy '{other}' (expected multipart or url)")),
        }
    }
}

/// One upstream classification endpoint.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub api_key: SecretString,
    pub key_header: String,
    pub upload: UploadStrategy,
}

/// Messaging platform settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    pub api_base: String,
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub telegram: TelegramConfig,
    pub safety: ClassifierConfig,
    pub detection: ClassifierConfig,
    pub brands: ClassifierConfig,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PHOTO_INGEST_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "PHOTO_INGEST_PORT".into(),
                message: format!("{e}"),
            })?,
            None => 3000,
        };

        let db_path = get("PHOTO_INGEST_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/photo-ingest.db"));

        let log_dir = get("LOG_DIR").map(PathBuf::from);

        let bot_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("BOT_TOKEN"))
            .ok_or_else(|| ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".into()))?;

        let telegram = TelegramConfig {
            bot_token: SecretString::from(bot_token),
            api_base: get("TELEGRAM_API_BASE")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string()),
        };

        Ok(Self {
            port,
            db_path,
            log_dir,
            telegram,
            safety: classifier_from(&get, "SAFETY")?,
            detection: classifier_from(&get, "DETECTION")?,
            brands: classifier_from(&get, "BRAND")?,
        })
    }
}

fn classifier_from<G>(get: &G, prefix: &str) -> Result<ClassifierConfig, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let required = |suffix: &str| {
        let key = format!("{prefix}_{suffix}");
        get(&key).ok_or(ConfigError::MissingEnvVar(key))
    };

    let endpoint = required("API_URL")?;
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            key: format!("{prefix}_API_URL"),
            message: "must be an http(s) URL".into(),
        });
    }

    let api_key = SecretString::from(required("API_KEY")?);

    let key_header = get(&format!("{prefix}_API_KEY_HEADER"))
        .unwrap_or_else(|| DEFAULT_KEY_HEADER.to_string());

    let upload_key = format!("{prefix}_UPLOAD");
    let upload = match get(&upload_key) {
        Some(raw) => raw
            .parse()
            .map_err(|message| ConfigError::InvalidValue { key: upload_key, message })?,
        None => UploadStrategy::default(),
    };

    Ok(ClassifierConfig {
        endpoint,
        api_key,
        key_header,
        upload,
    })
}

impl ClassifierConfig {
    /// Credential value, exposed only at the request site.
    pub(crate) fn credential(&self) -> &str {
        self.api_key.expose_secret()
    }
}
