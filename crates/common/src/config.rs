//! Client configuration.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use url::Url;

/// Location sent when the caller did not pick one.
pub const DEFAULT_LOCATION: &str = "unspecified";

/// API version used to build the default base URL.
pub const DEFAULT_API_VERSION: &str = "v1.0";

/// Feed client configuration.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// Public API key, sent as the `api_key` query parameter.
    pub api_key: String,
    /// Server-side secret used to sign feed tokens.
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Application identifier.
    #[serde(default)]
    pub app_id: Option<String>,
    /// Location (region) hint.
    #[serde(default)]
    pub location: Option<String>,
    /// Pre-issued bearer token used when no secret is available.
    #[serde(default)]
    pub token: Option<String>,
    /// API version segment of the base URL.
    #[serde(default = "default_version")]
    pub version: String,
    /// Explicit base URL, overriding the location-derived one.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout applied by the default transport.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

impl ClientConfig {
    /// Create a configuration holding only an API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: None,
            app_id: None,
            location: None,
            token: None,
            version: default_version(),
            base_url: None,
            timeout_secs: None,
        }
    }

    /// Set the API secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.api_secret = Some(secret.into());
        self
    }

    /// Set the pre-issued bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the application identifier.
    #[must_use]
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Set the location hint.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Override the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the transport timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// The API secret, if one is configured and non-empty.
    #[must_use]
    pub fn secret(&self) -> Option<&str> {
        non_empty(self.api_secret.as_ref())
    }

    /// The bearer token, if one is configured and non-empty.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        non_empty(self.token.as_ref())
    }

    /// The location to send, falling back to [`DEFAULT_LOCATION`].
    #[must_use]
    pub fn location_or_default(&self) -> &str {
        non_empty(self.location.as_ref()).unwrap_or(DEFAULT_LOCATION)
    }

    /// Resolve the base URL that relative API paths are joined onto.
    ///
    /// The result always ends with `/` so that `Url::join` keeps the
    /// version segment.
    pub fn resolve_base_url(&self) -> Result<Url, url::ParseError> {
        let raw = match (non_empty(self.base_url.as_ref()), non_empty(self.location.as_ref())) {
            (Some(base), _) => base.to_string(),
            (None, Some(location)) => format!(
                "https://{location}-api.stream-io-api.com/api/{}/",
                self.version
            ),
            (None, None) => format!("https://api.stream-io-api.com/api/{}/", self.version),
        };

        if raw.ends_with('/') {
            Url::parse(&raw)
        } else {
            Url::parse(&format!("{raw}/"))
        }
    }

    /// Load configuration from the environment.
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. `.env` in the working directory (if present)
    /// 2. `config/stream.toml` (if present)
    /// 3. Environment variables with the `STREAM_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_sources(
            config::File::with_name("config/stream").required(false),
            config::Environment::with_prefix("STREAM"),
        )
    }

    /// Load configuration from a specific file, still honouring `STREAM_` variables.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        Self::from_sources(
            config::File::from(path.as_ref()),
            config::Environment::with_prefix("STREAM"),
        )
    }

    fn from_sources<F>(file: F, environment: config::Environment) -> Result<Self, config::ConfigError>
    where
        F: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .field("app_id", &self.app_id)
            .field("location", &self.location)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("version", &self.version)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
