use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DISCORD_URL: &str = "https://discord.com/api/v10";
pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com";
pub const WEATHER_URL: &str = "https://api.openweathermap.org";

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Invalid upstream URL for {name}: {reason}")]
    InvalidUpstreamUrl { name: &'static str, reason: String },

    #[error("HTTP timeout cannot be 0")]
    InvalidTimeout,

    #[error("Rate limit cooldown cannot be 0")]
    InvalidCooldown,

    #[error("Weather city cannot be empty")]
    EmptyCity,
}

/// Aggregator configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for the public API routes
    pub listener: Listener,
    /// Listener for the health and readiness endpoints
    pub admin_listener: Listener,
    /// Base URLs of the third-party services
    #[serde(default)]
    pub upstreams: Upstreams,
    #[serde(default)]
    pub timeouts: Timeouts,
    /// Response caching policy per route
    #[serde(default)]
    pub cache_control: CacheControl,
    #[serde(default)]
    pub rate_limit: RateLimit,
    #[serde(default)]
    pub weather: Weather,
}

impl Config {
    /// Validates the aggregator configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.upstreams.validate()?;

        if self.timeouts.http_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        if self.rate_limit.cooldown_secs == 0 {
            return Err(ValidationError::InvalidCooldown);
        }

        if self.weather.city.trim().is_empty() {
            return Err(ValidationError::EmptyCity);
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Base URLs for each upstream. Paths are appended verbatim, so a base may
/// carry a path prefix such as `/api/v10`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Upstreams {
    pub discord_url: String,
    pub spotify_accounts_url: String,
    pub spotify_api_url: String,
    pub weather_url: String,
}

impl Default for Upstreams {
    fn default() -> Self {
        Upstreams {
            discord_url: DISCORD_URL.into(),
            spotify_accounts_url: SPOTIFY_ACCOUNTS_URL.into(),
            spotify_api_url: SPOTIFY_API_URL.into(),
            weather_url: WEATHER_URL.into(),
        }
    }
}

impl Upstreams {
    fn validate(&self) -> Result<(), ValidationError> {
        let all = [
            ("discord_url", &self.discord_url),
            ("spotify_accounts_url", &self.spotify_accounts_url),
            ("spotify_api_url", &self.spotify_api_url),
            ("weather_url", &self.weather_url),
        ];

        for (name, url) in all {
            Url::parse(url).map_err(|e| ValidationError::InvalidUpstreamUrl {
                name,
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    /// Applies to each upstream call, including reading the body
    pub http_timeout_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            http_timeout_secs: 10,
        }
    }
}

/// `Cache-Control` policy attached to successful route responses
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum CachePolicy {
    NoStore,
    Public { max_age_secs: u64 },
}

impl CachePolicy {
    pub fn header_value(&self) -> String {
        match self {
            CachePolicy::NoStore => "no-store, max-age=0".to_string(),
            CachePolicy::Public { max_age_secs } => format!("public, max-age={max_age_secs}"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheControl {
    pub presence: CachePolicy,
    pub now_playing: CachePolicy,
    pub weather: CachePolicy,
}

impl Default for CacheControl {
    fn default() -> Self {
        CacheControl {
            presence: CachePolicy::NoStore,
            now_playing: CachePolicy::NoStore,
            weather: CachePolicy::NoStore,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RateLimit {
    pub cooldown_secs: u64,
}

impl Default for RateLimit {
    fn default() -> Self {
        RateLimit { cooldown_secs: 30 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Weather {
    pub city: String,
    pub units: String,
}

impl Default for Weather {
    fn default() -> Self {
        Weather {
            city: "Helsinki".into(),
            units: "metric".into(),
        }
    }
}
