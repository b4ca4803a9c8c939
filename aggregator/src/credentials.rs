use crate::errors::AggregatorError;
use std::fmt;

pub const DISCORD_BOT_TOKEN: &str = "DISCORD_BOT_TOKEN";
pub const DISCORD_GUILD_ID: &str = "DISCORD_GUILD_ID";
pub const SPOTIFY_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const SPOTIFY_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
pub const SPOTIFY_REFRESH_TOKEN: &str = "SPOTIFY_REFRESH_TOKEN";
pub const OPENWEATHERMAP_API_KEY: &str = "OPENWEATHERMAP_API_KEY";

/// A configured value that must never show up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

/// Long-lived credentials for every upstream, read once at startup.
///
/// Absent values are kept as `None` so a route can report exactly which one
/// is missing instead of failing the whole process.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    pub discord_bot_token: Option<Secret>,
    pub discord_guild_id: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<Secret>,
    pub spotify_refresh_token: Option<Secret>,
    pub weather_api_key: Option<Secret>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from any name lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Credentials {
            discord_bot_token: get(DISCORD_BOT_TOKEN).map(Secret),
            discord_guild_id: get(DISCORD_GUILD_ID),
            spotify_client_id: get(SPOTIFY_CLIENT_ID),
            spotify_client_secret: get(SPOTIFY_CLIENT_SECRET).map(Secret),
            spotify_refresh_token: get(SPOTIFY_REFRESH_TOKEN).map(Secret),
            weather_api_key: get(OPENWEATHERMAP_API_KEY).map(Secret),
        }
    }

    /// Names of every credential that is not configured.
    pub fn missing(&self) -> Vec<&'static str> {
        let present = [
            (DISCORD_BOT_TOKEN, self.discord_bot_token.is_some()),
            (DISCORD_GUILD_ID, self.discord_guild_id.is_some()),
            (SPOTIFY_CLIENT_ID, self.spotify_client_id.is_some()),
            (SPOTIFY_CLIENT_SECRET, self.spotify_client_secret.is_some()),
            (SPOTIFY_REFRESH_TOKEN, self.spotify_refresh_token.is_some()),
            (OPENWEATHERMAP_API_KEY, self.weather_api_key.is_some()),
        ];

        present
            .into_iter()
            .filter(|(_, is_set)| !is_set)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Returns the value or a configuration error naming the variable.
pub(crate) fn require<'a, T>(
    value: &'a Option<T>,
    name: &'static str,
) -> Result<&'a T, AggregatorError> {
    value.as_ref().ok_or(AggregatorError::Configuration(name))
}
