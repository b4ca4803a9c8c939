pub mod config;
pub mod credentials;
pub mod errors;
pub mod fallback;
pub mod handler;
pub mod metrics_defs;
pub mod now_playing;
pub mod presence;
pub mod rate_limit;
pub mod response;
pub mod router;
pub mod service;
pub mod token;
pub mod upstream;
pub mod weather;

#[cfg(test)]
mod testutils;

use config::Config;
use credentials::Credentials;
use errors::AggregatorError;
use handler::Handler;
use now_playing::NowPlayingHandler;
use presence::PresenceHandler;
use rate_limit::RateLimiter;
use router::Router;
use service::AggregatorService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use std::time::Duration;
use token::TokenProvider;
use upstream::UpstreamClient;
use weather::WeatherHandler;

pub const PRESENCE_PATH: &str = "/api/discord";
pub const NOW_PLAYING_PATH: &str = "/api/spotify";
pub const WEATHER_PATH: &str = "/api/weather";

/// Serves the API and admin listeners until either fails.
pub async fn run(config: Config, credentials: Credentials) -> Result<(), AggregatorError> {
    let missing = credentials.missing();
    if !missing.is_empty() {
        tracing::warn!(missing = ?missing, "credentials not set, affected routes will fail");
    }

    let credentials = Arc::new(credentials);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeouts.http_timeout_secs))
        .build()?;

    let router = build_router(&config, credentials.clone(), client);
    let api_service = AggregatorService::new(router);

    let admin = admin_service(credentials);

    let api_task = run_http_service(&config.listener.host, config.listener.port, api_service);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin,
    );

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}

/// Readiness holds only while every credential is configured.
fn admin_service(
    credentials: Arc<Credentials>,
) -> AdminService<impl Fn() -> bool + Send + Sync + 'static, AggregatorError> {
    AdminService::new(move || credentials.is_complete())
}

/// Wires every route handler to its upstreams. All handlers share one HTTP
/// client and one set of credentials.
pub fn build_router(
    config: &Config,
    credentials: Arc<Credentials>,
    client: reqwest::Client,
) -> Router {
    let upstreams = &config.upstreams;
    let cache_control = &config.cache_control;

    let presence = PresenceHandler::new(
        UpstreamClient::new("discord", &upstreams.discord_url, client.clone()),
        credentials.clone(),
        cache_control.presence,
    );

    let tokens = TokenProvider::new(
        UpstreamClient::new(
            "spotify-accounts",
            &upstreams.spotify_accounts_url,
            client.clone(),
        ),
        credentials.clone(),
    );
    let now_playing = NowPlayingHandler::new(
        UpstreamClient::new("spotify", &upstreams.spotify_api_url, client.clone()),
        tokens,
        cache_control.now_playing,
    );

    let limiter = Arc::new(RateLimiter::new(Duration::from_secs(
        config.rate_limit.cooldown_secs,
    )));
    let weather = WeatherHandler::new(
        UpstreamClient::new("weather", &upstreams.weather_url, client),
        credentials,
        limiter,
        config.weather.clone(),
        cache_control.weather,
    );

    let presence: Arc<dyn Handler> = Arc::new(presence);
    let now_playing: Arc<dyn Handler> = Arc::new(now_playing);
    let weather: Arc<dyn Handler> = Arc::new(weather);
    Router::new(vec![
        (PRESENCE_PATH, presence),
        (NOW_PLAYING_PATH, now_playing),
        (WEATHER_PATH, weather),
    ])
}
