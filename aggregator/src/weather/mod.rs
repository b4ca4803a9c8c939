//! `GET /api/weather`
//!
//! Current conditions for the configured city. This is the only route behind
//! the per-client rate limiter.

pub mod protocol;

use crate::config::{CachePolicy, Weather};
use crate::credentials::{Credentials, OPENWEATHERMAP_API_KEY, require};
use crate::errors::AggregatorError;
use crate::handler::Handler;
use crate::metrics_defs::RATE_LIMIT_REJECTED;
use crate::rate_limit::{RateLimiter, client_key, now_millis};
use crate::response::{ErrorBody, NO_STORE, json_response};
use crate::upstream::{Auth, CacheDirective, UpstreamClient};
use async_trait::async_trait;
use http::header::{HeaderValue, RETRY_AFTER};
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use protocol::{WeatherReport, decode_weather};
use serde::Serialize;
use shared::counter;
use std::sync::Arc;
use std::time::Duration;

const ROUTE: &str = "weather";

pub const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";

pub const FETCH_FAILED: &str = "Failed to fetch weather data";
pub const RATE_LIMITED: &str = "Rate limit exceeded";

/// Conditions change slowly; intermediaries may reuse a recent answer.
const UPSTREAM_MAX_AGE: Duration = Duration::from_secs(300);

#[derive(Serialize)]
struct RateLimitedBody {
    error: &'static str,
    cooldown: u64,
}

pub struct WeatherHandler {
    api: UpstreamClient,
    credentials: Arc<Credentials>,
    limiter: Arc<RateLimiter>,
    location: Weather,
    cache_policy: CachePolicy,
}

impl WeatherHandler {
    pub fn new(
        api: UpstreamClient,
        credentials: Arc<Credentials>,
        limiter: Arc<RateLimiter>,
        location: Weather,
        cache_policy: CachePolicy,
    ) -> Self {
        WeatherHandler {
            api,
            credentials,
            limiter,
            location,
            cache_policy,
        }
    }

    async fn lookup(&self) -> Result<WeatherReport, AggregatorError> {
        let api_key = require(&self.credentials.weather_api_key, OPENWEATHERMAP_API_KEY)?;

        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("q", &self.location.city)
            .append_pair("appid", api_key.expose())
            .append_pair("units", &self.location.units)
            .finish();

        let response = self
            .api
            .get(
                &format!("{CURRENT_WEATHER_PATH}?{query}"),
                Auth::None,
                CacheDirective::Revalidate(UPSTREAM_MAX_AGE),
            )
            .await?;

        if !response.status().is_success() {
            return Err(AggregatorError::UpstreamHttp {
                upstream: self.api.name().to_string(),
                status: response.status().as_u16(),
            });
        }

        decode_weather(self.api.name(), response.body())
    }

    fn rate_limited(&self, client: &str, wait_secs: u64) -> Response<Bytes> {
        counter!(RATE_LIMIT_REJECTED).increment(1);
        tracing::info!(route = ROUTE, client, wait_secs, "rate limited");

        let mut response = json_response(
            StatusCode::TOO_MANY_REQUESTS,
            &RateLimitedBody {
                error: RATE_LIMITED,
                cooldown: wait_secs,
            },
            NO_STORE,
        );
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(wait_secs));
        response
    }
}

#[async_trait]
impl Handler for WeatherHandler {
    fn name(&self) -> &'static str {
        ROUTE
    }

    async fn handle(&self, request: Request<()>) -> Response<Bytes> {
        let client = client_key(request.headers());
        if let Err(wait_secs) = self.limiter.check_and_record(&client, now_millis()) {
            return self.rate_limited(&client, wait_secs);
        }

        match self.lookup().await {
            Ok(report) => json_response(StatusCode::OK, &report, &self.cache_policy.header_value()),
            Err(e) => {
                tracing::error!(route = ROUTE, error = %e, "weather lookup failed");
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &ErrorBody::with_details(FETCH_FAILED, e),
                    NO_STORE,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{
        MockUpstream, body_json, credentials_with, test_credentials, test_http_client,
    };
    use http::header::CACHE_CONTROL;
    use hyper::Method;
    use serde_json::json;

    const CLEAR_SKY: &str = r#"{
        "main": {"temp": 15.4},
        "weather": [{"description": "clear sky", "icon": "01d"}]
    }"#;

    fn handler(mock: &MockUpstream, credentials: Credentials) -> WeatherHandler {
        WeatherHandler::new(
            UpstreamClient::new("weather", &mock.url(), test_http_client()),
            Arc::new(credentials),
            Arc::new(RateLimiter::new(Duration::from_secs(30))),
            Weather::default(),
            CachePolicy::NoStore,
        )
    }

    fn request(client: &str) -> Request<()> {
        Request::builder()
            .uri("/api/weather")
            .header("x-forwarded-for", client)
            .body(())
            .unwrap()
    }

    #[tokio::test]
    async fn test_current_weather() {
        let mock = MockUpstream::start().await;
        mock.respond(Method::GET, CURRENT_WEATHER_PATH, 200, CLEAR_SKY);

        let response = handler(&mock, test_credentials())
            .handle(request("203.0.113.7"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], NO_STORE);
        assert_eq!(
            body_json(&response),
            json!({"temperature": 15, "description": "clear sky", "icon": "01d"})
        );

        let requests = mock.requests_to(CURRENT_WEATHER_PATH);
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].query.as_deref(),
            Some("q=Helsinki&appid=weather-key&units=metric")
        );
        assert_eq!(requests[0].header("cache-control"), Some("max-age=300"));
        assert_eq!(requests[0].header("authorization"), None);
    }

    #[tokio::test]
    async fn test_city_is_encoded() {
        let mock = MockUpstream::start().await;
        mock.respond(Method::GET, CURRENT_WEATHER_PATH, 200, CLEAR_SKY);

        let handler = WeatherHandler::new(
            UpstreamClient::new("weather", &mock.url(), test_http_client()),
            Arc::new(test_credentials()),
            Arc::new(RateLimiter::new(Duration::from_secs(30))),
            Weather {
                city: "São Paulo".to_string(),
                units: "imperial".to_string(),
            },
            CachePolicy::Public { max_age_secs: 60 },
        );

        let response = handler.handle(request("a")).await;
        assert_eq!(response.headers()[CACHE_CONTROL], "public, max-age=60");
        assert_eq!(
            mock.requests_to(CURRENT_WEATHER_PATH)[0].query.as_deref(),
            Some("q=S%C3%A3o+Paulo&appid=weather-key&units=imperial")
        );
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mock = MockUpstream::start().await;
        mock.respond(Method::GET, CURRENT_WEATHER_PATH, 200, CLEAR_SKY);
        let handler = handler(&mock, test_credentials());

        let first = handler.handle(request("203.0.113.7")).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = handler.handle(request("203.0.113.7")).await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(second.headers()[CACHE_CONTROL], NO_STORE);

        let body = body_json(&second);
        assert_eq!(body["error"], RATE_LIMITED);
        let cooldown = body["cooldown"].as_u64().unwrap();
        assert!(cooldown > 0 && cooldown <= 30, "cooldown {cooldown}");
        assert_eq!(second.headers()[RETRY_AFTER], cooldown.to_string().as_str());

        // Rejected requests never reach the upstream
        assert_eq!(mock.hits(CURRENT_WEATHER_PATH), 1);

        // Another client has its own window
        let other = handler.handle(request("198.51.100.1")).await;
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unidentified_clients_share_a_bucket() {
        let mock = MockUpstream::start().await;
        mock.respond(Method::GET, CURRENT_WEATHER_PATH, 200, CLEAR_SKY);
        let handler = handler(&mock, test_credentials());

        let anonymous = || Request::builder().uri("/api/weather").body(()).unwrap();
        assert_eq!(handler.handle(anonymous()).await.status(), StatusCode::OK);
        assert_eq!(
            handler.handle(anonymous()).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let mock = MockUpstream::start().await;
        let response = handler(&mock, credentials_with(&[]))
            .handle(request("a"))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(&response),
            json!({
                "error": FETCH_FAILED,
                "details": format!("missing configuration: {OPENWEATHERMAP_API_KEY}")
            })
        );
        assert_eq!(mock.hits(CURRENT_WEATHER_PATH), 0);
    }

    #[tokio::test]
    async fn test_upstream_error() {
        let mock = MockUpstream::start().await;
        mock.respond(
            Method::GET,
            CURRENT_WEATHER_PATH,
            401,
            r#"{"cod":401,"message":"Invalid API key"}"#,
        );

        let response = handler(&mock, test_credentials())
            .handle(request("a"))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CACHE_CONTROL], NO_STORE);
        assert_eq!(
            body_json(&response)["details"],
            "upstream weather responded with status 401"
        );
    }

    #[tokio::test]
    async fn test_unreachable_upstream_hides_api_key() {
        let url = {
            let mock = MockUpstream::start().await;
            mock.url()
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let handler = WeatherHandler::new(
            UpstreamClient::new("weather", &url, test_http_client()),
            Arc::new(test_credentials()),
            Arc::new(RateLimiter::new(Duration::from_secs(30))),
            Weather::default(),
            CachePolicy::NoStore,
        );

        let response = handler.handle(request("a")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(&response);
        assert_eq!(body["error"], FETCH_FAILED);
        let details = body["details"].as_str().unwrap();
        assert!(details.starts_with("network error calling weather"), "{details}");
        assert!(!details.contains("weather-key"), "{details}");
        assert!(!details.contains("appid"), "{details}");
    }

    #[tokio::test]
    async fn test_missing_temperature() {
        let mock = MockUpstream::start().await;
        mock.respond(
            Method::GET,
            CURRENT_WEATHER_PATH,
            200,
            r#"{"weather": [{"description": "mist", "icon": "50n"}]}"#,
        );

        let response = handler(&mock, test_credentials())
            .handle(request("a"))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&response)["error"], FETCH_FAILED);
    }
}
