use crate::config::{CacheControl, Config, Listener, RateLimit, Timeouts, Upstreams, Weather};
use crate::credentials::{
    Credentials, DISCORD_BOT_TOKEN, DISCORD_GUILD_ID, OPENWEATHERMAP_API_KEY, SPOTIFY_CLIENT_ID,
    SPOTIFY_CLIENT_SECRET, SPOTIFY_REFRESH_TOKEN,
};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::HeaderMap;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Default)]
struct MockState {
    routes: HashMap<(Method, String), (StatusCode, Bytes)>,
    requests: Vec<RecordedRequest>,
}

/// A local HTTP server standing in for the third-party APIs.
///
/// Responses are keyed by method and path (query ignored). Unconfigured
/// paths answer 404 with an empty body. Every request is recorded.
pub struct MockUpstream {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
    handle: JoinHandle<()>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(MockState::default()));

        let server_state = state.clone();
        let handle = tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let io = TokioIo::new(stream);
                let state = server_state.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req| serve_mock(state.clone(), req));
                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        MockUpstream {
            addr,
            state,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).expect("valid status");
        self.state.lock().routes.insert(
            (method, path.to_string()),
            (status, Bytes::copy_from_slice(body.as_bytes())),
        );
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_mock(
    state: Arc<Mutex<MockState>>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_else(|_| Bytes::new());

    let path = parts.uri.path().to_string();
    let mut state = state.lock();
    state.requests.push(RecordedRequest {
        method: parts.method.clone(),
        path: path.clone(),
        query: parts.uri.query().map(String::from),
        headers: parts.headers,
        body,
    });

    let (status, body) = state
        .routes
        .get(&(parts.method, path))
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, Bytes::new()));

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    Ok(response)
}

/// Configuration pointing every upstream at `upstream_url`.
pub fn test_config(upstream_url: &str) -> Config {
    Config {
        listener: Listener {
            host: "127.0.0.1".to_string(),
            port: 3000,
        },
        admin_listener: Listener {
            host: "127.0.0.1".to_string(),
            port: 3001,
        },
        upstreams: Upstreams {
            discord_url: format!("{upstream_url}/api/v10"),
            spotify_accounts_url: upstream_url.to_string(),
            spotify_api_url: upstream_url.to_string(),
            weather_url: upstream_url.to_string(),
        },
        timeouts: Timeouts {
            http_timeout_secs: 2,
        },
        cache_control: CacheControl::default(),
        rate_limit: RateLimit::default(),
        weather: Weather::default(),
    }
}

/// Every credential set to a recognisable dummy value.
pub fn test_credentials() -> Credentials {
    credentials_with(&[
        (DISCORD_BOT_TOKEN, "bot-token"),
        (DISCORD_GUILD_ID, "guild-1"),
        (SPOTIFY_CLIENT_ID, "client-id"),
        (SPOTIFY_CLIENT_SECRET, "client-secret"),
        (SPOTIFY_REFRESH_TOKEN, "refresh-token"),
        (OPENWEATHERMAP_API_KEY, "weather-key"),
    ])
}

pub fn credentials_with(pairs: &[(&str, &str)]) -> Credentials {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Credentials::from_lookup(|name| map.get(name).cloned())
}

pub fn test_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(2))
        .build()
        .unwrap()
}

pub fn body_json(response: &Response<Bytes>) -> serde_json::Value {
    serde_json::from_slice(response.body()).expect("valid json body")
}
