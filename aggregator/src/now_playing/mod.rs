//! `GET /api/spotify`
//!
//! Token exchange failures are the only 500s. Once a token is in hand every
//! upstream problem degrades to `{"isPlaying":false}`.

pub mod protocol;

use crate::config::CachePolicy;
use crate::fallback::{classify, resolve};
use crate::handler::Handler;
use crate::response::{NO_STORE, json_response};
use crate::token::TokenProvider;
use crate::upstream::{Auth, CacheDirective, UpstreamClient};
use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use protocol::{NowPlaying, NowPlayingError, decode_currently_playing, decode_recently_played};

const ROUTE: &str = "now_playing";

pub const CURRENTLY_PLAYING_PATH: &str = "/v1/me/player/currently-playing";
pub const RECENTLY_PLAYED_PATH: &str = "/v1/me/player/recently-played";

pub const FETCH_FAILED: &str = "Failed to fetch Spotify data";

pub struct NowPlayingHandler {
    api: UpstreamClient,
    tokens: TokenProvider,
    cache_policy: CachePolicy,
}

impl NowPlayingHandler {
    pub fn new(api: UpstreamClient, tokens: TokenProvider, cache_policy: CachePolicy) -> Self {
        NowPlayingHandler {
            api,
            tokens,
            cache_policy,
        }
    }

    async fn lookup(&self, token: &str) -> NowPlaying {
        let api = &self.api;
        let auth = Auth::Bearer(token);
        let recent_path = format!("{RECENTLY_PLAYED_PATH}?limit=1");

        let (_stage, now_playing) = resolve(
            ROUTE,
            async move {
                let result = api
                    .get(CURRENTLY_PLAYING_PATH, auth, CacheDirective::NoStore)
                    .await;
                classify(ROUTE, "primary", result, decode_currently_playing)
            },
            move || async move {
                let result = api.get(&recent_path, auth, CacheDirective::NoStore).await;
                classify(ROUTE, "secondary", result, decode_recently_played)
            },
            NowPlaying::idle,
        )
        .await;

        now_playing
    }
}

#[async_trait]
impl Handler for NowPlayingHandler {
    fn name(&self) -> &'static str {
        ROUTE
    }

    async fn handle(&self, _request: Request<()>) -> Response<Bytes> {
        let token = match self.tokens.access_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(route = ROUTE, error = %e, "could not obtain access token");
                return json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &NowPlayingError {
                        is_playing: false,
                        error: FETCH_FAILED,
                        details: Some(e.to_string()),
                    },
                    NO_STORE,
                );
            }
        };

        let now_playing = self.lookup(&token).await;
        json_response(
            StatusCode::OK,
            &now_playing,
            &self.cache_policy.header_value(),
        )
    }
}
