//! `GET /api/discord?userId=...`
//!
//! Identity is mandatory. Presence goes through the fallback resolver
//! (guild presence, then last known presence, then offline) and guild
//! membership is attached when available.

pub mod protocol;

use crate::config::CachePolicy;
use crate::credentials::{Credentials, DISCORD_BOT_TOKEN, DISCORD_GUILD_ID, require};
use crate::errors::AggregatorError;
use crate::fallback::{Lookup, classify, resolve};
use crate::handler::Handler;
use crate::response::{ErrorBody, NO_STORE, json_response, query_param};
use crate::upstream::{Auth, CacheDirective, UpstreamClient};
use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use protocol::{
    DiscordUser, Presence, PresenceResponse, decode_last_known_presence, decode_live_presence,
    decode_member, normalize_user,
};
use std::sync::Arc;

const ROUTE: &str = "presence";

pub const MISSING_USER_ID: &str = "Missing userId parameter";
pub const INVALID_USER_ID: &str = "Invalid userId parameter";
pub const FETCH_FAILED: &str = "Failed to fetch Discord data";

pub struct PresenceHandler {
    discord: UpstreamClient,
    credentials: Arc<Credentials>,
    cache_policy: CachePolicy,
}

impl PresenceHandler {
    pub fn new(
        discord: UpstreamClient,
        credentials: Arc<Credentials>,
        cache_policy: CachePolicy,
    ) -> Self {
        PresenceHandler {
            discord,
            credentials,
            cache_policy,
        }
    }

    async fn lookup(&self, user_id: &str) -> Result<PresenceResponse, AggregatorError> {
        let token = require(&self.credentials.discord_bot_token, DISCORD_BOT_TOKEN)?;
        let guild_id = require(&self.credentials.discord_guild_id, DISCORD_GUILD_ID)?;
        let auth = Auth::Bot(token.expose());

        let user = self.fetch_user(user_id, auth).await?;

        let discord = &self.discord;
        let member_path = format!("/guilds/{guild_id}/members/{user_id}");
        let primary_path = format!("/guilds/{guild_id}/presences/{user_id}");
        let secondary_path = format!("/users/{user_id}/presence");

        let member = async move {
            let result = discord
                .get(&member_path, auth, CacheDirective::NoStore)
                .await;
            match classify(ROUTE, "member", result, decode_member) {
                Lookup::Found(member) => Some(member),
                Lookup::Empty => None,
            }
        };

        let presence = resolve(
            ROUTE,
            async move {
                let result = discord
                    .get(&primary_path, auth, CacheDirective::NoStore)
                    .await;
                classify(ROUTE, "primary", result, decode_live_presence)
            },
            move || async move {
                let result = discord
                    .get(&secondary_path, auth, CacheDirective::NoStore)
                    .await;
                classify(ROUTE, "secondary", result, decode_last_known_presence)
            },
            Presence::offline,
        );

        let (member, (_stage, presence)) = tokio::join!(member, presence);

        Ok(normalize_user(user, presence, member))
    }

    async fn fetch_user(
        &self,
        user_id: &str,
        auth: Auth<'_>,
    ) -> Result<DiscordUser, AggregatorError> {
        let response = self
            .discord
            .get(&format!("/users/{user_id}"), auth, CacheDirective::NoStore)
            .await?;

        if !response.status().is_success() {
            return Err(AggregatorError::UpstreamHttp {
                upstream: self.discord.name().to_string(),
                status: response.status().as_u16(),
            });
        }

        serde_json::from_slice(response.body())
            .map_err(|e| AggregatorError::payload(self.discord.name(), e))
    }
}

/// Chat-service ids are numeric snowflakes.
fn is_valid_user_id(user_id: &str) -> bool {
    user_id.len() <= 32 && user_id.bytes().all(|b| b.is_ascii_digit())
}

#[async_trait]
impl Handler for PresenceHandler {
    fn name(&self) -> &'static str {
        ROUTE
    }

    async fn handle(&self, request: Request<()>) -> Response<Bytes> {
        let Some(user_id) = query_param(request.uri(), "userId") else {
            return json_response(
                StatusCode::BAD_REQUEST,
                &ErrorBody::new(MISSING_USER_ID),
                NO_STORE,
            );
        };

        if !is_valid_user_id(&user_id) {
            return json_response(
                StatusCode::BAD_REQUEST,
                &ErrorBody::new(INVALID_USER_ID),
                NO_STORE,
            );
        }

        match self.lookup(&user_id).await {
            Ok(body) => json_response(StatusCode::OK, &body, &self.cache_policy.header_value()),
            Err(e) => {
                tracing::error!(route = ROUTE, error = %e, "presence lookup failed");
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &ErrorBody::with_details(FETCH_FAILED, e),
                    NO_STORE,
                )
            }
        }
    }
}
