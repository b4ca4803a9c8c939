use crate::credentials::{
    Credentials, SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET, SPOTIFY_REFRESH_TOKEN, require,
};
use crate::errors::AggregatorError;
use crate::metrics_defs::TOKEN_EXCHANGE_FAILED;
use crate::upstream::UpstreamClient;
use serde::Deserialize;
use shared::counter;
use std::sync::Arc;

const TOKEN_PATH: &str = "/api/token";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Exchanges the stored refresh token for a short-lived access token.
///
/// Tokens are not cached: every call performs a fresh exchange.
#[derive(Clone)]
pub struct TokenProvider {
    accounts: UpstreamClient,
    credentials: Arc<Credentials>,
}

impl TokenProvider {
    pub fn new(accounts: UpstreamClient, credentials: Arc<Credentials>) -> Self {
        TokenProvider {
            accounts,
            credentials,
        }
    }

    pub async fn access_token(&self) -> Result<String, AggregatorError> {
        let client_id = require(&self.credentials.spotify_client_id, SPOTIFY_CLIENT_ID)?;
        let client_secret = require(
            &self.credentials.spotify_client_secret,
            SPOTIFY_CLIENT_SECRET,
        )?;
        let refresh_token = require(
            &self.credentials.spotify_refresh_token,
            SPOTIFY_REFRESH_TOKEN,
        )?;

        let upstream = self.accounts.name();
        let response = self
            .accounts
            .http()
            .post(self.accounts.url(TOKEN_PATH))
            .basic_auth(client_id, Some(client_secret.expose()))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose()),
            ])
            .send()
            .await
            .map_err(|e| AggregatorError::network(upstream, e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            counter!(TOKEN_EXCHANGE_FAILED).increment(1);
            tracing::warn!(upstream, status = %status, "token exchange rejected");
            return Err(AggregatorError::UpstreamAuth(status.as_u16()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AggregatorError::payload(upstream, e.without_url()))?;

        body.access_token.filter(|t| !t.is_empty()).ok_or_else(|| {
            counter!(TOKEN_EXCHANGE_FAILED).increment(1);
            tracing::warn!(upstream, "token exchange returned no access token");
            AggregatorError::UpstreamAuth(status.as_u16())
        })
    }
}
