use crate::errors::AggregatorError;
use http::header::{AUTHORIZATION, CACHE_CONTROL};
use hyper::Response;
use hyper::body::Bytes;
use std::time::Duration;

/// Authorization scheme for an upstream call
#[derive(Clone, Copy, Debug)]
pub enum Auth<'a> {
    None,
    Bearer(&'a str),
    /// Static bot token used by the chat service
    Bot(&'a str),
}

impl Auth<'_> {
    fn header_value(&self) -> Option<String> {
        match self {
            Auth::None => None,
            Auth::Bearer(token) => Some(format!("Bearer {token}")),
            Auth::Bot(token) => Some(format!("Bot {token}")),
        }
    }
}

/// How the upstream may serve this call from its caches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheDirective {
    NoStore,
    Revalidate(Duration),
}

impl CacheDirective {
    pub fn header_value(&self) -> String {
        match self {
            CacheDirective::NoStore => "no-store".to_string(),
            CacheDirective::Revalidate(window) => format!("max-age={}", window.as_secs()),
        }
    }
}

/// Issues calls against one third-party base URL.
///
/// Any status the upstream returns is handed back to the caller, including
/// 204 and 4xx/5xx. Only a call that cannot complete (connect failure,
/// timeout, broken body) is an error.
#[derive(Clone)]
pub struct UpstreamClient {
    name: &'static str,
    base_url: String,
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(name: &'static str, base_url: &str, client: reqwest::Client) -> Self {
        UpstreamClient {
            name,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Joins `path` (which must start with `/`) onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(
        &self,
        path: &str,
        auth: Auth<'_>,
        cache: CacheDirective,
    ) -> Result<Response<Bytes>, AggregatorError> {
        let mut request = self
            .client
            .get(self.url(path))
            .header(CACHE_CONTROL, cache.header_value());

        if let Some(value) = auth.header_value() {
            request = request.header(AUTHORIZATION, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AggregatorError::network(self.name, e.without_url()))?;

        let response = into_buffered(response)
            .await
            .map_err(|e| AggregatorError::network(self.name, e.without_url()))?;

        // Query strings may carry API keys
        tracing::debug!(
            upstream = self.name,
            path = path.split('?').next().unwrap_or(path),
            status = %response.status(),
            "upstream responded"
        );

        Ok(response)
    }
}

/// Collects a reqwest response into a fully buffered `Response<Bytes>`.
pub(crate) async fn into_buffered(
    response: reqwest::Response,
) -> Result<Response<Bytes>, reqwest::Error> {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?;

    let mut buffered = Response::new(body);
    *buffered.status_mut() = status;
    *buffered.headers_mut() = headers;
    Ok(buffered)
}
