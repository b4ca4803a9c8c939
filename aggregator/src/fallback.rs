use crate::errors::AggregatorError;
use crate::metrics_defs::FALLBACK_RESOLVED;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use shared::counter;
use std::future::Future;

/// Outcome of one lookup, as seen by the resolver
#[derive(Debug, PartialEq)]
pub enum Lookup<T> {
    /// Actionable data; no further lookups are issued
    Found(T),
    /// No content, a failed call, or a payload with nothing to show
    Empty,
}

/// Which step produced the final value. Only used for logs and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Primary,
    Secondary,
    Default,
}

impl Stage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Stage::Primary => "primary",
            Stage::Secondary => "secondary",
            Stage::Default => "default",
        }
    }
}

/// Runs `primary`, then `secondary` only if the primary came back empty, and
/// finally falls back to `default`. Never fails and never retries.
pub async fn resolve<T, P, S, SF, D>(
    route: &'static str,
    primary: P,
    secondary: S,
    default: D,
) -> (Stage, T)
where
    P: Future<Output = Lookup<T>>,
    S: FnOnce() -> SF,
    SF: Future<Output = Lookup<T>>,
    D: FnOnce() -> T,
{
    let (stage, value) = match primary.await {
        Lookup::Found(value) => (Stage::Primary, value),
        Lookup::Empty => match secondary().await {
            Lookup::Found(value) => (Stage::Secondary, value),
            Lookup::Empty => (Stage::Default, default()),
        },
    };

    tracing::debug!(route, stage = stage.as_str(), "lookup resolved");
    counter!(FALLBACK_RESOLVED, "route" => route, "stage" => stage.as_str()).increment(1);

    (stage, value)
}

/// Turns a fetch result into a [`Lookup`].
///
/// 204, any non-2xx status and transport failures are all `Empty`. A 2xx body
/// is handed to `decode`, which returns `None` when the payload carries no
/// positive signal.
pub fn classify<T, F>(
    route: &'static str,
    lookup: &'static str,
    result: Result<Response<Bytes>, AggregatorError>,
    decode: F,
) -> Lookup<T>
where
    F: FnOnce(&[u8]) -> Option<T>,
{
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(route, lookup, error = %e, "lookup failed");
            return Lookup::Empty;
        }
    };

    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        tracing::debug!(route, lookup, "lookup returned no content");
        return Lookup::Empty;
    }

    if !status.is_success() {
        tracing::warn!(route, lookup, status = %status, "lookup returned error status");
        return Lookup::Empty;
    }

    match decode(response.body()) {
        Some(value) => Lookup::Found(value),
        None => Lookup::Empty,
    }
}
