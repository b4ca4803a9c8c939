use http::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue};
use hyper::body::Bytes;
use hyper::{Response, StatusCode, Uri};
use serde::Serialize;
use shared::http::make_error_response;

/// Cache policy for every error response
pub const NO_STORE: &str = "no-store, max-age=0";

/// `{error, details?}`
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: &'static str) -> Self {
        ErrorBody {
            error,
            details: None,
        }
    }

    pub fn with_details(error: &'static str, details: impl ToString) -> Self {
        ErrorBody {
            error,
            details: Some(details.to_string()),
        }
    }
}

/// Serializes `value` as the JSON body with the given `Cache-Control` value.
pub fn json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
    cache_control: &str,
) -> Response<Bytes> {
    let body = match serde_json::to_vec(value) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response body");
            return make_error_response(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    match HeaderValue::from_str(cache_control) {
        Ok(value) => {
            headers.insert(CACHE_CONTROL, value);
        }
        Err(_) => {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
        }
    }

    response
}

/// Decoded value of the first `name` query parameter, if non-empty.
pub fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
