use crate::http::make_error_response;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

/// Serves `/health` (always ok) and `/ready` (ok while `is_ready` returns true).
pub struct AdminService<F, E> {
    is_ready: F,
    _error: PhantomData<E>,
}

impl<F, E> AdminService<F, E>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F) -> Self {
        Self {
            is_ready,
            _error: PhantomData,
        }
    }

    /// Response for a request to `path`.
    pub fn respond(&self, path: &str) -> Response<Bytes> {
        match path {
            "/health" => Response::new(Bytes::from_static(b"ok\n")),
            "/ready" => match (self.is_ready)() {
                true => Response::new(Bytes::from_static(b"ok\n")),
                false => make_error_response(StatusCode::SERVICE_UNAVAILABLE),
            },
            _ => make_error_response(StatusCode::NOT_FOUND),
        }
    }
}

impl<F, E> Service<Request<Incoming>> for AdminService<F, E>
where
    F: Fn() -> bool,
    E: Send + 'static,
{
    type Response = Response<BoxBody<Bytes, E>>;
    type Error = E;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let response = self.respond(req.uri().path()).map(|body| {
            Full::new(body)
                .map_err(|never: Infallible| match never {})
                .boxed()
        });

        Box::pin(async move { Ok(response) })
    }
}
