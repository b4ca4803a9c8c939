use crate::errors::AggregatorError;
use crate::metrics_defs::REQUEST_DURATION;
use crate::router::Router;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response};
use shared::histogram;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

/// Public API service. Request bodies are never read: every route is a GET.
#[derive(Clone)]
pub struct AggregatorService {
    router: Router,
}

impl AggregatorService {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    async fn dispatch(router: Router, req: Request<()>) -> Response<Bytes> {
        let started = Instant::now();
        let (route, response) = router.route(req).await;
        let status = response.status();

        histogram!(
            REQUEST_DURATION,
            "route" => route,
            "status" => status.as_u16().to_string()
        )
        .record(started.elapsed().as_secs_f64());
        tracing::debug!(route, status = %status, "request served");

        response
    }
}

impl Service<Request<Incoming>> for AggregatorService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = AggregatorError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let router = self.router.clone();
        let req = req.map(|_| ());

        Box::pin(async move {
            let response = Self::dispatch(router, req).await;
            Ok(response.map(|body| {
                Full::new(body)
                    .map_err(|never: Infallible| match never {})
                    .boxed()
            }))
        })
    }
}
