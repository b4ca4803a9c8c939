use crate::handler::Handler;
use http::header::{ALLOW, HeaderValue};
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::make_error_response;
use std::sync::Arc;

/// Route name reported for requests that matched no handler
pub const UNMATCHED: &str = "unmatched";

struct Route {
    path: &'static str,
    handler: Arc<dyn Handler>,
}

/// Dispatches requests to handlers by exact path match. Every route is
/// GET-only.
#[derive(Clone)]
pub struct Router {
    routes: Arc<Vec<Route>>,
}

impl Router {
    pub fn new(routes: Vec<(&'static str, Arc<dyn Handler>)>) -> Self {
        let routes = routes
            .into_iter()
            .map(|(path, handler)| Route { path, handler })
            .collect();
        Self {
            routes: Arc::new(routes),
        }
    }

    /// Returns the response together with the name of the route that served
    /// it, for metric tags.
    pub async fn route(&self, req: Request<()>) -> (&'static str, Response<Bytes>) {
        let Some(route) = self.find_matching_route(&req) else {
            tracing::debug!(
                method = %req.method(),
                path = %req.uri().path(),
                "No route matched"
            );
            return (UNMATCHED, make_error_response(StatusCode::NOT_FOUND));
        };

        let name = route.handler.name();
        if req.method() != Method::GET {
            tracing::debug!(route = name, method = %req.method(), "Method not allowed");
            let mut response = make_error_response(StatusCode::METHOD_NOT_ALLOWED);
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET"));
            return (name, response);
        }

        (name, route.handler.handle(req).await)
    }

    fn find_matching_route<B>(&self, req: &Request<B>) -> Option<&Route> {
        let path = req.uri().path();
        self.routes.iter().find(|route| route.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticHandler(&'static str);

    #[async_trait]
    impl Handler for StaticHandler {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn handle(&self, _request: Request<()>) -> Response<Bytes> {
            Response::new(Bytes::from_static(self.0.as_bytes()))
        }
    }

    fn test_router() -> Router {
        let one: Arc<dyn Handler> = Arc::new(StaticHandler("one"));
        let two: Arc<dyn Handler> = Arc::new(StaticHandler("two"));
        Router::new(vec![("/api/one", one), ("/api/two", two)])
    }

    fn test_request(method: Method, uri: &str) -> Request<()> {
        Request::builder().method(method).uri(uri).body(()).unwrap()
    }

    #[tokio::test]
    async fn test_route_matching() {
        let router = test_router();

        let (name, response) = router.route(test_request(Method::GET, "/api/two")).await;
        assert_eq!(name, "two");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"two");

        // Query strings do not take part in matching
        let (name, _) = router
            .route(test_request(Method::GET, "/api/one?userId=1"))
            .await;
        assert_eq!(name, "one");
    }

    #[tokio::test]
    async fn test_no_route_matched() {
        let router = test_router();

        for uri in ["/", "/api", "/api/one/", "/api/three"] {
            let (name, response) = router.route(test_request(Method::GET, uri)).await;
            assert_eq!(name, UNMATCHED);
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let router = test_router();

        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let (name, response) = router.route(test_request(method, "/api/one")).await;
            assert_eq!(name, "one");
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(response.headers()[ALLOW], "GET");
        }
    }
}
