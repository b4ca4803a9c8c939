use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::{Request, Response};

/// A single API route.
///
/// Handlers own their failure mapping: every outcome, including upstream and
/// configuration errors, is turned into a response here rather than bubbled
/// up to the service.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Short route name used in logs and metric tags
    fn name(&self) -> &'static str;

    async fn handle(&self, request: Request<()>) -> Response<Bytes>;
}
