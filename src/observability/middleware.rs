use poem::http::HeaderValue;
use poem::{Endpoint, Middleware, Request, Result as PoemResult};
use tracing::{info_span, Instrument};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-Id";

/// Middleware to add request ID and correlation ID to requests
pub struct RequestTracingMiddleware;

impl<E: Endpoint> Middleware<E> for RequestTracingMiddleware {
    type Output = RequestTracingEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        RequestTracingEndpoint { ep }
    }
}

/// Endpoint wrapper that adds request tracing
pub struct RequestTracingEndpoint<E> {
    ep: E,
}

#[poem::async_trait]
impl<E: Endpoint> Endpoint for RequestTracingEndpoint<E> {
    type Output = E::Output;

    async fn call(&self, mut req: Request) -> PoemResult<Self::Output> {
        let request_id = Uuid::new_v4().to_string();
        let correlation_id = extract_correlation_id(&req)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            req.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        if let Ok(value) = HeaderValue::from_str(&correlation_id) {
            req.headers_mut().insert(CORRELATION_ID_HEADER, value);
        }

        // Order and partner logs for this request nest under this span.
        let span = info_span!(
            "http_request",
            request_id = %request_id,
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        self.ep.call(req).instrument(span).await
    }
}

pub fn extract_request_id(req: &Request) -> Option<String> {
    req.header(REQUEST_ID_HEADER).map(|s| s.to_string())
}

pub fn extract_correlation_id(req: &Request) -> Option<String> {
    req.header(CORRELATION_ID_HEADER).map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use poem::{handler, test::TestClient, EndpointExt, Route};

    #[handler]
    fn echo_ids(req: &Request) -> String {
        format!(
            "{}|{}",
            extract_request_id(req).unwrap_or_default(),
            extract_correlation_id(req).unwrap_or_default()
        )
    }

    #[test]
    fn test_correlation_id_extraction() {
        let req = Request::builder()
            .header(CORRELATION_ID_HEADER, "test-correlation-id")
            .finish();

        assert_eq!(
            extract_correlation_id(&req),
            Some("test-correlation-id".to_string())
        );
    }

    #[test]
    fn test_missing_request_id() {
        let req = Request::builder().finish();
        assert!(extract_request_id(&req).is_none());
    }

    #[tokio::test]
    async fn test_middleware_sets_ids() {
        let app = Route::new()
            .at("/", echo_ids)
            .with(RequestTracingMiddleware);
        let cli = TestClient::new(app);

        let resp = cli
            .get("/")
            .header(CORRELATION_ID_HEADER, "corr-1")
            .send()
            .await;
        resp.assert_status_is_ok();

        let text = resp.0.into_body().into_string().await.unwrap();
        let (request_id, correlation_id) = text.split_once('|').unwrap();
        assert!(Uuid::parse_str(request_id).is_ok());
        assert_eq!(correlation_id, "corr-1");
    }
}
