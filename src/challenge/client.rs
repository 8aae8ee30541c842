use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::redirect::Policy;
use tracing::{debug, error, warn};

use crate::challenge::error::ChallengeApiError;
use crate::challenge::models::*;
use crate::config::{ApiTarget, AuthScheme};

pub const CHALLENGE_ACCOUNTS_PATH: &str = "api/source/challenge-accounts";
pub const CLIENT_KEY_HEADER: &str = "x-client-key";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_REDIRECTS: usize = 5;

/// Partner challenge-account API client
pub struct ChallengeApiClient {
    client: reqwest::Client,
}

impl ChallengeApiClient {
    /// Client with a 30 second timeout following at most five redirects
    pub fn new() -> Result<Self, ChallengeApiError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ChallengeApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client })
    }

    /// `{endpoint}/api/source/challenge-accounts`, with exactly one slash
    /// between the two.
    pub fn build_url(endpoint: &str) -> String {
        format!("{}/{}", endpoint.trim_end_matches('/'), CHALLENGE_ACCOUNTS_PATH)
    }

    fn auth_headers(target: &ApiTarget) -> Result<HeaderMap, ChallengeApiError> {
        let (name, value) = match target.auth_scheme {
            AuthScheme::Bearer => (AUTHORIZATION, format!("Bearer {}", target.key)),
            AuthScheme::ClientKey => (HeaderName::from_static(CLIENT_KEY_HEADER), target.key.clone()),
        };

        let mut value = HeaderValue::from_str(&value)
            .map_err(|e| ChallengeApiError::InvalidKey(e.to_string()))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(name, value);
        Ok(headers)
    }

    /// Ask the partner to create the challenge account for an order.
    ///
    /// Non-2xx answers come back as [`ChallengeApiError::Rejected`].
    pub async fn create_challenge_account(
        &self,
        target: &ApiTarget,
        request: &ChallengeAccountRequest,
    ) -> Result<ChallengeAccountResponse, ChallengeApiError> {
        let url = Self::build_url(&target.endpoint);
        debug!("Creating challenge account: {}", url);

        let response = self
            .client
            .post(&url)
            .headers(Self::auth_headers(target)?)
            .json(request)
            .send()
            .await?;

        // The status is already in; a body that fails to arrive reads as empty.
        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read challenge API response body ({}): {}", status, e);
                String::new()
            }
        };

        if !status.is_success() {
            error!("Challenge API error: {} - {}", status, text);
            return Err(ChallengeApiError::from_status_code(status.as_u16(), text));
        }

        Ok(ChallengeAccountResponse {
            status: status.as_u16(),
            body: text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChallengeFields;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn target(endpoint: String, auth_scheme: AuthScheme) -> ApiTarget {
        ApiTarget {
            endpoint,
            key: "test-key".to_string(),
            auth_scheme,
        }
    }

    fn request() -> ChallengeAccountRequest {
        ChallengeAccountRequest::new(
            501,
            ChallengeFields {
                challenge_pricing_id: "P1".to_string(),
                stage_id: "S1".to_string(),
                user_email: "a@b.com".to_string(),
                brand_id: "B1".to_string(),
            },
        )
    }

    #[test]
    fn test_build_url() {
        assert_eq!(
            ChallengeApiClient::build_url("https://example.test"),
            "https://example.test/api/source/challenge-accounts"
        );
        assert_eq!(
            ChallengeApiClient::build_url("https://example.test/"),
            "https://example.test/api/source/challenge-accounts"
        );
        assert_eq!(
            ChallengeApiClient::build_url("https://example.test/base//"),
            "https://example.test/base/api/source/challenge-accounts"
        );
    }

    #[tokio::test]
    async fn test_create_challenge_account_success() {
        let mock_server = MockServer::start().await;
        let client = ChallengeApiClient::new().unwrap();

        Mock::given(method("POST"))
            .and(path("/api/source/challenge-accounts"))
            .and(header("Authorization", "Bearer test-key"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({
                "order_id": 501,
                "challengePricingId": "P1",
                "stageId": "S1",
                "userEmail": "a@b.com",
                "brandId": "B1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "acc_1"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = client
            .create_challenge_account(&target(mock_server.uri(), AuthScheme::Bearer), &request())
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert!(response.body.contains("acc_1"));
    }

    #[tokio::test]
    async fn test_client_key_scheme() {
        let mock_server = MockServer::start().await;
        let client = ChallengeApiClient::new().unwrap();

        Mock::given(method("POST"))
            .and(path("/api/source/challenge-accounts"))
            .and(header("X-Client-Key", "test-key"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client
            .create_challenge_account(&target(mock_server.uri(), AuthScheme::ClientKey), &request())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_rejection_carries_message() {
        let mock_server = MockServer::start().await;
        let client = ChallengeApiClient::new().unwrap();

        Mock::given(method("POST"))
            .and(path("/api/source/challenge-accounts"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"message": "Invalid stage"})),
            )
            .mount(&mock_server)
            .await;

        let result = client
            .create_challenge_account(&target(mock_server.uri(), AuthScheme::Bearer), &request())
            .await;

        match result.unwrap_err() {
            ChallengeApiError::Rejected { status, message, .. } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Invalid stage");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let mock_server = MockServer::start().await;
        let client = ChallengeApiClient::with_timeout(Duration::from_millis(100)).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let err = client
            .create_challenge_account(&target(mock_server.uri(), AuthScheme::Bearer), &request())
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_invalid_key_rejected_before_sending() {
        let client = ChallengeApiClient::new().unwrap();
        let mut bad = target("http://127.0.0.1:9".to_string(), AuthScheme::Bearer);
        bad.key = "line\nbreak".to_string();

        let err = client.create_challenge_account(&bad, &request()).await.unwrap_err();
        assert!(matches!(err, ChallengeApiError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_redirect_chain_is_capped() {
        let mock_server = MockServer::start().await;
        let client = ChallengeApiClient::new().unwrap();

        Mock::given(path("/api/source/challenge-accounts"))
            .respond_with(ResponseTemplate::new(307).insert_header("Location", "/hop/1"))
            .mount(&mock_server)
            .await;
        for hop in 1..=MAX_REDIRECTS + 2 {
            Mock::given(path(format!("/hop/{}", hop)))
                .respond_with(
                    ResponseTemplate::new(307)
                        .insert_header("Location", format!("/hop/{}", hop + 1).as_str()),
                )
                .mount(&mock_server)
                .await;
        }

        let err = client
            .create_challenge_account(&target(mock_server.uri(), AuthScheme::Bearer), &request())
            .await
            .unwrap_err();

        assert!(err.is_transport());
        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1 + MAX_REDIRECTS);
    }

    #[tokio::test]
    async fn test_short_redirect_chain_is_followed() {
        let mock_server = MockServer::start().await;
        let client = ChallengeApiClient::new().unwrap();

        Mock::given(path("/api/source/challenge-accounts"))
            .respond_with(ResponseTemplate::new(307).insert_header("Location", "/moved"))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/moved"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "acc_2"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = client
            .create_challenge_account(&target(mock_server.uri(), AuthScheme::Bearer), &request())
            .await
            .unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_truncated_success_body_is_still_success() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            while !received.ends_with(b"}") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            // Promise more body than is sent, then hang up.
            socket
                .write_all(b"HTTP/1.1 201 Created\r\nContent-Length: 100\r\n\r\n{\"id\"")
                .await
                .unwrap();
        });

        let client = ChallengeApiClient::new().unwrap();
        let response = client
            .create_challenge_account(
                &target(format!("http://{}", addr), AuthScheme::Bearer),
                &request(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert!(response.body.is_empty());
        server.await.unwrap();
    }
}
