use crate::config::AppConfig;
use core::future::Future;
use core::time::Duration;
use log::error;
use reqwest::{ClientBuilder, StatusCode, header};
use serde::{Deserialize, Serialize};

/// Signed triple authorising exactly one upload. Tokens are single-use, so a fresh triple is
/// requested for every upload attempt.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationParameters {
    pub token: String,
    /// Unix timestamp after which the signature is rejected
    pub expire: i64,
    pub signature: String,
}

impl AuthenticationParameters {
    #[must_use]
    #[inline]
    pub fn new(token: impl Into<String>, expire: i64, signature: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expire,
            signature: signature.into(),
        }
    }
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    /// The signing endpoint answered, but not with a success status
    #[error("Request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The signing endpoint could not be reached or its answer could not be read
    #[error("Authentication failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Source of upload signatures
pub trait Authenticator {
    fn authenticate(
        &self,
    ) -> impl Future<Output = Result<AuthenticationParameters, AuthenticationError>> + Send;
}

/// Fetches upload signatures from the application backend.
#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    /// A HTTP client used for all requests to the signing endpoint
    http_client: reqwest::Client,
    auth_url: String,
}

impl HttpAuthenticator {
    /// Create an authenticator for the signing endpoint of the configured backend.
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per session")]
    pub fn new(config: &AppConfig) -> Result<Self, AuthenticationError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let http_client = ClientBuilder::new()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(25))
            .build()?;

        Ok(Self {
            http_client,
            auth_url: config.auth_url(),
        })
    }
}

impl Authenticator for HttpAuthenticator {
    async fn authenticate(&self) -> Result<AuthenticationParameters, AuthenticationError> {
        let response = self.http_client.get(&self.auth_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            error!("Upload signing endpoint answered with {status}");
            return Err(AuthenticationError::Status { status, body });
        }

        Ok(response.json::<AuthenticationParameters>().await?)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests run against a local canned server and are guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::config::ImageKitConfig;
    use crate::testing::CannedServer;
    use pretty_assertions::assert_eq;

    fn authenticator_for(server: &CannedServer) -> HttpAuthenticator {
        let config = AppConfig::new(
            server.url(""),
            ImageKitConfig::new("public_test", "https://ik.imagekit.io/libris"),
        );
        HttpAuthenticator::new(&config).unwrap()
    }

    #[tokio::test]
    async fn returns_the_signed_triple() {
        let server = CannedServer::start(
            200,
            "application/json",
            r#"{"token":"tok-1","expire":1735689600,"signature":"abc123","extra":true}"#,
        )
        .await;

        let parameters = authenticator_for(&server).authenticate().await.unwrap();

        assert_eq!(
            parameters,
            AuthenticationParameters::new("tok-1", 1_735_689_600, "abc123")
        );
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("GET /api/auth/imagekit HTTP/1.1"));
    }

    #[tokio::test]
    async fn does_not_reuse_tokens_between_uploads() {
        let server = CannedServer::start(
            200,
            "application/json",
            r#"{"token":"tok-1","expire":1735689600,"signature":"abc123"}"#,
        )
        .await;
        let authenticator = authenticator_for(&server);

        authenticator.authenticate().await.unwrap();
        authenticator.authenticate().await.unwrap();

        assert_eq!(server.requests().len(), 2);
    }

    #[tokio::test]
    async fn non_success_status_carries_status_and_body() {
        let server = CannedServer::start(500, "text/plain", "signing key missing").await;

        let error = authenticator_for(&server).authenticate().await.unwrap_err();

        match error {
            AuthenticationError::Status { status, ref body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "signing key missing");
            }
            AuthenticationError::Request(_) => panic!("expected a status error, got {error}"),
        }
        assert_eq!(
            error.to_string(),
            "Request failed with status 500 Internal Server Error: signing key missing"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_wraps_the_cause() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let config = AppConfig::new(
            format!("http://{addr}"),
            ImageKitConfig::new("public_test", "https://ik.imagekit.io/libris"),
        );
        let authenticator = HttpAuthenticator::new(&config).unwrap();

        let error = authenticator.authenticate().await.unwrap_err();
        assert!(matches!(error, AuthenticationError::Request(_)));
        assert!(error.to_string().starts_with("Authentication failed: "));
    }

    #[tokio::test]
    async fn malformed_body_is_a_request_error() {
        let server = CannedServer::start(200, "application/json", r#"{"token":"only"}"#).await;
        let error = authenticator_for(&server).authenticate().await.unwrap_err();
        assert!(matches!(error, AuthenticationError::Request(_)));
    }
}
