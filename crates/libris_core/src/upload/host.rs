use crate::config::AppConfig;
use crate::upload::SelectedFile;
use crate::upload::auth::{AuthenticationError, AuthenticationParameters};
use core::future::Future;
use core::time::Duration;
use futures::stream;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, ClientBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// Size of the pieces the file body is streamed in. Progress is reported once per piece.
const CHUNK_SIZE: usize = 64 * 1024;

/// Everything the media host needs to accept one signed upload
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: SelectedFile,
    pub folder: String,
    pub auth: AuthenticationParameters,
    /// Let the host append a random suffix so uploads never overwrite each other
    pub use_unique_file_name: bool,
}

impl UploadRequest {
    #[must_use]
    #[inline]
    pub fn new(file: SelectedFile, folder: impl Into<String>, auth: AuthenticationParameters) -> Self {
        Self {
            file,
            folder: folder.into(),
            auth,
            use_unique_file_name: true,
        }
    }
}

/// What the media host reports back for a stored file
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Asset path of the stored file, relative to the host's URL endpoint
    pub file_path: String,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl UploadResult {
    #[must_use]
    #[inline]
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            file_id: None,
            name: None,
            url: None,
            size: None,
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadEvent {
    Progress { loaded: u64, total: u64 },
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("media host rejected the upload with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// Storage for uploaded files. Implementations report transfer progress on `events` while the
/// upload is running and resolve to the stored file's metadata.
pub trait MediaHost {
    fn upload(
        &self,
        request: UploadRequest,
        events: UnboundedSender<UploadEvent>,
    ) -> impl Future<Output = Result<UploadResult, UploadError>> + Send;
}

/// Client for ImageKit's upload API
#[derive(Debug, Clone)]
pub struct ImageKitHost {
    http_client: reqwest::Client,
    upload_url: String,
    public_key: String,
}

impl ImageKitHost {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per session")]
    pub fn new(config: &AppConfig) -> Result<Self, UploadError> {
        let http_client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.upload_timeout)
            .build()?;

        Ok(Self {
            http_client,
            upload_url: config.imagekit.upload_endpoint.clone(),
            public_key: config.imagekit.public_key.clone(),
        })
    }
}

/// Wrap the file contents into a streamed body that reports how many bytes have been handed to
/// the connection so far.
fn progress_body(bytes: &[u8], events: UnboundedSender<UploadEvent>) -> Body {
    let total = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    let chunks: Vec<Vec<u8>> = bytes.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    let mut loaded: u64 = 0;

    let body = stream::iter(chunks.into_iter().map(move |chunk| {
        loaded = loaded.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
        // the widget may already be gone, progress is best effort
        events.send(UploadEvent::Progress { loaded, total }).ok();
        Ok::<_, std::io::Error>(chunk)
    }));
    Body::wrap_stream(body)
}

impl MediaHost for ImageKitHost {
    async fn upload(
        &self,
        request: UploadRequest,
        events: UnboundedSender<UploadEvent>,
    ) -> Result<UploadResult, UploadError> {
        let UploadRequest {
            file,
            folder,
            auth,
            use_unique_file_name,
        } = request;
        let size = file.size();

        let part = Part::stream_with_length(progress_body(&file.bytes, events), size)
            .file_name(file.name.clone());
        let form = Form::new()
            .text("fileName", file.name)
            .text("publicKey", self.public_key.clone())
            .text("signature", auth.signature)
            .text("expire", auth.expire.to_string())
            .text("token", auth.token)
            .text("useUniqueFileName", use_unique_file_name.to_string())
            .text("folder", folder)
            .part("file", part);

        let response = self
            .http_client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(UploadError::Rejected { status, body });
        }

        Ok(response.json::<UploadResult>().await?)
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
    use tokio::sync::mpsc;

    fn host_for(server: &CannedServer) -> ImageKitHost {
        let config = AppConfig::new(
            "http://localhost:3000",
            ImageKitConfig::new("public_test", "https://ik.imagekit.io/libris")
                .with_upload_endpoint(server.url("/api/v1/files/upload")),
        );
        ImageKitHost::new(&config).unwrap()
    }

    fn request(size: usize) -> UploadRequest {
        UploadRequest::new(
            SelectedFile::new("cover.png", vec![7_u8; size]),
            "books/covers",
            AuthenticationParameters::new("tok-1", 1_735_689_600, "sig-1"),
        )
    }

    #[tokio::test]
    async fn sends_signed_multipart_upload() {
        let server = CannedServer::start(
            200,
            "application/json",
            r#"{"fileId":"f1","name":"cover_x1.png","filePath":"/books/covers/cover_x1.png","url":"https://ik.imagekit.io/libris/books/covers/cover_x1.png","size":10}"#,
        )
        .await;
        let (events_tx, _events_rx) = mpsc::unbounded_channel();

        let result = host_for(&server).upload(request(10), events_tx).await.unwrap();

        assert_eq!(result.file_path, "/books/covers/cover_x1.png");
        assert_eq!(result.file_id.as_deref(), Some("f1"));
        let sent = &server.requests()[0];
        assert!(sent.starts_with("POST /api/v1/files/upload HTTP/1.1"));
        for field in ["publicKey", "signature", "expire", "token", "folder", "useUniqueFileName"] {
            assert!(sent.contains(&format!("name=\"{field}\"")), "missing {field}");
        }
        assert!(sent.contains("sig-1"));
        assert!(sent.contains("books/covers"));
        assert!(sent.contains("filename=\"cover.png\""));
    }

    #[tokio::test]
    async fn reports_progress_up_to_the_full_size() {
        let server =
            CannedServer::start(200, "application/json", r#"{"filePath":"/books/covers/big.png"}"#)
                .await;
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let size = CHUNK_SIZE * 3 + 17;

        host_for(&server).upload(request(size), events_tx).await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = events_rx.try_recv() {
            events.push(event);
        }
        let total = u64::try_from(size).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events.last(),
            Some(&UploadEvent::Progress {
                loaded: total,
                total
            })
        );
    }

    #[tokio::test]
    async fn rejected_upload_keeps_status_and_body() {
        let server = CannedServer::start(403, "application/json", r#"{"message":"expired"}"#).await;
        let (events_tx, _events_rx) = mpsc::unbounded_channel();

        let error = host_for(&server).upload(request(10), events_tx).await.unwrap_err();

        match error {
            UploadError::Rejected { status, body } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body, r#"{"message":"expired"}"#);
            }
            other => panic!("expected a rejection, got {other}"),
        }
    }
}
