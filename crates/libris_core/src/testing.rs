//! Test doubles shared by the unit tests of several modules.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test helpers, a failure here should abort the test"
)]
use crate::forms::schema::names;
use crate::forms::values::FormValues;
use crate::notify::{Navigator, Notification, Notifier};
use crate::upload::auth::{AuthenticationError, AuthenticationParameters, Authenticator};
use crate::upload::host::{MediaHost, UploadError, UploadEvent, UploadRequest, UploadResult};
use core::future::Future;
use reqwest::StatusCode;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub(crate) fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub(crate) fn last(&self) -> Option<Notification> {
        self.notifications.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub(crate) fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_owned());
    }
}

/// Hands out numbered tokens, or fails with 401 when `fail` is set.
#[derive(Default)]
pub(crate) struct FakeAuthenticator {
    pub(crate) calls: AtomicUsize,
    pub(crate) fail: bool,
}

impl Authenticator for FakeAuthenticator {
    fn authenticate(
        &self,
    ) -> impl Future<Output = Result<AuthenticationParameters, AuthenticationError>> + Send
    {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail;
        async move {
            if fail {
                return Err(AuthenticationError::Status {
                    status: StatusCode::UNAUTHORIZED,
                    body: String::from("no session"),
                });
            }
            Ok(AuthenticationParameters::new(format!("tok-{call}"), 1_735_689_600, "sig"))
        }
    }
}

/// Media host double: reports the given progress events, then stores the file under its folder.
pub(crate) struct FakeHost {
    progress: Vec<(u64, u64)>,
    /// Token and folder of every upload
    pub(crate) requests: Mutex<Vec<(String, String)>>,
}

impl FakeHost {
    pub(crate) fn with_progress(progress: Vec<(u64, u64)>) -> Self {
        Self {
            progress,
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl MediaHost for FakeHost {
    fn upload(
        &self,
        request: UploadRequest,
        events: UnboundedSender<UploadEvent>,
    ) -> impl Future<Output = Result<UploadResult, UploadError>> + Send {
        self.requests
            .lock()
            .unwrap()
            .push((request.auth.token.clone(), request.folder.clone()));
        let progress = self.progress.clone();
        async move {
            for (loaded, total) in progress {
                events.send(UploadEvent::Progress { loaded, total }).ok();
                tokio::task::yield_now().await;
            }
            Ok(UploadResult::new(format!("{}/{}", request.folder, request.file.name)))
        }
    }
}

/// Minimal HTTP/1.1 server answering every request with the same canned response. The raw text of
/// each received request (head and body) is kept for inspection.
pub(crate) struct CannedServer {
    pub(crate) addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl CannedServer {
    pub(crate) async fn start(status: u16, content_type: &str, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let response = format!(
            "HTTP/1.1 {status} {}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            reason_phrase(status),
            body.len()
        );

        let seen = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let request = read_request(&mut stream).await;
                seen.lock().unwrap().push(request);
                stream.write_all(response.as_bytes()).await.ok();
                stream.shutdown().await.ok();
            }
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for CannedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

const fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0_u8; 8192];

    let head_end = loop {
        let read = stream.read(&mut buf).await.unwrap_or(0);
        if read == 0 {
            return String::from_utf8_lossy(&raw).into_owned();
        }
        raw.extend_from_slice(&buf[..read]);
        if let Some(pos) = find(&raw, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..head_end]).to_lowercase();
    let content_length = head.lines().find_map(|line| {
        line.strip_prefix("content-length:")
            .and_then(|value| value.trim().parse::<usize>().ok())
    });
    let chunked = head.contains("transfer-encoding: chunked");

    loop {
        let body = &raw[head_end..];
        let complete = match content_length {
            Some(length) => body.len() >= length,
            None if chunked => body.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            break;
        }
        let read = stream.read(&mut buf).await.unwrap_or(0);
        if read == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..read]);
    }

    String::from_utf8_lossy(&raw).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Raw values of a book form that passes validation
pub(crate) fn book_values() -> FormValues {
    [
        (names::TITLE, "  Dune "),
        (names::AUTHOR, "Frank Herbert"),
        (names::GENRE, "Science Fiction"),
        (names::RATING, "5"),
        (names::TOTAL_COPIES, "12"),
        (names::COVER_URL, "/books/covers/dune.png"),
        (names::COVER_COLOR, "#c4a46b"),
        (names::DESCRIPTION, "A desert planet and its spice."),
        (names::VIDEO_URL, "/books/videos/dune.mp4"),
        (names::SUMMARY, "Paul Atreides travels to Arrakis."),
    ]
    .into_iter()
    .collect()
}
