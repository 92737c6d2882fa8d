use crate::forms::field::UploadSpec;
use crate::notify::{Notification, Notifier};
use crate::upload::SelectedFile;
use crate::upload::auth::Authenticator;
use crate::upload::host::{MediaHost, UploadError, UploadEvent, UploadRequest, UploadResult};
use log::{error, info};
use tokio::sync::mpsc;

/// Lifecycle of the single asset slot a widget manages
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Idle,
    Validating,
    /// Percentage of the file transferred so far, in `0..=100`
    Uploading { progress: u8 },
    Succeeded { file_path: String },
    Failed { reason: String },
}

/// Upload control for one form field. The widget knows nothing about the form it sits in: the
/// asset path of a finished upload is only passed to the `on_file_change` callback of
/// [`UploadWidget::upload`].
///
/// Taking `&mut self` for an upload means a widget never runs two uploads at once.
pub struct UploadWidget<'deps, A, H, N> {
    spec: UploadSpec,
    authenticator: &'deps A,
    host: &'deps H,
    notifier: &'deps N,
    state: UploadState,
}

impl<'deps, A, H, N> UploadWidget<'deps, A, H, N>
where
    A: Authenticator,
    H: MediaHost,
    N: Notifier,
{
    #[must_use]
    #[inline]
    pub const fn new(
        spec: UploadSpec,
        authenticator: &'deps A,
        host: &'deps H,
        notifier: &'deps N,
    ) -> Self {
        Self {
            spec,
            authenticator,
            host,
            notifier,
            state: UploadState::Idle,
        }
    }

    #[must_use]
    #[inline]
    pub const fn state(&self) -> &UploadState {
        &self.state
    }

    #[must_use]
    #[inline]
    pub const fn spec(&self) -> &UploadSpec {
        &self.spec
    }

    #[must_use]
    #[inline]
    pub const fn progress(&self) -> u8 {
        match self.state {
            UploadState::Uploading { progress } => progress,
            UploadState::Succeeded { .. } => 100,
            UploadState::Idle | UploadState::Validating | UploadState::Failed { .. } => 0,
        }
    }

    /// A progress bar is only shown while an upload is underway and not yet complete.
    #[must_use]
    #[inline]
    pub const fn shows_progress(&self) -> bool {
        matches!(self.state, UploadState::Uploading { progress } if progress > 0 && progress < 100)
    }

    #[must_use]
    #[inline]
    pub fn file_path(&self) -> Option<&str> {
        match &self.state {
            UploadState::Succeeded { file_path } => Some(file_path),
            UploadState::Idle
            | UploadState::Validating
            | UploadState::Uploading { .. }
            | UploadState::Failed { .. } => None,
        }
    }

    /// Check the file against the size ceiling of the widget's media kind. A rejected file is
    /// reported to the user and leaves the widget idle.
    #[inline]
    pub fn validate(&mut self, file: &SelectedFile) -> bool {
        self.validate_size(file.size())
    }

    /// Same check as [`Self::validate`] for a file that has not been read yet.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per selection")]
    pub fn validate_size(&mut self, size: u64) -> bool {
        self.state = UploadState::Validating;
        let kind = self.spec.kind;
        if kind.accepts_size(size) {
            return true;
        }

        self.notifier.notify(Notification::failure(
            "File size too large.",
            kind.too_large_message(),
        ));
        self.state = UploadState::Idle;
        false
    }

    #[inline]
    pub fn start(&mut self) {
        self.state = UploadState::Uploading { progress: 0 };
    }

    /// Record a progress event. The percentage is rounded, capped at 100 and never moves
    /// backwards within one upload; events arriving outside an upload are ignored.
    #[inline]
    pub fn record_progress(&mut self, loaded: u64, total: u64) {
        if let UploadState::Uploading { progress } = &mut self.state {
            let percent = percentage(loaded, total);
            if percent > *progress {
                *progress = percent;
            }
        }
    }

    /// Settle the upload. Failures end here: they are logged and shown to the user, never
    /// returned to the caller.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per upload")]
    pub fn finish<F>(&mut self, result: Result<UploadResult, UploadError>, on_file_change: F)
    where
        F: FnOnce(&str),
    {
        let kind = self.spec.kind;
        match result {
            Ok(uploaded) => {
                info!("{kind} uploaded to {}", uploaded.file_path);
                self.state = UploadState::Succeeded {
                    file_path: uploaded.file_path.clone(),
                };
                on_file_change(&uploaded.file_path);
                self.notifier.notify(Notification::success(
                    format!("{kind} uploaded successfully."),
                    format!("{} uploaded!", uploaded.file_path),
                ));
            }
            Err(err) => {
                error!("{kind} upload failed: {err}");
                self.state = UploadState::Failed {
                    reason: err.to_string(),
                };
                self.notifier.notify(Notification::failure(
                    format!("{kind} upload failed."),
                    format!("Your {kind} could not be uploaded! Please try again."),
                ));
            }
        }
    }

    /// Run the whole upload for a newly selected file: validate, fetch a fresh signature, transfer
    /// the file while tracking progress, and hand the resulting asset path to `on_file_change`.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per selection")]
    pub async fn upload<F>(&mut self, file: SelectedFile, on_file_change: F) -> &UploadState
    where
        F: FnOnce(&str),
    {
        self.state = UploadState::Idle;
        if !self.validate(&file) {
            return &self.state;
        }

        self.start();
        let result = self.transfer(file).await;
        self.finish(result, on_file_change);
        &self.state
    }

    async fn transfer(&mut self, file: SelectedFile) -> Result<UploadResult, UploadError> {
        let auth = self.authenticator.authenticate().await?;
        let request = UploadRequest::new(file, self.spec.folder, auth);

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let host = self.host;
        let transfer = host.upload(request, events_tx);
        tokio::pin!(transfer);

        loop {
            tokio::select! {
                biased;
                Some(event) = events_rx.recv() => self.apply(event),
                result = &mut transfer => {
                    while let Ok(event) = events_rx.try_recv() {
                        self.apply(event);
                    }
                    return result;
                }
            }
        }
    }

    fn apply(&mut self, event: UploadEvent) {
        match event {
            UploadEvent::Progress { loaded, total } => self.record_progress(loaded, total),
        }
    }
}

/// `round(loaded / total * 100)` in integer arithmetic, halves rounding up. A `total` of zero
/// carries no information and yields zero.
fn percentage(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let loaded = u128::from(loaded.min(total));
    let total = u128::from(total);
    let percent = (loaded * 200 + total) / (total * 2);
    u8::try_from(percent).unwrap_or(100)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Test doubles are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::forms::field::Theme;
    use crate::notify::Variant;
    use crate::testing::{FakeAuthenticator, FakeHost, RecordingNotifier};
    use crate::upload::{MediaKind, ONE_MB};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;

    const COVER: UploadSpec = UploadSpec::new(
        MediaKind::Image,
        "image/*",
        "Upload a book cover",
        "books/covers",
        Theme::Light,
    );
    const TRAILER: UploadSpec = UploadSpec::new(
        MediaKind::Video,
        "video/*",
        "Upload a book trailer",
        "books/videos",
        Theme::Light,
    );

    fn file(size: u64) -> SelectedFile {
        SelectedFile::new("dune.png", vec![0_u8; usize::try_from(size).unwrap()])
    }

    #[test]
    fn percentage_rounds_half_up_and_is_bounded() {
        assert_eq!(percentage(0, 10), 0);
        assert_eq!(percentage(1, 200), 1);
        assert_eq!(percentage(1, 201), 0);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(10, 10), 100);
        assert_eq!(percentage(20, 10), 100);
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn oversized_files_are_rejected_per_kind() {
        let notifier = RecordingNotifier::default();
        let authenticator = FakeAuthenticator::default();
        let host = FakeHost::with_progress(Vec::new());

        let mut cover = UploadWidget::new(COVER, &authenticator, &host, &notifier);
        assert!(cover.validate(&file(20 * ONE_MB)));
        assert!(!cover.validate(&file(20 * ONE_MB + 1)));
        assert_eq!(cover.state(), &UploadState::Idle);
        assert_eq!(
            notifier.last(),
            Some(Notification::failure(
                "File size too large.",
                "Please upload a file smaller than 20MB."
            ))
        );

        let mut trailer = UploadWidget::new(TRAILER, &authenticator, &host, &notifier);
        assert!(trailer.validate(&file(50 * ONE_MB)));
        assert!(!trailer.validate(&file(50 * ONE_MB + 1)));
        assert_eq!(
            notifier.last().unwrap().description,
            "Please upload a file smaller than 50MB."
        );
    }

    #[test]
    fn size_alone_is_enough_to_reject() {
        let notifier = RecordingNotifier::default();
        let authenticator = FakeAuthenticator::default();
        let host = FakeHost::with_progress(Vec::new());
        let mut trailer = UploadWidget::new(TRAILER, &authenticator, &host, &notifier);

        assert!(!trailer.validate_size(4 * 1024 * ONE_MB));
        assert_eq!(trailer.state(), &UploadState::Idle);
        assert_eq!(notifier.last().unwrap().variant, Variant::Destructive);
        assert!(trailer.validate_size(50 * ONE_MB));
        assert_eq!(authenticator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn progress_never_decreases_and_stays_bounded() {
        let notifier = RecordingNotifier::default();
        let authenticator = FakeAuthenticator::default();
        let host = FakeHost::with_progress(Vec::new());
        let mut widget = UploadWidget::new(COVER, &authenticator, &host, &notifier);

        widget.record_progress(50, 100);
        assert_eq!(widget.progress(), 0, "ignored outside an upload");

        widget.start();
        let mut previous = 0;
        for (loaded, total) in [(10, 100), (5, 100), (49, 100), (50, 100), (30, 100), (100, 100)] {
            widget.record_progress(loaded, total);
            let current = widget.progress();
            assert!(current >= previous);
            assert!(current <= 100);
            previous = current;
        }
        assert_eq!(widget.progress(), 100);
        assert!(!widget.shows_progress());
    }

    #[tokio::test]
    async fn successful_upload_hands_path_to_callback() {
        let notifier = RecordingNotifier::default();
        let authenticator = FakeAuthenticator::default();
        let host = FakeHost::with_progress(vec![(25, 100), (75, 100), (100, 100)]);
        let mut widget = UploadWidget::new(COVER, &authenticator, &host, &notifier);

        let mut received = None;
        let state = widget
            .upload(file(100), |path| received = Some(path.to_owned()))
            .await
            .clone();

        assert_eq!(
            state,
            UploadState::Succeeded {
                file_path: String::from("books/covers/dune.png")
            }
        );
        assert_eq!(received.as_deref(), Some("books/covers/dune.png"));
        assert_eq!(widget.file_path(), Some("books/covers/dune.png"));
        assert_eq!(
            notifier.last(),
            Some(Notification::success(
                "image uploaded successfully.",
                "books/covers/dune.png uploaded!"
            ))
        );
    }

    #[tokio::test]
    async fn every_upload_gets_a_fresh_signature() {
        let notifier = RecordingNotifier::default();
        let authenticator = FakeAuthenticator::default();
        let host = FakeHost::with_progress(Vec::new());
        let mut widget = UploadWidget::new(COVER, &authenticator, &host, &notifier);

        widget.upload(file(10), |_| {}).await;
        widget.upload(file(10), |_| {}).await;

        let tokens: Vec<String> = host
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|(token, _)| token.clone())
            .collect();
        assert_eq!(tokens, vec![String::from("tok-0"), String::from("tok-1")]);
    }

    #[tokio::test]
    async fn rejected_file_never_reaches_the_network() {
        let notifier = RecordingNotifier::default();
        let authenticator = FakeAuthenticator::default();
        let host = FakeHost::with_progress(Vec::new());
        let mut widget = UploadWidget::new(COVER, &authenticator, &host, &notifier);

        let mut called = false;
        let state = widget.upload(file(21 * ONE_MB), |_| called = true).await.clone();

        assert_eq!(state, UploadState::Idle);
        assert!(!called);
        assert_eq!(authenticator.calls.load(Ordering::SeqCst), 0);
        assert!(host.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn authentication_failure_becomes_a_notification() {
        let notifier = RecordingNotifier::default();
        let authenticator = FakeAuthenticator {
            fail: true,
            ..FakeAuthenticator::default()
        };
        let host = FakeHost::with_progress(Vec::new());
        let mut widget = UploadWidget::new(TRAILER, &authenticator, &host, &notifier);

        let mut called = false;
        let state = widget.upload(file(10), |_| called = true).await.clone();

        assert!(matches!(state, UploadState::Failed { ref reason } if reason.contains("401")));
        assert!(!called);
        let shown = notifier.last().unwrap();
        assert_eq!(shown.variant, Variant::Destructive);
        assert_eq!(shown.title, "video upload failed.");
        assert_eq!(
            shown.description,
            "Your video could not be uploaded! Please try again."
        );
        assert!(host.requests.lock().unwrap().is_empty());
    }
}
