//! Borrowing
//!
//! Client side of the borrow button: checks the eligibility computed for the page, submits the
//! borrow and turns every outcome into a notification.
mod guard;

use crate::actions::{BorrowEligibility, BorrowRequest, BorrowService};
use crate::database::types::LoanRecord;
use crate::notify::{Navigator, Notification, Notifier};
use core::sync::atomic::{AtomicBool, Ordering};
use guard::InFlightGuard;
use log::error;
use uuid::Uuid;

const GENERIC_FAILURE: &str = "An error occurred while borrowing the book.";

/// How a borrow attempt ended. Every variant has already been shown to the user.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorrowOutcome {
    /// The loan that was opened, when the borrow operation reported it
    Borrowed(Option<LoanRecord>),
    /// The borrow operation refused, with its reason
    Rejected(String),
    /// The borrow operation could not be completed
    Failed,
    /// The user may not borrow this book, nothing was submitted
    Ineligible,
    /// Another borrow of this client is still running, nothing was submitted and the user was
    /// asked to slow down
    AlreadyInFlight,
}

pub struct BorrowClient<'deps, S, N, V> {
    service: &'deps S,
    notifier: &'deps N,
    navigator: &'deps V,
    in_flight: AtomicBool,
}

impl<'deps, S, N, V> BorrowClient<'deps, S, N, V>
where
    S: BorrowService,
    N: Notifier,
    V: Navigator,
{
    #[must_use]
    #[inline]
    pub const fn new(service: &'deps S, notifier: &'deps N, navigator: &'deps V) -> Self {
        Self {
            service,
            notifier,
            navigator,
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    #[inline]
    pub fn is_borrowing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    #[must_use]
    #[inline]
    pub fn button_label(&self) -> &'static str {
        if self.is_borrowing() {
            "Borrowing..."
        } else {
            "Borrow Book"
        }
    }

    /// Borrow `book_id` for `user_id`. An ineligible user is told why and nothing is submitted;
    /// on success the user is sent back to the home page.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per click")]
    pub async fn borrow(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        eligibility: &BorrowEligibility,
    ) -> BorrowOutcome {
        if !eligibility.is_eligible {
            self.notifier
                .notify(Notification::failure("Error", eligibility.message.clone()));
            return BorrowOutcome::Ineligible;
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            self.notifier.notify(Notification::too_fast());
            return BorrowOutcome::AlreadyInFlight;
        };

        match self
            .service
            .borrow_book(BorrowRequest::new(user_id, book_id))
            .await
        {
            Ok(response) if response.success => {
                self.notifier.notify(Notification::success(
                    "Success!",
                    "Book borrowed successfully.",
                ));
                self.navigator.navigate("/");
                BorrowOutcome::Borrowed(response.data)
            }
            Ok(response) => {
                let reason = response
                    .error
                    .unwrap_or_else(|| String::from(GENERIC_FAILURE));
                self.notifier
                    .notify(Notification::failure("Error", reason.clone()));
                BorrowOutcome::Rejected(reason)
            }
            Err(err) => {
                error!("Borrowing book {book_id} for {user_id} failed: {err}");
                self.notifier
                    .notify(Notification::failure("Error", GENERIC_FAILURE));
                BorrowOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Test doubles are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::actions::BorrowResponse;
    use crate::notify::Variant;
    use crate::testing::{RecordingNavigator, RecordingNotifier};
    use core::future::Future;
    use core::time::Duration;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    enum Reply {
        Success,
        Refuse(&'static str),
        Fail(&'static str),
    }

    struct FakeService {
        reply: Reply,
        /// When set, every call waits for a permit before answering
        hold: Option<Notify>,
        requests: Mutex<Vec<BorrowRequest>>,
    }

    impl FakeService {
        fn replying(reply: Reply) -> Self {
            Self {
                reply,
                hold: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn held() -> Self {
            Self {
                hold: Some(Notify::new()),
                ..Self::replying(Reply::Success)
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl BorrowService for FakeService {
        type Error = String;

        fn borrow_book(
            &self,
            request: BorrowRequest,
        ) -> impl Future<Output = Result<BorrowResponse, String>> + Send {
            self.requests.lock().unwrap().push(request);
            async move {
                if let Some(hold) = &self.hold {
                    hold.notified().await;
                }
                match self.reply {
                    Reply::Success => Ok(BorrowResponse {
                        success: true,
                        data: None,
                        error: None,
                    }),
                    Reply::Refuse(reason) => Ok(BorrowResponse::rejected(reason)),
                    Reply::Fail(reason) => Err(reason.to_owned()),
                }
            }
        }
    }

    fn eligible() -> BorrowEligibility {
        BorrowEligibility::new(true, "")
    }

    #[tokio::test]
    async fn ineligible_user_is_told_why_and_nothing_is_submitted() {
        let service = FakeService::replying(Reply::Success);
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();
        let client = BorrowClient::new(&service, &notifier, &navigator);

        let outcome = client
            .borrow(
                Uuid::new_v4(),
                Uuid::new_v4(),
                &BorrowEligibility::new(false, "Book is not available"),
            )
            .await;

        assert_eq!(outcome, BorrowOutcome::Ineligible);
        assert_eq!(service.calls(), 0);
        assert_eq!(
            notifier.notifications(),
            vec![Notification::failure("Error", "Book is not available")]
        );
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn success_notifies_and_goes_home() {
        let service = FakeService::replying(Reply::Success);
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();
        let client = BorrowClient::new(&service, &notifier, &navigator);
        let (user_id, book_id) = (Uuid::new_v4(), Uuid::new_v4());

        let outcome = client.borrow(user_id, book_id, &eligible()).await;

        assert_eq!(outcome, BorrowOutcome::Borrowed(None));
        assert_eq!(
            *service.requests.lock().unwrap(),
            vec![BorrowRequest::new(user_id, book_id)]
        );
        assert_eq!(
            notifier.last(),
            Some(Notification::success("Success!", "Book borrowed successfully."))
        );
        assert_eq!(navigator.routes(), vec![String::from("/")]);
        assert!(!client.is_borrowing());
    }

    #[tokio::test]
    async fn refusal_shows_the_reason_verbatim() {
        let service = FakeService::replying(Reply::Refuse("Book is not available for borrowing"));
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();
        let client = BorrowClient::new(&service, &notifier, &navigator);

        let outcome = client.borrow(Uuid::new_v4(), Uuid::new_v4(), &eligible()).await;

        assert_eq!(
            outcome,
            BorrowOutcome::Rejected(String::from("Book is not available for borrowing"))
        );
        let shown = notifier.last().unwrap();
        assert_eq!(shown.variant, Variant::Destructive);
        assert_eq!(shown.description, "Book is not available for borrowing");
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn unexpected_error_shows_generic_message_and_clears_flag() {
        let service = FakeService::replying(Reply::Fail("connection reset"));
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();
        let client = BorrowClient::new(&service, &notifier, &navigator);

        let outcome = client.borrow(Uuid::new_v4(), Uuid::new_v4(), &eligible()).await;

        assert_eq!(outcome, BorrowOutcome::Failed);
        assert_eq!(
            notifier.last(),
            Some(Notification::failure(
                "Error",
                "An error occurred while borrowing the book."
            ))
        );
        assert!(!client.is_borrowing());
        assert_eq!(client.button_label(), "Borrow Book");
    }

    #[tokio::test]
    async fn second_click_while_borrowing_is_ignored() {
        let service = FakeService::held();
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();
        let client = BorrowClient::new(&service, &notifier, &navigator);
        let (user_id, book_id) = (Uuid::new_v4(), Uuid::new_v4());

        let first_eligibility = eligible();
        let (first, second) = tokio::join!(client.borrow(user_id, book_id, &first_eligibility), async {
            tokio::task::yield_now().await;
            assert!(client.is_borrowing());
            assert_eq!(client.button_label(), "Borrowing...");
            let outcome = client.borrow(user_id, book_id, &eligible()).await;
            service.hold.as_ref().unwrap().notify_one();
            outcome
        });

        assert_eq!(first, BorrowOutcome::Borrowed(None));
        assert_eq!(second, BorrowOutcome::AlreadyInFlight);
        assert_eq!(service.calls(), 1);
        assert_eq!(
            notifier.notifications(),
            vec![
                Notification::too_fast(),
                Notification::success("Success!", "Book borrowed successfully.")
            ]
        );
        assert!(!client.is_borrowing());
    }

    #[tokio::test]
    async fn cancelled_borrow_releases_the_flag() {
        let service = FakeService::held();
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();
        let client = BorrowClient::new(&service, &notifier, &navigator);

        let attempt = tokio::time::timeout(
            Duration::from_millis(20),
            client.borrow(Uuid::new_v4(), Uuid::new_v4(), &eligible()),
        )
        .await;

        assert!(attempt.is_err());
        assert!(!client.is_borrowing());
        assert!(notifier.notifications().is_empty());
    }
}
