//! Book form
//!
//! The admin form for adding a book to the catalog or editing an existing one. Cover and trailer
//! are filled in by upload widgets through [`BookForm::set_value`].
use crate::actions::BookCatalog;
use crate::database::types::BookRecord;
use crate::forms::field::UploadSpec;
use crate::forms::render::{FormRenderer, render};
use crate::forms::schema::{BOOK_SCHEMA, BookDraft, names};
use crate::forms::values::{FieldErrors, FormValues};
use crate::notify::{Navigator, Notification, Notifier};
use log::error;
use uuid::Uuid;

const CREATE_FAILED: &str = "An error occurred while creating the book";
const UPDATE_FAILED: &str = "An error occurred while updating the book";

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update(Uuid),
}

/// How a submission ended. Every variant except `Invalid` has been shown to the user.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed, nothing was submitted
    Invalid(FieldErrors),
    Saved(Uuid),
    Rejected(String),
    Failed,
}

#[derive(Debug, Clone)]
pub struct BookForm {
    mode: FormMode,
    values: FormValues,
    errors: FieldErrors,
}

impl Default for BookForm {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl BookForm {
    /// An empty form for a new book
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        let mut values: FormValues = BOOK_SCHEMA
            .fields
            .iter()
            .map(|field| (field.name, ""))
            .collect();
        values.set(names::RATING, "1");
        values.set(names::TOTAL_COPIES, "0");

        Self {
            mode: FormMode::Create,
            values,
            errors: FieldErrors::new(),
        }
    }

    /// A form seeded with the details of an existing book
    #[must_use]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub fn for_update(book: &BookRecord) -> Self {
        let values = [
            (names::TITLE, book.title.clone()),
            (names::AUTHOR, book.author.clone()),
            (names::GENRE, book.genre.clone()),
            (names::RATING, book.rating.to_string()),
            (names::TOTAL_COPIES, book.total_copies.to_string()),
            (names::COVER_URL, book.cover_url.clone()),
            (names::COVER_COLOR, book.cover_color.clone()),
            (names::DESCRIPTION, book.description.clone()),
            (names::VIDEO_URL, book.video_url.clone()),
            (names::SUMMARY, book.summary.clone()),
        ]
        .into_iter()
        .collect();

        Self {
            mode: FormMode::Update(book.id),
            values,
            errors: FieldErrors::new(),
        }
    }

    #[must_use]
    #[inline]
    pub const fn mode(&self) -> FormMode {
        self.mode
    }

    #[inline]
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        self.values.set(name, value);
    }

    #[must_use]
    #[inline]
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name)
    }

    #[must_use]
    #[inline]
    pub const fn field_errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[must_use]
    #[inline]
    pub const fn submit_label(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Add Book to Library",
            FormMode::Update(_) => "Update Book",
        }
    }

    /// Upload settings of the cover or trailer field
    #[must_use]
    #[inline]
    pub fn upload_spec(name: &str) -> Option<UploadSpec> {
        BOOK_SCHEMA.upload_spec(name)
    }

    #[inline]
    pub fn render<R: FormRenderer>(&self, renderer: R) -> R::Output {
        render(
            &BOOK_SCHEMA,
            &self.values,
            &self.errors,
            self.submit_label(),
            renderer,
        )
    }

    /// Validate the current values, keeping the errors for rendering.
    /// # Errors
    /// Returns the field errors if any field fails its rule.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per submission")]
    pub fn validate(&mut self) -> Result<BookDraft, FieldErrors> {
        let result = BookDraft::try_from(&self.values);
        self.errors = result.as_ref().err().cloned().unwrap_or_default();
        result
    }

    /// Validate and save the book. A saved book's admin page is opened afterwards.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per submission")]
    pub async fn submit<C, N, V>(
        &mut self,
        catalog: &C,
        notifier: &N,
        navigator: &V,
    ) -> SubmitOutcome
    where
        C: BookCatalog,
        N: Notifier,
        V: Navigator,
    {
        let draft = match self.validate() {
            Ok(draft) => draft,
            Err(errors) => return SubmitOutcome::Invalid(errors),
        };

        let (result, saved, generic) = match self.mode {
            FormMode::Create => (
                catalog.create_book(draft).await,
                "Book created successfully",
                CREATE_FAILED,
            ),
            FormMode::Update(id) => (
                catalog.update_book(id, draft).await,
                "Book updated successfully",
                UPDATE_FAILED,
            ),
        };

        match result {
            Ok(response) if response.success => {
                let Some(created) = response.data else {
                    error!("Catalog reported success without a book id");
                    notifier.notify(Notification::failure("Error", generic));
                    return SubmitOutcome::Failed;
                };
                notifier.notify(Notification::success("Success", saved));
                navigator.navigate(&format!("/admin/books/{}", created.id));
                SubmitOutcome::Saved(created.id)
            }
            Ok(response) => {
                let message = response.message.unwrap_or_else(|| String::from(generic));
                notifier.notify(Notification::failure("Error", message.clone()));
                SubmitOutcome::Rejected(message)
            }
            Err(err) => {
                error!("Saving book failed: {err}");
                notifier.notify(Notification::failure("Error", generic));
                SubmitOutcome::Failed
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
    use crate::actions::CreateBookResponse;
    use crate::database::Db;
    use crate::forms::render::TextRenderer;
    use crate::notify::Variant;
    use crate::testing::{
        FakeAuthenticator, FakeHost, RecordingNavigator, RecordingNotifier, book_values,
    };
    use crate::upload::{SelectedFile, UploadWidget};
    use core::future::Future;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Catalog double that answers every call with the same reply and keeps the drafts
    struct FakeCatalog {
        reply: Result<CreateBookResponse, &'static str>,
        drafts: Mutex<Vec<BookDraft>>,
    }

    impl FakeCatalog {
        fn replying(reply: Result<CreateBookResponse, &'static str>) -> Self {
            Self {
                reply,
                drafts: Mutex::new(Vec::new()),
            }
        }
    }

    impl BookCatalog for FakeCatalog {
        type Error = &'static str;

        fn create_book(
            &self,
            draft: BookDraft,
        ) -> impl Future<Output = Result<CreateBookResponse, Self::Error>> + Send {
            self.drafts.lock().unwrap().push(draft);
            let reply = self.reply.clone();
            async move { reply }
        }

        fn update_book(
            &self,
            _id: Uuid,
            draft: BookDraft,
        ) -> impl Future<Output = Result<CreateBookResponse, Self::Error>> + Send {
            self.create_book(draft)
        }
    }

    fn filled_form() -> BookForm {
        let mut form = BookForm::new();
        for (name, value) in book_values().iter() {
            form.set_value(name, value);
        }
        form
    }

    #[test]
    fn new_form_starts_with_defaults() {
        let form = BookForm::new();
        assert_eq!(form.mode(), FormMode::Create);
        assert_eq!(form.value(names::RATING), "1");
        assert_eq!(form.value(names::TOTAL_COPIES), "0");
        assert_eq!(form.value(names::TITLE), "");
        assert_eq!(form.submit_label(), "Add Book to Library");
    }

    #[tokio::test]
    async fn invalid_form_is_never_submitted() {
        let catalog = FakeCatalog::replying(Ok(CreateBookResponse::created(Uuid::new_v4())));
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();
        let mut form = BookForm::new();

        let outcome = form.submit(&catalog, &notifier, &navigator).await;

        let errors = match outcome {
            SubmitOutcome::Invalid(errors) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        };
        assert_eq!(
            errors.get(names::TOTAL_COPIES),
            Some("Number must be greater than or equal to 1")
        );
        assert_eq!(form.field_errors(), &errors);
        assert!(catalog.drafts.lock().unwrap().is_empty());
        assert!(notifier.notifications().is_empty());
        assert!(form.render(TextRenderer::new()).contains("  ! "));
    }

    #[tokio::test]
    async fn created_book_opens_its_admin_page() {
        let id = Uuid::new_v4();
        let catalog = FakeCatalog::replying(Ok(CreateBookResponse::created(id)));
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();
        let mut form = filled_form();

        let outcome = form.submit(&catalog, &notifier, &navigator).await;

        assert_eq!(outcome, SubmitOutcome::Saved(id));
        assert_eq!(catalog.drafts.lock().unwrap()[0].title, "Dune");
        assert_eq!(
            notifier.last(),
            Some(Notification::success("Success", "Book created successfully"))
        );
        assert_eq!(navigator.routes(), vec![format!("/admin/books/{id}")]);
    }

    #[tokio::test]
    async fn rejection_shows_the_catalog_message() {
        let catalog = FakeCatalog::replying(Ok(CreateBookResponse::rejected("Title already taken")));
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();
        let mut form = filled_form();

        let outcome = form.submit(&catalog, &notifier, &navigator).await;

        assert_eq!(outcome, SubmitOutcome::Rejected(String::from("Title already taken")));
        assert_eq!(
            notifier.last(),
            Some(Notification::failure("Error", "Title already taken"))
        );
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn unexpected_error_shows_the_generic_message() {
        let catalog = FakeCatalog::replying(Err("database is locked"));
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();
        let mut form = filled_form();

        let outcome = form.submit(&catalog, &notifier, &navigator).await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        let shown = notifier.last().unwrap();
        assert_eq!(shown.variant, Variant::Destructive);
        assert_eq!(shown.description, "An error occurred while creating the book");
    }

    #[tokio::test]
    async fn uploaded_assets_are_what_gets_submitted() {
        let catalog = FakeCatalog::replying(Ok(CreateBookResponse::created(Uuid::new_v4())));
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();
        let authenticator = FakeAuthenticator::default();
        let host = FakeHost::with_progress(vec![(50, 100), (100, 100)]);

        let mut form = filled_form();
        form.set_value(names::COVER_URL, "");
        form.set_value(names::VIDEO_URL, "");

        let mut cover = UploadWidget::new(
            BookForm::upload_spec(names::COVER_URL).unwrap(),
            &authenticator,
            &host,
            &notifier,
        );
        cover
            .upload(SelectedFile::new("arrakis.png", vec![1; 100]), |path| {
                form.set_value(names::COVER_URL, path);
            })
            .await;
        let mut trailer = UploadWidget::new(
            BookForm::upload_spec(names::VIDEO_URL).unwrap(),
            &authenticator,
            &host,
            &notifier,
        );
        trailer
            .upload(SelectedFile::new("arrakis.mp4", vec![1; 100]), |path| {
                form.set_value(names::VIDEO_URL, path);
            })
            .await;

        let outcome = form.submit(&catalog, &notifier, &navigator).await;

        assert!(matches!(outcome, SubmitOutcome::Saved(_)));
        let drafts = catalog.drafts.lock().unwrap();
        assert_eq!(drafts[0].cover_url, "books/covers/arrakis.png");
        assert_eq!(drafts[0].video_url, "books/videos/arrakis.mp4");
    }

    #[tokio::test]
    async fn update_mode_saves_over_the_existing_book() {
        let db = Db::in_memory().await.unwrap();
        let draft = BookDraft::try_from(&book_values()).unwrap();
        let book = db.insert_book(&draft).await.unwrap();
        let notifier = RecordingNotifier::default();
        let navigator = RecordingNavigator::default();

        let mut form = BookForm::for_update(&book);
        assert_eq!(form.submit_label(), "Update Book");
        assert_eq!(form.value(names::TITLE), "Dune");
        form.set_value(names::TOTAL_COPIES, "20");

        let outcome = form.submit(&db, &notifier, &navigator).await;

        assert_eq!(outcome, SubmitOutcome::Saved(book.id));
        let saved = db.fetch_book(book.id).await.unwrap();
        assert_eq!(saved.total_copies, 20);
        assert_eq!(saved.available_copies, 20);
        assert_eq!(db.fetch_books().await.unwrap().len(), 1);
        assert_eq!(
            notifier.last(),
            Some(Notification::success("Success", "Book updated successfully"))
        );
    }
}
