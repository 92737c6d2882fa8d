//! Command handlers. Each one drives the same core components a graphical front-end would, with
//! notifications going to the log and results printed to stdout.
use crate::cli::{Command, CreateBook, SignUp};
use crate::errors::Error;
use crate::state::AppState;
use chrono::{NaiveDate, Utc};
use libris_core::borrow::{BorrowClient, BorrowOutcome};
use libris_core::database::{BookRecord, LoanRecord, NewUser, UserRecord, UserStatus};
use libris_core::forms::auth::{AuthCredentials, AuthForm, AuthFormKind};
use libris_core::forms::book::{BookForm, SubmitOutcome};
use libris_core::forms::render::TextRenderer;
use libris_core::forms::schema::{BOOK_SCHEMA, SIGN_UP_SCHEMA, Schema, names};
use libris_core::upload::{HttpAuthenticator, ImageKitHost, SelectedFile, UploadWidget};
use std::path::Path;
use tracing::{info, instrument};
use uuid::Uuid;

#[allow(clippy::print_stdout, reason = "Command output")]
fn print_line(line: &str) {
    println!("{line}");
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub async fn dispatch(state: &AppState, command: Command) -> Result<(), Error> {
    match command {
        Command::SignUp(args) => sign_up(state, args).await,
        Command::SignIn { email, password } => sign_in(state, email, password).await,
        Command::AddUser {
            full_name,
            email,
            university_id,
            card_url,
            approved,
        } => {
            let user = NewUser::new(full_name, email, university_id, card_url);
            add_user(state, &user, approved).await
        }
        Command::ApproveUser { user_id, reject } => {
            let status = if reject {
                UserStatus::Rejected
            } else {
                UserStatus::Approved
            };
            set_status(state, user_id, status).await
        }
        Command::CreateBook(args) => create_book(state, args).await,
        Command::ListBooks { json } => list_books(state, json).await,
        Command::Borrow { user_id, book_id } => borrow(state, user_id, book_id).await,
        Command::Return { loan_id } => return_loan(state, loan_id).await,
        Command::Loans { user_id } => list_loans(state, user_id).await,
    }
}

/// Upload `path` through the widget of an upload field and return the stored asset path.
#[instrument(name = "cmd.upload", skip(state, schema), fields(path = ?path))]
async fn upload_field(
    state: &AppState,
    schema: &Schema,
    field: &str,
    path: &Path,
) -> Result<String, Error> {
    let spec = schema
        .upload_spec(field)
        .ok_or_else(|| Error::Refused(format!("{field} is not an upload field")))?;
    let config = state.config()?;
    let authenticator = HttpAuthenticator::new(config)?;
    let host = ImageKitHost::new(config)?;
    let unreadable = |source| Error::File {
        path: path.to_owned(),
        source,
    };

    let mut widget = UploadWidget::new(spec, &authenticator, &host, &state.notifier);
    let size = SelectedFile::size_on_disk(path).await.map_err(unreadable)?;
    if !widget.validate_size(size) {
        return Err(Error::Refused(String::from(spec.kind.too_large_message())));
    }
    let file = SelectedFile::from_path(path).await.map_err(unreadable)?;

    let mut uploaded = None;
    widget
        .upload(file, |asset| uploaded = Some(asset.to_owned()))
        .await;
    let asset = uploaded.ok_or_else(|| Error::Upload(path.to_owned()))?;
    info!("Stored {field} at {}", config.imagekit.asset_url(&asset));
    Ok(asset)
}

#[instrument(name = "cmd.sign_up", skip_all, fields(email = %args.email))]
async fn sign_up(state: &AppState, args: SignUp) -> Result<(), Error> {
    let mut form = AuthForm::new(AuthFormKind::SignUp);
    form.set_value(names::FULL_NAME, args.full_name);
    form.set_value(names::EMAIL, args.email);
    form.set_value(names::UNIVERSITY_ID, args.university_id);
    form.set_value(names::PASSWORD, args.password);
    if let Some(card_url) = args.card_url {
        form.set_value(names::UNIVERSITY_CARD, card_url);
    } else if let Some(card) = args.card {
        let asset = upload_field(state, &SIGN_UP_SCHEMA, names::UNIVERSITY_CARD, &card).await?;
        form.set_value(names::UNIVERSITY_CARD, asset);
    }

    let credentials = match form.submit() {
        Ok(AuthCredentials::SignUp(credentials)) => credentials,
        Ok(_) => return Err(Error::Refused(String::from("Unexpected sign-in credentials"))),
        Err(errors) => {
            print_line(&form.render(TextRenderer::new()));
            return Err(Error::Invalid(errors));
        }
    };

    let user = state.db.insert_user(&NewUser::from(credentials)).await?;
    info!("Account {} created, awaiting approval", user.id);
    print_line(&user_line(&user));
    Ok(())
}

#[instrument(name = "cmd.sign_in", skip_all, fields(email = %email))]
async fn sign_in(state: &AppState, email: String, password: String) -> Result<(), Error> {
    let mut form = AuthForm::new(AuthFormKind::SignIn);
    form.set_value(names::EMAIL, email);
    form.set_value(names::PASSWORD, password);
    let credentials = match form.submit() {
        Ok(AuthCredentials::SignIn(credentials)) => credentials,
        Ok(_) => return Err(Error::Refused(String::from("Unexpected sign-up credentials"))),
        Err(errors) => {
            print_line(&form.render(TextRenderer::new()));
            return Err(Error::Invalid(errors));
        }
    };

    let Some(user) = state.db.fetch_user_by_email(&credentials.email).await? else {
        return Err(Error::Refused(format!(
            "No account is registered for {}",
            credentials.email
        )));
    };
    if state.db.touch_last_activity(user.id, today()).await? {
        info!("First activity of {} today", user.id);
    }
    print_line(&user_line(&user));
    Ok(())
}

#[instrument(name = "cmd.add_user", skip_all, fields(email = %user.email))]
async fn add_user(state: &AppState, user: &NewUser, approved: bool) -> Result<(), Error> {
    let mut record = state.db.insert_user(user).await?;
    if approved {
        state.db.set_user_status(record.id, UserStatus::Approved).await?;
        record = state.db.fetch_user(record.id).await?;
    }
    print_line(&user_line(&record));
    Ok(())
}

#[instrument(name = "cmd.set_status", skip(state))]
async fn set_status(state: &AppState, user_id: Uuid, status: UserStatus) -> Result<(), Error> {
    state.db.set_user_status(user_id, status).await?;
    let user = state.db.fetch_user(user_id).await?;
    print_line(&user_line(&user));
    Ok(())
}

#[instrument(name = "cmd.create_book", skip_all, fields(title = %args.title))]
async fn create_book(state: &AppState, args: CreateBook) -> Result<(), Error> {
    let mut form = BookForm::new();
    form.set_value(names::TITLE, args.title);
    form.set_value(names::AUTHOR, args.author);
    form.set_value(names::GENRE, args.genre);
    form.set_value(names::RATING, args.rating);
    form.set_value(names::TOTAL_COPIES, args.total_copies);
    form.set_value(names::COVER_COLOR, args.cover_color);
    form.set_value(names::DESCRIPTION, args.description);
    form.set_value(names::SUMMARY, args.summary);

    let media = [
        (names::COVER_URL, args.cover, args.cover_url),
        (names::VIDEO_URL, args.trailer, args.trailer_url),
    ];
    for (field, file, asset) in media {
        if let Some(asset) = asset {
            form.set_value(field, asset);
        } else if let Some(file) = file {
            let asset = upload_field(state, &BOOK_SCHEMA, field, &file).await?;
            form.set_value(field, asset);
        }
    }

    match form.submit(&state.db, &state.notifier, &state.navigator).await {
        SubmitOutcome::Saved(id) => {
            let book = state.db.fetch_book(id).await?;
            print_line(&book_line(&book));
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => {
            print_line(&form.render(TextRenderer::new()));
            Err(Error::Invalid(errors))
        }
        SubmitOutcome::Rejected(message) => Err(Error::Refused(message)),
        _ => Err(Error::Refused(String::from("The book could not be saved"))),
    }
}

#[instrument(name = "cmd.list_books", skip(state))]
async fn list_books(state: &AppState, json: bool) -> Result<(), Error> {
    let books = state.db.fetch_books().await?;
    if json {
        print_line(&serde_json::to_string_pretty(&books)?);
    } else {
        for book in &books {
            print_line(&book_line(book));
        }
    }
    Ok(())
}

#[instrument(name = "cmd.borrow", skip(state))]
async fn borrow(state: &AppState, user_id: Uuid, book_id: Uuid) -> Result<(), Error> {
    state.db.touch_last_activity(user_id, today()).await?;
    let eligibility = state.db.borrowing_eligibility(user_id, book_id).await?;

    let client = BorrowClient::new(&state.db, &state.notifier, &state.navigator);
    match client.borrow(user_id, book_id, &eligibility).await {
        BorrowOutcome::Borrowed(Some(loan)) => {
            print_line(&loan_line(&loan));
            Ok(())
        }
        BorrowOutcome::Borrowed(None) => Ok(()),
        BorrowOutcome::Rejected(reason) => Err(Error::Refused(reason)),
        BorrowOutcome::Ineligible => Err(Error::Refused(eligibility.message)),
        _ => Err(Error::Refused(String::from(
            "An error occurred while borrowing the book.",
        ))),
    }
}

#[instrument(name = "cmd.return", skip(state))]
async fn return_loan(state: &AppState, loan_id: Uuid) -> Result<(), Error> {
    let loan = state.db.return_book(loan_id, today()).await?;
    print_line(&loan_line(&loan));
    Ok(())
}

#[instrument(name = "cmd.loans", skip(state))]
async fn list_loans(state: &AppState, user_id: Uuid) -> Result<(), Error> {
    for loan in state.db.fetch_loans_for_user(user_id).await? {
        print_line(&loan_line(&loan));
    }
    Ok(())
}

fn user_line(user: &UserRecord) -> String {
    format!(
        "{}  {} <{}>  {:?}",
        user.id, user.full_name, user.email, user.status
    )
}

fn book_line(book: &BookRecord) -> String {
    format!(
        "{}  {} by {}  {}/{} available",
        book.id, book.title, book.author, book.available_copies, book.total_copies
    )
}

fn loan_line(loan: &LoanRecord) -> String {
    let state = match loan.return_date {
        Some(returned) => format!("returned {returned}"),
        None => format!("due {}", loan.due_date),
    };
    format!("{}  book {}  {state}", loan.id, loan.book_id)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests run against a fresh in-memory database and are guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use libris_core::config::{AppConfig, ConfigError, ImageKitConfig};
    use libris_core::database::Db;
    use pretty_assertions::assert_eq;

    async fn state() -> AppState {
        let db = Db::in_memory().await.unwrap();
        AppState::new(db, Err(ConfigError::Missing("LIBRIS_API_ENDPOINT")))
    }

    fn dune(total_copies: &str) -> CreateBook {
        CreateBook {
            title: String::from(" Dune "),
            author: String::from("Frank Herbert"),
            genre: String::from("Science Fiction"),
            rating: String::from("5"),
            total_copies: total_copies.to_owned(),
            cover_color: String::from("#c4a46b"),
            description: String::from("A desert planet and its spice."),
            summary: String::from("Paul Atreides travels to Arrakis."),
            cover: None,
            cover_url: Some(String::from("/books/covers/dune.png")),
            trailer: None,
            trailer_url: Some(String::from("/books/videos/dune.mp4")),
        }
    }

    #[tokio::test]
    async fn created_book_is_stored_with_trimmed_title() {
        let state = state().await;

        dispatch(&state, Command::CreateBook(dune("3"))).await.unwrap();

        let books = state.db.fetch_books().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Dune");
        assert_eq!(books[0].available_copies, 3);
    }

    #[tokio::test]
    async fn invalid_book_is_not_stored() {
        let state = state().await;

        let error = dispatch(&state, Command::CreateBook(dune("0"))).await.unwrap_err();

        assert!(matches!(error, Error::Invalid(_)));
        assert!(state.db.fetch_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn uploads_need_configuration() {
        let state = state().await;
        let mut args = dune("3");
        args.cover_url = None;
        args.cover = Some("dune.png".into());

        let error = dispatch(&state, Command::CreateBook(args)).await.unwrap_err();

        assert!(matches!(error, Error::Config(ConfigError::Missing(_))));
    }

    #[tokio::test]
    async fn oversized_cover_is_refused_before_it_is_read() {
        let db = Db::in_memory().await.unwrap();
        let config = AppConfig::new(
            "http://127.0.0.1:9",
            ImageKitConfig::new("public_key", "https://ik.imagekit.io/libris"),
        );
        let state = AppState::new(db, Ok(config));
        let cover = std::env::temp_dir().join(format!("libris-cover-{}.png", Uuid::new_v4()));
        std::fs::File::create(&cover)
            .unwrap()
            .set_len(21 * 1024 * 1024)
            .unwrap();
        let mut args = dune("3");
        args.cover_url = None;
        args.cover = Some(cover.clone());

        let error = dispatch(&state, Command::CreateBook(args)).await.unwrap_err();
        std::fs::remove_file(&cover).unwrap();

        assert_eq!(error.to_string(), "Please upload a file smaller than 20MB.");
        assert!(state.db.fetch_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sign_up_without_card_is_rejected() {
        let state = state().await;
        let args = SignUp {
            full_name: String::from("Ada Reader"),
            email: String::from("ada@uni.edu"),
            university_id: String::from("42"),
            password: String::from("correct horse"),
            card: None,
            card_url: None,
        };

        let error = dispatch(&state, Command::SignUp(args)).await.unwrap_err();

        match error {
            Error::Invalid(errors) => assert_eq!(
                errors.get(names::UNIVERSITY_CARD),
                Some("University Card is required")
            ),
            other => panic!("expected field errors, got {other}"),
        }
    }

    #[tokio::test]
    async fn pending_user_cannot_borrow_until_approved() {
        let state = state().await;
        dispatch(&state, Command::CreateBook(dune("1"))).await.unwrap();
        let book = state.db.fetch_books().await.unwrap().remove(0);
        let user = state
            .db
            .insert_user(&NewUser::new("Ada Reader", "ada@uni.edu", 42, "/ids/ada.png"))
            .await
            .unwrap();

        let refused = dispatch(&state, Command::Borrow {
            user_id: user.id,
            book_id: book.id,
        })
        .await
        .unwrap_err();
        assert_eq!(refused.to_string(), "You are not eligible to borrow this book");

        dispatch(&state, Command::ApproveUser {
            user_id: user.id,
            reject: false,
        })
        .await
        .unwrap();
        dispatch(&state, Command::Borrow {
            user_id: user.id,
            book_id: book.id,
        })
        .await
        .unwrap();

        let loans = state.db.fetch_loans_for_user(user.id).await.unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(state.db.fetch_book(book.id).await.unwrap().available_copies, 0);

        dispatch(&state, Command::Return {
            loan_id: loans[0].id,
        })
        .await
        .unwrap();
        assert_eq!(state.db.fetch_book(book.id).await.unwrap().available_copies, 1);
        assert_eq!(
            state.db.fetch_user(user.id).await.unwrap().last_activity_date,
            Some(today())
        );
    }

    #[tokio::test]
    async fn borrowing_again_after_a_return_opens_a_new_loan() {
        let state = state().await;
        dispatch(&state, Command::CreateBook(dune("1"))).await.unwrap();
        let book = state.db.fetch_books().await.unwrap().remove(0);
        let user = state
            .db
            .insert_user(&NewUser::new("Ada Reader", "ada@uni.edu", 42, "/ids/ada.png"))
            .await
            .unwrap();
        state.db.set_user_status(user.id, UserStatus::Approved).await.unwrap();
        let client = BorrowClient::new(&state.db, &state.notifier, &state.navigator);
        let eligible = state.db.borrowing_eligibility(user.id, book.id).await.unwrap();

        let first = match client.borrow(user.id, book.id, &eligible).await {
            BorrowOutcome::Borrowed(Some(loan)) => loan,
            other => panic!("expected a loan, got {other:?}"),
        };
        dispatch(&state, Command::Return { loan_id: first.id }).await.unwrap();

        let eligible = state.db.borrowing_eligibility(user.id, book.id).await.unwrap();
        let second = match client.borrow(user.id, book.id, &eligible).await {
            BorrowOutcome::Borrowed(Some(loan)) => loan,
            other => panic!("expected a loan, got {other:?}"),
        };

        assert!(second.id != first.id);
        assert_eq!(second.return_date, None);
        assert_eq!(second.borrow_date, first.borrow_date);
        let loans = state.db.fetch_loans_for_user(user.id).await.unwrap();
        assert_eq!(loans.len(), 2);
        assert_eq!(state.db.fetch_book(book.id).await.unwrap().available_copies, 0);

        dispatch(&state, Command::Return { loan_id: second.id }).await.unwrap();
        dispatch(&state, Command::Borrow {
            user_id: user.id,
            book_id: book.id,
        })
        .await
        .unwrap();
        assert_eq!(state.db.fetch_loans_for_user(user.id).await.unwrap().len(), 3);
    }
}
