use crate::actions::{
    BookCatalog, BorrowEligibility, BorrowRequest, BorrowResponse, BorrowService,
    CreateBookResponse,
};
use crate::database::types::{
    BookRecord, DbError, LoanRecord, LoanStatus, NewUser, UserRecord, UserStatus,
};
use crate::forms::schema::BookDraft;
use chrono::{Days, NaiveDate, Utc};
use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use uuid::Uuid;

/// Days a book may be kept before it is due
const LOAN_PERIOD: Days = Days::new(7);

const NOT_AVAILABLE: &str = "Book is not available for borrowing";
const NOT_ELIGIBLE: &str = "You are not eligible to borrow this book";
const CREATE_FAILED: &str = "An error occurred while creating the book";
const UPDATE_FAILED: &str = "An error occurred while updating the book";

#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open the database at `path`, creating the file if it does not exist yet, and bring its
    /// schema up to date.
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once at start of program"
    )]
    pub async fn init(path: &Path) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::new()
            .foreign_keys(true)
            .create_if_missing(true)
            .filename(path);
        let pool = SqlitePool::connect_with(options).await?;
        sqlx::migrate!().run(&pool).await?;

        Ok(Self { pool })
    }

    /// A private database that lives as long as the returned handle.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn in_memory() -> Result<Self, DbError> {
        let options = "sqlite::memory:"
            .parse::<SqliteConnectOptions>()?
            .foreign_keys(true);
        // every connection to :memory: opens its own database, so keep exactly one alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        sqlx::migrate!().run(&pool).await?;

        Ok(Self { pool })
    }

    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once at end of program"
    )]
    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn insert_user(&self, user: &NewUser) -> Result<UserRecord, DbError> {
        let inserted: Result<UserRecord, sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO users (id, full_name, email, university_id, university_card, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *;
        "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(user.university_id)
        .bind(&user.university_card)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(record) => Ok(record),
            Err(error) if is_sqlite_unique_violation(&error) => {
                Err(DbError::UserAlreadyExists(user.email.clone()))
            }
            Err(error) => Err(DbError::Db(error)),
        }
    }

    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn fetch_user(&self, id: Uuid) -> Result<UserRecord, DbError> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound { entity: "user", id })
    }

    /// Look up an account by its sign-in email
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per sign-in")]
    pub async fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DbError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn set_user_status(&self, id: Uuid, status: UserStatus) -> Result<(), DbError> {
        let updated = sqlx::query("UPDATE users SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::NotFound { entity: "user", id });
        }
        Ok(())
    }

    /// Record the user's activity for `today`. The stored date only changes once per day, the
    /// return value tells whether it did.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per request")]
    pub async fn touch_last_activity(&self, id: Uuid, today: NaiveDate) -> Result<bool, DbError> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET last_activity_date = ?1
            WHERE id = ?2 AND (last_activity_date IS NULL OR last_activity_date <> ?1);
        "#,
        )
        .bind(today)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            // distinguish "already today" from an unknown user
            self.fetch_user(id).await?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Add a book to the catalog with all of its copies available.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn insert_book(&self, draft: &BookDraft) -> Result<BookRecord, DbError> {
        let book = sqlx::query_as(
            r#"
            INSERT INTO books (
                id,
                title,
                author,
                genre,
                rating,
                total_copies,
                available_copies,
                description,
                cover_color,
                cover_url,
                video_url,
                summary,
                created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            RETURNING *;
        "#,
        )
        .bind(Uuid::new_v4())
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.genre)
        .bind(draft.rating)
        .bind(draft.total_copies)
        .bind(&draft.description)
        .bind(&draft.cover_color)
        .bind(&draft.cover_url)
        .bind(&draft.video_url)
        .bind(&draft.summary)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    /// Replace a book's details. Copies that are on loan stay on loan, so the total may not drop
    /// below their number and the available count shifts by the change in total.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn modify_book(&self, id: Uuid, draft: &BookDraft) -> Result<BookRecord, DbError> {
        let mut tx: Transaction<'_, Sqlite> = self.pool.begin().await?;

        let counts: Option<(i64, i64)> =
            sqlx::query_as("SELECT total_copies, available_copies FROM books WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((total, available)) = counts else {
            tx.rollback().await.ok();
            return Err(DbError::NotFound { entity: "book", id });
        };

        let on_loan = total.saturating_sub(available);
        if draft.total_copies < on_loan {
            tx.rollback().await.ok();
            return Err(DbError::CopiesOnLoan {
                requested: draft.total_copies,
                on_loan,
            });
        }

        let book = sqlx::query_as(
            r#"
            UPDATE books SET
                title = ?,
                author = ?,
                genre = ?,
                rating = ?,
                total_copies = ?,
                available_copies = ?,
                description = ?,
                cover_color = ?,
                cover_url = ?,
                video_url = ?,
                summary = ?
            WHERE id = ?
            RETURNING *;
        "#,
        )
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.genre)
        .bind(draft.rating)
        .bind(draft.total_copies)
        .bind(draft.total_copies.saturating_sub(on_loan))
        .bind(&draft.description)
        .bind(&draft.cover_color)
        .bind(&draft.cover_url)
        .bind(&draft.video_url)
        .bind(&draft.summary)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(book)
    }

    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called only when the catalog is listed"
    )]
    pub async fn fetch_books(&self) -> Result<Vec<BookRecord>, DbError> {
        let books = sqlx::query_as("SELECT * FROM books ORDER BY created_at DESC, title ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn fetch_book(&self, id: Uuid) -> Result<BookRecord, DbError> {
        sqlx::query_as("SELECT * FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound { entity: "book", id })
    }

    /// Decide whether the borrow button is enabled for `user_id` on `book_id`. Availability is
    /// checked first, so an approved user still sees why an exhausted book cannot be borrowed.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per book page")]
    pub async fn borrowing_eligibility(
        &self,
        user_id: Uuid,
        book_id: Uuid,
    ) -> Result<BorrowEligibility, DbError> {
        let book = self.fetch_book(book_id).await?;
        let user = self.fetch_user(user_id).await?;

        let eligibility = if book.available_copies <= 0 {
            BorrowEligibility::new(false, "Book is not available")
        } else if user.status != UserStatus::Approved {
            BorrowEligibility::new(false, NOT_ELIGIBLE)
        } else {
            BorrowEligibility::new(true, "")
        };
        Ok(eligibility)
    }

    /// Lend one copy of a book to an approved user. The decrement only happens while a copy is
    /// left, so concurrent checkouts can never oversell a book.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per borrow")]
    pub async fn checkout_book(
        &self,
        request: BorrowRequest,
        today: NaiveDate,
    ) -> Result<BorrowResponse, DbError> {
        let mut tx: Transaction<'_, Sqlite> = self.pool.begin().await?;

        let status: Option<UserStatus> = sqlx::query_scalar("SELECT status FROM users WHERE id = ?")
            .bind(request.user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if status != Some(UserStatus::Approved) {
            tx.rollback().await.ok();
            info!("Refused checkout of {} for {}: {status:?}", request.book_id, request.user_id);
            return Ok(BorrowResponse::rejected(NOT_ELIGIBLE));
        }

        let taken = sqlx::query(
            "UPDATE books SET available_copies = available_copies - 1 WHERE id = ? AND available_copies > 0",
        )
        .bind(request.book_id)
        .execute(&mut *tx)
        .await?;

        if taken.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Ok(BorrowResponse::rejected(NOT_AVAILABLE));
        }

        let due_date = today.checked_add_days(LOAN_PERIOD).unwrap_or(NaiveDate::MAX);
        let loan: LoanRecord = sqlx::query_as(
            r#"
            INSERT INTO borrow_records (id, user_id, book_id, borrow_date, due_date, status)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *;
        "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.book_id)
        .bind(today)
        .bind(due_date)
        .bind(LoanStatus::Borrowed)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        info!("Book {} lent to {} until {due_date}", loan.book_id, loan.user_id);
        Ok(BorrowResponse::borrowed(loan))
    }

    /// Close a loan and put its copy back on the shelf.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per return")]
    pub async fn return_book(&self, loan_id: Uuid, today: NaiveDate) -> Result<LoanRecord, DbError> {
        let mut tx: Transaction<'_, Sqlite> = self.pool.begin().await?;

        let returned: Option<LoanRecord> = sqlx::query_as(
            r#"
            UPDATE borrow_records SET status = ?, return_date = ?
            WHERE id = ? AND status = ?
            RETURNING *;
        "#,
        )
        .bind(LoanStatus::Returned)
        .bind(today)
        .bind(loan_id)
        .bind(LoanStatus::Borrowed)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(loan) = returned else {
            let known: Option<Uuid> = sqlx::query_scalar("SELECT id FROM borrow_records WHERE id = ?")
                .bind(loan_id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await.ok();
            return Err(match known {
                Some(_) => DbError::AlreadyReturned(loan_id),
                None => DbError::NotFound {
                    entity: "loan",
                    id: loan_id,
                },
            });
        };

        sqlx::query(
            "UPDATE books SET available_copies = MIN(total_copies, available_copies + 1) WHERE id = ?",
        )
        .bind(loan.book_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(loan)
    }

    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn fetch_loans_for_user(&self, user_id: Uuid) -> Result<Vec<LoanRecord>, DbError> {
        let loans = sqlx::query_as(
            "SELECT * FROM borrow_records WHERE user_id = ? ORDER BY borrow_date DESC, due_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }
}

impl BorrowService for Db {
    type Error = DbError;

    async fn borrow_book(&self, request: BorrowRequest) -> Result<BorrowResponse, DbError> {
        self.checkout_book(request, Utc::now().date_naive()).await
    }
}

impl BookCatalog for Db {
    type Error = DbError;

    async fn create_book(&self, draft: BookDraft) -> Result<CreateBookResponse, DbError> {
        match self.insert_book(&draft).await {
            Ok(book) => Ok(CreateBookResponse::created(book.id)),
            Err(err) => {
                error!("Creating book \"{}\" failed: {err}", draft.title);
                Ok(CreateBookResponse::rejected(CREATE_FAILED))
            }
        }
    }

    async fn update_book(&self, id: Uuid, draft: BookDraft) -> Result<CreateBookResponse, DbError> {
        match self.modify_book(id, &draft).await {
            Ok(book) => Ok(CreateBookResponse::created(book.id)),
            Err(err @ (DbError::NotFound { .. } | DbError::CopiesOnLoan { .. })) => {
                Ok(CreateBookResponse::rejected(err.to_string()))
            }
            Err(err) => {
                error!("Updating book {id} failed: {err}");
                Ok(CreateBookResponse::rejected(UPDATE_FAILED))
            }
        }
    }
}

#[allow(
    clippy::pattern_type_mismatch,
    reason = "False positive, this is the idiomatic pattern"
)]
fn is_sqlite_unique_violation(error: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = error {
        db_err.message().contains("UNIQUE constraint failed")
    } else {
        false
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests run against a fresh in-memory database and are guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::database::types::UserRole;
    use crate::testing::book_values;
    use pretty_assertions::assert_eq;

    fn day(value: &str) -> NaiveDate {
        value.parse().unwrap()
    }

    fn draft(total_copies: i64) -> BookDraft {
        let mut values = book_values();
        values.set("totalCopies", total_copies.to_string());
        BookDraft::try_from(&values).unwrap()
    }

    async fn approved_user(db: &Db, email: &str) -> UserRecord {
        let user = db
            .insert_user(&NewUser::new("Ada Reader", email, 42, "/ids/ada.png"))
            .await
            .unwrap();
        db.set_user_status(user.id, UserStatus::Approved).await.unwrap();
        user
    }

    #[tokio::test]
    async fn new_users_are_pending_readers() {
        let db = Db::in_memory().await.unwrap();
        let user = db
            .insert_user(&NewUser::new("Ada Reader", "ada@uni.edu", 42, "/ids/ada.png"))
            .await
            .unwrap();

        let fetched = db.fetch_user(user.id).await.unwrap();
        assert_eq!(fetched, user);
        assert_eq!(db.fetch_user_by_email("ada@uni.edu").await.unwrap(), Some(user));
        assert_eq!(db.fetch_user_by_email("bob@uni.edu").await.unwrap(), None);
        assert_eq!(fetched.status, UserStatus::Pending);
        assert_eq!(fetched.role, UserRole::User);
        assert_eq!(fetched.last_activity_date, None);
    }

    #[tokio::test]
    async fn duplicate_email_is_reported() {
        let db = Db::in_memory().await.unwrap();
        let user = NewUser::new("Ada Reader", "ada@uni.edu", 42, "/ids/ada.png");
        db.insert_user(&user).await.unwrap();

        let error = db.insert_user(&user).await.unwrap_err();
        assert!(matches!(error, DbError::UserAlreadyExists(ref email) if email == "ada@uni.edu"));
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let db = Db::in_memory().await.unwrap();
        let id = Uuid::new_v4();
        assert!(matches!(
            db.fetch_book(id).await.unwrap_err(),
            DbError::NotFound { entity: "book", .. }
        ));
        assert!(matches!(
            db.set_user_status(id, UserStatus::Approved).await.unwrap_err(),
            DbError::NotFound { entity: "user", .. }
        ));
    }

    #[tokio::test]
    async fn created_books_have_every_copy_available() {
        let db = Db::in_memory().await.unwrap();

        let response = db.create_book(draft(12)).await.unwrap();
        let id = response.data.unwrap().id;

        let book = db.fetch_book(id).await.unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.total_copies, 12);
        assert_eq!(book.available_copies, 12);
        assert_eq!(db.fetch_books().await.unwrap(), vec![book]);
    }

    #[tokio::test]
    async fn failed_creation_becomes_a_generic_message() {
        let db = Db::in_memory().await.unwrap();
        db.close().await;

        let response = db.create_book(draft(1)).await.unwrap();
        assert_eq!(response, CreateBookResponse::rejected(CREATE_FAILED));
    }

    #[tokio::test]
    async fn eligibility_checks_availability_before_status() {
        let db = Db::in_memory().await.unwrap();
        let book = db.insert_book(&draft(1)).await.unwrap();
        let pending = db
            .insert_user(&NewUser::new("Pat Pending", "pat@uni.edu", 7, "/ids/pat.png"))
            .await
            .unwrap();
        let approved = approved_user(&db, "ada@uni.edu").await;

        assert_eq!(
            db.borrowing_eligibility(pending.id, book.id).await.unwrap(),
            BorrowEligibility::new(false, "You are not eligible to borrow this book")
        );
        assert!(db.borrowing_eligibility(approved.id, book.id).await.unwrap().is_eligible);

        db.checkout_book(BorrowRequest::new(approved.id, book.id), day("2025-03-01"))
            .await
            .unwrap();
        assert_eq!(
            db.borrowing_eligibility(approved.id, book.id).await.unwrap(),
            BorrowEligibility::new(false, "Book is not available")
        );
    }

    #[tokio::test]
    async fn only_approved_users_can_check_out() {
        let db = Db::in_memory().await.unwrap();
        let book = db.insert_book(&draft(2)).await.unwrap();
        let pat = db
            .insert_user(&NewUser::new("Pat Pending", "pat@uni.edu", 7, "/ids/pat.png"))
            .await
            .unwrap();

        let pending = db.borrow_book(BorrowRequest::new(pat.id, book.id)).await.unwrap();
        assert_eq!(pending, BorrowResponse::rejected(NOT_ELIGIBLE));

        db.set_user_status(pat.id, UserStatus::Rejected).await.unwrap();
        let rejected = db.borrow_book(BorrowRequest::new(pat.id, book.id)).await.unwrap();
        assert_eq!(rejected, BorrowResponse::rejected(NOT_ELIGIBLE));

        let unknown = db
            .checkout_book(BorrowRequest::new(Uuid::new_v4(), book.id), day("2025-03-01"))
            .await
            .unwrap();
        assert_eq!(unknown, BorrowResponse::rejected(NOT_ELIGIBLE));

        assert_eq!(db.fetch_book(book.id).await.unwrap().available_copies, 2);
        assert!(db.fetch_loans_for_user(pat.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn last_copy_can_only_be_borrowed_once() {
        let db = Db::in_memory().await.unwrap();
        let book = db.insert_book(&draft(1)).await.unwrap();
        let ada = approved_user(&db, "ada@uni.edu").await;
        let bob = approved_user(&db, "bob@uni.edu").await;

        let first = db
            .checkout_book(BorrowRequest::new(ada.id, book.id), day("2025-03-01"))
            .await
            .unwrap();
        let loan = first.data.unwrap();
        assert_eq!(loan.due_date, day("2025-03-08"));
        assert_eq!(loan.status, LoanStatus::Borrowed);

        let second = db
            .checkout_book(BorrowRequest::new(bob.id, book.id), day("2025-03-01"))
            .await
            .unwrap();
        assert_eq!(second, BorrowResponse::rejected(NOT_AVAILABLE));
        assert_eq!(db.fetch_book(book.id).await.unwrap().available_copies, 0);
        assert!(db.fetch_loans_for_user(bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn copies_stay_within_bounds_across_borrow_and_return() {
        let db = Db::in_memory().await.unwrap();
        let book = db.insert_book(&draft(2)).await.unwrap();
        let ada = approved_user(&db, "ada@uni.edu").await;

        let mut loans = Vec::new();
        for _ in 0..3 {
            let response = db
                .checkout_book(BorrowRequest::new(ada.id, book.id), day("2025-03-01"))
                .await
                .unwrap();
            loans.extend(response.data);
            let available = db.fetch_book(book.id).await.unwrap().available_copies;
            assert!((0..=2).contains(&available));
        }
        assert_eq!(loans.len(), 2);

        for loan in &loans {
            let returned = db.return_book(loan.id, day("2025-03-05")).await.unwrap();
            assert_eq!(returned.status, LoanStatus::Returned);
            assert_eq!(returned.return_date, Some(day("2025-03-05")));
        }
        assert_eq!(db.fetch_book(book.id).await.unwrap().available_copies, 2);

        let again = db.return_book(loans[0].id, day("2025-03-06")).await.unwrap_err();
        assert!(matches!(again, DbError::AlreadyReturned(_)));
        assert_eq!(db.fetch_book(book.id).await.unwrap().available_copies, 2);
        assert_eq!(db.fetch_loans_for_user(ada.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn updates_keep_loaned_copies_out() {
        let db = Db::in_memory().await.unwrap();
        let book = db.insert_book(&draft(3)).await.unwrap();
        let ada = approved_user(&db, "ada@uni.edu").await;
        for _ in 0..2 {
            db.checkout_book(BorrowRequest::new(ada.id, book.id), day("2025-03-01"))
                .await
                .unwrap();
        }

        let updated = db.modify_book(book.id, &draft(5)).await.unwrap();
        assert_eq!(updated.total_copies, 5);
        assert_eq!(updated.available_copies, 3);

        let response = db.update_book(book.id, draft(1)).await.unwrap();
        assert!(!response.success);
        assert_eq!(
            response.message.as_deref(),
            Some("cannot reduce total copies to 1, 2 copies are on loan")
        );
        assert_eq!(db.fetch_book(book.id).await.unwrap().available_copies, 3);
    }

    #[tokio::test]
    async fn last_activity_is_touched_once_per_day() {
        let db = Db::in_memory().await.unwrap();
        let ada = approved_user(&db, "ada@uni.edu").await;

        assert!(db.touch_last_activity(ada.id, day("2025-03-01")).await.unwrap());
        assert!(!db.touch_last_activity(ada.id, day("2025-03-01")).await.unwrap());
        assert!(db.touch_last_activity(ada.id, day("2025-03-02")).await.unwrap());
        assert_eq!(
            db.fetch_user(ada.id).await.unwrap().last_activity_date,
            Some(day("2025-03-02"))
        );
        assert!(db.touch_last_activity(Uuid::new_v4(), day("2025-03-02")).await.is_err());
    }
}
