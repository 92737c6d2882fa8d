//! Server actions
//!
//! The operations the client components submit to, along with their wire shapes. Both responses
//! follow the `{ success, ... }` convention of the web application: expected failures are
//! reported inside the response, while `Err` stands for an unexpected failure (lost connection,
//! broken database, ...).
use crate::database::types::LoanRecord;
use crate::forms::schema::BookDraft;
use core::fmt::Display;
use core::future::Future;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub user_id: Uuid,
    pub book_id: Uuid,
}

impl BorrowRequest {
    #[must_use]
    #[inline]
    pub const fn new(user_id: Uuid, book_id: Uuid) -> Self {
        Self { user_id, book_id }
    }
}

/// Whether a user may borrow a given book, and why not if they may not.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowEligibility {
    pub is_eligible: bool,
    pub message: String,
}

impl BorrowEligibility {
    #[must_use]
    #[inline]
    pub fn new(is_eligible: bool, message: impl Into<String>) -> Self {
        Self {
            is_eligible,
            message: message.into(),
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<LoanRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BorrowResponse {
    #[must_use]
    #[inline]
    pub const fn borrowed(loan: LoanRecord) -> Self {
        Self {
            success: true,
            data: Some(loan),
            error: None,
        }
    }

    #[must_use]
    #[inline]
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedBook {
    pub id: Uuid,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBookResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CreatedBook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CreateBookResponse {
    #[must_use]
    #[inline]
    pub const fn created(id: Uuid) -> Self {
        Self {
            success: true,
            data: Some(CreatedBook { id }),
            message: None,
        }
    }

    #[must_use]
    #[inline]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// The borrow operation as seen by the client. Implementations are expected to check eligibility
/// and availability again on their side.
pub trait BorrowService {
    type Error: Display;

    fn borrow_book(
        &self,
        request: BorrowRequest,
    ) -> impl Future<Output = Result<BorrowResponse, Self::Error>> + Send;
}

/// Create and update operations behind the book form.
pub trait BookCatalog {
    type Error: Display;

    fn create_book(
        &self,
        draft: BookDraft,
    ) -> impl Future<Output = Result<CreateBookResponse, Self::Error>> + Send;

    fn update_book(
        &self,
        id: Uuid,
        draft: BookDraft,
    ) -> impl Future<Output = Result<CreateBookResponse, Self::Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn rejected_borrow_serializes_like_the_web_action() {
        let response = BorrowResponse::rejected("Book is not available for borrowing");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "success": false, "error": "Book is not available for borrowing" })
        );
    }

    #[test]
    fn created_book_response_parses_from_wire_shape() {
        let id = Uuid::new_v4();
        let response: CreateBookResponse =
            serde_json::from_value(json!({ "success": true, "data": { "id": id } })).unwrap();
        assert_eq!(response, CreateBookResponse::created(id));
    }

    #[test]
    fn eligibility_uses_camel_case() {
        let eligibility: BorrowEligibility =
            serde_json::from_value(json!({ "isEligible": false, "message": "Book is not available" }))
                .unwrap();
        assert_eq!(eligibility, BorrowEligibility::new(false, "Book is not available"));
    }
}
