//! Validation schemas
//!
//! Declarative field lists for the sign-in, sign-up and book forms, and the typed payloads that
//! can only be built from values passing them.
use crate::forms::field::{FieldDescriptor, FieldKind, Rule, Theme, UploadSpec};
use crate::forms::values::{FieldErrors, FormValues};
use crate::upload::MediaKind;
use serde::{Deserialize, Serialize};

const MIN_FULLNAME_LENGTH: usize = 3;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_TOTAL_COPIES: i32 = 10_000;

/// Field names, shared by the schemas, the forms built on them and the payload conversions
pub mod names {
    pub const FULL_NAME: &str = "fullName";
    pub const EMAIL: &str = "email";
    pub const UNIVERSITY_ID: &str = "universityId";
    pub const UNIVERSITY_CARD: &str = "universityCard";
    pub const PASSWORD: &str = "password";

    pub const TITLE: &str = "title";
    pub const AUTHOR: &str = "author";
    pub const GENRE: &str = "genre";
    pub const RATING: &str = "rating";
    pub const TOTAL_COPIES: &str = "totalCopies";
    pub const COVER_URL: &str = "coverUrl";
    pub const COVER_COLOR: &str = "coverColor";
    pub const DESCRIPTION: &str = "description";
    pub const VIDEO_URL: &str = "videoUrl";
    pub const SUMMARY: &str = "summary";
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl Schema {
    #[must_use]
    #[inline]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Upload settings of the named field, if it is an upload field
    #[must_use]
    #[inline]
    pub fn upload_spec(&self, name: &str) -> Option<UploadSpec> {
        match self.field(name)?.kind {
            FieldKind::Upload(spec) => Some(spec),
            FieldKind::Text
            | FieldKind::Email
            | FieldKind::Password
            | FieldKind::Number { .. }
            | FieldKind::TextArea { .. }
            | FieldKind::Color => None,
        }
    }

    /// Check every field and return the normalised values.
    /// # Errors
    /// Returns all field failures when at least one field does not pass its rule.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once per submission")]
    pub fn validate(&self, values: &FormValues) -> Result<FormValues, FieldErrors> {
        let mut cleaned = FormValues::new();
        let mut errors = FieldErrors::new();

        for field in self.fields {
            match field.rule.apply(values.get(field.name)) {
                Ok(value) => cleaned.set(field.name, value),
                Err(message) => errors.insert(field.name, message),
            }
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }
}

const PASSWORD_FIELD: FieldDescriptor = FieldDescriptor::new(
    names::PASSWORD,
    FieldKind::Password,
    Rule::Text {
        min: MIN_PASSWORD_LENGTH,
        max: None,
        trim: false,
        message: None,
    },
    "Password",
);

const EMAIL_FIELD: FieldDescriptor =
    FieldDescriptor::new(names::EMAIL, FieldKind::Email, Rule::Email, "Email");

pub static SIGN_IN_SCHEMA: Schema = Schema {
    name: "sign-in",
    fields: &[EMAIL_FIELD, PASSWORD_FIELD],
};

pub static SIGN_UP_SCHEMA: Schema = Schema {
    name: "sign-up",
    fields: &[
        FieldDescriptor::new(
            names::FULL_NAME,
            FieldKind::Text,
            Rule::Text {
                min: MIN_FULLNAME_LENGTH,
                max: None,
                trim: false,
                message: None,
            },
            "Full name",
        ),
        EMAIL_FIELD,
        FieldDescriptor::new(
            names::UNIVERSITY_ID,
            FieldKind::Number {
                min: 0,
                max: i32::MAX,
            },
            Rule::Integer {
                min: 0,
                max: i32::MAX,
            },
            "University ID Number",
        ),
        FieldDescriptor::new(
            names::UNIVERSITY_CARD,
            FieldKind::Upload(UploadSpec::new(
                MediaKind::Image,
                "image/*",
                "Upload your ID",
                "ids",
                Theme::Dark,
            )),
            Rule::Text {
                min: 1,
                max: None,
                trim: false,
                message: Some("University Card is required"),
            },
            "Upload University ID Card",
        ),
        PASSWORD_FIELD,
    ],
};

pub static BOOK_SCHEMA: Schema = Schema {
    name: "book",
    fields: &[
        FieldDescriptor::new(
            names::TITLE,
            FieldKind::Text,
            Rule::Text {
                min: 1,
                max: Some(100),
                trim: true,
                message: None,
            },
            "Book Title",
        )
        .with_placeholder("Enter the Book Title"),
        FieldDescriptor::new(
            names::AUTHOR,
            FieldKind::Text,
            Rule::Text {
                min: 1,
                max: Some(100),
                trim: true,
                message: None,
            },
            "Author",
        )
        .with_placeholder("Enter the Author Name"),
        FieldDescriptor::new(
            names::GENRE,
            FieldKind::Text,
            Rule::Text {
                min: 1,
                max: Some(50),
                trim: true,
                message: None,
            },
            "Book Genre",
        )
        .with_placeholder("Enter the Book Genre"),
        FieldDescriptor::new(
            names::RATING,
            FieldKind::Number { min: 1, max: 5 },
            Rule::Integer { min: 1, max: 5 },
            "Book Rating",
        ),
        FieldDescriptor::new(
            names::TOTAL_COPIES,
            FieldKind::Number {
                min: 1,
                max: MAX_TOTAL_COPIES,
            },
            Rule::Integer {
                min: 1,
                max: MAX_TOTAL_COPIES,
            },
            "Total Copies",
        ),
        FieldDescriptor::new(
            names::COVER_URL,
            FieldKind::Upload(UploadSpec::new(
                MediaKind::Image,
                "image/*",
                "Upload a book cover",
                "books/covers",
                Theme::Light,
            )),
            Rule::required(),
            "Book Image",
        ),
        FieldDescriptor::new(
            names::COVER_COLOR,
            FieldKind::Color,
            Rule::HexColor,
            "Book Color",
        ),
        FieldDescriptor::new(
            names::DESCRIPTION,
            FieldKind::TextArea { rows: 5 },
            Rule::required(),
            "Book Description",
        )
        .with_placeholder("Enter the Book Description"),
        FieldDescriptor::new(
            names::VIDEO_URL,
            FieldKind::Upload(UploadSpec::new(
                MediaKind::Video,
                "video/*",
                "Upload a book trailer",
                "books/videos",
                Theme::Light,
            )),
            Rule::required(),
            "Book Trailer",
        ),
        FieldDescriptor::new(
            names::SUMMARY,
            FieldKind::TextArea { rows: 10 },
            Rule::required(),
            "Book Summary",
        )
        .with_placeholder("Enter the Book Summary"),
    ],
};

/// Parse a value that already passed an integer rule.
fn integer(values: &FormValues, field: &'static str) -> Result<i64, FieldErrors> {
    values.get(field).parse::<i64>().map_err(|err| {
        let mut errors = FieldErrors::new();
        errors.insert(field, err.to_string());
        errors
    })
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInCredentials {
    pub email: String,
    pub password: String,
}

impl TryFrom<&FormValues> for SignInCredentials {
    type Error = FieldErrors;

    #[inline]
    fn try_from(values: &FormValues) -> Result<Self, Self::Error> {
        let values = SIGN_IN_SCHEMA.validate(values)?;
        Ok(Self {
            email: values.get(names::EMAIL).to_owned(),
            password: values.get(names::PASSWORD).to_owned(),
        })
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpCredentials {
    pub full_name: String,
    pub email: String,
    pub university_id: i64,
    /// Asset path of the uploaded university card
    pub university_card: String,
    pub password: String,
}

impl TryFrom<&FormValues> for SignUpCredentials {
    type Error = FieldErrors;

    #[inline]
    fn try_from(values: &FormValues) -> Result<Self, Self::Error> {
        let values = SIGN_UP_SCHEMA.validate(values)?;
        Ok(Self {
            full_name: values.get(names::FULL_NAME).to_owned(),
            email: values.get(names::EMAIL).to_owned(),
            university_id: integer(&values, names::UNIVERSITY_ID)?,
            university_card: values.get(names::UNIVERSITY_CARD).to_owned(),
            password: values.get(names::PASSWORD).to_owned(),
        })
    }
}

/// A complete, validated book record as submitted by the book form
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub rating: i64,
    pub total_copies: i64,
    pub description: String,
    pub cover_color: String,
    pub cover_url: String,
    pub video_url: String,
    pub summary: String,
}

impl TryFrom<&FormValues> for BookDraft {
    type Error = FieldErrors;

    #[inline]
    fn try_from(values: &FormValues) -> Result<Self, Self::Error> {
        let values = BOOK_SCHEMA.validate(values)?;
        Ok(Self {
            title: values.get(names::TITLE).to_owned(),
            author: values.get(names::AUTHOR).to_owned(),
            genre: values.get(names::GENRE).to_owned(),
            rating: integer(&values, names::RATING)?,
            total_copies: integer(&values, names::TOTAL_COPIES)?,
            description: values.get(names::DESCRIPTION).to_owned(),
            cover_color: values.get(names::COVER_COLOR).to_owned(),
            cover_url: values.get(names::COVER_URL).to_owned(),
            video_url: values.get(names::VIDEO_URL).to_owned(),
            summary: values.get(names::SUMMARY).to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::book_values;
    use pretty_assertions::assert_eq;

    fn sign_up_values(full_name: &str, password: &str) -> FormValues {
        [
            (names::FULL_NAME, full_name),
            (names::EMAIL, "ada@campus.edu"),
            (names::UNIVERSITY_ID, "20451"),
            (names::UNIVERSITY_CARD, "/ids/card_x1.png"),
            (names::PASSWORD, password),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn sign_up_password_boundary() {
        let errors = SignUpCredentials::try_from(&sign_up_values("Ada Lovelace", "1234567"))
            .unwrap_err();
        assert_eq!(
            errors.get(names::PASSWORD),
            Some("String must contain at least 8 character(s)")
        );
        assert_eq!(errors.len(), 1);

        assert!(SignUpCredentials::try_from(&sign_up_values("Ada Lovelace", "12345678")).is_ok());
    }

    #[test]
    fn sign_up_full_name_boundary() {
        let errors = SignUpCredentials::try_from(&sign_up_values("Al", "12345678")).unwrap_err();
        assert!(errors.get(names::FULL_NAME).is_some());

        let credentials = SignUpCredentials::try_from(&sign_up_values("Ada", "12345678")).unwrap();
        assert_eq!(credentials.full_name, "Ada");
        assert_eq!(credentials.university_id, 20451);
    }

    #[test]
    fn university_id_must_be_a_non_negative_whole_number() {
        let mut values = sign_up_values("Ada Lovelace", "12345678");
        values.set(names::UNIVERSITY_ID, "20451.5");
        let errors = SignUpCredentials::try_from(&values).unwrap_err();
        assert_eq!(
            errors.get(names::UNIVERSITY_ID),
            Some("Expected integer, received float")
        );

        values.set(names::UNIVERSITY_ID, "-3");
        let errors = SignUpCredentials::try_from(&values).unwrap_err();
        assert_eq!(
            errors.get(names::UNIVERSITY_ID),
            Some("Number must be greater than or equal to 0")
        );
    }

    #[test]
    fn sign_up_requires_university_card() {
        let mut values = sign_up_values("Ada Lovelace", "12345678");
        values.set(names::UNIVERSITY_CARD, "");
        let errors = SignUpCredentials::try_from(&values).unwrap_err();
        assert_eq!(
            errors.get(names::UNIVERSITY_CARD),
            Some("University Card is required")
        );
    }

    #[test]
    fn sign_in_reports_every_failing_field() {
        let values: FormValues = [(names::EMAIL, "not-an-email"), (names::PASSWORD, "short")]
            .into_iter()
            .collect();
        let errors = SignInCredentials::try_from(&values).unwrap_err();
        assert_eq!(errors.get(names::EMAIL), Some("Invalid email"));
        assert!(errors.get(names::PASSWORD).is_some());
    }

    #[test]
    fn book_draft_from_valid_values() {
        let draft = BookDraft::try_from(&book_values()).unwrap();
        assert_eq!(
            draft,
            BookDraft {
                title: String::from("Dune"),
                author: String::from("Frank Herbert"),
                genre: String::from("Science Fiction"),
                rating: 5,
                total_copies: 12,
                description: String::from("A desert planet and its spice."),
                cover_color: String::from("#c4a46b"),
                cover_url: String::from("/books/covers/dune.png"),
                video_url: String::from("/books/videos/dune.mp4"),
                summary: String::from("Paul Atreides travels to Arrakis."),
            }
        );
    }

    #[test]
    fn book_rating_and_copies_bounds() {
        let mut values = book_values();
        values.set(names::RATING, "0");
        values.set(names::TOTAL_COPIES, "10001");
        let errors = BookDraft::try_from(&values).unwrap_err();
        assert_eq!(
            errors.get(names::RATING),
            Some("Number must be greater than or equal to 1")
        );
        assert_eq!(
            errors.get(names::TOTAL_COPIES),
            Some("Number must be less than or equal to 10000")
        );

        values.set(names::RATING, "1");
        values.set(names::TOTAL_COPIES, "10000");
        assert!(BookDraft::try_from(&values).is_ok());
    }

    #[test]
    fn book_requires_media_fields() {
        let mut values = book_values();
        values.set(names::COVER_URL, "");
        values.set(names::VIDEO_URL, "   ");
        let errors = BookDraft::try_from(&values).unwrap_err();
        assert!(errors.get(names::COVER_URL).is_some());
        assert!(errors.get(names::VIDEO_URL).is_some());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn schema_lookup_by_name() {
        let field = BOOK_SCHEMA.field(names::COVER_COLOR).unwrap();
        assert_eq!(field.hint.label, "Book Color");
        assert!(BOOK_SCHEMA.field("isbn").is_none());
    }
}
