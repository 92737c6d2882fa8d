//! Forms
//!
//! Schema-driven forms: every form is a list of typed field descriptors, validated synchronously
//! and rendered by a generic renderer. The book form additionally submits to the catalog.
pub mod auth;
pub mod book;
pub mod field;
pub mod render;
pub mod schema;
pub mod values;

pub use field::{FieldDescriptor, FieldKind, Rule, Theme, UploadSpec};
pub use values::{FieldErrors, FormValues};
