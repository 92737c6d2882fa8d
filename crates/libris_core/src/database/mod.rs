//! Database library
//!
//! The library crate exposes the `Db` struct and its methods to interact with the catalog
//! database (users, books and their loans) through pre-defined queries. `Db` also serves the
//! borrow and catalog operations the client components submit to.
pub mod queries;
pub mod types;

pub use queries::Db;
pub use types::{
    BookRecord, DbError, LoanRecord, LoanStatus, NewUser, UserRecord, UserRole, UserStatus,
};
