//! `libris_core`
//!
//! Core library for the platform-independent logic of Libris. Everything behind the pages of the
//! library manager lives here (form validation, the signed upload flow, borrowing and the catalog
//! database) so that any front-end, be it the CLI or a future HTTP server, only has to wire it up.

pub mod actions;

pub mod borrow;

pub mod config;

pub mod database;

pub mod forms;

pub mod notify;

pub mod upload;

#[cfg(test)]
pub(crate) mod testing;
