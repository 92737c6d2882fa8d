//! Command-line arguments

use clap::{Args, Parser, Subcommand};
use libris_core::config::DEFAULT_DATABASE_NAME;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "libris",
    version,
    about = "Manage the Libris university library from the terminal"
)]
pub struct Cli {
    /// Catalog database file, created if it does not exist
    #[arg(long, global = true, env = "LIBRIS_DATABASE_PATH", default_value = DEFAULT_DATABASE_NAME)]
    pub database: PathBuf,

    /// Log filter override (e.g. "info", "libris_core=debug")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a new account, pending approval
    SignUp(SignUp),
    /// Check sign-in credentials and record the day's activity
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Add an account directly, without the sign-up form
    AddUser {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        university_id: i64,
        /// Asset path of the university card
        #[arg(long)]
        card_url: String,
        /// Approve the account right away
        #[arg(long)]
        approved: bool,
    },
    /// Approve a pending account, or reject it
    ApproveUser {
        user_id: Uuid,
        #[arg(long)]
        reject: bool,
    },
    /// Add a book to the catalog
    CreateBook(CreateBook),
    /// List every book in the catalog
    ListBooks {
        /// Print the books as JSON
        #[arg(long)]
        json: bool,
    },
    /// Borrow a copy of a book
    Borrow { user_id: Uuid, book_id: Uuid },
    /// Return a borrowed copy
    Return { loan_id: Uuid },
    /// List the loans of a user
    Loans { user_id: Uuid },
}

#[derive(Args, Debug)]
pub struct SignUp {
    #[arg(long)]
    pub full_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "1")]
    pub university_id: String,
    #[arg(long)]
    pub password: String,
    /// Image of the university card, uploaded before the account is created
    #[arg(long, conflicts_with = "card_url")]
    pub card: Option<PathBuf>,
    /// Asset path of an already uploaded university card
    #[arg(long)]
    pub card_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateBook {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub author: String,
    #[arg(long)]
    pub genre: String,
    #[arg(long, default_value = "1")]
    pub rating: String,
    #[arg(long)]
    pub total_copies: String,
    /// Cover colour as `#RRGGBB`
    #[arg(long)]
    pub cover_color: String,
    #[arg(long)]
    pub description: String,
    #[arg(long)]
    pub summary: String,
    /// Cover image to upload
    #[arg(long, conflicts_with = "cover_url")]
    pub cover: Option<PathBuf>,
    /// Asset path of an already uploaded cover
    #[arg(long)]
    pub cover_url: Option<String>,
    /// Trailer video to upload
    #[arg(long, conflicts_with = "trailer_url")]
    pub trailer: Option<PathBuf>,
    /// Asset path of an already uploaded trailer
    #[arg(long)]
    pub trailer_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Argument lists are fixed and known to parse")]
mod tests {
    use super::*;
    use clap::CommandFactory as _;
    use pretty_assertions::assert_eq;

    #[test]
    fn arguments_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn database_path_has_a_default() {
        let cli = Cli::try_parse_from(["libris", "list-books"]).unwrap();
        assert!(matches!(cli.command, Command::ListBooks { json: false }));
        if std::env::var_os("LIBRIS_DATABASE_PATH").is_none() {
            assert_eq!(cli.database, PathBuf::from("library.db"));
        }
    }

    #[test]
    fn borrow_takes_two_ids() {
        let (user, book) = (Uuid::new_v4(), Uuid::new_v4());
        let cli = Cli::try_parse_from([
            "libris",
            "borrow",
            &user.to_string(),
            &book.to_string(),
            "--database",
            "/tmp/other.db",
        ])
        .unwrap();

        match cli.command {
            Command::Borrow { user_id, book_id } => assert_eq!((user_id, book_id), (user, book)),
            other => panic!("expected borrow, got {other:?}"),
        }
        assert_eq!(cli.database, PathBuf::from("/tmp/other.db"));
    }

    #[test]
    fn cover_file_and_cover_url_are_exclusive() {
        let result = Cli::try_parse_from([
            "libris",
            "create-book",
            "--title",
            "Dune",
            "--author",
            "Frank Herbert",
            "--genre",
            "Science Fiction",
            "--total-copies",
            "3",
            "--cover-color",
            "#c4a46b",
            "--description",
            "Spice.",
            "--summary",
            "Arrakis.",
            "--cover",
            "dune.png",
            "--cover-url",
            "/books/covers/dune.png",
        ]);
        assert!(result.is_err());
    }
}
