//! The main function for the Libris command-line front-end
use std::process::ExitCode;

#[allow(clippy::print_stderr, reason = "No other tracing loaded at this point")]
fn main() -> ExitCode {
    match dotenvy::dotenv() {
        Ok(_) => {}
        // a missing .env is fine, the environment may already be set
        Err(err) if err.not_found() => {}
        Err(err) => {
            eprintln!("Failed to load environment variables! Error: {err}");
            return ExitCode::FAILURE;
        }
    }
    libris_lib::run()
}
