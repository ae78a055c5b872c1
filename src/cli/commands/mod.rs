//! CLI command implementations.

mod config;
mod doctor;
mod download;
mod info;
mod key;
mod providers;
mod summarize;
mod transcript;

pub use config::run_config;
pub use doctor::run_doctor;
pub use download::{run_download, run_split};
pub use info::run_info;
pub use key::run_key;
pub use providers::run_providers;
pub use summarize::{run_summarize, run_translate, SummarizeArgs};
pub use transcript::run_transcript;

use crate::cli::Output;
use crate::error::ClipwiseError;

/// Print an error as title, message and hint.
pub fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<ClipwiseError>() {
        Some(e) => {
            let message = e.user_message();
            Output::error(&format!("{}: {}", message.title, message.message));
            if let Some(hint) = message.hint {
                Output::info(&hint);
            }
        }
        None => Output::error(&format!("{:#}", err)),
    }
}
