//! Clipwise - shrink, summarize and share media
//!
//! A pipeline that takes a YouTube or X link and prepares it for a
//! messaging app: the media is downloaded with yt-dlp, optionally reduced to
//! audio, and split with ffmpeg into parts under a hard size ceiling. The
//! same link can be summarized from its captions through any AI provider
//! described by a JSON schema, with map-reduce for long transcripts.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `transcript` - Transcript cleaning, token estimates and chunking
//! - `providers` - Provider definitions, the provider catalog and credential stores
//! - `ai` - Schema-driven AI client and the summary/translation repository
//! - `engine` - yt-dlp and ffmpeg behind download and transcode traits
//! - `media` - Link identification, downloads, captions, chapters and splitting
//! - `orchestrator` - End-to-end share and summary flows
//!
//! # Example
//!
//! ```rust,no_run
//! use clipwise::config::Settings;
//! use clipwise::orchestrator::Orchestrator;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings).await?;
//!     let cancel = CancellationToken::new();
//!
//!     let result = orchestrator
//!         .prepare_for_sharing("dQw4w9WgXcQ", false, true, None, &cancel)
//!         .await?;
//!     for file in result.files() {
//!         println!("{}", file.display());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod media;
pub mod orchestrator;
pub mod providers;
pub mod transcript;

pub use error::{ClipwiseError, Result};
