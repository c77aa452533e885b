//! # catenator
//!
//! Concatenates the source files of a directory into a single text document
//! for pasting into a large-language-model context window.
//!
//! ## Features
//!
//! - Extension allow/deny lists with a sensible default set
//! - `.catignore` glob rules that prune whole subtrees
//! - Optional directory tree listing and README block
//! - Token counting with `tiktoken` encodings
//!
//! ## Quick Start
//!
//! ```no_run
//! use catenator::{Catenator, Config};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .root_dir("./my-project")
//!     .include_extensions(["rs", "toml"])
//!     .build()?;
//!
//! let document = Catenator::new(config)?.catenate()?;
//! println!("{document}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Document layout
//!
//! 1. `### {title}` header
//! 2. Tree block (optional)
//! 3. First README found in the root (optional)
//! 4. One `# {relative path}` block per selected file

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod catenator;
mod config;
mod error;
mod rules;
mod scanner;
mod token;
mod tree;
mod writer;

pub use catenator::{Catenation, CatenationStats, Catenator};
pub use config::{
    CATIGNORE_FILENAME, Config, ConfigBuilder, DEFAULT_CODE_EXTENSIONS, README_FILES,
};
pub use error::{Error, Result};
pub use rules::IgnoreRules;
pub use token::{count_tokens, TokenCounter, TokenizerKind, DEFAULT_ENCODING};
pub use writer::OutputTarget;
#[cfg(target_os = "linux")]
pub use writer::{serve_clipboard_holder, CLIPBOARD_HOLDER_ENV};

/// Builds the document for the given configuration.
///
/// # Errors
///
/// Returns an error if:
/// - The ignore file cannot be read or holds an invalid pattern
/// - The directory walk fails
/// - A selected file cannot be read or is not valid UTF-8
///
/// # Examples
///
/// ```no_run
/// use catenator::{Config, catenate};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder().root_dir(".").build()?;
/// let document = catenate(config)?;
/// # Ok(())
/// # }
/// ```
pub fn catenate(config: Config) -> Result<String> {
    Catenator::new(config)?.catenate()
}
