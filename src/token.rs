//! Token counting for the assembled document.
//!
//! BPE counts come from `tiktoken-rs` behind the `tiktoken` feature. When the
//! crate is built without it, asking for a BPE counter yields
//! [`Error::TokenizerUnavailable`] instead of a count.

use crate::error::{Error, Result};

#[cfg(feature = "tiktoken")]
use once_cell::sync::Lazy;
#[cfg(feature = "tiktoken")]
use tiktoken_rs::{cl100k_base, o200k_base, CoreBPE};

const ESTIMATE_CHARS_PER_TOKEN: usize = 4;

/// Encoding used when none is chosen.
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// Type of tokenizer to count with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenizerKind {
    /// `cl100k_base` BPE encoding (GPT-4, GPT-3.5-turbo)
    #[default]
    Cl100k,
    /// `o200k_base` BPE encoding (GPT-4o)
    O200k,
    /// Character heuristic, ~4 chars per token; always available
    Estimate,
}

impl TokenizerKind {
    /// Encoding identifier for this kind.
    #[must_use]
    pub const fn encoding(self) -> &'static str {
        match self {
            Self::Cl100k => DEFAULT_ENCODING,
            Self::O200k => "o200k_base",
            Self::Estimate => "estimate",
        }
    }

    /// Creates a counter of this kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenizerUnavailable`] if the BPE tables cannot be
    /// provided.
    pub fn create(self) -> Result<Box<dyn TokenCounter>> {
        match self {
            Self::Estimate => Ok(Box::new(EstimateCounter)),
            Self::Cl100k | Self::O200k => bpe_counter(self),
        }
    }
}

/// Counts tokens in text.
pub trait TokenCounter {
    /// Encoding identifier.
    fn encoding(&self) -> &'static str;

    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize;
}

/// Counts tokens in `text` with the given tokenizer.
///
/// # Errors
///
/// Returns [`Error::TokenizerUnavailable`] if the tokenizer is missing.
pub fn count_tokens(text: &str, kind: TokenizerKind) -> Result<usize> {
    Ok(kind.create()?.count(text))
}

/// Character-based estimate.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EstimateCounter;

impl TokenCounter for EstimateCounter {
    fn encoding(&self) -> &'static str {
        TokenizerKind::Estimate.encoding()
    }

    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        text.chars()
            .count()
            .saturating_add(ESTIMATE_CHARS_PER_TOKEN - 1)
            .saturating_div(ESTIMATE_CHARS_PER_TOKEN)
            .max(1)
    }
}

#[cfg(feature = "tiktoken")]
static CL100K_BPE: Lazy<std::result::Result<CoreBPE, String>> =
    Lazy::new(|| cl100k_base().map_err(|e| e.to_string()));

#[cfg(feature = "tiktoken")]
static O200K_BPE: Lazy<std::result::Result<CoreBPE, String>> =
    Lazy::new(|| o200k_base().map_err(|e| e.to_string()));

/// BPE counter over a lazily loaded encoding.
#[cfg(feature = "tiktoken")]
pub(crate) struct BpeCounter {
    encoding: &'static str,
    bpe: &'static CoreBPE,
}

#[cfg(feature = "tiktoken")]
impl TokenCounter for BpeCounter {
    fn encoding(&self) -> &'static str {
        self.encoding
    }

    fn count(&self, text: &str) -> usize {
        // Special-token markers in source files are counted as plain text.
        self.bpe.encode_ordinary(text).len()
    }
}

#[cfg(feature = "tiktoken")]
fn bpe_counter(kind: TokenizerKind) -> Result<Box<dyn TokenCounter>> {
    let loaded = match kind {
        TokenizerKind::O200k => &*O200K_BPE,
        _ => &*CL100K_BPE,
    };

    match loaded {
        Ok(bpe) => Ok(Box::new(BpeCounter {
            encoding: kind.encoding(),
            bpe,
        })),
        Err(reason) => Err(Error::tokenizer_unavailable(kind.encoding(), reason.clone())),
    }
}

#[cfg(not(feature = "tiktoken"))]
fn bpe_counter(kind: TokenizerKind) -> Result<Box<dyn TokenCounter>> {
    Err(Error::tokenizer_unavailable(
        kind.encoding(),
        "please install the `tiktoken` feature (cargo install catenator --features tiktoken)",
    ))
}
