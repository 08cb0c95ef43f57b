//! Tokenizer profile selection for budget accounting.

use scout_core::{Error, Result};
use tiktoken_rs::CoreBPE;

/// Token counter bound to a model family's BPE profile.
///
/// Models in the gpt-4o family use the o200k profile; everything else
/// falls back to cl100k. The encoding tables are loaded once, at pipeline
/// construction.
pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Select and load the tokenizer profile for a model name.
    pub fn for_model(model_name: &str) -> Result<Self> {
        let bpe = if model_name.contains("gpt-4o") {
            tiktoken_rs::o200k_base()
        } else {
            tiktoken_rs::cl100k_base()
        }
        .map_err(|e| Error::Config(format!("failed to load tokenizer profile: {e}")))?;

        Ok(Self { bpe })
    }

    /// Number of tokens in `text` under this profile.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}
