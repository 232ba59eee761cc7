use anyhow::{Context, Result};
use std::path::Path;
use tokenizers::Tokenizer;

/// Counts tokens with a HuggingFace `tokenizer.json`.
pub struct TokenCounter {
    tokenizer: Tokenizer,
}

impl TokenCounter {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to load tokenizer from {}", path.display()))?;
        Ok(Self { tokenizer })
    }

    /// Number of tokens in `text`, without special tokens.
    pub fn count(&self, text: &str) -> Result<usize> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(anyhow::Error::msg)?;
        Ok(encoding.len())
    }
}
