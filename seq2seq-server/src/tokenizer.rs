//! Tokenizer handle for the seq2seq model.

use std::path::Path;

use tokenizers::{PostProcessor, Tokenizer, TruncationDirection};

use crate::error::{Error, Result};

/// File name of the tokenizer inside the model directory.
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Token ids and attention mask for one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInput {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

impl EncodedInput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Wraps a HuggingFace tokenizer loaded from the model directory.
pub struct Seq2SeqTokenizer {
    inner: Tokenizer,
}

impl Seq2SeqTokenizer {
    /// Load `tokenizer.json` from a model directory.
    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_file(dir.as_ref().join(TOKENIZER_FILE))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = Tokenizer::from_file(path).map_err(|e| {
            Error::LoadFailed(format!("Error loading tokenizer {}: {}", path.display(), e))
        })?;
        Ok(Self { inner })
    }

    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let inner = Tokenizer::from_bytes(bytes)
            .map_err(|e| Error::LoadFailed(format!("Error loading tokenizer: {}", e)))?;
        Ok(Self { inner })
    }

    /// Encode `text`, truncating to `max_length` tokens when `truncation` is set.
    ///
    /// Truncation happens before special tokens are added, so the end-of-sequence
    /// marker survives and the total stays within `max_length`.
    pub fn encode(&self, text: &str, max_length: usize, truncation: bool) -> Result<EncodedInput> {
        let mut encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| Error::Tokenization(format!("Error tokenizing input: {}", e)))?;

        if truncation {
            let reserved = self
                .inner
                .get_post_processor()
                .map(|p| p.added_tokens(false))
                .unwrap_or(0);
            encoding.truncate(max_length.saturating_sub(reserved), 0, TruncationDirection::Right);
        }

        let encoding = self
            .inner
            .post_process(encoding, None, true)
            .map_err(|e| Error::Tokenization(format!("Error adding special tokens: {}", e)))?;

        Ok(EncodedInput {
            input_ids: encoding.get_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
        })
    }

    /// Decode token ids, dropping special tokens.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner
            .decode(ids, true)
            .map_err(|e| Error::Tokenization(format!("Error de-tokenizing output: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../tests/fixtures/tokenizer.json");

    fn tokenizer() -> Seq2SeqTokenizer {
        Seq2SeqTokenizer::from_bytes(FIXTURE).unwrap()
    }

    #[test]
    fn test_encode_appends_eos() {
        let encoded = tokenizer().encode("summarize: Lorem ipsum", 512, true).unwrap();
        // summarize : Lorem ipsum </s>
        assert_eq!(encoded.input_ids, vec![8, 9, 14, 15, 1]);
        assert_eq!(encoded.attention_mask, vec![1; 5]);
    }

    #[test]
    fn test_truncation_keeps_eos() {
        let encoded = tokenizer().encode("summarize: Lorem ipsum", 3, true).unwrap();
        assert_eq!(encoded.input_ids, vec![8, 9, 1]);
        assert_eq!(encoded.len(), 3);
    }

    #[test]
    fn test_no_truncation() {
        let encoded = tokenizer().encode("summarize: Lorem ipsum", 3, false).unwrap();
        assert_eq!(encoded.len(), 5);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let encoded = tokenizer().encode("zzz", 512, true).unwrap();
        assert_eq!(encoded.input_ids, vec![2, 1]);
    }

    #[test]
    fn test_decode_skips_special_tokens() {
        let text = tokenizer().decode(&[0, 10, 11, 1]).unwrap();
        assert_eq!(text, "Ciao mondo");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Seq2SeqTokenizer::from_model_dir(dir.path());
        assert!(matches!(result, Err(Error::LoadFailed(_))));
    }

    #[test]
    fn test_from_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TOKENIZER_FILE), FIXTURE).unwrap();
        assert!(Seq2SeqTokenizer::from_model_dir(dir.path()).is_ok());
    }
}
