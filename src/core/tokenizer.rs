use aho_corasick::{AhoCorasick, MatchKind};
use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

use super::bpe::{byte_pair_encode, BpeModel, Token};
use super::cache::ResultCache;
use super::pretokenize::{WordSpan, WordSplitter};
use super::vocab::VocabError;

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("Vocabulary error: {0}")]
    VocabError(#[from] VocabError),
    #[error("Merged symbol missing from vocabulary: {0:?}")]
    UnknownSymbol(String),
    #[error("Regex compilation error: {0}")]
    RegexError(#[from] regex::Error),
    #[cfg(feature = "pcre2")]
    #[error("Regex compilation error (PCRE2): {0}")]
    Pcre2Error(#[from] pcre2::Error),
    #[error("PCRE2 feature not enabled. Compile with --features pcre2")]
    Pcre2NotEnabled,
    #[error("Aho-Corasick build error: {0}")]
    AhoCorasickError(#[from] aho_corasick::BuildError),
    #[error("Invalid special token: {0:?}")]
    InvalidSpecialToken(String),
}

/// GPT-2's end-of-text marker.
pub const GPT2_END_OF_TEXT: &str = "<|endoftext|>";

/// Special tokens, matched verbatim ahead of word splitting.
struct SpecialTokens {
    strings: Vec<String>,
    ids: FxHashMap<String, u32>,
    base_id: u32,
    matcher: AhoCorasick,
}

/// Byte-level BPE tokenizer over a GPT-2 style merges table.
///
/// # Instances and Sharing
///
/// The vocabulary and rank table are built once and are read-only afterwards;
/// they live in an [`Arc`] and are shared by every instance made with
/// [`fork`](Tokenizer::fork) or `clone`. Each instance owns its result cache,
/// which is why encoding takes `&mut self`. Give each thread its own fork, or
/// use [`encode_batch`](Tokenizer::encode_batch).
///
/// # Example
///
/// ```ignore
/// let merges = std::fs::read_to_string("merges.txt")?;
/// let mut tokenizer = Tokenizer::new(merges)?;
/// let ids = tokenizer.encode_ids(r#"print("Hello world!")"#)?;
/// assert_eq!(ids, vec![4798, 7203, 15496, 995, 2474, 8]);
/// ```
pub struct Tokenizer {
    model: Arc<BpeModel>,
    splitter: Arc<WordSplitter>,
    special: Option<Arc<SpecialTokens>>,
    cache: ResultCache,
    use_cache: bool,
}

impl Tokenizer {
    /// Build a tokenizer from merges text (header line first, then one
    /// `left right` rule per line).
    pub fn new(merges: impl Into<String>) -> Result<Self, TokenizerError> {
        let model = BpeModel::from_merges(merges)?;
        Self::from_model(Arc::new(model))
    }

    /// Build a tokenizer around an already built, possibly shared, model.
    pub fn from_model(model: Arc<BpeModel>) -> Result<Self, TokenizerError> {
        Ok(Self {
            model,
            splitter: Arc::new(WordSplitter::new()?),
            special: None,
            cache: ResultCache::new(),
            use_cache: true,
        })
    }

    /// Enable or disable the result cache. Disabling drops cached entries.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        if !enabled {
            self.cache.clear();
        }
        self
    }

    /// Switch the word splitter to the PCRE2 regex backend.
    ///
    /// # Errors
    /// Returns an error if regex compilation fails.
    #[cfg(feature = "pcre2")]
    pub fn pcre2(mut self, use_pcre2: bool) -> Result<Self, TokenizerError> {
        if use_pcre2 != self.splitter.is_pcre2() {
            let splitter = if use_pcre2 {
                WordSplitter::pcre2()?
            } else {
                WordSplitter::new()?
            };
            self.splitter = Arc::new(splitter);
        }
        Ok(self)
    }

    /// Switch to PCRE2 regex backend (stub when feature not enabled).
    #[cfg(not(feature = "pcre2"))]
    pub fn pcre2(self, use_pcre2: bool) -> Result<Self, TokenizerError> {
        if use_pcre2 {
            Err(TokenizerError::Pcre2NotEnabled)
        } else {
            Ok(self)
        }
    }

    /// Register special tokens, replacing any registered before.
    ///
    /// Ids are assigned from the current vocabulary size upwards in the given
    /// order, so for GPT-2 `<|endoftext|>` becomes 50256.
    pub fn with_special_tokens(mut self, tokens: &[&str]) -> Result<Self, TokenizerError> {
        if tokens.is_empty() {
            self.special = None;
            return Ok(self);
        }

        let base_id = self.model.vocab().len() as u32;
        let mut ids = FxHashMap::default();
        for (offset, &token) in tokens.iter().enumerate() {
            if token.is_empty() || self.model.vocab().id(token).is_some() {
                return Err(TokenizerError::InvalidSpecialToken(token.to_string()));
            }
            if ids.insert(token.to_string(), base_id + offset as u32).is_some() {
                return Err(TokenizerError::InvalidSpecialToken(token.to_string()));
            }
        }

        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(tokens)?;

        debug!(
            "registered {} special tokens from id {}",
            tokens.len(),
            base_id
        );

        self.special = Some(Arc::new(SpecialTokens {
            strings: tokens.iter().map(|t| t.to_string()).collect(),
            ids,
            base_id,
            matcher,
        }));
        Ok(self)
    }

    /// A new instance sharing this one's model, splitter and special tokens,
    /// with an empty cache of its own.
    pub fn fork(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            splitter: Arc::clone(&self.splitter),
            special: self.special.clone(),
            cache: ResultCache::new(),
            use_cache: self.use_cache,
        }
    }

    /// Encode text to tokens (special tokens in the input are not recognized).
    ///
    /// Token `index` values are byte offsets into `text`.
    pub fn encode(&mut self, text: &str) -> Result<Vec<Token>, TokenizerError> {
        let mut tokens = Vec::with_capacity(text.len() / 3);
        self.encode_into(text, 0, &mut tokens)?;
        Ok(tokens)
    }

    /// Encode text to token ids.
    pub fn encode_ids(&mut self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        Ok(self.encode(text)?.into_iter().map(|t| t.id).collect())
    }

    /// Encode text with special token handling.
    ///
    /// Each special token occurrence becomes one token; the text between
    /// occurrences is encoded normally.
    pub fn encode_with_special(&mut self, text: &str) -> Result<Vec<Token>, TokenizerError> {
        let Some(special) = self.special.clone() else {
            return self.encode(text);
        };

        let mut tokens = Vec::with_capacity(text.len() / 3);
        let mut last_end = 0;

        for m in special.matcher.find_iter(text) {
            if m.start() > last_end {
                self.encode_into(&text[last_end..m.start()], last_end, &mut tokens)?;
            }
            let id = special.base_id + m.pattern().as_u32();
            tokens.push(Token::new(id, m.start(), m.len()));
            last_end = m.end();
        }

        if last_end < text.len() {
            self.encode_into(&text[last_end..], last_end, &mut tokens)?;
        }

        Ok(tokens)
    }

    /// Encode `text`, whose first byte sits at `base` in the caller's input,
    /// appending to `out`.
    fn encode_into(
        &mut self,
        text: &str,
        base: usize,
        out: &mut Vec<Token>,
    ) -> Result<(), TokenizerError> {
        let model = &*self.model;
        let splitter = &*self.splitter;

        for span in splitter.split(text)? {
            let word = &text[span.range()];
            let offset = base + span.offset;

            if self.use_cache {
                if let Some(cached) = self.cache.get_at(word, offset) {
                    out.extend(cached);
                    continue;
                }
            }

            let tokens = byte_pair_encode(word.as_bytes(), model)?;
            if self.use_cache && splitter.is_cache_safe(word) {
                self.cache.insert(word, &tokens);
            }
            out.extend(tokens.into_iter().map(|t| t.shifted(offset)));
        }

        Ok(())
    }

    /// Batch encode multiple texts in parallel.
    ///
    /// Each worker encodes with its own fork; results are in input order.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<Token>>, TokenizerError> {
        texts
            .par_iter()
            .map_init(|| self.fork(), |tokenizer, text| tokenizer.encode(text))
            .collect()
    }

    /// Batch encode multiple texts with special token handling.
    pub fn encode_batch_with_special(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<Token>>, TokenizerError> {
        texts
            .par_iter()
            .map_init(
                || self.fork(),
                |tokenizer, text| tokenizer.encode_with_special(text),
            )
            .collect()
    }

    /// Word spans `encode` would process for `text`.
    pub fn split_words(&self, text: &str) -> Result<Vec<WordSpan>, TokenizerError> {
        self.splitter.split(text)
    }

    /// Whether the result for `word` is eligible for caching.
    pub fn is_cache_safe(&self, word: &str) -> bool {
        self.splitter.is_cache_safe(word)
    }

    /// Get the vocabulary size, including special tokens.
    pub fn vocab_size(&self) -> usize {
        self.model.vocab().len() + self.special.as_ref().map_or(0, |s| s.strings.len())
    }

    /// Id of a vocabulary symbol (byte-level text) or special token.
    pub fn token_id(&self, symbol: &str) -> Option<u32> {
        self.model.vocab().id(symbol).or_else(|| {
            self.special
                .as_ref()
                .and_then(|s| s.ids.get(symbol).copied())
        })
    }

    /// Text of a token id: byte-level symbol text, or a special token string.
    pub fn symbol(&self, id: u32) -> Option<&str> {
        self.model.vocab().symbol(id).or_else(|| {
            let special = self.special.as_ref()?;
            let offset = id.checked_sub(special.base_id)?;
            special.strings.get(offset as usize).map(String::as_str)
        })
    }

    /// Rank of the rule merging `left` and `right`, if any.
    pub fn merge_rank(&self, left: &str, right: &str) -> Option<u32> {
        self.model.ranks().rank(left, right)
    }

    /// The shared, read-only model.
    pub fn model(&self) -> &Arc<BpeModel> {
        &self.model
    }

    /// Special tokens in id order.
    pub fn special_tokens(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.special.iter().flat_map(|s| {
            s.strings
                .iter()
                .zip(s.base_id..)
                .map(|(text, id)| (text.as_str(), id))
        })
    }

    /// Clear the encoding cache.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Get the current cache size.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

impl Clone for Tokenizer {
    /// Same as [`Tokenizer::fork`]: caches are not shared.
    fn clone(&self) -> Self {
        self.fork()
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("vocab_size", &self.vocab_size())
            .field("splitter", &self.splitter)
            .field("cache_len", &self.cache.len())
            .field("use_cache", &self.use_cache)
            .finish()
    }
}
