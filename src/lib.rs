//! mergetok - GPT-2 style byte-level BPE tokenizer
//!
//! Builds a vocabulary and merge-rank table from a `merges.txt` text and
//! encodes text into token ids, with each token's byte offset and length.
//!
//! - Byte-level remapping, so any UTF-8 input is encodable
//! - Arena-interned symbols with content-hashed FxHash lookups
//! - Lowest-rank-first pair merging with leftmost tie-break
//! - Per-instance result cache for short, regular words
//! - Rayon batch encoding over forks sharing one read-only model
//! - Aho-Corasick matching for special tokens such as `<|endoftext|>`
//!
//! ```ignore
//! use mergetok::Tokenizer;
//!
//! let mut tokenizer = Tokenizer::new(std::fs::read_to_string("merges.txt")?)?;
//! for token in tokenizer.encode("Hello world!")? {
//!     println!("{} @ {}+{}", token.id, token.index, token.length);
//! }
//! ```

pub mod core;

pub use crate::core::{
    BpeModel, Token, Tokenizer, TokenizerError, VocabError, WordSpan, GPT2_END_OF_TEXT,
};
