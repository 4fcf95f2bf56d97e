//! Core tokenization engine for mergetok.
//!
//! # Architecture
//!
//! - [`byte_level`]: fixed byte to printable-character remapping
//! - [`Vocab`]: symbol table, base alphabet plus one symbol per merge rule
//! - [`RankTable`]: merge priority of each adjacent symbol pair
//! - [`WordSplitter`]: regex word scanner and cache-safety check
//! - [`byte_pair_encode`]: greedy lowest-rank-first merge of one word
//! - [`ResultCache`]: memoized merge results for cache-safe words
//! - [`Tokenizer`]: public API tying the pieces together
//!
//! Symbol text is interned in arenas ([`SymbolArena`]) and referenced by
//! `(offset, length)` handles; every lookup hashes and compares content.

mod arena;
mod bpe;
pub mod byte_level;
mod cache;
mod pretokenize;
mod ranks;
mod tokenizer;
mod vocab;

pub use arena::{Symbol, SymbolArena};
pub use bpe::{byte_pair_encode, BpeModel, Token};
pub use byte_level::{byte_level_encode, get_byte_level_char};
pub use cache::ResultCache;
pub use pretokenize::{WordSpan, WordSplitter, CACHE_SAFE_PATTERN, WORD_PATTERN};
pub use ranks::RankTable;
pub use tokenizer::{Tokenizer, TokenizerError, GPT2_END_OF_TEXT};
pub use vocab::{parse_merge_rules, MergeRule, Vocab, VocabError};
