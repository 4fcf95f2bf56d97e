//! Memoized merge results for cache-safe words.
//!
//! Keys are interned into a private arena and compared by content. Entries hold
//! word-relative tokens (the first token starts at index 0); callers re-base
//! them onto each occurrence. There is no eviction: the cache grows with the
//! number of distinct cache-safe words seen.

use hashbrown::HashTable;
use log::trace;

use super::arena::{hash_str, Symbol, SymbolArena};
use super::bpe::Token;

#[derive(Debug)]
struct Entry {
    key: Symbol,
    tokens: Box<[Token]>,
}

/// Word text to word-relative token array.
#[derive(Debug, Default)]
pub struct ResultCache {
    keys: SymbolArena,
    entries: HashTable<Entry>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached tokens for `word`, with indices relative to the word start.
    pub fn get(&self, word: &str) -> Option<&[Token]> {
        let keys = &self.keys;
        self.entries
            .find(hash_str(word), |entry| keys.get(entry.key) == word)
            .map(|entry| &*entry.tokens)
    }

    /// Cached tokens for `word` re-based onto an occurrence at `offset`.
    pub fn get_at(&self, word: &str, offset: usize) -> Option<impl Iterator<Item = Token> + '_> {
        self.get(word)
            .map(move |tokens| tokens.iter().map(move |t| t.shifted(offset)))
    }

    /// Store word-relative `tokens` for `word`. An existing entry is kept.
    pub fn insert(&mut self, word: &str, tokens: &[Token]) {
        let Self { keys, entries } = self;
        let hash = hash_str(word);
        if entries.find(hash, |entry| keys.get(entry.key) == word).is_some() {
            return;
        }

        let key = keys.push(word);
        let keys = &*keys;
        entries.insert_unique(
            hash,
            Entry {
                key,
                tokens: tokens.into(),
            },
            |entry| hash_str(keys.get(entry.key)),
        );
        trace!("cached {:?} as {} tokens", word, tokens.len());
    }

    /// Number of cached words.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries and their key storage.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.keys = SymbolArena::new();
    }
}
