//! Growable text arena with `(offset, length)` symbol handles.
//!
//! Symbols are written once and then referenced by [`Symbol`] handles, which are
//! plain offsets and never borrow the arena. Anything that hashes or compares
//! symbols does so over the referenced content, never over the handle.

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// A view into a [`SymbolArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    start: usize,
    len: usize,
}

impl Symbol {
    /// Byte length of the symbol's text.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Append-only backing store for interned symbol text.
#[derive(Debug, Default)]
pub struct SymbolArena {
    text: String,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
        }
    }

    /// Adopt existing text as the arena contents without copying it.
    pub fn from_text(text: String) -> Self {
        Self { text }
    }

    /// Append `text` and return its handle.
    pub fn push(&mut self, text: &str) -> Symbol {
        let start = self.text.len();
        self.text.push_str(text);
        Symbol {
            start,
            len: text.len(),
        }
    }

    /// Append the concatenation of `left` and `right` as a single symbol.
    pub fn push_concat(&mut self, left: &str, right: &str) -> Symbol {
        let start = self.text.len();
        self.text.push_str(left);
        self.text.push_str(right);
        Symbol {
            start,
            len: left.len() + right.len(),
        }
    }

    /// Handle for a byte range of text already in the arena.
    ///
    /// Returns `None` if the range is out of bounds or splits a character.
    pub fn view(&self, start: usize, len: usize) -> Option<Symbol> {
        let end = start.checked_add(len)?;
        self.text.get(start..end)?;
        Some(Symbol { start, len })
    }

    /// Drop the most recently pushed `symbol` and everything after it.
    pub fn rollback(&mut self, symbol: Symbol) {
        self.text.truncate(symbol.start);
    }

    /// Resolve a handle to its text.
    ///
    /// Handles always come from this arena, so the range is in bounds and on
    /// character boundaries.
    #[inline]
    pub fn get(&self, symbol: Symbol) -> &str {
        &self.text[symbol.start..symbol.start + symbol.len]
    }

    /// Release spare capacity once the arena is complete.
    pub fn shrink_to_fit(&mut self) {
        self.text.shrink_to_fit();
    }
}

/// Content hash of a single symbol.
#[inline]
pub(crate) fn hash_str(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Content hash of an ordered pair of symbols.
///
/// `str` hashing is prefix-free, so `("a", "bc")` and `("ab", "c")` differ.
#[inline]
pub(crate) fn hash_pair(left: &str, right: &str) -> u64 {
    let mut hasher = FxHasher::default();
    left.hash(&mut hasher);
    right.hash(&mut hasher);
    hasher.finish()
}
