//! Symbol table (vocabulary) and merges-file parsing.
//!
//! # Merges Format
//!
//! The GPT-2 `merges.txt` format is a text file whose first line is a header
//! (ignored), followed by one merge rule per line:
//!
//! ```text
//! #version: 0.2
//! Ġ t
//! Ġ a
//! h e
//! ```
//!
//! Each rule is `left SPACE right`, written in the byte-level alphabet. Rule
//! `k` (0-based, blank lines skipped) has rank `k` and produces the symbol
//! `left + right`, which receives vocabulary id `256 + k`.
//!
//! # Id Assignment
//!
//! The 256 single-character byte symbols are registered first, in ascending
//! code point order (not byte order), so ids `0..256` match the reference
//! GPT-2 vocabulary. Every merged symbol follows in rule order.

use hashbrown::HashTable;
use thiserror::Error;

use super::arena::{hash_str, Symbol, SymbolArena};
use super::byte_level::sorted_alphabet;

/// Errors that can occur while reading merge rules or building the vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VocabError {
    #[error("Invalid merge rule on line {line}: missing space separator")]
    MissingSeparator { line: usize },
    #[error("Invalid merge rule on line {line}: empty operand")]
    EmptyOperand { line: usize },
    #[error("Symbol registered twice: {0:?}")]
    DuplicateSymbol(String),
    #[error("Duplicate merge rule on line {line}: {left:?} {right:?}")]
    DuplicateRule {
        line: usize,
        left: String,
        right: String,
    },
}

/// One parsed merge rule, as byte ranges into the merges text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRule {
    /// 1-based line number in the merges text.
    pub line: usize,
    pub left: (usize, usize),
    pub right: (usize, usize),
}

/// Parse merge rules from merges text, skipping the header line.
///
/// Lines end in `\n` or `\r\n`. Blank lines are skipped. The separator is the
/// first ASCII space on the line.
pub fn parse_merge_rules(text: &str) -> Result<Vec<MergeRule>, VocabError> {
    let mut rules = Vec::new();
    let mut line_start = 0;

    for (idx, raw) in text.split('\n').enumerate() {
        let start = line_start;
        line_start += raw.len() + 1;

        // Header
        if idx == 0 {
            continue;
        }

        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.is_empty() {
            continue;
        }

        let line_no = idx + 1;
        let space = line
            .find(' ')
            .ok_or(VocabError::MissingSeparator { line: line_no })?;
        let right_len = line.len() - space - 1;
        if space == 0 || right_len == 0 {
            return Err(VocabError::EmptyOperand { line: line_no });
        }

        rules.push(MergeRule {
            line: line_no,
            left: (start, space),
            right: (start + space + 1, right_len),
        });
    }

    Ok(rules)
}

/// Bijection between symbols and dense ids `0..len()`.
///
/// Symbol text lives in one arena; the index is keyed by id and hashed by the
/// content each id points at.
#[derive(Debug)]
pub struct Vocab {
    arena: SymbolArena,
    symbols: Vec<Symbol>,
    index: HashTable<u32>,
}

impl Vocab {
    /// Create a vocabulary holding only the 256-symbol byte alphabet.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Like [`Vocab::new`], reserving room for `merges` more symbols totalling
    /// about `text_bytes` bytes.
    pub fn with_capacity(merges: usize, text_bytes: usize) -> Self {
        let mut vocab = Self {
            arena: SymbolArena::with_capacity(text_bytes + 256 * 2),
            symbols: Vec::with_capacity(merges + 256),
            index: HashTable::with_capacity(merges + 256),
        };

        let mut buf = [0u8; 4];
        for ch in sorted_alphabet() {
            let symbol = vocab.arena.push(ch.encode_utf8(&mut buf));
            vocab.insert_new(symbol);
        }

        vocab
    }

    /// Number of registered symbols.
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Look up the id of a symbol by content.
    pub fn id(&self, symbol: &str) -> Option<u32> {
        let Self {
            arena,
            symbols,
            index,
        } = self;
        index
            .find(hash_str(symbol), |&id| {
                arena.get(symbols[id as usize]) == symbol
            })
            .copied()
    }

    /// Text of the symbol with the given id.
    pub fn symbol(&self, id: u32) -> Option<&str> {
        self.symbols
            .get(id as usize)
            .map(|&symbol| self.arena.get(symbol))
    }

    /// Iterate `(id, symbol)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .map(|(id, &symbol)| (id as u32, self.arena.get(symbol)))
    }

    /// Register `left + right` as a new symbol and return its id.
    ///
    /// Fails if the concatenation is already registered.
    pub fn register_merge(&mut self, left: &str, right: &str) -> Result<u32, VocabError> {
        let symbol = self.arena.push_concat(left, right);
        if self.id(self.arena.get(symbol)).is_some() {
            let text = self.arena.get(symbol).to_string();
            self.arena.rollback(symbol);
            return Err(VocabError::DuplicateSymbol(text));
        }
        Ok(self.insert_new(symbol))
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        let Self {
            arena,
            symbols,
            index,
        } = self;
        arena.shrink_to_fit();
        symbols.shrink_to_fit();
        index.shrink_to_fit(|&id| hash_str(arena.get(symbols[id as usize])));
    }

    /// Insert a symbol known to be absent.
    fn insert_new(&mut self, symbol: Symbol) -> u32 {
        let Self {
            arena,
            symbols,
            index,
        } = self;
        let id = symbols.len() as u32;
        symbols.push(symbol);
        index.insert_unique(hash_str(arena.get(symbol)), id, |&id| {
            hash_str(arena.get(symbols[id as usize]))
        });
        id
    }
}

impl Default for Vocab {
    fn default() -> Self {
        Self::new()
    }
}
