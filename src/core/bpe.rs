//! Byte-pair merge engine.
//!
//! A word is re-encoded as UTF-8 bytes, each byte is remapped to its byte-level
//! character, and adjacent symbols are merged greedily: every round scans all
//! adjacent pairs, merges the one with the lowest rank (leftmost on ties), and
//! stops when no pair has a rank. Symbols are tracked as a linked list over
//! character positions, so a merge is a single relink.
//!
//! Each round is a full O(n) rescan. Words are short, and ranks never change
//! between rounds, so the rescan always sees the current best pair.

use log::debug;

use super::arena::SymbolArena;
use super::byte_level::get_byte_level_char;
use super::ranks::RankTable;
use super::tokenizer::TokenizerError;
use super::vocab::{parse_merge_rules, Vocab, VocabError};

/// One output token.
///
/// `index` and `length` count symbol characters of the byte-level sequence,
/// which is one character per UTF-8 byte of the input. For tokens returned by
/// [`Tokenizer`](super::Tokenizer), `index` is therefore the byte offset of the
/// token in the encoded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub id: u32,
    pub index: usize,
    pub length: usize,
}

impl Token {
    pub fn new(id: u32, index: usize, length: usize) -> Self {
        Self { id, index, length }
    }

    /// Position one past the token's last symbol character.
    #[inline]
    pub fn end(&self) -> usize {
        self.index + self.length
    }

    #[inline]
    pub(crate) fn shifted(self, offset: usize) -> Self {
        Self {
            index: self.index + offset,
            ..self
        }
    }
}

/// Vocabulary and rank table built from one merges text.
///
/// Read-only once built, and safe to share between tokenizer instances.
#[derive(Debug)]
pub struct BpeModel {
    vocab: Vocab,
    ranks: RankTable,
}

impl BpeModel {
    /// Build the vocabulary and rank table from GPT-2 style merges text.
    ///
    /// Fails on a malformed rule line or a duplicate rule/symbol; no partial
    /// model is produced.
    pub fn from_merges(merges: impl Into<String>) -> Result<Self, VocabError> {
        let text: String = merges.into();
        let rules = parse_merge_rules(&text)?;
        let text_len = text.len();

        let mut ranks = RankTable::with_capacity(SymbolArena::from_text(text), rules.len());
        let mut vocab = Vocab::with_capacity(rules.len(), text_len);

        for rule in &rules {
            ranks.insert(rule)?;
            let (left, right) = ranks
                .operands(rule)
                .ok_or(VocabError::EmptyOperand { line: rule.line })?;
            vocab.register_merge(left, right)?;
        }
        vocab.shrink_to_fit();

        debug!(
            "built BPE model: {} merge rules, {} symbols",
            ranks.len(),
            vocab.len()
        );

        Ok(Self { vocab, ranks })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(vocab: Vocab, ranks: RankTable) -> Self {
        Self { vocab, ranks }
    }

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    pub fn ranks(&self) -> &RankTable {
        &self.ranks
    }
}

/// Encode one word into tokens with word-relative indices.
///
/// An empty word yields no tokens. A merged symbol missing from the vocabulary
/// is reported as [`TokenizerError::UnknownSymbol`].
pub fn byte_pair_encode(word: &[u8], model: &BpeModel) -> Result<Vec<Token>, TokenizerError> {
    let len = word.len();
    if len == 0 {
        return Ok(Vec::new());
    }

    // Byte-level text plus the byte offset of each symbol character in it.
    let mut remapped = String::with_capacity(len * 2);
    let mut bounds = Vec::with_capacity(len + 1);
    for &b in word {
        bounds.push(remapped.len());
        remapped.push(get_byte_level_char(b));
    }
    bounds.push(remapped.len());

    let symbol = |from: usize, to: usize| &remapped[bounds[from]..bounds[to]];
    let lookup = |from: usize, to: usize| {
        let text = symbol(from, to);
        model
            .vocab
            .id(text)
            .ok_or_else(|| TokenizerError::UnknownSymbol(text.to_string()))
    };

    if len == 1 {
        return Ok(vec![Token::new(lookup(0, 1)?, 0, 1)]);
    }

    // next[i] is the start of the symbol following the one starting at i.
    let mut next: Vec<usize> = (1..=len).collect();
    let mut parts = len;

    while parts > 1 {
        let mut best: Option<(u32, usize)> = None;
        let mut i0 = 0;
        let mut i1 = next[0];

        loop {
            let i2 = next[i1];
            if let Some(rank) = model.ranks.rank(symbol(i0, i1), symbol(i1, i2)) {
                if best.map_or(true, |(best_rank, _)| rank < best_rank) {
                    best = Some((rank, i0));
                }
            }
            if i2 == len {
                break;
            }
            i0 = i1;
            i1 = i2;
        }

        let Some((_, at)) = best else {
            break;
        };
        let right = next[at];
        next[at] = next[right];
        parts -= 1;
    }

    let mut tokens = Vec::with_capacity(parts);
    let mut start = 0;
    while start < len {
        let end = next[start];
        tokens.push(Token::new(lookup(start, end)?, start, end - start));
        start = end;
    }

    Ok(tokens)
}
