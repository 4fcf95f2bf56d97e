//! Merge priority table.
//!
//! Maps an ordered pair of adjacent symbols to the rank of the rule that
//! merges them; lower ranks merge first. Pairs are stored as handles into the
//! merges text itself, so building the table copies no symbol text.

use hashbrown::HashTable;

use super::arena::{hash_pair, Symbol, SymbolArena};
use super::vocab::{MergeRule, VocabError};

#[derive(Debug, Clone, Copy)]
struct RankedPair {
    left: Symbol,
    right: Symbol,
    rank: u32,
}

/// Rank lookup keyed by the content of `(left, right)`.
#[derive(Debug)]
pub struct RankTable {
    source: SymbolArena,
    pairs: HashTable<RankedPair>,
}

impl RankTable {
    /// Create an empty table over `source`, the text rule handles point into.
    pub fn new(source: SymbolArena) -> Self {
        Self {
            source,
            pairs: HashTable::new(),
        }
    }

    pub fn with_capacity(source: SymbolArena, capacity: usize) -> Self {
        Self {
            source,
            pairs: HashTable::with_capacity(capacity),
        }
    }

    /// Number of rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Operand texts of a parsed rule.
    ///
    /// Returns `None` if the rule's ranges do not lie within the source.
    pub fn operands(&self, rule: &MergeRule) -> Option<(&str, &str)> {
        let left = self.source.view(rule.left.0, rule.left.1)?;
        let right = self.source.view(rule.right.0, rule.right.1)?;
        Some((self.source.get(left), self.source.get(right)))
    }

    /// Append `rule` with the next rank and return that rank.
    pub fn insert(&mut self, rule: &MergeRule) -> Result<u32, VocabError> {
        let (left, right) = match (
            self.source.view(rule.left.0, rule.left.1),
            self.source.view(rule.right.0, rule.right.1),
        ) {
            (Some(left), Some(right)) => (left, right),
            _ => return Err(VocabError::EmptyOperand { line: rule.line }),
        };

        let Self { source, pairs } = self;
        let source = &*source;
        let left_text = source.get(left);
        let right_text = source.get(right);
        let hash = hash_pair(left_text, right_text);

        let eq = |pair: &RankedPair| {
            source.get(pair.left) == left_text && source.get(pair.right) == right_text
        };
        if pairs.find(hash, eq).is_some() {
            return Err(VocabError::DuplicateRule {
                line: rule.line,
                left: left_text.to_string(),
                right: right_text.to_string(),
            });
        }

        let rank = pairs.len() as u32;
        pairs.insert_unique(hash, RankedPair { left, right, rank }, |pair| {
            hash_pair(source.get(pair.left), source.get(pair.right))
        });
        Ok(rank)
    }

    /// Rank of merging `left` followed by `right`, if any rule does so.
    #[inline]
    pub fn rank(&self, left: &str, right: &str) -> Option<u32> {
        let source = &self.source;
        self.pairs
            .find(hash_pair(left, right), |pair| {
                source.get(pair.left) == left && source.get(pair.right) == right
            })
            .map(|pair| pair.rank)
    }
}
