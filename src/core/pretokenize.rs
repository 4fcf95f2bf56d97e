//! Word splitting ahead of BPE.
//!
//! The input is scanned once, left to right, into non-overlapping words:
//!
//! - a contraction suffix: `'s`, `'t`, `'re`, `'ve`, `'m`, `'ll`, `'d`
//! - otherwise one optional whitespace character followed by a run of letters,
//!   a run of digits, or a run of anything else (not whitespace, letter or
//!   digit); the whitespace character alone is also a word
//!
//! Letters are matched case-insensitively. A word is *cache-safe* when it fits
//! the same grammar with letter/digit runs of at most 50 characters and other
//! runs of at most 6, which bounds the size of any cache key.

use regex::Regex;

#[cfg(feature = "pcre2")]
use pcre2::bytes::Regex as Pcre2Regex;

use super::tokenizer::TokenizerError;

/// Word pattern.
pub const WORD_PATTERN: &str = r"(?i)'s|'t|'re|'ve|'m|'ll|'d|\s?(?:[a-z]+|\d+|[^\sa-z\d]+)?";

/// Whole-word pattern deciding whether a word's result may be cached.
pub const CACHE_SAFE_PATTERN: &str =
    r"(?i)^(?:'s|'t|'re|'ve|'m|'ll|'d|\s?(?:[a-z]{1,50}|\d{1,50}|[^\sa-z\d]{1,6})?)$";

/// A word's byte range in the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordSpan {
    pub offset: usize,
    pub len: usize,
}

impl WordSpan {
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.end()
    }
}

/// Regex backend: the `regex` crate (default) or PCRE2 (optional).
enum RegexBackend {
    Regex {
        words: Regex,
        cache_safe: Regex,
    },
    #[cfg(feature = "pcre2")]
    Pcre2 {
        words: Pcre2Regex,
        cache_safe: Pcre2Regex,
    },
}

/// Splits text into [`WordSpan`]s and classifies words as cache-safe.
pub struct WordSplitter {
    backend: RegexBackend,
}

impl WordSplitter {
    /// Build a splitter on the default `regex` backend.
    pub fn new() -> Result<Self, TokenizerError> {
        Ok(Self {
            backend: RegexBackend::Regex {
                words: Regex::new(WORD_PATTERN)?,
                cache_safe: Regex::new(CACHE_SAFE_PATTERN)?,
            },
        })
    }

    /// Build a splitter on the PCRE2 backend, with JIT where available.
    #[cfg(feature = "pcre2")]
    pub fn pcre2() -> Result<Self, TokenizerError> {
        let build = |pattern: &str| {
            let mut builder = pcre2::bytes::RegexBuilder::new();
            builder.jit_if_available(true);
            builder.utf(true);
            builder.ucp(true);
            builder.build(pattern)
        };

        log::debug!("word splitter using PCRE2 backend");
        Ok(Self {
            backend: RegexBackend::Pcre2 {
                words: build(WORD_PATTERN)?,
                cache_safe: build(CACHE_SAFE_PATTERN)?,
            },
        })
    }

    /// Whether this splitter runs on PCRE2.
    pub fn is_pcre2(&self) -> bool {
        match self.backend {
            RegexBackend::Regex { .. } => false,
            #[cfg(feature = "pcre2")]
            RegexBackend::Pcre2 { .. } => true,
        }
    }

    /// All non-empty words of `text`, in order.
    ///
    /// # Errors
    /// Returns an error if the PCRE2 matcher fails part way through the text.
    pub fn split(&self, text: &str) -> Result<Vec<WordSpan>, TokenizerError> {
        let span = |start: usize, end: usize| WordSpan {
            offset: start,
            len: end - start,
        };

        match &self.backend {
            RegexBackend::Regex { words, .. } => Ok(words
                .find_iter(text)
                .filter(|m| m.start() < m.end())
                .map(|m| span(m.start(), m.end()))
                .collect()),
            #[cfg(feature = "pcre2")]
            RegexBackend::Pcre2 { words, .. } => {
                let mut spans = Vec::new();
                for m in words.find_iter(text.as_bytes()) {
                    let m = m?;
                    if m.start() < m.end() {
                        spans.push(span(m.start(), m.end()));
                    }
                }
                Ok(spans)
            }
        }
    }

    /// Whether `word`'s merge result may be cached.
    pub fn is_cache_safe(&self, word: &str) -> bool {
        match &self.backend {
            RegexBackend::Regex { cache_safe, .. } => cache_safe.is_match(word),
            #[cfg(feature = "pcre2")]
            RegexBackend::Pcre2 { cache_safe, .. } => {
                cache_safe.is_match(word.as_bytes()).unwrap_or(false)
            }
        }
    }
}

impl std::fmt::Debug for WordSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordSplitter")
            .field("pcre2", &self.is_pcre2())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<&str> {
        let splitter = WordSplitter::new().unwrap();
        splitter
            .split(text)
            .unwrap()
            .into_iter()
            .map(|span| &text[span.range()])
            .collect()
    }

    #[test]
    fn test_basic_words() {
        assert_eq!(
            words(r#"print("Hello world!")"#),
            vec!["print", "(\"", "Hello", " world", "!\")"]
        );
    }

    #[test]
    fn test_contractions() {
        assert_eq!(words("I'm here"), vec!["I", "'m", " here"]);
        assert_eq!(words("we'll"), vec!["we", "'ll"]);
        assert_eq!(words("IT'S"), vec!["IT", "'S"]);
        assert_eq!(words("don't"), vec!["don", "'t"]);
    }

    #[test]
    fn test_digits_and_letters_split() {
        assert_eq!(words("abc123def"), vec!["abc", "123", "def"]);
        assert_eq!(words(" 42"), vec![" 42"]);
    }

    #[test]
    fn test_whitespace_runs() {
        // Only one leading whitespace character attaches to a word.
        assert_eq!(words("a  b"), vec!["a", " ", " b"]);
        assert_eq!(words("a\n\nb"), vec!["a", "\n", "\nb"]);
        assert_eq!(words("trailing "), vec!["trailing", " "]);
    }

    #[test]
    fn test_non_ascii_letters_are_symbols() {
        assert_eq!(words("café"), vec!["caf", "é"]);
        assert_eq!(words(" 你好"), vec![" 你好"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(words("").is_empty());
    }

    #[test]
    fn test_spans_are_increasing_and_disjoint() {
        let splitter = WordSplitter::new().unwrap();
        let text = "It's 2024, and   we're\tfine!!";
        let spans = splitter.split(text).unwrap();
        let mut last_end = 0;
        for span in &spans {
            assert!(span.len > 0);
            assert!(span.offset >= last_end);
            last_end = span.end();
        }
        assert_eq!(last_end, text.len());
    }

    #[test]
    fn test_cache_safety() {
        let splitter = WordSplitter::new().unwrap();
        assert!(splitter.is_cache_safe("hello"));
        assert!(splitter.is_cache_safe(" hello"));
        assert!(splitter.is_cache_safe("'ll"));
        assert!(splitter.is_cache_safe(" "));
        assert!(splitter.is_cache_safe("!?!?!?"));
        assert!(!splitter.is_cache_safe("!?!?!?!"));
        assert!(splitter.is_cache_safe(&"a".repeat(50)));
        assert!(!splitter.is_cache_safe(&"a".repeat(51)));
        assert!(!splitter.is_cache_safe(&format!(" {}", "9".repeat(51))));
    }

    #[cfg(feature = "pcre2")]
    #[test]
    fn test_pcre2_matches_default_backend() {
        let default = WordSplitter::new().unwrap();
        let pcre2 = WordSplitter::pcre2().unwrap();
        let text = "It's 2024,  we're\tfine!! café";
        assert_eq!(default.split(text).unwrap(), pcre2.split(text).unwrap());
        assert!(pcre2.is_cache_safe(" hello"));
        assert!(!pcre2.is_cache_safe(&"x".repeat(51)));
    }

    #[cfg(feature = "pcre2")]
    #[test]
    fn test_pcre2_split_covers_long_text() {
        let pcre2 = WordSplitter::pcre2().unwrap();
        let text = "It's a long line, with 12345 digits!! ".repeat(2000);
        let spans = pcre2.split(&text).unwrap();
        assert_eq!(spans.first().map(|s| s.offset), Some(0));
        assert_eq!(spans.last().map(|s| s.end()), Some(text.len()));
        assert!(spans.windows(2).all(|w| w[0].end() == w[1].offset));
    }
}
