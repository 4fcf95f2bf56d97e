//! Integration tests against the canonical GPT-2 `merges.txt`.
//!
//! The merges table is not vendored, so these tests are ignored by default.
//! Run them with `GPT2_MERGES=/path/to/merges.txt cargo test -- --ignored`.

use mergetok::{Tokenizer, GPT2_END_OF_TEXT};

fn load_gpt2() -> Tokenizer {
    let path = std::env::var("GPT2_MERGES").expect("GPT2_MERGES must point at merges.txt");
    let merges = std::fs::read_to_string(&path).expect("Failed to read GPT-2 merges");
    Tokenizer::new(merges)
        .expect("Failed to build GPT-2 tokenizer")
        .with_special_tokens(&[GPT2_END_OF_TEXT])
        .expect("Failed to register special tokens")
}

/// Reference output of the GPT-2 tokenizer.
#[test]
#[ignore = "needs GPT2_MERGES"]
fn test_gpt2_print_hello_world() {
    let mut tokenizer = load_gpt2();

    let tokens = tokenizer.encode(r#"print("Hello world!")"#).unwrap();
    let ids: Vec<u32> = tokens.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![4798, 7203, 15496, 995, 2474, 8]);

    let lengths: Vec<usize> = tokens.iter().map(|t| t.length).collect();
    assert_eq!(lengths, vec![5, 2, 5, 6, 2, 1]);
}

#[test]
#[ignore = "needs GPT2_MERGES"]
fn test_gpt2_vocab_size() {
    let tokenizer = load_gpt2();
    assert_eq!(tokenizer.vocab_size(), 50257);
    assert_eq!(tokenizer.token_id(GPT2_END_OF_TEXT), Some(50256));
    assert_eq!(tokenizer.token_id("Ġthe"), Some(262));
}

#[test]
#[ignore = "needs GPT2_MERGES"]
fn test_gpt2_end_of_text() {
    let mut tokenizer = load_gpt2();
    let ids: Vec<u32> = tokenizer
        .encode_with_special("Hello<|endoftext|>")
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![15496, 50256]);
}

#[test]
#[ignore = "needs GPT2_MERGES"]
fn test_gpt2_cached_and_uncached_agree() {
    let mut tokenizer = load_gpt2();
    let text = "The quick brown fox jumps over the lazy dog. The quick brown fox!";
    let cached = tokenizer.encode(text).unwrap();
    let again = tokenizer.encode(text).unwrap();
    let mut uncached = tokenizer.fork().cache(false);
    assert_eq!(cached, again);
    assert_eq!(cached, uncached.encode(text).unwrap());
}
