//! Word vocabulary and the whitespace tokenizer that feeds it.
//!
//! Index 0 is the padding sentinel and is never handed out; real words are
//! numbered from 1 in the order they are first observed.

use std::collections::{HashMap};

/// Splits `text` into words, turning every character in `filters` into a
/// separator first.
pub fn tokenize(text: &str, filters: &str, lowercase: bool) -> Vec<String> {
  let text = if lowercase { text.to_lowercase() } else { text.to_string() };
  text
    .split(|c: char| c.is_whitespace() || filters.contains(c))
    .filter(|w| !w.is_empty())
    .map(|w| w.to_string())
    .collect()
}

#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
  word_index:   HashMap<String, usize>,
  index_word:   Vec<String>,
  word_counts:  HashMap<String, usize>,
}

impl Vocabulary {
  pub fn new() -> Vocabulary {
    Vocabulary::default()
  }

  /// Number of distinct words, not counting the padding sentinel.
  pub fn len(&self) -> usize {
    self.index_word.len()
  }

  pub fn is_empty(&self) -> bool {
    self.index_word.is_empty()
  }

  /// Records one occurrence of `word`, assigning it the next free index if
  /// it is new. Returns the word's index.
  pub fn observe(&mut self, word: &str) -> usize {
    *self.word_counts.entry(word.to_string()).or_insert(0) += 1;
    if let Some(&idx) = self.word_index.get(word) {
      return idx;
    }
    self.index_word.push(word.to_string());
    let idx = self.index_word.len();
    self.word_index.insert(word.to_string(), idx);
    idx
  }

  pub fn index_of(&self, word: &str) -> Option<usize> {
    self.word_index.get(word).copied()
  }

  pub fn word_of(&self, idx: usize) -> Option<&str> {
    if idx == 0 {
      return None;
    }
    self.index_word.get(idx - 1).map(|w| w.as_str())
  }

  pub fn count_of(&self, word: &str) -> usize {
    self.word_counts.get(word).copied().unwrap_or(0)
  }

  /// Words in index order.
  pub fn words(&self) -> impl Iterator<Item = &str> {
    self.index_word.iter().map(|w| w.as_str())
  }
}
