//! Caption text to training targets.
//!
//! Captions are tokenized into words, terminated with [`EOS_TOKEN`] and
//! mapped through a [`Vocabulary`] fitted on the training corpus. A batch of
//! encoded captions becomes a [`CaptionBatch`]: an index matrix for the
//! decoder input and a one-hot tensor for the loss.

use crate::config::{CaptionConfig, OovPolicy, RareWordsHandling};
use crate::error::{PreprocError, Result};
use crate::vocab::{Vocabulary, tokenize};

use ndarray::{Array2, Array3, s};
use tracing::{debug};

pub const EOS_TOKEN: &str = "eos";

/// Input/target pair for one training step.
#[derive(Clone, Debug)]
pub struct CaptionBatch {
  /// (batch, maxlen) word indices, every nonzero index decreased by 1.
  pub captions_input:   Array2<i32>,
  /// (batch, maxlen + 1, vocab_size) one-hot targets. Padding positions are
  /// all zeros so they contribute nothing to a cross entropy loss.
  pub captions_output:  Array3<i32>,
}

#[derive(Clone, Debug)]
pub struct CaptionPreprocessor {
  config:   CaptionConfig,
  vocab:    Vocabulary,
}

impl CaptionPreprocessor {
  pub fn new(config: CaptionConfig) -> Result<CaptionPreprocessor> {
    config.validate()?;
    Ok(CaptionPreprocessor{
      config:   config,
      vocab:    Vocabulary::new(),
    })
  }

  pub fn vocabulary(&self) -> &Vocabulary {
    &self.vocab
  }

  pub fn vocab_size(&self) -> usize {
    self.vocab.len()
  }

  /// Extends the vocabulary with every word of `captions`, EOS included.
  ///
  /// Rare word handling other than `Nothing` is not implemented and is
  /// reported as `Unsupported` without modifying the vocabulary.
  pub fn fit_on_captions<I, S>(&mut self, captions: I) -> Result<()>
  where I: IntoIterator<Item = S>, S: AsRef<str>,
  {
    if self.config.rare_words_handling != RareWordsHandling::Nothing {
      return Err(PreprocError::unsupported(format!(
          "rare words handling {:?} (words_min_occur = {})",
          self.config.rare_words_handling, self.config.words_min_occur,
      )));
    }
    let prev_size = self.vocab.len();
    let mut num_captions = 0;
    for caption in captions {
      for word in self.words_of(caption.as_ref()) {
        self.vocab.observe(&word);
      }
      num_captions += 1;
    }
    debug!("fit on {} captions: vocab size {} -> {}", num_captions, prev_size, self.vocab.len());
    Ok(())
  }

  /// Maps each caption (with EOS appended) to its vocabulary indices.
  pub fn encode_captions<I, S>(&self, captions: I) -> Result<Vec<Vec<usize>>>
  where I: IntoIterator<Item = S>, S: AsRef<str>,
  {
    let mut encoded = vec![];
    for caption in captions {
      let mut seq = vec![];
      for word in self.words_of(caption.as_ref()) {
        match (self.vocab.index_of(&word), self.config.oov_policy) {
          (Some(idx), _) => seq.push(idx),
          (None, OovPolicy::Skip) => {}
          (None, OovPolicy::Error) => {
            return Err(PreprocError::OutOfVocabulary{word: word});
          }
        }
      }
      encoded.push(seq);
    }
    Ok(encoded)
  }

  /// Inverse of `encode_captions`. Not implemented yet.
  pub fn decode_captions(&self, _captions_encoded: &[Vec<usize>]) -> Result<Vec<String>> {
    Err(PreprocError::unsupported("decode_captions"))
  }

  /// Words seen fewer than `words_min_occur` times so far, in index order.
  pub fn rare_words(&self) -> Vec<&str> {
    self.vocab.words()
      .filter(|w| self.vocab.count_of(w) < self.config.words_min_occur)
      .collect()
  }

  /// Builds the training pair for a batch of encoded captions.
  ///
  /// The output has one more timestep than the input because the model
  /// emits a word for the image token it is fed first.
  pub fn preprocess_batch(&self, captions_label_encoded: &[Vec<usize>]) -> Result<CaptionBatch> {
    let vocab_size = self.vocab.len();
    let batch_size = captions_label_encoded.len();
    let maxlen = captions_label_encoded.iter().map(|c| c.len()).max().unwrap_or(0);

    // Padded to `maxlen` and then once more, so the last column is always 0.
    let mut captions_extended1 = Array2::<usize>::zeros((batch_size, maxlen + 1));
    for (i, caption) in captions_label_encoded.iter().enumerate() {
      for (t, &idx) in caption.iter().enumerate() {
        if idx > vocab_size {
          return Err(PreprocError::invalid_input(format!(
              "caption {} has word index {} but vocab size is {}", i, idx, vocab_size,
          )));
        }
        captions_extended1[[i, t]] = idx;
      }
    }

    let mut captions_one_hot = Array3::<i32>::zeros((batch_size, maxlen + 1, vocab_size + 1));
    for ((i, t), &idx) in captions_extended1.indexed_iter() {
      captions_one_hot[[i, t, idx]] = 1;
    }

    let captions = captions_extended1.slice(s![.., ..maxlen]);
    let mut captions_input = Array2::<i32>::zeros((batch_size, maxlen));
    for ((i, t), &idx) in captions.indexed_iter() {
      if idx > 0 {
        captions_input[[i, t]] = to_i32(idx - 1)?;
      }
    }
    let captions_output = captions_one_hot.slice(s![.., .., 1..]).to_owned();

    debug!("caption batch: input {:?} output {:?}", captions_input.shape(), captions_output.shape());
    Ok(CaptionBatch{
      captions_input:   captions_input,
      captions_output:  captions_output,
    })
  }

  fn words_of(&self, caption: &str) -> Vec<String> {
    let caption = format!("{} {}", caption, EOS_TOKEN);
    tokenize(&caption, &self.config.filters, self.config.lowercase)
  }
}

fn to_i32(idx: usize) -> Result<i32> {
  i32::try_from(idx).map_err(|_| PreprocError::invalid_input(format!("word index {} does not fit in i32", idx)))
}
