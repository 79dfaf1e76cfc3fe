use crate::error::{PreprocError, Result};

use serde::{Deserialize, Serialize};

use std::fs::{File};
use std::io::{BufReader};
use std::path::{Path};

/// Characters stripped from caption text before splitting into words.
pub const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RareWordsHandling {
  Nothing,
  Discard,
  Change,
}

/// What `encode_captions` does with a word the vocabulary has never seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OovPolicy {
  Error,
  Skip,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
  /// (height, width) every image is resized to.
  pub target_size:  (u32, u32),
  /// Base seed for augmentation; image `i` uses `seed + i`.
  pub seed:         Option<u64>,
  pub workers:      usize,
}

impl Default for ImageConfig {
  fn default() -> ImageConfig {
    ImageConfig{
      target_size:  (299, 299),
      seed:         None,
      workers:      4,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
  pub rare_words_handling:  RareWordsHandling,
  pub words_min_occur:      usize,
  pub oov_policy:           OovPolicy,
  pub lowercase:            bool,
  pub filters:              String,
}

impl Default for CaptionConfig {
  fn default() -> CaptionConfig {
    CaptionConfig{
      rare_words_handling:  RareWordsHandling::Nothing,
      words_min_occur:      5,
      oov_policy:           OovPolicy::Error,
      lowercase:            true,
      filters:              DEFAULT_FILTERS.to_string(),
    }
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocConfig {
  pub image:    ImageConfig,
  pub caption:  CaptionConfig,
}

impl PreprocConfig {
  pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<PreprocConfig> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PreprocError::Io{path: path.to_path_buf(), source: e})?;
    let config: PreprocConfig = serde_json::from_reader(BufReader::new(file))?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    self.image.validate()?;
    self.caption.validate()
  }
}

impl ImageConfig {
  pub fn validate(&self) -> Result<()> {
    let (height, width) = self.target_size;
    if height == 0 || width == 0 {
      return Err(PreprocError::config(format!("target_size must be nonzero, got {:?}", self.target_size)));
    }
    if self.workers == 0 {
      return Err(PreprocError::config("workers must be at least 1"));
    }
    Ok(())
  }
}

impl CaptionConfig {
  pub fn validate(&self) -> Result<()> {
    if self.words_min_occur == 0 {
      return Err(PreprocError::config("words_min_occur must be a positive integer"));
    }
    Ok(())
  }
}
