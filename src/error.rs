//! Error type shared by the image and caption preprocessors.

use std::path::{PathBuf};

use thiserror::{Error};

pub type Result<T> = std::result::Result<T, PreprocError>;

#[derive(Error, Debug)]
pub enum PreprocError {
  /// The image path does not resolve to a file.
  #[error("image file not found: {}", .path.display())]
  FileNotFound {
    path: PathBuf,
  },

  #[error("io error on {}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The file exists but is not a readable image.
  #[error("failed to decode image")]
  ImageDecode(#[from] image::ImageError),

  #[error("shape mismatch at index {index}: expected {expected:?}, got {actual:?}")]
  ShapeMismatch {
    index: usize,
    expected: Vec<usize>,
    actual: Vec<usize>,
  },

  /// An image worker exited without reporting a result.
  #[error("no result for image {index}")]
  WorkerLost {
    index: usize,
  },

  #[error("tensor operation")]
  Tensor(#[from] ndarray::ShapeError),

  #[error("word not in vocabulary: {word:?}")]
  OutOfVocabulary {
    word: String,
  },

  /// The operation is declared but not supported yet.
  #[error("not supported: {operation}")]
  Unsupported {
    operation: String,
  },

  #[error("invalid input: {message}")]
  InvalidInput {
    message: String,
  },

  #[error("configuration: {message}")]
  Config {
    message: String,
  },

  #[error("caption file")]
  Csv(#[from] csv::Error),

  #[error("config file")]
  Json(#[from] serde_json::Error),
}

impl PreprocError {
  pub fn unsupported(operation: impl Into<String>) -> PreprocError {
    PreprocError::Unsupported{operation: operation.into()}
  }

  pub fn invalid_input(message: impl Into<String>) -> PreprocError {
    PreprocError::InvalidInput{message: message.into()}
  }

  pub fn config(message: impl Into<String>) -> PreprocError {
    PreprocError::Config{message: message.into()}
  }
}
