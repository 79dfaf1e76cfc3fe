//! Data preparation for image captioning: images become normalized
//! Inception-style input arrays, captions become padded index and one-hot
//! target tensors.

pub mod augment;
pub mod captions;
pub mod config;
pub mod dataset;
pub mod error;
pub mod images;
pub mod vocab;

pub use crate::augment::{ImageAugmenter, RandomTransform};
pub use crate::captions::{CaptionBatch, CaptionPreprocessor, EOS_TOKEN};
pub use crate::config::{CaptionConfig, ImageConfig, OovPolicy, PreprocConfig, RareWordsHandling};
pub use crate::dataset::{CaptionRecord, group_by_image, read_caption_file};
pub use crate::error::{PreprocError, Result};
pub use crate::images::{ImagePreprocessor, load_image, preprocess_input};
pub use crate::vocab::{Vocabulary};
