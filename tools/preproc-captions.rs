use caption_preproc::{
  CaptionPreprocessor, ImageAugmenter, ImagePreprocessor, PreprocConfig, Result,
  group_by_image, read_caption_file,
};

use clap::{Parser};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter};

use std::path::{PathBuf};
use std::time::{Instant};

/// Fits a caption vocabulary on a token file and builds one training batch.
#[derive(Parser, Debug)]
#[command(name = "preproc-captions")]
struct Args {
  /// Flickr8k-style token file (`<image>#<n>\t<caption>`).
  #[arg(long)]
  captions:     PathBuf,
  /// Directory holding the image files named in the token file.
  #[arg(long)]
  images:       PathBuf,
  /// JSON preprocessing config; defaults are used when absent.
  #[arg(long)]
  config:       Option<PathBuf>,
  #[arg(long, default_value_t = 16)]
  batch_size:   usize,
  #[arg(long)]
  seed:         Option<u64>,
  /// Apply random flips and shifts to the images.
  #[arg(long)]
  augment:      bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();
  let args = Args::parse();

  let mut config = match args.config {
    Some(ref path) => PreprocConfig::from_json_file(path)?,
    None => PreprocConfig::default(),
  };
  if args.seed.is_some() {
    config.image.seed = args.seed;
  }

  let start_time = Instant::now();
  let records = read_caption_file(&args.captions)?;
  let groups = group_by_image(&records);
  info!("read {} captions for {} images", records.len(), groups.len());

  let mut caption_preproc = CaptionPreprocessor::new(config.caption.clone())?;
  caption_preproc.fit_on_captions(records.iter().map(|r| r.caption.as_str()))?;
  let num_rare = caption_preproc.rare_words().len();
  info!("vocab size: {} rare words: {}", caption_preproc.vocab_size(), num_rare);

  let image_preproc = if args.augment {
    let augmenter = ImageAugmenter{
      horizontal_flip:      true,
      vertical_flip:        false,
      width_shift_range:    0.1,
      height_shift_range:   0.1,
    };
    ImagePreprocessor::with_transform(config.image.clone(), augmenter)?
  } else {
    ImagePreprocessor::new(config.image.clone())?
  };

  let batch: Vec<_> = groups.iter()
    .filter(|(_, captions)| !captions.is_empty())
    .take(args.batch_size)
    .collect();
  if batch.len() < args.batch_size {
    warn!("only {} images available for a batch of {}", batch.len(), args.batch_size);
  }
  let img_paths: Vec<PathBuf> = batch.iter().map(|(file, _)| args.images.join(file)).collect();
  let captions: Vec<&str> = batch.iter().map(|(_, captions)| captions[0].as_str()).collect();

  let img_arrays = image_preproc.preprocess_images_parallel(&img_paths)
    .into_iter()
    .collect::<Result<Vec<_>>>()?;
  let img_batch = image_preproc.preprocess_batch(&img_arrays)?;

  let encoded = caption_preproc.encode_captions(&captions)?;
  if let Some(first) = encoded.first() {
    let vocab = caption_preproc.vocabulary();
    let words: Vec<&str> = first.iter().filter_map(|&idx| vocab.word_of(idx)).collect();
    debug!("first caption: {}", words.join(" "));
  }
  let caption_batch = caption_preproc.preprocess_batch(&encoded)?;

  info!("images: {:?} captions_input: {:?} captions_output: {:?}",
      img_batch.shape(),
      caption_batch.captions_input.shape(),
      caption_batch.captions_output.shape());
  info!("elapsed: {:.3}s", start_time.elapsed().as_secs_f32());
  Ok(())
}
