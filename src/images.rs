//! Image files to normalized (height, width, 3) arrays for an Inception-style
//! feature extractor.

use crate::augment::{RandomTransform};
use crate::config::{ImageConfig};
use crate::error::{PreprocError, Result};

use image::{ImageReader, RgbImage};
use image::imageops::{FilterType, resize};
use ndarray::{Array3, Array4, Axis};
use rand::{SeedableRng};
use rand::rngs::{StdRng};
use threadpool::{ThreadPool};
use tracing::{debug};

use std::collections::{BTreeMap};
use std::io::{ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc};
use std::sync::mpsc::{sync_channel};
use std::time::{Instant};

/// Scales raw [0, 255] pixel values to [-1, 1].
pub fn preprocess_input(mut img_array: Array3<f32>) -> Array3<f32> {
  img_array.mapv_inplace(|x| x / 127.5 - 1.0);
  img_array
}

/// Reads `path` as RGB and resizes it to `(height, width)` with nearest
/// neighbour sampling. Pixel values are left in [0, 255].
pub fn load_image(path: &Path, target_size: (u32, u32)) -> Result<Array3<f32>> {
  let reader = match ImageReader::open(path) {
    Ok(reader) => reader,
    Err(e) if e.kind() == ErrorKind::NotFound => {
      return Err(PreprocError::FileNotFound{path: path.to_path_buf()});
    }
    Err(e) => return Err(PreprocError::Io{path: path.to_path_buf(), source: e}),
  };
  let reader = reader.with_guessed_format()
    .map_err(|e| PreprocError::Io{path: path.to_path_buf(), source: e})?;
  let image = reader.decode()?.to_rgb8();
  let (height, width) = target_size;
  let image = resize(&image, width, height, FilterType::Nearest);
  img_to_array(&image)
}

fn img_to_array(image: &RgbImage) -> Result<Array3<f32>> {
  let (width, height) = image.dimensions();
  let data: Vec<f32> = image.as_raw().iter().map(|&p| p as f32).collect();
  Ok(Array3::from_shape_vec((height as usize, width as usize, 3), data)?)
}

#[derive(Clone)]
pub struct ImagePreprocessor {
  config:     ImageConfig,
  transform:  Option<Arc<dyn RandomTransform>>,
  base_seed:  u64,
}

impl ImagePreprocessor {
  pub fn new(config: ImageConfig) -> Result<ImagePreprocessor> {
    config.validate()?;
    let base_seed = config.seed.unwrap_or_else(|| rand::random());
    Ok(ImagePreprocessor{
      config:     config,
      transform:  None,
      base_seed:  base_seed,
    })
  }

  /// Like `new`, but every image is passed through `transform` after
  /// normalization.
  pub fn with_transform<T>(config: ImageConfig, transform: T) -> Result<ImagePreprocessor>
  where T: RandomTransform + 'static,
  {
    transform.validate()?;
    let mut preproc = ImagePreprocessor::new(config)?;
    preproc.transform = Some(Arc::new(transform));
    Ok(preproc)
  }

  /// Lazily preprocesses `img_paths` in order.
  ///
  /// The returned iterator consumes `img_paths`; it yields one result per
  /// path and cannot be restarted. Image `i` of the sequence is augmented
  /// with an RNG seeded from `seed + i`.
  pub fn preprocess_images<'a, I>(&'a self, img_paths: I) -> impl Iterator<Item = Result<Array3<f32>>> + 'a
  where I: IntoIterator + 'a, I::Item: AsRef<Path>, I::IntoIter: 'a,
  {
    img_paths.into_iter()
      .enumerate()
      .map(move |(idx, path)| self.preprocess_an_image(idx, path.as_ref()))
  }

  /// Preprocesses `img_paths` on a pool of `workers` threads. Results come
  /// back in input order and match `preprocess_images` for the same seed.
  pub fn preprocess_images_parallel<P: AsRef<Path>>(&self, img_paths: &[P]) -> Vec<Result<Array3<f32>>> {
    let start_time = Instant::now();
    let num_images = img_paths.len();
    let pool = ThreadPool::new(self.config.workers);
    let (result_tx, result_rx) = sync_channel(2 * self.config.workers);
    for (idx, path) in img_paths.iter().enumerate() {
      let preproc = self.clone();
      let path: PathBuf = path.as_ref().to_path_buf();
      let result_tx = result_tx.clone();
      pool.execute(move || {
        let res = preproc.preprocess_an_image(idx, &path);
        // The receiver only hangs up once every image is accounted for.
        let _ = result_tx.send((idx, res));
      });
    }
    drop(result_tx);

    let mut results = Vec::with_capacity(num_images);
    let mut cache: BTreeMap<usize, Result<Array3<f32>>> = BTreeMap::new();
    for (idx, res) in result_rx.iter() {
      cache.insert(idx, res);
      while let Some(res) = cache.remove(&results.len()) {
        results.push(res);
      }
    }
    // Anything still missing belongs to a worker that panicked.
    for idx in results.len() .. num_images {
      results.push(cache.remove(&idx).unwrap_or(Err(PreprocError::WorkerLost{index: idx})));
    }
    debug!("preprocessed {} images on {} workers in {:.3}s",
        num_images, self.config.workers, start_time.elapsed().as_secs_f32());
    results
  }

  /// Stacks equally shaped images into one (batch, height, width, channels)
  /// array.
  pub fn preprocess_batch(&self, img_list: &[Array3<f32>]) -> Result<Array4<f32>> {
    let first_shape = match img_list.first() {
      Some(img) => img.shape().to_vec(),
      None => return Err(PreprocError::invalid_input("cannot batch an empty image list")),
    };
    for (i, img) in img_list.iter().enumerate().skip(1) {
      if img.shape() != first_shape.as_slice() {
        return Err(PreprocError::ShapeMismatch{
          index:    i,
          expected: first_shape,
          actual:   img.shape().to_vec(),
        });
      }
    }
    let views: Vec<_> = img_list.iter().map(|img| img.view()).collect();
    Ok(ndarray::stack(Axis(0), &views)?)
  }

  fn preprocess_an_image(&self, idx: usize, img_path: &Path) -> Result<Array3<f32>> {
    let img_array = load_image(img_path, self.config.target_size)?;
    let img_array = preprocess_input(img_array);
    match self.transform {
      None => Ok(img_array),
      Some(ref transform) => {
        let mut rng = StdRng::seed_from_u64(self.base_seed.wrapping_add(idx as u64));
        Ok(transform.random_transform(img_array, &mut rng))
      }
    }
  }
}
