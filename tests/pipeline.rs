use caption_preproc::{
  CaptionConfig, CaptionPreprocessor, ImageConfig, ImagePreprocessor, group_by_image,
  read_caption_file,
};

use image::{Rgb, RgbImage};
use ndarray::{s};

use std::fs;

#[test]
fn token_file_and_images_to_training_batch() {
  let dir = tempfile::tempdir().unwrap();
  fs::write(dir.path().join("captions.txt"), "\
cat.jpg#0\tA cat sits on a mat .
cat.jpg#1\tA grey cat .
dog.png#0\tA dog runs .
").unwrap();
  RgbImage::from_pixel(40, 30, Rgb([200, 10, 10])).save(dir.path().join("cat.jpg")).unwrap();
  RgbImage::from_pixel(25, 50, Rgb([10, 200, 10])).save(dir.path().join("dog.png")).unwrap();

  let records = read_caption_file(dir.path().join("captions.txt")).unwrap();
  let groups = group_by_image(&records);
  assert_eq!(groups.len(), 2);

  let mut captions = CaptionPreprocessor::new(CaptionConfig::default()).unwrap();
  captions.fit_on_captions(records.iter().map(|r| r.caption.as_str())).unwrap();
  // a cat sits on mat eos grey dog runs
  assert_eq!(captions.vocab_size(), 9);

  let images = ImagePreprocessor::new(ImageConfig::default()).unwrap();
  let paths: Vec<_> = groups.iter().map(|(file, _)| dir.path().join(file)).collect();
  let arrays = images.preprocess_images(&paths).collect::<Result<Vec<_>, _>>().unwrap();
  let img_batch = images.preprocess_batch(&arrays).unwrap();
  assert_eq!(img_batch.shape(), &[2, 299, 299, 3]);
  assert!(img_batch.iter().all(|&x| x >= -1.0 && x <= 1.0));

  let first: Vec<&str> = groups.iter().map(|(_, c)| c[0].as_str()).collect();
  let encoded = captions.encode_captions(&first).unwrap();
  assert_eq!(encoded[0].len(), 7);
  assert_eq!(encoded[1].len(), 4);

  let batch = captions.preprocess_batch(&encoded).unwrap();
  assert_eq!(batch.captions_input.shape(), &[2, 7]);
  assert_eq!(batch.captions_output.shape(), &[2, 8, 9]);
  // "a dog runs eos" pads from timestep 4 on.
  for t in 4 .. 8 {
    assert_eq!(batch.captions_output.slice(s![1, t, ..]).sum(), 0);
  }
  assert_eq!(batch.captions_input[[1, 0]], 0);
  assert_eq!(batch.captions_output[[1, 0, 0]], 1);
}
