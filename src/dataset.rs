//! Reader for Flickr8k-style caption token files.
//!
//! Each line is `<image file>#<caption no>\t<caption>`, for example
//! `1000268201_693b08cb0e.jpg#0\tA child in a pink dress .`

use crate::error::{PreprocError, Result};

use csv::{ReaderBuilder};
use serde::{Deserialize};

use std::collections::{HashMap};
use std::fs::{File};
use std::io::{BufReader, Read};
use std::path::{Path};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptionRecord {
  pub image_file:   String,
  pub caption_no:   u32,
  pub caption:      String,
}

#[derive(Deserialize)]
struct TokenLine {
  token_id: String,
  caption:  String,
}

impl From<TokenLine> for CaptionRecord {
  fn from(line: TokenLine) -> CaptionRecord {
    let (image_file, caption_no) = match line.token_id.rsplit_once('#') {
      Some((file, no)) => match no.parse() {
        Ok(no) => (file.to_string(), no),
        Err(_) => (line.token_id.clone(), 0),
      },
      None => (line.token_id.clone(), 0),
    };
    CaptionRecord{
      image_file:   image_file,
      caption_no:   caption_no,
      caption:      line.caption.trim().to_string(),
    }
  }
}

fn read_records<R: Read>(reader: R) -> Result<Vec<CaptionRecord>> {
  let mut reader = ReaderBuilder::new()
    .delimiter(b'\t')
    .has_headers(false)
    .quoting(false)
    .from_reader(reader);
  let mut records = vec![];
  for line in reader.deserialize() {
    let line: TokenLine = line?;
    records.push(CaptionRecord::from(line));
  }
  Ok(records)
}

/// Reads every caption in `path`, in file order.
pub fn read_caption_file<P: AsRef<Path>>(path: P) -> Result<Vec<CaptionRecord>> {
  let path = path.as_ref();
  let file = File::open(path).map_err(|e| PreprocError::Io{path: path.to_path_buf(), source: e})?;
  read_records(BufReader::new(file))
}

/// Groups captions by image, keeping images in order of first appearance.
pub fn group_by_image(records: &[CaptionRecord]) -> Vec<(String, Vec<String>)> {
  let mut groups: Vec<(String, Vec<String>)> = vec![];
  let mut positions: HashMap<&str, usize> = HashMap::new();
  for record in records.iter() {
    let pos = *positions.entry(record.image_file.as_str()).or_insert_with(|| {
      groups.push((record.image_file.clone(), vec![]));
      groups.len() - 1
    });
    groups[pos].1.push(record.caption.clone());
  }
  groups
}

#[cfg(test)]
mod tests {
  use super::*;

  const TOKENS: &str = "\
1000268201_693b08cb0e.jpg#0\tA child in a pink dress is climbing up a set of stairs .
1000268201_693b08cb0e.jpg#1\tA girl going into a \"wooden\" building .
1001773457_577c3a7d70.jpg#0\tA black dog and a spotted dog are fighting
1000268201_693b08cb0e.jpg#2\tA little girl climbing into a wooden playhouse .
";

  #[test]
  fn parses_token_lines() {
    let records = read_records(TOKENS.as_bytes()).unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].image_file, "1000268201_693b08cb0e.jpg");
    assert_eq!(records[0].caption_no, 0);
    assert_eq!(records[1].caption_no, 1);
    assert_eq!(records[1].caption, "A girl going into a \"wooden\" building .");
    assert_eq!(records[2].caption, "A black dog and a spotted dog are fighting");
  }

  #[test]
  fn token_without_caption_number() {
    let records = read_records("plain.jpg\tA cat\n".as_bytes()).unwrap();
    assert_eq!(records[0].image_file, "plain.jpg");
    assert_eq!(records[0].caption_no, 0);
  }

  #[test]
  fn line_without_caption_is_an_error() {
    let res = read_records("lonely.jpg#0\n".as_bytes());
    assert!(matches!(res, Err(PreprocError::Csv(_))));
  }

  #[test]
  fn groups_keep_first_appearance_order() {
    let records = read_records(TOKENS.as_bytes()).unwrap();
    let groups = group_by_image(&records);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].0, "1000268201_693b08cb0e.jpg");
    assert_eq!(groups[0].1.len(), 3);
    assert_eq!(groups[1].0, "1001773457_577c3a7d70.jpg");
  }

  #[test]
  fn reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Flickr8k.token.txt");
    std::fs::write(&path, TOKENS).unwrap();
    assert_eq!(read_caption_file(&path).unwrap().len(), 4);
    assert!(matches!(read_caption_file(dir.path().join("nope.txt")), Err(PreprocError::Io{..})));
  }
}
