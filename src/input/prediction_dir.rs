// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/prediction_dir.rs - 预测标签目录读取
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{
  collections::HashSet,
  path::{Path, PathBuf},
};

use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{InputError, check_scheme, ensure_directory},
  model::{ImageScore, parse_label_text},
  url_to_path,
};

const LABEL_EXTENSION: &str = "txt";

/// 外部检测器以 "save confidence" 模式输出的标签目录，每张图像一个 `.txt`
#[derive(Debug, Clone)]
pub struct PredictionDir {
  directory: PathBuf,
}

impl FromUrlWithScheme for PredictionDir {
  const SCHEME: &'static str = "labels";
}

impl FromUrl for PredictionDir {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    check_scheme(url, Self::SCHEME)?;
    Self::open(url_to_path(url))
  }
}

impl PredictionDir {
  pub fn open(directory: impl Into<PathBuf>) -> Result<Self, InputError> {
    let directory = directory.into();
    ensure_directory(&directory)?;
    Ok(Self { directory })
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  /// 目录下的 `*.txt` 标签文件（不递归），按文件名排序
  pub fn label_files(&self) -> Result<Vec<PathBuf>, InputError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&self.directory)? {
      let path = match entry {
        Ok(entry) => entry.path(),
        Err(e) => {
          warn!("读取目录项失败 {}: {}", self.directory.display(), e);
          continue;
        }
      };
      // 与 `*.txt` 通配一致：扩展名区分大小写，不含以 `.` 开头的隐藏文件
      let is_label = path.extension().is_some_and(|ext| ext == LABEL_EXTENSION)
        && !path
          .file_name()
          .is_some_and(|name| name.to_string_lossy().starts_with('.'));
      if is_label && path.is_file() {
        files.push(path);
      }
    }
    files.sort();
    Ok(files)
  }

  /// 逐个读取标签文件并计算平均置信度
  ///
  /// 同一 stem（不区分大小写）只保留排序后的第一个文件；
  /// 无法读取的文件记录日志后跳过。
  pub fn read_scores(&self) -> Result<Vec<ImageScore>, InputError> {
    let files = self.label_files()?;
    info!("预测标签文件: {} 个", files.len());

    let mut seen = HashSet::new();
    let mut scores = Vec::with_capacity(files.len());
    for path in files {
      let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_lowercase()) else {
        continue;
      };
      if !seen.insert(stem.clone()) {
        warn!("重复的标签 stem '{}'，忽略 {}", stem, path.display());
        continue;
      }

      let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
          warn!("读取标签文件失败 {}: {}", path.display(), e);
          continue;
        }
      };
      let text = String::from_utf8_lossy(&bytes);
      let origin = path.display().to_string();
      let result = parse_label_text(&origin, &text);
      let score = ImageScore::from_result(stem, &result);
      debug!(
        "{}: {} 个检测，平均置信度 {:.4}",
        score.stem, score.detections, score.score
      );
      scores.push(score);
    }

    Ok(scores)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("al_runs/predict_pool/labels");
    assert!(matches!(
      PredictionDir::open(&missing),
      Err(InputError::MissingDirectory(p)) if p == missing
    ));
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("pool:///tmp").unwrap();
    assert!(matches!(
      PredictionDir::from_url(&url),
      Err(InputError::SchemeMismatch { expected: "labels", .. })
    ));
  }

  #[test]
  fn reads_sorted_scores_and_skips_other_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.txt"), "").unwrap();
    std::fs::write(
      dir.path().join("a.txt"),
      "0 0.5 0.5 0.1 0.1 0.1\n1 0.5 0.5 0.1 0.1 0.3\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("c.txt"), "0 0.5 0.5 0.1 0.1 0.9\n").unwrap();
    std::fs::write(dir.path().join("notes.md"), "0 0 0 0 0 0.5\n").unwrap();
    std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

    let scores = PredictionDir::open(dir.path())
      .unwrap()
      .read_scores()
      .unwrap();
    let stems: Vec<_> = scores.iter().map(|s| s.stem.as_str()).collect();
    assert_eq!(stems, ["a", "b", "c"]);
    assert_eq!(scores[0].score, 0.2);
    assert_eq!(scores[1].score, 0.0);
    assert_eq!(scores[2].score, 0.9);
  }

  #[test]
  fn enumeration_matches_plain_txt_glob() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.txt", "B.TXT", "c.Txt", ".hidden.txt", ".txt", "d.txt.bak"] {
      std::fs::write(dir.path().join(name), "0 0 0 0 0 0.3\n").unwrap();
    }

    let prediction = PredictionDir::open(dir.path()).unwrap();
    assert_eq!(prediction.directory(), dir.path());
    let files = prediction.label_files().unwrap();
    let names: Vec<_> = files
      .iter()
      .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
      .collect();
    assert_eq!(names, ["a.txt"]);
  }

  #[test]
  fn duplicate_stems_keep_first_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Page.txt"), "0 0 0 0 0 0.3\n").unwrap();
    std::fs::write(dir.path().join("page.txt"), "0 0 0 0 0 0.9\n").unwrap();

    let scores = PredictionDir::open(dir.path())
      .unwrap()
      .read_scores()
      .unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].stem, "page");
    assert_eq!(scores[0].score, 0.3);
  }

  #[test]
  fn invalid_utf8_is_read_lossily() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = b"0 0.5 0.5 0.1 0.1 0.25\n".to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
    std::fs::write(dir.path().join("x.txt"), bytes).unwrap();

    let scores = PredictionDir::open(dir.path())
      .unwrap()
      .read_scores()
      .unwrap();
    assert_eq!(scores[0].score, 0.25);
  }
}
