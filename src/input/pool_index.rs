// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/pool_index.rs - 未标注图像池索引
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
  collections::HashMap,
  path::{Path, PathBuf},
};

use tracing::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{InputError, check_scheme, ensure_directory},
  url_to_path,
};

/// 可接受的图像扩展名，靠前者优先
pub const EXTENSION_PRIORITY: [&str; 2] = ["jpg", "png"];

fn extension_rank(path: &Path) -> Option<usize> {
  let ext = path.extension()?.to_string_lossy().to_lowercase();
  EXTENSION_PRIORITY.iter().position(|candidate| *candidate == ext)
}

/// 同一 stem 出现多个文件时决定保留哪一个
///
/// 扩展名优先级高者胜出；优先级相同时保留已有的（遍历顺序靠前的）。
pub fn resolve_priority<'a>(existing: &'a Path, candidate: &'a Path) -> &'a Path {
  match (extension_rank(existing), extension_rank(candidate)) {
    (Some(old), Some(new)) if new < old => candidate,
    (None, Some(_)) => candidate,
    _ => existing,
  }
}

/// stem（小写）到图像路径的映射，递归扫描得到
#[derive(Debug, Clone, Default)]
pub struct PoolIndex {
  root: PathBuf,
  images: HashMap<String, PathBuf>,
}

impl FromUrlWithScheme for PoolIndex {
  const SCHEME: &'static str = "pool";
}

impl FromUrl for PoolIndex {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    check_scheme(url, Self::SCHEME)?;
    Self::scan(url_to_path(url))
  }
}

impl PoolIndex {
  pub fn scan(root: impl Into<PathBuf>) -> Result<Self, InputError> {
    let root = root.into();
    ensure_directory(&root)?;

    let mut images: HashMap<String, PathBuf> = HashMap::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
      let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
          warn!("扫描图像池出错: {}", e);
          continue;
        }
      };
      if !entry.file_type().is_file() || extension_rank(entry.path()).is_none() {
        continue;
      }
      let Some(stem) = entry.path().file_stem() else {
        continue;
      };
      let stem = stem.to_string_lossy().to_lowercase();
      let path = entry.into_path();

      match images.get_mut(&stem) {
        Some(existing) => {
          if resolve_priority(existing, &path) == path.as_path() {
            debug!("stem '{}' 冲突，改用 {}", stem, path.display());
            *existing = path;
          } else {
            debug!("stem '{}' 冲突，忽略 {}", stem, path.display());
          }
        }
        None => {
          images.insert(stem, path);
        }
      }
    }

    info!("图像池 {}: {} 张图像", root.display(), images.len());
    Ok(Self { root, images })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn get(&self, stem: &str) -> Option<&Path> {
    self.images.get(&stem.to_lowercase()).map(PathBuf::as_path)
  }

  pub fn len(&self) -> usize {
    self.images.len()
  }

  pub fn is_empty(&self) -> bool {
    self.images.is_empty()
  }
}

impl FromIterator<PathBuf> for PoolIndex {
  /// 不访问文件系统，直接按给定路径建立索引
  fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
    let mut images: HashMap<String, PathBuf> = HashMap::new();
    for path in iter {
      if extension_rank(&path).is_none() {
        continue;
      }
      let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_lowercase()) else {
        continue;
      };
      match images.get_mut(&stem) {
        Some(existing) => {
          if resolve_priority(existing, &path) == path.as_path() {
            *existing = path;
          }
        }
        None => {
          images.insert(stem, path);
        }
      }
    }
    Self {
      root: PathBuf::new(),
      images,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn jpg_beats_png() {
    let jpg = Path::new("pool/a.jpg");
    let png = Path::new("other/a.png");
    assert_eq!(resolve_priority(png, jpg), jpg);
    assert_eq!(resolve_priority(jpg, png), jpg);
  }

  #[test]
  fn equal_priority_keeps_first() {
    let first = Path::new("x/a.jpg");
    let second = Path::new("y/a.JPG");
    assert_eq!(resolve_priority(first, second), first);
  }

  #[test]
  fn scan_is_recursive_and_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("batch_01/scans");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(nested.join("Page_001.PNG"), b"png").unwrap();
    std::fs::write(dir.path().join("page_001.jpg"), b"jpg").unwrap();
    std::fs::write(dir.path().join("page_002.png"), b"png").unwrap();
    std::fs::write(dir.path().join("page_003.tif"), b"tif").unwrap();

    let index = PoolIndex::scan(dir.path()).unwrap();
    assert_eq!(index.root(), dir.path());
    assert_eq!(index.len(), 2);
    assert_eq!(index.get("PAGE_001"), Some(dir.path().join("page_001.jpg").as_path()));
    assert_eq!(index.get("page_002"), Some(dir.path().join("page_002.png").as_path()));
    assert_eq!(index.get("page_003"), None);
  }

  #[test]
  fn missing_pool_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
      PoolIndex::scan(dir.path().join("pool_newspaper")),
      Err(InputError::MissingDirectory(_))
    ));
  }

  #[test]
  fn index_from_paths() {
    let index: PoolIndex = ["a.png", "a.jpg", "b.bmp"]
      .into_iter()
      .map(PathBuf::from)
      .collect();
    assert_eq!(index.len(), 1);
    assert_eq!(index.get("a"), Some(Path::new("a.jpg")));
  }
}
