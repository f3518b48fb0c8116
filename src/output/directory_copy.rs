// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/directory_copy.rs - 将选中的图像复制到待标注目录
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

use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{Render, RenderSummary},
  selector::{Selected, Selection},
  url_to_path,
};

#[derive(Error, Debug)]
pub enum DirectoryCopyError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("无法创建输出目录 {0}: {1}")]
  CreateDirectory(PathBuf, std::io::Error),
  #[error("选中图像没有文件名: {0}")]
  MissingFileName(PathBuf),
  #[error("目标与源图像是同一个文件: {0}")]
  SameFile(PathBuf),
}

/// 目标已存在且与源指向同一个文件（同一路径、符号链接或硬链接）
fn is_same_file(source: &Path, target: &Path) -> bool {
  let (Ok(source_meta), Ok(target_meta)) = (std::fs::metadata(source), std::fs::metadata(target))
  else {
    return false;
  };

  #[cfg(unix)]
  {
    use std::os::unix::fs::MetadataExt;
    if source_meta.dev() == target_meta.dev() && source_meta.ino() == target_meta.ino() {
      return true;
    }
  }
  #[cfg(not(unix))]
  let _ = (source_meta, target_meta);

  match (std::fs::canonicalize(source), std::fs::canonicalize(target)) {
    (Ok(source), Ok(target)) => source == target,
    _ => false,
  }
}

/// 输出目录；`folder:///path?dated` 会在其下按 年/月/日 建立子目录
#[derive(Debug, Clone)]
pub struct DirectoryCopyOutput {
  directory: PathBuf,
  dated: bool,
}

impl FromUrlWithScheme for DirectoryCopyOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryCopyOutput {
  type Error = DirectoryCopyError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryCopyError::SchemeMismatch);
    }

    let dated = uri.query_pairs().any(|(k, _)| k == "dated");

    Ok(DirectoryCopyOutput {
      directory: url_to_path(uri),
      dated,
    })
  }
}

impl DirectoryCopyOutput {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory: directory.into(),
      dated: false,
    }
  }

  pub fn with_dated(mut self, dated: bool) -> Self {
    self.dated = dated;
    self
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  fn target_directory(&self) -> PathBuf {
    if !self.dated {
      return self.directory.clone();
    }
    let now = Local::now();
    self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()))
  }

  fn copy_one(&self, directory: &Path, item: &Selected) -> Result<PathBuf, String> {
    let name = item
      .file_name()
      .ok_or_else(|| DirectoryCopyError::MissingFileName(item.image().to_path_buf()).to_string())?;
    let target = directory.join(name);
    // 输出目录与图像池重叠时，直接复制会把源文件截断为 0 字节
    if is_same_file(item.image(), &target) {
      return Err(DirectoryCopyError::SameFile(target).to_string());
    }
    std::fs::copy(item.image(), &target).map_err(|e| e.to_string())?;

    // 保留源文件的修改时间，失败不影响复制结果
    let preserved = std::fs::metadata(item.image())
      .and_then(|meta| meta.modified())
      .and_then(|mtime| std::fs::File::options().write(true).open(&target)?.set_modified(mtime));
    if let Err(e) = preserved {
      debug!("无法保留修改时间 {}: {}", target.display(), e);
    }
    Ok(target)
  }
}

impl Render<Selection> for DirectoryCopyOutput {
  type Error = DirectoryCopyError;

  fn render_result(&self, result: &Selection) -> Result<RenderSummary, Self::Error> {
    let directory = self.target_directory();
    std::fs::create_dir_all(&directory)
      .map_err(|e| DirectoryCopyError::CreateDirectory(directory.clone(), e))?;

    let mut summary = RenderSummary::default();
    for item in result.iter() {
      match self.copy_one(&directory, item) {
        Ok(target) => {
          debug!(
            "#{} {} ({:.4}, {}) -> {}",
            item.rank,
            item.stem,
            item.score,
            item.tier,
            target.display()
          );
          summary.copied += 1;
        }
        Err(e) => {
          warn!("复制失败 {}: {}", item.image().display(), e);
          summary.failed += 1;
        }
      }
    }

    info!(
      "已复制 {} / {} 张图像到 {}",
      summary.copied,
      result.len(),
      directory.display()
    );
    Ok(summary)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Tier;

  fn selected(rank: usize, image: PathBuf) -> Selected {
    Selected {
      rank,
      stem: image
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default(),
      score: 0.3,
      tier: Tier::Primary,
      image,
    }
  }

  #[test]
  fn copies_and_creates_directory() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let image = src.path().join("nested/page_1.jpg");
    std::fs::create_dir_all(image.parent().unwrap()).unwrap();
    std::fs::write(&image, b"jpeg bytes").unwrap();

    let selection = Selection {
      requested: 1,
      eligible: 1,
      items: vec![selected(1, image.clone())],
    };
    let target = out.path().join("to_annotate_active");
    let summary = DirectoryCopyOutput::new(&target)
      .render_result(&selection)
      .unwrap();

    assert_eq!(summary, RenderSummary { copied: 1, failed: 0 });
    assert_eq!(std::fs::read(target.join("page_1.jpg")).unwrap(), b"jpeg bytes");
    assert!(image.exists());
  }

  #[test]
  fn failed_copy_does_not_abort_batch() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let good = src.path().join("good.png");
    std::fs::write(&good, b"png").unwrap();

    let selection = Selection {
      requested: 2,
      eligible: 2,
      items: vec![
        selected(1, src.path().join("vanished.jpg")),
        selected(2, good),
      ],
    };
    let summary = DirectoryCopyOutput::new(out.path())
      .render_result(&selection)
      .unwrap();

    assert_eq!(summary, RenderSummary { copied: 1, failed: 1 });
    assert!(out.path().join("good.png").exists());
    assert!(!out.path().join("vanished.jpg").exists());
  }

  #[test]
  fn copy_onto_itself_keeps_the_source() {
    let pool = tempfile::tempdir().unwrap();
    let image = pool.path().join("page_7.jpg");
    let other = pool.path().join("sub/page_8.png");
    std::fs::write(&image, b"original jpeg").unwrap();
    std::fs::create_dir_all(other.parent().unwrap()).unwrap();
    std::fs::write(&other, b"png").unwrap();

    let selection = Selection {
      requested: 2,
      eligible: 2,
      items: vec![selected(1, image.clone()), selected(2, other.clone())],
    };
    let summary = DirectoryCopyOutput::new(pool.path())
      .render_result(&selection)
      .unwrap();

    assert_eq!(summary, RenderSummary { copied: 1, failed: 1 });
    assert_eq!(std::fs::read(&image).unwrap(), b"original jpeg");
    assert_eq!(std::fs::read(pool.path().join("page_8.png")).unwrap(), b"png");
    assert_eq!(std::fs::read(&other).unwrap(), b"png");
  }

  #[cfg(unix)]
  #[test]
  fn copy_onto_hard_link_keeps_the_source() {
    let pool = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let image = pool.path().join("page_9.jpg");
    std::fs::write(&image, b"linked").unwrap();
    std::fs::hard_link(&image, out.path().join("page_9.jpg")).unwrap();

    let selection = Selection {
      requested: 1,
      eligible: 1,
      items: vec![selected(1, image.clone())],
    };
    let summary = DirectoryCopyOutput::new(out.path())
      .render_result(&selection)
      .unwrap();

    assert_eq!(summary, RenderSummary { copied: 0, failed: 1 });
    assert_eq!(std::fs::read(&image).unwrap(), b"linked");
  }

  #[test]
  fn dated_query_builds_subdirectories() {
    let url = url::Url::parse("folder:///tmp/out?dated").unwrap();
    let output = DirectoryCopyOutput::from_url(&url).unwrap();
    let target = output.target_directory();
    assert_eq!(output.directory(), Path::new("/tmp/out"));
    assert_eq!(target.components().count(), Path::new("/tmp/out").components().count() + 3);
  }
}
