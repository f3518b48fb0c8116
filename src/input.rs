// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input.rs - 输入：预测标签目录与图像池索引
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

use std::path::PathBuf;

use thiserror::Error;

mod pool_index;
mod prediction_dir;

pub use self::pool_index::{EXTENSION_PRIORITY, PoolIndex, resolve_priority};
pub use self::prediction_dir::PredictionDir;

#[derive(Error, Debug)]
pub enum InputError {
  #[error("输入目录不存在: {0}")]
  MissingDirectory(PathBuf),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{found}'")]
  SchemeMismatch {
    expected: &'static str,
    found: String,
  },
}

pub(crate) fn ensure_directory(path: &std::path::Path) -> Result<(), InputError> {
  if path.is_dir() {
    Ok(())
  } else {
    Err(InputError::MissingDirectory(path.to_path_buf()))
  }
}

pub(crate) fn check_scheme(url: &url::Url, expected: &'static str) -> Result<(), InputError> {
  if url.scheme() != expected {
    tracing::error!(
      "URI scheme mismatch: expected '{}', found '{}'",
      expected,
      url.scheme()
    );
    return Err(InputError::SchemeMismatch {
      expected,
      found: url.scheme().to_string(),
    });
  }
  Ok(())
}
