// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output.rs - 筛选结果输出
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

use thiserror::Error;
use url::Url;

use crate::FromUrl;
#[cfg(any(feature = "directory_copy", feature = "selection_record"))]
use crate::FromUrlWithScheme;
use crate::selector::Selection;

pub trait Render<Output>: Sized {
  type Error;
  fn render_result(&self, result: &Output) -> Result<RenderSummary, Self::Error>;
}

/// 一次输出的统计：成功复制与失败的图像数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
  pub copied: usize,
  pub failed: usize,
}

#[cfg(feature = "directory_copy")]
mod directory_copy;
#[cfg(feature = "directory_copy")]
pub use self::directory_copy::{DirectoryCopyError, DirectoryCopyOutput};

#[cfg(feature = "selection_record")]
mod selection_record;
#[cfg(feature = "selection_record")]
pub use self::selection_record::{SelectionRecordError, SelectionRecordOutput};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "directory_copy")]
  #[error("目录复制输出错误: {0}")]
  DirectoryCopyError(#[from] DirectoryCopyError),
  #[cfg(feature = "selection_record")]
  #[error("筛选记录输出错误: {0}")]
  SelectionRecordError(#[from] SelectionRecordError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

#[derive(Debug)]
pub enum OutputWrapper {
  #[cfg(feature = "directory_copy")]
  DirectoryCopyOutput(DirectoryCopyOutput),
  #[cfg(feature = "selection_record")]
  SelectionRecordOutput(SelectionRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "directory_copy")]
      DirectoryCopyOutput::SCHEME => {
        let output = DirectoryCopyOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryCopyOutput(output))
      }
      #[cfg(feature = "selection_record")]
      SelectionRecordOutput::SCHEME => {
        let output = SelectionRecordOutput::from_url(url)?;
        Ok(OutputWrapper::SelectionRecordOutput(output))
      }
      other => Err(OutputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl OutputWrapper {
  /// 让筛选记录附带本次参数，其它输出不受影响
  #[allow(unused_variables)]
  pub fn with_config(self, config: crate::config::SelectConfig) -> Self {
    match self {
      #[cfg(feature = "selection_record")]
      OutputWrapper::SelectionRecordOutput(output) => {
        OutputWrapper::SelectionRecordOutput(output.with_config(config))
      }
      #[allow(unreachable_patterns)]
      other => other,
    }
  }
}

impl std::fmt::Display for OutputWrapper {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      #[cfg(feature = "directory_copy")]
      OutputWrapper::DirectoryCopyOutput(output) => {
        write!(f, "复制到目录 {}", output.directory().display())
      }
      #[cfg(feature = "selection_record")]
      OutputWrapper::SelectionRecordOutput(output) => {
        write!(f, "记录到文件 {}", output.path().display())
      }
      #[allow(unreachable_patterns)]
      _ => f.write_str("无输出"),
    }
  }
}

impl Render<Selection> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, result: &Selection) -> Result<RenderSummary, Self::Error> {
    match self {
      #[cfg(feature = "directory_copy")]
      OutputWrapper::DirectoryCopyOutput(output) => {
        output.render_result(result).map_err(OutputError::from)
      }
      #[cfg(feature = "selection_record")]
      OutputWrapper::SelectionRecordOutput(output) => {
        output.render_result(result).map_err(OutputError::from)
      }
      #[allow(unreachable_patterns)]
      _ => Ok(RenderSummary::default()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = Url::parse("rtsp://camera/stream").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Err(OutputError::SchemeMismatch(s)) if s == "rtsp"
    ));
  }

  #[cfg(feature = "directory_copy")]
  #[test]
  fn folder_scheme_selects_directory_copy() {
    let url = Url::parse("folder:///tmp/to_annotate_active").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Ok(OutputWrapper::DirectoryCopyOutput(_))
    ));
  }

  #[cfg(feature = "selection_record")]
  #[test]
  fn record_scheme_selects_selection_record() {
    let url = Url::parse("record:///tmp/selection.json").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Ok(OutputWrapper::SelectionRecordOutput(_))
    ));
  }
}
