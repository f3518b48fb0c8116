// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/selection_record.rs - 以 JSON 记录筛选结果
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

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::{
  FromUrl, FromUrlWithScheme,
  config::SelectConfig,
  output::{Render, RenderSummary},
  selector::{Selected, Selection},
  url_to_path,
};

#[derive(Error, Debug)]
pub enum SelectionRecordError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct SelectionDocument<'a> {
  generated_at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  config: Option<&'a SelectConfig>,
  requested: usize,
  eligible: usize,
  selected: usize,
  items: &'a [Selected],
}

/// 不复制图像，只把筛选清单写入 JSON 文件，供标注人员或后续脚本使用
#[derive(Debug, Clone)]
pub struct SelectionRecordOutput {
  path: PathBuf,
  config: Option<SelectConfig>,
}

impl FromUrlWithScheme for SelectionRecordOutput {
  const SCHEME: &'static str = "record";
}

impl FromUrl for SelectionRecordOutput {
  type Error = SelectionRecordError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SelectionRecordError::SchemeMismatch);
    }
    Ok(Self::new(url_to_path(uri)))
  }
}

impl SelectionRecordOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      config: None,
    }
  }

  /// 在记录中附带本次使用的参数
  pub fn with_config(mut self, config: SelectConfig) -> Self {
    self.config = Some(config);
    self
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Render<Selection> for SelectionRecordOutput {
  type Error = SelectionRecordError;

  fn render_result(&self, result: &Selection) -> Result<RenderSummary, Self::Error> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let document = SelectionDocument {
      generated_at: Utc::now(),
      config: self.config.as_ref(),
      requested: result.requested,
      eligible: result.eligible,
      selected: result.len(),
      items: &result.items,
    };
    let json = serde_json::to_string_pretty(&document)?;
    std::fs::write(&self.path, json)?;

    info!("筛选记录已写入: {}", self.path.display());
    Ok(RenderSummary::default())
  }
}
