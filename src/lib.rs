// 该文件是 Shanan （山南西风） 项目的一部分。
// src/lib.rs - 库主文件
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

//! 主动学习样本筛选：根据检测置信度挑选最值得人工标注的图像。

pub mod config;
pub mod input;
pub mod model;
pub mod output;
pub mod selector;
pub mod task;

pub use config::{ConfigError, SelectConfig};
pub use selector::{Selected, Selection, Tiers};
pub use task::{SelectReport, SelectTask, Task};

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 从 URL 中取出已解码的文件系统路径
pub fn url_to_path(url: &url::Url) -> std::path::PathBuf {
  let raw = url.path();
  let decoded = urlencoding::decode(raw)
    .map(|s| s.into_owned())
    .unwrap_or_else(|_| raw.to_string());
  std::path::PathBuf::from(decoded)
}

/// 将命令行参数解析为 URL；若不含方案则视为路径并补上默认方案
pub fn parse_location(value: &str, default_scheme: &str) -> Result<url::Url, url::ParseError> {
  match url::Url::parse(value) {
    // 单字母方案多为 Windows 盘符
    Ok(url) if url.scheme().len() > 1 => Ok(url),
    _ => {
      let path = std::path::Path::new(value);
      let absolute = if path.is_absolute() {
        path.to_path_buf()
      } else {
        std::env::current_dir()
          .map(|dir| dir.join(path))
          .unwrap_or_else(|_| path.to_path_buf())
      };
      let encoded = absolute
        .to_string_lossy()
        .split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/");
      url::Url::parse(&format!("{}://{}", default_scheme, encoded))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_path_is_percent_decoded() {
    let url = url::Url::parse("folder:///tmp/to%20annotate").unwrap();
    assert_eq!(url_to_path(&url), std::path::PathBuf::from("/tmp/to annotate"));
  }

  #[test]
  fn bare_path_gets_default_scheme() {
    let url = parse_location("/data/pool images", "pool").unwrap();
    assert_eq!(url.scheme(), "pool");
    assert_eq!(url_to_path(&url), std::path::PathBuf::from("/data/pool images"));
  }

  #[test]
  fn explicit_scheme_is_kept() {
    let url = parse_location("record:///tmp/selection.json", "folder").unwrap();
    assert_eq!(url.scheme(), "record");
    assert_eq!(url_to_path(&url), std::path::PathBuf::from("/tmp/selection.json"));
  }
}
