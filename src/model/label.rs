// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/label.rs - 预测标签行解析
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

use tracing::debug;

use crate::model::{DetectItem, DetectResult};

/// class cx cy w h conf
pub const MIN_LABEL_FIELDS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum LabelLine {
  Detection(DetectItem),
  TooShort { fields: usize },
  BadConfidence { raw: String },
}

/// 解析一行预测结果，置信度取最后一个字段
pub fn parse_label_line(line: &str) -> LabelLine {
  let fields: Vec<&str> = line.split_whitespace().collect();
  if fields.len() < MIN_LABEL_FIELDS {
    return LabelLine::TooShort {
      fields: fields.len(),
    };
  }

  let raw = fields[fields.len() - 1];
  let score = match raw.parse::<f64>() {
    Ok(score) if score.is_finite() => score,
    _ => {
      return LabelLine::BadConfidence {
        raw: raw.to_string(),
      };
    }
  };

  let class_id = fields[0].parse::<u32>().ok();
  let bbox = {
    let mut bbox = [0f32; 4];
    let parsed = fields[1..5]
      .iter()
      .zip(bbox.iter_mut())
      .all(|(field, slot)| field.parse::<f32>().map(|v| *slot = v).is_ok());
    parsed.then_some(bbox)
  };

  LabelLine::Detection(DetectItem {
    class_id,
    bbox,
    score,
  })
}

/// 解析整份标签文本；`origin` 仅用于日志定位
pub fn parse_label_text(origin: &str, text: &str) -> DetectResult {
  text
    .lines()
    .enumerate()
    .filter_map(|(index, line)| match parse_label_line(line) {
      LabelLine::Detection(item) => Some(item),
      LabelLine::TooShort { fields } => {
        if fields > 0 {
          debug!("{}:{} 字段数不足 ({} < {})，跳过", origin, index + 1, fields, MIN_LABEL_FIELDS);
        }
        None
      }
      LabelLine::BadConfidence { raw } => {
        debug!("{}:{} 置信度无法解析: {:?}，跳过", origin, index + 1, raw);
        None
      }
    })
    .collect()
}
