// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model.rs - 检测记录与不确定度得分
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

use serde::Serialize;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 外部检测器输出的一条预测框
///
/// 仅置信度是必需的；类别与几何字段无法解析时为 `None`。
#[derive(Debug, Clone, PartialEq)]
pub struct DetectItem {
  pub class_id: Option<u32>,
  pub bbox: Option<[f32; 4]>, // [cx, cy, w, h]，归一化
  pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  /// 平均置信度（正确舍入）；没有任何检测时为 0.0
  pub fn mean_score(&self) -> f64 {
    let scores: Vec<f64> = self.items.iter().map(|item| item.score).collect();
    correctly_rounded_mean(&scores)
  }
}

impl FromIterator<DetectItem> for DetectResult {
  fn from_iter<I: IntoIterator<Item = DetectItem>>(iter: I) -> Self {
    Self {
      items: iter.into_iter().collect(),
    }
  }
}

/// 单张图像的不确定度得分，`stem` 已转为小写
#[derive(Debug, Clone, PartialEq)]
pub struct ImageScore {
  pub stem: String,
  pub score: f64,
  pub detections: usize,
}

impl ImageScore {
  pub fn from_result(stem: impl Into<String>, result: &DetectResult) -> Self {
    Self {
      stem: stem.into().to_lowercase(),
      score: result.mean_score(),
      detections: result.len(),
    }
  }

  pub fn is_no_detection(&self) -> bool {
    self.score == 0.0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
  /// 位于目标区间 [th_lo, th_hi]
  Primary,
  /// 有检测但不在目标区间
  Secondary,
  /// 无检测
  Zero,
}

impl std::fmt::Display for Tier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Tier::Primary => "primary",
      Tier::Secondary => "secondary",
      Tier::Zero => "zero",
    };
    f.write_str(name)
  }
}

mod label;
mod mean;
pub use self::mean::correctly_rounded_mean;
pub use self::label::{LabelLine, MIN_LABEL_FIELDS, parse_label_line, parse_label_text};

#[cfg(test)]
mod tests {
  use super::*;

  fn item(score: f64) -> DetectItem {
    DetectItem {
      class_id: Some(0),
      bbox: Some([0.5, 0.5, 0.1, 0.1]),
      score,
    }
  }

  #[test]
  fn mean_of_confidences() {
    let result: DetectResult = [item(0.1), item(0.3)].into_iter().collect();
    let score = ImageScore::from_result("A", &result);
    assert!((score.score - 0.2).abs() < 1e-12);
    assert_eq!(score.stem, "a");
    assert_eq!(score.detections, 2);
  }

  #[test]
  fn repeated_edge_confidences_stay_in_band() {
    let config = crate::config::SelectConfig::default();
    for n in 1..=32 {
      let low: DetectResult = std::iter::repeat_n(item(0.2), n).collect();
      let high: DetectResult = std::iter::repeat_n(item(0.4), n).collect();
      assert!(config.in_band(low.mean_score()), "{} x 0.2", n);
      assert!(config.in_band(high.mean_score()), "{} x 0.4", n);
    }
  }

  #[test]
  fn empty_result_scores_zero() {
    let score = ImageScore::from_result("b", &DetectResult::default());
    assert_eq!(score.score, 0.0);
    assert!(score.is_no_detection());
  }
}
