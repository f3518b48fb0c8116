// 该文件是 Shanan （山南西风） 项目的一部分。
// src/config.rs - 筛选参数配置
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
use thiserror::Error;

pub const DEFAULT_SELECT_N: usize = 40;
pub const DEFAULT_TH_LO: f64 = 0.2;
pub const DEFAULT_TH_HI: f64 = 0.4;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
  #[error("阈值 {name} 无效: {value}（应位于 0.0 - 1.0 之间）")]
  ThresholdOutOfRange { name: &'static str, value: f64 },
  #[error("置信区间无效: TH_LO={lo} 大于 TH_HI={hi}")]
  InvertedBand { lo: f64, hi: f64 },
}

/// 筛选参数
///
/// - `select_n`：最多挑选的图像数量
/// - `th_lo` / `th_hi`：目标不确定区间 [th_lo, th_hi]，两端均闭合
/// - `include_no_det`：是否允许无检测（得分为 0）的图像参与补齐
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectConfig {
  pub select_n: usize,
  pub th_lo: f64,
  pub th_hi: f64,
  pub include_no_det: bool,
}

impl Default for SelectConfig {
  fn default() -> Self {
    Self {
      select_n: DEFAULT_SELECT_N,
      th_lo: DEFAULT_TH_LO,
      th_hi: DEFAULT_TH_HI,
      include_no_det: false,
    }
  }
}

impl SelectConfig {
  pub fn with_select_n(mut self, select_n: usize) -> Self {
    self.select_n = select_n;
    self
  }

  pub fn with_band(mut self, th_lo: f64, th_hi: f64) -> Self {
    self.th_lo = th_lo;
    self.th_hi = th_hi;
    self
  }

  pub fn with_include_no_det(mut self, include_no_det: bool) -> Self {
    self.include_no_det = include_no_det;
    self
  }

  pub fn validate(self) -> Result<Self, ConfigError> {
    for (name, value) in [("TH_LO", self.th_lo), ("TH_HI", self.th_hi)] {
      if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ThresholdOutOfRange { name, value });
      }
    }
    if self.th_lo > self.th_hi {
      return Err(ConfigError::InvertedBand {
        lo: self.th_lo,
        hi: self.th_hi,
      });
    }
    Ok(self)
  }

  pub fn in_band(&self, score: f64) -> bool {
    self.th_lo <= score && score <= self.th_hi
  }

  /// 低于区间但仍有检测，用于第一轮补齐
  pub fn below_band(&self, score: f64) -> bool {
    0.0 < score && score < self.th_lo
  }
}
