// 该文件是 Shanan （山南西风） 项目的一部分。
// src/selector.rs - 基于不确定度的样本筛选
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

//! # 不确定度筛选
//!
//! 每张图像的得分是其全部检测框置信度的平均值，得分越低表示模型越不确定。
//! 筛选分三层：
//!
//! - **primary**：得分位于 `[th_lo, th_hi]`，按得分升序；
//! - **secondary**：有检测但不在区间内；只有 `(0, th_lo)` 部分用于补齐，
//!   高于 `th_hi` 的图像永远不会被选中；
//! - **zero**：没有任何检测，仅在 `include_no_det` 打开时最后补齐。
//!
//! 得分相同时按 stem 排序，保证同样的输入总得到同样的结果。

use std::{
  cmp::Ordering,
  convert::Infallible,
  path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::{debug, info};

use crate::{
  config::SelectConfig,
  input::PoolIndex,
  model::{ImageScore, Model, Tier},
};

/// 已匹配到图像池的候选
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
  pub stem: String,
  pub score: f64,
  pub image: PathBuf,
}

impl Candidate {
  fn rank_order(&self, other: &Self) -> Ordering {
    self
      .score
      .total_cmp(&other.score)
      .then_with(|| self.stem.cmp(&other.stem))
  }
}

/// 一次划分得到的三个层级，创建后不再修改
#[derive(Debug, Clone, Default)]
pub struct Tiers {
  primary: Vec<Candidate>,
  secondary: Vec<Candidate>,
  zero: Vec<Candidate>,
  unmatched: usize,
  excluded_zero: usize,
}

impl Tiers {
  /// 单次遍历完成划分，各层内部已排序
  pub fn partition<'a>(
    scores: impl IntoIterator<Item = &'a ImageScore>,
    pool: &PoolIndex,
    config: &SelectConfig,
  ) -> Self {
    let mut tiers = Tiers::default();
    for score in scores {
      let Some(image) = pool.get(&score.stem) else {
        debug!("'{}' 在图像池中没有对应图像，跳过", score.stem);
        tiers.unmatched += 1;
        continue;
      };
      let candidate = Candidate {
        stem: score.stem.clone(),
        score: score.score,
        image: image.to_path_buf(),
      };

      if score.is_no_detection() {
        if config.include_no_det {
          tiers.zero.push(candidate);
        } else {
          tiers.excluded_zero += 1;
        }
      } else if config.in_band(score.score) {
        tiers.primary.push(candidate);
      } else {
        tiers.secondary.push(candidate);
      }
    }

    for tier in [&mut tiers.primary, &mut tiers.secondary, &mut tiers.zero] {
      tier.sort_by(Candidate::rank_order);
    }
    tiers
  }

  pub fn primary(&self) -> &[Candidate] {
    &self.primary
  }

  pub fn secondary(&self) -> &[Candidate] {
    &self.secondary
  }

  pub fn zero(&self) -> &[Candidate] {
    &self.zero
  }

  /// 标签存在但图像池中找不到的数量
  pub fn unmatched(&self) -> usize {
    self.unmatched
  }

  /// 因未开启 `include_no_det` 而排除的无检测图像数量
  pub fn excluded_zero(&self) -> usize {
    self.excluded_zero
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selected {
  pub rank: usize,
  pub stem: String,
  pub score: f64,
  pub tier: Tier,
  pub image: PathBuf,
}

impl Selected {
  pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
    self.image.file_name()
  }

  pub fn image(&self) -> &Path {
    &self.image
  }
}

/// 最终的筛选结果，按选中顺序排列
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
  pub requested: usize,
  /// 各可用层级中的候选总数
  pub eligible: usize,
  pub items: Vec<Selected>,
}

impl Selection {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Selected> {
    self.items.iter()
  }

  pub fn count_tier(&self, tier: Tier) -> usize {
    self.items.iter().filter(|item| item.tier == tier).count()
  }
}

/// 依次从各层取候选直到达到 `select_n`
pub fn select(tiers: &Tiers, config: &SelectConfig) -> Selection {
  let limit = config.select_n;
  let below: Vec<&Candidate> = tiers
    .secondary
    .iter()
    .filter(|c| config.below_band(c.score))
    .collect();
  let zero: &[Candidate] = if config.include_no_det {
    &tiers.zero
  } else {
    &[]
  };

  let ordered = tiers
    .primary
    .iter()
    .map(|c| (c, Tier::Primary))
    .chain(below.iter().map(|c| (*c, Tier::Secondary)))
    .chain(zero.iter().map(|c| (c, Tier::Zero)));

  let items: Vec<Selected> = ordered
    .take(limit)
    .enumerate()
    .map(|(index, (candidate, tier))| Selected {
      rank: index + 1,
      stem: candidate.stem.clone(),
      score: candidate.score,
      tier,
      image: candidate.image.clone(),
    })
    .collect();

  let selection = Selection {
    requested: limit,
    eligible: tiers.primary.len() + below.len() + zero.len(),
    items,
  };

  info!(
    "候选: primary {} / 低于区间 {} / 无检测 {}；选中 {} (primary {}, secondary {}, zero {})",
    tiers.primary.len(),
    below.len(),
    zero.len(),
    selection.len(),
    selection.count_tier(Tier::Primary),
    selection.count_tier(Tier::Secondary),
    selection.count_tier(Tier::Zero),
  );
  selection
}

/// 以 [`Model`] 的形式提供筛选策略，便于与任务流程组合
#[derive(Debug, Clone, Copy, Default)]
pub struct UncertaintySelector {
  config: SelectConfig,
}

impl UncertaintySelector {
  pub fn new(config: SelectConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &SelectConfig {
    &self.config
  }

  pub fn partition<'a>(
    &self,
    scores: impl IntoIterator<Item = &'a ImageScore>,
    pool: &PoolIndex,
  ) -> Tiers {
    Tiers::partition(scores, pool, &self.config)
  }
}

impl Model for UncertaintySelector {
  type Input = Tiers;
  type Output = Selection;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(select(input, &self.config))
  }
}
