// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 筛选任务流程
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

use std::fmt::Display;

use tracing::{error, info, warn};

use crate::{
  input::{PoolIndex, PredictionDir},
  model::Model,
  output::Render,
  selector::{Selection, UncertaintySelector},
};

pub trait Task<I, M, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error>;
}

/// 一次筛选的输入：预测标签目录与图像池
pub struct SelectInput {
  pub predictions: PredictionDir,
  pub pool: PoolIndex,
}

/// 任务结束时的汇总，即使部分条目失败也会完整给出
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectReport {
  pub requested: usize,
  pub eligible: usize,
  pub selected: usize,
  pub copied: usize,
  pub failed: usize,
  pub label_files: usize,
  pub pool_images: usize,
  pub unmatched: usize,
  pub excluded_zero: usize,
  /// 整体失败的输出（例如无法创建目录），每项为描述信息
  pub output_errors: Vec<String>,
  pub selection: Selection,
}

impl SelectReport {
  pub fn is_complete(&self) -> bool {
    self.output_errors.is_empty()
  }
}

#[derive(Debug, Default)]
pub struct SelectTask;

impl<'a, O> Task<SelectInput, UncertaintySelector, &'a [O]> for SelectTask
where
  O: Render<Selection> + Display,
  O::Error: Display,
{
  type Output = SelectReport;
  type Error = anyhow::Error;

  fn run_task(
    self,
    input: SelectInput,
    model: UncertaintySelector,
    output: &'a [O],
  ) -> Result<Self::Output, Self::Error> {
    info!("开始筛选任务...");
    let config = model.config();
    info!(
      "参数: SELECT_N={} TH_LO={} TH_HI={} INCLUDE_NO_DET={}",
      config.select_n, config.th_lo, config.th_hi, config.include_no_det
    );

    info!(
      "预测目录: {}，图像池: {}",
      input.predictions.directory().display(),
      input.pool.root().display()
    );
    let scores = input.predictions.read_scores()?;
    let tiers = model.partition(&scores, &input.pool);
    if tiers.unmatched() > 0 {
      warn!("{} 个预测文件在图像池中没有对应图像", tiers.unmatched());
    }
    let selection = model.infer(&tiers)?;

    let mut report = SelectReport {
      requested: selection.requested,
      eligible: selection.eligible,
      selected: selection.len(),
      label_files: scores.len(),
      pool_images: input.pool.len(),
      unmatched: tiers.unmatched(),
      excluded_zero: tiers.excluded_zero(),
      ..Default::default()
    };

    for sink in output {
      info!("输出: {}", sink);
      match sink.render_result(&selection) {
        Ok(summary) => {
          report.copied += summary.copied;
          report.failed += summary.failed;
        }
        Err(e) => {
          error!("输出失败 ({}): {}", sink, e);
          report.output_errors.push(format!("{}: {}", sink, e));
        }
      }
    }

    report.selection = selection;
    info!("任务完成");
    Ok(report)
  }
}
