// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/select_uncertain.rs - 主动学习样本筛选程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use shanan_select::{
  FromUrl, FromUrlWithScheme, SelectConfig,
  input::{PoolIndex, PredictionDir},
  output::OutputWrapper,
  parse_location,
  selector::UncertaintySelector,
  task::{SelectInput, SelectTask, Task},
};

fn labels_location(value: &str) -> Result<Url, url::ParseError> {
  parse_location(value, PredictionDir::SCHEME)
}

fn pool_location(value: &str) -> Result<Url, url::ParseError> {
  parse_location(value, PoolIndex::SCHEME)
}

fn output_location(value: &str) -> Result<Url, url::ParseError> {
  parse_location(value, "folder")
}

/// 根据预测置信度挑选最值得标注的图像
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 预测标签目录（labels:// 或普通路径）
  #[arg(long, env = "PRED_DIR", value_name = "LABELS", value_parser = labels_location)]
  pub predictions: Url,
  /// 未标注图像池（pool:// 或普通路径，递归扫描）
  #[arg(long, env = "IMG_SRC", value_name = "POOL", value_parser = pool_location)]
  pub pool: Url,
  /// 输出，可重复：folder:///dir[?dated] 复制图像，record:///file.json 记录清单
  #[arg(long, env = "OUT_DIR", value_name = "OUTPUT", value_parser = output_location, required = true)]
  pub output: Vec<Url>,
  /// 最多挑选的图像数量
  #[arg(long, env = "SELECT_N", default_value_t = shanan_select::config::DEFAULT_SELECT_N)]
  pub select_n: usize,
  /// 不确定区间下界
  #[arg(long, env = "TH_LO", default_value_t = shanan_select::config::DEFAULT_TH_LO)]
  pub th_lo: f64,
  /// 不确定区间上界
  #[arg(long, env = "TH_HI", default_value_t = shanan_select::config::DEFAULT_TH_HI)]
  pub th_hi: f64,
  /// 允许无检测（得分为 0）的图像参与补齐
  #[arg(long, env = "INCLUDE_NO_DET")]
  pub include_no_det: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  info!("预测标签: {}", args.predictions);
  info!("图像池: {}", args.pool);

  let config = SelectConfig::default()
    .with_select_n(args.select_n)
    .with_band(args.th_lo, args.th_hi)
    .with_include_no_det(args.include_no_det)
    .validate()?;

  let predictions = PredictionDir::from_url(&args.predictions)
    .context("预测标签目录不可用，请确认已使用 save-conf 模式完成推理")?;
  let pool = PoolIndex::from_url(&args.pool).context("图像池不可用")?;
  let outputs = args
    .output
    .iter()
    .map(|url| OutputWrapper::from_url(url).map(|output| output.with_config(config)))
    .collect::<Result<Vec<_>, _>>()?;

  let report = SelectTask.run_task(
    SelectInput { predictions, pool },
    UncertaintySelector::new(config),
    outputs.as_slice(),
  )?;

  info!(
    "汇总: 区间 {}-{}，选中 {} / 请求 {}（可用候选 {}）",
    config.th_lo, config.th_hi, report.selected, report.requested, report.eligible
  );
  info!(
    "标签文件 {}，图像池 {}，未匹配 {}，排除无检测 {}",
    report.label_files, report.pool_images, report.unmatched, report.excluded_zero
  );
  info!("已复制 {} 张，失败 {} 张", report.copied, report.failed);
  if report.selected < report.requested {
    warn!("候选不足，仅选中 {} 张", report.selected);
  }

  if !report.is_complete() {
    anyhow::bail!("部分输出失败: {}", report.output_errors.join("; "));
  }

  Ok(())
}
