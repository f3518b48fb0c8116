// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/mean.rs - 正确舍入的算术平均
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

//! 区间两端是闭合的，平均值差一个 ulp 就会换层。
//! 这里先用 Shewchuk 部分和精确累加，再把商修正到与精确均值最近的 f64（偶数优先）。

use std::cmp::Ordering;

/// 互不重叠的部分和，按绝对值递增，总和等于所有输入的精确和
#[derive(Debug, Clone, Default)]
struct ExactSum {
  partials: Vec<f64>,
}

impl ExactSum {
  fn add(&mut self, mut x: f64) {
    let mut kept = 0;
    for j in 0..self.partials.len() {
      let mut y = self.partials[j];
      if x.abs() < y.abs() {
        std::mem::swap(&mut x, &mut y);
      }
      let hi = x + y;
      let lo = y - (hi - x);
      if lo != 0.0 {
        self.partials[kept] = lo;
        kept += 1;
      }
      x = hi;
    }
    self.partials.truncate(kept);
    self.partials.push(x);
  }

  /// 加上 -(x * n)，乘积用 FMA 拆成两个 f64 精确表示
  fn sub_product(&mut self, x: f64, n: f64) {
    let a = x * n;
    let b = x.mul_add(n, -a);
    self.add(-a);
    self.add(-b);
  }

  /// 精确和的符号：最大的非零部分和决定
  fn sign(&self) -> Ordering {
    self
      .partials
      .iter()
      .rev()
      .find(|p| **p != 0.0)
      .map_or(Ordering::Equal, |p| p.total_cmp(&0.0))
  }

  fn approx(&self) -> f64 {
    self.partials.iter().sum()
  }
}

fn is_even(x: f64) -> bool {
  x.to_bits() & 1 == 0
}

/// 与 Python `statistics.mean` 一致的平均值：精确均值舍入到最近的 f64
///
/// 空输入返回 0.0。
pub fn correctly_rounded_mean(values: &[f64]) -> f64 {
  if values.is_empty() {
    return 0.0;
  }
  let n = values.len() as f64;
  let mut sum = ExactSum::default();
  for &value in values {
    sum.add(value);
  }

  let mut q = sum.approx() / n;
  if !q.is_finite() {
    return q;
  }

  // sign(S - (q + h) * n)
  let compare = |q: f64, h: f64| {
    let mut residual = sum.clone();
    residual.sub_product(q, n);
    residual.sub_product(h, n);
    residual.sign()
  };

  loop {
    let up = q.next_up();
    let down = q.next_down();
    let half_up = (up - q) / 2.0;
    let half_down = (q - down) / 2.0;

    match compare(q, half_up) {
      Ordering::Greater => {
        q = up;
        continue;
      }
      Ordering::Equal => return if is_even(q) { q } else { up },
      Ordering::Less => {}
    }
    match compare(q, -half_down) {
      Ordering::Less => {
        q = down;
        continue;
      }
      Ordering::Equal => return if is_even(q) { q } else { down },
      Ordering::Greater => {}
    }
    return q;
  }
}
