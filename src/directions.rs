// Block averages and dominant directions (spec 4.E). Two substitutable
// implementations, grounded one-to-one on the two source files:
// `astc_averages_and_directions.cpp` (heuristic: sum of positive-residual
// octants) and `astc_averages_and_directions_eigenvectors.cpp` (covariance
// eigenvectors with a power-iteration fallback).
//
// The macro-expanded 2/3/4-component family from the source is unified
// here into one generic function per implementation, parameterized over a
// fixed-size channel-index array, per SPEC_FULL.md 4.E / spec.md 9.

use crate::block::{ErrorWeightBlock, ImageBlock};
use crate::math::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use crate::tables::PartitionInfo;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectionMethod {
  Heuristic,
  Eigenvector,
}

fn comp(t: Vec4, c: usize) -> f32 {
  match c {
    0 => t.x,
    1 => t.y,
    2 => t.z,
    _ => t.w,
  }
}

fn gather<const K: usize>(t: Vec4, channels: &[usize; K]) -> [f32; K] {
  let mut out = [0.0f32; K];
  for (i, &c) in channels.iter().enumerate() {
    out[i] = comp(t, c);
  }
  out
}

/// Weighted mean over a partition, restricted to `channels`, per spec 4.E
/// step 1: `mu_p = sum(w_i * x_i) / max(sum(w_i), 1e-7)`.
fn weighted_mean<const K: usize>(
  texels: &[Vec4],
  texel_indices: &[u16],
  weight_of: impl Fn(usize) -> f32,
  channels: &[usize; K],
) -> [f32; K] {
  let mut base_sum = [0.0f32; K];
  let mut partition_weight = 0.0f32;
  for &iwt in texel_indices {
    let iwt = iwt as usize;
    let w = weight_of(iwt);
    let datum = gather(texels[iwt], channels);
    partition_weight += w;
    for k in 0..K {
      base_sum[k] += datum[k] * w;
    }
  }
  let inv = 1.0 / partition_weight.max(1e-7);
  let mut mean = [0.0f32; K];
  for k in 0..K {
    mean[k] = base_sum[k] * inv;
  }
  mean
}

/// Heuristic direction (spec 4.E step 2): accumulate, per axis `k` in the
/// subset, the sum of positive-residual texels projected on that axis; pick
/// the axis with largest squared length. `all_ones_fallback` reproduces the
/// source's asymmetry: only the 3-selected-of-4 variant falls back to the
/// all-ones direction when every axis sum is negligible (spec 4.E / 9).
fn heuristic_direction<const K: usize>(
  texels: &[Vec4],
  texel_indices: &[u16],
  weight_of: impl Fn(usize) -> f32,
  channels: &[usize; K],
  mean: &[f32; K],
  all_ones_fallback: bool,
) -> [f32; K] {
  let mut sums = [[0.0f32; K]; K];
  for &iwt in texel_indices {
    let iwt = iwt as usize;
    let w = weight_of(iwt);
    let datum = gather(texels[iwt], channels);
    let mut residual = [0.0f32; K];
    for k in 0..K {
      residual[k] = (datum[k] - mean[k]) * w;
    }
    for axis in 0..K {
      if residual[axis] > 0.0 {
        for k in 0..K {
          sums[axis][k] += residual[k];
        }
      }
    }
  }

  let mut best_axis = 0;
  let mut best_len = sums[0].iter().map(|v| v * v).sum::<f32>();
  for axis in 1..K {
    let len = sums[axis].iter().map(|v| v * v).sum::<f32>();
    if len > best_len {
      best_len = len;
      best_axis = axis;
    }
  }

  if all_ones_fallback && best_len < 1e-18 {
    [1.0f32; K]
  } else {
    sums[best_axis]
  }
}

/// Covariance matrix accumulation (spec 4.E step 2'): `sum(w_i x_i x_i^T)`
/// in scale-premultiplied coordinates, minus the outer product of the
/// scaled mean.
fn covariance<const K: usize>(
  texels: &[Vec4],
  texel_indices: &[u16],
  weight_of: impl Fn(usize) -> f32,
  channels: &[usize; K],
  color_scale: &[f32; K],
) -> ([f32; K], [[f32; K]; K]) {
  let mut partition_weight = 0.0f32;
  let mut sum = [0.0f32; K];
  let mut sum_sq = [[0.0f32; K]; K];
  for &iwt in texel_indices {
    let iwt = iwt as usize;
    let w = weight_of(iwt);
    let raw = gather(texels[iwt], channels);
    let mut scaled = [0.0f32; K];
    for k in 0..K {
      scaled[k] = raw[k] * color_scale[k];
    }
    partition_weight += w;
    for k in 0..K {
      sum[k] += scaled[k] * w;
      for j in 0..K {
        sum_sq[k][j] += scaled[k] * scaled[j] * w;
      }
    }
  }
  let inv_w = 1.0 / partition_weight.max(1e-7);
  let mut mean = [0.0f32; K];
  for k in 0..K {
    mean[k] = sum[k] * inv_w;
  }
  let mut cov = [[0.0f32; K]; K];
  for k in 0..K {
    for j in 0..K {
      cov[k][j] = sum_sq[k][j] * inv_w - mean[k] * mean[j];
    }
  }
  (mean, cov)
}

fn dot_n<const K: usize>(a: &[f32; K], b: &[f32; K]) -> f32 {
  (0..K).map(|i| a[i] * b[i]).sum()
}

/// Power-iteration fallback (spec 4.E step 3'): repeatedly renormalize by
/// the mean absolute entry, square the matrix, and test the row-summed
/// candidate against the angle-fidelity threshold. 20 iterations matches
/// the source's `power_method_eigenvectorN`.
fn power_method2(m: Mat2) -> Vec2 {
  let mut p = m;
  let mut eigvc = Vec2::default();
  for _ in 0..20 {
    let sc0 = (p.rows[0].x.abs() + p.rows[0].y.abs() + p.rows[1].x.abs() + p.rows[1].y.abs()) * 0.5;
    if !(sc0 > 0.0) {
      return Vec2::splat(1.0);
    }
    let inv = 1.0 / sc0;
    let scaled = Mat2::new(p.rows[0] * inv, p.rows[1] * inv);
    p = scaled.mul(&scaled);
    eigvc = p.rows[0] + p.rows[1];
    let xform = m.transform(eigvc);
    let evd = eigvc.dot(eigvc);
    let xvd = xform.dot(xform);
    let evx = eigvc.dot(xform);
    if evx * evx > evd * xvd * 0.999 {
      return eigvc;
    }
  }
  if eigvc.l1_norm() > 1e-18 { eigvc } else { Vec2::splat(1.0) }
}

fn power_method3(m: Mat3) -> Vec3 {
  let mut p = m;
  let mut eigvc = Vec3::default();
  for _ in 0..20 {
    let sc0 = (p.rows[0].x.abs() + p.rows[0].y.abs() + p.rows[0].z.abs()
      + p.rows[1].x.abs() + p.rows[1].y.abs() + p.rows[1].z.abs()
      + p.rows[2].x.abs() + p.rows[2].y.abs() + p.rows[2].z.abs()) / 3.0;
    if !(sc0 > 0.0) {
      return Vec3::splat(1.0);
    }
    let inv = 1.0 / sc0;
    let scaled = Mat3::new(p.rows[0] * inv, p.rows[1] * inv, p.rows[2] * inv);
    p = scaled.mul(&scaled);
    eigvc = p.rows[0] + p.rows[1] + p.rows[2];
    let xform = m.transform(eigvc);
    let evd = eigvc.dot(eigvc);
    let xvd = xform.dot(xform);
    let evx = eigvc.dot(xform);
    if evx * evx > evd * xvd * 0.999 {
      return eigvc;
    }
  }
  let testval = eigvc.x.abs() + eigvc.y.abs() + eigvc.z.abs();
  if testval > 1e-18 { eigvc } else { Vec3::splat(1.0) }
}

fn power_method4(m: Mat4) -> Vec4 {
  let mut p = m;
  let mut eigvc = Vec4::default();
  for _ in 0..20 {
    let sum_abs = |r: Vec4| r.x.abs() + r.y.abs() + r.z.abs() + r.w.abs();
    let sc0 = (sum_abs(p.rows[0]) + sum_abs(p.rows[1]) + sum_abs(p.rows[2]) + sum_abs(p.rows[3])) * 0.25;
    if !(sc0 > 0.0) {
      return Vec4::splat(1.0);
    }
    let inv = 1.0 / sc0;
    let scaled = Mat4::new(p.rows[0] * inv, p.rows[1] * inv, p.rows[2] * inv, p.rows[3] * inv);
    p = scaled.mul(&scaled);
    eigvc = p.rows[0] + p.rows[1] + p.rows[2] + p.rows[3];
    let xform = m.transform(eigvc);
    let evd = eigvc.dot(eigvc);
    let xvd = xform.dot(xform);
    let evx = eigvc.dot(xform);
    if evx * evx > evd * xvd * 0.999 {
      return eigvc;
    }
  }
  let testval = eigvc.x.abs() + eigvc.y.abs() + eigvc.z.abs() + eigvc.w.abs();
  if testval > 1e-18 { eigvc } else { Vec4::splat(1.0) }
}

/// `get_eigenvector2/3/4`: pick the eigenvalue of largest magnitude, take
/// its structured eigenvector, verify it against the angle-fidelity test,
/// and fall back to the power method on failure (spec 4.E step 3').
fn get_eigenvector2(m: Mat2) -> Vec2 {
  let e = m.eigenvalues();
  let maxval = [e.x, e.y].into_iter().fold(0.0f32, |acc, v| if v.abs() > acc.abs() { v } else { acc });
  if maxval > 0.0 {
    let eigvc = m.eigenvector(maxval);
    let xform = m.transform(eigvc);
    let evd = eigvc.dot(eigvc);
    let xvd = xform.dot(xform);
    let evx = eigvc.dot(xform);
    if evx * evx > evd * xvd * 0.999 {
      return eigvc;
    }
  }
  power_method2(m)
}

fn get_eigenvector3(m: Mat3) -> Vec3 {
  let e = m.eigenvalues();
  let maxval = [e.x, e.y, e.z].into_iter().fold(0.0f32, |acc, v| if !v.is_nan() && v.abs() > acc.abs() { v } else { acc });
  if maxval > 0.0 {
    let eigvc = m.eigenvector(maxval);
    let xform = m.transform(eigvc);
    let evd = eigvc.dot(eigvc);
    let xvd = xform.dot(xform);
    let evx = eigvc.dot(xform);
    if evx * evx > evd * xvd * 0.999 {
      return eigvc;
    }
  }
  power_method3(m)
}

fn get_eigenvector4(m: Mat4) -> Vec4 {
  let e = m.eigenvalues();
  let maxval = [e.x, e.y, e.z, e.w].into_iter().fold(0.0f32, |acc, v| if !v.is_nan() && v.abs() > acc.abs() { v } else { acc });
  if maxval > 0.0 {
    let eigvc = m.eigenvector(maxval);
    let xform = m.transform(eigvc);
    let evd = eigvc.dot(eigvc);
    let xvd = xform.dot(xform);
    let evx = eigvc.dot(xform);
    if evx * evx > evd * xvd * 0.999 {
      return eigvc;
    }
  }
  power_method4(m)
}

/// Per-partition direction outputs for a 4-component (RGBA) block: the full
/// direction plus the four reduced 3-component directions obtained by
/// dropping one channel at a time (spec 4.E).
#[derive(Clone, Copy, Debug, Default)]
pub struct Directions4 {
  pub rgba: Vec4,
  pub gba: Vec3,
  pub rba: Vec3,
  pub rga: Vec3,
  pub rgb: Vec3,
}

pub fn average_and_directions_rgba(
  method: DirectionMethod,
  partition: &PartitionInfo,
  block: &ImageBlock,
  ewb: &ErrorWeightBlock,
  color_scale: &[Vec4],
) -> (Vec<Vec4>, Vec<Directions4>) {
  let mut averages = Vec::with_capacity(partition.partition_count);
  let mut dirs = Vec::with_capacity(partition.partition_count);

  for p in 0..partition.partition_count {
    let idx = &partition.texels_of_partition[p];
    let weight_of = |i: usize| ewb.texel_weight(i);
    let channels = [0usize, 1, 2, 3];
    let scale = color_scale[p];
    let scale_arr = [scale.x, scale.y, scale.z, scale.w];

    let mean = weighted_mean(&block.texels, idx, weight_of, &channels);
    averages.push(Vec4::new(mean[0] * scale.x, mean[1] * scale.y, mean[2] * scale.z, mean[3] * scale.w));

    let full = match method {
      DirectionMethod::Heuristic => {
        let d = heuristic_direction(&block.texels, idx, weight_of, &channels, &mean, false);
        Vec4::new(d[0], d[1], d[2], d[3])
      }
      DirectionMethod::Eigenvector => {
        let (_, cov) = covariance(&block.texels, idx, weight_of, &channels, &scale_arr);
        let m = Mat4::new(
          Vec4::new(cov[0][0], cov[0][1], cov[0][2], cov[0][3]),
          Vec4::new(cov[1][0], cov[1][1], cov[1][2], cov[1][3]),
          Vec4::new(cov[2][0], cov[2][1], cov[2][2], cov[2][3]),
          Vec4::new(cov[3][0], cov[3][1], cov[3][2], cov[3][3]),
        );
        get_eigenvector4(m)
      }
    };

    let reduced = |ch: [usize; 3]| -> Vec3 {
      match method {
        DirectionMethod::Heuristic => {
          let mean3 = weighted_mean(&block.texels, idx, weight_of, &ch);
          let d = heuristic_direction(&block.texels, idx, weight_of, &ch, &mean3, true);
          Vec3::new(d[0], d[1], d[2])
        }
        DirectionMethod::Eigenvector => {
          let scale3 = [scale_arr[ch[0]], scale_arr[ch[1]], scale_arr[ch[2]]];
          let (_, cov) = covariance(&block.texels, idx, weight_of, &ch, &scale3);
          let m = Mat3::new(
            Vec3::new(cov[0][0], cov[0][1], cov[0][2]),
            Vec3::new(cov[1][0], cov[1][1], cov[1][2]),
            Vec3::new(cov[2][0], cov[2][1], cov[2][2]),
          );
          get_eigenvector3(m)
        }
      }
    };

    dirs.push(Directions4 {
      rgba: full,
      gba: reduced([1, 2, 3]),
      rba: reduced([0, 2, 3]),
      rga: reduced([0, 1, 3]),
      rgb: reduced([0, 1, 2]),
    });
  }

  (averages, dirs)
}

/// Per-partition direction outputs for a 3-component (RGB, no alpha) block:
/// the full 3-component direction plus the three reduced 2-component
/// directions (spec 4.E).
#[derive(Clone, Copy, Debug, Default)]
pub struct Directions3 {
  pub rgb: Vec3,
  pub rg: Vec2,
  pub rb: Vec2,
  pub gb: Vec2,
}

pub fn average_and_directions_rgb(
  method: DirectionMethod,
  partition: &PartitionInfo,
  block: &ImageBlock,
  ewb: &ErrorWeightBlock,
  color_scale: &[Vec4],
) -> (Vec<Vec3>, Vec<Directions3>) {
  let mut averages = Vec::with_capacity(partition.partition_count);
  let mut dirs = Vec::with_capacity(partition.partition_count);

  for p in 0..partition.partition_count {
    let idx = &partition.texels_of_partition[p];
    let weight_of = |i: usize| ewb.texel_weight_rgb(i);
    let channels = [0usize, 1, 2];
    let scale = color_scale[p];
    let scale_arr = [scale.x, scale.y, scale.z];

    let mean = weighted_mean(&block.texels, idx, weight_of, &channels);
    averages.push(Vec3::new(mean[0] * scale.x, mean[1] * scale.y, mean[2] * scale.z));

    let full = match method {
      DirectionMethod::Heuristic => {
        let d = heuristic_direction(&block.texels, idx, weight_of, &channels, &mean, false);
        Vec3::new(d[0], d[1], d[2])
      }
      DirectionMethod::Eigenvector => {
        let (_, cov) = covariance(&block.texels, idx, weight_of, &channels, &scale_arr);
        let m = Mat3::new(
          Vec3::new(cov[0][0], cov[0][1], cov[0][2]),
          Vec3::new(cov[1][0], cov[1][1], cov[1][2]),
          Vec3::new(cov[2][0], cov[2][1], cov[2][2]),
        );
        get_eigenvector3(m)
      }
    };

    let reduced = |ch: [usize; 2]| -> Vec2 {
      match method {
        DirectionMethod::Heuristic => {
          let mean2 = weighted_mean(&block.texels, idx, weight_of, &ch);
          let d = heuristic_direction(&block.texels, idx, weight_of, &ch, &mean2, false);
          Vec2::new(d[0], d[1])
        }
        DirectionMethod::Eigenvector => {
          let scale2 = [scale_arr[ch[0]], scale_arr[ch[1]]];
          let (_, cov) = covariance(&block.texels, idx, weight_of, &ch, &scale2);
          let m = Mat2::new(Vec2::new(cov[0][0], cov[0][1]), Vec2::new(cov[1][0], cov[1][1]));
          get_eigenvector2(m)
        }
      }
    };

    dirs.push(Directions3 { rgb: full, rg: reduced([0, 1]), rb: reduced([0, 2]), gb: reduced([1, 2]) });
  }

  (averages, dirs)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::ErrorWeightBlock;
  use crate::tables::Footprint;

  fn make_block(footprint: Footprint, texels: Vec<Vec4>) -> ImageBlock {
    ImageBlock::new(footprint, texels)
  }

  #[test]
  fn heuristic_and_eigenvector_agree_on_sign_for_a_clear_gradient() {
    let fp = Footprint::new_2d(4, 4);
    let texels: Vec<Vec4> = (0..16)
      .map(|i| {
        let v = i as f32 / 15.0;
        Vec4::new(v, v, v, 1.0)
      })
      .collect();
    let block = make_block(fp, texels);
    let ewb = ErrorWeightBlock::new(vec![Vec4::splat(1.0); 16]);
    let partition = crate::tables::partition_table(fp, 1, 0).clone();
    let scale = vec![Vec4::splat(1.0)];

    let (_avg_h, dirs_h) = average_and_directions_rgba(DirectionMethod::Heuristic, &partition, &block, &ewb, &scale);
    let (_avg_e, dirs_e) = average_and_directions_rgba(DirectionMethod::Eigenvector, &partition, &block, &ewb, &scale);

    // Both should find the direction dominated by the r=g=b gradient: x,y,z
    // components roughly equal and much larger in magnitude than noise.
    let h = dirs_h[0].rgba;
    let e = dirs_e[0].rgba;
    assert!(h.x.abs() > 1e-6);
    assert!(e.x.abs() > 1e-6);
    assert!((h.x - h.y).abs() < 1e-3);
    assert!((e.x - e.y).abs() < 1e-3);
  }

  #[test]
  fn constant_block_falls_back_to_all_ones_for_reduced_3_selected() {
    // Every residual is zero, so all four S_k are ~0: the 3-selected-of-4
    // reduced direction must fall back to all-ones (spec 4.E / 9).
    let fp = Footprint::new_2d(4, 4);
    let texels = vec![Vec4::new(0.3, 0.3, 0.3, 1.0); 16];
    let block = make_block(fp, texels);
    let ewb = ErrorWeightBlock::new(vec![Vec4::splat(1.0); 16]);
    let partition = crate::tables::partition_table(fp, 1, 0).clone();
    let scale = vec![Vec4::splat(1.0)];

    let (_avg, dirs) = average_and_directions_rgba(DirectionMethod::Heuristic, &partition, &block, &ewb, &scale);
    assert_eq!(dirs[0].rgb, Vec3::splat(1.0));
  }
}
