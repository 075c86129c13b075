// Partition search (spec 4.G): for a fixed partition count, score every
// candidate partitioning under three hypotheses (uncorrelated endpoints,
// same-chroma endpoints, one channel separated onto its own weight plane)
// and return the best few candidates of each kind.
//
// Grounded on `astc_find_best_partitioning.cpp`: `compute_partition_error_color_weightings`,
// `compute_alpha_minmax`/`compute_rgb_minmax`, and the two (uses_alpha /
// !uses_alpha) bodies of `find_best_partitionings`. The four per-channel
// "separate" hypotheses are unified into one loop over channel index,
// matching the generic channel-subset shape already used in
// `directions.rs`/`error_eval.rs`.

use crate::block::{ColorLine, ColorLine2, ColorLine3, ErrorWeightBlock, ImageBlock, ProcessedLine, ProcessedLine2, ProcessedLine3};
use crate::directions::{average_and_directions_rgb, average_and_directions_rgba, DirectionMethod};
use crate::error_eval::{compute_error_squared_2, compute_error_squared_3, compute_error_squared_rgba};
use crate::math::{Vec2, Vec3, Vec4};
use crate::tables::{kmeans_partition_ordering, partition_table, Footprint, PartitionInfo, PARTITION_SEED_COUNT};

/// Width of the seed field inside a dual-plane partitioning index: the seed
/// space is `[0, PARTITION_SEED_COUNT)` = `[0, 1024)`, i.e. 10 bits
/// (`astc_find_best_partitioning.cpp`'s `PARTITION_BITS`).
pub const PARTITION_BITS: u32 = 10;

/// Sentinel for a partitioning whose partition count doesn't match what was
/// requested (spec 4.G, "invalid" partitioning).
pub const ERROR_INVALID: f32 = 1e35;
/// Sentinel for a partitioning beyond the caller's search-effort budget.
/// Always smaller than [`ERROR_INVALID`], per spec 4.G.
pub const ERROR_OVER_LIMIT: f32 = 1e34;
/// Sentinel written over an already-selected candidate's error so it's
/// never picked again by a later `candidates_to_return` pass.
pub const ERROR_ALREADY_SELECTED: f32 = 1e30;

fn weight_imprecision_estim(texel_count: usize) -> f32 {
  if texel_count <= 20 {
    0.03
  } else if texel_count <= 31 {
    0.04
  } else if texel_count <= 41 {
    0.05
  } else {
    0.055
  }
}

fn inv_scale(s: f32) -> f32 {
  1.0 / s.max(1e-7)
}

/// `compute_partition_error_color_weightings`: average error weight per
/// partition (floor of 1e-12 to avoid division by zero), and its
/// component-wise square root used as the "color scale factor" throughout
/// 4.E-4.G.
fn partition_error_color_weightings(partition: &PartitionInfo, ewb: &ErrorWeightBlock) -> (Vec<Vec4>, Vec<Vec4>) {
  let mut error_weightings = vec![Vec4::splat(1e-12); partition.partition_count];
  for (i, &p) in partition.partition_of_texel.iter().enumerate() {
    let p = p as usize;
    error_weightings[p] = error_weightings[p] + ewb.error_weights[i];
  }
  for (p, tpp) in partition.texels_per_partition.iter().enumerate().take(partition.partition_count) {
    let inv = 1.0 / (*tpp as f32);
    error_weightings[p] = error_weightings[p] * inv;
  }
  let color_scalefactors = error_weightings
    .iter()
    .map(|w| Vec4::new(w.x.sqrt(), w.y.sqrt(), w.z.sqrt(), w.w.sqrt()))
    .collect();
  (error_weightings, color_scalefactors)
}

/// Per-partition min/max of a single channel, restricted to texels whose
/// total (rgba) error weight exceeds 1e-10; degenerates to `(0, 1e-10)` if
/// every texel in a partition was excluded (`compute_alpha_minmax`/
/// `compute_rgb_minmax`).
fn channel_minmax(partition: &PartitionInfo, block: &ImageBlock, ewb: &ErrorWeightBlock, channel: usize) -> (Vec<f32>, Vec<f32>) {
  let mut lo = vec![1e38f32; partition.partition_count];
  let mut hi = vec![-1e38f32; partition.partition_count];
  for (i, &p) in partition.partition_of_texel.iter().enumerate() {
    if ewb.texel_weight(i) <= 1e-10 {
      continue;
    }
    let p = p as usize;
    let t = block.texels[i];
    let v = match channel {
      0 => t.x,
      1 => t.y,
      2 => t.z,
      _ => t.w,
    };
    lo[p] = lo[p].min(v);
    hi[p] = hi[p].max(v);
  }
  for p in 0..partition.partition_count {
    if lo[p] >= hi[p] {
      lo[p] = 0.0;
      hi[p] = 1e-10;
    }
  }
  (lo, hi)
}

fn normalize_or_ones4(v: Vec4) -> Vec4 {
  if v.dot(v) == 0.0 {
    Vec4::splat(1.0).normalize()
  } else {
    v.normalize()
  }
}
fn normalize_or_ones3(v: Vec3) -> Vec3 {
  if v.dot(v) == 0.0 {
    Vec3::splat(1.0).normalize()
  } else {
    v.normalize()
  }
}
fn normalize_or_ones2(v: Vec2) -> Vec2 {
  if v.dot(v) == 0.0 {
    Vec2::splat(1.0).normalize()
  } else {
    v.normalize()
  }
}

/// Best few partitionings of a given partition count, under each of the
/// three hypotheses. Entries are partition-table seeds (`[0, 1024)`),
/// except `dual_weight_planes`, which additionally carries the separated
/// channel in the high bits (spec 4.G).
#[derive(Clone, Debug, Default)]
pub struct PartitionSearchResult {
  pub uncorrelated: Vec<u16>,
  pub samechroma: Vec<u16>,
  pub dual_weight_planes: Vec<u32>,
}

/// `find_best_partitionings`: score every candidate seed (in k-means
/// quality order) for `partition_count` partitions, then return the
/// `candidates_to_return` best of each hypothesis. `partition_search_limit`
/// caps how many of the ordered seeds are actually scored; anything beyond
/// that is filled with [`ERROR_OVER_LIMIT`] so it can still be selected if
/// nothing better exists but is always dominated by a scored seed.
pub fn find_best_partitionings(
  method: DirectionMethod,
  footprint: Footprint,
  partition_count: usize,
  block: &ImageBlock,
  ewb: &ErrorWeightBlock,
  partition_search_limit: usize,
  candidates_to_return: usize,
) -> PartitionSearchResult {
  let texel_count = footprint.texel_count();
  let estim = weight_imprecision_estim(texel_count);
  let estim_sq = estim * estim;

  let sequence = kmeans_partition_ordering(footprint, partition_count);
  let uses_alpha = block.uses_alpha();

  let mut uncorr_errors = vec![0.0f32; PARTITION_SEED_COUNT];
  let mut samechroma_errors = vec![0.0f32; PARTITION_SEED_COUNT];
  // separate_errors[channel * PARTITION_SEED_COUNT + i]; channel order is
  // r,g,b,a when uses_alpha, r,g,b otherwise.
  let num_channels = if uses_alpha { 4 } else { 3 };
  let mut separate_errors = vec![0.0f32; num_channels * PARTITION_SEED_COUNT];

  let mut defacto_search_limit = PARTITION_SEED_COUNT - 1;

  for (i, &seed) in sequence.iter().enumerate() {
    let pinfo = partition_table(footprint, partition_count, seed);
    if pinfo.partition_count < partition_count {
      uncorr_errors[i] = ERROR_INVALID;
      samechroma_errors[i] = ERROR_INVALID;
      for c in 0..num_channels {
        separate_errors[c * PARTITION_SEED_COUNT + i] = ERROR_INVALID;
      }
      continue;
    }
    if i >= partition_search_limit {
      defacto_search_limit = i;
      uncorr_errors[i] = ERROR_OVER_LIMIT;
      samechroma_errors[i] = ERROR_OVER_LIMIT;
      for c in 0..num_channels {
        separate_errors[c * PARTITION_SEED_COUNT + i] = ERROR_OVER_LIMIT;
      }
      break;
    }

    let (error_weightings, color_scale) = partition_error_color_weightings(pinfo, ewb);
    let inv_color_scale: Vec<Vec4> = color_scale.iter().map(|s| Vec4::new(inv_scale(s.x), inv_scale(s.y), inv_scale(s.z), inv_scale(s.w))).collect();

    if uses_alpha {
      let (averages, dirs) = average_and_directions_rgba(method, pinfo, block, ewb, &color_scale);

      let mut uncorr_lines = Vec::with_capacity(partition_count);
      let mut samechroma_lines = Vec::with_capacity(partition_count);
      let mut proc_uncorr = Vec::with_capacity(partition_count);
      let mut proc_samechroma = Vec::with_capacity(partition_count);
      // Reduced 3-component lines, one Vec per dropped channel (0=r,1=g,2=b,3=a).
      let mut sep_lines: [Vec<ColorLine3>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
      let mut proc_sep: [Vec<ProcessedLine3>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];

      for j in 0..partition_count {
        let a = averages[j];
        let uncorr_b = normalize_or_ones4(dirs[j].rgba);
        let line = ColorLine { a, b: uncorr_b };
        proc_uncorr.push(ProcessedLine::new(line, color_scale[j], inv_color_scale[j]));
        uncorr_lines.push(line);

        let samechroma_b = normalize_or_ones4(a);
        let scline = ColorLine { a: Vec4::splat(0.0), b: samechroma_b };
        proc_samechroma.push(ProcessedLine::new(scline, color_scale[j], inv_color_scale[j]));
        samechroma_lines.push(scline);

        let reduced = [
          (dirs[j].gba, Vec3::new(a.y, a.z, a.w), Vec3::new(color_scale[j].y, color_scale[j].z, color_scale[j].w), Vec3::new(inv_color_scale[j].y, inv_color_scale[j].z, inv_color_scale[j].w)),
          (dirs[j].rba, Vec3::new(a.x, a.z, a.w), Vec3::new(color_scale[j].x, color_scale[j].z, color_scale[j].w), Vec3::new(inv_color_scale[j].x, inv_color_scale[j].z, inv_color_scale[j].w)),
          (dirs[j].rga, Vec3::new(a.x, a.y, a.w), Vec3::new(color_scale[j].x, color_scale[j].y, color_scale[j].w), Vec3::new(inv_color_scale[j].x, inv_color_scale[j].y, inv_color_scale[j].w)),
          (dirs[j].rgb, Vec3::new(a.x, a.y, a.z), Vec3::new(color_scale[j].x, color_scale[j].y, color_scale[j].z), Vec3::new(inv_color_scale[j].x, inv_color_scale[j].y, inv_color_scale[j].z)),
        ];
        for (c, (dir, avg3, scale3, invscale3)) in reduced.into_iter().enumerate() {
          let b = normalize_or_ones3(dir);
          let line3 = ColorLine3 { a: avg3, b };
          proc_sep[c].push(ProcessedLine3::new(line3, scale3, invscale3));
          sep_lines[c].push(line3);
        }
      }

      let mut uncorr_lens = vec![0.0f32; partition_count];
      let mut samechroma_lens = vec![0.0f32; partition_count];
      let mut sep_lens: [Vec<f32>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
      for c in 0..4 {
        sep_lens[c] = vec![0.0f32; partition_count];
      }

      let mut uncorr_error = compute_error_squared_rgba(pinfo, block, ewb, &proc_uncorr, &mut uncorr_lens);
      let mut samechroma_error = compute_error_squared_rgba(pinfo, block, ewb, &proc_samechroma, &mut samechroma_lens);
      let channel_sets: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];
      let mut sep_error = [0.0f32; 4];
      for c in 0..4 {
        sep_error[c] = compute_error_squared_3(pinfo, block, ewb, &proc_sep[c], channel_sets[c], &mut sep_lens[c]);
      }

      let (red_min, red_max) = channel_minmax(pinfo, block, ewb, 0);
      let (green_min, green_max) = channel_minmax(pinfo, block, ewb, 1);
      let (blue_min, blue_max) = channel_minmax(pinfo, block, ewb, 2);
      let (alpha_min, alpha_max) = channel_minmax(pinfo, block, ewb, 3);
      let minmax = [(red_min, red_max), (green_min, green_max), (blue_min, blue_max), (alpha_min, alpha_max)];

      for j in 0..partition_count {
        let tpp = pinfo.texels_per_partition[j] as f32;
        let ics = inv_color_scale[j];
        let ew = error_weightings[j] * (tpp * estim_sq);
        let ew_arr = [ew.x, ew.y, ew.z, ew.w];

        let uncorr_v = (uncorr_lines[j].b * uncorr_lens[j]).mul_elementwise(ics);
        let samechroma_v = (samechroma_lines[j].b * samechroma_lens[j]).mul_elementwise(ics);
        uncorr_error += (uncorr_v.mul_elementwise(uncorr_v)).dot(ew);
        samechroma_error += (samechroma_v.mul_elementwise(samechroma_v)).dot(ew);

        let ics_arr = [Vec3::new(ics.y, ics.z, ics.w), Vec3::new(ics.x, ics.z, ics.w), Vec3::new(ics.x, ics.y, ics.w), Vec3::new(ics.x, ics.y, ics.z)];
        let ew3_arr = [Vec3::new(ew.y, ew.z, ew.w), Vec3::new(ew.x, ew.z, ew.w), Vec3::new(ew.x, ew.y, ew.w), Vec3::new(ew.x, ew.y, ew.z)];
        for c in 0..4 {
          let v = (sep_lines[c][j].b * sep_lens[c][j]).mul_elementwise(ics_arr[c]);
          sep_error[c] += (v.mul_elementwise(v)).dot(ew3_arr[c]);
          let (lo, hi) = (&minmax[c].0, &minmax[c].1);
          let scalar = hi[j] - lo[j];
          sep_error[c] += scalar * scalar * ew_arr[c];
        }
      }

      uncorr_errors[i] = uncorr_error;
      samechroma_errors[i] = samechroma_error;
      for c in 0..4 {
        separate_errors[c * PARTITION_SEED_COUNT + i] = sep_error[c];
      }
    } else {
      let color_scale3: Vec<Vec4> = color_scale.clone();
      let (averages, dirs) = average_and_directions_rgb(method, pinfo, block, ewb, &color_scale3);

      let mut uncorr_lines = Vec::with_capacity(partition_count);
      let mut samechroma_lines = Vec::with_capacity(partition_count);
      let mut proc_uncorr = Vec::with_capacity(partition_count);
      let mut proc_samechroma = Vec::with_capacity(partition_count);
      let mut sep_lines: [Vec<ColorLine2>; 3] = [Vec::new(), Vec::new(), Vec::new()];
      let mut proc_sep: [Vec<ProcessedLine2>; 3] = [Vec::new(), Vec::new(), Vec::new()];

      for j in 0..partition_count {
        let a = averages[j];
        let scale3 = Vec3::new(color_scale[j].x, color_scale[j].y, color_scale[j].z);
        let invscale3 = Vec3::new(inv_color_scale[j].x, inv_color_scale[j].y, inv_color_scale[j].z);

        let uncorr_b = normalize_or_ones3(dirs[j].rgb);
        let line = ColorLine3 { a, b: uncorr_b };
        proc_uncorr.push(ProcessedLine3::new(line, scale3, invscale3));
        uncorr_lines.push(line);

        let samechroma_b = normalize_or_ones3(a);
        let scline = ColorLine3 { a: Vec3::splat(0.0), b: samechroma_b };
        proc_samechroma.push(ProcessedLine3::new(scline, scale3, invscale3));
        samechroma_lines.push(scline);

        let reduced = [
          (dirs[j].gb, Vec2::new(a.y, a.z), Vec2::new(scale3.y, scale3.z), Vec2::new(invscale3.y, invscale3.z)),
          (dirs[j].rb, Vec2::new(a.x, a.z), Vec2::new(scale3.x, scale3.z), Vec2::new(invscale3.x, invscale3.z)),
          (dirs[j].rg, Vec2::new(a.x, a.y), Vec2::new(scale3.x, scale3.y), Vec2::new(invscale3.x, invscale3.y)),
        ];
        for (c, (dir, avg2, scale2, invscale2)) in reduced.into_iter().enumerate() {
          let b = normalize_or_ones2(dir);
          let line2 = ColorLine2 { a: avg2, b };
          proc_sep[c].push(ProcessedLine2::new(line2, scale2, invscale2));
          sep_lines[c].push(line2);
        }
      }

      let mut uncorr_lens = vec![0.0f32; partition_count];
      let mut samechroma_lens = vec![0.0f32; partition_count];
      let mut sep_lens: [Vec<f32>; 3] = [Vec::new(), Vec::new(), Vec::new()];
      for c in 0..3 {
        sep_lens[c] = vec![0.0f32; partition_count];
      }

      let mut uncorr_error = compute_error_squared_3(pinfo, block, ewb, &proc_uncorr, [0, 1, 2], &mut uncorr_lens);
      let mut samechroma_error = compute_error_squared_3(pinfo, block, ewb, &proc_samechroma, [0, 1, 2], &mut samechroma_lens);
      let channel_sets: [[usize; 2]; 3] = [[1, 2], [0, 2], [0, 1]];
      let mut sep_error = [0.0f32; 3];
      for c in 0..3 {
        sep_error[c] = compute_error_squared_2(pinfo, block, ewb, &proc_sep[c], channel_sets[c], &mut sep_lens[c]);
      }

      let (red_min, red_max) = channel_minmax(pinfo, block, ewb, 0);
      let (green_min, green_max) = channel_minmax(pinfo, block, ewb, 1);
      let (blue_min, blue_max) = channel_minmax(pinfo, block, ewb, 2);
      let minmax = [(red_min, red_max), (green_min, green_max), (blue_min, blue_max)];

      for j in 0..partition_count {
        let tpp = pinfo.texels_per_partition[j] as f32;
        let ics3 = Vec3::new(inv_color_scale[j].x, inv_color_scale[j].y, inv_color_scale[j].z);
        let ew = error_weightings[j] * (tpp * estim_sq);
        let ew3 = Vec3::new(ew.x, ew.y, ew.z);

        let uncorr_v = (uncorr_lines[j].b * uncorr_lens[j]).mul_elementwise(ics3);
        let samechroma_v = (samechroma_lines[j].b * samechroma_lens[j]).mul_elementwise(ics3);
        uncorr_error += (uncorr_v.mul_elementwise(uncorr_v)).dot(ew3);
        samechroma_error += (samechroma_v.mul_elementwise(samechroma_v)).dot(ew3);

        let ics_arr = [Vec2::new(ics3.y, ics3.z), Vec2::new(ics3.x, ics3.z), Vec2::new(ics3.x, ics3.y)];
        let ew2_arr = [Vec2::new(ew3.y, ew3.z), Vec2::new(ew3.x, ew3.z), Vec2::new(ew3.x, ew3.y)];
        let ew_scalar = [ew3.x, ew3.y, ew3.z];
        for c in 0..3 {
          let v = (sep_lines[c][j].b * sep_lens[c][j]).mul_elementwise(ics_arr[c]);
          sep_error[c] += (v.mul_elementwise(v)).dot(ew2_arr[c]);
          let (lo, hi) = (&minmax[c].0, &minmax[c].1);
          let scalar = hi[j] - lo[j];
          sep_error[c] += scalar * scalar * ew_scalar[c];
        }
      }

      uncorr_errors[i] = uncorr_error;
      samechroma_errors[i] = samechroma_error;
      for c in 0..3 {
        separate_errors[c * PARTITION_SEED_COUNT + i] = sep_error[c];
      }
    }
  }

  // Selection: pop the `candidates_to_return` best uncorrelated/samechroma
  // seeds, each pass removing the winner from both pools so it can't be
  // picked twice (mirrors the source: removing a winner from one pool also
  // removes it from the other, since both hypotheses compete for the same
  // slot in the final candidate list).
  let mut uncorrelated = Vec::with_capacity(candidates_to_return);
  let mut samechroma = Vec::with_capacity(candidates_to_return);
  for _ in 0..candidates_to_return {
    let mut best_j = 0usize;
    let mut best_err = ERROR_ALREADY_SELECTED;
    for j in 0..=defacto_search_limit {
      if uncorr_errors[j] < best_err {
        best_j = j;
        best_err = uncorr_errors[j];
      }
    }
    uncorrelated.push(sequence[best_j]);
    uncorr_errors[best_j] = ERROR_ALREADY_SELECTED;
    samechroma_errors[best_j] = ERROR_ALREADY_SELECTED;

    let mut best_j2 = 0usize;
    let mut best_err2 = ERROR_ALREADY_SELECTED;
    for j in 0..=defacto_search_limit {
      if samechroma_errors[j] < best_err2 {
        best_j2 = j;
        best_err2 = samechroma_errors[j];
      }
    }
    samechroma.push(sequence[best_j2]);
    samechroma_errors[best_j2] = ERROR_ALREADY_SELECTED;
    uncorr_errors[best_j2] = ERROR_ALREADY_SELECTED;
  }

  let mut dual_weight_planes = Vec::with_capacity(2 * candidates_to_return);
  for _ in 0..(2 * candidates_to_return) {
    let mut best_flat = 0usize;
    let mut best_err = ERROR_ALREADY_SELECTED;
    for c in 0..num_channels {
      for j in 0..=defacto_search_limit {
        let flat = c * PARTITION_SEED_COUNT + j;
        if separate_errors[flat] < best_err {
          best_flat = flat;
          best_err = separate_errors[flat];
        }
      }
    }
    separate_errors[best_flat] = ERROR_ALREADY_SELECTED;
    let channel = (best_flat / PARTITION_SEED_COUNT) as u32;
    let local = best_flat % PARTITION_SEED_COUNT;
    let seed = sequence[local] as u32;
    dual_weight_planes.push((channel << PARTITION_BITS) | seed);
  }

  PartitionSearchResult { uncorrelated, samechroma, dual_weight_planes }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn gradient_block(fp: Footprint) -> (ImageBlock, ErrorWeightBlock) {
    let n = fp.texel_count();
    let texels: Vec<Vec4> = (0..n)
      .map(|i| {
        let half = n / 2;
        if i < half {
          Vec4::new(0.1, 0.1, 0.1, 1.0)
        } else {
          Vec4::new(0.9, 0.9, 0.9, 1.0)
        }
      })
      .collect();
    let block = ImageBlock::new(fp, texels);
    let ewb = ErrorWeightBlock::new(vec![Vec4::splat(1.0); n]);
    (block, ewb)
  }

  #[test]
  fn returns_requested_candidate_counts() {
    let fp = Footprint::new_2d(4, 4);
    let (block, ewb) = gradient_block(fp);
    let result = find_best_partitionings(DirectionMethod::Heuristic, fp, 2, &block, &ewb, PARTITION_SEED_COUNT, 4);
    assert_eq!(result.uncorrelated.len(), 4);
    assert_eq!(result.samechroma.len(), 4);
    assert_eq!(result.dual_weight_planes.len(), 8);
  }

  #[test]
  fn dual_plane_index_round_trips_channel_and_seed() {
    let fp = Footprint::new_2d(4, 4);
    let (block, ewb) = gradient_block(fp);
    let result = find_best_partitionings(DirectionMethod::Heuristic, fp, 2, &block, &ewb, PARTITION_SEED_COUNT, 1);
    for &enc in &result.dual_weight_planes {
      let channel = enc >> PARTITION_BITS;
      let seed = enc & ((1u32 << PARTITION_BITS) - 1);
      assert!(channel < 4);
      assert!((seed as usize) < PARTITION_SEED_COUNT);
    }
  }

  #[test]
  fn search_limit_below_full_seed_space_still_returns_candidates() {
    let fp = Footprint::new_2d(4, 4);
    let (block, ewb) = gradient_block(fp);
    let result = find_best_partitionings(DirectionMethod::Eigenvector, fp, 2, &block, &ewb, 32, 2);
    assert_eq!(result.uncorrelated.len(), 2);
    assert_eq!(result.samechroma.len(), 2);
  }
}
