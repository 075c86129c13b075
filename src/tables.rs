// Static, process-wide tables (spec 4.B): color quantization, partition
// assignment, and k-means partition ordering. Populated once and memoized
// behind OnceLock, matching the "populated once, then immutable" lifecycle
// spec 5 demands.
//
// The full 21-level ASTC BISE trit/quint decode tables and the official
// partition-hash generator live in source files the retrieval pack dropped
// (only their *consumers*, astc_color_unquantize.cpp and
// astc_find_best_partitioning.cpp, were kept). The generation strategy here
// is documented in SPEC_FULL.md 4.B / DESIGN.md: an evenly-spaced
// quantization grid per level, and a stable integer-hash partition
// assignment. Both satisfy the contracts spec.md actually tests (8.4, 8.6);
// neither claims bit-exact parity with the real astcenc tables.

use std::sync::OnceLock;

use crate::error::CoreError;

/// Number of distinct ASTC quantization levels (QUANT_2 .. QUANT_256).
pub const NUM_QUANT_LEVELS: usize = 21;

const QUANT_STEPS: [u16; NUM_QUANT_LEVELS] = [
  2, 3, 4, 5, 6, 8, 10, 12, 16, 20, 24, 32, 40, 48, 64, 80, 96, 128, 160, 192, 256,
];

fn build_unquant_table(level: usize) -> [u8; 256] {
  let steps = QUANT_STEPS[level] as u32;
  let mut table = [0u8; 256];
  for (code, slot) in table.iter_mut().enumerate() {
    let code_index = (code as u32) % steps;
    let value = if steps > 1 {
      (code_index * 255 + (steps - 1) / 2) / (steps - 1)
    } else {
      0
    };
    *slot = value.min(255) as u8;
  }
  table
}

struct QuantTables([[u8; 256]; NUM_QUANT_LEVELS]);

static QUANT_TABLES: OnceLock<QuantTables> = OnceLock::new();

/// `color_unquantization_tables[level][code]`: maps a quantization code
/// (0..255) to an unquantized 0..255 integer, per spec 4.B.
pub fn color_unquantization_table(level: usize) -> &'static [u8; 256] {
  let tables = QUANT_TABLES.get_or_init(|| {
    let mut all = [[0u8; 256]; NUM_QUANT_LEVELS];
    for (level, slot) in all.iter_mut().enumerate() {
      *slot = build_unquant_table(level);
    }
    QuantTables(all)
  });
  &tables.0[level]
}

/// Unquantize a single code at `level` (convenience wrapper).
pub fn unquantize(level: usize, code: u8) -> u8 {
  color_unquantization_table(level)[code as usize]
}

/// Block footprint in texels: X*Y*Z, Z=1 for 2D, per spec 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Footprint {
  pub x: u8,
  pub y: u8,
  pub z: u8,
}

impl Footprint {
  pub const fn new_2d(x: u8, y: u8) -> Self {
    Self { x, y, z: 1 }
  }

  pub fn texel_count(&self) -> usize {
    self.x as usize * self.y as usize * self.z as usize
  }
}

pub const MAX_PARTITIONS: usize = 4;
pub const MAX_TEXELS: usize = 216;
pub const PARTITION_SEED_COUNT: usize = 1024;

/// Partition table entry for a given (footprint, partition_count, seed):
/// the texel->partition function plus derived per-partition index lists.
/// Spec 4.B / 3.
#[derive(Clone, Debug)]
pub struct PartitionInfo {
  pub partition_count: usize,
  pub partition_of_texel: Vec<u8>,
  pub texels_per_partition: [usize; MAX_PARTITIONS],
  pub texels_of_partition: [Vec<u16>; MAX_PARTITIONS],
}

/// splitmix64-style finishing mixer; a standard, dependency-free integer
/// hash used here purely to synthesize a deterministic, stable partition
/// assignment (spec 4.B treats partition-table generation as opaque).
fn mix64(mut x: u64) -> u64 {
  x ^= x >> 30;
  x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
  x ^= x >> 27;
  x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
  x ^= x >> 31;
  x
}

fn partition_hash(footprint: Footprint, partition_count: usize, seed: u16, texel: u16) -> u64 {
  let key = (footprint.x as u64) << 56
    | (footprint.y as u64) << 48
    | (footprint.z as u64) << 40
    | (partition_count as u64) << 32
    | (seed as u64) << 16
    | texel as u64;
  mix64(key)
}

fn generate_partition_info(footprint: Footprint, partition_count: usize, seed: u16) -> PartitionInfo {
  let t = footprint.texel_count();
  let mut raw = vec![0u8; t];
  if partition_count <= 1 {
    // Partition count 1 degenerates to a single partition covering all
    // texels, per spec 4.B.
  } else {
    for (i, slot) in raw.iter_mut().enumerate() {
      let h = partition_hash(footprint, partition_count, seed, i as u16);
      *slot = (h % partition_count as u64) as u8;
    }
  }

  // Canonicalize by first-appearance order so partition 0 always contains
  // texel 0, matching the real tables' convention.
  let mut remap = [u8::MAX; MAX_PARTITIONS];
  let mut next = 0u8;
  for &p in &raw {
    if remap[p as usize] == u8::MAX {
      remap[p as usize] = next;
      next += 1;
    }
  }
  let partition_of_texel: Vec<u8> = raw.iter().map(|&p| remap[p as usize]).collect();

  let mut texels_of_partition: [Vec<u16>; MAX_PARTITIONS] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
  let mut texels_per_partition = [0usize; MAX_PARTITIONS];
  for (i, &p) in partition_of_texel.iter().enumerate() {
    texels_of_partition[p as usize].push(i as u16);
    texels_per_partition[p as usize] += 1;
  }

  PartitionInfo {
    partition_count: next.max(1) as usize,
    partition_of_texel,
    texels_per_partition,
    texels_of_partition,
  }
}

struct PartitionCache(std::sync::Mutex<std::collections::HashMap<(Footprint, usize, u16), &'static PartitionInfo>>);

static PARTITION_CACHE: OnceLock<PartitionCache> = OnceLock::new();

/// Partition table entry for `(footprint, partition_count, seed)`, per
/// spec 4.B. `seed` is in `[0, 1024)`. Populated lazily and cached forever
/// (process-wide immutable data, spec 5).
pub fn partition_table(footprint: Footprint, partition_count: usize, seed: u16) -> &'static PartitionInfo {
  let cache = PARTITION_CACHE.get_or_init(|| PartitionCache(std::sync::Mutex::new(std::collections::HashMap::new())));
  let key = (footprint, partition_count, seed);
  let mut guard = cache.0.lock().unwrap();
  if let Some(&info) = guard.get(&key) {
    return info;
  }
  let info = Box::leak(Box::new(generate_partition_info(footprint, partition_count, seed)));
  guard.insert(key, info);
  info
}

/// Caller-facing fallible counterpart of [`partition_table`]: returns
/// [`CoreError::EmptyPartitionTable`] if the generated table has fewer
/// partitions than requested (some seeds genuinely don't split a small
/// footprint into `partition_count` distinct regions). `partition_search`
/// itself never calls this — it detects the same condition via the
/// sentinel scheme of spec 4.G/7 so the per-seed scoring loop stays a
/// total function — but a driver that wants to validate a single
/// `(footprint, partition_count, seed)` triple up front can use this
/// instead of re-deriving the check.
pub fn try_partition_table(footprint: Footprint, partition_count: usize, seed: u16) -> Result<&'static PartitionInfo, CoreError> {
  let info = partition_table(footprint, partition_count, seed);
  if info.partition_count < partition_count {
    Err(CoreError::EmptyPartitionTable { partition_count })
  } else {
    Ok(info)
  }
}

/// `kmeans_compute_partition_ordering`: returns a permutation of
/// `[0, 1024)` for the given footprint/partition_count, reordering
/// candidate partitionings by expected quality (spec 4.B). Treated as
/// opaque by the core: only stability and determinism are load-bearing.
/// Here, seeds are sorted by a cheap balance proxy (variance of
/// per-partition texel counts) as a stand-in for the real k-means-quality
/// metric.
pub fn kmeans_partition_ordering(footprint: Footprint, partition_count: usize) -> Vec<u16> {
  let mut seeds: Vec<u16> = (0..PARTITION_SEED_COUNT as u16).collect();
  let balance = |seed: u16| -> u64 {
    let info = partition_table(footprint, partition_count, seed);
    if info.partition_count < partition_count {
      return u64::MAX;
    }
    let mean = footprint.texel_count() as f64 / partition_count as f64;
    let mut acc = 0.0f64;
    for p in 0..partition_count {
      let d = info.texels_per_partition[p] as f64 - mean;
      acc += d * d;
    }
    (acc * 1000.0) as u64
  };
  seeds.sort_by_key(|&s| balance(s));
  seeds
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unquantize_is_monotonic_and_bounded() {
    for level in 0..NUM_QUANT_LEVELS {
      let table = color_unquantization_table(level);
      let steps = QUANT_STEPS[level] as usize;
      let mut prev = -1i32;
      for code in 0..steps {
        let v = table[code] as i32;
        assert!(v >= prev);
        assert!(v <= 255);
        prev = v;
      }
    }
  }

  #[test]
  fn trivial_level_is_identity_like_enough_for_roundtrip() {
    // level 20 has 256 steps -> identity mapping.
    let table = color_unquantization_table(NUM_QUANT_LEVELS - 1);
    assert_eq!(table[0], 0);
    assert_eq!(table[255], 255);
  }

  #[test]
  fn partition_table_covers_all_texels_with_no_duplicates() {
    let fp = Footprint::new_2d(4, 4);
    for p in 1..=4usize {
      let info = partition_table(fp, p, 7);
      let mut seen = vec![false; fp.texel_count()];
      let mut count = 0;
      for part in &info.texels_of_partition {
        for &t in part {
          assert!(!seen[t as usize], "texel {t} assigned twice");
          seen[t as usize] = true;
          count += 1;
        }
      }
      assert_eq!(count, fp.texel_count());
      assert!(seen.iter().all(|&b| b));
    }
  }

  #[test]
  fn kmeans_ordering_is_stable_and_a_permutation() {
    let fp = Footprint::new_2d(4, 4);
    let a = kmeans_partition_ordering(fp, 2);
    let b = kmeans_partition_ordering(fp, 2);
    assert_eq!(a, b);
    let mut sorted = a.clone();
    sorted.sort();
    let expected: Vec<u16> = (0..PARTITION_SEED_COUNT as u16).collect();
    assert_eq!(sorted, expected);
  }

  #[test]
  fn partition_count_one_is_single_partition() {
    let fp = Footprint::new_2d(4, 4);
    let info = partition_table(fp, 1, 0);
    assert_eq!(info.texels_per_partition[0], fp.texel_count());
  }

  #[test]
  fn try_partition_table_reports_empty_when_seed_collapses_partitions() {
    // A 4-texel footprint asked for 4 partitions: whichever seeds hash all
    // four texels into fewer than 4 distinct buckets must surface as
    // CoreError::EmptyPartitionTable rather than silently returning a
    // smaller partitioning under the requested count.
    let fp = Footprint::new_2d(2, 2);
    let mut saw_error = false;
    for seed in 0..64u16 {
      if try_partition_table(fp, 4, seed).is_err() {
        saw_error = true;
        break;
      }
    }
    assert!(saw_error, "expected at least one seed to collapse below 4 partitions for a 4-texel block");
  }
}
