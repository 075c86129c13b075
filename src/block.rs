// Data model (spec 3): image block, error-weight block, color/processed
// lines, and the explicit encoder configuration that replaces the source's
// process-wide `alpha_force_use_of_hdr` / `perform_srgb_transform` globals
// (spec 9 DESIGN NOTES).

use crate::math::{Vec2, Vec3, Vec4};
use crate::tables::Footprint;

/// Dense per-block texel array, already mapped to encoder working space.
/// Ordering is scanline-major then slice-major (spec 3).
#[derive(Clone, Debug)]
pub struct ImageBlock {
  pub footprint: Footprint,
  pub texels: Vec<Vec4>,
  pub alpha_min: f32,
  pub alpha_max: f32,
}

impl ImageBlock {
  pub fn new(footprint: Footprint, texels: Vec<Vec4>) -> Self {
    assert_eq!(texels.len(), footprint.texel_count());
    let alpha_min = texels.iter().map(|t| t.w).fold(f32::INFINITY, f32::min);
    let alpha_max = texels.iter().map(|t| t.w).fold(f32::NEG_INFINITY, f32::max);
    Self { footprint, texels, alpha_min, alpha_max }
  }

  /// `pb->alpha_max != pb->alpha_min` (astc_find_best_partitioning.cpp).
  pub fn uses_alpha(&self) -> bool {
    self.alpha_max != self.alpha_min
  }
}

/// Error-weight block: per-texel positive weight vector plus the several
/// per-channel-subset scalar projections. The relationship between
/// `texel_weight_<S>` and `error_weights` is an Open Question the spec
/// explicitly declines to guess (9): we take the documented invariant
/// literally — `texel_weight_S[i]` is the sum of `error_weights[i]`
/// restricted to the channels in `S` — since that is the one relationship
/// spec 3 states outright ("equals the sum... of error_weights[i] over S").
#[derive(Clone, Debug)]
pub struct ErrorWeightBlock {
  pub error_weights: Vec<Vec4>,
  pub contains_zeroweight_texels: bool,
}

impl ErrorWeightBlock {
  pub fn new(error_weights: Vec<Vec4>) -> Self {
    let contains_zeroweight_texels = error_weights.iter().any(|w| w.x <= 1e-20 || w.y <= 1e-20 || w.z <= 1e-20 || w.w <= 1e-20);
    Self { error_weights, contains_zeroweight_texels }
  }

  pub fn texel_weight(&self, i: usize) -> f32 {
    let w = self.error_weights[i];
    w.x + w.y + w.z + w.w
  }

  pub fn texel_weight_rgb(&self, i: usize) -> f32 {
    let w = self.error_weights[i];
    w.x + w.y + w.z
  }

  /// Scalar projection restricted to an arbitrary 2/3-channel subset given
  /// by channel indices into {r=0,g=1,b=2,a=3}.
  pub fn texel_weight_subset(&self, i: usize, channels: &[usize]) -> f32 {
    let w = self.error_weights[i];
    let comp = [w.x, w.y, w.z, w.w];
    channels.iter().map(|&c| comp[c]).sum()
  }
}

/// An affine color line: origin `a`, direction `b` (spec 3). Not required
/// to be unit length; explicit normalization happens at call sites that
/// need it (spec 9's Direction/UnitDirection distinction).
#[derive(Clone, Copy, Debug)]
pub struct ColorLine {
  pub a: Vec4,
  pub b: Vec4,
}

/// Pre-baked line for error computation (spec 3):
/// `amod = (a - b*dot(a,b)) * inv_scale`, `bs = b*scale`, `bis = b*inv_scale`.
#[derive(Clone, Copy, Debug)]
pub struct ProcessedLine {
  pub amod: Vec4,
  pub bs: Vec4,
  pub bis: Vec4,
}

impl ProcessedLine {
  pub fn new(line: ColorLine, scale: Vec4, inv_scale: Vec4) -> Self {
    let dot = line.a.dot(line.b);
    let amod = (line.a - line.b * dot).mul_elementwise(inv_scale);
    let bs = line.b.mul_elementwise(scale);
    let bis = line.b.mul_elementwise(inv_scale);
    Self { amod, bs, bis }
  }
}

/// 3-component counterpart of [`ColorLine`]/[`ProcessedLine`], used by the
/// reduced-channel-subset error evaluators in 4.F (`processed_line3`).
#[derive(Clone, Copy, Debug)]
pub struct ColorLine3 {
  pub a: Vec3,
  pub b: Vec3,
}

#[derive(Clone, Copy, Debug)]
pub struct ProcessedLine3 {
  pub amod: Vec3,
  pub bs: Vec3,
  pub bis: Vec3,
}

impl ProcessedLine3 {
  pub fn new(line: ColorLine3, scale: Vec3, inv_scale: Vec3) -> Self {
    let dot = line.a.dot(line.b);
    let amod = (line.a - line.b * dot).mul_elementwise(inv_scale);
    let bs = line.b.mul_elementwise(scale);
    let bis = line.b.mul_elementwise(inv_scale);
    Self { amod, bs, bis }
  }
}

/// 2-component counterpart, used by the fully-reduced (single-channel-pair)
/// error evaluators in 4.F (`processed_line2`).
#[derive(Clone, Copy, Debug)]
pub struct ColorLine2 {
  pub a: Vec2,
  pub b: Vec2,
}

#[derive(Clone, Copy, Debug)]
pub struct ProcessedLine2 {
  pub amod: Vec2,
  pub bs: Vec2,
  pub bis: Vec2,
}

impl ProcessedLine2 {
  pub fn new(line: ColorLine2, scale: Vec2, inv_scale: Vec2) -> Self {
    let dot = line.a.dot(line.b);
    let amod = (line.a - line.b * dot).mul_elementwise(inv_scale);
    let bs = line.b.mul_elementwise(scale);
    let bis = line.b.mul_elementwise(inv_scale);
    Self { amod, bs, bis }
  }
}

impl Vec4 {
  pub fn mul_elementwise(self, o: Vec4) -> Vec4 {
    Vec4::new(self.x * o.x, self.y * o.y, self.z * o.z, self.w * o.w)
  }
}
impl Vec3 {
  pub fn mul_elementwise(self, o: Vec3) -> Vec3 {
    Vec3::new(self.x * o.x, self.y * o.y, self.z * o.z)
  }
}
impl Vec2 {
  pub fn mul_elementwise(self, o: Vec2) -> Vec2 {
    Vec2::new(self.x * o.x, self.y * o.y)
  }
}

/// Per-partition derived scalars used throughout 4.E-4.G: color scale
/// factors (`sqrt(mean(error_weights))`) and their reciprocal, clamped per
/// spec 9's Open Question note ("do not remove [the] clamp").
#[derive(Clone, Copy, Debug, Default)]
pub struct PartitionScale {
  pub scale: Vec4,
  pub inv_scale: Vec4,
}

pub fn inv_scale_component(s: f32) -> f32 {
  1.0 / s.max(1e-7)
}

/// Explicit encoder configuration replacing the source's process-wide
/// `alpha_force_use_of_hdr` / `perform_srgb_transform` flags (spec 9).
#[derive(Clone, Copy, Debug, Default)]
pub struct EncoderConfig {
  pub alpha_force_use_of_hdr: bool,
  pub perform_srgb_transform: bool,
}

/// Decode mode selecting endpoint post-processing in 4.D.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeMode {
  LdrSrgb,
  Ldr,
  Hdr,
}
