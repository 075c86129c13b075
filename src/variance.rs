// Summed-area per-pixel statistics (spec 4.C). Grounded on
// astc_compute_variance.cpp: compute_pixel_region_variance /
// compute_averages_and_variances. The source's triple-pointer
// (`float4 ***input_averages`) layout is replaced with contiguous buffers
// per spec 9 DESIGN NOTES; the statistics pass is the sole producer of a
// `Statistics` value rather than a process-wide global.

use crate::math::Vec4;

/// Six-entry channel swizzle: components 0..3 address source channels,
/// component 4 is constant 0, component 5 is constant 1 (spec 4.C step 3a).
pub type Swizzle = [u8; 4];

pub const SWZ_CONST_ZERO: u8 = 4;
pub const SWZ_CONST_ONE: u8 = 5;

/// Read-only logical view of the source image handed to the statistics
/// pass. `padding` replicated/specified edge texels surround the logical
/// `xsize x ysize x zsize` region (spec 9: "the image has an
/// implementation-defined padding border").
pub struct Image<'a> {
  pub xsize: usize,
  pub ysize: usize,
  pub zsize: usize,
  pub padding: usize,
  /// Padded storage, `(xsize + 2*padding) * (ysize + 2*padding) * (zsize + 2*padding)`
  /// texels, each a 4-channel sample already in working space.
  pub data: &'a [[f32; 4]],
}

impl<'a> Image<'a> {
  fn padded_xsize(&self) -> usize { self.xsize + 2 * self.padding }
  fn padded_ysize(&self) -> usize { self.ysize + 2 * self.padding }

  fn sample(&self, x: isize, y: isize, z: isize) -> [f32; 4] {
    let px = (x + self.padding as isize).clamp(0, self.padded_xsize() as isize - 1) as usize;
    let py = (y + self.padding as isize).clamp(0, self.padded_ysize() as isize - 1) as usize;
    let pz = (z + self.padding as isize).clamp(0, (self.zsize + 2 * self.padding) as isize - 1) as usize;
    let idx = px + py * self.padded_xsize() + pz * self.padded_xsize() * self.padded_ysize();
    self.data[idx]
  }
}

#[derive(Clone, Copy, Debug)]
pub struct StatsConfig {
  pub rgb_power: f64,
  pub alpha_power: f64,
  pub rgb_radius: usize,
  pub alpha_radius: usize,
  pub swizzle: Swizzle,
  pub perform_srgb_transform: bool,
}

impl Default for StatsConfig {
  fn default() -> Self {
    Self {
      rgb_power: 1.0,
      alpha_power: 1.0,
      rgb_radius: 2,
      alpha_radius: 2,
      swizzle: [0, 1, 2, 3],
      perform_srgb_transform: false,
    }
  }
}

/// Owned output of `compute_averages_and_variances`: contiguous buffers
/// instead of the source's triple-pointer arrays (spec 9).
pub struct Statistics {
  pub xsize: usize,
  pub ysize: usize,
  pub zsize: usize,
  pub averages: Vec<Vec4>,
  pub alpha_averages: Vec<f32>,
  pub variances: Vec<Vec4>,
}

impl Statistics {
  fn index(&self, x: usize, y: usize, z: usize) -> usize {
    x + y * self.xsize + z * self.xsize * self.ysize
  }

  pub fn average(&self, x: usize, y: usize, z: usize) -> Vec4 {
    self.averages[self.index(x, y, z)]
  }

  pub fn alpha_average(&self, x: usize, y: usize, z: usize) -> f32 {
    self.alpha_averages[self.index(x, y, z)]
  }

  pub fn variance(&self, x: usize, y: usize, z: usize) -> Vec4 {
    self.variances[self.index(x, y, z)]
  }
}

fn srgb_to_linear_inverse(d: f64) -> f64 {
  // Piecewise transform applied to RGB in the forward (linear->perceptual)
  // direction, per spec 4.C step 3b and the source's exact formula.
  if d <= 0.04045 {
    d / 12.92
  } else if d <= 1.0 {
    ((d + 0.055) / 1.055).powf(2.4)
  } else {
    d
  }
}

fn load_sample(image: &Image, x: isize, y: isize, z: isize, swz: Swizzle) -> [f64; 4] {
  let raw = image.sample(x, y, z);
  let component = |c: u8| -> f64 {
    match c {
      SWZ_CONST_ZERO => 0.0,
      SWZ_CONST_ONE => 1.0,
      idx => raw[idx as usize] as f64,
    }
  };
  [component(swz[0]), component(swz[1]), component(swz[2]), component(swz[3])]
}

/// Per-tile scratch SAT computation, grounded on
/// `compute_pixel_region_variance`.
fn compute_pixel_region_variance(
  image: &Image,
  cfg: &StatsConfig,
  source_xoffset: isize,
  source_yoffset: isize,
  source_zoffset: isize,
  xsize: usize,
  ysize: usize,
  zsize: usize,
  dest_xoffset: usize,
  dest_yoffset: usize,
  dest_zoffset: usize,
  out: &mut Statistics,
) {
  let kernel_radius = cfg.rgb_radius.max(cfg.alpha_radius);
  let kerneldim = 2 * kernel_radius + 1;
  let padded_x = xsize + kerneldim;
  let padded_y = ysize + kerneldim;
  let padded_z = if zsize > 1 { zsize + kerneldim } else { 1 };

  let mut varbuf1 = vec![[0f64; 4]; padded_x * padded_y * padded_z];
  let mut varbuf2 = vec![[0f64; 4]; padded_x * padded_y * padded_z];

  let idx3 = |x: usize, y: usize, z: usize| x + y * padded_x + z * padded_x * padded_y;

  let powers_are_1 = cfg.rgb_power == 1.0 && cfg.alpha_power == 1.0;

  for z in 0..padded_z {
    for y in 0..padded_y {
      for x in 0..padded_x {
        let sx = source_xoffset + x as isize - kernel_radius as isize;
        let sy = source_yoffset + y as isize - kernel_radius as isize;
        let sz = if zsize > 1 { source_zoffset + z as isize - kernel_radius as isize } else { source_zoffset };
        let mut s = load_sample(image, sx, sy, sz, cfg.swizzle);

        if cfg.perform_srgb_transform {
          for c in s.iter_mut().take(3) {
            *c = srgb_to_linear_inverse(*c);
          }
        }
        if !powers_are_1 {
          for (c, power) in s.iter_mut().take(3).zip(std::iter::repeat(cfg.rgb_power)) {
            *c = c.max(1e-6).powf(power);
          }
          s[3] = s[3].max(1e-6).powf(cfg.alpha_power);
        }

        let i = idx3(x, y, z);
        varbuf1[i] = s;
        varbuf2[i] = [s[0] * s[0], s[1] * s[1], s[2] * s[2], s[3] * s[3]];
      }
    }
  }

  // Zero-pad the outer border (spec 4.C step 4).
  let zero_border = |buf: &mut [[f64; 4]]| {
    for z in 0..padded_z {
      for y in 0..padded_y {
        for x in 0..padded_x {
          if x == 0 || y == 0 || x == padded_x - 1 || y == padded_y - 1 || (padded_z > 1 && (z == 0 || z == padded_z - 1)) {
            buf[idx3(x, y, z)] = [0.0; 4];
          }
        }
      }
    }
  };
  zero_border(&mut varbuf1);
  zero_border(&mut varbuf2);

  // Exclusive prefix sums along x, then y, then z (spec 4.C step 5).
  let prefix_x = |buf: &mut [[f64; 4]]| {
    for z in 0..padded_z {
      for y in 0..padded_y {
        let mut acc = [0f64; 4];
        for x in 0..padded_x {
          let i = idx3(x, y, z);
          let cur = buf[i];
          buf[i] = acc;
          for c in 0..4 { acc[c] += cur[c]; }
        }
      }
    }
  };
  let prefix_y = |buf: &mut [[f64; 4]]| {
    for z in 0..padded_z {
      for x in 0..padded_x {
        let mut acc = [0f64; 4];
        for y in 0..padded_y {
          let i = idx3(x, y, z);
          let cur = buf[i];
          buf[i] = acc;
          for c in 0..4 { acc[c] += cur[c]; }
        }
      }
    }
  };
  let prefix_z = |buf: &mut [[f64; 4]]| {
    if padded_z <= 1 { return; }
    for y in 0..padded_y {
      for x in 0..padded_x {
        let mut acc = [0f64; 4];
        for z in 0..padded_z {
          let i = idx3(x, y, z);
          let cur = buf[i];
          buf[i] = acc;
          for c in 0..4 { acc[c] += cur[c]; }
        }
      }
    }
  };
  prefix_x(&mut varbuf1);
  prefix_y(&mut varbuf1);
  prefix_z(&mut varbuf1);
  prefix_x(&mut varbuf2);
  prefix_y(&mut varbuf2);
  prefix_z(&mut varbuf2);

  let avg_var_samples = {
    let n = (2 * cfg.rgb_radius + 1).pow(if zsize > 1 { 3 } else { 2 }) as f64;
    n
  };
  let alpha_samples = {
    let n = (2 * cfg.alpha_radius + 1).pow(if zsize > 1 { 3 } else { 2 }) as f64;
    n
  };
  let mul1 = if avg_var_samples > 1.0 { 1.0 / (avg_var_samples * (avg_var_samples - 1.0)) } else { 1.0 };
  let mul2 = avg_var_samples * mul1;

  // Box-sum via SAT corner lookups: for an exclusive prefix sum, the sum
  // over [lo,hi) is sat[hi] - sat[lo]. `cx/cy/cz` are destination-local
  // texel coordinates; the texel's own sample sits at buffer position
  // `c + kernel_radius` (see the load loop above), so a box of the given
  // `radius` (which may be narrower than `kernel_radius`, e.g. the RGB box
  // under a wider alpha radius) must recenter around that offset rather
  // than `cx` itself.
  let box_sum = |buf: &[[f64; 4]], cx: usize, cy: usize, cz: usize, radius: usize| -> [f64; 4] {
    let center = kernel_radius;
    let lo_x = cx + center - radius; let hi_x = cx + center + radius + 1;
    let lo_y = cy + center - radius; let hi_y = cy + center + radius + 1;
    if padded_z > 1 {
      let lo_z = cz + center - radius; let hi_z = cz + center + radius + 1;
      let corners = [
        (hi_x, hi_y, hi_z, 1.0), (lo_x, hi_y, hi_z, -1.0), (hi_x, lo_y, hi_z, -1.0), (hi_x, hi_y, lo_z, -1.0),
        (lo_x, lo_y, hi_z, 1.0), (lo_x, hi_y, lo_z, 1.0), (hi_x, lo_y, lo_z, 1.0), (lo_x, lo_y, lo_z, -1.0),
      ];
      let mut acc = [0f64; 4];
      for (x, y, z, sign) in corners {
        let v = buf[idx3(x, y, z)];
        for c in 0..4 { acc[c] += sign * v[c]; }
      }
      acc
    } else {
      let corners = [
        (hi_x, hi_y, 1.0), (lo_x, hi_y, -1.0), (hi_x, lo_y, -1.0), (lo_x, lo_y, 1.0),
      ];
      let mut acc = [0f64; 4];
      for (x, y, sign) in corners {
        let v = buf[idx3(x, y, 0)];
        for c in 0..4 { acc[c] += sign * v[c]; }
      }
      acc
    }
  };

  for z in 0..zsize.max(1) {
    for y in 0..ysize {
      for x in 0..xsize {
        let v0 = box_sum(&varbuf1, x, y, z, cfg.rgb_radius);
        let v1 = v0;
        let v2 = box_sum(&varbuf2, x, y, z, cfg.rgb_radius);
        let va = box_sum(&varbuf1, x, y, z, cfg.alpha_radius);

        let dest_index = out.index(x + dest_xoffset, y + dest_yoffset, z + dest_zoffset);
        out.alpha_averages[dest_index] = (va[3] / alpha_samples) as f32;
        out.averages[dest_index] = Vec4::new(
          (v0[0] / avg_var_samples) as f32,
          (v0[1] / avg_var_samples) as f32,
          (v0[2] / avg_var_samples) as f32,
          (v0[3] / avg_var_samples) as f32,
        );
        out.variances[dest_index] = Vec4::new(
          (mul2 * v2[0] - mul1 * (v1[0] * v1[0])) as f32,
          (mul2 * v2[1] - mul1 * (v1[1] * v1[1])) as f32,
          (mul2 * v2[2] - mul1 * (v1[2] * v1[2])) as f32,
          (mul2 * v2[3] - mul1 * (v1[3] * v1[3])) as f32,
        );
      }
    }
  }
}

/// Top-level entry point (spec 4.C): tiles the image into 32x32(x32)
/// destination blocks and populates a fresh `Statistics` value.
pub fn compute_averages_and_variances(image: &Image, cfg: &StatsConfig) -> Statistics {
  const TILE: usize = 32;
  let mut out = Statistics {
    xsize: image.xsize,
    ysize: image.ysize,
    zsize: image.zsize,
    averages: vec![Vec4::default(); image.xsize * image.ysize * image.zsize.max(1)],
    alpha_averages: vec![0.0; image.xsize * image.ysize * image.zsize.max(1)],
    variances: vec![Vec4::default(); image.xsize * image.ysize * image.zsize.max(1)],
  };

  let zsize = image.zsize.max(1);
  let mut zt = 0;
  while zt < zsize {
    let ztile = TILE.min(zsize - zt);
    let mut yt = 0;
    while yt < image.ysize {
      let ytile = TILE.min(image.ysize - yt);
      let mut xt = 0;
      while xt < image.xsize {
        let xtile = TILE.min(image.xsize - xt);
        compute_pixel_region_variance(
          image,
          cfg,
          image.padding as isize + xt as isize,
          image.padding as isize + yt as isize,
          image.padding as isize + zt as isize,
          xtile,
          ytile,
          if image.zsize > 1 { ztile } else { 1 },
          xt,
          yt,
          zt,
          &mut out,
        );
        xt += TILE;
      }
      yt += TILE;
    }
    zt += if image.zsize > 1 { TILE } else { 1 };
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn constant_image(xsize: usize, ysize: usize, padding: usize, value: [f32; 4]) -> Vec<[f32; 4]> {
    let px = xsize + 2 * padding;
    let py = ysize + 2 * padding;
    vec![value; px * py]
  }

  #[test]
  fn constant_image_has_zero_variance_and_matching_average() {
    // E7: image all (0.5,0.5,0.5,1.0), rgb_radius=alpha_radius=1, powers=1.
    let padding = 2;
    let data = constant_image(8, 8, padding, [0.5, 0.5, 0.5, 1.0]);
    let image = Image { xsize: 8, ysize: 8, zsize: 1, padding, data: &data };
    let cfg = StatsConfig { rgb_radius: 1, alpha_radius: 1, ..Default::default() };
    let stats = compute_averages_and_variances(&image, &cfg);
    for z in 0..1 {
      for y in 0..8 {
        for x in 0..8 {
          let avg = stats.average(x, y, z);
          assert!((avg.x - 0.5).abs() < 1e-6);
          assert!((avg.w - 1.0).abs() < 1e-6);
          let var = stats.variance(x, y, z);
          assert!(var.x.abs() < 1e-6, "var.x = {}", var.x);
          assert!(var.w.abs() < 1e-6, "var.w = {}", var.w);
        }
      }
    }
  }

  #[test]
  fn output_shape_matches_logical_image_size() {
    let padding = 1;
    let data = constant_image(4, 4, padding, [0.1, 0.2, 0.3, 1.0]);
    let image = Image { xsize: 4, ysize: 4, zsize: 1, padding, data: &data };
    let cfg = StatsConfig { rgb_radius: 1, alpha_radius: 1, ..Default::default() };
    let stats = compute_averages_and_variances(&image, &cfg);
    assert_eq!(stats.averages.len(), 16);
    assert_eq!(stats.alpha_averages.len(), 16);
    assert_eq!(stats.variances.len(), 16);
  }
}
