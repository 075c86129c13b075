// Endpoint unpack (spec 4.D). Grounded on astc_color_unquantize.cpp: every
// function here is a direct transliteration of one function in that file,
// kept in the same order, operating on the quantization table from
// `tables.rs` instead of a process-wide C array.
//
// `alpha_force_use_of_hdr` is an explicit parameter (spec 9 redesign flag)
// rather than the source's module-level global.

use crate::block::DecodeMode;
use crate::tables::unquantize;

/// Closed set of ASTC endpoint formats (spec 4.D), one variant per
/// `FMT_*` constant in the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointFormat {
  Luminance,
  LuminanceDelta,
  HdrLuminanceSmallRange,
  HdrLuminanceLargeRange,
  LuminanceAlpha,
  LuminanceAlphaDelta,
  RgbScale,
  RgbScaleAlpha,
  HdrRgbScale,
  Rgb,
  RgbDelta,
  HdrRgb,
  Rgba,
  RgbaDelta,
  HdrRgbLdrAlpha,
  HdrRgba,
}

impl EndpointFormat {
  /// Caller-visible code counts per spec 6.
  pub fn code_count(self) -> usize {
    use EndpointFormat::*;
    match self {
      Luminance | LuminanceDelta | HdrLuminanceSmallRange | HdrLuminanceLargeRange => 2,
      LuminanceAlpha | LuminanceAlphaDelta | RgbScale | HdrRgbScale => 4,
      Rgb | RgbDelta | RgbScaleAlpha | HdrRgb => 6,
      Rgba | RgbaDelta | HdrRgbLdrAlpha | HdrRgba => 8,
    }
  }
}

/// Two 16-bit-per-channel RGBA endpoints (spec 3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Endpoint {
  pub r: u16,
  pub g: u16,
  pub b: u16,
  pub a: u16,
}

impl Endpoint {
  fn new(r: i32, g: i32, b: i32, a: i32) -> Self {
    Self { r: r as u16, g: g as u16, b: b as u16, a: a as u16 }
  }
}

fn clamp255(v: i32) -> i32 {
  v.clamp(0, 255)
}

/// Common LDR delta rule (spec 4.D): move the top bit of `v1` into a 9th
/// bit of `v0`, mask+sign-extend `v1` to 7 bits, shift both right by 1,
/// `v1 += v0`, clamp to [0,255].
fn delta_decode(v0_raw: i32, v1_raw: i32) -> (i32, i32) {
  let mut v0 = v0_raw | ((v1_raw & 0x80) << 1);
  let mut v1 = v1_raw & 0x7F;
  if v1 & 0x40 != 0 {
    v1 -= 0x80;
  }
  v0 >>= 1;
  v1 >>= 1;
  v1 += v0;
  (v0, v1)
}

fn rgb_delta_unpack(input: &[u8; 6], level: usize) -> (i32, i32, i32, i32, i32, i32, u8) {
  let r0i = unquantize(level, input[0]) as i32;
  let g0i = unquantize(level, input[2]) as i32;
  let b0i = unquantize(level, input[4]) as i32;
  let r1i = unquantize(level, input[1]) as i32;
  let g1i = unquantize(level, input[3]) as i32;
  let b1i = unquantize(level, input[5]) as i32;

  let (r0, r1) = delta_decode(r0i, r1i);
  let (g0, g1) = delta_decode(g0i, g1i);
  let (b0, b1) = delta_decode(b0i, b1i);

  let rgbsum = r1 + g1 + b1;
  let r1 = r1 + r0;
  let g1 = g1 + g0;
  let b1 = b1 + b0;

  let (r0e, g0e, b0e, r1e, g1e, b1e, order) = if rgbsum >= 0 {
    (r0, g0, b0, r1, g1, b1, 0u8)
  } else {
    ((r1 + b1) >> 1, (g1 + b1) >> 1, b1, (r0 + b0) >> 1, (g0 + b0) >> 1, b0, 1u8)
  };

  (clamp255(r0e), clamp255(g0e), clamp255(b0e), clamp255(r1e), clamp255(g1e), clamp255(b1e), order)
}

/// Common RGB "blue contraction" rule (spec 4.D): swap when endpoint 0's
/// channel sum exceeds endpoint 1's. Returns `(ep0, ep1, order)`.
fn rgb_unpack(input: &[u8; 6], level: usize) -> (i32, i32, i32, i32, i32, i32, u8) {
  let r0 = unquantize(level, input[0]) as i32;
  let r1 = unquantize(level, input[1]) as i32;
  let g0 = unquantize(level, input[2]) as i32;
  let g1 = unquantize(level, input[3]) as i32;
  let b0 = unquantize(level, input[4]) as i32;
  let b1 = unquantize(level, input[5]) as i32;

  if r0 + g0 + b0 > r1 + g1 + b1 {
    let r0c = (r0 + b0) >> 1;
    let g0c = (g0 + b0) >> 1;
    let r1c = (r1 + b1) >> 1;
    let g1c = (g1 + b1) >> 1;
    (r1c, g1c, b1, r0c, g0c, b0, 1)
  } else {
    (r0, g0, b0, r1, g1, b1, 0)
  }
}

fn luminance_unpack(input: &[u8; 2], level: usize) -> (Endpoint, Endpoint) {
  let l0 = unquantize(level, input[0]) as i32;
  let l1 = unquantize(level, input[1]) as i32;
  (Endpoint::new(l0, l0, l0, 255), Endpoint::new(l1, l1, l1, 255))
}

fn luminance_delta_unpack(input: &[u8; 2], level: usize) -> (Endpoint, Endpoint) {
  let v0 = unquantize(level, input[0]) as i32;
  let v1 = unquantize(level, input[1]) as i32;
  let l0 = (v0 >> 2) | (v1 & 0xC0);
  let l1 = (l0 + (v1 & 0x3F)).min(255);
  (Endpoint::new(l0, l0, l0, 255), Endpoint::new(l1, l1, l1, 255))
}

fn luminance_alpha_unpack(input: &[u8; 4], level: usize) -> (Endpoint, Endpoint) {
  let l0 = unquantize(level, input[0]) as i32;
  let l1 = unquantize(level, input[1]) as i32;
  let a0 = unquantize(level, input[2]) as i32;
  let a1 = unquantize(level, input[3]) as i32;
  (Endpoint::new(l0, l0, l0, a0), Endpoint::new(l1, l1, l1, a1))
}

fn luminance_alpha_delta_unpack(input: &[u8; 4], level: usize) -> (Endpoint, Endpoint) {
  let l0i = unquantize(level, input[0]) as i32;
  let l1i = unquantize(level, input[1]) as i32;
  let a0i = unquantize(level, input[2]) as i32;
  let a1i = unquantize(level, input[3]) as i32;
  let (l0, l1) = delta_decode(l0i, l1i);
  let (a0, a1) = delta_decode(a0i, a1i);
  let l1 = clamp255(l1);
  let a1 = clamp255(a1);
  (Endpoint::new(l0, l0, l0, a0), Endpoint::new(l1, l1, l1, a1))
}

fn rgb_scale_unpack(input: &[u8; 4], level: usize) -> (Endpoint, Endpoint) {
  let ir = unquantize(level, input[0]) as i32;
  let ig = unquantize(level, input[1]) as i32;
  let ib = unquantize(level, input[2]) as i32;
  let iscale = unquantize(level, input[3]) as i32;
  let ep1 = Endpoint::new(ir, ig, ib, 255);
  let ep0 = Endpoint::new((ir * iscale) >> 8, (ig * iscale) >> 8, (ib * iscale) >> 8, 255);
  (ep0, ep1)
}

fn rgb_scale_alpha_unpack(input: &[u8; 6], level: usize) -> (Endpoint, Endpoint) {
  let (mut ep0, mut ep1) = rgb_scale_unpack(&[input[0], input[1], input[2], input[3]], level);
  ep0.a = unquantize(level, input[4]) as u16;
  ep1.a = unquantize(level, input[5]) as u16;
  (ep0, ep1)
}

fn rgba_unpack(input: &[u8; 8], level: usize) -> (Endpoint, Endpoint, u8) {
  let rgb6: [u8; 6] = input[0..6].try_into().unwrap();
  let (r0, g0, b0, r1, g1, b1, order) = rgb_unpack(&rgb6, level);
  let (a0, a1) = if order == 0 {
    (unquantize(level, input[6]) as i32, unquantize(level, input[7]) as i32)
  } else {
    (unquantize(level, input[7]) as i32, unquantize(level, input[6]) as i32)
  };
  (Endpoint::new(r0, g0, b0, a0), Endpoint::new(r1, g1, b1, a1), order)
}

fn rgba_delta_unpack(input: &[u8; 8], level: usize) -> (Endpoint, Endpoint, u8) {
  let a0i = unquantize(level, input[6]) as i32;
  let a1i = unquantize(level, input[7]) as i32;
  let (a0, a1) = delta_decode(a0i, a1i);
  let a1 = clamp255(a1);

  let rgb6: [u8; 6] = input[0..6].try_into().unwrap();
  let (r0, g0, b0, r1, g1, b1, order) = rgb_delta_unpack(&rgb6, level);
  let (ep0a, ep1a) = if order == 0 { (a0, a1) } else { (a1, a0) };
  (Endpoint::new(r0, g0, b0, ep0a), Endpoint::new(r1, g1, b1, ep1a), order)
}

const HDR_SHAMTS: [u32; 6] = [1, 1, 2, 3, 4, 5];

fn hdr_rgbo_unpack3(input: &[u8; 4], level: usize) -> (Endpoint, Endpoint) {
  let v0 = unquantize(level, input[0]) as i32;
  let v1 = unquantize(level, input[1]) as i32;
  let v2 = unquantize(level, input[2]) as i32;
  let v3 = unquantize(level, input[3]) as i32;

  let modeval = ((v0 & 0xC0) >> 6) | (((v1 & 0x80) >> 7) << 2) | (((v2 & 0x80) >> 7) << 3);

  let (majcomp, mode) = if (modeval & 0xC) != 0xC {
    (modeval >> 2, modeval & 3)
  } else if modeval != 0xF {
    (modeval & 3, 4)
  } else {
    (0, 5)
  };

  let mut red = v0 & 0x3F;
  let mut green = v1 & 0x1F;
  let mut blue = v2 & 0x1F;
  let mut scale = v3 & 0x1F;

  let bit0 = (v1 >> 6) & 1;
  let bit1 = (v1 >> 5) & 1;
  let bit2 = (v2 >> 6) & 1;
  let bit3 = (v2 >> 5) & 1;
  let bit4 = (v3 >> 7) & 1;
  let bit5 = (v3 >> 6) & 1;
  let bit6 = (v3 >> 5) & 1;

  let ohcomp = 1i32 << mode;

  if ohcomp & 0x30 != 0 { green |= bit0 << 6; }
  if ohcomp & 0x3A != 0 { green |= bit1 << 5; }
  if ohcomp & 0x30 != 0 { blue |= bit2 << 6; }
  if ohcomp & 0x3A != 0 { blue |= bit3 << 5; }

  if ohcomp & 0x3D != 0 { scale |= bit6 << 5; }
  if ohcomp & 0x2D != 0 { scale |= bit5 << 6; }
  if ohcomp & 0x04 != 0 { scale |= bit4 << 7; }

  if ohcomp & 0x3B != 0 { red |= bit4 << 6; }
  if ohcomp & 0x04 != 0 { red |= bit3 << 6; }

  if ohcomp & 0x10 != 0 { red |= bit5 << 7; }
  if ohcomp & 0x0F != 0 { red |= bit2 << 7; }

  if ohcomp & 0x05 != 0 { red |= bit1 << 8; }
  if ohcomp & 0x0A != 0 { red |= bit0 << 8; }

  if ohcomp & 0x05 != 0 { red |= bit0 << 9; }
  if ohcomp & 0x02 != 0 { red |= bit6 << 9; }

  if ohcomp & 0x01 != 0 { red |= bit3 << 10; }
  if ohcomp & 0x02 != 0 { red |= bit5 << 10; }

  let shamt = HDR_SHAMTS[mode as usize];
  red <<= shamt;
  green <<= shamt;
  blue <<= shamt;
  scale <<= shamt;

  if mode != 5 {
    green = red - green;
    blue = red - blue;
  }

  match majcomp {
    1 => std::mem::swap(&mut red, &mut green),
    2 => std::mem::swap(&mut red, &mut blue),
    _ => {}
  }

  let red0 = red - scale;
  let green0 = green - scale;
  let blue0 = blue - scale;

  let red = red.max(0);
  let green = green.max(0);
  let blue = blue.max(0);
  let red0 = red0.max(0);
  let green0 = green0.max(0);
  let blue0 = blue0.max(0);

  (
    Endpoint::new(red0 << 4, green0 << 4, blue0 << 4, 0x7800),
    Endpoint::new(red << 4, green << 4, blue << 4, 0x7800),
  )
}

const HDR_DBITS: [u32; 8] = [7, 6, 7, 6, 5, 6, 5, 6];

fn hdr_rgb_unpack3(input: &[u8; 6], level: usize) -> (Endpoint, Endpoint) {
  let v0 = unquantize(level, input[0]) as i32;
  let v1 = unquantize(level, input[1]) as i32;
  let v2 = unquantize(level, input[2]) as i32;
  let v3 = unquantize(level, input[3]) as i32;
  let v4 = unquantize(level, input[4]) as i32;
  let v5 = unquantize(level, input[5]) as i32;

  let modeval = ((v1 & 0x80) >> 7) | (((v2 & 0x80) >> 7) << 1) | (((v3 & 0x80) >> 7) << 2);
  let majcomp = ((v4 & 0x80) >> 7) | (((v5 & 0x80) >> 7) << 1);

  if majcomp == 3 {
    return (
      Endpoint::new(v0 << 8, v2 << 8, (v4 & 0x7F) << 9, 0x7800),
      Endpoint::new(v1 << 8, v3 << 8, (v5 & 0x7F) << 9, 0x7800),
    );
  }

  let mut a = v0 | ((v1 & 0x40) << 2);
  let mut b0 = v2 & 0x3f;
  let mut b1 = v3 & 0x3f;
  let mut c = v1 & 0x3f;
  let mut d0 = v4 & 0x7f;
  let mut d1 = v5 & 0x7f;

  let dbits = HDR_DBITS[modeval as usize];

  let bit0 = (v2 >> 6) & 1;
  let bit1 = (v3 >> 6) & 1;
  let bit2 = (v4 >> 6) & 1;
  let bit3 = (v5 >> 6) & 1;
  let bit4 = (v4 >> 5) & 1;
  let bit5 = (v5 >> 5) & 1;

  let ohmod = 1i32 << modeval;
  if ohmod & 0xA4 != 0 { a |= bit0 << 9; }
  if ohmod & 0x8 != 0 { a |= bit2 << 9; }
  if ohmod & 0x50 != 0 { a |= bit4 << 9; }

  if ohmod & 0x50 != 0 { a |= bit5 << 10; }
  if ohmod & 0xA0 != 0 { a |= bit1 << 10; }

  if ohmod & 0xC0 != 0 { a |= bit2 << 11; }

  if ohmod & 0x4 != 0 { c |= bit1 << 6; }
  if ohmod & 0xE8 != 0 { c |= bit3 << 6; }

  if ohmod & 0x20 != 0 { c |= bit2 << 7; }

  if ohmod & 0x5B != 0 { b0 |= bit0 << 6; }
  if ohmod & 0x5B != 0 { b1 |= bit1 << 6; }

  if ohmod & 0x12 != 0 { b0 |= bit2 << 7; }
  if ohmod & 0x12 != 0 { b1 |= bit3 << 7; }

  if ohmod & 0xAF != 0 { d0 |= bit4 << 5; }
  if ohmod & 0xAF != 0 { d1 |= bit5 << 5; }
  if ohmod & 0x5 != 0 { d0 |= bit2 << 6; }
  if ohmod & 0x5 != 0 { d1 |= bit3 << 6; }

  // sign-extend d0/d1 to `dbits` bits via a 32-bit left/right shift pair.
  let sx_shamt = 32 - dbits;
  let mut d0x = d0;
  d0x <<= sx_shamt;
  d0x >>= sx_shamt;
  let mut d1x = d1;
  d1x <<= sx_shamt;
  d1x >>= sx_shamt;
  d0 = d0x;
  d1 = d1x;

  let val_shamt = (modeval >> 1) ^ 3;
  a <<= val_shamt;
  b0 <<= val_shamt;
  b1 <<= val_shamt;
  c <<= val_shamt;
  d0 <<= val_shamt;
  d1 <<= val_shamt;

  let red1 = a;
  let green1 = a - b0;
  let blue1 = a - b1;
  let red0 = a - c;
  let green0 = a - b0 - c - d0;
  let blue0 = a - b1 - c - d1;

  let clamp12 = |v: i32| v.clamp(0, 0xFFF);
  let (mut red0, mut green0, mut blue0) = (clamp12(red0), clamp12(green0), clamp12(blue0));
  let (mut red1, mut green1, mut blue1) = (clamp12(red1), clamp12(green1), clamp12(blue1));

  match majcomp {
    1 => {
      std::mem::swap(&mut red0, &mut green0);
      std::mem::swap(&mut red1, &mut green1);
    }
    2 => {
      std::mem::swap(&mut red0, &mut blue0);
      std::mem::swap(&mut red1, &mut blue1);
    }
    _ => {}
  }

  (
    Endpoint::new(red0 << 4, green0 << 4, blue0 << 4, 0x7800),
    Endpoint::new(red1 << 4, green1 << 4, blue1 << 4, 0x7800),
  )
}

fn hdr_luminance_small_range_unpack(input: &[u8; 2], level: usize) -> (Endpoint, Endpoint) {
  let v0 = unquantize(level, input[0]) as i32;
  let v1 = unquantize(level, input[1]) as i32;

  let (y0, mut y1) = if v0 & 0x80 != 0 {
    (((v1 & 0xE0) << 4) | ((v0 & 0x7F) << 2), (v1 & 0x1F) << 2)
  } else {
    (((v1 & 0xF0) << 4) | ((v0 & 0x7F) << 1), (v1 & 0xF) << 1)
  };
  y1 += y0;
  let y1 = y1.min(0xFFF);
  (Endpoint::new(y0 << 4, y0 << 4, y0 << 4, 0x7800), Endpoint::new(y1 << 4, y1 << 4, y1 << 4, 0x7800))
}

fn hdr_luminance_large_range_unpack(input: &[u8; 2], level: usize) -> (Endpoint, Endpoint) {
  let v0 = unquantize(level, input[0]) as i32;
  let v1 = unquantize(level, input[1]) as i32;
  let (y0, y1) = if v1 >= v0 { (v0 << 4, v1 << 4) } else { ((v1 << 4) + 8, (v0 << 4) - 8) };
  (Endpoint::new(y0 << 4, y0 << 4, y0 << 4, 0x7800), Endpoint::new(y1 << 4, y1 << 4, y1 << 4, 0x7800))
}

fn hdr_alpha_unpack(input: &[u8; 2], level: usize) -> (i32, i32) {
  let mut v6 = unquantize(level, input[0]) as i32;
  let mut v7 = unquantize(level, input[1]) as i32;

  let selector = ((v6 >> 7) & 1) | ((v7 >> 6) & 2);
  v6 &= 0x7F;
  v7 &= 0x7F;

  let (mut a0, mut a1) = if selector == 3 {
    (v6 << 5, v7 << 5)
  } else {
    v6 |= (v7 << (selector + 1)) & 0x780;
    v7 &= 0x3f >> selector;
    v7 ^= 32 >> selector;
    v7 -= 32 >> selector;
    v6 <<= 4 - selector;
    v7 <<= 4 - selector;
    v7 += v6;
    (v6, v7.clamp(0, 0xFFF))
  };

  a0 <<= 4;
  a1 <<= 4;
  (a0, a1)
}

/// Unpacks the given format's raw quantization codes into two 16-bit-per-
/// channel RGBA endpoints, applying the decode-mode post-processing of
/// spec 4.D. Returns `(ep0, ep1, nan_endpoint)`.
pub fn unpack_color_endpoints(
  decode_mode: DecodeMode,
  format: EndpointFormat,
  quantization_level: usize,
  input: &[u8],
  alpha_force_use_of_hdr: bool,
) -> (Endpoint, Endpoint, bool) {
  use EndpointFormat::*;

  let (mut ep0, mut ep1, rgb_hdr, mut alpha_hdr): (Endpoint, Endpoint, bool, i8) = match format {
    Luminance => {
      let (a, b) = luminance_unpack(&input[0..2].try_into().unwrap(), quantization_level);
      (a, b, false, 0)
    }
    LuminanceDelta => {
      let (a, b) = luminance_delta_unpack(&input[0..2].try_into().unwrap(), quantization_level);
      (a, b, false, 0)
    }
    HdrLuminanceSmallRange => {
      let (a, b) = hdr_luminance_small_range_unpack(&input[0..2].try_into().unwrap(), quantization_level);
      (a, b, true, -1)
    }
    HdrLuminanceLargeRange => {
      let (a, b) = hdr_luminance_large_range_unpack(&input[0..2].try_into().unwrap(), quantization_level);
      (a, b, true, -1)
    }
    LuminanceAlpha => {
      let (a, b) = luminance_alpha_unpack(&input[0..4].try_into().unwrap(), quantization_level);
      (a, b, false, 0)
    }
    LuminanceAlphaDelta => {
      let (a, b) = luminance_alpha_delta_unpack(&input[0..4].try_into().unwrap(), quantization_level);
      (a, b, false, 0)
    }
    RgbScale => {
      let (a, b) = rgb_scale_unpack(&input[0..4].try_into().unwrap(), quantization_level);
      (a, b, false, 0)
    }
    RgbScaleAlpha => {
      let (a, b) = rgb_scale_alpha_unpack(&input[0..6].try_into().unwrap(), quantization_level);
      (a, b, false, 0)
    }
    HdrRgbScale => {
      let (a, b) = hdr_rgbo_unpack3(&input[0..4].try_into().unwrap(), quantization_level);
      (a, b, true, -1)
    }
    Rgb => {
      let (r0, g0, b0, r1, g1, b1, _order) = rgb_unpack(&input[0..6].try_into().unwrap(), quantization_level);
      (Endpoint::new(r0, g0, b0, 255), Endpoint::new(r1, g1, b1, 255), false, 0)
    }
    RgbDelta => {
      let (r0, g0, b0, r1, g1, b1, _order) = rgb_delta_unpack(&input[0..6].try_into().unwrap(), quantization_level);
      (Endpoint::new(r0, g0, b0, 255), Endpoint::new(r1, g1, b1, 255), false, 0)
    }
    HdrRgb => {
      let (a, b) = hdr_rgb_unpack3(&input[0..6].try_into().unwrap(), quantization_level);
      (a, b, true, -1)
    }
    Rgba => {
      let (a, b, _order) = rgba_unpack(&input[0..8].try_into().unwrap(), quantization_level);
      (a, b, false, 0)
    }
    RgbaDelta => {
      let (a, b, _order) = rgba_delta_unpack(&input[0..8].try_into().unwrap(), quantization_level);
      (a, b, false, 0)
    }
    HdrRgbLdrAlpha => {
      let (mut a, mut b) = hdr_rgb_unpack3(&input[0..6].try_into().unwrap(), quantization_level);
      a.a = unquantize(quantization_level, input[6]) as u16;
      b.a = unquantize(quantization_level, input[7]) as u16;
      (a, b, true, 0)
    }
    HdrRgba => {
      let (mut a, mut b) = hdr_rgb_unpack3(&input[0..6].try_into().unwrap(), quantization_level);
      let (a0, a1) = hdr_alpha_unpack(&input[6..8].try_into().unwrap(), quantization_level);
      a.a = a0 as u16;
      b.a = a1 as u16;
      (a, b, true, 1)
    }
  };

  if alpha_hdr == -1 {
    if alpha_force_use_of_hdr {
      ep0.a = 0x7800;
      ep1.a = 0x7800;
      alpha_hdr = 1;
    } else {
      ep0.a = 0x00FF;
      ep1.a = 0x00FF;
      alpha_hdr = 0;
    }
  }

  let mut nan_endpoint = false;
  match decode_mode {
    DecodeMode::LdrSrgb => {
      if rgb_hdr {
        ep0 = Endpoint { r: 0xFF00, g: 0x0000, b: 0xFF00, a: 0xFF00 };
        ep1 = Endpoint { r: 0xFF00, g: 0x0000, b: 0xFF00, a: 0xFF00 };
      } else {
        ep0 = mul257(ep0);
        ep1 = mul257(ep1);
      }
    }
    DecodeMode::Ldr => {
      if rgb_hdr {
        ep0 = Endpoint { r: 0xFFFF, g: 0xFFFF, b: 0xFFFF, a: 0xFFFF };
        ep1 = Endpoint { r: 0xFFFF, g: 0xFFFF, b: 0xFFFF, a: 0xFFFF };
        nan_endpoint = true;
      } else {
        ep0 = mul257(ep0);
        ep1 = mul257(ep1);
      }
    }
    DecodeMode::Hdr => {
      if !rgb_hdr {
        ep0.r = ep0.r.wrapping_mul(257);
        ep0.g = ep0.g.wrapping_mul(257);
        ep0.b = ep0.b.wrapping_mul(257);
        ep1.r = ep1.r.wrapping_mul(257);
        ep1.g = ep1.g.wrapping_mul(257);
        ep1.b = ep1.b.wrapping_mul(257);
      }
      if alpha_hdr == 0 {
        ep0.a = ep0.a.wrapping_mul(257);
        ep1.a = ep1.a.wrapping_mul(257);
      }
    }
  }

  (ep0, ep1, nan_endpoint)
}

/// LDR 8-bit to 16-bit expansion (spec 6): `value16 = value8 * 257`.
fn mul257(ep: Endpoint) -> Endpoint {
  Endpoint {
    r: (ep.r as u32 * 257).min(0xFFFF) as u16,
    g: (ep.g as u32 * 257).min(0xFFFF) as u16,
    b: (ep.b as u32 * 257).min(0xFFFF) as u16,
    a: (ep.a as u32 * 257).min(0xFFFF) as u16,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ldr_luminance_unpack_and_expand() {
    // E3: format=FMT_LUMINANCE, input={200,50}, trivial quantization
    // (level with 256 steps is identity) => ep0=(200,...), ep1=(50,...);
    // after DECODE_LDR expansion ep0 = 200*257 = 51400.
    let level = crate::tables::NUM_QUANT_LEVELS - 1;
    let input = [200u8, 50u8];
    let (ep0, ep1, nan_ep) = unpack_color_endpoints(DecodeMode::Ldr, EndpointFormat::Luminance, level, &input, false);
    assert_eq!(ep0, Endpoint { r: 51400, g: 51400, b: 51400, a: 65535 });
    assert_eq!(ep1, Endpoint { r: 12850, g: 12850, b: 12850, a: 65535 });
    assert!(!nan_ep);
  }

  #[test]
  fn blue_contraction_swaps_and_reports_order() {
    // E4: format=FMT_RGB, input={100,10,100,10,100,10}, trivial quantization.
    // r0+g0+b0=300 > r1+g1+b1=30, so endpoints are swapped; order flag is 1.
    let level = crate::tables::NUM_QUANT_LEVELS - 1;
    let input = [100u8, 10, 100, 10, 100, 10];
    let (r0, g0, b0, r1, g1, b1, order) = rgb_unpack(&input, level);
    assert_eq!(order, 1);
    // endpoint "0" in the output is the *original* endpoint 1, blue-contracted.
    assert_eq!((r0, g0, b0), (10, 10, 10));
    assert_eq!((r1, g1, b1), (100, 100, 100));
  }

  #[test]
  fn alpha_delta_clamps_at_both_ends() {
    // E5: whatever raw codes delta_decode is fed, the post-delta value is
    // clamped into [0,255] rather than wrapping or overflowing the byte.
    let (_, v1_high) = delta_decode(255, 0x80);
    assert_eq!(clamp255(v1_high), 255);

    let (_, v1_low) = delta_decode(0, 0x40);
    assert_eq!(clamp255(v1_low), 0);
  }

  #[test]
  fn nan_endpoint_set_iff_ldr_decode_of_hdr_format() {
    let level = 10;
    let input = [0u8; 4];
    let (_, _, nan_ep) = unpack_color_endpoints(DecodeMode::Ldr, EndpointFormat::HdrRgbScale, level, &input, false);
    assert!(nan_ep);
    let (_, _, nan_ep2) = unpack_color_endpoints(DecodeMode::Hdr, EndpointFormat::HdrRgbScale, level, &input, false);
    assert!(!nan_ep2);
    let (_, _, nan_ep3) = unpack_color_endpoints(DecodeMode::Ldr, EndpointFormat::Luminance, level, &input, false);
    assert!(!nan_ep3);
  }
}
