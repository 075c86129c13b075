// Vector/matrix math kernel: fixed-size float vectors, 2x2/3x3/4x4 matrices,
// monic polynomial root solvers, eigenvalue/eigenvector extraction.
//
// Transliterated from mathlib.h/mathlib.cpp (vecN<T>/matN templates) into
// concrete f32 types. Swizzle proxy objects are replaced by plain methods
// returning new vectors.

/// Quiet NaN with the low bits of `arg` folded in, matching the source's
/// `nan(int)` helper bit for bit.
pub fn nan(arg: u32) -> f32 {
  f32::from_bits(arg | 0x7FC0_0000)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 { pub x: f32, pub y: f32 }

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 { pub x: f32, pub y: f32, pub z: f32 }

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec4 { pub x: f32, pub y: f32, pub z: f32, pub w: f32 }

impl Vec2 {
  pub fn new(x: f32, y: f32) -> Self { Self { x, y } }
  pub fn splat(v: f32) -> Self { Self::new(v, v) }
  pub fn dot(self, o: Self) -> f32 { self.x * o.x + self.y * o.y }
  pub fn length_sqr(self) -> f32 { self.dot(self) }
  pub fn length(self) -> f32 { self.length_sqr().sqrt() }
  pub fn yx(self) -> Self { Self::new(self.y, self.x) }
  pub fn normalize(self) -> Self {
    let l = self.length();
    if l > 0.0 { Self::new(self.x / l, self.y / l) } else { self }
  }
  pub fn l1_norm(self) -> f32 { self.x.abs() + self.y.abs() }
  pub fn is_nan(self) -> bool { self.x.is_nan() || self.y.is_nan() }
}

impl std::ops::Sub for Vec2 {
  type Output = Self;
  fn sub(self, o: Self) -> Self { Self::new(self.x - o.x, self.y - o.y) }
}
impl std::ops::Add for Vec2 {
  type Output = Self;
  fn add(self, o: Self) -> Self { Self::new(self.x + o.x, self.y + o.y) }
}
impl std::ops::Mul<f32> for Vec2 {
  type Output = Self;
  fn mul(self, s: f32) -> Self { Self::new(self.x * s, self.y * s) }
}

impl Vec3 {
  pub fn new(x: f32, y: f32, z: f32) -> Self { Self { x, y, z } }
  pub fn splat(v: f32) -> Self { Self::new(v, v, v) }
  pub fn dot(self, o: Self) -> f32 { self.x * o.x + self.y * o.y + self.z * o.z }
  pub fn length_sqr(self) -> f32 { self.dot(self) }
  pub fn length(self) -> f32 { self.length_sqr().sqrt() }
  pub fn cross(self, o: Self) -> Self {
    // p.yzx*q.zxy - p.zxy*q.yzx
    Self::new(
      self.y * o.z - self.z * o.y,
      self.z * o.x - self.x * o.z,
      self.x * o.y - self.y * o.x,
    )
  }
  pub fn normalize(self) -> Self {
    let l = self.length();
    if l > 0.0 { self * (1.0 / l) } else { self }
  }
  pub fn is_nan(self) -> bool { self.x.is_nan() || self.y.is_nan() || self.z.is_nan() }
}

impl std::ops::Sub for Vec3 {
  type Output = Self;
  fn sub(self, o: Self) -> Self { Self::new(self.x - o.x, self.y - o.y, self.z - o.z) }
}
impl std::ops::Add for Vec3 {
  type Output = Self;
  fn add(self, o: Self) -> Self { Self::new(self.x + o.x, self.y + o.y, self.z + o.z) }
}
impl std::ops::Mul<f32> for Vec3 {
  type Output = Self;
  fn mul(self, s: f32) -> Self { Self::new(self.x * s, self.y * s, self.z * s) }
}

impl Vec4 {
  pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self { Self { x, y, z, w } }
  pub fn splat(v: f32) -> Self { Self::new(v, v, v, v) }
  pub fn dot(self, o: Self) -> f32 { self.x * o.x + self.y * o.y + self.z * o.z + self.w * o.w }
  pub fn length_sqr(self) -> f32 { self.dot(self) }
  pub fn length(self) -> f32 { self.length_sqr().sqrt() }
  pub fn xyz(self) -> Vec3 { Vec3::new(self.x, self.y, self.z) }
  pub fn normalize(self) -> Self {
    let l = self.length();
    if l > 0.0 { self * (1.0 / l) } else { self }
  }
  pub fn is_nan(self) -> bool {
    self.x.is_nan() || self.y.is_nan() || self.z.is_nan() || self.w.is_nan()
  }
}

impl std::ops::Sub for Vec4 {
  type Output = Self;
  fn sub(self, o: Self) -> Self { Self::new(self.x - o.x, self.y - o.y, self.z - o.z, self.w - o.w) }
}
impl std::ops::Add for Vec4 {
  type Output = Self;
  fn add(self, o: Self) -> Self { Self::new(self.x + o.x, self.y + o.y, self.z + o.z, self.w + o.w) }
}
impl std::ops::Mul<f32> for Vec4 {
  type Output = Self;
  fn mul(self, s: f32) -> Self { Self::new(self.x * s, self.y * s, self.z * s, self.w * s) }
}

/// 4D generalized cross product: a 4-vector orthogonal to the three given
/// 4-vectors. Direction is unspecified; callers only rely on squared length
/// and perpendicularity (spec 4.A).
pub fn gcross(p: Vec4, q: Vec4, r: Vec4) -> Vec4 {
  let drop = |v: Vec4, skip: usize| -> Vec3 {
    match skip {
      0 => Vec3::new(v.y, v.z, v.w),
      1 => Vec3::new(v.x, v.z, v.w),
      2 => Vec3::new(v.x, v.y, v.w),
      _ => Vec3::new(v.x, v.y, v.z),
    }
  };
  let comp = |i: usize| -> f32 {
    let pn = drop(p, i);
    let qn = drop(q, i);
    let rn = drop(r, i);
    let v = pn.dot(qn.cross(rn));
    if i % 2 == 1 { -v } else { v }
  };
  Vec4::new(comp(0), comp(1), comp(2), comp(3))
}

#[derive(Clone, Copy, Debug)]
pub struct Mat2 { pub rows: [Vec2; 2] }
#[derive(Clone, Copy, Debug)]
pub struct Mat3 { pub rows: [Vec3; 3] }
#[derive(Clone, Copy, Debug)]
pub struct Mat4 { pub rows: [Vec4; 4] }

impl Mat2 {
  pub fn new(r0: Vec2, r1: Vec2) -> Self { Self { rows: [r0, r1] } }
  pub fn trace(&self) -> f32 { self.rows[0].x + self.rows[1].y }
  pub fn determinant(&self) -> f32 {
    self.rows[0].x * self.rows[1].y - self.rows[0].y * self.rows[1].x
  }
  pub fn transform(&self, v: Vec2) -> Vec2 { Vec2::new(self.rows[0].dot(v), self.rows[1].dot(v)) }
  pub fn adjugate(&self) -> Self {
    Self::new(
      Vec2::new(self.rows[1].y, -self.rows[0].y),
      Vec2::new(-self.rows[1].x, self.rows[0].x),
    )
  }
  pub fn invert(&self) -> Self {
    let rdet = 1.0 / self.determinant();
    let a = self.adjugate();
    Self::new(a.rows[0] * rdet, a.rows[1] * rdet)
  }
  /// Monic characteristic polynomial coefficients, lowest order first,
  /// leading 1 omitted: (-trace, det) such that lambda^2 + p[1]*lambda + p[0] == 0
  /// Matches the source convention `characteristic_poly` uses for mat3/mat4;
  /// for mat2 it reduces to (det, -trace).
  pub fn characteristic_poly(&self) -> Vec2 {
    Vec2::new(self.determinant(), -self.trace())
  }
  pub fn eigenvalues(&self) -> Vec2 {
    solve_monic2(self.characteristic_poly())
  }
  pub fn eigenvector(&self, lambda: f32) -> Vec2 {
    let row0 = Vec2::new(self.rows[0].x - lambda, self.rows[0].y);
    let row1 = Vec2::new(self.rows[1].x, self.rows[1].y - lambda);
    // Perpendicular to a row (a,b) is (b,-a), not the bare swap (b,a): the
    // swap alone isn't orthogonal unless a or b is zero.
    if row0.l1_norm() > row1.l1_norm() {
      Vec2::new(row0.y, -row0.x)
    } else {
      Vec2::new(row1.y, -row1.x)
    }
  }
}

impl Mat3 {
  pub fn new(r0: Vec3, r1: Vec3, r2: Vec3) -> Self { Self { rows: [r0, r1, r2] } }
  pub fn trace(&self) -> f32 { self.rows[0].x + self.rows[1].y + self.rows[2].z }
  pub fn determinant(&self) -> f32 {
    let r = &self.rows;
    r[0].x * (r[1].y * r[2].z - r[1].z * r[2].y)
      - r[0].y * (r[1].x * r[2].z - r[1].z * r[2].x)
      + r[0].z * (r[1].x * r[2].y - r[1].y * r[2].x)
  }
  pub fn transform(&self, v: Vec3) -> Vec3 {
    Vec3::new(self.rows[0].dot(v), self.rows[1].dot(v), self.rows[2].dot(v))
  }
  pub fn adjugate(&self) -> Self {
    let r = &self.rows;
    let c0 = Vec3::new(r[1].y * r[2].z - r[1].z * r[2].y,
                        r[0].z * r[2].y - r[0].y * r[2].z,
                        r[0].y * r[1].z - r[0].z * r[1].y);
    let c1 = Vec3::new(r[1].z * r[2].x - r[1].x * r[2].z,
                        r[0].x * r[2].z - r[0].z * r[2].x,
                        r[0].z * r[1].x - r[0].x * r[1].z);
    let c2 = Vec3::new(r[1].x * r[2].y - r[1].y * r[2].x,
                        r[0].y * r[2].x - r[0].x * r[2].y,
                        r[0].x * r[1].y - r[0].y * r[1].x);
    // adjugate is the transpose of the cofactor matrix; rows of adjugate are columns above
    Self::new(
      Vec3::new(c0.x, c1.x, c2.x),
      Vec3::new(c0.y, c1.y, c2.y),
      Vec3::new(c0.z, c1.z, c2.z),
    )
  }
  pub fn invert(&self) -> Self {
    let rdet = 1.0 / self.determinant();
    let a = self.adjugate();
    Self::new(a.rows[0] * rdet, a.rows[1] * rdet, a.rows[2] * rdet)
  }
  /// (-det, c1, -trace) where c1 = sum_{i<j}(M_ii M_jj - M_ij M_ji).
  pub fn characteristic_poly(&self) -> Vec3 {
    let r = &self.rows;
    let c1 = (r[0].x * r[1].y - r[0].y * r[1].x)
      + (r[0].x * r[2].z - r[0].z * r[2].x)
      + (r[1].y * r[2].z - r[1].z * r[2].y);
    Vec3::new(-self.determinant(), c1, -self.trace())
  }
  pub fn eigenvalues(&self) -> Vec3 {
    solve_monic3(self.characteristic_poly())
  }
  pub fn eigenvector(&self, lambda: f32) -> Vec3 {
    let r0 = Vec3::new(self.rows[0].x - lambda, self.rows[0].y, self.rows[0].z);
    let r1 = Vec3::new(self.rows[1].x, self.rows[1].y - lambda, self.rows[1].z);
    let r2 = Vec3::new(self.rows[2].x, self.rows[2].y, self.rows[2].z - lambda);
    let v1 = r0.cross(r1);
    let v2 = r1.cross(r2);
    if v1.length_sqr() > v2.length_sqr() { v1 } else { v2 }
  }
}

impl Mat4 {
  pub fn new(r0: Vec4, r1: Vec4, r2: Vec4, r3: Vec4) -> Self { Self { rows: [r0, r1, r2, r3] } }
  pub fn trace(&self) -> f32 {
    self.rows[0].x + self.rows[1].y + self.rows[2].z + self.rows[3].w
  }
  pub fn transform(&self, v: Vec4) -> Vec4 {
    Vec4::new(self.rows[0].dot(v), self.rows[1].dot(v), self.rows[2].dot(v), self.rows[3].dot(v))
  }
  /// Laplace expansion along row 0 via cross products of the 3-vector
  /// sub-rows, per spec 4.A.
  pub fn determinant(&self) -> f32 {
    let r = &self.rows;
    let sub = |row: Vec4, skip: usize| -> Vec3 {
      match skip {
        0 => Vec3::new(row.y, row.z, row.w),
        1 => Vec3::new(row.x, row.z, row.w),
        2 => Vec3::new(row.x, row.y, row.w),
        _ => Vec3::new(row.x, row.y, row.z),
      }
    };
    let mut det = 0.0;
    let signs = [1.0f32, -1.0, 1.0, -1.0];
    let a = [r[0].x, r[0].y, r[0].z, r[0].w];
    for i in 0..4 {
      let b1 = sub(r[1], i);
      let b2 = sub(r[2], i);
      let b3 = sub(r[3], i);
      // minor determinant of the 3x3 built from rows 1,2,3 with column i removed
      let minor = b1.dot(b2.cross(b3));
      det += signs[i] * a[i] * minor;
    }
    det
  }
  pub fn adjugate(&self) -> Self {
    // Generic cofactor expansion; not the hand-optimized bpc/tpc form of the
    // source, but produces the same adjugate matrix.
    let r = &self.rows;
    let m = [
      [r[0].x, r[0].y, r[0].z, r[0].w],
      [r[1].x, r[1].y, r[1].z, r[1].w],
      [r[2].x, r[2].y, r[2].z, r[2].w],
      [r[3].x, r[3].y, r[3].z, r[3].w],
    ];
    let minor3 = |rows: [usize; 3], cols: [usize; 3]| -> f32 {
      let g = |i: usize, j: usize| m[rows[i]][cols[j]];
      g(0, 0) * (g(1, 1) * g(2, 2) - g(1, 2) * g(2, 1))
        - g(0, 1) * (g(1, 0) * g(2, 2) - g(1, 2) * g(2, 0))
        + g(0, 2) * (g(1, 0) * g(2, 1) - g(1, 1) * g(2, 0))
    };
    let all = [0usize, 1, 2, 3];
    let without = |x: usize| -> [usize; 3] {
      let mut out = [0usize; 3];
      let mut k = 0;
      for &v in &all {
        if v != x { out[k] = v; k += 1; }
      }
      out
    };
    let mut cof = [[0f32; 4]; 4];
    for i in 0..4 {
      for j in 0..4 {
        let sign = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
        cof[i][j] = sign * minor3(without(i), without(j));
      }
    }
    // adjugate = transpose(cofactor)
    Self::new(
      Vec4::new(cof[0][0], cof[1][0], cof[2][0], cof[3][0]),
      Vec4::new(cof[0][1], cof[1][1], cof[2][1], cof[3][1]),
      Vec4::new(cof[0][2], cof[1][2], cof[2][2], cof[3][2]),
      Vec4::new(cof[0][3], cof[1][3], cof[2][3], cof[3][3]),
    )
  }
  pub fn invert(&self) -> Self {
    let rdet = 1.0 / self.determinant();
    let a = self.adjugate();
    Self::new(a.rows[0] * rdet, a.rows[1] * rdet, a.rows[2] * rdet, a.rows[3] * rdet)
  }
  /// Depress to the resolvent cubic's coefficients via the characteristic
  /// polynomial of the 3x3 principal structure described in mathlib.cpp;
  /// here computed directly from the four invariants of the 4x4 matrix.
  pub fn characteristic_poly(&self) -> Vec4 {
    let tr = self.trace();
    let m2 = mat4_mul(self, self);
    let tr2 = m2.trace();
    let m3 = mat4_mul(&m2, self);
    let tr3 = m3.trace();
    let det = self.determinant();
    // Newton's identities for a 4x4 matrix's characteristic polynomial
    // lambda^4 - e1 lambda^3 + e2 lambda^2 - e3 lambda + e4
    let e1 = tr;
    let e2 = (tr * tr - tr2) / 2.0;
    // Newton's identity: e3 = (e1^3 - 3*e1*tr2 + 2*tr3) / 6
    let e3 = (e1 * e1 * e1 - 3.0 * e1 * tr2 + 2.0 * tr3) / 6.0;
    let e4 = det;
    Vec4::new(e4, -e3, e2, -e1)
  }
  pub fn eigenvalues(&self) -> Vec4 {
    solve_monic4(self.characteristic_poly())
  }
  pub fn eigenvector(&self, lambda: f32) -> Vec4 {
    let r0 = Vec4::new(self.rows[0].x - lambda, self.rows[0].y, self.rows[0].z, self.rows[0].w);
    let r1 = Vec4::new(self.rows[1].x, self.rows[1].y - lambda, self.rows[1].z, self.rows[1].w);
    let r2 = Vec4::new(self.rows[2].x, self.rows[2].y, self.rows[2].z - lambda, self.rows[2].w);
    let r3 = Vec4::new(self.rows[3].x, self.rows[3].y, self.rows[3].z, self.rows[3].w - lambda);
    let v1 = gcross(r0, r1, r2);
    let v2 = gcross(r0, r1, r3);
    let v3 = gcross(r0, r2, r3);
    let v4 = gcross(r1, r2, r3);
    let (best12, l12) = if v1.length_sqr() > v2.length_sqr() { (v1, v1.length_sqr()) } else { (v2, v2.length_sqr()) };
    let (best34, l34) = if v3.length_sqr() > v4.length_sqr() { (v3, v3.length_sqr()) } else { (v4, v4.length_sqr()) };
    if l12 > l34 { best12 } else { best34 }
  }
}

impl Mat4 {
  pub fn mul(&self, other: &Mat4) -> Mat4 {
    mat4_mul(self, other)
  }
}

impl Mat2 {
  pub fn mul(&self, other: &Mat2) -> Mat2 {
    let row = |r: Vec2| -> Vec2 {
      Vec2::new(
        r.x * other.rows[0].x + r.y * other.rows[1].x,
        r.x * other.rows[0].y + r.y * other.rows[1].y,
      )
    };
    Mat2::new(row(self.rows[0]), row(self.rows[1]))
  }
}

impl Mat3 {
  pub fn mul(&self, other: &Mat3) -> Mat3 {
    let row = |r: Vec3| -> Vec3 {
      Vec3::new(
        r.x * other.rows[0].x + r.y * other.rows[1].x + r.z * other.rows[2].x,
        r.x * other.rows[0].y + r.y * other.rows[1].y + r.z * other.rows[2].y,
        r.x * other.rows[0].z + r.y * other.rows[1].z + r.z * other.rows[2].z,
      )
    };
    Mat3::new(row(self.rows[0]), row(self.rows[1]), row(self.rows[2]))
  }
}

fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
  let row = |r: Vec4| -> Vec4 {
    Vec4::new(
      r.x * b.rows[0].x + r.y * b.rows[1].x + r.z * b.rows[2].x + r.w * b.rows[3].x,
      r.x * b.rows[0].y + r.y * b.rows[1].y + r.z * b.rows[2].y + r.w * b.rows[3].y,
      r.x * b.rows[0].z + r.y * b.rows[1].z + r.z * b.rows[2].z + r.w * b.rows[3].z,
      r.x * b.rows[0].w + r.y * b.rows[1].w + r.z * b.rows[2].w + r.w * b.rows[3].w,
    )
  };
  Mat4::new(row(a.rows[0]), row(a.rows[1]), row(a.rows[2]), row(a.rows[3]))
}

/// Degree-2 closed form: p = (p0, p1), lambda^2 + p1*lambda + p0 == 0.
pub fn solve_monic2(p: Vec2) -> Vec2 {
  let disc = p.y * p.y - 4.0 * p.x;
  if disc < 0.0 {
    Vec2::new(nan(0), nan(0))
  } else {
    let v = disc.sqrt();
    Vec2::new((-p.y + v) * 0.5, (-p.y - v) * 0.5)
  }
}

/// Degree-3 monic solver via depressed-cubic scaling and the Cardano /
/// trigonometric dichotomy on nq^3 vs r^2, per spec 4.A. The depressed
/// cubic solved internally is `y^3 - 3*nq*y - 2*r = 0`.
pub fn solve_monic3(p: Vec3) -> Vec3 {
  let ax = p.x.abs();
  let ay = p.y.abs();
  let az = p.z.abs();
  let scal0 = az.max(ax.cbrt()).max(ay.cbrt() * ay.cbrt()) / 1_048_576.0; // 2^20
  let scal = if scal0 > 0.0 { scal0 } else { 1.0 };
  let inv = 1.0 / scal;
  let px = p.x * (inv * inv * inv);
  let py = p.y * (inv * inv);
  let pz = p.z * inv;

  let bb = pz * pz;
  let nq = bb - py;
  let r = 1.5 * (py * pz - px) - pz * bb;
  let nq3 = nq * nq * nq;
  let r2 = r * r;

  let y = if nq3 < r2 {
    let v = (r2 - nq3).sqrt();
    let root = cbrt_signed(r + v) + cbrt_signed(r - v);
    Vec3::new(root, nan(0), nan(0))
  } else {
    let nqsqrt = nq.max(0.0).sqrt();
    let denom = nq3.max(0.0).sqrt().max(1e-30);
    let theta = (r / denom).clamp(-1.0, 1.0).acos();
    const TWO_PI: f32 = std::f32::consts::TAU;
    let t0 = 2.0 * nqsqrt * (theta / 3.0).cos();
    let t1 = 2.0 * nqsqrt * ((theta - TWO_PI) / 3.0).cos();
    let t2 = 2.0 * nqsqrt * ((theta - 2.0 * TWO_PI) / 3.0).cos();
    Vec3::new(t0, t1, t2)
  };

  // X = y - pz/3 (depression shift in scaled space); x = scal * X.
  let shift = pz / 3.0;
  Vec3::new(
    scal * (y.x - shift),
    if y.y.is_nan() { y.y } else { scal * (y.y - shift) },
    if y.z.is_nan() { y.z } else { scal * (y.z - shift) },
  )
}

fn cbrt_signed(v: f32) -> f32 {
  if v < 0.0 { -(-v).cbrt() } else { v.cbrt() }
}

/// Degree-4 monic solver: depress to y^4 + q y^2 + r y + s, solve the
/// resolvent cubic, pick the largest real root, then factor into two
/// quadratics (Ferrari's method). Per spec 4.A / 9, this quartic path is
/// "not overflow-safe" for extreme dynamic range; the eigen-fallback
/// path in `directions.rs` remains reachable for callers who hit this.
pub fn solve_monic4(p: Vec4) -> Vec4 {
  let bias = p.w / 4.0;
  let bias2 = bias * bias;
  let q = p.z - 6.0 * bias2;
  let r = p.y - 2.0 * p.z * bias + 8.0 * bias2 * bias;
  let s = p.x - p.y * bias + p.z * bias2 - 3.0 * bias2 * bias2;

  // Resolvent cubic: m^3 + q*m^2 + (q^2/4 - s)*m - r^2/8 == 0.
  let monic = Vec3::new(-(r * r) / 8.0, (q * q) / 4.0 - s, q);
  let roots3 = solve_monic3(monic);
  let mut m = 1e-37f32;
  for cand in [roots3.x, roots3.y, roots3.z] {
    if !cand.is_nan() && cand > m { m = cand; }
  }

  let sqrt2m = (2.0 * m).max(0.0).sqrt();
  let half_r_over = if sqrt2m > 1e-20 { r / (2.0 * sqrt2m) } else { 0.0 };

  // y^2 + sqrt2m*y + (q/2 + m - r/(2 sqrt2m)) == 0
  let quad_a = Vec2::new(q / 2.0 + m - half_r_over, sqrt2m);
  // y^2 - sqrt2m*y + (q/2 + m + r/(2 sqrt2m)) == 0
  let quad_b = Vec2::new(q / 2.0 + m + half_r_over, -sqrt2m);

  let ra = solve_monic2(quad_a);
  let rb = solve_monic2(quad_b);

  let mut res = Vec4::new(ra.x, ra.y, rb.x, rb.y);
  if res.x.is_nan() {
    res = Vec4::new(res.z, res.w, res.x, res.y);
  }
  Vec4::new(res.x - bias, res.y - bias, res.z - bias, res.w - bias)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trace_determinant_invert_2x2() {
    // E1: M = [[1,2],[3,4]] => trace=5, det=-2, invert = [[-2,1],[1.5,-0.5]]
    let m = Mat2::new(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0));
    assert!((m.trace() - 5.0).abs() < 1e-6);
    assert!((m.determinant() - (-2.0)).abs() < 1e-6);
    let inv = m.invert();
    assert!((inv.rows[0].x - (-2.0)).abs() < 1e-5);
    assert!((inv.rows[0].y - 1.0).abs() < 1e-5);
    assert!((inv.rows[1].x - 1.5).abs() < 1e-5);
    assert!((inv.rows[1].y - (-0.5)).abs() < 1e-5);
  }

  #[test]
  fn invert_times_self_is_identity_2x2() {
    let m = Mat2::new(Vec2::new(2.0, 1.0), Vec2::new(1.0, 3.0));
    let inv = m.invert();
    let col0 = m.transform(Vec2::new(inv.rows[0].x, inv.rows[1].x));
    let col1 = m.transform(Vec2::new(inv.rows[0].y, inv.rows[1].y));
    assert!((col0.x - 1.0).abs() < 1e-4 && col0.y.abs() < 1e-4);
    assert!(col1.x.abs() < 1e-4 && (col1.y - 1.0).abs() < 1e-4);
  }

  #[test]
  fn diagonal_eigenvalues_3x3() {
    // E2: M = diag(3,1,2) => eigenvalues permutation of {3,1,2}
    let m = Mat3::new(
      Vec3::new(3.0, 0.0, 0.0),
      Vec3::new(0.0, 1.0, 0.0),
      Vec3::new(0.0, 0.0, 2.0),
    );
    let e = m.eigenvalues();
    let mut got = [e.x, e.y, e.z];
    got.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert!((got[0] - 1.0).abs() < 1e-3);
    assert!((got[1] - 2.0).abs() < 1e-3);
    assert!((got[2] - 3.0).abs() < 1e-3);

    let vec_for_3 = m.eigenvector(3.0);
    // eigenvector for lambda=3 should point along x
    assert!(vec_for_3.x.abs() > vec_for_3.y.abs());
    assert!(vec_for_3.x.abs() > vec_for_3.z.abs());
  }

  #[test]
  fn characteristic_poly_zero_at_eigenvalues() {
    let m = Mat3::new(
      Vec3::new(2.0, 1.0, 0.0),
      Vec3::new(1.0, 2.0, 1.0),
      Vec3::new(0.0, 1.0, 2.0),
    );
    let p = m.characteristic_poly();
    let eig = m.eigenvalues();
    for lambda in [eig.x, eig.y, eig.z] {
      if lambda.is_nan() { continue; }
      let value = lambda * lambda * lambda + p.z * lambda * lambda + p.y * lambda + p.x;
      assert!(value.abs() < 1e-2, "char poly at {lambda} = {value}");
    }
  }

  #[test]
  fn nan_has_requested_bits_set() {
    let v = nan(0x5);
    assert!(v.is_nan());
    assert_eq!(v.to_bits() & 0x7FC0_0000, 0x7FC0_0000);
  }
}
