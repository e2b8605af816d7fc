//! GF(2)-linear transforms over field elements.
//!
//! Squaring, 2^k powers and the half-trace are all GF(2)-linear maps on a
//! b-bit field element, so each is representable as a b×b bit matrix. A
//! [`LinTrans`] stores one row per input bit (the image of that basis bit);
//! applying the transform XORs the rows selected by the input's set bits.
//!
//! All transforms used by the field backends are generated at compile time
//! by `const fn` from the field's modulus, so they live as read-only static
//! data and are identical across builds, a requirement for the wire format,
//! whose contents depend on the squaring map through syndrome reconstruction.

use crate::bitio::mask64;

// ─────────────────────────────────────────────────────────────────────────────
// Scalar GF(2)[x] helpers (const-evaluable)
// ─────────────────────────────────────────────────────────────────────────────

/// One LFSR step: multiply by x modulo `x^bits + modulus`.
#[inline]
#[must_use]
pub(crate) const fn lfsr_step(a: u64, bits: u32, modulus: u64) -> u64 {
  let carry = (a >> (bits - 1)) & 1;
  let shifted = (a << 1) & mask64(bits);
  if carry == 1 { shifted ^ modulus } else { shifted }
}

/// Carryless multiply modulo `x^bits + modulus`, by shift-and-fold.
#[must_use]
pub(crate) const fn gf_mulmod(a: u64, b: u64, bits: u32, modulus: u64) -> u64 {
  let mut ret = 0u64;
  let mut shifted = a;
  let mut i = 0;
  while i < bits {
    if (b >> i) & 1 == 1 {
      ret ^= shifted;
    }
    shifted = lfsr_step(shifted, bits, modulus);
    i += 1;
  }
  ret
}

// ─────────────────────────────────────────────────────────────────────────────
// LinTrans
// ─────────────────────────────────────────────────────────────────────────────

/// A GF(2)-linear map on b-bit values, b ≤ 64.
///
/// `rows[i]` is the image of basis bit `i`; rows past `bits` are zero.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LinTrans {
  rows: [u64; 64],
  bits: u32,
}

impl LinTrans {
  /// Apply the transform to `x`.
  #[inline]
  #[must_use]
  pub(crate) const fn apply(&self, x: u64) -> u64 {
    let mut ret = 0u64;
    let mut i = 0;
    while i < self.bits {
      if (x >> i) & 1 == 1 {
        ret ^= self.rows[i as usize];
      }
      i += 1;
    }
    ret
  }

  /// The composition `self ∘ other` (apply `other` first).
  #[must_use]
  pub(crate) const fn compose(&self, other: &Self) -> Self {
    let mut rows = [0u64; 64];
    let mut i = 0;
    while i < other.bits as usize {
      rows[i] = self.apply(other.rows[i]);
      i += 1;
    }
    Self { rows, bits: other.bits }
  }

  /// The map a ↦ a·x^i mod p for the multiplier `a`: row i is `a` shifted
  /// through the LFSR i times. Multiplying by an arbitrary element then
  /// costs `bits` lookups and XORs.
  #[must_use]
  pub(crate) const fn shifts_of(a: u64, bits: u32, modulus: u64) -> Self {
    let mut rows = [0u64; 64];
    let mut cur = a;
    let mut i = 0;
    while i < bits as usize {
      rows[i] = cur;
      cur = lfsr_step(cur, bits, modulus);
      i += 1;
    }
    Self { rows, bits }
  }

  /// The squaring map a ↦ a² mod p: row i is x^(2i) mod p.
  #[must_use]
  pub(crate) const fn squaring(bits: u32, modulus: u64) -> Self {
    let mut rows = [0u64; 64];
    let mut xi = 1u64; // x^i mod p
    let mut i = 0;
    while i < bits as usize {
      rows[i] = gf_mulmod(xi, xi, bits, modulus);
      xi = lfsr_step(xi, bits, modulus);
      i += 1;
    }
    Self { rows, bits }
  }

  /// A partial inverse of a ↦ a² + a.
  ///
  /// For inputs in the image of that map (trace-zero elements), the result y
  /// satisfies y² + y = a. For other inputs the result is well-defined but
  /// meaningless; callers validate by recomputing y² + y.
  #[must_use]
  pub(crate) const fn half_trace(bits: u32, modulus: u64) -> Self {
    let sqr = Self::squaring(bits, modulus);
    let n = bits as usize;

    // Gaussian elimination of the images T(e_i) = e_i² + e_i, tracking the
    // preimage combination alongside. Pivots are chosen at the lowest set
    // bit, which keeps the elimination scan a single ascending pass.
    let mut img = [0u64; 64];
    let mut pre = [0u64; 64];
    let mut pivot = [usize::MAX; 64];
    let mut i = 0;
    while i < n {
      let mut im = sqr.rows[i] ^ (1u64 << i);
      let mut pr = 1u64 << i;
      let mut p = 0;
      while p < n {
        if (im >> p) & 1 == 1 && pivot[p] != usize::MAX {
          im ^= img[pivot[p]];
          pr ^= pre[pivot[p]];
        }
        p += 1;
      }
      img[i] = im;
      pre[i] = pr;
      if im != 0 {
        pivot[im.trailing_zeros() as usize] = i;
      }
      i += 1;
    }

    // Solve T(y) = e_j for every basis bit. The map has a one-dimensional
    // kernel {0, 1}, so exactly one basis direction is unreachable; fix one
    // unreachable w and solve e_j + w there instead. Summed over the set
    // bits of a trace-zero input, the w contributions cancel.
    let mut rows = [0u64; 64];
    let mut unsolvable = u64::MAX; // index of the first unreachable basis bit
    let mut j = 0;
    while j < n {
      let (acc, ok) = solve(&img, &pre, &pivot, n, 1u64 << j);
      if ok {
        rows[j] = acc;
      } else if unsolvable == u64::MAX {
        unsolvable = j as u64;
      }
      j += 1;
    }
    if unsolvable != u64::MAX {
      let w = 1u64 << unsolvable;
      let mut j = 0;
      while j < n {
        let (acc, ok) = solve(&img, &pre, &pivot, n, (1u64 << j) ^ w);
        if rows[j] == 0 && !is_solvable(&img, &pivot, n, 1u64 << j) && ok {
          rows[j] = acc;
        }
        j += 1;
      }
    }

    Self { rows, bits }
  }
}

/// Solve the eliminated system for `target`; returns (combination, solvable).
const fn solve(img: &[u64; 64], pre: &[u64; 64], pivot: &[usize; 64], n: usize, target: u64) -> (u64, bool) {
  let mut v = target;
  let mut acc = 0u64;
  let mut p = 0;
  while p < n {
    if (v >> p) & 1 == 1 {
      if pivot[p] == usize::MAX {
        return (0, false);
      }
      v ^= img[pivot[p]];
      acc ^= pre[pivot[p]];
    }
    p += 1;
  }
  (acc, v == 0)
}

const fn is_solvable(img: &[u64; 64], pivot: &[usize; 64], n: usize, target: u64) -> bool {
  let mut v = target;
  let mut p = 0;
  while p < n {
    if (v >> p) & 1 == 1 {
      if pivot[p] == usize::MAX {
        return false;
      }
      v ^= img[pivot[p]];
    }
    p += 1;
  }
  v == 0
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  // x^8 + x^4 + x^3 + x + 1
  const BITS: u32 = 8;
  const MOD: u64 = 0x1b;

  #[test]
  fn lfsr_step_reduces() {
    assert_eq!(lfsr_step(1, BITS, MOD), 2);
    assert_eq!(lfsr_step(0x80, BITS, MOD), MOD);
  }

  #[test]
  fn mulmod_matches_known_products() {
    // Classic GF(2^8) example: 0x53 * 0xCA = 0x01 under the AES modulus.
    assert_eq!(gf_mulmod(0x53, 0xca, BITS, MOD), 0x01);
    assert_eq!(gf_mulmod(0, 0xff, BITS, MOD), 0);
    assert_eq!(gf_mulmod(1, 0xff, BITS, MOD), 0xff);
  }

  #[test]
  fn squaring_table_matches_mulmod() {
    let sqr = LinTrans::squaring(BITS, MOD);
    for a in 0..256u64 {
      assert_eq!(sqr.apply(a), gf_mulmod(a, a, BITS, MOD), "a = {a:#x}");
    }
  }

  #[test]
  fn squaring_is_linear() {
    let sqr = LinTrans::squaring(11, 0x5);
    for a in 0..64u64 {
      for b in 0..64u64 {
        assert_eq!(sqr.apply(a ^ b), sqr.apply(a) ^ sqr.apply(b));
      }
    }
  }

  #[test]
  fn compose_is_double_squaring() {
    let sqr = LinTrans::squaring(BITS, MOD);
    let sqr2 = sqr.compose(&sqr);
    for a in 0..256u64 {
      assert_eq!(sqr2.apply(a), sqr.apply(sqr.apply(a)));
    }
  }

  #[test]
  fn shifts_of_matches_mulmod() {
    let a = 0x57;
    let mul = LinTrans::shifts_of(a, BITS, MOD);
    for b in 0..256u64 {
      assert_eq!(mul.apply(b), gf_mulmod(a, b, BITS, MOD), "b = {b:#x}");
    }
  }

  #[test]
  fn half_trace_solves_trace_zero_inputs() {
    for (bits, modulus) in [(2, 0x3u64), (5, 0x5), (8, 0x1b), (13, 0x1b)] {
      let qrt = LinTrans::half_trace(bits, modulus);
      let sqr = LinTrans::squaring(bits, modulus);
      let mut solvable = 0u64;
      for a in 0..(1u64 << bits) {
        let y = qrt.apply(a);
        if sqr.apply(y) ^ y == a {
          solvable += 1;
        }
      }
      // Exactly half of all field elements have a solution to y² + y = a.
      assert_eq!(solvable, 1u64 << (bits - 1), "bits = {bits}");
    }
  }
}
