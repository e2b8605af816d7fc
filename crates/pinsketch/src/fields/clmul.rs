//! PCLMULQDQ-accelerated GF(2^b) backend (x86_64).
//!
//! One carryless multiply forms the 2b-bit product; two folds against the
//! modulus reduce it. Fields whose modulus is a trinomial get a cheaper
//! shift/XOR reduction ([`ClmulTriElem`]). Inversion runs an Itoh–Tsujii
//! ladder over compile-time 2^k-power transforms instead of the generic
//! backend's extended GCD.
//!
//! # Safety
//!
//! This is the only module with `unsafe` code. The kernels require
//! PCLMULQDQ; sketch construction verifies `platform::caps()` before
//! instantiating either element type, so every live element value implies
//! the instruction set is present.

#![allow(unsafe_code)]
// This module is intrinsics-heavy; keep unsafe blocks readable.
#![allow(unsafe_op_in_unsafe_fn)]

use core::marker::PhantomData;
use core::ops::{Add, AddAssign};

use crate::bitio::{mask64, BitReader, BitWriter};
use crate::lintrans::{lfsr_step, LinTrans};
use crate::siphash::siphash24_u64;

use super::{Field, Multiplier, Word};

/// Domain-separation key for seed derivation: "CLMULFld".
const SEED_KEY: u64 = 0x434c_4d55_4c46_6c64;

// ─────────────────────────────────────────────────────────────────────────────
// Kernels
// ─────────────────────────────────────────────────────────────────────────────

mod kernel {
  use core::arch::x86_64::{_mm_clmulepi64_si128, _mm_cvtsi128_si64, _mm_set_epi64x, _mm_srli_si128};

  use crate::bitio::mask64;

  /// Carryless 64×64 → 128 multiply; returns (high, low).
  #[inline]
  #[target_feature(enable = "sse2", enable = "pclmulqdq")]
  pub(super) unsafe fn clmul64(a: u64, b: u64) -> (u64, u64) {
    let product = _mm_clmulepi64_si128::<0x00>(_mm_set_epi64x(0, a as i64), _mm_set_epi64x(0, b as i64));
    let lo = _mm_cvtsi128_si64(product) as u64;
    // Extract the high lane without requiring SSE4.1.
    let hi = _mm_cvtsi128_si64(_mm_srli_si128::<8>(product)) as u64;
    (hi, lo)
  }

  /// Bits of the 128-bit value (hi, lo) at positions ≥ `shift` (2 ≤ shift ≤ 64).
  #[inline]
  const fn shr128(hi: u64, lo: u64, shift: u32) -> u64 {
    if shift == 64 { hi } else { (hi << (64 - shift)) | (lo >> shift) }
  }

  /// Multiply modulo x^bits + modulus.
  ///
  /// Two folds suffice: the moduli in use all satisfy
  /// 2·deg(modulus) − 2 < bits, so the second fold's contribution already
  /// fits inside the field width.
  #[target_feature(enable = "sse2", enable = "pclmulqdq")]
  pub(super) unsafe fn mul_reduce(a: u64, b: u64, bits: u32, modulus: u64) -> u64 {
    let (hi, lo) = clmul64(a, b);
    let high1 = shr128(hi, lo, bits);
    let (red_hi, red_lo) = clmul64(high1, modulus);
    let high2 = shr128(red_hi, red_lo, bits);
    let (_, red2) = clmul64(high2, modulus);
    (lo ^ red_lo ^ red2) & mask64(bits)
  }

  /// Multiply modulo the trinomial x^bits + x^pos + 1.
  ///
  /// The folded terms stay within 64 bits for every trinomial in the table
  /// (bits − 2 + pos ≤ 62), so the reduction is plain shifts and XORs.
  #[target_feature(enable = "sse2", enable = "pclmulqdq")]
  pub(super) unsafe fn mul_trinomial(a: u64, b: u64, bits: u32, pos: u32) -> u64 {
    let (hi, lo) = clmul64(a, b);
    let high1 = shr128(hi, lo, bits);
    let red1 = high1 ^ (high1 << pos);
    let high2 = shr128(0, red1, bits);
    let red2 = high2 ^ (high2 << pos);
    (lo ^ red1 ^ red2) & mask64(bits)
  }
}

/// Itoh–Tsujii exponentiation to a^(2^bits − 2), i.e. the inverse (0 ↦ 0).
///
/// `sqr[k]` must hold the a ↦ a^(2^(2^k)) transform for k in 0..5. The
/// ladder chains log₂(bits − 1) multiplications between table-driven power
/// steps.
fn inv_ladder(x1: u64, bits: u32, sqr: &[LinTrans; 5], mul: impl Fn(u64, u64) -> u64) -> u64 {
  let e = bits - 1;
  let x2 = if e >= 2 { mul(sqr[0].apply(x1), x1) } else { 0 };
  let x4 = if e >= 4 { mul(sqr[1].apply(x2), x2) } else { 0 };
  let x8 = if e >= 8 { mul(sqr[2].apply(x4), x4) } else { 0 };
  let x16 = if e >= 16 { mul(sqr[3].apply(x8), x8) } else { 0 };
  let x32 = if e >= 32 { mul(sqr[4].apply(x16), x16) } else { 0 };

  let mut r = if e >= 32 {
    x32
  } else if e >= 16 {
    x16
  } else if e >= 8 {
    x8
  } else if e >= 4 {
    x4
  } else if e >= 2 {
    x2
  } else {
    x1
  };
  if e >= 32 && e & 16 != 0 {
    r = mul(sqr[4].apply(r), x16);
  }
  if e >= 16 && e & 8 != 0 {
    r = mul(sqr[3].apply(r), x8);
  }
  if e >= 8 && e & 4 != 0 {
    r = mul(sqr[2].apply(r), x4);
  }
  if e >= 4 && e & 2 != 0 {
    r = mul(sqr[1].apply(r), x2);
  }
  if e >= 2 && e & 1 != 0 {
    r = mul(sqr[0].apply(r), x1);
  }
  sqr[0].apply(r)
}

// ─────────────────────────────────────────────────────────────────────────────
// Element types
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! define_clmul_elem {
  ($(#[$doc:meta])* $name:ident, $mulname:ident, |$a:ident, $b:ident| $mul:expr) => {
    $(#[$doc])*
    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Debug, Hash)]
    #[repr(transparent)]
    pub(crate) struct $name<R: Word, const B: u32, const M: u64>(R);

    impl<R: Word, const B: u32, const M: u64> $name<R, B, M> {
      const MASK: u64 = mask64(B);
      const SQR: LinTrans = LinTrans::squaring(B, M);
      const SQR2: LinTrans = Self::SQR.compose(&Self::SQR);
      const SQR4: LinTrans = Self::SQR2.compose(&Self::SQR2);
      const SQR8: LinTrans = Self::SQR4.compose(&Self::SQR4);
      const SQR16: LinTrans = Self::SQR8.compose(&Self::SQR8);
      const QRT: LinTrans = LinTrans::half_trace(B, M);

      #[inline]
      fn from_raw(v: u64) -> Self {
        debug_assert!(v & !Self::MASK == 0);
        Self(R::from_u64(v))
      }

      #[inline]
      fn get(self) -> u64 {
        self.0.to_u64()
      }

      #[inline]
      fn mul_raw($a: u64, $b: u64) -> u64 {
        // SAFETY: construction of this element type is gated on
        // platform::caps() reporting PCLMUL support.
        unsafe { $mul }
      }
    }

    impl<R: Word, const B: u32, const M: u64> Add for $name<R, B, M> {
      type Output = Self;

      #[inline]
      fn add(self, rhs: Self) -> Self {
        Self::from_raw(self.get() ^ rhs.get())
      }
    }

    impl<R: Word, const B: u32, const M: u64> AddAssign for $name<R, B, M> {
      #[inline]
      fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
      }
    }

    impl<R: Word, const B: u32, const M: u64> Field for $name<R, B, M> {
      const BITS: u32 = B;

      type Multiplier = $mulname<R, B, M>;

      #[inline]
      fn zero() -> Self {
        Self::from_raw(0)
      }

      #[inline]
      fn one() -> Self {
        Self::from_raw(1)
      }

      #[inline]
      fn is_zero(self) -> bool {
        self.get() == 0
      }

      #[inline]
      fn is_one(self) -> bool {
        self.get() == 1
      }

      #[inline]
      fn mul(self, other: Self) -> Self {
        Self::from_raw(Self::mul_raw(self.get(), other.get()))
      }

      #[inline]
      fn sqr(self) -> Self {
        Self::from_raw(Self::SQR.apply(self.get()))
      }

      #[inline]
      fn qrt(self) -> Self {
        Self::from_raw(Self::QRT.apply(self.get()))
      }

      fn inv(self) -> Self {
        let tables = [Self::SQR, Self::SQR2, Self::SQR4, Self::SQR8, Self::SQR16];
        Self::from_raw(inv_ladder(self.get(), B, &tables, Self::mul_raw))
      }

      #[inline]
      fn mul2(self) -> Self {
        Self::from_raw(lfsr_step(self.get(), B, M))
      }

      fn from_seed(seed: u64) -> Self {
        let mut count = u64::from(B) << 32;
        loop {
          let candidate = siphash24_u64(SEED_KEY, seed, count) & Self::MASK;
          if candidate != 0 {
            return Self::from_raw(candidate);
          }
          count += 1;
        }
      }

      #[inline]
      fn from_u64(v: u64) -> Self {
        Self::from_raw(v & Self::MASK)
      }

      #[inline]
      fn to_u64(self) -> u64 {
        self.get()
      }

      #[inline]
      fn serialize(self, out: &mut BitWriter<'_>) {
        out.write(self.get(), B);
      }

      #[inline]
      fn deserialize(input: &mut BitReader<'_>) -> Self {
        Self::from_raw(input.read(B))
      }
    }

    /// Multiplication is cheap here, so the "table" is just the operand.
    pub(crate) struct $mulname<R: Word, const B: u32, const M: u64> {
      val: u64,
      _repr: PhantomData<R>,
    }

    impl<R: Word, const B: u32, const M: u64> Multiplier<$name<R, B, M>> for $mulname<R, B, M> {
      #[inline]
      fn new(a: $name<R, B, M>) -> Self {
        Self { val: a.get(), _repr: PhantomData }
      }

      #[inline]
      fn apply(&self, x: $name<R, B, M>) -> $name<R, B, M> {
        $name::from_raw($name::<R, B, M>::mul_raw(self.val, x.get()))
      }
    }
  };
}

define_clmul_elem!(
  /// GF(2^B) element reduced with two carryless folds against the modulus.
  ClmulElem,
  ClmulMultiplier,
  |a, b| kernel::mul_reduce(a, b, B, M)
);

define_clmul_elem!(
  /// GF(2^B) element for trinomial moduli, reduced with shifts and XORs.
  ClmulTriElem,
  ClmulTriMultiplier,
  |a, b| kernel::mul_trinomial(a, b, B, (M ^ 1).trailing_zeros())
);

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fields::generic::GenericElem;
  use crate::fields::MODULI;
  use crate::lintrans::gf_mulmod;

  fn have_pclmul() -> bool {
    platform::caps().has(platform::x86::PCLMUL)
  }

  type C8 = ClmulElem<u8, 8, { MODULI[8] }>;
  type C32 = ClmulElem<u32, 32, { MODULI[32] }>;
  type C64 = ClmulElem<u64, 64, { MODULI[64] }>;
  type T12 = ClmulTriElem<u16, 12, { MODULI[12] }>;
  type T63 = ClmulTriElem<u64, 63, { MODULI[63] }>;

  #[test]
  fn mul_matches_portable_reduction() {
    if !have_pclmul() {
      return;
    }
    for a in 0..128u64 {
      for b in 0..128u64 {
        assert_eq!(C8::from_u64(a).mul(C8::from_u64(b)).to_u64(), gf_mulmod(a, b, 8, MODULI[8]));
      }
    }
    for (a, b) in [(1u64, 1u64), (0x8000_0001, 0xffff_ffff), (0xdead_beef, 0x1234_5678)] {
      assert_eq!(
        C32::from_u64(a).mul(C32::from_u64(b)).to_u64(),
        gf_mulmod(a, b, 32, MODULI[32])
      );
    }
    for (a, b) in [(u64::MAX, u64::MAX), (1u64 << 63, 0x1b), (0x0123_4567_89ab_cdef, 42)] {
      assert_eq!(
        C64::from_u64(a).mul(C64::from_u64(b)).to_u64(),
        gf_mulmod(a, b, 64, MODULI[64])
      );
    }
  }

  #[test]
  fn trinomial_mul_matches_portable_reduction() {
    if !have_pclmul() {
      return;
    }
    for a in (0..(1u64 << 12)).step_by(17) {
      for b in (0..(1u64 << 12)).step_by(29) {
        assert_eq!(T12::from_u64(a).mul(T12::from_u64(b)).to_u64(), gf_mulmod(a, b, 12, MODULI[12]));
      }
    }
    let m63 = (1u64 << 63) - 1;
    for (a, b) in [(m63, m63), (1u64 << 62, 3), (0x7edc_ba98_7654_3210, 0x1fff)] {
      assert_eq!(T63::from_u64(a).mul(T63::from_u64(b)).to_u64(), gf_mulmod(a, b, 63, MODULI[63]));
    }
  }

  #[test]
  fn ladder_inverse_matches_extgcd_inverse() {
    if !have_pclmul() {
      return;
    }
    for v in 1..256u64 {
      let expected = GenericElem::<u8, 8, { MODULI[8] }>::from_u64(v).inv().to_u64();
      assert_eq!(C8::from_u64(v).inv().to_u64(), expected, "v = {v:#x}");
    }
    for v in [1u64, 2, 0xdead_beef_0bad_cafe, u64::MAX] {
      let a = C64::from_u64(v);
      assert!(a.mul(a.inv()).is_one(), "v = {v:#x}");
    }
    assert!(C64::zero().inv().is_zero());
  }

  #[test]
  fn power_tables_are_iterated_squarings() {
    if !have_pclmul() {
      return;
    }
    for v in [1u64, 0xabcd_ef01, u64::MAX >> 3] {
      let a = C64::from_u64(v);
      assert_eq!(C64::SQR2.apply(a.to_u64()), a.sqr().sqr().to_u64());
      assert_eq!(C64::SQR4.apply(a.to_u64()), a.sqr().sqr().sqr().sqr().to_u64());
    }
  }

  #[test]
  fn seed_derivation_differs_from_generic_backend() {
    // Different domain constants on purpose; the basis never crosses the
    // wire, so the backends are free to sample differently.
    let g = GenericElem::<u32, 32, { MODULI[32] }>::from_seed(7).to_u64();
    let c = C32::from_seed(7).to_u64();
    assert_ne!(g, c);
  }
}
