//! Portable table-driven GF(2^b) backend.
//!
//! Multiplication walks a b-step LFSR over one operand, conditionally
//! XOR-ing at each set bit of the other; reduction is folded into the LFSR
//! step. Repeated multiplication by the same operand goes through a
//! precomputed shift table instead ([`GenericMultiplier`]), and inversion
//! uses the extended GCD over GF(2)[x].

use core::marker::PhantomData;
use core::ops::{Add, AddAssign};

use crate::bitio::{mask64, BitReader, BitWriter};
use crate::lintrans::{gf_mulmod, lfsr_step, LinTrans};
use crate::siphash::siphash24_u64;

use super::{Field, Multiplier, Word};

/// Domain-separation key for seed derivation: "IntField".
const SEED_KEY: u64 = 0x496e_7446_6965_6c64;

/// GF(2^B) element, modulus x^B + M, stored in `R`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Debug, Hash)]
#[repr(transparent)]
pub(crate) struct GenericElem<R: Word, const B: u32, const M: u64>(R);

impl<R: Word, const B: u32, const M: u64> GenericElem<R, B, M> {
  const MASK: u64 = mask64(B);
  const SQR: LinTrans = LinTrans::squaring(B, M);
  const QRT: LinTrans = LinTrans::half_trace(B, M);

  /// Wrap a value already reduced below 2^B.
  #[inline]
  fn from_raw(v: u64) -> Self {
    debug_assert!(v & !Self::MASK == 0);
    Self(R::from_u64(v))
  }

  #[inline]
  fn get(self) -> u64 {
    self.0.to_u64()
  }
}

impl<R: Word, const B: u32, const M: u64> Add for GenericElem<R, B, M> {
  type Output = Self;

  #[inline]
  fn add(self, rhs: Self) -> Self {
    Self::from_raw(self.get() ^ rhs.get())
  }
}

impl<R: Word, const B: u32, const M: u64> AddAssign for GenericElem<R, B, M> {
  #[inline]
  fn add_assign(&mut self, rhs: Self) {
    *self = *self + rhs;
  }
}

impl<R: Word, const B: u32, const M: u64> Field for GenericElem<R, B, M> {
  const BITS: u32 = B;

  type Multiplier = GenericMultiplier<R, B, M>;

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
    Self::from_raw(gf_mulmod(self.get(), other.get(), B, M))
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
    let x = self.get();
    if x <= 1 {
      // 0 maps to 0 by convention; 1 is self-inverse. Both would otherwise
      // drive the quotient shift to the full accumulator width.
      return self;
    }
    let (mut t, mut newt) = (0u64, 1u64);
    let (mut r, mut newr) = (M, x);
    // r starts as the modulus with its x^B term implicit; the first
    // subtraction cancels that term against the masked shift.
    let (mut rlen, mut newrlen) = (B + 1, 64 - newr.leading_zeros());
    while newr != 0 {
      let q = rlen - newrlen;
      r ^= (newr << q) & Self::MASK;
      t ^= newt << q;
      rlen = 64 - r.leading_zeros();
      if r < newr {
        core::mem::swap(&mut t, &mut newt);
        core::mem::swap(&mut r, &mut newr);
        core::mem::swap(&mut rlen, &mut newrlen);
      }
    }
    Self::from_raw(t)
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

/// Shift table for repeated multiplication: row i holds a·x^i mod p, so a
/// product is B lookups and XORs instead of B LFSR steps per call.
pub(crate) struct GenericMultiplier<R: Word, const B: u32, const M: u64> {
  table: LinTrans,
  _repr: PhantomData<R>,
}

impl<R: Word, const B: u32, const M: u64> Multiplier<GenericElem<R, B, M>> for GenericMultiplier<R, B, M> {
  fn new(a: GenericElem<R, B, M>) -> Self {
    Self {
      table: LinTrans::shifts_of(a.get(), B, M),
      _repr: PhantomData,
    }
  }

  #[inline]
  fn apply(&self, x: GenericElem<R, B, M>) -> GenericElem<R, B, M> {
    GenericElem::from_raw(self.table.apply(x.get()))
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
