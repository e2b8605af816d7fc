//! GF(2^b) field backends for b ∈ [2, 64].
//!
//! Each supported width is a distinct monomorphized element type, so field
//! arithmetic is fully static-dispatched; only the sketch-operation boundary
//! is virtual. Two backends exist:
//!
//! - [`generic`]: portable, table-driven carryless multiply (every target).
//! - [`clmul`]: PCLMULQDQ-accelerated (x86_64, runtime-detected).
//!
//! # Field moduli
//!
//! For each width b the field is GF(2)[x]/p(x) with one fixed irreducible
//! p(x) = x^b + m(x), m listed in [`MODULI`]. The polynomial is chosen with
//! constant term 1 and the remaining terms of lowest possible degree: a
//! trinomial where an irreducible one exists, otherwise the minimal
//! pentanomial. This table is part of the wire format: serialized sketches
//! only interoperate between implementations using identical moduli.

use core::fmt::Debug;
use core::ops::{Add, AddAssign};

use crate::bitio::{BitReader, BitWriter};

pub(crate) mod generic;

#[cfg(target_arch = "x86_64")]
pub(crate) mod clmul;

/// Low terms m(x) of the irreducible modulus x^b + m(x), indexed by b.
///
/// Entries 0 and 1 are unused. Examples: b=8 is x^8+x^4+x^3+x+1 (0x1B),
/// b=32 is x^32+x^7+x^3+x^2+1 (0x8D), b=64 is x^64+x^4+x^3+x+1 (0x1B).
pub(crate) const MODULI: [u64; 65] = [
  0, 0, 0x3, 0x3, 0x3, 0x5, 0x3, 0x3, 0x1b, 0x3, // 0..=9
  0x9, 0x5, 0x9, 0x1b, 0x21, 0x3, 0x2b, 0x9, 0x9, 0x27, // 10..=19
  0x9, 0x5, 0x3, 0x21, 0x1b, 0x9, 0x1b, 0x27, 0x3, 0x5, // 20..=29
  0x3, 0x9, 0x8d, 0x4b, 0x1b, 0x5, 0x35, 0x3f, 0x63, 0x11, // 30..=39
  0x39, 0x9, 0x27, 0x59, 0x21, 0x1b, 0x3, 0x21, 0x2d, 0x71, // 40..=49
  0x1d, 0x4b, 0x9, 0x47, 0x7d, 0x47, 0x95, 0x11, 0x63, 0x7b, // 50..=59
  0x3, 0x27, 0x69, 0x3, 0x1b, // 60..=64
];

/// Degree of the middle term for widths whose modulus is a trinomial
/// x^b + x^pos + 1; zero where the modulus is not a trinomial.
pub(crate) const TRI_POS: [u32; 65] = [
  0, 0, 1, 1, 1, 2, 1, 1, 0, 1, // 0..=9
  3, 2, 3, 0, 5, 1, 0, 3, 3, 0, // 10..=19
  3, 2, 1, 5, 0, 3, 0, 0, 1, 2, // 20..=29
  1, 3, 0, 0, 0, 2, 0, 0, 0, 4, // 30..=39
  0, 3, 0, 0, 5, 0, 1, 5, 0, 0, // 40..=49
  0, 0, 3, 0, 0, 0, 0, 4, 0, 0, // 50..=59
  1, 0, 0, 1, 0, // 60..=64
];

// ─────────────────────────────────────────────────────────────────────────────
// Storage words
// ─────────────────────────────────────────────────────────────────────────────

/// Unsigned storage for a field element: the smallest of u8/u16/u32/u64 whose
/// width covers the field, with the excess top bits kept zero.
pub(crate) trait Word:
  Copy + Clone + Eq + Ord + Default + Debug + core::hash::Hash + Send + Sync + 'static
{
  /// Truncating conversion from the arithmetic width.
  fn from_u64(v: u64) -> Self;
  fn to_u64(self) -> u64;
}

macro_rules! impl_word {
  ($($t:ty),+) => {
    $(impl Word for $t {
      #[inline]
      fn from_u64(v: u64) -> Self {
        v as $t
      }

      #[inline]
      fn to_u64(self) -> u64 {
        self as u64
      }
    })+
  };
}

impl_word!(u8, u16, u32, u64);

// ─────────────────────────────────────────────────────────────────────────────
// Field element contract
// ─────────────────────────────────────────────────────────────────────────────

/// A GF(2^b) element. All operations are total; `inv(0)` is 0 and `qrt` of a
/// trace-one input is unspecified-but-fixed (callers validate).
///
/// Equality and ordering compare the external (polynomial-basis) integer
/// representative.
pub(crate) trait Field:
  Copy + Clone + Eq + Ord + Default + Debug + Add<Output = Self> + AddAssign + Send + Sync + 'static
{
  const BITS: u32;

  /// Precomputed state for repeated multiplication by one operand.
  type Multiplier: Multiplier<Self>;

  fn zero() -> Self;
  fn one() -> Self;
  fn is_zero(self) -> bool;
  fn is_one(self) -> bool;

  fn mul(self, other: Self) -> Self;

  /// Squaring (GF(2)-linear, table-driven).
  fn sqr(self) -> Self;

  /// A y with y² + y = self, valid only when a solution exists.
  fn qrt(self) -> Self;

  /// Multiplicative inverse; maps 0 to 0.
  fn inv(self) -> Self;

  /// Multiplication by the generator x (one LFSR step).
  fn mul2(self) -> Self;

  /// Derive a nonzero element from a 64-bit seed, deterministically.
  fn from_seed(seed: u64) -> Self;

  /// Reinterpret the low b bits of `v` as an element.
  fn from_u64(v: u64) -> Self;
  fn to_u64(self) -> u64;

  fn serialize(self, out: &mut BitWriter<'_>);
  fn deserialize(input: &mut BitReader<'_>) -> Self;
}

/// Multiplication with a precomputed left operand.
pub(crate) trait Multiplier<F> {
  fn new(a: F) -> Self;
  fn apply(&self, x: F) -> F;
}

// ─────────────────────────────────────────────────────────────────────────────
// Width dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Invoke `$mac!(bits_literal, word_type)` for every supported field width.
///
/// This is the single source of truth mapping a width to its storage word;
/// the sketch constructors expand it into their dispatch matches.
macro_rules! for_each_field {
  ($mac:ident) => {
    $mac!(2, u8);
    $mac!(3, u8);
    $mac!(4, u8);
    $mac!(5, u8);
    $mac!(6, u8);
    $mac!(7, u8);
    $mac!(8, u8);
    $mac!(9, u16);
    $mac!(10, u16);
    $mac!(11, u16);
    $mac!(12, u16);
    $mac!(13, u16);
    $mac!(14, u16);
    $mac!(15, u16);
    $mac!(16, u16);
    $mac!(17, u32);
    $mac!(18, u32);
    $mac!(19, u32);
    $mac!(20, u32);
    $mac!(21, u32);
    $mac!(22, u32);
    $mac!(23, u32);
    $mac!(24, u32);
    $mac!(25, u32);
    $mac!(26, u32);
    $mac!(27, u32);
    $mac!(28, u32);
    $mac!(29, u32);
    $mac!(30, u32);
    $mac!(31, u32);
    $mac!(32, u32);
    $mac!(33, u64);
    $mac!(34, u64);
    $mac!(35, u64);
    $mac!(36, u64);
    $mac!(37, u64);
    $mac!(38, u64);
    $mac!(39, u64);
    $mac!(40, u64);
    $mac!(41, u64);
    $mac!(42, u64);
    $mac!(43, u64);
    $mac!(44, u64);
    $mac!(45, u64);
    $mac!(46, u64);
    $mac!(47, u64);
    $mac!(48, u64);
    $mac!(49, u64);
    $mac!(50, u64);
    $mac!(51, u64);
    $mac!(52, u64);
    $mac!(53, u64);
    $mac!(54, u64);
    $mac!(55, u64);
    $mac!(56, u64);
    $mac!(57, u64);
    $mac!(58, u64);
    $mac!(59, u64);
    $mac!(60, u64);
    $mac!(61, u64);
    $mac!(62, u64);
    $mac!(63, u64);
    $mac!(64, u64);
  };
}

pub(crate) use for_each_field;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
