//! Sketches: odd power-sum summaries of multisets of field elements.
//!
//! A sketch of capacity c over GF(2^b) holds the c odd power sums
//! Σ xᵏ^(2i+1) of everything added to it. Two sketches XOR-merge into the
//! sketch of the symmetric difference, and decoding recovers up to c
//! elements from the merged syndromes.
//!
//! Field arithmetic is monomorphized per width; the public [`Sketch`] handle
//! dispatches virtually at the sketch-operation boundary only, selecting the
//! backend instantiation once at construction.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::bitio::{BitReader, BitWriter};
use crate::decode::{add_to_odd_syndromes, berlekamp_massey, find_roots, reconstruct_all_syndromes};
#[cfg(target_arch = "x86_64")]
use crate::fields::clmul::{ClmulElem, ClmulTriElem};
use crate::fields::generic::GenericElem;
use crate::fields::{for_each_field, Field, MODULI};
#[cfg(target_arch = "x86_64")]
use crate::fields::TRI_POS;

/// Portable table-driven implementation id.
pub const IMPL_GENERIC: u32 = 0;
/// Hardware carryless-multiply implementation id.
pub const IMPL_CLMUL: u32 = 1;
/// Hardware carryless-multiply with trinomial reduction.
pub const IMPL_CLMUL_TRI: u32 = 2;

/// Seed value selecting the fixed basis 1 instead of a derived one.
///
/// Deterministic decoding is useful in tests and differential harnesses;
/// production sketches should keep a random seed so adversarial inputs
/// cannot force worst-case root-finding behavior.
pub const FIXED_SEED: u64 = u64::MAX;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// The sketch does not correspond to any multiset of at most the requested
/// number of elements.
///
/// Intentionally carries no detail: an overfilled sketch and random bytes
/// are indistinguishable to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct DecodeError;

impl fmt::Display for DecodeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("sketch is not decodable within the requested element bound")
  }
}

impl core::error::Error for DecodeError {}

/// The two sketches disagree in field width or implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct MergeError;

impl fmt::Display for MergeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("sketches differ in field width or implementation")
  }
}

impl core::error::Error for MergeError {}

// ─────────────────────────────────────────────────────────────────────────────
// Backend
// ─────────────────────────────────────────────────────────────────────────────

/// One monomorphized sketch engine behind the [`Sketch`] handle.
trait SketchBackend: Send + Sync {
  fn bits(&self) -> u32;
  fn implementation(&self) -> u32;
  fn capacity(&self) -> usize;
  fn add(&mut self, element: u64);
  fn set_seed(&mut self, seed: u64);
  fn serialize_into(&self, out: &mut [u8]);
  fn deserialize(&mut self, input: &[u8]);
  fn decode(&self, max_elements: usize) -> Option<Vec<u64>>;
  fn merge(&mut self, other: &dyn SketchBackend) -> usize;
  fn box_clone(&self) -> Box<dyn SketchBackend>;
  fn as_any(&self) -> &dyn Any;
}

struct SketchImpl<F: Field> {
  syndromes: Vec<F>,
  basis: F,
  implementation: u32,
}

impl<F: Field> SketchImpl<F> {
  fn new(implementation: u32, capacity: usize, seed: u64) -> Self {
    Self {
      syndromes: vec![F::zero(); capacity],
      basis: F::from_seed(seed),
      implementation,
    }
  }
}

impl<F: Field> SketchBackend for SketchImpl<F> {
  fn bits(&self) -> u32 {
    F::BITS
  }

  fn implementation(&self) -> u32 {
    self.implementation
  }

  fn capacity(&self) -> usize {
    self.syndromes.len()
  }

  fn add(&mut self, element: u64) {
    let elem = F::from_u64(element);
    if elem.is_zero() {
      // Zero is the additive identity and unrepresentable in a sketch.
      return;
    }
    add_to_odd_syndromes(&mut self.syndromes, elem);
  }

  fn set_seed(&mut self, seed: u64) {
    self.basis = if seed == FIXED_SEED { F::one() } else { F::from_seed(seed) };
  }

  fn serialize_into(&self, out: &mut [u8]) {
    let mut writer = BitWriter::new(out);
    for syndrome in &self.syndromes {
      syndrome.serialize(&mut writer);
    }
    writer.flush();
  }

  fn deserialize(&mut self, input: &[u8]) {
    let mut reader = BitReader::new(input);
    for syndrome in &mut self.syndromes {
      *syndrome = F::deserialize(&mut reader);
    }
  }

  fn decode(&self, max_elements: usize) -> Option<Vec<u64>> {
    let all_syndromes = reconstruct_all_syndromes(&self.syndromes);
    let mut locator = berlekamp_massey(&all_syndromes, max_elements);
    if locator.is_empty() {
      return None;
    }
    if locator.len() == 1 {
      // Degree zero: provably the empty multiset.
      return Some(Vec::new());
    }
    if locator.len() > 1 + max_elements {
      return None;
    }
    locator.reverse();
    let roots = find_roots(locator, self.basis);
    if roots.is_empty() {
      return None;
    }
    Some(roots.iter().map(|root| root.to_u64()).collect())
  }

  fn merge(&mut self, other: &dyn SketchBackend) -> usize {
    // The handle has already checked (bits, implementation); the downcast
    // is the typed restatement of that contract.
    let Some(other) = other.as_any().downcast_ref::<Self>() else {
      return 0;
    };
    let len = self.syndromes.len().min(other.syndromes.len());
    self.syndromes.truncate(len);
    for (mine, theirs) in self.syndromes.iter_mut().zip(&other.syndromes) {
      *mine += *theirs;
    }
    len
  }

  fn box_clone(&self) -> Box<dyn SketchBackend> {
    Box::new(Self {
      syndromes: self.syndromes.clone(),
      basis: self.basis,
      implementation: self.implementation,
    })
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Construction dispatch
// ─────────────────────────────────────────────────────────────────────────────

fn construct_generic(bits: u32, capacity: usize, seed: u64) -> Option<Box<dyn SketchBackend>> {
  macro_rules! try_width {
    ($b:literal, $repr:ty) => {
      if bits == $b {
        return Some(Box::new(
          SketchImpl::<GenericElem<$repr, $b, { MODULI[$b] }>>::new(IMPL_GENERIC, capacity, seed),
        ));
      }
    };
  }
  for_each_field!(try_width);
  None
}

#[cfg(target_arch = "x86_64")]
fn construct_clmul(bits: u32, capacity: usize, seed: u64) -> Option<Box<dyn SketchBackend>> {
  macro_rules! try_width {
    ($b:literal, $repr:ty) => {
      if bits == $b {
        return Some(Box::new(
          SketchImpl::<ClmulElem<$repr, $b, { MODULI[$b] }>>::new(IMPL_CLMUL, capacity, seed),
        ));
      }
    };
  }
  for_each_field!(try_width);
  None
}

#[cfg(target_arch = "x86_64")]
fn construct_clmul_tri(bits: u32, capacity: usize, seed: u64) -> Option<Box<dyn SketchBackend>> {
  macro_rules! try_width {
    ($b:literal, $repr:ty) => {
      if bits == $b {
        // Only fields with a trinomial modulus have this backend.
        if TRI_POS[$b] == 0 {
          return None;
        }
        return Some(Box::new(
          SketchImpl::<ClmulTriElem<$repr, $b, { MODULI[$b] }>>::new(IMPL_CLMUL_TRI, capacity, seed),
        ));
      }
    };
  }
  for_each_field!(try_width);
  None
}

fn construct(bits: u32, implementation: u32, capacity: usize, seed: u64) -> Option<Box<dyn SketchBackend>> {
  if !bits_supported(bits) || capacity == 0 {
    return None;
  }
  match implementation {
    IMPL_GENERIC => construct_generic(bits, capacity, seed),
    #[cfg(target_arch = "x86_64")]
    IMPL_CLMUL | IMPL_CLMUL_TRI => {
      if !platform::caps().has(platform::x86::PCLMUL) {
        return None;
      }
      if implementation == IMPL_CLMUL {
        construct_clmul(bits, capacity, seed)
      } else {
        construct_clmul_tri(bits, capacity, seed)
      }
    }
    _ => None,
  }
}

/// Whether sketches over GF(2^bits) are supported at all.
#[must_use]
pub fn bits_supported(bits: u32) -> bool {
  (2..=64).contains(&bits)
}

/// The highest implementation id this build knows about.
///
/// Availability still depends on runtime CPU detection; use
/// [`implementation_supported`] to probe a concrete combination.
#[must_use]
pub fn implementation_max() -> u32 {
  #[cfg(target_arch = "x86_64")]
  {
    IMPL_CLMUL_TRI
  }
  #[cfg(not(target_arch = "x86_64"))]
  {
    IMPL_GENERIC
  }
}

/// Whether `Sketch::with_seed(bits, implementation, ..)` would succeed.
#[must_use]
pub fn implementation_supported(bits: u32, implementation: u32) -> bool {
  if !bits_supported(bits) || implementation > implementation_max() {
    return false;
  }
  construct(bits, implementation, 1, 0).is_some()
}

// ─────────────────────────────────────────────────────────────────────────────
// Public handle
// ─────────────────────────────────────────────────────────────────────────────

/// A set-reconciliation sketch.
///
/// Summarizes a multiset of nonzero b-bit elements in `capacity` field
/// elements of state. Sketches with equal shape XOR-merge into the sketch of
/// the symmetric difference (equivalently, their serializations can be
/// XOR-ed bytewise), and [`decode`](Sketch::decode) recovers up to
/// `capacity` elements.
///
/// # Example
///
/// ```
/// let mut alice = pinsketch::Sketch::new(16, 0, 4).unwrap();
/// let mut bob = pinsketch::Sketch::new(16, 0, 4).unwrap();
/// for x in [101u64, 202, 303] {
///   alice.add(x);
/// }
/// for x in [202u64, 303, 404] {
///   bob.add(x);
/// }
/// alice.merge(&bob).unwrap();
/// let mut diff = alice.decode(4).unwrap();
/// diff.sort_unstable();
/// assert_eq!(diff, vec![101, 404]);
/// ```
pub struct Sketch {
  backend: Box<dyn SketchBackend>,
}

impl Sketch {
  /// Create a sketch with a nondeterministic basis seed.
  ///
  /// Returns `None` when the (bits, implementation) combination is
  /// unsupported (unknown width, implementation id beyond
  /// [`implementation_max`], missing CPU support, a non-trinomial field
  /// asked for the trinomial backend), or when `capacity` is zero.
  #[cfg(feature = "std")]
  #[must_use]
  pub fn new(bits: u32, implementation: u32, capacity: usize) -> Option<Self> {
    use rand::RngCore;

    Self::with_seed(bits, implementation, capacity, rand::rngs::OsRng.next_u64())
  }

  /// Create a sketch deriving its basis from an explicit seed.
  ///
  /// Intended for `no_std` callers and deterministic tests; see
  /// [`set_seed`](Sketch::set_seed) for the security caveat.
  #[must_use]
  pub fn with_seed(bits: u32, implementation: u32, capacity: usize, seed: u64) -> Option<Self> {
    construct(bits, implementation, capacity, seed).map(|backend| Self { backend })
  }

  /// Field width b of this sketch's elements.
  #[must_use]
  pub fn bits(&self) -> u32 {
    self.backend.bits()
  }

  /// Implementation id the sketch was created with.
  #[must_use]
  pub fn implementation(&self) -> u32 {
    self.backend.implementation()
  }

  /// Number of syndromes, i.e. the decodable element bound.
  #[must_use]
  pub fn capacity(&self) -> usize {
    self.backend.capacity()
  }

  /// Re-derive the root-finding basis from `seed`.
  ///
  /// [`FIXED_SEED`] selects the constant basis 1 for reproducible decoding.
  /// Fixed or attacker-known seeds let adversarial sketches drive the root
  /// finder through its worst case, so production use should stay with the
  /// creation-time random seed.
  pub fn set_seed(&mut self, seed: u64) {
    self.backend.set_seed(seed);
  }

  /// Add an element to the multiset. `0` (or any value whose low b bits are
  /// zero) is not representable and is ignored; adding the same element
  /// twice cancels it.
  pub fn add(&mut self, element: u64) {
    self.backend.add(element);
  }

  /// Byte length of the serialized form: ⌈bits·capacity / 8⌉.
  #[must_use]
  pub fn serialized_size(&self) -> usize {
    (self.bits() as usize * self.capacity() + 7) / 8
  }

  /// Serialize into `out`, which must be exactly
  /// [`serialized_size`](Sketch::serialized_size) bytes.
  ///
  /// # Panics
  ///
  /// Panics when `out` has the wrong length.
  pub fn serialize_into(&self, out: &mut [u8]) {
    assert_eq!(out.len(), self.serialized_size(), "serialization buffer has the wrong length");
    self.backend.serialize_into(out);
  }

  /// Serialize into a fresh byte vector.
  #[must_use]
  pub fn serialize(&self) -> Vec<u8> {
    let mut out = vec![0u8; self.serialized_size()];
    self.backend.serialize_into(&mut out);
    out
  }

  /// Replace this sketch's syndromes with the serialized content in `input`,
  /// which must be exactly [`serialized_size`](Sketch::serialized_size)
  /// bytes. The basis seed is unaffected.
  ///
  /// # Panics
  ///
  /// Panics when `input` has the wrong length.
  pub fn deserialize(&mut self, input: &[u8]) {
    assert_eq!(input.len(), self.serialized_size(), "serialization buffer has the wrong length");
    self.backend.deserialize(input);
  }

  /// Merge `other` into `self`, XOR-ing syndromes pointwise.
  ///
  /// The result summarizes the symmetric difference of the two multisets.
  /// The capacity drops to the smaller of the two; the new capacity is
  /// returned. Fails, leaving `self` unmodified, when the sketches differ
  /// in bits or implementation.
  pub fn merge(&mut self, other: &Sketch) -> Result<usize, MergeError> {
    if self.bits() != other.bits() || self.implementation() != other.implementation() {
      return Err(MergeError);
    }
    Ok(self.backend.merge(other.backend.as_ref()))
  }

  /// Recover the multiset, up to `max_elements` elements.
  ///
  /// `Ok(vec![])` means the sketch is provably empty. [`DecodeError`] means
  /// no multiset of at most `max_elements` elements matches; whether
  /// because the sketch was overfilled or because the bytes were never a
  /// sketch cannot be distinguished. Elements come back in no particular
  /// order.
  pub fn decode(&self, max_elements: usize) -> Result<Vec<u64>, DecodeError> {
    self.backend.decode(max_elements).ok_or(DecodeError)
  }
}

impl Clone for Sketch {
  fn clone(&self) -> Self {
    Self { backend: self.backend.box_clone() }
  }
}

impl fmt::Debug for Sketch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Sketch")
      .field("bits", &self.bits())
      .field("implementation", &self.implementation())
      .field("capacity", &self.capacity())
      .finish_non_exhaustive()
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
