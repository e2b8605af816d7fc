//! Property tests for the sketch invariants.
//!
//! These pin the contracts that make reconciliation work at all:
//!
//! 1. Serialization round-trips bit-exactly.
//! 2. Merging equals bytewise XOR of the serializations.
//! 3. A merged sketch decodes to the symmetric difference when it fits.
//! 4. Insertion is an involution (duplicates cancel; zero is ignored).

#![cfg(not(miri))]

extern crate std;

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use proptest::prelude::*;

use crate::bitio::mask64;
use crate::sketch::{Sketch, IMPL_GENERIC};

/// Map arbitrary u64s into distinct nonzero b-bit elements.
fn distinct_elements(raw: &[u64], bits: u32, limit: usize) -> Vec<u64> {
  let range = mask64(bits);
  raw
    .iter()
    .map(|&v| (v % range) + 1)
    .collect::<BTreeSet<u64>>()
    .into_iter()
    .take(limit)
    .collect()
}

fn sketch_of(bits: u32, capacity: usize, seed: u64, elements: &[u64]) -> Sketch {
  let mut s = Sketch::with_seed(bits, IMPL_GENERIC, capacity, seed).expect("generic backend always exists");
  for &e in elements {
    s.add(e);
  }
  s
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  #[test]
  fn serialization_roundtrips(
    bits in 2u32..=64,
    capacity in 1usize..=8,
    raw in proptest::collection::vec(any::<u64>(), 0..12),
    seed in any::<u64>(),
  ) {
    let mut s = Sketch::with_seed(bits, IMPL_GENERIC, capacity, seed).unwrap();
    for v in raw {
      s.add(v);
    }
    let ser = s.serialize();
    prop_assert_eq!(ser.len(), (bits as usize * capacity + 7) / 8);

    let mut restored = Sketch::with_seed(bits, IMPL_GENERIC, capacity, seed).unwrap();
    restored.deserialize(&ser);
    prop_assert_eq!(restored.serialize(), ser);
  }

  #[test]
  fn merge_equals_bytewise_xor_on_the_wire(
    bits in 2u32..=64,
    capacity in 1usize..=8,
    raw_a in proptest::collection::vec(any::<u64>(), 0..12),
    raw_b in proptest::collection::vec(any::<u64>(), 0..12),
  ) {
    let a_elems = distinct_elements(&raw_a, bits, 12);
    let b_elems = distinct_elements(&raw_b, bits, 12);
    let mut a = sketch_of(bits, capacity, 1, &a_elems);
    let b = sketch_of(bits, capacity, 1, &b_elems);

    let ser_a = a.serialize();
    let ser_b = b.serialize();
    prop_assert_eq!(a.merge(&b), Ok(capacity));

    let xored: Vec<u8> = ser_a.iter().zip(&ser_b).map(|(x, y)| x ^ y).collect();
    prop_assert_eq!(a.serialize(), xored);
  }

  #[test]
  fn merged_sketches_decode_the_symmetric_difference(
    bits in 2u32..=64,
    capacity in 1usize..=6,
    raw in proptest::collection::vec(any::<u64>(), 0..24),
    split in any::<usize>(),
    shared_raw in proptest::collection::vec(any::<u64>(), 0..8),
  ) {
    // One pool of distinct elements: a slice that only Alice holds, a slice
    // that only Bob holds, and shared elements added to both (they cancel).
    let pool = distinct_elements(&raw, bits, capacity);
    let split = split % (pool.len() + 1);
    let (only_a, only_b) = pool.split_at(split);
    let shared: Vec<u64> = distinct_elements(&shared_raw, bits, 8)
      .into_iter()
      .filter(|e| !pool.contains(e))
      .collect();

    let mut a = sketch_of(bits, capacity, 11, only_a);
    let mut b = sketch_of(bits, capacity, 22, only_b);
    for &e in &shared {
      a.add(e);
      b.add(e);
    }

    a.merge(&b).unwrap();
    let mut decoded = a.decode(capacity).unwrap();
    decoded.sort_unstable();
    prop_assert_eq!(decoded, pool);
  }

  #[test]
  fn duplicate_insertions_cancel(
    bits in 2u32..=64,
    capacity in 1usize..=6,
    raw in proptest::collection::vec(any::<u64>(), 1..10),
  ) {
    let elements = distinct_elements(&raw, bits, 10);
    let mut s = Sketch::with_seed(bits, IMPL_GENERIC, capacity, 5).unwrap();
    for &e in &elements {
      s.add(e);
    }
    for &e in &elements {
      s.add(e);
    }
    s.add(0);
    prop_assert!(s.serialize().iter().all(|&byte| byte == 0));
    prop_assert_eq!(s.decode(capacity), Ok(Vec::new()));
  }

  #[test]
  fn decode_always_respects_the_bound(
    bits in 2u32..=32,
    capacity in 1usize..=5,
    raw in proptest::collection::vec(any::<u64>(), 0..16),
    max in 0usize..=6,
  ) {
    // Overfilled or not, a successful decode never exceeds `max`, and a
    // successful decode of k elements must fail when re-run with k - 1.
    let elements = distinct_elements(&raw, bits, 16);
    let s = sketch_of(bits, capacity, 3, &elements);
    if let Ok(decoded) = s.decode(max) {
      prop_assert!(decoded.len() <= max);
      if !decoded.is_empty() {
        prop_assert!(s.decode(decoded.len() - 1).is_err());
      }
    }
  }
}
