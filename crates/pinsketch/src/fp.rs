//! False-positive capacity math.
//!
//! A random b·c-bit pattern decodes to some multiset of k ≤ c elements with
//! probability about C(2^b − 1, k) / 2^(b·c). These helpers size a sketch so
//! that probability stays below 2^(−fpbits): either the capacity needed to
//! hold `max_elements` differences with that protection, or the element
//! bound a given capacity can honor.
//!
//! The bound is evaluated in exact arbitrary-precision integer arithmetic,
//! so any `fpbits` is handled without rounding concerns.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// C(n, k), exact; zero when k > n.
fn binomial(n: &BigUint, k: u64) -> BigUint {
  if &BigUint::from(k) > n {
    return BigUint::zero();
  }
  let mut ret = BigUint::one();
  let mut term = n.clone();
  for i in 1..=k {
    ret *= &term;
    ret /= i;
    term -= 1u32;
  }
  ret
}

/// Whether v ≤ 2^exp, without materializing the power.
fn fits_in_power_of_two(v: &BigUint, exp: u64) -> bool {
  let bits = v.bits();
  bits <= exp || (bits == exp + 1 && v.count_ones() == 1)
}

/// C(2^bits − 1, max_elements) · 2^fpbits, the quantity the sketch size must
/// dominate.
fn fp_bound(bits: u32, max_elements: u64, fpbits: u32) -> BigUint {
  let n = (BigUint::one() << bits) - 1u32;
  binomial(&n, max_elements) << fpbits as usize
}

/// Smallest capacity that can decode `max_elements` differences with at
/// least `fpbits` bits of false-positive protection.
///
/// Zero for `bits == 0`. The result is never below `max_elements`, which
/// decoding itself requires.
#[must_use]
pub fn compute_capacity(bits: u32, max_elements: u64, fpbits: u32) -> u64 {
  if bits == 0 {
    return 0;
  }
  let bound = fp_bound(bits, max_elements, fpbits);
  // Smallest s with 2^s ≥ bound, then round up to whole syndromes.
  let mut needed_bits = bound.bits();
  if bound.count_ones() == 1 {
    needed_bits -= 1;
  }
  let capacity = needed_bits.div_ceil(u64::from(bits));
  capacity.max(max_elements)
}

/// Largest element bound k ≤ capacity for which a capacity-sized sketch
/// still offers `fpbits` bits of false-positive protection; zero when no
/// bound qualifies.
#[must_use]
pub fn compute_max_elements(bits: u32, capacity: u64, fpbits: u32) -> u64 {
  if bits == 0 {
    return 0;
  }
  let budget = u64::from(bits) * capacity;
  let mut k = capacity;
  while k > 0 {
    if fits_in_power_of_two(&fp_bound(bits, k, fpbits), budget) {
      return k;
    }
    k -= 1;
  }
  0
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn binomial_small_values() {
    let n = BigUint::from(15u32);
    assert_eq!(binomial(&n, 0), BigUint::from(1u32));
    assert_eq!(binomial(&n, 1), BigUint::from(15u32));
    assert_eq!(binomial(&n, 2), BigUint::from(105u32));
    assert_eq!(binomial(&n, 15), BigUint::from(1u32));
    assert_eq!(binomial(&n, 16), BigUint::from(0u32));
  }

  #[test]
  fn power_of_two_comparison() {
    assert!(fits_in_power_of_two(&BigUint::from(0u32), 0));
    assert!(fits_in_power_of_two(&BigUint::from(1u32), 0));
    assert!(!fits_in_power_of_two(&BigUint::from(3u32), 1));
    assert!(fits_in_power_of_two(&BigUint::from(4u32), 2));
    assert!(!fits_in_power_of_two(&BigUint::from(5u32), 2));
  }

  #[test]
  fn reference_values() {
    assert_eq!(compute_capacity(32, 8, 16), 9);
    assert_eq!(compute_max_elements(32, 9, 16), 9);
  }

  #[test]
  fn zero_bits_has_no_capacity() {
    assert_eq!(compute_capacity(0, 10, 16), 0);
    assert_eq!(compute_max_elements(0, 10, 16), 0);
  }

  #[test]
  fn no_protection_means_capacity_equals_elements() {
    // With fpbits = 0 the binomial always fits the b·k budget.
    for bits in [2u32, 8, 32, 64] {
      for k in [0u64, 1, 5, 30] {
        assert_eq!(compute_capacity(bits, k, 0), k, "bits = {bits}, k = {k}");
      }
    }
  }

  #[test]
  fn excess_capacity_is_bounded_by_fpbits() {
    for bits in [2u32, 7, 16, 32, 64] {
      for fpbits in [0u32, 1, 16, 63, 256] {
        for k in [0u64, 1, 3, 17, 64] {
          let c = compute_capacity(bits, k, fpbits);
          assert!(c >= k);
          let excess = u64::from(fpbits).div_ceil(u64::from(bits));
          assert!(c - k <= excess, "bits = {bits}, fpbits = {fpbits}, k = {k}, c = {c}");
        }
      }
    }
  }

  #[test]
  fn max_elements_roundtrips_through_capacity() {
    for bits in [3u32, 8, 21, 32] {
      for fpbits in [0u32, 8, 20, 130] {
        for capacity in 0..40u64 {
          let k = compute_max_elements(bits, capacity, fpbits);
          assert!(k <= capacity);
          if k > 0 {
            assert_eq!(compute_capacity(bits, k, fpbits), capacity, "bits = {bits}, fpbits = {fpbits}");
          }
        }
      }
    }
  }

  #[test]
  fn growing_capacity_grows_max_elements() {
    for bits in [4u32, 16, 48] {
      let mut last = 0;
      for capacity in 1..60u64 {
        let k = compute_max_elements(bits, capacity, 24);
        if k > 0 {
          assert!(last == 0 || k > last);
          last = k;
        }
      }
    }
  }

  #[test]
  fn high_precision_budgets() {
    // fpbits well past 256 still computes exactly.
    let c = compute_capacity(16, 4, 400);
    assert!(c >= 4 + 400 / 16);
    assert_eq!(compute_max_elements(16, c, 400), 4);
  }
}
