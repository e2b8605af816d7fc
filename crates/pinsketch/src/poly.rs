//! Polynomials over GF(2^b) as coefficient vectors.
//!
//! Coefficients run from the constant term upward; the invariant is "no
//! trailing zero coefficient", with the empty vector standing for the zero
//! polynomial. Operations that can expose a zero leading coefficient strip
//! it before returning.

use alloc::vec::Vec;

use crate::fields::{Field, Multiplier};

/// Reduce `val` modulo `modulus` in place.
///
/// `modulus` must be monic and non-empty.
pub(crate) fn poly_mod<F: Field>(modulus: &[F], val: &mut Vec<F>) {
  let modsize = modulus.len();
  debug_assert!(modsize > 0 && modulus[modsize - 1].is_one());
  if val.len() < modsize {
    return;
  }
  debug_assert!(val.last().map_or(false, |c| !c.is_zero()));
  while val.len() >= modsize {
    let term = val[val.len() - 1];
    val.truncate(val.len() - 1);
    if !term.is_zero() {
      let mul = F::Multiplier::new(term);
      let base = val.len() + 1 - modsize;
      for (x, &m) in modulus[..modsize - 1].iter().enumerate() {
        let delta = mul.apply(m);
        val[base + x] += delta;
      }
    }
  }
  while val.last().map_or(false, |c| c.is_zero()) {
    val.pop();
  }
}

/// Divide `val` by `modulus`: the quotient lands in `quot`, the remainder
/// stays in `val` (not stripped of trailing zeros).
pub(crate) fn div_mod<F: Field>(modulus: &[F], val: &mut Vec<F>, quot: &mut Vec<F>) {
  let modsize = modulus.len();
  debug_assert!(modsize > 0 && modulus[modsize - 1].is_one());
  if val.len() < modsize {
    quot.clear();
    return;
  }
  debug_assert!(val.last().map_or(false, |c| !c.is_zero()));
  quot.clear();
  quot.resize(val.len() - modsize + 1, F::zero());
  while val.len() >= modsize {
    let term = val[val.len() - 1];
    quot[val.len() - modsize] = term;
    val.truncate(val.len() - 1);
    if !term.is_zero() {
      let mul = F::Multiplier::new(term);
      let base = val.len() + 1 - modsize;
      for (x, &m) in modulus[..modsize - 1].iter().enumerate() {
        let delta = mul.apply(m);
        val[base + x] += delta;
      }
    }
  }
}

/// Scale a nonzero polynomial so its leading coefficient is one; returns the
/// inverse applied, or zero if it was already monic.
pub(crate) fn make_monic<F: Field>(a: &mut [F]) -> F {
  let n = a.len();
  debug_assert!(n > 0 && !a[n - 1].is_zero());
  if a[n - 1].is_one() {
    return F::zero();
  }
  let inv = a[n - 1].inv();
  let mul = F::Multiplier::new(inv);
  a[n - 1] = F::one();
  for coeff in &mut a[..n - 1] {
    *coeff = mul.apply(*coeff);
  }
  inv
}

/// Euclidean GCD; the result ends up in `a`, `b` is consumed as scratch.
///
/// A nonzero constant remainder short-circuits to the constant 1.
pub(crate) fn gcd<F: Field>(a: &mut Vec<F>, b: &mut Vec<F>) {
  if a.len() < b.len() {
    core::mem::swap(a, b);
  }
  while !b.is_empty() {
    if b.len() == 1 {
      a.truncate(1);
      a[0] = F::one();
      return;
    }
    make_monic(b);
    poly_mod(b, a);
    core::mem::swap(a, b);
  }
}

/// Square a polynomial: in characteristic 2 the cross terms vanish, so the
/// result interleaves squared coefficients with zeros.
pub(crate) fn sqr_poly<F: Field>(poly: &mut Vec<F>) {
  if poly.is_empty() {
    return;
  }
  let new_len = poly.len() * 2 - 1;
  poly.resize(new_len, F::zero());
  for x in (0..new_len).rev() {
    poly[x] = if x & 1 == 1 { F::zero() } else { poly[x / 2].sqr() };
  }
}

/// The trace polynomial Σᵢ (param·x)^(2^i) mod `modulus`, for i in 0..b.
///
/// Built by repeated squaring with `param·x` re-added before each reduction;
/// this is the splitting map of the Berlekamp trace algorithm.
pub(crate) fn trace_mod<F: Field>(modulus: &[F], out: &mut Vec<F>, param: F) {
  out.clear();
  out.reserve(modulus.len() * 2);
  out.push(F::zero());
  out.push(param);

  for _ in 0..F::BITS - 1 {
    sqr_poly(out);
    if out.len() < 2 {
      out.resize(2, F::zero());
    }
    out[1] = param;
    poly_mod(modulus, out);
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
