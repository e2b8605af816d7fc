//! Syndrome decoding: Berlekamp–Massey plus Berlekamp-trace root finding.
//!
//! Decoding a sketch is a two-act play. Berlekamp–Massey turns the syndrome
//! sequence into the minimal LFSR connection polynomial: the locator whose
//! roots are the encoded elements. The trace algorithm then factors the
//! (square-free) locator by repeatedly splitting it along the kernel of a
//! randomized trace map, down to degree one and two base cases.

use alloc::vec;
use alloc::vec::Vec;

use crate::fields::{Field, Multiplier};
use crate::poly::{div_mod, gcd, make_monic, poly_mod, sqr_poly, trace_mod};

/// Expand c odd syndromes into the full run of 2c.
///
/// Power sums in characteristic 2 satisfy s_{2k} = s_k², so the even-indexed
/// entries are recovered by squaring earlier entries in place.
pub(crate) fn reconstruct_all_syndromes<F: Field>(odd_syndromes: &[F]) -> Vec<F> {
  let mut all = vec![F::zero(); odd_syndromes.len() * 2];
  for i in 0..odd_syndromes.len() {
    all[i * 2] = odd_syndromes[i];
    all[i * 2 + 1] = all[i].sqr();
  }
  all
}

/// Fold a new element into the odd syndromes: adds x^(2i+1) to entry i.
pub(crate) fn add_to_odd_syndromes<F: Field>(osyndromes: &mut [F], data: F) {
  let sqr = data.sqr();
  let mul = F::Multiplier::new(sqr);
  let mut power = data;
  for osyndrome in osyndromes {
    *osyndrome += power;
    power = mul.apply(power);
  }
}

/// The minimal-degree monic polynomial C with Σⱼ Cⱼ·s[i−j] = 0 for all
/// i ≥ deg(C), or empty if no such polynomial of degree ≤ `max_degree`
/// exists.
pub(crate) fn berlekamp_massey<F: Field>(syndromes: &[F], max_degree: usize) -> Vec<F> {
  let mut table: Vec<F::Multiplier> = Vec::with_capacity(syndromes.len());
  let mut current: Vec<F> = Vec::with_capacity(syndromes.len() / 2 + 1);
  let mut prev: Vec<F> = Vec::with_capacity(syndromes.len() / 2 + 1);
  let mut tmp: Vec<F> = Vec::with_capacity(syndromes.len() / 2 + 1);
  current.push(F::one());
  prev.push(F::one());
  let mut b = F::one();
  let mut b_inv = F::one();
  // The previous discrepancy is only inverted when a nonzero new
  // discrepancy actually needs it.
  let mut b_have_inv = true;

  for n in 0..syndromes.len() {
    table.push(F::Multiplier::new(syndromes[n]));
    let mut discrepancy = syndromes[n];
    for i in 1..current.len() {
      discrepancy += table[n - i].apply(current[i]);
    }
    if !discrepancy.is_zero() {
      let x = n + 1 - (current.len() - 1) - (prev.len() - 1);
      if !b_have_inv {
        b_inv = b.inv();
        b_have_inv = true;
      }
      let swap = 2 * (current.len() - 1) <= n;
      if swap {
        if prev.len() + x - 1 > max_degree {
          return Vec::new();
        }
        tmp.clear();
        tmp.extend_from_slice(&current);
        current.resize(prev.len() + x, F::zero());
      }
      let mul = F::Multiplier::new(discrepancy.mul(b_inv));
      for i in 0..prev.len() {
        let delta = mul.apply(prev[i]);
        current[i + x] += delta;
      }
      if swap {
        core::mem::swap(&mut prev, &mut tmp);
        b = discrepancy;
        b_have_inv = false;
      }
    }
  }
  if current.last().map_or(true, |c| c.is_zero()) {
    return Vec::new();
  }
  current
}

/// All roots of a square-free `poly` that splits completely over the field;
/// empty if it has an irreducible factor of degree above one (or on a
/// corrupt input).
///
/// `basis` perturbs the trace map so adversarially chosen inputs cannot
/// force the worst-case number of split attempts.
pub(crate) fn find_roots<F: Field>(poly: Vec<F>, basis: F) -> Vec<F> {
  let mut roots = Vec::new();
  if poly.is_empty() || basis.is_zero() {
    return roots;
  }
  if poly.len() == 1 {
    // A constant has no roots; this is a successful, empty factorization.
    return roots;
  }
  let expected = poly.len() - 1;
  roots.reserve(expected);
  if !rec_find_roots(poly, &mut roots, false, 0, basis) || roots.len() != expected {
    return Vec::new();
  }
  roots
}

/// One level of the Berlekamp trace recursion.
///
/// `poly` is monic, square-free and of degree ≥ 1. When `fully_factorizable`
/// holds, it is additionally known to have no irreducible factor of degree
/// above one, which lets failures downstream be treated as corruption.
fn rec_find_roots<F: Field>(
  mut poly: Vec<F>,
  roots: &mut Vec<F>,
  mut fully_factorizable: bool,
  mut depth: u32,
  mut randv: F,
) -> bool {
  debug_assert!(poly.len() > 1 && poly.last().map_or(false, |c| c.is_one()));

  // 1st degree: the constant term is the root.
  if poly.len() == 2 {
    roots.push(poly[0]);
    return true;
  }

  // 2nd degree: direct quadratic solver. x² + a alone would have a double
  // root, contradicting square-freeness, so the linear coefficient is
  // nonzero and the standard substitution applies.
  if poly.len() == 3 {
    if poly[1].is_zero() {
      return false;
    }
    let input = poly[0].mul(poly[1].inv().sqr());
    let root = input.qrt();
    if root.sqr() + root != input {
      debug_assert!(!fully_factorizable);
      return false;
    }
    let sol = root.mul(poly[1]);
    roots.push(sol);
    roots.push(sol + poly[1]);
    return true;
  }

  let mut trace: Vec<F> = Vec::new();
  let mut tmp: Vec<F> = Vec::new();
  let mut iter = 0;
  loop {
    trace_mod(&poly, &mut trace, randv);

    if iter >= 1 && !fully_factorizable {
      // Check whether the polynomial splits completely before burning more
      // split attempts on it. With y = randv·x,
      //
      //   trace + trace² = y + y^FIELDSIZE = randv·(x + x^FIELDSIZE)  (mod poly)
      //
      // and x^FIELDSIZE − x has every field element as a simple root, so the
      // sum vanishes mod poly exactly when poly has only unique degree-one
      // factors. Deferring the test until a split has failed keeps it off
      // the path of polynomials that factor easily.
      tmp.clear();
      tmp.extend_from_slice(&trace);
      sqr_poly(&mut tmp);
      for i in 0..trace.len() {
        let t = trace[i];
        tmp[i] += t;
      }
      while tmp.last().map_or(false, |c| c.is_zero()) {
        tmp.pop();
      }
      poly_mod(&poly, &mut tmp);
      if !tmp.is_empty() {
        return false;
      }
      fully_factorizable = true;
    }

    if fully_factorizable {
      // Each split halves the candidate root space; after `depth` splits a
      // bucket holds at most 2^(BITS − depth) roots. A deeper polynomial
      // signals a corrupt input.
      let excess = F::BITS.saturating_sub(depth);
      let too_deep = if excess >= 64 {
        false
      } else {
        ((poly.len() - 2) as u64) >> excess != 0
      };
      if too_deep {
        return false;
      }
    }

    depth += 1;
    // Doubling walks randv through a GF(2)-linearly independent family, so
    // every pair of distinct roots is eventually separated by some trace.
    randv = randv.mul2();
    tmp.clear();
    tmp.extend_from_slice(&poly);
    gcd(&mut trace, &mut tmp);
    if trace.len() != poly.len() && trace.len() > 1 {
      break;
    }
    iter += 1;
  }

  make_monic(&mut trace);
  let mut quot: Vec<F> = Vec::new();
  div_mod(&trace, &mut poly, &mut quot);

  // Recurse on the companion factor first with the flag as-is; the factor
  // whose roots have trace zero can never contain an irreducible factor of
  // degree above one, so its recursion is marked fully factorizable.
  if !rec_find_roots(quot, roots, fully_factorizable, depth, randv) {
    return false;
  }
  rec_find_roots(trace, roots, true, depth, randv)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
