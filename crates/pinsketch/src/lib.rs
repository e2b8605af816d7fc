//! PinSketch set reconciliation over GF(2^b).
//!
//! A [`Sketch`] is a fixed-size summary of a multiset of nonzero b-bit
//! integers, for any width b ∈ [2, 64]. Sketches built by two peers can be
//! XOR-merged (on the wire, literally by XOR-ing their serializations), and
//! the merge decodes to the symmetric difference of the two multisets, as
//! long as it fits the sketch capacity. That makes reconciling two large
//! sets cost bandwidth proportional to their difference, not their size.
//!
//! # Quick start
//!
//! ```
//! use pinsketch::Sketch;
//!
//! // Each peer sketches its own set; shapes must match.
//! let mut alice = Sketch::new(32, 0, 8).unwrap();
//! let mut bob = Sketch::new(32, 0, 8).unwrap();
//! for x in [1u64, 2, 3, 4] {
//!   alice.add(x);
//! }
//! for x in [3u64, 4, 5, 6] {
//!   bob.add(x);
//! }
//!
//! // Bob sends serialize() (32 bytes here); Alice merges and decodes.
//! alice.merge(&bob).unwrap();
//! let mut diff = alice.decode(8).unwrap();
//! diff.sort_unstable();
//! assert_eq!(diff, vec![1, 2, 5, 6]);
//! ```
//!
//! # Implementations
//!
//! | Id | Backend | Availability |
//! |----|---------|--------------|
//! | 0  | Portable table-driven arithmetic | everywhere |
//! | 1  | PCLMULQDQ carryless multiply | x86_64 with CPU support |
//! | 2  | PCLMULQDQ, trinomial-modulus reduction | x86_64, trinomial fields |
//!
//! All implementations share one wire format; [`Sketch::new`] returns `None`
//! for combinations the running machine cannot provide. Use
//! [`compute_capacity`] / [`compute_max_elements`] to size sketches against
//! a false-positive budget.
//!
//! # Feature flags
//!
//! - `std` (default): nondeterministic seeding via [`Sketch::new`]. Without
//!   it the crate is `no_std` (with `alloc`) and sketches are created
//!   through [`Sketch::with_seed`].

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod bitio;
mod decode;
mod fields;
mod fp;
mod lintrans;
mod poly;
mod siphash;
mod sketch;

#[cfg(test)]
mod proptests;

pub use fp::{compute_capacity, compute_max_elements};
pub use sketch::{
  bits_supported, implementation_max, implementation_supported, DecodeError, MergeError, Sketch, FIXED_SEED,
  IMPL_CLMUL, IMPL_CLMUL_TRI, IMPL_GENERIC,
};
