//! CPU capability detection.
//!
//! This crate answers one question for its consumers: "which carryless
//! multiply instructions can I legally run on this machine?" The answer is a
//! compact bitset probed once and cached in atomics, so it works the same
//! with or without `std`.
//!
//! # Usage
//!
//! ```
//! if platform::caps().has(platform::x86::PCLMUL) {
//!     // Select the PCLMULQDQ-accelerated backend.
//! }
//! ```
//!
//! Detection merges two sources:
//!
//! - Compile-time target features (`-C target-feature=+pclmulqdq`), which
//!   need no runtime probe.
//! - Runtime CPUID on x86_64, so a portable build still finds the
//!   accelerated path on capable hardware.

#![no_std]

use core::sync::atomic::{AtomicU32, Ordering};

/// Feature bitset.
///
/// Bits are architecture-specific; today only the x86_64 region is
/// populated. The representation leaves room for other architectures
/// without changing the consumer-facing API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Caps(u32);

impl Caps {
  /// Empty capability set.
  pub const NONE: Self = Self(0);

  /// Check whether all bits in `other` are present.
  #[inline]
  #[must_use]
  pub const fn has(self, other: Self) -> bool {
    (self.0 & other.0) == other.0
  }

  /// Union of two capability sets.
  #[inline]
  #[must_use]
  pub const fn union(self, other: Self) -> Self {
    Self(self.0 | other.0)
  }

  #[inline]
  #[must_use]
  pub const fn is_empty(self) -> bool {
    self.0 == 0
  }
}

impl core::ops::BitOr for Caps {
  type Output = Self;

  #[inline]
  fn bitor(self, rhs: Self) -> Self::Output {
    self.union(rhs)
  }
}

/// x86_64 capability bits.
pub mod x86 {
  use super::Caps;

  /// PCLMULQDQ (carryless multiply) plus its SSE2 baseline.
  pub const PCLMUL: Caps = Caps(1 << 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Detection
// ─────────────────────────────────────────────────────────────────────────────

/// Cached capability bits, shifted by one so that 0 means "not probed yet".
static CACHED: AtomicU32 = AtomicU32::new(0);

/// Detected capabilities of the running CPU.
///
/// The first call probes the hardware; later calls return the cached value.
/// Probing is idempotent, so a race between threads is harmless.
#[inline]
#[must_use]
pub fn caps() -> Caps {
  let cached = CACHED.load(Ordering::Relaxed);
  if cached != 0 {
    return Caps(cached - 1);
  }
  let probed = detect();
  CACHED.store(probed.0 + 1, Ordering::Relaxed);
  probed
}

#[cfg(target_arch = "x86_64")]
fn detect() -> Caps {
  let mut caps = Caps::NONE;

  // Compile-time features require no probe and are valid even where CPUID
  // itself is unavailable.
  if cfg!(target_feature = "pclmulqdq") {
    caps = caps | x86::PCLMUL;
  }

  #[cfg(not(miri))]
  {
    // CPUID leaf 1, ECX bit 1 = PCLMULQDQ. SSE2 is part of the x86_64
    // baseline so it needs no separate check.
    // SAFETY: CPUID is available on every x86_64 processor.
    let leaf1 = unsafe { core::arch::x86_64::__cpuid(1) };
    if leaf1.ecx & (1 << 1) != 0 {
      caps = caps | x86::PCLMUL;
    }
  }

  caps
}

#[cfg(not(target_arch = "x86_64"))]
fn detect() -> Caps {
  Caps::NONE
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
