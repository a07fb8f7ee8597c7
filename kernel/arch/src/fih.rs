// kernel/arch/src/fih.rs
// Fault-injection hardened integers and comparisons
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

//! A [`FihInt`] carries its value twice: once plain and once XOR-ed with
//! [`FIH_MASK_VALUE`]. A glitch that corrupts one copy, or that flips the
//! outcome of one of the two redundant comparisons, leaves the pair
//! inconsistent, and every consumer checks consistency before trusting it.
//! Inconsistency never degrades into a guess: it ends in [`fih_panic`].
//!
//! Success and failure are 0 and a high-weight pattern, so a single bit flip
//! cannot turn one into the other.

use core::hint::black_box;

pub const FIH_MASK_VALUE: i32 = 0xA5C3_5A3C_u32 as i32;

const FIH_POSITIVE_VALUE: i32 = 0;
const FIH_NEGATIVE_VALUE: i32 = 0x5555_AAAA;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FihInt {
    val: i32,
    msk: i32,
}

pub const FIH_SUCCESS: FihInt = FihInt::encode(FIH_POSITIVE_VALUE);
pub const FIH_FAILURE: FihInt = FihInt::encode(FIH_NEGATIVE_VALUE);

impl FihInt {
    #[inline]
    #[must_use]
    pub const fn encode(x: i32) -> Self {
        Self {
            val: x,
            msk: x ^ FIH_MASK_VALUE,
        }
    }

    /// Trap unless both copies agree.
    #[inline(never)]
    pub fn validate(self) {
        if black_box(self.val) != black_box(self.msk) ^ FIH_MASK_VALUE {
            fih_panic();
        }
    }

    #[must_use]
    pub fn decode(self) -> i32 {
        self.validate();
        self.val
    }

    /// Both halves must independently read as success.
    #[must_use]
    pub fn is_success(self) -> bool {
        let ok = fih_eq(self, FIH_SUCCESS);
        if ok && black_box(self.msk) != FIH_SUCCESS.msk {
            fih_panic();
        }
        ok
    }

    /// Add one to both copies independently, so a skipped or glitched update
    /// of either copy leaves the pair torn.
    #[inline(never)]
    #[must_use]
    pub fn increment(self) -> Self {
        self.validate();
        let val = black_box(self.val).wrapping_add(1);
        let msk = (black_box(self.msk) ^ FIH_MASK_VALUE).wrapping_add(1) ^ FIH_MASK_VALUE;
        Self { val, msk }
    }

    /// Build a value whose copies disagree, as a glitch would leave it.
    #[cfg(test)]
    pub(crate) const fn torn(val: i32, msk: i32) -> Self {
        Self { val, msk }
    }
}

/// Hardened equality: compares value and mask separately and traps if the
/// two verdicts disagree.
#[inline(never)]
#[must_use]
pub fn fih_eq(x: FihInt, y: FihInt) -> bool {
    x.validate();
    y.validate();
    let val_eq = black_box(x.val) == black_box(y.val);
    let msk_eq = black_box(x.msk ^ FIH_MASK_VALUE) == black_box(y.msk ^ FIH_MASK_VALUE);
    if black_box(val_eq) != black_box(msk_eq) {
        fih_panic();
    }
    val_eq && msk_eq
}

/// Hardened inequality, same discipline as [`fih_eq`].
#[inline(never)]
#[must_use]
pub fn fih_not_eq(x: FihInt, y: FihInt) -> bool {
    x.validate();
    y.validate();
    let val_ne = black_box(x.val) != black_box(y.val);
    let msk_ne = black_box(x.msk ^ FIH_MASK_VALUE) != black_box(y.msk ^ FIH_MASK_VALUE);
    if black_box(val_ne) != black_box(msk_ne) {
        fih_panic();
    }
    val_ne && msk_ne
}

/// Detected tampering. Spins on hardware instead of entering the panic
/// machinery, which is itself a glitch target.
#[cold]
#[inline(never)]
pub fn fih_panic() -> ! {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "none")] {
            loop {
                core::hint::spin_loop();
            }
        } else {
            panic!("fault injection detected");
        }
    }
}
