// kernel/arch/src/exc_return.rs
// EXC_RETURN token
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

bitflags::bitflags! {
    /// Value loaded into LR on exception entry; branching to it returns from
    /// the exception and selects the mode and stack to resume on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExcReturn: u32 {
        /// Resume on the process stack.
        const SPSEL = 1 << 2;
        /// Resume in Thread mode (clear: Handler mode).
        const MODE  = 1 << 3;
        /// Basic frame without FP state.
        const FTYPE = 1 << 4;

        const _ = !0;
    }
}

/// Mask of the Thread/Handler mode bit, as used by the SVCall vector.
pub const EXC_RETURN_MODE_MASK: u32 = ExcReturn::MODE.bits();

impl ExcReturn {
    /// Return to Handler mode on the main stack.
    pub const HANDLER_MSP: Self = Self::from_bits_retain(0xFFFF_FFF1);
    /// Return to Thread mode on the main stack.
    pub const THREAD_MSP: Self = Self::from_bits_retain(0xFFFF_FFF9);
    /// Return to Thread mode on the process stack.
    pub const THREAD_PSP: Self = Self::from_bits_retain(0xFFFF_FFFD);

    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self::from_bits_retain(raw)
    }

    /// 1 when returning to Thread mode, 0 for Handler mode.
    #[inline]
    #[must_use]
    pub const fn mode_bit(self) -> i32 {
        ((self.bits() & EXC_RETURN_MODE_MASK) >> 3) as i32
    }

    #[inline]
    #[must_use]
    pub const fn returns_to_thread(self) -> bool {
        self.mode_bit() == 1
    }

    #[inline]
    #[must_use]
    pub const fn uses_process_stack(self) -> bool {
        self.bits() & Self::SPSEL.bits() != 0
    }
}
