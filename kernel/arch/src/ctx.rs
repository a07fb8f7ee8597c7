// kernel/arch/src/ctx.rs
// Per-thread context control block
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

use spm_log::klog_debug;

use crate::error::{Error, Result};
use crate::exc_return::ExcReturn;
use crate::layout::{
    CALLEE_FRAME_SIZE, CALLEE_SAVED_WORDS, HW_FRAME_SIZE, R4_OFFSET, WORD, XPSR_THUMB,
};
use crate::machine::Memory;
use crate::LOG_SUBSYS;

/// Saved stack pointer and EXC_RETURN of a suspended thread.
///
/// While the thread runs, `sp` is stale and the live value is in PSP. While
/// it is suspended, `sp` points at a complete callee frame followed by the
/// hardware exception frame. PendSV stores both words with a single `stm`,
/// so the field order is part of the ABI.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextCtrl {
    pub sp: u32,
    pub exc_ret: u32,
}

const _: () = assert!(core::mem::size_of::<ContextCtrl>() == 8);

/// Bytes [`ContextCtrl::seed`] consumes below the stack top.
pub const INITIAL_FRAME_SIZE: u32 = CALLEE_FRAME_SIZE + HW_FRAME_SIZE;

impl ContextCtrl {
    pub const fn new() -> Self {
        Self { sp: 0, exc_ret: 0 }
    }

    #[must_use]
    pub const fn exc_return(&self) -> ExcReturn {
        ExcReturn::from_raw(self.exc_ret)
    }

    /// Lay down the first frame of a thread so the first PendSV restore
    /// lands on `entry(param)` in Thread mode on the process stack.
    ///
    /// `stack_base` is the lowest usable address, `stack_top` one past the
    /// highest. The callee-saved registers start zeroed.
    ///
    /// # Safety
    ///
    /// `[stack_base, stack_top)` must be writable memory owned by the thread
    /// being created, and not in use.
    pub unsafe fn seed<M: Memory + ?Sized>(
        &mut self,
        mem: &mut M,
        stack_base: u32,
        stack_top: u32,
        entry: u32,
        param: u32,
    ) -> Result<()> {
        if stack_top == 0 {
            return Err(Error::NullStack);
        }
        if stack_top % 8 != 0 {
            return Err(Error::StackAlignment);
        }
        if stack_top.saturating_sub(stack_base) < INITIAL_FRAME_SIZE {
            return Err(Error::StackTooSmall);
        }

        let hw_frame = stack_top - HW_FRAME_SIZE;
        // r0, r1, r2, r3, r12, lr, pc, xPSR
        let stacked = [param, 0, 0, 0, 0, 0, entry & !1, XPSR_THUMB];
        for (i, &w) in stacked.iter().enumerate() {
            mem.write_word(hw_frame + WORD * i as u32, w);
        }

        let frame = hw_frame - CALLEE_FRAME_SIZE;
        for i in 0..(CALLEE_FRAME_SIZE / WORD) {
            mem.write_word(frame + WORD * i, 0);
        }
        debug_assert_eq!(frame + R4_OFFSET + CALLEE_SAVED_WORDS * WORD, hw_frame);

        self.sp = frame;
        self.exc_ret = ExcReturn::THREAD_PSP.bits();
        klog_debug!(LOG_SUBSYS, "seeded ctx sp={:#010x} entry={:#010x}", frame, entry);
        Ok(())
    }
}
