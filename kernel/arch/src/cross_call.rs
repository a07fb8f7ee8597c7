// kernel/arch/src/cross_call.rs
// Non-preemptible cross-domain call
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

//! Runs a call into another stack/privilege context with the scheduler
//! locked, so PendSV never swaps the caller out while the callee's stack is
//! half built. The marshaling itself is done by the entering/exiting hooks.
//!
//! Sequence:
//!
//! 1. mask; move SP to the target stack base if one is given; lock; unmask
//! 2. stack the frame address and caller SP on the (new) stack
//! 3. `entering(fn, frame, caller_sp)` -> status
//! 4. unstack; mask; `exiting(status, frame)`
//! 5. restore SP if it was moved; unlock; unmask

use crate::irq::IrqMasked;
use crate::machine::{pop_words, push_words, Machine};
use crate::sched_lock::SchedulerLock;

/// Target stack for the call. `base == 0` stays on the caller's stack.
///
/// The limit is handed over for the software stack checks of the partition
/// layer; ARMv6-M/7-M have no PSPLIM to program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackRegion {
    pub base: u32,
    pub limit: u32,
}

impl StackRegion {
    /// Stay on the current stack.
    pub const CURRENT: StackRegion = StackRegion { base: 0, limit: 0 };

    pub const fn new(base: u32, limit: u32) -> Self {
        Self { base, limit }
    }

    #[inline]
    #[must_use]
    pub const fn switches_stack(&self) -> bool {
        self.base != 0
    }
}

/// Argument and result marshaling across the domain boundary.
pub trait CrossCallHooks<M: ?Sized> {
    /// Runs unmasked with the scheduler locked, on the target stack.
    /// `caller_sp` is the caller's stack pointer, or 0 if the stack was not
    /// switched. Returns the call status.
    fn entering(&mut self, m: &mut M, fn_addr: u32, frame_addr: u32, caller_sp: u32) -> u32;

    /// Runs masked, still on the target stack.
    fn exiting(&mut self, m: &mut M, status: u32, frame_addr: u32);
}

/// Body of `arch_non_preempt_call`.
///
/// # Safety
///
/// A non-zero `stack.base` must be the 8-byte aligned top of a stack the
/// callee owns, and the hooks must leave SP balanced.
pub unsafe fn non_preempt_call<M, H>(
    m: &mut M,
    hooks: &mut H,
    lock: &SchedulerLock,
    fn_addr: u32,
    frame_addr: u32,
    stack: StackRegion,
) where
    M: Machine + ?Sized,
    H: CrossCallHooks<M> + ?Sized,
{
    let caller_sp = {
        let mut masked = IrqMasked::new(m);
        let caller_sp = if stack.switches_stack() {
            let sp = masked.sp();
            masked.set_sp(stack.base);
            sp
        } else {
            0
        };
        lock.lock(&masked);
        caller_sp
    };

    push_words(m, &[frame_addr, caller_sp]);
    let status = hooks.entering(m, fn_addr, frame_addr, caller_sp);
    let mut saved = [0u32; 2];
    pop_words(m, &mut saved);
    let [frame_addr, caller_sp] = saved;

    let mut masked = IrqMasked::new(m);
    hooks.exiting(&mut *masked, status, frame_addr);
    if caller_sp != 0 {
        masked.set_sp(caller_sp);
    }
    lock.unlock(&masked);
}
