// kernel/arch/src/switch.rs
// PendSV context switch engine
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

//! PendSV runs at the lowest managed priority, so by the time it executes
//! every other handler has drained and the interrupted context is a thread.
//! The hardware has already stacked r0-r3, r12, lr, pc and xPSR on the
//! thread's process stack; this engine stacks the callee frame below it and
//! swaps [`ContextCtrl`] blocks.
//!
//! The scheduler is consulted only while the scheduler lock is released.
//! Under the lock the decision is "stay", and the cross-call exit path is
//! responsible for pending a fresh PendSV if one was needed.

use crate::ctx::ContextCtrl;
use crate::irq::IrqMasked;
use crate::layout::{CALLEE_FRAME_SIZE, R4_OFFSET, R8_OFFSET, WORD};
use crate::machine::{CalleeSaved, Cpu, Machine, Memory, RegisterFile};
use crate::sched_lock::SchedulerLock;

/// Pointer to a thread's context block as handed out by the scheduler.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtxHandle(*mut ContextCtrl);

impl CtxHandle {
    pub const NULL: CtxHandle = CtxHandle(core::ptr::null_mut());

    pub const fn new(ctx: *mut ContextCtrl) -> Self {
        Self(ctx)
    }

    pub const fn as_ptr(self) -> *mut ContextCtrl {
        self.0
    }
}

/// Scheduler verdict: the running context and the one to run next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchPair {
    pub curr: CtxHandle,
    pub next: CtxHandle,
}

impl SwitchPair {
    /// Decision taken while the scheduler is locked.
    pub const STAY: SwitchPair = SwitchPair {
        curr: CtxHandle::NULL,
        next: CtxHandle::NULL,
    };

    #[inline]
    #[must_use]
    pub fn is_switch(&self) -> bool {
        self.curr != self.next
    }
}

// The scheduler hands the pair back in r0:r1 as one 64-bit value.
#[cfg(target_pointer_width = "32")]
impl SwitchPair {
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self {
            curr: CtxHandle(raw as u32 as usize as *mut ContextCtrl),
            next: CtxHandle((raw >> 32) as u32 as usize as *mut ContextCtrl),
        }
    }

    #[inline]
    pub fn into_raw(self) -> u64 {
        (self.curr.0 as usize as u64) | ((self.next.0 as usize as u64) << 32)
    }
}

/// The external thread scheduler.
pub trait Schedule {
    fn schedule(&mut self) -> SwitchPair;
}

impl<F: FnMut() -> SwitchPair> Schedule for F {
    fn schedule(&mut self) -> SwitchPair {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Same context resumes; no register or stack traffic.
    Stay,
    Switched,
}

/// Switch decision shared by the vector routine and the model.
pub fn decide<S: Schedule + ?Sized>(sched: &mut S, lock: &SchedulerLock) -> SwitchPair {
    if lock.is_locked() {
        return SwitchPair::STAY;
    }
    sched.schedule()
}

/// Request a reschedule; the switch happens once every higher-priority
/// handler has returned.
pub fn trigger_pendsv<C: Cpu + ?Sized>(cpu: &mut C) {
    cpu.pend_sv();
}

/// PendSV vector body.
///
/// # Safety
///
/// Must run as the PendSV handler: the interrupted context is a thread on
/// the process stack and LR is its EXC_RETURN. Both handles returned by the
/// scheduler must be valid, and `next` must hold a complete saved image.
pub unsafe fn pendsv_handler<M, S>(m: &mut M, sched: &mut S, lock: &SchedulerLock) -> SwitchOutcome
where
    M: Machine + ?Sized,
    S: Schedule + ?Sized,
{
    let pair = decide(sched, lock);
    if !pair.is_switch() {
        return SwitchOutcome::Stay;
    }

    let mut masked = IrqMasked::new(m);
    save_context(&mut *masked, &mut *pair.curr.as_ptr());
    restore_context(&mut *masked, &*pair.next.as_ptr());
    SwitchOutcome::Switched
}

/// # Safety
///
/// PSP must have room for a callee frame below it.
unsafe fn save_context<M: Memory + RegisterFile + ?Sized>(m: &mut M, ctx: &mut ContextCtrl) {
    let frame = m.psp() - CALLEE_FRAME_SIZE;
    let regs = m.callee_saved();
    for (i, w) in regs.low().into_iter().enumerate() {
        m.write_word(frame + R4_OFFSET + WORD * i as u32, w);
    }
    for (i, w) in regs.high().into_iter().enumerate() {
        m.write_word(frame + R8_OFFSET + WORD * i as u32, w);
    }
    // Reserved slots are left as found.
    ctx.sp = frame;
    ctx.exc_ret = m.lr();
}

/// # Safety
///
/// `ctx.sp` must point at a complete callee frame.
unsafe fn restore_context<M: Memory + RegisterFile + ?Sized>(m: &mut M, ctx: &ContextCtrl) {
    let frame = ctx.sp;
    let mut low = [0u32; 4];
    let mut high = [0u32; 4];
    for (i, w) in low.iter_mut().enumerate() {
        *w = m.read_word(frame + R4_OFFSET + WORD * i as u32);
    }
    for (i, w) in high.iter_mut().enumerate() {
        *w = m.read_word(frame + R8_OFFSET + WORD * i as u32);
    }
    m.set_callee_saved(CalleeSaved::from_halves(low, high));
    m.set_psp(frame + CALLEE_FRAME_SIZE);
    m.set_lr(ctx.exc_ret);
}
