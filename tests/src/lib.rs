//! Project: GuardBSD Winter Saga version 1.0.0
//! Package: integration_tests
//! Copyright © 2025 Cartesian School. Developed by Siergej Sobolewski.
//! License: BSD-3-Clause
//!
//! Uprząż testowa: wątki, planista i dostarczanie PendSV na symulatorze.

use spm_arch::ctx::ContextCtrl;
use spm_arch::machine::{Cpu, RegisterFile};
use spm_arch::sim::SimMachine;
use spm_arch::switch::{pendsv_handler, CtxHandle, Schedule, SwitchOutcome, SwitchPair};
use spm_arch::SchedulerLock;

/// Index of the context that is running when the harness starts.
pub const BOOT_THREAD: usize = 0;

/// Context blocks plus a scheduler that runs whichever thread was selected.
///
/// Blocks are boxed so the handles given to the switch engine stay valid as
/// threads are added.
pub struct Threads {
    ctxs: Vec<Box<ContextCtrl>>,
    current: usize,
    next: usize,
}

impl Threads {
    /// Only the boot context, which is running.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ctxs: vec![Box::new(ContextCtrl::new())],
            current: BOOT_THREAD,
            next: BOOT_THREAD,
        }
    }

    /// Seed a new thread on `[base, top)`.
    ///
    /// # Errors
    ///
    /// Whatever [`ContextCtrl::seed`] rejects.
    pub fn spawn(
        &mut self,
        m: &mut SimMachine,
        base: u32,
        top: u32,
        entry: u32,
        param: u32,
    ) -> spm_arch::Result<usize> {
        let mut ctx = Box::new(ContextCtrl::new());
        // SAFETY: the simulator owns every address.
        unsafe { ctx.seed(m, base, top, entry, param)? };
        self.ctxs.push(ctx);
        Ok(self.ctxs.len() - 1)
    }

    /// Run `idx` at the next scheduling point.
    pub fn select(&mut self, idx: usize) {
        assert!(idx < self.ctxs.len(), "no thread {idx}");
        self.next = idx;
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn ctx(&self, idx: usize) -> ContextCtrl {
        *self.ctxs[idx]
    }

    fn handle(&mut self, idx: usize) -> CtxHandle {
        CtxHandle::new(&mut *self.ctxs[idx])
    }
}

impl Default for Threads {
    fn default() -> Self {
        Self::new()
    }
}

impl Schedule for Threads {
    fn schedule(&mut self) -> SwitchPair {
        let pair = SwitchPair {
            curr: self.handle(self.current),
            next: self.handle(self.next),
        };
        self.current = self.next;
        pair
    }
}

/// Take a pending PendSV if interrupts allow it, as the core would on
/// leaving the last higher-priority handler.
///
/// # Safety
///
/// Same contract as [`pendsv_handler`].
pub unsafe fn deliver_pendsv(
    m: &mut SimMachine,
    threads: &mut Threads,
    lock: &SchedulerLock,
) -> Option<SwitchOutcome> {
    if m.irq_masked() || !m.take_pendsv() {
        return None;
    }
    Some(pendsv_handler(m, threads, lock))
}

/// Lay down the hardware frame the core stacks on exception entry and point
/// PSP at it, so the boot context looks like an interrupted thread.
pub fn interrupted_thread(m: &mut SimMachine, stack_top: u32, exc_return: u32) {
    let frame = stack_top - spm_arch::layout::HW_FRAME_SIZE;
    for i in 0..spm_arch::layout::HW_FRAME_WORDS {
        m.set_word(frame + spm_arch::layout::WORD * i, 0);
    }
    m.set_psp(frame);
    m.set_lr(exc_return);
}
