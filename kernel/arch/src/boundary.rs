// kernel/arch/src/boundary.rs
// SVCall trust-boundary dispatch: FLIH entry/exit detection
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

//! Every supervisor call goes through the generic dispatcher, which may hand
//! back a different EXC_RETURN. Comparing the Thread/Handler mode bit before
//! and after tells whether the call switched roles:
//!
//! - Handler -> Thread: a secure interrupt asked to run its first-level
//!   handler (FLIH) function in Thread mode. The interrupted handler's
//!   callee-saved registers are stacked under a sealed frame and scrubbed.
//! - Thread -> Handler: the FLIH function returned; unstack the frame built
//!   on entry.
//! - Anything else passes straight through.
//!
//! Entry and exit must displace the main stack by exactly the same amount,
//! or the next exception return unstacks garbage.

use crate::exc_return::ExcReturn;
use crate::layout::{RESERVED_WORDS, SEAL_WORDS, STACK_SEAL_PATTERN, WORD};
use crate::machine::{adjust_sp, pop_words, push_words, CalleeSaved, Machine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryTransition {
    PassThrough,
    EnterFlih,
    ExitFlih,
}

impl BoundaryTransition {
    /// Classify by `mode(post) - mode(pre)`.
    #[must_use]
    pub const fn classify(pre: ExcReturn, post: ExcReturn) -> Self {
        let delta = post.mode_bit() - pre.mode_bit();
        if delta > 0 {
            BoundaryTransition::EnterFlih
        } else if delta < 0 {
            BoundaryTransition::ExitFlih
        } else {
            BoundaryTransition::PassThrough
        }
    }
}

/// The generic supervisor-call dispatcher.
pub trait SvcDispatch {
    /// Perform the call. `msp` is the main stack pointer at vector entry,
    /// `psp` the process stack pointer. Returns the EXC_RETURN to leave with.
    fn dispatch(&mut self, msp: u32, exc_return: u32, psp: u32) -> u32;
}

/// SVCall vector body.
///
/// On return LR holds the dispatcher's EXC_RETURN and the main stack holds,
/// for [`BoundaryTransition::EnterFlih`], the sealed FLIH frame.
///
/// # Safety
///
/// The active stack must be the main stack with room for the FLIH frame,
/// and an `ExitFlih` must only follow a matching `EnterFlih`.
pub unsafe fn svc_handler<M, D>(m: &mut M, dispatcher: &mut D) -> BoundaryTransition
where
    M: Machine + ?Sized,
    D: SvcDispatch + ?Sized,
{
    let msp = m.sp();
    let orig_exc_return = m.lr();
    let psp = m.psp();

    // Scratch survives the dispatcher call on the stack, as it must in the
    // vector routine where r1/r2 are caller-saved.
    push_words(m, &[psp, 0]);
    push_words(m, &[orig_exc_return, 0]);

    let new_exc_return = dispatcher.dispatch(msp, orig_exc_return, psp);
    m.set_lr(new_exc_return);

    let mut saved = [0u32; 2];
    pop_words(m, &mut saved);
    let pre = ExcReturn::from_raw(saved[0]);
    pop_words(m, &mut saved);
    let caller_psp = saved[0];

    let transition = BoundaryTransition::classify(pre, ExcReturn::from_raw(new_exc_return));
    match transition {
        BoundaryTransition::EnterFlih => enter_flih(m, caller_psp),
        BoundaryTransition::ExitFlih => exit_flih(m),
        BoundaryTransition::PassThrough => {}
    }
    transition
}

/// # Safety
///
/// Room for the FLIH frame on the active stack.
unsafe fn enter_flih<M: Machine + ?Sized>(m: &mut M, caller_psp: u32) {
    push_words(m, &[caller_psp, 0]);
    let regs = m.callee_saved();
    push_words(m, &regs.high());
    push_words(m, &regs.low());
    adjust_sp(m, -((RESERVED_WORDS * WORD) as i32));

    // Nothing from the interrupted handler leaks into the FLIH function.
    m.set_callee_saved(CalleeSaved::splat(STACK_SEAL_PATTERN));
    push_words(m, &[STACK_SEAL_PATTERN; SEAL_WORDS as usize]);
}

/// # Safety
///
/// The active stack must point at a frame built by [`enter_flih`].
unsafe fn exit_flih<M: Machine + ?Sized>(m: &mut M) {
    // The seal is checked by the partition layer before it gets here.
    let mut seal = [0u32; SEAL_WORDS as usize];
    pop_words(m, &mut seal);
    adjust_sp(m, (RESERVED_WORDS * WORD) as i32);

    let mut low = [0u32; 4];
    let mut high = [0u32; 4];
    pop_words(m, &mut low);
    pop_words(m, &mut high);
    m.set_callee_saved(CalleeSaved::from_halves(low, high));

    let mut psp_slot = [0u32; 2];
    pop_words(m, &mut psp_slot);
}
