// kernel/arch/src/machine.rs
// Narrow machine interface used by the boundary, switch and cross-call logic
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

use crate::layout::WORD;

/// Interrupt masking and exception pending.
pub trait Cpu {
    /// `cpsid i` followed by an instruction barrier.
    fn disable_irq(&mut self);
    /// `cpsie i` followed by an instruction barrier.
    fn enable_irq(&mut self);
    fn irq_masked(&self) -> bool;
    /// Pend the scheduling-trigger exception.
    fn pend_sv(&mut self);
}

/// Word access to stack memory.
pub trait Memory {
    /// # Safety
    ///
    /// `addr` must be word aligned and inside a stack region the caller owns.
    unsafe fn read_word(&self, addr: u32) -> u32;

    /// # Safety
    ///
    /// `addr` must be word aligned and inside a stack region the caller owns.
    unsafe fn write_word(&mut self, addr: u32, value: u32);
}

/// r4-r11, in register order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalleeSaved(pub [u32; 8]);

impl CalleeSaved {
    #[must_use]
    pub const fn splat(value: u32) -> Self {
        Self([value; 8])
    }

    /// r4-r7.
    #[must_use]
    pub fn low(&self) -> [u32; 4] {
        [self.0[0], self.0[1], self.0[2], self.0[3]]
    }

    /// r8-r11.
    #[must_use]
    pub fn high(&self) -> [u32; 4] {
        [self.0[4], self.0[5], self.0[6], self.0[7]]
    }

    #[must_use]
    pub fn from_halves(low: [u32; 4], high: [u32; 4]) -> Self {
        Self([
            low[0], low[1], low[2], low[3], high[0], high[1], high[2], high[3],
        ])
    }
}

/// Core registers the vector routines manipulate directly. Only a model can
/// implement this; on hardware these registers belong to the vector code.
pub trait RegisterFile {
    /// Active stack pointer.
    fn sp(&self) -> u32;
    fn set_sp(&mut self, sp: u32);
    fn msp(&self) -> u32;
    fn psp(&self) -> u32;
    fn set_psp(&mut self, psp: u32);
    /// LR; holds EXC_RETURN inside a handler.
    fn lr(&self) -> u32;
    fn set_lr(&mut self, lr: u32);
    fn callee_saved(&self) -> CalleeSaved;
    fn set_callee_saved(&mut self, regs: CalleeSaved);
}

pub trait Machine: Cpu + Memory + RegisterFile {}

impl<T: Cpu + Memory + RegisterFile> Machine for T {}

/// Full-descending push: `words[0]` ends up at the lowest address, as with
/// `push {rA, rB}`.
///
/// # Safety
///
/// The active stack must have room for `words`.
pub unsafe fn push_words<M: Memory + RegisterFile + ?Sized>(m: &mut M, words: &[u32]) {
    let sp = m.sp() - WORD * words.len() as u32;
    for (i, &w) in words.iter().enumerate() {
        m.write_word(sp + WORD * i as u32, w);
    }
    m.set_sp(sp);
}

/// Inverse of [`push_words`].
///
/// # Safety
///
/// The active stack must hold at least `out.len()` pushed words.
pub unsafe fn pop_words<M: Memory + RegisterFile + ?Sized>(m: &mut M, out: &mut [u32]) {
    let sp = m.sp();
    for (i, w) in out.iter_mut().enumerate() {
        *w = m.read_word(sp + WORD * i as u32);
    }
    m.set_sp(sp + WORD * out.len() as u32);
}

/// Move SP without touching memory (`sub sp, #n` / `add sp, #n`).
pub fn adjust_sp<M: RegisterFile + ?Sized>(m: &mut M, delta_bytes: i32) {
    let sp = m.sp().wrapping_add_signed(delta_bytes);
    m.set_sp(sp);
}
