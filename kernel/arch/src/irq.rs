// kernel/arch/src/irq.rs
// Scoped interrupt-masked section
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

use core::ops::{Deref, DerefMut};

use crate::machine::Cpu;

/// Interrupts stay masked while this guard lives; dropping it unmasks on
/// every exit path.
///
/// Unmasking is unconditional (`cpsie i`), matching the vector routines: a
/// masked section is never entered with interrupts already masked.
pub struct IrqMasked<'a, C: Cpu + ?Sized> {
    cpu: &'a mut C,
}

impl<'a, C: Cpu + ?Sized> IrqMasked<'a, C> {
    pub fn new(cpu: &'a mut C) -> Self {
        cpu.disable_irq();
        Self { cpu }
    }
}

impl<C: Cpu + ?Sized> Deref for IrqMasked<'_, C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        self.cpu
    }
}

impl<C: Cpu + ?Sized> DerefMut for IrqMasked<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.cpu
    }
}

impl<C: Cpu + ?Sized> Drop for IrqMasked<'_, C> {
    fn drop(&mut self) {
        self.cpu.enable_irq();
    }
}

/// Proof that interrupts are masked, for APIs that must only run masked.
pub trait Masked {}

impl<C: Cpu + ?Sized> Masked for IrqMasked<'_, C> {}
