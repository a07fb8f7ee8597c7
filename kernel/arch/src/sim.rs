// kernel/arch/src/sim.rs
// Simulated M-profile core for host-side tests
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

//! [`SimMachine`] holds just enough of a Cortex-M to run the boundary, switch
//! and cross-call algorithms: sparse word memory, MSP/PSP with an active-stack
//! selector, LR, r4-r11, PRIMASK, the PendSV pending bit, the system handler
//! priority fields and CPACR.
//!
//! Memory never written reads as zero. Misaligned access panics, as it would
//! fault on hardware. Accesses and mask transitions are counted so tests can
//! assert that a path touched nothing.

use core::cell::Cell;
use std::collections::BTreeMap;

use crate::config::PRIO_SHIFT;
use crate::extensions::Cpacr;
use crate::layout::WORD;
use crate::machine::{CalleeSaved, Cpu, Memory, RegisterFile};
use crate::priority::{PriorityRegs, SecureException};

/// Initial main stack top.
pub const SIM_MSP_TOP: u32 = 0x2001_0000;

/// Which banked stack pointer `sp` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveStack {
    Main,
    Process,
}

/// Traffic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    pub mem_reads: u32,
    pub mem_writes: u32,
    pub mask_transitions: u32,
}

impl SimStats {
    #[must_use]
    pub fn mem_traffic(&self) -> u32 {
        self.mem_reads + self.mem_writes
    }
}

#[derive(Debug)]
pub struct SimMachine {
    mem: BTreeMap<u32, u32>,
    msp: u32,
    psp: u32,
    active: ActiveStack,
    lr: u32,
    callee: CalleeSaved,
    primask: bool,
    pendsv_pending: bool,
    /// Raw 8-bit priority fields, indexed by [`shpr_index`].
    shpr: [u8; 4],
    cpacr: u32,
    mem_reads: Cell<u32>,
    mem_writes: u32,
    mask_transitions: u32,
}

fn shpr_index(exc: SecureException) -> usize {
    match exc {
        #[cfg(not(feature = "armv6m"))]
        SecureException::MemoryManagement => 0,
        #[cfg(not(feature = "armv6m"))]
        SecureException::BusFault => 1,
        SecureException::SVCall => 2,
        SecureException::PendSV => 3,
    }
}

impl SimMachine {
    /// Reset state: handler mode on the main stack, interrupts enabled,
    /// every priority field zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mem: BTreeMap::new(),
            msp: SIM_MSP_TOP,
            psp: 0,
            active: ActiveStack::Main,
            lr: 0,
            callee: CalleeSaved::default(),
            primask: false,
            pendsv_pending: false,
            shpr: [0; 4],
            cpacr: 0,
            mem_reads: Cell::new(0),
            mem_writes: 0,
            mask_transitions: 0,
        }
    }

    /// Inspect memory without counting the access.
    #[must_use]
    pub fn word(&self, addr: u32) -> u32 {
        self.mem.get(&addr).copied().unwrap_or(0)
    }

    /// Store without counting the access.
    pub fn set_word(&mut self, addr: u32, value: u32) {
        self.mem.insert(addr, value);
    }

    #[must_use]
    pub fn active(&self) -> ActiveStack {
        self.active
    }

    pub fn set_active(&mut self, active: ActiveStack) {
        self.active = active;
    }

    /// Consume a pending PendSV, as exception entry would.
    pub fn take_pendsv(&mut self) -> bool {
        core::mem::take(&mut self.pendsv_pending)
    }

    #[must_use]
    pub fn pendsv_pending(&self) -> bool {
        self.pendsv_pending
    }

    /// Raw priority register bytes.
    #[must_use]
    pub fn priority_snapshot(&self) -> [u8; 4] {
        self.shpr
    }

    /// Overwrite one priority field behind the configuration's back.
    pub fn corrupt_priority(&mut self, exc: SecureException, prio: u8) {
        self.shpr[shpr_index(exc)] = prio << PRIO_SHIFT;
    }

    #[must_use]
    pub fn stats(&self) -> SimStats {
        SimStats {
            mem_reads: self.mem_reads.get(),
            mem_writes: self.mem_writes,
            mask_transitions: self.mask_transitions,
        }
    }

    pub fn reset_stats(&mut self) {
        self.mem_reads.set(0);
        self.mem_writes = 0;
        self.mask_transitions = 0;
    }
}

impl Default for SimMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn check_aligned(addr: u32) {
    assert_eq!(addr % WORD, 0, "misaligned word access at {addr:#010x}");
}

impl Cpu for SimMachine {
    fn disable_irq(&mut self) {
        self.primask = true;
        self.mask_transitions += 1;
    }

    fn enable_irq(&mut self) {
        self.primask = false;
        self.mask_transitions += 1;
    }

    fn irq_masked(&self) -> bool {
        self.primask
    }

    fn pend_sv(&mut self) {
        self.pendsv_pending = true;
    }
}

impl Memory for SimMachine {
    unsafe fn read_word(&self, addr: u32) -> u32 {
        check_aligned(addr);
        self.mem_reads.set(self.mem_reads.get() + 1);
        self.word(addr)
    }

    unsafe fn write_word(&mut self, addr: u32, value: u32) {
        check_aligned(addr);
        self.mem_writes += 1;
        self.mem.insert(addr, value);
    }
}

impl RegisterFile for SimMachine {
    fn sp(&self) -> u32 {
        match self.active {
            ActiveStack::Main => self.msp,
            ActiveStack::Process => self.psp,
        }
    }

    fn set_sp(&mut self, sp: u32) {
        match self.active {
            ActiveStack::Main => self.msp = sp,
            ActiveStack::Process => self.psp = sp,
        }
    }

    fn msp(&self) -> u32 {
        self.msp
    }

    fn psp(&self) -> u32 {
        self.psp
    }

    fn set_psp(&mut self, psp: u32) {
        self.psp = psp;
    }

    fn lr(&self) -> u32 {
        self.lr
    }

    fn set_lr(&mut self, lr: u32) {
        self.lr = lr;
    }

    fn callee_saved(&self) -> CalleeSaved {
        self.callee
    }

    fn set_callee_saved(&mut self, regs: CalleeSaved) {
        self.callee = regs;
    }
}

impl PriorityRegs for SimMachine {
    fn set_priority(&mut self, exc: SecureException, prio: u8) {
        self.shpr[shpr_index(exc)] = prio << PRIO_SHIFT;
    }

    fn priority(&self, exc: SecureException) -> u8 {
        self.shpr[shpr_index(exc)] >> PRIO_SHIFT
    }
}

impl Cpacr for SimMachine {
    fn read_cpacr(&self) -> u32 {
        self.cpacr
    }

    fn write_cpacr(&mut self, value: u32) {
        self.cpacr = value;
    }
}
