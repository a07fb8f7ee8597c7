// kernel/arch/src/priority.rs
// Secure exception priority table: configuration and hardened audit
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

//! Faults must always be able to preempt SVCall, and SVCall must always be
//! able to preempt PendSV; otherwise a scheduling pass could run in the
//! middle of a supervisor call, or a fault in either could be held off.
//! [`PriorityTable`] carries that ordering, [`set_secure_exception_priorities`]
//! programs it, and [`verify_secure_exception_priorities`] re-reads it later
//! with hardened comparisons.

use spm_log::klog_info;

use crate::config::{
    ArchVariant, Variant, FAULT_PRIORITY, PENDSV_PRIORITY, SVCALL_PRIORITY,
};
use crate::error::{Error, Result};
use crate::LOG_SUBSYS;

#[cfg(feature = "fih")]
use crate::fih::{fih_eq, fih_not_eq, fih_panic, FihInt, FIH_FAILURE, FIH_SUCCESS};
#[cfg(feature = "fih")]
use core::hint::black_box;
#[cfg(feature = "fih")]
use spm_log::klog_error;

/// System exceptions whose priority this core owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecureException {
    #[cfg(not(feature = "armv6m"))]
    MemoryManagement,
    #[cfg(not(feature = "armv6m"))]
    BusFault,
    SVCall,
    PendSV,
}

impl SecureException {
    /// Every exception the table covers on this variant, most urgent first.
    #[cfg(not(feature = "armv6m"))]
    pub const MANAGED: &'static [SecureException] = &[
        SecureException::MemoryManagement,
        SecureException::BusFault,
        SecureException::SVCall,
        SecureException::PendSV,
    ];

    /// ARMv6-M faults escalate to HardFault, whose priority is fixed at -1.
    #[cfg(feature = "armv6m")]
    pub const MANAGED: &'static [SecureException] =
        &[SecureException::SVCall, SecureException::PendSV];

    #[must_use]
    pub const fn is_fault(self) -> bool {
        !matches!(self, SecureException::SVCall | SecureException::PendSV)
    }
}

/// Per-exception priority registers, in logical (unshifted) priority units.
pub trait PriorityRegs {
    fn set_priority(&mut self, exc: SecureException, prio: u8);
    fn priority(&self, exc: SecureException) -> u8;
}

/// Validated priority assignment; lower number is more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityTable {
    fault: u8,
    svcall: u8,
    pendsv: u8,
}

impl PriorityTable {
    /// The fixed ordering every secure build uses.
    pub const SECURE: PriorityTable = PriorityTable {
        fault: FAULT_PRIORITY,
        svcall: SVCALL_PRIORITY,
        pendsv: PENDSV_PRIORITY,
    };

    /// # Errors
    ///
    /// [`Error::PriorityRange`] if a level exceeds the implemented bits,
    /// [`Error::PriorityOrder`] unless `fault < svcall < pendsv`.
    pub fn new(fault: u8, svcall: u8, pendsv: u8) -> Result<Self> {
        let lowest = <Variant as ArchVariant>::LOWEST_PRIORITY;
        if fault > lowest || svcall > lowest || pendsv > lowest {
            return Err(Error::PriorityRange);
        }
        if !(fault < svcall && svcall < pendsv) {
            return Err(Error::PriorityOrder);
        }
        Ok(Self {
            fault,
            svcall,
            pendsv,
        })
    }

    #[must_use]
    pub const fn expected(&self, exc: SecureException) -> u8 {
        match exc {
            SecureException::SVCall => self.svcall,
            SecureException::PendSV => self.pendsv,
            #[cfg(not(feature = "armv6m"))]
            SecureException::MemoryManagement | SecureException::BusFault => self.fault,
        }
    }
}

impl Default for PriorityTable {
    fn default() -> Self {
        Self::SECURE
    }
}

/// Program every managed exception priority. Idempotent.
pub fn set_secure_exception_priorities<R: PriorityRegs + ?Sized>(
    regs: &mut R,
    table: &PriorityTable,
) {
    for &exc in SecureException::MANAGED {
        regs.set_priority(exc, table.expected(exc));
    }
    klog_info!(
        LOG_SUBSYS,
        "{} exception priorities: fault={} svc={} pendsv={}",
        <Variant as ArchVariant>::NAME,
        table.fault,
        table.svcall,
        table.pendsv
    );
}

/// Re-read every managed priority and compare it with the table.
///
/// Stops at the first mismatch: every checked exception is equally critical,
/// so one is enough to condemn the configuration. Success is never the
/// fall-through result; it is only produced by [`audit_verdict`] once the
/// hardened tally shows that every check ran and matched. Each match is
/// confirmed a second time behind a barrier, so skipping the mismatch branch
/// traps instead of counting.
#[cfg(feature = "fih")]
#[must_use]
pub fn verify_secure_exception_priorities<R: PriorityRegs + ?Sized>(
    regs: &R,
    table: &PriorityTable,
) -> FihInt {
    let managed = SecureException::MANAGED;
    let mut matched = FihInt::encode(0);

    for &exc in managed {
        let actual = FihInt::encode(i32::from(regs.priority(exc)));
        let expected = FihInt::encode(i32::from(table.expected(exc)));
        if fih_not_eq(actual, expected) {
            klog_error!(
                LOG_SUBSYS,
                "{:?} priority {} != {}",
                exc,
                actual.decode(),
                expected.decode()
            );
            return FIH_FAILURE;
        }
        if !fih_eq(black_box(actual), black_box(expected)) {
            fih_panic();
        }
        matched = matched.increment();
    }

    audit_verdict(matched, FihInt::encode(managed.len() as i32))
}

/// `FIH_SUCCESS` only if `matched` equals `total`; a torn tally traps.
#[cfg(feature = "fih")]
#[inline(never)]
fn audit_verdict(matched: FihInt, total: FihInt) -> FihInt {
    let mut verdict = FIH_FAILURE;
    if fih_eq(matched, total) {
        verdict = FIH_SUCCESS;
    }
    black_box(verdict)
}
