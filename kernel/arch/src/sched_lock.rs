// kernel/arch/src/sched_lock.rs
// Scheduler lock: suppresses the PendSV switch decision
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

use core::sync::atomic::{AtomicU32, Ordering};

use crate::irq::Masked;

pub const SCHEDULER_UNLOCKED: u32 = 0;
pub const SCHEDULER_LOCKED: u32 = 1;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked = SCHEDULER_UNLOCKED,
    Locked = SCHEDULER_LOCKED,
}

/// Single word read by the switch decision and written by the cross-domain
/// call. Writers must hold a masked section; the type demands the proof.
///
/// Plain load/store only: ARMv6-M has no read-modify-write atomics, and the
/// mask already makes each access indivisible with respect to PendSV.
#[repr(transparent)]
pub struct SchedulerLock(AtomicU32);

impl SchedulerLock {
    pub const fn new() -> Self {
        Self(AtomicU32::new(SCHEDULER_UNLOCKED))
    }

    #[inline]
    pub fn state(&self) -> LockState {
        if self.0.load(Ordering::Acquire) == SCHEDULER_LOCKED {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.state() == LockState::Locked
    }

    #[inline]
    pub fn lock(&self, _masked: &impl Masked) {
        self.0.store(SCHEDULER_LOCKED, Ordering::Release);
    }

    #[inline]
    pub fn unlock(&self, _masked: &impl Masked) {
        self.0.store(SCHEDULER_UNLOCKED, Ordering::Release);
    }
}

impl Default for SchedulerLock {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide lock; `arch_non_preempt_call` stores to it directly.
pub static SCHEDULER_LOCK: SchedulerLock = SchedulerLock::new();
