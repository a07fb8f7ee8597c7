// kernel/arch/src/stack_guard.rs
// Process stack lower bound
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

//! ARMv6-M and ARMv7-M have no PSPLIM register, so the lower bound of the
//! process stack is only recorded here for the software checks performed by
//! the partition layer.

use core::cell::Cell;

use critical_section::Mutex;
use spm_log::{klog_debug, klog_warn};

use crate::LOG_SUBSYS;

// `None` until the first call; any value, 0 included, then sticks.
static PSP_LIMIT: Mutex<Cell<Option<u32>>> = Mutex::new(Cell::new(None));

/// Record the process stack lower bound. Set once at initialization; a second
/// call with a different value is logged and ignored.
pub fn set_psp_limit(limit: u32) {
    let previous = critical_section::with(|cs| {
        let slot = PSP_LIMIT.borrow(cs);
        let previous = slot.get();
        if previous.is_none() {
            slot.set(Some(limit));
        }
        previous
    });

    match previous {
        None => klog_debug!(LOG_SUBSYS, "psp limit {:#010x}", limit),
        Some(current) if current != limit => klog_warn!(
            LOG_SUBSYS,
            "psp limit already {:#010x}, ignoring {:#010x}",
            current,
            limit
        ),
        Some(_) => {}
    }
}

/// The recorded lower bound, if one was set.
#[must_use]
pub fn psp_limit() -> Option<u32> {
    critical_section::with(|cs| PSP_LIMIT.borrow(cs).get())
}
