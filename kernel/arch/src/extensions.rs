// kernel/arch/src/extensions.rs
// Architecture extensions enabled at boot (CP10/CP11)
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

use spm_log::klog_debug;

use crate::config::{ArchVariant, Variant};
use crate::LOG_SUBSYS;

/// CP10 full access (privileged and unprivileged).
pub const CPACR_CP10_FULL: u32 = 0b11 << 20;
/// CP11 full access (privileged and unprivileged).
pub const CPACR_CP11_FULL: u32 = 0b11 << 22;

/// Coprocessor Access Control Register. Writes are followed by DSB/ISB.
pub trait Cpacr {
    fn read_cpacr(&self) -> u32;
    fn write_cpacr(&mut self, value: u32);
}

/// Whether this build grants coprocessor access at all.
#[must_use]
pub const fn coprocessor_enabled() -> bool {
    <Variant as ArchVariant>::HAS_COPROCESSOR && cfg!(feature = "cp10cp11")
}

/// Grant full CP10/CP11 access when the build asks for it. Other CPACR
/// fields are preserved; a no-op everywhere else.
pub fn config_extensions<C: Cpacr + ?Sized>(cpacr: &mut C) {
    if !coprocessor_enabled() {
        return;
    }
    let value = cpacr.read_cpacr() | CPACR_CP10_FULL | CPACR_CP11_FULL;
    cpacr.write_cpacr(value);
    klog_debug!(LOG_SUBSYS, "cpacr {:#010x}", value);
}
