// tests/integration/logging_integration.rs
// Configuration paths report through the SPM logger
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

#[cfg(test)]
mod logging_integration_tests {
    use spm_arch::ctx::ContextCtrl;
    use spm_arch::priority::set_secure_exception_priorities;
    use spm_arch::sim::SimMachine;
    use spm_arch::PriorityTable;
    use spm_log::{LogLevel, LogRecord, LogHooks, LOG_RING_SIZE};

    fn arch_records() -> Vec<LogRecord> {
        let mut out = vec![LogRecord::empty(); LOG_RING_SIZE];
        let n = spm_log::read_records(&mut out);
        out.truncate(n);
        out.retain(|r| r.subsystem == "arch");
        out
    }

    #[test]
    fn configuration_is_logged_under_the_arch_tag() {
        spm_log::init(LogHooks::default());
        // Debug records from the thread-seeding tests would crowd the ring.
        spm_log::set_min_level(LogLevel::Info);

        let mut m = SimMachine::new();
        set_secure_exception_priorities(&mut m, &PriorityTable::SECURE);
        let mut ctx = ContextCtrl::new();
        let seeded = unsafe { ctx.seed(&mut m, 0x2000_0000, 0x2000_0400, 0x0800_0001, 0) };
        seeded.expect("seed");

        let records = arch_records();
        assert!(records
            .iter()
            .any(|r| r.level == LogLevel::Info && r.message().contains("exception priorities")));
    }
}
