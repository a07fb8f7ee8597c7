// tests/integration/cross_call_integration.rs
// Cross-domain calls against a live scheduler
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

#[cfg(test)]
mod cross_call_integration_tests {
    use integration_tests::{deliver_pendsv, interrupted_thread, Threads, BOOT_THREAD};
    use spm_arch::cross_call::{non_preempt_call, CrossCallHooks, StackRegion};
    use spm_arch::machine::RegisterFile;
    use spm_arch::sim::SimMachine;
    use spm_arch::switch::{trigger_pendsv, SwitchOutcome};
    use spm_arch::{ExcReturn, SchedulerLock};

    /// A partition call during which a timer tick asks for another thread.
    struct TickDuringCall<'a> {
        threads: &'a mut Threads,
        lock: &'a SchedulerLock,
        during: Option<SwitchOutcome>,
        deferred: bool,
    }

    impl CrossCallHooks<SimMachine> for TickDuringCall<'_> {
        fn entering(&mut self, m: &mut SimMachine, _fn: u32, _frame: u32, _sp: u32) -> u32 {
            self.threads.select(1);
            trigger_pendsv(m);
            self.during = unsafe { deliver_pendsv(m, self.threads, self.lock) };
            0
        }

        fn exiting(&mut self, m: &mut SimMachine, _status: u32, _frame: u32) {
            // The request swallowed under the lock is raised again here.
            if self.threads.current() != 1 {
                trigger_pendsv(m);
                self.deferred = true;
            }
        }
    }

    #[test]
    fn switch_is_deferred_until_the_call_returns() {
        let mut m = SimMachine::new();
        interrupted_thread(&mut m, 0x2000_1000, ExcReturn::THREAD_PSP.bits());
        let mut threads = Threads::new();
        threads
            .spawn(&mut m, 0x2000_2000, 0x2000_2400, 0x0800_0201, 7)
            .expect("seed");
        let lock = SchedulerLock::new();

        let mut hooks = TickDuringCall {
            threads: &mut threads,
            lock: &lock,
            during: None,
            deferred: false,
        };
        let target = StackRegion::new(0x2000_8000, 0x2000_7000);
        unsafe { non_preempt_call(&mut m, &mut hooks, &lock, 0x0800_0301, 0x2000_0100, target) };

        assert_eq!(hooks.during, Some(SwitchOutcome::Stay));
        assert!(hooks.deferred);
        assert_eq!(threads.current(), BOOT_THREAD);
        assert!(!lock.is_locked());

        // Leaving the caller's handler lets the re-raised request through.
        let after = unsafe { deliver_pendsv(&mut m, &mut threads, &lock) };
        assert_eq!(after, Some(SwitchOutcome::Switched));
        assert_eq!(threads.current(), 1);
    }

    #[test]
    fn back_to_back_calls_leave_no_residue() {
        struct Nop;
        impl CrossCallHooks<SimMachine> for Nop {
            fn entering(&mut self, _m: &mut SimMachine, _f: u32, _fr: u32, _sp: u32) -> u32 {
                0
            }
            fn exiting(&mut self, _m: &mut SimMachine, _s: u32, _fr: u32) {}
        }

        let mut m = SimMachine::new();
        let lock = SchedulerLock::new();
        let sp = m.sp();
        for base in [0, 0x2000_8000, 0, 0x2000_9000] {
            unsafe { non_preempt_call(&mut m, &mut Nop, &lock, 0x1000, 0, StackRegion::new(base, 0)) };
            assert_eq!(m.sp(), sp);
            assert!(!lock.is_locked());
        }
    }
}
