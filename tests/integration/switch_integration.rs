// tests/integration/switch_integration.rs
// Context switching between seeded threads
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

#[cfg(test)]
mod switch_integration_tests {
    use std::collections::HashMap;

    use integration_tests::{deliver_pendsv, interrupted_thread, Threads, BOOT_THREAD};
    use proptest::prelude::*;
    use spm_arch::layout::{HW_FRAME_SIZE, WORD, XPSR_THUMB};
    use spm_arch::machine::{CalleeSaved, RegisterFile};
    use spm_arch::sim::SimMachine;
    use spm_arch::switch::{trigger_pendsv, SwitchOutcome};
    use spm_arch::{ExcReturn, SchedulerLock};

    const BOOT_TOP: u32 = 0x2000_1000;
    const STACK_SIZE: u32 = 0x400;

    fn stack_top(n: u32) -> u32 {
        0x2000_2000 + n * STACK_SIZE
    }

    fn setup(threads: u32) -> (SimMachine, Threads) {
        let mut m = SimMachine::new();
        interrupted_thread(&mut m, BOOT_TOP, ExcReturn::THREAD_PSP.bits());
        let mut t = Threads::new();
        for n in 0..threads {
            let top = stack_top(n + 1);
            t.spawn(&mut m, top - STACK_SIZE, top, 0x0800_0101 + n * 0x100, 0x100 + n)
                .expect("seed");
        }
        (m, t)
    }

    #[test]
    fn first_switch_lands_on_seeded_entry() {
        let (mut m, mut t) = setup(1);
        let lock = SchedulerLock::new();

        t.select(1);
        trigger_pendsv(&mut m);
        let out = unsafe { deliver_pendsv(&mut m, &mut t, &lock) };

        assert_eq!(out, Some(SwitchOutcome::Switched));
        assert_eq!(t.current(), 1);
        // PSP is back at the hardware frame the exception return unstacks.
        let frame = m.psp();
        // Thread 1 was seeded on the stack ending at stack_top(1).
        assert_eq!(frame, stack_top(1) - HW_FRAME_SIZE);
        assert_eq!(m.word(frame), 0x100);
        assert_eq!(m.word(frame + 6 * WORD), 0x0800_0100);
        assert_eq!(m.word(frame + 7 * WORD), XPSR_THUMB);
        assert_eq!(m.lr(), ExcReturn::THREAD_PSP.bits());
        assert_eq!(m.callee_saved(), CalleeSaved::default());

        let boot = t.ctx(BOOT_THREAD);
        assert_eq!(boot.sp, BOOT_TOP - HW_FRAME_SIZE - spm_arch::layout::CALLEE_FRAME_SIZE);
    }

    #[test]
    fn nothing_happens_without_a_pending_request() {
        let (mut m, mut t) = setup(1);
        let lock = SchedulerLock::new();
        t.select(1);
        assert_eq!(unsafe { deliver_pendsv(&mut m, &mut t, &lock) }, None);
        assert_eq!(t.current(), BOOT_THREAD);
    }

    #[test]
    fn reselecting_the_running_thread_is_free() {
        let (mut m, mut t) = setup(1);
        let lock = SchedulerLock::new();
        m.reset_stats();

        trigger_pendsv(&mut m);
        let out = unsafe { deliver_pendsv(&mut m, &mut t, &lock) };

        assert_eq!(out, Some(SwitchOutcome::Stay));
        assert_eq!(m.stats().mem_traffic(), 0);
        assert_eq!(m.stats().mask_transitions, 0);
    }

    proptest! {
        #[test]
        fn every_thread_resumes_with_its_own_registers(
            order in proptest::collection::vec(0usize..4, 1..24),
        ) {
            let (mut m, mut t) = setup(3);
            let lock = SchedulerLock::new();
            let mut saved: HashMap<usize, (CalleeSaved, u32)> = HashMap::new();

            for (step, &next) in order.iter().enumerate() {
                // The running thread computes something before the tick.
                let running = t.current();
                let regs = CalleeSaved::splat(((running as u32) << 16) | step as u32);
                m.set_callee_saved(regs);
                saved.insert(running, (regs, m.psp()));

                t.select(next);
                trigger_pendsv(&mut m);
                unsafe { deliver_pendsv(&mut m, &mut t, &lock) };

                prop_assert_eq!(t.current(), next);
                match saved.get(&next) {
                    Some(&(regs, psp)) => {
                        prop_assert_eq!(m.callee_saved(), regs);
                        prop_assert_eq!(m.psp(), psp);
                    }
                    None => {
                        prop_assert_eq!(m.callee_saved(), CalleeSaved::default());
                        prop_assert_eq!(m.psp(), stack_top(next as u32) - HW_FRAME_SIZE);
                    }
                }
            }
        }
    }
}
