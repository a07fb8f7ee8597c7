// tests/integration/boundary_integration.rs
// SVCall boundary: FLIH round trips through a dispatcher model
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

#[cfg(test)]
mod boundary_integration_tests {
    use spm_arch::boundary::{svc_handler, BoundaryTransition, SvcDispatch};
    use spm_arch::layout::{FLIH_FRAME_SIZE, STACK_SEAL_PATTERN, WORD};
    use spm_arch::machine::{CalleeSaved, RegisterFile};
    use spm_arch::sim::SimMachine;
    use spm_arch::ExcReturn;

    /// Supervisor calls the dispatcher understands.
    #[derive(Clone, Copy)]
    enum Call {
        Plain,
        RunFlih,
        FlihDone,
    }

    /// Minimal partition manager: remembers the handler it suspended.
    struct Spm {
        next: Call,
        suspended: Option<u32>,
        seen_seal: Option<[u32; 2]>,
        m_snapshot: Vec<(u32, u32)>,
    }

    impl Spm {
        fn new() -> Self {
            Self {
                next: Call::Plain,
                suspended: None,
                seen_seal: None,
                m_snapshot: Vec::new(),
            }
        }
    }

    impl SvcDispatch for Spm {
        fn dispatch(&mut self, msp: u32, exc_return: u32, _psp: u32) -> u32 {
            self.m_snapshot.push((msp, exc_return));
            match self.next {
                Call::Plain => exc_return,
                Call::RunFlih => {
                    self.suspended = Some(exc_return);
                    ExcReturn::THREAD_PSP.bits()
                }
                Call::FlihDone => self.suspended.take().unwrap_or(exc_return),
            }
        }
    }

    fn issue(m: &mut SimMachine, spm: &mut Spm, call: Call, lr: ExcReturn) -> BoundaryTransition {
        spm.next = call;
        m.set_lr(lr.bits());
        unsafe { svc_handler(m, spm) }
    }

    #[test]
    fn flih_round_trip_restores_the_interrupted_handler() {
        let mut m = SimMachine::new();
        let msp = m.sp();
        let secure = CalleeSaved([0x51, 0x52, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58]);
        m.set_callee_saved(secure);
        let mut spm = Spm::new();

        let t = issue(&mut m, &mut spm, Call::RunFlih, ExcReturn::HANDLER_MSP);
        assert_eq!(t, BoundaryTransition::EnterFlih);
        assert_eq!(m.sp(), msp - FLIH_FRAME_SIZE);
        assert_eq!(m.callee_saved(), CalleeSaved::splat(STACK_SEAL_PATTERN));
        spm.seen_seal = Some([m.word(m.sp()), m.word(m.sp() + WORD)]);

        // The FLIH function makes ordinary calls from Thread mode.
        m.set_callee_saved(CalleeSaved::splat(0x0F1F));
        for _ in 0..3 {
            let t = issue(&mut m, &mut spm, Call::Plain, ExcReturn::THREAD_PSP);
            assert_eq!(t, BoundaryTransition::PassThrough);
            assert_eq!(m.sp(), msp - FLIH_FRAME_SIZE);
        }

        let t = issue(&mut m, &mut spm, Call::FlihDone, ExcReturn::THREAD_PSP);
        assert_eq!(t, BoundaryTransition::ExitFlih);
        assert_eq!(m.sp(), msp);
        assert_eq!(m.lr(), ExcReturn::HANDLER_MSP.bits());
        assert_eq!(m.callee_saved(), secure);
        assert_eq!(spm.seen_seal, Some([STACK_SEAL_PATTERN; 2]));
    }

    #[test]
    fn dispatcher_sees_msp_at_vector_entry() {
        let mut m = SimMachine::new();
        let msp = m.sp();
        let mut spm = Spm::new();

        issue(&mut m, &mut spm, Call::RunFlih, ExcReturn::HANDLER_MSP);
        issue(&mut m, &mut spm, Call::FlihDone, ExcReturn::THREAD_PSP);

        assert_eq!(spm.m_snapshot[0], (msp, ExcReturn::HANDLER_MSP.bits()));
        assert_eq!(
            spm.m_snapshot[1],
            (msp - FLIH_FRAME_SIZE, ExcReturn::THREAD_PSP.bits())
        );
    }

    #[test]
    fn ordinary_calls_never_move_the_stack() {
        let mut m = SimMachine::new();
        let msp = m.sp();
        let mut spm = Spm::new();
        for lr in [ExcReturn::THREAD_PSP, ExcReturn::THREAD_MSP, ExcReturn::HANDLER_MSP] {
            assert_eq!(issue(&mut m, &mut spm, Call::Plain, lr), BoundaryTransition::PassThrough);
            assert_eq!(m.sp(), msp);
        }
    }
}
