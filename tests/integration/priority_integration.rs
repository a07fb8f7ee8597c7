// tests/integration/priority_integration.rs
// Boot-time priority configuration and later audit
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

#[cfg(test)]
mod priority_integration_tests {
    use spm_arch::extensions::config_extensions;
    use spm_arch::priority::{set_secure_exception_priorities, verify_secure_exception_priorities};
    use spm_arch::sim::SimMachine;
    use spm_arch::{Error, PriorityRegs, PriorityTable, SecureException, FIH_FAILURE};

    fn booted() -> SimMachine {
        let mut m = SimMachine::new();
        set_secure_exception_priorities(&mut m, &PriorityTable::SECURE);
        config_extensions(&mut m);
        m
    }

    #[test]
    fn audit_passes_until_something_is_tampered_with() {
        let mut m = booted();
        assert!(verify_secure_exception_priorities(&m, &PriorityTable::SECURE).is_success());

        // Raising PendSV to SVCall level would let a switch run inside a call.
        m.corrupt_priority(SecureException::PendSV, PriorityTable::SECURE.expected(SecureException::SVCall));
        let verdict = verify_secure_exception_priorities(&m, &PriorityTable::SECURE);
        assert!(!verdict.is_success());
        assert_eq!(verdict.decode(), FIH_FAILURE.decode());

        // Reconfiguring repairs it.
        set_secure_exception_priorities(&mut m, &PriorityTable::SECURE);
        assert!(verify_secure_exception_priorities(&m, &PriorityTable::SECURE).is_success());
    }

    #[test]
    fn pendsv_is_the_least_urgent_managed_exception() {
        let m = booted();
        let pendsv = m.priority(SecureException::PendSV);
        for &exc in SecureException::MANAGED {
            if exc != SecureException::PendSV {
                assert!(m.priority(exc) < pendsv, "{exc:?} not above PendSV");
            }
        }
    }

    #[test]
    fn custom_tables_must_keep_the_ordering() {
        assert_eq!(PriorityTable::new(2, 1, 3), Err(Error::PriorityOrder));
        let table = PriorityTable::new(0, 2, 3).expect("valid ordering");

        let mut m = SimMachine::new();
        set_secure_exception_priorities(&mut m, &table);
        assert!(verify_secure_exception_priorities(&m, &table).is_success());
        assert!(!verify_secure_exception_priorities(&m, &PriorityTable::SECURE).is_success());
    }
}
