// kernel/arch/src/hw.rs
// Cortex-M vector routines and register access
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

//! The three routines that own r4-r11 and the stack pointers are written in
//! assembly: `SVCall`, `PendSV` and `arch_non_preempt_call`. They follow the
//! same algorithms as [`crate::boundary`], [`crate::switch`] and
//! [`crate::cross_call`], and take every offset and pattern from
//! [`crate::layout`] as `const` operands.
//!
//! The instruction subset is Thumb-1 so one body serves ARMv6-M as well as
//! ARMv7-M/7E-M: r8-r11 are moved through low registers.

use core::arch::global_asm;

use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::SCB;

use crate::exc_return::EXC_RETURN_MODE_MASK;
use crate::layout::{
    CALLEE_FRAME_SIZE, CALLEE_SAVED_WORDS, R8_OFFSET, RESERVED_WORDS, STACK_SEAL_PATTERN, WORD,
};
use crate::machine::{Cpu, Memory};
use crate::priority::{PriorityRegs, PriorityTable, SecureException};

#[cfg(not(feature = "armv6m"))]
use crate::extensions::Cpacr;
#[cfg(feature = "fih")]
use crate::fih::FihInt;
#[cfg(feature = "cross_call")]
use crate::cross_call::StackRegion;
#[cfg(any(feature = "ipc", feature = "cross_call"))]
use crate::sched_lock::SCHEDULER_LOCK;
#[cfg(feature = "cross_call")]
use crate::sched_lock::{SCHEDULER_LOCKED, SCHEDULER_UNLOCKED};
#[cfg(feature = "ipc")]
use crate::switch::{decide, Schedule, SwitchPair};

// Collaborators provided by the partition manager.
extern "C" {
    /// Generic supervisor-call dispatcher; returns the EXC_RETURN to use.
    fn spm_svc_handler(msp: *mut u32, exc_return: u32, psp: *mut u32) -> u32;

    /// Returns the current context in r0 and the next one in r1.
    #[cfg(feature = "ipc")]
    fn ipc_schedule() -> u64;

    #[cfg(feature = "cross_call")]
    fn cross_call_entering_c(fn_addr: u32, frame_addr: u32, caller_sp: u32) -> u32;
    #[cfg(feature = "cross_call")]
    fn cross_call_exiting_c(status: u32, frame_addr: u32);

    #[cfg(feature = "cross_call")]
    fn arch_non_preempt_call(fn_addr: u32, frame_addr: u32, stk_base: u32, stk_limit: u32);
}

/// System control block access for the configuration paths.
pub struct CortexM {
    scb: SCB,
}

impl CortexM {
    /// # Safety
    ///
    /// Boot or audit context on a single core; nothing else may be
    /// programming the system handler priorities or CPACR concurrently.
    pub unsafe fn steal() -> Self {
        Self {
            scb: cortex_m::Peripherals::steal().SCB,
        }
    }
}

impl Cpu for CortexM {
    fn disable_irq(&mut self) {
        cortex_m::interrupt::disable();
        cortex_m::asm::isb();
    }

    fn enable_irq(&mut self) {
        // SAFETY: only called when closing a masked section.
        unsafe { cortex_m::interrupt::enable() };
        cortex_m::asm::isb();
    }

    fn irq_masked(&self) -> bool {
        cortex_m::register::primask::read().is_active()
    }

    fn pend_sv(&mut self) {
        SCB::set_pendsv();
    }
}

impl Memory for CortexM {
    unsafe fn read_word(&self, addr: u32) -> u32 {
        core::ptr::read_volatile(addr as usize as *const u32)
    }

    unsafe fn write_word(&mut self, addr: u32, value: u32) {
        core::ptr::write_volatile(addr as usize as *mut u32, value);
    }
}

fn system_handler(exc: SecureException) -> SystemHandler {
    match exc {
        #[cfg(not(feature = "armv6m"))]
        SecureException::MemoryManagement => SystemHandler::MemoryManagement,
        #[cfg(not(feature = "armv6m"))]
        SecureException::BusFault => SystemHandler::BusFault,
        SecureException::SVCall => SystemHandler::SVCall,
        SecureException::PendSV => SystemHandler::PendSV,
    }
}

impl PriorityRegs for CortexM {
    fn set_priority(&mut self, exc: SecureException, prio: u8) {
        // SAFETY: the ordering is validated by `PriorityTable` before it
        // reaches the registers.
        unsafe {
            self.scb
                .set_priority(system_handler(exc), prio << crate::config::PRIO_SHIFT)
        };
    }

    fn priority(&self, exc: SecureException) -> u8 {
        SCB::get_priority(system_handler(exc)) >> crate::config::PRIO_SHIFT
    }
}

#[cfg(not(feature = "armv6m"))]
impl Cpacr for CortexM {
    fn read_cpacr(&self) -> u32 {
        self.scb.cpacr.read()
    }

    fn write_cpacr(&mut self, value: u32) {
        // SAFETY: CPACR only gates coprocessor access.
        unsafe { self.scb.cpacr.write(value) };
        cortex_m::asm::dsb();
        cortex_m::asm::isb();
    }
}

/// Program the fixed exception priority ordering.
///
/// # Safety
///
/// See [`CortexM::steal`].
pub unsafe fn set_secure_exception_priorities() {
    let mut cpu = CortexM::steal();
    crate::priority::set_secure_exception_priorities(&mut cpu, &PriorityTable::SECURE);
}

/// Audit the exception priority ordering.
///
/// # Safety
///
/// See [`CortexM::steal`].
#[cfg(feature = "fih")]
#[must_use]
pub unsafe fn verify_secure_exception_priorities() -> FihInt {
    let cpu = CortexM::steal();
    crate::priority::verify_secure_exception_priorities(&cpu, &PriorityTable::SECURE)
}

/// Enable the optional coprocessors this build asks for.
///
/// # Safety
///
/// See [`CortexM::steal`].
pub unsafe fn config_extensions() {
    // No coprocessors exist on ARMv6-M.
    #[cfg(not(feature = "armv6m"))]
    {
        let mut cpu = CortexM::steal();
        crate::extensions::config_extensions(&mut cpu);
    }
}

/// Pend PendSV.
pub fn trigger_pendsv() {
    SCB::set_pendsv();
}

/// Call `fn_addr` with the scheduler locked, optionally on another stack.
///
/// # Safety
///
/// A non-zero `stack.base` must be the 8-byte aligned top of a stack owned
/// by the callee, and the cross-call hooks must accept `frame_addr`.
#[cfg(feature = "cross_call")]
pub unsafe fn non_preempt_call(fn_addr: u32, frame_addr: u32, stack: StackRegion) {
    arch_non_preempt_call(fn_addr, frame_addr, stack.base, stack.limit);
}

#[cfg(feature = "ipc")]
struct IpcSchedule;

#[cfg(feature = "ipc")]
impl Schedule for IpcSchedule {
    fn schedule(&mut self) -> SwitchPair {
        // SAFETY: runs in PendSV, where the scheduler expects to be called.
        SwitchPair::from_raw(unsafe { ipc_schedule() })
    }
}

/// Called from `PendSV` with the callee-saved registers still live; must
/// not touch r4-r11 beyond the AAPCS contract.
#[cfg(feature = "ipc")]
extern "C" fn pendsv_decide() -> u64 {
    decide(&mut IpcSchedule, &SCHEDULER_LOCK).into_raw()
}

// SVCall
//
// r0 = MSP, r1 = EXC_RETURN, r2 = PSP on the call into the dispatcher. The
// PSP and the original EXC_RETURN are kept on the main stack across it.
global_asm! {"
    .section .text.SVCall
    .globl SVCall
    .type SVCall,function
    SVCall:
        mrs r0, MSP
        mov r1, lr
        mrs r2, PSP
        push {{r2, r3}}             @ caller PSP, pad
        push {{r1, r2}}             @ original EXC_RETURN, pad
        bl {dispatch}
        mov lr, r0
        pop {{r1, r2}}
        movs r2, #{mode}
        ands r0, r2
        ands r1, r2
        pop {{r2, r3}}
        subs r0, r0, r1
        bgt 1f
        blt 2f
        bx lr

    1:  @ Handler -> Thread: stack r4-r11 under a sealed frame.
        push {{r2, r3}}
        mov r0, r8
        mov r1, r9
        mov r2, r10
        mov r3, r11
        push {{r0-r3}}
        push {{r4-r7}}
        sub sp, #{reserved}
        ldr r4, ={seal}
        mov r5, r4
        mov r6, r4
        mov r7, r4
        mov r8, r4
        mov r9, r4
        mov r10, r4
        mov r11, r4
        push {{r4, r5}}
        bx lr

    2:  @ Thread -> Handler: unwind the sealed frame.
        pop {{r0, r1}}              @ seal, checked before the return SVC
        add sp, #{reserved}
        pop {{r4-r7}}
        pop {{r0-r3}}
        mov r8, r0
        mov r9, r1
        mov r10, r2
        mov r11, r3
        pop {{r0, r1}}              @ caller PSP, pad
        bx lr
    ",
    dispatch = sym spm_svc_handler,
    mode = const EXC_RETURN_MODE_MASK,
    reserved = const RESERVED_WORDS * WORD,
    seal = const STACK_SEAL_PATTERN,
}

// PendSV
//
// `pendsv_decide` returns the current context in r0 and the next in r1;
// equal handles mean stay.
#[cfg(feature = "ipc")]
global_asm! {"
    .section .text.PendSV
    .globl PendSV
    .type PendSV,function
    PendSV:
        push {{r0, lr}}
        bl {decide}
        pop {{r2, r3}}
        mov lr, r3
        cmp r0, r1
        beq 1f
        cpsid i
        isb
        mrs r2, PSP
        subs r2, #{regs}
        stm r2!, {{r4-r7}}
        mov r4, r8
        mov r5, r9
        mov r6, r10
        mov r7, r11
        stm r2!, {{r4-r7}}
        subs r2, #{frame}
        mov r3, lr
        stm r0!, {{r2, r3}}         @ ContextCtrl {{ sp, exc_ret }}
        ldm r1!, {{r2, r3}}
        mov lr, r3
        adds r2, #{r8_off}
        ldm r2!, {{r4-r7}}
        mov r8, r4
        mov r9, r5
        mov r10, r6
        mov r11, r7
        subs r2, #{regs}
        ldm r2!, {{r4-r7}}
        adds r2, #{half}
        msr PSP, r2
        cpsie i
        isb
    1:  bx lr
    ",
    decide = sym pendsv_decide,
    regs = const CALLEE_SAVED_WORDS * WORD,
    frame = const CALLEE_FRAME_SIZE,
    r8_off = const R8_OFFSET,
    half = const 4 * WORD,
}

// arch_non_preempt_call(fn_addr, frame_addr, stk_base, stk_limit)
//
// r4 holds the caller SP (or 0) across the exiting hook.
#[cfg(feature = "cross_call")]
global_asm! {"
    .section .text.arch_non_preempt_call
    .globl arch_non_preempt_call
    .type arch_non_preempt_call,function
    arch_non_preempt_call:
        push {{r4, lr}}
        cpsid i
        isb
        cmp r2, #0
        beq 1f
        mov r4, sp
        mov sp, r2
        mov r2, r4
    1:  ldr r3, ={lock}
        movs r4, #{locked}
        str r4, [r3]
        cpsie i
        isb
        push {{r1, r2}}
        bl {entering}
        pop {{r1, r4}}
        cpsid i
        isb
        bl {exiting}
        cmp r4, #0
        beq 2f
        mov sp, r4
    2:  ldr r2, ={lock}
        movs r3, #{unlocked}
        str r3, [r2]
        cpsie i
        isb
        pop {{r4, pc}}
    ",
    lock = sym SCHEDULER_LOCK,
    locked = const SCHEDULER_LOCKED,
    unlocked = const SCHEDULER_UNLOCKED,
    entering = sym cross_call_entering_c,
    exiting = sym cross_call_exiting_c,
}
