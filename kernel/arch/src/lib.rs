//! Project: GuardBSD Winter Saga version 1.0.0
//! Package: spm_arch
//! Copyright © 2025 Cartesian School. Developed by Siergej Sobolewski.
//! License: BSD-3-Clause
//!
//! Rdzeń architektury SPM dla ARMv6-M/ARMv7-M: granica zaufania, przełączanie
//! kontekstu, wywołania niewywłaszczalne i priorytety wyjątków.
//!
//! # Layering
//!
//! The routines that own callee-saved registers and stack pointers (`SVCall`,
//! `PendSV`, `arch_non_preempt_call`) are hand-written vector code in
//! [`hw`] and only build for `target_os = "none"`. Everything they
//! decide on - the boundary classification, the switch decision under the
//! scheduler lock, the shared stack layout, the priority table - lives in
//! ordinary Rust modules that both the vector code and the host-side
//! [`sim`] machine use.
//!
//! The algorithms in [`boundary`], [`switch`] and [`cross_call`] are written
//! against the narrow [`machine::Machine`] interface. On hardware that
//! interface is only partially implementable (Rust cannot own r4-r11), so the
//! register-level versions are the vector routines; on the host the same
//! algorithms run against [`sim::SimMachine`].

#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "sim", not(test)))]
extern crate std;

pub mod config;
pub mod ctx;
pub mod error;
pub mod exc_return;
pub mod extensions;
pub mod fih;
pub mod irq;
pub mod layout;
pub mod machine;
pub mod priority;
pub mod sched_lock;
pub mod stack_guard;

pub mod boundary;
#[cfg(feature = "cross_call")]
pub mod cross_call;
#[cfg(feature = "ipc")]
pub mod switch;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod hw;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use config::{ArchVariant, Variant};
pub use ctx::ContextCtrl;
pub use error::{Error, Result};
pub use exc_return::ExcReturn;
pub use fih::{FihInt, FIH_FAILURE, FIH_SUCCESS};
pub use priority::{PriorityRegs, PriorityTable, SecureException};
pub use sched_lock::{LockState, SchedulerLock, SCHEDULER_LOCK};

/// Subsystem tag for every record this crate logs.
pub(crate) const LOG_SUBSYS: &str = "arch";
