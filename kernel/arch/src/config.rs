// kernel/arch/src/config.rs
// Build-variant selection and priority tunables
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

//! The architecture variant is chosen by Cargo feature, never by a runtime
//! tag. Each variant is a zero-sized type implementing [`ArchVariant`], and
//! [`Variant`] names the one this build was configured for. With no variant
//! feature enabled the build targets ARMv7-M.

cfg_if::cfg_if! {
    if #[cfg(any(
        all(feature = "armv6m", feature = "armv7m"),
        all(feature = "armv6m", feature = "armv7em"),
        all(feature = "armv7m", feature = "armv7em"),
    ))] {
        compile_error!("at most one of the armv6m, armv7m, armv7em features may be enabled");
    }
}

/// Fixed properties of an M-profile architecture variant.
pub trait ArchVariant {
    const NAME: &'static str;
    /// Implemented priority bits in each 8-bit priority field.
    const NVIC_PRIO_BITS: u8;
    /// MemManage/BusFault have programmable priority.
    const CONFIGURABLE_FAULTS: bool;
    /// CP10/CP11 may be present.
    const HAS_COPROCESSOR: bool;

    /// Lowest (least urgent) configurable logical priority.
    const LOWEST_PRIORITY: u8 = (1 << Self::NVIC_PRIO_BITS) - 1;
}

/// ARMv6-M (Cortex-M0/M0+/M1).
#[derive(Debug, Clone, Copy)]
pub struct ArmV6M;

impl ArchVariant for ArmV6M {
    const NAME: &'static str = "armv6-m";
    const NVIC_PRIO_BITS: u8 = 2;
    const CONFIGURABLE_FAULTS: bool = false;
    const HAS_COPROCESSOR: bool = false;
}

/// ARMv7-M (Cortex-M3).
#[derive(Debug, Clone, Copy)]
pub struct ArmV7M;

impl ArchVariant for ArmV7M {
    const NAME: &'static str = "armv7-m";
    const NVIC_PRIO_BITS: u8 = 3;
    const CONFIGURABLE_FAULTS: bool = true;
    const HAS_COPROCESSOR: bool = true;
}

/// ARMv7E-M (Cortex-M4/M7).
#[derive(Debug, Clone, Copy)]
pub struct ArmV7EM;

impl ArchVariant for ArmV7EM {
    const NAME: &'static str = "armv7e-m";
    const NVIC_PRIO_BITS: u8 = 3;
    const CONFIGURABLE_FAULTS: bool = true;
    const HAS_COPROCESSOR: bool = true;
}

cfg_if::cfg_if! {
    if #[cfg(feature = "armv6m")] {
        pub type Variant = ArmV6M;
    } else if #[cfg(feature = "armv7em")] {
        pub type Variant = ArmV7EM;
    } else {
        pub type Variant = ArmV7M;
    }
}

pub const NVIC_PRIO_BITS: u8 = <Variant as ArchVariant>::NVIC_PRIO_BITS;

/// Logical priority of MemManage and BusFault (most urgent configurable).
pub const FAULT_PRIORITY: u8 = 0;

/// Logical priority of SVCall.
pub const SVCALL_PRIORITY: u8 = 1;

/// Logical priority of PendSV, used only for scheduling.
pub const PENDSV_PRIORITY: u8 = <Variant as ArchVariant>::LOWEST_PRIORITY;

/// Shift from a logical priority to the 8-bit register field.
pub const PRIO_SHIFT: u8 = 8 - NVIC_PRIO_BITS;
