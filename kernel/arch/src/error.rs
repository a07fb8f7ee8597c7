//! Project: GuardBSD Winter Saga version 1.0.0
//! Package: spm_arch
//! Copyright © 2025 Cartesian School. Developed by Siergej Sobolewski.
//! License: BSD-3-Clause
//!
//! Błędy konfiguracji rdzenia architektury.

/// Configuration-time errors. Mechanical violations on the vector paths are
/// never reported here; they end in a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Ok = 0,
    /// fault < svcall < pendsv does not hold.
    PriorityOrder,
    /// Priority does not fit the implemented priority bits.
    PriorityRange,
    /// Stack address is not 8-byte aligned.
    StackAlignment,
    /// Stack address is zero.
    NullStack,
    /// Stack region cannot hold the initial frame.
    StackTooSmall,
}

impl Error {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::Ok => "ok",
            Error::PriorityOrder => "exception priorities out of order",
            Error::PriorityRange => "priority exceeds implemented bits",
            Error::StackAlignment => "stack not 8-byte aligned",
            Error::NullStack => "null stack",
            Error::StackTooSmall => "stack too small for initial frame",
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Error::Ok)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = core::result::Result<T, Error>;
