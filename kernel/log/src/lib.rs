//! Project: GuardBSD Winter Saga version 1.0.0
//! Package: spm_log
//! Copyright © 2025 Cartesian School. Developed by Siergej Sobolewski.
//! License: BSD-3-Clause
//!
//! Logger rdzenia SPM: pierścień rekordów, awaryjny wydruk i zewnętrzny sink.
//!
//! Records go to a fixed ring read out by the platform (`read_records` /
//! `ack_records`). Before [`init`], and whenever logging re-enters itself
//! (a sink that logs, a fault handler that fires mid-record), text is
//! formatted on the stack and handed to the early-print hook instead.
//!
//! All shared state sits behind `critical_section::Mutex`, which is PRIMASK
//! on Cortex-M. ARMv6-M has no compare-and-swap, so nothing here relies on
//! read-modify-write atomics.

#![cfg_attr(not(test), no_std)]

pub mod backend;
mod record;
mod ring;

use core::cell::{Cell, RefCell};
use core::fmt::{self, Write};
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use critical_section::Mutex;

pub use record::{LogLevel, LogRecord, PartitionId, TextBuf, LOG_MSG_MAX, LOG_SUBSYS_MAX};
use ring::Ring;

/// Records held before the oldest is overwritten.
pub const LOG_RING_SIZE: usize = 64;

/// Platform hooks filling in record context.
#[derive(Copy, Clone)]
pub struct LogHooks {
    pub timestamp: fn() -> u32,
    /// Active exception number (IPSR), 0 in Thread mode.
    pub active_exception: fn() -> u16,
    pub partition_id: fn() -> PartitionId,
    pub early_print: fn(&str),
}

impl LogHooks {
    #[must_use]
    pub const fn default() -> Self {
        Self {
            timestamp: tick_timestamp,
            active_exception: thread_mode,
            partition_id: spm_partition,
            early_print: backend_print,
        }
    }
}

fn thread_mode() -> u16 {
    0
}

fn spm_partition() -> PartitionId {
    0
}

static TICK: AtomicU32 = AtomicU32::new(0);

/// Monotonic counter used until the platform installs a real clock.
pub fn tick_timestamp() -> u32 {
    critical_section::with(|_| {
        let now = TICK.load(Ordering::Relaxed).wrapping_add(1);
        TICK.store(now, Ordering::Relaxed);
        now
    })
}

/// Early-print hook that writes a line to the byte backend.
pub fn backend_print(line: &str) {
    backend::write_bytes(line.as_bytes());
    backend::write_bytes(b"\n");
}

// Set while a record is being built; a second entry takes the early path.
static IN_LOGGER: AtomicBool = AtomicBool::new(false);

static LOGGER: Logger = Logger::new();

struct Logger {
    ring: Mutex<RefCell<Ring<LogRecord, LOG_RING_SIZE>>>,
    hooks: Mutex<Cell<LogHooks>>,
    min_level: Mutex<Cell<LogLevel>>,
    ready: AtomicBool,
}

impl Logger {
    const fn new() -> Self {
        Self {
            ring: Mutex::new(RefCell::new(Ring::new(LogRecord::empty()))),
            hooks: Mutex::new(Cell::new(LogHooks::default())),
            min_level: Mutex::new(Cell::new(LogLevel::Trace)),
            ready: AtomicBool::new(false),
        }
    }

    /// Claim the logger; returns the hooks and level filter, and whether the
    /// claim nested inside another record.
    fn enter(&self) -> (LogHooks, LogLevel, bool) {
        critical_section::with(|cs| {
            let nested = IN_LOGGER.load(Ordering::Relaxed);
            IN_LOGGER.store(true, Ordering::Relaxed);
            (
                self.hooks.borrow(cs).get(),
                self.min_level.borrow(cs).get(),
                nested,
            )
        })
    }

    fn leave(nested: bool) {
        if !nested {
            IN_LOGGER.store(false, Ordering::Release);
        }
    }

    fn record(&self, level: LogLevel, subsystem: &'static str, args: fmt::Arguments) {
        let (hooks, min_level, nested) = self.enter();
        if level >= min_level {
            self.emit(&hooks, level, subsystem, args, nested);
        }
        Self::leave(nested);
    }

    fn emit(
        &self,
        hooks: &LogHooks,
        level: LogLevel,
        subsystem: &'static str,
        args: fmt::Arguments,
        nested: bool,
    ) {
        let exception = (hooks.active_exception)();
        let mut text = TextBuf::<LOG_MSG_MAX>::new();
        let _ = text.write_fmt(args);

        if !nested && self.ready.load(Ordering::Acquire) {
            let mut rec = LogRecord::empty().with_text(&text);
            rec.ts = (hooks.timestamp)();
            rec.level = level;
            rec.subsystem = subsystem;
            rec.exception = exception;
            rec.partition = (hooks.partition_id)();

            let stored = critical_section::with(|cs| {
                self.ring
                    .borrow(cs)
                    .try_borrow_mut()
                    .map(|mut ring| ring.push(rec))
                    .is_ok()
            });
            if stored {
                return;
            }
        }

        let mut line = TextBuf::<{ LOG_MSG_MAX + LOG_SUBSYS_MAX + 24 }>::new();
        let _ = record::write_prefix(&mut line, level, subsystem, exception);
        let _ = line.write_str(text.as_str());
        (hooks.early_print)(line.as_str());
    }
}

/// Install the platform hooks and start storing records.
pub fn init(hooks: LogHooks) {
    set_hooks(hooks);
    LOGGER.ready.store(true, Ordering::Release);
}

pub fn set_hooks(hooks: LogHooks) {
    critical_section::with(|cs| LOGGER.hooks.borrow(cs).set(hooks));
}

/// Drop records below `level`.
pub fn set_min_level(level: LogLevel) {
    critical_section::with(|cs| LOGGER.min_level.borrow(cs).set(level));
}

pub fn log(level: LogLevel, subsystem: &'static str, args: fmt::Arguments) {
    LOGGER.record(level, subsystem, args);
}

/// Copy out the oldest unacknowledged records. Returns 0 if the ring is
/// busy.
pub fn read_records(out: &mut [LogRecord]) -> usize {
    critical_section::with(|cs| {
        LOGGER
            .ring
            .borrow(cs)
            .try_borrow()
            .map_or(0, |ring| ring.peek_into(out))
    })
}

/// Release `count` records returned by [`read_records`].
///
/// # Errors
///
/// `Err(())` if the ring is busy; retry later.
#[allow(clippy::result_unit_err)]
pub fn ack_records(count: usize) -> Result<(), ()> {
    critical_section::with(|cs| {
        LOGGER
            .ring
            .borrow(cs)
            .try_borrow_mut()
            .map(|mut ring| ring.consume(count))
            .map_err(|_| ())
    })
}

/// Records lost because the reader fell behind.
#[must_use]
pub fn dropped_records() -> u32 {
    critical_section::with(|cs| {
        LOGGER
            .ring
            .borrow(cs)
            .try_borrow()
            .map_or(0, |ring| ring.overwritten())
    })
}

#[macro_export]
macro_rules! klog_trace {
    ($subsystem:expr, $($arg:tt)*) => {
        $crate::log($crate::LogLevel::Trace, $subsystem, core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_debug {
    ($subsystem:expr, $($arg:tt)*) => {
        $crate::log($crate::LogLevel::Debug, $subsystem, core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_info {
    ($subsystem:expr, $($arg:tt)*) => {
        $crate::log($crate::LogLevel::Info, $subsystem, core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_warn {
    ($subsystem:expr, $($arg:tt)*) => {
        $crate::log($crate::LogLevel::Warn, $subsystem, core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_error {
    ($subsystem:expr, $($arg:tt)*) => {
        $crate::log($crate::LogLevel::Error, $subsystem, core::format_args!($($arg)*))
    };
}
