//! Project: GuardBSD Winter Saga version 1.0.0
//! Package: spm_log
//! Copyright © 2025 Cartesian School. Developed by Siergej Sobolewski.
//! License: BSD-3-Clause
//!
//! Rekord dziennika i tekst o stałym rozmiarze.

use core::fmt;

/// Longest stored message; longer text is truncated.
pub const LOG_MSG_MAX: usize = 96;
/// Longest subsystem tag printed on the early path.
pub const LOG_SUBSYS_MAX: usize = 16;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Secure partition the record was logged on behalf of; 0 is the SPM.
pub type PartitionId = u32;

/// One stored log entry.
///
/// `exception` is the active exception number (IPSR) at the time of logging,
/// 0 in Thread mode.
#[derive(Copy, Clone)]
pub struct LogRecord {
    pub ts: u32,
    pub level: LogLevel,
    pub subsystem: &'static str,
    pub exception: u16,
    pub partition: PartitionId,
    text: TextBuf<LOG_MSG_MAX>,
}

impl LogRecord {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            ts: 0,
            level: LogLevel::Info,
            subsystem: "",
            exception: 0,
            partition: 0,
            text: TextBuf::new(),
        }
    }

    pub(crate) fn with_text(mut self, text: &TextBuf<LOG_MSG_MAX>) -> Self {
        self.text = *text;
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        self.text.as_str()
    }

    #[must_use]
    pub fn in_handler(&self) -> bool {
        self.exception != 0
    }
}

/// Stack-only text buffer; writes past capacity are silently dropped.
#[derive(Copy, Clone)]
pub struct TextBuf<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> TextBuf<N> {
    pub const fn new() -> Self {
        Self {
            bytes: [0; N],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Valid UTF-8 prefix; truncation may have split the last character.
    pub fn as_str(&self) -> &str {
        let bytes = &self.bytes[..self.len];
        match core::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
        }
    }
}

impl<const N: usize> Default for TextBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Write for TextBuf<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let take = s.len().min(N - self.len);
        self.bytes[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

/// Prefix used on the early-print path: `[LEVEL][subsys] ` in Thread mode,
/// `[LEVEL][subsys/exc] ` inside a handler.
pub(crate) fn write_prefix<W: fmt::Write>(
    w: &mut W,
    level: LogLevel,
    subsystem: &str,
    exception: u16,
) -> fmt::Result {
    let tag = subsystem
        .get(..subsystem.len().min(LOG_SUBSYS_MAX))
        .unwrap_or(subsystem);
    if exception == 0 {
        write!(w, "[{}][{}] ", level.as_str(), tag)
    } else {
        write!(w, "[{}][{}/{}] ", level.as_str(), tag, exception)
    }
}
