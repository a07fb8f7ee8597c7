//! Project: GuardBSD Winter Saga version 1.0.0
//! Package: spm_log
//! Copyright © 2025 Cartesian School. Developed by Siergej Sobolewski.
//! License: BSD-3-Clause
//!
//! Zaplecze bajtowe: pierścień w pamięci i opcjonalny zewnętrzny sink.

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;

use crate::ring::Ring;

/// Capacity of the in-memory byte ring.
pub const MEM_RING_SIZE: usize = 1024;

/// Byte sink such as a polled UART or a trace port. Must not block.
pub type SinkFn = fn(&[u8]);

static MEM_ENABLED: AtomicBool = AtomicBool::new(true);
static MEM_RING: Mutex<RefCell<Ring<u8, MEM_RING_SIZE>>> = Mutex::new(RefCell::new(Ring::new(0)));
static SINK: Mutex<Cell<Option<SinkFn>>> = Mutex::new(Cell::new(None));

pub fn enable_mem_ring(enable: bool) {
    MEM_ENABLED.store(enable, Ordering::Relaxed);
}

pub fn set_sink(sink: Option<SinkFn>) {
    critical_section::with(|cs| SINK.borrow(cs).set(sink));
}

/// Append to the memory ring and forward to the sink.
pub fn write_bytes(data: &[u8]) {
    if data.is_empty() {
        return;
    }
    let sink = critical_section::with(|cs| {
        if MEM_ENABLED.load(Ordering::Relaxed) {
            if let Ok(mut ring) = MEM_RING.borrow(cs).try_borrow_mut() {
                ring.extend_from_slice(data);
            }
        }
        SINK.borrow(cs).get()
    });
    // A polled UART is slow; call it with interrupts enabled.
    if let Some(sink) = sink {
        sink(data);
    }
}

/// Copy the memory ring, oldest byte first, for post-mortem dumps.
#[must_use]
pub fn copy_mem(out: &mut [u8]) -> usize {
    critical_section::with(|cs| {
        MEM_RING
            .borrow(cs)
            .try_borrow()
            .map_or(0, |ring| ring.peek_into(out))
    })
}
