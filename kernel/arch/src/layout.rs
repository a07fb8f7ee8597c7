// kernel/arch/src/layout.rs
// Saved-context stack layout shared by SVCall, PendSV and the simulator
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause
//
// Keep this in sync with the vector routines in hw.rs; they take these values
// as `const` operands.
//
// Callee frame, lowest address first (40 bytes):
//
//   +0   reserved (additional state context)
//   +4   reserved (integrity signature)
//   +8   r4 r5 r6 r7
//   +24  r8 r9 r10 r11
//
// FLIH frame adds the seal below and the caller PSP slot above (56 bytes):
//
//   +0   STACK_SEAL_PATTERN  STACK_SEAL_PATTERN
//   +8   callee frame
//   +48  caller PSP, pad

pub const WORD: u32 = 4;

pub const RESERVED_WORDS: u32 = 2;
pub const CALLEE_SAVED_WORDS: u32 = 8;
pub const CALLEE_FRAME_WORDS: u32 = RESERVED_WORDS + CALLEE_SAVED_WORDS;
pub const CALLEE_FRAME_SIZE: u32 = CALLEE_FRAME_WORDS * WORD;

/// Offset of r4 inside the callee frame.
pub const R4_OFFSET: u32 = RESERVED_WORDS * WORD;
/// Offset of r8 inside the callee frame.
pub const R8_OFFSET: u32 = R4_OFFSET + 4 * WORD;

pub const SEAL_WORDS: u32 = 2;
pub const PSP_SLOT_WORDS: u32 = 2;
pub const FLIH_FRAME_SIZE: u32 = (SEAL_WORDS + CALLEE_FRAME_WORDS + PSP_SLOT_WORDS) * WORD;

/// Written atop a FLIH frame; checked by whoever unwinds it.
pub const STACK_SEAL_PATTERN: u32 = 0xFEF5_EDA5;

/// r0-r3, r12, lr, pc, xPSR stacked by the core on exception entry.
pub const HW_FRAME_WORDS: u32 = 8;
pub const HW_FRAME_SIZE: u32 = HW_FRAME_WORDS * WORD;

/// xPSR with only the Thumb bit set.
pub const XPSR_THUMB: u32 = 1 << 24;

const _: () = assert!(CALLEE_FRAME_SIZE == 40);
const _: () = assert!(FLIH_FRAME_SIZE == 56);
const _: () = assert!(FLIH_FRAME_SIZE % 8 == 0);
