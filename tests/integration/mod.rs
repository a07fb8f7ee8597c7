// tests/integration/mod.rs
// Host-side integration tests for the SPM architecture core
// ============================================================================
// Copyright (c) 2025 Cartesian School - Siergej Sobolewski
// SPDX-License-Identifier: BSD-3-Clause

mod boundary_integration;
mod cross_call_integration;
mod logging_integration;
mod priority_integration;
mod switch_integration;
