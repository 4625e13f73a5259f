//! Testing utilities for stagestream jobs.
//!
//! This module provides:
//! - Scripted executors and failing stores
//! - Assertions over event sequences
//! - A runner harness backed by the in-memory store

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_no_heartbeat_after_done, assert_single_terminal, assert_success_sequence, drain,
    heartbeat_count, non_heartbeat, non_heartbeat_kinds,
};
pub use fixtures::TestHarness;
pub use mocks::{CallLog, FailingStore, ScriptedExecutor};
