//! Testing infrastructure for sessionpulse integration tests.
//!
//! This crate provides utilities for writing deterministic tests:
//! - `ManualClock`: a clock that only moves when the test moves it
//! - `TestWorld`: a collector wired to a manual clock, with fluent helpers
//! - `fixtures`: tool-execution builders and canned agent runs
//! - `assertions`: KPI-level assertions with readable failure messages

pub mod assertions;
pub mod clock;
pub mod fixtures;
pub mod world;

pub use clock::ManualClock;
pub use fixtures::{tool_call, ExecutionBuilder};
pub use world::TestWorld;
