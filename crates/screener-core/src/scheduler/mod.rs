//! Bounded-concurrency fan-out over a target list.
//!
//! Keeps up to `concurrency` pipelines in flight; when one finishes the next
//! target is started until the list is exhausted. Every target yields exactly
//! one result.

mod parallel;

pub use parallel::{run_all, run_streaming, Dispatch};
