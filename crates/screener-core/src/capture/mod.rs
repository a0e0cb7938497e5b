//! Capture orchestration: which scheme to try, when a target is done, and
//! what its outcome is.
//!
//! Flow per target: admit into scope → normalize → exclusion check → scheme
//! plan → at most two browser attempts → redirect/status filters.

mod classify;
mod orchestrator;
mod plan;
mod result;
mod visited;

pub use classify::{classify, classify_message};
pub use orchestrator::{Orchestrator, DEFAULT_GRACE};
pub use plan::{decide_error, decide_success, scheme_plan, AttemptDecision, MAX_ATTEMPTS};
pub use result::{CaptureResult, Outcome, SkipReason};
pub use visited::VisitedSet;

pub use crate::error::{CaptureError, ErrorKind};
