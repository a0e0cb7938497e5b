//! Scheme plan and per-attempt decisions.

use crate::config::SchemeOrder;
use crate::error::ErrorKind;
use crate::target::{NormalizedUrl, Scheme};

/// A target is tried under at most this many schemes.
pub const MAX_ATTEMPTS: usize = 2;

/// Schemes to try, in order. An explicit (or port-forced) scheme is tried alone.
pub fn scheme_plan(target: &NormalizedUrl, order: SchemeOrder) -> Vec<Scheme> {
    match target.scheme() {
        Some(scheme) => vec![scheme],
        None => {
            let first = match order {
                SchemeOrder::HttpsFirst => Scheme::Https,
                SchemeOrder::HttpFirst => Scheme::Http,
            };
            vec![first, first.alternate()]
        }
    }
}

/// What to do after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDecision {
    /// Use this attempt's outcome.
    Accept,
    /// Try the next scheme in the plan.
    TryAlternate,
    /// Stop; no other scheme can help.
    Terminal,
}

/// DNS and timeout failures end the target. Anything else gets one retry
/// under the alternate scheme when the plan has one.
pub fn decide_error(kind: ErrorKind, alternate: Option<Scheme>) -> AttemptDecision {
    match kind {
        ErrorKind::Dns | ErrorKind::Timeout => AttemptDecision::Terminal,
        _ if alternate.is_some() => AttemptDecision::TryAlternate,
        _ => AttemptDecision::Terminal,
    }
}

/// A success that redirected onto the alternate scheme (http → https, say)
/// is worth one more attempt under that scheme directly.
pub fn decide_success(
    landing_url: &str,
    alternate: Option<Scheme>,
    follow_redirects: bool,
) -> AttemptDecision {
    match alternate {
        Some(alt) if follow_redirects && Scheme::of_url(landing_url) == Some(alt) => {
            AttemptDecision::TryAlternate
        }
        _ => AttemptDecision::Accept,
    }
}
