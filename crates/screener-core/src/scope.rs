//! Run scope: which targets were requested and which are excluded.

use std::sync::Mutex;

use crate::target::{self, NormalizedUrl};

/// One exclusion rule, parsed from user text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeRule {
    /// `*.example.com` or `.example.com`: the apex and every subdomain.
    HostSuffix(String),
    /// Exact host match (port ignored).
    Host(String),
    /// Exact match on a normalized URL.
    Url(NormalizedUrl),
}

impl ScopeRule {
    /// Parses a rule. Returns `None` for blank input or a URL rule that does
    /// not normalize.
    pub fn parse(raw: &str) -> Option<Self> {
        let rule = raw.trim();
        if rule.is_empty() {
            return None;
        }
        if let Some(suffix) = rule.strip_prefix("*.").or_else(|| rule.strip_prefix('.')) {
            if suffix.is_empty() {
                return None;
            }
            return Some(ScopeRule::HostSuffix(suffix.to_ascii_lowercase()));
        }
        if rule.contains('/') || rule.contains("://") {
            return target::normalize(rule).ok().map(ScopeRule::Url);
        }
        let host = target::host_without_port(rule).to_ascii_lowercase();
        Some(ScopeRule::Host(host))
    }

    pub fn matches(&self, candidate: &NormalizedUrl) -> bool {
        match self {
            ScopeRule::HostSuffix(suffix) => {
                let host = candidate.host_name();
                host == suffix
                    || host
                        .strip_suffix(suffix.as_str())
                        .is_some_and(|head| head.ends_with('.'))
            }
            ScopeRule::Host(host) => candidate.host_name() == host,
            ScopeRule::Url(url) => {
                if candidate.scheme().is_none() || url.scheme().is_none() {
                    candidate.without_scheme() == url.without_scheme()
                } else {
                    candidate == url
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct ScopeState {
    requested: Vec<String>,
    rules: Vec<ScopeRule>,
}

/// Requested targets plus exclusion rules, shared across workers.
#[derive(Debug, Default)]
pub struct Scope {
    inner: Mutex<ScopeState>,
}

impl Scope {
    pub fn new(rules: Vec<ScopeRule>) -> Self {
        Self {
            inner: Mutex::new(ScopeState {
                requested: Vec::new(),
                rules,
            }),
        }
    }

    /// Builds a scope from raw rule strings, dropping the ones that do not parse.
    pub fn from_rules<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for r in raw {
            match ScopeRule::parse(r.as_ref()) {
                Some(rule) => rules.push(rule),
                None => tracing::warn!(rule = r.as_ref(), "ignoring unparseable exclusion rule"),
            }
        }
        Self::new(rules)
    }

    /// Records `raw` as requested.
    pub fn admit(&self, raw: &str) {
        self.lock().requested.push(raw.to_string());
    }

    /// Snapshot of everything admitted so far, in admission order.
    pub fn requested(&self) -> Vec<String> {
        self.lock().requested.clone()
    }

    pub fn add_exclusion(&self, rule: ScopeRule) {
        self.lock().rules.push(rule);
    }

    pub fn is_excluded(&self, candidate: &NormalizedUrl) -> bool {
        self.lock().rules.iter().any(|rule| rule.matches(candidate))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScopeState> {
        // A poisoned lock only means another worker panicked mid-push; the
        // vectors are still consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
