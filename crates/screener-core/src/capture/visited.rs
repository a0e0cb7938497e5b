use std::collections::HashSet;
use std::sync::Mutex;

/// Absolute URLs already dispatched during the run. Only grows.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` visited. False if some earlier caller already claimed it.
    pub fn claim(&self, url: &str) -> bool {
        self.urls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.lock().unwrap_or_else(|e| e.into_inner()).contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_first_come() {
        let v = VisitedSet::new();
        assert!(v.claim("https://example.com/"));
        assert!(!v.claim("https://example.com/"));
        assert!(v.claim("http://example.com/"));
        assert!(v.contains("http://example.com/"));
        assert_eq!(v.len(), 2);
    }
}
