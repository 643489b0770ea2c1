//! Cache-defeating tokens for chart references.
//!
//! The backend regenerates the chart image in place, so every reference
//! handed to the renderer gets a `t=<token>` query parameter. Tokens are
//! strictly increasing for the lifetime of a monitor.

#[derive(Debug, Clone)]
pub struct CacheBuster {
    last: u64,
}

impl CacheBuster {
    /// Start issuing tokens after `seed` (the runtime seeds with wall-clock millis).
    pub fn starting_at(seed: u64) -> Self {
        Self { last: seed }
    }

    pub fn next_token(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    /// Append a fresh token unless the reference already carries a `t` parameter.
    pub fn stamp(&mut self, reference: &str) -> String {
        if has_token(reference) {
            reference.to_string()
        } else {
            self.restamp(reference)
        }
    }

    /// Replace any existing token with a fresh one.
    pub fn restamp(&mut self, reference: &str) -> String {
        let base = strip_token(reference);
        let sep = if base.contains('?') { '&' } else { '?' };
        format!("{base}{sep}t={}", self.next_token())
    }
}

pub fn has_token(reference: &str) -> bool {
    match reference.split_once('?') {
        Some((_, query)) => query.split('&').any(|kv| kv == "t" || kv.starts_with("t=")),
        None => false,
    }
}

/// Remove the `t` parameter, keeping every other query parameter in order.
pub fn strip_token(reference: &str) -> String {
    let Some((path, query)) = reference.split_once('?') else {
        return reference.to_string();
    };
    let kept: Vec<&str> = query
        .split('&')
        .filter(|kv| !kv.is_empty() && *kv != "t" && !kv.starts_with("t="))
        .collect();
    if kept.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", kept.join("&"))
    }
}
