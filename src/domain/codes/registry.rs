//! Borrowed view over the codes already issued.

use std::collections::HashSet;

/// Flat set of issued codes. Group membership is recovered by prefix match
/// on every lookup; nothing is indexed by group.
#[derive(Debug, Clone, Default)]
pub struct Registry<'a> {
    codes: HashSet<&'a str>,
}

impl<'a> Registry<'a> {
    pub fn new<S: AsRef<str>>(codes: &'a [S]) -> Self {
        Self { codes: codes.iter().map(AsRef::as_ref).collect() }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    /// True if any issued code starts with `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.codes.iter().any(|code| code.starts_with(prefix))
    }

    pub fn with_prefix<'s>(&'s self, prefix: &'s str) -> impl Iterator<Item = &'a str> + 's {
        self.codes.iter().copied().filter(move |code| code.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_queries() {
        let codes = vec!["AC001".to_string(), "AC002".to_string(), "MD001".to_string()];
        let registry = Registry::new(&codes);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("MD001"));
        assert!(registry.has_prefix("A"));
        assert!(!registry.has_prefix("MO"));
        let mut ac: Vec<_> = registry.with_prefix("AC").collect();
        ac.sort_unstable();
        assert_eq!(ac, ["AC001", "AC002"]);
    }
}
