//! Category-scoped product codes.
//!
//! A code is a short alphabetic prefix chosen per category followed by a
//! zero-padded number, e.g. `AC007`. Allocation is a pure function of the
//! category name, the codes already issued and the known-prefix table; the
//! clock is only read when sequential suffixes run out.
//!
//! Allocation never fails. Two degraded outcomes exist, both logged and
//! counted in [`AllocationStats`]:
//! - no free two-letter prefix, so the category gets `XY` + `X` and may share it;
//! - no free sequential suffix, so the code ends in epoch-millisecond digits
//!   that are not checked against the registry.
//!
//! Nothing here serialises concurrent writers. Callers must write codes under
//! a uniqueness constraint and allocate again on conflict.

pub mod clock;
pub mod prefix;
pub mod registry;
pub mod stats;
pub mod suffix;

use std::collections::HashMap;
use std::sync::Arc;

pub use clock::{Clock, FixedClock, SystemClock};
pub use prefix::{resolve_prefix, KnownPrefixes, KnownPrefixesError, PrefixSource, ResolvedPrefix};
pub use registry::Registry;
pub use stats::{AllocationStats, AllocationStatsSnapshot};
pub use suffix::SuffixSource;

use crate::domain::value_objects::CodePrefix;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub code: String,
    pub prefix: CodePrefix,
    pub prefix_source: PrefixSource,
    pub suffix_source: SuffixSource,
    /// Sequential candidates checked before settling.
    pub attempts: u32,
}

impl Allocation {
    pub fn is_degraded(&self) -> bool {
        self.prefix_source == PrefixSource::Exhausted || self.suffix_source == SuffixSource::TimestampFallback
    }
}

#[derive(Clone)]
pub struct CodeAllocator {
    known: KnownPrefixes,
    clock: Arc<dyn Clock>,
    stats: Arc<AllocationStats>,
}

impl std::fmt::Debug for CodeAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeAllocator").field("known", &self.known).field("stats", &self.stats).finish()
    }
}

impl Default for CodeAllocator {
    fn default() -> Self {
        Self::new(KnownPrefixes::defaults())
    }
}

impl CodeAllocator {
    pub fn new(known: KnownPrefixes) -> Self {
        Self { known, clock: Arc::new(SystemClock), stats: Arc::new(AllocationStats::new()) }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn known(&self) -> &KnownPrefixes {
        &self.known
    }

    pub fn stats(&self) -> &Arc<AllocationStats> {
        &self.stats
    }

    pub fn allocate<S: AsRef<str>>(&self, group: &str, codes: &[S]) -> Allocation {
        self.allocate_with(group, codes, &self.known)
    }

    /// Allocates against `known` instead of the configured table and counts
    /// the result as issued.
    pub fn allocate_with<S: AsRef<str>>(&self, group: &str, codes: &[S], known: &KnownPrefixes) -> Allocation {
        let allocation = self.propose(group, codes, known);
        self.record(group, &allocation);
        allocation
    }

    /// Works out the next code without touching [`AllocationStats`]. Callers
    /// that go on to store the code report it with [`CodeAllocator::record`].
    pub fn propose<S: AsRef<str>>(&self, group: &str, codes: &[S], known: &KnownPrefixes) -> Allocation {
        let registry = Registry::new(codes);
        let resolved = resolve_prefix(group, &registry, known);
        let suffix = suffix::allocate_suffix(resolved.prefix.as_str(), &registry, self.clock.as_ref());
        tracing::debug!(category = group, code = %suffix.code, registry = registry.len(), "proposed product code");

        Allocation {
            code: suffix.code,
            prefix: resolved.prefix,
            prefix_source: resolved.source,
            suffix_source: suffix.source,
            attempts: suffix.attempts,
        }
    }

    /// Counts an issued code, logging either fallback.
    pub fn record(&self, group: &str, allocation: &Allocation) {
        self.stats.record_allocation();
        if allocation.prefix_source == PrefixSource::Exhausted {
            self.stats.record_prefix_exhausted();
            tracing::warn!(category = group, prefix = %allocation.prefix, "no free two-letter prefix; prefix may be shared");
        }
        if allocation.suffix_source == SuffixSource::TimestampFallback {
            self.stats.record_timestamp_fallback();
            tracing::warn!(
                category = group,
                prefix = %allocation.prefix,
                code = %allocation.code,
                attempts = allocation.attempts,
                "sequential suffixes exhausted; using unverified timestamp suffix"
            );
        }
    }

    /// Resolves only the prefix, e.g. when a category is registered before
    /// any of its products. Nothing is counted; see [`CodeAllocator::record_prefix`].
    pub fn resolve_prefix<S: AsRef<str>>(&self, group: &str, codes: &[S], known: &KnownPrefixes) -> ResolvedPrefix {
        resolve_prefix(group, &Registry::new(codes), known)
    }

    /// Counts a stored prefix that had to fall back to a possibly shared one.
    pub fn record_prefix(&self, group: &str, resolved: &ResolvedPrefix) {
        if resolved.source == PrefixSource::Exhausted {
            self.stats.record_prefix_exhausted();
            tracing::warn!(category = group, prefix = %resolved.prefix, "no free two-letter prefix; prefix may be shared");
        }
    }
}

/// One-shot allocation against a plain category -> prefix table.
pub fn allocate<S: AsRef<str>>(group_key: &str, registry: &[S], known_group_prefixes: &HashMap<String, String>) -> String {
    CodeAllocator::new(KnownPrefixes::from(known_group_prefixes)).allocate(group_key, registry).code
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn table() -> HashMap<String, String> {
        [("Accesorios", "AC"), ("Mods Digitales", "MD")]
            .into_iter()
            .map(|(g, p)| (g.to_string(), p.to_string()))
            .collect()
    }

    #[test]
    fn fresh_category_on_empty_registry() {
        assert_eq!(allocate("Accesorios", &[] as &[&str], &table()), "AC001");
    }

    #[test]
    fn skips_pre_seeded_code() {
        assert_eq!(allocate("Accesorios", &["AC001", "AC002", "AC003"], &table()), "AC004");
        assert_eq!(allocate("Accesorios", &["AC001", "AC002", "AC003", "AC004"], &table()), "AC005");
    }

    #[test]
    fn monotonic_growth() {
        let mut codes: Vec<String> = Vec::new();
        for k in 1..=120u64 {
            let code = allocate("Accesorios", &codes, &table());
            assert_eq!(code, format!("AC{k:03}"));
            codes.push(code);
        }
    }

    #[test]
    fn unknown_categories_never_share_a_prefix() {
        let allocator = CodeAllocator::default();
        let mut codes: Vec<String> = Vec::new();
        let mut prefixes = HashMap::new();
        for group in ["Mods Digitales", "Monitores", "Mochilas", "Mousepads", "Mods Digitales"] {
            let a = allocator.allocate(group, &codes);
            if let Some(previous) = prefixes.insert(group, a.prefix.clone()) {
                assert_eq!(previous, a.prefix, "{group} changed prefix");
            }
            codes.push(a.code);
        }
        assert_eq!(prefixes["Mods Digitales"].as_str(), "MD");
        assert_eq!(prefixes["Monitores"].as_str(), "MO");
        let distinct: HashSet<_> = prefixes.values().collect();
        assert_eq!(distinct.len(), 4);
    }

    #[test]
    fn derived_prefix_drifts_unless_persisted() {
        let allocator = CodeAllocator::new(KnownPrefixes::new());
        let first = allocator.allocate("Monitores", &[] as &[&str]);
        assert_eq!(first.code, "MO001");

        // The category's own codes now occupy MO, so re-deriving moves it.
        let codes = [first.code.clone()];
        assert_eq!(allocator.allocate("Monitores", &codes).code, "MN001");

        let persisted = allocator.known().merged([("Monitores".to_string(), first.prefix)]);
        assert_eq!(allocator.allocate_with("Monitores", &codes, &persisted).code, "MO002");
    }

    #[test]
    fn fallbacks_are_counted() {
        let known = KnownPrefixes::parse("Velas=VE").unwrap();
        let allocator = CodeAllocator::new(known).with_clock(FixedClock(9_000_777));
        let codes = [format!("VE{}", u64::MAX)];
        let a = allocator.allocate("Velas", &codes);
        assert_eq!(a.code, "VE000777");
        assert!(a.is_degraded());
        let stats = allocator.stats().snapshot();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.timestamp_fallbacks, 1);
        assert_eq!(stats.prefix_exhausted, 0);
    }

    #[test]
    fn propose_leaves_counters_alone() {
        let known = KnownPrefixes::parse("Velas=VE").unwrap();
        let allocator = CodeAllocator::new(known.clone()).with_clock(FixedClock(42));
        let codes = [format!("VE{}", u64::MAX)];
        let a = allocator.propose("Velas", &codes, &known);
        assert_eq!(a.code, "VE000042");
        assert_eq!(allocator.stats().snapshot(), AllocationStatsSnapshot::default());

        allocator.record("Velas", &a);
        let stats = allocator.stats().snapshot();
        assert_eq!((stats.allocations, stats.timestamp_fallbacks), (1, 1));
    }

    #[test]
    fn exhausted_prefix_is_counted_when_recorded() {
        let allocator = CodeAllocator::new(KnownPrefixes::new());
        let resolved = ResolvedPrefix { prefix: CodePrefix::new("VEX").unwrap(), source: PrefixSource::Exhausted };
        allocator.record_prefix("Velas", &resolved);
        allocator.record_prefix("Tazas", &ResolvedPrefix { prefix: CodePrefix::new("TA").unwrap(), source: PrefixSource::Derived });
        assert_eq!(allocator.stats().snapshot().prefix_exhausted, 1);
    }

    #[test]
    fn allocate_with_uses_given_table() {
        let allocator = CodeAllocator::default();
        let mut known = KnownPrefixes::new();
        known.insert("Velas", CodePrefix::new("VL").unwrap());
        let a = allocator.allocate_with("Velas", &["VE001"], &known);
        assert_eq!(a.code, "VL001");
        assert_eq!(a.prefix_source, PrefixSource::Known);
    }

    fn registry_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(prop::string::string_regex("[A-Z]{2}[0-9]{3}").expect("valid regex"), 0..200)
    }

    proptest! {
        #[test]
        fn never_returns_an_issued_code(group in "[A-Za-z ]{1,12}", codes in registry_strategy()) {
            let code = allocate(&group, &codes, &table());
            prop_assert!(!codes.contains(&code));
        }

        #[test]
        fn known_categories_keep_their_prefix(codes in registry_strategy()) {
            let code = allocate("Mods Digitales", &codes, &table());
            prop_assert!(code.starts_with("MD"));
            prop_assert!(code[2..].bytes().all(|b| b.is_ascii_digit()));
        }
    }
}
