//! Next free numeric suffix for a prefix.

use serde::Serialize;

use super::clock::Clock;
use super::registry::Registry;

/// Candidate checks before giving up on sequential suffixes.
pub const MAX_ATTEMPTS: u32 = 100;
/// Minimum zero-padded width; larger numbers widen naturally.
pub const MIN_WIDTH: usize = 3;
/// Digits of epoch milliseconds used by the fallback suffix.
pub const FALLBACK_DIGITS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixSource {
    Sequential,
    /// Sequential candidates ran out; the code is not checked against the registry.
    TimestampFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedSuffix {
    pub code: String,
    pub source: SuffixSource,
    pub attempts: u32,
}

pub fn format_code(prefix: &str, n: u64) -> String {
    format!("{prefix}{n:0width$}", width = MIN_WIDTH)
}

/// Numeric remainder of `code` once `prefix` is stripped, if it is all digits.
pub fn parse_suffix(prefix: &str, code: &str) -> Option<u64> {
    let rest = code.strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// Proposes one past the highest numeric suffix issued under `prefix` (or 1),
/// then walks forward until a code absent from the whole registry is found.
pub fn allocate_suffix(prefix: &str, registry: &Registry<'_>, clock: &dyn Clock) -> AllocatedSuffix {
    let last = registry.with_prefix(prefix).filter_map(|code| parse_suffix(prefix, code)).max();
    let start = match last {
        Some(last) => last.checked_add(1),
        None => Some(1),
    };
    probe(prefix, start, |code| registry.contains(code), clock)
}

pub(crate) fn probe<F>(prefix: &str, start: Option<u64>, is_taken: F, clock: &dyn Clock) -> AllocatedSuffix
where
    F: Fn(&str) -> bool,
{
    let mut next = start;
    let mut attempts = 0;
    while let Some(n) = next {
        if attempts == MAX_ATTEMPTS {
            break;
        }
        attempts += 1;
        let code = format_code(prefix, n);
        if !is_taken(&code) {
            return AllocatedSuffix { code, source: SuffixSource::Sequential, attempts };
        }
        next = n.checked_add(1);
    }

    let modulus = 10_i64.pow(FALLBACK_DIGITS);
    let stamp = clock.now_millis().rem_euclid(modulus);
    AllocatedSuffix {
        code: format!("{prefix}{stamp:0width$}", width = FALLBACK_DIGITS as usize),
        source: SuffixSource::TimestampFallback,
        attempts,
    }
}
