use std::cmp::Ordering;
use tracing::debug;

const MAX_COMPONENTS: usize = 4;

/// Parse a dot-separated numeric version with 2 to 4 components.
///
/// Anything else (a bare `1`, a pre-release suffix, a stray sign) is not an
/// error, it just routes the comparison to the ordinal fallback.
fn parse_components(version: &str) -> Option<[u64; MAX_COMPONENTS]> {
    let version = version.trim();
    if version.is_empty() {
        return None;
    }
    let mut components = [0u64; MAX_COMPONENTS];
    let mut count = 0;
    for piece in version.split('.') {
        if count == MAX_COMPONENTS {
            return None;
        }
        components[count] = piece.parse::<u64>().ok()?;
        count += 1;
    }
    if count < 2 {
        return None;
    }
    Some(components)
}

/// Compare two version strings.
///
/// When both sides parse as dot-numeric versions, missing components are
/// zero-padded and the first differing component decides. When either side is
/// malformed, both fall back to byte-wise case-insensitive ordinal comparison.
/// The fallback is a defined degraded policy that callers rely on for legacy
/// version strings, never a failure.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse_components(a), parse_components(b)) {
        (Some(left), Some(right)) => left.cmp(&right),
        _ => {
            debug!(a, b, "version not dot-numeric, using ordinal comparison");
            ordinal_ignore_case(a, b)
        }
    }
}

fn ordinal_ignore_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

/// Whether a dependency pin should move from `current` to `desired`.
///
/// No current pin means install; no desired version means never clear an
/// existing pin; otherwise upgrade only when `desired` orders strictly higher.
pub fn should_update(current: Option<&str>, desired: &str) -> bool {
    let current = match current {
        Some(v) if !v.is_empty() => v,
        _ => return true,
    };
    if desired.is_empty() {
        return false;
    }
    compare(desired, current) == Ordering::Greater
}
