// Path: crates/conduit-types/src/matching.rs
//! The single wildcard-match predicate used everywhere a scope, audience,
//! subscribe filter, or registry capability is compared against a candidate
//! string (spec §4.A, §9 Design Notes: "centralize in one predicate used
//! uniformly across capability, audience, subscribe-filter, and
//! registry-capability matching. Any change must be applied in one place.")
//!
//! The rule is intentionally a bare prefix test on the string, not a
//! per-segment glob. §4.A phrases it as "`c` ends with `*`", but §4.E's
//! worked example (`"inventory:*:low_stock"` behaving as prefix
//! `"inventory:"`, matching `"inventory:foo:other"` too) only holds if the
//! predicate truncates at the *first* `*` wherever it appears, not only a
//! trailing one. We implement the general form here, which subsumes the
//! common trailing-`*` case: find the first `*` in `pattern`, and match
//! `candidate` against everything before it as a plain prefix. Anything
//! after the `*` (including further literal text) is never consulted.
//! Changing this to segmented matching requires updating every call site
//! (capability checks, audience checks, registry lookups, EventBus
//! publish/subscribe) in lockstep.

/// Returns true iff `pattern` matches `candidate` under Conduit's wildcard
/// rule: either the two strings are identical, or `pattern` contains `*` and
/// `candidate` starts with everything in `pattern` up to (not including)
/// the first `*`.
pub fn wildcard_match(pattern: &str, candidate: &str) -> bool {
    match pattern.find('*') {
        Some(idx) => candidate.starts_with(&pattern[..idx]),
        None => pattern == candidate,
    }
}

/// Returns true iff any entry in `held` matches `required` under
/// [`wildcard_match`], with `held` entries as the pattern and `required` as
/// the candidate. Used for both capability checks (`has_capability`) and
/// audience checks (`has_audience`) since both share the same rule (spec
/// §4.A).
pub fn any_matches<'a>(held: impl IntoIterator<Item = &'a str>, required: &str) -> bool {
    held.into_iter().any(|pattern| wildcard_match(pattern, required))
}
