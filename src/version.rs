//! Dotted numeric version comparison
//!
//! Versions are split on `.`, the shorter side is padded with zeros and the
//! components are compared left to right. A component that is not a plain
//! unsigned integer makes the whole comparison undecidable; the public
//! [`compare`] then fails closed and reports equality, so callers never act
//! on a version they could not read.

use std::cmp::Ordering;

use crate::ItemState;

/// How a source's versions have to be compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Plain dotted numeric versions
    Strict,
    /// Strip one leading `v` from both sides first
    Loose,
}

impl Comparison {
    pub fn try_compare(self, a: &str, b: &str) -> Option<Ordering> {
        match self {
            Comparison::Strict => try_compare(a, b),
            Comparison::Loose => try_compare(strip_v(a), strip_v(b)),
        }
    }
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

fn components(version: &str) -> Option<Vec<u64>> {
    version
        .split('.')
        .map(|part| {
            // u64 parsing alone would accept "+1"
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse::<u64>().ok()
        })
        .collect()
}

/// Compare two versions, `None` if either side is not dotted numeric.
pub fn try_compare(a: &str, b: &str) -> Option<Ordering> {
    let mut left = components(a)?;
    let mut right = components(b)?;

    let len = left.len().max(right.len());
    left.resize(len, 0);
    right.resize(len, 0);

    Some(left.cmp(&right))
}

/// Compare two versions: `-1`, `0` or `1`.
///
/// Reports `0` when either version cannot be read.
pub fn compare(a: &str, b: &str) -> i32 {
    ordering_to_int(try_compare(a, b).unwrap_or(Ordering::Equal))
}

/// Like [`compare`], but a single leading `v` is ignored on both sides.
pub fn loose_compare(a: &str, b: &str) -> i32 {
    ordering_to_int(
        Comparison::Loose
            .try_compare(a, b)
            .unwrap_or(Ordering::Equal),
    )
}

fn ordering_to_int(ordering: Ordering) -> i32 {
    match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// Derive the item state from an installed and a latest version.
pub fn classify(
    installed: Option<&str>,
    latest: &str,
    deprecated: bool,
    comparison: Comparison,
) -> ItemState {
    if deprecated {
        return ItemState::Deprecated;
    }

    let Some(installed) = installed else {
        return ItemState::Unknown;
    };

    match comparison.try_compare(installed, latest) {
        Some(Ordering::Less) => ItemState::Outdated,
        Some(_) => ItemState::Current,
        None => ItemState::Unknown,
    }
}
