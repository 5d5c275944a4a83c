//! Stable identities for items and sections.
//!
//! Identities are assigned once at creation from a process-wide counter and
//! never reused. They are the only thing that survives an index change, so
//! every lookup that must bridge the before/after snapshots goes through them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

fn next_identity() -> u64 {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}

/// Identity of an item (header, cell or footer).
///
/// Cheap to copy and compare. Never derived from a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Allocate a fresh, process-unique identity.
    pub fn next() -> Self {
        Self(next_identity())
    }

    /// Raw value, for diagnostics and serialization.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Identity of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SectionId(u64);

impl SectionId {
    /// Allocate a fresh, process-unique identity.
    pub fn next() -> Self {
        Self(next_identity())
    }

    /// Raw value, for diagnostics and serialization.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "section#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn item_ids_are_unique() {
        let ids: HashSet<ItemId> = (0..1000).map(|_| ItemId::next()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn item_and_section_ids_never_share_a_value() {
        let item = ItemId::next();
        let section = SectionId::next();
        assert_ne!(item.get(), section.get());
    }

    #[test]
    fn ids_are_monotonic_within_a_thread() {
        let a = ItemId::next();
        let b = ItemId::next();
        assert!(b > a);
    }

    #[test]
    fn display_includes_kind_prefix() {
        let id = SectionId::next();
        assert!(id.to_string().starts_with("section#"));
    }
}
