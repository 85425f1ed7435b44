//! Deferred group assignment for units that do not exist yet.
//!
//! The host reports a new unit with no link to the order that produced it, so
//! each successful order leaves an entry here keyed by unit kind. When a unit
//! of that kind appears, the highest-priority entry decides its group. Two
//! orders of the same kind at different priorities can therefore swap
//! destinations if they finish out of order; only the counts are guaranteed.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::components::GroupId;
use crate::units::UnitKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    priority: i32,
    seq: u64,
    group: GroupId,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-kind priority queues of future group memberships.
#[derive(Debug, Clone)]
pub struct AssignmentRouter {
    entries: HashMap<UnitKind, BinaryHeap<Entry>>,
    fallback_group: GroupId,
    material_kind: UnitKind,
    next_seq: u64,
}

impl AssignmentRouter {
    /// Create a router. Unclaimed units of `material_kind` go to
    /// `fallback_group`.
    #[must_use]
    pub fn new(fallback_group: GroupId, material_kind: UnitKind) -> Self {
        Self {
            entries: HashMap::new(),
            fallback_group,
            material_kind,
            next_seq: 0,
        }
    }

    /// Record that a unit of `kind` is on its way to `group`.
    pub fn register(&mut self, kind: UnitKind, priority: i32, group: GroupId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.entry(kind).or_default().push(Entry {
            priority,
            seq,
            group,
        });
    }

    /// Consume the best entry for `kind` and return its group.
    ///
    /// Falls back to the intermediate group for production material and to
    /// `None` for anything else.
    pub fn route(&mut self, kind: UnitKind) -> Option<GroupId> {
        if let Some(entry) = self.entries.get_mut(&kind).and_then(BinaryHeap::pop) {
            return Some(entry.group);
        }
        (kind == self.material_kind).then_some(self.fallback_group)
    }

    /// Entries still waiting for a unit of `kind`.
    #[must_use]
    pub fn pending(&self, kind: UnitKind) -> usize {
        self.entries.get(&kind).map_or(0, BinaryHeap::len)
    }

    /// Entries waiting across every kind.
    #[must_use]
    pub fn total_pending(&self) -> usize {
        self.entries.values().map(BinaryHeap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_priority_first() {
        let mut router = AssignmentRouter::new(GroupId(0), UnitKind::Larva);
        router.register(UnitKind::Zergling, 50, GroupId(2));
        router.register(UnitKind::Zergling, 90, GroupId(1));
        assert_eq!(router.route(UnitKind::Zergling), Some(GroupId(1)));
        assert_eq!(router.route(UnitKind::Zergling), Some(GroupId(2)));
        assert_eq!(router.route(UnitKind::Zergling), None);
    }

    #[test]
    fn test_fifo_among_equal_priorities() {
        let mut router = AssignmentRouter::new(GroupId(0), UnitKind::Larva);
        router.register(UnitKind::Roach, 70, GroupId(3));
        router.register(UnitKind::Roach, 70, GroupId(2));
        assert_eq!(router.route(UnitKind::Roach), Some(GroupId(3)));
        assert_eq!(router.route(UnitKind::Roach), Some(GroupId(2)));
    }

    #[test]
    fn test_material_falls_back() {
        let mut router = AssignmentRouter::new(GroupId(0), UnitKind::Larva);
        assert_eq!(router.route(UnitKind::Larva), Some(GroupId(0)));
        assert_eq!(router.route(UnitKind::Drone), None);
    }

    #[test]
    fn test_pending_counts() {
        let mut router = AssignmentRouter::new(GroupId(0), UnitKind::Larva);
        router.register(UnitKind::Overlord, 100, GroupId(1));
        router.register(UnitKind::Drone, 1, GroupId(3));
        assert_eq!(router.pending(UnitKind::Overlord), 1);
        assert_eq!(router.total_pending(), 2);
        router.route(UnitKind::Overlord);
        assert_eq!(router.pending(UnitKind::Overlord), 0);
    }
}
