use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of a block or inline node.
///
/// Unique within a tree for the node's lifetime. Reconciliation transfers ids
/// from a previous tree to the matching nodes of a re-parse.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u128);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_u128(self.0).hyphenated())
    }
}

/// Produces fresh node ids on demand.
pub trait IdGenerator {
    fn next_id(&mut self) -> NodeId;
}

/// Random v4 uuids. The default generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> NodeId {
        NodeId(Uuid::new_v4().as_u128())
    }
}

/// Deterministic counter, for tests and reproducible dumps.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u128,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_count_up() {
        let mut ids = SequentialIds::new();
        assert_eq!(ids.next_id(), NodeId(1));
        assert_eq!(ids.next_id(), NodeId(2));
    }

    #[test]
    fn uuid_ids_are_distinct() {
        let mut ids = UuidIds;
        assert_ne!(ids.next_id(), ids.next_id());
    }

    #[test]
    fn display_is_hyphenated_uuid() {
        assert_eq!(
            NodeId(1).to_string(),
            "00000000-0000-0000-0000-000000000001"
        );
    }
}
