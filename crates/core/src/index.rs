use std::collections::HashMap;

use sha2::{Digest as _, Sha256};

use crate::tree::{NodeId, SourceTree};

/// Canonical key of a fixed-length node sequence: digest of the kind tags
/// in sequence order. Collision resistance only has to separate groups.
pub(crate) type Digest = [u8; 32];

/// Identifies a node across files: (file index, node index).
pub(crate) type NodeKey = (u32, NodeId);

pub(crate) type InstanceId = usize;

/// One concrete occurrence of a candidate pattern: a fixed-length slice of
/// one file's pre-order traversal, headed by its first node. Grows at both
/// ends during expansion; never shrinks.
#[derive(Debug)]
pub(crate) struct Instance {
    pub(crate) file: u32,
    pub(crate) nodes: Vec<NodeId>,
}

impl Instance {
    pub(crate) fn head(&self) -> NodeKey {
        (self.file, self.nodes[0])
    }

    pub(crate) fn node_keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes.iter().map(|&n| (self.file, n))
    }
}

pub(crate) fn canonical_key(tree: &SourceTree, nodes: &[NodeId]) -> Digest {
    let mut hasher = Sha256::new();
    for (i, &node) in nodes.iter().enumerate() {
        if i > 0 {
            hasher.update(b":");
        }
        hasher.update(tree.kind(node).as_bytes());
    }
    hasher.finalize().into()
}

/// Maps canonical keys to the instances sharing them, plus a reverse table
/// from head node to every bucket entry it participates in. The reverse
/// table is what makes retraction O(deleted entries).
#[derive(Debug, Default)]
pub(crate) struct OccurrenceIndex {
    buckets: HashMap<Digest, Vec<InstanceId>>,
    key_order: Vec<Digest>,
    occurrences: HashMap<NodeKey, Vec<(Digest, InstanceId)>>,
}

impl OccurrenceIndex {
    /// Appends the instance to its key's bucket and records the
    /// participation on the head node. Re-inserting an instance whose head
    /// already sits in the bucket is a no-op.
    pub(crate) fn insert(&mut self, key: Digest, id: InstanceId, instances: &[Instance]) -> bool {
        let head = instances[id].head();
        let bucket = match self.buckets.get_mut(&key) {
            Some(bucket) => {
                if bucket.iter().any(|&other| instances[other].head() == head) {
                    return false;
                }
                bucket
            }
            None => {
                self.key_order.push(key);
                self.buckets.entry(key).or_default()
            }
        };
        bucket.push(id);
        self.occurrences.entry(head).or_default().push((key, id));
        true
    }

    pub(crate) fn bucket(&self, key: &Digest) -> Option<&[InstanceId]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Keys whose bucket currently holds at least `min_instances` entries,
    /// ordered by descending bucket length. Ties keep first-insertion
    /// order: the walk indexes ancestors before descendants, so a stable
    /// sort analyzes ancestor buckets first and "greatest common parent
    /// wins" falls out without an ancestry check.
    pub(crate) fn candidate_keys(&self, min_instances: usize) -> Vec<Digest> {
        let mut keys: Vec<Digest> = self
            .key_order
            .iter()
            .filter(|key| {
                self.buckets
                    .get(*key)
                    .is_some_and(|b| b.len() >= min_instances)
            })
            .copied()
            .collect();
        keys.sort_by(|a, b| self.buckets[b].len().cmp(&self.buckets[a].len()));
        keys
    }

    /// Removes every bucket entry headed by `node`, but only from buckets
    /// that still hold exactly `original_len` entries; a bucket already
    /// resized by a different prune represents a different, still-valid
    /// match and is left alone. Missing state is a no-op by design.
    pub(crate) fn retract(&mut self, node: NodeKey, original_len: usize) {
        let Some(entries) = self.occurrences.remove(&node) else {
            return;
        };
        for (key, id) in entries {
            let Some(bucket) = self.buckets.get_mut(&key) else {
                continue;
            };
            if bucket.len() != original_len {
                continue;
            }
            if let Some(pos) = bucket.iter().position(|&other| other == id) {
                bucket.remove(pos);
            }
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
