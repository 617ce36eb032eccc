//! Acceptor set and majority arithmetic

use crate::acceptor::LocalAcceptor;
use synod_core::{Acceptor, AcceptorSnapshot, NodeId, SynodError, SynodResult};
use std::sync::Arc;

/// Smallest strict majority of `total` members
pub fn quorum_size(total: usize) -> usize {
    total / 2 + 1
}

/// Whether `count` members out of `total` form a majority
pub fn is_quorum(count: usize, total: usize) -> bool {
    total > 0 && count >= quorum_size(total)
}

/// Fixed set of acceptors a proposer runs against
#[derive(Clone)]
pub struct AcceptorSet {
    acceptors: Vec<Arc<dyn Acceptor>>,
}

impl AcceptorSet {
    /// Create from existing acceptors
    pub fn new(acceptors: Vec<Arc<dyn Acceptor>>) -> SynodResult<Self> {
        if acceptors.is_empty() {
            return Err(SynodError::ConfigError(
                "acceptor set must not be empty".into(),
            ));
        }
        Ok(Self { acceptors })
    }

    /// `count` fresh in-process acceptors, numbered from 1
    pub fn local(count: usize) -> SynodResult<Self> {
        let acceptors = (1..=count)
            .map(|i| Arc::new(LocalAcceptor::new(NodeId(i as u32))) as Arc<dyn Acceptor>)
            .collect();
        Self::new(acceptors)
    }

    pub fn len(&self) -> usize {
        self.acceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acceptors.is_empty()
    }

    /// Responses needed in each phase
    pub fn quorum(&self) -> usize {
        quorum_size(self.len())
    }

    pub fn is_quorum(&self, count: usize) -> bool {
        is_quorum(count, self.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Acceptor>> {
        self.acceptors.iter()
    }

    pub fn snapshots(&self) -> Vec<AcceptorSnapshot> {
        self.acceptors.iter().map(|a| a.snapshot()).collect()
    }
}

impl std::fmt::Debug for AcceptorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceptorSet")
            .field("len", &self.len())
            .field("quorum", &self.quorum())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_majority_sizes() {
        assert_eq!(quorum_size(1), 1);
        assert_eq!(quorum_size(2), 2);
        assert_eq!(quorum_size(3), 2);
        assert_eq!(quorum_size(4), 3);
        assert_eq!(quorum_size(5), 3);

        assert!(!is_quorum(0, 0));
        assert!(!is_quorum(2, 4));
        assert!(is_quorum(3, 4));
    }

    /// Every pair of majorities drawn from the same set shares a member
    #[test]
    fn test_quorums_intersect() {
        for total in 1..=5usize {
            let quorum = quorum_size(total);
            let subsets: Vec<BTreeSet<usize>> = (0u32..(1 << total))
                .filter(|mask| mask.count_ones() as usize >= quorum)
                .map(|mask| (0..total).filter(|i| mask & (1 << i) != 0).collect())
                .collect();

            for a in &subsets {
                for b in &subsets {
                    assert!(
                        a.intersection(b).next().is_some(),
                        "disjoint quorums {:?} and {:?} for N={}",
                        a,
                        b,
                        total
                    );
                }
            }
        }
    }

    #[test]
    fn test_local_set() {
        let set = AcceptorSet::local(5).unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(set.quorum(), 3);

        let ids: Vec<NodeId> = set.iter().map(|a| a.id()).collect();
        assert_eq!(ids, (1..=5).map(NodeId).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(matches!(
            AcceptorSet::local(0),
            Err(SynodError::ConfigError(_))
        ));
    }
}
