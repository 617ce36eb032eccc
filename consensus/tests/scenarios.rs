//! End-to-end agreement scenarios against in-process acceptor sets

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use synod_consensus::{
    AcceptorSet, ConflictReason, Coordinator, FixedDelay, LocalAcceptor, Phase, ProposalOutcome,
    ProposeOptions, Proposer, RoundResult,
};
use synod_core::{
    AcceptResponse, Acceptor, AcceptorSnapshot, NodeId, PrepareResponse, ProposalNumber, Value,
};

fn n(round: u64) -> ProposalNumber {
    ProposalNumber::new(round, NodeId(1))
}

fn coordinator(node: u32, acceptors: AcceptorSet) -> Coordinator {
    Coordinator::new(
        NodeId(node),
        acceptors,
        Arc::new(FixedDelay(Duration::from_millis(2))),
    )
}

fn options() -> ProposeOptions {
    ProposeOptions::new(3, Duration::from_secs(5))
}

#[tokio::test]
async fn fresh_set_then_second_value_keeps_first() {
    let set = AcceptorSet::local(3).unwrap();

    let first = Proposer::new(n(1), Value::from("A")).run(&set).await.unwrap();
    assert_eq!(first.decided_value(), Some(&Value::from("A")));

    let second = Proposer::new(n(2), Value::from("B")).run(&set).await.unwrap();
    assert_eq!(second.decided_value(), Some(&Value::from("A")));
}

#[tokio::test]
async fn two_seeded_acceptors_block_prepare() {
    let set = AcceptorSet::new(vec![
        Arc::new(LocalAcceptor::seeded(NodeId(1), n(5))) as Arc<dyn Acceptor>,
        Arc::new(LocalAcceptor::seeded(NodeId(2), n(5))),
        Arc::new(LocalAcceptor::new(NodeId(3))),
    ])
    .unwrap();

    let result = Proposer::new(n(3), Value::from("X")).run(&set).await.unwrap();
    assert!(matches!(
        result,
        RoundResult::Conflict {
            phase: Phase::Prepare,
            ..
        }
    ));
}

#[tokio::test]
async fn coordinator_preserves_decided_value() {
    for size in [1usize, 3, 4, 5] {
        let coordinator = coordinator(1, AcceptorSet::local(size).unwrap());

        let first = coordinator.propose(Value::from("A"), options()).await.unwrap();
        let second = coordinator.propose(Value::from("B"), options()).await.unwrap();

        assert_eq!(first.decided_value(), Some(&Value::from("A")), "N={}", size);
        assert_eq!(second.decided_value(), Some(&Value::from("A")), "N={}", size);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_clients_agree_on_one_value() {
    let coordinator = Arc::new(coordinator(1, AcceptorSet::local(5).unwrap()));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .propose(Value::new(format!("v{}", i)), options())
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut decided = HashSet::new();
    for handle in handles {
        if let Some(value) = handle.await.unwrap().decided_value() {
            decided.insert(value.clone());
        }
    }

    assert_eq!(decided.len(), 1, "decided values: {:?}", decided);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn competing_coordinators_stay_safe() {
    // Separate coordinators only serialize their own attempts; safety comes
    // from quorum intersection and proposal ordering alone.
    let set = AcceptorSet::local(3).unwrap();
    let coordinators: Vec<Arc<Coordinator>> = (1..=3)
        .map(|id| Arc::new(coordinator(id, set.clone())))
        .collect();

    let mut handles = Vec::new();
    for (i, coordinator) in coordinators.iter().enumerate() {
        for j in 0..4 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator
                    .propose(
                        Value::new(format!("c{}-{}", i, j)),
                        ProposeOptions::new(10, Duration::from_secs(5)),
                    )
                    .await
                    .unwrap()
            }));
        }
    }

    let mut decided = HashSet::new();
    for handle in handles {
        if let Some(value) = handle.await.unwrap().decided_value() {
            decided.insert(value.clone());
        }
    }

    assert!(decided.len() <= 1, "decided values: {:?}", decided);
}

/// Counts how many prepare calls overlap in time
struct OverlapProbe {
    inner: LocalAcceptor,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl OverlapProbe {
    fn new(id: u32) -> Self {
        Self {
            inner: LocalAcceptor::new(NodeId(id)),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Acceptor for OverlapProbe {
    fn id(&self) -> NodeId {
        self.inner.id()
    }

    async fn prepare(&self, number: ProposalNumber) -> PrepareResponse {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        let response = self.inner.prepare(number).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }

    async fn accept(&self, number: ProposalNumber, value: Value) -> AcceptResponse {
        self.inner.accept(number, value).await
    }

    fn snapshot(&self) -> AcceptorSnapshot {
        self.inner.snapshot()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn attempts_never_overlap() {
    let probe = Arc::new(OverlapProbe::new(1));
    let set = AcceptorSet::new(vec![
        probe.clone() as Arc<dyn Acceptor>,
        Arc::new(LocalAcceptor::new(NodeId(2))),
        Arc::new(LocalAcceptor::new(NodeId(3))),
    ])
    .unwrap();
    let coordinator = Arc::new(coordinator(1, set));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .propose(Value::new(format!("v{}", i)), options())
                    .await
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().decided_value().is_some());
    }

    assert_eq!(probe.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn queued_request_cancels_when_its_deadline_passes() {
    // The first caller holds the section for ~100ms of slow prepares
    struct Slow(LocalAcceptor);

    #[async_trait]
    impl Acceptor for Slow {
        fn id(&self) -> NodeId {
            self.0.id()
        }

        async fn prepare(&self, number: ProposalNumber) -> PrepareResponse {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.0.prepare(number).await
        }

        async fn accept(&self, number: ProposalNumber, value: Value) -> AcceptResponse {
            self.0.accept(number, value).await
        }

        fn snapshot(&self) -> AcceptorSnapshot {
            self.0.snapshot()
        }
    }

    let set = AcceptorSet::new(vec![Arc::new(Slow(LocalAcceptor::new(NodeId(1)))) as Arc<dyn Acceptor>])
        .unwrap();
    let coordinator = Arc::new(coordinator(1, set));

    let slow = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.propose(Value::from("first"), options()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let queued = coordinator
        .propose(
            Value::from("second"),
            ProposeOptions::new(3, Duration::from_millis(20)),
        )
        .await
        .unwrap();

    assert_eq!(
        queued,
        ProposalOutcome::Conflict {
            reason: ConflictReason::Cancelled,
            attempts: 0
        }
    );
    assert_eq!(
        slow.await.unwrap().unwrap().decided_value(),
        Some(&Value::from("first"))
    );
}
