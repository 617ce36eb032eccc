//! Retry coordinator
//!
//! Turns single-shot proposer attempts into a bounded, deadline-aware
//! operation. Every attempt runs inside the coordinator's critical section,
//! so at most one attempt touches the acceptor set at any instant and all
//! attempts form a total order.

use crate::allocator::{check_hint, ProposalAllocator};
use crate::proposer::{Proposer, RoundResult};
use crate::quorum::AcceptorSet;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use synod_core::{NodeId, ProposalNumber, RetryPolicy, SynodResult, Timestamp, Value};
use tokio::sync::Mutex;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, error, info, warn};

/// Per-request limits
#[derive(Debug, Clone, Copy)]
pub struct ProposeOptions {
    /// Client-suggested round, used as a lower bound
    pub hint: Option<u64>,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// No new attempt starts after this instant
    pub deadline: Instant,
}

impl ProposeOptions {
    pub fn new(max_retries: u32, timeout: Duration) -> Self {
        Self {
            hint: None,
            max_retries,
            deadline: Instant::now() + timeout,
        }
    }

    pub fn with_hint(mut self, hint: Option<u64>) -> Self {
        self.hint = hint;
        self
    }
}

/// Why a proposal ended without a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    /// Every allowed attempt hit a conflict
    Exhausted,
    /// The deadline passed before the next attempt could start
    Cancelled,
}

/// Final result of [`Coordinator::propose`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalOutcome {
    Decided {
        value: Value,
        number: ProposalNumber,
        attempts: u32,
    },
    Conflict {
        reason: ConflictReason,
        attempts: u32,
    },
}

impl ProposalOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            ProposalOutcome::Decided { attempts, .. } | ProposalOutcome::Conflict { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn decided_value(&self) -> Option<&Value> {
        match self {
            ProposalOutcome::Decided { value, .. } => Some(value),
            ProposalOutcome::Conflict { .. } => None,
        }
    }
}

/// Most recent decision seen by this coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub number: ProposalNumber,
    pub value: Value,
    pub decided_at: Timestamp,
}

/// Counters exposed for status reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinatorStats {
    pub attempts: u64,
    pub decided: u64,
    pub exhausted: u64,
    pub cancelled: u64,
    pub last_decision: Option<Decision>,
}

#[derive(Default)]
struct Counters {
    attempts: AtomicU64,
    decided: AtomicU64,
    exhausted: AtomicU64,
    cancelled: AtomicU64,
}

/// Owns an acceptor set and serializes every proposal attempt against it
pub struct Coordinator {
    node_id: NodeId,
    acceptors: AcceptorSet,
    policy: Arc<dyn RetryPolicy>,
    /// The critical section. Holding the guard is what entitles an attempt
    /// to touch the acceptor set; it also owns number allocation.
    section: Mutex<ProposalAllocator>,
    counters: Counters,
    last_decision: RwLock<Option<Decision>>,
}

impl Coordinator {
    pub fn new(node_id: NodeId, acceptors: AcceptorSet, policy: Arc<dyn RetryPolicy>) -> Self {
        Self {
            node_id,
            acceptors,
            policy,
            section: Mutex::new(ProposalAllocator::new(node_id)),
            counters: Counters::default(),
            last_decision: RwLock::new(None),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn acceptors(&self) -> &AcceptorSet {
        &self.acceptors
    }

    /// Propose `value` until it (or an earlier value) is decided, the retry
    /// budget runs out, or the deadline passes.
    ///
    /// The deadline is checked only between attempts; an attempt that has
    /// started always runs to completion. `Err` is returned for a hint above
    /// [`MAX_HINT_ROUND`](crate::allocator::MAX_HINT_ROUND), when the round
    /// space is used up, or when an acceptor breaks the protocol's ordering
    /// rule.
    pub async fn propose(&self, value: Value, options: ProposeOptions) -> SynodResult<ProposalOutcome> {
        check_hint(options.hint)?;
        let mut attempts = 0u32;

        for attempt in 0..=options.max_retries {
            if Instant::now() >= options.deadline {
                return Ok(self.cancelled(attempts));
            }

            let mut allocator = match timeout_at(options.deadline, self.section.lock()).await {
                Ok(guard) => guard,
                Err(_) => return Ok(self.cancelled(attempts)),
            };

            let number = match allocator.next(options.hint) {
                Ok(number) => number,
                Err(e) => {
                    error!(last_round = allocator.last_round(), "cannot allocate proposal number: {}", e);
                    return Err(e);
                }
            };
            attempts += 1;
            self.counters.attempts.fetch_add(1, Ordering::Relaxed);
            debug!(%number, attempt = attempts, "starting proposal attempt");

            let result = Proposer::new(number, value.clone())
                .run(&self.acceptors)
                .await?;

            match result {
                RoundResult::Decided { number, value } => {
                    drop(allocator);
                    return Ok(self.decided(number, value, attempts));
                }
                RoundResult::Conflict {
                    phase,
                    highest_seen,
                } => {
                    if let Some(seen) = highest_seen {
                        allocator.observe(seen);
                    }
                    drop(allocator);

                    if attempt < options.max_retries {
                        let delay = self.policy.delay(attempt);
                        warn!(
                            %number,
                            %phase,
                            attempt = attempts,
                            ?delay,
                            "proposal conflicted, retrying"
                        );
                        sleep_until((Instant::now() + delay).min(options.deadline)).await;
                    }
                }
            }
        }

        warn!(attempts, "proposal failed after maximum retries");
        self.counters.exhausted.fetch_add(1, Ordering::Relaxed);
        Ok(ProposalOutcome::Conflict {
            reason: ConflictReason::Exhausted,
            attempts,
        })
    }

    fn decided(&self, number: ProposalNumber, value: Value, attempts: u32) -> ProposalOutcome {
        self.counters.decided.fetch_add(1, Ordering::Relaxed);
        *self.last_decision.write() = Some(Decision {
            number,
            value: value.clone(),
            decided_at: Timestamp::now(),
        });

        info!(%number, %value, attempts, "consensus reached");

        ProposalOutcome::Decided {
            value,
            number,
            attempts,
        }
    }

    fn cancelled(&self, attempts: u32) -> ProposalOutcome {
        warn!(attempts, "proposal timed out after {} attempts", attempts);
        self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
        ProposalOutcome::Conflict {
            reason: ConflictReason::Cancelled,
            attempts,
        }
    }

    pub fn last_decision(&self) -> Option<Decision> {
        self.last_decision.read().clone()
    }

    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            attempts: self.counters.attempts.load(Ordering::Relaxed),
            decided: self.counters.decided.load(Ordering::Relaxed),
            exhausted: self.counters.exhausted.load(Ordering::Relaxed),
            cancelled: self.counters.cancelled.load(Ordering::Relaxed),
            last_decision: self.last_decision(),
        }
    }
}

/// Shared coordinator
pub type SharedCoordinator = Arc<Coordinator>;
