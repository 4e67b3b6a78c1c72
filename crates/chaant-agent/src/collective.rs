//! Collective (voted) play.
//!
//! Many callers submit notations for the agent's next move. Votes are
//! validated against the live position, tallied per resolved move, and after
//! a random window (or once enough votes arrive) the plurality move is
//! played. Every commit or agent move starts a fresh cycle.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use chaant_config::CollectiveConfig;
use chaant_protocols::{AgentResult, AgentState, CollectiveAgent, ListenerGuard, MoveRecord};

#[derive(Debug, Clone)]
struct Vote {
    /// UCI of the resolved move.
    key: String,
    /// First spelling seen for this move.
    notation: String,
    count: u32,
}

#[derive(Default)]
struct Tally {
    cycle: u64,
    votes: Vec<Vote>,
    total: u32,
    timer: Option<JoinHandle<()>>,
    /// A vote-limit commit is spawned and has not taken the tally yet.
    commit_pending: bool,
}

impl Tally {
    fn clear(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.votes.clear();
        self.total = 0;
        self.commit_pending = false;
        self.cycle += 1;
    }
}

/// Vote count for one candidate move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    pub notation: String,
    pub votes: u32,
}

/// Current state of the tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectiveSnapshot {
    pub votes: Vec<VoteCount>,
    pub total: u32,
    /// Whether a commit is scheduled.
    pub armed: bool,
}

struct CollectiveInner<A: ?Sized> {
    agent: Arc<A>,
    config: CollectiveConfig,
    tally: Mutex<Tally>,
    add_queue: tokio::sync::Mutex<()>,
    commit_queue: tokio::sync::Mutex<()>,
}

/// Vote aggregator over one agent.
pub struct CollectiveMove<A: CollectiveAgent + ?Sized + 'static> {
    inner: Arc<CollectiveInner<A>>,
    _listener: ListenerGuard,
}

impl<A: CollectiveAgent + ?Sized + 'static> CollectiveMove<A> {
    pub fn new(agent: Arc<A>, config: CollectiveConfig) -> Self {
        let inner = Arc::new(CollectiveInner {
            agent,
            config,
            tally: Mutex::new(Tally::default()),
            add_queue: tokio::sync::Mutex::new(()),
            commit_queue: tokio::sync::Mutex::new(()),
        });

        let hook: Weak<CollectiveInner<A>> = Arc::downgrade(&inner);
        let listener = inner.agent.on_move(Arc::new(move |record: &MoveRecord| {
            if let Some(inner) = hook.upgrade() {
                debug!("Agent played {}, starting a fresh tally", record.notation);
                inner.tally.lock().clear();
            }
            Ok(())
        }));

        Self {
            inner,
            _listener: listener,
        }
    }

    /// Submit a vote. `Ok(true)` when it was counted.
    ///
    /// Votes are processed one at a time in arrival order. Only a lost page
    /// surfaces as an error; any other rejected vote is simply not counted.
    pub async fn add_move(&self, notation: &str) -> AgentResult<bool> {
        let _queue = self.inner.add_queue.lock().await;
        let inner = &self.inner;

        if !inner.agent.play_state().is_playing() {
            inner.tally.lock().clear();
            return Ok(false);
        }

        let cycle = inner.tally.lock().cycle;
        let resolved = match inner.agent.evaluate_move(notation).await {
            Ok(resolved) => resolved,
            Err(failure) if failure.is_unreachable() => {
                inner.tally.lock().clear();
                return Err(failure);
            }
            Err(failure) => {
                debug!("Vote {} rejected: {}", notation, failure);
                return Ok(false);
            }
        };

        let mut tally = inner.tally.lock();
        if tally.cycle != cycle {
            debug!("Vote {} arrived after its cycle closed", notation);
            return Ok(false);
        }

        let key = resolved.uci();
        match tally.votes.iter_mut().find(|v| v.key == key) {
            Some(vote) => vote.count += 1,
            None => tally.votes.push(Vote {
                key,
                notation: notation.trim().to_string(),
                count: 1,
            }),
        }
        tally.total += 1;

        if tally.total >= inner.config.max_votes {
            if let Some(timer) = tally.timer.take() {
                timer.abort();
            }
            if !tally.commit_pending {
                info!("Vote limit reached, committing now");
                tally.commit_pending = true;
                let now = inner.clone();
                tokio::spawn(async move { now.commit(cycle).await });
            }
        } else if tally.timer.is_none() {
            let window = inner.draw_window();
            debug!("First vote of cycle {}, committing in {:?}", cycle, window);
            let later = Arc::downgrade(inner);
            tally.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(window).await;
                if let Some(inner) = later.upgrade() {
                    inner.commit(cycle).await;
                }
            }));
        }
        Ok(true)
    }

    pub fn snapshot(&self) -> CollectiveSnapshot {
        let tally = self.inner.tally.lock();
        CollectiveSnapshot {
            votes: tally
                .votes
                .iter()
                .map(|v| VoteCount {
                    notation: v.notation.clone(),
                    votes: v.count,
                })
                .collect(),
            total: tally.total,
            armed: tally.timer.is_some() || tally.commit_pending,
        }
    }

    /// Drop all votes and any scheduled commit.
    pub fn reset(&self) {
        self.inner.tally.lock().clear();
    }
}

impl<A: CollectiveAgent + ?Sized + 'static> Drop for CollectiveMove<A> {
    fn drop(&mut self) {
        if let Some(timer) = self.inner.tally.lock().timer.take() {
            timer.abort();
        }
    }
}

impl<A: CollectiveAgent + ?Sized + 'static> CollectiveInner<A> {
    fn draw_window(&self) -> Duration {
        let min = self.config.min_window();
        let max = self.config.max_window();
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    /// Play the plurality of `cycle`'s votes, unless that cycle already ended.
    async fn commit(&self, cycle: u64) {
        let _queue = self.commit_queue.lock().await;
        let votes = {
            let mut tally = self.tally.lock();
            if tally.cycle != cycle {
                return;
            }
            // The running timer is this task or already aborted.
            drop(tally.timer.take());
            let votes = std::mem::take(&mut tally.votes);
            tally.total = 0;
            tally.commit_pending = false;
            tally.cycle += 1;
            votes
        };

        let Some(winner) = plurality(&votes) else {
            return;
        };
        info!(
            "Committing {} with {} of {} votes",
            winner.notation,
            winner.count,
            votes.iter().map(|v| v.count).sum::<u32>()
        );

        match self.agent.wait_turn().await {
            Ok(AgentState::TakingTurn) => {}
            Ok(state) => {
                warn!("Collective move {} dropped, agent is {}", winner.notation, state);
                return;
            }
            Err(failure) => {
                warn!("Collective move {} dropped: {}", winner.notation, failure);
                return;
            }
        }
        if let Err(failure) = self.agent.move_piece(&winner.notation).await {
            warn!("Collective move {} failed: {}", winner.notation, failure);
        }
    }
}

/// Highest count in first-seen order; ties go to the earliest.
fn plurality(votes: &[Vote]) -> Option<&Vote> {
    let mut best: Option<&Vote> = None;
    for vote in votes {
        if best.map_or(true, |b| vote.count > b.count) {
            best = Some(vote);
        }
    }
    best
}

#[cfg(test)]
#[path = "collective_tests.rs"]
mod tests;
