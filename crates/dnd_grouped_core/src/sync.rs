use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AuthorityError;
use crate::model::Collection;
use crate::ordering::{MoveCommand, MoveSeq, SequencedMove};

/// Snapshot keys the cache layer can be asked to refetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKey {
    /// The grouped order: groups and the items inside them.
    LinkGroups,
    /// The flat item list.
    Links,
}

impl CacheKey {
    pub const ALL: [CacheKey; 2] = [CacheKey::LinkGroups, CacheKey::Links];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::LinkGroups => "link_groups",
            CacheKey::Links => "links",
        }
    }
}

impl MoveCommand {
    /// Cache keys whose content a committed move changes.
    pub fn affected_keys(&self) -> &'static [CacheKey] {
        match self {
            MoveCommand::Group(_) => &[CacheKey::LinkGroups],
            MoveCommand::Item(_) => &[CacheKey::LinkGroups, CacheKey::Links],
        }
    }
}

/// The source of truth for ordering.
pub trait OrderingAuthority: Send + Sync {
    fn apply_move(&self, command: &MoveCommand) -> Result<(), AuthorityError>;
}

pub trait SnapshotCache: Send + Sync {
    fn current_snapshot(&self) -> Collection;

    /// Mark `keys` stale so the next read comes from the authority.
    fn invalidate(&self, keys: &[CacheKey]);
}

/// Receives the single canonical move at the end of a drag.
///
/// Implementations must return promptly and must not panic: the gesture has already finished by
/// the time `submit` runs.
pub trait MoveSink {
    fn submit(&self, command: SequencedMove);
}

/// Logs and drops every move.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl MoveSink for NullSink {
    fn submit(&self, command: SequencedMove) {
        tracing::debug!(?command, "no sink configured; dropping move");
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    Rejected(AuthorityError),
}

/// Pairs an ordering authority with the snapshot cache it feeds.
#[derive(Clone)]
pub struct SyncClient {
    authority: Arc<dyn OrderingAuthority>,
    cache: Arc<dyn SnapshotCache>,
}

impl SyncClient {
    pub fn new(authority: Arc<dyn OrderingAuthority>, cache: Arc<dyn SnapshotCache>) -> Self {
        Self { authority, cache }
    }

    pub fn cache(&self) -> &Arc<dyn SnapshotCache> {
        &self.cache
    }

    pub fn snapshot(&self) -> Collection {
        self.cache.current_snapshot()
    }

    /// Send `command` to the authority and invalidate the keys it touches.
    ///
    /// The keys are invalidated on rejection too, so the next snapshot read replaces the
    /// optimistic order with the authoritative one.
    pub fn commit(&self, command: &MoveCommand) -> CommitOutcome {
        let outcome = match self.authority.apply_move(command) {
            Ok(()) => {
                tracing::debug!(?command, "move committed");
                CommitOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(?command, %err, "ordering authority rejected move; resyncing");
                CommitOutcome::Rejected(err)
            }
        };
        self.cache.invalidate(command.affected_keys());
        outcome
    }

    /// Commit `command` and read the snapshot that follows it.
    pub fn commit_and_refresh(&self, command: &SequencedMove) -> SequencedSnapshot {
        self.commit(&command.command);
        SequencedSnapshot {
            seq: command.seq,
            groups: self.snapshot(),
        }
    }
}

impl MoveSink for SyncClient {
    fn submit(&self, command: SequencedMove) {
        self.commit(&command.command);
    }
}

/// A collection read from the cache once every move up to `seq` had reached the authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequencedSnapshot {
    pub seq: MoveSeq,
    pub groups: Collection,
}

/// FIFO of pending sync jobs that hands out at most one drainer at a time.
///
/// Jobs run strictly in push order, so the authority sees moves in the order they were committed
/// locally.
#[derive(Debug)]
pub struct SyncQueue<J> {
    jobs: VecDeque<J>,
    draining: bool,
}

impl<J> Default for SyncQueue<J> {
    fn default() -> Self {
        Self {
            jobs: VecDeque::new(),
            draining: false,
        }
    }
}

impl<J> SyncQueue<J> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `job`. Returns `true` when the caller must start draining.
    pub fn push(&mut self, job: J) -> bool {
        self.jobs.push_back(job);
        if self.draining {
            return false;
        }
        self.draining = true;
        true
    }

    /// The next job for the active drainer. `None` ends the drain.
    pub fn next_job(&mut self) -> Option<J> {
        let job = self.jobs.pop_front();
        if job.is_none() {
            self.draining = false;
        }
        job
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn is_draining(&self) -> bool {
        self.draining
    }
}
