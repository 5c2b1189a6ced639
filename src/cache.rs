//! In-memory record cache owned by a [`Client`](crate::Client).
//!
//! Guilds and users are kept in [`Store`]s keyed by id; a later fetch of the
//! same id overwrites the earlier record. Statistics snapshots go into a
//! bounded FIFO history. Nothing is ever evicted from the record stores.

use crate::models::{Guild, Stats, User};
use crate::store::Store;
use std::collections::VecDeque;

/// Cached records. Written only by fetches with caching enabled.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    guilds: Store<String, Guild>,
    users: Store<String, User>,
    stats: StatsHistory,
}

impl Cache {
    pub(crate) fn new(stats_limit: usize) -> Self {
        Self {
            guilds: Store::new(),
            users: Store::new(),
            stats: StatsHistory::new(stats_limit),
        }
    }

    /// Every cached guild, keyed by id.
    pub fn guilds(&self) -> &Store<String, Guild> {
        &self.guilds
    }

    /// Every cached user, keyed by id.
    pub fn users(&self) -> &Store<String, User> {
        &self.users
    }

    /// Fetched statistics, oldest first.
    pub fn stats(&self) -> &StatsHistory {
        &self.stats
    }

    pub(crate) fn insert_guilds(&mut self, guilds: impl IntoIterator<Item = Guild>) {
        for guild in guilds {
            tracing::debug!(id = %guild.id, "Caching guild");
            self.guilds.insert(guild.id.clone(), guild);
        }
    }

    pub(crate) fn insert_users(&mut self, users: impl IntoIterator<Item = User>) {
        for user in users {
            tracing::debug!(id = %user.id, "Caching user");
            self.users.insert(user.id.clone(), user);
        }
    }

    pub(crate) fn push_stats(&mut self, stats: Stats) {
        self.stats.push(stats);
    }

    pub(crate) fn set_stats_limit(&mut self, limit: usize) {
        self.stats.set_limit(limit);
    }
}

/// Bounded history of statistics snapshots.
///
/// Pushing past the limit drops the oldest snapshot.
#[derive(Debug, Clone)]
pub struct StatsHistory {
    entries: VecDeque<Stats>,
    limit: usize,
}

impl StatsHistory {
    /// Creates an empty history holding at most `limit` snapshots.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    /// The most snapshots kept.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of snapshots held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no snapshot is held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> Option<&Stats> {
        self.entries.back()
    }

    /// The oldest snapshot still held.
    pub fn oldest(&self) -> Option<&Stats> {
        self.entries.front()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Stats> {
        self.entries.iter()
    }

    pub(crate) fn push(&mut self, stats: Stats) {
        self.entries.push_back(stats);
        self.evict();
    }

    /// Changes the capacity, dropping the oldest snapshots if it shrank.
    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.evict();
    }

    fn evict(&mut self) {
        while self.entries.len() > self.limit {
            self.entries.pop_front();
            tracing::debug!(limit = self.limit, "Evicted oldest statistics snapshot");
        }
    }
}

impl Default for StatsHistory {
    fn default() -> Self {
        Self::new(crate::options::DEFAULT_STATS_LIMIT)
    }
}
