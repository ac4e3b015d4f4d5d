//! Caller-owned holder for the latest published statistics snapshot

use std::sync::{Mutex, MutexGuard};

use crate::models::stats::{BoardState, BoardView, CounsellorStats};

/// Identifies one refresh of a [`StatsBoard`]. Tokens increase monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshToken(u64);

impl RefreshToken {
    pub fn revision(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct Inner {
    counsellor_id: Option<String>,
    snapshot: Option<CounsellorStats>,
    error: Option<String>,
    /// Last token handed out by `begin`
    issued: u64,
    /// Last token whose outcome was accepted
    settled: u64,
}

/// Holds the most recent snapshot for one display.
///
/// Overlapping refreshes are resolved by token order: an outcome is only
/// accepted if it is newer than the last accepted one, so a slow, superseded
/// refresh can never overwrite a newer snapshot.
#[derive(Debug, Default)]
pub struct StatsBoard {
    inner: Mutex<Inner>,
}

impl StatsBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // critical sections cannot panic between writes
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a refresh and clear the error flag
    pub fn begin(&self, counsellor_id: &str) -> RefreshToken {
        let mut inner = self.lock();
        inner.issued += 1;
        inner.error = None;
        inner.counsellor_id = Some(counsellor_id.to_string());
        RefreshToken(inner.issued)
    }

    /// Publish a snapshot. Returns false if a newer refresh already settled.
    pub fn publish(&self, token: RefreshToken, stats: CounsellorStats) -> bool {
        let mut inner = self.lock();
        if token.0 <= inner.settled {
            tracing::debug!(revision = token.0, settled = inner.settled, "Dropping superseded stats");
            return false;
        }
        inner.settled = token.0;
        inner.snapshot = Some(stats);
        inner.error = None;
        true
    }

    /// Record a failed refresh, keeping whatever snapshot is already there
    pub fn fail(&self, token: RefreshToken, error: String) -> bool {
        let mut inner = self.lock();
        if token.0 <= inner.settled {
            return false;
        }
        inner.settled = token.0;
        inner.error = Some(error);
        true
    }

    pub fn state(&self) -> BoardState {
        Self::state_of(&self.lock())
    }

    fn state_of(inner: &Inner) -> BoardState {
        if inner.issued == 0 {
            BoardState::Idle
        } else if inner.settled < inner.issued {
            BoardState::Loading
        } else if inner.error.is_some() {
            BoardState::Stale
        } else {
            BoardState::Ready
        }
    }

    pub fn view(&self) -> BoardView {
        let inner = self.lock();
        BoardView {
            state: Self::state_of(&inner),
            counsellor_id: inner.counsellor_id.clone(),
            status: inner.snapshot.as_ref().map(CounsellorStats::status),
            stats: inner.snapshot.clone(),
            error: inner.error.clone(),
            revision: inner.settled,
        }
    }
}
