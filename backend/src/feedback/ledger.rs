use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDateTime};
use shared::{FeedbackCounters, Vote};

use super::store::{FeedbackStore, StoreError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0} counter is already at its maximum")]
    CounterOverflow(Vote),
}

/// One submission as written to the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackEvent {
    pub timestamp: NaiveDateTime,
    pub vote: Vote,
}

impl fmt::Display for FeedbackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format(TIMESTAMP_FORMAT), self.vote)
    }
}

/// Parses a counters snapshot: the first two lines hold likes then dislikes.
/// Anything else is corrupt and yields `None`.
pub fn parse_counters(snapshot: &str) -> Option<FeedbackCounters> {
    let mut lines = snapshot.lines();
    let likes = lines.next()?.trim().parse().ok()?;
    let dislikes = lines.next()?.trim().parse().ok()?;
    Some(FeedbackCounters { likes, dislikes })
}

pub fn format_counters(counters: &FeedbackCounters) -> String {
    format!("{}\n{}\n", counters.likes, counters.dislikes)
}

/// Like/dislike tally. Every submission runs load, update, persist and log
/// append inside one critical section, so concurrent votes are never lost.
pub struct Ledger {
    store: Mutex<Box<dyn FeedbackStore>>,
}

impl Ledger {
    pub fn new(store: impl FeedbackStore + 'static) -> Self {
        Self {
            store: Mutex::new(Box::new(store)),
        }
    }

    /// Current tally, without recording anything.
    pub fn counters(&self) -> Result<FeedbackCounters, LedgerError> {
        let store = self.lock();
        load(&**store)
    }

    // Every write goes through the store, so a panicked holder leaves
    // nothing half-updated in memory.
    fn lock(&self) -> MutexGuard<'_, Box<dyn FeedbackStore>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, vote: Vote) -> Result<FeedbackCounters, LedgerError> {
        self.record_at(vote, Local::now().naive_local())
    }

    pub fn record_at(
        &self,
        vote: Vote,
        timestamp: NaiveDateTime,
    ) -> Result<FeedbackCounters, LedgerError> {
        let mut store = self.lock();

        let counters = load(&**store)?
            .apply(vote)
            .ok_or(LedgerError::CounterOverflow(vote))?;
        store.write_snapshot(&format_counters(&counters))?;

        // The snapshot is authoritative, so the log may lag it but never lead.
        let event = FeedbackEvent { timestamp, vote };
        store.append_event(&event.to_string())?;

        log::info!(
            "Recorded {} (likes: {}, dislikes: {})",
            vote,
            counters.likes,
            counters.dislikes
        );
        Ok(counters)
    }
}

fn load(store: &dyn FeedbackStore) -> Result<FeedbackCounters, LedgerError> {
    let Some(snapshot) = store.read_snapshot()? else {
        return Ok(FeedbackCounters::default());
    };
    Ok(parse_counters(&snapshot).unwrap_or_else(|| {
        log::warn!("Feedback counters are corrupt ({:?}), resetting to zero", snapshot);
        FeedbackCounters::default()
    }))
}
