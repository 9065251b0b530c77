//! Debounced, race-guarded search dispatch.
//!
//! The controller never runs a timer itself. It records at most one pending
//! debounced query together with its due time, and the owner polls it on
//! every tick. Each dispatch is stamped with a sequence number; only the
//! completion carrying the latest number may clear the loading flag.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::error::SearchError;

/// Default debounce delay in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// A search that has been dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    /// Sequence number identifying this dispatch.
    pub seq: u64,
    /// The query text.
    pub query: String,
}

/// What a search handler reports back when invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The search finished synchronously.
    Settled(Result<(), SearchError>),
    /// The search continues in the background; its completion is reported
    /// later through the ticket's sequence number.
    InFlight,
}

/// Runs a search for a ticket.
pub trait SearchHandler {
    /// Start the search described by `ticket`.
    fn search(&mut self, ticket: &SearchTicket) -> SearchOutcome;
}

impl<F> SearchHandler for F
where
    F: FnMut(&SearchTicket) -> SearchOutcome,
{
    fn search(&mut self, ticket: &SearchTicket) -> SearchOutcome {
        self(ticket)
    }
}

/// A query waiting for its debounce delay to elapse.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingSearch {
    query: String,
    due: Instant,
}

/// Schedules searches and suppresses stale completions.
#[derive(Debug, Clone)]
pub struct SearchController {
    /// Debounce delay.
    debounce: Duration,
    /// Whether searches complete asynchronously.
    async_mode: bool,
    /// The single pending debounced query, if any.
    pending: Option<PendingSearch>,
    /// Sequence number of the latest dispatch.
    latest_seq: u64,
    /// Loading flag owned by the controller.
    loading: bool,
    /// Loading flag supplied by the caller.
    external_loading: bool,
}

impl SearchController {
    /// Create a controller.
    pub fn new(debounce: Duration, async_mode: bool) -> Self {
        Self {
            debounce,
            async_mode,
            pending: None,
            latest_seq: 0,
            loading: false,
            external_loading: false,
        }
    }

    /// The debounce delay.
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Check whether a debounced query is waiting.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Sequence number of the latest dispatch.
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Check whether a sequence number belongs to the latest dispatch.
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest_seq
    }

    /// Set the caller-owned loading flag.
    pub fn set_external_loading(&mut self, loading: bool) {
        self.external_loading = loading;
    }

    /// Effective loading state.
    pub fn is_loading(&self) -> bool {
        if self.async_mode {
            self.loading || self.external_loading
        } else {
            self.external_loading
        }
    }

    /// Request a search.
    ///
    /// An immediate request or an empty query cancels any pending query and
    /// returns a ticket to run now. Otherwise the query replaces any pending
    /// one and becomes due after the debounce delay.
    pub fn dispatch(&mut self, query: &str, immediate: bool, now: Instant) -> Option<SearchTicket> {
        if immediate || query.is_empty() || self.debounce.is_zero() {
            self.cancel();
            return Some(self.stamp(query.to_string()));
        }

        trace!(query, delay_ms = self.debounce.as_millis() as u64, "Debouncing search");
        self.pending = Some(PendingSearch {
            query: query.to_string(),
            due: now + self.debounce,
        });
        None
    }

    /// Fire the pending query if its delay has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<SearchTicket> {
        if !self.pending.as_ref().is_some_and(|pending| pending.due <= now) {
            return None;
        }
        let pending = self.pending.take()?;
        Some(self.stamp(pending.query))
    }

    /// Drop the pending query. In-flight searches are unaffected.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            trace!("Cancelled pending search");
        }
    }

    /// Run a ticket through a handler.
    ///
    /// Loading is raised first in async mode. A synchronous result completes
    /// the ticket at once and any error is returned to the caller.
    pub fn execute(
        &mut self,
        ticket: &SearchTicket,
        handler: &mut dyn SearchHandler,
    ) -> Result<(), SearchError> {
        if self.async_mode {
            self.loading = true;
        }
        match handler.search(ticket) {
            SearchOutcome::Settled(result) => self.complete(ticket.seq, result),
            SearchOutcome::InFlight => Ok(()),
        }
    }

    /// Record the completion of a dispatched search.
    ///
    /// Loading clears only if `seq` is still the latest dispatch; older
    /// completions are discarded. The result is passed back either way so
    /// failures reach the caller.
    pub fn complete(&mut self, seq: u64, result: Result<(), SearchError>) -> Result<(), SearchError> {
        if self.is_current(seq) {
            self.loading = false;
        } else {
            debug!(seq, latest = self.latest_seq, "Discarding stale search completion");
        }
        result
    }

    fn stamp(&mut self, query: String) -> SearchTicket {
        self.latest_seq += 1;
        trace!(seq = self.latest_seq, query = %query, "Dispatching search");
        SearchTicket {
            seq: self.latest_seq,
            query,
        }
    }
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS), false)
    }
}
