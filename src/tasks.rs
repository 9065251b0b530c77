//! Background search tasks for the demo application.
//!
//! Searches run on tokio tasks so the UI stays responsive. Results come back
//! to the main loop over an unbounded channel:
//! 1. The engine fires a debounced ticket and calls [`SearchSpawner::search`]
//! 2. The spawner starts a task and reports the search as in flight
//! 3. The task sends a [`SearchMessage`] when it finishes
//! 4. The main loop drains the channel with `try_recv()` and hands each
//!    completion to the engine, which ignores stale ones

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::engine::{SearchError, SearchHandler, SearchOutcome, SearchTicket, SelectionValue};

/// Messages sent from background searches to the main event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMessage {
    /// A search finished.
    Completed {
        /// Sequence number of the ticket.
        seq: u64,
        /// The query that was searched.
        query: String,
        /// Matching options, or the failure.
        result: Result<Vec<SelectionValue>, SearchError>,
    },
}

/// Search the catalog after a simulated delay.
///
/// Matches names case-insensitively by substring. An empty query returns the
/// whole catalog.
pub async fn search_catalog(
    catalog: Arc<Vec<SelectionValue>>,
    query: String,
    latency: Duration,
) -> Result<Vec<SelectionValue>, SearchError> {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
    let needle = query.to_lowercase();
    Ok(catalog
        .iter()
        .filter(|option| option.name.to_lowercase().contains(&needle))
        .cloned()
        .collect())
}

/// Shared, growable option catalog searched by background tasks.
#[derive(Debug, Clone, Default)]
pub struct SearchCatalog {
    options: Arc<RwLock<Vec<SelectionValue>>>,
}

impl SearchCatalog {
    /// Create a catalog holding `options`.
    pub fn new(options: Vec<SelectionValue>) -> Self {
        Self {
            options: Arc::new(RwLock::new(options)),
        }
    }

    /// Copy of the current options.
    pub fn snapshot(&self) -> Vec<SelectionValue> {
        match self.options.read() {
            Ok(options) => options.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Add options whose ids are not in the catalog yet. Returns how many
    /// were added.
    pub fn merge(&self, options: &[SelectionValue]) -> usize {
        let mut catalog = match self.options.write() {
            Ok(catalog) => catalog,
            Err(poisoned) => poisoned.into_inner(),
        };
        let known: HashSet<String> = catalog.iter().map(|option| option.id.clone()).collect();
        let fresh: Vec<SelectionValue> = options
            .iter()
            .filter(|option| !known.contains(&option.id))
            .cloned()
            .collect();
        let added = fresh.len();
        catalog.extend(fresh);
        added
    }
}

/// Spawns background searches against an in-memory catalog.
#[derive(Clone)]
pub struct SearchSpawner {
    tx: mpsc::UnboundedSender<SearchMessage>,
    catalog: SearchCatalog,
    latency: Duration,
}

impl SearchSpawner {
    /// Create a spawner sending results through `tx`.
    pub fn new(tx: mpsc::UnboundedSender<SearchMessage>, catalog: SearchCatalog, latency: Duration) -> Self {
        Self { tx, catalog, latency }
    }

    /// Spawn a task searching for the ticket's query.
    pub fn spawn_search(&self, ticket: &SearchTicket) {
        let tx = self.tx.clone();
        let catalog = Arc::new(self.catalog.snapshot());
        let latency = self.latency;
        let seq = ticket.seq;
        let query = ticket.query.clone();
        trace!(seq, query = %query, "Spawning search task");
        tokio::spawn(async move {
            let result = search_catalog(catalog, query.clone(), latency).await;
            debug!(seq, ok = result.is_ok(), "Search task finished");
            let _ = tx.send(SearchMessage::Completed { seq, query, result });
        });
    }
}

impl SearchHandler for SearchSpawner {
    fn search(&mut self, ticket: &SearchTicket) -> SearchOutcome {
        self.spawn_search(ticket);
        SearchOutcome::InFlight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<SelectionValue> {
        vec![
            SelectionValue::new("1", "Apple"),
            SelectionValue::new("2", "Pineapple"),
            SelectionValue::new("3", "Banana"),
        ]
    }

    #[test]
    fn test_search_catalog_filters_case_insensitively() {
        let result = tokio_test::block_on(search_catalog(
            Arc::new(catalog()),
            "APPLE".to_string(),
            Duration::ZERO,
        ))
        .unwrap();
        let ids: Vec<_> = result.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_search_catalog_empty_query_returns_all() {
        let result = tokio_test::block_on(search_catalog(
            Arc::new(catalog()),
            String::new(),
            Duration::from_millis(1),
        ))
        .unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_catalog_merge_adds_unknown_ids_only() {
        let catalog = SearchCatalog::new(catalog());
        let added = catalog.merge(&[
            SelectionValue::new("1", "Apple"),
            SelectionValue::new("new-1", "Kiwi"),
        ]);
        assert_eq!(added, 1);
        let snapshot = catalog.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot[3], SelectionValue::new("new-1", "Kiwi"));
    }

    #[tokio::test]
    async fn test_spawner_searches_merged_options() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let catalog = SearchCatalog::new(catalog());
        let spawner = SearchSpawner::new(tx, catalog.clone(), Duration::ZERO);
        catalog.merge(&[SelectionValue::new("new-1", "Kiwi")]);

        spawner.spawn_search(&SearchTicket {
            seq: 1,
            query: "kiw".to_string(),
        });
        let SearchMessage::Completed { result, .. } = rx.recv().await.unwrap();
        assert_eq!(result, Ok(vec![SelectionValue::new("new-1", "Kiwi")]));
    }

    #[tokio::test]
    async fn test_spawner_reports_in_flight_and_sends_result() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut spawner = SearchSpawner::new(tx, SearchCatalog::new(catalog()), Duration::ZERO);
        let ticket = SearchTicket {
            seq: 7,
            query: "ban".to_string(),
        };

        assert_eq!(spawner.search(&ticket), SearchOutcome::InFlight);

        let message = rx.recv().await.unwrap();
        assert_eq!(
            message,
            SearchMessage::Completed {
                seq: 7,
                query: "ban".to_string(),
                result: Ok(vec![SelectionValue::new("3", "Banana")]),
            }
        );
    }
}
