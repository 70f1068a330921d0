//! Console load routine
//!
//! One `Console` per venue. `load` runs a full pass:
//! 1. Validate required venue configuration (no fetch when incomplete)
//! 2. Claim the in-flight flag; a concurrent call is skipped
//! 3. Fetch phase (`ResourceFetcher`)
//! 4. Aggregation phase (`build_console_data`)
//! 5. Replace the state in a single write
//!
//! A failed pass leaves the previous state in place. Closing the console
//! cancels any pass in flight and its result is dropped.

use crate::api::{ApiClient, DEFAULT_PAGE_LIMIT};
use crate::error::{ConsoleError, Result};
use crate::fetcher::ResourceFetcher;
use crate::notify::Notifier;
use crate::pipeline::{build_console_data, ConsoleData};
use chrono::{DateTime, Utc};
use orc_common::events::{ConsoleEvent, NoticeLevel};
use orc_common::VenueConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Data from one completed load pass
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedConsole {
    pub load_id: Uuid,
    pub loaded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: ConsoleData,
}

#[derive(Debug, Clone, Default)]
pub enum ConsoleState {
    /// No pass has completed yet
    #[default]
    Loading,
    /// Required venue properties are unset
    MissingConfig(Vec<String>),
    Ready(Arc<LoadedConsole>),
}

/// Result of a `load` call that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { load_id: Uuid, paper_count: usize },
    /// Another pass was already in flight
    Skipped,
    /// The console was closed before the pass finished
    Discarded,
}

/// Clears the in-flight flag however the pass ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Console {
    client: Arc<dyn ApiClient>,
    venue: VenueConfig,
    notifier: Arc<dyn Notifier>,
    state: RwLock<ConsoleState>,
    loading: AtomicBool,
    cancel: CancellationToken,
    page_limit: usize,
}

impl Console {
    pub fn new(client: Arc<dyn ApiClient>, venue: VenueConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            venue,
            notifier,
            state: RwLock::new(ConsoleState::Loading),
            loading: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    pub fn venue(&self) -> &VenueConfig {
        &self.venue
    }

    pub async fn state(&self) -> ConsoleState {
        self.state.read().await.clone()
    }

    /// Data from the last completed pass, if any
    pub async fn data(&self) -> Option<Arc<LoadedConsole>> {
        match &*self.state.read().await {
            ConsoleState::Ready(loaded) => Some(Arc::clone(loaded)),
            _ => None,
        }
    }

    pub async fn require_data(&self) -> Result<Arc<LoadedConsole>> {
        self.data().await.ok_or(ConsoleError::NotLoaded)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel any pass in flight; later passes are discarded too
    pub fn close(&self) {
        debug!(venue_id = %self.venue.venue_id, "Closing console");
        self.cancel.cancel();
    }

    pub async fn load(&self) -> Result<LoadOutcome> {
        let missing = self.venue.missing_required();
        if !missing.is_empty() {
            let err = orc_common::Error::MissingProperties(missing.clone());
            warn!(venue_id = %self.venue.venue_id, missing = ?missing, "Venue configuration incomplete");
            self.notifier.notify(NoticeLevel::Error, &err.to_string());
            *self.state.write().await = ConsoleState::MissingConfig(missing);
            return Err(err.into());
        }
        if let Err(err) = self.venue.check_rating_names() {
            warn!(venue_id = %self.venue.venue_id, error = %err, "Venue configuration invalid");
            self.notifier.notify(NoticeLevel::Error, &err.to_string());
            return Err(err.into());
        }

        if self.loading.swap(true, Ordering::SeqCst) {
            debug!(venue_id = %self.venue.venue_id, "Load already in flight, skipping");
            return Ok(LoadOutcome::Skipped);
        }
        let _guard = InFlightGuard(&self.loading);

        let load_id = Uuid::new_v4();
        if self.cancel.is_cancelled() {
            return Ok(self.discard(load_id));
        }

        info!(venue_id = %self.venue.venue_id, load_id = %load_id, "Loading venue data");
        self.notifier.lifecycle(ConsoleEvent::LoadStarted {
            load_id,
            venue_id: self.venue.venue_id.clone(),
            timestamp: Utc::now(),
        });

        let fetcher = ResourceFetcher::new(self.client.as_ref(), &self.venue, self.page_limit);
        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = fetcher.fetch() => Some(result),
        };

        let snapshot = match fetched {
            None => return Ok(self.discard(load_id)),
            Some(Err(e)) => {
                let err = ConsoleError::from(e);
                warn!(venue_id = %self.venue.venue_id, load_id = %load_id, error = %err, "Load failed");
                self.notifier.notify(NoticeLevel::Error, &err.to_string());
                self.notifier.lifecycle(ConsoleEvent::LoadFailed {
                    load_id,
                    message: err.to_string(),
                    timestamp: Utc::now(),
                });
                return Err(err);
            }
            Some(Ok(snapshot)) => snapshot,
        };

        let data = build_console_data(&self.venue, &snapshot);
        let paper_count = data.rows.len();

        if self.cancel.is_cancelled() {
            return Ok(self.discard(load_id));
        }

        *self.state.write().await = ConsoleState::Ready(Arc::new(LoadedConsole {
            load_id,
            loaded_at: Utc::now(),
            data,
        }));

        info!(venue_id = %self.venue.venue_id, load_id = %load_id, papers = paper_count, "Venue data loaded");
        self.notifier.lifecycle(ConsoleEvent::LoadCompleted {
            load_id,
            paper_count,
            timestamp: Utc::now(),
        });

        Ok(LoadOutcome::Loaded {
            load_id,
            paper_count,
        })
    }

    fn discard(&self, load_id: Uuid) -> LoadOutcome {
        debug!(venue_id = %self.venue.venue_id, load_id = %load_id, "Console closed, discarding load");
        self.notifier.lifecycle(ConsoleEvent::LoadDiscarded {
            load_id,
            timestamp: Utc::now(),
        });
        LoadOutcome::Discarded
    }
}
