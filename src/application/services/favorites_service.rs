//! Optimistic favorite toggling backed by the marketplace API.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::domain::entities::{AuthToken, Listing, ListingId};
use crate::domain::errors::ApiError;
use crate::domain::favorites::{FavoriteIntent, FavoritesState};
use crate::domain::ports::MarketplaceDataPort;

/// Result of sending a favorite change to the backend.
#[derive(Debug)]
pub enum CommitOutcome {
    /// The backend accepted the latest intent.
    Confirmed,
    /// The latest intent failed and the visible state was restored.
    RolledBack(ApiError),
    /// A newer intent for the same listing superseded this one.
    Stale,
}

/// Shared between the UI loop, which toggles, and the backend worker, which commits.
#[derive(Clone)]
pub struct FavoritesService {
    state: Arc<Mutex<FavoritesState>>,
    port: Arc<dyn MarketplaceDataPort>,
}

impl FavoritesService {
    #[must_use]
    pub fn new(port: Arc<dyn MarketplaceDataPort>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FavoritesState::new())),
            port,
        }
    }

    fn state(&self) -> MutexGuard<'_, FavoritesState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_favorite(&self, id: ListingId) -> bool {
        self.state().is_favorite(id)
    }

    /// Flips the visible state right away and returns the intent to commit.
    pub fn toggle(&self, id: ListingId) -> FavoriteIntent {
        let intent = self.state().toggle(id);
        debug!(listing_id = %id, desired = intent.desired, seq = intent.seq, "Favorite toggled");
        intent
    }

    /// Sends the intent and settles the optimistic state.
    pub async fn commit(&self, token: &AuthToken, intent: FavoriteIntent) -> CommitOutcome {
        let result = if intent.desired {
            self.port.add_favorite(token, intent.listing_id).await
        } else {
            self.port.remove_favorite(token, intent.listing_id).await
        };

        let mut state = self.state();
        match result {
            Ok(()) => {
                if state.confirm(intent) {
                    CommitOutcome::Confirmed
                } else {
                    debug!(listing_id = %intent.listing_id, seq = intent.seq, "Superseded favorite confirmed");
                    CommitOutcome::Stale
                }
            }
            Err(e) => {
                if state.is_latest(&intent) {
                    warn!(listing_id = %intent.listing_id, error = %e, "Favorite change failed, rolling back");
                    state.reject(intent);
                    CommitOutcome::RolledBack(e)
                } else {
                    debug!(listing_id = %intent.listing_id, error = %e, "Superseded favorite failed");
                    CommitOutcome::Stale
                }
            }
        }
    }

    /// Takes server truth for listings without pending intents.
    pub fn sync_from<'a>(&self, listings: impl IntoIterator<Item = &'a Listing>) {
        self.state().sync_from(listings);
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state().pending_count()
    }
}
