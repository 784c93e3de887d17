//! Optimistic favorite bookkeeping.

use std::collections::HashMap;

use crate::domain::entities::{Listing, ListingId};

/// A favorite change the UI has already shown and the backend has yet to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoriteIntent {
    pub listing_id: ListingId,
    pub desired: bool,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    latest_seq: u64,
    confirmed: bool,
}

/// Tracks the optimistic favorite view next to what the server last confirmed.
///
/// Only the latest intent per listing decides the outcome: older confirmations
/// update the confirmed state but never the visible one.
#[derive(Debug, Clone, Default)]
pub struct FavoritesState {
    visible: HashMap<ListingId, bool>,
    pending: HashMap<ListingId, Pending>,
    next_seq: u64,
}

impl FavoritesState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_favorite(&self, id: ListingId) -> bool {
        self.visible.get(&id).copied().unwrap_or(false)
    }

    /// Flips the visible state and returns the request to send.
    pub fn toggle(&mut self, id: ListingId) -> FavoriteIntent {
        let current = self.is_favorite(id);
        self.next_seq += 1;
        let seq = self.next_seq;

        self.pending
            .entry(id)
            .and_modify(|pending| pending.latest_seq = seq)
            .or_insert(Pending {
                latest_seq: seq,
                confirmed: current,
            });
        self.visible.insert(id, !current);

        FavoriteIntent {
            listing_id: id,
            desired: !current,
            seq,
        }
    }

    /// Records a successful request. Returns `true` when it was the latest one.
    pub fn confirm(&mut self, intent: FavoriteIntent) -> bool {
        let Some(pending) = self.pending.get_mut(&intent.listing_id) else {
            return false;
        };
        pending.confirmed = intent.desired;

        if pending.latest_seq == intent.seq {
            self.pending.remove(&intent.listing_id);
            true
        } else {
            false
        }
    }

    /// Rolls back a failed latest request.
    ///
    /// Returns `true` when the visible state changed. Failures of superseded
    /// intents are ignored.
    pub fn reject(&mut self, intent: FavoriteIntent) -> bool {
        let Some(pending) = self.pending.get(&intent.listing_id).copied() else {
            return false;
        };
        if pending.latest_seq != intent.seq {
            return false;
        }

        self.pending.remove(&intent.listing_id);
        let previous = self.is_favorite(intent.listing_id);
        self.visible.insert(intent.listing_id, pending.confirmed);
        previous != pending.confirmed
    }

    /// Whether the latest intent for this listing is `intent`.
    #[must_use]
    pub fn is_latest(&self, intent: &FavoriteIntent) -> bool {
        self.pending
            .get(&intent.listing_id)
            .is_some_and(|pending| pending.latest_seq == intent.seq)
    }

    /// Takes server truth for listings without a pending intent.
    pub fn sync_from<'a>(&mut self, listings: impl IntoIterator<Item = &'a Listing>) {
        for listing in listings {
            self.set_known(listing.id(), listing.is_favorite());
        }
    }

    /// Records a known server value unless an intent is pending for it.
    pub fn set_known(&mut self, id: ListingId, favorite: bool) {
        if !self.pending.contains_key(&id) {
            self.visible.insert(id, favorite);
        }
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
