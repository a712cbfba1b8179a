//! Rating aggregates shown on the dashboards.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use scorekeep_core::{StoreId, UserId, average_rating};

use crate::supabase::{Profile, Rating, Store, StoreWithRatings};

/// Rater label when no profile is visible.
pub const ANONYMOUS_RATER: &str = "Anonymous";

/// A store row as listed on the user and admin dashboards.
#[derive(Debug, Clone)]
pub struct StoreSummary {
    pub id: StoreId,
    pub name: String,
    pub email: String,
    pub address: String,
    /// Mean of all ratings, `0.0` when unrated.
    pub average: f64,
    pub rating_count: usize,
    /// The viewer's own score, if they rated this store.
    pub my_rating: Option<i16>,
}

impl StoreSummary {
    fn from_row(row: StoreWithRatings, viewer: Option<UserId>) -> Self {
        let average = average_rating(row.ratings.iter().map(|r| r.rating));
        let my_rating = viewer.and_then(|viewer| {
            row.ratings
                .iter()
                .find(|r| r.user_id == Some(viewer))
                .map(|r| r.rating)
        });

        Self {
            id: row.store.id,
            name: row.store.name,
            email: row.store.email,
            address: row.store.address,
            average,
            rating_count: row.ratings.len(),
            my_rating,
        }
    }
}

/// Summaries for every store, with the viewer's own rating picked out.
#[must_use]
pub fn summarize_stores(rows: Vec<StoreWithRatings>, viewer: Option<UserId>) -> Vec<StoreSummary> {
    rows.into_iter()
        .map(|row| StoreSummary::from_row(row, viewer))
        .collect()
}

/// One rating on the store owner dashboard.
#[derive(Debug, Clone)]
pub struct RaterEntry {
    pub rater: String,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
}

/// A store as its owner sees it.
#[derive(Debug, Clone)]
pub struct OwnerStoreSummary {
    pub store: Store,
    pub average: f64,
    pub total: usize,
    /// Newest first.
    pub ratings: Vec<RaterEntry>,
}

/// Summarize a store's ratings, naming each rater from `profiles`.
///
/// `ratings` are expected newest first and keep that order.
#[must_use]
pub fn summarize_owner_store(
    store: Store,
    ratings: Vec<Rating>,
    profiles: &[Profile],
) -> OwnerStoreSummary {
    let names: HashMap<UserId, &str> = profiles
        .iter()
        .map(|p| (p.user_id, p.name.as_str()))
        .collect();

    let average = average_rating(ratings.iter().map(|r| r.rating));
    let total = ratings.len();
    let ratings = ratings
        .into_iter()
        .map(|r| RaterEntry {
            rater: names
                .get(&r.user_id)
                .map_or(ANONYMOUS_RATER, |name| name)
                .to_string(),
            rating: r.rating,
            created_at: r.created_at,
        })
        .collect();

    OwnerStoreSummary {
        store,
        average,
        total,
        ratings,
    }
}

/// Distinct raters, for a single profile lookup.
#[must_use]
pub fn rater_ids(ratings: &[Rating]) -> Vec<UserId> {
    let mut ids: Vec<UserId> = ratings.iter().map(|r| r.user_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
