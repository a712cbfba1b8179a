//! Platform totals.

use scorekeep_web::supabase::{SupabaseClient, Table};

use super::CommandError;

/// Row counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub users: u64,
    pub stores: u64,
    pub ratings: u64,
}

/// Count users, stores and ratings concurrently.
///
/// # Errors
///
/// Returns an error if any count fails.
pub async fn collect(client: &SupabaseClient) -> Result<Stats, CommandError> {
    let token = client.service_token()?;
    let (users, stores, ratings) = tokio::try_join!(
        client.count(&token, Table::Profiles),
        client.count(&token, Table::Stores),
        client.count(&token, Table::Ratings),
    )?;

    Ok(Stats {
        users,
        stores,
        ratings,
    })
}

/// Log the platform totals.
///
/// # Errors
///
/// Returns an error if any count fails.
pub async fn print(client: &SupabaseClient) -> Result<(), CommandError> {
    let stats = collect(client).await?;

    tracing::info!("Total users:   {}", stats.users);
    tracing::info!("Total stores:  {}", stats.stores);
    tracing::info!("Total ratings: {}", stats.ratings);
    Ok(())
}
