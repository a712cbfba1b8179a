//! Store commands.

use scorekeep_core::UserId;
use scorekeep_core::validation::{
    validate_address, validate_email, validate_form, validate_store_name,
};
use scorekeep_web::supabase::{NewStore, Store, SupabaseClient};

use super::CommandError;

/// Raw `stores create` arguments.
pub struct StoreInput {
    pub name: String,
    pub email: String,
    pub address: String,
    pub owner: Option<String>,
}

impl StoreInput {
    /// Run the same rules as the admin create-store form.
    fn into_new_store(self) -> Result<NewStore, CommandError> {
        validate_form([
            validate_store_name(&self.name),
            validate_email(&self.email),
            validate_address(&self.address),
        ])?;

        let owner_id = self
            .owner
            .map(|raw| {
                raw.trim()
                    .parse::<UserId>()
                    .map_err(|_| CommandError::InvalidOwner(raw))
            })
            .transpose()?;

        Ok(NewStore {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            address: self.address.trim().to_string(),
            owner_id,
        })
    }
}

/// Create a store.
///
/// # Errors
///
/// Returns an error if the input is invalid or the insert fails.
pub async fn create(client: &SupabaseClient, input: StoreInput) -> Result<Store, CommandError> {
    let new_store = input.into_new_store()?;

    tracing::info!("Creating store: {}", new_store.name);
    let store = client
        .insert_store(&client.service_token()?, &new_store)
        .await?;

    tracing::info!("Store created successfully! ID: {}", store.id);
    Ok(store)
}
