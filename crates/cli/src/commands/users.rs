//! Account commands.

use secrecy::{ExposeSecret, SecretString};
use scorekeep_core::validation::{
    validate_address, validate_email, validate_form, validate_name, validate_password,
    validate_role,
};
use scorekeep_core::{Email, Role, UserId, ValidationError};
use scorekeep_web::supabase::{NewAccount, SupabaseClient};

use super::CommandError;

/// Raw `users create` arguments.
pub struct UserInput {
    pub email: String,
    pub name: String,
    pub address: String,
    pub password: SecretString,
    pub role: String,
}

impl UserInput {
    /// Run the same rules as the admin create-user form.
    fn into_account(self) -> Result<(NewAccount, Role), ValidationError> {
        validate_form([
            validate_name(&self.name),
            validate_email(&self.email),
            validate_address(&self.address),
            validate_password(self.password.expose_secret()),
            validate_role(&self.role),
        ])?;

        let email = Email::parse(&self.email).map_err(|_| ValidationError::EmailInvalid)?;
        let role = self
            .role
            .parse::<Role>()
            .map_err(|_| ValidationError::InvalidRole)?;

        let account = NewAccount {
            email,
            password: self.password,
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
        };
        Ok((account, role))
    }
}

/// Create a pre-confirmed account and give it a role.
///
/// # Errors
///
/// Returns an error if the input is invalid or the backend refuses the
/// account or role.
pub async fn create(client: &SupabaseClient, input: UserInput) -> Result<UserId, CommandError> {
    let (account, role) = input.into_account()?;

    tracing::info!("Creating account: {} ({})", account.email, role);
    let user = client.admin_create_user(&account).await?;
    client
        .set_user_role(&client.service_token()?, user.id, role)
        .await?;

    tracing::info!("Account created successfully! ID: {}, Role: {}", user.id, role);
    Ok(user.id)
}
