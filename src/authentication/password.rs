use crate::configuration::AdminSettings;
use crate::utils::{error_chain_fmt, spawn_blocking_task_with_tracing};
use anyhow::Context;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use secrecy::{ExposeSecret, Secret};
use std::fmt::Debug;

#[derive(thiserror::Error)]
pub enum AuthError {
    #[error("Invalid Credentials")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

/// Checks the credentials against the configured admin account.
#[tracing::instrument(name = "Validate admin credentials", skip_all, fields(username = %credentials.username))]
pub async fn validate_credentials(
    admin: &AdminSettings,
    credentials: Credentials,
) -> Result<(), AuthError> {
    const HASHED_PASSWORD_IF_INVALID_USERNAME: &str = "$argon2d$v=19$m=15000,t=2,p=1\
        $QhQyHN2/VvKTi5QYqo+VZA\
        $JkXwR/rdESxDi2DfcCf8lk2U4+ShyN3CXZATJQvP0lg";

    let username_matches = credentials.username == admin.username;
    let expected_password_hash = if username_matches {
        admin.password_hash.clone()
    } else {
        Secret::new(HASHED_PASSWORD_IF_INVALID_USERNAME.to_string())
    };

    // Always verify a hash, the response time must not reveal whether the username exists
    spawn_blocking_task_with_tracing(move || {
        verify_password_hash(credentials.password, expected_password_hash)
    })
    .await
    .context("Failed to spawn blocking task")
    .map_err(AuthError::UnexpectedError)??;

    if username_matches {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials(anyhow::anyhow!("Unknown username")))
    }
}

#[tracing::instrument(name = "Verify password hash", skip_all)]
fn verify_password_hash(
    password: Secret<String>,
    expected_password_hash: Secret<String>,
) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(expected_password_hash.expose_secret())
        .map_err(|e| AuthError::UnexpectedError(anyhow::anyhow!("Invalid stored hash: {}", e)))?;

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &parsed_hash)
        .context("Failed to verify password hash")
        .map_err(AuthError::InvalidCredentials)
}

/// Produces a PHC string suitable for `admin.password_hash`.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params::new(15000, 2, 1, None)
        .map_err(|e| AuthError::UnexpectedError(anyhow::anyhow!(e)))?;
    let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let password_hash = hasher
        .hash_password(password.as_bytes(), salt.as_salt())
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to hash password")?;

    Ok(password_hash.to_string())
}
