//! Side-effect hooks run by [`crate::service::EntityService`] before writes.

use academy_core::types::DbId;
use academy_db::entity::HasSecret;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;

use crate::error::{AppError, AppResult};

/// Named hook points around create and update.
///
/// Both default to passing the DTO through unchanged. A hook runs to
/// completion before the write it precedes.
#[async_trait]
pub trait EntityHooks<C, U>: Send + Sync + 'static
where
    C: Send + 'static,
    U: Send + 'static,
{
    async fn before_create(&self, input: C) -> AppResult<C> {
        Ok(input)
    }

    async fn before_update(&self, _id: DbId, input: U) -> AppResult<U> {
        Ok(input)
    }
}

/// No side effects.
pub struct NoHooks;

impl<C, U> EntityHooks<C, U> for NoHooks
where
    C: Send + 'static,
    U: Send + 'static,
{
}

/// Replaces a DTO's plaintext secret with an Argon2id PHC hash.
pub struct SecretHashing;

#[async_trait]
impl<C, U> EntityHooks<C, U> for SecretHashing
where
    C: HasSecret + Send + 'static,
    U: HasSecret + Send + 'static,
{
    async fn before_create(&self, input: C) -> AppResult<C> {
        hash_secret(input).await
    }

    async fn before_update(&self, _id: DbId, input: U) -> AppResult<U> {
        hash_secret(input).await
    }
}

async fn hash_secret<T: HasSecret + Send + 'static>(mut input: T) -> AppResult<T> {
    let Some(plain) = input.secret_mut().map(std::mem::take) else {
        return Ok(input);
    };

    // CPU-bound: hash on the blocking pool.
    let hash = tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| AppError::InternalError(format!("Hashing task failed: {e}")))?
        .map_err(|e| AppError::InternalError(format!("Failed to hash secret: {e}")))?;

    if let Some(secret) = input.secret_mut() {
        *secret = hash;
    }
    Ok(input)
}

/// Hash a plaintext secret using Argon2id with a random salt.
///
/// Returns the PHC-formatted hash string (includes algorithm, params, salt, and hash).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext secret against a stored PHC-formatted Argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}
