use lazy_static::lazy_static;
use tracing::{error, warn};

/// bcrypt work factor for every stored digest.
pub const BCRYPT_COST: u32 = 10;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let hash = bcrypt::hash(plain, BCRYPT_COST).map_err(|e| {
        error!(error = %e, "bcrypt hash_password error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(hash)
}

/// Checks `plain` against a stored digest. A digest that cannot be parsed
/// counts as a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match bcrypt::verify(plain, hash) {
        Ok(ok) => ok,
        Err(e) => {
            warn!(error = %e, "bcrypt verify on malformed digest");
            false
        }
    }
}

/// Runs [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| {
            error!(error = %e, "spawn_blocking join error");
            anyhow::anyhow!(e.to_string())
        })?
}

lazy_static! {
    /// Digest of a throwaway secret, compared against when there is no real
    /// digest so every failed lookup pays one full verify.
    static ref DUMMY_DIGEST: String =
        hash_password("loginkit-no-such-account").unwrap_or_default();
}

/// Spends the same work as a real [`verify_password`] and always fails.
pub async fn verify_dummy_blocking(plain: String) -> anyhow::Result<bool> {
    let digest = DUMMY_DIGEST.clone();
    verify_password_blocking(plain, digest).await?;
    Ok(false)
}

/// Runs [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .map_err(|e| {
            error!(error = %e, "spawn_blocking join error");
            anyhow::anyhow!(e.to_string())
        })
}
