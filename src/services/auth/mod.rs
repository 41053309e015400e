pub mod hosted;

use async_trait::async_trait;

/// The hosted auth service owns identities; this core only creates,
/// deletes, and re-passwords them on behalf of the admin endpoints.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Creates an identity and returns its id.
    async fn create_user(&self, email: &str, password: &str) -> anyhow::Result<String>;

    async fn delete_user(&self, user_id: &str) -> anyhow::Result<()>;

    async fn set_password(&self, user_id: &str, new_password: &str) -> anyhow::Result<()>;
}
