use async_trait::async_trait;

use super::model::{Account, AccountPatch};
use crate::error::AppError;

/// Persistence contract for accounts. The service only talks to this trait;
/// production uses the Mongo adapter, tests the in-memory one.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account and return the assigned id. Fails with a
    /// conflict when the email already belongs to a live account.
    async fn insert(&self, account: Account) -> Result<String, AppError>;

    /// Point lookup by id, deleted accounts included.
    async fn find_by_id(&self, id: &str) -> Result<Account, AppError>;

    /// Lookup by email among live accounts only.
    async fn find_by_email(&self, email: &str) -> Result<Account, AppError>;

    /// Apply the supplied fields to the account. An empty patch succeeds
    /// without consulting the id.
    async fn update_fields(&self, id: &str, patch: AccountPatch) -> Result<(), AppError>;

    /// Mark the account deleted. Deleting twice succeeds.
    async fn soft_delete(&self, id: &str) -> Result<(), AppError>;
}
