use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::model::{Account, AccountPatch};
use super::store::AccountStore;
use crate::error::AppError;

/// Map-backed store with the same contract as the Mongo adapter. Lets the
/// service be exercised without a running database.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert(&self, mut account: Account) -> Result<String, AppError> {
        let mut accounts = self.accounts.lock().await;
        if accounts
            .values()
            .any(|a| !a.is_deleted && a.email == account.email)
        {
            return Err(AppError::bad_request(
                "account with that email already exists",
            ));
        }
        let id = Uuid::new_v4().to_string();
        account.id = id.clone();
        accounts.insert(id.clone(), account);
        Ok(id)
    }

    async fn find_by_id(&self, id: &str) -> Result<Account, AppError> {
        self.accounts
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<Account, AppError> {
        self.accounts
            .lock()
            .await
            .values()
            .find(|a| !a.is_deleted && a.email == email)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn update_fields(&self, id: &str, patch: AccountPatch) -> Result<(), AppError> {
        if patch.is_empty() {
            return Ok(());
        }
        let mut accounts = self.accounts.lock().await;
        if !accounts.contains_key(id) {
            return Err(AppError::NotFound);
        }
        if let Some(email) = &patch.email {
            if accounts
                .values()
                .any(|a| a.id != id && !a.is_deleted && &a.email == email)
            {
                return Err(AppError::bad_request(
                    "account with that email already exists",
                ));
            }
        }
        let account = accounts.get_mut(id).ok_or(AppError::NotFound)?;
        if let Some(email) = patch.email {
            account.email = email;
        }
        if let Some(hash) = patch.password_hash {
            account.password_hash = hash;
        }
        if let Some(username) = patch.username {
            account.username = Some(username);
        }
        if let Some(avatar_url) = patch.avatar_url {
            account.avatar_url = Some(avatar_url);
        }
        if let Some(sex) = patch.sex {
            account.sex = Some(sex);
        }
        if let Some(country) = patch.country {
            account.country = Some(country);
        }
        if let Some(language) = patch.language {
            account.language = Some(language);
        }
        if let Some(birthday) = patch.birthday {
            account.birthday = Some(birthday);
        }
        Ok(())
    }

    async fn soft_delete(&self, id: &str) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts.get_mut(id).ok_or(AppError::NotFound)?;
        account.is_deleted = true;
        Ok(())
    }
}
