use std::sync::Arc;

use anyhow::Context;

use crate::accounts::memory::MemoryStore;
use crate::accounts::mongo::MongoStore;
use crate::accounts::services::AccountService;
use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db = db::connect(&config.mongo).await?;
        let store = MongoStore::new(&db, &config.mongo.collection);
        store
            .ensure_indexes()
            .await
            .context("create account indexes")?;

        Ok(Self {
            accounts: AccountService::new(Arc::new(store)),
        })
    }

    /// State backed by the in-memory store, used by tests.
    pub fn in_memory() -> Self {
        Self {
            accounts: AccountService::new(Arc::new(MemoryStore::default())),
        }
    }
}
