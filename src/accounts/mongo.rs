use std::time::Duration;

use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId, to_document},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tokio::time::timeout;
use tracing::debug;

use super::model::{Account, AccountPatch};
use super::store::AccountStore;
use crate::error::AppError;

const OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Production store backed by a MongoDB collection. Every operation is
/// bounded by [`OP_TIMEOUT`] so a stalled server surfaces as an error
/// instead of a hung request.
#[derive(Clone)]
pub struct MongoStore {
    collection: Collection<Account>,
}

impl MongoStore {
    pub fn new(db: &Database, collection: &str) -> Self {
        Self {
            collection: db.collection(collection),
        }
    }

    /// Unique index on email restricted to live documents, so a soft-deleted
    /// account releases its address for re-registration.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { "is_deleted": false })
                    .build(),
            )
            .build();
        timeout(OP_TIMEOUT, self.collection.create_index(index, None))
            .await
            .map_err(|_| timed_out("create email index"))?
            .map_err(|e| AppError::system(format!("failed to create email index: {e}")))?;
        debug!("email index ensured");
        Ok(())
    }

    fn object_id(id: &str) -> Result<ObjectId, AppError> {
        // An id that does not parse cannot match any document.
        ObjectId::parse_str(id).map_err(|_| AppError::NotFound)
    }
}

#[async_trait]
impl AccountStore for MongoStore {
    async fn insert(&self, account: Account) -> Result<String, AppError> {
        let result = timeout(OP_TIMEOUT, self.collection.insert_one(&account, None))
            .await
            .map_err(|_| timed_out("insert account"))?
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    AppError::bad_request("account with that email already exists")
                } else {
                    AppError::system(format!("failed to insert account: {e}"))
                }
            })?;
        result
            .inserted_id
            .as_object_id()
            .map(|oid| oid.to_hex())
            .ok_or_else(|| AppError::system("inserted id is not an object id"))
    }

    async fn find_by_id(&self, id: &str) -> Result<Account, AppError> {
        let oid = Self::object_id(id)?;
        timeout(OP_TIMEOUT, self.collection.find_one(doc! { "_id": oid }, None))
            .await
            .map_err(|_| timed_out("find account by id"))?
            .map_err(|e| AppError::system(format!("failed to query account by id: {e}")))?
            .ok_or(AppError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<Account, AppError> {
        let filter = doc! { "email": email, "is_deleted": false };
        timeout(OP_TIMEOUT, self.collection.find_one(filter, None))
            .await
            .map_err(|_| timed_out("find account by email"))?
            .map_err(|e| AppError::system(format!("failed to query account by email: {e}")))?
            .ok_or(AppError::NotFound)
    }

    async fn update_fields(&self, id: &str, patch: AccountPatch) -> Result<(), AppError> {
        let set = to_document(&patch)
            .map_err(|e| AppError::system(format!("failed to encode account patch: {e}")))?;
        if set.is_empty() {
            return Ok(());
        }
        let oid = Self::object_id(id)?;

        let result = timeout(
            OP_TIMEOUT,
            self.collection
                .update_one(doc! { "_id": oid }, doc! { "$set": set }, None),
        )
        .await
        .map_err(|_| timed_out("update account fields"))?
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::bad_request("account with that email already exists")
            } else {
                AppError::system(format!("failed to update account: {e}"))
            }
        })?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound);
        }
        debug!(account_id = %id, modified = result.modified_count, "account fields updated");
        Ok(())
    }

    async fn soft_delete(&self, id: &str) -> Result<(), AppError> {
        let oid = Self::object_id(id)?;
        let result = timeout(
            OP_TIMEOUT,
            self.collection
                .update_one(doc! { "_id": oid }, doc! { "$set": { "is_deleted": true } }, None),
        )
        .await
        .map_err(|_| timed_out("soft delete account"))?
        .map_err(|e| AppError::system(format!("failed to soft delete account: {e}")))?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound);
        }
        debug!(account_id = %id, "account soft deleted");
        Ok(())
    }
}

fn timed_out(op: &str) -> AppError {
    AppError::system(format!("{op} timed out after {OP_TIMEOUT:?}"))
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}
