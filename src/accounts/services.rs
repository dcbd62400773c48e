use std::sync::Arc;

use tracing::{debug, warn};

use super::dto::{Credentials, RegisterAccount, UpdateCredentials, UpdateProfile};
use super::model::{Account, AccountPatch};
use super::password::{self, PasswordError};
use super::store::AccountStore;
use crate::error::AppError;

/// Application-level account operations on top of an [`AccountStore`].
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Register a regular account and return its id.
    pub async fn register(&self, dto: RegisterAccount) -> Result<String, AppError> {
        self.create(dto, false).await
    }

    /// Register an account with the admin flag set.
    pub async fn register_admin(&self, dto: RegisterAccount) -> Result<String, AppError> {
        self.create(dto, true).await
    }

    async fn create(&self, dto: RegisterAccount, is_admin: bool) -> Result<String, AppError> {
        if dto.password != dto.repeat_password {
            return Err(AppError::bad_request(
                "password does not match repeat password",
            ));
        }

        debug!(email = %dto.email, "check whether the email is taken");
        match self.store.find_by_email(&dto.email).await {
            Ok(_) => {
                warn!(email = %dto.email, "email already registered");
                return Err(AppError::bad_request(
                    "account with that email already exists",
                ));
            }
            Err(AppError::NotFound) => {}
            Err(e) => return Err(e.context("failed to check account email")),
        }

        let hash = password::hash_password(&dto.password)
            .map_err(|e| AppError::system(format!("failed to hash password: {e}")))?;
        let account = if is_admin {
            Account::new_admin(dto.email, hash)
        } else {
            Account::new(dto.email, hash)
        };

        // The unique partial index closes the race the pre-check leaves open;
        // a losing concurrent insert reports the same conflict.
        self.store
            .insert(account)
            .await
            .map_err(|e| e.context("failed to create account"))
    }

    /// Authenticate by credential pair. A wrong password surfaces as
    /// `NotFound`, indistinguishable from an unknown email.
    pub async fn authenticate(&self, dto: Credentials) -> Result<Account, AppError> {
        let account = self
            .store
            .find_by_email(&dto.email)
            .await
            .map_err(|e| e.context("failed to load account by email"))?;

        if !account.is_active {
            warn!(account_id = %account.id, "login attempt on inactive account");
            return Err(AppError::NotActive);
        }
        if account.is_deleted {
            warn!(account_id = %account.id, "login attempt on deleted account");
            return Err(AppError::Deleted);
        }

        match password::verify_password(&account.password_hash, &dto.password) {
            Ok(()) => Ok(account),
            Err(PasswordError::Mismatch) => {
                warn!(account_id = %account.id, "password mismatch");
                Err(AppError::NotFound)
            }
            Err(e) => Err(AppError::system(format!("failed to verify password: {e}"))),
        }
    }

    /// Point lookup by id.
    pub async fn get(&self, id: &str) -> Result<Account, AppError> {
        self.store
            .find_by_id(id)
            .await
            .map_err(|e| e.context("failed to load account"))
    }

    /// Rotate credentials. The password component only applies when the new
    /// password is non-empty and differs from the old one; an optional new
    /// email rides along in the same patch.
    pub async fn update_credentials(
        &self,
        id: &str,
        dto: UpdateCredentials,
    ) -> Result<(), AppError> {
        let rotate = !dto.new_password.is_empty() && dto.new_password != dto.old_password;
        let mut patch = AccountPatch {
            email: dto.email,
            ..Default::default()
        };

        if rotate {
            let account = self
                .store
                .find_by_id(id)
                .await
                .map_err(|e| e.context("failed to load account"))?;

            match password::verify_password(&account.password_hash, &dto.old_password) {
                Ok(()) => {}
                Err(PasswordError::Mismatch) => {
                    warn!(account_id = %id, "old password mismatch on rotation");
                    return Err(AppError::bad_request("old password does not match"));
                }
                Err(e) => {
                    return Err(AppError::system(format!("failed to verify password: {e}")))
                }
            }

            let hash = password::hash_password(&dto.new_password)
                .map_err(|e| AppError::system(format!("failed to hash password: {e}")))?;
            patch.password_hash = Some(hash);
            debug!(account_id = %id, "password hash rotated");
        }

        if patch.is_empty() {
            return Ok(());
        }
        self.store
            .update_fields(id, patch)
            .await
            .map_err(|e| e.context("failed to update account credentials"))
    }

    /// Apply a partial profile update. Absent fields stay untouched.
    pub async fn update_profile(&self, id: &str, dto: UpdateProfile) -> Result<(), AppError> {
        let patch = AccountPatch {
            username: dto.username,
            avatar_url: dto.avatar_url,
            sex: dto.sex,
            country: dto.country,
            language: dto.language,
            birthday: dto.birthday,
            ..Default::default()
        };
        if patch.is_empty() {
            return Ok(());
        }
        self.store
            .update_fields(id, patch)
            .await
            .map_err(|e| e.context("failed to update account profile"))
    }

    /// Soft delete. Safe to call repeatedly.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.store
            .soft_delete(id)
            .await
            .map_err(|e| e.context("failed to delete account"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::memory::MemoryStore;
    use async_trait::async_trait;

    fn service() -> (AccountService, MemoryStore) {
        let store = MemoryStore::default();
        (AccountService::new(Arc::new(store.clone())), store)
    }

    fn register_dto(email: &str, password: &str) -> RegisterAccount {
        RegisterAccount {
            email: email.into(),
            password: password.into(),
            repeat_password: password.into(),
        }
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_then_authenticate_returns_the_account() {
        let (service, _) = service();
        let id = service
            .register(register_dto("a@x.com", "p1"))
            .await
            .expect("register");

        let account = service
            .authenticate(credentials("a@x.com", "p1"))
            .await
            .expect("authenticate");
        assert_eq!(account.id, id);
        assert!(!account.is_admin);
    }

    #[tokio::test]
    async fn register_rejects_mismatched_password_pair() {
        let (service, store) = service();
        let dto = RegisterAccount {
            email: "a@x.com".into(),
            password: "p1".into(),
            repeat_password: "p2".into(),
        };

        let err = service.register(dto).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
        assert!(matches!(
            store.find_by_email("a@x.com").await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn register_rejects_taken_email() {
        let (service, _) = service();
        service
            .register(register_dto("a@x.com", "p1"))
            .await
            .expect("first register");

        let err = service
            .register(register_dto("a@x.com", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_plaintext() {
        let (service, store) = service();
        service
            .register(register_dto("a@x.com", "p1"))
            .await
            .expect("register");

        let account = store.find_by_email("a@x.com").await.expect("stored");
        assert_ne!(account.password_hash, "p1");
        assert!(account.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn admin_registration_sets_the_role_flag() {
        let (service, store) = service();
        let id = service
            .register_admin(register_dto("root@x.com", "p1"))
            .await
            .expect("register admin");

        let account = store.find_by_id(&id).await.expect("stored");
        assert!(account.is_admin);
    }

    #[tokio::test]
    async fn authenticate_unknown_email_is_not_found() {
        let (service, _) = service();
        let err = service
            .authenticate(credentials("ghost@x.com", "p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn authenticate_wrong_password_is_not_found() {
        let (service, _) = service();
        service
            .register(register_dto("a@x.com", "p1"))
            .await
            .expect("register");

        let err = service
            .authenticate(credentials("a@x.com", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn authenticate_rejects_inactive_account() {
        let (service, store) = service();
        let mut account = Account::new(
            "a@x.com".into(),
            password::hash_password("p1").expect("hash"),
        );
        account.is_active = false;
        store.insert(account).await.expect("insert");

        let err = service
            .authenticate(credentials("a@x.com", "p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotActive));
    }

    // Returns the same account for every email lookup, regardless of the
    // deleted flag. Exercises the service's own deleted-account gate.
    struct UnfilteredStore {
        account: Account,
    }

    #[async_trait]
    impl AccountStore for UnfilteredStore {
        async fn insert(&self, _account: Account) -> Result<String, AppError> {
            Err(AppError::system("not supported"))
        }

        async fn find_by_id(&self, _id: &str) -> Result<Account, AppError> {
            Err(AppError::NotFound)
        }

        async fn find_by_email(&self, _email: &str) -> Result<Account, AppError> {
            Ok(self.account.clone())
        }

        async fn update_fields(&self, _id: &str, _patch: AccountPatch) -> Result<(), AppError> {
            Ok(())
        }

        async fn soft_delete(&self, _id: &str) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn authenticate_rejects_deleted_account_surfaced_by_the_store() {
        let mut account = Account::new(
            "a@x.com".into(),
            password::hash_password("p1").expect("hash"),
        );
        account.is_deleted = true;
        let service = AccountService::new(Arc::new(UnfilteredStore { account }));

        let err = service
            .authenticate(credentials("a@x.com", "p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Deleted));
    }

    #[tokio::test]
    async fn rotated_password_replaces_the_old_one() {
        let (service, _) = service();
        let id = service
            .register(register_dto("a@x.com", "p1"))
            .await
            .expect("register");
        let account = service
            .authenticate(credentials("a@x.com", "p1"))
            .await
            .expect("login with p1");
        assert_eq!(account.id, id);

        let dto = UpdateCredentials {
            email: None,
            old_password: "p1".into(),
            new_password: "p2".into(),
        };
        service.update_credentials(&id, dto).await.expect("rotate");

        let err = service
            .authenticate(credentials("a@x.com", "p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));

        let account = service
            .authenticate(credentials("a@x.com", "p2"))
            .await
            .expect("login with p2");
        assert_eq!(account.id, id);
    }

    #[tokio::test]
    async fn rotation_rejects_wrong_old_password() {
        let (service, store) = service();
        let id = service
            .register(register_dto("a@x.com", "p1"))
            .await
            .expect("register");
        let before = store.find_by_id(&id).await.expect("stored").password_hash;

        let dto = UpdateCredentials {
            email: None,
            old_password: "wrong".into(),
            new_password: "p2".into(),
        };
        let err = service.update_credentials(&id, dto).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));

        let after = store.find_by_id(&id).await.expect("stored").password_hash;
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn rotation_skips_password_when_new_matches_old() {
        let (service, store) = service();
        let id = service
            .register(register_dto("a@x.com", "p1"))
            .await
            .expect("register");
        let before = store.find_by_id(&id).await.expect("stored").password_hash;

        let dto = UpdateCredentials {
            email: Some("b@x.com".into()),
            old_password: "p1".into(),
            new_password: "p1".into(),
        };
        service.update_credentials(&id, dto).await.expect("update");

        let account = store.find_by_id(&id).await.expect("stored");
        assert_eq!(account.email, "b@x.com");
        assert_eq!(account.password_hash, before);
    }

    #[tokio::test]
    async fn rotation_with_nothing_to_change_is_a_no_op() {
        let (service, _) = service();
        service
            .update_credentials("missing", UpdateCredentials::default())
            .await
            .expect("empty update should succeed");
    }

    #[tokio::test]
    async fn rotation_for_unknown_account_is_not_found() {
        let (service, _) = service();
        let dto = UpdateCredentials {
            email: None,
            old_password: "p1".into(),
            new_password: "p2".into(),
        };
        let err = service.update_credentials("missing", dto).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn delete_twice_succeeds() {
        let (service, _) = service();
        let id = service
            .register(register_dto("a@x.com", "p1"))
            .await
            .expect("register");

        service.delete(&id).await.expect("first delete");
        service.delete(&id).await.expect("second delete");

        let err = service
            .authenticate(credentials("a@x.com", "p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn deleted_email_can_register_again() {
        let (service, _) = service();
        let first = service
            .register(register_dto("a@x.com", "p1"))
            .await
            .expect("first registration");
        service.delete(&first).await.expect("delete");

        let second = service
            .register(register_dto("a@x.com", "p2"))
            .await
            .expect("second registration");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn profile_updates_touch_only_supplied_fields() {
        let (service, _) = service();
        let id = service
            .register(register_dto("a@x.com", "p1"))
            .await
            .expect("register");

        let dto = UpdateProfile {
            username: Some("kira".into()),
            ..Default::default()
        };
        service.update_profile(&id, dto).await.expect("first patch");

        let dto = UpdateProfile {
            country: Some("DE".into()),
            language: Some("de".into()),
            ..Default::default()
        };
        service.update_profile(&id, dto).await.expect("second patch");

        let account = service.get(&id).await.expect("get");
        assert_eq!(account.username.as_deref(), Some("kira"));
        assert_eq!(account.country.as_deref(), Some("DE"));
        assert_eq!(account.language.as_deref(), Some("de"));
        assert!(account.sex.is_none());
        assert_eq!(account.email, "a@x.com");
    }

    #[tokio::test]
    async fn empty_profile_update_is_a_no_op() {
        let (service, _) = service();
        service
            .update_profile("missing", UpdateProfile::default())
            .await
            .expect("empty patch should succeed");
    }

    #[tokio::test]
    async fn get_unknown_account_is_not_found() {
        let (service, _) = service();
        let err = service.get("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
