use mongodb::bson::serde_helpers::hex_string_as_object_id;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Account document as stored in the collection.
///
/// The id travels as a hex string in memory and as an ObjectId on the wire;
/// an empty id is skipped on serialize so the database assigns one on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(
        rename = "_id",
        with = "hex_string_as_object_id",
        skip_serializing_if = "String::is_empty",
        default
    )]
    pub id: String,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String, // Argon2 PHC string, never exposed in JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "avatar", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "lang", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<i64>, // unix seconds
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logout_at: Option<i64>,
    // Status flags are written explicitly so the partial email index sees them.
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Account {
    pub fn new(email: String, password_hash: String) -> Self {
        Self::with_role(email, password_hash, false)
    }

    pub fn new_admin(email: String, password_hash: String) -> Self {
        Self::with_role(email, password_hash, true)
    }

    fn with_role(email: String, password_hash: String, is_admin: bool) -> Self {
        Self {
            id: String::new(),
            email,
            password_hash,
            username: None,
            avatar_url: None,
            sex: None,
            country: None,
            language: None,
            birthday: None,
            created_at: now_unix(),
            login_at: None,
            logout_at: None,
            is_active: true,
            is_admin,
            is_deleted: false,
        }
    }
}

/// Set of fields an update may touch. Only `Some` fields are serialized, so
/// the resulting `$set` document carries exactly what the caller supplied.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "password", skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "avatar", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "lang", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<i64>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.username.is_none()
            && self.avatar_url.is_none()
            && self.sex.is_none()
            && self.country.is_none()
            && self.language.is_none()
            && self.birthday.is_none()
    }
}

fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
