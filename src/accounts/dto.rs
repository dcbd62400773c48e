use serde::{Deserialize, Serialize};

use super::model::Account;

/// Request body for account registration.
#[derive(Debug, Deserialize)]
pub struct RegisterAccount {
    pub email: String,
    pub password: String,
    pub repeat_password: String,
}

/// Credential pair for authentication, taken from query parameters.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for credential rotation. The password pair is optional; an
/// empty or unchanged new password leaves the stored hash alone.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCredentials {
    pub email: Option<String>,
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Request body for partial profile updates. Absent fields stay untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub username: Option<String>,
    #[serde(rename = "avatarURL")]
    pub avatar_url: Option<String>,
    pub sex: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub birthday: Option<i64>,
}

/// Response body for a successful registration.
#[derive(Debug, Serialize)]
pub struct CreatedAccount {
    pub uuid: String,
}

/// Public part of an account returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicAccount {
    #[serde(rename = "uuid")]
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "avatarURL", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<i64>,
}

impl From<Account> for PublicAccount {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            username: account.username,
            avatar_url: account.avatar_url,
            sex: account.sex,
            country: account.country,
            language: account.language,
            birthday: account.birthday,
        }
    }
}
