use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, patch},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{error::AppError, state::AppState};

use super::dto::{
    CreatedAccount, Credentials, PublicAccount, RegisterAccount, UpdateCredentials, UpdateProfile,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/api/account", get(authenticate).post(register))
        .route(
            "/api/account/:id",
            get(get_account)
                .patch(update_credentials)
                .delete(delete_account),
        )
        .route("/api/account/:id/profile", patch(update_profile))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterAccount>,
) -> Result<(StatusCode, HeaderMap, Json<CreatedAccount>), AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::bad_request("invalid email address"));
    }

    let id = state.accounts.register(payload).await?;
    info!(account_id = %id, "account registered");

    let mut headers = HeaderMap::new();
    headers.insert(
        header::LOCATION,
        format!("/api/account/{id}").parse().unwrap(),
    );
    Ok((StatusCode::CREATED, headers, Json(CreatedAccount { uuid: id })))
}

#[instrument(skip(state, params))]
pub async fn authenticate(
    State(state): State<AppState>,
    Query(mut params): Query<Credentials>,
) -> Result<Json<PublicAccount>, AppError> {
    params.email = params.email.trim().to_lowercase();

    if params.email.is_empty() || params.password.is_empty() {
        warn!("missing email or password query parameter");
        return Err(AppError::bad_request(
            "invalid query parameters email or password",
        ));
    }

    let email = params.email.clone();
    match state.accounts.authenticate(params).await {
        Ok(account) => {
            info!(account_id = %account.id, "account authenticated");
            Ok(Json(PublicAccount::from(account)))
        }
        // Unknown email and wrong password look identical to the caller.
        Err(AppError::NotFound) => {
            warn!(email = %email, "authentication failed");
            Err(AppError::unauthorized("invalid email or password"))
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state))]
pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicAccount>, AppError> {
    let account = state.accounts.get(&id).await?;
    Ok(Json(PublicAccount::from(account)))
}

#[instrument(skip(state, payload))]
pub async fn update_credentials(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut payload): Json<UpdateCredentials>,
) -> Result<StatusCode, AppError> {
    if let Some(email) = payload.email.as_mut() {
        *email = email.trim().to_lowercase();
        if !is_valid_email(email) {
            warn!(email = %email, "invalid email");
            return Err(AppError::bad_request("invalid email address"));
        }
    }

    state.accounts.update_credentials(&id, payload).await?;
    info!(account_id = %id, "account credentials updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProfile>,
) -> Result<StatusCode, AppError> {
    state.accounts.update_profile(&id, payload).await?;
    info!(account_id = %id, "account profile updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.accounts.delete(&id).await?;
    info!(account_id = %id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}
