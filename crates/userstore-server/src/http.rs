//! HTTP surface over a [`UserRepository`].
//!
//! Handlers translate the storage error taxonomy into status codes and
//! run every repository call under the server's shutdown token.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use userstore_core::error::{Operation, StoreError};
use userstore_core::models::user::{CreateUser, User};
use userstore_core::repository::UserRepository;
use userstore_core::with_cancellation;

pub struct AppState<R> {
    pub repo: R,
    pub shutdown: CancellationToken,
}

/// Storage error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub fn status_for(err: &StoreError) -> StatusCode {
    match err {
        StoreError::InvalidIdentifier { .. } => StatusCode::BAD_REQUEST,
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Storage { .. } | StoreError::Cancelled { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        StoreError::Encoding { .. } | StoreError::Decoding { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if self.0.is_fatal() {
            error!(error = %self.0, "Request failed");
        } else if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct Created {
    id: String,
}

pub fn router<R: UserRepository + 'static>(state: Arc<AppState<R>>) -> Router {
    Router::new()
        .route("/users", post(create_user::<R>))
        .route(
            "/users/{id}",
            get(find_user::<R>)
                .put(update_user::<R>)
                .delete(delete_user::<R>),
        )
        .with_state(state)
}

async fn create_user<R: UserRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(input): Json<CreateUser>,
) -> Result<Response, ApiError> {
    let id = with_cancellation(
        &state.shutdown,
        Operation::Create,
        state.repo.create(User::from(input)),
    )
    .await?;

    let location = format!("/users/{id}");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(Created { id }),
    )
        .into_response())
}

async fn find_user<R: UserRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = with_cancellation(&state.shutdown, Operation::FindOne, state.repo.find_one(&id))
        .await?;
    Ok(Json(user))
}

async fn update_user<R: UserRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    Json(input): Json<CreateUser>,
) -> Result<StatusCode, ApiError> {
    let user = User {
        id: Some(id),
        ..User::from(input)
    };
    with_cancellation(&state.shutdown, Operation::Update, state.repo.update(user)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user<R: UserRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    with_cancellation(&state.shutdown, Operation::Delete, state.repo.delete(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
