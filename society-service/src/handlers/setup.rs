use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::dtos::setup::{
    ConfigureRequest, ConfigureResponse, SetPasswordRequest, SetPasswordResponse,
    SetupStatusResponse,
};
use crate::dtos::KeyQuery;
use crate::services::WorkflowError;
use crate::utils::{Payload, Password};
use crate::AppState;

/// GET /society/setup/:society_id?key=
#[tracing::instrument(skip(state, query), fields(society_id = %society_id))]
pub async fn setup_status(
    State(state): State<AppState>,
    Path(society_id): Path<String>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<SetupStatusResponse>, WorkflowError> {
    let status = state
        .workflow
        .setup_status(&society_id, query.key.as_deref())
        .await?;

    Ok(Json(SetupStatusResponse {
        success: true,
        status,
    }))
}

/// POST /society/setup/:society_id/set-password?key=
#[tracing::instrument(skip(state, query, req), fields(society_id = %society_id))]
pub async fn set_password(
    State(state): State<AppState>,
    Path(society_id): Path<String>,
    Query(query): Query<KeyQuery>,
    Payload(req): Payload<SetPasswordRequest>,
) -> Result<Json<SetPasswordResponse>, WorkflowError> {
    let society = state
        .workflow
        .set_password(
            &society_id,
            query.key.as_deref(),
            Password::new(req.password),
            Password::new(req.confirm_password),
        )
        .await?;

    let redirect_to = format!(
        "{}/society/setup/{}/configure?key={}",
        state.config.onboarding.public_base_url, society.society_id, society.admin_secret_key
    );

    Ok(Json(SetPasswordResponse {
        success: true,
        message: "Password set successfully".to_string(),
        redirect_to,
    }))
}

/// POST /society/setup/:society_id/configure?key=
#[tracing::instrument(skip(state, query, req), fields(society_id = %society_id))]
pub async fn configure(
    State(state): State<AppState>,
    Path(society_id): Path<String>,
    Query(query): Query<KeyQuery>,
    Payload(req): Payload<ConfigureRequest>,
) -> Result<Json<ConfigureResponse>, WorkflowError> {
    let amenities = state
        .workflow
        .configure(
            &society_id,
            query.key.as_deref(),
            req.amenities
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
        )
        .await?;

    let message = if amenities.is_empty() {
        "No amenities to configure".to_string()
    } else {
        "Society configured successfully".to_string()
    };

    Ok(Json(ConfigureResponse {
        success: true,
        message,
        amenities: amenities.into_iter().map(Into::into).collect(),
    }))
}
