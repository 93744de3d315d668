use axum::{
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::dtos::society::{
    RegenerateKeyRequest, RegenerateKeyResponse, RegisterSocietyRequest, RegisterSocietyResponse,
};
use crate::dtos::KeyQuery;
use crate::handlers::pages::{confirmation_page, error_page};
use crate::services::{UploadPolicy, UploadedDocument, WorkflowError};
use crate::utils::Payload;
use crate::AppState;

/// Multipart field names accepted for verification documents.
const DOCUMENT_FIELDS: &[&str] = &["verification_documents", "documents"];

/// POST /api/society/register
///
/// Accepts the society fields as JSON, or as a multipart form that may also
/// carry verification documents.
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    request: Request,
) -> Result<impl IntoResponse, WorkflowError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false);

    let (form, documents) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| WorkflowError::Validation(format!("Invalid multipart body: {}", e.body_text())))?;
        read_registration_form(multipart, state.workflow.upload_policy()).await?
    } else {
        let Payload(form) = Payload::<RegisterSocietyRequest>::from_request(request, &state).await?;
        (form, Vec::new())
    };

    let registration = state.workflow.register(form.into(), documents).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterSocietyResponse {
            success: true,
            message: "Society registered successfully. Please check your email to verify your registration."
                .to_string(),
            society_id: registration.society_id,
            admin_secret_key: registration.admin_secret_key,
        }),
    ))
}

async fn read_registration_form(
    mut multipart: Multipart,
    policy: UploadPolicy,
) -> Result<(RegisterSocietyRequest, Vec<UploadedDocument>), WorkflowError> {
    let mut form = RegisterSocietyRequest::default();
    let mut documents = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WorkflowError::Validation(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if DOCUMENT_FIELDS.contains(&name.as_str()) {
            if documents.len() >= policy.max_files {
                return Err(WorkflowError::Validation(format!(
                    "At most {} verification documents may be uploaded",
                    policy.max_files
                )));
            }
            let file_name = field.file_name().unwrap_or("unnamed").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| WorkflowError::Validation(format!("Failed to read file bytes: {}", e)))?
                .to_vec();
            documents.push(UploadedDocument { file_name, data });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| WorkflowError::Validation(format!("Failed to read field {}: {}", name, e)))?;

        match name.as_str() {
            "society_name" => form.society_name = value,
            "city" => form.city = value,
            "address" => form.address = value,
            "email" => form.email = value,
            "contact_number" => form.contact_number = value,
            other => tracing::debug!(field = %other, "Ignoring unknown registration field"),
        }
    }

    Ok((form, documents))
}

/// GET /api/society/verify/:society_id
#[tracing::instrument(skip(state), fields(society_id = %society_id))]
pub async fn verify_email(
    State(state): State<AppState>,
    Path(society_id): Path<String>,
) -> Response {
    match state.workflow.verify_email(&society_id).await {
        Ok(_) => confirmation_page(
            "Email Verified Successfully",
            "Your email has been verified. Your registration is now pending admin approval. \
             You will receive an email once your society is approved.",
        ),
        Err(e) => error_page(e),
    }
}

/// GET /api/society/admin-verify/:society_id?key=
#[tracing::instrument(skip(state, query), fields(society_id = %society_id))]
pub async fn admin_verify(
    State(state): State<AppState>,
    Path(society_id): Path<String>,
    Query(query): Query<KeyQuery>,
) -> Response {
    match state
        .workflow
        .admin_verify(&society_id, query.key.as_deref())
        .await
    {
        Ok(society) => confirmation_page(
            "Society Verified Successfully",
            &format!(
                "{} has been verified. A setup email has been sent to {}.",
                society.society_name, society.email
            ),
        ),
        Err(e) => error_page(e),
    }
}

/// POST /api/society/regenerate-key
#[tracing::instrument(skip_all)]
pub async fn regenerate_key(
    State(state): State<AppState>,
    Payload(req): Payload<RegenerateKeyRequest>,
) -> Result<Json<RegenerateKeyResponse>, WorkflowError> {
    let society = state
        .workflow
        .regenerate_key(&req.society_id, &req.email, &req.previous_key)
        .await?;

    Ok(Json(RegenerateKeyResponse {
        success: true,
        message: "Admin secret key regenerated successfully. Check your email for the new key."
            .to_string(),
        admin_secret_key: society.admin_secret_key,
    }))
}
