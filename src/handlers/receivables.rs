//! HTTP surface for the receivable lifecycle.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{ListParams, ReceivableRequest, ReceivableResponse, StatusPatchParams};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::StatusPatch;
use crate::startup::AppState;

pub async fn create_receivable(
    State(state): State<AppState>,
    Json(request): Json<ReceivableRequest>,
) -> Result<(StatusCode, HeaderMap, Json<ReceivableResponse>), AppError> {
    request.validate()?;

    let created = state.service.create(request.into()).await?;

    let mut headers = HeaderMap::new();
    let location = format!("/receivables/{}", created.id);
    headers.insert(
        header::LOCATION,
        HeaderValue::from_str(&location)
            .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?,
    );

    Ok((StatusCode::CREATED, headers, Json(created.into())))
}

pub async fn get_receivable(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReceivableResponse>, AppError> {
    Ok(Json(state.service.get(id).await?.into()))
}

pub async fn list_receivables(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ReceivableResponse>>, AppError> {
    let receivables = if params.has_blocker == Some(true) {
        state.service.list_blocked().await?
    } else if let Some(status) = params.status {
        state.service.list_by_status(status).await?
    } else {
        state.service.list_all().await?
    };

    Ok(Json(receivables.into_iter().map(Into::into).collect()))
}

pub async fn list_overdue_receivables(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReceivableResponse>>, AppError> {
    let overdue = state.service.list_overdue().await?;
    Ok(Json(overdue.into_iter().map(Into::into).collect()))
}

pub async fn update_receivable(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReceivableRequest>,
) -> Result<Json<ReceivableResponse>, AppError> {
    request.validate()?;
    Ok(Json(state.service.update(id, request.into()).await?.into()))
}

pub async fn patch_receivable_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<StatusPatchParams>,
) -> Result<Json<ReceivableResponse>, AppError> {
    let patch = StatusPatch {
        status: params.status,
        received_date: params.received_date,
        amount_received: params.amount_received,
        blocker_reason: params.blocker_reason,
    };
    Ok(Json(state.service.patch_status(id, patch).await?.into()))
}

pub async fn delete_receivable(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn total_pending_amount(
    State(state): State<AppState>,
) -> Result<Json<Decimal>, AppError> {
    Ok(Json(state.service.total_pending_amount().await?))
}

pub async fn total_overdue_amount(
    State(state): State<AppState>,
) -> Result<Json<Decimal>, AppError> {
    Ok(Json(state.service.total_overdue_amount().await?))
}

pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, String), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("unnamed").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read file: {}", e)))?;

        if data.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("File is empty")));
        }

        let reference = state.service.add_document(id, &file_name, data.to_vec()).await?;
        tracing::info!(%id, %file_name, uploaded_by = %user.username, "Document attached");
        return Ok((StatusCode::CREATED, reference));
    }

    Err(AppError::BadRequest(anyhow::anyhow!(
        "Missing file field in multipart body"
    )))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.service.document_references(id).await?))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path((id, reference)): Path<(Uuid, String)>,
) -> Result<StatusCode, AppError> {
    state.service.remove_document(id, &reference).await?;
    Ok(StatusCode::NO_CONTENT)
}
