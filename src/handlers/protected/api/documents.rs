// handlers/protected/api/documents.rs - /api/organizations/:slug/documents[/:id]
//
// Metadata lives in `documents`; bytes live in the Supabase Storage bucket
// under `{organization_id}/{document_id}/{file_name}`.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::{document::sanitize_file_name, Document};
use crate::error::{ApiError, ValidationError};
use crate::middleware::{authorize, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// Lifetime of a download link
pub const SIGNED_URL_TTL_SECS: u64 = 60 * 10;

pub async fn list(State(state): State<AppState>, user: AuthUser, ApiPath(slug): ApiPath<String>) -> ApiResult<Vec<Document>> {
    let access = authorize(&state, &user, &slug, Role::Member).await?;
    Ok(ApiResponse::success(state.documents().list(access.organization.id).await?))
}

pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(slug): ApiPath<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Document> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let access = authorize(&state, &user, &slug, Role::Editor).await?;
    let max_bytes = state.config.server.max_upload_bytes;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = sanitize_file_name(field.file_name().unwrap_or("file"));
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, content_type, bytes));
        break;
    }

    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| ValidationError::new("file", "A file field is required"))?;
    if bytes.is_empty() {
        return Err(ValidationError::new("file", "The file is empty").into());
    }
    if bytes.len() > max_bytes {
        return Err(ApiError::payload_too_large(format!(
            "Files may be at most {} bytes",
            max_bytes
        )));
    }

    let id = Uuid::new_v4();
    let organization_id = access.organization.id;
    let document = Document {
        id,
        organization_id,
        uploaded_by: Some(user.id),
        storage_path: Document::storage_path_for(organization_id, id, &file_name),
        file_name,
        content_type,
        size_bytes: bytes.len() as i64,
        created_at: Utc::now(),
    };

    state
        .supabase
        .upload_object(&document.storage_path, bytes.to_vec(), &document.content_type)
        .await?;

    match state.documents().create(&document).await {
        Ok(created) => {
            tracing::info!("Uploaded {} to {}", created.storage_path, access.organization.slug);
            Ok(ApiResponse::created(created))
        }
        Err(e) => {
            if let Err(cleanup) = state.supabase.delete_object(&document.storage_path).await {
                tracing::error!("Orphaned storage object {}: {}", document.storage_path, cleanup);
            }
            Err(e.into())
        }
    }
}

/// Document metadata plus a short-lived signed download URL
pub async fn download(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((slug, document_id)): ApiPath<(String, Uuid)>,
) -> ApiResult<Value> {
    let access = authorize(&state, &user, &slug, Role::Member).await?;
    let document = state.documents().find(access.organization.id, document_id).await?;
    let url = state
        .supabase
        .signed_url(&document.storage_path, SIGNED_URL_TTL_SECS)
        .await?;
    Ok(ApiResponse::success(json!({
        "document": document,
        "url": url,
        "expires_in": SIGNED_URL_TTL_SECS,
    })))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((slug, document_id)): ApiPath<(String, Uuid)>,
) -> ApiResult<()> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;
    let document = state.documents().delete(access.organization.id, document_id).await?;
    if let Err(e) = state.supabase.delete_object(&document.storage_path).await {
        tracing::error!("Failed to delete storage object {}: {}", document.storage_path, e);
    }
    Ok(ApiResponse::no_content())
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Upload exceeds the size limit")
    } else {
        ApiError::bad_request(err.body_text())
    }
}
