use crate::AppState;
use crate::api::error::AppError;
use crate::api::handlers::auth::MessageResponse;
use crate::services::scope::WorkspaceSummary;
use crate::services::workspace_service::{NewWorkspace, PdfChange, WorkspaceChanges};
use crate::utils::auth::Claims;
use crate::utils::validation::{DecodedPdf, decode_pdf_upload, not_blank};
use axum::{
    Extension, Json,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use chrono::{DateTime, Utc};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Reference PDF as sent by the client: a `data:application/pdf;base64,` URL
#[derive(Deserialize, ToSchema)]
pub struct PdfUpload {
    pub name: Option<String>,
    #[serde(default, alias = "type", alias = "contentType")]
    pub content_type: Option<String>,
    pub data: String,
}

impl PdfUpload {
    fn decode(&self, max_size: usize) -> Result<DecodedPdf, AppError> {
        Ok(decode_pdf_upload(
            self.name.as_deref(),
            self.content_type.as_deref(),
            &self.data,
            max_size,
        )?)
    }
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct CreateWorkspaceRequest {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
    pub pdf: Option<PdfUpload>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct UpdateWorkspaceRequest {
    #[validate(custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub description: Option<String>,
    pub pdf: Option<PdfUpload>,
    #[serde(default, alias = "removePdf")]
    pub remove_pdf: bool,
}

#[derive(Serialize, ToSchema)]
pub struct PdfSummary {
    pub name: String,
    pub content_type: String,
    pub size: i64,
    pub url: String,
}

#[derive(Serialize, ToSchema)]
pub struct WorkspaceResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub pdf: Option<PdfSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkspaceSummary> for WorkspaceResponse {
    fn from(w: WorkspaceSummary) -> Self {
        let pdf = w.pdf_size.map(|size| PdfSummary {
            name: w
                .pdf_name
                .clone()
                .unwrap_or_else(|| "reference.pdf".to_string()),
            content_type: w
                .pdf_content_type
                .clone()
                .unwrap_or_else(|| "application/pdf".to_string()),
            size,
            url: format!("/workspaces/{}/pdf", w.id),
        });

        Self {
            id: w.id,
            user_id: w.user_id,
            title: w.title,
            description: w.description,
            pdf,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/workspaces",
    responses(
        (status = 200, description = "Workspaces of the caller, oldest first", body = Vec<WorkspaceResponse>),
        (status = 401, description = "No token provided"),
        (status = 403, description = "Invalid or expired token")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "workspaces"
)]
pub async fn list_workspaces(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<WorkspaceResponse>>, AppError> {
    let workspaces = state.workspace_service.list(&claims.sub).await?;
    Ok(Json(workspaces.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/workspaces",
    request_body = CreateWorkspaceRequest,
    responses(
        (status = 201, description = "Workspace created", body = WorkspaceResponse),
        (status = 400, description = "Blank field or invalid reference PDF"),
        (status = 401, description = "No token provided"),
        (status = 403, description = "Invalid or expired token")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "workspaces"
)]
pub async fn create_workspace(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateWorkspaceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WorkspaceResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let pdf = payload
        .pdf
        .as_ref()
        .map(|upload| upload.decode(state.workspace_service.max_pdf_size()))
        .transpose()?;

    let workspace = state
        .workspace_service
        .create(
            &claims.sub,
            NewWorkspace {
                title: payload.title,
                description: payload.description,
                pdf,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(workspace.into())))
}

#[utoipa::path(
    put,
    path = "/workspaces/{id}",
    params(
        ("id" = String, Path, description = "Workspace ID")
    ),
    request_body = UpdateWorkspaceRequest,
    responses(
        (status = 200, description = "Workspace updated", body = WorkspaceResponse),
        (status = 400, description = "Blank field or invalid reference PDF"),
        (status = 404, description = "Workspace not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "workspaces"
)]
pub async fn update_workspace(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateWorkspaceRequest>, JsonRejection>,
) -> Result<Json<WorkspaceResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let pdf = match (&payload.pdf, payload.remove_pdf) {
        (Some(_), true) => {
            return Err(AppError::Validation(
                "Cannot upload and remove the reference PDF at once".to_string(),
            ));
        }
        (Some(upload), false) => {
            PdfChange::Replace(upload.decode(state.workspace_service.max_pdf_size())?)
        }
        (None, true) => PdfChange::Remove,
        (None, false) => PdfChange::Keep,
    };

    let workspace = state
        .workspace_service
        .update(
            &claims.sub,
            &id,
            WorkspaceChanges {
                title: payload.title,
                description: payload.description,
                pdf,
            },
        )
        .await?;

    Ok(Json(workspace.into()))
}

#[utoipa::path(
    delete,
    path = "/workspaces/{id}",
    params(
        ("id" = String, Path, description = "Workspace ID")
    ),
    responses(
        (status = 200, description = "Workspace and its flashcards deleted", body = MessageResponse),
        (status = 404, description = "Workspace not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "workspaces"
)]
pub async fn delete_workspace(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.workspace_service.delete(&claims.sub, &id).await?;
    Ok(MessageResponse::new("Workspace deleted successfully"))
}

#[utoipa::path(
    get,
    path = "/workspaces/{id}/pdf",
    params(
        ("id" = String, Path, description = "Workspace ID"),
        ("token" = Option<String>, Query, description = "Session token, for clients that cannot set headers")
    ),
    responses(
        (status = 200, description = "Reference PDF bytes", content_type = "application/pdf"),
        (status = 304, description = "Unchanged since the given ETag"),
        (status = 404, description = "Workspace not found or has no reference PDF")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "workspaces"
)]
pub async fn get_workspace_pdf(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let pdf = state.workspace_service.get_pdf(&claims.sub, &id).await?;

    let etag = pdf.checksum.as_ref().map(|c| format!("\"{}\"", c));

    if let Some(etag) = &etag {
        let matches = headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag));
        if matches {
            return Response::builder()
                .status(StatusCode::NOT_MODIFIED)
                .header(header::ETAG, etag)
                .body(Body::empty())
                .map_err(|e| AppError::Internal(e.to_string()));
        }
    }

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &pdf.content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition(&pdf.name))
        .header(header::CONTENT_LENGTH, pdf.data.len())
        .header(header::CACHE_CONTROL, "private, no-cache");
    if let Some(etag) = etag {
        response = response.header(header::ETAG, etag);
    }

    response
        .body(Body::from(pdf.data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// `inline` disposition with an ASCII fallback name and the RFC 5987 form
fn content_disposition(filename: &str) -> String {
    fn header_safe(part: &str, max: usize) -> String {
        part.chars()
            .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
            .take(max)
            .collect()
    }

    // Only the stem is shortened so the extension survives
    let (stem, extension) = filename.rsplit_once('.').unwrap_or((filename, "pdf"));
    let stem = header_safe(stem, 60);
    let extension = match header_safe(extension, 8) {
        ext if ext.is_empty() => "pdf".to_string(),
        ext => ext,
    };
    let fallback_filename = if stem.trim_start_matches('.').is_empty() {
        "reference.pdf".to_string()
    } else {
        format!("{}.{}", stem, extension)
    };

    let encoded_filename = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    )
}
