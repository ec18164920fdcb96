//! API request handlers
//!
//! Handlers for all REST API endpoints. Every action answers with the
//! [`ApiResponse`] envelope: success flag, request id and either data or a
//! human-readable error.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::server::AppState;
use super::sessions::{SessionSlot, StoreError};
use crate::core::{CommitOutcome, CommitReport, Session};
use crate::error::RegistryError;
use crate::excel::{DOWNLOAD_FILE_NAME, XLSX_CONTENT_TYPE};
use crate::types::{parse_date, Category, PendingEdit};

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error answer: status code plus the message shown to the operator
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let status = match &err {
            RegistryError::MissingSheet { .. } | RegistryError::Import(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            RegistryError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
            RegistryError::UnknownVolunteer { .. }
            | RegistryError::UnknownCourse { .. }
            | RegistryError::UnknownCategory(_)
            | RegistryError::Date(_) => StatusCode::BAD_REQUEST,
            RegistryError::SerializationFailure(_)
            | RegistryError::Io(_)
            | RegistryError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::UnknownSession(_) => StatusCode::NOT_FOUND,
            StoreError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(method: &str, path: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Course Registry API Server".to_string(),
        version: state.version.clone(),
        description: "Stage and commit volunteer course completions".to_string(),
        endpoints: vec![
            endpoint("GET", "/health", "Health check endpoint"),
            endpoint("GET", "/version", "Get server version"),
            endpoint("POST", "/api/v1/sessions", "Upload a registry workbook (multipart 'file')"),
            endpoint("GET", "/api/v1/sessions/:id", "Session summary"),
            endpoint("DELETE", "/api/v1/sessions/:id", "Close a session"),
            endpoint("GET", "/api/v1/sessions/:id/volunteers", "Volunteers of ?category="),
            endpoint("GET", "/api/v1/sessions/:id/courses", "Courses of ?category="),
            endpoint("GET", "/api/v1/sessions/:id/table", "Table preview of ?category="),
            endpoint("GET", "/api/v1/sessions/:id/edits", "List pending edits"),
            endpoint("POST", "/api/v1/sessions/:id/edits", "Stage an edit"),
            endpoint("DELETE", "/api/v1/sessions/:id/edits", "Clear all pending edits"),
            endpoint("DELETE", "/api/v1/sessions/:id/edits/:position", "Remove one pending edit"),
            endpoint("POST", "/api/v1/sessions/:id/commit", "Commit pending edits"),
            endpoint("GET", "/api/v1/sessions/:id/download", "Download the saved workbook"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
}

/// GET /health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        sessions: state.sessions.len(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
    }))
}

//==============================================================================
// Sessions
//==============================================================================

#[derive(Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub sheet: String,
    pub rows: usize,
    pub volunteers: usize,
    pub courses: usize,
    pub course_collisions: usize,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub found_sheets: Vec<String>,
    pub categories: Vec<CategorySummary>,
    pub pending_edits: usize,
}

fn summarize(id: &str, session: &Session) -> SessionResponse {
    let categories = Category::ALL
        .iter()
        .map(|&category| {
            let catalog = session.catalog(category);
            CategorySummary {
                category,
                sheet: session.table(category).name.clone(),
                rows: session.table(category).height(),
                volunteers: session.volunteers(category).len(),
                courses: catalog.len(),
                course_collisions: catalog.collisions(),
            }
        })
        .collect();
    SessionResponse {
        session_id: id.to_string(),
        found_sheets: session.found_sheets().to_vec(),
        categories,
        pending_edits: session.pending_edits().len(),
    }
}

/// POST /api/v1/sessions - Upload a workbook and open a session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid upload: {e}")))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid upload: {e}")))?;
            upload = Some(data);
            break;
        }
    }
    let bytes = upload.ok_or_else(|| ApiError::bad_request("Missing 'file' field"))?;

    let slot = SessionSlot::from_upload(&bytes, &state.config)?;
    let mut response = summarize("", &slot.session);
    let id = state.sessions.insert(slot)?;
    response.session_id = id.to_string();

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response))))
}

/// GET /api/v1/sessions/:id - Session summary
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SessionResponse> {
    let response = state
        .sessions
        .with(&id, |slot| summarize(&id, &slot.session))?;
    Ok(Json(ApiResponse::ok(response)))
}

/// Plain acknowledgement of an action
#[derive(Serialize)]
pub struct ActionResponse {
    pub message: String,
    pub pending_edits: usize,
}

/// DELETE /api/v1/sessions/:id - Close a session and release its storage
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ActionResponse> {
    state.sessions.remove(&id)?;
    Ok(Json(ApiResponse::ok(ActionResponse {
        message: "Session closed".to_string(),
        pending_edits: 0,
    })))
}

//==============================================================================
// Selection data
//==============================================================================

#[derive(Deserialize)]
pub struct CategoryQuery {
    pub category: String,
}

#[derive(Serialize)]
pub struct VolunteersResponse {
    pub category: Category,
    pub volunteers: Vec<String>,
}

/// GET /api/v1/sessions/:id/volunteers?category= - Selectable volunteers
pub async fn volunteers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<VolunteersResponse> {
    let category: Category = query.category.parse()?;
    let volunteers = state
        .sessions
        .with(&id, |slot| slot.session.volunteers(category))?;
    Ok(Json(ApiResponse::ok(VolunteersResponse {
        category,
        volunteers,
    })))
}

#[derive(Serialize)]
pub struct CourseEntry {
    pub label: String,
    pub column: String,
}

#[derive(Serialize)]
pub struct CoursesResponse {
    pub category: Category,
    pub courses: Vec<CourseEntry>,
    pub collisions: usize,
}

/// GET /api/v1/sessions/:id/courses?category= - Course labels and columns
pub async fn courses(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<CoursesResponse> {
    let category: Category = query.category.parse()?;
    let catalog = state.sessions.with(&id, |slot| slot.session.catalog(category))?;
    let courses = catalog
        .courses()
        .iter()
        .map(|c| CourseEntry {
            label: c.label.clone(),
            column: c.column.to_string(),
        })
        .collect();
    Ok(Json(ApiResponse::ok(CoursesResponse {
        category,
        courses,
        collisions: catalog.collisions(),
    })))
}

#[derive(Deserialize)]
pub struct TableQuery {
    pub category: String,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct TableResponse {
    pub category: Category,
    pub sheet: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

/// GET /api/v1/sessions/:id/table?category=&limit= - Current table contents
pub async fn table(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<TableQuery>,
) -> ApiResult<TableResponse> {
    let category: Category = query.category.parse()?;
    let limit = query.limit.unwrap_or(usize::MAX);
    let response = state.sessions.with(&id, |slot| {
        let table = slot.session.table(category);
        TableResponse {
            category,
            sheet: table.name.clone(),
            headers: table.column_names().map(str::to_string).collect(),
            rows: table
                .rows()
                .iter()
                .take(limit)
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
            total_rows: table.height(),
        }
    })?;
    Ok(Json(ApiResponse::ok(response)))
}

//==============================================================================
// Pending edits
//==============================================================================

#[derive(Serialize)]
pub struct EditEntry {
    pub position: usize,
    pub category: Category,
    pub volunteer: String,
    pub course_column: String,
    pub course: String,
    pub date: NaiveDate,
    pub description: String,
}

fn edit_entry(session: &Session, position: usize, edit: &PendingEdit) -> EditEntry {
    EditEntry {
        position,
        category: edit.category,
        volunteer: edit.identity.clone(),
        course_column: edit.course_column.to_string(),
        course: session
            .catalog(edit.category)
            .display_label(&edit.course_column),
        date: edit.date,
        description: session.describe_edit(edit),
    }
}

#[derive(Serialize)]
pub struct EditsResponse {
    pub edits: Vec<EditEntry>,
}

/// GET /api/v1/sessions/:id/edits - Pending edits in staging order
pub async fn list_edits(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<EditsResponse> {
    let edits: Vec<EditEntry> = state.sessions.with(&id, |slot| {
        let session = &slot.session;
        session
            .pending_edits()
            .iter()
            .enumerate()
            .map(|(position, edit)| edit_entry(session, position, edit))
            .collect()
    })?;
    Ok(Json(ApiResponse::ok(EditsResponse { edits })))
}

#[derive(Deserialize)]
pub struct AddEditRequest {
    pub category: String,
    pub volunteer: String,
    pub course: String,
    pub date: String,
}

#[derive(Serialize)]
pub struct AddEditResponse {
    pub message: String,
    pub edit: EditEntry,
    pub pending_edits: usize,
}

/// POST /api/v1/sessions/:id/edits - Stage an edit
pub async fn add_edit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AddEditRequest>,
) -> ApiResult<AddEditResponse> {
    let category: Category = req.category.parse()?;
    let date = parse_date(&req.date)?;

    let response = state.sessions.with(&id, |slot| {
        let session = &mut slot.session;
        let edit = session.add_edit(category, &req.volunteer, &req.course, date)?;
        let pending = session.pending_edits().len();
        Ok::<_, RegistryError>(AddEditResponse {
            message: format!("Course {} added for {}", req.course, req.volunteer),
            edit: edit_entry(session, pending - 1, &edit),
            pending_edits: pending,
        })
    })??;
    Ok(Json(ApiResponse::ok(response)))
}

/// DELETE /api/v1/sessions/:id/edits/:position - Remove one pending edit
pub async fn remove_edit(
    State(state): State<Arc<AppState>>,
    Path((id, position)): Path<(String, usize)>,
) -> ApiResult<ActionResponse> {
    let response = state.sessions.with(&id, |slot| {
        let removed = slot.session.remove_edit(position)?;
        Ok::<_, RegistryError>(ActionResponse {
            message: format!("Removed: {}", slot.session.describe_edit(&removed)),
            pending_edits: slot.session.pending_edits().len(),
        })
    })??;
    Ok(Json(ApiResponse::ok(response)))
}

/// DELETE /api/v1/sessions/:id/edits - Clear all pending edits
pub async fn clear_edits(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ActionResponse> {
    state.sessions.with(&id, |slot| slot.session.clear_edits())?;
    Ok(Json(ApiResponse::ok(ActionResponse {
        message: "All pending edits cleared".to_string(),
        pending_edits: 0,
    })))
}

//==============================================================================
// Commit and download
//==============================================================================

#[derive(Serialize)]
pub struct CommitResponse {
    pub committed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CommitReport>,
    pub pending_edits: usize,
}

/// POST /api/v1/sessions/:id/commit - Apply pending edits and save the workbook
pub async fn commit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<CommitResponse> {
    let (outcome, pending) = state.sessions.with(&id, |slot| {
        let sink = slot.sink();
        let outcome = slot.session.commit(&sink);
        (outcome, slot.session.pending_edits().len())
    })?;

    let response = match outcome {
        Ok(CommitOutcome::NothingToCommit) => CommitResponse {
            committed: false,
            message: "No changes to save".to_string(),
            report: None,
            pending_edits: pending,
        },
        Ok(CommitOutcome::Committed(report)) => CommitResponse {
            committed: true,
            message: "All changes have been saved".to_string(),
            report: Some(report),
            pending_edits: pending,
        },
        Err(err) => {
            warn!(session = %id, "commit failed with {} edits pending: {}", pending, err);
            return Err(err.into());
        }
    };
    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/v1/sessions/:id/download - The saved workbook
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state
        .sessions
        .with(&id, |slot| std::fs::read(slot.workbook_path()))?
        .map_err(RegistryError::from)?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_errors_map_to_status() {
        let cases = [
            (
                RegistryError::MissingSheet {
                    role: "ACTIVOS".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                RegistryError::IndexOutOfRange {
                    position: 3,
                    len: 0,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                RegistryError::SerializationFailure("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RegistryError::UnknownCategory("X".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_store_errors_map_to_status() {
        let err = ApiError::from(StoreError::UnknownSession("x".to_string()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Unknown session: x");
    }

    #[test]
    fn test_api_response_err_has_no_data() {
        let response: ApiResponse<String> = ApiResponse::err("boom");
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.request_id.len(), 36);
    }
}
