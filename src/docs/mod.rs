use utoipa::OpenApi;

use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Operational counters for the collaboration hub
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Current hub counters", body = DiagnosticsResponse),
        (status = 401, description = "Missing or invalid service token")
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Announce a created document to global listeners
#[utoipa::path(
    post,
    path = "/api/v1/announce/created",
    request_body = AnnounceCreatedRequest,
    responses(
        (status = 202, description = "Announcement accepted"),
        (status = 401, description = "Missing or invalid service token"),
        (status = 404, description = "Unknown actor", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn announce_created_doc() {}

/// Announce an updated document to global listeners
#[utoipa::path(
    post,
    path = "/api/v1/announce/updated",
    request_body = AnnounceUpdatedRequest,
    responses(
        (status = 202, description = "Announcement accepted"),
        (status = 401, description = "Missing or invalid service token"),
        (status = 404, description = "Unknown actor", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn announce_updated_doc() {}

/// Announce a deleted document to global listeners
#[utoipa::path(
    post,
    path = "/api/v1/announce/deleted",
    request_body = AnnounceDeletedRequest,
    responses(
        (status = 202, description = "Announcement accepted"),
        (status = 401, description = "Missing or invalid service token"),
        (status = 404, description = "Unknown actor", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn announce_deleted_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        announce_created_doc,
        announce_updated_doc,
        announce_deleted_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            DiagnosticsResponse,
            AnnounceCreatedRequest,
            AnnounceUpdatedRequest,
            AnnounceDeletedRequest,
            NoteRecord,
            Collaborator,
            CollabRole,
            FieldChanges,
        )
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
