// ABOUTME: Professional-facing routes for the work queue and acceptance flow
// ABOUTME: Acceptance enforces approval status and category match before assignment
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::MessageResponse;
use crate::auth::SessionContext;
use crate::context::ServerResources;
use crate::database::{AssignmentSearch, ProfessionalSummary};
use crate::errors::{AppError, AppResult};
use crate::models::{Professional, Role, Service, ServiceStatus, ServiceWithCustomer};
use crate::permissions;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Extension, Form, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<ServerResources>> {
    Router::new()
        .route("/professional_dashboard", get(handle_dashboard))
        .route(
            "/professional_search",
            get(handle_search_form).post(handle_search),
        )
        .route("/professional_summary", get(handle_summary))
        .route("/accept_service/:id", post(handle_accept_service))
}

/// Load the caller's professional profile or refuse the request.
async fn load_profile(
    resources: &ServerResources,
    context: &SessionContext,
) -> AppResult<Professional> {
    permissions::require_role(context, Role::Professional)?;
    resources
        .database
        .get_professional(context.user_id)
        .await
        .map_err(|e| AppError::database(format!("failed to load profile: {e}")))?
        .ok_or_else(|| AppError::not_found("professional profile"))
}

#[derive(Debug, Serialize)]
pub(super) struct DashboardResponse {
    username: String,
    service_domain: String,
    status: String,
    /// Work currently assigned to this professional
    active: Vec<ServiceWithCustomer>,
    /// Open requests in this professional's category
    available: Vec<ServiceWithCustomer>,
    /// Finished work with customer reviews
    completed: Vec<ServiceWithCustomer>,
}

pub(super) async fn handle_dashboard(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<DashboardResponse>> {
    let profile = load_profile(&resources, &context).await?;

    let active = resources
        .database
        .assigned_services(context.user_id, ServiceStatus::InProgress)
        .await
        .map_err(|e| AppError::database(format!("failed to load assignments: {e}")))?;
    let available = resources
        .database
        .candidate_services(&profile.service_domain)
        .await
        .map_err(|e| AppError::database(format!("failed to load open requests: {e}")))?;
    let completed = resources
        .database
        .assigned_services(context.user_id, ServiceStatus::Completed)
        .await
        .map_err(|e| AppError::database(format!("failed to load completed work: {e}")))?;

    Ok(Json(DashboardResponse {
        username: context.display_name,
        service_domain: profile.service_domain,
        status: profile.status.as_str().to_owned(),
        active,
        available,
        completed,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchForm {
    search_by: String,
    search_input: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchResponse {
    services: Vec<Service>,
}

async fn handle_search_form(
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<SearchResponse>> {
    permissions::require_role(&context, Role::Professional)?;
    Ok(Json(SearchResponse {
        services: Vec::new(),
    }))
}

/// Search this professional's own assignments by location, customer name
/// or date.
pub(super) async fn handle_search(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Form(form): Form<SearchForm>,
) -> AppResult<Json<SearchResponse>> {
    permissions::require_role(&context, Role::Professional)?;

    let search_by = match form.search_by.trim() {
        "location" => AssignmentSearch::Location,
        "customer_name" => AssignmentSearch::CustomerName,
        "date" => AssignmentSearch::Date,
        other => {
            return Err(AppError::invalid_input(format!(
                "unknown search field '{other}'"
            )))
        }
    };

    let services = resources
        .database
        .search_assignments(context.user_id, search_by, form.search_input.trim())
        .await
        .map_err(|e| AppError::database(format!("search failed: {e}")))?;
    Ok(Json(SearchResponse { services }))
}

pub(super) async fn handle_summary(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<ProfessionalSummary>> {
    load_profile(&resources, &context).await?;
    let summary = resources
        .database
        .professional_summary(context.user_id)
        .await
        .map_err(|e| AppError::database(format!("failed to compute summary: {e}")))?;
    Ok(Json(summary))
}

/// Accept an open request in this professional's category.
///
/// The assignment is a conditional update keyed on the `requested` status,
/// so concurrent acceptances resolve to a single assignee.
pub(super) async fn handle_accept_service(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let profile = load_profile(&resources, &context).await?;

    let service = resources
        .database
        .get_service(id)
        .await
        .map_err(|e| AppError::database(format!("failed to load service: {e}")))?
        .ok_or_else(|| AppError::not_found("service"))?;
    permissions::ensure_can_accept(&profile, &service)?;

    let accepted = resources
        .database
        .accept_service(id, context.user_id)
        .await
        .map_err(|e| AppError::database(format!("failed to accept service: {e}")))?;
    if !accepted {
        return Err(AppError::conflict("service was accepted by someone else"));
    }

    tracing::info!(service_id = %id, professional_id = %context.user_id, "service accepted");
    Ok(Json(MessageResponse::ok("service accepted")))
}
