// ABOUTME: Customer-facing routes for browsing, booking and reviewing services
// ABOUTME: Every handler requires an authenticated customer session
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::MessageResponse;
use crate::auth::SessionContext;
use crate::context::ServerResources;
use crate::database::CustomerSummary;
use crate::errors::{AppError, AppResult};
use crate::models::{Role, Service, ServiceWithCustomer};
use crate::permissions::{self, ServiceAction};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Extension, Form, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<ServerResources>> {
    Router::new()
        .route("/customer_dashboard", get(handle_dashboard))
        .route("/customer_search", get(handle_search))
        .route("/customer_summary", get(handle_summary))
        .route("/book_service", post(handle_book_service))
        .route(
            "/service_request",
            get(handle_request_form).post(handle_service_request),
        )
        .route(
            "/close_service/:id",
            get(handle_close_form).post(handle_close_service),
        )
        .route("/view_service/:id", get(handle_view_service))
        .route("/service_details/:id", get(handle_service_details))
}

#[derive(Debug, Serialize)]
pub(super) struct DashboardResponse {
    username: String,
    service_history: Vec<Service>,
}

pub(super) async fn handle_dashboard(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<DashboardResponse>> {
    permissions::require_role(&context, Role::Customer)?;
    let service_history = resources
        .database
        .customer_history(context.user_id)
        .await
        .map_err(|e| AppError::database(format!("failed to load history: {e}")))?;
    Ok(Json(DashboardResponse {
        username: context.display_name,
        service_history,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    /// Category to filter on; absent means any
    service_type: Option<String>,
    /// "current" restricts to unclaimed offerings, "past" to the
    /// customer's own bookings; absent means both
    status: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchResponse {
    services: Vec<Service>,
}

pub(super) async fn handle_search(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    permissions::require_role(&context, Role::Customer)?;

    let category = query
        .service_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let only_unclaimed = match query.status.as_deref().map(str::trim) {
        Some("current") => Some(true),
        Some("past") => Some(false),
        _ => None,
    };

    let services = resources
        .database
        .customer_search(context.user_id, category, only_unclaimed)
        .await
        .map_err(|e| AppError::database(format!("search failed: {e}")))?;
    Ok(Json(SearchResponse { services }))
}

pub(super) async fn handle_summary(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<CustomerSummary>> {
    permissions::require_role(&context, Role::Customer)?;
    let summary = resources
        .database
        .customer_summary(context.user_id)
        .await
        .map_err(|e| AppError::database(format!("failed to compute summary: {e}")))?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub(super) struct BookServiceRequest {
    service_id: Uuid,
}

/// Claim an unowned catalog service for this customer.
///
/// The claim is a conditional update: two customers racing for the same
/// service resolve to exactly one winner, the loser sees a conflict.
pub(super) async fn handle_book_service(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Form(request): Form<BookServiceRequest>,
) -> AppResult<Json<MessageResponse>> {
    permissions::require_role(&context, Role::Customer)?;

    resources
        .database
        .get_service(request.service_id)
        .await
        .map_err(|e| AppError::database(format!("failed to load service: {e}")))?
        .ok_or_else(|| AppError::not_found("service"))?;

    let booked = resources
        .database
        .book_service(request.service_id, context.user_id)
        .await
        .map_err(|e| AppError::database(format!("failed to book service: {e}")))?;
    if !booked {
        return Err(AppError::conflict("service has already been booked"));
    }

    tracing::info!(service_id = %request.service_id, customer_id = %context.user_id, "service booked");
    Ok(Json(MessageResponse::ok("service booked")))
}

#[derive(Debug, Serialize)]
pub(super) struct RequestFormResponse {
    categories: Vec<String>,
}

pub(super) async fn handle_request_form(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<RequestFormResponse>> {
    permissions::require_role(&context, Role::Customer)?;
    let categories = resources
        .database
        .catalog_categories()
        .await
        .map_err(|e| AppError::database(format!("failed to load categories: {e}")))?;
    Ok(Json(RequestFormResponse { categories }))
}

#[derive(Debug, Deserialize)]
pub(super) struct ServiceRequestForm {
    service_type: String,
    description: String,
    address: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ServiceRequestResponse {
    service_id: Uuid,
    message: String,
}

/// File a new service request; it enters the moderation queue as pending.
pub(super) async fn handle_service_request(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Form(form): Form<ServiceRequestForm>,
) -> AppResult<Json<ServiceRequestResponse>> {
    permissions::require_role(&context, Role::Customer)?;

    if form.service_type.trim().is_empty() {
        return Err(AppError::missing_field("service_type"));
    }
    if form.description.trim().is_empty() {
        return Err(AppError::missing_field("description"));
    }

    let address = form
        .address
        .map(|a| a.trim().to_owned())
        .filter(|a| !a.is_empty());
    let service = Service::request(context.user_id, form.service_type, form.description, address);
    resources
        .database
        .insert_service(&service)
        .await
        .map_err(|e| AppError::database(format!("failed to file request: {e}")))?;

    tracing::info!(service_id = %service.id, customer_id = %context.user_id, "service request filed");
    Ok(Json(ServiceRequestResponse {
        service_id: service.id,
        message: "request submitted for admin review".to_owned(),
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct CloseFormResponse {
    service: Service,
    actions: Vec<ServiceAction>,
}

pub(super) async fn handle_close_form(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CloseFormResponse>> {
    permissions::require_role(&context, Role::Customer)?;
    let service = resources
        .database
        .get_service(id)
        .await
        .map_err(|e| AppError::database(format!("failed to load service: {e}")))?
        .ok_or_else(|| AppError::not_found("service"))?;
    permissions::ensure_can_complete(&context, &service)?;

    let actions = permissions::allowed_actions(&context, &service, None);
    Ok(Json(CloseFormResponse { service, actions }))
}

#[derive(Debug, Deserialize)]
pub(super) struct CloseServiceForm {
    rating: String,
    remarks: String,
}

/// Close an in-progress service with a rating and remarks.
pub(super) async fn handle_close_service(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Form(form): Form<CloseServiceForm>,
) -> AppResult<Json<MessageResponse>> {
    permissions::require_role(&context, Role::Customer)?;

    let rating: i64 = form
        .rating
        .trim()
        .parse()
        .map_err(|_| AppError::invalid_input("rating must be a whole number"))?;
    if !(0..=5).contains(&rating) {
        return Err(AppError::out_of_range("rating", "0 through 5"));
    }
    if form.remarks.trim().is_empty() {
        return Err(AppError::missing_field("remarks"));
    }

    let service = resources
        .database
        .get_service(id)
        .await
        .map_err(|e| AppError::database(format!("failed to load service: {e}")))?
        .ok_or_else(|| AppError::not_found("service"))?;
    permissions::ensure_can_complete(&context, &service)?;

    let completed = resources
        .database
        .complete_service(id, context.user_id, rating, form.remarks.trim())
        .await
        .map_err(|e| AppError::database(format!("failed to close service: {e}")))?;
    if !completed {
        return Err(AppError::conflict("service is no longer in progress"));
    }

    tracing::info!(service_id = %id, customer_id = %context.user_id, rating, "service completed");
    Ok(Json(MessageResponse::ok("service closed with review")))
}

#[derive(Debug, Serialize)]
pub(super) struct ViewServiceResponse {
    #[serde(flatten)]
    detail: ServiceWithCustomer,
    /// Actions the viewing role may take on this service
    actions: Vec<ServiceAction>,
}

/// Detail view of a single service, joined with the requesting customer's
/// contact info. Visible to any role with a stake in the service; the
/// response carries the viewer's permitted actions, so a professional sees
/// an accept action on open work in their domain.
pub(super) async fn handle_view_service(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ViewServiceResponse>> {
    let detail = resources
        .database
        .get_service_with_customer(id)
        .await
        .map_err(|e| AppError::database(format!("failed to load service: {e}")))?
        .ok_or_else(|| AppError::not_found("service"))?;
    permissions::ensure_can_view(&context, &detail.service)?;

    let profile = if context.role == Role::Professional {
        resources
            .database
            .get_professional(context.user_id)
            .await
            .map_err(|e| AppError::database(format!("failed to load profile: {e}")))?
    } else {
        None
    };
    let actions = permissions::allowed_actions(&context, &detail.service, profile.as_ref());
    Ok(Json(ViewServiceResponse { detail, actions }))
}

#[derive(Debug, Serialize)]
pub(super) struct ServiceDetailsResponse {
    service: Service,
    /// Whether the owning customer may still review and close it
    can_close: bool,
}

pub(super) async fn handle_service_details(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ServiceDetailsResponse>> {
    permissions::require_role(&context, Role::Customer)?;
    let service = resources
        .database
        .get_service(id)
        .await
        .map_err(|e| AppError::database(format!("failed to load service: {e}")))?
        .ok_or_else(|| AppError::not_found("service"))?;
    if service.customer_id != Some(context.user_id) {
        return Err(AppError::forbidden("not permitted to view this service"));
    }

    let can_close = permissions::ensure_can_complete(&context, &service).is_ok();
    Ok(Json(ServiceDetailsResponse { service, can_close }))
}
