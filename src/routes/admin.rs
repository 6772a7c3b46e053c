// ABOUTME: Admin routes for moderation, catalog management and account control
// ABOUTME: Every handler passes the admin guard before touching data
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::MessageResponse;
use crate::auth::SessionContext;
use crate::context::ServerResources;
use crate::database::PlatformSummary;
use crate::errors::{AppError, AppResult};
use crate::models::{
    CustomerAccount, ProfessionalListing, ProfessionalStatus, Service, ServiceWithCustomer,
};
use crate::permissions::{self, ServiceAction};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Extension, Form, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<ServerResources>> {
    Router::new()
        .route(
            "/admin_dashboard",
            get(handle_dashboard).post(handle_resolve_request),
        )
        .route(
            "/admin_search",
            get(handle_search_form).post(handle_search),
        )
        .route(
            "/admin_service_view/:id",
            get(handle_service_view).post(handle_service_close),
        )
        .route("/admin_summary", get(handle_summary))
        .route(
            "/manage_services",
            get(handle_manage_services).post(handle_close_active),
        )
        .route(
            "/manage_requests",
            get(handle_manage_requests).post(handle_manage_requests_resolve),
        )
        .route("/manage_professionals", get(handle_manage_professionals))
        .route("/delete_professional/:id", get(handle_delete_professional))
        .route("/manage_customers", get(handle_manage_customers))
        .route("/delete_customer/:id", post(handle_delete_customer))
        .route(
            "/new_service",
            get(handle_new_service_form).post(handle_new_service),
        )
        .route("/end_service/:id", post(handle_end_service))
        .route(
            "/approve_professional/:id/:action",
            get(handle_approve_professional),
        )
}

#[derive(Debug, Serialize)]
pub(super) struct DashboardResponse {
    /// Professionals awaiting document review
    pending_professionals: Vec<ProfessionalListing>,
    /// Customer-filed requests awaiting approval
    service_requests: Vec<ServiceWithCustomer>,
}

pub(super) async fn handle_dashboard(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<DashboardResponse>> {
    permissions::require_admin(&context)?;
    let pending_professionals = resources
        .database
        .list_professionals_by_status(ProfessionalStatus::Pending)
        .await
        .map_err(|e| AppError::database(format!("failed to load professionals: {e}")))?;
    let service_requests = resources
        .database
        .pending_requests_with_customers()
        .await
        .map_err(|e| AppError::database(format!("failed to load requests: {e}")))?;
    Ok(Json(DashboardResponse {
        pending_professionals,
        service_requests,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct ResolveRequestForm {
    service_request_id: Uuid,
    /// "accept" or "reject"
    action: String,
}

/// Resolve a pending customer request from the dashboard, without a price
/// adjustment.
pub(super) async fn handle_resolve_request(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Form(form): Form<ResolveRequestForm>,
) -> AppResult<Json<MessageResponse>> {
    permissions::require_admin(&context)?;
    resolve_request(&resources, form.service_request_id, None, &form.action).await
}

async fn resolve_request(
    resources: &ServerResources,
    id: Uuid,
    price: Option<f64>,
    action: &str,
) -> AppResult<Json<MessageResponse>> {
    let approve = match action {
        "accept" | "approve" => true,
        "reject" => false,
        other => {
            return Err(AppError::invalid_input(format!(
                "unknown action '{other}'"
            )))
        }
    };

    resources
        .database
        .get_service(id)
        .await
        .map_err(|e| AppError::database(format!("failed to load service: {e}")))?
        .ok_or_else(|| AppError::not_found("service request"))?;

    let resolved = resources
        .database
        .resolve_request(id, price, approve)
        .await
        .map_err(|e| AppError::database(format!("failed to resolve request: {e}")))?;
    if !resolved {
        return Err(AppError::conflict("request is no longer pending"));
    }

    tracing::info!(service_id = %id, approve, "service request resolved");
    Ok(Json(MessageResponse::ok(if approve {
        "request approved"
    } else {
        "request rejected"
    })))
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchForm {
    search_input: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchResponse {
    services: Vec<Service>,
}

async fn handle_search_form(
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<SearchResponse>> {
    permissions::require_admin(&context)?;
    Ok(Json(SearchResponse {
        services: Vec::new(),
    }))
}

pub(super) async fn handle_search(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Form(form): Form<SearchForm>,
) -> AppResult<Json<SearchResponse>> {
    permissions::require_admin(&context)?;
    let services = resources
        .database
        .services_by_name(form.search_input.trim())
        .await
        .map_err(|e| AppError::database(format!("search failed: {e}")))?;
    Ok(Json(SearchResponse { services }))
}

#[derive(Debug, Serialize)]
pub(super) struct ServiceViewResponse {
    #[serde(flatten)]
    detail: ServiceWithCustomer,
    actions: Vec<ServiceAction>,
}

pub(super) async fn handle_service_view(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ServiceViewResponse>> {
    permissions::require_admin(&context)?;
    let detail = resources
        .database
        .get_service_with_customer(id)
        .await
        .map_err(|e| AppError::database(format!("failed to load service: {e}")))?
        .ok_or_else(|| AppError::not_found("service"))?;
    let actions = permissions::allowed_actions(&context, &detail.service, None);
    Ok(Json(ServiceViewResponse { detail, actions }))
}

/// Administratively close a service in any non-terminal state.
pub(super) async fn handle_service_close(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    permissions::require_admin(&context)?;
    resources
        .database
        .get_service(id)
        .await
        .map_err(|e| AppError::database(format!("failed to load service: {e}")))?
        .ok_or_else(|| AppError::not_found("service"))?;

    let closed = resources
        .database
        .close_service(id)
        .await
        .map_err(|e| AppError::database(format!("failed to close service: {e}")))?;
    if !closed {
        return Err(AppError::conflict("service has already concluded"));
    }

    tracing::info!(service_id = %id, "service closed by admin");
    Ok(Json(MessageResponse::ok("service closed")))
}

pub(super) async fn handle_summary(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<PlatformSummary>> {
    permissions::require_admin(&context)?;
    let summary = resources
        .database
        .platform_summary()
        .await
        .map_err(|e| AppError::database(format!("failed to compute summary: {e}")))?;
    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
pub(super) struct ManageServicesResponse {
    services: Vec<Service>,
}

pub(super) async fn handle_manage_services(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<ManageServicesResponse>> {
    permissions::require_admin(&context)?;
    let services = resources
        .database
        .list_services()
        .await
        .map_err(|e| AppError::database(format!("failed to list services: {e}")))?;
    Ok(Json(ManageServicesResponse { services }))
}

#[derive(Debug, Deserialize)]
pub(super) struct CloseActiveForm {
    service_id: Uuid,
}

/// Close a requested or in-progress service from the management page.
pub(super) async fn handle_close_active(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Form(form): Form<CloseActiveForm>,
) -> AppResult<Json<MessageResponse>> {
    permissions::require_admin(&context)?;
    close_active(&resources, form.service_id).await
}

pub(super) async fn handle_end_service(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    permissions::require_admin(&context)?;
    close_active(&resources, id).await
}

async fn close_active(
    resources: &ServerResources,
    id: Uuid,
) -> AppResult<Json<MessageResponse>> {
    resources
        .database
        .get_service(id)
        .await
        .map_err(|e| AppError::database(format!("failed to load service: {e}")))?
        .ok_or_else(|| AppError::not_found("service"))?;

    let closed = resources
        .database
        .close_active_service(id)
        .await
        .map_err(|e| AppError::database(format!("failed to close service: {e}")))?;
    if !closed {
        return Err(AppError::conflict("service is not active"));
    }

    tracing::info!(service_id = %id, "active service ended by admin");
    Ok(Json(MessageResponse::ok("service closed")))
}

#[derive(Debug, Serialize)]
pub(super) struct ManageRequestsResponse {
    requests: Vec<ServiceWithCustomer>,
}

pub(super) async fn handle_manage_requests(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<ManageRequestsResponse>> {
    permissions::require_admin(&context)?;
    let requests = resources
        .database
        .pending_requests_with_customers()
        .await
        .map_err(|e| AppError::database(format!("failed to load requests: {e}")))?;
    Ok(Json(ManageRequestsResponse { requests }))
}

#[derive(Debug, Deserialize)]
pub(super) struct ManageRequestForm {
    service_id: Uuid,
    /// Optional price set at approval time; empty means keep the filed price
    price: Option<String>,
    /// "approve" or "reject"
    action: String,
}

/// Resolve a pending request from the management page, optionally fixing
/// its price.
pub(super) async fn handle_manage_requests_resolve(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Form(form): Form<ManageRequestForm>,
) -> AppResult<Json<MessageResponse>> {
    permissions::require_admin(&context)?;

    let price = match form.price.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let value: f64 = raw
                .parse()
                .map_err(|_| AppError::invalid_input("price must be a number"))?;
            if value < 0.0 {
                return Err(AppError::out_of_range("price", "0 or greater"));
            }
            Some(value)
        }
    };

    resolve_request(&resources, form.service_id, price, &form.action).await
}

#[derive(Debug, Serialize)]
pub(super) struct ManageProfessionalsResponse {
    pending: Vec<ProfessionalListing>,
    approved: Vec<ProfessionalListing>,
}

pub(super) async fn handle_manage_professionals(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<ManageProfessionalsResponse>> {
    permissions::require_admin(&context)?;
    let pending = resources
        .database
        .list_professionals_by_status(ProfessionalStatus::Pending)
        .await
        .map_err(|e| AppError::database(format!("failed to load professionals: {e}")))?;
    let approved = resources
        .database
        .list_professionals_by_status(ProfessionalStatus::Approved)
        .await
        .map_err(|e| AppError::database(format!("failed to load professionals: {e}")))?;
    Ok(Json(ManageProfessionalsResponse { pending, approved }))
}

/// Block a professional. Their account and history stay intact, they just
/// lose the ability to accept work.
pub(super) async fn handle_delete_professional(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    permissions::require_admin(&context)?;
    let updated = resources
        .database
        .set_professional_status(id, ProfessionalStatus::Blocked)
        .await
        .map_err(|e| AppError::database(format!("failed to block professional: {e}")))?;
    if !updated {
        return Err(AppError::not_found("professional"));
    }

    tracing::info!(professional_id = %id, "professional blocked");
    Ok(Json(MessageResponse::ok("professional blocked")))
}

#[derive(Debug, Serialize)]
pub(super) struct ManageCustomersResponse {
    customers: Vec<CustomerAccount>,
}

pub(super) async fn handle_manage_customers(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<ManageCustomersResponse>> {
    permissions::require_admin(&context)?;
    let customers = resources
        .database
        .list_customers()
        .await
        .map_err(|e| AppError::database(format!("failed to list customers: {e}")))?;
    Ok(Json(ManageCustomersResponse { customers }))
}

/// Remove a customer account. Their service records survive and render
/// with placeholder contact info.
pub(super) async fn handle_delete_customer(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    permissions::require_admin(&context)?;
    let deleted = resources
        .database
        .delete_customer(id)
        .await
        .map_err(|e| AppError::database(format!("failed to delete customer: {e}")))?;
    if !deleted {
        return Err(AppError::not_found("customer"));
    }

    tracing::info!(customer_id = %id, "customer account deleted");
    Ok(Json(MessageResponse::ok("customer deleted")))
}

#[derive(Debug, Serialize)]
pub(super) struct NewServiceFormResponse {
    /// Existing catalog categories, for reuse in the form
    categories: Vec<String>,
}

async fn handle_new_service_form(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
) -> AppResult<Json<NewServiceFormResponse>> {
    permissions::require_admin(&context)?;
    let categories = resources
        .database
        .catalog_categories()
        .await
        .map_err(|e| AppError::database(format!("failed to load categories: {e}")))?;
    Ok(Json(NewServiceFormResponse { categories }))
}

#[derive(Debug, Deserialize)]
pub(super) struct NewServiceForm {
    service_name: String,
    description: String,
    base_price: String,
    address: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct NewServiceResponse {
    service_id: Uuid,
    message: String,
}

/// Define a new catalog entry customers can book directly.
pub(super) async fn handle_new_service(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Form(form): Form<NewServiceForm>,
) -> AppResult<Json<NewServiceResponse>> {
    permissions::require_admin(&context)?;

    if form.service_name.trim().is_empty() {
        return Err(AppError::missing_field("service_name"));
    }
    if form.description.trim().is_empty() {
        return Err(AppError::missing_field("description"));
    }
    let base_price: f64 = form
        .base_price
        .trim()
        .parse()
        .map_err(|_| AppError::invalid_input("base_price must be a number"))?;
    if base_price < 0.0 {
        return Err(AppError::out_of_range("base_price", "0 or greater"));
    }

    let address = form
        .address
        .map(|a| a.trim().to_owned())
        .filter(|a| !a.is_empty());
    let service = Service::catalog_entry(
        context.user_id,
        form.service_name.trim().to_owned(),
        Some(base_price),
        form.description,
        address,
    );
    resources
        .database
        .insert_service(&service)
        .await
        .map_err(|e| AppError::database(format!("failed to create service: {e}")))?;

    tracing::info!(service_id = %service.id, name = %service.name, "catalog service created");
    Ok(Json(NewServiceResponse {
        service_id: service.id,
        message: "service created".to_owned(),
    }))
}

/// Approve or reject a pending professional after document review.
pub(super) async fn handle_approve_professional(
    State(resources): State<Arc<ServerResources>>,
    Extension(context): Extension<SessionContext>,
    Path((id, action)): Path<(Uuid, String)>,
) -> AppResult<Json<MessageResponse>> {
    permissions::require_admin(&context)?;

    let status = match action.as_str() {
        "accept" | "approve" => ProfessionalStatus::Approved,
        "reject" => ProfessionalStatus::Rejected,
        other => {
            return Err(AppError::invalid_input(format!(
                "unknown action '{other}'"
            )))
        }
    };

    let updated = resources
        .database
        .set_professional_status(id, status)
        .await
        .map_err(|e| AppError::database(format!("failed to update professional: {e}")))?;
    if !updated {
        return Err(AppError::not_found("professional"));
    }

    tracing::info!(professional_id = %id, status = status.as_str(), "professional reviewed");
    Ok(Json(MessageResponse::ok(format!(
        "professional {}",
        status.as_str()
    ))))
}
