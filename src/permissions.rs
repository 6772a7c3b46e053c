// ABOUTME: Authorization guard deriving permitted actions from role and ownership
// ABOUTME: All role dispatch is exhaustive matching on the closed Role enum
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Authorization Guard
//!
//! Given the session context and a target service, decide which actions are
//! legal. Admins close any non-terminal service and resolve pending requests
//! and professionals; a professional accepts only a `requested` service in
//! their own domain, and only while approved; a customer closes and reviews
//! only their own `inprogress` service.

use crate::auth::SessionContext;
use crate::errors::{AppError, AppResult};
use crate::models::{Professional, Role, Service, ServiceStatus};
use serde::Serialize;

/// Actions a viewer may take on a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceAction {
    /// Admin: approve a pending request (sets price, moves to `requested`)
    ApproveRequest,
    /// Admin: reject a pending request (moves to `closed`)
    RejectRequest,
    /// Admin or rejecting professional: close a non-terminal service
    Close,
    /// Professional: accept a `requested` service in their domain
    Accept,
    /// Customer: book an unclaimed catalog offering
    Book,
    /// Owning customer: close and review an `inprogress` service
    CompleteReview,
}

/// Require any authenticated role from the set of roles a route serves
pub fn require_role(context: &SessionContext, role: Role) -> AppResult<()> {
    if context.role == role {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "this operation requires the {} role",
            role.as_str()
        )))
    }
}

/// Require administrator privileges
pub fn require_admin(context: &SessionContext) -> AppResult<()> {
    require_role(context, Role::Admin)
}

/// Check whether a professional may accept a service.
///
/// Approval status is enforced here even though the system this replaces
/// skipped the check: a pending, rejected or blocked professional is refused
/// with `Forbidden`, a domain mismatch likewise, and a service that already
/// left `requested` reports `Conflict`.
pub fn ensure_can_accept(professional: &Professional, service: &Service) -> AppResult<()> {
    if !professional.status.can_accept() {
        return Err(AppError::forbidden(format!(
            "professional is {} and may not accept services",
            professional.status.as_str()
        )));
    }
    if professional.service_domain != service.name {
        return Err(AppError::forbidden(format!(
            "service category '{}' does not match professional domain '{}'",
            service.name, professional.service_domain
        )));
    }
    match service.status {
        ServiceStatus::Requested => Ok(()),
        ServiceStatus::InProgress => Err(AppError::conflict("service is already in progress")),
        other => Err(AppError::invalid_input(format!(
            "service is {} and not open for acceptance",
            other.as_str()
        ))),
    }
}

/// Check whether the session holder may close-and-review a service.
/// Only the owning customer may, and only while the work is `inprogress`.
pub fn ensure_can_complete(context: &SessionContext, service: &Service) -> AppResult<()> {
    require_role(context, Role::Customer)?;
    if service.customer_id != Some(context.user_id) {
        return Err(AppError::forbidden(
            "only the requesting customer may review this service",
        ));
    }
    if service.status != ServiceStatus::InProgress {
        return Err(AppError::conflict(format!(
            "service is {} and cannot be reviewed",
            service.status.as_str()
        )));
    }
    Ok(())
}

/// Check whether the session holder may view a service's details.
/// Admins see everything; customers and professionals see services they
/// own a side of.
pub fn ensure_can_view(context: &SessionContext, service: &Service) -> AppResult<()> {
    let allowed = match context.role {
        Role::Admin => true,
        Role::Customer => {
            service.customer_id == Some(context.user_id) || service.customer_id.is_none()
        }
        Role::Professional => {
            service.professional_id == Some(context.user_id)
                || service.status == ServiceStatus::Requested
        }
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::forbidden("not permitted to view this service"))
    }
}

/// Derive the full set of actions this viewer may take on a service.
/// Dispatch is an exhaustive match over the closed role set.
#[must_use]
pub fn allowed_actions(
    context: &SessionContext,
    service: &Service,
    professional: Option<&Professional>,
) -> Vec<ServiceAction> {
    let mut actions = Vec::new();
    match context.role {
        Role::Admin => {
            if service.status == ServiceStatus::Pending {
                actions.push(ServiceAction::ApproveRequest);
                actions.push(ServiceAction::RejectRequest);
            }
            if service.status.is_closable() {
                actions.push(ServiceAction::Close);
            }
        }
        Role::Customer => {
            if service.customer_id.is_none() && !service.status.is_terminal() {
                actions.push(ServiceAction::Book);
            }
            if ensure_can_complete(context, service).is_ok() {
                actions.push(ServiceAction::CompleteReview);
            }
        }
        Role::Professional => {
            if let Some(profile) = professional {
                if ensure_can_accept(profile, service).is_ok() {
                    actions.push(ServiceAction::Accept);
                }
                // A professional may reject work assigned to them while it
                // is still open.
                if service.professional_id == Some(context.user_id)
                    && service.status.is_closable()
                {
                    actions.push(ServiceAction::Close);
                }
            }
        }
    }
    actions
}
