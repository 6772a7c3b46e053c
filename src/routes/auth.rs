// ABOUTME: Authentication routes for login, signup and logout
// ABOUTME: Issues opaque session cookies and creates role-specific accounts
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::auth::{hash_password, verify_password};
use crate::context::ServerResources;
use crate::errors::{AppError, AppResult};
use crate::middleware::{get_cookie_value, SESSION_COOKIE};
use crate::models::{Professional, ProfessionalStatus, Role, User};
use axum::extract::{Multipart, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<ServerResources>> {
    Router::new()
        .route("/login", get(handle_login_page).post(handle_login))
        .route("/register", get(handle_register_page))
        .route("/customer_signup", post(handle_customer_signup))
        .route("/professional_signup", post(handle_professional_signup))
        .route("/logout", get(handle_logout))
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct LoginResponse {
    user_id: Uuid,
    name: String,
    role: Role,
    /// Dashboard path the client should navigate to after login
    redirect: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SignupResponse {
    user_id: Uuid,
    message: String,
    redirect: String,
}

async fn handle_login_page() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "submit email and password to authenticate"
    }))
}

async fn handle_register_page() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "customer_signup": "/customer_signup",
        "professional_signup": "/professional_signup",
    }))
}

/// Authenticate a user and issue a session cookie.
///
/// Invalid email and invalid password produce the same error so the
/// response does not reveal which accounts exist.
pub(super) async fn handle_login(
    State(resources): State<Arc<ServerResources>>,
    Form(request): Form<LoginRequest>,
) -> AppResult<Response> {
    let user = resources
        .database
        .get_user_by_email(&request.email)
        .await
        .map_err(|e| AppError::database(format!("failed to load user: {e}")))?
        .ok_or_else(|| AppError::auth_invalid("invalid email or password"))?;

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::auth_invalid("invalid email or password"));
    }

    let token = resources.sessions.create_session(&user);

    tracing::info!(user_id = %user.id, role = %user.role.as_str(), "user logged in");

    let body = LoginResponse {
        user_id: user.id,
        name: user.name,
        role: user.role,
        redirect: user.role.dashboard_path().to_owned(),
    };

    let mut response = Json(body).into_response();
    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    response.headers_mut().insert(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| AppError::internal("failed to encode session cookie"))?,
    );
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub(super) struct CustomerSignupRequest {
    name: String,
    email: String,
    password: String,
    mobile: String,
    address: String,
    pincode: String,
}

pub(super) async fn handle_customer_signup(
    State(resources): State<Arc<ServerResources>>,
    Form(request): Form<CustomerSignupRequest>,
) -> AppResult<Json<SignupResponse>> {
    for (value, field) in [
        (&request.name, "name"),
        (&request.email, "email"),
        (&request.password, "password"),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::missing_field(field));
        }
    }

    let existing = resources
        .database
        .get_user_by_email(&request.email)
        .await
        .map_err(|e| AppError::database(format!("failed to check email: {e}")))?;
    if existing.is_some() {
        return Err(AppError::conflict("email already in use"));
    }

    let password_hash = hash_password(&request.password)?;
    let user = User::new(request.name, request.email, password_hash, Role::Customer)
        .with_contact(
            optional(request.address),
            optional(request.pincode),
            optional(request.mobile),
        );

    resources
        .database
        .create_customer(&user)
        .await
        .map_err(|e| AppError::database(format!("failed to create customer: {e}")))?;

    tracing::info!(user_id = %user.id, "customer account created");

    Ok(Json(SignupResponse {
        user_id: user.id,
        message: "account created, please log in".to_owned(),
        redirect: "/login".to_owned(),
    }))
}

/// Register a professional account from a multipart form.
///
/// The form carries the profile fields plus a single PDF credential
/// document; the account starts in pending status until an admin reviews
/// the document.
pub(super) async fn handle_professional_signup(
    State(resources): State<Arc<ServerResources>>,
    mut multipart: Multipart,
) -> AppResult<Json<SignupResponse>> {
    let mut fields = ProfessionalSignupFields::default();
    let mut document: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_input(format!("malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };
        if name == "documents" {
            let file_name = field
                .file_name()
                .map(ToOwned::to_owned)
                .ok_or_else(|| AppError::missing_field("documents"))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::invalid_input(format!("failed to read upload: {e}")))?;
            document = Some((file_name, bytes.to_vec()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::invalid_input(format!("malformed field {name}: {e}")))?;
            fields.set(&name, value);
        }
    }

    let request = fields.validate()?;
    let (file_name, bytes) = document.ok_or_else(|| AppError::missing_field("documents"))?;

    let stored_name = resources.documents.store(&file_name, &bytes).await?;
    match create_professional_account(&resources, request, &stored_name).await {
        Ok(response) => Ok(response),
        Err(e) => {
            // The account was not created; don't keep its credential around
            let _ = resources.documents.remove(&stored_name).await;
            Err(e)
        }
    }
}

/// Account-creation tail of the professional signup: everything that can
/// fail after the credential document has been stored.
async fn create_professional_account(
    resources: &ServerResources,
    request: ProfessionalSignupRequest,
    stored_name: &str,
) -> AppResult<Json<SignupResponse>> {
    let existing = resources
        .database
        .get_user_by_email(&request.email)
        .await
        .map_err(|e| AppError::database(format!("failed to check email: {e}")))?;
    if existing.is_some() {
        return Err(AppError::conflict("email already in use"));
    }

    let password_hash = hash_password(&request.password)?;
    let user = User::new(request.name, request.email, password_hash, Role::Professional)
        .with_contact(
            optional(request.address),
            optional(request.pincode),
            optional(request.mobile),
        );
    let profile = Professional {
        user_id: user.id,
        service_domain: request.service_domain,
        experience: request.experience,
        documents: Some(stored_name.to_owned()),
        status: ProfessionalStatus::Pending,
    };

    resources
        .database
        .create_professional(&user, &profile)
        .await
        .map_err(|e| AppError::database(format!("failed to create professional: {e}")))?;

    tracing::info!(user_id = %user.id, domain = %profile.service_domain, "professional account created");

    Ok(Json(SignupResponse {
        user_id: user.id,
        message: "account created, awaiting admin approval".to_owned(),
        redirect: "/login".to_owned(),
    }))
}

/// Normalize an optional contact field: blank means absent.
fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Accumulates text fields from the professional signup multipart form.
#[derive(Debug, Default)]
struct ProfessionalSignupFields {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    mobile: Option<String>,
    address: Option<String>,
    pincode: Option<String>,
    service_domain: Option<String>,
    experience: Option<String>,
}

struct ProfessionalSignupRequest {
    name: String,
    email: String,
    password: String,
    mobile: String,
    address: String,
    pincode: String,
    service_domain: String,
    experience: i64,
}

impl ProfessionalSignupFields {
    fn set(&mut self, name: &str, value: String) {
        match name {
            "name" => self.name = Some(value),
            "email" => self.email = Some(value),
            "password" => self.password = Some(value),
            "mobile" => self.mobile = Some(value),
            "address" => self.address = Some(value),
            "pincode" => self.pincode = Some(value),
            "service_domain" => self.service_domain = Some(value),
            "experience" => self.experience = Some(value),
            _ => {}
        }
    }

    fn validate(self) -> AppResult<ProfessionalSignupRequest> {
        fn required(value: Option<String>, field: &str) -> AppResult<String> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(AppError::missing_field(field)),
            }
        }

        let experience_raw = required(self.experience, "experience")?;
        let experience: i64 = experience_raw
            .trim()
            .parse()
            .map_err(|_| AppError::invalid_input("experience must be a whole number of years"))?;
        if experience < 0 {
            return Err(AppError::out_of_range("experience", "0 or greater"));
        }

        Ok(ProfessionalSignupRequest {
            name: required(self.name, "name")?,
            email: required(self.email, "email")?,
            password: required(self.password, "password")?,
            mobile: required(self.mobile, "mobile")?,
            address: required(self.address, "address")?,
            pincode: required(self.pincode, "pincode")?,
            service_domain: required(self.service_domain, "service_domain")?,
            experience,
        })
    }
}

/// Revoke the current session and clear the cookie.
///
/// Safe to call without a session; logout is idempotent.
pub(super) async fn handle_logout(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    if let Some(token) = get_cookie_value(&headers, SESSION_COOKIE) {
        resources.sessions.revoke(&token);
    }

    let mut response = Json(serde_json::json!({
        "message": "logged out",
        "redirect": "/login",
    }))
    .into_response();
    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    response.headers_mut().insert(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| AppError::internal("failed to encode session cookie"))?,
    );
    Ok(response)
}
