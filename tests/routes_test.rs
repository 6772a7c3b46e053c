//! End-to-end tests exercising the HTTP surface through the router
//!
//! Each test stands up the full application over a temp-file SQLite
//! database and drives it with in-memory requests: session cookies, form
//! bodies and multipart signups, exactly as a browser client would.

use anyhow::{anyhow, Result};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use homeserve::auth::{hash_password, SessionManager};
use homeserve::config::environment::ServerConfig;
use homeserve::context::ServerResources;
use homeserve::database::Database;
use homeserve::routes;
use homeserve::uploads::DocumentStore;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin";

async fn setup_app() -> Result<(Router, TempDir)> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite:{}", dir.path().join("test.db").display());
    let database = Database::new(&url).await?;
    database.migrate().await?;

    let admin_hash = hash_password(ADMIN_PASSWORD)?;
    database.seed_default_admin(ADMIN_EMAIL, &admin_hash).await?;

    let documents = DocumentStore::new(dir.path().join("uploads")).await?;
    let sessions = SessionManager::new(64);
    let config = ServerConfig::from_env()?;
    let resources = Arc::new(ServerResources::new(database, sessions, documents, config));
    Ok((routes::router(resources), dir))
}

async fn read_json(response: axum::response::Response) -> Result<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

fn form_request(uri: &str, cookie: Option<&str>, pairs: &[(&str, &str)]) -> Result<Request<Body>> {
    let body = serde_urlencoded::to_string(pairs)?;
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    Ok(builder.body(Body::from(body))?)
}

fn get_request(uri: &str, cookie: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    Ok(builder.body(Body::empty())?)
}

/// Log in and return the session cookie pair from the Set-Cookie header.
async fn login(app: &Router, email: &str, password: &str) -> Result<String> {
    let response = app
        .clone()
        .oneshot(form_request(
            "/login",
            None,
            &[("email", email), ("password", password)],
        )?)
        .await?;
    if response.status() != StatusCode::OK {
        return Err(anyhow!("login failed with {}", response.status()));
    }
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .ok_or_else(|| anyhow!("no session cookie issued"))?
        .to_str()?;
    let pair = set_cookie
        .split(';')
        .next()
        .ok_or_else(|| anyhow!("malformed cookie"))?;
    Ok(pair.to_owned())
}

async fn signup_customer(app: &Router, name: &str) -> Result<()> {
    let response = app
        .clone()
        .oneshot(form_request(
            "/customer_signup",
            None,
            &[
                ("name", name),
                ("email", &format!("{name}@example.com")),
                ("password", "secret"),
                ("mobile", "5550100"),
                ("address", "4 Pine Ct"),
                ("pincode", "560004"),
            ],
        )?)
        .await?;
    if response.status() != StatusCode::OK {
        return Err(anyhow!("signup failed with {}", response.status()));
    }
    Ok(())
}

const MULTIPART_BOUNDARY: &str = "----homeserve-test-boundary";

fn multipart_signup_body(name: &str, domain: &str, file_name: &str) -> Vec<u8> {
    let mut body = Vec::new();
    let fields = [
        ("name", name.to_owned()),
        ("email", format!("{name}@example.com")),
        ("password", "secret".to_owned()),
        ("mobile", "5550200".to_owned()),
        ("address", "8 Ash Ln".to_owned()),
        ("pincode", "560005".to_owned()),
        ("service_domain", domain.to_owned()),
        ("experience", "6".to_owned()),
    ];
    for (key, value) in &fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{key}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"documents\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"%PDF-1.4 test credential");
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

async fn signup_professional(app: &Router, name: &str, domain: &str) -> Result<Value> {
    let request = Request::builder()
        .method("POST")
        .uri("/professional_signup")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(multipart_signup_body(name, domain, "license.pdf")))?;
    let response = app.clone().oneshot(request).await?;
    if response.status() != StatusCode::OK {
        return Err(anyhow!("professional signup failed with {}", response.status()));
    }
    read_json(response).await
}

#[tokio::test]
async fn test_protected_route_requires_session() -> Result<()> {
    let (app, _dir) = setup_app().await?;
    let response = app.oneshot(get_request("/customer_dashboard", None)?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = read_json(response).await?;
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
    assert_eq!(body["error"]["details"]["redirect"], "/login");
    Ok(())
}

#[tokio::test]
async fn test_login_issues_cookie_and_redirect() -> Result<()> {
    let (app, _dir) = setup_app().await?;
    let response = app
        .clone()
        .oneshot(form_request(
            "/login",
            None,
            &[("email", ADMIN_EMAIL), ("password", ADMIN_PASSWORD)],
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()?
        .to_owned();
    assert!(set_cookie.starts_with("session_token="));
    assert!(set_cookie.contains("HttpOnly"));

    let body = read_json(response).await?;
    assert_eq!(body["role"], "admin");
    assert_eq!(body["redirect"], "/admin_dashboard");
    Ok(())
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() -> Result<()> {
    let (app, _dir) = setup_app().await?;

    // Wrong password and unknown email produce the same response
    for (email, password) in [(ADMIN_EMAIL, "wrong"), ("ghost@example.com", "whatever")] {
        let response = app
            .clone()
            .oneshot(form_request(
                "/login",
                None,
                &[("email", email), ("password", password)],
            )?)
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = read_json(response).await?;
        assert_eq!(body["error"]["code"], "AUTH_INVALID");
    }
    Ok(())
}

#[tokio::test]
async fn test_logout_revokes_session() -> Result<()> {
    let (app, _dir) = setup_app().await?;
    let cookie = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await?;

    let response = app
        .clone()
        .oneshot(get_request("/admin_summary", Some(&cookie))?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/logout", Some(&cookie))?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/admin_summary", Some(&cookie))?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_role_guard_refuses_cross_role_access() -> Result<()> {
    let (app, _dir) = setup_app().await?;
    signup_customer(&app, "nina").await?;
    let cookie = login(&app, "nina@example.com", "secret").await?;

    let response = app
        .clone()
        .oneshot(get_request("/admin_summary", Some(&cookie))?)
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(get_request("/professional_dashboard", Some(&cookie))?)
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() -> Result<()> {
    let (app, _dir) = setup_app().await?;
    signup_customer(&app, "omar").await?;

    let response = app
        .clone()
        .oneshot(form_request(
            "/customer_signup",
            None,
            &[
                ("name", "omar"),
                ("email", "omar@example.com"),
                ("password", "secret"),
                ("mobile", ""),
                ("address", ""),
                ("pincode", ""),
            ],
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn test_failed_professional_signup_discards_credential() -> Result<()> {
    let (app, dir) = setup_app().await?;
    signup_professional(&app, "zed", "Plumbing").await?;

    // Same email again: the signup fails after the upload, and the second
    // document must not linger in the asset directory
    let request = Request::builder()
        .method("POST")
        .uri("/professional_signup")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(multipart_signup_body("zed", "Plumbing", "second.pdf")))?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let files: Vec<String> = std::fs::read_dir(dir.path().join("uploads"))?
        .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_>>()?;
    assert_eq!(files, vec!["license.pdf".to_owned()]);
    Ok(())
}

#[tokio::test]
async fn test_professional_signup_rejects_non_pdf() -> Result<()> {
    let (app, _dir) = setup_app().await?;
    let request = Request::builder()
        .method("POST")
        .uri("/professional_signup")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(multipart_signup_body("pete", "Plumbing", "resume.docx")))?;
    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_full_marketplace_flow() -> Result<()> {
    let (app, _dir) = setup_app().await?;

    // Customer files a request for a category the admin has not listed
    signup_customer(&app, "rita").await?;
    let customer = login(&app, "rita@example.com", "secret").await?;
    let response = app
        .clone()
        .oneshot(form_request(
            "/service_request",
            Some(&customer),
            &[
                ("service_type", "Plumbing"),
                ("description", "Burst pipe under the sink"),
                ("address", "21 Lake View"),
            ],
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let service_id = read_json(response).await?["service_id"]
        .as_str()
        .unwrap()
        .to_owned();

    // Professional signs up in that category; admin approves both
    let signup = signup_professional(&app, "saul", "Plumbing").await?;
    let professional_id = signup["user_id"].as_str().unwrap().to_owned();

    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    let dashboard = read_json(
        app.clone()
            .oneshot(get_request("/admin_dashboard", Some(&admin))?)
            .await?,
    )
    .await?;
    assert_eq!(dashboard["pending_professionals"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["service_requests"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/approve_professional/{professional_id}/accept"),
            Some(&admin),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(form_request(
            "/manage_requests",
            Some(&admin),
            &[
                ("service_id", service_id.as_str()),
                ("price", "150"),
                ("action", "approve"),
            ],
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // The approved request shows on the professional's dashboard
    let professional = login(&app, "saul@example.com", "secret").await?;
    let dashboard = read_json(
        app.clone()
            .oneshot(get_request("/professional_dashboard", Some(&professional))?)
            .await?,
    )
    .await?;
    assert_eq!(dashboard["available"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/accept_service/{service_id}"))
                .header(header::COOKIE, &professional)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // Customer reviews and closes the finished work
    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/close_service/{service_id}"),
            Some(&customer),
            &[("rating", "5"), ("remarks", "fast and tidy")],
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let summary = read_json(
        app.clone()
            .oneshot(get_request("/customer_summary", Some(&customer))?)
            .await?,
    )
    .await?;
    assert_eq!(summary["completed"], 1);

    let summary = read_json(
        app.clone()
            .oneshot(get_request("/professional_summary", Some(&professional))?)
            .await?,
    )
    .await?;
    assert_eq!(summary["average_rating"], 5.0);
    Ok(())
}

#[tokio::test]
async fn test_view_service_offers_accept_to_matching_professional() -> Result<()> {
    let (app, _dir) = setup_app().await?;

    signup_customer(&app, "nell").await?;
    let customer = login(&app, "nell@example.com", "secret").await?;
    let response = app
        .clone()
        .oneshot(form_request(
            "/service_request",
            Some(&customer),
            &[
                ("service_type", "Electrical"),
                ("description", "Tripped breaker keeps resetting"),
                ("address", "4 Mill Road"),
            ],
        )?)
        .await?;
    let service_id = read_json(response).await?["service_id"]
        .as_str()
        .unwrap()
        .to_owned();

    let signup = signup_professional(&app, "ada", "Electrical").await?;
    let professional_id = signup["user_id"].as_str().unwrap().to_owned();
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    app.clone()
        .oneshot(get_request(
            &format!("/approve_professional/{professional_id}/accept"),
            Some(&admin),
        )?)
        .await?;
    app.clone()
        .oneshot(form_request(
            "/manage_requests",
            Some(&admin),
            &[
                ("service_id", service_id.as_str()),
                ("price", "90"),
                ("action", "approve"),
            ],
        )?)
        .await?;

    // An approved electrician viewing open electrical work may accept it
    let professional = login(&app, "ada@example.com", "secret").await?;
    let view = read_json(
        app.clone()
            .oneshot(get_request(
                &format!("/view_service/{service_id}"),
                Some(&professional),
            )?)
            .await?,
    )
    .await?;
    let actions = view["actions"].as_array().unwrap();
    assert!(actions.iter().any(|a| a == "accept"));

    // The owning customer sees no accept action on the same service
    let view = read_json(
        app.clone()
            .oneshot(get_request(
                &format!("/view_service/{service_id}"),
                Some(&customer),
            )?)
            .await?,
    )
    .await?;
    let actions = view["actions"].as_array().unwrap();
    assert!(!actions.iter().any(|a| a == "accept"));
    Ok(())
}

#[tokio::test]
async fn test_unapproved_professional_cannot_accept() -> Result<()> {
    let (app, _dir) = setup_app().await?;

    signup_customer(&app, "tara").await?;
    let customer = login(&app, "tara@example.com", "secret").await?;
    let response = app
        .clone()
        .oneshot(form_request(
            "/service_request",
            Some(&customer),
            &[
                ("service_type", "Electrical"),
                ("description", "Replace the fuse box"),
            ],
        )?)
        .await?;
    let service_id = read_json(response).await?["service_id"]
        .as_str()
        .unwrap()
        .to_owned();

    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    app.clone()
        .oneshot(form_request(
            "/manage_requests",
            Some(&admin),
            &[("service_id", service_id.as_str()), ("price", ""), ("action", "approve")],
        )?)
        .await?;

    // Still pending review; acceptance is refused outright
    signup_professional(&app, "ursa", "Electrical").await?;
    let professional = login(&app, "ursa@example.com", "secret").await?;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/accept_service/{service_id}"))
                .header(header::COOKIE, &professional)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_booking_conflict_surfaces_as_409() -> Result<()> {
    let (app, _dir) = setup_app().await?;

    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    let response = app
        .clone()
        .oneshot(form_request(
            "/new_service",
            Some(&admin),
            &[
                ("service_name", "Cleaning"),
                ("description", "Standard clean"),
                ("base_price", "60"),
            ],
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let service_id = read_json(response).await?["service_id"]
        .as_str()
        .unwrap()
        .to_owned();

    signup_customer(&app, "vic").await?;
    signup_customer(&app, "wai").await?;
    let first = login(&app, "vic@example.com", "secret").await?;
    let second = login(&app, "wai@example.com", "secret").await?;

    let response = app
        .clone()
        .oneshot(form_request(
            "/book_service",
            Some(&first),
            &[("service_id", service_id.as_str())],
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(form_request(
            "/book_service",
            Some(&second),
            &[("service_id", service_id.as_str())],
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn test_admin_customer_deletion_keeps_history_visible() -> Result<()> {
    let (app, _dir) = setup_app().await?;

    signup_customer(&app, "yuri").await?;
    let customer = login(&app, "yuri@example.com", "secret").await?;
    let response = app
        .clone()
        .oneshot(form_request(
            "/service_request",
            Some(&customer),
            &[("service_type", "Painting"), ("description", "Hall repaint")],
        )?)
        .await?;
    let service_id = read_json(response).await?["service_id"]
        .as_str()
        .unwrap()
        .to_owned();

    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    let customers = read_json(
        app.clone()
            .oneshot(get_request("/manage_customers", Some(&admin))?)
            .await?,
    )
    .await?;
    let customer_id = customers["customers"][0]["user_id"].as_str().unwrap().to_owned();

    let response = app
        .clone()
        .oneshot(form_request(
            &format!("/delete_customer/{customer_id}"),
            Some(&admin),
            &[],
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // The orphaned service renders with placeholder contact details
    let view = read_json(
        app.clone()
            .oneshot(get_request(
                &format!("/admin_service_view/{service_id}"),
                Some(&admin),
            )?)
            .await?,
    )
    .await?;
    assert_eq!(view["customer_name"], "N/A");
    Ok(())
}
