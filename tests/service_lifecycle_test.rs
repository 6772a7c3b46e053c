//! Tests for the service lifecycle state machine at the database layer
//!
//! Covers the catalog booking path, the customer request moderation path,
//! acceptance, review-and-close, administrative closure, and the
//! concurrency contract: every transition is a conditional update with
//! exactly one winner.

use anyhow::Result;
use homeserve::database::Database;
use homeserve::models::{Professional, ProfessionalStatus, Role, Service, ServiceStatus, User};
use tempfile::TempDir;
use uuid::Uuid;

async fn setup_test_database() -> Result<(Database, TempDir)> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite:{}", dir.path().join("test.db").display());
    let db = Database::new(&url).await?;
    db.migrate().await?;
    Ok((db, dir))
}

async fn create_customer(db: &Database, name: &str) -> Result<Uuid> {
    let user = User::new(
        name.to_owned(),
        format!("{name}@example.com"),
        "hash".to_owned(),
        Role::Customer,
    )
    .with_contact(
        Some("12 Elm St".to_owned()),
        Some("560001".to_owned()),
        Some("5550001".to_owned()),
    );
    db.create_customer(&user).await
}

async fn create_professional(db: &Database, name: &str, domain: &str) -> Result<Uuid> {
    let user = User::new(
        name.to_owned(),
        format!("{name}@example.com"),
        "hash".to_owned(),
        Role::Professional,
    );
    let profile = Professional {
        user_id: user.id,
        service_domain: domain.to_owned(),
        experience: 4,
        documents: Some("credentials.pdf".to_owned()),
        status: ProfessionalStatus::Approved,
    };
    db.create_professional(&user, &profile).await
}

fn catalog_plumbing(admin_id: Uuid) -> Service {
    Service::catalog_entry(
        admin_id,
        "Plumbing".to_owned(),
        Some(120.0),
        "Fix leaks and fittings".to_owned(),
        None,
    )
}

#[tokio::test]
async fn test_booking_path_to_completion() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let admin_id = Uuid::new_v4();
    let customer_id = create_customer(&db, "alice").await?;
    let professional_id = create_professional(&db, "bob", "Plumbing").await?;

    let entry = catalog_plumbing(admin_id);
    db.insert_service(&entry).await?;

    assert!(db.book_service(entry.id, customer_id).await?);
    let booked = db.get_service(entry.id).await?.unwrap();
    assert_eq!(booked.status, ServiceStatus::Requested);
    assert_eq!(booked.customer_id, Some(customer_id));

    assert!(db.accept_service(entry.id, professional_id).await?);
    let accepted = db.get_service(entry.id).await?.unwrap();
    assert_eq!(accepted.status, ServiceStatus::InProgress);
    assert_eq!(accepted.professional_id, Some(professional_id));

    assert!(db.complete_service(entry.id, customer_id, 5, "great work").await?);
    let done = db.get_service(entry.id).await?.unwrap();
    assert_eq!(done.status, ServiceStatus::Completed);
    assert_eq!(done.rating, Some(5));
    assert_eq!(done.remarks.as_deref(), Some("great work"));
    Ok(())
}

#[tokio::test]
async fn test_request_moderation_path() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "carol").await?;

    let request = Service::request(
        customer_id,
        "Electrical".to_owned(),
        "Rewire the kitchen".to_owned(),
        Some("9 Oak Ave".to_owned()),
    );
    db.insert_service(&request).await?;
    assert_eq!(
        db.get_service(request.id).await?.unwrap().status,
        ServiceStatus::Pending
    );

    // Approval moves pending to requested and may fix the price
    assert!(db.resolve_request(request.id, Some(80.0), true).await?);
    let approved = db.get_service(request.id).await?.unwrap();
    assert_eq!(approved.status, ServiceStatus::Requested);
    assert_eq!(approved.price, Some(80.0));

    // A second resolution finds nothing pending
    assert!(!db.resolve_request(request.id, None, true).await?);
    Ok(())
}

#[tokio::test]
async fn test_rejected_request_closes() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "dave").await?;

    let request = Service::request(
        customer_id,
        "Cleaning".to_owned(),
        "Deep clean".to_owned(),
        None,
    );
    db.insert_service(&request).await?;

    assert!(db.resolve_request(request.id, None, false).await?);
    let rejected = db.get_service(request.id).await?.unwrap();
    assert_eq!(rejected.status, ServiceStatus::Closed);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_booking_has_one_winner() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let first = create_customer(&db, "eve").await?;
    let second = create_customer(&db, "frank").await?;

    let entry = catalog_plumbing(Uuid::new_v4());
    db.insert_service(&entry).await?;

    let (a, b) = tokio::join!(
        db.book_service(entry.id, first),
        db.book_service(entry.id, second)
    );
    let (a, b) = (a?, b?);
    assert!(a ^ b, "exactly one booking should win");

    let service = db.get_service(entry.id).await?.unwrap();
    let winner = if a { first } else { second };
    assert_eq!(service.customer_id, Some(winner));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_acceptance_has_one_winner() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "gina").await?;
    let first = create_professional(&db, "hank", "Plumbing").await?;
    let second = create_professional(&db, "iris", "Plumbing").await?;

    let entry = catalog_plumbing(Uuid::new_v4());
    db.insert_service(&entry).await?;
    assert!(db.book_service(entry.id, customer_id).await?);

    let (a, b) = tokio::join!(
        db.accept_service(entry.id, first),
        db.accept_service(entry.id, second)
    );
    let (a, b) = (a?, b?);
    assert!(a ^ b, "exactly one acceptance should win");

    let service = db.get_service(entry.id).await?.unwrap();
    let winner = if a { first } else { second };
    assert_eq!(service.professional_id, Some(winner));
    assert_eq!(service.status, ServiceStatus::InProgress);
    Ok(())
}

#[tokio::test]
async fn test_booking_a_claimed_service_fails() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let first = create_customer(&db, "jane").await?;
    let second = create_customer(&db, "kyle").await?;

    let entry = catalog_plumbing(Uuid::new_v4());
    db.insert_service(&entry).await?;
    assert!(db.book_service(entry.id, first).await?);
    assert!(!db.book_service(entry.id, second).await?);
    Ok(())
}

#[tokio::test]
async fn test_acceptance_requires_requested_status() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let professional_id = create_professional(&db, "liam", "Plumbing").await?;

    // Still a catalog entry, never booked
    let entry = catalog_plumbing(Uuid::new_v4());
    db.insert_service(&entry).await?;
    assert!(!db.accept_service(entry.id, professional_id).await?);
    Ok(())
}

#[tokio::test]
async fn test_completion_is_owner_and_state_gated() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let owner = create_customer(&db, "mia").await?;
    let other = create_customer(&db, "noah").await?;
    let professional_id = create_professional(&db, "omar", "Plumbing").await?;

    let entry = catalog_plumbing(Uuid::new_v4());
    db.insert_service(&entry).await?;
    db.book_service(entry.id, owner).await?;

    // Not in progress yet
    assert!(!db.complete_service(entry.id, owner, 4, "early").await?);

    db.accept_service(entry.id, professional_id).await?;

    // Wrong customer
    assert!(!db.complete_service(entry.id, other, 4, "not mine").await?);

    assert!(db.complete_service(entry.id, owner, 4, "solid").await?);
    // Terminal; no second review
    assert!(!db.complete_service(entry.id, owner, 1, "again").await?);
    Ok(())
}

#[tokio::test]
async fn test_rating_bounds_are_enforced() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "pia").await?;
    let professional_id = create_professional(&db, "quinn", "Plumbing").await?;

    let entry = catalog_plumbing(Uuid::new_v4());
    db.insert_service(&entry).await?;
    db.book_service(entry.id, customer_id).await?;
    db.accept_service(entry.id, professional_id).await?;

    assert!(db.complete_service(entry.id, customer_id, 6, "too high").await.is_err());
    assert!(db.complete_service(entry.id, customer_id, -1, "too low").await.is_err());
    // The failed attempts left the service untouched
    assert_eq!(
        db.get_service(entry.id).await?.unwrap().status,
        ServiceStatus::InProgress
    );
    Ok(())
}

#[tokio::test]
async fn test_admin_close_spares_terminal_states() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "rosa").await?;
    let professional_id = create_professional(&db, "sam", "Plumbing").await?;

    let entry = catalog_plumbing(Uuid::new_v4());
    db.insert_service(&entry).await?;
    db.book_service(entry.id, customer_id).await?;
    db.accept_service(entry.id, professional_id).await?;
    db.complete_service(entry.id, customer_id, 3, "ok").await?;

    // Completed is terminal; close must refuse
    assert!(!db.close_service(entry.id).await?);
    assert_eq!(
        db.get_service(entry.id).await?.unwrap().status,
        ServiceStatus::Completed
    );
    Ok(())
}

#[tokio::test]
async fn test_admin_close_covers_open_states() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "tess").await?;

    let request = Service::request(
        customer_id,
        "Painting".to_owned(),
        "Paint the fence".to_owned(),
        None,
    );
    db.insert_service(&request).await?;

    assert!(db.close_service(request.id).await?);
    assert_eq!(
        db.get_service(request.id).await?.unwrap().status,
        ServiceStatus::Closed
    );
    Ok(())
}

#[tokio::test]
async fn test_end_service_skips_pending() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "uma").await?;

    let request = Service::request(
        customer_id,
        "Painting".to_owned(),
        "Paint the shed".to_owned(),
        None,
    );
    db.insert_service(&request).await?;

    // Pending requests belong to the moderation queue, not the active list
    assert!(!db.close_active_service(request.id).await?);

    db.resolve_request(request.id, None, true).await?;
    assert!(db.close_active_service(request.id).await?);
    Ok(())
}

#[tokio::test]
async fn test_customer_search_filters() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "vera").await?;
    let admin_id = Uuid::new_v4();

    let plumbing = catalog_plumbing(admin_id);
    let cleaning = Service::catalog_entry(
        admin_id,
        "Cleaning".to_owned(),
        Some(60.0),
        "Standard clean".to_owned(),
        None,
    );
    db.insert_service(&plumbing).await?;
    db.insert_service(&cleaning).await?;
    db.book_service(cleaning.id, customer_id).await?;

    let unclaimed = db.customer_search(customer_id, None, Some(true)).await?;
    assert_eq!(unclaimed.len(), 1);
    assert_eq!(unclaimed[0].id, plumbing.id);

    let own = db.customer_search(customer_id, None, Some(false)).await?;
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].id, cleaning.id);

    let by_category = db
        .customer_search(customer_id, Some("Plumbing"), None)
        .await?;
    assert_eq!(by_category.len(), 1);

    let none = db
        .customer_search(customer_id, Some("Gardening"), None)
        .await?;
    assert!(none.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_candidate_services_match_domain_and_status() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "wes").await?;
    let admin_id = Uuid::new_v4();

    let plumbing = catalog_plumbing(admin_id);
    let cleaning = Service::catalog_entry(
        admin_id,
        "Cleaning".to_owned(),
        Some(60.0),
        "Standard clean".to_owned(),
        None,
    );
    db.insert_service(&plumbing).await?;
    db.insert_service(&cleaning).await?;
    db.book_service(plumbing.id, customer_id).await?;
    db.book_service(cleaning.id, customer_id).await?;

    let candidates = db.candidate_services("Plumbing").await?;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].service.id, plumbing.id);
    assert_eq!(candidates[0].customer_name, "wes");
    Ok(())
}

#[tokio::test]
async fn test_catalog_categories_are_distinct() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let admin_id = Uuid::new_v4();
    for _ in 0..2 {
        db.insert_service(&catalog_plumbing(admin_id)).await?;
    }
    db.insert_service(&Service::catalog_entry(
        admin_id,
        "Cleaning".to_owned(),
        Some(60.0),
        "Standard clean".to_owned(),
        None,
    ))
    .await?;

    let categories = db.catalog_categories().await?;
    assert_eq!(categories, vec!["Cleaning".to_owned(), "Plumbing".to_owned()]);
    Ok(())
}
