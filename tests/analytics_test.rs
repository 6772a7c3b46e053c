//! Tests for the reporting aggregates behind the summary endpoints

use anyhow::Result;
use homeserve::database::Database;
use homeserve::models::{Professional, ProfessionalStatus, Role, Service, User};
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
        experience: 3,
        documents: Some("docs.pdf".to_owned()),
        status: ProfessionalStatus::Approved,
    };
    db.create_professional(&user, &profile).await
}

/// Book a fresh catalog entry through to completion with the given rating.
async fn completed_service(
    db: &Database,
    category: &str,
    customer_id: Uuid,
    professional_id: Uuid,
    rating: i64,
) -> Result<Uuid> {
    let entry = Service::catalog_entry(
        Uuid::new_v4(),
        category.to_owned(),
        Some(100.0),
        "work".to_owned(),
        None,
    );
    db.insert_service(&entry).await?;
    db.book_service(entry.id, customer_id).await?;
    db.accept_service(entry.id, professional_id).await?;
    db.complete_service(entry.id, customer_id, rating, "done").await?;
    Ok(entry.id)
}

#[tokio::test]
async fn test_customer_summary_counts_by_state() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "alma").await?;
    let professional_id = create_professional(&db, "bert", "Plumbing").await?;

    completed_service(&db, "Plumbing", customer_id, professional_id, 4).await?;

    // One booked but not yet accepted
    let waiting = Service::catalog_entry(
        Uuid::new_v4(),
        "Plumbing".to_owned(),
        Some(90.0),
        "more work".to_owned(),
        None,
    );
    db.insert_service(&waiting).await?;
    db.book_service(waiting.id, customer_id).await?;

    let summary = db.customer_summary(customer_id).await?;
    assert_eq!(summary.requested, 1);
    assert_eq!(summary.inprogress, 0);
    assert_eq!(summary.completed, 1);
    Ok(())
}

#[tokio::test]
async fn test_customer_summary_is_zero_for_new_accounts() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "cleo").await?;

    let summary = db.customer_summary(customer_id).await?;
    assert_eq!(summary.requested, 0);
    assert_eq!(summary.inprogress, 0);
    assert_eq!(summary.completed, 0);
    Ok(())
}

#[tokio::test]
async fn test_professional_summary_rating_and_rate() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "dot").await?;
    let professional_id = create_professional(&db, "emil", "Plumbing").await?;

    completed_service(&db, "Plumbing", customer_id, professional_id, 3).await?;
    completed_service(&db, "Plumbing", customer_id, professional_id, 5).await?;

    // One accepted but still in progress
    let open = Service::catalog_entry(
        Uuid::new_v4(),
        "Plumbing".to_owned(),
        Some(70.0),
        "ongoing".to_owned(),
        None,
    );
    db.insert_service(&open).await?;
    db.book_service(open.id, customer_id).await?;
    db.accept_service(open.id, professional_id).await?;

    let summary = db.professional_summary(professional_id).await?;
    assert_eq!(summary.average_rating, Some(4.0));
    assert_eq!(summary.total_accepted, 3);
    assert_eq!(summary.completed, 2);
    assert!((summary.completion_rate - 200.0 / 3.0).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn test_professional_summary_with_no_work() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let professional_id = create_professional(&db, "fern", "Cleaning").await?;

    let summary = db.professional_summary(professional_id).await?;
    assert_eq!(summary.average_rating, None);
    assert_eq!(summary.total_accepted, 0);
    assert_eq!(summary.completion_rate, 0.0);
    assert!(summary.status_counts.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_platform_summary_spans_categories() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let customer_id = create_customer(&db, "gail").await?;
    let professional_id = create_professional(&db, "hugo", "Plumbing").await?;

    completed_service(&db, "Plumbing", customer_id, professional_id, 2).await?;
    db.insert_service(&Service::catalog_entry(
        Uuid::new_v4(),
        "Cleaning".to_owned(),
        Some(50.0),
        "standard clean".to_owned(),
        None,
    ))
    .await?;

    let summary = db.platform_summary().await?;
    assert_eq!(summary.average_rating, Some(2.0));
    assert_eq!(summary.category_counts.len(), 2);
    let plumbing = summary
        .category_counts
        .iter()
        .find(|c| c.category == "Plumbing")
        .unwrap();
    assert_eq!(plumbing.count, 1);
    Ok(())
}

#[tokio::test]
async fn test_platform_summary_on_empty_database() -> Result<()> {
    let (db, _dir) = setup_test_database().await?;
    let summary = db.platform_summary().await?;
    assert_eq!(summary.average_rating, None);
    assert!(summary.category_counts.is_empty());
    Ok(())
}
