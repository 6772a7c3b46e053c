// ABOUTME: Reporting queries producing numeric aggregates for the view layer
// ABOUTME: Counts by status and category, mean ratings, completion rates

use super::Database;
use crate::models::ServiceStatus;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

/// Count of services in one lifecycle state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    /// Lifecycle state
    pub status: ServiceStatus,
    /// Number of services in that state
    pub count: i64,
}

/// Count of services in one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCount {
    /// Category name
    pub category: String,
    /// Number of services in that category
    pub count: i64,
}

/// Aggregates for one customer's dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSummary {
    /// Own services awaiting acceptance
    pub requested: i64,
    /// Own services being worked
    pub inprogress: i64,
    /// Own services fulfilled and reviewed
    pub completed: i64,
}

/// Aggregates for one professional's dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalSummary {
    /// Mean rating over own completed services; `None` with no ratings yet
    pub average_rating: Option<f64>,
    /// Own services per lifecycle state
    pub status_counts: Vec<StatusCount>,
    /// Own accepted services (`inprogress` plus `completed`)
    pub total_accepted: i64,
    /// Own completed services
    pub completed: i64,
    /// Percentage of accepted services completed; zero with none accepted
    pub completion_rate: f64,
}

/// Platform-wide aggregates for the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSummary {
    /// Mean rating over all completed services; `None` with no ratings yet
    pub average_rating: Option<f64>,
    /// Services per category
    pub category_counts: Vec<CategoryCount>,
}

impl Database {
    /// Counts of one customer's services by lifecycle state. Zero services
    /// yield zero counts, never an error.
    pub async fn customer_summary(&self, customer_id: Uuid) -> Result<CustomerSummary> {
        let rows = sqlx::query(
            r"
            SELECT status, COUNT(*) AS count FROM services
            WHERE customer_id = $1 GROUP BY status
            ",
        )
        .bind(customer_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut summary = CustomerSummary {
            requested: 0,
            inprogress: 0,
            completed: 0,
        };
        for row in &rows {
            let status: String = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            match ServiceStatus::from_str(&status) {
                Some(ServiceStatus::Requested) => summary.requested = count,
                Some(ServiceStatus::InProgress) => summary.inprogress = count,
                Some(ServiceStatus::Completed) => summary.completed = count,
                _ => {}
            }
        }
        Ok(summary)
    }

    /// Aggregates for one professional: mean rating, per-state counts and
    /// completion rate. Empty result sets produce zeros and `None`.
    pub async fn professional_summary(&self, professional_id: Uuid) -> Result<ProfessionalSummary> {
        let average_rating: Option<f64> =
            sqlx::query_scalar("SELECT AVG(rating) FROM services WHERE professional_id = $1")
                .bind(professional_id.to_string())
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query(
            r"
            SELECT status, COUNT(*) AS count FROM services
            WHERE professional_id = $1 GROUP BY status
            ",
        )
        .bind(professional_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut status_counts = Vec::with_capacity(rows.len());
        let mut total_accepted = 0;
        let mut completed = 0;
        for row in &rows {
            let status: String = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            if let Some(status) = ServiceStatus::from_str(&status) {
                match status {
                    ServiceStatus::InProgress => total_accepted += count,
                    ServiceStatus::Completed => {
                        total_accepted += count;
                        completed = count;
                    }
                    _ => {}
                }
                status_counts.push(StatusCount { status, count });
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let completion_rate = if total_accepted > 0 {
            (completed as f64 / total_accepted as f64) * 100.0
        } else {
            0.0
        };

        Ok(ProfessionalSummary {
            average_rating,
            status_counts,
            total_accepted,
            completed,
            completion_rate,
        })
    }

    /// Platform-wide aggregates for the admin dashboard
    pub async fn platform_summary(&self) -> Result<PlatformSummary> {
        let average_rating: Option<f64> =
            sqlx::query_scalar("SELECT AVG(rating) FROM services")
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query(
            "SELECT name, COUNT(*) AS count FROM services GROUP BY name ORDER BY count DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let category_counts = rows
            .iter()
            .map(|row| {
                Ok(CategoryCount {
                    category: row.try_get("name")?,
                    count: row.try_get("count")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PlatformSummary {
            average_rating,
            category_counts,
        })
    }
}
