// ABOUTME: Service lifecycle database operations
// ABOUTME: Conditional-UPDATE state transitions and role-scoped query surfaces

use super::users::parse_uuid;
use super::Database;
use crate::models::{
    Service, ServiceStatus, ServiceWithCustomer, MISSING_CUSTOMER_PLACEHOLDER,
};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Search key for the professional's assignment search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentSearch {
    /// Substring match on the service address
    Location,
    /// Exact match on the requesting customer's name
    CustomerName,
    /// Services created on a calendar date
    Date,
}

impl Database {
    /// Create the services table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_services(&self) -> Result<()> {
        // No FK on customer_id/professional_id: service history must stay
        // queryable after a customer account is deleted.
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS services (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                price REAL,
                description TEXT NOT NULL,
                address TEXT,
                created_by TEXT NOT NULL,
                date_created DATETIME NOT NULL,
                professional_id TEXT,
                customer_id TEXT,
                remarks TEXT,
                rating INTEGER CHECK (rating BETWEEN 0 AND 5),
                status TEXT NOT NULL CHECK (status IN
                    ('created', 'pending', 'requested', 'inprogress', 'completed', 'closed'))
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_services_status ON services(status)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_services_name ON services(name)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_services_customer ON services(customer_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_services_professional ON services(professional_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist a new service (catalog entry or customer request)
    pub async fn insert_service(&self, service: &Service) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO services
                (id, name, price, description, address, created_by, date_created,
                 professional_id, customer_id, remarks, rating, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(service.id.to_string())
        .bind(&service.name)
        .bind(service.price)
        .bind(&service.description)
        .bind(&service.address)
        .bind(service.created_by.to_string())
        .bind(service.date_created)
        .bind(service.professional_id.map(|id| id.to_string()))
        .bind(service.customer_id.map(|id| id.to_string()))
        .bind(&service.remarks)
        .bind(service.rating)
        .bind(service.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up a service by id
    pub async fn get_service(&self, id: Uuid) -> Result<Option<Service>> {
        let row = sqlx::query("SELECT * FROM services WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_service(&r)).transpose()
    }

    /// Book an unclaimed offering: sets the customer and promotes the status
    /// to `requested`. Compare-and-set on `customer_id IS NULL`; the second
    /// booker sees `false`.
    pub async fn book_service(&self, id: Uuid, customer_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE services SET customer_id = $1, status = 'requested'
            WHERE id = $2 AND customer_id IS NULL AND status NOT IN ('completed', 'closed')
            ",
        )
        .bind(customer_id.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Resolve a pending request: approve promotes to `requested` (optionally
    /// setting the price), reject closes it. Only a `pending` service moves.
    pub async fn resolve_request(
        &self,
        id: Uuid,
        price: Option<f64>,
        approve: bool,
    ) -> Result<bool> {
        let status = if approve {
            ServiceStatus::Requested
        } else {
            ServiceStatus::Closed
        };
        let result = sqlx::query(
            r"
            UPDATE services SET status = $1, price = COALESCE($2, price)
            WHERE id = $3 AND status = 'pending'
            ",
        )
        .bind(status.as_str())
        .bind(price)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Acceptance: the professional-initiated `requested → inprogress`
    /// transition. Compare-and-set on the current status, so two racing
    /// professionals resolve to exactly one winner.
    pub async fn accept_service(&self, id: Uuid, professional_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE services SET professional_id = $1, status = 'inprogress'
            WHERE id = $2 AND status = 'requested'
            ",
        )
        .bind(professional_id.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Closure with review: the owning customer's `inprogress → completed`
    /// transition, setting rating and remarks. Irreversible.
    pub async fn complete_service(
        &self,
        id: Uuid,
        customer_id: Uuid,
        rating: i64,
        remarks: &str,
    ) -> Result<bool> {
        if !(0..=5).contains(&rating) {
            return Err(anyhow!("rating must be between 0 and 5"));
        }
        let result = sqlx::query(
            r"
            UPDATE services SET status = 'completed', rating = $1, remarks = $2
            WHERE id = $3 AND customer_id = $4 AND status = 'inprogress'
            ",
        )
        .bind(rating)
        .bind(remarks)
        .bind(id.to_string())
        .bind(customer_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Terminal closure from any of `pending`, `requested` or `inprogress`.
    /// Terminal states never move again.
    pub async fn close_service(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE services SET status = 'closed'
            WHERE id = $1 AND status IN ('pending', 'requested', 'inprogress')
            ",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Closure restricted to active work (`requested` or `inprogress`);
    /// the manage-services and end-service paths use this variant
    pub async fn close_active_service(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE services SET status = 'closed'
            WHERE id = $1 AND status IN ('requested', 'inprogress')
            ",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Customer history, newest first
    pub async fn customer_history(&self, customer_id: Uuid) -> Result<Vec<Service>> {
        let rows = sqlx::query(
            "SELECT * FROM services WHERE customer_id = $1 ORDER BY date_created DESC",
        )
        .bind(customer_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_service).collect()
    }

    /// Customer search over an optional category and a current/past filter.
    /// `current` restricts to unclaimed offerings, `past` to the customer's
    /// own bookings.
    pub async fn customer_search(
        &self,
        customer_id: Uuid,
        category: Option<&str>,
        only_unclaimed: Option<bool>,
    ) -> Result<Vec<Service>> {
        // Category filter first (or a match-all), then the ownership filter.
        let category_clause = if category.is_some() {
            "name = $1"
        } else {
            "$1 IS NULL"
        };
        // Every branch references $2 so the bind list stays fixed.
        let ownership_clause = match only_unclaimed {
            Some(true) => "AND customer_id IS NULL AND $2 IS NOT NULL",
            Some(false) => "AND customer_id = $2",
            None => "AND $2 IS NOT NULL",
        };
        let sql = format!(
            "SELECT * FROM services WHERE {category_clause} {ownership_clause} \
             ORDER BY date_created DESC"
        );

        let rows = sqlx::query(&sql)
            .bind(category)
            .bind(customer_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_service).collect()
    }

    /// Services assigned to one professional in a given state, joined with
    /// the requesting customer's contact info
    pub async fn assigned_services(
        &self,
        professional_id: Uuid,
        status: ServiceStatus,
    ) -> Result<Vec<ServiceWithCustomer>> {
        let rows = sqlx::query(&with_customer_sql(
            "s.professional_id = $1 AND s.status = $2",
        ))
        .bind(professional_id.to_string())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_service_with_customer).collect()
    }

    /// Candidate pool for one service domain: approved work open for
    /// acceptance
    pub async fn candidate_services(&self, domain: &str) -> Result<Vec<ServiceWithCustomer>> {
        let rows = sqlx::query(&with_customer_sql("s.name = $1 AND s.status = 'requested'"))
            .bind(domain)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_service_with_customer).collect()
    }

    /// Admin pending catalog: customer-filed requests awaiting approval,
    /// joined with requester contact info; a missing customer yields
    /// placeholders, never a failure
    pub async fn pending_requests_with_customers(&self) -> Result<Vec<ServiceWithCustomer>> {
        let rows = sqlx::query(&with_customer_sql("s.status = 'pending'"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_service_with_customer).collect()
    }

    /// One service joined with its customer's contact info
    pub async fn get_service_with_customer(
        &self,
        id: Uuid,
    ) -> Result<Option<ServiceWithCustomer>> {
        let row = sqlx::query(&with_customer_sql("s.id = $1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_service_with_customer(&r)).transpose()
    }

    /// Admin search by exact category name
    pub async fn services_by_name(&self, name: &str) -> Result<Vec<Service>> {
        let rows = sqlx::query("SELECT * FROM services WHERE name = $1 ORDER BY date_created DESC")
            .bind(name)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_service).collect()
    }

    /// Distinct category names offered by the admin-defined catalog
    pub async fn catalog_categories(&self) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT name FROM services WHERE status = 'created' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// Full service listing, newest first
    pub async fn list_services(&self) -> Result<Vec<Service>> {
        let rows = sqlx::query("SELECT * FROM services ORDER BY date_created DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_service).collect()
    }

    /// Professional's search across their own assignments by location
    /// substring, customer name or creation date
    pub async fn search_assignments(
        &self,
        professional_id: Uuid,
        search_by: AssignmentSearch,
        input: &str,
    ) -> Result<Vec<Service>> {
        let rows = match search_by {
            AssignmentSearch::Location => {
                sqlx::query(
                    r"
                    SELECT * FROM services
                    WHERE professional_id = $1 AND address LIKE $2
                    ORDER BY date_created DESC
                    ",
                )
                .bind(professional_id.to_string())
                .bind(format!("%{input}%"))
                .fetch_all(&self.pool)
                .await?
            }
            AssignmentSearch::CustomerName => {
                sqlx::query(
                    r"
                    SELECT s.* FROM services s
                    JOIN users u ON u.id = s.customer_id
                    WHERE s.professional_id = $1 AND u.name = $2
                    ORDER BY s.date_created DESC
                    ",
                )
                .bind(professional_id.to_string())
                .bind(input)
                .fetch_all(&self.pool)
                .await?
            }
            AssignmentSearch::Date => {
                let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
                    .map_err(|e| anyhow!("invalid date '{input}': {e}"))?;
                sqlx::query(
                    r"
                    SELECT * FROM services
                    WHERE professional_id = $1 AND date(date_created) = $2
                    ORDER BY date_created DESC
                    ",
                )
                .bind(professional_id.to_string())
                .bind(date.format("%Y-%m-%d").to_string())
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.iter().map(row_to_service).collect()
    }
}

/// LEFT JOIN template pulling the requesting customer's identity next to
/// each service row
fn with_customer_sql(predicate: &str) -> String {
    format!(
        r"
        SELECT s.*, u.name AS customer_name, u.email AS customer_email,
               u.address AS customer_address, u.mobile AS customer_mobile
        FROM services s
        LEFT JOIN users u ON u.id = s.customer_id
        WHERE {predicate}
        ORDER BY s.date_created DESC
        "
    )
}

/// Map a services row into the domain model
fn row_to_service(row: &SqliteRow) -> Result<Service> {
    let status: String = row.try_get("status")?;
    let professional_id: Option<String> = row.try_get("professional_id")?;
    let customer_id: Option<String> = row.try_get("customer_id")?;
    Ok(Service {
        id: parse_uuid(row, "id")?,
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        description: row.try_get("description")?,
        address: row.try_get("address")?,
        created_by: parse_uuid(row, "created_by")?,
        date_created: row.try_get("date_created")?,
        professional_id: professional_id
            .map(|id| Uuid::parse_str(&id))
            .transpose()
            .map_err(|e| anyhow!("invalid professional_id: {e}"))?,
        customer_id: customer_id
            .map(|id| Uuid::parse_str(&id))
            .transpose()
            .map_err(|e| anyhow!("invalid customer_id: {e}"))?,
        remarks: row.try_get("remarks")?,
        rating: row.try_get("rating")?,
        status: ServiceStatus::from_str(&status)
            .ok_or_else(|| anyhow!("unknown service status '{status}'"))?,
    })
}

/// Map a joined row into a service with customer placeholders for missing
/// identities
fn row_to_service_with_customer(row: &SqliteRow) -> Result<ServiceWithCustomer> {
    let service = row_to_service(row)?;
    let name: Option<String> = row.try_get("customer_name")?;
    let email: Option<String> = row.try_get("customer_email")?;
    let address: Option<String> = row.try_get("customer_address")?;
    let mobile: Option<String> = row.try_get("customer_mobile")?;
    Ok(ServiceWithCustomer {
        service,
        customer_name: name.unwrap_or_else(|| MISSING_CUSTOMER_PLACEHOLDER.into()),
        customer_email: email.unwrap_or_else(|| MISSING_CUSTOMER_PLACEHOLDER.into()),
        customer_address: address.unwrap_or_else(|| MISSING_CUSTOMER_PLACEHOLDER.into()),
        customer_mobile: mobile.unwrap_or_else(|| MISSING_CUSTOMER_PLACEHOLDER.into()),
    })
}
