// ABOUTME: Identity store database operations
// ABOUTME: Transactional user plus sub-profile creation, lookups and status transitions

use super::Database;
use crate::models::{
    CustomerAccount, Professional, ProfessionalListing, ProfessionalStatus, Role, User,
};
use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create users and sub-profile tables
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('admin', 'customer', 'professional')),
                address TEXT,
                pincode TEXT,
                mobile TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS customers (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS professionals (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                service_domain TEXT NOT NULL,
                experience INTEGER NOT NULL DEFAULT 0,
                documents TEXT,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'approved', 'rejected', 'blocked'))
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_professionals_status ON professionals(status)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a bare user row on an existing connection or transaction
    pub(super) async fn insert_user(
        &self,
        conn: &mut sqlx::SqliteConnection,
        user: &User,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, name, email, password_hash, role, address, pincode, mobile, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.address)
        .bind(&user.pincode)
        .bind(&user.mobile)
        .bind(user.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Create a customer: the user row and the customer sub-profile row in
    /// one transaction, or neither
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already in use or the transaction fails
    pub async fn create_customer(&self, user: &User) -> Result<Uuid> {
        if user.role != Role::Customer {
            return Err(anyhow!("create_customer requires the customer role"));
        }
        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(anyhow!("email already in use by another user"));
        }

        let mut tx = self.pool.begin().await?;
        self.insert_user(&mut *tx, user).await?;
        sqlx::query("INSERT INTO customers (user_id) VALUES ($1)")
            .bind(user.id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(user.id)
    }

    /// Create a professional: the user row and the professional sub-profile
    /// row in one transaction, or neither. The profile starts `pending`.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already in use, the ids disagree, or
    /// the transaction fails
    pub async fn create_professional(&self, user: &User, profile: &Professional) -> Result<Uuid> {
        if user.role != Role::Professional {
            return Err(anyhow!("create_professional requires the professional role"));
        }
        if user.id != profile.user_id {
            return Err(anyhow!("profile id must match the user id"));
        }
        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(anyhow!("email already in use by another user"));
        }

        let mut tx = self.pool.begin().await?;
        self.insert_user(&mut *tx, user).await?;
        sqlx::query(
            r"
            INSERT INTO professionals (user_id, service_domain, experience, documents, status)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(profile.user_id.to_string())
        .bind(&profile.service_domain)
        .bind(profile.experience)
        .bind(&profile.documents)
        .bind(profile.status.as_str())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(user.id)
    }

    /// Look up a user by id
    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Look up a user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Look up a professional profile by the shared user id
    pub async fn get_professional(&self, user_id: Uuid) -> Result<Option<Professional>> {
        let row = sqlx::query("SELECT * FROM professionals WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_professional(&r)).transpose()
    }

    /// Whether a customer sub-profile exists for this user id
    pub async fn customer_exists(&self, user_id: Uuid) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// List all customers joined with their identity fields
    pub async fn list_customers(&self) -> Result<Vec<CustomerAccount>> {
        let rows = sqlx::query(
            r"
            SELECT u.id, u.name, u.email, u.address, u.pincode, u.mobile
            FROM customers c
            JOIN users u ON u.id = c.user_id
            ORDER BY u.name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CustomerAccount {
                    user_id: parse_uuid(row, "id")?,
                    name: row.try_get("name")?,
                    email: row.try_get("email")?,
                    address: row.try_get("address")?,
                    pincode: row.try_get("pincode")?,
                    mobile: row.try_get("mobile")?,
                })
            })
            .collect()
    }

    /// List professionals in a given approval state, joined with identity
    /// fields for the admin views
    pub async fn list_professionals_by_status(
        &self,
        status: ProfessionalStatus,
    ) -> Result<Vec<ProfessionalListing>> {
        let rows = sqlx::query(
            r"
            SELECT p.user_id, u.name, u.email, u.mobile,
                   p.service_domain, p.experience, p.documents, p.status
            FROM professionals p
            JOIN users u ON u.id = p.user_id
            WHERE p.status = $1
            ORDER BY u.name
            ",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ProfessionalListing {
                    user_id: parse_uuid(row, "user_id")?,
                    name: row.try_get("name")?,
                    email: row.try_get("email")?,
                    mobile: row.try_get("mobile")?,
                    service_domain: row.try_get("service_domain")?,
                    experience: row.try_get("experience")?,
                    documents: row.try_get("documents")?,
                    status: parse_professional_status(row)?,
                })
            })
            .collect()
    }

    /// Transition a professional's approval state (approve, reject, block).
    /// Returns `false` when no such professional exists.
    pub async fn set_professional_status(
        &self,
        user_id: Uuid,
        status: ProfessionalStatus,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE professionals SET status = $1 WHERE user_id = $2")
            .bind(status.as_str())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a customer: both the sub-profile and the user row, in one
    /// transaction. Owned services keep their customer_id so history stays
    /// queryable by the prior id. Returns `false` when no such customer.
    pub async fn delete_customer(&self, user_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let profile = sqlx::query("DELETE FROM customers WHERE user_id = $1")
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = $1 AND role = 'customer'")
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(profile.rows_affected() > 0)
    }
}

/// Map a users row into the domain model
fn row_to_user(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: parse_uuid(row, "id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: Role::from_str(&role).ok_or_else(|| anyhow!("unknown role '{role}'"))?,
        address: row.try_get("address")?,
        pincode: row.try_get("pincode")?,
        mobile: row.try_get("mobile")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Map a professionals row into the domain model
fn row_to_professional(row: &SqliteRow) -> Result<Professional> {
    Ok(Professional {
        user_id: parse_uuid(row, "user_id")?,
        service_domain: row.try_get("service_domain")?,
        experience: row.try_get("experience")?,
        documents: row.try_get("documents")?,
        status: parse_professional_status(row)?,
    })
}

fn parse_professional_status(row: &SqliteRow) -> Result<ProfessionalStatus> {
    let status: String = row.try_get("status")?;
    ProfessionalStatus::from_str(&status)
        .ok_or_else(|| anyhow!("unknown professional status '{status}'"))
}

/// Parse a TEXT uuid column
pub(super) fn parse_uuid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let value: String = row.try_get(column)?;
    Uuid::parse_str(&value).map_err(|e| anyhow!("invalid uuid in column {column}: {e}"))
}
