// ABOUTME: Core domain entities for the marketplace - users, sub-profiles, services
// ABOUTME: Owns the service status state machine and the closed role enumeration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Common data models for the service marketplace.
//!
//! The central types are [`Service`] with its [`ServiceStatus`] state machine
//! and the identity triple [`User`] / [`CustomerAccount`] / [`Professional`]. Role
//! sub-profiles are composition keyed by the shared user id, not inheritance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role. Closed set; all dispatch is exhaustive matching, never
/// string comparison in handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator
    Admin,
    /// Requesting party who books and reviews services
    Customer,
    /// Service professional who accepts and fulfils services
    Professional,
}

impl Role {
    /// Canonical lowercase representation stored in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Customer => "customer",
            Self::Professional => "professional",
        }
    }

    /// Parse the canonical lowercase representation
    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "customer" => Some(Self::Customer),
            "professional" => Some(Self::Professional),
            _ => None,
        }
    }

    /// Dashboard route this role lands on after login
    #[must_use]
    pub const fn dashboard_path(&self) -> &'static str {
        match self {
            Self::Admin => "/admin_dashboard",
            Self::Customer => "/customer_dashboard",
            Self::Professional => "/professional_dashboard",
        }
    }
}

/// Identity record shared by all roles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier; sub-profiles are keyed by the same id
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Email address (unique, used for login)
    pub email: String,
    /// Hashed password for authentication
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Role, immutable after creation
    pub role: Role,
    /// Postal address
    pub address: Option<String>,
    /// Postal pincode
    pub pincode: Option<String>,
    /// Mobile number
    pub mobile: Option<String>,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user record with a fresh id
    #[must_use]
    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role,
            address: None,
            pincode: None,
            mobile: None,
            created_at: Utc::now(),
        }
    }

    /// Attach contact details
    #[must_use]
    pub fn with_contact(
        mut self,
        address: Option<String>,
        pincode: Option<String>,
        mobile: Option<String>,
    ) -> Self {
        self.address = address;
        self.pincode = pincode;
        self.mobile = mobile;
        self
    }
}

/// Customer sub-profile joined with the contact fields of the backing user.
/// The customer table itself only carries the shared id; listings always
/// include the identity fields the admin views need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAccount {
    /// Shared user id
    pub user_id: Uuid,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Postal address
    pub address: Option<String>,
    /// Postal pincode
    pub pincode: Option<String>,
    /// Mobile number
    pub mobile: Option<String>,
}

/// Professional approval state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfessionalStatus {
    /// Awaiting admin approval (initial state at signup)
    #[default]
    Pending,
    /// Approved by admin; may accept services
    Approved,
    /// Rejected by admin
    Rejected,
    /// Blocked by admin after approval; deletion is modeled as this
    /// transition, never as physical removal
    Blocked,
}

impl ProfessionalStatus {
    /// Canonical lowercase representation stored in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Blocked => "blocked",
        }
    }

    /// Parse the canonical lowercase representation
    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }

    /// Only approved professionals may accept services
    #[must_use]
    pub const fn can_accept(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Professional sub-profile keyed by the shared user id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    /// Shared user id
    pub user_id: Uuid,
    /// Service category this professional services; acceptance is limited
    /// to services of this category
    pub service_domain: String,
    /// Experience in years
    pub experience: i64,
    /// Stored credential document filename (pdf), if uploaded
    pub documents: Option<String>,
    /// Approval state
    pub status: ProfessionalStatus,
}

/// Professional sub-profile joined with the backing user's identity fields,
/// for admin listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalListing {
    /// Shared user id
    pub user_id: Uuid,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Mobile number
    pub mobile: Option<String>,
    /// Serviced category
    pub service_domain: String,
    /// Experience in years
    pub experience: i64,
    /// Stored credential document filename
    pub documents: Option<String>,
    /// Approval state
    pub status: ProfessionalStatus,
}

/// Service lifecycle state machine.
///
/// `created → (booking) requested`, `pending → requested → inprogress →
/// completed`, with `closed` reachable from `pending`, `requested` or
/// `inprogress`. `completed` and `closed` are terminal. One canonical
/// lowercase serialization; no case variants exist anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Standing catalog entry defined by an admin, no customer yet
    Created,
    /// Customer-filed request awaiting admin approval
    Pending,
    /// Approved and open for professional acceptance
    Requested,
    /// Accepted by exactly one professional
    #[serde(rename = "inprogress")]
    InProgress,
    /// Fulfilled and reviewed by the owning customer (terminal)
    Completed,
    /// Rejected or cancelled (terminal)
    Closed,
}

impl ServiceStatus {
    /// Canonical lowercase representation stored in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Pending => "pending",
            Self::Requested => "requested",
            Self::InProgress => "inprogress",
            Self::Completed => "completed",
            Self::Closed => "closed",
        }
    }

    /// Parse the canonical lowercase representation
    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "created" => Some(Self::Created),
            "pending" => Some(Self::Pending),
            "requested" => Some(Self::Requested),
            "inprogress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Terminal states admit no further transition
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Closed)
    }

    /// States from which an admin (or rejecting professional) may close
    #[must_use]
    pub const fn is_closable(&self) -> bool {
        matches!(self, Self::Pending | Self::Requested | Self::InProgress)
    }
}

/// The central entity: a catalog entry or customer request moving through
/// the lifecycle state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    /// Unique service identifier
    pub id: Uuid,
    /// Category name
    pub name: String,
    /// Price; null until set by the admin at approval or catalog creation
    pub price: Option<f64>,
    /// Free-text description of the work
    pub description: String,
    /// Location the work happens at
    pub address: Option<String>,
    /// Admin who defined the catalog entry or customer who filed the request
    pub created_by: Uuid,
    /// When the service was created
    pub date_created: DateTime<Utc>,
    /// Accepting professional; set exactly once, on acceptance
    pub professional_id: Option<Uuid>,
    /// Requesting or booking customer; once set, never reverts to null
    pub customer_id: Option<Uuid>,
    /// Closing review text; set iff status is `completed`
    pub remarks: Option<String>,
    /// Closing review rating 0-5; set iff status is `completed`
    pub rating: Option<i64>,
    /// Lifecycle state
    pub status: ServiceStatus,
}

impl Service {
    /// Standing catalog entry defined by an admin; no customer attached
    #[must_use]
    pub fn catalog_entry(
        admin_id: Uuid,
        name: String,
        price: Option<f64>,
        description: String,
        address: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            price,
            description,
            address,
            created_by: admin_id,
            date_created: Utc::now(),
            professional_id: None,
            customer_id: None,
            remarks: None,
            rating: None,
            status: ServiceStatus::Created,
        }
    }

    /// Customer-filed request awaiting admin approval
    #[must_use]
    pub fn request(
        customer_id: Uuid,
        name: String,
        description: String,
        address: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            price: None,
            description,
            address,
            created_by: customer_id,
            date_created: Utc::now(),
            professional_id: None,
            customer_id: Some(customer_id),
            remarks: None,
            rating: None,
            status: ServiceStatus::Pending,
        }
    }
}

/// A service joined with the requesting customer's contact information.
/// A missing customer yields "N/A" placeholders, never a hard failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceWithCustomer {
    /// The service record
    pub service: Service,
    /// Customer display name or "N/A"
    pub customer_name: String,
    /// Customer email or "N/A"
    pub customer_email: String,
    /// Customer address or "N/A"
    pub customer_address: String,
    /// Customer mobile or "N/A"
    pub customer_mobile: String,
}

/// Placeholder rendered when the requesting customer is missing
pub const MISSING_CUSTOMER_PLACEHOLDER: &str = "N/A";
