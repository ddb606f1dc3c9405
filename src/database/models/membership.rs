use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::Role;

/// Row of `user_organizations`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membership {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

/// An organization as seen by one of its members
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationMembership {
    pub organization_id: Uuid,
    pub name: String,
    pub slug: String,
    pub role: String,
}

/// A member as listed on the organization admin page
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}
